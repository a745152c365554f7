use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

pub fn current_output_style() -> OutputStyle {
    resolve_output_style(
        std::io::stdout().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    )
}

fn resolve_output_style(stdout_is_tty: bool, no_color: bool) -> OutputStyle {
    if stdout_is_tty && !no_color {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

/// One status line. Plain mode is the unadorned message; rich mode prefixes
/// a colored ASCII badge.
pub fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => {
            let (badge, badge_style) = status_badge(status);
            format!("{} {message}", colorize(badge_style, badge))
        }
    }
}

fn status_badge(status: &str) -> (&'static str, Style) {
    match status {
        "ok" => ("[OK]", badge_style(AnsiColor::Green)),
        "warn" => ("[WARN]", badge_style(AnsiColor::Yellow)),
        "err" => ("[ERR]", badge_style(AnsiColor::Red)),
        _ => ("[..]", badge_style(AnsiColor::BrightBlue)),
    }
}

fn badge_style(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(color.into())).effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_output_style_prefers_plain_off_tty() {
        assert_eq!(resolve_output_style(false, false), OutputStyle::Plain);
        assert_eq!(resolve_output_style(true, true), OutputStyle::Plain);
        assert_eq!(resolve_output_style(true, false), OutputStyle::Rich);
    }

    #[test]
    fn render_status_line_plain_is_unadorned() {
        assert_eq!(
            render_status_line(OutputStyle::Plain, "ok", "installed acme/widget 1.0.0"),
            "installed acme/widget 1.0.0"
        );
    }

    #[test]
    fn render_status_line_rich_includes_ascii_badge() {
        let line = render_status_line(OutputStyle::Rich, "warn", "registration skipped");
        assert!(line.contains("[WARN]"), "unexpected line: {line}");
        assert!(line.ends_with("registration skipped"));
    }
}
