mod config;
mod descriptor;
mod error;
mod types;

pub use config::{AppRegistration, ConfigSource, LinkSpec, PackageConfig};
pub use descriptor::PackageDescriptor;
pub use error::InstallerError;
pub use types::{TypeRegistry, APPLICATION, JETPACK, LIBRARY, PLUGIN};

#[cfg(test)]
mod tests;
