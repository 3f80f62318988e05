//! Service implementations wired into the domain traits.

pub mod auth;
pub mod bootstrap;
pub mod email;
pub mod filesystem;

pub use auth::{select_driver, DriverContext};
pub use bootstrap::{bootstrap_master, BootstrapError};
pub use email::EmailTransport;
pub use filesystem::FilesystemProvisioner;
