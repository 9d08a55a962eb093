//! Business logic services.

pub mod api_key;
pub mod health;
pub mod monitor;
pub mod registry;
pub mod rocrate;
pub mod test_definition;
pub mod testing;

pub use monitor::{LifeMonitor, MonitorSettings};
pub use registry::{RegistryClient, RegistryClientFactory};
pub use testing::{TestingServiceAdapter, TestingServiceFactory};
