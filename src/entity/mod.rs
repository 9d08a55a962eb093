//! SeaORM entity definitions.

pub mod oauth_identity;
pub mod test_instance;
pub mod test_suite;
pub mod testing_service;
pub mod user;
pub mod workflow;
pub mod workflow_registry;
