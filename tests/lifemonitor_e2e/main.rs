//! LifeMonitor E2E test suite.
//!
//! Runs the service against in-process mock Jenkins and SEEK servers and an
//! in-memory SQLite database; no external services are needed.
//!
//! Run with: cargo test --test lifemonitor_e2e

mod test_helpers;

mod test_api;
mod test_health;
mod test_registration;
