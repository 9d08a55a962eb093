//! LifeMonitor library.
//!
//! Monitors the health of registered workflow versions by querying the CI
//! jobs bound to their test suites, and exposes the results over HTTP.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
