//! Hostel desk service: tenant records, leave and visitor approvals, and
//! signed passes.
//!
//! The binary in `main.rs` is a thin CLI over this library; integration
//! tests in `tests/` drive the same modules.

pub mod api;
pub mod auth;
pub mod chatbot;
pub mod cli;
pub mod config;
pub mod errors;
pub mod insights;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod notification;
pub mod pass;
pub mod repo;
pub mod state;
pub mod store;
pub mod workflow;

pub use state::AppState;
