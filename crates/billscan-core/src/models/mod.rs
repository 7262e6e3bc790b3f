//! Data models: provider keyword configuration and extraction output.

pub mod config;
pub mod record;
