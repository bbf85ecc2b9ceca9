//! State management module
//!
//! This module handles all capture state, including:
//! - Shared data structures (data.rs)
//! - The capture session and its render sinks (session.rs)
//! - Initial configuration and capture folder scanning (config.rs)

pub mod config;
pub mod data;
pub mod session;
