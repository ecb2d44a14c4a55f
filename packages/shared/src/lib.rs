//! Shared utilities for Carelink.

pub mod logger;
pub mod time;
