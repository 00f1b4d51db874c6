//! Utility modules: HTTP plumbing and file sweeps.

pub mod http;
pub mod sweep;
