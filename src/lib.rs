//! Core library of the nsmctl command line client.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! exercise them directly.

pub mod cmd;
pub mod domain;
pub mod error;
pub mod mesh;
pub mod persistence;
pub mod resource;

/// Version injected at compile time via NSMCTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("NSMCTL_VERSION") {
    Some(v) => v,
    None => "dev",
};
