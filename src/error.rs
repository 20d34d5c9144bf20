//! Error taxonomy shared by the storage, persistence, and mesh layers.
//!
//! Every failure is returned to the immediate caller as a value; the command
//! layer decides how to render it and what exit status to use.

use std::io;

/// Errors produced by nsmctl core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No resource, cache entry, or namespace matched the request.
    #[error("{0} is not found")]
    NotFound(String),

    /// Zero or more than one persisted domain carries the default flag.
    #[error("found {count} default domains, run 'nsmctl use domain <NAME>' to pick one")]
    AmbiguousDefaultDomain { count: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutation attempted on a read-only resource kind.
    #[error("{0} are read-only")]
    ReadOnly(&'static str),

    /// DNS SRV or address lookup failed or came back empty.
    #[error("service resolution failed: {0}")]
    Resolution(String),

    /// The channel to a remote service could not be established or used.
    #[error("connection failed: {0}")]
    Connect(String),

    /// A persisted or received document could not be decoded.
    #[error("malformed entry {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
