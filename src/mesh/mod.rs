//! Remote side of the client.
//!
//! This module turns a domain profile into usable channels to the mesh's
//! registry and manager services.
//!
//! # Module Structure
//!
//! - [`identity`] - Workload identity: X.509 SVIDs and bearer tokens
//! - [`channel`] - Service resolution and secure/insecure channel negotiation
//! - [`api`] - Client stubs for the registry and manager services

pub mod api;
pub mod channel;
pub mod identity;
