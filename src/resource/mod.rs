//! Resource abstraction layer
//!
//! The kinds nsmctl manages behind one storage contract: locally persisted
//! domain profiles, registry-owned services and endpoints, and live
//! connections streamed by the manager.
//!
//! # Architecture
//!
//! - [`storage`] - The uniform CRUD contract every kind implements
//! - [`registry`] - Maps kind names and aliases to storage instances
//! - [`remote`] - Storages backed by the registry and manager services

pub mod registry;
pub mod remote;
pub mod storage;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::{Error, Result};

/// Registry entry describing a network service offered inside a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkService {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub payload: String,
}

/// Registry entry describing an endpoint implementing one or more services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkServiceEndpoint {
    #[serde(default)]
    pub name: String,
    /// Names of the network services this endpoint implements.
    #[serde(default)]
    pub network_service_names: Vec<String>,
    #[serde(default)]
    pub url: String,
}

/// Live data-plane connection reported by the manager service.
///
/// Addressed by an opaque path-segment id, not by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Connection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub network_service: String,
    #[serde(default)]
    pub state: String,
    /// Path-segment ids the connection traverses.
    #[serde(default)]
    pub path: Vec<String>,
}

/// Discriminant for every resource kind nsmctl can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Domain,
    NetworkService,
    NetworkServiceEndpoint,
    Connection,
}

impl ResourceKind {
    /// Cache namespace for the kind (the lowercased kind name).
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::NetworkService => "networkservice",
            Self::NetworkServiceEndpoint => "networkserviceendpoint",
            Self::Connection => "connection",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Domain => "Domain",
            Self::NetworkService => "NetworkService",
            Self::NetworkServiceEndpoint => "NetworkServiceEndpoint",
            Self::Connection => "Connection",
        }
    }

    /// New zero-valued resource of this kind for the caller to populate.
    pub fn zero(&self) -> Resource {
        match self {
            Self::Domain => Resource::Domain(Domain::default()),
            Self::NetworkService => Resource::NetworkService(NetworkService::default()),
            Self::NetworkServiceEndpoint => {
                Resource::NetworkServiceEndpoint(NetworkServiceEndpoint::default())
            }
            Self::Connection => Resource::Connection(Connection::default()),
        }
    }

    /// Decodes a YAML document as a resource of this kind.
    pub fn decode_yaml(&self, input: &str) -> std::result::Result<Resource, serde_yaml::Error> {
        Ok(match self {
            Self::Domain => Resource::Domain(serde_yaml::from_str(input)?),
            Self::NetworkService => Resource::NetworkService(serde_yaml::from_str(input)?),
            Self::NetworkServiceEndpoint => {
                Resource::NetworkServiceEndpoint(serde_yaml::from_str(input)?)
            }
            Self::Connection => Resource::Connection(serde_yaml::from_str(input)?),
        })
    }

    /// Columns of the tabular rendering for this kind.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Domain => DOMAIN_FIELDS,
            Self::NetworkService => NETWORK_SERVICE_FIELDS,
            Self::NetworkServiceEndpoint => ENDPOINT_FIELDS,
            Self::Connection => CONNECTION_FIELDS,
        }
    }
}

/// A resource addressed by the storage layer, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Domain(Domain),
    NetworkService(NetworkService),
    NetworkServiceEndpoint(NetworkServiceEndpoint),
    Connection(Connection),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Domain(_) => ResourceKind::Domain,
            Self::NetworkService(_) => ResourceKind::NetworkService,
            Self::NetworkServiceEndpoint(_) => ResourceKind::NetworkServiceEndpoint,
            Self::Connection(_) => ResourceKind::Connection,
        }
    }

    /// Identity of the resource within its kind.
    pub fn name(&self) -> &str {
        match self {
            Self::Domain(d) => &d.name,
            Self::NetworkService(ns) => &ns.name,
            Self::NetworkServiceEndpoint(nse) => &nse.name,
            Self::Connection(c) => &c.id,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        match self {
            Self::Domain(d) => d.name = name.to_string(),
            Self::NetworkService(ns) => ns.name = name.to_string(),
            Self::NetworkServiceEndpoint(nse) => nse.name = name.to_string(),
            Self::Connection(c) => c.id = name.to_string(),
        }
    }

    /// Checks the dynamic kind against the kind a storage serves.
    pub fn expect_kind(&self, expected: ResourceKind) -> Result<()> {
        if self.kind() == expected {
            return Ok(());
        }
        Err(Error::InvalidArgument(format!(
            "expected a {} resource, got {}",
            expected.display_name(),
            self.kind().display_name()
        )))
    }

    pub fn into_domain(self) -> Result<Domain> {
        self.expect_kind(ResourceKind::Domain)?;
        match self {
            Self::Domain(domain) => Ok(domain),
            _ => unreachable!("kind checked above"),
        }
    }

    pub fn into_network_service(self) -> Result<NetworkService> {
        self.expect_kind(ResourceKind::NetworkService)?;
        match self {
            Self::NetworkService(service) => Ok(service),
            _ => unreachable!("kind checked above"),
        }
    }

    pub fn into_endpoint(self) -> Result<NetworkServiceEndpoint> {
        self.expect_kind(ResourceKind::NetworkServiceEndpoint)?;
        match self {
            Self::NetworkServiceEndpoint(endpoint) => Ok(endpoint),
            _ => unreachable!("kind checked above"),
        }
    }

    /// The resource body as a YAML document.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        match self {
            Self::Domain(d) => serde_yaml::to_string(d),
            Self::NetworkService(ns) => serde_yaml::to_string(ns),
            Self::NetworkServiceEndpoint(nse) => serde_yaml::to_string(nse),
            Self::Connection(c) => serde_yaml::to_string(c),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(d) => write!(f, "NSM domain {}", d.name),
            Self::NetworkService(ns) => write!(f, "network service {}", ns.name),
            Self::NetworkServiceEndpoint(nse) => write!(f, "endpoint {}", nse.name),
            Self::Connection(c) => write!(f, "connection {}", c.id),
        }
    }
}

/// One column of the tabular rendering for a kind: header, accessor, and a
/// width hint long values are clipped to.
pub struct FieldSpec {
    pub header: &'static str,
    pub width: usize,
    pub get: fn(&Resource) -> String,
}

fn flag(value: bool) -> String {
    let text = if value { "true" } else { "false" };
    text.to_string()
}

const DOMAIN_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        header: "NAME",
        width: 24,
        get: |r| match r {
            Resource::Domain(d) => d.name.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "DNS_SERVER_ADDRESS",
        width: 22,
        get: |r| match r {
            Resource::Domain(d) => d.dns_server_address.clone().unwrap_or_else(|| "-".into()),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "REGISTRY_SERVICE",
        width: 26,
        get: |r| match r {
            Resource::Domain(d) => d.registry_service.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "MANAGER_SERVICE",
        width: 26,
        get: |r| match r {
            Resource::Domain(d) => d.manager_service.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "PATH",
        width: 18,
        get: |r| match r {
            Resource::Domain(d) => d.path.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "IS_DEFAULT",
        width: 10,
        get: |r| match r {
            Resource::Domain(d) => flag(d.is_default),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "IS_INSECURE",
        width: 11,
        get: |r| match r {
            Resource::Domain(d) => flag(d.is_insecure),
            _ => String::new(),
        },
    },
];

const NETWORK_SERVICE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        header: "NAME",
        width: 32,
        get: |r| match r {
            Resource::NetworkService(ns) => ns.name.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "PAYLOAD",
        width: 12,
        get: |r| match r {
            Resource::NetworkService(ns) => ns.payload.clone(),
            _ => String::new(),
        },
    },
];

const ENDPOINT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        header: "NAME",
        width: 32,
        get: |r| match r {
            Resource::NetworkServiceEndpoint(nse) => nse.name.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "NETWORK_SERVICES",
        width: 36,
        get: |r| match r {
            Resource::NetworkServiceEndpoint(nse) => nse.network_service_names.join(","),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "URL",
        width: 30,
        get: |r| match r {
            Resource::NetworkServiceEndpoint(nse) => nse.url.clone(),
            _ => String::new(),
        },
    },
];

const CONNECTION_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        header: "ID",
        width: 38,
        get: |r| match r {
            Resource::Connection(c) => c.id.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "NETWORK_SERVICE",
        width: 26,
        get: |r| match r {
            Resource::Connection(c) => c.network_service.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "STATE",
        width: 10,
        get: |r| match r {
            Resource::Connection(c) => c.state.clone(),
            _ => String::new(),
        },
    },
    FieldSpec {
        header: "PATH",
        width: 36,
        get: |r| match r {
            Resource::Connection(c) => c.path.join(","),
            _ => String::new(),
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ResourceKind; 4] = [
        ResourceKind::Domain,
        ResourceKind::NetworkService,
        ResourceKind::NetworkServiceEndpoint,
        ResourceKind::Connection,
    ];

    #[test]
    fn dir_names_are_lowercased_kind_names() {
        for kind in ALL_KINDS {
            assert_eq!(kind.dir_name(), kind.display_name().to_lowercase());
        }
    }

    #[test]
    fn zero_values_are_kind_correct_and_unnamed() {
        for kind in ALL_KINDS {
            let zero = kind.zero();
            assert_eq!(zero.kind(), kind);
            assert!(zero.name().is_empty());
        }
    }

    #[test]
    fn expect_kind_flags_mismatches() {
        let service = ResourceKind::NetworkService.zero();
        assert!(service.expect_kind(ResourceKind::NetworkService).is_ok());
        assert!(matches!(
            service.expect_kind(ResourceKind::Domain),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn decode_yaml_produces_the_requested_kind() {
        let decoded = ResourceKind::NetworkService
            .decode_yaml("name: ns-1\npayload: IP\n")
            .unwrap();
        let service = decoded.into_network_service().unwrap();
        assert_eq!(service.name, "ns-1");
        assert_eq!(service.payload, "IP");
    }

    #[test]
    fn connection_identity_is_its_id() {
        let mut resource = ResourceKind::Connection.zero();
        resource.set_name("path-segment-1");
        assert_eq!(resource.name(), "path-segment-1");
        assert_eq!(resource.to_string(), "connection path-segment-1");
    }

    #[test]
    fn every_kind_has_field_descriptors() {
        for kind in ALL_KINDS {
            let fields = kind.fields();
            assert!(!fields.is_empty());
            let row = kind.zero();
            for field in fields {
                // Accessors must not panic on zero values.
                let _ = (field.get)(&row);
            }
        }
    }
}
