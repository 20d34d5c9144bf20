//! Client stubs for the registry and manager services.
//!
//! The wire protocol belongs to the remote APIs; these stubs only shape the
//! calls the storage backends need.

use std::collections::HashMap;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::mesh::channel::MeshChannel;
use crate::resource::{Connection, NetworkService, NetworkServiceEndpoint};

const SERVICES_PATH: &str = "/networkservices";
const ENDPOINTS_PATH: &str = "/networkserviceendpoints";
const MONITOR_PATH: &str = "/connections/watch";

/// Registry service client: query-style lookups plus register/unregister.
pub struct RegistryApi {
    channel: MeshChannel,
}

impl RegistryApi {
    pub fn new(channel: MeshChannel) -> Self {
        Self { channel }
    }

    /// Finds services; an empty query (`None`) returns all of them.
    pub async fn find_services(&self, name: Option<&str>) -> Result<Vec<NetworkService>> {
        self.find(SERVICES_PATH, name).await
    }

    pub async fn register_service(&self, service: &NetworkService) -> Result<()> {
        self.channel.post_json(SERVICES_PATH, service).await
    }

    pub async fn unregister_service(&self, name: &str) -> Result<()> {
        self.channel.delete(&format!("{SERVICES_PATH}/{name}")).await
    }

    /// Finds endpoints; an empty query (`None`) returns all of them.
    pub async fn find_endpoints(&self, name: Option<&str>) -> Result<Vec<NetworkServiceEndpoint>> {
        self.find(ENDPOINTS_PATH, name).await
    }

    pub async fn register_endpoint(&self, endpoint: &NetworkServiceEndpoint) -> Result<()> {
        self.channel.post_json(ENDPOINTS_PATH, endpoint).await
    }

    pub async fn unregister_endpoint(&self, name: &str) -> Result<()> {
        self.channel
            .delete(&format!("{ENDPOINTS_PATH}/{name}"))
            .await
    }

    async fn find<T: DeserializeOwned>(&self, path: &str, name: Option<&str>) -> Result<Vec<T>> {
        let query: Vec<(&str, &str)> = match name {
            Some(name) => vec![("name", name)],
            None => Vec::new(),
        };
        let value = self.channel.get_json(path, &query).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Connect(format!("malformed registry response: {e}")))
    }
}

/// One pushed monitor event: the full set of live connections.
#[derive(Debug, Deserialize)]
struct MonitorEvent {
    #[serde(default)]
    connections: HashMap<String, Connection>,
}

/// Manager service client exposing the connection monitor stream.
pub struct ManagerApi {
    channel: MeshChannel,
}

impl ManagerApi {
    pub fn new(channel: MeshChannel) -> Self {
        Self { channel }
    }

    /// Reads exactly the first snapshot pushed on the monitor stream, scoped
    /// to one path-segment id when given. The stream is closed right after, so
    /// the server-side monitor does not outlive the read.
    pub async fn monitor_snapshot(&self, id: Option<&str>) -> Result<HashMap<String, Connection>> {
        let query: Vec<(&str, &str)> = match id {
            Some(id) => vec![("id", id)],
            None => Vec::new(),
        };
        let response = self.channel.get_stream(MONITOR_PATH, &query).await?;

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Connect(format!("monitor stream: {e}")))?;
            buffer.extend_from_slice(&chunk);
            if let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                buffer.truncate(newline);
                break;
            }
        }
        drop(stream);

        if buffer.is_empty() {
            return Err(Error::Connect(
                "monitor stream closed before the first snapshot".to_string(),
            ));
        }

        let event: MonitorEvent = serde_json::from_slice(&buffer)
            .map_err(|e| Error::Connect(format!("malformed monitor snapshot: {e}")))?;

        let mut connections = event.connections;
        for (id, connection) in connections.iter_mut() {
            if connection.id.is_empty() {
                connection.id = id.clone();
            }
        }
        Ok(connections)
    }
}
