//! Client terminal monitoring
//!
//! Decodes the `monitor_clientes` payload, normalises terminal status and
//! builds the problems-first table shown on the dashboard.

mod board;
mod terminal;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::ApiClient;
use crate::error::{DashboardError, Result};
use crate::live::SnapshotFetcher;

pub use board::{DisplayRow, MonitorBoard, RowKind};
pub use terminal::{MonitoredClient, Terminal, TerminalStatus};

/// Flatten the monitoring payload into clients, in server order.
///
/// The backend groups clients under arbitrary keys
/// (`{ "<group>": [client, ...], ... }`); a bare array is accepted too.
/// An object carrying `success: false` is a rejection.
pub fn decode_payload(payload: Value) -> Result<Vec<MonitoredClient>> {
    match payload {
        Value::Array(clients) => Ok(serde_json::from_value(Value::Array(clients))?),
        Value::Object(groups) => {
            if let Some(Value::Bool(false)) = groups.get("success") {
                let message = groups
                    .get("error")
                    .or_else(|| groups.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("monitoring request declared failure");
                return Err(DashboardError::ServerRejected(message.to_string()));
            }

            let mut clients = Vec::new();
            for (group, value) in groups {
                match value {
                    Value::Array(_) => {
                        let members: Vec<MonitoredClient> = serde_json::from_value(value)
                            .map_err(|e| DashboardError::Decode(format!("group {}: {}", group, e)))?;
                        clients.extend(members);
                    }
                    // status flags sit next to the groups
                    Value::Bool(_) | Value::String(_) | Value::Null => {}
                    other => {
                        return Err(DashboardError::Decode(format!(
                            "group {} is not a list: {}",
                            group, other
                        )))
                    }
                }
            }
            Ok(clients)
        }
        other => Err(DashboardError::Decode(format!(
            "unexpected monitoring payload: {}",
            other
        ))),
    }
}

/// [`SnapshotFetcher`] producing the monitoring table
pub struct MonitorFetcher {
    api: ApiClient,
}

impl MonitorFetcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SnapshotFetcher for MonitorFetcher {
    type Output = MonitorBoard;

    async fn fetch_snapshot(&self) -> Result<MonitorBoard> {
        let clients = self.api.monitor_clients().await?;
        Ok(MonitorBoard::build(&clients))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_groups_flatten_in_server_order() {
        let payload = json!({
            "zeta": [{"pk": 1, "codigo": "Z1", "nombre": "z", "ciudad": "a", "terminales": []}],
            "alpha": [
                {"pk": 2, "codigo": "A1", "nombre": "a", "ciudad": "b", "terminales": []},
                {"pk": 3, "codigo": "A2", "nombre": "b", "ciudad": "c", "terminales": []}
            ]
        });
        let codes: Vec<_> = decode_payload(payload)
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(codes, vec!["Z1", "A1", "A2"]);
    }

    #[test]
    fn test_declared_failure() {
        let err = decode_payload(json!({"success": false, "error": "db down"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerRejected);
    }

    #[test]
    fn test_scalar_payload_is_decode_error() {
        assert_eq!(decode_payload(json!(3)).unwrap_err().kind(), ErrorKind::Decode);
    }
}
