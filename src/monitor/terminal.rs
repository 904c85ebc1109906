//! Client terminals as reported by the monitoring endpoint

use serde::{Deserialize, Serialize};

use crate::api::de;

/// Replica health of a terminal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TerminalStatus {
    Ok,
    SevereError,
    Disconnected,
    /// Anything the backend invents later; treated as a problem
    Other(String),
}

impl TerminalStatus {
    /// Normalise the backend's spellings, including its HTML-escaped one.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim() {
            "OK" => TerminalStatus::Ok,
            "Error grave" => TerminalStatus::SevereError,
            "Sin Conexión" | "Sin Conexi&oacute;n" | "Sin Conexion" => TerminalStatus::Disconnected,
            other => TerminalStatus::Other(other.to_string()),
        }
    }

    pub fn is_problem(&self) -> bool {
        !matches!(self, TerminalStatus::Ok)
    }

    pub fn label(&self) -> &str {
        match self {
            TerminalStatus::Ok => "OK",
            TerminalStatus::SevereError => "Error grave",
            TerminalStatus::Disconnected => "Sin Conexión",
            TerminalStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for TerminalStatus {
    fn from(raw: String) -> Self {
        TerminalStatus::normalize(&raw)
    }
}

impl From<TerminalStatus> for String {
    fn from(status: TerminalStatus) -> Self {
        status.label().to_string()
    }
}

impl std::fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    #[serde(default, deserialize_with = "de::string_from_any")]
    pub ip_vpn: String,
    #[serde(rename = "estado_replica_remota")]
    pub status: TerminalStatus,
    #[serde(
        rename = "fecha_hora_actualizacion_replica",
        default,
        deserialize_with = "de::opt_string_from_any"
    )]
    pub last_replica_update: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredClient {
    #[serde(deserialize_with = "de::string_from_any")]
    pub pk: String,
    #[serde(rename = "codigo", deserialize_with = "de::string_from_any")]
    pub code: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "ciudad", default)]
    pub city: String,
    #[serde(
        rename = "puerto_escucha_receptor",
        default,
        deserialize_with = "de::opt_string_from_any"
    )]
    pub listener_port: Option<String>,
    #[serde(rename = "terminales", default)]
    pub terminals: Vec<Terminal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_escaped_status() {
        assert_eq!(TerminalStatus::normalize("Sin Conexi&oacute;n"), TerminalStatus::Disconnected);
        assert_eq!(TerminalStatus::normalize("Sin Conexion"), TerminalStatus::Disconnected);
        assert_eq!(TerminalStatus::normalize("OK"), TerminalStatus::Ok);
        assert!(TerminalStatus::normalize("Replica detenida").is_problem());
        assert!(!TerminalStatus::Ok.is_problem());
    }

    #[test]
    fn test_decode_client() {
        let client: MonitoredClient = serde_json::from_str(
            r#"{
                "pk": 3, "codigo": "C", "nombre": "Buses C", "ciudad": "Temuco",
                "puerto_escucha_receptor": null,
                "terminales": [
                    {"ip_vpn": "10.8.0.2", "estado_replica_remota": "Error grave",
                     "fecha_hora_actualizacion_replica": "2024-05-01 10:00:00"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(client.pk, "3");
        assert_eq!(client.terminals[0].status, TerminalStatus::SevereError);
    }
}
