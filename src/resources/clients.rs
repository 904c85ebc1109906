//! Fleet clients and their create/edit form

use serde::{Deserialize, Deserializer, Serialize};

use crate::api::de;
use crate::error::{DashboardError, Result};

/// A client as listed by `get_clientes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(deserialize_with = "de::int_from_any")]
    pub id: i64,
    #[serde(rename = "nombre_cliente", default, deserialize_with = "de::string_from_any")]
    pub name: String,
    #[serde(rename = "nombre_bd", default, deserialize_with = "de::string_from_any")]
    pub database_name: String,
    #[serde(rename = "ciudad_cliente", default, deserialize_with = "de::string_from_any")]
    pub city: String,
    #[serde(rename = "puerto_bd", default, deserialize_with = "de::opt_nonzero_int")]
    pub database_port: Option<i64>,
    #[serde(rename = "puerto_escucha", default, deserialize_with = "de::opt_nonzero_int")]
    pub listener_port: Option<i64>,
    #[serde(rename = "habilitado", default, deserialize_with = "enabled_flag")]
    pub enabled: bool,
}

fn enabled_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de::opt_nonzero_int(deserializer)?.is_some())
}

/// Editable client fields, kept as entered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientForm {
    pub name: String,
    pub database_name: String,
    pub city: String,
    pub database_port: String,
    pub listener_port: String,
    pub enabled: bool,
    /// Read-only on edit; blank for new clients
    pub intranet_id: String,
}

impl ClientForm {
    /// Human-readable problems, empty when the form can be submitted
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("client name is required".to_string());
        }
        if self.database_name.trim().is_empty() {
            errors.push("database name is required".to_string());
        }
        if self.city.trim().is_empty() {
            errors.push("client city is required".to_string());
        }
        if parse_number(&self.database_port).is_none() {
            errors.push("invalid database port".to_string());
        }
        if parse_number(&self.listener_port).is_none() {
            errors.push("invalid listener port".to_string());
        }
        if !self.intranet_id.trim().is_empty() && parse_number(&self.intranet_id).is_none() {
            errors.push("intranet client id must be numeric".to_string());
        }

        errors
    }

    /// Validated payload for `insert_cliente`
    pub fn into_payload(self) -> Result<ClientPayload> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(DashboardError::Validation(errors));
        }

        Ok(ClientPayload {
            database_port: parse_number(&self.database_port).unwrap_or_default(),
            listener_port: parse_number(&self.listener_port).unwrap_or_default(),
            intranet_id: parse_number(&self.intranet_id).unwrap_or_default(),
            name: self.name.trim().to_string(),
            database_name: self.database_name.trim().to_string(),
            city: self.city.trim().to_string(),
            enabled: u8::from(self.enabled),
        })
    }

    /// Validated payload for `update_cliente`
    pub fn into_update(self, id: i64) -> Result<ClientUpdate> {
        Ok(ClientUpdate {
            id,
            payload: self.into_payload()?,
        })
    }
}

impl From<&Client> for ClientForm {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            database_name: client.database_name.clone(),
            city: client.city.clone(),
            database_port: client.database_port.map(|p| p.to_string()).unwrap_or_default(),
            listener_port: client.listener_port.map(|p| p.to_string()).unwrap_or_default(),
            enabled: client.enabled,
            intranet_id: client.id.to_string(),
        }
    }
}

fn parse_number(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientPayload {
    #[serde(rename = "nombre_cliente")]
    pub name: String,
    #[serde(rename = "nombre_bd")]
    pub database_name: String,
    #[serde(rename = "ciudad_cliente")]
    pub city: String,
    #[serde(rename = "puerto_bd")]
    pub database_port: i64,
    #[serde(rename = "puerto_escucha")]
    pub listener_port: i64,
    #[serde(rename = "habilitado")]
    pub enabled: u8,
    #[serde(rename = "id_cliente_intranet")]
    pub intranet_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientUpdate {
    pub id: i64,
    #[serde(flatten)]
    pub payload: ClientPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    #[serde(deserialize_with = "de::int_from_any")]
    pub id: i64,
    #[serde(rename = "ciudad", default, deserialize_with = "de::string_from_any")]
    pub name: String,
}

/// Entry of the client selector on the dispatch view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOption {
    #[serde(rename = "codigo", deserialize_with = "de::string_from_any")]
    pub code: String,
    #[serde(rename = "nombre", default, deserialize_with = "de::string_from_any")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ClientForm {
        ClientForm {
            name: "Buses Araucanía".into(),
            database_name: "araucania".into(),
            city: "Temuco".into(),
            database_port: "5432".into(),
            listener_port: "7001".into(),
            enabled: true,
            intranet_id: String::new(),
        }
    }

    #[test]
    fn test_decode_loose_client() {
        let client: Client = serde_json::from_str(
            r#"{"id": "12", "nombre_cliente": "A", "nombre_bd": "a", "ciudad_cliente": "Temuco",
                "puerto_bd": "5432", "puerto_escucha": "", "habilitado": "1"}"#,
        )
        .unwrap();
        assert_eq!(client.id, 12);
        assert_eq!(client.database_port, Some(5432));
        assert_eq!(client.listener_port, None);
        assert!(client.enabled);
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let form = ClientForm {
            name: "  ".into(),
            database_port: "abc".into(),
            listener_port: String::new(),
            ..form()
        };
        let errors = form.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"client name is required".to_string()));
    }

    #[test]
    fn test_invalid_form_is_validation_error() {
        let err = ClientForm::default().into_payload().unwrap_err();
        assert!(matches!(err, DashboardError::Validation(ref e) if e.len() == 5));
    }

    #[test]
    fn test_update_payload_flattens() {
        let update = form().into_update(12).unwrap();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["id"], 12);
        assert_eq!(json["puerto_bd"], 5432);
        assert_eq!(json["habilitado"], 1);
        assert_eq!(json["id_cliente_intranet"], 0);
    }

    #[test]
    fn test_edit_form_carries_intranet_id() {
        let client = Client {
            id: 9,
            name: "A".into(),
            database_name: "a".into(),
            city: "Temuco".into(),
            database_port: Some(5432),
            listener_port: None,
            enabled: false,
        };
        let form = ClientForm::from(&client);
        assert_eq!(form.intranet_id, "9");
        assert_eq!(form.listener_port, "");
    }
}
