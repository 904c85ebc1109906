//! GPS devices

use serde::{Deserialize, Serialize};

use crate::api::de;
use crate::error::{DashboardError, Result};

/// Device row from `get_equipos_gps` and `ultimos_5_gps_ingresados`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsDevice {
    #[serde(deserialize_with = "de::int_from_any")]
    pub id: i64,
    #[serde(rename = "modelo", default, deserialize_with = "de::string_from_any")]
    pub model: String,
    #[serde(rename = "estado", default, deserialize_with = "de::string_from_any")]
    pub status: String,
    #[serde(rename = "fecha_asignacion", default, deserialize_with = "de::string_from_any")]
    pub assigned_at: String,
    #[serde(rename = "ciudad", default, deserialize_with = "de::string_from_any")]
    pub city: String,
    #[serde(default, deserialize_with = "de::string_from_any")]
    pub imei: String,
    #[serde(rename = "chip", default, deserialize_with = "de::string_from_any")]
    pub sim: String,
    #[serde(rename = "compania", default, deserialize_with = "de::string_from_any")]
    pub carrier: String,
    #[serde(rename = "id_cliente", default, deserialize_with = "de::opt_nonzero_int")]
    pub client_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpsDeviceForm {
    pub model: String,
    pub status: String,
    pub assigned_at: String,
    pub city: String,
    pub imei: String,
    pub sim: String,
    pub carrier: String,
    pub client_id: String,
}

impl GpsDeviceForm {
    pub fn validate(&self) -> Vec<String> {
        self.check().0
    }

    pub fn into_payload(self) -> Result<GpsDevicePayload> {
        let client_id = match self.check() {
            (errors, Some(client_id)) if errors.is_empty() => client_id,
            (errors, _) => return Err(DashboardError::Validation(errors)),
        };

        Ok(GpsDevicePayload {
            model: self.model.trim().to_string(),
            status: self.status.trim().to_string(),
            assigned_at: self.assigned_at.trim().to_string(),
            city: self.city.trim().to_string(),
            imei: self.imei.trim().to_string(),
            sim: self.sim.trim().to_string(),
            carrier: self.carrier.trim().to_string(),
            client_id,
        })
    }

    /// Validation errors plus the client id, parsed once
    fn check(&self) -> (Vec<String>, Option<i64>) {
        let mut errors = Vec::new();
        if self.imei.trim().is_empty() {
            errors.push("IMEI is required".to_string());
        }
        let client_id = self.client_id.trim().parse::<i64>().ok();
        if client_id.is_none() {
            errors.push("client id is required and must be numeric".to_string());
        }
        (errors, client_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpsDevicePayload {
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "fecha_asignacion")]
    pub assigned_at: String,
    #[serde(rename = "ciudad")]
    pub city: String,
    pub imei: String,
    #[serde(rename = "chip")]
    pub sim: String,
    #[serde(rename = "compania")]
    pub carrier: String,
    #[serde(rename = "id_cliente")]
    pub client_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imei_and_client_required() {
        let errors = GpsDeviceForm {
            client_id: "x1".into(),
            ..Default::default()
        }
        .validate();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_rejected_form_reports_every_error_once() {
        let err = GpsDeviceForm {
            imei: " ".into(),
            client_id: "abc".into(),
            ..Default::default()
        }
        .into_payload()
        .unwrap_err();
        match err {
            DashboardError::Validation(errors) => assert_eq!(
                errors,
                vec![
                    "IMEI is required".to_string(),
                    "client id is required and must be numeric".to_string(),
                ]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_wire_names() {
        let payload = GpsDeviceForm {
            model: "FMB920".into(),
            imei: " 860000000000001 ".into(),
            client_id: "4".into(),
            ..Default::default()
        }
        .into_payload()
        .unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["modelo"], "FMB920");
        assert_eq!(json["imei"], "860000000000001");
        assert_eq!(json["id_cliente"], 4);
    }

    #[test]
    fn test_decode_string_ids() {
        let device: GpsDevice = serde_json::from_str(
            r#"{"id": "3", "modelo": "FMB920", "imei": 860000000000001, "id_cliente": "7"}"#,
        )
        .unwrap();
        assert_eq!(device.id, 3);
        assert_eq!(device.imei, "860000000000001");
        assert_eq!(device.client_id, Some(7));
    }
}
