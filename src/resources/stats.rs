//! GPS statistics panels

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::api::de;
use crate::api::envelope::rejected;
use crate::error::Result;
use crate::resources::GpsDevice;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelShare {
    #[serde(rename = "modelo", default, deserialize_with = "de::string_from_any")]
    pub model: String,
    #[serde(rename = "cantidad", deserialize_with = "de::int_from_any")]
    pub count: i64,
    #[serde(rename = "porcentaje", default, deserialize_with = "float_from_any")]
    pub percentage: f64,
}

fn float_from_any<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("expected number, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected number, got {:?}", s))),
        Value::Null => Ok(0.0),
        other => Err(D::Error::custom(format!("expected number, got {}", other))),
    }
}

/// `distribucion_modelos_gps` response
#[derive(Debug, Deserialize)]
pub struct ModelDistribution {
    pub success: bool,
    #[serde(default)]
    pub modelos: Vec<ModelShare>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ModelDistribution {
    pub fn into_shares(self) -> Result<Vec<ModelShare>> {
        if !self.success {
            return Err(rejected(self.error));
        }
        Ok(self.modelos)
    }
}

/// `contar_gps_instalados` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledGpsTotals {
    #[serde(rename = "total_gps_instalados", deserialize_with = "de::int_from_any")]
    pub total: i64,
    #[serde(rename = "totales_por_cliente", default)]
    pub per_client: BTreeMap<String, i64>,
}

impl InstalledGpsTotals {
    /// Clients by installed count, largest first; ties by name
    pub fn ranked(&self) -> Vec<(&str, i64)> {
        let mut ranked: Vec<_> = self
            .per_client
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn top(&self, n: usize) -> Vec<(&str, i64)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

/// `ultimos_5_gps_ingresados` response
#[derive(Debug, Deserialize)]
pub struct RecentGps {
    pub success: bool,
    #[serde(default)]
    pub ultimos_gps: Vec<GpsDevice>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RecentGps {
    pub fn into_devices(self) -> Result<Vec<GpsDevice>> {
        if !self.success {
            return Err(rejected(self.error));
        }
        Ok(self.ultimos_gps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_top_clients() {
        let totals: InstalledGpsTotals = serde_json::from_str(
            r#"{"total_gps_instalados": "9",
                "totales_por_cliente": {"b": 3, "a": 3, "c": 1, "d": 2}}"#,
        )
        .unwrap();
        assert_eq!(totals.total, 9);
        assert_eq!(totals.top(3), vec![("a", 3), ("b", 3), ("d", 2)]);
        assert_eq!(totals.ranked().len(), 4);
    }

    #[test]
    fn test_distribution_failure() {
        let response: ModelDistribution =
            serde_json::from_str(r#"{"success": false, "error": "sin datos"}"#).unwrap();
        assert_eq!(response.into_shares().unwrap_err().kind(), ErrorKind::ServerRejected);
    }

    #[test]
    fn test_percentage_as_string() {
        let share: ModelShare =
            serde_json::from_str(r#"{"modelo": "FMB920", "cantidad": "12", "porcentaje": "37.5"}"#)
                .unwrap();
        assert_eq!(share.count, 12);
        assert!((share.percentage - 37.5).abs() < f64::EPSILON);
    }
}
