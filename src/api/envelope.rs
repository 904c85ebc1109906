//! Response envelopes used by the backend

use serde::Deserialize;

use crate::api::de;
use crate::error::{DashboardError, Result};
use crate::list::Page;

/// CRUD envelope: `{ success, data, message }`
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

impl<T> DataEnvelope<T> {
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(rejected(self.message));
        }
        self.data
            .ok_or_else(|| DashboardError::Decode("response is missing `data`".into()))
    }
}

/// Acknowledgement for writes: `{ success, message }`
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

impl Ack {
    pub fn into_result(self) -> Result<Option<String>> {
        if self.success {
            Ok(self.message)
        } else {
            Err(rejected(self.message))
        }
    }
}

/// List envelope: `{ success, items }`
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsEnvelope<T> {
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

impl<T> ItemsEnvelope<T> {
    pub fn into_items(self) -> Result<Vec<T>> {
        if self.success {
            Ok(self.items)
        } else {
            Err(rejected(self.message))
        }
    }
}

/// Counter envelope: `{ success, total }`
#[derive(Debug, Clone, Deserialize)]
pub struct TotalEnvelope {
    pub success: bool,
    #[serde(default, deserialize_with = "de::opt_int_from_any")]
    pub total: Option<i64>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

impl TotalEnvelope {
    pub fn into_total(self) -> Result<u64> {
        if !self.success {
            return Err(rejected(self.message));
        }
        let total = self
            .total
            .ok_or_else(|| DashboardError::Decode("response is missing `total`".into()))?;
        u64::try_from(total).map_err(|_| DashboardError::Decode(format!("negative total {}", total)))
    }
}

/// Paginated envelope.
///
/// Feeds name their cursor differently (`cursor_out`, `last_key`, `last_id`)
/// and may send it as a number; all spellings land in `cursor_out`.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope<T> {
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(
        default,
        alias = "last_key",
        alias = "last_id",
        deserialize_with = "de::opt_cursor"
    )]
    pub cursor_out: Option<String>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, alias = "error")]
    pub error_message: Option<String>,
}

impl<T> PageEnvelope<T> {
    pub fn into_page(self) -> Result<Page<T>> {
        if !self.success {
            return Err(rejected(self.error_message));
        }
        Ok(Page {
            items: self.items,
            cursor: self.cursor_out,
            has_more: self.has_more,
        })
    }
}

pub(crate) fn rejected(message: Option<String>) -> DashboardError {
    DashboardError::ServerRejected(
        message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "request declared failure".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_page_with_last_key_alias() {
        let env: PageEnvelope<u32> = serde_json::from_str(
            r#"{"success": true, "items": [1, 2], "last_key": "2024-01-01|2", "has_more": true}"#,
        )
        .unwrap();
        let page = env.into_page().unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.cursor.as_deref(), Some("2024-01-01|2"));
        assert!(page.has_more);
    }

    #[test]
    fn test_page_with_numeric_last_id() {
        let env: PageEnvelope<u32> = serde_json::from_str(
            r#"{"success": true, "items": [], "last_id": 981, "has_more": false}"#,
        )
        .unwrap();
        assert_eq!(env.into_page().unwrap().cursor.as_deref(), Some("981"));
    }

    #[test]
    fn test_failed_page_is_rejected_even_without_items() {
        let env: PageEnvelope<u32> =
            serde_json::from_str(r#"{"success": false, "error": "cliente requerido"}"#).unwrap();
        let err = env.into_page().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerRejected);
        assert!(err.to_string().contains("cliente requerido"));
    }

    #[test]
    fn test_data_envelope_missing_data_is_decode() {
        let env: DataEnvelope<Vec<u32>> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(env.into_data().unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_total_as_string() {
        let env: TotalEnvelope = serde_json::from_str(r#"{"success": true, "total": "42"}"#).unwrap();
        assert_eq!(env.into_total().unwrap(), 42);
    }
}
