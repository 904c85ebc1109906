//! Paginated feeds: recently installed GPS units and client dispatches

use serde::{Deserialize, Serialize};

use crate::api::{de, ApiClient};
use crate::list::{HttpPageSource, ListController, ListOptions, PageEndpoint};

/// Placeholder date the backend uses for "never"
const NULL_DATE: &str = "1996-01-01";
const NULL_TIME: &str = "00:00:00";

/// Filter naming the dispatch client; nothing is fetched while it is blank
pub const DISPATCH_CLIENT_FILTER: &str = "cliente";

/// Column filters accepted by `ultimos_despachos_paginados`
pub const DISPATCH_FILTERS: [&str; 8] = [
    "id",
    "id_guia",
    "fecha_salida",
    "nombre_conductor",
    "nro_interno",
    "patente",
    "destino",
    "sentido",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsFeedItem {
    #[serde(deserialize_with = "de::int_from_any")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::string_from_any")]
    pub imei: String,
    #[serde(rename = "modelo", default, deserialize_with = "de::string_from_any")]
    pub model: String,
    #[serde(rename = "fecha_asignacion", default, deserialize_with = "de::string_from_any")]
    pub assigned_at: String,
    #[serde(rename = "ciudad", default, deserialize_with = "de::string_from_any")]
    pub city: String,
    #[serde(rename = "nombre_cliente", default, deserialize_with = "de::string_from_any")]
    pub client_name: String,
    #[serde(rename = "compania", default, deserialize_with = "de::string_from_any")]
    pub carrier: String,
    #[serde(default, deserialize_with = "de::string_from_any")]
    pub icc: String,
    #[serde(rename = "nro_telefono", default, deserialize_with = "de::string_from_any")]
    pub phone_number: String,
}

/// Trip direction of a dispatch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Outbound,
    Return,
    Other(String),
}

impl Direction {
    pub fn label(&self) -> &str {
        match self {
            Direction::Outbound => "Ida",
            Direction::Return => "Retorno",
            Direction::Other(raw) => raw,
        }
    }
}

impl From<String> for Direction {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "Ida" => Direction::Outbound,
            "Retorno" => Direction::Return,
            other => Direction::Other(other.to_string()),
        }
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.label().to_string()
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Other(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatch {
    #[serde(deserialize_with = "de::int_from_any")]
    pub id: i64,
    #[serde(rename = "id_guia", default, deserialize_with = "de::string_from_any")]
    pub guide_id: String,
    #[serde(rename = "fecha_salida", default, deserialize_with = "de::string_from_any")]
    pub departure_date: String,
    #[serde(rename = "hora_salida", default, deserialize_with = "de::string_from_any")]
    pub departure_time: String,
    #[serde(rename = "turno", default, deserialize_with = "de::string_from_any")]
    pub shift: String,
    #[serde(rename = "estado_turno", default, deserialize_with = "de::string_from_any")]
    pub shift_status: String,
    #[serde(rename = "nombre_conductor", default, deserialize_with = "de::string_from_any")]
    pub driver_name: String,
    #[serde(rename = "nro_interno", default, deserialize_with = "de::string_from_any")]
    pub internal_number: String,
    #[serde(rename = "patente", default, deserialize_with = "de::string_from_any")]
    pub plate: String,
    #[serde(rename = "nro_vuelta", default, deserialize_with = "de::string_from_any")]
    pub lap: String,
    #[serde(rename = "destino", default, deserialize_with = "de::string_from_any")]
    pub destination: String,
    #[serde(rename = "nombre_servicio", default, deserialize_with = "de::opt_string_from_any")]
    pub service_name: Option<String>,
    #[serde(rename = "sentido", default)]
    pub direction: Direction,
    #[serde(rename = "fecha_descarga", default, deserialize_with = "de::string_from_any")]
    pub unload_date: String,
    #[serde(rename = "hora_descarga", default, deserialize_with = "de::string_from_any")]
    pub unload_time: String,
    #[serde(rename = "fecha_hora_asignacion", default, deserialize_with = "de::string_from_any")]
    pub assigned_at: String,
    #[serde(rename = "nombre_inspector", default, deserialize_with = "de::string_from_any")]
    pub inspector_name: String,
}

impl Dispatch {
    pub fn departure_display(&self) -> String {
        format_date_time(&self.departure_date, &self.departure_time)
    }

    pub fn unload_display(&self) -> String {
        format_date_time(&self.unload_date, &self.unload_time)
    }
}

/// `YYYY-MM-DD` as `DD-MM-YYYY`; the null date renders as `-`.
pub fn format_date(date: &str) -> String {
    if date == NULL_DATE {
        return "-".to_string();
    }
    let mut parts = date.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), Some(day)) => format!("{}-{}-{}", day, month, year),
        _ => date.to_string(),
    }
}

/// `HH:MM:SS` as `HH:MM`; the null time renders as `-`.
pub fn format_time(time: &str) -> String {
    if time == NULL_TIME {
        return "-".to_string();
    }
    time.chars().take(5).collect()
}

pub fn format_date_time(date: &str, time: &str) -> String {
    if date == NULL_DATE || time == NULL_TIME {
        return "-".to_string();
    }
    format!("{} {}", format_date(date), format_time(time))
}

/// `ultimos_gps_paginados`: `last_id` cursor, `q` search
pub fn gps_feed_endpoint() -> PageEndpoint {
    PageEndpoint::new("ultimos_gps_paginados", "last_id").with_search_param("q")
}

/// `ultimos_despachos_paginados`: `cursor` + `direction=next`, `limit` page size
pub fn dispatch_endpoint() -> PageEndpoint {
    PageEndpoint::new("ultimos_despachos_paginados", "cursor")
        .with_cursor_companion("direction", "next")
        .with_page_size_param("limit")
}

pub type GpsFeed = ListController<HttpPageSource<GpsFeedItem>>;
pub type DispatchFeed = ListController<HttpPageSource<Dispatch>>;

pub fn gps_feed(api: ApiClient, options: ListOptions) -> GpsFeed {
    ListController::new(HttpPageSource::new(api, gps_feed_endpoint()), options)
}

/// Dispatch list; stays idle until a client is selected
pub fn dispatch_feed(api: ApiClient, options: ListOptions) -> DispatchFeed {
    let options = options.with_required_filter(DISPATCH_CLIENT_FILTER);
    ListController::new(HttpPageSource::new(api, dispatch_endpoint()), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_date_and_time_render_as_dash() {
        assert_eq!(format_date("1996-01-01"), "-");
        assert_eq!(format_date("2024-05-07"), "07-05-2024");
        assert_eq!(format_time("00:00:00"), "-");
        assert_eq!(format_time("08:15:30"), "08:15");
        assert_eq!(format_date_time("2024-05-07", "00:00:00"), "-");
        assert_eq!(format_date_time("2024-05-07", "08:15:30"), "07-05-2024 08:15");
    }

    #[test]
    fn test_decode_dispatch() {
        let dispatch: Dispatch = serde_json::from_str(
            r#"{"id": 5, "id_guia": 991, "fecha_salida": "2024-05-07", "hora_salida": "08:15:00",
                "nro_vuelta": 2, "sentido": "Retorno", "nombre_servicio": null}"#,
        )
        .unwrap();
        assert_eq!(dispatch.direction, Direction::Return);
        assert_eq!(dispatch.guide_id, "991");
        assert_eq!(dispatch.service_name, None);
        assert_eq!(dispatch.departure_display(), "07-05-2024 08:15");
    }

    #[test]
    fn test_dispatch_filters_exclude_client() {
        assert!(!DISPATCH_FILTERS.contains(&DISPATCH_CLIENT_FILTER));
    }
}
