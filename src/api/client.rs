//! HTTP client for the dashboard backend
//!
//! The backend exposes a single entry point and dispatches on the `action`
//! query parameter, so every call is `{base_url}?action=<name>&...`.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::api::envelope::{Ack, DataEnvelope, ItemsEnvelope, TotalEnvelope};
use crate::config::ApiConfig;
use crate::error::{DashboardError, Result};
use crate::live::Counter;
use crate::monitor::{self, MonitoredClient};
use crate::resources::{
    AssignmentOptions, City, Client as FleetClient, ClientOption, ClientPayload, ClientUpdate,
    GpsDevice, GpsDevicePayload, InstalledGpsTotals, ModelDistribution, ModelShare, RecentGps,
    VehicleAssignment,
};
use crate::session::{LoginRequest, LoginResponse, Session, UserProfile};

/// Query parameters for an action call, in wire order.
pub type Params = Vec<(String, String)>;

const ASSIGN_VEHICLE: &str = "asignar_vehiculo";

/// Body for actions that also read `action` from the JSON payload
#[derive(Serialize)]
struct ActionBody<'a, T> {
    action: &'a str,
    #[serde(flatten)]
    body: T,
}

impl<'a, T: Serialize> ActionBody<'a, T> {
    fn new(action: &'a str, body: T) -> Self {
        Self { action, body }
    }
}

/// HTTP client for the dashboard backend
///
/// Cheap to clone; clones share the connection pool.
///
/// # Example
///
/// ```rust,no_run
/// use fleet_dashboard::{ApiClient, ApiConfig, Counter};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = ApiClient::new(&ApiConfig::default())?;
/// let clients = api.count(Counter::Clients).await?;
/// println!("{} clients", clients);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DashboardError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            http,
            token: None,
        })
    }

    /// Clone of this client that sends `Authorization: Bearer <token>`
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Clone of this client authorized as `session`; anonymous sessions drop the token
    pub fn with_session(&self, session: &Session) -> Self {
        Self {
            token: session.token().map(str::to_string),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Build `{base_url}?action=<action>&k=v...`
    pub fn action_url(&self, action: &str, params: &[(String, String)]) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{}{}action={}",
            self.base_url,
            separator,
            urlencoding::encode(action)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// GET an action and decode the body as `T`
    pub async fn get_action<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let url = self.action_url(action, params);
        debug!(action, params = params.len(), "GET action");

        let response = self.authorize(self.http.get(&url)).send().await?;
        self.handle_response(action, response).await
    }

    /// POST a JSON body to an action and decode the body as `T`
    pub async fn post_action<B, T>(&self, action: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.action_url(action, &[]);
        debug!(action, "POST action");

        let response = self
            .authorize(self.http.post(&url))
            .json(body)
            .send()
            .await?;
        self.handle_response(action, response).await
    }

    // ==================== Counters ====================

    /// Current value of a dashboard counter
    pub async fn count(&self, counter: Counter) -> Result<u64> {
        let envelope: TotalEnvelope = self.get_action(counter.action(), &[]).await?;
        envelope.into_total()
    }

    // ==================== Monitoring ====================

    /// Clients with their terminals, groups flattened in server order
    pub async fn monitor_clients(&self) -> Result<Vec<MonitoredClient>> {
        let payload: serde_json::Value = self.get_action("monitor_clientes", &[]).await?;
        monitor::decode_payload(payload)
    }

    // ==================== Clients ====================

    /// Client selector options (`codigo`, `nombre`)
    pub async fn client_options(&self) -> Result<Vec<ClientOption>> {
        let envelope: ItemsEnvelope<ClientOption> = self.get_action("list_clientes", &[]).await?;
        envelope.into_items()
    }

    /// All clients
    pub async fn list_clients(&self) -> Result<Vec<FleetClient>> {
        let envelope: DataEnvelope<Vec<FleetClient>> =
            self.get_action("get_clientes", &[]).await?;
        envelope.into_data()
    }

    /// Only enabled clients
    pub async fn list_enabled_clients(&self) -> Result<Vec<FleetClient>> {
        let params = vec![("habilitado".to_string(), "1".to_string())];
        let envelope: DataEnvelope<Vec<FleetClient>> =
            self.get_action("get_cliente", &params).await?;
        envelope.into_data()
    }

    pub async fn insert_client(&self, payload: &ClientPayload) -> Result<Option<String>> {
        let ack: Ack = self.post_action("insert_cliente", payload).await?;
        ack.into_result()
    }

    pub async fn update_client(&self, update: &ClientUpdate) -> Result<Option<String>> {
        let ack: Ack = self.post_action("update_cliente", update).await?;
        ack.into_result()
    }

    /// Enable or disable a client
    pub async fn set_client_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        let body = serde_json::json!({ "id": id, "habilitado": u8::from(enabled) });
        let ack: Ack = self.post_action("cambiar_estado_cliente", &body).await?;
        ack.into_result().map(|_| ())
    }

    pub async fn cities(&self) -> Result<Vec<City>> {
        let envelope: DataEnvelope<Vec<City>> = self.get_action("ciudades", &[]).await?;
        envelope.into_data()
    }

    // ==================== GPS devices ====================

    /// GPS devices matching the given column filters (blank values ignored)
    pub async fn list_gps_devices(
        &self,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<GpsDevice>> {
        let params: Params = filters
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .collect();
        let envelope: DataEnvelope<Vec<GpsDevice>> =
            self.get_action("get_equipos_gps", &params).await?;
        envelope.into_data()
    }

    pub async fn insert_gps_device(&self, payload: &GpsDevicePayload) -> Result<Option<String>> {
        let ack: Ack = self.post_action("insert_equipo", payload).await?;
        ack.into_result()
    }

    /// Vehicles and owners the device can be assigned to
    pub async fn vehicles_for_assignment(&self, device_id: i64) -> Result<AssignmentOptions> {
        let body = ActionBody::new(ASSIGN_VEHICLE, VehicleAssignment::list(device_id));
        let envelope: DataEnvelope<AssignmentOptions> =
            self.post_action(ASSIGN_VEHICLE, &body).await?;
        envelope.into_data()
    }

    pub async fn assign_vehicle(&self, assignment: &VehicleAssignment) -> Result<Option<String>> {
        let body = ActionBody::new(ASSIGN_VEHICLE, assignment);
        let ack: Ack = self.post_action(ASSIGN_VEHICLE, &body).await?;
        ack.into_result()
    }

    // ==================== Statistics ====================

    pub async fn model_distribution(&self) -> Result<Vec<ModelShare>> {
        let response: ModelDistribution = self.get_action("distribucion_modelos_gps", &[]).await?;
        response.into_shares()
    }

    pub async fn installed_gps_totals(&self) -> Result<InstalledGpsTotals> {
        self.get_action("contar_gps_instalados", &[]).await
    }

    pub async fn recent_gps(&self) -> Result<Vec<GpsDevice>> {
        let response: RecentGps = self.get_action("ultimos_5_gps_ingresados", &[]).await?;
        response.into_devices()
    }

    // ==================== Session ====================

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.post_action("login_usuario", request).await
    }

    /// Profile of the user owning the bearer token
    pub async fn authenticated_user(&self) -> Result<UserProfile> {
        if self.token.is_none() {
            return Err(DashboardError::Unauthorized("no session token".into()));
        }
        let envelope: ProfileEnvelope = self
            .post_action("get_usuario_autenticado", &serde_json::json!({}))
            .await?;
        match (envelope.success, envelope.usuario) {
            (true, Some(user)) => Ok(user),
            (true, None) => Err(DashboardError::Decode("response is missing `usuario`".into())),
            (false, _) => Err(DashboardError::Unauthorized(
                envelope.message.unwrap_or_else(|| "token rejected".into()),
            )),
        }
    }

    // ==================== Helper Methods ====================

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        action: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DashboardError::Unauthorized(format!("{} returned {}", action, status)));
        }

        if !status.is_success() {
            return Err(DashboardError::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| DashboardError::Decode(format!("{}: {}", action, e)))
    }
}

#[derive(Debug, serde::Deserialize)]
struct ProfileEnvelope {
    success: bool,
    #[serde(default)]
    usuario: Option<UserProfile>,
    #[serde(default, alias = "error")]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_action_url_encodes_params() {
        let api = client("http://localhost/backend.php");
        let url = api.action_url(
            "ultimos_gps_paginados",
            &[("q".to_string(), "86 07".to_string())],
        );
        assert_eq!(
            url,
            "http://localhost/backend.php?action=ultimos_gps_paginados&q=86%2007"
        );
    }

    #[test]
    fn test_action_url_with_existing_query() {
        let api = client("http://localhost/backend.php?tenant=a");
        assert_eq!(
            api.action_url("ciudades", &[]),
            "http://localhost/backend.php?tenant=a&action=ciudades"
        );
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let api = client("http://localhost/backend.php").with_token("abc");
        assert!(api.is_authenticated());
        assert_eq!(api.base_url(), "http://localhost/backend.php");
    }
}
