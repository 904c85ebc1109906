//! Login session
//!
//! The session is an explicit value published on a watch channel. Whoever
//! needs it subscribes; nothing is read from ambient storage.
//!
//! ```text
//! login(user, password) ──► login_usuario ──► token
//!                                               │
//!                  restore(token) ◄─────────────┘
//!                        │
//!          get_usuario_autenticado (bearer)
//!                        │
//!          ok ──► Authenticated { token, user }
//!          any failure ──► Anonymous
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{de, ApiClient};
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        token: String,
        /// `None` until the profile has been fetched
        user: Option<UserProfile>,
    },
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Authenticated { token, .. } => Some(token),
            Session::Anonymous => None,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Session::Authenticated { user, .. } => user.as_ref(),
            Session::Anonymous => None,
        }
    }

    /// Token for a protected operation
    pub fn require_token(&self) -> Result<&str> {
        self.token()
            .ok_or_else(|| DashboardError::Unauthorized("login required".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "de::string_from_any")]
    pub username: String,
    #[serde(rename = "nombre", default, deserialize_with = "de::opt_string_from_any")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_from_any")]
    pub email: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub usuario: String,
    pub clave: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("usuario", &self.usuario)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default, deserialize_with = "de::opt_string_from_any")]
    pub token: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

/// Produces and publishes the [`Session`]
pub struct AuthClient {
    api: ApiClient,
    tx: watch::Sender<Session>,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        let (tx, _rx) = watch::channel(Session::Anonymous);
        Self { api, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Exchange credentials for a token, then load the profile.
    ///
    /// Fails with `Unauthorized` when the backend hands out no token.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let request = LoginRequest {
            usuario: username.to_string(),
            clave: password.to_string(),
        };

        let response = self.api.login(&request).await?;
        let token = match response.token {
            Some(token) if response.success != Some(false) => token,
            _ => {
                warn!(user = username, "login rejected");
                return Err(DashboardError::Unauthorized(
                    response
                        .message
                        .unwrap_or_else(|| "invalid credentials".to_string()),
                ));
            }
        };

        info!(user = username, "login accepted");
        Ok(self.restore(token).await)
    }

    /// Validate a stored token by fetching its profile.
    ///
    /// Any failure, network included, leaves the session anonymous.
    pub async fn restore(&self, token: String) -> Session {
        let session = match self.api.with_token(token.clone()).authenticated_user().await {
            Ok(user) => {
                info!(user = %user.username, "session restored");
                Session::Authenticated {
                    token,
                    user: Some(user),
                }
            }
            Err(e) => {
                warn!(error = %e, "session restore failed");
                Session::Anonymous
            }
        };

        self.tx.send_replace(session.clone());
        session
    }

    pub fn logout(&self) {
        if self.tx.send_replace(Session::Anonymous).is_authenticated() {
            info!("logged out");
        }
    }

    /// API client carrying the current session's token, if any
    pub fn authorized_api(&self) -> ApiClient {
        self.api.with_session(&self.tx.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_requires_login() {
        let err = Session::Anonymous.require_token().unwrap_err();
        assert!(matches!(err, DashboardError::Unauthorized(_)));
    }

    #[test]
    fn test_authenticated_token() {
        let session = Session::Authenticated {
            token: "t0k".into(),
            user: None,
        };
        assert_eq!(session.require_token().unwrap(), "t0k");
        assert!(session.user().is_none());
    }

    #[test]
    fn test_profile_display_name_falls_back() {
        let user: UserProfile = serde_json::from_str(r#"{"username": "ana", "nombre": ""}"#).unwrap();
        assert_eq!(user.display_name(), "ana");
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let request = LoginRequest {
            usuario: "ana".into(),
            clave: "secret".into(),
        };
        assert!(!format!("{:?}", request).contains("secret"));
    }
}
