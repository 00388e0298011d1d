//! Origin client: token exchange and the shop opening-hours listing.
//!
//! Every failure on this path is fatal for the run: without source data
//! there is nothing to reconcile.

use std::fmt;

use serde_json::{json, Value};

use storehours_core::Credentials;

use crate::error::SyncError;
use crate::gateway::HttpGateway;
use crate::transport::Transport;

/// Config section with the Origin service account.
pub const ORIGIN_SECTION: &str = "ORIGIN";
/// Config section with the Origin API client id (`user`) and secret (`pwd`).
pub const ORIGIN_CLIENT_SECTION: &str = "ORIGIN2";

/// Bearer token issued by Origin. May be empty when Origin answered without
/// one; [`OriginClient::fetch_shops`] refuses to use an empty token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn bearer(&self) -> Result<String, SyncError> {
        if self.is_empty() {
            return Err(SyncError::Auth(
                "Origin did not issue an access token; refusing an unauthenticated request"
                    .to_string(),
            ));
        }
        Ok(format!("Bearer {}", self.0))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("AccessToken(<empty>)")
        } else {
            f.write_str("AccessToken(<redacted>)")
        }
    }
}

pub struct OriginClient<'a> {
    transport: &'a dyn Transport,
    base_url: String,
}

impl<'a> OriginClient<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Exchange the service account and API client credentials for a token.
    ///
    /// A 200 answer without `success: true` and `content.accessToken` yields an
    /// empty token rather than an error; non-2xx answers are errors.
    pub fn authenticate(
        &self,
        account: &Credentials,
        client: &Credentials,
    ) -> Result<AccessToken, SyncError> {
        let url = format!("{}/api/token/create", self.base_url);
        let body = json!({
            "userName": format!("APP\\{}", account.login),
            "password": account.secret,
            "clientId": client.login,
            "clientSecret": client.secret,
        });

        let (status, payload) = HttpGateway::new(self.transport).post_json(&url, body)?;
        if status != 200 {
            tracing::warn!("Origin token endpoint answered {status}; no token issued");
            return Ok(AccessToken::new(""));
        }
        Ok(AccessToken::new(extract_token(&payload).unwrap_or_default()))
    }

    /// `GET /api/v2/shop?expand=WorkHours` with the bearer token.
    pub fn fetch_shops(&self, token: &AccessToken) -> Result<Value, SyncError> {
        let url = format!("{}/api/v2/shop", self.base_url);
        let gateway = HttpGateway::new(self.transport).with_header("Authorization", token.bearer()?);
        let query = [("expand".to_string(), "WorkHours".to_string())];
        let payload = gateway.get_json(&url, &query)?;
        if !payload.is_object() {
            return Err(SyncError::Shape {
                url,
                message: format!(
                    "expected an object with content.results, got {}",
                    crate::gateway::kind(&payload)
                ),
            });
        }
        Ok(payload)
    }
}

fn extract_token(payload: &Value) -> Option<String> {
    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    payload
        .get("content")?
        .get("accessToken")?
        .as_str()
        .map(str::to_string)
}
