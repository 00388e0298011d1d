//! ITSM (4me) client for the organization listing and partial updates.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::SyncError;
use crate::gateway::{HttpGateway, Paged};
use crate::reconcile::OrganizationUpdater;
use crate::transport::Transport;

/// Config section holding the ITSM account (`user`) and API token (`pwd`).
pub const ITSM_SECTION: &str = "ITSM";

/// Which 4me instance to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Prod,
    #[default]
    Qa,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Prod => "https://api.4me.com/v1/",
            Environment::Qa => "https://api.4me.qa/v1/",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Prod => write!(f, "PROD"),
            Environment::Qa => write!(f, "QA"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROD" => Ok(Environment::Prod),
            "QA" => Ok(Environment::Qa),
            other => Err(format!("unknown ITSM environment '{other}'; expected: PROD, QA")),
        }
    }
}

/// Filters for the organization listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub per_page: u32,
    pub source: String,
    pub source_id: String,
    pub fields: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            per_page: 100,
            source: "Origin".to_string(),
            source_id: "Origin_Shop".to_string(),
            fields: "financialID, custom_fields".to_string(),
        }
    }
}

impl ListQuery {
    pub fn params(&self) -> Vec<(String, String)> {
        vec![
            ("per_page".to_string(), self.per_page.to_string()),
            ("source".to_string(), self.source.clone()),
            ("sourceID".to_string(), self.source_id.clone()),
            ("fields".to_string(), self.fields.clone()),
        ]
    }
}

pub struct ItsmClient<'a> {
    gateway: HttpGateway<'a>,
    base_url: String,
    requests: Cell<usize>,
}

impl<'a> ItsmClient<'a> {
    /// `account` goes to `X-4me-Account`, `token` to the bearer header.
    pub fn new(
        transport: &'a dyn Transport,
        base_url: impl Into<String>,
        token: &str,
        account: &str,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let gateway = HttpGateway::new(transport)
            .with_header("Authorization", format!("Bearer {token}"))
            .with_header("X-4me-Account", account);
        Self {
            gateway,
            base_url,
            requests: Cell::new(0),
        }
    }

    /// All organizations matching `query`, across every page.
    ///
    /// A failing page does not raise: the caller decides what to do with
    /// [`Paged::halted`].
    pub fn list_organizations(&self, query: &ListQuery) -> Paged {
        let url = format!("{}organizations", self.base_url);
        let paged = self.gateway.fetch_all(&url, &query.params());
        self.requests
            .set(self.requests.get() + paged.pages + usize::from(paged.halted.is_some()));
        paged
    }

    /// Number of HTTP calls issued so far (listing pages plus updates).
    pub fn used_requests(&self) -> usize {
        self.requests.get()
    }
}

impl OrganizationUpdater for ItsmClient<'_> {
    fn update_organization(&self, organization_id: &str, body: &Value) -> Result<Value, SyncError> {
        let url = format!("{}organization/{organization_id}", self.base_url);
        self.requests.set(self.requests.get() + 1);
        self.gateway.patch_json(&url, body.clone())
    }
}
