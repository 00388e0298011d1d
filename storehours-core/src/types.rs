//! Domain types shared by the Origin and ITSM sides of a sync run.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Cross-system join key identifying a physical store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FinancialId(pub String);

impl fmt::Display for FinancialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for FinancialId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FinancialId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A store normalized from either service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopRecord {
    pub financial_id: FinancialId,
    /// ITSM internal id. Always `None` for Origin records.
    pub id: Option<String>,
    pub name: Option<String>,
    /// Canonical multi-line `"<date>: <from> - <to>"` text.
    pub opening_hours: Option<String>,
}

impl ShopRecord {
    pub fn new(financial_id: impl Into<FinancialId>, opening_hours: Option<String>) -> Self {
        Self {
            financial_id: financial_id.into(),
            id: None,
            name: None,
            opening_hours,
        }
    }

    /// Name for log lines, falling back to the financial id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.financial_id.0)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Login plus plaintext secret. The secret is wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub login: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("secret", &"<redacted>")
            .finish()
    }
}
