//! Compare Origin and ITSM records and push divergent opening hours to ITSM.
//!
//! ## Protocol
//!
//! 1. For every Origin record, scan every ITSM record for the same financial
//!    id. Several ITSM organizations may share one id; each is handled.
//! 2. Equal opening hours → [`UpdateResult::Unchanged`], no request.
//! 3. Different hours (one side absent counts as different) → PATCH the ITSM
//!    organization with the Origin value.
//! 4. A failed PATCH is a warning; the loop continues with the next record.
//!
//! Records present on one side only never produce a request.

use serde::Serialize;
use serde_json::{json, Value};

use storehours_core::{Reporter, ShopRecord};

use crate::error::SyncError;
use crate::normalize::OPENING_HOURS_FIELD;

/// Write side of the ITSM client.
pub trait OrganizationUpdater {
    fn update_organization(&self, organization_id: &str, body: &Value) -> Result<Value, SyncError>;
}

/// Builds the PATCH body for one custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTemplate {
    field_id: String,
}

impl Default for PatchTemplate {
    fn default() -> Self {
        Self::for_field(OPENING_HOURS_FIELD)
    }
}

impl PatchTemplate {
    pub fn for_field(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
        }
    }

    /// `{"custom_fields": [{"id": <field>, "value": <value or null>}]}`
    pub fn render(&self, value: Option<&str>) -> Value {
        json!({
            "custom_fields": [
                { "id": self.field_id, "value": value }
            ]
        })
    }
}

/// Decision for one Origin/ITSM pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NeedsUpdate,
    AlreadyCurrent,
    Unmatched,
}

pub fn decide(origin: &ShopRecord, itsm: &ShopRecord) -> Decision {
    if origin.financial_id != itsm.financial_id {
        Decision::Unmatched
    } else if origin.opening_hours == itsm.opening_hours {
        Decision::AlreadyCurrent
    } else {
        Decision::NeedsUpdate
    }
}

/// Outcome for one matched ITSM organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UpdateResult {
    /// PATCH accepted.
    Updated { financial_id: String, organization: String },
    /// Hours already equal; nothing sent.
    Unchanged { financial_id: String, organization: String },
    /// Dry-run: the PATCH *would* have been sent.
    WouldUpdate { financial_id: String, organization: String },
    /// PATCH sent and rejected.
    Failed {
        financial_id: String,
        organization: String,
        reason: String,
    },
    /// Hours differ but the organization has no internal id to PATCH.
    Skipped { financial_id: String, organization: String },
}

/// Everything one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub results: Vec<UpdateResult>,
    /// Origin financial ids with no ITSM counterpart.
    pub unmatched: Vec<String>,
}

impl ReconcileOutcome {
    /// PATCH calls sent, accepted or not.
    pub fn issued(&self) -> usize {
        self.updated() + self.failed()
    }

    pub fn updated(&self) -> usize {
        self.count(|r| matches!(r, UpdateResult::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|r| matches!(r, UpdateResult::Unchanged { .. }))
    }

    pub fn would_update(&self) -> usize {
        self.count(|r| matches!(r, UpdateResult::WouldUpdate { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, UpdateResult::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, UpdateResult::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&UpdateResult) -> bool) -> usize {
        self.results.iter().filter(|r| pred(r)).count()
    }
}

pub struct Reconciler<'a> {
    updater: &'a dyn OrganizationUpdater,
    reporter: &'a dyn Reporter,
    template: PatchTemplate,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(updater: &'a dyn OrganizationUpdater, reporter: &'a dyn Reporter) -> Self {
        Self {
            updater,
            reporter,
            template: PatchTemplate::default(),
            dry_run: false,
        }
    }

    pub fn with_template(mut self, template: PatchTemplate) -> Self {
        self.template = template;
        self
    }

    /// When set, decide everything but send nothing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn reconcile(&self, origin: &[ShopRecord], itsm: &[ShopRecord]) -> ReconcileOutcome {
        self.reporter
            .debug("System starting compare data about store opening hours");
        let mut outcome = ReconcileOutcome::default();

        for source in origin {
            let mut matched = false;
            for target in itsm {
                let result = match decide(source, target) {
                    Decision::Unmatched => continue,
                    Decision::AlreadyCurrent => {
                        self.reporter
                            .debug(&format!("{} opening hours NOT updated.", target.label()));
                        UpdateResult::Unchanged {
                            financial_id: source.financial_id.to_string(),
                            organization: organization_label(target),
                        }
                    }
                    Decision::NeedsUpdate => self.push_update(source, target),
                };
                matched = true;
                outcome.results.push(result);
            }
            if !matched {
                tracing::debug!("no ITSM organization for financial id {}", source.financial_id);
                outcome.unmatched.push(source.financial_id.to_string());
            }
        }

        self.reporter.debug("System has finished compare the data");
        outcome
    }

    fn push_update(&self, source: &ShopRecord, target: &ShopRecord) -> UpdateResult {
        let financial_id = source.financial_id.to_string();
        let organization = organization_label(target);

        let Some(organization_id) = target.id.as_deref() else {
            self.reporter.warning(&format!(
                "Cannot update {} (financial id {financial_id}): ITSM organization has no id",
                target.label()
            ));
            return UpdateResult::Skipped {
                financial_id,
                organization,
            };
        };

        if self.dry_run {
            self.reporter.info(&format!(
                "[dry-run] {} opening hours would be updated.",
                target.label()
            ));
            return UpdateResult::WouldUpdate {
                financial_id,
                organization,
            };
        }

        let body = self.template.render(source.opening_hours.as_deref());
        match self.updater.update_organization(organization_id, &body) {
            Ok(_) => {
                self.reporter
                    .debug(&format!("{} opening hours updated.", target.label()));
                UpdateResult::Updated {
                    financial_id,
                    organization,
                }
            }
            Err(err) => {
                self.reporter.warning(&format!(
                    "Error while updating organization: {organization_id}! Details: {err}"
                ));
                UpdateResult::Failed {
                    financial_id,
                    organization,
                    reason: err.to_string(),
                }
            }
        }
    }
}

fn organization_label(record: &ShopRecord) -> String {
    record
        .id
        .clone()
        .unwrap_or_else(|| record.label().to_string())
}
