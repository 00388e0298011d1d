//! One sync run, from credential unwrapping to the ITSM write-back.

use serde::Serialize;

use storehours_core::{ConfigStore, CredentialVault, Reporter};

use crate::error::SyncError;
use crate::itsm::{ItsmClient, ITSM_SECTION};
use crate::normalize::{normalize_itsm, normalize_origin};
use crate::origin::{OriginClient, ORIGIN_CLIENT_SECTION, ORIGIN_SECTION};
use crate::reconcile::{Reconciler, UpdateResult};
use crate::settings::JobSettings;
use crate::transport::Transport;

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub origin_records: usize,
    pub itsm_records: usize,
    pub itsm_pages: usize,
    /// The ITSM listing stopped early; reconciliation used partial data.
    pub listing_truncated: bool,
    pub updated: usize,
    pub failed: usize,
    pub unchanged: usize,
    pub would_update: usize,
    pub skipped: usize,
    /// Origin financial ids with no ITSM organization.
    pub unmatched: Vec<String>,
    pub results: Vec<UpdateResult>,
}

impl SyncReport {
    /// PATCH calls sent, accepted or not.
    pub fn issued(&self) -> usize {
        self.updated + self.failed
    }
}

/// Run the whole job against `transport`.
///
/// Errors returned here are fatal for the run: missing or undecryptable
/// credentials and any Origin failure. ITSM listing and update failures are
/// reported as warnings and folded into the [`SyncReport`].
pub fn run(
    settings: &JobSettings,
    config: &ConfigStore,
    transport: &dyn Transport,
    reporter: &dyn Reporter,
) -> Result<SyncReport, SyncError> {
    let vault = CredentialVault::new(config);
    let itsm_creds = vault.credentials(ITSM_SECTION)?;
    let origin_account = vault.credentials(ORIGIN_SECTION)?;
    let origin_client = vault.credentials(ORIGIN_CLIENT_SECTION)?;
    tracing::debug!("credentials unwrapped for {ITSM_SECTION}, {ORIGIN_SECTION}, {ORIGIN_CLIENT_SECTION}");

    reporter.debug("System is getting store opening hours from Origin");
    let origin = OriginClient::new(transport, settings.origin_url.as_str());
    let token = origin.authenticate(&origin_account, &origin_client)?;
    drop(origin_account);
    drop(origin_client);
    let origin_records = normalize_origin(&origin.fetch_shops(&token)?);
    reporter.debug(&format!(
        "System has downloaded {} stores from Origin",
        origin_records.len()
    ));

    reporter.debug(&format!(
        "System is getting organizations from ITSM ({})",
        settings.itsm_base_url()
    ));
    let itsm = ItsmClient::new(
        transport,
        settings.itsm_base_url(),
        &itsm_creds.secret,
        &itsm_creds.login,
    );
    let paged = itsm.list_organizations(&settings.list_query);
    if let Some(err) = &paged.halted {
        reporter.warning(&format!(
            "Error while getting organizations from ITSM! Continuing with {} records from {} pages. Details: {err}",
            paged.records.len(),
            paged.pages
        ));
    }
    let itsm_records = normalize_itsm(&paged.records);
    reporter.debug(&format!(
        "System has downloaded {} organizations from ITSM",
        itsm_records.len()
    ));

    let outcome = Reconciler::new(&itsm, reporter)
        .dry_run(settings.dry_run)
        .reconcile(&origin_records, &itsm_records);
    tracing::debug!("ITSM requests used: {}", itsm.used_requests());

    Ok(SyncReport {
        dry_run: settings.dry_run,
        origin_records: origin_records.len(),
        itsm_records: itsm_records.len(),
        itsm_pages: paged.pages,
        listing_truncated: !paged.is_complete(),
        updated: outcome.updated(),
        failed: outcome.failed(),
        unchanged: outcome.unchanged(),
        would_update: outcome.would_update(),
        skipped: outcome.skipped(),
        unmatched: outcome.unmatched.clone(),
        results: outcome.results,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use storehours_core::{seal, Level, MemoryReporter};

    use super::*;
    use crate::transport::memory::MemoryTransport;
    use crate::transport::{HttpResponse, Method};

    const GLOBAL: &str = "global-secret";
    const TOKEN_URL: &str = "https://origin.test/api/token/create";
    const SHOP_URL: &str = "https://origin.test/api/v2/shop";
    const ORGS_URL: &str = "https://itsm.test/v1/organizations";

    fn section(name: &str, user: &str, password: &str) -> String {
        let sealed = seal(GLOBAL, "k3y-for-section", password).unwrap();
        format!(
            "[{name}]\nuser = {user}\npwd = {}\ntoken = {}\n",
            sealed.pwd, sealed.token
        )
    }

    fn config() -> ConfigStore {
        let text = [
            format!("[MAIN]\nGLOBAL = {GLOBAL}\n"),
            section("ITSM", "acme-it", "itsm-api-token"),
            "base_url = https://itsm.test/v1/\n".to_string(),
            section("ORIGIN", "svc-hours", "origin-pass"),
            "origin_url = https://origin.test\n".to_string(),
            section("ORIGIN2", "client-id", "client-secret"),
        ]
        .concat();
        ConfigStore::parse(&text).unwrap()
    }

    fn shops() -> Value {
        json!({"content": {"results": [
            {"id": 1, "workHours": [
                {"dayOfWeek": 2, "hourFrom": "2024-01-02T09:00:00", "hourTo": "2024-01-02T17:00:00"},
                {"dayOfWeek": 1, "hourFrom": "2024-01-01T09:00:00", "hourTo": "2024-01-01T17:00:00"}
            ]},
            {"id": 2, "workHours": []},
            {"id": 3}
        ]}})
    }

    fn org(id: u64, fid: &str, hours: Option<&str>) -> Value {
        match hours {
            Some(h) => json!({"id": id, "financialID": fid,
                "custom_fields": [{"id": "godziny_otwarcia", "value": h}]}),
            None => json!({"id": id, "financialID": fid}),
        }
    }

    fn script_origin(transport: &MemoryTransport) {
        transport
            .respond_json(
                Method::Post,
                TOKEN_URL,
                200,
                &json!({"success": true, "content": {"accessToken": "origin-token"}}),
            )
            .respond_json(Method::Get, SHOP_URL, 200, &shops());
    }

    fn settings(config: &ConfigStore) -> JobSettings {
        JobSettings::from_config(config).unwrap()
    }

    #[test]
    fn full_run_updates_only_divergent_organizations() {
        let config = config();
        let transport = MemoryTransport::new();
        script_origin(&transport);
        transport.respond_json(
            Method::Get,
            ORGS_URL,
            200,
            &json!([
                org(501, "1", Some("old")),
                org(502, "2", Some("")),
                org(599, "99", Some("x"))
            ]),
        );
        transport.respond(
            Method::Patch,
            "https://itsm.test/v1/organization/501",
            HttpResponse::new(200, "{}"),
        );
        let reporter = MemoryReporter::new();

        let report = run(&settings(&config), &config, &transport, &reporter).unwrap();

        assert_eq!(report.origin_records, 3);
        assert_eq!(report.itsm_records, 3);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.unmatched, vec!["3".to_string()]);
        assert!(!report.listing_truncated);

        let token_request = transport.sent_to(Method::Post).remove(0);
        let body = token_request.body.unwrap();
        assert_eq!(body["userName"], "APP\\svc-hours");
        assert_eq!(body["password"], "origin-pass");
        assert_eq!(body["clientSecret"], "client-secret");

        let list = transport.sent_to(Method::Get).remove(1);
        assert_eq!(list.header_value("Authorization"), Some("Bearer itsm-api-token"));
        assert_eq!(list.header_value("X-4me-Account"), Some("acme-it"));

        let patch = transport.sent_to(Method::Patch).remove(0);
        assert_eq!(
            patch.body.unwrap()["custom_fields"][0]["value"],
            "2024-01-01: 09:00 - 17:00\n2024-01-02: 09:00 - 17:00"
        );
        assert_eq!(reporter.count(Level::Warning), 0);
    }

    #[test]
    fn origin_failure_is_fatal() {
        let config = config();
        let transport = MemoryTransport::new();
        transport.respond_json(
            Method::Post,
            TOKEN_URL,
            200,
            &json!({"success": true, "content": {"accessToken": "t"}}),
        );
        transport.respond(Method::Get, SHOP_URL, HttpResponse::new(500, "down"));
        let reporter = MemoryReporter::new();

        let err = run(&settings(&config), &config, &transport, &reporter).unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(
            transport.sent_to(Method::Patch).is_empty(),
            "no ITSM write may happen after an Origin failure"
        );
    }

    #[test]
    fn itsm_listing_failure_warns_and_uses_partial_data() {
        let config = config();
        let transport = MemoryTransport::new();
        script_origin(&transport);
        let page2 = "https://itsm.test/v1/organizations?page=2";
        transport
            .respond(
                Method::Get,
                ORGS_URL,
                HttpResponse::new(200, json!([org(501, "1", None)]).to_string())
                    .with_link(format!(r#"<{page2}>; rel="next""#)),
            )
            .respond(Method::Get, page2, HttpResponse::new(500, "boom"))
            .respond(
                Method::Patch,
                "https://itsm.test/v1/organization/501",
                HttpResponse::new(201, "{}"),
            );
        let reporter = MemoryReporter::new();

        let report = run(&settings(&config), &config, &transport, &reporter).unwrap();

        assert!(report.listing_truncated);
        assert_eq!(report.itsm_pages, 1);
        assert_eq!(report.updated, 1);
        let warnings = reporter.messages(Level::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("500"), "got {warnings:?}");
    }

    #[test]
    fn one_failed_update_does_not_stop_the_rest() {
        let config = config();
        let transport = MemoryTransport::new();
        script_origin(&transport);
        transport
            .respond_json(
                Method::Get,
                ORGS_URL,
                200,
                &json!([org(501, "1", None), org(502, "2", None)]),
            )
            .respond(
                Method::Patch,
                "https://itsm.test/v1/organization/501",
                HttpResponse::new(500, "nope"),
            )
            .respond(
                Method::Patch,
                "https://itsm.test/v1/organization/502",
                HttpResponse::new(200, "{}"),
            );
        let reporter = MemoryReporter::new();

        let report = run(&settings(&config), &config, &transport, &reporter).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.issued(), 2);
        assert_eq!(reporter.count(Level::Warning), 1);
    }

    #[test]
    fn dry_run_sends_no_patch() {
        let config = config();
        let transport = MemoryTransport::new();
        script_origin(&transport);
        transport.respond_json(Method::Get, ORGS_URL, 200, &json!([org(501, "1", None)]));
        let reporter = MemoryReporter::new();
        let mut settings = settings(&config);
        settings.dry_run = true;

        let report = run(&settings, &config, &transport, &reporter).unwrap();
        assert!(report.dry_run);
        assert_eq!(report.would_update, 1);
        assert_eq!(report.issued(), 0);
        assert!(transport.sent_to(Method::Patch).is_empty());
    }

    #[test]
    fn missing_credentials_fail_before_any_request() {
        let config = ConfigStore::parse(
            "[MAIN]\nGLOBAL = g\n[ORIGIN]\norigin_url = https://origin.test\n",
        )
        .unwrap();
        let transport = MemoryTransport::new();
        let reporter = MemoryReporter::new();

        let err = run(&settings(&config), &config, &transport, &reporter).unwrap_err();
        assert!(matches!(err, SyncError::Core(_)), "got {err}");
        assert!(transport.sent().is_empty());
    }
}
