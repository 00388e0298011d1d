//! # storehours-sync
//!
//! Origin → ITSM opening-hours reconciliation.
//!
//! Call [`pipeline::run`] with typed [`JobSettings`], the loaded config and a
//! [`Transport`] to execute one sync. The individual stages are public so
//! they can be driven separately:
//!
//! - [`origin`] — token exchange and shop listing
//! - [`itsm`] — paginated organization listing and PATCH updates
//! - [`normalize`] — raw payloads to [`storehours_core::ShopRecord`]
//! - [`reconcile`] — compare and write back

pub mod error;
pub mod gateway;
pub mod itsm;
pub mod normalize;
pub mod origin;
pub mod pipeline;
pub mod reconcile;
pub mod settings;
pub mod transport;

pub use error::SyncError;
pub use gateway::{HttpGateway, Paged};
pub use itsm::{Environment, ItsmClient, ListQuery};
pub use origin::{AccessToken, OriginClient};
pub use pipeline::{run, SyncReport};
pub use reconcile::{Decision, OrganizationUpdater, PatchTemplate, ReconcileOutcome, Reconciler, UpdateResult};
pub use settings::{JobSettings, LogSettings};
pub use transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
