//! storehours core library: configuration, credential unwrapping, domain
//! types and the reporting port.
//!
//! - [`config`] — INI [`ConfigStore`]
//! - [`cipher`] — RC4 keystream
//! - [`vault`] — [`CredentialVault`] and [`vault::seal`]
//! - [`types`] — [`ShopRecord`], [`FinancialId`], [`Credentials`]
//! - [`report`] — [`Reporter`] port

pub mod cipher;
pub mod config;
pub mod error;
pub mod report;
pub mod types;
pub mod vault;

pub use config::ConfigStore;
pub use error::{ConfigError, CoreError, CryptoError, SealError};
pub use report::{Level, MemoryReporter, Reporter};
pub use types::{Credentials, FinancialId, ShopRecord};
pub use vault::{seal, CredentialVault, SealedSecret};
