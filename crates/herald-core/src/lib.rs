//! Herald Core - Entity-graph vocabulary, errors, and configuration

pub mod config;
pub mod descriptor;
pub mod error;
pub mod types;

pub use config::{BrokerConfig, HeraldConfig, RetryConfig, StoreConfig};
pub use descriptor::{join_url, BackendEndpoint};
pub use error::{CreateFailureKind, Error, LinkRole, LintViolation, PublishFailureKind, Result};
pub use types::*;
