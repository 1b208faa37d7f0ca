//! Broker boundary
//!
//! Registration goes through the connector's IDS endpoint rather than
//! straight at the broker: the connector wraps the resource in an IDS
//! update message and forwards it to the configured recipient.

use async_trait::async_trait;
use herald_core::{BrokerConfig, EntityId, Error, PublishFailureKind, Result, StoreConfig};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

/// Acknowledgement that a resource is discoverable at the broker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BrokerAck {
    /// Identifier the broker was told about (post-rewrite).
    pub resource_id: EntityId,
    /// Response detail, kept for operator logs.
    pub detail: String,
}

#[async_trait]
pub trait Broker: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Register `resource_id` with the broker. Retries must reuse the
    /// identical identifier; issuing the call is the publisher's
    /// at-most-once discipline.
    async fn register(&self, resource_id: &EntityId) -> Result<BrokerAck>;
}

pub struct HttpBroker {
    client: Client,
    base_url: String,
    user: String,
    password: String,
    recipient: String,
}

impl HttpBroker {
    pub fn from_config(
        store: &StoreConfig,
        broker: &BrokerConfig,
    ) -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(store.timeout())
            .danger_accept_invalid_certs(store.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url: store.base_url.trim_end_matches('/').to_string(),
            user: store.user.clone(),
            password: store.password.clone(),
            recipient: broker.url.clone(),
        })
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }
}

#[async_trait]
impl Broker for HttpBroker {
    fn name(&self) -> &str {
        "connector"
    }

    async fn register(&self, resource_id: &EntityId) -> Result<BrokerAck> {
        let url = format!("{}/api/ids/resource/update", self.base_url);
        debug!(recipient = %self.recipient, resource = %resource_id, "pushing resource to broker");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .query(&[
                ("recipient", self.recipient.as_str()),
                ("resourceId", resource_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    PublishFailureKind::Timeout
                } else {
                    PublishFailureKind::Unreachable
                };
                Error::publish_failed(kind, e.to_string())
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status.is_success() {
            debug!(resource = %resource_id, "broker acknowledged resource");
            Ok(BrokerAck {
                resource_id: resource_id.clone(),
                detail: text,
            })
        } else {
            error!(%status, "broker rejected resource");
            Err(Error::publish_failed(
                PublishFailureKind::Rejected,
                format!("{status}: {text}"),
            ))
        }
    }
}
