//! Broker publisher with split-horizon host rewrite
//!
//! The process creating the offer and the broker reading it often see the
//! provider under different hostnames. Before the push, the resource
//! identifier's host segment is rewritten from the local alias to the
//! externally routable one. The rewrite is URL-aware: only the host
//! segment changes, never path or query, and it is idempotent.

use crate::run::{Publication, RunPhase};
use herald_core::{BrokerConfig, EntityId, Error, PublishFailureKind, Result, RetryConfig};
use herald_store::{Broker, BrokerAck};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Substitute `public` for `local` in the host segment of `identifier`.
///
/// Non-matching hosts and identifiers that do not parse as URLs pass
/// through unchanged. `rewrite_host(rewrite_host(x)) == rewrite_host(x)`.
pub fn rewrite_host(identifier: &str, local: &str, public: &str) -> String {
    match Url::parse(identifier) {
        Ok(mut url) => {
            if url.host_str() == Some(local) && url.set_host(Some(public)).is_ok() {
                url.to_string()
            } else {
                identifier.to_string()
            }
        }
        Err(_) => identifier.to_string(),
    }
}

pub struct BrokerPublisher {
    broker: Arc<dyn Broker>,
    local_host: String,
    public_host: String,
    retry: RetryConfig,
}

impl BrokerPublisher {
    pub fn new(broker: Arc<dyn Broker>, config: &BrokerConfig) -> Self {
        Self {
            broker,
            local_host: config.local_host.clone(),
            public_host: config.public_host.clone(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The identifier the broker will be told about.
    pub fn rewritten_id(&self, resource: &EntityId) -> EntityId {
        EntityId::new(rewrite_host(
            resource.as_str(),
            &self.local_host,
            &self.public_host,
        ))
    }

    /// Register the publication's resource with the broker.
    ///
    /// At-most-once per run: once an ack is held, further calls return it
    /// without any network traffic. Transient failures (unreachable,
    /// timeout) are retried on a bounded ladder, always with the identical
    /// rewritten identifier; a broker rejection is never retried. A failed
    /// publish leaves the graph untouched and registrable.
    pub async fn publish(
        &self,
        publication: &mut Publication,
        cancel: &CancellationToken,
    ) -> Result<BrokerAck> {
        if let Some(ack) = &publication.ack {
            debug!(run = %publication.run_id, "resource already registered; returning held ack");
            return Ok(ack.clone());
        }

        let resource = publication.resource_id().ok_or_else(|| {
            Error::publish_failed(
                PublishFailureKind::Rejected,
                "publication carries no resource id",
            )
        })?;
        let rewritten = self.rewritten_id(resource);
        if rewritten != *resource {
            debug!(local = %resource, public = %rewritten, "rewrote resource host for broker");
        }

        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                r = self.broker.register(&rewritten) => r,
            };
            match result {
                Ok(ack) => {
                    publication.ack = Some(ack.clone());
                    publication.phase = RunPhase::Published;
                    info!(
                        run = %publication.run_id,
                        resource = %rewritten,
                        broker = self.broker.name(),
                        "resource registered with broker"
                    );
                    return Ok(ack);
                }
                Err(Error::PublishFailed { kind, cause })
                    if kind.is_transient() && attempt < self.retry.attempts =>
                {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        %kind,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "broker push failed; retrying: {cause}"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
