//! Resource-management client
//!
//! Binds a transport to a subscription. Every collection and handle holds a
//! clone of this; cloning is cheap.

use super::transport::Transport;
use crate::model::resource_id::{collection_path, ResourceId};
use std::fmt;
use std::sync::Arc;

/// Namespace of every resource type this crate manages
pub const NETWORK_NAMESPACE: &str = "Microsoft.Network";

/// Default number of concurrent calls in a batch operation
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

/// Main client
#[derive(Clone)]
pub struct ArmClient {
    transport: Arc<dyn Transport>,
    subscription_id: String,
    batch_concurrency: usize,
}

impl ArmClient {
    pub fn new(transport: Arc<dyn Transport>, subscription_id: &str) -> Self {
        Self {
            transport,
            subscription_id: subscription_id.to_string(),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Limit how many calls a batch operation keeps in flight
    pub fn with_batch_concurrency(mut self, limit: usize) -> Self {
        self.batch_concurrency = limit.max(1);
        self
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
    }

    /// Switch to a different subscription
    pub fn switch_subscription(&mut self, subscription_id: &str) {
        self.subscription_id = subscription_id.to_string();
    }

    /// Id of a network resource in this subscription
    pub fn resource_id(&self, resource_group: &str, resource_type: &str, name: &str) -> ResourceId {
        ResourceId::new(
            &self.subscription_id,
            resource_group,
            NETWORK_NAMESPACE,
            resource_type,
            name,
        )
    }

    /// Path of a collection, subscription-wide or within one resource group
    pub fn collection_path(&self, resource_group: Option<&str>, resource_type: &str) -> String {
        collection_path(
            &self.subscription_id,
            resource_group,
            NETWORK_NAMESPACE,
            resource_type,
        )
    }
}

impl fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmClient")
            .field("subscription_id", &self.subscription_id)
            .field("batch_concurrency", &self.batch_concurrency)
            .finish_non_exhaustive()
    }
}
