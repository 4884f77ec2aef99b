//! Network watchers
//!
//! A watcher carries no settings of its own beyond region and tags; the
//! backend allows one per region and subscription.

use crate::fluent::stage::WithCreate;
use crate::fluent::{Definition, Handle, ResourceKind, Update};
use crate::model::{ProvisioningState, ResourceProperties};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkWatcherProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl ResourceProperties for NetworkWatcherProperties {
    fn provisioning_state(&self) -> Option<&ProvisioningState> {
        self.provisioning_state.as_ref()
    }
}

/// Network watcher resource type
#[derive(Debug)]
pub enum NetworkWatchers {}

impl ResourceKind for NetworkWatchers {
    type Properties = NetworkWatcherProperties;
    type AfterGroup = WithCreate;

    const RESOURCE_TYPE: &'static str = "networkWatchers";
    const DISPLAY_NAME: &'static str = "network watcher";
    const API_VERSION: &'static str = "2023-09-01";
}

pub type NetworkWatcher = Handle<NetworkWatchers>;
pub type NetworkWatcherDefinition<S> = Definition<NetworkWatchers, S>;
pub type NetworkWatcherUpdate = Update<NetworkWatchers>;
