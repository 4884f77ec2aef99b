//! Per-type descriptors
//!
//! A resource type is described once by an uninhabited marker implementing
//! [`ResourceKind`]; the generic collection, definition, update and handle
//! types are then instantiated with it.

use crate::model::{ChildInner, ResourceInner, ResourceProperties};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A top-level resource type
pub trait ResourceKind: Send + Sync + Sized + 'static {
    /// Contents of the payload's `properties` object
    type Properties: ResourceProperties;

    /// Definition stage reached once region and resource group are set.
    /// [`stage::WithCreate`](super::stage::WithCreate) when the type has no
    /// further required settings.
    type AfterGroup;

    /// Type segment in resource ids (`routeTables`)
    const RESOURCE_TYPE: &'static str;

    /// Human-readable name used in logs and errors
    const DISPLAY_NAME: &'static str;

    const API_VERSION: &'static str;

    /// Mutating calls complete asynchronously on the backend and are routed
    /// through [`Transport::long_running`](crate::arm::Transport::long_running)
    const LONG_RUNNING: bool = false;

    /// Fill defaults into a definition's payload right before it is sent
    fn prepare_create(_inner: &mut ResourceInner<Self::Properties>) {}
}

/// A child resource type embedded in a parent's properties
pub trait ChildKind: Send + Sync + Sized + 'static {
    type Properties: Serialize
        + DeserializeOwned
        + Clone
        + Default
        + Debug
        + PartialEq
        + Send
        + Sync
        + 'static;

    const DISPLAY_NAME: &'static str;
}

/// Payload of a child of kind `C`
pub type ChildOf<C> = ChildInner<<C as ChildKind>::Properties>;
