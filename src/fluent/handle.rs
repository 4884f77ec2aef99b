//! Materialized resources and the calls that produce them

use super::kind::ResourceKind;
use super::update::Update;
use crate::arm::{ArmClient, Invocation, Operation};
use crate::error::{Error, Result};
use crate::model::{ProvisioningState, Region, ResourceId, ResourceInner, ResourceProperties};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Snapshot of a remote resource as last returned by the backend
pub struct Handle<K: ResourceKind> {
    client: ArmClient,
    id: ResourceId,
    inner: ResourceInner<K::Properties>,
    fetched_at: DateTime<Utc>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Handle<K> {
    /// Build a handle from a response body. `fallback_id` is used when the
    /// body carries no `id`.
    pub(crate) fn from_value(
        client: ArmClient,
        fallback_id: Option<&ResourceId>,
        value: Value,
    ) -> Result<Self> {
        let inner: ResourceInner<K::Properties> = serde_json::from_value(value)?;
        let id = match inner.id.as_deref() {
            Some(raw) => ResourceId::parse(raw)?,
            None => fallback_id.cloned().ok_or_else(|| {
                Error::InvalidResourceId(format!("{} response carried no id", K::DISPLAY_NAME))
            })?,
        };

        Ok(Self {
            client,
            id,
            inner,
            fetched_at: Utc::now(),
            _kind: PhantomData,
        })
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.id
    }

    pub fn id(&self) -> String {
        self.id.to_string()
    }

    pub fn name(&self) -> &str {
        self.inner.name.as_deref().unwrap_or_else(|| self.id.name())
    }

    pub fn resource_group_name(&self) -> &str {
        self.id.resource_group()
    }

    pub fn region(&self) -> Option<&Region> {
        self.inner.location.as_ref()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.inner.tags
    }

    pub fn etag(&self) -> Option<&str> {
        self.inner.etag.as_deref()
    }

    pub fn provisioning_state(&self) -> Option<&ProvisioningState> {
        self.inner.properties.provisioning_state()
    }

    pub fn properties(&self) -> &K::Properties {
        &self.inner.properties
    }

    /// Full payload as returned by the backend
    pub fn inner(&self) -> &ResourceInner<K::Properties> {
        &self.inner
    }

    /// When this snapshot was taken
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub(crate) fn client(&self) -> &ArmClient {
        &self.client
    }

    /// Begin an update seeded with this snapshot
    pub fn update(&self) -> Update<K> {
        Update::new(self.client.clone(), self.id.clone(), self.inner.clone())
    }

    /// Fetch the current state of the resource
    pub async fn refresh(&self) -> Result<Self> {
        fetch(&self.client, self.id.clone()).await
    }
}

impl<K: ResourceKind> Clone for Handle<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            id: self.id.clone(),
            inner: self.inner.clone(),
            fetched_at: self.fetched_at,
            _kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::DISPLAY_NAME)
            .field("id", &self.id.to_string())
            .field("inner", &self.inner)
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

/// Route a call through `long_running` when the type requires it
pub(crate) async fn call<K: ResourceKind>(
    client: &ArmClient,
    invocation: Invocation,
) -> Result<Option<Value>> {
    if K::LONG_RUNNING && invocation.operation != Operation::Get {
        client.transport().long_running(invocation).await
    } else {
        client.transport().invoke(invocation).await
    }
}

pub(crate) async fn fetch<K: ResourceKind>(client: &ArmClient, id: ResourceId) -> Result<Handle<K>> {
    let invocation = Invocation::new(K::RESOURCE_TYPE, Operation::Get, id.clone(), K::API_VERSION);
    match call::<K>(client, invocation).await? {
        Some(value) => Handle::from_value(client.clone(), Some(&id), value),
        None => Err(Error::not_found(K::DISPLAY_NAME, id.name())),
    }
}

/// Send a full payload. This is the single mutating call behind both
/// `create` and `apply`.
pub(crate) async fn submit<K: ResourceKind>(
    client: &ArmClient,
    id: ResourceId,
    inner: &ResourceInner<K::Properties>,
) -> Result<Handle<K>> {
    let payload = serde_json::to_value(inner)?;
    let invocation = Invocation::new(
        K::RESOURCE_TYPE,
        Operation::CreateOrUpdate,
        id.clone(),
        K::API_VERSION,
    )
    .with_payload(payload);

    match call::<K>(client, invocation).await? {
        Some(value) => Handle::from_value(client.clone(), Some(&id), value),
        // Accepted without a body; read back what the backend now holds
        None => fetch(client, id).await,
    }
}

pub(crate) async fn delete<K: ResourceKind>(client: &ArmClient, id: ResourceId) -> Result<()> {
    tracing::info!("Deleting {} {}", K::DISPLAY_NAME, id);
    let invocation = Invocation::new(K::RESOURCE_TYPE, Operation::Delete, id, K::API_VERSION);
    call::<K>(client, invocation).await.map(|_| ())
}

pub(crate) async fn action<K: ResourceKind>(
    client: &ArmClient,
    id: ResourceId,
    action: &'static str,
) -> Result<()> {
    tracing::info!("{} {} {}", action, K::DISPLAY_NAME, id);
    let invocation = Invocation::new(K::RESOURCE_TYPE, Operation::Action(action), id, K::API_VERSION);
    call::<K>(client, invocation).await.map(|_| ())
}
