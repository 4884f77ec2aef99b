//! Updates of existing resources
//!
//! An [`Update`] is a copy of a fetched snapshot. Mutators change the copy
//! and nothing else; [`Update::apply`] sends the whole resulting payload in
//! one call. Fields this crate does not model travel with the snapshot and
//! are sent back unchanged.

use super::handle::{submit, Handle};
use super::kind::ResourceKind;
use crate::arm::ArmClient;
use crate::error::Result;
use crate::model::{ResourceId, ResourceInner};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Pending changes to an existing resource
#[must_use]
pub struct Update<K: ResourceKind> {
    client: ArmClient,
    id: ResourceId,
    inner: ResourceInner<K::Properties>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Update<K> {
    pub(crate) fn new(client: ArmClient, id: ResourceId, inner: ResourceInner<K::Properties>) -> Self {
        Self {
            client,
            id,
            inner,
            _kind: PhantomData,
        }
    }

    /// Apply a change to the pending payload
    pub(crate) fn edit(mut self, f: impl FnOnce(&mut ResourceInner<K::Properties>)) -> Self {
        f(&mut self.inner);
        self
    }

    pub(crate) fn inner_mut(&mut self) -> &mut ResourceInner<K::Properties> {
        &mut self.inner
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.id
    }

    /// Desired state as it stands
    pub fn inner(&self) -> &ResourceInner<K::Properties> {
        &self.inner
    }

    pub fn with_tag(self, key: &str, value: &str) -> Self {
        self.edit(|inner| {
            inner.tags.insert(key.to_string(), value.to_string());
        })
    }

    pub fn without_tag(self, key: &str) -> Self {
        self.edit(|inner| {
            inner.tags.remove(key);
        })
    }

    /// Replace all tags
    pub fn with_tags<I, T, V>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = (T, V)>,
        T: Into<String>,
        V: Into<String>,
    {
        self.edit(|inner| {
            inner.tags = tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        })
    }

    /// Body `apply` would send
    pub fn payload(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.inner)?)
    }

    /// Persist the desired state. The update is left untouched, so applying
    /// again sends the same payload.
    pub async fn apply(&self) -> Result<Handle<K>> {
        tracing::info!("Updating {} {}", K::DISPLAY_NAME, self.id);
        submit::<K>(&self.client, self.id.clone(), &self.inner).await
    }
}

impl<K: ResourceKind> fmt::Debug for Update<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("kind", &K::DISPLAY_NAME)
            .field("id", &self.id.to_string())
            .field("inner", &self.inner)
            .finish()
    }
}
