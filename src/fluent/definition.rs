//! Staged definitions of new resources

use super::handle::{submit, Handle};
use super::kind::ResourceKind;
use super::stage::{Blank, WithCreate, WithGroup};
use crate::arm::ArmClient;
use crate::error::Result;
use crate::model::{Region, ResourceId, ResourceInner};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use tokio::task::JoinHandle;

/// A resource being defined, currently at stage `S`
#[must_use]
pub struct Definition<K: ResourceKind, S> {
    client: ArmClient,
    name: String,
    resource_group: String,
    inner: ResourceInner<K::Properties>,
    _stage: PhantomData<fn() -> S>,
}

impl<K: ResourceKind, S> Definition<K, S> {
    /// Move to another stage without touching the payload
    pub(crate) fn advance<T>(self) -> Definition<K, T> {
        Definition {
            client: self.client,
            name: self.name,
            resource_group: self.resource_group,
            inner: self.inner,
            _stage: PhantomData,
        }
    }

    /// Apply a change to the payload, staying at the current stage
    pub(crate) fn edit(mut self, f: impl FnOnce(&mut ResourceInner<K::Properties>)) -> Self {
        f(&mut self.inner);
        self
    }

    pub(crate) fn inner_mut(&mut self) -> &mut ResourceInner<K::Properties> {
        &mut self.inner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload accumulated so far
    pub fn inner(&self) -> &ResourceInner<K::Properties> {
        &self.inner
    }
}

impl<K: ResourceKind> Definition<K, Blank> {
    pub(crate) fn new(client: ArmClient, name: &str) -> Self {
        let inner = ResourceInner {
            name: Some(name.to_string()),
            ..ResourceInner::default()
        };
        Self {
            client,
            name: name.to_string(),
            resource_group: String::new(),
            inner,
            _stage: PhantomData,
        }
    }

    pub fn with_region(self, region: impl Into<Region>) -> Definition<K, WithGroup> {
        let region = region.into();
        self.edit(|inner| inner.location = Some(region)).advance()
    }
}

impl<K: ResourceKind> Definition<K, WithGroup> {
    pub fn with_existing_resource_group(mut self, name: &str) -> Definition<K, K::AfterGroup> {
        self.resource_group = name.to_string();
        self.advance()
    }
}

impl<K: ResourceKind> Definition<K, WithCreate> {
    pub fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    /// Id the resource will have once created
    pub fn resource_id(&self) -> ResourceId {
        self.client
            .resource_id(&self.resource_group, K::RESOURCE_TYPE, &self.name)
    }

    pub fn with_tag(self, key: &str, value: &str) -> Self {
        self.edit(|inner| {
            inner.tags.insert(key.to_string(), value.to_string());
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

    /// Body `create` will send, defaults included
    pub fn payload(&self) -> Result<Value> {
        let mut inner = self.inner.clone();
        K::prepare_create(&mut inner);
        Ok(serde_json::to_value(&inner)?)
    }

    /// Create the resource. This is the only remote call the definition makes.
    pub async fn create(mut self) -> Result<Handle<K>> {
        K::prepare_create(&mut self.inner);
        let id = self.resource_id();
        tracing::info!("Creating {} {}", K::DISPLAY_NAME, id);
        submit::<K>(&self.client, id, &self.inner).await
    }

    /// Start `create` on the runtime and return immediately
    pub fn begin_create(self) -> JoinHandle<Result<Handle<K>>> {
        tokio::spawn(self.create())
    }
}

impl<K: ResourceKind, S> fmt::Debug for Definition<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("kind", &K::DISPLAY_NAME)
            .field("stage", &std::any::type_name::<S>())
            .field("name", &self.name)
            .field("resource_group", &self.resource_group)
            .field("inner", &self.inner)
            .finish()
    }
}
