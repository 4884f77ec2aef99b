//! Collection-level entry points
//!
//! Handles fetching, listing and deleting resources of one type, plus the
//! batch forms of those operations.

use super::definition::Definition;
use super::handle::{self, Handle};
use super::kind::ResourceKind;
use super::stage::{Blank, WithCreate};
use crate::arm::client::NETWORK_NAMESPACE;
use crate::arm::{ArmClient, PageCursor, PageRequest};
use crate::error::{BatchItem, Error, Result};
use crate::model::ResourceId;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::future::Future;
use std::marker::PhantomData;

/// All resources of kind `K` in the client's subscription
pub struct Collection<K: ResourceKind> {
    client: ArmClient,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Clone for Collection<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> Collection<K> {
    pub fn new(client: ArmClient) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    pub fn client(&self) -> &ArmClient {
        &self.client
    }

    /// Begin defining a new resource
    pub fn define(&self, name: &str) -> Definition<K, Blank> {
        Definition::new(self.client.clone(), name)
    }

    /// Every resource in the subscription, fetched page by page as the
    /// stream is polled. Each call starts a fresh listing.
    pub fn list(&self) -> BoxStream<'static, Result<Handle<K>>> {
        self.list_in(None)
    }

    pub fn list_by_resource_group(&self, resource_group: &str) -> BoxStream<'static, Result<Handle<K>>> {
        self.list_in(Some(resource_group))
    }

    fn list_in(&self, resource_group: Option<&str>) -> BoxStream<'static, Result<Handle<K>>> {
        let client = self.client.clone();
        let first = PageCursor::First(client.collection_path(resource_group, K::RESOURCE_TYPE));

        stream::try_unfold(Some(first), move |cursor| fetch_page::<K>(client.clone(), cursor))
            .map_ok(|handles| stream::iter(handles.into_iter().map(Ok::<_, Error>)))
            .try_flatten()
            .boxed()
    }

    /// Parse `id` and check it names a resource of this type
    pub(crate) fn parse_id(id: &str) -> Result<ResourceId> {
        let parsed = ResourceId::parse(id)?;
        if !parsed.is_type(NETWORK_NAMESPACE, K::RESOURCE_TYPE) {
            return Err(Error::InvalidResourceId(format!(
                "{id} is not a {}",
                K::DISPLAY_NAME
            )));
        }
        Ok(parsed)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Handle<K>> {
        handle::fetch(&self.client, Self::parse_id(id)?).await
    }

    /// Id of `name` in `resource_group`; both must be non-empty or the id
    /// would address the collection instead of a resource
    fn named_id(&self, resource_group: &str, name: &str) -> Result<ResourceId> {
        if resource_group.trim().is_empty() || name.trim().is_empty() {
            return Err(Error::InvalidResourceId(format!(
                "{} lookups need a resource group and a name, got {resource_group:?} / {name:?}",
                K::DISPLAY_NAME
            )));
        }
        Ok(self.client.resource_id(resource_group, K::RESOURCE_TYPE, name))
    }

    pub async fn get_by_resource_group(&self, resource_group: &str, name: &str) -> Result<Handle<K>> {
        handle::fetch(&self.client, self.named_id(resource_group, name)?).await
    }

    /// Like [`get_by_resource_group`](Self::get_by_resource_group), with
    /// absence reported as `Ok(None)`
    pub async fn find_by_resource_group(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<Handle<K>>> {
        match self.get_by_resource_group(resource_group, name).await {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        handle::delete::<K>(&self.client, Self::parse_id(id)?).await
    }

    pub async fn delete_by_resource_group(&self, resource_group: &str, name: &str) -> Result<()> {
        handle::delete::<K>(&self.client, self.named_id(resource_group, name)?).await
    }

    /// Delete each id independently; one item per id, in completion order
    pub fn delete_by_ids<I, T>(&self, ids: I) -> BoxStream<'static, BatchItem<()>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let client = self.client.clone();
        self.for_each_id(ids, move |id| {
            let client = client.clone();
            async move { handle::delete::<K>(&client, Self::parse_id(&id)?).await }
        })
    }

    /// Create each definition independently; items are keyed by name
    pub fn create_batch(
        &self,
        definitions: Vec<Definition<K, WithCreate>>,
    ) -> BoxStream<'static, BatchItem<Handle<K>>> {
        stream::iter(definitions)
            .map(|definition| async move {
                let key = definition.name().to_string();
                let result = definition.create().await;
                report(K::DISPLAY_NAME, "create", BatchItem { key, result })
            })
            .buffer_unordered(self.client.batch_concurrency())
            .boxed()
    }

    /// Run `op` for each id with bounded concurrency. Dropping the stream
    /// drops every call still in flight.
    pub(crate) fn for_each_id<I, T, F, Fut, R>(&self, ids: I, op: F) -> BoxStream<'static, BatchItem<R>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: Fn(String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
        R: Send + 'static,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        stream::iter(ids)
            .map(move |id| {
                let call = op(id.clone());
                async move {
                    let result = call.await;
                    report(K::DISPLAY_NAME, "batch", BatchItem { key: id, result })
                }
            })
            .buffer_unordered(self.client.batch_concurrency())
            .boxed()
    }
}

/// One listing page as handles, plus where the next page starts
async fn fetch_page<K: ResourceKind>(
    client: ArmClient,
    cursor: Option<PageCursor>,
) -> Result<Option<(Vec<Handle<K>>, Option<PageCursor>)>> {
    let Some(cursor) = cursor else {
        return Ok(None);
    };
    tracing::debug!("Listing {} page {:?}", K::DISPLAY_NAME, cursor);

    let page = client
        .transport()
        .page(PageRequest {
            resource_type: K::RESOURCE_TYPE,
            api_version: K::API_VERSION,
            cursor,
        })
        .await?;

    let handles = page
        .items
        .into_iter()
        .map(|item| Handle::from_value(client.clone(), None, item))
        .collect::<Result<Vec<_>>>()?;

    Ok(Some((handles, page.next_link.map(PageCursor::Next))))
}

fn report<T>(kind: &str, operation: &str, item: BatchItem<T>) -> BatchItem<T> {
    if let Err(e) = &item.result {
        tracing::warn!("{} {} failed for {}: {}", kind, operation, item.key, e);
    }
    item
}
