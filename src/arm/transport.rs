//! Transport seam
//!
//! Everything that touches the network sits behind [`Transport`]. The fluent
//! layer builds an [`Invocation`] per terminal operation and a
//! [`PageRequest`] per listed page; authentication, pagination links and
//! operation polling are the implementation's business.

use crate::error::Result;
use crate::model::ResourceId;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Operation performed against a single resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Get,
    /// Full-replace create or update of the resource
    CreateOrUpdate,
    Delete,
    /// Named action on the resource (`start`, `stop`, `reset`)
    Action(&'static str),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Get => f.write_str("get"),
            Operation::CreateOrUpdate => f.write_str("createOrUpdate"),
            Operation::Delete => f.write_str("delete"),
            Operation::Action(action) => f.write_str(action),
        }
    }
}

/// One call against one resource
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Type segment, e.g. `routeTables`
    pub resource_type: &'static str,
    pub operation: Operation,
    pub resource_id: ResourceId,
    pub api_version: &'static str,
    pub payload: Option<Value>,
}

impl Invocation {
    pub fn new(
        resource_type: &'static str,
        operation: Operation,
        resource_id: ResourceId,
        api_version: &'static str,
    ) -> Self {
        Self {
            resource_type,
            operation,
            resource_id,
            api_version,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Where a listing continues from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Collection path of the first page
    First(String),
    /// Absolute continuation link returned by the previous page
    Next(String),
}

/// Request for one page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub resource_type: &'static str,
    pub api_version: &'static str,
    pub cursor: PageCursor,
}

/// One page of raw resource records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_link: Option<String>,
}

/// The remote resource-management collaborator
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one call. Returns the response body, `None` when empty.
    async fn invoke(&self, invocation: Invocation) -> Result<Option<Value>>;

    /// Fetch one page of a listing
    async fn page(&self, request: PageRequest) -> Result<Page>;

    /// Perform a call whose backend completion is asynchronous and return
    /// the completed result. Implementations that poll override this; the
    /// default returns whatever the initial call returns.
    async fn long_running(&self, invocation: Invocation) -> Result<Option<Value>> {
        self.invoke(invocation).await
    }
}
