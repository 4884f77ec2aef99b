//! In-memory transport
//!
//! Backs the fluent layer with a local store instead of a remote endpoint.
//! Every call is recorded so tests can assert on exactly what was sent, and
//! faults can be scripted per resource to reproduce backend rejections.

use super::transport::{Invocation, Operation, Page, PageCursor, PageRequest, Transport};
use crate::error::{Error, Result};
use crate::model::ResourceId;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

const DEFAULT_PAGE_SIZE: usize = 100;
const NEXT_LINK_PREFIX: &str = "memory://";

/// Backend behaviour to reproduce for a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Reject the payload with the given code
    Validation(String),
    /// Report a concurrent modification
    Conflict(String),
    /// Fail at the transport level with the given status
    Unavailable(u16),
}

impl Fault {
    fn to_error(&self) -> Error {
        match self {
            Fault::Validation(code) => Error::ValidationRejected {
                code: code.clone(),
                message: "The request is invalid.".to_string(),
            },
            Fault::Conflict(code) => Error::Conflict {
                code: code.clone(),
                message: "The resource was modified concurrently.".to_string(),
            },
            Fault::Unavailable(status) => Error::Transport {
                status: Some(*status),
                message: "Service unavailable".to_string(),
            },
        }
    }
}

#[derive(Default)]
struct State {
    resources: BTreeMap<String, (ResourceId, Value)>,
    invocations: Vec<Invocation>,
    pages_served: usize,
    faults: Vec<(String, Option<Operation>, Fault)>,
    etag_counter: u64,
}

/// Transport backed by a local map of resource records
pub struct InMemoryTransport {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Serve listings in pages of at most `page_size` records
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Store a raw record as if it had been created remotely
    pub async fn seed(&self, id: &ResourceId, record: Value) {
        let mut state = self.state.lock().await;
        state.resources.insert(key(id), (id.clone(), record));
    }

    /// Fail calls against `id`; `operation` of `None` fails every call
    pub async fn fail_on(&self, id: &ResourceId, operation: Option<Operation>, fault: Fault) {
        let mut state = self.state.lock().await;
        state.faults.push((key(id), operation, fault));
    }

    /// Raw stored record
    pub async fn record(&self, id: &ResourceId) -> Option<Value> {
        let state = self.state.lock().await;
        state.resources.get(&key(id)).map(|(_, v)| v.clone())
    }

    /// Every invocation received so far, in arrival order
    pub async fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().await.invocations.clone()
    }

    /// Payloads of the create-or-update calls received so far
    pub async fn submitted_payloads(&self) -> Vec<Value> {
        self.state
            .lock()
            .await
            .invocations
            .iter()
            .filter(|i| i.operation == Operation::CreateOrUpdate)
            .filter_map(|i| i.payload.clone())
            .collect()
    }

    /// Number of calls that may change remote state
    pub async fn mutating_calls(&self) -> usize {
        self.state
            .lock()
            .await
            .invocations
            .iter()
            .filter(|i| i.operation != Operation::Get)
            .count()
    }

    /// Number of listing pages served so far
    pub async fn pages_served(&self) -> usize {
        self.state.lock().await.pages_served
    }

    fn fault_for(state: &State, invocation: &Invocation) -> Option<Error> {
        let id = key(&invocation.resource_id);
        state
            .faults
            .iter()
            .find(|(fid, op, _)| {
                *fid == id && op.as_ref().map_or(true, |op| *op == invocation.operation)
            })
            .map(|(_, _, fault)| fault.to_error())
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn invoke(&self, invocation: Invocation) -> Result<Option<Value>> {
        let mut state = self.state.lock().await;
        state.invocations.push(invocation.clone());
        tracing::debug!(
            "memory invoke: {} {} {}",
            invocation.resource_type,
            invocation.operation,
            invocation.resource_id
        );

        if let Some(err) = Self::fault_for(&state, &invocation) {
            return Err(err);
        }

        let id = &invocation.resource_id;
        match &invocation.operation {
            Operation::Get => state
                .resources
                .get(&key(id))
                .map(|(_, v)| Some(v.clone()))
                .ok_or_else(|| Error::not_found(invocation.resource_type, id.name())),
            Operation::CreateOrUpdate => {
                let Some(Value::Object(mut record)) = invocation.payload.clone() else {
                    return Err(Error::ValidationRejected {
                        code: "InvalidRequestContent".to_string(),
                        message: "The request content was invalid.".to_string(),
                    });
                };
                if !record.get("location").is_some_and(Value::is_string) {
                    return Err(Error::ValidationRejected {
                        code: "LocationRequired".to_string(),
                        message: "The location property is required for this definition."
                            .to_string(),
                    });
                }

                state.etag_counter += 1;
                materialize(&mut record, id, state.etag_counter);
                let record = Value::Object(record);
                state
                    .resources
                    .insert(key(id), (id.clone(), record.clone()));
                Ok(Some(record))
            }
            Operation::Delete => {
                state.resources.remove(&key(id));
                Ok(None)
            }
            Operation::Action(action) => {
                let Some((_, record)) = state.resources.get_mut(&key(id)) else {
                    return Err(Error::not_found(invocation.resource_type, id.name()));
                };
                let operational = match *action {
                    "start" => Some("Running"),
                    "stop" => Some("Stopped"),
                    _ => None,
                };
                if let (Some(op_state), Some(props)) = (
                    operational,
                    record.get_mut("properties").and_then(Value::as_object_mut),
                ) {
                    props.insert(
                        "operationalState".to_string(),
                        Value::String(op_state.to_string()),
                    );
                }
                Ok(None)
            }
        }
    }

    async fn page(&self, request: PageRequest) -> Result<Page> {
        let mut state = self.state.lock().await;
        state.pages_served += 1;

        let (path, skip) = match &request.cursor {
            PageCursor::First(path) => (path.clone(), 0),
            PageCursor::Next(link) => parse_next_link(link)?,
        };
        let scope = CollectionScope::parse(&path)?;

        let matching: Vec<Value> = state
            .resources
            .values()
            .filter(|(id, _)| scope.contains(id))
            .map(|(_, v)| v.clone())
            .collect();

        let items: Vec<Value> = matching.iter().skip(skip).take(self.page_size).cloned().collect();
        let consumed = skip + items.len();
        let next_link = (consumed < matching.len())
            .then(|| format!("{NEXT_LINK_PREFIX}{path}?skip={consumed}"));

        Ok(Page { items, next_link })
    }
}

fn key(id: &ResourceId) -> String {
    id.to_string().to_ascii_lowercase()
}

/// Fill server-assigned fields the way the backend does on a successful PUT
fn materialize(record: &mut Map<String, Value>, id: &ResourceId, etag: u64) {
    let etag = format!("W/\"{etag}\"");
    record.insert("id".to_string(), Value::String(id.to_string()));
    record.insert("name".to_string(), Value::String(id.name().to_string()));
    record.insert(
        "type".to_string(),
        Value::String(format!("{}/{}", id.namespace(), id.resource_type())),
    );
    record.insert("etag".to_string(), Value::String(etag.clone()));

    let props = record
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(props) = props.as_object_mut() else {
        return;
    };
    props.insert(
        "provisioningState".to_string(),
        Value::String("Succeeded".to_string()),
    );

    // Children embedded in arrays get ids under the parent
    for (child_type, value) in props.iter_mut() {
        let Some(children) = value.as_array_mut() else {
            continue;
        };
        for child in children.iter_mut().filter_map(Value::as_object_mut) {
            let Some(name) = child.get("name").and_then(Value::as_str).map(str::to_string) else {
                continue;
            };
            child.insert(
                "id".to_string(),
                Value::String(id.child(child_type, &name).to_string()),
            );
            child.insert("etag".to_string(), Value::String(etag.clone()));
        }
    }
}

fn parse_next_link(link: &str) -> Result<(String, usize)> {
    let invalid = || Error::Transport {
        status: Some(400),
        message: format!("Invalid continuation link: {link}"),
    };
    let rest = link.strip_prefix(NEXT_LINK_PREFIX).ok_or_else(invalid)?;
    let (path, skip) = rest.split_once("?skip=").ok_or_else(invalid)?;
    let skip = skip.parse().map_err(|_| invalid())?;
    Ok((path.to_string(), skip))
}

/// Parsed collection path
struct CollectionScope {
    subscription_id: String,
    resource_group: Option<String>,
    namespace: String,
    resource_type: String,
}

impl CollectionScope {
    fn parse(path: &str) -> Result<Self> {
        let invalid = || Error::InvalidResourceId(path.to_string());
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["subscriptions", sub, "resourceGroups", rg, "providers", ns, rt] => Ok(Self {
                subscription_id: (*sub).to_string(),
                resource_group: Some((*rg).to_string()),
                namespace: (*ns).to_string(),
                resource_type: (*rt).to_string(),
            }),
            ["subscriptions", sub, "providers", ns, rt] => Ok(Self {
                subscription_id: (*sub).to_string(),
                resource_group: None,
                namespace: (*ns).to_string(),
                resource_type: (*rt).to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    fn contains(&self, id: &ResourceId) -> bool {
        id.subscription_id().eq_ignore_ascii_case(&self.subscription_id)
            && self
                .resource_group
                .as_deref()
                .map_or(true, |rg| id.resource_group().eq_ignore_ascii_case(rg))
            && id.is_type(&self.namespace, &self.resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn watcher_id(rg: &str, name: &str) -> ResourceId {
        ResourceId::new("sub", rg, "Microsoft.Network", "networkWatchers", name)
    }

    #[tokio::test]
    async fn test_put_materializes_server_fields() {
        let transport = InMemoryTransport::new();
        let id = ResourceId::new("sub", "rg", "Microsoft.Network", "routeTables", "rt1");
        let payload = json!({
            "location": "westus",
            "properties": {"routes": [{"name": "r1", "properties": {"addressPrefix": "10.0.0.0/8"}}]}
        });

        let record = transport
            .invoke(
                Invocation::new("routeTables", Operation::CreateOrUpdate, id.clone(), "v1")
                    .with_payload(payload),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record["name"], "rt1");
        assert_eq!(record["type"], "Microsoft.Network/routeTables");
        assert_eq!(record["properties"]["provisioningState"], "Succeeded");
        assert_eq!(
            record["properties"]["routes"][0]["id"],
            format!("{id}/routes/r1")
        );
    }

    #[tokio::test]
    async fn test_put_without_location_is_rejected() {
        let transport = InMemoryTransport::new();
        let err = transport
            .invoke(
                Invocation::new("networkWatchers", Operation::CreateOrUpdate, watcher_id("rg", "w"), "v1")
                    .with_payload(json!({"properties": {}})),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let transport = InMemoryTransport::new();
        let err = transport
            .invoke(Invocation::new("networkWatchers", Operation::Get, watcher_id("rg", "nw"), "v1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_paging_follows_next_links() {
        let transport = InMemoryTransport::new().with_page_size(2);
        for name in ["a", "b", "c"] {
            transport.seed(&watcher_id("rg", name), json!({"name": name})).await;
        }
        transport.seed(&watcher_id("other", "d"), json!({"name": "d"})).await;

        let first = transport
            .page(PageRequest {
                resource_type: "networkWatchers",
                api_version: "v1",
                cursor: PageCursor::First(
                    "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/networkWatchers".into(),
                ),
            })
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        let next = first.next_link.unwrap();

        let second = transport
            .page(PageRequest {
                resource_type: "networkWatchers",
                api_version: "v1",
                cursor: PageCursor::Next(next),
            })
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(second.next_link.is_none());
    }

    #[tokio::test]
    async fn test_scripted_fault_only_hits_matching_operation() {
        let transport = InMemoryTransport::new();
        let id = watcher_id("rg", "w");
        transport.seed(&id, json!({"name": "w"})).await;
        transport
            .fail_on(&id, Some(Operation::Delete), Fault::Conflict("InUse".into()))
            .await;

        assert!(transport
            .invoke(Invocation::new("networkWatchers", Operation::Get, id.clone(), "v1"))
            .await
            .is_ok());
        let err = transport
            .invoke(Invocation::new("networkWatchers", Operation::Delete, id, "v1"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }
}
