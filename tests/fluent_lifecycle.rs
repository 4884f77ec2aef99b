//! End-to-end lifecycle tests against the in-memory transport
//!
//! These tests exercise definition, update, listing and batch operations
//! through the public API only, asserting on what reached the transport.

use armnet::arm::memory::{Fault, InMemoryTransport};
use armnet::arm::{ArmClient, Invocation, Operation, Page, PageRequest, Transport};
use armnet::model::{ProvisioningState, Region, ResourceId};
use armnet::network::route_table::RouteTableDefinition;
use armnet::network::RouteNextHopType;
use armnet::{Error, NetworkManager};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

fn setup(page_size: usize) -> (Arc<InMemoryTransport>, NetworkManager) {
    let transport = Arc::new(InMemoryTransport::new().with_page_size(page_size));
    let client = ArmClient::new(transport.clone(), SUBSCRIPTION).with_batch_concurrency(2);
    (transport, NetworkManager::new(client))
}

fn table_definition(
    network: &NetworkManager,
    group: &str,
    name: &str,
) -> RouteTableDefinition<armnet::fluent::stage::WithCreate> {
    network
        .route_tables()
        .define(name)
        .with_region(Region::US_WEST)
        .with_existing_resource_group(group)
}

/// Test module for create and update
mod lifecycle_tests {
    use super::*;

    /// Test create issues exactly one call and echoes every supplied field
    #[tokio::test]
    async fn test_create_is_single_call_echoing_fields() {
        let (transport, network) = setup(100);

        let table = table_definition(&network, "rg", "rt1")
            .with_tags([("env", "prod"), ("team", "net")])
            .create()
            .await
            .expect("create should succeed");

        let invocations = transport.invocations().await;
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].operation, Operation::CreateOrUpdate);

        assert_eq!(table.name(), "rt1");
        assert_eq!(table.resource_group_name(), "rg");
        assert_eq!(table.region(), Some(&Region::US_WEST));
        let expected: BTreeMap<String, String> = [("env", "prod"), ("team", "net")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(table.tags(), &expected);
        assert_eq!(table.provisioning_state(), Some(&ProvisioningState::SUCCEEDED));
    }

    /// Test begin_create runs the same single call on the runtime
    #[tokio::test]
    async fn test_begin_create_completes_in_background() {
        let (transport, network) = setup(100);

        let pending = table_definition(&network, "rg", "rt-async").begin_create();
        let table = pending
            .await
            .expect("task should not panic")
            .expect("create should succeed");

        assert_eq!(table.name(), "rt-async");
        assert_eq!(transport.mutating_calls().await, 1);
    }

    /// Test apply twice sends two identical payloads
    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let (transport, network) = setup(100);
        let table = table_definition(&network, "rg", "rt1")
            .create()
            .await
            .expect("create should succeed");

        let update = table
            .update()
            .with_tag("owner", "netops")
            .with_route("internet", "0.0.0.0/0", RouteNextHopType::INTERNET);
        let first = update.apply().await.expect("first apply");
        let second = update.apply().await.expect("second apply");

        let payloads = transport.submitted_payloads().await;
        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[1], payloads[2]);
        assert_eq!(first.routes().len(), second.routes().len());
        assert_eq!(second.tags().get("owner").map(String::as_str), Some("netops"));
    }

    /// Test a route can be attached and then detached through apply
    #[tokio::test]
    async fn test_route_attach_and_detach() {
        let (_transport, network) = setup(100);
        let table = table_definition(&network, "rg", "rt1")
            .create()
            .await
            .expect("create should succeed");

        let table = table
            .update()
            .define_route("to-firewall")
            .with_destination_address_prefix("10.10.0.0/16")
            .with_next_hop_to_virtual_appliance("10.0.1.4")
            .attach()
            .apply()
            .await
            .expect("attach");
        let route = table.route("to-firewall").expect("route attached");
        assert_eq!(route.next_hop_ip_address(), Some("10.0.1.4"));

        let table = table
            .update()
            .without_route("to-firewall")
            .apply()
            .await
            .expect("detach");
        assert!(table.routes().is_empty());

        let fetched = network
            .route_tables()
            .get_by_id(&table.id())
            .await
            .expect("get should succeed");
        assert!(fetched.routes().is_empty());
    }

    /// Test validation rejections surface from create
    #[tokio::test]
    async fn test_validation_rejection_on_create() {
        let (transport, network) = setup(100);
        let id = ResourceId::parse(&format!(
            "/subscriptions/{SUBSCRIPTION}/resourceGroups/rg/providers/Microsoft.Network/routeTables/bad"
        ))
        .expect("valid id");
        transport
            .fail_on(&id, None, Fault::Validation("InvalidRouteName".to_string()))
            .await;

        let err = table_definition(&network, "rg", "bad")
            .create()
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}

/// Test module for lookups and listings
mod collection_tests {
    use super::*;

    /// Test name lookups of absent resources fail with NotFound
    #[tokio::test]
    async fn test_lookup_of_missing_name_is_not_found() {
        let (_transport, network) = setup(100);

        let err = network
            .virtual_networks()
            .get_by_resource_group("rg", "nope")
            .await
            .unwrap_err();
        match err {
            Error::NotFound { name, .. } => assert_eq!(name, "nope"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    /// Test blank names are rejected without reaching the transport
    #[tokio::test]
    async fn test_blank_name_is_rejected_before_any_call() {
        let (transport, network) = setup(100);
        table_definition(&network, "rg", "rt1")
            .create()
            .await
            .expect("create should succeed");

        let err = network
            .route_tables()
            .get_by_resource_group("rg", "")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResourceId(_)));

        let err = network
            .route_tables()
            .find_by_resource_group("", "rt1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResourceId(_)));

        let err = network
            .route_tables()
            .delete_by_resource_group("rg", " ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResourceId(_)));

        assert_eq!(transport.invocations().await.len(), 1);
    }

    /// Test get_by_id rejects ids of another type
    #[tokio::test]
    async fn test_get_by_id_checks_type() {
        let (_transport, network) = setup(100);
        let vnet_id = format!(
            "/subscriptions/{SUBSCRIPTION}/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet"
        );

        let err = network.route_tables().get_by_id(&vnet_id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidResourceId(_)));
    }

    /// Test listing is lazy and pages on demand
    #[tokio::test]
    async fn test_list_pages_lazily() {
        let (transport, network) = setup(2);
        for name in ["a", "b", "c", "d", "e"] {
            table_definition(&network, "rg", name)
                .create()
                .await
                .expect("create should succeed");
        }
        table_definition(&network, "other", "f")
            .create()
            .await
            .expect("create should succeed");

        let first: Vec<_> = network
            .route_tables()
            .list_by_resource_group("rg")
            .take(1)
            .try_collect()
            .await
            .expect("first item");
        assert_eq!(first.len(), 1);
        assert_eq!(transport.pages_served().await, 1);

        let all: Vec<_> = network
            .route_tables()
            .list_by_resource_group("rg")
            .try_collect()
            .await
            .expect("listing should succeed");
        assert_eq!(all.len(), 5);
        assert_eq!(transport.pages_served().await, 1 + 3);

        let everywhere: Vec<_> = network
            .route_tables()
            .list()
            .try_collect()
            .await
            .expect("listing should succeed");
        assert_eq!(everywhere.len(), 6);
    }
}

/// Test module for batch operations
mod batch_tests {
    use super::*;

    /// Test batch stop reports one item per id with the rejected one failing
    #[tokio::test]
    async fn test_stop_by_ids_with_one_rejection() {
        let (transport, network) = setup(100);
        let subnet = format!(
            "/subscriptions/{SUBSCRIPTION}/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet/subnets/gw"
        );

        let mut ids = Vec::new();
        for name in ["id1", "id2", "id3"] {
            let gateway = network
                .application_gateways()
                .define(name)
                .with_region(Region::US_EAST)
                .with_existing_resource_group("rg")
                .with_existing_subnet(&subnet)
                .create()
                .await
                .expect("create should succeed");
            ids.push(gateway.id());
        }

        let rejected = ResourceId::parse(&ids[1]).expect("valid id");
        transport
            .fail_on(
                &rejected,
                Some(Operation::Action("stop")),
                Fault::Validation("InvalidGatewayState".to_string()),
            )
            .await;

        let items: Vec<_> = network
            .application_gateways()
            .stop_by_ids(ids.iter().cloned())
            .collect()
            .await;

        assert_eq!(items.len(), 3);
        let failed: Vec<_> = items.iter().filter(|i| !i.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].key, ids[1]);
        assert!(failed[0]
            .result
            .as_ref()
            .is_err_and(|e| e.is_validation()));
    }

    /// Test batch delete reports per-id outcomes and leaves failures in place
    #[tokio::test]
    async fn test_delete_by_ids_mixed_outcomes() {
        let (transport, network) = setup(100);
        let keep = table_definition(&network, "rg", "keep")
            .create()
            .await
            .expect("create should succeed");
        let gone = table_definition(&network, "rg", "drop")
            .create()
            .await
            .expect("create should succeed");
        transport
            .fail_on(
                keep.resource_id(),
                Some(Operation::Delete),
                Fault::Conflict("InUseRouteTableCannotBeDeleted".to_string()),
            )
            .await;

        let items: Vec<_> = network
            .route_tables()
            .delete_by_ids([keep.id(), gone.id(), "not-an-id".to_string()])
            .collect()
            .await;

        assert_eq!(items.len(), 3);
        for item in &items {
            match item.key.as_str() {
                k if k == gone.id() => assert!(item.is_success()),
                k if k == keep.id() => {
                    assert!(item.result.as_ref().is_err_and(|e| e.is_conflict()))
                }
                _ => assert!(matches!(item.result, Err(Error::InvalidResourceId(_)))),
            }
        }

        assert!(network
            .route_tables()
            .find_by_resource_group("rg", "keep")
            .await
            .expect("lookup")
            .is_some());
        assert!(network
            .route_tables()
            .find_by_resource_group("rg", "drop")
            .await
            .expect("lookup")
            .is_none());
    }

    /// Test batch create keys items by name
    #[tokio::test]
    async fn test_create_batch() {
        let (transport, network) = setup(100);
        let definitions = ["x", "y", "z"]
            .iter()
            .map(|name| table_definition(&network, "rg", name))
            .collect();

        let mut keys: Vec<_> = network
            .route_tables()
            .create_batch(definitions)
            .map(|item| {
                assert!(item.is_success());
                item.key
            })
            .collect()
            .await;
        keys.sort();

        assert_eq!(keys, ["x", "y", "z"]);
        assert_eq!(transport.mutating_calls().await, 3);
    }

    /// Backend that takes a per-name time to answer and tracks overlap
    struct SlowTransport {
        delays: BTreeMap<String, Duration>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        started: Mutex<Vec<String>>,
        completed: Mutex<Vec<String>>,
    }

    impl SlowTransport {
        fn new(delays: &[(&str, u64)]) -> Self {
            Self {
                delays: delays
                    .iter()
                    .map(|(name, ms)| (name.to_string(), Duration::from_millis(*ms)))
                    .collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                started: Mutex::new(Vec::new()),
                completed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for SlowTransport {
        async fn invoke(&self, invocation: Invocation) -> armnet::Result<Option<serde_json::Value>> {
            let name = invocation.resource_id.name().to_string();
            self.started.lock().unwrap().push(name.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delays[&name]).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.lock().unwrap().push(name);
            Ok(None)
        }

        async fn page(&self, _request: PageRequest) -> armnet::Result<Page> {
            Ok(Page::default())
        }
    }

    fn slow_network(transport: &Arc<SlowTransport>) -> NetworkManager {
        let client = ArmClient::new(transport.clone(), SUBSCRIPTION).with_batch_concurrency(2);
        NetworkManager::new(client)
    }

    fn table_id(name: &str) -> String {
        format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/rg/providers/Microsoft.Network/routeTables/{name}")
    }

    /// Test batch calls overlap up to the configured limit and report in
    /// completion order
    #[tokio::test]
    async fn test_batch_runs_concurrently_up_to_limit() {
        let transport = Arc::new(SlowTransport::new(&[
            ("a", 150),
            ("b", 10),
            ("c", 10),
            ("d", 10),
        ]));
        let network = slow_network(&transport);

        let items: Vec<_> = network
            .route_tables()
            .delete_by_ids(["a", "b", "c", "d"].map(table_id))
            .collect()
            .await;

        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i.is_success()));
        assert_eq!(transport.peak.load(Ordering::SeqCst), 2);

        // The slow first id finishes after every faster one
        assert_eq!(items.last().map(|i| i.key.as_str()), Some(table_id("a").as_str()));
        assert_eq!(
            transport.completed.lock().unwrap().last().map(String::as_str),
            Some("a")
        );
    }

    /// Test dropping a batch stream abandons the calls still in flight
    #[tokio::test]
    async fn test_dropping_batch_cancels_pending_calls() {
        let transport = Arc::new(SlowTransport::new(&[
            ("a", 10),
            ("b", 200),
            ("c", 200),
            ("d", 200),
        ]));
        let network = slow_network(&transport);

        let mut items = network
            .route_tables()
            .delete_by_ids(["a", "b", "c", "d"].map(table_id));
        let first = items.next().await.expect("one item");
        assert_eq!(first.key, table_id("a"));
        drop(items);

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(*transport.completed.lock().unwrap(), ["a"]);
        let mut started = transport.started.lock().unwrap().clone();
        started.sort();
        assert_eq!(started, ["a", "b"]);
        assert_eq!(transport.in_flight.load(Ordering::SeqCst), 1);
    }
}
