//! Integration tests for the HTTP transport using wiremock
//!
//! These tests drive the fluent API against mocked endpoints, checking the
//! requests it sends and how response codes map onto errors.

use armnet::arm::auth::{AccessToken, Credentials, TokenSource};
use armnet::arm::http::HttpTransport;
use armnet::arm::ArmClient;
use armnet::model::Region;
use armnet::network::RouteNextHopType;
use armnet::{Error, NetworkManager};
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{
    bearer_token, body_partial_json, header_exists, method, path, query_param,
    query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";
const ROUTE_TABLES: &str =
    "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg/providers/Microsoft.Network/routeTables";

/// Token source handing out a fixed token
struct StaticToken;

#[async_trait]
impl TokenSource for StaticToken {
    async fn fetch_token(&self) -> armnet::Result<AccessToken> {
        Ok(AccessToken {
            token: "test-token".to_string(),
            expires_on: None,
        })
    }
}

/// Token source issuing `token-0`, `token-1`, ... on successive fetches
#[derive(Default)]
struct RotatingToken {
    issued: AtomicUsize,
}

#[async_trait]
impl TokenSource for RotatingToken {
    async fn fetch_token(&self) -> armnet::Result<AccessToken> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken {
            token: format!("token-{n}"),
            expires_on: None,
        })
    }
}

fn network(server: &MockServer) -> NetworkManager {
    network_with(server, Credentials::new(Arc::new(StaticToken)))
}

fn network_with(server: &MockServer, credentials: Credentials) -> NetworkManager {
    let transport = HttpTransport::new(&server.uri(), credentials).expect("valid endpoint");
    NetworkManager::new(ArmClient::new(Arc::new(transport), SUBSCRIPTION))
}

fn route_table(name: &str) -> Value {
    json!({
        "id": format!("{ROUTE_TABLES}/{name}"),
        "name": name,
        "type": "Microsoft.Network/routeTables",
        "location": "westus",
        "etag": "W/\"1\"",
        "tags": {"env": "test"},
        "properties": {
            "provisioningState": "Succeeded",
            "routes": [{
                "id": format!("{ROUTE_TABLES}/{name}/routes/default"),
                "name": "default",
                "properties": {"addressPrefix": "0.0.0.0/0", "nextHopType": "Internet"}
            }],
            "disableBgpRoutePropagation": false
        }
    })
}

fn error_body(code: &str) -> Value {
    json!({"error": {"code": code, "message": "rejected by test"}})
}

/// Test module for requests issued by terminal operations
mod request_tests {
    use super::*;

    /// Test create sends a single authenticated PUT with the configured payload
    #[tokio::test]
    async fn test_create_sends_put_with_payload() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(format!("{ROUTE_TABLES}/rt1")))
            .and(query_param("api-version", "2023-09-01"))
            .and(bearer_token("test-token"))
            .and(header_exists("x-ms-client-request-id"))
            .and(body_partial_json(json!({
                "location": "westus",
                "tags": {"env": "test"},
                "properties": {
                    "routes": [{"name": "default", "properties": {"nextHopType": "Internet"}}]
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(route_table("rt1")))
            .expect(1)
            .mount(&server)
            .await;

        let table = network(&server)
            .route_tables()
            .define("rt1")
            .with_region("West US")
            .with_existing_resource_group("rg")
            .with_tag("env", "test")
            .with_route("default", "0.0.0.0/0", RouteNextHopType::INTERNET)
            .create()
            .await
            .expect("create should succeed");

        assert_eq!(table.name(), "rt1");
        assert_eq!(table.region(), Some(&Region::US_WEST));
        assert_eq!(table.etag(), Some("W/\"1\""));
        assert_eq!(table.routes().len(), 1);
    }

    /// Test get by name issues a GET on the resource id
    #[tokio::test]
    async fn test_get_by_resource_group() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{ROUTE_TABLES}/rt1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(route_table("rt1")))
            .expect(1)
            .mount(&server)
            .await;

        let table = network(&server)
            .route_tables()
            .get_by_resource_group("rg", "rt1")
            .await
            .expect("get should succeed");

        assert_eq!(table.resource_group_name(), "rg");
        assert_eq!(
            table.route("default").and_then(|r| r.next_hop_type()),
            Some(&RouteNextHopType::INTERNET)
        );
    }

    /// Test delete accepts an empty 204 response
    #[tokio::test]
    async fn test_delete_accepts_no_content() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(format!("{ROUTE_TABLES}/rt1")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        network(&server)
            .route_tables()
            .delete_by_resource_group("rg", "rt1")
            .await
            .expect("delete should succeed");
    }

    /// Test a rejected token is refreshed once and the request retried
    #[tokio::test]
    async fn test_unauthorized_refreshes_token_and_retries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{ROUTE_TABLES}/rt1")))
            .and(bearer_token("token-0"))
            .respond_with(ResponseTemplate::new(401).set_body_json(error_body("ExpiredAuthenticationToken")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{ROUTE_TABLES}/rt1")))
            .and(bearer_token("token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(route_table("rt1")))
            .expect(1)
            .mount(&server)
            .await;

        let source = Arc::new(RotatingToken::default());
        let table = network_with(&server, Credentials::new(source.clone()))
            .route_tables()
            .get_by_resource_group("rg", "rt1")
            .await
            .expect("retry with a fresh token should succeed");

        assert_eq!(table.name(), "rt1");
        assert_eq!(source.issued.load(Ordering::SeqCst), 2);
    }

    /// Test start posts to the action path, then reads the gateway back
    #[tokio::test]
    async fn test_application_gateway_start_posts_action() {
        let server = MockServer::start().await;
        let gateway_path = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg/providers/Microsoft.Network/applicationGateways/agw";
        let gateway = |state: &str| {
            json!({
                "id": gateway_path,
                "name": "agw",
                "location": "eastus",
                "properties": {"operationalState": state, "provisioningState": "Succeeded"}
            })
        };

        Mock::given(method("POST"))
            .and(path(format!("{gateway_path}/start")))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(gateway_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(gateway("Running")))
            .mount(&server)
            .await;

        let network = network(&server);
        let handle = network
            .application_gateways()
            .get_by_id(gateway_path)
            .await
            .expect("get should succeed");
        let started = handle.start().await.expect("start should succeed");

        assert!(started.is_running());
    }
}

/// Test module for error mapping
mod error_tests {
    use super::*;

    /// Test 404 maps to NotFound
    #[tokio::test]
    async fn test_404_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{ROUTE_TABLES}/missing")))
            .respond_with(ResponseTemplate::new(404).set_body_json(error_body("ResourceNotFound")))
            .mount(&server)
            .await;

        let network = network(&server);
        let err = network
            .route_tables()
            .get_by_resource_group("rg", "missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let found = network
            .route_tables()
            .find_by_resource_group("rg", "missing")
            .await
            .expect("absence is not an error");
        assert!(found.is_none());
    }

    /// Test 400 maps to ValidationRejected with the backend's code
    #[tokio::test]
    async fn test_400_is_validation_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(400).set_body_json(error_body("InvalidAddressPrefix")))
            .mount(&server)
            .await;

        let err = network(&server)
            .route_tables()
            .define("rt1")
            .with_region(Region::US_WEST)
            .with_existing_resource_group("rg")
            .with_route("bad", "not-a-cidr", RouteNextHopType::INTERNET)
            .create()
            .await
            .unwrap_err();

        match err {
            Error::ValidationRejected { code, .. } => assert_eq!(code, "InvalidAddressPrefix"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    /// Test 409 and 412 map to Conflict
    #[tokio::test]
    async fn test_409_and_412_are_conflicts() {
        for status in [409, 412] {
            let server = MockServer::start().await;

            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(status).set_body_json(error_body("AnotherOperationInProgress")))
                .mount(&server)
                .await;

            let err = network(&server)
                .network_watchers()
                .define("nw")
                .with_region(Region::US_EAST)
                .with_existing_resource_group("rg")
                .create()
                .await
                .unwrap_err();
            assert!(err.is_conflict(), "status {status} gave {err:?}");
        }
    }

    /// Test other failures surface as transport errors with their status
    #[tokio::test]
    async fn test_503_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = network(&server)
            .virtual_networks()
            .get_by_resource_group("rg", "vnet")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(matches!(err, Error::Transport { .. }));
    }
}

/// Test module for paged listings
mod paging_tests {
    use super::*;

    /// Test listing follows nextLink until it is absent
    #[tokio::test]
    async fn test_list_follows_next_link() {
        let server = MockServer::start().await;
        let next = format!(
            "{}{ROUTE_TABLES}?api-version=2023-09-01&$skiptoken=page2",
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path(ROUTE_TABLES))
            .and(query_param_is_missing("$skiptoken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [route_table("rt1"), route_table("rt2")],
                "nextLink": next
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(ROUTE_TABLES))
            .and(query_param("$skiptoken", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [route_table("rt3")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tables: Vec<_> = network(&server)
            .route_tables()
            .list_by_resource_group("rg")
            .try_collect()
            .await
            .expect("listing should succeed");

        let names: Vec<_> = tables.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["rt1", "rt2", "rt3"]);
    }

    /// Test an empty listing yields no items
    #[tokio::test]
    async fn test_empty_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/subscriptions/00000000-0000-0000-0000-000000000000/providers/Microsoft.Network/publicIPAddresses",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .mount(&server)
            .await;

        let addresses: Vec<_> = network(&server)
            .public_ip_addresses()
            .list()
            .try_collect()
            .await
            .expect("listing should succeed");
        assert!(addresses.is_empty());
    }
}
