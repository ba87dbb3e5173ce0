//! HTTP-level tests for the Lambda Cloud client against a mock server.

use std::time::Duration;

use serde_json::json;
use soong::error::ProviderError;
use soong::lambda::{InstanceStatus, LambdaApi, LambdaClient, LaunchRequest, RetryPolicy};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test_key";

fn client(server: &MockServer) -> LambdaClient {
    LambdaClient::new(API_KEY)
        .expect("client should build")
        .with_base_url(&server.uri())
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1), 2))
}

fn instance_json(id: &str, status: &str, ip: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "name": "soong",
        "ip": ip,
        "status": status,
        "ssh_key_names": ["laptop"],
        "file_system_names": [],
        "region": { "name": "us-east-1", "description": "Virginia, USA" },
        "instance_type": {
            "name": "gpu_1x_a100",
            "description": "1x A100 (40 GB PCIe)",
            "price_cents_per_hour": 129
        },
        "created_at": "2026-01-15T10:00:00Z",
        "lease_expires_at": "2026-01-15T14:00:00Z"
    })
}

#[tokio::test]
async fn test_list_instances_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instances"))
        .and(header("authorization", "Bearer test_key"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [instance_json("i-1", "active", Some("203.0.113.7"))]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let instances = client(&server)
        .list_instances()
        .await
        .expect("list should succeed");

    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].status, InstanceStatus::Active);
    assert_eq!(instances[0].region, "us-east-1");
    assert_eq!(instances[0].instance_type, "gpu_1x_a100");
    assert_eq!(instances[0].ip.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_booting_instance_without_optional_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "i-2",
                "status": "booting",
                "region": { "name": "us-west-1" },
                "instance_type": { "name": "gpu_1x_a10" }
            }]
        })))
        .mount(&server)
        .await;

    let instance = client(&server)
        .get_instance("i-2")
        .await
        .expect("get should succeed")
        .expect("instance should exist");

    assert_eq!(instance.status, InstanceStatus::Booting);
    assert!(instance.ip.is_none());
    assert!(instance.created_at.is_none());
}

#[tokio::test]
async fn test_get_unknown_instance_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [instance_json("i-1", "active", None)]
        })))
        .mount(&server)
        .await;

    let found = client(&server)
        .get_instance("i-404")
        .await
        .expect("get should succeed");
    assert!(found.is_none());
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssh-keys"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server)
        .list_ssh_key_names()
        .await
        .expect_err("should fail after retries");

    match err {
        ProviderError::RequestFailed { attempts, message } => {
            assert_eq!(attempts, 3);
            assert!(message.contains("500"));
            assert!(message.contains("internal error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssh-keys"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ssh-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "k1", "name": "laptop", "public_key": "ssh-ed25519 AAAA" },
                { "id": "k2", "name": "desktop", "public_key": "ssh-ed25519 BBBB" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let keys = client(&server)
        .list_ssh_key_names()
        .await
        .expect("second attempt should succeed");

    assert_eq!(keys, ["laptop", "desktop"]);
}

#[tokio::test]
async fn test_connection_failure_exhausts_retries() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("should reserve a port")
        .port();
    let client = LambdaClient::new(API_KEY)
        .expect("client should build")
        .with_base_url(&format!("http://127.0.0.1:{port}"))
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1), 2));

    let err = client
        .list_instances()
        .await
        .expect_err("nothing is listening");

    assert!(matches!(err, ProviderError::RequestFailed { attempts: 3, .. }));
}

#[tokio::test]
async fn test_success_status_without_data_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": "global/unknown", "message": "Unknown error" }
        })))
        .mount(&server)
        .await;
    let client = client(&server);

    let err = client
        .get_instance("i-1")
        .await
        .expect_err("error envelope is not an empty listing");
    assert!(matches!(err, ProviderError::InvalidResponse { .. }));

    let err = client
        .list_ssh_key_names()
        .await
        .expect_err("error envelope is not an empty listing");
    assert!(matches!(err, ProviderError::InvalidResponse { .. }));

    let err = client
        .list_instance_types()
        .await
        .expect_err("error envelope is not an empty catalog");
    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_single_attempt_status_poll() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instances"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get_instance_once("i-1")
        .await
        .expect_err("should fail");

    assert!(matches!(err, ProviderError::RequestFailed { attempts: 1, .. }));
}

#[tokio::test]
async fn test_instance_types_keep_provider_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instance-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "gpu_8x_h100": {
                    "instance_type": {
                        "name": "gpu_8x_h100",
                        "description": "8x H100 (80 GB SXM5)",
                        "price_cents_per_hour": 2392,
                        "specs": { "vcpus": 208, "memory_gib": 1800, "storage_gib": 24780 }
                    },
                    "regions_with_capacity_available": []
                },
                "gpu_1x_a10": {
                    "instance_type": {
                        "name": "gpu_1x_a10",
                        "description": "1x A10 (24 GB PCIe)",
                        "price_cents_per_hour": 75,
                        "specs": { "vcpus": 30, "memory_gib": 200, "storage_gib": 1400 }
                    },
                    "regions_with_capacity_available": [
                        { "name": "us-east-1", "description": "Virginia, USA" },
                        { "name": "us-west-1", "description": "California, USA" }
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let types = client
        .list_instance_types()
        .await
        .expect("list should succeed");

    let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["gpu_8x_h100", "gpu_1x_a10"]);
    assert!(!types[0].has_capacity());
    assert_eq!(types[1].price_cents_per_hour, 75);
    assert_eq!(types[1].vcpus, 30);
    assert_eq!(types[1].regions_available, ["us-east-1", "us-west-1"]);

    let h100 = client
        .get_instance_type("gpu_8x_h100")
        .await
        .expect("lookup should succeed")
        .expect("type should exist");
    assert_eq!(h100.format_price(), "$23.92/hr");
}

#[tokio::test]
async fn test_launch_posts_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instance-operations/launch"))
        .and(body_json(json!({
            "region_name": "us-east-1",
            "instance_type_name": "gpu_1x_a100",
            "ssh_key_names": ["laptop"],
            "file_system_names": ["data"],
            "name": "soong"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "instance_ids": ["i-new"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = LaunchRequest::new("us-east-1", "gpu_1x_a100", vec![String::from("laptop")])
        .with_file_system("data")
        .with_name("soong");
    let id = client(&server)
        .launch_instance(&request)
        .await
        .expect("launch should succeed");

    assert_eq!(id, "i-new");
}

#[tokio::test]
async fn test_launch_without_ids_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instance-operations/launch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "instance_ids": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = LaunchRequest::new("us-east-1", "gpu_1x_a100", vec![String::from("laptop")]);
    let err = client(&server)
        .launch_instance(&request)
        .await
        .expect_err("empty launch should fail");

    assert!(matches!(err, ProviderError::EmptyLaunch));
}

#[tokio::test]
async fn test_terminate_posts_instance_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instance-operations/terminate"))
        .and(body_json(json!({ "instance_ids": ["i-1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "terminated_instances": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .terminate_instance("i-1")
        .await
        .expect("terminate should succeed");
}

#[tokio::test]
async fn test_file_systems_flatten_region() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file-systems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "fs-1",
                "name": "data",
                "mount_point": "/lambda/nfs/data",
                "region": { "name": "us-east-3", "description": "Washington DC, USA" },
                "is_in_use": true,
                "bytes_used": 1024
            }]
        })))
        .mount(&server)
        .await;

    let file_systems = client(&server)
        .list_file_systems()
        .await
        .expect("list should succeed");

    assert_eq!(file_systems.len(), 1);
    assert_eq!(file_systems[0].region, "us-east-3");
    assert!(file_systems[0].is_in_use);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file-systems"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .list_file_systems()
        .await
        .expect_err("should fail to parse");

    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
}
