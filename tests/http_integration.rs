//! Integration tests for the Ops Manager client using wiremock
//!
//! These tests run the export engine and the available products client
//! against a mocked Ops Manager, including its UAA token endpoint.

use om::error::{ApiError, Document, ExportError};
use om::export::{export_config, Destination};
use om::opsman::{AvailableProductsService, Grant, HttpSettings, OpsmanClient, UploadProductInput};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{basic_auth, bearer_token, body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "some-opsman-token";
const GUID: &str = "some-product-guid";

fn client(server: &MockServer) -> OpsmanClient {
    let grant = Grant::Password {
        username: "some-username".to_string(),
        password: "some-password".to_string(),
    };
    OpsmanClient::new(&server.uri(), grant, &HttpSettings::default()).expect("client should build")
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/uaa/oauth/token"))
        .and(basic_auth("opsman", ""))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=some-username"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

async fn mount_json(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(bearer_token(TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn staged_products() -> Value {
    json!([
        {"installation_name":"p-bosh","guid":"p-bosh-guid","type":"p-bosh","product_version":"1.10.0.0"},
        {"installation_name":"cf","guid":"cf-guid","type":"cf","product_version":"1.10.0-build.177"},
        {"installation_name":"some-product","guid":GUID,"type":"some-product","product_version":"1.0.0"},
        {"installation_name":"p-isolation-segment","guid":"p-isolation-segment-guid","type":"p-isolation-segment","product_version":"1.10.0-build.31"}
    ])
}

fn properties() -> Value {
    json!({
        "properties": {
            ".properties.some-configurable-property": {
                "type": "string",
                "configurable": true,
                "credential": false,
                "value": "some-configurable-value",
                "optional": true
            },
            ".properties.some-non-configurable-property": {
                "type": "string",
                "configurable": false,
                "credential": false,
                "value": "some-non-configurable-value",
                "optional": false
            }
        }
    })
}

fn resources() -> Value {
    json!({
        "resources": [
            {
                "identifier": "some-job",
                "description": "Some Description",
                "instances": 1,
                "instances_best_fit": 100,
                "instance_type_id": "m1.medium",
                "instance_type_best_fit": "m3.large",
                "persistent_disk_mb": 20480,
                "persistent_disk_best_fit": 12345,
                "additional_vm_extensions": ["some-vm-extension", "some-other-vm-extension"]
            },
            {
                "identifier": "some-other-job",
                "description": "Some Description",
                "instances": "",
                "instances_best_fit": 1,
                "instance_type_id": "m1.medium",
                "instance_type_best_fit": "m3.large",
                "persistent_disk_mb": 20480,
                "persistent_disk_best_fit": 12345
            }
        ]
    })
}

fn networks_and_azs() -> Value {
    json!({
        "networks_and_azs": {
            "singleton_availability_zone": {"name": "az-one"},
            "other_availability_zones": [{"name": "az-two"}, {"name": "az-three"}],
            "network": {"name": "network-one"}
        }
    })
}

/// Mount the fixture product, leaving out one sub-resource so a test can mount its own
async fn mount_fixture(server: &MockServer, except: Option<&str>) {
    mount_token(server).await;
    mount_json(server, "/api/v0/staged/products", staged_products()).await;

    let documents = [
        ("properties", properties()),
        ("resources", resources()),
        ("networks_and_azs", networks_and_azs()),
    ];
    for (resource, body) in documents {
        if except == Some(resource) {
            continue;
        }
        mount_json(server, &format!("/api/v0/staged/products/{GUID}/{resource}"), body).await;
    }
}

/// Test module for the configuration export
mod export_config_tests {
    use super::*;

    /// Test the fixture product renders to the expected template
    #[tokio::test]
    async fn test_outputs_configuration_template_for_staged_product() {
        let server = MockServer::start().await;
        mount_fixture(&server, None).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("config.yml");

        export_config(&client(&server), "some-product", &Destination::File(output.clone()))
            .await
            .expect("export should succeed");

        let rendered = std::fs::read_to_string(&output).unwrap();
        let actual: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        let expected: serde_yaml::Value = serde_yaml::from_str(
            r#"---
product-properties:
  .properties.some-configurable-property:
    value: some-configurable-value
network-properties:
  singleton_availability_zone:
    name: az-one
  other_availability_zones:
    - name: az-two
    - name: az-three
  network:
    name: network-one
resource-config:
  some-job:
    instances: 1
    persistent_disk: { size_mb: "20480" }
    instance_type: { id: m1.medium }
    additional_vm_extensions: [some-vm-extension, some-other-vm-extension]
  some-other-job:
    instances: automatic
    persistent_disk: { size_mb: "20480" }
    instance_type: { id: m1.medium }
    additional_vm_extensions: []
"#,
        )
        .unwrap();

        assert_eq!(actual, expected);

        // Top-level keys and jobs keep their order
        let position = |needle: &str| rendered.find(needle).expect(needle);
        assert!(position("product-properties:") < position("network-properties:"));
        assert!(position("network-properties:") < position("resource-config:"));
        assert!(position("some-job:") < position("some-other-job:"));
    }

    /// Test the token is fetched once and reused for every sub-fetch
    #[tokio::test]
    async fn test_token_is_cached_across_requests() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/uaa/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TOKEN,
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_json(&server, "/api/v0/staged/products", staged_products()).await;
        mount_json(&server, &format!("/api/v0/staged/products/{GUID}/properties"), properties()).await;
        mount_json(&server, &format!("/api/v0/staged/products/{GUID}/resources"), resources()).await;
        mount_json(
            &server,
            &format!("/api/v0/staged/products/{GUID}/networks_and_azs"),
            networks_and_azs(),
        )
        .await;

        let client = client(&server);
        client.get_token().await.unwrap();
        om::export::export_product(&client, "some-product").await.unwrap();

        server.verify().await;
    }

    /// Test concurrent sub-fetches on a cold cache share one token request
    #[tokio::test]
    async fn test_concurrent_fetches_request_one_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/uaa/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": TOKEN, "expires_in": 3600}))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_json(&server, &format!("/api/v0/staged/products/{GUID}/properties"), properties()).await;
        mount_json(&server, &format!("/api/v0/staged/products/{GUID}/resources"), resources()).await;
        mount_json(
            &server,
            &format!("/api/v0/staged/products/{GUID}/networks_and_azs"),
            networks_and_azs(),
        )
        .await;

        om::export::assemble(&client(&server), GUID).await.unwrap();

        server.verify().await;
    }

    /// Test a failing sub-fetch aborts the export without writing anything
    #[tokio::test]
    async fn test_failing_sub_fetch_writes_nothing() {
        for failing in ["properties", "resources", "networks_and_azs"] {
            let server = MockServer::start().await;
            mount_fixture(&server, Some(failing)).await;
            Mock::given(method("GET"))
                .and(path(format!("/api/v0/staged/products/{GUID}/{failing}")))
                .respond_with(ResponseTemplate::new(500).set_body_string("something went wrong"))
                .mount(&server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let output = dir.path().join("config.yml");

            let err = export_config(&client(&server), "some-product", &Destination::File(output))
                .await
                .unwrap_err();

            match err {
                ExportError::Fetch { source, .. } => {
                    assert_eq!(source.status(), Some(500));
                    assert!(source.to_string().contains("something went wrong"));
                }
                other => panic!("unexpected error for {failing}: {other}"),
            }
            assert_eq!(
                std::fs::read_dir(dir.path()).unwrap().count(),
                0,
                "no output expected when {failing} fails"
            );
        }
    }

    /// Test the error names which document failed
    #[tokio::test]
    async fn test_failure_identifies_sub_resource() {
        let server = MockServer::start().await;
        mount_fixture(&server, Some("networks_and_azs")).await;
        Mock::given(method("GET"))
            .and(path(format!("/api/v0/staged/products/{GUID}/networks_and_azs")))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = om::export::export_product(&client(&server), "some-product")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Fetch {
                document: Document::NetworksAndAzs,
                ..
            }
        ));
        assert!(err.to_string().starts_with("could not fetch networks and azs"));
    }

    /// Test malformed JSON is fatal and nothing is written
    #[tokio::test]
    async fn test_malformed_json_is_fatal() {
        let server = MockServer::start().await;
        mount_fixture(&server, Some("resources")).await;
        Mock::given(method("GET"))
            .and(path(format!("/api/v0/staged/products/{GUID}/resources")))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"resources": [{"identifier": "some-job", "instance_type_id": m1.medium}]}"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("config.yml");

        let err = export_config(&client(&server), "some-product", &Destination::File(output))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Decode {
                document: Document::Resources,
                ..
            }
        ));
        assert!(err.to_string().contains("resources"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// Test well-formed JSON with the wrong shape is a decode error for that document
    #[tokio::test]
    async fn test_schema_violation_names_document() {
        let server = MockServer::start().await;
        mount_fixture(&server, Some("properties")).await;
        mount_json(
            &server,
            &format!("/api/v0/staged/products/{GUID}/properties"),
            json!({"properties": [1, 2, 3]}),
        )
        .await;

        let err = om::export::export_product(&client(&server), "some-product")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Decode {
                document: Document::Properties,
                ..
            }
        ));
    }

    /// Test an unknown product fails before any sub-fetch
    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_json(&server, "/api/v0/staged/products", staged_products()).await;
        Mock::given(method("GET"))
            .and(path(format!("/api/v0/staged/products/{GUID}/properties")))
            .respond_with(ResponseTemplate::new(200).set_body_json(properties()))
            .expect(0)
            .mount(&server)
            .await;

        let err = om::export::export_product(&client(&server), "missing-product")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "product not found: missing-product");
        server.verify().await;
    }

    /// Test a rejected token request surfaces as an authentication failure
    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/uaa/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "unauthorized",
                "error_description": "Bad credentials"
            })))
            .mount(&server)
            .await;

        let err = om::export::export_product(&client(&server), "some-product")
            .await
            .unwrap_err();

        match err {
            ExportError::Fetch {
                document: Document::StagedProducts,
                source: ApiError::Auth(message),
            } => assert!(message.contains("401")),
            other => panic!("unexpected error: {other}"),
        }
    }
}

/// Test module for the available products client
mod available_products_tests {
    use super::*;

    /// Test listing decodes name and version
    #[tokio::test]
    async fn test_list_and_check_availability() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        mount_json(
            &server,
            "/api/v0/available_products",
            json!([
                {"name": "cf", "product_version": "1.10.0-build.177"},
                {"name": "p-redis", "product_version": "1.8.0"}
            ]),
        )
        .await;

        let client = client(&server);
        let service = AvailableProductsService::new(&client);

        let products = service.list().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].name, "p-redis");

        assert!(service.check_product_availability("cf", "1.10.0-build.177").await.unwrap());
        assert!(!service.check_product_availability("cf", "1.11.0").await.unwrap());
    }

    /// Test deleting a single product sends its name and version
    #[tokio::test]
    async fn test_delete_single_product() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/api/v0/available_products"))
            .and(query_param("product_name", "cf"))
            .and(query_param("version", "1.10.0"))
            .and(bearer_token(TOKEN))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        AvailableProductsService::new(&client)
            .delete("cf", "1.10.0", false)
            .await
            .unwrap();

        server.verify().await;
    }

    /// Test deleting all unused products sends no query
    #[tokio::test]
    async fn test_delete_all_products() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/api/v0/available_products"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        AvailableProductsService::new(&client)
            .delete("", "", true)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let delete = requests
            .iter()
            .find(|r| r.method.as_str() == "DELETE")
            .unwrap();
        assert_eq!(delete.url.query(), None);
    }

    /// Test a delete failure carries the status code
    #[tokio::test]
    async fn test_delete_failure_status() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/api/v0/available_products"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({"errors": ["in use"]})))
            .mount(&server)
            .await;

        let client = client(&server);
        let err = AvailableProductsService::new(&client)
            .delete("cf", "1.10.0", false)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(422));
    }

    /// Test upload streams the file as multipart and reports completion
    #[tokio::test]
    async fn test_upload_product() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/v0/available_products"))
            .and(bearer_token(TOKEN))
            .and(header_exists("content-type"))
            .and(body_string_contains("product[file]"))
            .and(body_string_contains("some-product-bits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let product = dir.path().join("some-product.pivotal");
        std::fs::write(&product, "some-product-bits").unwrap();

        let last_sent = Arc::new(AtomicU64::new(0));
        let recorder = last_sent.clone();

        let client = client(&server);
        AvailableProductsService::new(&client)
            .upload(
                &UploadProductInput {
                    path: product,
                    polling_interval: Duration::from_millis(10),
                },
                Arc::new(move |sent: u64, _total: u64| recorder.store(sent, Ordering::Relaxed)),
            )
            .await
            .unwrap();

        assert_eq!(last_sent.load(Ordering::Relaxed), "some-product-bits".len() as u64);
        server.verify().await;
    }

    /// Test uploading a missing file fails before any request
    #[tokio::test]
    async fn test_upload_missing_file() {
        let server = MockServer::start().await;
        let client = client(&server);

        let err = AvailableProductsService::new(&client)
            .upload(
                &UploadProductInput {
                    path: "/nonexistent/product.pivotal".into(),
                    polling_interval: Duration::from_secs(1),
                },
                Arc::new(|_: u64, _: u64| {}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Io { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
