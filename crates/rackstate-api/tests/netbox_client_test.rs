#![allow(clippy::unwrap_used)]
// Integration tests for `NetboxClient` using wiremock.

use std::collections::BTreeMap;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rackstate_api::types::{DeviceCreate, DevicePatch, SiteCreate};
use rackstate_api::{Error, NetboxClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, NetboxClient) {
    let server = MockServer::start().await;
    let client = NetboxClient::with_client(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn page(results: serde_json::Value, count: u64, next: Option<&str>) -> serde_json::Value {
    json!({ "count": count, "next": next, "previous": null, "results": results })
}

fn device_json(id: u64, name: &str, serial: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "serial": serial,
        "device_type": { "id": 3, "model": "PowerEdge R640", "slug": "poweredge-r640" },
        "role": { "id": 2, "name": "Server", "slug": "server" },
        "site": { "id": 1, "name": "Paris", "slug": "paris" },
        "rack": null,
        "location": null,
        "tags": [{ "id": 9, "name": "prod", "slug": "prod" }],
        "custom_fields": {}
    })
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_token_header_is_sent() {
    let server = MockServer::start().await;
    let token: secrecy::SecretString = "0123456789abcdef".to_string().into();
    let client = NetboxClient::new(&server.uri(), &token, &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/tenancy/tenants/"))
        .and(header("authorization", "Token 0123456789abcdef"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), 0, None)))
        .mount(&server)
        .await;

    let tenant = client.get_tenant_by_slug("acme").await.unwrap();
    assert!(tenant.is_none());
}

#[tokio::test]
async fn test_forbidden_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "detail": "Invalid token" })),
        )
        .mount(&server)
        .await;

    let result = client.get_site_by_slug("paris").await;
    match result {
        Err(Error::Authentication { ref message }) => assert_eq!(message, "Invalid token"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

// ── Lookups ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_site_by_slug() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/"))
        .and(query_param("slug", "paris-dc1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{
                "id": 4,
                "name": "paris dc1",
                "slug": "paris-dc1",
                "status": { "value": "active", "label": "Active" },
                "device_count": 12,
                "rack_count": 3
            }]),
            1,
            None,
        )))
        .mount(&server)
        .await;

    let site = client.get_site_by_slug("paris-dc1").await.unwrap().unwrap();
    assert_eq!(site.id, 4);
    assert_eq!(site.device_count, 12);
    assert_eq!(site.status.unwrap().value, "active");
}

#[tokio::test]
async fn test_ambiguous_lookup_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/"))
        .and(query_param("name", "web-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([device_json(1, "web-01", "A"), device_json(2, "web-01", "B")]),
            2,
            None,
        )))
        .mount(&server)
        .await;

    let result = client.get_device_by_name("web-01").await;
    assert!(
        matches!(result, Err(Error::MultipleResults { ref endpoint }) if endpoint == "dcim/devices/"),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_get_by_id_404_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/racks/77/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;

    assert!(client.get_rack(77).await.unwrap().is_none());
}

#[tokio::test]
async fn test_filter_device_bays_follows_pagination() {
    let (server, client) = setup().await;
    let next = format!("{}/api/dcim/device-bays/?offset=1", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/dcim/device-bays/"))
        .and(query_param("device_id", "10"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{ "id": 100, "name": "Slot 1", "device": { "id": 10 }, "installed_device": null }]),
            2,
            Some(&next),
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/device-bays/"))
        .and(query_param("device_id", "10"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{ "id": 101, "name": "Slot 1", "device": { "id": 10 }, "installed_device": { "id": 5 } }]),
            2,
            None,
        )))
        .mount(&server)
        .await;

    let bays = client.filter_device_bays(10, "Slot 1").await.unwrap();
    assert_eq!(bays.len(), 2);
    assert_eq!(bays[1].installed_device.as_ref().unwrap().id, 5);
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_site_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/dcim/sites/"))
        .and(body_json(json!({ "name": "paris dc1", "slug": "paris-dc1", "status": "active" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5, "name": "paris dc1", "slug": "paris-dc1"
        })))
        .mount(&server)
        .await;

    let site = client
        .create_site(&SiteCreate {
            name: "paris dc1",
            slug: "paris-dc1",
            status: "active",
        })
        .await
        .unwrap();
    assert_eq!(site.id, 5);
    assert_eq!(site.device_count, 0);
}

#[tokio::test]
async fn test_create_device_omits_unset_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/dcim/devices/"))
        .and(body_json(json!({
            "name": "web-01",
            "serial": "ABC123",
            "device_type": 3,
            "role": 2,
            "site": 1,
            "tags": [9]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(device_json(7, "web-01", "ABC123")))
        .mount(&server)
        .await;

    let device = client
        .create_device(&DeviceCreate {
            name: "web-01".into(),
            serial: "ABC123".into(),
            device_type: 3,
            role: 2,
            site: 1,
            platform: None,
            tenant: None,
            rack: None,
            location: None,
            position: None,
            face: None,
            tags: vec![9],
            custom_fields: BTreeMap::new(),
        })
        .await
        .unwrap();
    assert_eq!(device.id, 7);
    assert_eq!(device.tags[0].name, "prod");
}

#[tokio::test]
async fn test_update_device_sends_only_patch_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/dcim/devices/7/"))
        .and(body_json(json!({ "rack": null, "position": null, "face": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json(7, "web-01", "ABC123")))
        .mount(&server)
        .await;

    let patch = DevicePatch {
        rack: Some(None),
        position: Some(None),
        face: Some(None),
        ..DevicePatch::default()
    };
    client.update_device(7, &patch).await.unwrap();
}

#[tokio::test]
async fn test_clear_device_bay() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/dcim/device-bays/100/"))
        .and(body_json(json!({ "installed_device": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 100, "name": "Slot 1", "device": { "id": 10 }, "installed_device": null
        })))
        .mount(&server)
        .await;

    let bay = client.set_device_bay_installed(100, None).await.unwrap();
    assert!(bay.installed_device.is_none());
}

#[tokio::test]
async fn test_delete_rack_error_carries_status() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/dcim/racks/3/"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "detail": "Unable to delete object. 2 dependent objects were found"
        })))
        .mount(&server)
        .await;

    let err = client.delete_rack(3).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert!(err.to_string().contains("dependent objects"));
}

#[tokio::test]
async fn test_bad_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/9/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let result = client.get_device(9).await;
    assert!(matches!(result, Err(Error::Deserialization { .. })), "got: {result:?}");
}
