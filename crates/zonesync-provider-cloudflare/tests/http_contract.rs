//! Contract Test: Cloudflare HTTP API usage
//!
//! Runs the provider against a mock Cloudflare API and checks the exact
//! requests it makes.
//!
//! Constraints verified:
//! - Credentials are sent the way the API expects them
//! - Record listings follow pagination
//! - An upsert deletes stale records and creates missing ones only
//! - API failures surface as protocol errors carrying the status

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zonesync_core::config::{BackendConfig, CloudflareConfig, ProviderConfig};
use zonesync_core::{DnsProvider, DnsProviderFactory, DomainName, Error, RecordData, RecordSpec};
use zonesync_provider_cloudflare::{
    Auth, CloudflareApi, CloudflareClient, CloudflareFactory, CloudflareProvider,
};

const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";

fn envelope(result: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

fn page(result: serde_json::Value, page: u32, total_pages: u32) -> serde_json::Value {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
        "result_info": { "page": page, "per_page": 100, "total_pages": total_pages }
    })
}

fn a_record(id: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": "A",
        "name": "www.example.com",
        "content": content,
        "proxied": false,
        "ttl": 300
    })
}

async fn mount_zone_lookup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([{ "id": ZONE_ID }]))))
        .expect(1)
        .mount(server)
        .await;
}

fn provider_for(server: &MockServer, proxied_by_default: bool) -> CloudflareProvider {
    let mut config = CloudflareConfig::with_token("test-token");
    config.base_url = Some(server.uri());
    config.proxied_by_default = proxied_by_default;

    CloudflareProvider::from_config(vec![zone()], &config).expect("provider builds")
}

fn zone() -> DomainName {
    DomainName::parse("example.com.").expect("valid zone")
}

fn spec(addrs: &[&str]) -> RecordSpec {
    RecordSpec::new(
        DomainName::parse("www.example.com").expect("valid name"),
        RecordData::a(addrs.iter().copied()),
    )
    .with_ttl(300)
}

#[tokio::test]
async fn token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([{ "id": ZONE_ID }]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudflareClient::new(server.uri(), Auth::Token("test-token".to_string()))
        .expect("client builds");
    assert_eq!(client.zone_id("example.com").await.unwrap(), ZONE_ID);
}

#[tokio::test]
async fn api_key_is_sent_with_email() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(header("X-Auth-Key", "global-key"))
        .and(header("X-Auth-Email", "admin@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([{ "id": ZONE_ID }]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudflareClient::new(
        server.uri(),
        Auth::Key {
            key: "global-key".to_string(),
            email: "admin@example.com".to_string(),
        },
    )
    .expect("client builds");
    assert_eq!(client.zone_id("example.com").await.unwrap(), ZONE_ID);
}

#[tokio::test]
async fn missing_zone_is_lookup_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .mount(&server)
        .await;

    let client = CloudflareClient::new(server.uri(), Auth::Token("t".to_string())).unwrap();
    let err = client.zone_id("example.com").await.unwrap_err();
    assert!(matches!(err, Error::BackendLookup { zone, .. } if zone == "example.com"));
}

#[tokio::test]
async fn listing_follows_pagination() {
    let server = MockServer::start().await;
    let list_path = format!("/zones/{ZONE_ID}/dns_records");

    Mock::given(method("GET"))
        .and(path(list_path.as_str()))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([a_record("r1", "192.0.2.1")]),
            1,
            2,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(list_path.as_str()))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([a_record("r2", "192.0.2.2")]),
            2,
            2,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudflareClient::new(server.uri(), Auth::Token("t".to_string())).unwrap();
    let records = client
        .list_records(ZONE_ID, "www.example.com", "A")
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().filter_map(|r| r.id.as_deref()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

#[tokio::test]
async fn upsert_deletes_stale_and_creates_missing() {
    let server = MockServer::start().await;
    mount_zone_lookup(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE_ID}/dns_records").as_str()))
        .and(query_param("name", "www.example.com"))
        .and(query_param("type", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([a_record("r1", "1.1.1.1"), a_record("r2", "2.2.2.2")]),
            1,
            1,
        )))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/zones/{ZONE_ID}/dns_records/r1").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "id": "r1" }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/zones/{ZONE_ID}/dns_records").as_str()))
        .and(body_json(json!({
            "type": "A",
            "name": "www.example.com",
            "content": "3.3.3.3",
            "ttl": 300,
            "proxied": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(a_record("r3", "3.3.3.3"))))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, false);
    provider
        .upsert(&zone(), &spec(&["2.2.2.2", "3.3.3.3"]))
        .await
        .expect("upsert succeeds");
}

#[tokio::test]
async fn delete_of_absent_rrset_makes_no_mutation() {
    let server = MockServer::start().await;
    mount_zone_lookup(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE_ID}/dns_records").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), 1, 0)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server, true);
    provider
        .delete(&zone(), &spec(&["192.0.2.1"]))
        .await
        .expect("delete succeeds");
}

#[tokio::test]
async fn http_failure_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 9109, "message": "Invalid access token" }]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server, true);
    let err = provider
        .upsert(&zone(), &spec(&["192.0.2.1"]))
        .await
        .unwrap_err();

    assert!(matches!(&err, Error::Protocol { code, .. } if code == "403"));
}

#[tokio::test]
async fn unsuccessful_envelope_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 1003, "message": "Invalid or missing zone id." }],
            "result": null
        })))
        .mount(&server)
        .await;

    let client = CloudflareClient::new(server.uri(), Auth::Token("t".to_string())).unwrap();
    let err = client.zone_id("example.com").await.unwrap_err();

    assert!(matches!(&err, Error::Protocol { code, .. } if code == "1003"));
    assert!(err.to_string().contains("Invalid or missing zone id."));
}

#[test]
fn factory_uses_configured_base_url() {
    let mut config = CloudflareConfig::with_token("t");
    config.base_url = Some("http://127.0.0.1:9/client/v4/".to_string());

    let provider = CloudflareFactory
        .create(&ProviderConfig::new(vec![zone()], BackendConfig::Cloudflare(config)))
        .expect("provider builds");
    assert_eq!(provider.zones(), &[zone()]);
}
