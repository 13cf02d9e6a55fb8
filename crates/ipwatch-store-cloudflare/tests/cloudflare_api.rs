//! Cloudflare record store against a mocked API
//!
//! Constraints verified:
//! - Zones resolve by exact name only
//! - Lookups return every record content for the name
//! - Upserts replace the record set with one batch of overwrites, creates
//!   and deletes, and nothing else is written
//! - A rejected batch leaves no partial writes behind
//! - Dry-run performs reads and no writes, and reports the change as not applied
//! - The API token travels as a bearer header

use ipwatch_core::Error;
use ipwatch_core::traits::{RecordChange, RecordStore, RecordType, Zone};
use ipwatch_store_cloudflare::CloudflareRecordStore;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token-0123456789";

fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
    }))
}

fn record(id: &str, content: &str, ttl: u32) -> Value {
    json!({
        "id": id,
        "name": "a.example.com",
        "type": "A",
        "content": content,
        "ttl": ttl,
        "proxied": false,
        "comment": "Update via ipwatch",
    })
}

fn store(server: &MockServer, dry_run: bool) -> CloudflareRecordStore {
    CloudflareRecordStore::new(TOKEN, None, dry_run)
        .unwrap()
        .with_base_url(server.uri())
}

fn zone() -> Zone {
    Zone::new("Z1", "example.com")
}

/// Method and path of every request that was not a read
async fn writes(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() != "GET")
        .map(|r| format!("{} {}", r.method.as_str(), r.url.path()))
        .collect()
}

/// Body of the single batch request the server received
async fn batch_sent(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let batch = requests
        .iter()
        .find(|r| r.url.path() == "/zones/Z1/dns_records/batch")
        .expect("a batch request");
    serde_json::from_slice(&batch.body).unwrap()
}

async fn mount_listing(server: &MockServer, records: Value) {
    Mock::given(method("GET"))
        .and(path("/zones/Z1/dns_records"))
        .and(query_param("name", "a.example.com"))
        .and(query_param("type", "A"))
        .respond_with(ok(records))
        .mount(server)
        .await;
}

#[tokio::test]
async fn resolve_zone_picks_exact_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "example.com"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ok(json!([
            { "id": "Z0", "name": "sub.example.com" },
            { "id": "Z1", "name": "example.com" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let zone = store(&server, false).resolve_zone("example.com").await.unwrap();
    assert_eq!(zone, Zone::new("Z1", "example.com"));
}

#[tokio::test]
async fn resolve_zone_without_exact_match_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ok(json!([{ "id": "Z0", "name": "example.org" }])))
        .mount(&server)
        .await;

    let err = store(&server, false).resolve_zone("example.com").await.unwrap_err();
    assert!(matches!(err, Error::ZoneNotFound { ref zone } if zone == "example.com"));
}

#[tokio::test]
async fn preconfigured_zone_id_skips_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store = CloudflareRecordStore::new(TOKEN, Some("Z9".into()), false)
        .unwrap()
        .with_base_url(server.uri());
    let zone = store.resolve_zone("example.com").await.unwrap();
    assert_eq!(zone.id, "Z9");
}

#[tokio::test]
async fn auth_failure_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = store(&server, false).resolve_zone("example.com").await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert!(err.to_string().contains("authentication failed"));
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn lookup_returns_every_content() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([record("r1", "5.6.7.8", 60), record("r2", "1.2.3.4", 60)]),
    )
    .await;

    let values = store(&server, false)
        .lookup(&zone(), "a.example.com", RecordType::A)
        .await
        .unwrap();
    assert_eq!(values, vec!["5.6.7.8", "1.2.3.4"]);
}

#[tokio::test]
async fn lookup_of_missing_name_is_empty() {
    let server = MockServer::start().await;
    mount_listing(&server, json!([])).await;

    let values = store(&server, false)
        .lookup(&zone(), "a.example.com", RecordType::A)
        .await
        .unwrap();
    assert!(values.is_empty());
}

#[tokio::test]
async fn lookup_server_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/Z1/dns_records"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = store(&server, false)
        .lookup(&zone(), "a.example.com", RecordType::A)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("transient"));
}

#[tokio::test]
async fn upsert_replaces_record_set() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([
            record("r1", "1.2.3.4", 60),
            record("r2", "9.9.9.9", 60),
            record("r3", "8.8.8.8", 60),
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/zones/Z1/dns_records/batch"))
        .respond_with(ok(json!({
            "deletes": [record("r2", "9.9.9.9", 60)],
            "puts": [record("r3", "5.6.7.8", 60)],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let change = RecordChange::upsert(
        "a.example.com",
        RecordType::A,
        vec!["1.2.3.4".into(), "5.6.7.8".into()],
        60,
    );
    let info = store(&server, false).upsert(&zone(), &change).await.unwrap();
    assert_eq!(info.detail, "1 overwritten, 0 created, 1 deleted");
    assert!(info.applied);

    assert_eq!(writes(&server).await, vec!["POST /zones/Z1/dns_records/batch"]);
    assert_eq!(
        batch_sent(&server).await,
        json!({
            "deletes": [{ "id": "r2" }],
            "puts": [{
                "id": "r3",
                "type": "A",
                "name": "a.example.com",
                "content": "5.6.7.8",
                "ttl": 60,
                "proxied": false,
                "comment": "Update via ipwatch",
            }],
        })
    );
}

#[tokio::test]
async fn upsert_creates_missing_records() {
    let server = MockServer::start().await;
    mount_listing(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/zones/Z1/dns_records/batch"))
        .respond_with(ok(json!({ "posts": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let change = RecordChange::upsert(
        "a.example.com",
        RecordType::A,
        vec!["1.2.3.4".into(), "5.6.7.8".into()],
        60,
    );
    store(&server, false).upsert(&zone(), &change).await.unwrap();

    let batch = batch_sent(&server).await;
    let created: Vec<&str> = batch["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap())
        .collect();
    assert_eq!(created, vec!["1.2.3.4", "5.6.7.8"]);
    assert!(batch.get("puts").is_none());
    assert!(batch.get("deletes").is_none());
}

#[tokio::test]
async fn matching_records_send_no_batch() {
    let server = MockServer::start().await;
    mount_listing(&server, json!([record("r1", "1.2.3.4", 60)])).await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let change = RecordChange::upsert("a.example.com", RecordType::A, vec!["1.2.3.4".into()], 60);
    let info = store(&server, false).upsert(&zone(), &change).await.unwrap();
    assert_eq!(info.detail, "0 overwritten, 0 created, 0 deleted");
}

#[tokio::test]
async fn upsert_write_failure_propagates() {
    let server = MockServer::start().await;
    mount_listing(&server, json!([])).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let change = RecordChange::upsert("a.example.com", RecordType::A, vec!["1.2.3.4".into()], 60);
    let err = store(&server, false).upsert(&zone(), &change).await.unwrap_err();
    assert!(err.to_string().contains("rate limit"));
}

#[tokio::test]
async fn rejected_batch_leaves_no_partial_writes() {
    let server = MockServer::start().await;
    mount_listing(&server, json!([record("r1", "9.9.9.9", 60)])).await;
    Mock::given(method("POST"))
        .and(path("/zones/Z1/dns_records/batch"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let change = RecordChange::upsert(
        "a.example.com",
        RecordType::A,
        vec!["5.6.7.8".into(), "1.2.3.4".into()],
        60,
    );
    let err = store(&server, false).upsert(&zone(), &change).await.unwrap_err();
    assert!(err.to_string().contains("transient"));

    // The overwrite and the create travelled together; nothing went out alone
    assert_eq!(writes(&server).await, vec!["POST /zones/Z1/dns_records/batch"]);
    let batch = batch_sent(&server).await;
    assert_eq!(batch["puts"][0]["id"], "r1");
    assert_eq!(batch["posts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_batch_envelope_is_an_error() {
    let server = MockServer::start().await;
    mount_listing(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/zones/Z1/dns_records/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 81058, "message": "An identical record already exists." }],
            "result": null,
        })))
        .mount(&server)
        .await;

    let change = RecordChange::upsert("a.example.com", RecordType::A, vec!["1.2.3.4".into()], 60);
    let err = store(&server, false).upsert(&zone(), &change).await.unwrap_err();
    assert!(err.to_string().contains("identical record"));
}

#[tokio::test]
async fn dry_run_reads_but_never_writes() {
    let server = MockServer::start().await;
    mount_listing(&server, json!([record("r1", "9.9.9.9", 60)])).await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let change = RecordChange::upsert(
        "a.example.com",
        RecordType::A,
        vec!["1.2.3.4".into(), "5.6.7.8".into()],
        60,
    );
    let info = store(&server, true).upsert(&zone(), &change).await.unwrap();
    assert_eq!(info.detail, "dry-run: 1 overwritten, 1 created, 0 deleted");
    assert!(!info.applied);
    assert!(writes(&server).await.is_empty());
}
