//! `ScmApiClient` against a scripted local HTTP server.

use pretty_assertions::assert_eq;
use scm_api::ScmApiClient;
use scm_core::ConfigObject;
use scm_core::ObjectKind;
use scm_core::ObjectStore;
use scm_core::ScmCredentials;
use scm_core::objects::AddressObject;
use scm_core::objects::AddressType;
use scm_core::objects::StoreError;
use serde_json::json;
use std::io::Read;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ─────────────────────────────────────────────────────────────────────────────
// Scripted server
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    url: String,
    authorization: Option<String>,
    body: String,
}

struct FakeApi {
    url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
    handle: thread::JoinHandle<()>,
}

impl FakeApi {
    /// Answer requests in order with the given (status, JSON body) pairs.
    fn start(script: Vec<(u16, serde_json::Value)>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind");
        let addr = server.server_addr().to_ip().expect("ip addr");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        let handle = thread::spawn(move || {
            for (status, body) in script {
                let Ok(mut request) = server.recv() else {
                    return;
                };
                let mut content = String::new();
                let _ = request.as_reader().read_to_string(&mut content);
                let authorization = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.to_string());
                log.lock().expect("lock").push(Seen {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    authorization,
                    body: content,
                });
                let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                    .expect("header");
                let response = Response::from_string(body.to_string())
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            url: format!("http://{addr}"),
            seen,
            handle,
        }
    }

    fn finish(self) -> Vec<Seen> {
        self.handle.join().expect("server thread");
        self.seen.lock().expect("lock").clone()
    }
}

fn credentials(url: &str) -> ScmCredentials {
    ScmCredentials {
        client_id: "ops@1234.iam.panserviceaccount.com".to_string(),
        client_secret: "s3cret".to_string(),
        tsg_id: "1234".to_string(),
        base_url: url.to_string(),
        token_url: format!("{url}/oauth2/access_token"),
        verify_ssl: true,
    }
}

fn address_json(id: &str, name: &str, netmask: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "folder": "Texas",
        "ip_netmask": netmask,
    })
}

fn netmask(name: &str, value: &str) -> ConfigObject {
    ConfigObject::Address(AddressObject::new(name, AddressType::IpNetmask, value))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn connect_exchanges_client_credentials_then_uses_bearer() {
    let api = FakeApi::start(vec![
        (200, json!({"access_token": "tok-abc", "expires_in": 899})),
        (201, address_json("id-1", "web", "1.1.1.1/32")),
    ]);
    let client = ScmApiClient::connect(&credentials(&api.url)).expect("connect");
    let created = client
        .create("Texas", &netmask("web", "1.1.1.1/32"))
        .expect("create");
    assert_eq!(created, netmask("web", "1.1.1.1/32"));

    let seen = api.finish();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].url, "/oauth2/access_token");
    assert!(seen[0].body.contains("grant_type=client_credentials"));
    assert!(seen[0].body.contains("scope=tsg_id%3A1234"));
    assert!(
        seen[0]
            .authorization
            .as_deref()
            .is_some_and(|v| v.starts_with("Basic "))
    );

    assert_eq!(seen[1].method, "POST");
    assert_eq!(seen[1].url, "/config/objects/v1/addresses");
    assert_eq!(seen[1].authorization.as_deref(), Some("Bearer tok-abc"));
    let sent: serde_json::Value = serde_json::from_str(&seen[1].body).expect("json body");
    assert_eq!(
        sent,
        json!({"name": "web", "folder": "Texas", "ip_netmask": "1.1.1.1/32"})
    );
}

#[test]
fn rejected_credentials_are_authentication_errors() {
    let api = FakeApi::start(vec![(401, json!({"error": "invalid_client"}))]);
    let err = match ScmApiClient::connect(&credentials(&api.url)) {
        Ok(_) => panic!("connect should fail"),
        Err(err) => err,
    };
    assert!(matches!(err, StoreError::Authentication(_)));
    api.finish();
}

#[test]
fn get_picks_exact_name_from_folder_listing() {
    let api = FakeApi::start(vec![(
        200,
        json!({
            "data": [
                address_json("id-1", "web-01", "10.0.0.1/32"),
                address_json("id-2", "web", "10.0.0.2/32"),
            ],
            "offset": 0,
            "total": 2,
            "limit": 200
        }),
    )]);
    let client = ScmApiClient::with_token(&api.url, "tok", true).expect("client");
    let found = client
        .get(ObjectKind::AddressObject, "Texas", "web")
        .expect("get");
    assert_eq!(found, Some(netmask("web", "10.0.0.2/32")));

    let seen = api.finish();
    assert_eq!(seen[0].method, "GET");
    assert!(seen[0].url.starts_with("/config/objects/v1/addresses?"));
    assert!(seen[0].url.contains("folder=Texas"));
    assert!(seen[0].url.contains("name=web"));
}

#[test]
fn update_resolves_id_then_puts() {
    let api = FakeApi::start(vec![
        (
            200,
            json!({"data": [address_json("id-9", "web", "10.0.0.2/32")], "total": 1}),
        ),
        (200, address_json("id-9", "web", "10.0.0.3/32")),
    ]);
    let client = ScmApiClient::with_token(&api.url, "tok", true).expect("client");
    let updated = client
        .update("Texas", &netmask("web", "10.0.0.3/32"))
        .expect("update");
    assert_eq!(updated, netmask("web", "10.0.0.3/32"));

    let seen = api.finish();
    assert_eq!(seen[1].method, "PUT");
    assert_eq!(seen[1].url, "/config/objects/v1/addresses/id-9");
}

#[test]
fn list_follows_pagination() {
    let api = FakeApi::start(vec![
        (
            200,
            json!({
                "data": [address_json("1", "a", "10.0.0.1"), address_json("2", "b", "10.0.0.2")],
                "offset": 0,
                "total": 3,
                "limit": 2
            }),
        ),
        (
            200,
            json!({"data": [address_json("3", "c", "10.0.0.3")], "offset": 2, "total": 3}),
        ),
    ]);
    let client = ScmApiClient::with_token(&api.url, "tok", true).expect("client");
    let names: Vec<String> = client
        .list(ObjectKind::AddressObject, "Texas")
        .expect("list")
        .iter()
        .map(|o| o.name().to_string())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let seen = api.finish();
    assert!(seen[1].url.contains("offset=2"));
}

#[test]
fn list_without_total_pages_until_short_page() {
    let full: Vec<serde_json::Value> = (0..200)
        .map(|i| address_json(&i.to_string(), &format!("host-{i}"), "10.0.0.1"))
        .collect();
    let api = FakeApi::start(vec![
        (200, json!({"data": full, "offset": 0, "limit": 200})),
        (
            200,
            json!({"data": [address_json("200", "last", "10.0.0.2")], "offset": 200}),
        ),
    ]);
    let client = ScmApiClient::with_token(&api.url, "tok", true).expect("client");
    let objects = client
        .list(ObjectKind::AddressObject, "Texas")
        .expect("list");
    assert_eq!(objects.len(), 201);
    assert_eq!(objects[200].name(), "last");

    let seen = api.finish();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].url.contains("offset=200"));
}

#[test]
fn server_validation_error_carries_message() {
    let api = FakeApi::start(vec![(
        400,
        json!({"_errors": [{"code": "E016", "message": "Invalid ip_netmask"}], "_request_id": "r"}),
    )]);
    let client = ScmApiClient::with_token(&api.url, "tok", true).expect("client");
    let err = client
        .create("Texas", &netmask("web", "1.1.1.1/32"))
        .expect_err("rejected");
    match err {
        StoreError::Validation(message) => assert_eq!(message, "E016: Invalid ip_netmask"),
        other => panic!("unexpected error {other:?}"),
    }
    api.finish();
}

#[test]
fn delete_of_unknown_name_is_not_found() {
    let api = FakeApi::start(vec![(200, json!({"data": [], "total": 0}))]);
    let client = ScmApiClient::with_token(&api.url, "tok", true).expect("client");
    let err = client
        .delete(ObjectKind::AddressObject, "Texas", "ghost")
        .expect_err("missing");
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(api.finish().len(), 1);
}
