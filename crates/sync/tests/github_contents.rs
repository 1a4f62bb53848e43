use metahint_protocol::Coordinates;
use metahint_sync::{
    encode_content, DocumentFeed, DocumentStore, GithubContentsStore, HintDraft, LocationLink,
    RemoteConfig, SyncClient, SyncError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const HINTS: &str = "/repos/tester/hints/contents/data/metas.json";
const LOCATIONS: &str = "/repos/tester/hints/contents/data/locations.json";

fn config_for(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        owner: "tester".into(),
        repo: "hints".into(),
        api_base: server.uri(),
        raw_base: server.uri(),
        ..RemoteConfig::default()
    }
}

fn contents(text: &str, sha: &str) -> ResponseTemplate {
    // The API wraps base64 content with newlines.
    let encoded = encode_content(text);
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    ResponseTemplate::new(200).set_body_json(json!({
        "type": "file",
        "encoding": "base64",
        "content": wrapped,
        "sha": sha,
    }))
}

fn committed(sha: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "content": { "sha": sha } }))
}

#[tokio::test]
async fn read_sends_token_and_decodes_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HINTS))
        .and(header("Authorization", "token secret"))
        .and(query_param("ref", "main"))
        .respond_with(contents(r#"[{"id":"h1","title":"Ümlaut"}]"#, "sha-1"))
        .expect(1)
        .mount(&server)
        .await;

    let store = GithubContentsStore::new(config_for(&server), "secret").expect("store");
    let doc = store.read("data/metas.json").await.expect("read");
    assert_eq!(doc.sha, "sha-1");
    assert_eq!(doc.text, r#"[{"id":"h1","title":"Ümlaut"}]"#);
}

#[tokio::test]
async fn stale_sha_maps_to_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(HINTS))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "data/metas.json does not match abc"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(LOCATIONS))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid request.\n\n\"sha\" wasn't supplied."
        })))
        .mount(&server)
        .await;

    let store = GithubContentsStore::new(config_for(&server), "secret").expect("store");
    let err = store
        .write("data/metas.json", "[]", "msg", "old")
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    let err = store
        .write("data/locations.json", "{}", "msg", "old")
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "{err}");
}

#[tokio::test]
async fn submit_hint_round_trips_through_contents_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HINTS))
        .respond_with(contents("[]", "hints-v1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LOCATIONS))
        .respond_with(contents(r#"{"PANO_LEGACY_1":["h0"]}"#, "locations-v1"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(HINTS))
        .and(body_partial_json(json!({ "sha": "hints-v1", "branch": "main" })))
        .respond_with(committed("hints-v2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(LOCATIONS))
        .and(body_partial_json(json!({ "sha": "locations-v1" })))
        .respond_with(committed("locations-v2"))
        .expect(1)
        .mount(&server)
        .await;

    let store = GithubContentsStore::new(config_for(&server), "secret").expect("store");
    let client = SyncClient::new(store, &config_for(&server));
    let draft = HintDraft {
        title: "Snorkel".into(),
        description: "Raised air intake on trucks".into(),
        tags: vec!["vehicle".into()],
        ..HintDraft::default()
    };
    let location = LocationLink {
        coordinates: Coordinates::new(1.5, 2.5),
        country: Some("Kenya".into()),
        ..LocationLink::new("PANO_LEGACY_1")
    };

    let record = client.submit_hint(&draft, &location).await.expect("submit");
    assert_eq!(record.country, "Kenya");

    let requests = server.received_requests().await.expect("recorded");
    let put_locations = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT" && r.url.path() == LOCATIONS)
        .expect("locations written");
    let body: serde_json::Value = put_locations.body_json().expect("json body");
    let text = metahint_sync::decode_content(
        "data/locations.json",
        body["content"].as_str().expect("content"),
    )
    .expect("decode");
    let written: serde_json::Value = serde_json::from_str(&text).expect("document");
    assert_eq!(written["PANO_LEGACY_1"]["metas"], json!(["h0", record.id]));
    assert_eq!(written["PANO_LEGACY_1"]["country"], "Kenya");
}

#[tokio::test]
async fn link_conflict_after_hint_commit_reports_the_saved_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HINTS))
        .respond_with(contents("[]", "hints-v1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LOCATIONS))
        .respond_with(contents("{}", "locations-v1"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(HINTS))
        .respond_with(committed("hints-v2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(LOCATIONS))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let store = GithubContentsStore::new(config_for(&server), "secret").expect("store");
    let client = SyncClient::new(store, &config_for(&server));
    let draft = HintDraft {
        title: "Snorkel".into(),
        description: "Raised air intake on trucks".into(),
        ..HintDraft::default()
    };
    let err = client
        .submit_hint(&draft, &LocationLink::new("PANO_RACED_1"))
        .await
        .unwrap_err();
    assert!(!err.is_conflict(), "{err}");
    let hint_id = err.unlinked_hint().expect("committed hint id");

    let requests = server.received_requests().await.expect("recorded");
    let put_hints = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT" && r.url.path() == HINTS)
        .expect("hints written");
    let body: serde_json::Value = put_hints.body_json().expect("json body");
    let text = metahint_sync::decode_content(
        "data/metas.json",
        body["content"].as_str().expect("content"),
    )
    .expect("decode");
    assert!(text.contains(hint_id), "{text}");
}

#[tokio::test]
async fn feed_busts_cache_and_degrades_malformed_documents() {
    let server = MockServer::start().await;
    let has_stamp = |req: &Request| {
        req.url
            .query_pairs()
            .any(|(k, v)| k == "t" && v.parse::<u64>().is_ok())
    };
    Mock::given(method("GET"))
        .and(path("/tester/hints/main/data/metas.json"))
        .and(has_stamp)
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tester/hints/main/data/locations.json"))
        .and(has_stamp)
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"PANO_1":["h1"]}"#))
        .mount(&server)
        .await;

    let feed = DocumentFeed::new(config_for(&server)).expect("feed");
    let snapshot = feed.fetch().await.expect("fetch");
    assert!(snapshot.hints.is_empty());
    assert_eq!(snapshot.locations.len(), 1);
}

#[tokio::test]
async fn feed_reports_unreachable_remote() {
    // Bind then release a port so nothing is listening on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let config = RemoteConfig {
        raw_base: format!("http://127.0.0.1:{port}"),
        ..RemoteConfig::default()
    };
    let feed = DocumentFeed::new(config).expect("feed");
    let err = feed.fetch().await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_)), "{err}");
}

#[tokio::test]
async fn feed_reports_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let feed = DocumentFeed::new(config_for(&server)).expect("feed");
    let err = feed.fetch().await.unwrap_err();
    assert!(matches!(err, SyncError::Http { status: 503, .. }), "{err}");
}
