use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(deprecated)]
fn metahint(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("metahint").expect("binary");
    cmd.env("METAHINT_CONFIG_DIR", config_dir)
        .env_remove("METAHINT_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn setup_documents() -> TempDir {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("hints.json"),
        r#"[
            {"id": "h1", "title": "Snorkel", "scope": "countrywide", "country": "Kenya"},
            {"id": "bollard", "title": "Bollards", "scope": "100km", "country": "France",
             "lat": 0.0, "lng": 0.0}
        ]"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("locations.json"),
        r#"{
            "ID1_KENYA_PANO": {"metas": ["h1"], "lat": 10, "lng": 10, "country": "Kenya"},
            "ORIGIN_PANORAMA": {"metas": ["bollard"], "lat": 0, "lng": 0}
        }"#,
    )
    .unwrap();
    temp
}

fn data_args(dir: &Path) -> [String; 4] {
    [
        "--hints-file".into(),
        dir.join("hints.json").display().to_string(),
        "--locations-file".into(),
        dir.join("locations.json").display().to_string(),
    ]
}

#[test]
fn decode_prints_canonical_identifier() {
    let config = tempdir().unwrap();
    metahint(config.path())
        .args(["decode", "43416f534c4546474d5646706345316658324a71"])
        .assert()
        .success()
        .stdout("CAoSLEFGMVFpcE1fX2Jq\n");
}

#[test]
fn extract_reads_inline_game_payload() {
    let config = tempdir().unwrap();
    let payload = r#"{"round": 2, "rounds": [
        {"panoId": "FIRST_PANORAMA", "lat": 1.0, "lng": 2.0},
        {"panoId": "SECOND_PANORAMA", "lat": 3.0, "lng": 4.0}
    ]}"#;
    let body = run_json(metahint(config.path()).args([
        "extract",
        "--json",
        payload,
        "--url",
        "https://www.geoguessr.com/game/AbC123xyz",
    ]));
    assert_eq!(body["round"]["id"], "SECOND_PANORAMA");
    assert_eq!(body["page"]["competitive"], false);
    assert_eq!(body["page"]["api_path"], "/api/v3/games/AbC123xyz");
}

#[test]
fn extract_fails_without_identifier() {
    let config = tempdir().unwrap();
    metahint(config.path())
        .args(["extract", "--json", r#"{"rounds": []}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No location identifier"));
}

#[test]
fn show_predicts_countrywide_hint_from_local_documents() {
    let config = tempdir().unwrap();
    let docs = setup_documents();
    let body = run_json(
        metahint(config.path())
            .args(["show", "--id", "UNMAPPED_PANORAMA", "--lat", "50", "--lng", "50"])
            .args(["--country", "Kenya", "--json"])
            .args(data_args(docs.path())),
    );
    assert_eq!(body["location_id"], "UNMAPPED_PANORAMA");
    assert_eq!(body["exact"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["predicted"][0]["hint"]["id"], "h1");
    assert_eq!(body["predicted"][0]["reason"]["rule"], "country");
    assert_eq!(body["status"]["state"], "loaded");
}

#[test]
fn show_lists_exact_hints_in_text_mode() {
    let config = tempdir().unwrap();
    let docs = setup_documents();
    metahint(config.path())
        .args(["show", "--id", "ORIGIN_PANORAMA"])
        .args(data_args(docs.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Exact hints (1):"))
        .stdout(predicate::str::contains("[bollard] Bollards"));
}

#[test]
fn replay_discards_refinement_for_a_previous_location() {
    let config = tempdir().unwrap();
    let docs = setup_documents();
    let events = docs.path().join("events.jsonl");
    fs::write(
        &events,
        r#"# two locations, one slow geocoder answer
{"event":"location_id","id":"UNMAPPED_PANORAMA"}
{"event":"coordinates","lat":50.0,"lng":50.0}
{"event":"location_id","id":"ANOTHER_PANORAMA"}
{"event":"refine","country":"Kenya","issued_at":2}
{"event":"coordinates","lat":51.0,"lng":51.0}
{"event":"refine","country":"Kenya"}
"#,
    )
    .unwrap();

    let output = metahint(config.path())
        .args(["replay", "--json", "--events"])
        .arg(&events)
        .args(data_args(docs.path()))
        .output()
        .expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let steps: Vec<Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(steps.len(), 6);
    assert_eq!(steps[0]["result"]["outcome"], "adopted");
    assert_eq!(steps[3]["result"]["outcome"], "discarded");
    assert_eq!(steps[3]["view"]["predicted"].as_array().map(Vec::len), Some(0));
    assert_eq!(steps[5]["result"]["outcome"], "refined");
    assert_eq!(steps[5]["view"]["location_id"], "ANOTHER_PANORAMA");
    assert_eq!(steps[5]["view"]["predicted"][0]["hint"]["id"], "h1");
}

#[test]
fn add_without_token_prints_issue_url() {
    let config = tempdir().unwrap();
    let body = run_json(metahint(config.path()).args([
        "add",
        "--id",
        "UNMAPPED_PANORAMA",
        "--title",
        "Snorkel",
        "--description",
        "Black tape on the roof rack",
        "--tag",
        "car,Car",
        "--scope",
        "countrywide",
        "--country",
        "Kenya",
    ]));
    let url = body["issue_url"].as_str().expect("issue url");
    assert!(url.starts_with("https://github.com/"), "{url}");
    assert!(url.contains("/issues/new?title="), "{url}");
    assert!(url.contains("UNMAPPED_PANORAMA"), "{url}");
}

fn contents(text: &str, sha: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "content": metahint_sync::encode_content(text),
        "sha": sha,
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn add_points_at_link_when_hint_is_saved_but_unlinked() {
    let server = MockServer::start().await;
    let hints = "/repos/tester/hints/contents/data/metas.json";
    let locations = "/repos/tester/hints/contents/data/locations.json";
    Mock::given(method("GET"))
        .and(path(hints))
        .respond_with(contents("[]", "hints-v1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(locations))
        .respond_with(contents("{}", "locations-v1"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(hints))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "content": { "sha": "hints-v2" } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(locations))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let config = tempdir().unwrap();
    let uri = server.uri();
    metahint(config.path())
        .args(["--api-base", uri.as_str(), "--owner", "tester", "--repo", "hints"])
        .args(["add", "--id", "PANO_RACED_1", "--title", "Snorkel"])
        .args(["--description", "Raised air intake", "--token", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Do not add it again"))
        .stderr(predicate::str::contains(
            "metahint link --id PANO_RACED_1 --hint m",
        ));
}

#[test]
fn link_requires_token() {
    let config = tempdir().unwrap();
    metahint(config.path())
        .args(["link", "--id", "UNMAPPED_PANORAMA", "--hint", "h1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("write token is required"));
}

#[test]
fn scopes_disable_persists_and_reset_restores() {
    let config = tempdir().unwrap();
    let body = run_json(metahint(config.path()).args(["scopes", "--disable", "countrywide", "--json"]));
    let active: Vec<&str> = body["active_scopes"]
        .as_array()
        .expect("scopes")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(!active.contains(&"countrywide"));
    assert!(config.path().join("settings.json").exists());

    let docs = setup_documents();
    let view = run_json(
        metahint(config.path())
            .args(["show", "--id", "UNMAPPED_PANORAMA", "--country", "Kenya", "--json"])
            .args(["--lat", "50", "--lng", "50"])
            .args(data_args(docs.path())),
    );
    assert_eq!(view["predicted"].as_array().map(Vec::len), Some(0));

    metahint(config.path())
        .args(["scopes", "--reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] countrywide"));
}

#[test]
fn settings_token_is_saved_masked_and_cleared() {
    let config = tempdir().unwrap();
    metahint(config.path())
        .args(["settings", "--token", "ghp_abcdefghijklmnop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("token: set (ghp_...mnop)"));

    let body = run_json(metahint(config.path()).args(["settings", "--json"]));
    assert_eq!(body["token_configured"], true);
    let saved = fs::read_to_string(config.path().join("settings.json")).unwrap();
    assert!(saved.contains("ghp_abcdefghijklmnop"));

    let body = run_json(metahint(config.path()).args(["settings", "--clear-token", "--json"]));
    assert_eq!(body["token_configured"], false);
}
