//! Helper functions for integration tests

use feedwatch::config::Config;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const XMLRPC_OK: &str =
    "<?xml version=\"1.0\"?><methodResponse><params><param><value><boolean>1</boolean>\
     </value></param></params></methodResponse>";

/// Config polling `feed` with default thresholds and no alert channels
pub fn create_test_config(feed: &MockServer) -> Value {
    serde_json::json!({
        "source": { "url": format!("{}/status", feed.uri()), "timeout": 5 }
    })
}

pub fn with_webhook(mut config: Value, hooks: &MockServer) -> Value {
    config["alerts"]["webhook"] = serde_json::json!({
        "recipients": [format!("{}/alert", hooks.uri())]
    });
    config
}

pub fn with_sms(mut config: Value, gateway: &MockServer) -> Value {
    config["alerts"]["sms"] = serde_json::json!({
        "url": format!("{}/RPC2", gateway.uri()),
        "from_msisdn": "4711",
        "recipients": ["0815"]
    });
    config
}

pub fn with_heartbeat(mut config: Value, collector: &MockServer) -> Value {
    config["heartbeat"] = serde_json::json!({ "url": format!("{}/RPC2", collector.uri()) });
    config
}

pub fn parse_config(config: Value) -> Config {
    serde_json::from_value(config).unwrap()
}

/// Replace whatever the feed serves with `document`
pub async fn serve_status(feed: &MockServer, document: &str) {
    feed.reset().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(document))
        .mount(feed)
        .await;
}

pub async fn accept_alerts(hooks: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/alert"))
        .respond_with(ResponseTemplate::new(204))
        .mount(hooks)
        .await;
}

pub async fn accept_xmlrpc(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/RPC2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(XMLRPC_OK))
        .mount(server)
        .await;
}

/// JSON bodies of all alerts posted to `hooks`
pub async fn posted_alerts(hooks: &MockServer) -> Vec<Value> {
    hooks
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

/// A status document with one attribute-only host element per `(name, age, value)`
pub fn status_document(hosts: &[(&str, u64, f64)]) -> String {
    let hosts = hosts
        .iter()
        .map(|(name, age, value)| format!(r#"<host name="{name}" age="{age}" value="{value}"/>"#))
        .collect::<String>();
    format!("<status>{hosts}</status>")
}
