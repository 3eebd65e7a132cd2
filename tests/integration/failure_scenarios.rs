//! Failure tests: the agent skips broken cycles and survives broken transports

use feedwatch::Agent;
use feedwatch::config::Config;
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_feed_error_skips_cycle() {
    let feed = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&feed)
        .await;

    let mut agent = Agent::from_config(&parse_config(create_test_config(&feed))).unwrap();

    let error = agent.cycle().await.unwrap_err();
    assert!(format!("{error:#}").contains("500"), "{error:#}");
    assert!(agent.hosts().is_none());
}

#[tokio::test]
async fn test_unreachable_feed_skips_cycle() {
    let config: Config = serde_json::from_value(serde_json::json!({
        "source": { "url": "http://127.0.0.1:9/status", "timeout": 1 }
    }))
    .unwrap();

    let mut agent = Agent::from_config(&config).unwrap();
    assert!(agent.cycle().await.is_err());
}

#[tokio::test]
async fn test_malformed_document_keeps_live_tree() {
    let feed = MockServer::start().await;
    let hooks = MockServer::start().await;
    accept_alerts(&hooks).await;

    let config = parse_config(with_webhook(create_test_config(&feed), &hooks));
    let mut agent = Agent::from_config(&config).unwrap();

    serve_status(&feed, &status_document(&[("A", 10, 0.5)])).await;
    agent.cycle().await.unwrap();

    serve_status(&feed, r#"<status><host name="A" age="900""#).await;
    assert!(agent.cycle().await.is_err());

    serve_status(&feed, r#"<status><host name="A" age="a while"/></status>"#).await;
    assert!(agent.cycle().await.is_err());

    let live = agent.hosts().unwrap();
    assert_eq!(live["A"].age(), 10);
    assert_eq!(live["A"].value(), 0.5);
    assert!(posted_alerts(&hooks).await.is_empty());
}

#[tokio::test]
async fn test_heartbeat_survives_feed_failure() {
    let feed = MockServer::start().await;
    let collector = MockServer::start().await;
    accept_xmlrpc(&collector).await;

    let config = parse_config(with_heartbeat(create_test_config(&feed), &collector));
    let mut agent = Agent::from_config(&config).unwrap();

    // nothing mounted on the feed, every poll gets a 404
    assert!(agent.cycle().await.is_err());

    let requests = collector.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_failing_transports_do_not_fail_the_cycle() {
    let feed = MockServer::start().await;
    let hooks = MockServer::start().await;
    let gateway = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&hooks)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<methodResponse><fault><value><string>no credit</string></value></fault></methodResponse>",
        ))
        .mount(&gateway)
        .await;

    let config = with_sms(with_webhook(create_test_config(&feed), &hooks), &gateway);
    let mut agent = Agent::from_config(&parse_config(config)).unwrap();

    serve_status(&feed, &status_document(&[("A", 0, 0.0)])).await;
    agent.cycle().await.unwrap();

    serve_status(&feed, &status_document(&[("A", 700, 0.0)])).await;
    agent.cycle().await.unwrap();

    // both routes were attempted
    assert_eq!(gateway.received_requests().await.unwrap().len(), 1);
    assert_eq!(hooks.received_requests().await.unwrap().len(), 1);
    assert_eq!(agent.hosts().unwrap()["A"].age(), 700);
}

#[tokio::test]
async fn test_unknown_template_kind_fails_config() {
    let result = serde_json::from_value::<Config>(serde_json::json!({
        "source": { "url": "http://feed/status" },
        "alerts": { "templates": { "DiskFull": "{subject}" } }
    }));

    assert!(result.is_err());
}
