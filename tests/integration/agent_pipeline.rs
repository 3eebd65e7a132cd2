//! End-to-end tests: feed → agent → alert transports

use feedwatch::{Agent, AgentHandle};
use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::MockServer;

use crate::helpers::*;

#[tokio::test]
async fn test_host_timeout_raises_one_alert() {
    let feed = MockServer::start().await;
    let hooks = MockServer::start().await;
    accept_alerts(&hooks).await;

    let config = parse_config(with_webhook(create_test_config(&feed), &hooks));
    let mut agent = Agent::from_config(&config).unwrap();

    serve_status(&feed, &status_document(&[("A", 0, 1.0)])).await;
    let first = agent.cycle().await.unwrap();
    assert!(first.initial);
    assert!(posted_alerts(&hooks).await.is_empty());

    serve_status(&feed, &status_document(&[("A", 650, 1.0)])).await;
    agent.cycle().await.unwrap();

    let alerts = posted_alerts(&hooks).await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["kind"], "HostTimeout");
    assert_eq!(alerts[0]["subject"], "Host A");

    let message = alerts[0]["message"].as_str().unwrap();
    assert!(message.contains("Host A was reported timed out at"), "{message}");

    // same age again, nothing new
    agent.cycle().await.unwrap();
    assert_eq!(posted_alerts(&hooks).await.len(), 1);
}

#[tokio::test]
async fn test_stopped_process_is_sent_as_sms() {
    let feed = MockServer::start().await;
    let gateway = MockServer::start().await;
    accept_xmlrpc(&gateway).await;

    let config = parse_config(with_sms(create_test_config(&feed), &gateway));
    let mut agent = Agent::from_config(&config).unwrap();

    serve_status(
        &feed,
        r#"<status><host name="A"><process name="httpd" value="running"/></host></status>"#,
    )
    .await;
    agent.cycle().await.unwrap();

    serve_status(
        &feed,
        r#"<status><host name="A"><process name="httpd" value="crashed"/></host></status>"#,
    )
    .await;
    agent.cycle().await.unwrap();

    let requests = gateway.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("<methodName>neit.sendSMS</methodName>"), "{body}");
    assert!(body.contains("<string>0815</string>"), "{body}");
    assert!(
        body.contains("Process A.httpd was reported stopped at"),
        "{body}"
    );
}

#[tokio::test]
async fn test_kind_without_template_is_not_delivered() {
    let feed = MockServer::start().await;
    let hooks = MockServer::start().await;
    accept_alerts(&hooks).await;

    let config = parse_config(with_webhook(create_test_config(&feed), &hooks));
    let mut agent = Agent::from_config(&config).unwrap();

    serve_status(&feed, &status_document(&[("A", 0, 1.0)])).await;
    agent.cycle().await.unwrap();

    serve_status(&feed, &status_document(&[("A", 0, 9.0)])).await;
    agent.cycle().await.unwrap();

    assert!(posted_alerts(&hooks).await.is_empty());
}

#[tokio::test]
async fn test_heartbeat_is_sent_every_cycle() {
    let feed = MockServer::start().await;
    let collector = MockServer::start().await;
    accept_xmlrpc(&collector).await;

    let config = parse_config(with_heartbeat(create_test_config(&feed), &collector));
    let mut agent = Agent::from_config(&config).unwrap();

    serve_status(&feed, &status_document(&[("A", 0, 0.0)])).await;
    agent.cycle().await.unwrap();
    agent.cycle().await.unwrap();

    let requests = collector.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("<methodName>logStatus</methodName>"), "{body}");
    assert!(body.contains("<string>feedwatch</string>"), "{body}");
}

#[tokio::test]
async fn test_new_host_is_only_alerted_when_resubscribed() {
    for (resubscribe, expected) in [(false, 0), (true, 1)] {
        let feed = MockServer::start().await;
        let hooks = MockServer::start().await;
        accept_alerts(&hooks).await;

        let mut config = with_webhook(create_test_config(&feed), &hooks);
        config["resubscribe_adopted"] = serde_json::json!(resubscribe);
        let mut agent = Agent::from_config(&parse_config(config)).unwrap();

        serve_status(&feed, &status_document(&[("A", 0, 0.0)])).await;
        agent.cycle().await.unwrap();

        serve_status(&feed, &status_document(&[("A", 0, 0.0), ("B", 0, 0.0)])).await;
        let report = agent.cycle().await.unwrap();
        assert_eq!(report.adopted.len(), 1);

        serve_status(&feed, &status_document(&[("A", 0, 0.0), ("B", 900, 0.0)])).await;
        agent.cycle().await.unwrap();

        assert_eq!(posted_alerts(&hooks).await.len(), expected, "resubscribe={resubscribe}");
    }
}

#[tokio::test]
async fn test_handle_exposes_live_tree() {
    let feed = MockServer::start().await;
    serve_status(
        &feed,
        r#"<status><host name="A" age="4"><property name="os" value="linux"/></host></status>"#,
    )
    .await;

    let config = parse_config(create_test_config(&feed));
    let handle = AgentHandle::spawn(
        Agent::from_config(&config).unwrap(),
        Duration::from_secs(3600),
    );

    handle.poll_now().await.unwrap();

    let hosts = handle.hosts().await.unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].age, 4);
    assert_eq!(hosts[0].properties["os"], Some("linux".to_string()));
    assert!(hosts[0].observers > 0);

    handle.shutdown().await.unwrap();
}
