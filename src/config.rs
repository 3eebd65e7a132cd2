use std::collections::BTreeMap;

use anyhow::Context;
use tracing::trace;

use crate::detector::Thresholds;
use crate::events::EventKind;

const ALERT_PREAMBLE: &str = "This is an alert from feedwatch, the status feed monitoring agent.\n";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub source: SourceConfig,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub alerts: AlertsConfig,

    /// Liveness report sent after every cycle (optional)
    pub heartbeat: Option<HeartbeatConfig>,

    /// Subscribe the alert handler to hosts, processes and properties that first show up
    /// after the initial snapshot
    #[serde(default)]
    pub resubscribe_adopted: bool,
}

/// Where the status document comes from
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SourceConfig {
    pub url: String,

    /// Seconds between two polls
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AlertsConfig {
    /// Message template per event kind. Kinds without a template are not alerted on.
    #[serde(default = "default_templates")]
    pub templates: BTreeMap<EventKind, String>,

    /// chrono format string used for `{timestamp}`
    #[serde(default = "default_date_format")]
    pub date_format: String,

    pub email: Option<EmailConfig>,
    pub sms: Option<SmsConfig>,
    pub webhook: Option<WebhookConfig>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            templates: default_templates(),
            date_format: default_date_format(),
            email: None,
            sms: None,
            webhook: None,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    pub from: String,

    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SmsConfig {
    /// XML-RPC endpoint of the SMS gateway
    pub url: String,

    pub from_msisdn: String,

    #[serde(default = "default_sms_method")]
    pub method: String,

    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookConfig {
    /// URLs every alert is posted to
    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct HeartbeatConfig {
    /// XML-RPC endpoint of the status collector
    pub url: String,

    #[serde(default = "default_heartbeat_method")]
    pub method: String,

    #[serde(default = "default_service")]
    pub service: String,

    #[serde(default = "default_status")]
    pub status: String,
}

fn default_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    30
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_templates() -> BTreeMap<EventKind, String> {
    BTreeMap::from([
        (
            EventKind::ProcessStopped,
            format!("{ALERT_PREAMBLE}{{subject}} was reported stopped at {{timestamp}}"),
        ),
        (
            EventKind::ProcessTimeout,
            format!("{ALERT_PREAMBLE}{{subject}} was reported timed out at {{timestamp}}"),
        ),
        (
            EventKind::HostTimeout,
            format!("{ALERT_PREAMBLE}{{subject}} was reported timed out at {{timestamp}}"),
        ),
    ])
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_sms_method() -> String {
    "neit.sendSMS".to_string()
}

fn default_heartbeat_method() -> String {
    "logStatus".to_string()
}

fn default_service() -> String {
    "feedwatch".to_string()
}

fn default_status() -> String {
    "running".to_string()
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&file_content)
        .with_context(|| format!("invalid configuration file {path}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
