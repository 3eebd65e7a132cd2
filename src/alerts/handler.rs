use std::collections::BTreeMap;
use std::fmt::Write;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, error, info, instrument, trace};

use super::{Alert, AlertRoute};
use crate::config::AlertsConfig;
use crate::entities::Subject;
use crate::events::{Event, EventKind};
use crate::notify::Observer;

/// Observer that renders events into alerts and delivers them
#[derive(Debug)]
pub struct EventHandler {
    templates: BTreeMap<EventKind, String>,
    date_format: String,
    routes: Vec<AlertRoute>,
}

impl EventHandler {
    pub fn new(
        templates: BTreeMap<EventKind, String>,
        date_format: impl Into<String>,
        routes: Vec<AlertRoute>,
    ) -> Self {
        Self {
            templates,
            date_format: date_format.into(),
            routes,
        }
    }

    pub fn from_config(config: &AlertsConfig, routes: Vec<AlertRoute>) -> Self {
        Self::new(config.templates.clone(), config.date_format.clone(), routes)
    }

    /// Render the alert for `event`, `None` if its kind has no template
    pub fn render(&self, event: &Event) -> Option<Alert> {
        let template = self.templates.get(&event.kind())?;

        let timestamp = self.timestamp(event.timestamp());
        let text = fill(template, event.subject(), &timestamp);

        Some(Alert {
            kind: event.kind(),
            subject: event.subject().to_string(),
            text,
        })
    }

    /// `at` in local time, RFC 3339 if the configured format is invalid
    fn timestamp(&self, at: DateTime<Utc>) -> String {
        let local = at.with_timezone(&Local);
        let mut formatted = String::new();
        if write!(formatted, "{}", local.format(&self.date_format)).is_err() {
            return local.to_rfc3339();
        }
        formatted
    }

    async fn deliver(&self, alert: &Alert) {
        for route in &self.routes {
            for recipient in &route.recipients {
                match route.sink.send(recipient, alert).await {
                    Ok(()) => info!("sent {} alert to {recipient}", route.channel),
                    Err(e) => error!("{} alert to {recipient} failed: {e:#}", route.channel),
                }
            }
        }
    }
}

/// Substitute `{subject}` and `{timestamp}` in one pass, so placeholders inside the
/// substituted values stay as they are
fn fill(template: &str, subject: &str, timestamp: &str) -> String {
    let mut filled = String::with_capacity(template.len() + subject.len() + timestamp.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        filled.push_str(&rest[..start]);
        let tail = &rest[start..];

        if let Some(after) = tail.strip_prefix("{subject}") {
            filled.push_str(subject);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{timestamp}") {
            filled.push_str(timestamp);
            rest = after;
        } else {
            filled.push('{');
            rest = &tail[1..];
        }
    }

    filled.push_str(rest);
    filled
}

#[async_trait]
impl Observer for EventHandler {
    #[instrument(skip_all, fields(subject = %subject))]
    async fn on_event(&self, subject: Subject<'_>, event: Option<&Event>) {
        let Some(event) = event else {
            trace!("{subject} changed to {:?}", subject.current_value());
            return;
        };

        info!("{event}");

        let Some(alert) = self.render(event) else {
            debug!("no template for {}, not alerting", event.kind());
            return;
        };

        self.deliver(&alert).await;
    }
}
