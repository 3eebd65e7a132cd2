//! The monitoring agent and its actor
//!
//! The [`Agent`] owns the live tree and everything needed to refresh it. One cycle is:
//!
//! ```text
//! fetch → decode → adopt (first snapshot) or merge (later ones) → heartbeat
//!                          ↓
//!            threshold detector → EventHandler → alert routes
//! ```
//!
//! [`AgentHandle::spawn`] runs the agent as an actor: a timer drives the cycles and an mpsc
//! channel carries commands (poll now, inspect, shutdown). The actor handles one tick or
//! command at a time, so cycles never interleave.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::alerts::{EventHandler, routes_from_config};
use crate::config::Config;
use crate::entities::{HostMap, HostSummary};
use crate::heartbeat::{Heartbeat, XmlRpcHeartbeat};
use crate::notify::Observer;
use crate::reconcile::{Adopted, Reconciler};
use crate::snapshot::{HttpSnapshotSource, SnapshotDecoder, SnapshotSource, XmlDecoder};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Outcome of a successful cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The snapshot became the live tree instead of being merged into it
    pub initial: bool,

    /// Hosts in the live tree after the cycle
    pub hosts: usize,

    /// Live hosts updated in place
    pub updated_hosts: usize,

    /// Entities that showed up in this snapshot for the first time
    pub adopted: Vec<Adopted>,
}

pub struct Agent {
    source: Arc<dyn SnapshotSource>,
    decoder: Arc<dyn SnapshotDecoder>,
    reconciler: Reconciler,
    handler: Arc<dyn Observer>,
    heartbeat: Option<Arc<dyn Heartbeat>>,
    resubscribe_adopted: bool,

    /// The live tree, `None` until the first snapshot was decoded
    hosts: Option<HostMap>,
}

impl Agent {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        decoder: Arc<dyn SnapshotDecoder>,
        reconciler: Reconciler,
        handler: Arc<dyn Observer>,
    ) -> Self {
        Self {
            source,
            decoder,
            reconciler,
            handler,
            heartbeat: None,
            resubscribe_adopted: false,
            hosts: None,
        }
    }

    /// Wire up the HTTP feed, the XML decoder, the configured alert routes and the
    /// optional heartbeat
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.source.timeout);

        let routes = routes_from_config(&config.alerts, timeout)?;
        debug!("alert routes: {routes:?}");
        let handler = EventHandler::from_config(&config.alerts, routes);

        let mut agent = Agent::new(
            Arc::new(HttpSnapshotSource::new(&config.source)?),
            Arc::new(XmlDecoder::new()),
            Reconciler::new(config.thresholds),
            Arc::new(handler),
        )
        .resubscribe_adopted(config.resubscribe_adopted);

        if let Some(heartbeat) = &config.heartbeat {
            agent = agent.with_heartbeat(Arc::new(XmlRpcHeartbeat::new(heartbeat, timeout)?));
        }

        Ok(agent)
    }

    pub fn with_heartbeat(mut self, heartbeat: Arc<dyn Heartbeat>) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    /// Subscribe the handler to entities adopted after the first snapshot
    pub fn resubscribe_adopted(mut self, enabled: bool) -> Self {
        self.resubscribe_adopted = enabled;
        self
    }

    /// The live tree, empty until the first successful cycle
    pub fn hosts(&self) -> Option<&HostMap> {
        self.hosts.as_ref()
    }

    pub fn summaries(&self) -> Vec<HostSummary> {
        self.hosts
            .iter()
            .flat_map(|hosts| hosts.values())
            .map(|host| host.summary())
            .collect()
    }

    /// Run one full cycle. The heartbeat is sent even when the poll fails.
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub async fn cycle(&mut self) -> Result<CycleReport> {
        let result = self.poll().await;

        if let Some(heartbeat) = &self.heartbeat {
            if let Err(e) = heartbeat.report().await {
                warn!("heartbeat failed: {e:#}");
            }
        }

        self.dump();
        result
    }

    async fn poll(&mut self) -> Result<CycleReport> {
        let raw = self
            .source
            .fetch()
            .await
            .context("failed to fetch status document")?;
        trace!("fetched {} bytes", raw.len());

        let fresh = self
            .decoder
            .decode(&raw)
            .context("failed to decode status document")?;

        let live = match self.hosts.as_mut() {
            Some(live) => live,
            None => return Ok(self.adopt(fresh)),
        };

        let report = self
            .reconciler
            .merge(live, fresh)
            .await
            .context("failed to merge status document")?;

        for adopted in &report.adopted {
            if self.resubscribe_adopted {
                debug!("subscribing to adopted {adopted}");
                adopted.subscribe(live, self.handler.clone());
            } else {
                debug!("adopted {adopted} without observers");
            }
        }

        Ok(CycleReport {
            initial: false,
            hosts: live.len(),
            updated_hosts: report.updated_hosts,
            adopted: report.adopted,
        })
    }

    fn adopt(&mut self, mut fresh: HostMap) -> CycleReport {
        for host in fresh.values_mut() {
            host.subscribe_recursive(self.handler.clone());
        }

        info!("monitoring {} hosts", fresh.len());
        let hosts = fresh.len();
        self.hosts = Some(fresh);

        CycleReport {
            initial: true,
            hosts,
            ..CycleReport::default()
        }
    }

    fn dump(&self) {
        match serde_json::to_string_pretty(&self.summaries()) {
            Ok(dump) => debug!("live tree: {dump}"),
            Err(e) => warn!("failed to dump live tree: {e}"),
        }
    }
}

#[derive(Debug)]
pub enum AgentCommand {
    /// Run a cycle right away, bypassing the timer
    PollNow {
        respond_to: oneshot::Sender<Result<CycleReport>>,
    },

    /// Snapshot of the live tree
    Hosts {
        respond_to: oneshot::Sender<Vec<HostSummary>>,
    },

    Shutdown,
}

struct AgentActor {
    agent: Agent,
    command_rx: mpsc::Receiver<AgentCommand>,
    interval_duration: Duration,
}

impl AgentActor {
    async fn run(mut self) {
        debug!("starting agent actor");

        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.agent.cycle().await {
                        error!("cycle failed: {e:#}");
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(AgentCommand::PollNow { respond_to }) => {
                            debug!("received PollNow command");
                            let result = self.agent.cycle().await;
                            let _ = respond_to.send(result);
                        }

                        Some(AgentCommand::Hosts { respond_to }) => {
                            let _ = respond_to.send(self.agent.summaries());
                        }

                        Some(AgentCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        // every handle is gone
                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("agent actor stopped");
    }
}

/// Handle for controlling a running agent
#[derive(Clone)]
pub struct AgentHandle {
    sender: mpsc::Sender<AgentCommand>,
}

impl AgentHandle {
    /// Spawn the agent as a tokio task. The first cycle runs immediately.
    ///
    /// The interval is at least one millisecond. The actor stops on
    /// [`shutdown`](Self::shutdown) or once every handle has been dropped.
    pub fn spawn(agent: Agent, interval_duration: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let interval_duration = interval_duration.max(MIN_INTERVAL);

        let actor = AgentActor {
            agent,
            command_rx: cmd_rx,
            interval_duration,
        };

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    pub async fn poll_now(&self) -> Result<CycleReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(AgentCommand::PollNow { respond_to: tx })
            .await
            .context("failed to send PollNow command")?;

        rx.await.context("failed to receive response")?
    }

    pub async fn hosts(&self) -> Result<Vec<HostSummary>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(AgentCommand::Hosts { respond_to: tx })
            .await
            .context("failed to send Hosts command")?;

        rx.await.context("failed to receive response")
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(AgentCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
