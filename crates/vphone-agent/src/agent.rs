//! Agent run loop.
//!
//! The agent accepts clients on one TCP port and keeps exactly one
//! session alive: a newer client displaces the current one, and the old
//! session is fully torn down before the new socket is installed. Host
//! adapter events and sensor relaying run here too, so they survive
//! client churn.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};
use vphone_host::{HostCapabilities, HostEvent};
use vphone_types::{AppsResponse, Response, SensorSample};

use crate::config::Config;
use crate::error::AgentError;
use crate::ledger::SubscriptionLedger;
use crate::session::{self, SessionHandle};

pub struct Agent {
    config: Config,
    host: HostCapabilities,
    ledger: Arc<SubscriptionLedger>,
    events: mpsc::Receiver<HostEvent>,
    shutdown: Arc<Notify>,
}

impl Agent {
    pub fn new(
        config: Config,
        host: HostCapabilities,
        ledger: Arc<SubscriptionLedger>,
        events: mpsc::Receiver<HostEvent>,
    ) -> Self {
        Self {
            config,
            host,
            ledger,
            events,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Handle for requesting a graceful stop from another task.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until shut down.
    pub async fn run(self) -> Result<(), AgentError> {
        let addr = format!("{}:{}", self.config.agent.bind, self.config.agent.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(%addr, "listening");
        self.run_on(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn run_on(self, listener: TcpListener) -> Result<(), AgentError> {
        let Agent {
            config,
            host,
            ledger,
            mut events,
            shutdown,
        } = self;

        // Fresh start: stale rows and test providers from a previous run
        // must not leak into this one.
        ledger.reset();
        if let Err(e) = host.location.reset().await {
            warn!(error = %e, "failed to reset test providers");
        }

        // A single worker drains the sensor queue, so samples reach the
        // host strictly in receipt order.
        let (sensor_tx, mut sensor_rx) = mpsc::channel::<SensorSample>(config.sensors.queue_depth);
        let relay = host.sensors.clone();
        let sensor_worker = tokio::spawn(async move {
            while let Some(sample) = sensor_rx.recv().await {
                if let Err(e) = relay.relay(&sample).await {
                    warn!(error = %e, "sensor relay failed");
                }
            }
        });

        let mut active: Option<SessionHandle> = None;
        let mut events_open = true;

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        info!(%peer, "client connected");
                        if let Some(previous) = active.take() {
                            info!("displacing previous session");
                            previous.terminate().await;
                        }
                        active = Some(session::spawn(
                            socket,
                            peer,
                            host.clone(),
                            ledger.clone(),
                            sensor_tx.clone(),
                        ));
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                event = events.recv(), if events_open => match event {
                    Some(event) => forward_host_event(&ledger, active.as_ref(), event).await,
                    None => {
                        debug!("host event channel closed");
                        events_open = false;
                    }
                },
                () = shutdown.notified() => {
                    info!("shutting down");
                    break;
                }
            }
        }

        if let Some(session) = active.take() {
            session.terminate().await;
        }
        drop(sensor_tx);
        let _ = sensor_worker.await;
        Ok(())
    }
}

/// Reconcile and forward one host adapter event.
///
/// Subscription events go through the ledger even when no client is
/// connected; the rows must reflect reality so the next session resumes
/// the right foremost subscription.
async fn forward_host_event(
    ledger: &SubscriptionLedger,
    active: Option<&SessionHandle>,
    event: HostEvent,
) {
    let response = match event {
        HostEvent::LocationSubscribe {
            subscription,
            single_shot,
        } => ledger.subscribe(subscription, single_shot).map(Response::Location),
        HostEvent::LocationUnsubscribe { subscription } => {
            ledger.unsubscribe(&subscription).map(Response::Location)
        }
        HostEvent::Intent(intent) => Some(Response::Intent(intent)),
        HostEvent::Notification(notification) => Some(Response::Notification(notification)),
        HostEvent::LauncherStarted => Some(Response::Apps(AppsResponse::Exit)),
    };

    let Some(response) = response else { return };
    match active {
        Some(session) => session.outbound().send(&response).await,
        None => debug!("dropping host event with no active session"),
    }
}
