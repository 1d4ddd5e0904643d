//! One client session.
//!
//! A session owns the socket for exactly one client. The loop reads
//! requests, dispatches by envelope variant and writes responses through
//! a shared [`Outbound`] handle, which host-event forwarding and the
//! signaling candidate forwarder also use. Handler failures are logged
//! and never kill the session; only socket errors, client disconnect or
//! displacement by a newer client end it.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vphone_host::HostCapabilities;
use vphone_protocol::{MessageReceiver, MessageSender};
use vphone_types::{
    valid_provider, AppsRequest, ConfigUpdate, IntentAction, IntentKind, KeyEvent, LocationEvent,
    LocationRequest, Request, Response, SensorSample, SignalingMessage, TouchEvent, VideoParams,
};

use crate::apps::diff_installed;
use crate::ledger::SubscriptionLedger;
use crate::signaling::SignalingSession;

/// Shared, cloneable writer for the session socket.
///
/// Write failures are logged and swallowed; the session loop notices the
/// dead socket on its next read and tears down.
#[derive(Clone)]
pub struct Outbound {
    writer: Arc<Mutex<MessageSender>>,
}

impl Outbound {
    pub fn new(sender: MessageSender) -> Self {
        Self {
            writer: Arc::new(Mutex::new(sender)),
        }
    }

    pub async fn send(&self, response: &Response) {
        if let Err(e) = self.writer.lock().await.send(response).await {
            warn!(error = %e, "failed to send response");
        }
    }

    pub async fn close(&self) {
        if let Err(e) = self.writer.lock().await.shutdown().await {
            debug!(error = %e, "socket already closed");
        }
    }
}

/// Owner-side handle to a running session.
pub struct SessionHandle {
    outbound: Outbound,
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the session and wait for its teardown to complete.
    pub async fn terminate(self) {
        // notify_one stores a permit, so the loop sees the signal even
        // if it is not parked in select yet.
        self.cancel.notify_one();
        let _ = self.task.await;
    }
}

/// Start the read loop for a freshly accepted client.
pub fn spawn(
    socket: TcpStream,
    peer: SocketAddr,
    host: HostCapabilities,
    ledger: Arc<SubscriptionLedger>,
    sensor_tx: mpsc::Sender<SensorSample>,
) -> SessionHandle {
    let (sender, receiver) = vphone_protocol::split(socket);
    let outbound = Outbound::new(sender);
    let cancel = Arc::new(Notify::new());

    let session = Session {
        outbound: outbound.clone(),
        host,
        ledger,
        sensor_tx,
        signaling: None,
        peer,
    };
    let task = tokio::spawn(run(session, receiver, cancel.clone()));

    SessionHandle {
        outbound,
        cancel,
        task,
    }
}

async fn run(mut session: Session, mut receiver: MessageReceiver, cancel: Arc<Notify>) {
    info!(peer = %session.peer, "session started");
    loop {
        tokio::select! {
            () = cancel.notified() => {
                info!(peer = %session.peer, "session displaced");
                break;
            }
            frame = receiver.recv::<Request>() => match frame {
                Ok(Some(request)) => session.dispatch(request).await,
                Ok(None) => {
                    info!(peer = %session.peer, "client disconnected");
                    break;
                }
                Err(e) => {
                    warn!(peer = %session.peer, error = %e, "closing session after protocol error");
                    break;
                }
            },
        }
    }
    session.teardown().await;
}

struct Session {
    outbound: Outbound,
    host: HostCapabilities,
    ledger: Arc<SubscriptionLedger>,
    sensor_tx: mpsc::Sender<SensorSample>,
    signaling: Option<Arc<SignalingSession>>,
    peer: SocketAddr,
}

impl Session {
    async fn dispatch(&mut self, request: Request) {
        match request {
            Request::ScreenInfo => self.handle_screen_info().await,
            Request::Touch(event) => self.handle_touch(event).await,
            Request::Key(event) => self.handle_key(event).await,
            Request::SensorBatch(samples) => self.handle_sensors(samples).await,
            Request::Intent(intent) => self.handle_intent(intent).await,
            Request::Location(request) => self.handle_location(request).await,
            Request::VideoParams(params) => self.handle_video_params(params).await,
            Request::Signaling(message) => self.handle_signaling(message).await,
            Request::Rotation { rotation } => self.handle_rotation(rotation).await,
            Request::Ping(ping) => self.outbound.send(&Response::Ping(ping)).await,
            Request::Timezone { id } => self.handle_timezone(&id).await,
            Request::Apps(request) => self.handle_apps(request).await,
            Request::Config(update) => self.handle_config(update).await,
        }
    }

    async fn handle_screen_info(&self) {
        match self.host.display.info().await {
            Ok(info) => self.outbound.send(&Response::ScreenInfo(info)).await,
            // No reply at all; the client retries rather than act on
            // made-up geometry.
            Err(e) => warn!(error = %e, "display query failed"),
        }
    }

    async fn handle_touch(&self, event: TouchEvent) {
        if let Err(e) = self.host.input.inject_touch(&event).await {
            warn!(error = %e, "touch injection failed");
        }
    }

    async fn handle_key(&self, event: KeyEvent) {
        if let Err(e) = self.host.input.inject_key(&event).await {
            warn!(error = %e, "key injection failed");
        }
    }

    /// Queue the batch for the single relay worker, preserving order.
    async fn handle_sensors(&self, samples: Vec<SensorSample>) {
        for sample in samples {
            if self.sensor_tx.send(sample).await.is_err() {
                warn!("sensor worker gone, dropping batch remainder");
                break;
            }
        }
    }

    async fn handle_intent(&self, intent: IntentAction) {
        match intent.kind {
            IntentKind::View => {
                if let Err(e) = self.host.apps.open_url(&intent.data).await {
                    warn!(error = %e, "view intent failed");
                }
            }
            IntentKind::Dial => {
                debug!(data = %intent.data, "ignoring unsupported dial intent");
            }
        }
    }

    async fn handle_location(&self, request: LocationRequest) {
        match request {
            LocationRequest::ProviderInfo(info) => {
                if !valid_provider(&info.provider) {
                    debug!(provider = %info.provider, "ignoring invalid provider registration");
                    return;
                }
                if let Err(e) = self.host.location.add_test_provider(&info).await {
                    warn!(provider = %info.provider, error = %e, "provider registration failed");
                    return;
                }
                // The provider was just (re)created; restore the active
                // subscription so updates keep flowing.
                if let Some(subscription) = self.ledger.foremost(&info.provider) {
                    self.outbound
                        .send(&Response::Location(LocationEvent::Subscribe {
                            subscription,
                            single_shot: false,
                        }))
                        .await;
                }
            }
            LocationRequest::ProviderStatus(status) => {
                if !valid_provider(&status.provider) {
                    return;
                }
                if let Err(e) = self.host.location.set_status(&status).await {
                    warn!(provider = %status.provider, error = %e, "status update failed");
                }
            }
            LocationRequest::ProviderEnabled(enabled) => {
                if !valid_provider(&enabled.provider) {
                    return;
                }
                if let Err(e) = self.host.location.set_enabled(&enabled).await {
                    warn!(provider = %enabled.provider, error = %e, "enabled update failed");
                }
            }
            LocationRequest::Update(update) => {
                if !valid_provider(&update.provider) {
                    return;
                }
                if let Err(e) = self.host.location.push_location(&update).await {
                    warn!(provider = %update.provider, error = %e, "location push failed");
                }
            }
        }
    }

    async fn handle_video_params(&mut self, params: VideoParams) {
        if self.signaling.is_some() {
            debug!("ignoring repeated video parameters");
            return;
        }
        match SignalingSession::open(&self.host.media, &params, self.outbound.clone()).await {
            Ok(signaling) => {
                self.signaling = Some(signaling);
                // Readiness is only acknowledged once the transport exists.
                self.outbound.send(&Response::VmReady).await;
            }
            Err(e) => warn!(error = %e, "failed to open media transport"),
        }
    }

    async fn handle_signaling(&self, message: SignalingMessage) {
        match &self.signaling {
            Some(signaling) => signaling.handle(message).await,
            None => debug!("dropping signaling before video parameters"),
        }
    }

    async fn handle_rotation(&self, rotation: i32) {
        if let Err(e) = self.host.display.announce_rotation(rotation).await {
            warn!(rotation, error = %e, "rotation broadcast failed");
        }
    }

    async fn handle_timezone(&self, id: &str) {
        if let Err(e) = self.host.system.set_timezone(id).await {
            warn!(timezone = id, error = %e, "timezone change failed");
        }
    }

    async fn handle_apps(&self, request: AppsRequest) {
        match request {
            AppsRequest::Refresh {
                current,
                screen_density,
            } => match self.host.apps.installed(screen_density).await {
                Ok(installed) => {
                    let diff = diff_installed(installed, &current);
                    self.outbound.send(&Response::Apps(diff)).await;
                }
                Err(e) => warn!(error = %e, "app enumeration failed"),
            },
            AppsRequest::Launch { package } => {
                if let Err(e) = self.host.apps.launch(&package).await {
                    warn!(package = %package, error = %e, "app launch failed");
                }
            }
            AppsRequest::Home => {
                if let Err(e) = self.host.apps.show_home().await {
                    warn!(error = %e, "home navigation failed");
                }
            }
        }
    }

    async fn handle_config(&self, update: ConfigUpdate) {
        if let Some(attached) = update.hard_keyboard {
            if let Err(e) = self.host.system.set_hard_keyboard(attached).await {
                warn!(attached, error = %e, "keyboard config failed");
            }
        }
    }

    async fn teardown(&mut self) {
        if let Some(signaling) = self.signaling.take() {
            signaling.teardown().await;
        }
        self.outbound.close().await;
        info!(peer = %self.peer, "session closed");
    }
}
