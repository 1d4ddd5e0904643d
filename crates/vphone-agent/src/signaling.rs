//! Media transport signaling.
//!
//! The agent is strictly the answerer. The client opens the transport by
//! sending video parameters, then an offer; the agent applies the offer,
//! sends back the answer and trickles local candidates as the engine
//! discovers them. Remote candidates that arrive before the offer is
//! answered are queued and applied in arrival order once negotiation
//! completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vphone_host::{HostError, MediaEngine, MediaSession};
use vphone_types::{IceCandidate, Response, SignalingMessage, VideoParams};

use crate::session::Outbound;

const CANDIDATE_CHANNEL_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalingState {
    /// Transport open, no offer seen yet.
    Idle,
    /// Offer received, answer not yet sent.
    Negotiating,
    /// Answer sent; candidates flow straight through.
    Connected,
    /// Torn down; everything is dropped.
    Terminated,
}

struct Inner {
    state: SignalingState,
    /// Remote candidates received before the answer was sent.
    pending: Vec<IceCandidate>,
}

/// One signaling exchange, bound to one client connection.
pub struct SignalingSession {
    media: Arc<dyn MediaSession>,
    outbound: Outbound,
    inner: Mutex<Inner>,
    torn_down: AtomicBool,
    forwarder: JoinHandle<()>,
}

impl SignalingSession {
    /// Open the media transport and start forwarding local candidates.
    pub async fn open(
        engine: &Arc<dyn MediaEngine>,
        params: &VideoParams,
        outbound: Outbound,
    ) -> Result<Arc<Self>, HostError> {
        let (candidate_tx, mut candidate_rx) = mpsc::channel(CANDIDATE_CHANNEL_DEPTH);
        let media = engine.open(params, candidate_tx).await?;

        let candidate_out = outbound.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(candidate) = candidate_rx.recv().await {
                candidate_out
                    .send(&Response::Signaling(SignalingMessage::Candidate(candidate)))
                    .await;
            }
        });

        Ok(Arc::new(Self {
            media,
            outbound,
            inner: Mutex::new(Inner {
                state: SignalingState::Idle,
                pending: Vec::new(),
            }),
            torn_down: AtomicBool::new(false),
            forwarder,
        }))
    }

    pub async fn handle(&self, message: SignalingMessage) {
        match message {
            SignalingMessage::Offer { sdp } => self.handle_offer(&sdp).await,
            SignalingMessage::Candidate(candidate) => self.handle_candidate(candidate).await,
            SignalingMessage::Answer { .. } => {
                warn!("ignoring remote answer; this end is always the answerer");
            }
            SignalingMessage::Bye => self.teardown().await,
        }
    }

    async fn handle_offer(&self, sdp: &str) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            SignalingState::Idle => {}
            SignalingState::Terminated => {
                debug!("dropping offer after teardown");
                return;
            }
            SignalingState::Negotiating | SignalingState::Connected => {
                warn!("ignoring renegotiation offer");
                return;
            }
        }

        inner.state = SignalingState::Negotiating;
        if let Err(e) = self.media.set_remote_offer(sdp).await {
            warn!(error = %e, "failed to apply remote offer");
            inner.state = SignalingState::Idle;
            return;
        }
        let answer = match self.media.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "failed to create answer");
                inner.state = SignalingState::Idle;
                return;
            }
        };

        self.outbound
            .send(&Response::Signaling(SignalingMessage::Answer {
                sdp: answer,
            }))
            .await;
        inner.state = SignalingState::Connected;

        // Flush under the lock so candidates arriving now cannot jump
        // ahead of the queued ones.
        let pending = std::mem::take(&mut inner.pending);
        for candidate in pending {
            if let Err(e) = self.media.add_remote_candidate(&candidate).await {
                warn!(error = %e, "failed to apply queued candidate");
            }
        }
    }

    async fn handle_candidate(&self, candidate: IceCandidate) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            SignalingState::Connected => {
                if let Err(e) = self.media.add_remote_candidate(&candidate).await {
                    warn!(error = %e, "failed to apply remote candidate");
                }
            }
            SignalingState::Terminated => {
                debug!("dropping candidate after teardown");
            }
            SignalingState::Idle | SignalingState::Negotiating => {
                inner.pending.push(candidate);
            }
        }
    }

    /// Close the media transport. Safe to call more than once; the
    /// engine's close runs exactly once.
    pub async fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut inner = self.inner.lock().await;
            inner.state = SignalingState::Terminated;
            inner.pending.clear();
        }
        self.media.close().await;
        self.forwarder.abort();
        debug!("media signaling torn down");
    }
}
