//! End-to-end tests against a full agent over loopback TCP.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use vphone_agent::{Agent, AgentError, Config, MemoryStore, SubscriptionLedger};
use vphone_host::mock::MockHost;
use vphone_host::HostEvent;
use vphone_protocol::{MessageReceiver, MessageSender};
use vphone_types::envelope::Ping;
use vphone_types::{
    AppsResponse, IceCandidate, IntentAction, IntentKind, LocationEvent, LocationRequest,
    LocationSubscription, ProviderInfo, Request, Response, SensorSample, SignalingMessage,
    VideoParams,
};

struct TestAgent {
    addr: std::net::SocketAddr,
    mocks: Arc<MockHost>,
    events: mpsc::Sender<HostEvent>,
    shutdown: Arc<Notify>,
    task: JoinHandle<Result<(), AgentError>>,
}

async fn start_agent() -> TestAgent {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();

    let mocks = Arc::new(MockHost::new());
    let (event_tx, event_rx) = mpsc::channel(16);
    let ledger = Arc::new(SubscriptionLedger::new(Box::new(MemoryStore::default())));
    let agent = Agent::new(Config::default(), mocks.capabilities(), ledger, event_rx);
    let shutdown = agent.shutdown_handle();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(agent.run_on(listener));

    TestAgent {
        addr,
        mocks,
        events: event_tx,
        shutdown,
        task,
    }
}

struct Client {
    tx: MessageSender,
    rx: MessageReceiver,
}

impl Client {
    async fn connect(agent: &TestAgent) -> Self {
        let socket = TcpStream::connect(agent.addr).await.unwrap();
        let (tx, rx) = vphone_protocol::split(socket);
        let mut client = Self { tx, rx };
        // A ping roundtrip proves the session is installed.
        client.ping(0).await;
        client
    }

    async fn send(&mut self, request: &Request) {
        self.tx.send(request).await.unwrap();
    }

    async fn recv(&mut self) -> Option<Response> {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv::<Response>())
            .await
            .expect("timed out waiting for response")
            .unwrap()
    }

    async fn ping(&mut self, timestamp_ms: u64) {
        self.send(&Request::Ping(Ping { timestamp_ms })).await;
        match self.recv().await {
            Some(Response::Ping(ping)) => assert_eq!(ping.timestamp_ms, timestamp_ms),
            other => panic!("expected ping echo, got {other:?}"),
        }
    }
}

async fn eventually(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

fn subscription(interval: u64, distance: f32) -> LocationSubscription {
    LocationSubscription::new("gps", interval, distance)
}

fn candidate(n: u32) -> IceCandidate {
    IceCandidate {
        sdp_mid: "video".to_string(),
        sdp_mline_index: 0,
        candidate: format!("candidate:{n} 1 udp 2122260223 10.0.0.{n} 9 typ host"),
    }
}

#[tokio::test]
async fn screen_info_roundtrip() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    client.send(&Request::ScreenInfo).await;
    match client.recv().await {
        Some(Response::ScreenInfo(info)) => {
            assert_eq!(info.width, 1080);
            assert_eq!(info.height, 1920);
        }
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn new_client_displaces_the_old_one() {
    let agent = start_agent().await;
    let mut first = Client::connect(&agent).await;
    let mut second = Client::connect(&agent).await;

    // The first client's socket is closed by the agent.
    assert!(first.rx.recv::<Response>().await.unwrap().is_none());

    // The second client owns the session.
    second.ping(2).await;
}

#[tokio::test]
async fn sensor_samples_reach_the_host_in_order() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    let batch = |base: i64| -> Vec<SensorSample> {
        (base..base + 3)
            .map(|i| SensorSample {
                sensor_type: 1,
                accuracy: 3,
                timestamp_ns: i,
                values: vec![9.81],
            })
            .collect()
    };
    client.send(&Request::SensorBatch(batch(0))).await;
    client.send(&Request::SensorBatch(batch(3))).await;

    let relay = agent.mocks.sensors.clone();
    eventually("all samples to be relayed", || relay.samples().len() == 6).await;
    let stamps: Vec<i64> = relay.samples().iter().map(|s| s.timestamp_ns).collect();
    assert_eq!(stamps, vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn malformed_frame_ends_only_that_session() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    // Not a valid request envelope.
    client.tx.send(&vec![0xFFu8; 16]).await.unwrap();
    assert!(client.rx.recv::<Response>().await.unwrap().is_none());

    // The agent keeps accepting.
    let mut next = Client::connect(&agent).await;
    next.ping(3).await;
}

#[tokio::test]
async fn video_params_are_acknowledged_once() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    client
        .send(&Request::VideoParams(VideoParams::default()))
        .await;
    assert!(matches!(client.recv().await, Some(Response::VmReady)));

    // A repeat is ignored; the next reply is the ping echo, not VmReady.
    client
        .send(&Request::VideoParams(VideoParams::default()))
        .await;
    client.ping(4).await;
    assert_eq!(agent.mocks.media.sessions().len(), 1);
}

#[tokio::test]
async fn signaling_answers_and_flushes_queued_candidates() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    client
        .send(&Request::VideoParams(VideoParams::default()))
        .await;
    assert!(matches!(client.recv().await, Some(Response::VmReady)));

    // Candidates may legally arrive before the offer.
    client
        .send(&Request::Signaling(SignalingMessage::Candidate(candidate(1))))
        .await;
    client
        .send(&Request::Signaling(SignalingMessage::Candidate(candidate(2))))
        .await;
    client
        .send(&Request::Signaling(SignalingMessage::Offer {
            sdp: "v=0\r\ns=offer\r\n".to_string(),
        }))
        .await;

    match client.recv().await {
        Some(Response::Signaling(SignalingMessage::Answer { sdp })) => {
            assert!(sdp.contains("mock-answer"));
        }
        other => panic!("expected answer, got {other:?}"),
    }

    let media = agent.mocks.media.last_session().unwrap();
    assert_eq!(media.remote_candidates(), vec![candidate(1), candidate(2)]);

    // Local candidates trickle out to the client.
    media.emit_candidate(candidate(9)).await;
    assert_eq!(
        client.recv().await,
        Some(Response::Signaling(SignalingMessage::Candidate(candidate(9))))
    );
}

#[tokio::test]
async fn bye_closes_the_media_session_exactly_once() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    client
        .send(&Request::VideoParams(VideoParams::default()))
        .await;
    assert!(matches!(client.recv().await, Some(Response::VmReady)));

    client.send(&Request::Signaling(SignalingMessage::Bye)).await;
    let media = agent.mocks.media.last_session().unwrap();
    eventually("media close", || media.close_count() == 1).await;

    // Disconnecting afterwards must not close it again.
    drop(client);
    let mut next = Client::connect(&agent).await;
    next.ping(5).await;
    assert_eq!(media.close_count(), 1);
}

#[tokio::test]
async fn disconnect_tears_down_the_media_session() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    client
        .send(&Request::VideoParams(VideoParams::default()))
        .await;
    assert!(matches!(client.recv().await, Some(Response::VmReady)));
    let media = agent.mocks.media.last_session().unwrap();

    drop(client);
    eventually("media close on disconnect", || media.close_count() == 1).await;
}

#[tokio::test]
async fn host_intents_and_launcher_events_are_forwarded() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    let intent = IntentAction {
        kind: IntentKind::View,
        data: "https://example.com".to_string(),
    };
    agent
        .events
        .send(HostEvent::Intent(intent.clone()))
        .await
        .unwrap();
    assert_eq!(client.recv().await, Some(Response::Intent(intent)));

    agent.events.send(HostEvent::LauncherStarted).await.unwrap();
    assert_eq!(
        client.recv().await,
        Some(Response::Apps(AppsResponse::Exit))
    );
}

#[tokio::test]
async fn location_subscriptions_reconcile_across_the_session() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    agent
        .events
        .send(HostEvent::LocationSubscribe {
            subscription: subscription(1000, 0.0),
            single_shot: false,
        })
        .await
        .unwrap();
    assert_eq!(
        client.recv().await,
        Some(Response::Location(LocationEvent::Subscribe {
            subscription: subscription(1000, 0.0),
            single_shot: false,
        }))
    );

    // A lazier request is already covered; the client hears nothing. The
    // sentinel intent proves no subscribe snuck in between.
    agent
        .events
        .send(HostEvent::LocationSubscribe {
            subscription: subscription(5000, 10.0),
            single_shot: false,
        })
        .await
        .unwrap();
    let sentinel = IntentAction {
        kind: IntentKind::View,
        data: "sentinel".to_string(),
    };
    agent
        .events
        .send(HostEvent::Intent(sentinel.clone()))
        .await
        .unwrap();
    assert_eq!(client.recv().await, Some(Response::Intent(sentinel)));

    // Releasing the eager row reveals the lazy one.
    agent
        .events
        .send(HostEvent::LocationUnsubscribe {
            subscription: subscription(1000, 0.0),
        })
        .await
        .unwrap();
    assert_eq!(
        client.recv().await,
        Some(Response::Location(LocationEvent::Subscribe {
            subscription: subscription(5000, 10.0),
            single_shot: false,
        }))
    );

    // Releasing the last row unsubscribes the provider.
    agent
        .events
        .send(HostEvent::LocationUnsubscribe {
            subscription: subscription(5000, 10.0),
        })
        .await
        .unwrap();
    assert_eq!(
        client.recv().await,
        Some(Response::Location(LocationEvent::Unsubscribe {
            provider: "gps".to_string(),
        }))
    );
}

#[tokio::test]
async fn provider_registration_resends_the_active_subscription() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    agent
        .events
        .send(HostEvent::LocationSubscribe {
            subscription: subscription(2000, 5.0),
            single_shot: false,
        })
        .await
        .unwrap();
    assert!(matches!(
        client.recv().await,
        Some(Response::Location(LocationEvent::Subscribe { .. }))
    ));

    // The client re-registers the provider (e.g. after its own restart)
    // and must get the current subscription back.
    client
        .send(&Request::Location(LocationRequest::ProviderInfo(
            ProviderInfo {
                provider: "gps".to_string(),
                requires_network: false,
                requires_satellite: true,
                requires_cell: false,
                has_monetary_cost: false,
                supports_altitude: true,
                supports_speed: true,
                supports_bearing: true,
                power_requirement: 3,
                accuracy: 1,
            },
        )))
        .await;
    assert_eq!(
        client.recv().await,
        Some(Response::Location(LocationEvent::Subscribe {
            subscription: subscription(2000, 5.0),
            single_shot: false,
        }))
    );
}

#[tokio::test]
async fn shutdown_stops_the_agent_and_closes_the_client() {
    let agent = start_agent().await;
    let mut client = Client::connect(&agent).await;

    agent.shutdown.notify_one();
    assert!(client.rx.recv::<Response>().await.unwrap().is_none());
    tokio::time::timeout(Duration::from_secs(5), agent.task)
        .await
        .expect("agent did not stop")
        .unwrap()
        .unwrap();
}
