//! Connection manager
//!
//! One background task owns the broker connection. It connects eagerly,
//! retries forever on a fixed delay, replays every registered subscription
//! after each (re)connect and routes MESSAGE frames to subscribers. The
//! public handle only touches the shared registry and a command channel,
//! so `subscribe` and `release` never wait on the network.

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::frame::{Command, Frame};
use crate::heartbeat::{HeartBeat, Negotiated};
use crate::subscription::{Delivery, Registry, Subscription, Topic, parse_wire_id, wire_id};

type BrokerSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Stand-in deadline for disabled timers
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365);

/// Upper bound on the close handshake during shutdown
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Requests from handles to the connection task
#[derive(Debug)]
pub(crate) enum ConnCmd {
    Subscribe(u64),
    Unsubscribe(u64),
    Shutdown,
}

/// Shared handle to the single broker connection
///
/// Cheap to clone. The connection stays up until [`shutdown`](Self::shutdown)
/// is called or the last handle is dropped.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: StreamConfig,
    registry: Arc<Registry>,
    cmd_tx: mpsc::UnboundedSender<ConnCmd>,
    state_rx: watch::Receiver<ConnectionState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.registry.close();
        let _ = self.cmd_tx.send(ConnCmd::Shutdown);
    }
}

impl ConnectionManager {
    /// Validates the configuration and starts connecting in the background
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: StreamConfig) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(Registry::default());
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let task = tokio::spawn(connection_task(
            config.clone(),
            registry.clone(),
            cmd_rx,
            state_tx,
        ));

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                registry,
                cmd_tx,
                state_rx,
                task: Mutex::new(Some(task)),
            }),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.inner.config
    }

    /// Subscribes to a topic
    ///
    /// Returns immediately; the SUBSCRIBE frame goes out as soon as the
    /// connection is up. After shutdown the returned handle is already at
    /// end-of-stream.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let inner = &self.inner;

        match inner.registry.register(topic.clone()) {
            Some((id, rx)) => {
                let _ = inner.cmd_tx.send(ConnCmd::Subscribe(id));
                tracing::debug!("Registered subscription {} on {}", id, topic);
                Subscription::attached(id, topic, rx, inner.registry.clone(), inner.cmd_tx.clone())
            }
            None => {
                tracing::debug!("Subscribe to {} after shutdown", topic);
                Subscription::detached(topic)
            }
        }
    }

    /// Number of subscriptions not yet released
    pub fn active_subscriptions(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_rx.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.registry.is_closed()
    }

    /// Ends every subscription, unsubscribes, sends DISCONNECT and waits
    /// for the connection task to finish
    pub async fn shutdown(&self) {
        self.inner.registry.close();
        let _ = self.inner.cmd_tx.send(ConnCmd::Shutdown);

        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!("Connection task ended abnormally: {}", e);
            }
        }
    }
}

enum SessionEnd {
    Shutdown,
    Lost(String),
}

async fn connection_task(
    config: StreamConfig,
    registry: Arc<Registry>,
    mut cmd_rx: mpsc::UnboundedReceiver<ConnCmd>,
    state_tx: watch::Sender<ConnectionState>,
) {
    loop {
        let _ = state_tx.send(ConnectionState::Connecting);
        tracing::debug!("Connecting to broker at {}", config.broker_url);

        match connect(&config).await {
            Ok((mut ws, agreed)) => {
                registry.recover();
                let _ = state_tx.send(ConnectionState::Connected);
                tracing::info!("Connected to broker at {}", config.broker_url);

                match run_session(&mut ws, agreed, &config, &registry, &mut cmd_rx).await {
                    SessionEnd::Shutdown => {
                        let _ = state_tx.send(ConnectionState::Disconnected);
                        tracing::info!("Disconnected from broker");
                        return;
                    }
                    SessionEnd::Lost(reason) => {
                        tracing::warn!("Broker connection lost: {}", reason);
                        registry.fail(format!("connection lost: {}", reason));
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Broker connection failed: {}", e);
                registry.fail(format!("log stream unavailable: {}", e));
            }
        }

        let _ = state_tx.send(ConnectionState::Disconnected);
        if registry.is_closed() {
            return;
        }

        tracing::debug!("Reconnecting in {:?}", config.reconnect_delay);
        if wait_before_retry(config.reconnect_delay, &mut cmd_rx)
            .await
            .is_break()
        {
            return;
        }
    }
}

/// Sleeps the reconnect delay unless shutdown is requested first
async fn wait_before_retry(
    delay: Duration,
    cmd_rx: &mut mpsc::UnboundedReceiver<ConnCmd>,
) -> ControlFlow<()> {
    let deadline = sleep(delay);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return ControlFlow::Continue(()),
            cmd = cmd_rx.recv() => match cmd {
                Some(ConnCmd::Shutdown) | None => return ControlFlow::Break(()),
                // The registry is replayed on the next connect
                Some(_) => {}
            },
        }
    }
}

async fn connect(config: &StreamConfig) -> Result<(BrokerSocket, Negotiated)> {
    timeout(config.connect_timeout, handshake(config))
        .await
        .map_err(|_| StreamError::HandshakeTimeout(config.connect_timeout))?
}

async fn handshake(config: &StreamConfig) -> Result<(BrokerSocket, Negotiated)> {
    let (mut ws, _) = connect_async(config.broker_url.as_str()).await?;

    let ours = HeartBeat::new(config.heartbeat_outgoing, config.heartbeat_incoming);
    let connect = Frame::new(Command::Connect)
        .header("accept-version", "1.2")
        .header(
            "host",
            config.host().unwrap_or_else(|| "localhost".to_string()),
        )
        .header("heart-beat", ours.header_value());
    ws.send(Message::Text(connect.encode().into())).await?;

    let connected = await_connected(&mut ws).await?;
    let broker = HeartBeat::parse(connected.get("heart-beat"))?;
    let agreed = ours.negotiate(&broker);

    tracing::debug!(
        "STOMP session {} (send every {:?}, expect every {:?})",
        connected.get("session").unwrap_or("-"),
        agreed.send_every,
        agreed.expect_every
    );

    Ok((ws, agreed))
}

async fn await_connected(ws: &mut BrokerSocket) -> Result<Frame> {
    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(text) => {
                for frame in Frame::decode(text.as_str())? {
                    match frame.command {
                        Command::Connected => return Ok(frame),
                        Command::Error => return Err(StreamError::Rejected(error_text(&frame))),
                        other => tracing::debug!("Ignoring {} before CONNECTED", other),
                    }
                }
            }
            Message::Close(_) => return Err(StreamError::Closed),
            _ => {}
        }
    }

    Err(StreamError::Closed)
}

async fn run_session(
    ws: &mut BrokerSocket,
    agreed: Negotiated,
    config: &StreamConfig,
    registry: &Registry,
    cmd_rx: &mut mpsc::UnboundedReceiver<ConnCmd>,
) -> SessionEnd {
    let mut subscribed: HashSet<u64> = HashSet::new();

    let existing = registry.snapshot();
    if !existing.is_empty() {
        tracing::info!("Re-subscribing {} active subscription(s)", existing.len());
    }
    for (id, topic) in existing {
        if let Err(e) = send_subscribe(ws, config, id, &topic).await {
            return SessionEnd::Lost(e.to_string());
        }
        subscribed.insert(id);
    }

    let mut beat = tokio::time::interval(agreed.send_every.unwrap_or(FAR_FUTURE));
    beat.reset();
    let dead_after = agreed.dead_after();
    let mut last_seen = Instant::now();

    loop {
        let silence = sleep_until(last_seen + dead_after.unwrap_or(FAR_FUTURE));

        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(ConnCmd::Subscribe(id)) => {
                    // Already replayed, or released before we got here
                    if subscribed.contains(&id) {
                        continue;
                    }
                    let Some(topic) = registry.topic(id) else {
                        continue;
                    };
                    if let Err(e) = send_subscribe(ws, config, id, &topic).await {
                        return SessionEnd::Lost(e.to_string());
                    }
                    subscribed.insert(id);
                }
                Some(ConnCmd::Unsubscribe(id)) => {
                    if subscribed.remove(&id) {
                        if let Err(e) = send_unsubscribe(ws, id).await {
                            return SessionEnd::Lost(e.to_string());
                        }
                    }
                }
                Some(ConnCmd::Shutdown) | None => {
                    close_session(ws, &subscribed).await;
                    return SessionEnd::Shutdown;
                }
            },

            msg = ws.next() => {
                last_seen = Instant::now();
                match msg {
                    Some(Ok(Message::Text(text))) => match Frame::decode(text.as_str()) {
                        Ok(frames) => {
                            for frame in frames {
                                if let Some(end) = route(frame, registry) {
                                    return end;
                                }
                            }
                        }
                        Err(e) => tracing::warn!("Dropping malformed frame: {}", e),
                    },
                    Some(Ok(Message::Close(_))) => {
                        return SessionEnd::Lost("closed by broker".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
                    None => return SessionEnd::Lost("connection closed".to_string()),
                }
            }

            _ = beat.tick(), if agreed.send_every.is_some() => {
                if let Err(e) = ws.send(Message::text("\n".to_string())).await {
                    return SessionEnd::Lost(e.to_string());
                }
            }

            _ = silence, if dead_after.is_some() => {
                return SessionEnd::Lost(format!(
                    "no heart-beat from broker for {:?}",
                    dead_after.unwrap_or_default()
                ));
            }
        }
    }
}

/// Hands one inbound frame to its subscriber
///
/// Returns the end of the session for an ERROR frame: the broker closes the
/// connection after sending one.
fn route(frame: Frame, registry: &Registry) -> Option<SessionEnd> {
    match frame.command {
        Command::Message => {
            let Some(id) = frame.get("subscription").and_then(parse_wire_id) else {
                tracing::warn!("MESSAGE without a known subscription header");
                return None;
            };
            if !registry.deliver(id, Delivery::Line(frame.body)) {
                tracing::debug!("No subscriber for {}", wire_id(id));
            }
            None
        }
        Command::Error => {
            let text = error_text(&frame);
            tracing::warn!("Broker error: {}", text);

            match frame.get("subscription").and_then(parse_wire_id) {
                Some(id) => {
                    registry.deliver(id, Delivery::Error(text.clone()));
                }
                None => registry.broadcast(Delivery::Error(text.clone())),
            }
            Some(SessionEnd::Lost(text))
        }
        other => {
            tracing::debug!("Ignoring {} frame", other);
            None
        }
    }
}

/// Human-readable text of an ERROR frame
fn error_text(frame: &Frame) -> String {
    let body = frame.body.trim();
    match frame.get("message") {
        Some(message) if !body.is_empty() => format!("{}: {}", message, body),
        Some(message) => message.to_string(),
        None if !body.is_empty() => body.to_string(),
        None => "unknown broker error".to_string(),
    }
}

async fn send_frame(ws: &mut BrokerSocket, frame: Frame) -> Result<()> {
    ws.send(Message::Text(frame.encode().into())).await?;
    Ok(())
}

async fn send_subscribe(
    ws: &mut BrokerSocket,
    config: &StreamConfig,
    id: u64,
    topic: &Topic,
) -> Result<()> {
    let destination = config.destination(topic.as_str());
    tracing::debug!("Subscribing {} to {}", wire_id(id), destination);

    let frame = Frame::new(Command::Subscribe)
        .header("id", wire_id(id))
        .header("destination", destination)
        .header("ack", "auto");
    send_frame(ws, frame).await
}

async fn send_unsubscribe(ws: &mut BrokerSocket, id: u64) -> Result<()> {
    tracing::debug!("Unsubscribing {}", wire_id(id));
    send_frame(ws, Frame::new(Command::Unsubscribe).header("id", wire_id(id))).await
}

async fn close_session(ws: &mut BrokerSocket, subscribed: &HashSet<u64>) {
    let mut ids: Vec<_> = subscribed.iter().copied().collect();
    ids.sort_unstable();
    for id in ids {
        let _ = send_unsubscribe(ws, id).await;
    }

    let _ = send_frame(ws, Frame::new(Command::Disconnect)).await;
    let _ = timeout(CLOSE_TIMEOUT, ws.close(None)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBroker, WAIT};

    async fn next(sub: &mut Subscription) -> Option<Delivery> {
        timeout(WAIT, sub.recv()).await.expect("delivery timed out")
    }

    /// Next line, skipping error deliveries
    async fn next_line(sub: &mut Subscription) -> String {
        loop {
            match next(sub).await {
                Some(Delivery::Line(line)) => return line,
                Some(Delivery::Error(_)) => continue,
                None => panic!("subscription ended"),
            }
        }
    }

    #[test]
    fn test_error_text() {
        let frame = Frame::new(Command::Error).header("message", "bad destination");
        assert_eq!(error_text(&frame), "bad destination");

        let frame = frame.with_body("no such topic\n");
        assert_eq!(error_text(&frame), "bad destination: no such topic");

        assert_eq!(
            error_text(&Frame::new(Command::Error)),
            "unknown broker error"
        );
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let config = StreamConfig::new("http://localhost:8082/ws-backup");
        assert!(matches!(
            ConnectionManager::start(config),
            Err(StreamError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut sub = manager.subscribe(Topic::job_logs(42));

        let mut session = broker.accept().await;
        let subscribe = session.expect(Command::Subscribe).await;
        assert_eq!(subscribe.get("destination"), Some("/topic/logs/job/42"));
        let sub_id = subscribe.get("id").unwrap().to_string();

        for line in ["line1", "line2", "line3"] {
            session.message(&sub_id, "/topic/logs/job/42", line).await;
        }

        assert_eq!(next(&mut sub).await, Some(Delivery::Line("line1".to_string())));
        assert_eq!(next(&mut sub).await, Some(Delivery::Line("line2".to_string())));
        assert_eq!(next(&mut sub).await, Some(Delivery::Line("line3".to_string())));
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_subscriptions_are_isolated() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut session = broker.accept().await;

        let mut first = manager.subscribe(Topic::job_logs(1));
        let first_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        let mut second = manager.subscribe(Topic::job_logs(2));
        let second_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        assert_eq!(manager.active_subscriptions(), 2);

        session.message(&first_id, "/topic/logs/job/1", "one").await;
        session.message(&second_id, "/topic/logs/job/2", "two").await;
        assert_eq!(next_line(&mut first).await, "one");
        assert_eq!(next_line(&mut second).await, "two");

        first.release();
        let unsubscribe = session.expect(Command::Unsubscribe).await;
        assert_eq!(unsubscribe.get("id"), Some(first_id.as_str()));
        assert_eq!(manager.active_subscriptions(), 1);

        session.message(&second_id, "/topic/logs/job/2", "still here").await;
        assert_eq!(next_line(&mut second).await, "still here");
    }

    #[tokio::test]
    async fn test_resubscribes_after_reconnect() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut sub = manager.subscribe(Topic::job_logs(42));

        let mut first = broker.accept().await;
        let sub_id = first.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        first.message(&sub_id, "/topic/logs/job/42", "before").await;
        assert_eq!(next_line(&mut sub).await, "before");
        first.drop_connection().await;

        let mut second = broker.accept().await;
        let resubscribe = second.expect(Command::Subscribe).await;
        assert_eq!(resubscribe.get("id"), Some(sub_id.as_str()));
        assert_eq!(resubscribe.get("destination"), Some("/topic/logs/job/42"));

        second.message(&sub_id, "/topic/logs/job/42", "after").await;
        assert_eq!(next_line(&mut sub).await, "after");
    }

    #[tokio::test]
    async fn test_lost_connection_is_reported() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut sub = manager.subscribe(Topic::job_logs(7));

        let mut session = broker.accept().await;
        session.expect(Command::Subscribe).await;
        session.drop_connection().await;

        match next(&mut sub).await {
            Some(Delivery::Error(message)) => assert!(message.starts_with("connection lost")),
            other => panic!("expected an error delivery, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_broker_error_frame_reaches_subscriber() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut sub = manager.subscribe(Topic::job_logs(7));

        let mut session = broker.accept().await;
        let sub_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        session
            .send(
                Frame::new(Command::Error)
                    .header("subscription", sub_id)
                    .header("message", "access denied"),
            )
            .await;

        assert_eq!(
            next(&mut sub).await,
            Some(Delivery::Error("access denied".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unreachable_broker_reports_error() {
        let url = ScriptedBroker::unused_url().await;
        let mut config = StreamConfig::new(url);
        config.reconnect_delay = Duration::from_secs(30);
        let manager = ConnectionManager::start(config).unwrap();

        let mut sub = manager.subscribe(Topic::job_logs(1));
        match next(&mut sub).await {
            Some(Delivery::Error(message)) => {
                assert!(message.starts_with("log stream unavailable"))
            }
            other => panic!("expected an error delivery, got {:?}", other),
        }

        let mut late = manager.subscribe(Topic::job_logs(2));
        assert!(matches!(next(&mut late).await, Some(Delivery::Error(_))));

        timeout(WAIT, manager.shutdown()).await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_shutdown_unsubscribes_and_disconnects() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut sub = manager.subscribe(Topic::job_logs(42));

        let mut session = broker.accept().await;
        let sub_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();

        let closing = tokio::spawn({
            let manager = manager.clone();
            async move { manager.shutdown().await }
        });

        let unsubscribe = session.expect(Command::Unsubscribe).await;
        assert_eq!(unsubscribe.get("id"), Some(sub_id.as_str()));
        session.expect(Command::Disconnect).await;
        session.expect_closed().await;
        timeout(WAIT, closing).await.unwrap().unwrap();

        assert_eq!(next(&mut sub).await, None);
        assert!(manager.is_closed());
        assert_eq!(manager.active_subscriptions(), 0);
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        let mut after = manager.subscribe(Topic::job_logs(42));
        assert_eq!(next(&mut after).await, None);
    }

    #[tokio::test]
    async fn test_sends_heartbeats() {
        let broker = ScriptedBroker::bind().await;
        let mut config = broker.config();
        config.heartbeat_outgoing = Duration::from_millis(50);
        let _manager = ConnectionManager::start(config).unwrap();

        let mut session = broker.accept_with_heartbeat("0,50").await;
        assert!(session.expect_heartbeat().await);
    }

    #[tokio::test]
    async fn test_silent_broker_is_dropped() {
        let broker = ScriptedBroker::bind().await;
        let mut config = broker.config();
        config.heartbeat_incoming = Duration::from_millis(50);
        let manager = ConnectionManager::start(config).unwrap();
        let _sub = manager.subscribe(Topic::job_logs(1));

        // Promises heart-beats every 50ms, then never sends anything
        let mut silent = broker.accept_with_heartbeat("50,0").await;
        silent.expect(Command::Subscribe).await;

        let mut next_session = broker.accept().await;
        next_session.expect(Command::Subscribe).await;
    }
}
