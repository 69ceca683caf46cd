//! In-process STOMP broker for tests
//!
//! Accepts WebSocket connections on a loopback port and lets a test script
//! the broker side frame by frame.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use crate::config::StreamConfig;
use crate::frame::{Command, Frame, is_heartbeat};

/// Upper bound on any single wait in a test
pub(crate) const WAIT: Duration = Duration::from_secs(5);

pub(crate) struct ScriptedBroker {
    listener: TcpListener,
}

impl ScriptedBroker {
    pub(crate) async fn bind() -> Self {
        Self {
            listener: TcpListener::bind("127.0.0.1:0").await.unwrap(),
        }
    }

    /// A ws:// URL nothing is listening on
    pub(crate) async fn unused_url() -> String {
        let broker = Self::bind().await;
        broker.url()
    }

    pub(crate) fn url(&self) -> String {
        format!("ws://{}/ws-backup", self.listener.local_addr().unwrap())
    }

    /// Client configuration pointing here, with a short reconnect delay
    pub(crate) fn config(&self) -> StreamConfig {
        let mut config = StreamConfig::new(self.url());
        config.reconnect_delay = Duration::from_millis(50);
        config.connect_timeout = Duration::from_secs(2);
        config
    }

    /// Accepts the next client and completes the STOMP handshake without
    /// heart-beats
    pub(crate) async fn accept(&self) -> BrokerSession {
        self.accept_with_heartbeat("0,0").await
    }

    pub(crate) async fn accept_with_heartbeat(&self, heart_beat: &str) -> BrokerSession {
        let (stream, _) = timeout(WAIT, self.listener.accept())
            .await
            .expect("no client connected")
            .unwrap();
        let ws = accept_async(stream).await.unwrap();
        let mut session = BrokerSession { ws };

        let connect = session.recv().await.expect("connection closed before CONNECT");
        assert_eq!(connect.command, Command::Connect);
        assert_eq!(connect.get("accept-version"), Some("1.2"));

        session
            .send(
                Frame::new(Command::Connected)
                    .header("version", "1.2")
                    .header("heart-beat", heart_beat),
            )
            .await;

        session
    }
}

pub(crate) struct BrokerSession {
    ws: WebSocketStream<TcpStream>,
}

impl BrokerSession {
    /// Next frame from the client, skipping heart-beats; `None` once closed
    pub(crate) async fn recv(&mut self) -> Option<Frame> {
        loop {
            let msg = timeout(WAIT, self.ws.next()).await.expect("client went quiet")?;
            match msg.ok()? {
                Message::Text(text) => {
                    let mut frames = Frame::decode(text.as_str()).unwrap();
                    if !frames.is_empty() {
                        assert_eq!(frames.len(), 1, "one frame per message");
                        return frames.pop();
                    }
                }
                Message::Close(_) => return None,
                _ => {}
            }
        }
    }

    pub(crate) async fn expect(&mut self, command: Command) -> Frame {
        let frame = self.recv().await.expect("connection closed");
        assert_eq!(frame.command, command, "unexpected frame {:?}", frame);
        frame
    }

    /// Waits for the client to close the socket
    pub(crate) async fn expect_closed(&mut self) {
        if let Some(frame) = self.recv().await {
            panic!("expected close, got {:?}", frame);
        }
    }

    /// True when the next raw message is a heart-beat
    pub(crate) async fn expect_heartbeat(&mut self) -> bool {
        loop {
            let msg = timeout(WAIT, self.ws.next())
                .await
                .expect("client went quiet")
                .expect("connection closed")
                .unwrap();
            if let Message::Text(text) = msg {
                return is_heartbeat(text.as_str());
            }
        }
    }

    pub(crate) async fn send(&mut self, frame: Frame) {
        self.ws
            .send(Message::text(frame.encode()))
            .await
            .unwrap();
    }

    pub(crate) async fn message(&mut self, subscription: &str, destination: &str, body: &str) {
        self.send(
            Frame::new(Command::Message)
                .header("subscription", subscription)
                .header("destination", destination)
                .header("message-id", format!("{}-{}", subscription, body.len()))
                .with_body(body),
        )
        .await;
    }

    /// Closes the socket as a broker restart would
    pub(crate) async fn drop_connection(mut self) {
        let _ = self.ws.close(None).await;
    }
}
