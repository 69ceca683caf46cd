//! Subscriptions
//!
//! Every `subscribe` call registers an entry in the manager's registry and
//! gets back a [`Subscription`] handle holding the receiving end of an
//! unbounded channel. The connection task routes MESSAGE frames into these
//! channels by subscription id, so per-topic order is the broker's order.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

use crate::connection::ConnCmd;

/// Broker topic, without the destination prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Log lines of one job's executions
    pub fn job_logs(job_id: impl fmt::Display) -> Self {
        Self(format!("logs/job/{}", job_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a subscription receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A message body, exactly as the broker sent it
    Line(String),
    /// The broker or the connection reported a problem
    Error(String),
}

/// Wire id of a subscription ("sub-3")
pub(crate) fn wire_id(id: u64) -> String {
    format!("sub-{}", id)
}

pub(crate) fn parse_wire_id(value: &str) -> Option<u64> {
    value.strip_prefix("sub-")?.parse().ok()
}

struct Entry {
    topic: Topic,
    tx: mpsc::UnboundedSender<Delivery>,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<u64, Entry>,
    /// Set while the broker is unreachable; replayed to new subscribers
    outage: Option<String>,
    closed: bool,
}

/// Active subscriptions, shared by the manager, its handles and the
/// connection task
#[derive(Default)]
pub(crate) struct Registry {
    state: Mutex<RegistryState>,
    next_id: AtomicU64,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a subscriber; `None` once the registry is closed
    pub(crate) fn register(
        &self,
        topic: Topic,
    ) -> Option<(u64, mpsc::UnboundedReceiver<Delivery>)> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(outage) = &state.outage {
            let _ = tx.send(Delivery::Error(outage.clone()));
        }
        state.entries.insert(id, Entry { topic, tx });

        Some((id, rx))
    }

    /// Returns false when the id was not registered
    pub(crate) fn remove(&self, id: u64) -> bool {
        self.lock().entries.remove(&id).is_some()
    }

    pub(crate) fn topic(&self, id: u64) -> Option<Topic> {
        self.lock().entries.get(&id).map(|e| e.topic.clone())
    }

    /// Registered subscriptions in id order
    pub(crate) fn snapshot(&self) -> Vec<(u64, Topic)> {
        let mut entries: Vec<_> = self
            .lock()
            .entries
            .iter()
            .map(|(id, e)| (*id, e.topic.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns false when nobody is listening on that id
    pub(crate) fn deliver(&self, id: u64, delivery: Delivery) -> bool {
        self.lock()
            .entries
            .get(&id)
            .is_some_and(|e| e.tx.send(delivery).is_ok())
    }

    pub(crate) fn broadcast(&self, delivery: Delivery) {
        for entry in self.lock().entries.values() {
            let _ = entry.tx.send(delivery.clone());
        }
    }

    /// Records an outage, telling current subscribers only on the first one
    pub(crate) fn fail(&self, message: String) {
        let mut state = self.lock();
        if state.outage.is_none() {
            for entry in state.entries.values() {
                let _ = entry.tx.send(Delivery::Error(message.clone()));
            }
        }
        state.outage = Some(message);
    }

    pub(crate) fn recover(&self) {
        self.lock().outage = None;
    }

    /// Drops every sender so all subscriptions see end-of-stream
    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.entries.clear();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

struct Link {
    registry: Arc<Registry>,
    commands: mpsc::UnboundedSender<ConnCmd>,
}

/// Handle to one topic subscription
///
/// Receives deliveries in broker order until released. Releasing (or
/// dropping) the handle unregisters it immediately; the UNSUBSCRIBE frame
/// follows asynchronously.
pub struct Subscription {
    id: u64,
    topic: Topic,
    rx: mpsc::UnboundedReceiver<Delivery>,
    link: Option<Link>,
}

impl Subscription {
    pub(crate) fn attached(
        id: u64,
        topic: Topic,
        rx: mpsc::UnboundedReceiver<Delivery>,
        registry: Arc<Registry>,
        commands: mpsc::UnboundedSender<ConnCmd>,
    ) -> Self {
        Self {
            id,
            topic,
            rx,
            link: Some(Link { registry, commands }),
        }
    }

    /// A subscription that is already at end-of-stream
    pub(crate) fn detached(topic: Topic) -> Self {
        let (_, rx) = mpsc::unbounded_channel();
        Self {
            id: 0,
            topic,
            rx,
            link: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn is_released(&self) -> bool {
        self.link.is_none()
    }

    /// Waits for the next delivery; `None` once released or the manager
    /// has shut down
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Next delivery if one is already queued
    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.rx.try_recv().ok()
    }

    /// Unregisters the subscription
    ///
    /// Nothing is delivered after this returns, including anything already
    /// queued. Calling it again is a no-op.
    pub fn release(&mut self) {
        if let Some(link) = self.link.take() {
            if link.registry.remove(self.id) {
                let _ = link.commands.send(ConnCmd::Unsubscribe(self.id));
                tracing::debug!("Released subscription {} on {}", self.id, self.topic);
            }
        }

        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("released", &self.is_released())
            .finish()
    }
}

impl Stream for Subscription {
    type Item = Delivery;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(registry: &Arc<Registry>, topic: Topic) -> (Subscription, mpsc::UnboundedReceiver<ConnCmd>) {
        let (id, rx) = registry.register(topic.clone()).unwrap();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        (
            Subscription::attached(id, topic, rx, registry.clone(), cmd_tx),
            cmd_rx,
        )
    }

    #[test]
    fn test_job_logs_topic() {
        assert_eq!(Topic::job_logs(42).as_str(), "logs/job/42");
        assert_eq!(wire_id(3), "sub-3");
        assert_eq!(parse_wire_id("sub-3"), Some(3));
        assert_eq!(parse_wire_id("3"), None);
    }

    #[test]
    fn test_deliveries_keep_order() {
        let registry = Arc::new(Registry::default());
        let (mut sub, _commands) = attached(&registry, Topic::job_logs(42));

        for line in ["line1", "line2", "line3"] {
            assert!(registry.deliver(sub.id(), Delivery::Line(line.to_string())));
        }

        let received: Vec<_> = std::iter::from_fn(|| sub.try_recv()).collect();
        assert_eq!(
            received,
            vec![
                Delivery::Line("line1".to_string()),
                Delivery::Line("line2".to_string()),
                Delivery::Line("line3".to_string()),
            ]
        );
    }

    #[test]
    fn test_release_is_synchronous() {
        let registry = Arc::new(Registry::default());
        let (mut sub, mut commands) = attached(&registry, Topic::job_logs(1));
        let id = sub.id();

        registry.deliver(id, Delivery::Line("queued".to_string()));
        sub.release();

        assert!(sub.is_released());
        assert_eq!(registry.len(), 0);
        assert!(!registry.deliver(id, Delivery::Line("late".to_string())));
        assert_eq!(sub.try_recv(), None);
        assert!(matches!(commands.try_recv(), Ok(ConnCmd::Unsubscribe(i)) if i == id));

        sub.release();
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn test_drop_releases() {
        let registry = Arc::new(Registry::default());
        let (sub, _commands) = attached(&registry, Topic::job_logs(1));
        assert_eq!(registry.len(), 1);

        drop(sub);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_outage_is_reported_once_and_replayed() {
        let registry = Arc::new(Registry::default());
        let (mut early, _c1) = attached(&registry, Topic::job_logs(1));

        registry.fail("broker unreachable".to_string());
        registry.fail("broker unreachable".to_string());
        assert_eq!(
            early.try_recv(),
            Some(Delivery::Error("broker unreachable".to_string()))
        );
        assert_eq!(early.try_recv(), None);

        let (mut late, _c2) = attached(&registry, Topic::job_logs(2));
        assert_eq!(
            late.try_recv(),
            Some(Delivery::Error("broker unreachable".to_string()))
        );

        registry.recover();
        let (mut after, _c3) = attached(&registry, Topic::job_logs(3));
        assert_eq!(after.try_recv(), None);
    }

    #[test]
    fn test_closed_registry_refuses_and_ends_streams() {
        let registry = Arc::new(Registry::default());
        let (mut sub, _commands) = attached(&registry, Topic::job_logs(1));

        registry.close();
        assert!(registry.is_closed());
        assert!(registry.register(Topic::job_logs(2)).is_none());

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        assert_eq!(rt.block_on(sub.recv()), None);
    }
}
