//! Log viewer
//!
//! The append-only line buffer behind a job's live log view. Errors from the
//! stream are shown inline as lines rather than ending the view, and the
//! view position follows the newest line.

use crate::connection::ConnectionManager;
use crate::subscription::{Delivery, Subscription, Topic};

pub const MISSING_JOB_ID: &str = "No job id given: there is no log stream to show.";
pub const STREAM_CLOSED: &str = "[stream closed]";

pub fn error_line(message: &str) -> String {
    format!("[error] {}", message)
}

#[derive(Debug)]
pub struct LogViewer {
    topic: Option<Topic>,
    lines: Vec<String>,
    scroll_position: usize,
    subscription: Option<Subscription>,
}

impl LogViewer {
    /// Starts following a job's log topic
    ///
    /// A blank job id subscribes to nothing and shows a single explanatory
    /// line instead.
    pub fn open(manager: &ConnectionManager, job_id: &str) -> Self {
        let job_id = job_id.trim();

        if job_id.is_empty() {
            tracing::debug!("Log viewer opened without a job id");
            let mut viewer = Self {
                topic: None,
                lines: Vec::new(),
                scroll_position: 0,
                subscription: None,
            };
            viewer.push(MISSING_JOB_ID.to_string());
            return viewer;
        }

        let topic = Topic::job_logs(job_id);
        let subscription = manager.subscribe(topic.clone());

        Self {
            topic: Some(topic),
            lines: Vec::new(),
            scroll_position: 0,
            subscription: Some(subscription),
        }
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    /// True while lines can still arrive
    pub fn is_streaming(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Index of the line the view is anchored to
    pub fn scroll_position(&self) -> usize {
        self.scroll_position
    }

    /// Moves the view; the next appended line moves it back to the end
    pub fn scroll_to(&mut self, position: usize) {
        self.scroll_position = position.min(self.lines.len().saturating_sub(1));
    }

    /// The last `height` lines up to the current position
    pub fn visible(&self, height: usize) -> &[String] {
        if self.lines.is_empty() || height == 0 {
            return &[];
        }
        let end = self.scroll_position + 1;
        &self.lines[end.saturating_sub(height)..end]
    }

    /// Waits for the next line and returns it
    ///
    /// When the stream ends a final marker line is appended and returned;
    /// after that, and after [`close`](Self::close), this returns `None`.
    pub async fn next_line(&mut self) -> Option<&str> {
        let subscription = self.subscription.as_mut()?;

        match subscription.recv().await {
            Some(delivery) => self.apply(delivery),
            None => {
                self.subscription = None;
                self.push(STREAM_CLOSED.to_string());
            }
        }

        self.lines.last().map(String::as_str)
    }

    /// Appends whatever has already arrived, returning how many lines
    pub fn drain_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(delivery) = self.subscription.as_mut().and_then(Subscription::try_recv) {
            self.apply(delivery);
            count += 1;
        }
        count
    }

    /// Stops following the topic; lines already shown are kept
    pub fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
            tracing::debug!("Closed log viewer on {}", subscription.topic());
        }
    }

    fn apply(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Line(line) => self.push(line),
            Delivery::Error(message) => self.push(error_line(&message)),
        }
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
        self.scroll_position = self.lines.len() - 1;
    }
}

impl Drop for LogViewer {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;
    use crate::frame::{Command, Frame};
    use crate::testing::{ScriptedBroker, WAIT};
    use std::time::Duration;
    use tokio::time::timeout;

    async fn next(viewer: &mut LogViewer) -> Option<String> {
        timeout(WAIT, viewer.next_line())
            .await
            .expect("no line arrived")
            .map(str::to_string)
    }

    async fn offline_manager() -> ConnectionManager {
        let mut config = StreamConfig::new(ScriptedBroker::unused_url().await);
        config.reconnect_delay = Duration::from_secs(30);
        ConnectionManager::start(config).unwrap()
    }

    #[tokio::test]
    async fn test_lines_render_in_arrival_order() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut viewer = LogViewer::open(&manager, "42");
        assert_eq!(viewer.topic().map(Topic::as_str), Some("logs/job/42"));

        let mut session = broker.accept().await;
        let sub_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        for line in ["line1", "line2", "line3"] {
            session.message(&sub_id, "/topic/logs/job/42", line).await;
        }

        for _ in 0..3 {
            next(&mut viewer).await;
        }
        assert_eq!(viewer.lines(), ["line1", "line2", "line3"]);
        assert_eq!(viewer.scroll_position(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_kept() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut viewer = LogViewer::open(&manager, "9");

        let mut session = broker.accept().await;
        let sub_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        session.message(&sub_id, "/topic/logs/job/9", "retrying").await;
        session.message(&sub_id, "/topic/logs/job/9", "retrying").await;

        next(&mut viewer).await;
        next(&mut viewer).await;
        assert_eq!(viewer.lines(), ["retrying", "retrying"]);
    }

    #[tokio::test]
    async fn test_blank_job_id_shows_single_line() {
        let manager = offline_manager().await;

        for id in ["", "   "] {
            let mut viewer = LogViewer::open(&manager, id);
            assert_eq!(viewer.lines(), [MISSING_JOB_ID]);
            assert!(!viewer.is_streaming());
            assert_eq!(viewer.next_line().await, None);
        }
        assert_eq!(manager.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_broker_shows_error_line() {
        let manager = offline_manager().await;
        let mut viewer = LogViewer::open(&manager, "42");

        let line = next(&mut viewer).await.unwrap();
        assert!(line.starts_with("[error] log stream unavailable"));
        assert!(viewer.is_streaming());
    }

    #[tokio::test]
    async fn test_broker_error_becomes_a_line() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut viewer = LogViewer::open(&manager, "5");

        let mut session = broker.accept().await;
        let sub_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        session
            .send(
                Frame::new(Command::Error)
                    .header("subscription", sub_id)
                    .header("message", "access denied"),
            )
            .await;

        assert_eq!(next(&mut viewer).await.as_deref(), Some("[error] access denied"));
    }

    #[tokio::test]
    async fn test_viewer_survives_reconnect() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut viewer = LogViewer::open(&manager, "42");

        let mut first = broker.accept().await;
        let sub_id = first.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        first.message(&sub_id, "/topic/logs/job/42", "before").await;
        assert_eq!(next(&mut viewer).await.as_deref(), Some("before"));
        first.drop_connection().await;

        let mut second = broker.accept().await;
        second.expect(Command::Subscribe).await;
        second.message(&sub_id, "/topic/logs/job/42", "after").await;

        while next(&mut viewer).await.as_deref() != Some("after") {}
        assert_eq!(viewer.lines().first().map(String::as_str), Some("before"));
        assert_eq!(viewer.lines().last().map(String::as_str), Some("after"));
        assert_eq!(viewer.scroll_position(), viewer.lines().len() - 1);
    }

    #[tokio::test]
    async fn test_close_releases_subscription() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut viewer = LogViewer::open(&manager, "42");

        let mut session = broker.accept().await;
        let sub_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        session.message(&sub_id, "/topic/logs/job/42", "line1").await;
        next(&mut viewer).await;

        viewer.close();
        assert_eq!(manager.active_subscriptions(), 0);
        assert!(!viewer.is_streaming());

        let unsubscribe = session.expect(Command::Unsubscribe).await;
        assert_eq!(unsubscribe.get("id"), Some(sub_id.as_str()));

        session.message(&sub_id, "/topic/logs/job/42", "late").await;
        assert_eq!(viewer.next_line().await, None);
        assert_eq!(viewer.drain_pending(), 0);
        assert_eq!(viewer.lines(), ["line1"]);
    }

    #[tokio::test]
    async fn test_closed_viewers_do_not_affect_others() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut session = broker.accept().await;

        let mut closing = LogViewer::open(&manager, "42");
        session.expect(Command::Subscribe).await;
        let mut staying = LogViewer::open(&manager, "42");
        let staying_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();

        closing.close();
        session.expect(Command::Unsubscribe).await;

        session.message(&staying_id, "/topic/logs/job/42", "still streaming").await;
        assert_eq!(next(&mut staying).await.as_deref(), Some("still streaming"));
    }

    #[tokio::test]
    async fn test_shutdown_appends_stream_closed() {
        let manager = offline_manager().await;
        let mut viewer = LogViewer::open(&manager, "42");
        timeout(WAIT, manager.shutdown()).await.unwrap();

        let mut last = None;
        while let Some(line) = next(&mut viewer).await {
            last = Some(line);
        }
        assert_eq!(last.as_deref(), Some(STREAM_CLOSED));
        assert!(!viewer.is_streaming());
    }

    #[tokio::test]
    async fn test_drain_and_visible_window() {
        let broker = ScriptedBroker::bind().await;
        let manager = ConnectionManager::start(broker.config()).unwrap();
        let mut viewer = LogViewer::open(&manager, "3");

        let mut session = broker.accept().await;
        let sub_id = session.expect(Command::Subscribe).await.get("id").unwrap().to_string();
        for n in 1..=5 {
            session
                .message(&sub_id, "/topic/logs/job/3", &format!("step {}", n))
                .await;
        }

        next(&mut viewer).await;
        let mut drained = 0;
        while viewer.lines().len() < 5 {
            drained += viewer.drain_pending();
            tokio::task::yield_now().await;
        }
        assert_eq!(drained, 4);

        assert_eq!(viewer.visible(2), ["step 4", "step 5"]);
        assert_eq!(viewer.visible(10).len(), 5);

        viewer.scroll_to(1);
        assert_eq!(viewer.visible(2), ["step 1", "step 2"]);

        session.message(&sub_id, "/topic/logs/job/3", "step 6").await;
        next(&mut viewer).await;
        assert_eq!(viewer.scroll_position(), 5);
        assert_eq!(viewer.visible(1), ["step 6"]);
    }
}
