use std::sync::Arc;

use tokio::sync::watch;

use crate::pkg::internal::adaptors::jobs::spec::JobEntry;

/// Live job-list snapshots. Subscribers always observe the latest snapshot;
/// publishing replaces it for everyone attached. A detached subscriber is
/// just a dropped receiver.
#[derive(Debug, Clone)]
pub struct JobFeed {
    tx: Arc<watch::Sender<Vec<JobEntry>>>,
}

impl JobFeed {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        JobFeed { tx: Arc::new(tx) }
    }

    pub fn publish(&self, jobs: Vec<JobEntry>) {
        self.tx.send_replace(jobs);
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<JobEntry>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::JobFeed;
    use crate::pkg::internal::adaptors::jobs::spec::JobEntry;

    fn job(id: i32, title: &str) -> JobEntry {
        JobEntry {
            id,
            title: title.into(),
            description: "desc".into(),
            company: None,
            location: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_subscriber_sees_latest_snapshot() {
        let feed = JobFeed::new();
        feed.publish(vec![job(1, "one")]);
        feed.publish(vec![job(1, "one"), job(2, "two")]);

        let rx = feed.subscribe();
        assert_eq!(rx.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_publish_wakes_attached_subscriber() {
        let feed = JobFeed::new();
        let mut rx = feed.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        feed.publish(vec![job(7, "new")]);
        rx.changed().await.expect("feed closed");
        assert_eq!(rx.borrow()[0].id, 7);
    }
}
