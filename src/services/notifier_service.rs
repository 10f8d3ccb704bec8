use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::models::submission::SubmissionEvent;

const CHANNEL_CAPACITY: usize = 64;

/// Broadcast fan-out keyed by channel id (submission or assessment id).
/// Publishing to a channel nobody listens on is a silent no-op; events are
/// not buffered for late subscribers. Dropping a receiver is the whole
/// unsubscribe story, and empty channels are pruned on the next publish.
#[derive(Clone, Default)]
pub struct NotifierService {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<SubmissionEvent>>>>,
}

impl NotifierService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<SubmissionEvent> {
        let mut map = self.channels.write().expect("notifier lock poisoned");
        map.entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub fn publish(&self, channel: &str, event: SubmissionEvent) {
        let mut map = self.channels.write().expect("notifier lock poisoned");
        if let Some(tx) = map.get(channel) {
            if tx.receiver_count() == 0 {
                map.remove(channel);
                return;
            }
            // A send error means every receiver dropped between the check
            // and the send; that is still a no-op, not a failure.
            let _ = tx.send(event);
        }
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .expect("notifier lock poisoned")
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}
