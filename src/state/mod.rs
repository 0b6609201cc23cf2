//! In-process sensor state model

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::megad::Channel;

/// Consumer contract between the poller and whoever holds the state:
/// a subscription check plus a publish call. The poller skips work for
/// unsubscribed channels and never publishes to them.
#[async_trait]
pub trait StateSink: Send + Sync {
    fn is_subscribed(&self, channel: Channel) -> bool;

    async fn publish(&self, channel: Channel, value: f64);
}

/// A decoded value with its arrival time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub value: f64,
    pub updated_at: DateTime<Utc>,
}

/// Latest-value store for the subscribed channels
pub struct StateStore {
    subscribed: HashSet<Channel>,
    readings: RwLock<HashMap<Channel, Reading>>,
}

impl StateStore {
    pub fn new(subscribed: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            subscribed: subscribed.into_iter().collect(),
            readings: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of the current readings
    pub async fn snapshot(&self) -> HashMap<Channel, Reading> {
        self.readings.read().await.clone()
    }
}

#[async_trait]
impl StateSink for StateStore {
    fn is_subscribed(&self, channel: Channel) -> bool {
        self.subscribed.contains(&channel)
    }

    async fn publish(&self, channel: Channel, value: f64) {
        tracing::info!("{} = {}", channel.as_str(), value);
        let mut readings = self.readings.write().await;
        readings.insert(
            channel,
            Reading {
                value,
                updated_at: Utc::now(),
            },
        );
    }
}
