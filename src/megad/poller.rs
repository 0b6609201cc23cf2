//! Sensor poll scheduler
//!
//! Runs in a background tokio task. The task ticks every 100ms and fires a
//! poll cycle whenever the configured refresh interval has elapsed, so one
//! tick resolution serves any cadence. Each cycle fetches the subscribed
//! channels, decodes the plain-text bodies, and publishes to the state sink.
//! Failures never escape a cycle; the next cycle is the retry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};

use crate::error::ReadError;
use crate::megad::channel::{Channel, COMBINED_DEVICE};
use crate::megad::client::SensorTransport;
use crate::megad::parse::{self, CombinedReading};
use crate::state::StateSink;

/// Tick period of the scheduling loop; the configured refresh cadence is
/// enforced by [`RefreshGate`] on top of this.
const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Consecutive no-data attempts on one channel before a warning is logged.
const MISS_WARN_STREAK: u32 = 3;

/// Request shaping policy.
///
/// Older firmware exposes one sensor per query; newer firmware batches
/// CO2/temperature/humidity into a single scd4x reading. The scheduling,
/// subscription and publish skeleton is shared, only the shaping differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollMode {
    PerChannel,
    Combined,
}

/// Immutable poller settings, fixed at construction
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Zero disables scheduled polling entirely.
    pub refresh_interval: Duration,
    pub mode: PollMode,
}

/// Decides whether a poll cycle is due.
///
/// The clock advances at cycle entry, before any request outcome is known,
/// so a cycle of pure sentinel responses still resets the cadence.
#[derive(Debug)]
struct RefreshGate {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl RefreshGate {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    /// True if a cycle should fire at `now`.
    fn should_fire(&mut self, now: Instant) -> bool {
        if self.interval.is_zero() {
            return false;
        }
        match self.last_fired {
            Some(last) if now < last + self.interval => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }
}

/// Background poller for one wallmount sensor bus
pub struct SensorPoller {
    inner: Arc<PollerInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct PollerInner {
    config: PollerConfig,
    transport: Arc<dyn SensorTransport>,
    sink: Arc<dyn StateSink>,
    /// Serializes fetch batches so at most one is in flight per instance.
    cycle_guard: AsyncMutex<()>,
    /// Consecutive miss count per channel. Observability only.
    streaks: Mutex<HashMap<Channel, u32>>,
}

impl SensorPoller {
    pub fn new(
        config: PollerConfig,
        transport: Arc<dyn SensorTransport>,
        sink: Arc<dyn StateSink>,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                config,
                transport,
                sink,
                cycle_guard: AsyncMutex::new(()),
                streaks: Mutex::new(HashMap::new()),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Start the background poll loop. No-op when already running.
    pub fn start(&self) {
        let mut handle = self.handle.lock().unwrap();
        if handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            return;
        }
        tracing::info!(
            "Starting sensor poller (interval: {:?}, mode: {:?})",
            self.inner.config.refresh_interval,
            self.inner.config.mode
        );
        let inner = self.inner.clone();
        *handle = Some(tokio::spawn(async move { inner.run().await }));
    }

    /// Stop the background poll loop. An in-flight request is dropped at its
    /// next await point and its result discarded, never published. Safe to
    /// call when not running, and safe to call twice.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
            tracing::info!("Sensor poller stopped");
        }
    }

    /// Immediately fetch and publish one channel, bypassing the refresh
    /// gate. Uses the same request shaping and sentinel rules as the
    /// scheduled cycle.
    pub async fn refresh(&self, channel: Channel) {
        self.inner.refresh_channel(channel).await;
    }

    /// Refresh every subscribed channel.
    pub async fn refresh_all(&self) {
        for channel in Channel::ALL {
            self.inner.refresh_channel(channel).await;
        }
    }
}

impl Drop for SensorPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PollerInner {
    async fn run(self: Arc<Self>) {
        let mut gate = RefreshGate::new(self.config.refresh_interval);
        let mut tick = interval(TICK_PERIOD);
        loop {
            tick.tick().await;
            if gate.should_fire(Instant::now()) {
                self.poll_cycle().await;
            }
        }
    }

    /// One poll cycle over the subscribed channels.
    async fn poll_cycle(&self) {
        let _in_flight = self.cycle_guard.lock().await;
        tracing::debug!("Updating sensor readings...");

        match self.config.mode {
            PollMode::PerChannel => {
                for channel in Channel::ALL {
                    if !self.sink.is_subscribed(channel) {
                        continue;
                    }
                    self.poll_single(channel).await;
                }
            }
            PollMode::Combined => {
                // The firmware only offers the batched form, so the request
                // goes out regardless of which of the three are subscribed.
                self.poll_combined().await;
                if self.sink.is_subscribed(Channel::LightLevel) {
                    self.poll_single(Channel::LightLevel).await;
                }
            }
        }
    }

    /// Fetch one channel's own reading and publish it.
    async fn poll_single(&self, channel: Channel) {
        let query = channel.query();
        let decoded = match self.transport.read(query.device, query.param).await {
            Ok(body) => parse::decode_value(&body),
            Err(e) => Err(e),
        };
        match decoded {
            Ok(value) => {
                self.sink.publish(channel, value).await;
                self.clear_streak(channel);
            }
            Err(e) => self.record_miss(channel, &e),
        }
    }

    /// Fetch the combined reading and publish the subscribed subset.
    async fn poll_combined(&self) {
        let subscribed: Vec<Channel> = [Channel::Co2, Channel::Temperature, Channel::Humidity]
            .into_iter()
            .filter(|c| self.sink.is_subscribed(*c))
            .collect();

        match self.read_combined().await {
            Ok(reading) => {
                for channel in subscribed {
                    if let Some(value) = reading.value_for(channel) {
                        self.sink.publish(channel, value).await;
                        self.clear_streak(channel);
                    }
                }
            }
            Err(e) => {
                if subscribed.is_empty() {
                    tracing::debug!("Combined reading unavailable: {}", e);
                } else {
                    for channel in subscribed {
                        self.record_miss(channel, &e);
                    }
                }
            }
        }
    }

    async fn read_combined(&self) -> Result<CombinedReading, ReadError> {
        let body = self.transport.read(COMBINED_DEVICE, None).await?;
        parse::decode_combined(&body)
    }

    /// Out-of-cycle refresh for one channel. In combined mode a refresh of a
    /// carried channel issues the combined request but publishes only the
    /// requested channel's value.
    async fn refresh_channel(&self, channel: Channel) {
        if !self.sink.is_subscribed(channel) {
            tracing::debug!("Refresh for unsubscribed channel {}, ignoring", channel.as_str());
            return;
        }

        let _in_flight = self.cycle_guard.lock().await;
        tracing::debug!("Refresh request for {}", channel.as_str());

        if self.config.mode == PollMode::Combined && channel.in_combined() {
            match self.read_combined().await {
                Ok(reading) => {
                    if let Some(value) = reading.value_for(channel) {
                        self.sink.publish(channel, value).await;
                        self.clear_streak(channel);
                    }
                }
                Err(e) => self.record_miss(channel, &e),
            }
        } else {
            self.poll_single(channel).await;
        }
    }

    fn record_miss(&self, channel: Channel, error: &ReadError) {
        match error {
            ReadError::Transport(_) => {
                tracing::warn!("Read failed for {}: {}", channel.as_str(), error);
            }
            _ => {
                tracing::debug!("Value unavailable for {}: {}", channel.as_str(), error);
            }
        }

        let mut streaks = self.streaks.lock().unwrap();
        let count = streaks.entry(channel).or_insert(0);
        *count += 1;
        if *count == MISS_WARN_STREAK {
            tracing::warn!(
                "No reading from {} for {} consecutive attempts",
                channel.as_str(),
                count
            );
        }
    }

    fn clear_streak(&self, channel: Channel) {
        let mut streaks = self.streaks.lock().unwrap();
        if let Some(count) = streaks.remove(&channel) {
            if count >= MISS_WARN_STREAK {
                tracing::info!("Reading recovered for {}", channel.as_str());
            }
        }
    }
}
