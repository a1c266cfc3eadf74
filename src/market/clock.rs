// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MARKET CLOCK - DAY / NIGHT AVAILABILITY FROM WALL-CLOCK TIME
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Three layers:
// 1. `sample`         pure hour-of-day -> snapshot mapping
// 2. `MarketTracker`  pure transition detection between consecutive samples
// 3. `MarketClock`    tokio interval that samples, tracks and publishes
//
// Hour sequence: 06 buffer (day, closed) -> 08 day -> 20 night -> 06 buffer
//
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Timelike, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{MarketSnapshot, MarketType, Theme};
use crate::core::event_bus::{EventBus, MarketplaceEvent, Notification};
use crate::core::metrics::MarketplaceMetrics;

const DAY_OPENS_AT: u32 = 8; // 08:00
const NIGHT_OPENS_AT: u32 = 20; // 20:00
const NIGHT_CLOSES_AT: u32 = 6; // 06:00, buffer until DAY_OPENS_AT

/// Derive the market for a wall-clock instant, using the hour in `now`'s own zone.
pub fn sample<Tz: TimeZone>(now: &DateTime<Tz>) -> MarketSnapshot {
    let offset = now.offset().fix();
    let local = now.with_timezone(&offset);
    let hour = local.hour();

    let (market_type, is_open) = if (DAY_OPENS_AT..NIGHT_OPENS_AT).contains(&hour) {
        (MarketType::Day, true)
    } else if hour >= NIGHT_OPENS_AT || hour < NIGHT_CLOSES_AT {
        (MarketType::Night, true)
    } else {
        (MarketType::Day, false)
    };

    MarketSnapshot {
        market_type,
        is_open,
        sampled_at: local,
    }
}

/// Clock line shown in the navigation bar, e.g. "Friday, 8:05 PM".
pub fn format_clock(at: &DateTime<FixedOffset>) -> String {
    at.format("%A, %-I:%M %p").to_string()
}

#[cfg_attr(test, mockall::automock)]
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the system clock, optionally pinned to a fixed UTC offset.
#[derive(Debug, Clone, Default)]
pub struct SystemTimeSource {
    offset: Option<FixedOffset>,
}

impl SystemTimeSource {
    pub fn local() -> Self {
        Self { offset: None }
    }

    pub fn with_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes * 60);
        if offset.is_none() {
            tracing::warn!("Invalid UTC offset {} minutes, falling back to local time", minutes);
        }
        Self { offset }
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset),
            None => {
                let now = Local::now();
                now.with_timezone(&now.offset().fix())
            }
        }
    }
}

/// Externally driven time, for demos and tests.
#[derive(Debug)]
pub struct ManualTimeSource {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketTransition {
    pub from: MarketType,
    pub to: MarketType,
    pub snapshot: MarketSnapshot,
}

impl MarketTransition {
    pub fn notification(&self) -> Notification {
        match self.to {
            MarketType::Day => Notification::info(
                "DayMarket is now open!",
                "Campus-wide trading is now available.",
            ),
            MarketType::Night => Notification::info(
                "NightMarket is now open!",
                "Hostel-restricted trading is now available.",
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Observation {
    pub snapshot: MarketSnapshot,
    pub transition: Option<MarketTransition>,
    pub availability_changed: bool,
}

/// Remembers the last snapshot so a market change is reported exactly once.
#[derive(Debug, Clone)]
pub struct MarketTracker {
    current: MarketSnapshot,
}

impl MarketTracker {
    pub fn new(baseline: MarketSnapshot) -> Self {
        Self { current: baseline }
    }

    pub fn current(&self) -> &MarketSnapshot {
        &self.current
    }

    pub fn observe(&mut self, next: MarketSnapshot) -> Observation {
        let previous = std::mem::replace(&mut self.current, next.clone());

        let transition = (previous.market_type != next.market_type).then(|| MarketTransition {
            from: previous.market_type,
            to: next.market_type,
            snapshot: next.clone(),
        });

        Observation {
            availability_changed: previous.is_open != next.is_open,
            transition,
            snapshot: next,
        }
    }

    /// Display a market regardless of the hour. The next observation re-derives it.
    pub fn override_market(&mut self, market: MarketType) {
        self.current.market_type = market;
    }
}

#[derive(Debug)]
struct ClockState {
    tracker: MarketTracker,
    theme: Theme,
}

pub struct MarketClock {
    state: Arc<RwLock<ClockState>>,
    time_source: Arc<dyn TimeSource>,
    bus: Arc<EventBus>,
    metrics: Arc<MarketplaceMetrics>,
    tick_interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MarketClock {
    /// Samples once eagerly so readers always see a current snapshot.
    pub fn new(
        time_source: Arc<dyn TimeSource>,
        bus: Arc<EventBus>,
        metrics: Arc<MarketplaceMetrics>,
        tick_interval: Duration,
    ) -> Self {
        let baseline = sample(&time_source.now());
        metrics.increment_clock_ticks();

        tracing::info!(
            "{} Market clock baseline: {} (open: {}) at {}",
            baseline.market_type.emoji(),
            baseline.market_type.display_name(),
            baseline.is_open,
            format_clock(&baseline.sampled_at)
        );

        let theme = Theme::for_market(baseline.market_type);

        Self {
            state: Arc::new(RwLock::new(ClockState {
                tracker: MarketTracker::new(baseline),
                theme,
            })),
            time_source,
            bus,
            metrics,
            tick_interval,
            task: Mutex::new(None),
        }
    }

    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            tracing::warn!("Market clock already running");
            return;
        }

        let state = self.state.clone();
        let time_source = self.time_source.clone();
        let bus = self.bus.clone();
        let metrics = self.metrics.clone();
        let period = self.tick_interval;

        *task = Some(tokio::spawn(async move {
            // The eager sample already happened in `new`, so the first tick is one period out.
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                Self::tick(&state, time_source.as_ref(), &bus, &metrics).await;
            }
        }));

        tracing::info!("⏰ Market clock started (tick every {}s)", period.as_secs());
    }

    pub fn stop(&self) {
        let handle = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("⏹️  Market clock stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Sample now, outside the schedule.
    pub async fn refresh(&self) -> Observation {
        Self::tick(&self.state, self.time_source.as_ref(), &self.bus, &self.metrics).await
    }

    async fn tick(
        state: &Arc<RwLock<ClockState>>,
        time_source: &dyn TimeSource,
        bus: &EventBus,
        metrics: &MarketplaceMetrics,
    ) -> Observation {
        let snapshot = sample(&time_source.now());
        metrics.increment_clock_ticks();

        let observation = {
            let mut state = state.write().await;
            let observation = state.tracker.observe(snapshot);
            if let Some(transition) = &observation.transition {
                state.theme = Theme::for_market(transition.to);
            }
            observation
        };

        let timestamp = observation.snapshot.sampled_at.with_timezone(&Utc);

        match &observation.transition {
            Some(transition) => {
                metrics.increment_transitions();
                tracing::info!(
                    "{} Market transition: {} → {} (open: {})",
                    transition.to.emoji(),
                    transition.from.display_name(),
                    transition.to.display_name(),
                    transition.snapshot.is_open
                );

                bus.publish(MarketplaceEvent::MarketChanged {
                    from: transition.from,
                    to: transition.to,
                    timestamp,
                });
                bus.notify(transition.notification());
            }
            None => {
                tracing::debug!(
                    "Market tick: {} at {}",
                    observation.snapshot.state_label(),
                    format_clock(&observation.snapshot.sampled_at)
                );
            }
        }

        if observation.availability_changed {
            bus.publish(MarketplaceEvent::AvailabilityChanged {
                market_type: observation.snapshot.market_type,
                is_open: observation.snapshot.is_open,
                timestamp,
            });
        }

        observation
    }

    pub async fn snapshot(&self) -> MarketSnapshot {
        self.state.read().await.tracker.current().clone()
    }

    pub async fn current_market(&self) -> MarketType {
        self.state.read().await.tracker.current().market_type
    }

    pub async fn is_market_open(&self) -> bool {
        self.state.read().await.tracker.current().is_open
    }

    pub async fn theme(&self) -> Theme {
        self.state.read().await.theme
    }

    pub async fn current_time(&self) -> DateTime<FixedOffset> {
        self.state.read().await.tracker.current().sampled_at
    }

    pub async fn set_market(&self, market: MarketType) {
        let mut state = self.state.write().await;
        state.tracker.override_market(market);
        state.theme = Theme::for_market(market);
        tracing::info!("🎨 Market display set to {}", market.display_name());
    }

    pub async fn toggle_market(&self) -> MarketType {
        let next = self.current_market().await.toggled();
        self.set_market(next).await;
        next
    }
}

impl Drop for MarketClock {
    fn drop(&mut self) {
        if let Ok(task) = self.task.get_mut() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    // 2024-03-15 is a Friday
    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        ist().with_ymd_and_hms(2024, 3, 15, hour, minute, 0).unwrap()
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<MarketplaceEvent>) -> Vec<MarketplaceEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        events
    }

    fn notifications(events: &[MarketplaceEvent]) -> Vec<Notification> {
        events
            .iter()
            .filter_map(|e| match e {
                MarketplaceEvent::Notify(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sample_every_hour() {
        for hour in 0..24 {
            for minute in [0, 30, 59] {
                let snapshot = sample(&at(hour, minute));
                match hour {
                    8..=19 => {
                        assert_eq!(snapshot.market_type, MarketType::Day, "hour {}", hour);
                        assert!(snapshot.is_open, "hour {}", hour);
                    }
                    20..=23 | 0..=5 => {
                        assert_eq!(snapshot.market_type, MarketType::Night, "hour {}", hour);
                        assert!(snapshot.is_open, "hour {}", hour);
                    }
                    _ => {
                        assert_eq!(snapshot.market_type, MarketType::Day, "hour {}", hour);
                        assert!(!snapshot.is_open, "hour {}", hour);
                    }
                }
            }
        }
    }

    #[test]
    fn test_sample_uses_timestamp_zone() {
        // 14:45 UTC is 20:15 in IST
        let utc = Utc.with_ymd_and_hms(2024, 3, 15, 14, 45, 0).unwrap();
        assert_eq!(sample(&utc).market_type, MarketType::Day);
        assert_eq!(sample(&utc.with_timezone(&ist())).market_type, MarketType::Night);
    }

    #[test]
    fn test_tracker_fires_once_per_crossing() {
        let mut tracker = MarketTracker::new(sample(&at(19, 58)));

        assert!(tracker.observe(sample(&at(19, 59))).transition.is_none());

        let crossing = tracker.observe(sample(&at(20, 0)));
        let transition = crossing.transition.expect("day -> night");
        assert_eq!(transition.from, MarketType::Day);
        assert_eq!(transition.to, MarketType::Night);
        assert_eq!(transition.notification().title, "NightMarket is now open!");
        assert!(!crossing.availability_changed);

        for minute in 1..60 {
            assert!(tracker.observe(sample(&at(20, minute))).transition.is_none());
        }
    }

    #[test]
    fn test_tracker_buffer_window() {
        let mut tracker = MarketTracker::new(sample(&at(5, 59)));

        let closing = tracker.observe(sample(&at(6, 0)));
        let transition = closing.transition.expect("night -> day buffer");
        assert_eq!(transition.to, MarketType::Day);
        assert!(!transition.snapshot.is_open);
        assert_eq!(transition.notification().title, "DayMarket is now open!");
        assert!(closing.availability_changed);

        assert!(tracker.observe(sample(&at(7, 30))).transition.is_none());

        let opening = tracker.observe(sample(&at(8, 0)));
        assert!(opening.transition.is_none());
        assert!(opening.availability_changed);
        assert!(opening.snapshot.is_open);
    }

    #[tokio::test]
    async fn test_early_morning_crossing_announces_day_market() {
        let source = Arc::new(ManualTimeSource::new(at(5, 59)));
        let bus = Arc::new(EventBus::new(16));
        let mut rx = bus.subscribe();
        let clock = MarketClock::new(
            source.clone(),
            bus,
            Arc::new(MarketplaceMetrics::new()),
            Duration::from_secs(60),
        );

        source.set(at(6, 0));
        let observation = clock.refresh().await;
        assert!(!observation.snapshot.is_open);

        let events = drain(&mut rx);
        let toasts = notifications(&events);
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].title, "DayMarket is now open!");
        assert_eq!(toasts[0].description, "Campus-wide trading is now available.");
        assert!(events.iter().any(|e| matches!(
            e,
            MarketplaceEvent::AvailabilityChanged { market_type: MarketType::Day, is_open: false, .. }
        )));
        assert!(!clock.is_market_open().await);
    }

    #[test]
    fn test_override_is_rederived_on_next_observation() {
        let mut tracker = MarketTracker::new(sample(&at(10, 0)));
        tracker.override_market(MarketType::Night);
        assert_eq!(tracker.current().market_type, MarketType::Night);

        let observation = tracker.observe(sample(&at(10, 1)));
        let transition = observation.transition.expect("override snaps back");
        assert_eq!(transition.from, MarketType::Night);
        assert_eq!(transition.to, MarketType::Day);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(&at(20, 5)), "Friday, 8:05 PM");
        assert_eq!(format_clock(&at(9, 30)), "Friday, 9:30 AM");
    }

    #[tokio::test]
    async fn test_clock_samples_eagerly() {
        let mut source = MockTimeSource::new();
        source.expect_now().times(1).returning(|| at(10, 0));

        let clock = MarketClock::new(
            Arc::new(source),
            Arc::new(EventBus::new(16)),
            Arc::new(MarketplaceMetrics::new()),
            Duration::from_secs(60),
        );

        let snapshot = clock.snapshot().await;
        assert_eq!(snapshot.market_type, MarketType::Day);
        assert!(snapshot.is_open);
        assert_eq!(clock.theme().await, Theme::Light);
        assert!(!clock.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_transition_notifies_once() {
        let source = Arc::new(ManualTimeSource::new(at(19, 58)));
        let bus = Arc::new(EventBus::new(64));
        let metrics = Arc::new(MarketplaceMetrics::new());
        let mut rx = bus.subscribe();

        let clock = MarketClock::new(source.clone(), bus.clone(), metrics.clone(), Duration::from_secs(60));
        clock.start();
        assert!(clock.is_running());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(drain(&mut rx).is_empty());

        source.set(at(20, 0));
        tokio::time::sleep(Duration::from_secs(60)).await;
        let events = drain(&mut rx);
        let toasts = notifications(&events);
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].title, "NightMarket is now open!");
        assert_eq!(clock.theme().await, Theme::Dark);

        source.set(at(20, 30));
        tokio::time::sleep(Duration::from_secs(180)).await;
        assert!(notifications(&drain(&mut rx)).is_empty());
        assert_eq!(metrics.get_transitions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_deregisters_timer() {
        let source = Arc::new(ManualTimeSource::new(at(19, 59)));
        let bus = Arc::new(EventBus::new(64));
        let metrics = Arc::new(MarketplaceMetrics::new());
        let mut rx = bus.subscribe();

        let clock = MarketClock::new(source.clone(), bus, metrics.clone(), Duration::from_secs(60));
        clock.start();
        clock.stop();
        assert!(!clock.is_running());

        source.set(at(21, 0));
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert!(drain(&mut rx).is_empty());
        assert_eq!(metrics.get_clock_ticks(), 1); // only the eager sample
        assert_eq!(clock.current_market().await, MarketType::Day);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_mid_buffer() {
        let source = Arc::new(ManualTimeSource::new(at(7, 0)));
        let bus = Arc::new(EventBus::new(64));
        let mut rx = bus.subscribe();

        let clock = MarketClock::new(
            source.clone(),
            bus,
            Arc::new(MarketplaceMetrics::new()),
            Duration::from_secs(60),
        );
        assert!(!clock.is_market_open().await);
        assert_eq!(clock.current_market().await, MarketType::Day);
        clock.start();

        source.set(at(8, 0));
        tokio::time::sleep(Duration::from_secs(61)).await;

        let events = drain(&mut rx);
        assert!(notifications(&events).is_empty());
        assert!(events.iter().any(|e| matches!(
            e,
            MarketplaceEvent::AvailabilityChanged { is_open: true, .. }
        )));
        assert!(clock.is_market_open().await);
    }

    #[tokio::test]
    async fn test_toggle_market() {
        let clock = MarketClock::new(
            Arc::new(ManualTimeSource::new(at(12, 0))),
            Arc::new(EventBus::new(16)),
            Arc::new(MarketplaceMetrics::new()),
            Duration::from_secs(60),
        );

        assert_eq!(clock.toggle_market().await, MarketType::Night);
        assert_eq!(clock.theme().await, Theme::Dark);

        let observation = clock.refresh().await;
        assert!(observation.transition.is_some());
        assert_eq!(clock.current_market().await, MarketType::Day);
    }
}
