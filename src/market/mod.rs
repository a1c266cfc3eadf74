pub mod clock;

pub use clock::{
    format_clock, sample, ManualTimeSource, MarketClock, MarketTracker, MarketTransition,
    Observation, SystemTimeSource, TimeSource,
};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two mutually exclusive catalog partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    Day,
    Night,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Day => "day",
            MarketType::Night => "night",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MarketType::Day => "DayMarket",
            MarketType::Night => "NightMarket",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            MarketType::Day => MarketType::Night,
            MarketType::Night => MarketType::Day,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            MarketType::Day => "☀️",
            MarketType::Night => "🌙",
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual theme flag. Night renders dark, nothing else hangs off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn for_market(market: MarketType) -> Self {
        match market {
            MarketType::Day => Theme::Light,
            MarketType::Night => Theme::Dark,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_type: MarketType,
    pub is_open: bool,
    pub sampled_at: DateTime<FixedOffset>,
}

impl MarketSnapshot {
    pub fn is_day_market(&self) -> bool {
        self.market_type == MarketType::Day
    }

    pub fn is_night_market(&self) -> bool {
        self.market_type == MarketType::Night
    }

    /// Day-Open, Night-Open or Day-Closed.
    pub fn state_label(&self) -> &'static str {
        match (self.market_type, self.is_open) {
            (MarketType::Day, true) => "day-open",
            (MarketType::Night, true) => "night-open",
            (MarketType::Day, false) => "day-closed",
            (MarketType::Night, false) => "night-closed",
        }
    }
}
