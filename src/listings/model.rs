use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::market::MarketType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    // Day
    Books,
    Electronics,
    Bicycles,
    Furniture,
    Accessories,
    // Night
    Snacks,
    Chargers,
    Stationery,
    Notes,
    Medicine,
}

const DAY_CATEGORIES: [Category; 5] = [
    Category::Books,
    Category::Electronics,
    Category::Bicycles,
    Category::Furniture,
    Category::Accessories,
];

const NIGHT_CATEGORIES: [Category; 5] = [
    Category::Snacks,
    Category::Chargers,
    Category::Stationery,
    Category::Notes,
    Category::Medicine,
];

impl Category {
    pub fn for_market(market: MarketType) -> &'static [Category] {
        match market {
            MarketType::Day => &DAY_CATEGORIES,
            MarketType::Night => &NIGHT_CATEGORIES,
        }
    }

    pub fn market(&self) -> MarketType {
        if DAY_CATEGORIES.contains(self) {
            MarketType::Day
        } else {
            MarketType::Night
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Books => "books",
            Category::Electronics => "electronics",
            Category::Bicycles => "bicycles",
            Category::Furniture => "furniture",
            Category::Accessories => "accessories",
            Category::Snacks => "snacks",
            Category::Chargers => "chargers",
            Category::Stationery => "stationery",
            Category::Notes => "notes",
            Category::Medicine => "medicine",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    // Day
    Library,
    Canteen,
    HostelLounge,
    AcademicBlock,
    // Night, hostel-restricted
    HostelJ,
    HostelK,
    HostelL,
    HostelM,
    HostelN,
}

const DAY_LOCATIONS: [Location; 4] = [
    Location::Library,
    Location::Canteen,
    Location::HostelLounge,
    Location::AcademicBlock,
];

const NIGHT_LOCATIONS: [Location; 5] = [
    Location::HostelJ,
    Location::HostelK,
    Location::HostelL,
    Location::HostelM,
    Location::HostelN,
];

impl Location {
    pub fn for_market(market: MarketType) -> &'static [Location] {
        match market {
            MarketType::Day => &DAY_LOCATIONS,
            MarketType::Night => &NIGHT_LOCATIONS,
        }
    }

    pub fn market(&self) -> MarketType {
        if DAY_LOCATIONS.contains(self) {
            MarketType::Day
        } else {
            MarketType::Night
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Library => "library",
            Location::Canteen => "canteen",
            Location::HostelLounge => "hostel_lounge",
            Location::AcademicBlock => "academic_block",
            Location::HostelJ => "hostel_j",
            Location::HostelK => "hostel_k",
            Location::HostelL => "hostel_l",
            Location::HostelM => "hostel_m",
            Location::HostelN => "hostel_n",
        }
    }

    /// "hostel_j" -> "hostel j"
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Pending,
    Sold,
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub images: Vec<String>,
    pub seller_id: String,
    pub seller_name: String,
    pub seller_reputation: f64, // 0.0 - 5.0
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ListingStatus,
    pub location: Location,
    pub market_type: MarketType,
    pub barter_enabled: bool,
    pub tags: Vec<String>,
}

impl Listing {
    /// Category and location both belong to the listing's own market.
    pub fn is_consistent(&self) -> bool {
        self.category.market() == self.market_type && self.location.market() == self.market_type
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferedItem {
    pub description: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarterOffer {
    pub id: String,
    pub listing_id: Option<String>,
    pub buyer_id: String,
    pub buyer_name: String,
    pub offered_items: Vec<OfferedItem>,
    pub offered_money: f64,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_partitions_are_disjoint() {
        for category in Category::for_market(MarketType::Day) {
            assert_eq!(category.market(), MarketType::Day);
            assert!(!Category::for_market(MarketType::Night).contains(category));
        }
        for location in Location::for_market(MarketType::Night) {
            assert_eq!(location.market(), MarketType::Night);
        }
        assert_eq!(Location::for_market(MarketType::Day).len(), 4);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Location::HostelLounge).unwrap(), "\"hostel_lounge\"");
        assert_eq!(serde_json::to_string(&Category::Bicycles).unwrap(), "\"bicycles\"");
        assert_eq!(Location::AcademicBlock.label(), "academic block");
        assert_eq!(Location::HostelJ.to_string(), "hostel_j");
    }
}
