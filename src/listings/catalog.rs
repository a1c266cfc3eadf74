use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use uuid::Uuid;

use super::model::{
    BarterOffer, Category, Listing, ListingStatus, Location, OfferStatus, OfferedItem,
};
use crate::market::MarketType;

const FEATURED_LIMIT: usize = 6;

const IMAGE_BASE: &str = "https://images.unsplash.com";
const IMAGE_PARAMS: &str = "?q=80&w=2880&auto=format&fit=crop";

struct Seller {
    id: &'static str,
    name: &'static str,
    reputation: f64,
}

const SELLERS: [Seller; 5] = [
    Seller { id: "1", name: "Arjun Singh", reputation: 4.8 },
    Seller { id: "2", name: "Priya Sharma", reputation: 4.9 },
    Seller { id: "3", name: "Ravi Kumar", reputation: 4.7 },
    Seller { id: "4", name: "Neha Gupta", reputation: 4.5 },
    Seller { id: "5", name: "Vikram Patel", reputation: 4.6 },
];

fn photos(category: Category) -> [&'static str; 3] {
    match category {
        Category::Books => ["photo-1544947950-fa07a98d237f", "photo-1512820790803-83ca734da794", "photo-1543002588-bfa74002ed7e"],
        Category::Electronics => ["photo-1546054454-aa26e2b734c7", "photo-1593642702821-c8da6771f0c6", "photo-1525547719571-a2d4ac8945e2"],
        Category::Bicycles => ["photo-1485965120184-e220f721d03e", "photo-1576435728678-68d0fbf94e91", "photo-1517949908114-71669a64d885"],
        Category::Furniture => ["photo-1555041469-a586c61ea9bc", "photo-1538688525198-9b88f6f53126", "photo-1567016432779-094069958ea5"],
        Category::Accessories => ["photo-1512163143273-bde0e3cc7407", "photo-1575223970966-76ae61ee7838", "photo-1642033658524-1aa550bea53a"],
        Category::Snacks => ["photo-1612559473746-c7d8896d4e32", "photo-1599490659213-e2b9527bd087", "photo-1607958996333-41215c10d088"],
        Category::Chargers => ["photo-1583863032927-a810fa7db3a2", "photo-1601752835158-fc0c86e73471", "photo-1588599376442-3cbf9c67449e"],
        Category::Stationery => ["photo-1565010505224-382cdb214b4c", "photo-1553413077-190c9d3b6691", "photo-1583160247711-5f0e76357f5f"],
        Category::Notes => ["photo-1517842645767-c639042777db", "photo-1606326608606-aa0b62935f2b", "photo-1501504905252-473c47e087f8"],
        Category::Medicine => ["photo-1584308666744-24d5c474f2ae", "photo-1626498247255-97959f924de7", "photo-1599493758267-c6c884c7071f"],
    }
}

fn image_urls(category: Category, count: usize) -> Vec<String> {
    photos(category)
        .iter()
        .take(count)
        .map(|photo| format!("{}/{}{}", IMAGE_BASE, photo, IMAGE_PARAMS))
        .collect()
}

struct Seed {
    title: &'static str,
    description: &'static str,
    price: f64,
    category: Category,
    images: usize,
    seller: usize,
    age_hours: i64,
    updated_hours: i64,
    location: Location,
    barter: bool,
    tags: &'static [&'static str],
}

const DAY_SEEDS: [Seed; 8] = [
    Seed { title: "Data Structures & Algorithms Textbook", description: "Excellent condition, slight highlighting in first 3 chapters. CS 301 textbook, 4th edition.", price: 450.0, category: Category::Books, images: 2, seller: 0, age_hours: 72, updated_hours: 72, location: Location::Library, barter: true, tags: &["textbook", "computer science", "DSA"] },
    Seed { title: "Engineering Mathematics Set (4 books)", description: "Complete set of engineering mathematics books from semesters 1-4. Good condition, no markings.", price: 600.0, category: Category::Books, images: 1, seller: 1, age_hours: 120, updated_hours: 120, location: Location::AcademicBlock, barter: false, tags: &["mathematics", "textbook", "engineering"] },
    Seed { title: "Barely Used Scientific Calculator", description: "Casio FX-991EX, all functions working perfectly. Includes case and manual.", price: 750.0, category: Category::Electronics, images: 2, seller: 2, age_hours: 48, updated_hours: 48, location: Location::Canteen, barter: true, tags: &["calculator", "casio", "engineering"] },
    Seed { title: "Laptop Cooling Pad", description: "Dual fan cooling pad with adjustable height, USB powered, fits up to 15\" laptops.", price: 350.0, category: Category::Electronics, images: 1, seller: 3, age_hours: 24, updated_hours: 24, location: Location::HostelLounge, barter: false, tags: &["laptop", "cooling", "accessories"] },
    Seed { title: "Mountain Bike - Perfect for Campus", description: "Hero Ranger MTB, 21 gears, recently serviced, excellent condition. Includes lock.", price: 3500.0, category: Category::Bicycles, images: 2, seller: 4, age_hours: 168, updated_hours: 144, location: Location::HostelLounge, barter: true, tags: &["bike", "cycle", "transportation"] },
    Seed { title: "Foldable Study Table", description: "Compact wooden study table, foldable for easy storage. Barely used, no scratches.", price: 800.0, category: Category::Furniture, images: 2, seller: 0, age_hours: 96, updated_hours: 96, location: Location::HostelLounge, barter: false, tags: &["furniture", "study", "table"] },
    Seed { title: "Comfortable Bean Bag", description: "Large grey bean bag, refilled recently, washable cover, very comfortable for studying.", price: 650.0, category: Category::Furniture, images: 1, seller: 1, age_hours: 72, updated_hours: 72, location: Location::HostelLounge, barter: true, tags: &["furniture", "bean bag", "comfort"] },
    Seed { title: "Wireless Earbuds", description: "TWS earbuds with charging case, 20hr battery life, water resistant, excellent sound quality.", price: 1200.0, category: Category::Accessories, images: 2, seller: 2, age_hours: 48, updated_hours: 48, location: Location::Canteen, barter: false, tags: &["electronics", "audio", "music"] },
];

const NIGHT_SEEDS: [Seed; 8] = [
    Seed { title: "Instant Noodles Pack (6 Count)", description: "Assorted flavors, expiring in 6 months. Quick midnight snack!", price: 150.0, category: Category::Snacks, images: 1, seller: 0, age_hours: 12, updated_hours: 12, location: Location::HostelJ, barter: true, tags: &["food", "instant", "noodles"] },
    Seed { title: "Variety Chips & Snacks Bundle", description: "Mix of chips, biscuits, and chocolate. Perfect for exam nights!", price: 220.0, category: Category::Snacks, images: 2, seller: 1, age_hours: 5, updated_hours: 5, location: Location::HostelK, barter: false, tags: &["food", "chips", "chocolate"] },
    Seed { title: "Fast Charging Cable (Type-C)", description: "Brand new 1.5m cable with 60W fast charging support. Works with all Type-C devices.", price: 180.0, category: Category::Chargers, images: 1, seller: 2, age_hours: 8, updated_hours: 8, location: Location::HostelL, barter: true, tags: &["electronics", "charging", "cable"] },
    Seed { title: "Universal Power Bank 10000mAh", description: "Reliable power bank with dual output, charges phones up to 3 times. Used but works perfectly.", price: 450.0, category: Category::Chargers, images: 2, seller: 3, age_hours: 3, updated_hours: 3, location: Location::HostelM, barter: false, tags: &["electronics", "power bank", "charging"] },
    Seed { title: "Complete Stationery Pack", description: "Everything you need: pens, pencils, highlighters, sticky notes, and more.", price: 250.0, category: Category::Stationery, images: 2, seller: 4, age_hours: 24, updated_hours: 24, location: Location::HostelN, barter: true, tags: &["stationery", "pens", "study"] },
    Seed { title: "Operating Systems Handwritten Notes", description: "Detailed notes for CS 305, covers entire syllabus with diagrams. Helped me score A+.", price: 150.0, category: Category::Notes, images: 1, seller: 0, age_hours: 6, updated_hours: 6, location: Location::HostelJ, barter: false, tags: &["notes", "CS", "operating systems"] },
    Seed { title: "Circuit Theory Previous Year Questions", description: "Collection of last 5 years questions with solutions. Very helpful for exam preparation.", price: 120.0, category: Category::Notes, images: 2, seller: 1, age_hours: 9, updated_hours: 9, location: Location::HostelK, barter: true, tags: &["notes", "circuit theory", "electrical"] },
    Seed { title: "Basic Cold & Fever Medicines", description: "Assorted tablets for cold, fever, and headache. All within expiry dates.", price: 100.0, category: Category::Medicine, images: 1, seller: 2, age_hours: 4, updated_hours: 4, location: Location::HostelL, barter: false, tags: &["medicine", "cold", "fever"] },
];

impl Seed {
    fn build(&self, market_type: MarketType, now: DateTime<Utc>) -> Listing {
        let seller = &SELLERS[self.seller % SELLERS.len()];
        Listing {
            id: Uuid::new_v4().to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            price: self.price,
            category: self.category,
            images: image_urls(self.category, self.images),
            seller_id: seller.id.to_string(),
            seller_name: seller.name.to_string(),
            seller_reputation: seller.reputation,
            created_at: now - ChronoDuration::hours(self.age_hours),
            updated_at: now - ChronoDuration::hours(self.updated_hours),
            status: ListingStatus::Active,
            location: self.location,
            market_type,
            barter_enabled: self.barter,
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// In-process listing source standing in for `GET listings?market=`.
#[derive(Debug, Clone)]
pub struct Catalog {
    listings: Vec<Listing>,
    barter_offers: Vec<BarterOffer>,
    fetch_latency: Duration,
}

impl Catalog {
    pub fn new(listings: Vec<Listing>, barter_offers: Vec<BarterOffer>) -> Self {
        let inconsistent = listings.iter().filter(|l| !l.is_consistent()).count();
        if inconsistent > 0 {
            tracing::warn!(
                "⚠️  {} listings carry a category or location from the other market",
                inconsistent
            );
        }

        Self {
            listings,
            barter_offers,
            fetch_latency: Duration::ZERO,
        }
    }

    /// Mock data set: day listings first, then night listings.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let listings: Vec<Listing> = DAY_SEEDS
            .iter()
            .map(|seed| seed.build(MarketType::Day, now))
            .chain(NIGHT_SEEDS.iter().map(|seed| seed.build(MarketType::Night, now)))
            .collect();

        let barter_offers = vec![
            BarterOffer {
                id: Uuid::new_v4().to_string(),
                listing_id: Some(listings[0].id.clone()),
                buyer_id: "6".to_string(),
                buyer_name: "Amit Sharma".to_string(),
                offered_items: vec![OfferedItem {
                    description: "Machine Learning textbook in excellent condition".to_string(),
                    images: image_urls(Category::Books, 1),
                }],
                offered_money: 200.0,
                status: OfferStatus::Pending,
                created_at: now - ChronoDuration::hours(12),
            },
            BarterOffer {
                id: Uuid::new_v4().to_string(),
                listing_id: Some(listings[4].id.clone()),
                buyer_id: "7".to_string(),
                buyer_name: "Meera Patel".to_string(),
                offered_items: vec![
                    OfferedItem {
                        description: "Small folding chair, good condition".to_string(),
                        images: image_urls(Category::Furniture, 1),
                    },
                    OfferedItem {
                        description: "Study lamp with adjustable brightness".to_string(),
                        images: vec![],
                    },
                ],
                offered_money: 0.0,
                status: OfferStatus::Pending,
                created_at: now - ChronoDuration::hours(2),
            },
        ];

        tracing::info!(
            "📦 Catalog seeded: {} listings, {} barter offers",
            listings.len(),
            barter_offers.len()
        );

        Self::new(listings, barter_offers)
    }

    pub fn with_fetch_latency(mut self, latency: Duration) -> Self {
        self.fetch_latency = latency;
        self
    }

    pub fn all(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Market partition, catalog order preserved.
    pub fn for_market(&self, market: MarketType) -> Vec<Listing> {
        self.listings
            .iter()
            .filter(|l| l.market_type == market)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn featured(&self, market: MarketType) -> Vec<Listing> {
        self.listings
            .iter()
            .filter(|l| l.market_type == market)
            .take(FEATURED_LIMIT)
            .cloned()
            .collect()
    }

    pub fn barter_offers(&self) -> &[BarterOffer] {
        &self.barter_offers
    }

    pub fn offers_for(&self, listing_id: &str) -> Vec<&BarterOffer> {
        self.barter_offers
            .iter()
            .filter(|o| o.listing_id.as_deref() == Some(listing_id))
            .collect()
    }

    pub async fn fetch_market(&self, market: MarketType) -> Vec<Listing> {
        tokio::time::sleep(self.fetch_latency).await;
        let listings = self.for_market(market);
        tracing::debug!("📥 Fetched {} {} listings", listings.len(), market);
        listings
    }

    pub async fn fetch_listing(&self, id: &str) -> Option<Listing> {
        tokio::time::sleep(self.fetch_latency).await;
        self.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_partition() {
        let catalog = Catalog::seeded(Utc::now());
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.for_market(MarketType::Day).len(), 8);
        assert_eq!(catalog.for_market(MarketType::Night).len(), 8);
        assert!(catalog.all().iter().all(Listing::is_consistent));
    }

    #[test]
    fn test_seeded_ids_unique_and_resolvable() {
        let catalog = Catalog::seeded(Utc::now());
        let mut ids: Vec<_> = catalog.all().iter().map(|l| l.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());

        let first = &catalog.all()[0];
        assert_eq!(catalog.get(&first.id).unwrap().title, first.title);
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_featured_takes_first_six() {
        let catalog = Catalog::seeded(Utc::now());
        let featured = catalog.featured(MarketType::Night);
        assert_eq!(featured.len(), 6);
        assert_eq!(featured[0].title, "Instant Noodles Pack (6 Count)");
    }

    #[test]
    fn test_barter_offers_reference_day_listings() {
        let catalog = Catalog::seeded(Utc::now());
        let dsa = &catalog.all()[0];
        let offers = catalog.offers_for(&dsa.id);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].offered_money, 200.0);

        let bike = &catalog.all()[4];
        assert_eq!(catalog.offers_for(&bike.id)[0].offered_items.len(), 2);
    }

    #[test]
    fn test_inconsistent_listing_is_kept() {
        let mut listing = Catalog::seeded(Utc::now()).all()[0].clone();
        listing.market_type = MarketType::Night;
        assert!(!listing.is_consistent());

        let catalog = Catalog::new(vec![listing], vec![]);
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_waits_for_mock_latency() {
        let catalog = Catalog::seeded(Utc::now()).with_fetch_latency(Duration::from_millis(500));
        let start = tokio::time::Instant::now();

        let night = catalog.fetch_market(MarketType::Night).await;
        assert_eq!(night.len(), 8);
        assert!(start.elapsed() >= Duration::from_millis(500));

        assert!(catalog.fetch_listing("nope").await.is_none());
    }
}
