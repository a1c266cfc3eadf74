pub mod catalog;
pub mod filter;
pub mod model;

pub use catalog::Catalog;
pub use filter::{apply, FilterSpec, ListingFilterEngine, PredicateReport};
pub use model::{
    BarterOffer, Category, Listing, ListingStatus, Location, OfferStatus, OfferedItem,
};
