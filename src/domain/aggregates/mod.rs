//! Aggregates module
pub mod shop;
pub mod product;
pub mod variation;
pub mod master;
pub mod import_batch;
pub mod schedule;

pub use shop::Shop;
pub use product::{Product, ProductFields, ProductUpsert};
pub use variation::{Variation, VariationFields, VariationUpsert};
pub use master::{ListingFields, ListingUpsert, MasterProduct, MasterUpsert, ShopListing};
pub use import_batch::{BatchCounters, BatchErrorEntry, BatchRecord, BatchStateError, ImportBatch, CANCELLED_BY_USER};
pub use schedule::SyncSchedule;
