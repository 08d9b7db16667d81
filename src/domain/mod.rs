//! Catalog domain: mirror entities, import bookkeeping and their value objects.
pub mod aggregates;
pub mod attachments;
pub mod events;
pub mod value_objects;
