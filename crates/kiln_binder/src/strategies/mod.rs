//! Built-in binder strategies.

mod bucket;
mod database;
mod queue;
mod table;

pub use bucket::BucketBinderStrategy;
pub use database::DatabaseBinderStrategy;
pub use queue::QueueBinderStrategy;
pub use table::TableBinderStrategy;
