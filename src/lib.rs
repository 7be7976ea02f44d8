pub mod aggregator;
pub mod api;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod sources;
pub mod store;
pub mod sync;

pub mod util {
    pub mod env;
}
