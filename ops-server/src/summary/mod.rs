//! Summary Aggregation

pub mod service;

pub use service::generate;
