//! Pure domain logic for the order platform.
//!
//! No I/O and no storage access: the fraud evaluator and the tracking
//! number generator are plain functions the coordinator composes with the
//! storage layer.

pub mod fraud;
pub mod tracking;

pub use fraud::{FraudVerdict, HistorySnapshot, LineProfile, OrderProfile, evaluate};
pub use tracking::{generate_tracking_number, tracking_number_at};
