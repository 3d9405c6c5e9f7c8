//! Statistics and range math.

pub mod range;
pub mod statistics;
pub mod synthetic;

pub use range::{DynamicRangeCalculator, RangeEstimate};
pub use statistics::StdDevKind;
