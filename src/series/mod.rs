//! Time-series normalization: raw sample decoding and tariff classification.

pub mod tariff;
pub mod transform;

pub use tariff::classify;
pub use transform::{bucket_step, transform};
