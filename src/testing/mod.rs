//! Testing utilities for crabhdr
//!
//! Synthetic brackets and a scripted exposure device for offline tests and
//! benchmarks.

pub mod synthetic_data;

pub use synthetic_data::{solid_frame, synthetic_bracket_frame, SyntheticExposureDevice};
