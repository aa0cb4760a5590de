//! Static analyses: node intervals and register liveness

pub mod liveness;
pub mod range;

pub use liveness::{live_at_exit, live_before, RegisterSet};
pub use range::{analyze, transfer, Range, RangeAnalyzer, RangeTable};
