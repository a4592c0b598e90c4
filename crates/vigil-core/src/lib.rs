//! Core types: object handles, time periods, tracing setup

pub mod ids;
pub mod timeperiod;
pub mod tracing;

pub use ids::{IdAllocator, ObjectId};
pub use timeperiod::{DayRange, TimePeriod, is_time_in_period, next_valid_time};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
