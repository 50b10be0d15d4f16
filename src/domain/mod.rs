// Domain layer - Pure data and conversions, no I/O
pub mod dashboard;
pub mod device;
pub mod target;
pub mod telemetry;
pub mod unit;
