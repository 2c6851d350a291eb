pub mod aggregate;
pub mod interval;
pub mod meter_split;
pub mod request_range;
pub mod usage_report;
