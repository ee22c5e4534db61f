pub mod interval;
pub mod meter;
