pub mod charts;
pub mod tables;
