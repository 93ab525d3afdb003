pub mod heart_rate;
pub mod heart_rate_display;
