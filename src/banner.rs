use crossterm::style::Stylize;

pub const BAR: char = '\u{2588}';
pub const HEART: char = '\u{2665}';

/// One line of text output: a bar as long as the heart rate (capped at
/// `max_bar_width`), then the reading in red and the current HRV.
pub fn banner_line(bpm: u16, hrv: f64, max_bar_width: usize) -> String {
    let bar: String = std::iter::repeat(BAR)
        .take(usize::from(bpm).min(max_bar_width))
        .collect();
    let reading = format!("{bpm} bpm {HEART}").red();
    format!("{bar} {reading} HRV {hrv:.1}")
}
