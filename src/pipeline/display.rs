/// Terminal size as last reported, plus the columns reserved for chart chrome.
///
/// Owned by the app and updated from resize events. Selection reads it fresh on
/// every draw, so a resize takes effect without waiting for a new notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub width: u16,
    pub height: u16,
    pub padding: u16,
}

impl DisplayConfig {
    pub fn new(width: u16, height: u16, padding: u16) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// How many samples fit across the chart.
    pub fn visible_samples(&self) -> usize {
        usize::from(self.width.saturating_sub(self.padding))
    }
}

/// Returns the trailing part of `history` that fits in `width - padding` columns,
/// or all of it if it already fits.
pub fn select<T>(history: &[T], width: u16, padding: u16) -> &[T] {
    let len = history.len().min(usize::from(width.saturating_sub(padding)));
    &history[history.len() - len..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_is_unchanged() {
        let history: Vec<u32> = (0..50).collect();
        assert_eq!(select(&history, 100, 20), history.as_slice());
        assert_eq!(select(&history, 70, 20), history.as_slice());
    }

    #[test]
    fn long_history_is_trimmed_to_the_tail() {
        let history: Vec<u32> = (0..500).collect();
        let selected = select(&history, 100, 20);
        assert_eq!(selected.len(), 80);
        assert_eq!(selected, &history[420..]);
    }

    #[test]
    fn resize_changes_next_selection() {
        let history: Vec<u32> = (0..500).collect();
        let mut display = DisplayConfig::new(100, 40, 20);
        assert_eq!(
            select(&history, display.width, display.padding),
            &history[420..]
        );
        display.resize(60, 40);
        let selected = select(&history, display.width, display.padding);
        assert_eq!(selected.len(), 40);
        assert_eq!(selected, &history[460..]);
    }

    #[test]
    fn padding_wider_than_terminal() {
        let history = [1, 2, 3];
        assert!(select(&history, 10, 20).is_empty());
        assert_eq!(DisplayConfig::new(10, 5, 20).visible_samples(), 0);
    }

    #[test]
    fn empty_history() {
        let history: [f64; 0] = [];
        assert!(select(&history, 100, 20).is_empty());
    }
}
