use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    symbols,
    widgets::{Axis, Block, Chart, Dataset, GraphType},
    Frame,
};

use crate::pipeline::DisplayFrame;

/// Series colors, from the `[tui]` settings.
#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub heart_rate_color: Color,
    pub hrv_color: Color,
}

/// Heart rate and HRV on one shared axis, newest sample on the right.
pub fn render_combined_chart(
    f: &mut Frame,
    area: Rect,
    frame: &DisplayFrame,
    visible_samples: usize,
    style: ChartStyle,
) {
    let datasets = vec![
        Dataset::default()
            .name("HRV")
            .graph_type(GraphType::Line)
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style.hrv_color))
            .data(&frame.hrv),
        Dataset::default()
            .name("BPM")
            .graph_type(GraphType::Line)
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style.heart_rate_color))
            .data(&frame.heart_rate),
    ];

    let [low, high] = y_bounds(frame);
    let labels = vec![
        format!("{low:.0}").bold(),
        format!("{:.0}", (low + high) / 2.0).into(),
        format!("{high:.0}").bold(),
    ];

    let chart = Chart::new(datasets)
        .block(Block::bordered().title("Heart Rate / HRV".cyan().bold()))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, visible_samples.saturating_sub(1).max(1) as f64]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .labels(labels)
                .bounds([low, high]),
        );
    f.render_widget(chart, area);
}

/// Covers both series with a little headroom, always including zero.
fn y_bounds(frame: &DisplayFrame) -> [f64; 2] {
    let (low, high) = frame
        .heart_rate
        .iter()
        .chain(frame.hrv.iter())
        .fold((0.0f64, 0.0f64), |(low, high), &(_, y)| (low.min(y), high.max(y)));
    [low.floor(), (high + high / 10.0).max(10.0).ceil()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_both_series() {
        let frame = DisplayFrame {
            heart_rate: vec![(0.0, 60.0), (1.0, 100.0)],
            hrv: vec![(0.0, 0.0), (1.0, 35.5)],
        };
        assert_eq!(y_bounds(&frame), [0.0, 110.0]);
    }

    #[test]
    fn empty_frame_has_usable_bounds() {
        assert_eq!(y_bounds(&DisplayFrame::default()), [0.0, 10.0]);
    }
}
