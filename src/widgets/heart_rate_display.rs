use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};

use crate::app::App;
use crate::widgets::heart_rate::charts::{render_combined_chart, ChartStyle};
use crate::widgets::heart_rate::tables::render_table;

// Two table rows plus borders
const TABLE_HEIGHT: u16 = 4;

/// Latest readings on top, the chart of the current frame below.
pub fn heart_rate_display(app: &mut App, f: &mut Frame) {
    let (chart_constraint, rest) = match app.settings.tui.chart_height {
        0 => (Constraint::Fill(1), Constraint::Length(0)),
        height => (Constraint::Length(height), Constraint::Fill(1)),
    };
    let [table_area, chart_area, _] = Layout::vertical([
        Constraint::Length(TABLE_HEIGHT),
        chart_constraint,
        rest,
    ])
    .areas(f.area());

    render_table(f, table_area, app);

    let frame = app.frame();
    let style = ChartStyle {
        heart_rate_color: app.settings.tui.heart_rate_color(),
        hrv_color: app.settings.tui.hrv_color(),
    };
    render_combined_chart(
        f,
        chart_area,
        &frame,
        app.display.visible_samples(),
        style,
    );
}
