use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::{app::App, heart_rate::BatteryLevel};

use ratatui_macros::line;

pub fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let heart_rate_status = &app.heart_rate_status;

    let headers = vec![
        line!["Heart Rate"],
        line!["RR (sec)"],
        line!["HRV"],
        line!["Battery Level"],
        line!["Monitor"],
    ];

    let battery_string: String = match heart_rate_status.battery_level {
        BatteryLevel::Unknown => "???".into(),
        BatteryLevel::NotReported => "N/A".into(),
        BatteryLevel::Level(level) => format!("{level}%"),
    };

    let battery_style = match heart_rate_status.battery_level {
        BatteryLevel::Unknown => Style::default().fg(Color::Red),
        BatteryLevel::NotReported => Style::default().fg(Color::Yellow),
        BatteryLevel::Level(level) => Style::default().fg(match level {
            0..=29 => Color::Red,
            30..=59 => Color::Yellow,
            60..=79 => Color::LightGreen,
            _ => Color::Green,
        }),
    };

    let rr_string = format!(
        "{:.3?}",
        heart_rate_status
            .rr_intervals
            .iter()
            .map(|rr| rr.as_secs_f32())
            .collect::<Vec<f32>>()
    );

    let heart_style = match heart_rate_status.sensor_contact {
        Some(false) => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(app.settings.tui.heart_rate_color()),
    };

    let content = vec![
        Cell::from(format!("{} bpm \u{2665}", heart_rate_status.heart_rate_bpm)).style(heart_style),
        Cell::from(rr_string),
        Cell::from(format!("{:.1}", heart_rate_status.hrv))
            .style(Style::default().fg(app.settings.tui.hrv_color())),
        Cell::from(battery_string).style(battery_style),
        Cell::from(app.device_name.clone().unwrap_or_else(|| "---".into())),
    ];

    let constraints = vec![
        Constraint::Length(15),
        Constraint::Length(20),
        Constraint::Length(10),
        Constraint::Length(15),
        Constraint::Fill(1),
    ];

    let rows = vec![
        Row::new(headers).style(Style::default().add_modifier(Modifier::BOLD)),
        Row::new(content),
    ];

    let table = Table::new(rows, constraints).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Most Recent Data")
            .border_style(Style::default().fg(Color::Yellow)),
    );

    f.render_widget(table, area);
}
