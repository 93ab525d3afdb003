use ratatui::{
    layout::Alignment,
    style::{Color, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, Source};
use crate::utils::centered_rect;
use crate::widgets::heart_rate_display::heart_rate_display;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Renders the user interface widgets.
pub fn render(app: &mut App, f: &mut Frame) {
    heart_rate_display(app, f);

    match app.state {
        AppState::Connected => {}
        AppState::Scanning | AppState::Reconnecting => {
            let spinner = SPINNER[app.frame_count % SPINNER.len()];
            let mut text = if app.state == AppState::Reconnecting {
                let name = app.device_name.as_deref().unwrap_or("monitor");
                format!("{spinner} Reconnecting to {name}...")
            } else if app.source == Source::Dummy {
                format!("{spinner} Starting dummy monitor...")
            } else {
                format!("{spinner} Finding your heart rate monitor...")
            };
            if let Some(left) = app.time_left_to_connect() {
                text.push_str(&format!("\nGiving up in {}s", left.as_secs()));
            }

            let area = centered_rect(50, 30, f.area());
            let connecting_block = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Green)),
                );
            f.render_widget(Clear, area);
            f.render_widget(connecting_block, area);
        }
    }

    // Draw the error overlay if there's an error
    if let Some(message) = app.error_message.clone() {
        let area = centered_rect(60, 50, f.area());
        let error_block = Paragraph::new(Span::from(message))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("! Notification (Enter to dismiss) !")
                    .style(Style::default().fg(Color::Red)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(error_block, area);
    }
}
