use crate::app::App;
use crate::AppResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use tracing::debug;

/// Handles the key events and updates the state of [`App`].
pub fn handle_key_events(app: &mut App, key_event: KeyEvent) -> AppResult<()> {
    match key_event.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            debug!("Quit requested");
            app.cancel_app.cancel();
        }
        KeyCode::Char('c') | KeyCode::Char('C') if key_event.modifiers == KeyModifiers::CONTROL => {
            app.cancel_app.cancel();
        }
        KeyCode::Enter => {
            app.dismiss_error();
        }
        _ => {}
    }
    Ok(())
}
