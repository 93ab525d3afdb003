use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::errors::AppError;

/// Terminal events.
#[derive(Clone, Copy, Debug)]
pub enum Event {
    /// Terminal tick.
    Tick,
    /// Key press.
    Key(KeyEvent),
    /// Terminal resize, new columns and rows.
    Resize(u16, u16),
}

/// Terminal event handler.
#[derive(Debug)]
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
    cancel_token: CancellationToken,
}

impl EventHandler {
    /// Spawns the reader task, emitting a [`Event::Tick`] every `tick_rate` ms.
    pub fn new(tick_rate: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate);
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut tick = tokio::time::interval(tick_rate);
            loop {
                let tick_delay = tick.tick();
                let crossterm_event = reader.next().fuse();
                let event = tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = tick_delay => Event::Tick,
                    Some(Ok(evt)) = crossterm_event => {
                        match evt {
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
                            CrosstermEvent::Resize(columns, rows) => {
                                debug!("Terminal resized to {columns}x{rows}");
                                Event::Resize(columns, rows)
                            }
                            _ => continue,
                        }
                    }
                };
                if sender.send(event).is_err() {
                    error!("Terminal event receiver dropped");
                    break;
                }
            }
        });
        Self {
            receiver,
            cancel_token,
        }
    }

    /// Receive the next event from the handler task.
    pub async fn next(&mut self) -> Result<Event, AppError> {
        self.receiver
            .recv()
            .await
            .ok_or(AppError::EventChannelClosed)
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
