use crossterm::cursor::MoveToColumn;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{stderr, Write};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::signal::{OverlayKind, OverlayState};

/// Draw the overlay as a single status line on stderr.
///
/// The task ends when every `OverlaySignal` handle has been dropped.
pub fn spawn_renderer(mut rx: watch::Receiver<OverlayState>) -> JoinHandle<()> {
  tokio::spawn(async move {
    while rx.changed().await.is_ok() {
      let state = rx.borrow_and_update().clone();
      // Best effort: a broken stderr shouldn't take the app down
      if let Err(e) = draw(&state) {
        debug!(error = %e, "failed to draw overlay");
      }
    }
  })
}

fn draw(state: &OverlayState) -> std::io::Result<()> {
  let mut out = stderr();
  out.queue(MoveToColumn(0))?;
  out.queue(Clear(ClearType::CurrentLine))?;

  if state.visible {
    let (color, label) = match state.kind {
      OverlayKind::Loading => (Color::Yellow, "…"),
      OverlayKind::Success => (Color::Green, "✓"),
      OverlayKind::Error => (Color::Red, "✗"),
    };
    out.queue(SetForegroundColor(color))?;
    out.queue(Print(format!("{} ", label)))?;
    out.queue(ResetColor)?;
    out.queue(Print(&state.message))?;

    // Loading stays on one line and gets overwritten; outcomes are kept
    if state.kind != OverlayKind::Loading {
      out.queue(Print("\n"))?;
    }
  }

  out.flush()
}
