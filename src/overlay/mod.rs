//! Process-wide overlay status signal and its terminal renderer.

mod render;
mod signal;

pub use render::spawn_renderer;
pub use signal::{OverlayKind, OverlaySignal, OverlayState};
