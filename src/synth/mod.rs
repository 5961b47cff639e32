// Purpose: voice management and realtime rendering
// The pool decides which notes sound; the backend/renderer pair makes them audible

pub mod backend;
pub mod message;
pub mod pool;
#[cfg(feature = "rtrb")]
pub mod render;
pub mod voice;

pub use backend::{AudioBackend, VoiceHandle};
pub use pool::{FrequencyKey, VoicePool};

#[cfg(feature = "rtrb")]
pub use backend::RingBackend;
#[cfg(feature = "rtrb")]
pub use render::Renderer;

#[cfg(feature = "rtrb")]
use crate::config::EngineConfig;

/// Queue depth for control messages.
pub const MESSAGE_CAPACITY: usize = 1024;
/// Tap ring capacity in samples; the UI must drain it faster than this fills.
pub const TAP_CAPACITY: usize = 1 << 15;

/// Build a connected control/audio pair for `sample_rate`.
///
/// The [`RingBackend`] stays on the control thread; the [`Renderer`] moves
/// into the audio callback.
#[cfg(feature = "rtrb")]
pub fn channel(config: &EngineConfig, sample_rate: f32) -> (RingBackend, Renderer) {
    let (tx, rx) = rtrb::RingBuffer::new(MESSAGE_CAPACITY);
    let (tap_tx, tap_rx) = rtrb::RingBuffer::new(TAP_CAPACITY.max(config.scope_window));
    // At most one table comes back per message, and the backend empties this
    // ring before every send.
    let (retired_tx, retired_rx) = rtrb::RingBuffer::new(MESSAGE_CAPACITY);

    let backend = RingBackend::new(
        tx,
        tap_rx,
        retired_rx,
        config.scope_window,
        sample_rate,
        config.display_frequency,
    );
    let renderer = Renderer::new(
        rx,
        tap_tx,
        retired_tx,
        sample_rate,
        config.max_voices,
        config.display_frequency,
        config.scope_source,
    );
    (backend, renderer)
}
