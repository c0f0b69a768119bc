//! Debounced button channels.
//!
//! Each mode button is an active-low input whose falling edge wakes a small
//! edge task. That task calls [`ButtonChannel::on_edge`]; the main loop calls
//! [`ButtonChannel::consume`] once per iteration. The two sides only share
//! two atomics, so channels can live in `static`s without a lock.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// One debounced physical input line.
pub struct ButtonChannel {
    /// Set by the edge context, cleared by the main loop
    pending: AtomicBool,
    /// Uptime (ms, wrapping) of the last accepted edge
    last_accepted_ms: AtomicU32,
    window_ms: u32,
}

impl ButtonChannel {
    /// Create a channel that accepts at most one edge per `window_ms`.
    pub const fn new(window_ms: u32) -> Self {
        Self {
            pending: AtomicBool::new(false),
            last_accepted_ms: AtomicU32::new(0),
            window_ms,
        }
    }

    /// Record a falling edge seen at `now_ms`.
    ///
    /// The edge is accepted only if more than the debounce window has passed
    /// since the last accepted one; otherwise this is a no-op. Returns whether
    /// the edge was accepted.
    ///
    /// Must only be called from a single edge context per channel.
    pub fn on_edge(&self, now_ms: u32) -> bool {
        let last = self.last_accepted_ms.load(Ordering::Relaxed);
        if now_ms.wrapping_sub(last) <= self.window_ms {
            return false;
        }
        self.last_accepted_ms.store(now_ms, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Read and clear the pending flag in one step.
    pub fn consume(&self) -> bool {
        self.pending.swap(false, Ordering::Acquire)
    }
}

/// The two mode buttons, in the order the main loop consumes them.
#[derive(Clone, Copy)]
pub struct ModeButtons<'a> {
    /// Advances the host-interface (USB) axis
    pub host: &'a ButtonChannel,
    /// Advances the downstream-bridge (UART) axis
    pub downstream: &'a ButtonChannel,
}
