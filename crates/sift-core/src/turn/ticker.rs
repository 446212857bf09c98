//! Timed unit streaming for simulated turns.
//!
//! The ticker turns a finished string into a character-by-character stream,
//! emitting the accumulation so far after each unit. Cancellation is checked
//! before every timed resumption, so a cancelled stream never emits again.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless cancelled first.
///
/// Returns `false` if the token fired before the sleep finished. A zero
/// duration still checks the token but never yields to the timer.
pub async fn delay(duration: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

/// Streams `full` one character at a time at the given cadence.
///
/// `emit` receives the accumulated prefix after each character, so the last
/// emission (when not cancelled) equals `full`. A zero cadence degenerates
/// to emitting every prefix without yielding to the timer.
///
/// Returns `false` if cancelled; nothing is emitted after cancellation.
pub async fn stream_text(
    full: &str,
    cadence: Duration,
    cancel: &CancellationToken,
    mut emit: impl FnMut(&str),
) -> bool {
    let mut upto = 0;
    for ch in full.chars() {
        if cancel.is_cancelled() {
            return false;
        }
        upto += ch.len_utf8();
        emit(&full[..upto]);
        if !delay(cadence, cancel).await {
            return false;
        }
    }
    true
}
