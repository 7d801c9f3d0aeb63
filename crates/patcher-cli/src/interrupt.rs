//! Interrupt handling
//!
//! The first interrupt cancels the run so in-flight records finish and the
//! report is still printed. A second one exits immediately.

use patcher_core::CancelToken;
use std::future::Future;
use std::io;

/// Exit status after an interrupt
pub(crate) const EXIT_INTERRUPTED: u8 = 130;

/// Wait for interrupts from `next`, cancel on the first, call `force_exit` on the second
///
/// Returns without forcing if the signal source fails.
pub(crate) async fn watch_interrupts<N, Fut, X>(mut next: N, cancel: CancelToken, force_exit: X)
where
    N: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
    X: FnOnce(),
{
    if let Err(e) = next().await {
        tracing::warn!(error = %e, "unable to listen for interrupts");
        return;
    }
    tracing::warn!("interrupt received, cancelling patch run; interrupt again to exit now");
    cancel.cancel();

    if next().await.is_ok() {
        tracing::error!("second interrupt received, exiting without waiting for in-flight records");
        force_exit();
    }
}

/// Listen for Ctrl-C on the current runtime
pub(crate) fn spawn(cancel: CancelToken) {
    tokio::spawn(watch_interrupts(tokio::signal::ctrl_c, cancel, || {
        std::process::exit(i32::from(EXIT_INTERRUPTED))
    }));
}
