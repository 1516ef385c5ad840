//! Termination signals -> cancellation token
//!
//! The handler only trips an atomic flag; the pipeline's wait primitive
//! polls it, so shutdown latency stays bounded even without a wake-up.

use std::sync::OnceLock;

use relay_shm::CancelToken;

static CANCEL: OnceLock<CancelToken> = OnceLock::new();

extern "C" fn handle_signal(_signum: libc::c_int) {
    if let Some(cancel) = CANCEL.get() {
        cancel.cancel();
    }
}

/// Route SIGINT and SIGTERM to the given token. Installs at most once;
/// later calls are ignored.
pub fn install(cancel: &CancelToken) {
    if CANCEL.set(cancel.clone()).is_err() {
        return;
    }
    let handler = handle_signal as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}
