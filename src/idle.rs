// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Hilum

//! Kiosk idle lifecycle coordinator.
//!
//! Decides, at any instant, whether the kiosk is idle and should return to
//! its home screen. Two independent suppression sources are layered on one
//! timer: an explicit UI pause (modal dialogs, QR display, the login route)
//! and a reference count of in-flight booking API calls. The countdown is
//! armed exactly when no suppression reason is active:
//!
//! ```text
//! armed  <=>  !paused && active_api_calls == 0
//! ```
//!
//! Every mutating call re-evaluates that single predicate, so a `resume()`
//! can never re-arm while a call is outstanding and an `end_api_call()` can
//! never re-arm while the UI holds a pause. Re-arming always cancels the
//! previous countdown; the most recent call wins.
//!
//! The coordinator is an explicit injectable handle rather than a bare
//! module-level global: construct exactly one per kiosk process (it lives in
//! [`crate::state::AppState`]) and clone the handle wherever idle tracking
//! is needed. Clones share state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Countdown before an unattended kiosk returns to the home screen.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(45);

/// Countdown of the secondary "are you still there?" confirmation shown
/// while the idle timer is paused for a QR display.
pub const DEFAULT_KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(120);

type Callback = Arc<dyn Fn() + Send + Sync>;

struct IdleInner {
    paused: bool,
    active_api_calls: u32,
    /// Bumped on every (re)arm so a stale timer task can never fire after a
    /// disarm/re-arm it did not observe.
    epoch: u64,
    timer: Option<CancellationToken>,
    on_timeout: Option<Callback>,
    on_reset: Option<Callback>,
}

/// Shared handle to the kiosk's idle state. Cheap to clone.
#[derive(Clone)]
pub struct IdleCoordinator {
    inner: Arc<Mutex<IdleInner>>,
    timeout: Duration,
}

impl Default for IdleCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl IdleCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(IdleInner {
                paused: false,
                active_api_calls: 0,
                epoch: 0,
                timer: None,
                on_timeout: None,
                on_reset: None,
            })),
            timeout,
        }
    }

    /// Register the timeout hook (typically: navigate to the home route).
    ///
    /// Fires at most once per arm cycle.
    pub fn set_on_timeout(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.lock().on_timeout = Some(Arc::new(callback));
    }

    /// Register the reset hook, invoked on every observed user activity.
    pub fn set_on_reset(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.lock().on_reset = Some(Arc::new(callback));
    }

    /// User activity observed (pointer, key, touch, navigation): invoke the
    /// reset hook, then restart the countdown from the full duration if no
    /// suppression reason is active.
    pub fn reset(&self) {
        let on_reset = self.lock().on_reset.clone();
        if let Some(on_reset) = on_reset {
            on_reset();
        }
        let mut inner = self.lock();
        self.rearm(&mut inner);
    }

    /// Explicit UI hold: disarm the countdown until [`resume`](Self::resume).
    pub fn pause(&self) {
        let mut inner = self.lock();
        inner.paused = true;
        self.rearm(&mut inner);
    }

    /// Release the UI hold. Re-arms only if no API calls are outstanding.
    pub fn resume(&self) {
        let mut inner = self.lock();
        inner.paused = false;
        self.rearm(&mut inner);
    }

    /// A network call is starting: suppress the countdown while it runs.
    ///
    /// This does not set the explicit paused flag; network activity and UI
    /// pauses are independent suppression reasons that compose.
    pub fn start_api_call(&self) {
        let mut inner = self.lock();
        inner.active_api_calls += 1;
        self.rearm(&mut inner);
    }

    /// A network call finished (success or failure). Floors at zero; re-arms
    /// only once no suppression reason remains.
    pub fn end_api_call(&self) {
        let mut inner = self.lock();
        inner.active_api_calls = inner.active_api_calls.saturating_sub(1);
        self.rearm(&mut inner);
    }

    /// RAII variant of [`start_api_call`](Self::start_api_call): the guard's
    /// drop calls `end_api_call`, so a request that errors or panics still
    /// decrements exactly once.
    pub fn track_api_call(&self) -> ApiCallGuard {
        self.start_api_call();
        ApiCallGuard {
            coordinator: self.clone(),
        }
    }

    /// Teardown: cancel any countdown, clear suppression state and hooks.
    pub fn destroy(&self) {
        let mut inner = self.lock();
        if let Some(token) = inner.timer.take() {
            token.cancel();
        }
        inner.epoch += 1;
        inner.paused = false;
        inner.active_api_calls = 0;
        inner.on_timeout = None;
        inner.on_reset = None;
    }

    /// Whether the explicit UI pause is active.
    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Outstanding instrumented network calls.
    pub fn active_api_calls(&self) -> u32 {
        self.lock().active_api_calls
    }

    /// Whether a countdown is currently armed.
    pub fn is_armed(&self) -> bool {
        self.lock().timer.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IdleInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Re-establish the arm invariant: cancel any countdown, then schedule a
    /// fresh one iff no suppression reason is active.
    fn rearm(&self, inner: &mut IdleInner) {
        if let Some(token) = inner.timer.take() {
            token.cancel();
        }
        inner.epoch += 1;

        if inner.paused || inner.active_api_calls > 0 {
            return;
        }

        let epoch = inner.epoch;
        let token = CancellationToken::new();
        inner.timer = Some(token.clone());

        let shared = Arc::clone(&self.inner);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    // Clear the armed handle before invoking the hook so a
                    // panicking callback cannot leave a phantom armed timer.
                    let on_timeout = {
                        let mut inner = shared
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        if inner.epoch != epoch {
                            return;
                        }
                        inner.timer = None;
                        inner.on_timeout.clone()
                    };
                    tracing::debug!("idle timeout fired");
                    if let Some(on_timeout) = on_timeout {
                        on_timeout();
                    }
                }
            }
        });
    }
}

/// Guard pairing one `start_api_call` with exactly one `end_api_call`.
///
/// Hold it across the whole request future, including the error paths.
pub struct ApiCallGuard {
    coordinator: IdleCoordinator,
}

impl Drop for ApiCallGuard {
    fn drop(&mut self) {
        self.coordinator.end_api_call();
    }
}

// =============================================================================
// Keep-Alive Countdown
// =============================================================================

/// Independent countdown behind the "are you still there?" confirmation.
///
/// Started while the idle coordinator is paused for a full-screen hold (QR
/// display). Expiry without [`confirm`](Self::confirm) fires the hook once;
/// confirming or dropping the countdown cancels it.
pub struct KeepAliveCountdown {
    token: CancellationToken,
}

impl KeepAliveCountdown {
    pub fn start(duration: Duration, on_expire: impl FnOnce() + Send + 'static) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    tracing::debug!("keep-alive countdown expired");
                    on_expire();
                }
            }
        });
        Self { token }
    }

    /// The patient confirmed they are still present.
    pub fn confirm(self) {
        self.token.cancel();
    }
}

impl Drop for KeepAliveCountdown {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_coordinator(timeout: Duration) -> (IdleCoordinator, Arc<AtomicU32>) {
        let idle = IdleCoordinator::new(timeout);
        let fired = Arc::new(AtomicU32::new(0));
        let count = Arc::clone(&fired);
        idle.set_on_timeout(move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        (idle, fired)
    }

    #[tokio::test]
    async fn armed_iff_not_paused_and_no_calls() {
        let (idle, _) = counting_coordinator(Duration::from_secs(45));

        idle.reset();
        assert!(idle.is_armed());

        idle.start_api_call();
        assert!(!idle.is_armed());

        idle.pause();
        assert!(!idle.is_armed());

        // Paused is still set: ending the call must not re-arm.
        idle.end_api_call();
        assert!(!idle.is_armed());
        assert_eq!(idle.active_api_calls(), 0);

        // Both suppression reasons cleared: now it arms.
        idle.resume();
        assert!(idle.is_armed());
    }

    #[tokio::test]
    async fn resume_does_not_rearm_with_outstanding_calls() {
        let (idle, _) = counting_coordinator(Duration::from_secs(45));

        idle.start_api_call();
        idle.pause();
        idle.resume();
        assert!(!idle.is_armed(), "a call is still outstanding");

        idle.end_api_call();
        assert!(idle.is_armed());
    }

    #[tokio::test]
    async fn nested_api_calls_rearm_only_at_zero() {
        let (idle, _) = counting_coordinator(Duration::from_secs(45));

        idle.start_api_call();
        idle.start_api_call();
        idle.end_api_call();
        assert!(!idle.is_armed());
        assert_eq!(idle.active_api_calls(), 1);

        idle.end_api_call();
        assert!(idle.is_armed());
    }

    #[tokio::test]
    async fn end_api_call_floors_at_zero() {
        let (idle, _) = counting_coordinator(Duration::from_secs(45));
        idle.end_api_call();
        idle.end_api_call();
        assert_eq!(idle.active_api_calls(), 0);
    }

    #[tokio::test]
    async fn guard_drop_ends_call_on_error_path() {
        let (idle, _) = counting_coordinator(Duration::from_secs(45));

        let failing_request = || -> Result<(), &'static str> {
            let _guard = idle.track_api_call();
            assert_eq!(idle.active_api_calls(), 1);
            Err("connection refused")
        };
        assert!(failing_request().is_err());
        assert_eq!(idle.active_api_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_exactly_once_per_arm_cycle() {
        let (idle, fired) = counting_coordinator(Duration::from_secs(45));

        idle.reset();
        tokio::time::sleep(Duration::from_secs(46)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!idle.is_armed());

        // No re-arm happened; waiting longer must not fire again.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_pushes_timeout_back() {
        let (idle, fired) = counting_coordinator(Duration::from_secs(45));

        idle.reset();
        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Activity at second 40: expiry moves to second 85, not 45.
        idle.reset();
        tokio::time::sleep(Duration::from_secs(40)).await; // t = 80
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(10)).await; // t = 90
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_pending_countdown() {
        let (idle, fired) = counting_coordinator(Duration::from_secs(45));

        idle.reset();
        tokio::time::sleep(Duration::from_secs(30)).await;
        idle.pause();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        idle.resume();
        tokio::time::sleep(Duration::from_secs(46)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_call_suppresses_timeout() {
        let (idle, fired) = counting_coordinator(Duration::from_secs(45));

        idle.reset();
        let guard = idle.track_api_call();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        drop(guard);
        tokio::time::sleep(Duration::from_secs(46)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_cancels_timer_and_clears_hooks() {
        let (idle, fired) = counting_coordinator(Duration::from_secs(45));

        idle.pause();
        idle.start_api_call();
        idle.reset();
        idle.destroy();

        assert!(!idle.is_armed());
        assert!(!idle.is_paused());
        assert_eq!(idle.active_api_calls(), 0);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn on_reset_hook_runs_before_rearm() {
        let idle = IdleCoordinator::new(Duration::from_secs(45));
        let resets = Arc::new(AtomicU32::new(0));
        let count = Arc::clone(&resets);
        idle.set_on_reset(move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        idle.reset();
        idle.reset();
        assert_eq!(resets.load(Ordering::SeqCst), 2);
        assert!(idle.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_expires_without_confirmation() {
        let expired = Arc::new(AtomicU32::new(0));
        let count = Arc::clone(&expired);
        let countdown = KeepAliveCountdown::start(Duration::from_secs(120), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        drop(countdown);
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_confirm_cancels_expiry() {
        let expired = Arc::new(AtomicU32::new(0));
        let count = Arc::clone(&expired);
        let countdown = KeepAliveCountdown::start(Duration::from_secs(120), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(60)).await;
        countdown.confirm();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }
}
