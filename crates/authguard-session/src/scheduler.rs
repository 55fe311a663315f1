//! SessionTimers: warning and expiry timers for the current access token.
//!
//! Each `schedule` call reads the token, arms a warn timer at
//! `exp - warn_lead` and an expire timer at `exp`, and replaces whatever the
//! instance had armed before. When the expire timer fires, a supplied
//! refresher gets one chance to renew the token; on success the instance
//! re-arms against the token the getter returns next.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::clock::{system_clock, Clock};
use crate::error::RefreshError;
use crate::token::token_expiry_millis;

/// Default lead time before expiry for the warn callback.
pub const DEFAULT_WARN_SECONDS: u64 = 60;

// ============================================================================
// Caller-supplied pieces
// ============================================================================

/// Returns the current access token, or `None` when signed out.
pub type TokenGetter = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Receives the time left before expiry, floored at zero.
pub type WarnCallback = Arc<dyn Fn(Duration) + Send + Sync>;

/// Receives why the session ended.
pub type ExpireCallback = Arc<dyn Fn(ExpireReason) + Send + Sync>;

/// User-implemented token renewal, usually a network call to the auth server.
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    /// Renew the session so the token getter returns a fresh token.
    async fn refresh(&self) -> Result<(), RefreshError>;
}

/// Why `on_expire` was called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpireReason {
    /// The token expired and no refresher was supplied.
    TokenExpired,
    /// The refresher ran and failed.
    RefreshFailed(RefreshError),
}

/// Options for a schedule.
#[derive(Clone)]
pub struct SessionOptions {
    /// How long before expiry `on_warn` fires.
    pub warn_lead: Duration,
    /// Wall clock used to measure the time left on the token.
    pub clock: Clock,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            warn_lead: Duration::from_secs(DEFAULT_WARN_SECONDS),
            clock: system_clock(),
        }
    }
}

impl SessionOptions {
    pub fn with_warn_seconds(mut self, seconds: u64) -> Self {
        self.warn_lead = Duration::from_secs(seconds);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

/// Optional callbacks. Absent callbacks are skipped.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    pub on_warn: Option<WarnCallback>,
    pub on_expire: Option<ExpireCallback>,
    pub on_refresh: Option<Arc<dyn SessionRefresher>>,
}

/// Whether an instance currently has timers pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduled,
}

// ============================================================================
// Timer slots
// ============================================================================

#[derive(Default)]
struct TimerSlots {
    warn: Option<JoinHandle<()>>,
    expire: Option<JoinHandle<()>>,
    /// Bumped on every clear. A task that observes a different value than it
    /// was armed with has been superseded and must do nothing further.
    generation: u64,
}

impl TimerSlots {
    fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.warn.take() {
            handle.abort();
        }
        if let Some(handle) = self.expire.take() {
            handle.abort();
        }
    }

    fn pending(&self) -> usize {
        [&self.warn, &self.expire]
            .into_iter()
            .filter(|slot| matches!(slot, Some(handle) if !handle.is_finished()))
            .count()
    }
}

struct ScheduleRequest {
    token_getter: TokenGetter,
    options: SessionOptions,
    callbacks: SessionCallbacks,
}

// ============================================================================
// SessionTimers
// ============================================================================

/// Owner of one warn/expire timer pair.
///
/// At most one warn timer and one expire timer are pending per instance;
/// every `schedule` and `clear` cancels the previous pair first. Clones share
/// the same pair. Separate instances are independent, so several sessions
/// (accounts, tabs) can be watched side by side.
///
/// Timers are tokio tasks on the runtime current at `schedule` time.
#[derive(Clone, Default)]
pub struct SessionTimers {
    slots: Arc<Mutex<TimerSlots>>,
}

impl SessionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm warn and expire timers for the token `token_getter` returns.
    ///
    /// When there is no token, the token has no usable `exp`, or no tokio
    /// runtime is running, nothing is armed and a no-op handle is returned.
    /// If the token is already inside the warn window, `on_warn` is called
    /// before this returns.
    pub fn schedule(
        &self,
        token_getter: TokenGetter,
        options: SessionOptions,
        callbacks: SessionCallbacks,
    ) -> CancelHandle {
        let request = Arc::new(ScheduleRequest {
            token_getter,
            options,
            callbacks,
        });
        if arm(&self.slots, request, None) {
            CancelHandle {
                slots: Some(Arc::downgrade(&self.slots)),
            }
        } else {
            CancelHandle::noop()
        }
    }

    /// Cancel pending timers. Safe to call when nothing is scheduled.
    ///
    /// A refresh still awaiting inside a cancelled expire timer is dropped:
    /// it neither re-arms nor calls `on_expire`.
    pub fn clear(&self) {
        self.slots.lock().clear();
        debug!("Cleared session timers");
    }

    pub fn state(&self) -> SchedulerState {
        if self.pending_timers() == 0 {
            SchedulerState::Idle
        } else {
            SchedulerState::Scheduled
        }
    }

    /// Number of armed timers that have not finished (0, 1 or 2).
    pub fn pending_timers(&self) -> usize {
        self.slots.lock().pending()
    }
}

/// Cancels the timers armed by [`SessionTimers::schedule`], including any
/// later re-arms after refresh. Equivalent to [`SessionTimers::clear`].
#[derive(Clone, Default)]
pub struct CancelHandle {
    slots: Option<Weak<Mutex<TimerSlots>>>,
}

impl CancelHandle {
    /// A handle that cancels nothing.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.slots.is_none()
    }

    pub fn cancel(&self) {
        if let Some(slots) = self.slots.as_ref().and_then(Weak::upgrade) {
            slots.lock().clear();
            debug!("Cancelled session timers");
        }
    }
}

// ============================================================================
// Core Implementation
// ============================================================================

/// Clear `slots`, then arm a fresh pair for `request`. Returns whether
/// anything was armed.
///
/// With `expected` set (a re-arm after refresh), nothing happens unless the
/// slots are still at that generation. A `schedule` or `clear` that lands
/// while the token is read or `on_warn` runs wins over this call.
fn arm(
    slots: &Arc<Mutex<TimerSlots>>,
    request: Arc<ScheduleRequest>,
    expected: Option<u64>,
) -> bool {
    let cleared = {
        let mut guard = slots.lock();
        if expected.is_some_and(|generation| generation != guard.generation) {
            return false;
        }
        guard.clear();
        guard.generation
    };

    let Some(token) = (request.token_getter)() else {
        debug!("No session token; nothing to schedule");
        return false;
    };
    let exp_ms = match token_expiry_millis(&token) {
        Ok(exp_ms) => exp_ms,
        Err(err) => {
            debug!(error = %err, "Session token unusable; nothing to schedule");
            return false;
        }
    };
    let Ok(runtime) = Handle::try_current() else {
        warn!("Session timers need a running tokio runtime; nothing scheduled");
        return false;
    };

    let remaining_ms = exp_ms.saturating_sub((request.options.clock)());
    let warn_lead_ms = i64::try_from(request.options.warn_lead.as_millis()).unwrap_or(i64::MAX);
    let warn_delay_ms = remaining_ms.saturating_sub(warn_lead_ms);

    // Already inside the warn window: warn now instead of arming a timer.
    if warn_delay_ms <= 0 {
        if let Some(on_warn) = &request.callbacks.on_warn {
            on_warn(millis_left(remaining_ms));
        }
    }

    let mut guard = slots.lock();
    if guard.generation != cleared {
        debug!("Session timers changed while arming; not arming");
        return false;
    }
    let generation = guard.generation;

    if warn_delay_ms > 0 {
        let on_warn = request.callbacks.on_warn.clone();
        let clock = request.options.clock.clone();
        guard.warn = Some(runtime.spawn(async move {
            sleep(millis_left(warn_delay_ms)).await;
            if let Some(on_warn) = on_warn {
                on_warn(millis_left(exp_ms.saturating_sub(clock())));
            }
        }));
    }

    let expire_delay = millis_left(remaining_ms);
    let task_slots = Arc::clone(slots);
    guard.expire = Some(runtime.spawn(async move {
        sleep(expire_delay).await;
        on_expiry(task_slots, request, generation).await;
    }));

    debug!(
        remaining_ms,
        warn_in_ms = warn_delay_ms.max(0),
        "Armed session timers"
    );
    true
}

async fn on_expiry(
    slots: Arc<Mutex<TimerSlots>>,
    request: Arc<ScheduleRequest>,
    generation: u64,
) {
    let reason = match &request.callbacks.on_refresh {
        Some(refresher) => match refresher.refresh().await {
            Ok(()) => {
                if !detach_current(&slots, generation) {
                    return;
                }
                debug!("Session refreshed; re-arming timers");
                arm(&slots, Arc::clone(&request), Some(generation));
                return;
            }
            Err(err) => {
                warn!(error = %err, "Session refresh failed; expiring session");
                ExpireReason::RefreshFailed(err)
            }
        },
        None => ExpireReason::TokenExpired,
    };

    if !detach_current(&slots, generation) {
        return;
    }
    if let Some(on_expire) = &request.callbacks.on_expire {
        on_expire(reason);
    }
}

/// Release the slots held by the firing expire task so a following `arm`
/// cannot abort the task that is running it. Returns false when the task has
/// been superseded.
fn detach_current(slots: &Mutex<TimerSlots>, generation: u64) -> bool {
    let mut guard = slots.lock();
    if guard.generation != generation {
        return false;
    }
    // Dropping a JoinHandle detaches the task; it does not abort it.
    guard.expire.take();
    if let Some(handle) = guard.warn.take() {
        handle.abort();
    }
    true
}

fn millis_left(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}
