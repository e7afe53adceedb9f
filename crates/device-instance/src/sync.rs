use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration};

use crate::error::{DeviceError, DeviceResult};
use crate::signal::{DeviceSignal, EventGroup};

/// Bound on lock acquisition for operations that take no explicit timeout.
///
/// Expiry surfaces as [`DeviceError::MutexError`], distinct from the
/// [`DeviceError::Timeout`] reserved for event-signal waits, so callers can
/// tell lock contention apart from awaited-data latency.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-instance synchronization bundle every driver builds on.
///
/// Owns the instance lock and the event signal, and references the
/// interface lock:
///
/// - the **instance lock** (`Mutex<M, S>`) protects all instance-local
///   mutable state `S` — lifecycle flags, cached values, logs;
/// - the **interface lock** (`&Mutex<M, B>`) serializes access to the
///   physical transport `B`, which may be shared by several device
///   instances — hence the reference;
/// - the **event group** carries the milestone bits of [`DeviceSignal`].
///
/// Lock discipline: the interface lock is acquired and released in a scope
/// strictly narrower than any instance-lock hold, never the other way
/// around, and is never held across an event-signal wait.
pub struct SyncCore<'bus, M: RawMutex, S, B = ()> {
    state: Mutex<M, S>,
    interface: &'bus Mutex<M, B>,
    signals: EventGroup<M>,
}

impl<'bus, M: RawMutex, S, B> SyncCore<'bus, M, S, B> {
    pub const fn new(state: S, interface: &'bus Mutex<M, B>) -> Self {
        Self {
            state: Mutex::new(state),
            interface,
            signals: EventGroup::new(),
        }
    }

    /// Acquire the instance lock, bounded by [`DEFAULT_LOCK_TIMEOUT`].
    pub async fn lock_state(&self) -> DeviceResult<MutexGuard<'_, M, S>> {
        self.lock_state_for(Some(DEFAULT_LOCK_TIMEOUT)).await
    }

    /// Acquire the instance lock with an explicit bound; `None` waits
    /// indefinitely.
    pub async fn lock_state_for(
        &self,
        timeout: Option<Duration>,
    ) -> DeviceResult<MutexGuard<'_, M, S>> {
        match timeout {
            None => Ok(self.state.lock().await),
            Some(t) => with_timeout(t, self.state.lock())
                .await
                .map_err(|_| DeviceError::MutexError),
        }
    }

    /// Acquire the interface lock, bounded by [`DEFAULT_LOCK_TIMEOUT`].
    ///
    /// Hold the guard only for the duration of issuing a hardware request;
    /// never across a wait for asynchronous completion, so other instances
    /// sharing the transport are not starved for the acquisition latency.
    pub async fn lock_interface(&self) -> DeviceResult<MutexGuard<'_, M, B>> {
        with_timeout(DEFAULT_LOCK_TIMEOUT, self.interface.lock())
            .await
            .map_err(|_| DeviceError::MutexError)
    }

    /// Set milestone bits, waking all waiters.
    pub fn signal(&self, bits: DeviceSignal) {
        self.signals.set(bits);
    }

    /// Clear milestone bits.
    pub fn clear_signal(&self, bits: DeviceSignal) {
        self.signals.clear(bits);
    }

    /// Snapshot of the currently set milestone bits.
    pub fn signal_state(&self) -> DeviceSignal {
        self.signals.get()
    }

    /// Wait until any bit in `mask` is set, without clearing it.
    ///
    /// `None` waits indefinitely; an expired bound maps to
    /// [`DeviceError::Timeout`] and consumes nothing.
    pub async fn wait_any(
        &self,
        mask: DeviceSignal,
        timeout: Option<Duration>,
    ) -> DeviceResult<DeviceSignal> {
        match timeout {
            None => Ok(self.signals.wait_any(mask).await),
            Some(t) => with_timeout(t, self.signals.wait_any(mask))
                .await
                .map_err(|_| DeviceError::Timeout),
        }
    }

    /// The instance event group, for drivers that use custom bits.
    pub fn signals(&self) -> &EventGroup<M> {
        &self.signals
    }
}
