use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use portable_atomic::{AtomicU32, AtomicU8, Ordering};

use crate::error::{DeviceError, DeviceResult};

/// Milestones eligible to produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EventKind {
    /// Device initialization complete.
    Initialized = 0,
    /// New data available.
    DataReady,
    /// An error occurred.
    ErrorOccurred,
    /// Device state changed.
    StateChanged,
    /// Device-specific event.
    Custom,
}

impl EventKind {
    pub const COUNT: usize = 5;

    /// Validate a raw event kind; out-of-range values map to
    /// [`DeviceError::InvalidParameter`].
    pub fn from_raw(raw: i32) -> DeviceResult<Self> {
        u8::try_from(raw)
            .ok()
            .and_then(|v| Self::try_from(v).ok())
            .ok_or(DeviceError::InvalidParameter)
    }
}

/// Record delivered to every registered callback when a milestone occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventNotification {
    pub kind: EventKind,
    /// Associated error kind; [`DeviceError::Success`] for non-error
    /// milestones.
    pub error: DeviceError,
    /// Device-specific payload (e.g. the action id for `StateChanged`).
    pub custom_data: i32,
}

/// Callback invoked by the dispatcher for each delivered notification.
pub type EventCallback = &'static (dyn Fn(&EventNotification) + Sync);

/// Notification fan-out with a fixed dispatcher context.
///
/// Producers hand a notification off with [`notify`](Self::notify), which
/// never blocks: it gates on the per-kind enable mask and pushes onto a
/// bounded queue. A single consumer — [`run`](Self::run), polled by a task
/// the application spawns — drains the queue in FIFO order and invokes the
/// registered callbacks outside all locks, so a slow callback can never
/// stall the lifecycle or acquisition path. FIFO delivery through one
/// consumer preserves milestone order per callback; callbacks for one
/// event run in registration order.
pub struct EventHub<M: RawMutex, const CALLBACKS: usize = 4, const DEPTH: usize = 8> {
    registry: Mutex<M, RefCell<heapless::Vec<EventCallback, CALLBACKS>>>,
    enabled: AtomicU8,
    queue: Channel<M, EventNotification, DEPTH>,
    dropped: AtomicU32,
}

impl<M: RawMutex, const CALLBACKS: usize, const DEPTH: usize>
    EventHub<M, CALLBACKS, DEPTH>
{
    /// Create a hub with an empty registry and every kind enabled.
    pub const fn new() -> Self {
        Self {
            registry: Mutex::new(RefCell::new(heapless::Vec::new())),
            enabled: AtomicU8::new((1 << EventKind::COUNT) - 1),
            queue: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Append a callback to the registry.
    pub fn register(&self, callback: EventCallback) -> DeviceResult<()> {
        self.registry.lock(|r| {
            r.borrow_mut()
                .push(callback)
                .map(|_| ())
                .map_err(|_| DeviceError::MemoryError)
        })
    }

    /// Clear the registry. Notifications already queued are still drained,
    /// but deliver to nobody.
    pub fn unregister_all(&self) {
        self.registry.lock(|r| r.borrow_mut().clear());
    }

    /// Toggle delivery of one event kind.
    pub fn set_enabled(&self, kind: EventKind, enable: bool) {
        let mask = 1u8 << u8::from(kind);
        if enable {
            self.enabled.fetch_or(mask, Ordering::Relaxed);
        } else {
            self.enabled.fetch_and(!mask, Ordering::Relaxed);
        }
    }

    pub fn is_enabled(&self, kind: EventKind) -> bool {
        self.enabled.load(Ordering::Relaxed) & (1 << u8::from(kind)) != 0
    }

    /// Hand off a notification for dispatch. Never blocks: if the queue is
    /// full the notification is dropped and counted.
    pub fn notify(&self, kind: EventKind, error: DeviceError, custom_data: i32) {
        if !self.is_enabled(kind) {
            return;
        }
        let notification = EventNotification { kind, error, custom_data };
        if self.queue.try_send(notification).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("notification queue full, dropped {:?}", kind);
        }
    }

    /// Notifications dropped because the queue was full.
    pub fn dropped_count(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Dispatcher loop. Poll this from a dedicated task; it never returns.
    pub async fn run(&self) -> ! {
        loop {
            let notification = self.queue.receive().await;
            trace!("dispatching {:?}", notification.kind);
            // Snapshot under the registry lock, invoke outside it.
            let callbacks = self.registry.lock(|r| r.borrow().clone());
            for callback in &callbacks {
                callback(&notification);
            }
        }
    }
}

impl<M: RawMutex, const CALLBACKS: usize, const DEPTH: usize> Default
    for EventHub<M, CALLBACKS, DEPTH>
{
    fn default() -> Self {
        Self::new()
    }
}
