use embassy_time::Duration;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{DeviceError, DeviceResult};
use crate::events::{EventCallback, EventKind};

/// Maximum number of samples a single data vector can carry.
pub const MAX_SAMPLES: usize = 8;

/// Values of one data type, most recent acquisition first-to-last.
pub type DataVec = heapless::Vec<f32, MAX_SAMPLES>;

/// Semantic meaning of a value vector.
///
/// Concrete drivers may not extend this set at runtime; validity of a raw
/// code is a pure range test via [`DeviceDataType::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceDataType {
    /// Temperature in degrees Celsius.
    Temperature = 0,
    /// Relative humidity percentage (0-100).
    Humidity,
    /// Atmospheric pressure in hPa.
    Pressure,
    /// Binary relay state (0.0 = off, 1.0 = on).
    RelayState,
}

impl DeviceDataType {
    pub const COUNT: usize = 4;

    /// Validate a raw data type code; out-of-range values map to
    /// [`DeviceError::InvalidParameter`].
    pub fn from_raw(raw: i32) -> DeviceResult<Self> {
        u8::try_from(raw)
            .ok()
            .and_then(|v| Self::try_from(v).ok())
            .ok_or(DeviceError::InvalidParameter)
    }
}

/// Lifecycle and data-acquisition contract every device driver satisfies.
///
/// A driver moves through `Uninitialized → Ready` once, and within `Ready`
/// cycles an acquisition window `Idle → AcquisitionPending → DataAvailable
/// → Processed → Idle`. All methods are safe to call from any number of
/// concurrent tasks; the only suspension points are
/// [`wait_for_initialization`](Self::wait_for_initialization),
/// [`wait_for_data`](Self::wait_for_data), and bounded lock acquisition
/// inside the other operations. Every bounded wait takes
/// `Option<Duration>`, where `None` requests an indefinite wait.
///
/// # Signal bits
///
/// Implementations signal milestones on the reserved
/// [`DeviceSignal`](crate::DeviceSignal) bits: `INIT_COMPLETE` is set once
/// and stays set for the life of the instance (only a full test-double
/// reset clears it); `DATA_READY` and `ERROR` mark the outcome of the
/// current acquisition window and are cleared when
/// [`request_data`](Self::request_data) opens the next one.
/// `wait_for_data` does **not**
/// consume `DATA_READY`, so every concurrent waiter observes the same
/// milestone.
#[allow(async_fn_in_trait)]
pub trait DeviceInstance {
    /// Bring up the hardware and mark the device `Ready`.
    ///
    /// Idempotent: calling again while already initialized is a no-op
    /// success. On the first success the driver sets `INIT_COMPLETE` and
    /// fires an `Initialized` notification. Lock-acquisition expiry yields
    /// [`DeviceError::MutexError`]; setup failures yield
    /// [`DeviceError::CommunicationError`] or a more specific kind.
    async fn initialize(&self) -> DeviceResult<()>;

    /// Cheap, lock-free readiness check.
    fn is_initialized(&self) -> bool;

    /// Block until initialization completes or `timeout` elapses.
    ///
    /// Returns [`DeviceError::Timeout`] on expiry. Never consumes the
    /// `INIT_COMPLETE` bit: all concurrent waiters observe completion.
    async fn wait_for_initialization(
        &self,
        timeout: Option<Duration>,
    ) -> DeviceResult<()>;

    /// Open an acquisition window and begin fetching data asynchronously.
    ///
    /// Returns promptly regardless of acquisition latency; completion is
    /// observed through [`wait_for_data`](Self::wait_for_data). Returns
    /// [`DeviceError::NotInitialized`] before
    /// [`initialize`](Self::initialize) succeeds and
    /// [`DeviceError::DeviceBusy`] while a
    /// window is already open. The interface lock is held only while the
    /// hardware request is issued.
    async fn request_data(&self) -> DeviceResult<()>;

    /// Block until the open window produces data or fails, or `timeout`
    /// elapses.
    ///
    /// Returns the driver's recorded error kind if the `ERROR` bit was
    /// set, [`DeviceError::Timeout`] on expiry. A timed-out wait consumes
    /// nothing; a later wait still succeeds once data arrives.
    async fn wait_for_data(&self, timeout: Option<Duration>) -> DeviceResult<()>;

    /// Parse and validate the raw acquisition output into instance state.
    ///
    /// Legal only after a successful [`wait_for_data`](Self::wait_for_data)
    /// for the current window; otherwise [`DeviceError::DataNotReady`].
    /// Closes the window.
    async fn process_data(&self) -> DeviceResult<()>;

    /// Most recently processed values for `data_type`.
    ///
    /// Pure read under the instance lock; repeatable without side effects.
    /// Observes either the prior fully-processed snapshot or the new one,
    /// never an intermediate. Returns [`DeviceError::DataNotReady`] if the
    /// driver has not produced that type.
    async fn get_data(&self, data_type: DeviceDataType) -> DeviceResult<DataVec>;

    /// Driver-specific escape hatch.
    ///
    /// Requires `Ready` ([`DeviceError::NotInitialized`] otherwise) and
    /// serializes against other instance-mutating operations. Successful
    /// actions fire a `StateChanged` notification carrying `action_id` as
    /// `custom_data`. Unsupported ids map to
    /// [`DeviceError::NotSupported`].
    async fn perform_action(
        &self,
        action_id: i32,
        action_param: i32,
    ) -> DeviceResult<()>;

    /// Append `callback` to the notification registry.
    ///
    /// Drivers that opt out of notifications entirely return
    /// [`DeviceError::NotSupported`].
    fn register_callback(&self, callback: EventCallback) -> DeviceResult<()>;

    /// Clear the notification registry.
    fn unregister_callbacks(&self) -> DeviceResult<()>;

    /// Toggle delivery of one event kind.
    fn set_event_notification(
        &self,
        kind: EventKind,
        enable: bool,
    ) -> DeviceResult<()>;
}
