#![no_std]
//! Synchronization and lifecycle contract for asynchronous device drivers.
//!
//! Every driver in the system satisfies the same contract so that multiple
//! concurrent tasks can safely initialize a device, trigger asynchronous
//! data acquisition, retrieve typed results, and receive event
//! notifications, without each driver re-inventing its locking and
//! signalling discipline. The pieces:
//!
//! - [`SyncCore`]: the two-lock + event-signal concurrency model every
//!   driver builds on (instance lock, shared interface lock,
//!   [`EventGroup`] milestone bits);
//! - [`DeviceInstance`]: the request → wait → process → fetch state
//!   machine, expressed as async operations with bounded timeouts;
//! - [`EventHub`]: milestone notifications fanned out to registered
//!   callbacks through a bounded queue and a fixed dispatcher context;
//! - [`DeviceError`]: the closed error taxonomy all failures map onto;
//! - [`mock::MockDevice`]: a configurable reference implementation for
//!   downstream tests.

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod device;
mod error;
mod events;
mod signal;
mod sync;

pub mod mock;

pub use device::{DataVec, DeviceDataType, DeviceInstance, MAX_SAMPLES};
pub use error::{DeviceError, DeviceResult};
pub use events::{EventCallback, EventHub, EventKind, EventNotification};
pub use signal::{DeviceSignal, EventGroup};
pub use sync::{SyncCore, DEFAULT_LOCK_TIMEOUT};
