//! Configurable test double for [`DeviceInstance`] consumers.
//!
//! `MockDevice` implements the full contract against no hardware, with
//! seedable data, injectable errors, and configurable initialization and
//! acquisition delays. The two injection points ([`MockDevice::seed_data`],
//! [`MockDevice::inject_error`]) are test scaffolding, not part of the
//! production contract.

use core::array;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};
use portable_atomic::{AtomicBool, Ordering};

use crate::device::{DataVec, DeviceDataType, DeviceInstance};
use crate::error::{DeviceError, DeviceResult};
use crate::events::{EventCallback, EventHub, EventKind};
use crate::signal::DeviceSignal;
use crate::sync::SyncCore;

/// Upper bound on the action log.
pub const MAX_ACTIONS: usize = 16;

/// Recorded `perform_action` calls, oldest first.
pub type ActionLog = heapless::Vec<(i32, i32), MAX_ACTIONS>;

/// Acquisition window phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pending,
    Ready,
    Processed,
}

struct MockState {
    phase: Phase,
    seeded: [Option<DataVec>; DeviceDataType::COUNT],
    processed: [Option<DataVec>; DeviceDataType::COUNT],
    next_error: Option<DeviceError>,
    last_error: DeviceError,
    actions: ActionLog,
}

impl MockState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            seeded: array::from_fn(|_| None),
            processed: array::from_fn(|_| None),
            next_error: None,
            last_error: DeviceError::UnknownError,
            actions: ActionLog::new(),
        }
    }
}

/// Mock implementation of the device contract.
///
/// The acquisition worker and the notification dispatcher both live inside
/// [`run`](Self::run), which must be polled concurrently with the code
/// under test (e.g. via `embassy_futures::select` or a spawned task).
///
/// The interface mutex is taken by reference so several mocks can share
/// one transport, mirroring real bus topologies.
pub struct MockDevice<'bus, M: RawMutex> {
    core: SyncCore<'bus, M, MockState>,
    hub: EventHub<M>,
    initialized: AtomicBool,
    init_delay: Duration,
    data_delay: Duration,
    kick: Channel<M, (), 1>,
}

impl<'bus, M: RawMutex> MockDevice<'bus, M> {
    pub fn new(
        interface: &'bus Mutex<M, ()>,
        init_delay: Duration,
        data_delay: Duration,
    ) -> Self {
        Self {
            core: SyncCore::new(MockState::new(), interface),
            hub: EventHub::new(),
            initialized: AtomicBool::new(false),
            init_delay,
            data_delay,
            kick: Channel::new(),
        }
    }

    /// Drive the acquisition worker and the notification dispatcher.
    /// Never returns; poll it alongside the code exercising the device.
    pub async fn run(&self) -> ! {
        match select(self.acquisition_loop(), self.hub.run()).await {
            Either::First(never) => match never {},
            Either::Second(never) => match never {},
        }
    }

    /// Pre-seed the values a later `process_data` will publish for
    /// `data_type`. Test scaffolding.
    pub async fn seed_data(
        &self,
        data_type: DeviceDataType,
        values: &[f32],
    ) -> DeviceResult<()> {
        let vec =
            DataVec::from_slice(values).map_err(|_| DeviceError::MemoryError)?;
        let mut state = self.core.lock_state().await?;
        state.seeded[data_type as usize] = Some(vec);
        Ok(())
    }

    /// Force the next `request_data` to fail with `error`. Test
    /// scaffolding.
    pub async fn inject_error(&self, error: DeviceError) -> DeviceResult<()> {
        let mut state = self.core.lock_state().await?;
        state.next_error = Some(error);
        Ok(())
    }

    /// Recorded `perform_action` calls.
    pub async fn performed_actions(&self) -> DeviceResult<ActionLog> {
        let state = self.core.lock_state().await?;
        Ok(state.actions.clone())
    }

    /// Snapshot of the milestone bits, for assertions.
    pub fn signal_state(&self) -> DeviceSignal {
        self.core.signal_state()
    }

    /// Return the mock to its pristine state: uninitialized, no seeded or
    /// processed data, empty action log, no injected error, all signal
    /// bits cleared.
    pub async fn reset(&self) -> DeviceResult<()> {
        let mut state = self.core.lock_state().await?;
        *state = MockState::new();
        self.initialized.store(false, Ordering::Release);
        self.core.clear_signal(DeviceSignal::all());
        Ok(())
    }

    async fn acquisition_loop(&self) -> ! {
        loop {
            self.kick.receive().await;
            Timer::after(self.data_delay).await;
            let mut state = match self.core.lock_state_for(None).await {
                Ok(state) => state,
                Err(_) => continue,
            };
            // A reset may have closed the window while we slept.
            if state.phase != Phase::Pending {
                continue;
            }
            state.phase = Phase::Ready;
            drop(state);
            self.core.signal(DeviceSignal::DATA_READY);
            self.hub.notify(EventKind::DataReady, DeviceError::Success, 0);
            trace!("acquisition complete");
        }
    }
}

impl<M: RawMutex> DeviceInstance for MockDevice<'_, M> {
    async fn initialize(&self) -> DeviceResult<()> {
        {
            let _state = self.core.lock_state().await?;
            if self.initialized.load(Ordering::Acquire) {
                debug!("initialize: already initialized");
                return Ok(());
            }
        }
        Timer::after(self.init_delay).await;
        // Two racing initializers are both a success; only the first one
        // signals and notifies.
        if !self.initialized.swap(true, Ordering::AcqRel) {
            self.core.signal(DeviceSignal::INIT_COMPLETE);
            self.hub.notify(EventKind::Initialized, DeviceError::Success, 0);
            info!("mock device initialized");
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    async fn wait_for_initialization(
        &self,
        timeout: Option<Duration>,
    ) -> DeviceResult<()> {
        self.core
            .wait_any(DeviceSignal::INIT_COMPLETE, timeout)
            .await?;
        Ok(())
    }

    async fn request_data(&self) -> DeviceResult<()> {
        if !self.is_initialized() {
            warn!("request_data before initialize");
            return Err(DeviceError::NotInitialized);
        }
        let mut state = self.core.lock_state().await?;
        if let Some(error) = state.next_error.take() {
            state.last_error = error;
            drop(state);
            self.core.signal(DeviceSignal::ERROR);
            self.hub.notify(EventKind::ErrorOccurred, error, 0);
            warn!("request_data failed: {:?}", error);
            return Err(error);
        }
        match state.phase {
            Phase::Pending | Phase::Ready => return Err(DeviceError::DeviceBusy),
            Phase::Idle | Phase::Processed => {}
        }
        // Issue the request before committing the window, holding the
        // interface lock only for the kick itself; a transport failure here
        // leaves the phase untouched so the caller can retry.
        {
            let _bus = self.core.lock_interface().await?;
            if self.kick.try_send(()).is_err() {
                return Err(DeviceError::DeviceBusy);
            }
        }
        state.phase = Phase::Pending;
        // New window: previous milestone bits no longer apply.
        self.core
            .clear_signal(DeviceSignal::DATA_READY | DeviceSignal::ERROR);
        debug!("acquisition window opened");
        Ok(())
    }

    async fn wait_for_data(&self, timeout: Option<Duration>) -> DeviceResult<()> {
        let bits = self
            .core
            .wait_any(DeviceSignal::DATA_READY | DeviceSignal::ERROR, timeout)
            .await?;
        if bits.contains(DeviceSignal::DATA_READY) {
            Ok(())
        } else {
            let state = self.core.lock_state().await?;
            Err(state.last_error)
        }
    }

    async fn process_data(&self) -> DeviceResult<()> {
        let mut guard = self.core.lock_state().await?;
        let state = &mut *guard;
        if state.phase != Phase::Ready {
            return Err(DeviceError::DataNotReady);
        }
        // Publish the whole snapshot at once so readers never observe a
        // partially-processed mix.
        state.processed = state.seeded.clone();
        state.phase = Phase::Processed;
        trace!("acquisition output processed");
        Ok(())
    }

    async fn get_data(&self, data_type: DeviceDataType) -> DeviceResult<DataVec> {
        let state = self.core.lock_state().await?;
        state.processed[data_type as usize]
            .clone()
            .ok_or(DeviceError::DataNotReady)
    }

    async fn perform_action(
        &self,
        action_id: i32,
        action_param: i32,
    ) -> DeviceResult<()> {
        if !self.is_initialized() {
            return Err(DeviceError::NotInitialized);
        }
        {
            let mut state = self.core.lock_state().await?;
            state
                .actions
                .push((action_id, action_param))
                .map_err(|_| DeviceError::MemoryError)?;
        }
        debug!("performed action {} with param {}", action_id, action_param);
        self.hub
            .notify(EventKind::StateChanged, DeviceError::Success, action_id);
        Ok(())
    }

    fn register_callback(&self, callback: EventCallback) -> DeviceResult<()> {
        self.hub.register(callback)
    }

    fn unregister_callbacks(&self) -> DeviceResult<()> {
        self.hub.unregister_all();
        Ok(())
    }

    fn set_event_notification(
        &self,
        kind: EventKind,
        enable: bool,
    ) -> DeviceResult<()> {
        self.hub.set_enabled(kind, enable);
        Ok(())
    }
}
