use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use bitflags::bitflags;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

bitflags! {
    /// Milestone bits carried by a device's [`EventGroup`].
    ///
    /// Bits 0..=2 are reserved by the contract. Drivers that need more
    /// signals allocate them with [`DeviceSignal::driver`] and document
    /// which bits they use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceSignal: u32 {
        /// Initialization has completed.
        const INIT_COMPLETE = 1 << 0;
        /// The pending acquisition produced data.
        const DATA_READY = 1 << 1;
        /// The pending acquisition failed; the driver records the kind.
        const ERROR = 1 << 2;
    }
}

impl DeviceSignal {
    /// Index of the first bit available to concrete drivers.
    pub const DRIVER_BASE: u32 = 3;

    /// Driver-specific signal bit `n`, counted from [`Self::DRIVER_BASE`].
    /// Panics if the bit would fall outside the 32-bit word (`n >= 29`).
    pub const fn driver(n: u32) -> Self {
        assert!(
            n < u32::BITS - Self::DRIVER_BASE,
            "driver signal bit out of range"
        );
        Self::from_bits_retain(1 << (Self::DRIVER_BASE + n))
    }
}

struct State<const WAKERS: usize> {
    bits: u32,
    wakers: MultiWakerRegistration<WAKERS>,
}

/// Multi-bit, level-triggered event signal.
///
/// A set of independently settable flags that tasks can wait on with
/// wait-for-any semantics. Bits stay set until explicitly cleared, either
/// by [`clear`](Self::clear) or by resolving a
/// [`wait_any_clear`](Self::wait_any_clear) wait. Dropping a wait future
/// before it resolves never consumes bits, so an abandoned (timed-out)
/// wait leaves the awaited state untouched and a later wait can still
/// succeed.
pub struct EventGroup<M: RawMutex, const WAKERS: usize = 8> {
    state: Mutex<M, RefCell<State<WAKERS>>>,
}

impl<M: RawMutex, const WAKERS: usize> EventGroup<M, WAKERS> {
    /// Create an event group with all bits cleared.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                bits: 0,
                wakers: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Set bits and wake every waiter.
    pub fn set(&self, bits: DeviceSignal) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.bits |= bits.bits();
            s.wakers.wake();
        });
    }

    /// Clear bits. Pending waiters are unaffected until they next poll.
    pub fn clear(&self, bits: DeviceSignal) {
        self.state.lock(|s| s.borrow_mut().bits &= !bits.bits());
    }

    /// Snapshot of the currently set bits.
    pub fn get(&self) -> DeviceSignal {
        DeviceSignal::from_bits_retain(self.state.lock(|s| s.borrow().bits))
    }

    /// Wait until any bit in `mask` is set. Matched bits are left set so
    /// that every concurrent waiter observes the milestone.
    pub async fn wait_any(&self, mask: DeviceSignal) -> DeviceSignal {
        self.wait(mask, false).await
    }

    /// Wait until any bit in `mask` is set, clearing the matched bits on
    /// resolution (consume-once discipline).
    pub async fn wait_any_clear(&self, mask: DeviceSignal) -> DeviceSignal {
        self.wait(mask, true).await
    }

    async fn wait(&self, mask: DeviceSignal, clear: bool) -> DeviceSignal {
        poll_fn(move |cx| {
            self.state.lock(|s| {
                let mut s = s.borrow_mut();
                let hit = s.bits & mask.bits();
                if hit != 0 {
                    if clear {
                        s.bits &= !hit;
                    }
                    Poll::Ready(DeviceSignal::from_bits_retain(hit))
                } else {
                    s.wakers.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }
}

impl<M: RawMutex, const WAKERS: usize> Default for EventGroup<M, WAKERS> {
    fn default() -> Self {
        Self::new()
    }
}
