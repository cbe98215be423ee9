//! Interrupt flags lock
//!
//! Reading RegIrqFlags and writing the value back clears exactly the events that were
//! seen. If the mainline polling path and the interrupt handler both run that sequence
//! they can each clear the other's event, so it is serialized by [`IrqFlagLock`].
//!
//! # Important Notes
//! - The lock covers the flag read-clear only, never the FIFO copy that follows
//! - Only the mainline side waits; the interrupt handler tries once and records
//!   [`RadioFault::IrqLockBusy`](crate::RadioFault::IrqLockBusy) on failure
//! - Test-and-set runs inside a critical section so the lock also works on cores
//!   without compare-and-swap

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;

use crate::Error;

/// Number of attempts the mainline side makes before giving up.
pub const ACQUIRE_ATTEMPTS: u32 = 50;

/// Back-off between mainline attempts, in ms.
pub const ACQUIRE_BACKOFF_MS: u32 = 20;

/// Cooperative lock around the interrupt flags read-clear.
#[derive(Debug, Default)]
pub struct IrqFlagLock {
    held: AtomicBool,
}

impl IrqFlagLock {
    /// Creates a released lock.
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Takes the lock if it is free. Never waits.
    pub fn try_acquire(&self) -> bool {
        critical_section::with(|_| {
            if self.held.load(Ordering::Acquire) {
                false
            } else {
                self.held.store(true, Ordering::Release);
                true
            }
        })
    }

    /// Takes the lock, backing off between attempts.
    ///
    /// # Errors
    /// * `Error::LockTimeout` - still held after [`ACQUIRE_ATTEMPTS`] attempts
    pub fn acquire<D: DelayNs>(&self, delay: &mut D) -> Result<(), Error> {
        for _ in 0..ACQUIRE_ATTEMPTS {
            if self.try_acquire() {
                return Ok(());
            }
            delay.delay_ms(ACQUIRE_BACKOFF_MS);
        }
        Err(Error::LockTimeout)
    }

    /// Releases the lock.
    pub fn release(&self) {
        self.held.store(false, Ordering::Release);
    }

    /// Whether the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}
