//! Interrupt-to-instance dispatch
//!
//! A hardware interrupt carries no context, so the driver instance it should act on
//! has to be reachable from a `static`. [`InterruptSlot`] is that single global driver
//! context: the application installs its radio (or link) in it during start-up, the
//! DIO0 interrupt handler calls [`InterruptSlot::dispatch`], and mainline code reaches
//! the same instance through [`InterruptSlot::with`].
//!
//! # Example
//! ```ignore
//! static RADIO: InterruptSlot<LoraLink<Spi, Delay>> = InterruptSlot::new();
//!
//! #[interrupt]
//! fn EXTI0() {
//!     RADIO.dispatch();
//! }
//! ```
//!
//! Both sides run inside a critical section, so mainline work done through `with`
//! cannot be preempted by the DIO0 handler. Keep it short.

use core::cell::RefCell;

use critical_section::Mutex;

/// Something that reacts to the DIO0 interrupt line.
pub trait InterruptHandler {
    /// Services one DIO0 edge. Called from interrupt context: must not block, delay or
    /// log.
    fn on_interrupt(&mut self);
}

/// Single-instance registry reachable from interrupt context.
pub struct InterruptSlot<T> {
    inner: Mutex<RefCell<Option<T>>>,
}

impl<T> InterruptSlot<T> {
    /// Creates an empty slot. Usable in a `static` initializer.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Installs an instance, returning the one it replaces.
    pub fn install(&self, instance: T) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(instance))
    }

    /// Removes the installed instance. Later interrupts are ignored.
    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Whether an instance is installed.
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Runs `f` on the installed instance, if any.
    pub fn with<F, O>(&self, f: F) -> Option<O>
    where
        F: FnOnce(&mut T) -> O,
    {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<T: InterruptHandler> InterruptSlot<T> {
    /// Entry point for the DIO0 interrupt handler.
    ///
    /// Returns `false` when nothing is installed.
    pub fn dispatch(&self) -> bool {
        self.with(|instance| instance.on_interrupt()).is_some()
    }
}

impl<T> Default for InterruptSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }

    impl InterruptHandler for Counter {
        fn on_interrupt(&mut self) {
            self.hits += 1;
        }
    }

    static SLOT: InterruptSlot<Counter> = InterruptSlot::new();

    #[test]
    fn dispatch_reaches_installed_instance() {
        assert!(!SLOT.dispatch());

        SLOT.install(Counter::default());
        assert!(SLOT.is_installed());
        assert!(SLOT.dispatch());
        assert!(SLOT.dispatch());
        assert_eq!(SLOT.with(|counter| counter.hits), Some(2));

        let counter = SLOT.take().unwrap();
        assert_eq!(counter.hits, 2);
        assert!(!SLOT.dispatch());
    }

    #[test]
    fn install_replaces_previous() {
        let slot = InterruptSlot::new();
        assert!(slot.install(Counter { hits: 7 }).is_none());
        let previous = slot.install(Counter::default()).unwrap();
        assert_eq!(previous.hits, 7);
    }
}
