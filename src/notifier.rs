// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Registry of subsystems observing power state transitions.
//!
//! Subsystems that need to act on entry to or exit from a CPU sleep state
//! own a [`PmNotifier`] node and register a borrow of it with the engine.
//! Callbacks run from the idle path or the wake ISR with interrupts
//! masked: they must not block, must not call back into the power
//! subsystem, and must not register or unregister notifiers.

use spin::Mutex;

use crate::collections::list::{List, ListLink, ListNode};
use crate::errorcode::ErrorCode;
use crate::state::PowerState;

/// An entry/exit observer node.
///
/// Either callback may be `None` when only one direction is of interest.
pub struct PmNotifier<'a> {
    link: ListLink<'a, PmNotifier<'a>>,
    on_entry: Option<fn(PowerState)>,
    on_exit: Option<fn(PowerState)>,
}

impl<'a> PmNotifier<'a> {
    pub const fn new(
        on_entry: Option<fn(PowerState)>,
        on_exit: Option<fn(PowerState)>,
    ) -> PmNotifier<'a> {
        PmNotifier {
            link: ListLink::empty(),
            on_entry,
            on_exit,
        }
    }
}

impl<'a> ListNode<'a, PmNotifier<'a>> for PmNotifier<'a> {
    fn next(&'a self) -> &'a ListLink<'a, PmNotifier<'a>> {
        &self.link
    }
}

// The link cell is only touched while the owning registry's lock is held;
// the remaining fields are immutable function pointers.
unsafe impl Sync for PmNotifier<'_> {}

/// The registry itself: an insertion-ordered intrusive list behind a spin
/// lock, so registrations from thread context are safe against broadcasts
/// from the idle path on another CPU.
pub(crate) struct NotifierRegistry<'a> {
    list: Mutex<List<'a, PmNotifier<'a>>>,
}

impl<'a> NotifierRegistry<'a> {
    pub(crate) const fn new() -> NotifierRegistry<'a> {
        NotifierRegistry {
            list: Mutex::new(List::new()),
        }
    }

    pub(crate) fn register(&self, notifier: &'a PmNotifier<'a>) {
        self.list.lock().push_tail(notifier);
    }

    pub(crate) fn unregister(&self, notifier: &'a PmNotifier<'a>) -> Result<(), ErrorCode> {
        if self.list.lock().remove(notifier) {
            Ok(())
        } else {
            Err(ErrorCode::INVAL)
        }
    }

    /// Invoke the entry or exit callback of every registered notifier, in
    /// registration order.
    pub(crate) fn broadcast(&self, entering: bool, state: PowerState) {
        let list = self.list.lock();
        for notifier in list.iter() {
            let callback = if entering {
                notifier.on_entry
            } else {
                notifier.on_exit
            };
            if let Some(callback) = callback {
                callback(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn broadcast_visits_registered_notifiers() {
        static ENTRIES: AtomicU32 = AtomicU32::new(0);
        static EXITS: AtomicU32 = AtomicU32::new(0);
        fn on_entry(_state: PowerState) {
            ENTRIES.fetch_add(1, Ordering::Relaxed);
        }
        fn on_exit(_state: PowerState) {
            EXITS.fetch_add(1, Ordering::Relaxed);
        }

        let notifier = PmNotifier::new(Some(on_entry), Some(on_exit));
        let registry = NotifierRegistry::new();
        registry.register(&notifier);

        registry.broadcast(true, PowerState::Standby);
        assert_eq!(ENTRIES.load(Ordering::Relaxed), 1);
        assert_eq!(EXITS.load(Ordering::Relaxed), 0);

        registry.broadcast(false, PowerState::Standby);
        assert_eq!(ENTRIES.load(Ordering::Relaxed), 1);
        assert_eq!(EXITS.load(Ordering::Relaxed), 1);

        assert_eq!(registry.unregister(&notifier), Ok(()));
        registry.broadcast(true, PowerState::Standby);
        assert_eq!(ENTRIES.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn unregister_unknown_notifier_is_invalid() {
        let registered = PmNotifier::new(None, None);
        let stranger = PmNotifier::new(None, None);
        let registry = NotifierRegistry::new();
        registry.register(&registered);

        assert_eq!(registry.unregister(&stranger), Err(ErrorCode::INVAL));
        assert_eq!(registry.unregister(&registered), Ok(()));
        assert_eq!(registry.unregister(&registered), Err(ErrorCode::INVAL));
    }

    #[test]
    fn broadcast_runs_in_registration_order() {
        static ORDER: AtomicU32 = AtomicU32::new(0);
        static FIRST_AT: AtomicU32 = AtomicU32::new(u32::MAX);
        static SECOND_AT: AtomicU32 = AtomicU32::new(u32::MAX);
        fn first(_state: PowerState) {
            FIRST_AT.store(ORDER.fetch_add(1, Ordering::Relaxed), Ordering::Relaxed);
        }
        fn second(_state: PowerState) {
            SECOND_AT.store(ORDER.fetch_add(1, Ordering::Relaxed), Ordering::Relaxed);
        }

        let a = PmNotifier::new(Some(first), None);
        let b = PmNotifier::new(Some(second), None);
        let registry = NotifierRegistry::new();
        registry.register(&a);
        registry.register(&b);

        registry.broadcast(true, PowerState::RuntimeIdle);
        assert!(FIRST_AT.load(Ordering::Relaxed) < SECOND_AT.load(Ordering::Relaxed));
    }

    #[test]
    fn none_callbacks_are_skipped() {
        static EXITS: AtomicU32 = AtomicU32::new(0);
        fn on_exit(_state: PowerState) {
            EXITS.fetch_add(1, Ordering::Relaxed);
        }

        let exit_only = PmNotifier::new(None, Some(on_exit));
        let registry = NotifierRegistry::new();
        registry.register(&exit_only);

        registry.broadcast(true, PowerState::SoftOff);
        assert_eq!(EXITS.load(Ordering::Relaxed), 0);
        registry.broadcast(false, PowerState::SoftOff);
        assert_eq!(EXITS.load(Ordering::Relaxed), 1);
    }
}
