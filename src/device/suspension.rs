// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Device suspension scheduler.
//!
//! Walks the device table in reverse registration order when the system
//! heads into a deep sleep state, records which devices were actually
//! moved, and reverses the walk symmetrically on wake. Registration order
//! is the dependency order: the driver model registers parents before
//! children, so the reverse walk suspends children first and the reverse
//! drain resumes parents first.

use log::{error, trace};
use spin::Mutex;

use crate::config::CONFIG;
use crate::device::{Device, DeviceState};
use crate::errorcode::ErrorCode;

struct SuspendedSlots<const MAX_DEVICES: usize> {
    slots: [usize; MAX_DEVICES],
    len: usize,
}

/// The suspension scheduler: a device table plus the slots tracking the
/// devices suspended during the current cycle.
pub struct DeviceSuspension<'a, const MAX_DEVICES: usize> {
    table: &'a [Device<'a>],
    suspended: Mutex<SuspendedSlots<MAX_DEVICES>>,
}

impl<'a, const MAX_DEVICES: usize> DeviceSuspension<'a, MAX_DEVICES> {
    /// `table` must list devices in registration order, dependencies
    /// before dependents, and must not exceed `MAX_DEVICES` entries.
    pub fn new(table: &'a [Device<'a>]) -> DeviceSuspension<'a, MAX_DEVICES> {
        debug_assert!(table.len() <= MAX_DEVICES);
        DeviceSuspension {
            table,
            suspended: Mutex::new(SuspendedSlots {
                slots: [0; MAX_DEVICES],
                len: 0,
            }),
        }
    }

    /// Suspend every eligible device, in reverse registration order.
    ///
    /// Busy and wake-enabled devices are skipped, as are devices that do
    /// not implement power management, do not support the transition, or
    /// are already suspended. Any other failure stops the walk and is
    /// returned; the devices suspended so far stay recorded so the caller
    /// can roll back with [`DeviceSuspension::resume_all`].
    pub fn suspend_all(&self) -> Result<(), ErrorCode> {
        let mut suspended = self.suspended.lock();
        suspended.len = 0;

        for (idx, dev) in self.table.iter().enumerate().rev() {
            if dev.is_busy() || dev.wakeup_is_enabled() {
                continue;
            }

            match dev.set_state(DeviceState::Suspended) {
                Ok(()) => {
                    if CONFIG.trace_suspension {
                        trace!("suspended {}", dev.name());
                    }
                    let len = suspended.len;
                    suspended.slots[len] = idx;
                    suspended.len = len + 1;
                }
                Err(ErrorCode::NODEVICE) | Err(ErrorCode::NOSUPPORT) | Err(ErrorCode::ALREADY) => {
                    continue;
                }
                Err(code) => {
                    error!(
                        "device {} did not enter {} state ({:?})",
                        dev.name(),
                        DeviceState::Suspended.as_str(),
                        code
                    );
                    return Err(code);
                }
            }
        }

        Ok(())
    }

    /// Resume every device suspended this cycle, in reverse suspension
    /// order, ignoring individual failures. Empties the slots.
    pub fn resume_all(&self) {
        let mut suspended = self.suspended.lock();

        for i in (0..suspended.len).rev() {
            let dev = &self.table[suspended.slots[i]];
            let _ = dev.set_state(DeviceState::Active);
            if CONFIG.trace_suspension {
                trace!("resumed {}", dev.name());
            }
        }

        suspended.len = 0;
    }

    /// Whether any participating device has its busy flag set.
    pub fn is_any_busy(&self) -> bool {
        self.table.iter().any(|dev| dev.is_busy())
    }

    #[cfg(test)]
    pub(crate) fn num_suspended(&self) -> usize {
        self.suspended.lock().len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceAction;
    use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    // Per-test event logs: (device initial, action) pairs packed into a
    // u32, appended through a shared sequence counter.
    fn record(log: &[AtomicU32], seq: &AtomicUsize, dev: &Device, action: DeviceAction) {
        let entry = ((dev.name().as_bytes()[0] as u32) << 8) | action as u32;
        let at = seq.fetch_add(1, Ordering::Relaxed);
        log[at].store(entry, Ordering::Relaxed);
    }

    fn entry(name: &str, action: DeviceAction) -> u32 {
        ((name.as_bytes()[0] as u32) << 8) | action as u32
    }

    #[test]
    fn suspend_runs_in_reverse_registration_order() {
        static LOG: [AtomicU32; 8] = [const { AtomicU32::new(0) }; 8];
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        fn act(dev: &Device, action: DeviceAction) -> Result<(), ErrorCode> {
            record(&LOG, &SEQ, dev, action);
            Ok(())
        }

        let table = [
            Device::new("a", Some(act)),
            Device::new("b", Some(act)),
            Device::new("c", Some(act)),
        ];
        let sched: DeviceSuspension<'_, 3> = DeviceSuspension::new(&table);

        assert_eq!(sched.suspend_all(), Ok(()));
        assert_eq!(sched.num_suspended(), 3);
        assert_eq!(LOG[0].load(Ordering::Relaxed), entry("c", DeviceAction::Suspend));
        assert_eq!(LOG[1].load(Ordering::Relaxed), entry("b", DeviceAction::Suspend));
        assert_eq!(LOG[2].load(Ordering::Relaxed), entry("a", DeviceAction::Suspend));

        sched.resume_all();
        assert_eq!(sched.num_suspended(), 0);
        // Resume order is the reverse of suspension: parents first.
        assert_eq!(LOG[3].load(Ordering::Relaxed), entry("a", DeviceAction::Resume));
        assert_eq!(LOG[4].load(Ordering::Relaxed), entry("b", DeviceAction::Resume));
        assert_eq!(LOG[5].load(Ordering::Relaxed), entry("c", DeviceAction::Resume));
        for dev in &table {
            assert_eq!(dev.state(), Ok(DeviceState::Active));
        }
    }

    #[test]
    fn failure_stops_walk_and_reports_first_error() {
        static LOG: [AtomicU32; 8] = [const { AtomicU32::new(0) }; 8];
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        fn accept(dev: &Device, action: DeviceAction) -> Result<(), ErrorCode> {
            record(&LOG, &SEQ, dev, action);
            Ok(())
        }
        fn refuse(dev: &Device, action: DeviceAction) -> Result<(), ErrorCode> {
            record(&LOG, &SEQ, dev, action);
            Err(ErrorCode::FAIL)
        }

        let table = [
            Device::new("a", Some(accept)),
            Device::new("b", Some(refuse)),
            Device::new("c", Some(accept)),
        ];
        let sched: DeviceSuspension<'_, 3> = DeviceSuspension::new(&table);

        assert_eq!(sched.suspend_all(), Err(ErrorCode::FAIL));
        assert_eq!(sched.num_suspended(), 1);
        assert_eq!(table[0].state(), Ok(DeviceState::Active));
        assert_eq!(table[1].state(), Ok(DeviceState::Active));
        assert_eq!(table[2].state(), Ok(DeviceState::Suspended));

        sched.resume_all();
        assert_eq!(table[2].state(), Ok(DeviceState::Active));
        // Only c was ever touched after the failure.
        assert_eq!(SEQ.load(Ordering::Relaxed), 3);
        assert_eq!(LOG[2].load(Ordering::Relaxed), entry("c", DeviceAction::Resume));
    }

    #[test]
    fn busy_and_wake_enabled_devices_are_skipped() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn act(_dev: &Device, _action: DeviceAction) -> Result<(), ErrorCode> {
            CALLS.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        let table = [
            Device::new("a", Some(act)),
            Device::new("b", Some(act)),
            Device::new_wakeup_capable("w", Some(act)),
        ];
        table[0].busy_set();
        assert!(table[2].wakeup_enable(true));

        let sched: DeviceSuspension<'_, 3> = DeviceSuspension::new(&table);
        assert_eq!(sched.suspend_all(), Ok(()));

        assert_eq!(sched.num_suspended(), 1);
        assert_eq!(CALLS.load(Ordering::Relaxed), 1);
        assert_eq!(table[0].state(), Ok(DeviceState::Active));
        assert_eq!(table[1].state(), Ok(DeviceState::Suspended));
        assert_eq!(table[2].state(), Ok(DeviceState::Active));
    }

    #[test]
    fn non_participating_devices_are_benign() {
        let table = [
            Device::new("a", None),
            Device::new("b", Some(|_: &Device, _| Ok(()))),
        ];
        let sched: DeviceSuspension<'_, 2> = DeviceSuspension::new(&table);
        assert_eq!(sched.suspend_all(), Ok(()));
        assert_eq!(sched.num_suspended(), 1);
        assert_eq!(table[1].state(), Ok(DeviceState::Suspended));
    }

    #[test]
    fn any_busy_scans_the_table() {
        let table = [
            Device::new("a", Some(|_: &Device, _| Ok(()))),
            Device::new("b", Some(|_: &Device, _| Ok(()))),
        ];
        let sched: DeviceSuspension<'_, 2> = DeviceSuspension::new(&table);
        assert!(!sched.is_any_busy());
        table[1].busy_set();
        assert!(sched.is_any_busy());
        table[1].busy_clear();
        assert!(!sched.is_any_busy());
    }
}
