// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! CPU suspension engine.
//!
//! The orchestrator sitting between the idle path, the idle policy, the
//! tick timer, the device table, and the SoC sleep hooks. A suspend cycle
//! is split in two because the hardware wake path is asymmetric: entry
//! runs on the idle thread with interrupts masked, while the exit work may
//! run either on the same path (SoCs whose sleep instruction returns in
//! place) or inside the first wake ISR (SoCs that resume through the
//! vector table only). The `post_ops_pending` flag carries the deferred
//! exit work across that boundary and makes [`PowerManagement::system_resume`]
//! idempotent, so the work runs exactly once per suspension either way.

use core::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use spin::Mutex;

use crate::device::suspension::DeviceSuspension;
use crate::device::Device;
use crate::errorcode::ErrorCode;
use crate::notifier::{NotifierRegistry, PmNotifier};
use crate::platform::{
    CycleCounter, IdlePolicy, InterruptControl, KernelScheduler, PmResources, PowerStateDriver,
    SystemTimer,
};
use crate::state::{PowerState, PowerStateInfo};
use crate::stats::{ResidencyStats, StateStats, StatsName};

/// The power management subsystem.
///
/// One long-lived instance serves the whole system. Per-CPU state
/// (timings, statistics) is indexed by [`crate::platform::KernelScheduler::current_cpu`];
/// the in-flight transition descriptor is system-wide, so deep-sleep
/// cycles that suspend devices are one-at-a-time by construction, as on
/// the idle path of the last CPU to go quiet.
///
/// `NUM_CPUS` sizes the statistics tables; `MAX_DEVICES` sizes the
/// suspended-device slots and must be at least the device table length.
pub struct PowerManagement<'a, R: PmResources, const NUM_CPUS: usize, const MAX_DEVICES: usize> {
    resources: &'a R,
    devices: DeviceSuspension<'a, MAX_DEVICES>,
    notifiers: NotifierRegistry<'a>,
    transition: Mutex<PowerStateInfo>,
    post_ops_pending: AtomicBool,
    stats: ResidencyStats<NUM_CPUS>,
}

impl<'a, R: PmResources, const NUM_CPUS: usize, const MAX_DEVICES: usize>
    PowerManagement<'a, R, NUM_CPUS, MAX_DEVICES>
{
    /// `device_table` must list devices in registration order,
    /// dependencies before dependents.
    pub fn new(
        resources: &'a R,
        device_table: &'a [Device<'a>],
    ) -> PowerManagement<'a, R, NUM_CPUS, MAX_DEVICES> {
        PowerManagement {
            resources,
            devices: DeviceSuspension::new(device_table),
            notifiers: NotifierRegistry::new(),
            transition: Mutex::new(PowerStateInfo::active()),
            post_ops_pending: AtomicBool::new(false),
            stats: ResidencyStats::new(),
        }
    }

    /// Suspend the CPU from the idle path.
    ///
    /// `ticks` is the time until the next scheduled kernel deadline, or
    /// `None` when nothing is scheduled. Asks the policy for a state,
    /// arms the tick early enough to cover the state's exit latency,
    /// quiesces devices for states deeper than runtime idle, and hands
    /// control to the SoC hook. Returns the state that was entered;
    /// [`PowerState::Active`] means the cycle was skipped or aborted.
    ///
    /// Called with interrupts masked by the architecture layer.
    pub fn system_suspend(&self, ticks: Option<u32>) -> PowerState {
        let info = self.resources.policy().next_state(ticks);
        *self.transition.lock() = info;
        if info.state() == PowerState::Active {
            debug!("no power state operations done");
            return PowerState::Active;
        }
        self.post_ops_pending.store(true, Ordering::Release);

        if let Some(ticks) = ticks {
            // Sanity check in case the policy does not maintain the
            // residency contract itself.
            debug_assert!(
                info.min_residency_us() >= info.exit_latency_us(),
                "min_residency_us < exit_latency_us"
            );

            // Wake a little early so the CPU is back at full speed by the
            // time the deadline arrives.
            let timer = self.resources.timer();
            let latency_ticks = timer.ticks_from_us(info.exit_latency_us());
            timer.set_expiry(ticks.saturating_sub(latency_ticks), true);
        }

        let mut resume_devices = false;
        if info.state() > PowerState::RuntimeIdle {
            if self.devices.suspend_all().is_err() {
                return self.handle_device_abort();
            }
            resume_devices = true;
        }

        // Interrupts are masked here, but the SoC hook is expected to
        // unmask them while sleeping. The scheduler lock keeps this CPU
        // on the current context until the exit notification has run in
        // system_resume().
        let scheduler = self.resources.scheduler();
        let cycles = self.resources.cycle_counter();
        scheduler.lock();
        let cpu = scheduler.current_cpu();
        self.stats.start_timer(cpu, cycles.now());
        self.notifiers.broadcast(true, info.state());
        self.resources.state_driver().power_state_set(&info);
        self.stats.stop_timer(cpu, cycles.now());

        // Wake-up sequence starts here.
        if resume_devices {
            self.devices.resume_all();
        }
        self.stats.update(cpu, info.state());
        self.system_resume();
        scheduler.unlock();
        info.state()
    }

    /// Complete the exit half of a suspension.
    ///
    /// Callable from the ISR of the wake event: on SoCs where the sleep
    /// state enables interrupts atomically, the first code to run after
    /// wake is the ISR, and the post-ops and exit notification must run
    /// there, before the scheduler can pick another thread. Idempotent;
    /// interrupts are unmasked when this returns.
    pub fn system_resume(&self) {
        if self
            .post_ops_pending
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let info = *self.transition.lock();
            self.resources
                .state_driver()
                .exit_post_ops(&info, self.resources.irq());
            self.notifiers.broadcast(false, info.state());
        }
    }

    /// Enter `info` immediately, bypassing the policy.
    ///
    /// Devices are not suspended and the tick is not re-armed; the caller
    /// answers for the consequences of the state it picked.
    pub fn power_state_force(&self, info: PowerStateInfo) {
        debug_assert!(
            info.state() != PowerState::Active,
            "forcing the active state"
        );
        if info.state() == PowerState::Active {
            return;
        }

        let _ = self.resources.irq().mask();
        *self.transition.lock() = info;
        self.post_ops_pending.store(true, Ordering::Release);
        self.notifiers.broadcast(true, info.state());

        let scheduler = self.resources.scheduler();
        let cycles = self.resources.cycle_counter();
        scheduler.lock();
        let cpu = scheduler.current_cpu();
        self.stats.start_timer(cpu, cycles.now());
        self.resources.state_driver().power_state_set(&info);
        self.stats.stop_timer(cpu, cycles.now());

        self.system_resume();
        scheduler.unlock();
    }

    /// Snapshot of the in-flight or most recent transition descriptor.
    pub fn next_state(&self) -> PowerStateInfo {
        *self.transition.lock()
    }

    fn handle_device_abort(&self) -> PowerState {
        debug!("some devices did not enter the suspend state");
        self.devices.resume_all();
        self.post_ops_pending.store(false, Ordering::Release);
        *self.transition.lock() = PowerStateInfo::active();
        PowerState::Active
    }

    /// Register a transition observer. Nodes are visited in registration
    /// order.
    pub fn notifier_register(&self, notifier: &'a PmNotifier<'a>) {
        self.notifiers.register(notifier);
    }

    /// Remove a previously registered observer. Fails with `INVAL` when
    /// the node is not linked.
    pub fn notifier_unregister(&self, notifier: &'a PmNotifier<'a>) -> Result<(), ErrorCode> {
        self.notifiers.unregister(notifier)
    }

    /// Suspend all eligible devices outside a CPU suspend cycle, for
    /// system-off style flows. See [`DeviceSuspension::suspend_all`].
    pub fn suspend_devices(&self) -> Result<(), ErrorCode> {
        self.devices.suspend_all()
    }

    /// See [`DeviceSuspension::resume_all`].
    pub fn resume_devices(&self) {
        self.devices.resume_all()
    }

    pub fn device_is_any_busy(&self) -> bool {
        self.devices.is_any_busy()
    }

    /// Statistics snapshot for one CPU and state.
    pub fn stats(&self, cpu: usize, state: PowerState) -> StateStats {
        self.stats.get(cpu, state)
    }

    /// All statistics rows with their names, CPU-major.
    pub fn stats_rows(
        &self,
    ) -> impl Iterator<Item = (StatsName, StateStats)> + use<'_, 'a, R, NUM_CPUS, MAX_DEVICES> {
        (0..NUM_CPUS).flat_map(move |cpu| {
            PowerState::ALL
                .iter()
                .map(move |&state| (StatsName::new(cpu, state), self.stats.get(cpu, state)))
        })
    }
}
