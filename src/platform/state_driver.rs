// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interface for the SoC-specific sleep primitive.

use crate::platform::port::InterruptControl;
use crate::state::PowerStateInfo;

/// SoC hooks that actually enter and leave a CPU power state.
///
/// Ports override both methods. The provided defaults stand in where a
/// port supplies nothing: entering a state does nothing (the CPU never
/// sleeps, which is a misconfiguration but keeps the system correct), and
/// exit restores the interrupt mask.
pub trait PowerStateDriver {
    /// Put the CPU into `state`. Called with interrupts masked and the
    /// scheduler locked; the implementation may unmask interrupts as part
    /// of its sleep sequence. On SoCs whose sleep instruction resumes in
    /// place this returns after wake-up; on SoCs that wake through the
    /// ISR only, the wake ISR must call `system_resume` before this
    /// returns to the idle loop.
    fn power_state_set(&self, state: &PowerStateInfo) {
        let _ = state;
    }

    /// Arch/SoC bookkeeping after leaving `state`: restore context lost
    /// in deep sleep and unmask interrupts. The kernel expects interrupts
    /// to be enabled when this returns.
    fn exit_post_ops(&self, state: &PowerStateInfo, irq: &dyn InterruptControl) {
        let _ = state;
        irq.unmask_all();
    }
}

/// Implement the default driver for unit, for ports without SoC hooks.
impl PowerStateDriver for () {}
