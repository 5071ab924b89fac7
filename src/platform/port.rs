// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Kernel and architecture services consumed by the engine.

/// Architectural interrupt masking on the current CPU.
pub trait InterruptControl {
    /// Mask interrupts, returning an opaque key encoding the previous
    /// mask state.
    fn mask(&self) -> usize;

    /// Restore the mask state captured by [`InterruptControl::mask`].
    fn unmask(&self, key: usize);

    /// Unconditionally enable interrupts on the current CPU.
    fn unmask_all(&self);
}

/// Scheduler services: the re-entry barrier held across the sleep window
/// and the identity of the executing CPU.
pub trait KernelScheduler {
    /// Prevent this CPU from scheduling another thread until
    /// [`KernelScheduler::unlock`]. Calls do not nest.
    fn lock(&self);

    fn unlock(&self);

    /// Index of the CPU this is called from, `0..NUM_CPUS`.
    fn current_cpu(&self) -> usize;
}

/// The kernel tick timer.
pub trait SystemTimer {
    /// Program the next tick interrupt to fire `ticks` from now. `idle`
    /// hints that the CPU is entering an idle state and intermediate
    /// ticks may be skipped.
    fn set_expiry(&self, ticks: u32, idle: bool);

    /// Convert microseconds to ticks, rounding up.
    fn ticks_from_us(&self, us: u32) -> u32;
}

/// Monotonic 32-bit cycle source for residency measurement. Wrapping is
/// expected and tolerated by the consumer.
pub trait CycleCounter {
    fn now(&self) -> u32;
}
