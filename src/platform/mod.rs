// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interfaces between the power subsystem and the rest of the system.
//!
//! The engine never talks to hardware or to kernel internals directly;
//! everything it consumes is behind one of the traits in this module and
//! supplied by the board through a [`PmResources`] bundle.

mod policy;
mod port;
mod state_driver;

pub use policy::IdlePolicy;
pub use port::{CycleCounter, InterruptControl, KernelScheduler, SystemTimer};
pub use state_driver::PowerStateDriver;

/// Combination trait that boards provide to the power management engine
/// with all of the platform-specific pieces it depends on.
///
/// This is the primary method for wiring the engine into a specific
/// kernel port: implement each component trait (or reuse `()` where a
/// default exists) and hand the engine a long-lived borrow of the bundle.
pub trait PmResources {
    /// The SoC-specific sleep entry/exit primitive.
    type StateDriver: PowerStateDriver;

    /// The decision function picking a sleep state for a wake-up horizon.
    type Policy: IdlePolicy;

    /// The kernel tick timer used to arm the wake-up deadline.
    type Timer: SystemTimer;

    /// The cycle source used to measure residency.
    type Cycles: CycleCounter;

    /// The scheduler re-entry barrier and CPU identity.
    type Scheduler: KernelScheduler;

    /// Architectural interrupt masking.
    type Irq: InterruptControl;

    fn state_driver(&self) -> &Self::StateDriver;
    fn policy(&self) -> &Self::Policy;
    fn timer(&self) -> &Self::Timer;
    fn cycle_counter(&self) -> &Self::Cycles;
    fn scheduler(&self) -> &Self::Scheduler;
    fn irq(&self) -> &Self::Irq;
}
