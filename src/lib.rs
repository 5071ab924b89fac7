// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Power management for preemptive, SMP-capable RTOS kernels.
//!
//! This crate implements the suspension side of a kernel's idle path: given
//! the time until the next scheduled deadline, it asks a board-supplied
//! policy for the deepest safe CPU sleep state, quiesces peripheral devices,
//! notifies interested subsystems, and hands control to the SoC-specific
//! sleep primitive. On the interrupt-driven wake it restores everything in
//! the opposite order without losing kernel timing or device state.
//!
//! Everything the engine consumes from the rest of the system -- the idle
//! policy, the tick timer, the cycle counter, the scheduler lock, interrupt
//! control, and the SoC sleep hooks -- is supplied through the traits in
//! [`platform`], bundled by [`platform::PmResources`]. The crate is
//! `#![no_std]` and allocation free: the board constructs one long-lived
//! [`PowerManagement`] object and hands it borrows of the device table and
//! its platform resources.

#![no_std]

pub mod collections;
pub mod platform;

mod config;
mod device;
mod errorcode;
mod notifier;
mod state;
mod stats;
mod suspend;

pub use device::suspension::DeviceSuspension;
pub use device::{Device, DeviceAction, DeviceActionFn, DeviceState};
pub use errorcode::ErrorCode;
pub use notifier::PmNotifier;
pub use state::{PowerState, PowerStateInfo};
pub use stats::{StateStats, StatsName};
pub use suspend::PowerManagement;
