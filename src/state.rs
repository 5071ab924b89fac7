// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! CPU power state tags and descriptors.

/// Ordered enumeration of CPU power states.
///
/// Deeper sleep states compare greater, so "is this deeper than runtime
/// idle" is an ordinary comparison. Which states exist on a given SoC and
/// what they cost is the policy's and the port's business; the engine only
/// relies on the ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum PowerState {
    /// The CPU is running normally.
    Active = 0,
    /// Lightest sleep: the CPU core idles, devices keep running.
    RuntimeIdle = 1,
    /// The CPU and most clocks stop; RAM and devices stay powered.
    SuspendToIdle = 2,
    /// Standby with fast wake-up.
    Standby = 3,
    /// Everything but RAM loses power.
    SuspendToRam = 4,
    /// State is saved to non-volatile storage, RAM powers down.
    SuspendToDisk = 5,
    /// Deepest state; wake is equivalent to a cold boot.
    SoftOff = 6,
}

impl PowerState {
    /// Number of power states, for sizing per-state tables.
    pub const COUNT: usize = 7;

    /// All states in ascending depth order.
    pub const ALL: [PowerState; PowerState::COUNT] = [
        PowerState::Active,
        PowerState::RuntimeIdle,
        PowerState::SuspendToIdle,
        PowerState::Standby,
        PowerState::SuspendToRam,
        PowerState::SuspendToDisk,
        PowerState::SoftOff,
    ];
}

/// Descriptor of a candidate CPU sleep state.
///
/// Produced by the idle policy and consumed by the engine and the SoC
/// hooks. Immutable once constructed. The minimum residency must be
/// larger than the exit latency, otherwise entering the state can never
/// pay off; the engine checks this in debug builds before arming the
/// wake-up timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerStateInfo {
    state: PowerState,
    substate_id: Option<u8>,
    min_residency_us: u32,
    exit_latency_us: u32,
}

impl PowerStateInfo {
    /// Descriptor for the active state. Returned by policies that decide
    /// sleeping is not worth it.
    pub const fn active() -> PowerStateInfo {
        PowerStateInfo {
            state: PowerState::Active,
            substate_id: None,
            min_residency_us: 0,
            exit_latency_us: 0,
        }
    }

    pub const fn new(
        state: PowerState,
        min_residency_us: u32,
        exit_latency_us: u32,
    ) -> PowerStateInfo {
        PowerStateInfo {
            state,
            substate_id: None,
            min_residency_us,
            exit_latency_us,
        }
    }

    /// Like [`PowerStateInfo::new`], with a SoC-specific sub-state
    /// identifier disambiguating several hardware states that map to the
    /// same tag.
    pub const fn with_substate(
        state: PowerState,
        substate_id: u8,
        min_residency_us: u32,
        exit_latency_us: u32,
    ) -> PowerStateInfo {
        PowerStateInfo {
            state,
            substate_id: Some(substate_id),
            min_residency_us,
            exit_latency_us,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn substate_id(&self) -> Option<u8> {
        self.substate_id
    }

    /// Minimum time the system must stay in the state for entering it to
    /// be worthwhile, in microseconds.
    pub fn min_residency_us(&self) -> u32 {
        self.min_residency_us
    }

    /// Worst-case delay between the wake signal and the CPU executing at
    /// full speed again, in microseconds.
    pub fn exit_latency_us(&self) -> u32 {
        self.exit_latency_us
    }
}
