// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Per-device power management control blocks.
//!
//! Every entry in the kernel's device table carries a [`Device`] with a
//! small state machine (active / suspended / off), an atomic flags word,
//! and an optional action callback supplied by the driver. A device with
//! no callback does not participate in power management; all operations
//! on it degrade to no-ops or `NODEVICE`.
//!
//! Flag mutations are single-word atomics so ISRs and threads can share
//! the control block without extra locking.

pub(crate) mod suspension;

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use bitflags::bitflags;

use crate::errorcode::ErrorCode;

/// Externally visible device power states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceState {
    /// The device is powered and operational.
    Active = 0,
    /// The device is quiesced; context is retained or saved by the driver.
    Suspended = 1,
    /// The device is unpowered; context is lost.
    Off = 2,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Active => "active",
            DeviceState::Suspended => "suspended",
            DeviceState::Off => "off",
        }
    }

    fn from_u8(value: u8) -> DeviceState {
        match value {
            0 => DeviceState::Active,
            1 => DeviceState::Suspended,
            _ => DeviceState::Off,
        }
    }
}

/// Actions dispatched to a device's action callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceAction {
    Suspend,
    Resume,
    TurnOff,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct DeviceFlags: u32 {
        /// The device is in the middle of a transaction and must not be
        /// suspended.
        const BUSY = 1 << 0;
        /// The hardware can act as a wake-up source.
        const WS_CAPABLE = 1 << 1;
        /// The device is currently enabled as a wake-up source.
        const WS_ENABLED = 1 << 2;
        /// A state transition is in flight.
        const TRANSITIONING = 1 << 3;
    }
}

/// Driver-supplied transition callback. The callback performs the
/// hardware side of `action` and reports failure without touching the
/// stored state; the control block updates it only on success.
pub type DeviceActionFn = fn(&Device, DeviceAction) -> Result<(), ErrorCode>;

struct DevicePm {
    state: AtomicU8,
    flags: AtomicU32,
    action: Option<DeviceActionFn>,
}

/// A device table entry.
pub struct Device<'a> {
    name: &'a str,
    pm: DevicePm,
}

impl<'a> Device<'a> {
    /// A device that starts active and cannot act as a wake-up source.
    /// `action` of `None` opts the device out of power management.
    pub const fn new(name: &'a str, action: Option<DeviceActionFn>) -> Device<'a> {
        Device {
            name,
            pm: DevicePm {
                state: AtomicU8::new(DeviceState::Active as u8),
                flags: AtomicU32::new(DeviceFlags::empty().bits()),
                action,
            },
        }
    }

    /// Like [`Device::new`] for hardware wired as a wake-up source.
    pub const fn new_wakeup_capable(name: &'a str, action: Option<DeviceActionFn>) -> Device<'a> {
        Device {
            name,
            pm: DevicePm {
                state: AtomicU8::new(DeviceState::Active as u8),
                flags: AtomicU32::new(DeviceFlags::WS_CAPABLE.bits()),
                action,
            },
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    fn participates(&self) -> bool {
        self.pm.action.is_some()
    }

    fn flags(&self) -> DeviceFlags {
        DeviceFlags::from_bits_truncate(self.pm.flags.load(Ordering::Relaxed))
    }

    /// Drive the device to `target`.
    ///
    /// Returns `NODEVICE` when the device does not participate, `BUSY`
    /// when a transition is already in flight, `ALREADY` when the device
    /// is at `target`, and `NOSUPPORT` for the off-to-suspended
    /// transition. A callback failure is propagated unchanged and leaves
    /// the stored state untouched.
    pub fn set_state(&self, target: DeviceState) -> Result<(), ErrorCode> {
        let action_cb = self.pm.action.ok_or(ErrorCode::NODEVICE)?;

        if self.flags().contains(DeviceFlags::TRANSITIONING) {
            return Err(ErrorCode::BUSY);
        }

        let current = DeviceState::from_u8(self.pm.state.load(Ordering::Relaxed));
        let action = match target {
            DeviceState::Suspended => match current {
                DeviceState::Suspended => return Err(ErrorCode::ALREADY),
                DeviceState::Off => return Err(ErrorCode::NOSUPPORT),
                DeviceState::Active => DeviceAction::Suspend,
            },
            DeviceState::Active => {
                if current == DeviceState::Active {
                    return Err(ErrorCode::ALREADY);
                }
                DeviceAction::Resume
            }
            DeviceState::Off => {
                if current == DeviceState::Off {
                    return Err(ErrorCode::ALREADY);
                }
                DeviceAction::TurnOff
            }
        };

        action_cb(self, action)?;
        self.pm.state.store(target as u8, Ordering::Relaxed);
        Ok(())
    }

    pub fn state(&self) -> Result<DeviceState, ErrorCode> {
        if !self.participates() {
            return Err(ErrorCode::NODEVICE);
        }
        Ok(DeviceState::from_u8(self.pm.state.load(Ordering::Relaxed)))
    }

    pub fn is_busy(&self) -> bool {
        self.participates() && self.flags().contains(DeviceFlags::BUSY)
    }

    pub fn busy_set(&self) {
        if self.participates() {
            self.pm
                .flags
                .fetch_or(DeviceFlags::BUSY.bits(), Ordering::Relaxed);
        }
    }

    pub fn busy_clear(&self) {
        if self.participates() {
            self.pm
                .flags
                .fetch_and(!DeviceFlags::BUSY.bits(), Ordering::Relaxed);
        }
    }

    /// Mark a transition as in flight, making concurrent `set_state`
    /// calls fail with `BUSY`. Callers whose action callbacks may
    /// themselves suspend are responsible for setting and clearing this
    /// around the transition.
    pub fn transitioning_set(&self) {
        if self.participates() {
            self.pm
                .flags
                .fetch_or(DeviceFlags::TRANSITIONING.bits(), Ordering::Relaxed);
        }
    }

    pub fn transitioning_clear(&self) {
        if self.participates() {
            self.pm
                .flags
                .fetch_and(!DeviceFlags::TRANSITIONING.bits(), Ordering::Relaxed);
        }
    }

    /// Enable or disable the device as a wake-up source.
    ///
    /// Single-shot compare-and-set: returns `false` when the device does
    /// not participate, is not wake-capable, or when the flags word
    /// changed concurrently.
    pub fn wakeup_enable(&self, enable: bool) -> bool {
        if !self.participates() {
            return false;
        }

        let flags = self.pm.flags.load(Ordering::Relaxed);
        if flags & DeviceFlags::WS_CAPABLE.bits() == 0 {
            return false;
        }

        let new_flags = if enable {
            flags | DeviceFlags::WS_ENABLED.bits()
        } else {
            flags & !DeviceFlags::WS_ENABLED.bits()
        };

        self.pm
            .flags
            .compare_exchange(flags, new_flags, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }

    pub fn wakeup_is_enabled(&self) -> bool {
        self.participates() && self.flags().contains(DeviceFlags::WS_ENABLED)
    }

    pub fn wakeup_is_capable(&self) -> bool {
        self.participates() && self.flags().contains(DeviceFlags::WS_CAPABLE)
    }
}
