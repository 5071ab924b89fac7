// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Standard error enum for invoking power management operations.

/// Standard errors in the power management subsystem.
///
/// Device transition callbacks return these, and the suspension engine
/// interprets them: `NODEVICE`, `NOSUPPORT` and `ALREADY` are benign when
/// walking the device table, anything else aborts the suspend cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ErrorCode {
    /// Generic failure condition
    FAIL,
    /// Underlying device is busy; retry
    BUSY,
    /// The state requested is already set
    ALREADY,
    /// The component is powered down
    OFF,
    /// An invalid parameter was passed
    INVAL,
    /// Operation or transition is unsupported
    NOSUPPORT,
    /// Device does not participate in power management
    NODEVICE,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}
