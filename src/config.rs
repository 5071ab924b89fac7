// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Data structure for storing compile-time configuration options.
//!
//! Configuration is a typed `const` object rather than scattered `#[cfg]`
//! attributes so that every code path stays type-checked regardless of
//! which features are enabled; the compiler folds the constants and
//! removes the disabled paths from the binary.

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, enable or disable the corresponding Cargo
/// features of this crate.
pub(crate) struct Config {
    /// Whether per-CPU, per-state residency statistics are recorded.
    ///
    /// If enabled, every suspend cycle samples the cycle counter around
    /// the SoC sleep hook and accounts the delta to the entered state.
    /// If disabled, the recording paths constant-fold to no-ops.
    pub(crate) residency_stats: bool,

    /// Whether the device suspension scheduler traces each device it
    /// moves, at trace log level. Useful when bringing up a new board to
    /// see which device refuses to suspend.
    pub(crate) trace_suspension: bool,
}

/// A unique instance of `Config` where compile-time configuration options
/// are defined. This is the only place in the crate where Cargo features
/// are consulted.
pub(crate) const CONFIG: Config = Config {
    residency_stats: cfg!(feature = "residency_stats"),
    trace_suspension: cfg!(feature = "trace_suspension"),
};
