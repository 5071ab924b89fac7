// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interface for idle-state policies.

use crate::state::PowerStateInfo;

/// Decision function picking the power state to enter from the idle path.
///
/// Implementations are pure from the engine's point of view: given the
/// time remaining until the next scheduled deadline they return a
/// descriptor,
/// and returning [`PowerStateInfo::active`] means "stay awake". How the
/// policy weighs residency against latency (lookup tables, device
/// constraints, history) is entirely its own business.
pub trait IdlePolicy {
    /// Pick the deepest state that is safe to enter when the next kernel
    /// deadline is `ticks_until_deadline` ticks away. `None` means no
    /// deadline is scheduled and the system may sleep indefinitely.
    fn next_state(&self, ticks_until_deadline: Option<u32>) -> PowerStateInfo;
}
