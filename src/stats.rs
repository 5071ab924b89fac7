// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Per-CPU, per-state residency statistics.
//!
//! Each suspend cycle samples the 32-bit cycle counter immediately before
//! and after the SoC sleep hook; the difference is accounted to the state
//! that was entered. Subtraction is modular: residencies on the targeted
//! hardware are far below 2^32 cycles, so a wrapped counter still yields
//! the correct delta. Recording is gated by the `residency_stats` feature
//! through [`crate::config`].
//!
//! Counters use relaxed atomics: every CPU is the sole writer of its own
//! row, readers only ever see a torn *set* of counters, never a torn
//! counter.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::CONFIG;
use crate::state::PowerState;

/// Snapshot of one statistics row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateStats {
    /// Number of completed entries into the state.
    pub state_count: u32,
    /// Residency of the most recent entry, in cycles.
    pub state_last_cycles: u32,
    /// Cumulative residency, in cycles.
    pub state_total_cycles: u32,
}

struct StatRow {
    count: AtomicU32,
    last: AtomicU32,
    total: AtomicU32,
}

impl StatRow {
    const fn new() -> StatRow {
        StatRow {
            count: AtomicU32::new(0),
            last: AtomicU32::new(0),
            total: AtomicU32::new(0),
        }
    }
}

struct CpuTiming {
    start: AtomicU32,
    end: AtomicU32,
}

impl CpuTiming {
    const fn new() -> CpuTiming {
        CpuTiming {
            start: AtomicU32::new(0),
            end: AtomicU32::new(0),
        }
    }
}

pub(crate) struct ResidencyStats<const NUM_CPUS: usize> {
    timings: [CpuTiming; NUM_CPUS],
    rows: [[StatRow; PowerState::COUNT]; NUM_CPUS],
}

impl<const NUM_CPUS: usize> ResidencyStats<NUM_CPUS> {
    const TIMING: CpuTiming = CpuTiming::new();
    const ROW: StatRow = StatRow::new();
    const STATE_ROWS: [StatRow; PowerState::COUNT] = [Self::ROW; PowerState::COUNT];

    pub(crate) const fn new() -> ResidencyStats<NUM_CPUS> {
        ResidencyStats {
            timings: [Self::TIMING; NUM_CPUS],
            rows: [Self::STATE_ROWS; NUM_CPUS],
        }
    }

    pub(crate) fn start_timer(&self, cpu: usize, now: u32) {
        if !CONFIG.residency_stats {
            return;
        }
        self.timings[cpu].start.store(now, Ordering::Relaxed);
    }

    pub(crate) fn stop_timer(&self, cpu: usize, now: u32) {
        if !CONFIG.residency_stats {
            return;
        }
        self.timings[cpu].end.store(now, Ordering::Relaxed);
    }

    pub(crate) fn update(&self, cpu: usize, state: PowerState) {
        if !CONFIG.residency_stats {
            return;
        }
        let timing = &self.timings[cpu];
        let delta = timing
            .end
            .load(Ordering::Relaxed)
            .wrapping_sub(timing.start.load(Ordering::Relaxed));
        let row = &self.rows[cpu][state as usize];
        row.count.fetch_add(1, Ordering::Relaxed);
        row.last.store(delta, Ordering::Relaxed);
        row.total.fetch_add(delta, Ordering::Relaxed);
    }

    pub(crate) fn get(&self, cpu: usize, state: PowerState) -> StateStats {
        let row = &self.rows[cpu][state as usize];
        StateStats {
            state_count: row.count.load(Ordering::Relaxed),
            state_last_cycles: row.last.load(Ordering::Relaxed),
            state_total_cycles: row.total.load(Ordering::Relaxed),
        }
    }
}

/// Name of a statistics row, formatted as `pm_cpu_<NNN>_state_<N>_stats`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsName {
    cpu: usize,
    state: PowerState,
}

impl StatsName {
    pub const fn new(cpu: usize, state: PowerState) -> StatsName {
        StatsName { cpu, state }
    }
}

impl fmt::Display for StatsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pm_cpu_{:03}_state_{}_stats", self.cpu, self.state as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_applies_all_three_counters() {
        let stats: ResidencyStats<2> = ResidencyStats::new();
        stats.start_timer(1, 1000);
        stats.stop_timer(1, 1600);
        stats.update(1, PowerState::RuntimeIdle);
        stats.start_timer(1, 2000);
        stats.stop_timer(1, 2400);
        stats.update(1, PowerState::RuntimeIdle);

        let row = stats.get(1, PowerState::RuntimeIdle);
        assert_eq!(row.state_count, 2);
        assert_eq!(row.state_last_cycles, 400);
        assert_eq!(row.state_total_cycles, 1000);

        // Other CPUs and states stay untouched.
        assert_eq!(stats.get(0, PowerState::RuntimeIdle), StateStats::default());
        assert_eq!(stats.get(1, PowerState::Standby), StateStats::default());
    }

    #[test]
    fn counter_wrap_yields_correct_delta() {
        let stats: ResidencyStats<1> = ResidencyStats::new();
        stats.start_timer(0, u32::MAX - 99);
        stats.stop_timer(0, 100);
        stats.update(0, PowerState::SuspendToRam);
        assert_eq!(stats.get(0, PowerState::SuspendToRam).state_last_cycles, 200);
    }

    #[test]
    fn row_name_format() {
        let mut buf = [0u8; 32];
        let mut cursor = Cursor { buf: &mut buf, used: 0 };
        use core::fmt::Write;
        write!(cursor, "{}", StatsName::new(2, PowerState::SuspendToIdle)).unwrap();
        let written = core::str::from_utf8(&cursor.buf[..cursor.used]).unwrap();
        assert_eq!(written, "pm_cpu_002_state_2_stats");
    }

    struct Cursor<'a> {
        buf: &'a mut [u8],
        used: usize,
    }

    impl core::fmt::Write for Cursor<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            if self.used + bytes.len() > self.buf.len() {
                return Err(core::fmt::Error);
            }
            self.buf[self.used..self.used + bytes.len()].copy_from_slice(bytes);
            self.used += bytes.len();
            Ok(())
        }
    }
}
