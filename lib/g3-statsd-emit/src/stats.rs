/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time copy of the counters of a client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsdClientSnapshot {
    /// Packets (datagrams, or stream writes) handed to the OS successfully.
    pub sent_packets: u64,
    /// Metric lines contained in the sent packets.
    pub sent_lines: u64,
    /// Metric lines lost to transport errors or rejected before formatting.
    pub dropped_lines: u64,
    /// Observations skipped by the sampling decision.
    pub sampled_out: u64,
}

#[derive(Default)]
pub(crate) struct StatsdClientStats {
    sent_packets: AtomicU64,
    sent_lines: AtomicU64,
    dropped_lines: AtomicU64,
    sampled_out: AtomicU64,
}

impl StatsdClientStats {
    pub(crate) fn add_sent(&self, lines: usize) {
        self.sent_packets.fetch_add(1, Ordering::Relaxed);
        self.sent_lines.fetch_add(lines as u64, Ordering::Relaxed);
    }

    pub(crate) fn add_dropped(&self, lines: usize) {
        self.dropped_lines.fetch_add(lines as u64, Ordering::Relaxed);
    }

    pub(crate) fn add_sampled_out(&self) {
        self.sampled_out.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsdClientSnapshot {
        StatsdClientSnapshot {
            sent_packets: self.sent_packets.load(Ordering::Relaxed),
            sent_lines: self.sent_lines.load(Ordering::Relaxed),
            dropped_lines: self.dropped_lines.load(Ordering::Relaxed),
            sampled_out: self.sampled_out.load(Ordering::Relaxed),
        }
    }
}
