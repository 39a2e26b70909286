/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// Decide whether an observation with the given sample rate should be sent.
///
/// A rate of 1.0 or more is always sent without drawing a random value. A rate
/// of 0.0 or less, or NaN, is never sent. The draw uses the thread local
/// generator of fastrand, so concurrent callers never contend on it.
pub(crate) fn sampled(rate: f64) -> bool {
    if rate >= 1.0 {
        return true;
    }
    fastrand::f64() < rate
}

/// Whether the rate suffix should be appended to the line.
#[inline]
pub(crate) fn need_rate_suffix(rate: f64) -> bool {
    rate < 1.0
}
