/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("reserved statsd delimiter char: {0}")]
    ReservedDelimiter(char),
    #[error("control char is not allowed")]
    ControlChar,
}

/// The prefix prepended to every metric name sent by a client.
///
/// Metric names themselves are treated as opaque text, but the prefix is set
/// once per client, so it is checked here to not contain anything that would
/// break the line format.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MetricsPrefix(String);

impl MetricsPrefix {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Append `sub`, with a `.` in between if both are not empty.
    pub fn join(&self, sub: &MetricsPrefix) -> MetricsPrefix {
        if sub.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return sub.clone();
        }
        MetricsPrefix(format!("{}.{}", self.0, sub.0))
    }
}

impl FromStr for MetricsPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for c in s.chars() {
            match c {
                ':' | '|' | '@' => return Err(ParseError::ReservedDelimiter(c)),
                _ if c.is_control() => return Err(ParseError::ControlChar),
                _ => {}
            }
        }
        Ok(MetricsPrefix(s.to_string()))
    }
}

impl fmt::Display for MetricsPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
