/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::{Arc, Mutex};

/// Capture every packet in memory, or fail every send.
#[derive(Clone, Default)]
pub(crate) struct BufMetricsSink {
    packets: Arc<Mutex<Vec<Vec<u8>>>>,
    fail: bool,
}

impl BufMetricsSink {
    pub(crate) fn failing() -> Self {
        BufMetricsSink {
            packets: Arc::default(),
            fail: true,
        }
    }

    pub(crate) fn packets(&self) -> Vec<Vec<u8>> {
        self.packets.lock().unwrap().clone()
    }

    pub(super) fn send_msg(&self, msg: &[u8]) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "injected send failure",
            ));
        }
        let mut packets = self.packets.lock().unwrap();
        packets.push(msg.to_vec());
        Ok(())
    }
}
