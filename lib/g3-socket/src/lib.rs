/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

pub mod tcp;
pub mod udp;
pub mod util;

mod bind;
pub use bind::BindAddr;
