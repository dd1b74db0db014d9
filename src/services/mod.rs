// SPDX-License-Identifier: MIT

pub mod reconcile;
pub mod stats;
