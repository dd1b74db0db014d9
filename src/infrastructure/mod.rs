// SPDX-License-Identifier: MIT

pub mod data;
pub mod network;
