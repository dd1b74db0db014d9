// SPDX-License-Identifier: MIT

pub mod db;
pub mod schema;
