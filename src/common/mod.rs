// SPDX-License-Identifier: MIT

pub mod business_days;
pub mod timewin;

// Shared aliases for frequently used modules.
pub use crate::domain::constants;
pub use crate::domain::error;
