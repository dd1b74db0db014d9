// SPDX-License-Identifier: MIT

pub mod logistics;
pub mod mailer;
pub mod underwriting;
