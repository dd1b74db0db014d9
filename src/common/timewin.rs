// SPDX-License-Identifier: MIT

use chrono::{NaiveTime, Timelike};

/// Parse "HH:MM" or "HH:MM:SS" into minutes since midnight. Seconds are
/// deliberately discarded: the pickup-window contract compares whole
/// minutes only.
pub fn parse_minutes(raw: &str) -> Option<u32> {
    let mut parts = raw.trim().split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    if let Some(secs) = parts.next() {
        let _: u32 = secs.parse().ok()?;
    }
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

pub fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Strictly-before-cutoff check (cutoff-carrier variant).
pub fn before_cutoff(pickup: NaiveTime, cutoff_minutes: u32) -> bool {
    minutes_of(pickup) < cutoff_minutes
}

/// Inclusive cutoff->CIP window check (cip-window variant). When the
/// window wraps past midnight (cutoff > cip), a pickup on either side of
/// midnight qualifies.
pub fn within_window(pickup: NaiveTime, cutoff_minutes: u32, cip_minutes: u32) -> bool {
    let t = minutes_of(pickup);
    if cutoff_minutes <= cip_minutes {
        cutoff_minutes <= t && t <= cip_minutes
    } else {
        t >= cutoff_minutes || t <= cip_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn parses_with_and_without_seconds() {
        assert_eq!(parse_minutes("19:00:00"), Some(19 * 60));
        assert_eq!(parse_minutes("23:30"), Some(23 * 60 + 30));
        assert_eq!(parse_minutes("24:00"), None);
        assert_eq!(parse_minutes("garbage"), None);
    }

    #[test]
    fn cutoff_ignores_seconds() {
        let cutoff = parse_minutes("23:00:00").unwrap();
        assert!(before_cutoff(t(22, 59, 59), cutoff));
        assert!(!before_cutoff(t(23, 0, 1), cutoff));
        assert!(!before_cutoff(t(23, 0, 0), cutoff));
    }

    #[test]
    fn window_wraps_midnight_inclusively() {
        let cutoff = parse_minutes("23:00").unwrap();
        let cip = parse_minutes("02:00").unwrap();
        assert!(within_window(t(23, 0, 0), cutoff, cip));
        assert!(within_window(t(23, 45, 0), cutoff, cip));
        assert!(within_window(t(0, 30, 0), cutoff, cip));
        assert!(within_window(t(2, 0, 59), cutoff, cip));
        assert!(!within_window(t(2, 1, 0), cutoff, cip));
        assert!(!within_window(t(12, 0, 0), cutoff, cip));
    }

    #[test]
    fn window_without_wrap() {
        let cutoff = parse_minutes("19:00").unwrap();
        let cip = parse_minutes("23:30").unwrap();
        assert!(within_window(t(19, 0, 0), cutoff, cip));
        assert!(within_window(t(21, 0, 0), cutoff, cip));
        assert!(within_window(t(23, 30, 0), cutoff, cip));
        assert!(!within_window(t(18, 59, 0), cutoff, cip));
        assert!(!within_window(t(23, 31, 0), cutoff, cip));
    }
}
