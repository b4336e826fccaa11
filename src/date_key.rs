use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};

/// Offset of the wall clock the sheet's dates are kept in (UTC+9).
pub const TALLY_OFFSET_SECS: i32 = 9 * 3600;

/// Today's date in the three spellings a header may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateKey {
    /// `8/22`
    pub short: String,
    /// `2025/08/22`
    pub padded: String,
    /// `2025-08-22`
    pub iso: String,
}

impl DateKey {
    pub fn today() -> Self {
        Self::for_instant(Utc::now())
    }

    /// Calendar date of `now` on the UTC+9 wall clock, whatever the host's zone.
    pub fn for_instant(now: DateTime<Utc>) -> Self {
        let local = tally_date(now);
        let (y, m, d) = (local.year(), local.month(), local.day());

        DateKey {
            short: format!("{m}/{d}"),
            padded: format!("{y}/{m:02}/{d:02}"),
            iso: format!("{y}-{m:02}-{d:02}"),
        }
    }

    /// Whether a (trimmed) header text names this date.
    pub fn matches(&self, text: &str) -> bool {
        text == self.short || text == self.padded || text == self.iso
    }
}

/// Shift `now` onto the UTC+9 wall clock and take its calendar date.
fn tally_date(now: DateTime<Utc>) -> NaiveDate {
    (now + TimeDelta::seconds(i64::from(TALLY_OFFSET_SECS))).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn shifts_into_next_day_at_fifteen_utc() {
        let before = DateKey::for_instant(at(2025, 8, 21, 14, 59, 59));
        assert_eq!(before.short, "8/21");

        let after = DateKey::for_instant(at(2025, 8, 21, 15, 0, 0));
        assert_eq!(after.short, "8/22");
        assert_eq!(after.padded, "2025/08/22");
        assert_eq!(after.iso, "2025-08-22");
    }

    #[test]
    fn year_rolls_over() {
        let key = DateKey::for_instant(at(2025, 12, 31, 20, 0, 0));
        assert_eq!(key.short, "1/1");
        assert_eq!(key.padded, "2026/01/01");
        assert_eq!(key.iso, "2026-01-01");
    }

    #[test]
    fn matches_any_spelling() {
        let key = DateKey::for_instant(at(2025, 3, 4, 0, 0, 0));
        assert!(key.matches("3/4"));
        assert!(key.matches("2025/03/04"));
        assert!(key.matches("2025-03-04"));
        assert!(!key.matches("03/04"));
        assert!(!key.matches("3/5"));
    }

    proptest! {
        #[test]
        fn spellings_agree(secs in 0i64..4_102_444_800) {
            let now = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
            let key = DateKey::for_instant(now);

            let (m, d) = key.short.split_once('/').unwrap();
            prop_assert!(!m.starts_with('0'));
            prop_assert!(!d.starts_with('0'));

            let padded: Vec<&str> = key.padded.split('/').collect();
            let iso: Vec<&str> = key.iso.split('-').collect();
            prop_assert_eq!(&padded, &iso);
            prop_assert_eq!(padded[1].len(), 2);
            prop_assert_eq!(padded[2].len(), 2);
            prop_assert_eq!(padded[1].parse::<u32>().unwrap(), m.parse::<u32>().unwrap());
            prop_assert_eq!(padded[2].parse::<u32>().unwrap(), d.parse::<u32>().unwrap());

            let shifted = now + chrono::Duration::hours(9);
            prop_assert_eq!(key.iso, shifted.format("%Y-%m-%d").to_string());
        }
    }
}
