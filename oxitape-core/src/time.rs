//! Tape timestamp decoding.
//!
//! Catalog records store creation/access/modification times as 32-bit
//! seconds since 1970-01-01. The decoder that MS Backup-era tooling applied
//! to these fields is *not* Gregorian-correct: its leap-year test treats
//! century years as common years (so 2000 has 365 days), its month-length
//! table gives September 31 days and October 30, and its year loop can land
//! on day zero of a month. Archives in the wild were written and verified
//! against exactly that decoder, so [`DateMode::Archive`] reproduces it
//! bit for bit and is the default.
//!
//! [`DateMode::Corrected`] is the opt-in proleptic-Gregorian variant for
//! users who prefer real calendar dates over byte-faithful ones.

/// Which calendar rules to apply when decoding tape timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateMode {
    /// Reproduce the historical decoder exactly (default).
    #[default]
    Archive,
    /// Proleptic Gregorian calendar with exact day arithmetic.
    Corrected,
}

/// Month lengths as the historical decoder tabulated them (February before
/// leap adjustment). Note September and November at 31, October at 30.
const MONDAYS_ARCHIVE: [u16; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 31, 30, 31, 31];

/// Gregorian month lengths (February before leap adjustment).
const MONDAYS_GREGORIAN: [u16; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A broken-down calendar time decoded from a tape timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapeTime {
    /// Full year (e.g. 1998).
    pub year: u16,
    /// Month, 1..=12.
    pub month: u8,
    /// Day of month. In [`DateMode::Archive`] this can be zero.
    pub day: u8,
    /// Hour, 0..=23.
    pub hour: u8,
    /// Minute, 0..=59.
    pub minute: u8,
    /// Second, 0..=59.
    pub second: u8,
}

fn is_leap(year: u16, mode: DateMode) -> bool {
    match mode {
        // The historical test: a year divisible by 100 is never a leap
        // year, everything else follows the mod-4 rule. Classifies 2000
        // as a common year.
        DateMode::Archive => year % 100 != 0 && year % 4 == 0,
        DateMode::Corrected => (year % 4 == 0 && year % 100 != 0) || year % 400 == 0,
    }
}

fn month_table(year: u16, mode: DateMode) -> [u16; 12] {
    let mut mondays = match mode {
        DateMode::Archive => MONDAYS_ARCHIVE,
        DateMode::Corrected => MONDAYS_GREGORIAN,
    };
    if is_leap(year, mode) {
        mondays[1] += 1;
    }
    mondays
}

/// Decode seconds-since-1970 into calendar time.
pub fn decode_timestamp(secs: u32, mode: DateMode) -> TapeTime {
    let mut date = secs as u64;

    let second = (date % 60) as u8;
    date /= 60;
    let minute = (date % 60) as u8;
    date /= 60;
    let hour = (date % 24) as u8;
    date /= 24;

    match mode {
        DateMode::Archive => decode_date_archive(date, hour, minute, second),
        DateMode::Corrected => decode_date_corrected(date, hour, minute, second),
    }
}

/// The historical year/month walk, including its quirks: the year loop
/// tests `date > days_in_year` both before and after subtracting (so a
/// remainder equal to the year length stays in the old year), and the day
/// of month comes out zero-based.
fn decode_date_archive(mut date: u64, hour: u8, minute: u8, second: u8) -> TapeTime {
    let mut year: u16 = 1970;
    let mut day_count: u64;
    let mut leap: bool;

    loop {
        leap = is_leap(year, DateMode::Archive);
        day_count = if leap { 366 } else { 365 };
        if date > day_count {
            year += 1;
            date -= day_count;
        }
        if date <= day_count {
            break;
        }
    }

    let mut day = date as u16;
    let mut mondays = MONDAYS_ARCHIVE;
    if leap {
        mondays[1] += 1;
    }

    let mut mon = 0usize;
    while mon < 12 {
        if mondays[mon] >= day {
            break;
        }
        day -= mondays[mon];
        mon += 1;
    }

    TapeTime {
        year,
        month: (mon + 1) as u8,
        day: day as u8,
        hour,
        minute,
        second,
    }
}

fn decode_date_corrected(mut date: u64, hour: u8, minute: u8, second: u8) -> TapeTime {
    let mut year: u16 = 1970;
    loop {
        let day_count = if is_leap(year, DateMode::Corrected) {
            366
        } else {
            365
        };
        if date >= day_count {
            date -= day_count;
            year += 1;
        } else {
            break;
        }
    }

    let mondays = month_table(year, DateMode::Corrected);
    let mut day = date as u16;
    let mut mon = 0usize;
    while day >= mondays[mon] {
        day -= mondays[mon];
        mon += 1;
    }

    TapeTime {
        year,
        month: (mon + 1) as u8,
        day: (day + 1) as u8,
        hour,
        minute,
        second,
    }
}

impl TapeTime {
    /// Re-encode into seconds since 1970 under the same calendar rules,
    /// so applied file times match what [`decode_timestamp`] produced.
    pub fn to_unix_seconds(&self, mode: DateMode) -> i64 {
        let mut base_days: i64 = 0;
        for y in 1970..self.year {
            base_days += if is_leap(y, mode) { 366 } else { 365 };
        }

        let days = match mode {
            DateMode::Corrected => {
                let mondays = month_table(self.year, mode);
                let mut days = base_days;
                for m in 0..(self.month.saturating_sub(1) as usize).min(12) {
                    days += mondays[m] as i64;
                }
                days + self.day as i64 - 1
            }
            DateMode::Archive => self.archive_days(base_days),
        };

        ((days * 24 + self.hour as i64) * 60 + self.minute as i64) * 60 + self.second as i64
    }

    /// The historical month walk sometimes applies the *previous* year's
    /// leap status (its year loop leaves the flag stale when the final
    /// iteration crosses a year boundary). Probing both February lengths
    /// and verifying against the decoder keeps this an exact inverse.
    fn archive_days(&self, base_days: i64) -> i64 {
        let prev_leap =
            self.year > 1970 && is_leap(self.year - 1, DateMode::Archive);
        let mut fallback = None;

        for leap in [is_leap(self.year, DateMode::Archive), prev_leap] {
            let mut mondays = MONDAYS_ARCHIVE;
            if leap {
                mondays[1] += 1;
            }

            let mut days = base_days;
            for m in 0..(self.month.saturating_sub(1) as usize).min(12) {
                days += mondays[m] as i64;
            }
            days += self.day as i64;

            if days >= 0 {
                let check = decode_date_archive(days as u64, self.hour, self.minute, self.second);
                if (check.year, check.month, check.day) == (self.year, self.month, self.day) {
                    return days;
                }
                fallback.get_or_insert(days);
            }
        }

        fallback.unwrap_or(base_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_archive() {
        // The historical decoder yields day zero at the epoch.
        let t = decode_timestamp(0, DateMode::Archive);
        assert_eq!(
            t,
            TapeTime {
                year: 1970,
                month: 1,
                day: 0,
                hour: 0,
                minute: 0,
                second: 0
            }
        );
    }

    #[test]
    fn test_epoch_corrected() {
        let t = decode_timestamp(0, DateMode::Corrected);
        assert_eq!(
            t,
            TapeTime {
                year: 1970,
                month: 1,
                day: 1,
                hour: 0,
                minute: 0,
                second: 0
            }
        );
    }

    #[test]
    fn test_time_of_day_extraction() {
        // 86399 = 23:59:59 on the first day
        let t = decode_timestamp(86_399, DateMode::Archive);
        assert_eq!((t.hour, t.minute, t.second), (23, 59, 59));
        assert_eq!((t.year, t.month, t.day), (1970, 1, 0));
    }

    #[test]
    fn test_archive_year_boundary_skew() {
        // 946684800 = 2000-01-01 00:00:00 UTC. The historical decoder's
        // strict `>` comparisons leave the remainder in 1999 and its month
        // table lands on December 30.
        let t = decode_timestamp(946_684_800, DateMode::Archive);
        assert_eq!((t.year, t.month, t.day), (1999, 12, 30));

        let t = decode_timestamp(946_684_800, DateMode::Corrected);
        assert_eq!((t.year, t.month, t.day), (2000, 1, 1));
    }

    #[test]
    fn test_year_2000_not_leap_in_archive_mode() {
        // 951782400 = 2000-02-29 00:00:00 UTC in the real calendar.
        let t = decode_timestamp(951_782_400, DateMode::Archive);
        assert_eq!((t.year, t.month, t.day), (2000, 2, 28));

        let t = decode_timestamp(951_782_400, DateMode::Corrected);
        assert_eq!((t.year, t.month, t.day), (2000, 2, 29));
    }

    #[test]
    fn test_corrected_known_dates() {
        // 904608000 = 1998-09-01 00:00:00 UTC
        let t = decode_timestamp(904_608_000, DateMode::Corrected);
        assert_eq!(
            (t.year, t.month, t.day, t.hour),
            (1998, 9, 1, 0)
        );

        // 888888888 = 1998-03-03 01:34:48 UTC
        let t = decode_timestamp(888_888_888, DateMode::Corrected);
        assert_eq!((t.year, t.month, t.day), (1998, 3, 3));
        assert_eq!((t.hour, t.minute, t.second), (1, 34, 48));
    }

    #[test]
    fn test_roundtrip_both_modes() {
        let samples: [u32; 8] = [
            0,
            86_399,
            86_400,
            123_456_789,
            888_888_888,
            904_608_000,
            946_684_800,
            951_782_400,
        ];

        for &secs in &samples {
            for mode in [DateMode::Archive, DateMode::Corrected] {
                let t = decode_timestamp(secs, mode);
                assert_eq!(
                    t.to_unix_seconds(mode),
                    secs as i64,
                    "mode {:?} secs {}",
                    mode,
                    secs
                );
            }
        }
    }
}
