//! Gregorian to Jalaali (Persian solar) civil date conversion.
//!
//! Only the forward conversion is needed: the dashboard renders server
//! timestamps in the Jalaali calendar. Uses the standard 33-year-cycle
//! integer algorithm; valid for the Gregorian range the dashboard will
//! ever see (1600..3000).

/// A Jalaali calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Convert a Gregorian civil date to its Jalaali equivalent.
/// `month` and `day` are 1-based.
pub fn from_gregorian(year: i32, month: u32, day: u32) -> JalaliDate {
    const G_DAYS_IN_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

    let gy = i64::from(year);
    let gm = month as usize;
    let gd = i64::from(day);

    let gy2 = if gm > 2 { gy + 1 } else { gy };
    let mut days = 355_666
        + 365 * gy
        + (gy2 + 3) / 4
        - (gy2 + 99) / 100
        + (gy2 + 399) / 400
        + gd
        + G_DAYS_IN_MONTH[gm - 1];

    let mut jy = -1595 + 33 * (days / 12_053);
    days %= 12_053;
    jy += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (jm, jd) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };

    JalaliDate {
        year: jy as i32,
        month: jm as u32,
        day: jd as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nowruz_anchors() {
        // 1 Farvardin 1402 and 1403 fall on Mar 21 2023 and Mar 20 2024.
        assert_eq!(
            from_gregorian(2023, 3, 21),
            JalaliDate { year: 1402, month: 1, day: 1 }
        );
        assert_eq!(
            from_gregorian(2024, 3, 20),
            JalaliDate { year: 1403, month: 1, day: 1 }
        );
    }

    #[test]
    fn unix_epoch() {
        assert_eq!(
            from_gregorian(1970, 1, 1),
            JalaliDate { year: 1348, month: 10, day: 11 }
        );
    }

    #[test]
    fn leap_year_esfand() {
        // 1395 is a Jalaali leap year: Esfand has 30 days.
        assert_eq!(
            from_gregorian(2017, 3, 20),
            JalaliDate { year: 1395, month: 12, day: 30 }
        );
        assert_eq!(
            from_gregorian(2017, 3, 21),
            JalaliDate { year: 1396, month: 1, day: 1 }
        );
    }

    #[test]
    fn mid_autumn_date() {
        assert_eq!(
            from_gregorian(2023, 11, 14),
            JalaliDate { year: 1402, month: 8, day: 23 }
        );
    }
}
