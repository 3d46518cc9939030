//! Candidate window generation from calendar frequency tokens.

use {
    crate::error::Error,
    chrono::{Datelike, Duration, NaiveDate, NaiveDateTime},
    serde::Deserialize,
    std::{
        convert::TryFrom,
        fmt::{self, Display},
        str::FromStr,
    },
};

/// Window length as a number of month starts, written e.g. `"2MS"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct Frequency {
    months: u32,
}

impl Frequency {
    pub fn new(months: u32) -> Option<Self> {
        if months > 0 {
            Some(Self { months })
        } else {
            None
        }
    }

    pub fn months(self) -> u32 {
        self.months
    }

    /// Length of the window in days under the 30-day month approximation
    /// used by the seasonal smoothing
    pub fn approx_days(self) -> i64 {
        self.months as i64 * 30
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}MS", self.months)
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .strip_suffix("MS")
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse().ok())
            .and_then(Frequency::new)
            .ok_or_else(|| Error::Frequency(s.to_owned()))
    }
}

impl TryFrom<String> for Frequency {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Adds calendar months, keeping the day of month and time of day
fn add_months(t: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
    let zero_based = t.month0() + months;
    let year = t.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;

    NaiveDate::from_ymd_opt(year, month, t.day()).map(|d| d.and_time(t.time()))
}

/// First month start at or after `t`
fn month_start_on_or_after(t: NaiveDateTime) -> Option<NaiveDateTime> {
    if t.day() == 1 {
        Some(t)
    } else {
        let first = NaiveDate::from_ymd_opt(t.year(), t.month(), 1)?.and_time(t.time());
        add_months(first, 1)
    }
}

/// End of a window starting at `start`: the `frequency`-th month start after
/// the first month start at or after `start`
pub fn window_end(start: NaiveDateTime, frequency: Frequency) -> Option<NaiveDateTime> {
    month_start_on_or_after(start).and_then(|anchor| add_months(anchor, frequency.months))
}

/// Start and end dates of every candidate window. Windows start on each day
/// from `start` to `end` and all share the offset of the first window, so
/// `ends[i] - starts[i]` is constant.
pub fn time_window_list(
    start: NaiveDateTime,
    end: NaiveDateTime,
    frequency: Frequency,
) -> (Vec<NaiveDateTime>, Vec<NaiveDateTime>) {
    let starts = (0..)
        .map(|i| start + Duration::days(i))
        .take_while(|t| *t <= end)
        .collect::<Vec<_>>();

    let ends = match window_end(start, frequency) {
        Some(first) => (0..starts.len() as i64)
            .map(|i| first + Duration::days(i))
            .collect(),
        None => vec![],
    };

    (starts, ends)
}

#[cfg(test)]
mod test {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn parses_tokens() {
        assert_eq!("2MS".parse::<Frequency>().unwrap().months(), 2);
        assert_eq!("12MS".parse::<Frequency>().unwrap().months(), 12);
        assert_eq!(Frequency::new(3).unwrap().to_string(), "3MS");

        for bad in &["0MS", "MS", "2M", "2D", "-1MS", "1.5MS", ""] {
            assert_eq!(
                bad.parse::<Frequency>(),
                Err(Error::Frequency(bad.to_string())),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn one_month_windows() {
        let (starts, ends) = time_window_list(at(2016, 1, 1), at(2016, 3, 1), "1MS".parse().unwrap());

        assert_eq!(starts.len(), 61);
        assert_eq!(starts.len(), ends.len());
        assert_eq!(ends[0], at(2016, 2, 1));

        for (s, e) in starts.iter().zip(&ends) {
            assert_eq!(*e - *s, Duration::days(31));
        }
    }

    #[test]
    fn one_window_per_day() {
        let (starts, ends) =
            time_window_list(at(2016, 1, 1), at(2016, 2, 29), "2MS".parse().unwrap());

        assert_eq!(starts.len(), 60);
        assert_eq!(ends.len(), 60);
        assert_eq!(ends[0], at(2016, 3, 1));
        assert_eq!(ends[59], at(2016, 4, 29));
    }

    #[test]
    fn mid_month_start_rolls_to_next_month_start() {
        let (starts, ends) =
            time_window_list(at(2016, 1, 15), at(2016, 1, 20), "2MS".parse().unwrap());

        assert_eq!(starts[0], at(2016, 1, 15));
        assert_eq!(ends[0], at(2016, 4, 1));
        assert_eq!(ends[5], at(2016, 4, 6));
    }

    #[test]
    fn year_wrap() {
        assert_eq!(
            window_end(at(2016, 11, 1), Frequency::new(3).unwrap()),
            Some(at(2017, 2, 1))
        );
        assert_eq!(
            window_end(at(2016, 12, 31), Frequency::new(12).unwrap()),
            Some(at(2018, 1, 1))
        );
    }

    #[test]
    fn approximate_length() {
        assert_eq!(Frequency::new(5).unwrap().approx_days(), 150);
    }
}
