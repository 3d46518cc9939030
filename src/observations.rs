//! Loading and slicing of the observed wind record.
//!
//! The input is a delimited table with one header row and the columns
//! `date, speed, dir`, where `date` is formatted `YYYYMMDDHH`.

use {
    crate::error::Error,
    anyhow::{Context, Result},
    chrono::NaiveDateTime,
    log::{debug, info},
    std::{fs::File, io::Read, path::Path},
};

/// Timestamp format of the `date` column
pub const DATE_FORMAT: &str = "%Y%m%d%H";

/// Maximum accepted direction in degrees
const DIRECTION_MAX: f64 = 360.0;

/// A single wind observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub time: NaiveDateTime,
    /// Wind speed in m/s
    pub speed: f64,
    /// Direction in degrees
    pub direction: f64,
}

impl Observation {
    pub fn new(time: NaiveDateTime, speed: f64, direction: f64) -> Self {
        Self {
            time,
            speed,
            direction,
        }
    }
}

/// Time-ordered wind record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    rows: Vec<Observation>,
}

impl ObservationTable {
    /// Builds a table from rows in any order, sorting them by time
    pub fn new(mut rows: Vec<Observation>) -> Self {
        rows.sort_by_key(|o| o.time);
        Self { rows }
    }

    /// Reads a wind table from disk, dropping rows with a direction outside
    /// [0, 360] or a speed outside [0, `speed_max`]
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8, speed_max: f64) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

        let table = Self::from_reader(file, delimiter, speed_max)
            .with_context(|| format!("Failed to read wind table {}", path.display()))?;

        info!(
            "Loaded {} observations from \"{}\"",
            table.len(),
            path.display()
        );

        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8, speed_max: f64) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = vec![];
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.len() < 3 {
                return Err(Error::Record {
                    line,
                    message: format!("expected 3 columns, found {}", record.len()),
                }
                .into());
            }

            let speed = parse_value(&record[1], "speed", line)?;
            let direction = parse_value(&record[2], "dir", line)?;

            if !(0.0..=DIRECTION_MAX).contains(&direction) || !(0.0..=speed_max).contains(&speed)
            {
                dropped += 1;
                continue;
            }

            let time = parse_date(&record[0]).ok_or_else(|| Error::Record {
                line,
                message: format!("invalid date \"{}\", expected {}", &record[0], DATE_FORMAT),
            })?;

            rows.push(Observation::new(time, speed, direction));
        }

        debug!("Dropped {} out-of-range observations", dropped);

        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Observations with `start <= time <= end`
    pub fn slice(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[Observation] {
        slice_between(&self.rows, start, end)
    }
}

/// Sub-slice of time-ordered `rows` with `start <= time <= end`
pub fn slice_between(
    rows: &[Observation],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> &[Observation] {
    let lo = rows.partition_point(|o| o.time < start);
    let hi = rows.partition_point(|o| o.time <= end);

    if lo >= hi {
        &[]
    } else {
        &rows[lo..hi]
    }
}

/// Parses a `YYYYMMDDHH` timestamp
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // chrono needs a minute field to build a time
    NaiveDateTime::parse_from_str(&format!("{}00", s), "%Y%m%d%H%M").ok()
}

/// Empty fields are missing values and get filtered out as NaN
fn parse_value(field: &str, column: &str, line: u64) -> Result<f64> {
    if field.is_empty() {
        return Ok(f64::NAN);
    }

    field.parse::<f64>().map_err(|e| {
        Error::Record {
            line,
            message: format!("invalid {} \"{}\": {}", column, field, e),
        }
        .into()
    })
}

#[cfg(test)]
mod test {
    use {super::*, chrono::NaiveDate};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    #[test]
    fn parses_hourly_dates() {
        assert_eq!(parse_date("2016010100"), Some(at(2016, 1, 1, 0)));
        assert_eq!(parse_date("2016123123"), Some(at(2016, 12, 31, 23)));
        assert_eq!(parse_date("2016013124x"), None);
        assert_eq!(parse_date("2016022924"), None);
        assert_eq!(parse_date("20160101"), None);
    }

    #[test]
    fn drops_out_of_range_rows() {
        let input = "date,speed,dir\n\
                     2016010100,5.0,10.0\n\
                     2016010101,5.0,361.0\n\
                     2016010102,-1.0,10.0\n\
                     2016010103,101.0,10.0\n\
                     2016010104,,10.0\n\
                     2016010105,100.0,360.0\n";

        let table = ObservationTable::from_reader(input.as_bytes(), b',', 100.0).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].time, at(2016, 1, 1, 0));
        assert_eq!(table.rows()[1].time, at(2016, 1, 1, 5));
    }

    #[test]
    fn speed_ceiling_is_configurable() {
        let input = "date,speed,dir\n2016010100,36.0,10.0\n2016010101,35.0,10.0\n";

        let table = ObservationTable::from_reader(input.as_bytes(), b',', 35.0).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].speed, 35.0);
    }

    #[test]
    fn custom_delimiter() {
        let input = "date;speed;dir\n2016010100;1.5;180\n";

        let table = ObservationTable::from_reader(input.as_bytes(), b';', 100.0).unwrap();

        assert_eq!(table.rows(), &[Observation::new(at(2016, 1, 1, 0), 1.5, 180.0)]);
    }

    #[test]
    fn malformed_rows_name_their_line() {
        let input = "date,speed,dir\n2016010100,1.0,10\n2016010101,fast,10\n";

        let err = ObservationTable::from_reader(input.as_bytes(), b',', 100.0).unwrap_err();

        match err.downcast_ref::<Error>() {
            Some(Error::Record { line, .. }) => assert_eq!(*line, 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn rows_are_sorted() {
        let input = "date,speed,dir\n2016010102,1.0,10\n2016010100,2.0,10\n";

        let table = ObservationTable::from_reader(input.as_bytes(), b',', 100.0).unwrap();

        assert_eq!(table.rows()[0].speed, 2.0);
        assert_eq!(table.rows()[1].speed, 1.0);
    }

    #[test]
    fn slice_is_inclusive() {
        let table = ObservationTable::new(
            (0..48)
                .map(|h| Observation::new(at(2016, 1, 1 + h / 24, h % 24), 1.0, 0.0))
                .collect(),
        );

        assert_eq!(table.slice(at(2016, 1, 1, 0), at(2016, 1, 2, 0)).len(), 25);
        assert_eq!(table.slice(at(2016, 1, 1, 5), at(2016, 1, 1, 5)).len(), 1);
        assert!(table.slice(at(2016, 1, 3, 0), at(2016, 1, 4, 0)).is_empty());
        assert!(table.slice(at(2016, 1, 2, 0), at(2016, 1, 1, 0)).is_empty());
    }
}
