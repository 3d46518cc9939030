use {
    crate::{
        binning::{Sector, Selection, SpeedClass},
        error::Error,
        ranking::TIMESTAMP_FORMAT,
        scan::ScanPlan,
        window::{window_end, Frequency},
    },
    chrono::{Duration, NaiveDateTime},
    serde::Deserialize,
    std::path::PathBuf,
};

/// Run parameters
#[derive(Debug, PartialEq, Default, Deserialize)]
pub struct Parameters {
    pub input: Input,
    pub selection: SelectionParameters,
    pub reference: Period,
    pub scan: Scan,
    pub output: Output,
    #[serde(default)]
    pub windrose: Windrose,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Input {
    /// Wind table with `date, speed, dir` columns
    pub wind_file: PathBuf,
    /// Column delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Observations faster than this (m/s) are discarded
    #[serde(default = "default_speed_max")]
    pub speed_max: f64,
}

fn default_delimiter() -> char {
    ','
}

fn default_speed_max() -> f64 {
    100.0
}

impl Default for Input {
    fn default() -> Self {
        Input {
            wind_file: PathBuf::from("wind.txt"),
            delimiter: default_delimiter(),
            speed_max: default_speed_max(),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct SelectionParameters {
    /// Direction sectors of interest, at least two
    pub sectors: Vec<Sector>,
    /// Speed classes of interest (0-11), at least two
    pub classes: Vec<SpeedClass>,
}

impl Default for SelectionParameters {
    fn default() -> Self {
        SelectionParameters {
            sectors: Sector::ALL.to_vec(),
            classes: SpeedClass::all().collect(),
        }
    }
}

/// Time span given as `YYYY-MM-DD HH:MM:SS` strings
#[derive(Debug, PartialEq, Deserialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

impl Default for Period {
    fn default() -> Self {
        Period {
            start: "2015-01-01 00:00:00".into(),
            end: "2019-12-31 00:00:00".into(),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Scan {
    /// Candidate window lengths, e.g. "2MS"
    pub frequencies: Vec<String>,
    /// First window start
    pub start: String,
    /// Last window start
    pub end: String,
}

impl Default for Scan {
    fn default() -> Self {
        Scan {
            frequencies: vec!["2MS".into()],
            start: "2016-01-01 00:00:00".into(),
            end: "2018-01-01 00:00:00".into(),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Output {
    /// Directory the result table is written to
    pub directory: PathBuf,
    /// Stem of the result file name
    pub name: String,
    /// Append the seasonal profile statistics to the result table
    #[serde(default)]
    pub shape_columns: bool,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            directory: PathBuf::from("."),
            name: "rep".into(),
            shape_columns: false,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Windrose {
    /// Observations faster than this (m/s) are left out of windrose tables
    pub speed_max: f64,
}

impl Default for Windrose {
    fn default() -> Self {
        Windrose { speed_max: 35.0 }
    }
}

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|_| Error::Timestamp {
        field,
        value: value.to_owned(),
    })
}

impl Input {
    /// Delimiter as a single byte for the CSV reader
    pub fn delimiter_byte(&self) -> Result<u8, Error> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(Error::Delimiter(self.delimiter))
        }
    }
}

impl Parameters {
    /// Checks every parameter of the search before any work starts
    pub fn validate(&self) -> Result<ScanPlan, Error> {
        let selection = Selection::new(
            self.selection.sectors.clone(),
            self.selection.classes.clone(),
        )?;

        let reference_start = parse_timestamp("reference.start", &self.reference.start)?;
        let reference_end = parse_timestamp("reference.end", &self.reference.end)?;
        let scan_start = parse_timestamp("scan.start", &self.scan.start)?;
        let scan_end = parse_timestamp("scan.end", &self.scan.end)?;

        if reference_start > reference_end {
            return Err(Error::InvertedRange {
                field: "reference",
                start: self.reference.start.clone(),
                end: self.reference.end.clone(),
            });
        }

        if scan_start > scan_end {
            return Err(Error::InvertedRange {
                field: "scan",
                start: self.scan.start.clone(),
                end: self.scan.end.clone(),
            });
        }

        if scan_start < reference_start {
            return Err(Error::ScanBeforeReference {
                scan_start: self.scan.start.clone(),
                reference_start: self.reference.start.clone(),
            });
        }

        if self.scan.frequencies.is_empty() {
            return Err(Error::NoFrequencies);
        }

        let frequencies = self
            .scan
            .frequencies
            .iter()
            .map(|f| f.parse::<Frequency>())
            .collect::<Result<Vec<_>, _>>()?;

        // The last window of every frequency must still lie in the reference
        let days = (scan_end - scan_start).num_days();
        for &frequency in &frequencies {
            let last_end = window_end(scan_start, frequency)
                .map(|first| first + Duration::days(days))
                .ok_or_else(|| Error::Frequency(frequency.to_string()))?;

            if last_end > reference_end {
                return Err(Error::ScanPastReference {
                    frequency: frequency.to_string(),
                    window_end: last_end.format(TIMESTAMP_FORMAT).to_string(),
                    reference_end: self.reference.end.clone(),
                });
            }
        }

        Ok(ScanPlan {
            selection,
            reference_start,
            reference_end,
            frequencies,
            scan_start,
            scan_end,
        })
    }
}

#[cfg(test)]
mod test {
    use {super::*, std::fs::File};

    #[test]
    fn defaults() {
        assert_eq!(
            Parameters::default(),
            serde_yaml::from_reader::<_, Parameters>(
                File::open("src/testdata/defaults.yaml").unwrap()
            )
            .unwrap()
        );
    }

    #[test]
    fn defaults_validate() {
        let plan = Parameters::default().validate().unwrap();

        assert_eq!(plan.selection.sectors().len(), 16);
        assert_eq!(plan.frequencies, vec![Frequency::new(2).unwrap()]);
    }

    #[test]
    fn optional_sections() {
        let params = serde_yaml::from_str::<Parameters>(
            r#"
input:
  wind_file: helgoland_wind.txt
selection:
  sectors: [N, SSE, S]
  classes: [3, 4, 5]
reference:
  start: "2015-01-01 00:00:00"
  end: "2019-12-31 00:00:00"
scan:
  frequencies: ["5MS"]
  start: "2016-01-01 00:00:00"
  end: "2018-01-01 00:00:00"
output:
  directory: out
  name: helgoland
"#,
        )
        .unwrap();

        assert_eq!(params.input.delimiter, ',');
        assert_eq!(params.input.speed_max, 100.0);
        assert_eq!(params.windrose, Windrose::default());
        assert!(!params.output.shape_columns);
        assert_eq!(params.selection.sectors, vec![Sector::N, Sector::SSE, Sector::S]);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn unknown_labels_fail_to_parse() {
        assert!(serde_yaml::from_str::<SelectionParameters>("sectors: [N, X]\nclasses: [1, 2]").is_err());
        assert!(serde_yaml::from_str::<SelectionParameters>("sectors: [N, S]\nclasses: [1, 12]").is_err());
    }

    #[test]
    fn rejects_bad_timestamps() {
        let mut params = Parameters::default();
        params.scan.start = "2016-01-01".into();

        assert_eq!(
            params.validate(),
            Err(Error::Timestamp {
                field: "scan.start",
                value: "2016-01-01".into()
            })
        );
    }

    #[test]
    fn rejects_single_sector() {
        let mut params = Parameters::default();
        params.selection.sectors = vec![Sector::N];

        assert_eq!(
            params.validate(),
            Err(Error::TooFewCategories("direction sectors"))
        );
    }

    #[test]
    fn rejects_bad_frequencies() {
        let mut params = Parameters::default();
        params.scan.frequencies = vec!["2MS".into(), "3M".into()];
        assert_eq!(params.validate(), Err(Error::Frequency("3M".into())));

        params.scan.frequencies.clear();
        assert_eq!(params.validate(), Err(Error::NoFrequencies));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let mut params = Parameters::default();
        params.scan.end = "2015-06-01 00:00:00".into();

        assert!(matches!(
            params.validate(),
            Err(Error::InvertedRange { field: "scan", .. })
        ));
    }

    #[test]
    fn rejects_scan_outside_reference() {
        let mut params = Parameters::default();
        params.scan.start = "2014-01-01 00:00:00".into();
        assert!(matches!(
            params.validate(),
            Err(Error::ScanBeforeReference { .. })
        ));

        // 2MS windows from 2016-01-01 run 60 days
        let mut params = Parameters::default();
        params.scan.end = "2019-11-15 00:00:00".into();
        assert_eq!(
            params.validate(),
            Err(Error::ScanPastReference {
                frequency: "2MS".into(),
                window_end: "2020-01-14 00:00:00".into(),
                reference_end: "2019-12-31 00:00:00".into(),
            })
        );
    }

    #[test]
    fn delimiter_must_be_ascii() {
        let mut input = Input::default();
        assert_eq!(input.delimiter_byte(), Ok(b','));

        input.delimiter = '§';
        assert_eq!(input.delimiter_byte(), Err(Error::Delimiter('§')));
    }
}
