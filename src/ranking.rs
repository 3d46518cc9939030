//! Ordering of scanned windows and the result table on disk.

use {
    crate::{
        error::Error,
        scan::{ResultRow, ScanPlan},
    },
    anyhow::{Context, Result},
    chrono::{Datelike, NaiveDateTime},
    std::{
        cmp::Ordering,
        io::{Read, Write},
        path::{Path, PathBuf},
    },
};

/// Timestamp format of the `start_point` and `end_point` columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const COLUMNS: [&str; 16] = [
    "start_point",
    "end_point",
    "period_freq",
    "dir_para",
    "speed_para",
    "rep_score",
    "similarity_perc_direction_qc",
    "similarity_perc_speed_qc",
    "dir_r2_qc",
    "dir_corr_qc",
    "p-val_dir_qc",
    "speed_r2_qc",
    "speed_corr_qc",
    "p-val_speed_qc",
    "mae_dir_qc",
    "mae_speed_qc",
];

pub const SHAPE_COLUMNS: [&str; 3] = ["shape_dist_qc", "shape_corr_qc", "p-val_shape_qc"];

/// Ascending with NaN after every number
fn nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn sort_key(row: &ResultRow) -> [f64; 5] {
    [
        row.rep_score,
        row.direction.r2,
        row.direction.similarity,
        row.speed.r2,
        row.speed.similarity,
    ]
}

/// Stable ascending sort by `rep_score`, then direction R², direction
/// similarity, speed R² and speed similarity
pub fn rank(mut rows: Vec<ResultRow>) -> Vec<ResultRow> {
    rows.sort_by(|a, b| {
        sort_key(a)
            .iter()
            .zip(sort_key(b).iter())
            .map(|(&x, &y)| nan_last(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

fn first_last<T: ToString>(items: &[T]) -> String {
    match (items.first(), items.last()) {
        (Some(a), Some(b)) => format!("{}-{}", a.to_string(), b.to_string()),
        _ => String::new(),
    }
}

/// `rep_period_{name}_{years}_{sectors}_{classes}_{frequencies}.txt`
pub fn output_file_name(name: &str, plan: &ScanPlan) -> String {
    format!(
        "rep_period_{}_{}-{}_{}_{}_{}.txt",
        name,
        plan.reference_start.year(),
        plan.reference_end.year() + 1,
        first_last(plan.selection.sectors()),
        first_last(plan.selection.classes()),
        first_last(&plan.frequencies),
    )
}

pub fn output_path(directory: &Path, name: &str, plan: &ScanPlan) -> PathBuf {
    directory.join(output_file_name(name, plan))
}

/// Shortest representation, in exponent form outside [1e-4, 1e16)
fn number(x: f64) -> String {
    if x.is_nan() {
        String::new()
    } else if x != 0.0 && (x.abs() < 1e-4 || x.abs() >= 1e16) {
        format!("{:e}", x)
    } else {
        x.to_string()
    }
}

fn record(row: &ResultRow, shape_columns: bool) -> Vec<String> {
    let mut fields = vec![
        row.start_point.format(TIMESTAMP_FORMAT).to_string(),
        row.end_point.format(TIMESTAMP_FORMAT).to_string(),
        row.period_freq.to_string(),
        number(row.dir_para),
        number(row.speed_para),
        number(row.rep_score),
        number(row.direction.similarity),
        number(row.speed.similarity),
        number(row.direction.r2),
        number(row.direction.correlation),
        number(row.direction.p_value),
        number(row.speed.r2),
        number(row.speed.correlation),
        number(row.speed.p_value),
        number(row.direction.mae),
        number(row.speed.mae),
    ];

    if shape_columns {
        fields.extend(
            [row.shape.distance, row.shape.correlation, row.shape.p_value]
                .iter()
                .map(|&x| number(x)),
        );
    }

    fields
}

/// Writes ranked rows as a comma-separated table with a header row
pub fn write_table<W: Write>(writer: W, rows: &[ResultRow], shape_columns: bool) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    if shape_columns {
        wtr.write_record(COLUMNS.iter().chain(SHAPE_COLUMNS.iter()))?;
    } else {
        wtr.write_record(&COLUMNS)?;
    }

    for row in rows {
        wtr.write_record(record(row, shape_columns))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Window identity read back from a result table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedWindow {
    pub start_point: NaiveDateTime,
    pub end_point: NaiveDateTime,
    pub period_freq: u32,
}

fn timestamp(value: &str, line: u64) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
        Error::Record {
            line,
            message: format!("invalid timestamp \"{}\": {}", value, e),
        }
        .into()
    })
}

/// Reads the window columns of a result table, in file order
pub fn read_table<R: Read>(reader: R) -> Result<Vec<RankedWindow>> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("result table has no \"{}\" column", name))
    };
    let (start, end, freq) = (
        column("start_point")?,
        column("end_point")?,
        column("period_freq")?,
    );

    let mut windows = vec![];
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let field = |i: usize| {
            record.get(i).ok_or_else(|| Error::Record {
                line,
                message: format!("missing column {}", i + 1),
            })
        };

        windows.push(RankedWindow {
            start_point: timestamp(field(start)?, line)?,
            end_point: timestamp(field(end)?, line)?,
            period_freq: field(freq)?.parse::<u32>().map_err(|e| Error::Record {
                line,
                message: format!("invalid period_freq: {}", e),
            })?,
        });
    }

    Ok(windows)
}
