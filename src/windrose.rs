//! Windrose comparison of the reference period against a ranked window.
//!
//! Each cell of the full sector x class grid is expressed as a percentage of
//! all observations of its period, so the two periods can be overlaid the way
//! a normalised windrose plot would show them.

use {
    crate::{
        binning::{classify_all, Sector, SpeedClass},
        observations::ObservationTable,
        ranking::{RankedWindow, TIMESTAMP_FORMAT},
    },
    anyhow::Result,
    chrono::NaiveDateTime,
    log::info,
    ndarray::Array2,
    std::io::Write,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindroseCell {
    pub sector: Sector,
    pub class: SpeedClass,
    pub reference_pct: f64,
    pub candidate_pct: f64,
    pub difference_pct: f64,
}

/// Sector x class occurrence in percent of all observations in `[start, end]`
pub fn joint_percentages(
    table: &ObservationTable,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Array2<f64> {
    let joint = classify_all(table, start, end).joint;
    let total = joint.sum();

    if total > 0.0 {
        joint * (100.0 / total)
    } else {
        joint
    }
}

pub fn compare(
    table: &ObservationTable,
    reference_start: NaiveDateTime,
    reference_end: NaiveDateTime,
    window: &RankedWindow,
) -> Vec<WindroseCell> {
    let reference = joint_percentages(table, reference_start, reference_end);
    let candidate = joint_percentages(table, window.start_point, window.end_point);

    info!(
        "Comparing {} to {} ({} months) with the reference period",
        window.start_point.format(TIMESTAMP_FORMAT),
        window.end_point.format(TIMESTAMP_FORMAT),
        window.period_freq
    );

    Sector::ALL
        .iter()
        .flat_map(|&sector| SpeedClass::all().map(move |class| (sector, class)))
        .map(|(sector, class)| {
            let r = reference[[sector.index(), class.index()]];
            let c = candidate[[sector.index(), class.index()]];
            WindroseCell {
                sector,
                class,
                reference_pct: r,
                candidate_pct: c,
                difference_pct: c - r,
            }
        })
        .collect()
}

pub fn file_name(name: &str, rank: usize) -> String {
    format!("windrose_{}_rank{}.txt", name, rank)
}

pub fn write_cells<W: Write>(writer: W, cells: &[WindroseCell]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(&[
        "sector",
        "class",
        "reference_pct",
        "candidate_pct",
        "difference_pct",
    ])?;

    for cell in cells {
        wtr.write_record(&[
            cell.sector.to_string(),
            cell.class.to_string(),
            cell.reference_pct.to_string(),
            cell.candidate_pct.to_string(),
            cell.difference_pct.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
