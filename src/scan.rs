//! Sliding-window search for the representative period.

use {
    crate::{
        binning::{classify, classify_all, Classification, Sector, Selection, SpeedClass},
        conditional::{direction_sector_of_speed, speed_class_of_direction, Conditional},
        metric::{aggregate, score},
        observations::ObservationTable,
        qc::{MarginalFit, ShapeFit},
        window::{time_window_list, Frequency},
    },
    chrono::NaiveDateTime,
    log::{debug, info},
    std::time::Instant,
};

/// Validated description of one search
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPlan {
    pub selection: Selection,
    pub reference_start: NaiveDateTime,
    pub reference_end: NaiveDateTime,
    pub frequencies: Vec<Frequency>,
    pub scan_start: NaiveDateTime,
    pub scan_end: NaiveDateTime,
}

/// Scores and quality checks of one candidate window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    pub start_point: NaiveDateTime,
    pub end_point: NaiveDateTime,
    /// Window length in months
    pub period_freq: u32,
    /// Direction distributions per speed class
    pub dir_para: f64,
    /// Speed distributions per direction sector
    pub speed_para: f64,
    pub rep_score: f64,
    pub direction: MarginalFit,
    pub speed: MarginalFit,
    pub shape: ShapeFit,
}

/// Everything derived from a period that candidates are compared against
#[derive(Debug, Clone)]
pub struct Profile {
    pub classification: Classification,
    pub speed_per_sector: Conditional<Sector>,
    pub direction_per_class: Conditional<SpeedClass>,
}

impl Profile {
    pub fn new(
        table: &ObservationTable,
        start: NaiveDateTime,
        end: NaiveDateTime,
        selection: &Selection,
    ) -> Self {
        let classification = classify(table, start, end, selection);
        let speed_per_sector = speed_class_of_direction(&classification.joint, selection.sectors());
        let direction_per_class = direction_sector_of_speed(
            &classification.joint,
            selection.classes(),
            selection.sectors(),
        );

        Self {
            classification,
            speed_per_sector,
            direction_per_class,
        }
    }

    /// `(dir_para, speed_para)` of `candidate` against this profile
    pub fn compare(&self, candidate: &Profile, selection: &Selection) -> (f64, f64) {
        let per_sector = score(
            &self.speed_per_sector,
            &candidate.speed_per_sector,
            selection.sectors(),
        );
        let speed_para = aggregate(
            &per_sector,
            &self.classification.sectors,
            &candidate.classification.sectors,
        );

        let per_class = score(
            &self.direction_per_class,
            &candidate.direction_per_class,
            selection.classes(),
        );
        let dir_para = aggregate(
            &per_class,
            &self.classification.classes,
            &candidate.classification.classes,
        );

        debug!("{}", per_sector);
        debug!("{}", per_class);

        (dir_para, speed_para)
    }
}

/// Reference period state shared by every candidate window
pub struct Reference {
    pub profile: Profile,
    /// All sectors and classes, for the quality checks
    pub full: Classification,
}

impl Reference {
    pub fn new(table: &ObservationTable, plan: &ScanPlan) -> Self {
        Self {
            profile: Profile::new(
                table,
                plan.reference_start,
                plan.reference_end,
                &plan.selection,
            ),
            full: classify_all(table, plan.reference_start, plan.reference_end),
        }
    }
}

/// Scores one window against the reference
pub fn evaluate_window(
    table: &ObservationTable,
    plan: &ScanPlan,
    reference: &Reference,
    frequency: Frequency,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> ResultRow {
    let candidate = Profile::new(table, start, end, &plan.selection);
    let (dir_para, speed_para) = reference.profile.compare(&candidate, &plan.selection);

    let full = classify_all(table, start, end);
    let direction = MarginalFit::compute(
        &reference.full.sectors.distribution,
        &full.sectors.distribution,
    );
    let speed = MarginalFit::compute(
        &reference.full.classes.distribution,
        &full.classes.distribution,
    );
    let shape = ShapeFit::compute(
        table,
        plan.reference_start,
        plan.reference_end,
        start,
        end,
        frequency,
    );

    debug!(
        "{} to {}: dir_para {:.6}, speed_para {:.6}",
        start, end, dir_para, speed_para
    );

    ResultRow {
        start_point: start,
        end_point: end,
        period_freq: frequency.months(),
        dir_para,
        speed_para,
        rep_score: dir_para + speed_para,
        direction,
        speed,
        shape,
    }
}

/// Every daily window of one frequency, in start order
pub fn scan_frequency(
    table: &ObservationTable,
    plan: &ScanPlan,
    reference: &Reference,
    frequency: Frequency,
) -> Vec<ResultRow> {
    let (starts, ends) = time_window_list(plan.scan_start, plan.scan_end, frequency);

    starts
        .into_iter()
        .zip(ends)
        .map(|(start, end)| evaluate_window(table, plan, reference, frequency, start, end))
        .collect()
}

/// Runs the search over all frequencies of `plan`, returning unranked rows
pub fn scan(table: &ObservationTable, plan: &ScanPlan) -> Vec<ResultRow> {
    let reference = Reference::new(table, plan);

    info!(
        "Reference period {} to {} holds {} selected observations",
        plan.reference_start,
        plan.reference_end,
        reference.profile.classification.sectors.distribution.total()
    );

    let mut rows = vec![];

    for &frequency in &plan.frequencies {
        let now = Instant::now();

        let found = scan_frequency(table, plan, &reference, frequency);

        info!(
            "Scan completed for {} ({} windows) in {:.2} mins",
            frequency,
            found.len(),
            now.elapsed().as_secs_f64() / 60.0
        );

        rows.extend(found);
    }

    rows
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::observations::Observation,
        approx::assert_abs_diff_eq,
        chrono::{Duration, NaiveDate},
    };

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    /// Hourly rows from `from`, `n` of each (direction, speed) cell in turn
    fn cells(from: NaiveDateTime, counts: &[(f64, f64, usize)]) -> Vec<Observation> {
        counts
            .iter()
            .flat_map(|&(direction, speed, n)| std::iter::repeat((direction, speed)).take(n))
            .enumerate()
            .map(|(h, (direction, speed))| {
                Observation::new(from + Duration::hours(h as i64), speed, direction)
            })
            .collect()
    }

    #[test]
    fn compare_by_hand() {
        // N = 0 degrees, S = 180 degrees, class 2 = 2 m/s, class 3 = 4 m/s
        //
        //            reference     candidate
        //            c2   c3       c2   c3
        //       N     2    2        3    1
        //       S     1    3        1    1
        let reference_start = start();
        let candidate_start = start() + Duration::days(1);

        let mut rows = cells(
            reference_start,
            &[(0.0, 2.0, 2), (0.0, 4.0, 2), (180.0, 2.0, 1), (180.0, 4.0, 3)],
        );
        rows.extend(cells(
            candidate_start,
            &[(0.0, 2.0, 3), (0.0, 4.0, 1), (180.0, 2.0, 1), (180.0, 4.0, 1)],
        ));
        let table = ObservationTable::new(rows);

        let selection = Selection::new(
            vec![Sector::N, Sector::S],
            vec![SpeedClass::new(2).unwrap(), SpeedClass::new(3).unwrap()],
        )
        .unwrap();

        let reference = Profile::new(
            &table,
            reference_start,
            reference_start + Duration::hours(7),
            &selection,
        );
        let candidate = Profile::new(
            &table,
            candidate_start,
            candidate_start + Duration::hours(5),
            &selection,
        );

        let metric = |r: [f64; 2], c: [f64; 2]| {
            let (rl, cl) = (r[0].hypot(r[1]), c[0].hypot(c[1]));
            let (rt, ct) = (r[0] + r[1], c[0] + c[1]);
            let squared = [
                (r[0] / rl - c[0] / cl).powi(2),
                (r[1] / rl - c[1] / cl).powi(2),
            ];
            let mse = (squared[0] * r[0] + squared[1] * r[1]) / rt;
            let distance = (100.0 * r[0] / rt - 100.0 * c[0] / ct)
                .hypot(100.0 * r[1] / rt - 100.0 * c[1] / ct);
            mse * distance
        };

        // Sector marginal 50/50 against 66.7/33.3
        let north = metric([2.0, 2.0], [3.0, 1.0]);
        let south = metric([1.0, 3.0], [1.0, 1.0]);
        let speed_para = (north * 50.0 + south * 50.0) / 100.0
            * (50.0 - 200.0 / 3.0_f64).hypot(50.0 - 100.0 / 3.0);

        // Class marginal 37.5/62.5 against 66.7/33.3
        let class2 = metric([2.0, 1.0], [3.0, 1.0]);
        let class3 = metric([2.0, 3.0], [1.0, 1.0]);
        let dir_para = (class2 * 37.5 + class3 * 62.5) / 100.0
            * (37.5 - 200.0 / 3.0_f64).hypot(62.5 - 100.0 / 3.0);

        let (dir, speed) = reference.compare(&candidate, &selection);

        assert_abs_diff_eq!(speed, speed_para, epsilon = 1e-9);
        assert_abs_diff_eq!(dir, dir_para, epsilon = 1e-9);
        assert_abs_diff_eq!(speed, 78.141_175_104_245_52, epsilon = 1e-9);
        assert_abs_diff_eq!(dir, 8.202_550_920_268_17, epsilon = 1e-9);
    }
}
