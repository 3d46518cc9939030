//! Secondary goodness-of-fit statistics used to break ties between windows
//! with similar representation scores.

use {
    crate::{
        binning::Distribution,
        metric::{euclidean, weighted_average},
        observations::{slice_between, Observation, ObservationTable},
        window::Frequency,
    },
    chrono::{Datelike, Duration, NaiveDate, NaiveDateTime},
    ndarray::Array1,
    statrs::function::beta::beta_reg,
};

/// Samples dropped from either end of a smoothed profile
pub const EDGE_TRIM: usize = 5;

/// Smoothing span per day of window length
const SPAN_PER_DAY: f64 = 23.0;

/// Similarity of two percentage-weight vectors in percent, penalised by
/// their Euclidean distance
pub fn percent_sim(reference: &Distribution, candidate: &Distribution) -> f64 {
    let r = &reference.weight;
    let c = &candidate.weight;

    let similarity = r
        .iter()
        .zip(c.iter())
        .map(|(&r, &c)| {
            let s = 100.0 - (r - c).abs() * 100.0 / r;
            if s.is_finite() {
                s
            } else {
                0.0
            }
        })
        .collect::<Array1<f64>>();

    weighted_average(&similarity, r) - euclidean(r, c)
}

/// Coefficient of determination of `predicted` against `truth`
pub fn r2_score(truth: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let mean = truth.mean().unwrap_or(0.0);
    let residual = (truth - predicted).mapv(|x| x * x).sum();
    let total = truth.mapv(|x| (x - mean).powi(2)).sum();

    if total != 0.0 {
        1.0 - residual / total
    } else if residual == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Pearson correlation coefficient and its two-sided p-value.
///
/// Both are NaN for fewer than two samples or constant input.
pub fn pearson(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n < 2 {
        return (f64::NAN, f64::NAN);
    }

    let (x, y) = (&x[..n], &y[..n]);
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).max(-1.0).min(1.0);

    if n == 2 {
        return (r.signum(), 1.0);
    }

    // Under the null hypothesis (r + 1) / 2 is Beta(n/2 - 1, n/2 - 1)
    let ab = n as f64 / 2.0 - 1.0;
    let p = 2.0 * beta_reg(ab, ab, 0.5 * (1.0 - r.abs()));

    (r, p.min(1.0))
}

/// Mean absolute error rounded to 3 decimals
pub fn mae(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return f64::NAN;
    }

    round3((a - b).mapv(f64::abs).sum() / n as f64)
}

/// Rounds the exact binary value to 3 decimals, ties to even
fn round3(x: f64) -> f64 {
    // Only odd multiples of 1/16 lie exactly halfway between two thousandths
    let sixteenths = x * 16.0;
    if sixteenths.fract() == 0.0 && sixteenths % 2.0 != 0.0 {
        return round_half_even(x * 1000.0) / 1000.0;
    }

    format!("{:.3}", x).parse().unwrap_or(x)
}

fn round_half_even(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        r
    }
}

/// Goodness of fit of a candidate marginal against the reference marginal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginalFit {
    pub similarity: f64,
    pub r2: f64,
    pub correlation: f64,
    pub p_value: f64,
    pub mae: f64,
}

impl MarginalFit {
    pub fn compute(reference: &Distribution, candidate: &Distribution) -> Self {
        let (correlation, p_value) = pearson(
            reference.norm.as_slice().unwrap_or(&[]),
            candidate.norm.as_slice().unwrap_or(&[]),
        );

        Self {
            similarity: percent_sim(reference, candidate),
            r2: r2_score(&reference.norm, &candidate.norm),
            correlation,
            p_value,
            mae: mae(&candidate.norm, &reference.norm),
        }
    }
}

/// Adjusted exponentially weighted moving average
pub fn ewm_mean(values: &[f64], span: f64) -> Vec<f64> {
    let decay = 1.0 - 2.0 / (span + 1.0);
    let (mut numerator, mut denominator) = (0.0, 0.0);

    values
        .iter()
        .map(|&x| {
            numerator = x + decay * numerator;
            denominator = 1.0 + decay * denominator;
            numerator / denominator
        })
        .collect()
}

fn speeds(rows: &[Observation]) -> Vec<f64> {
    rows.iter().map(|o| o.speed).collect()
}

/// Position-wise mean over profiles of different lengths
fn mean_profile(profiles: &[Vec<f64>]) -> Vec<f64> {
    let longest = profiles.iter().map(Vec::len).max().unwrap_or(0);

    (0..longest)
        .map(|i| {
            let (sum, n) = profiles
                .iter()
                .filter_map(|p| p.get(i))
                .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
            sum / n as f64
        })
        .collect()
}

/// Smoothed multi-year speed profile for the calendar days of a window.
///
/// For every year of the reference span a block of `frequency` x 30 days is
/// taken starting on the window's month and day, smoothed, and averaged by
/// position across years.
pub fn seasonal_profile(
    table: &ObservationTable,
    reference_start: NaiveDateTime,
    reference_end: NaiveDateTime,
    window_start: NaiveDateTime,
    frequency: Frequency,
) -> Vec<f64> {
    let period = frequency.approx_days();
    let span = period as f64 * SPAN_PER_DAY;
    let reference = table.slice(reference_start, reference_end);

    let month = window_start.month();
    let day = if month == 2 && window_start.day() == 29 {
        28
    } else {
        window_start.day()
    };

    let profiles = (reference_start.year()..reference_end.year())
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0))
        .map(|from| {
            let to = from + Duration::days(period - 1);
            ewm_mean(&speeds(slice_between(reference, from, to)), span)
        })
        .collect::<Vec<_>>();

    mean_profile(&profiles)
}

/// Shape similarity of a window's smoothed speed series to the seasonal
/// profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeFit {
    pub distance: f64,
    pub correlation: f64,
    pub p_value: f64,
}

impl ShapeFit {
    pub fn compute(
        table: &ObservationTable,
        reference_start: NaiveDateTime,
        reference_end: NaiveDateTime,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        frequency: Frequency,
    ) -> Self {
        let profile = seasonal_profile(
            table,
            reference_start,
            reference_end,
            window_start,
            frequency,
        );

        let span = frequency.approx_days() as f64 * SPAN_PER_DAY;
        let candidate = ewm_mean(&speeds(table.slice(window_start, window_end)), span);

        let n = profile.len().min(candidate.len());
        let (profile, candidate) = if n > 2 * EDGE_TRIM {
            (
                &profile[EDGE_TRIM..n - EDGE_TRIM],
                &candidate[EDGE_TRIM..n - EDGE_TRIM],
            )
        } else {
            (&profile[..0], &candidate[..0])
        };

        let distance = profile
            .iter()
            .zip(candidate)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();
        let (correlation, p_value) = pearson(profile, candidate);

        Self {
            distance,
            correlation,
            p_value,
        }
    }
}
