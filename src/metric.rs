//! Representation metric between a reference and a candidate period.
//!
//! For every category the conditional distributions of both periods are
//! compared by a weighted mean squared error of their L2-normalised counts,
//! scaled by the Euclidean distance of their percentage weights. The
//! per-category metrics are then folded into one value with the same
//! two-term structure applied to the marginals.

use {
    crate::{
        binning::{Distribution, Marginal, Sector, SpeedClass},
        conditional::Conditional,
    },
    ndarray::Array1,
    std::fmt::{self, Display},
};

/// Which axis owns the conditional blocks being scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keying {
    /// Blocks owned by direction sectors, scoring the speed distribution
    Direction,
    /// Blocks owned by speed classes, scoring the direction distribution
    SpeedClass,
}

impl Display for Keying {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Keying::Direction => "speed per sector",
            Keying::SpeedClass => "direction per class",
        })
    }
}

pub trait Category: Copy + PartialEq + Display {
    const KEYING: Keying;
}

impl Category for Sector {
    const KEYING: Keying = Keying::Direction;
}

impl Category for SpeedClass {
    const KEYING: Keying = Keying::SpeedClass;
}

/// Per-category representation metrics with the empty-candidate penalty
/// already applied
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScores<K> {
    pub keying: Keying,
    pub scores: Vec<(K, f64)>,
}

impl<K: Copy> CategoryScores<K> {
    pub fn values(&self) -> Array1<f64> {
        self.scores.iter().map(|&(_, v)| v).collect()
    }
}

impl<K: Display> Display for CategoryScores<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.keying)?;
        for (k, v) in &self.scores {
            write!(f, " {}={:.6}", k, v)?;
        }
        Ok(())
    }
}

/// Weighted mean, skipping zero weights. Zero total weight gives 0.
pub fn weighted_average(values: &Array1<f64>, weights: &Array1<f64>) -> f64 {
    let (sum, total) = values
        .iter()
        .zip(weights.iter())
        .filter(|(_, &w)| w != 0.0)
        .fold((0.0, 0.0), |(sum, total), (&v, &w)| (sum + v * w, total + w));

    if total == 0.0 {
        0.0
    } else {
        sum / total
    }
}

pub fn euclidean(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    (a - b).mapv(|x| x * x).sum().sqrt()
}

/// Metric of one category, NaN when the candidate never saw it
pub fn representation_metric(reference: &Distribution, candidate: &Distribution) -> f64 {
    if candidate.norm.sum() == 0.0 {
        return f64::NAN;
    }

    let squared = (&reference.norm - &candidate.norm).mapv(|x| x * x);

    weighted_average(&squared, &reference.weight) * euclidean(&reference.weight, &candidate.weight)
}

/// Scores every category of `categories`, replacing NaN entries with one
/// more than the largest valid score
pub fn score<K: Category>(
    reference: &Conditional<K>,
    candidate: &Conditional<K>,
    categories: &[K],
) -> CategoryScores<K> {
    let mut scores = categories
        .iter()
        .map(|&k| {
            let metric = match (reference.get(k), candidate.get(k)) {
                (Some(r), Some(c)) => representation_metric(r, c),
                _ => f64::NAN,
            };
            (k, metric)
        })
        .collect::<Vec<_>>();

    let worst = scores
        .iter()
        .map(|&(_, v)| v)
        .filter(|v| !v.is_nan())
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))));

    // With no valid score at all the NaN stays and the row ranks last
    if let Some(worst) = worst {
        for (_, v) in scores.iter_mut().filter(|(_, v)| v.is_nan()) {
            *v = worst + 1.0;
        }
    }

    CategoryScores {
        keying: K::KEYING,
        scores,
    }
}

/// Folds per-category scores into one parametrization value using the
/// reference marginal as weights
pub fn aggregate<K: Copy>(
    scores: &CategoryScores<K>,
    reference: &Marginal<K>,
    candidate: &Marginal<K>,
) -> f64 {
    let r = &reference.distribution.weight;
    let c = &candidate.distribution.weight;

    weighted_average(&scores.values(), r) * euclidean(r, c)
}
