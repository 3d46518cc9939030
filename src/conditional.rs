//! Conditional views of the joint counts: the speed distribution within each
//! direction sector and the direction distribution within each speed class.

use {
    crate::binning::{Distribution, JointCounts, Sector, SpeedClass, NUM_CLASSES},
    ndarray::Array1,
};

/// One distribution block per owning category
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional<K> {
    pub blocks: Vec<(K, Distribution)>,
}

impl<K: Copy + PartialEq> Conditional<K> {
    pub fn get(&self, owner: K) -> Option<&Distribution> {
        self.blocks
            .iter()
            .find(|(k, _)| *k == owner)
            .map(|(_, d)| d)
    }

    /// Total number of (owner, category) rows
    pub fn rows(&self) -> usize {
        self.blocks.iter().map(|(_, d)| d.len()).sum()
    }
}

/// Distribution over all 12 speed classes for each of `sectors`
pub fn speed_class_of_direction(joint: &JointCounts, sectors: &[Sector]) -> Conditional<Sector> {
    Conditional {
        blocks: sectors
            .iter()
            .map(|&sector| {
                let counts = joint.row(sector.index()).to_owned();
                debug_assert_eq!(counts.len(), NUM_CLASSES);
                (sector, Distribution::from_counts(counts))
            })
            .collect(),
    }
}

/// Distribution over `sectors`, in the given order, for each of `classes`
pub fn direction_sector_of_speed(
    joint: &JointCounts,
    classes: &[SpeedClass],
    sectors: &[Sector],
) -> Conditional<SpeedClass> {
    Conditional {
        blocks: classes
            .iter()
            .map(|&class| {
                let counts = sectors
                    .iter()
                    .map(|s| joint[[s.index(), class.index()]])
                    .collect::<Array1<f64>>();
                (class, Distribution::from_counts(counts))
            })
            .collect(),
    }
}
