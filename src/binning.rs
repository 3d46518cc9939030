//! Classification of wind observations into direction sectors and
//! Beaufort-like speed classes.

use {
    crate::{error::Error, observations::ObservationTable},
    chrono::NaiveDateTime,
    ndarray::{Array1, Array2},
    serde::Deserialize,
    std::{
        collections::HashSet,
        convert::TryFrom,
        fmt::{self, Display},
        hash::Hash,
        str::FromStr,
    },
};

pub const NUM_SECTORS: usize = 16;
pub const NUM_CLASSES: usize = 12;

/// Width of a direction sector in degrees
pub const SECTOR_WIDTH: f64 = 22.5;

/// Lower speed edge of classes 1 to 11 in m/s
pub const SPEED_EDGES: [f64; NUM_CLASSES - 1] =
    [0.5, 1.5, 3.3, 5.5, 7.9, 10.7, 13.8, 17.1, 20.7, 24.4, 28.4];

/// Compass direction sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum Sector {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl Sector {
    pub const ALL: [Sector; NUM_SECTORS] = [
        Sector::N,
        Sector::NNE,
        Sector::NE,
        Sector::ENE,
        Sector::E,
        Sector::ESE,
        Sector::SE,
        Sector::SSE,
        Sector::S,
        Sector::SSW,
        Sector::SW,
        Sector::WSW,
        Sector::W,
        Sector::WNW,
        Sector::NW,
        Sector::NNW,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Sector::N => "N",
            Sector::NNE => "NNE",
            Sector::NE => "NE",
            Sector::ENE => "ENE",
            Sector::E => "E",
            Sector::ESE => "ESE",
            Sector::SE => "SE",
            Sector::SSE => "SSE",
            Sector::S => "S",
            Sector::SSW => "SSW",
            Sector::SW => "SW",
            Sector::WSW => "WSW",
            Sector::W => "W",
            Sector::WNW => "WNW",
            Sector::NW => "NW",
            Sector::NNW => "NNW",
        }
    }

    /// Sector of a direction in degrees. Sector edges sit half a sector
    /// either side of each compass point, so [348.75, 360] wraps onto N.
    pub fn from_degrees(direction: f64) -> Self {
        let bin = (0..NUM_SECTORS)
            .take_while(|&k| SECTOR_WIDTH / 2.0 + SECTOR_WIDTH * k as f64 <= direction)
            .count();

        Sector::ALL[bin % NUM_SECTORS]
    }
}

impl Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sector::ALL
            .iter()
            .copied()
            .find(|sector| sector.label() == s)
            .ok_or_else(|| Error::UnknownSector(s.to_owned()))
    }
}

impl TryFrom<String> for Sector {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Speed class on a 0-11 Beaufort-like scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "u8")]
pub struct SpeedClass(u8);

impl SpeedClass {
    pub fn new(class: u8) -> Option<Self> {
        if (class as usize) < NUM_CLASSES {
            Some(Self(class))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = SpeedClass> {
        (0..NUM_CLASSES as u8).map(SpeedClass)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Class of a speed in m/s, bins are closed on their lower edge
    pub fn from_speed(speed: f64) -> Self {
        Self(SPEED_EDGES.iter().take_while(|&&edge| edge <= speed).count() as u8)
    }
}

impl Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for SpeedClass {
    type Error = Error;

    fn try_from(class: u8) -> Result<Self, Self::Error> {
        SpeedClass::new(class).ok_or(Error::UnknownClass(class))
    }
}

/// Requested subset of sectors and classes.
///
/// Sectors keep their requested order, classes are held ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    sectors: Vec<Sector>,
    classes: Vec<SpeedClass>,
}

impl Selection {
    pub fn new(sectors: Vec<Sector>, mut classes: Vec<SpeedClass>) -> Result<Self, Error> {
        if sectors.len() < 2 {
            return Err(Error::TooFewCategories("direction sectors"));
        }
        if classes.len() < 2 {
            return Err(Error::TooFewCategories("speed classes"));
        }
        check_unique(&sectors)?;
        check_unique(&classes)?;

        classes.sort();

        Ok(Self { sectors, classes })
    }

    /// All 16 sectors and all 12 classes
    pub fn all() -> Self {
        Self {
            sectors: Sector::ALL.to_vec(),
            classes: SpeedClass::all().collect(),
        }
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn classes(&self) -> &[SpeedClass] {
        &self.classes
    }

    fn contains(&self, sector: Sector, class: SpeedClass) -> bool {
        self.sectors.contains(&sector) && self.classes.contains(&class)
    }
}

fn check_unique<T: Eq + Hash + Display>(items: &[T]) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return Err(Error::DuplicateCategory(item.to_string()));
        }
    }
    Ok(())
}

/// Occurrence counts and their two normalisations over one category axis
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub count: Array1<f64>,
    /// L2-normalised counts
    pub norm: Array1<f64>,
    /// Percentage of the total count
    pub weight: Array1<f64>,
}

impl Distribution {
    /// An all-zero count vector yields zero `norm` and `weight` vectors
    pub fn from_counts(count: Array1<f64>) -> Self {
        let total = count.sum();
        let length = count.dot(&count).sqrt();

        let norm = if length > 0.0 {
            &count / length
        } else {
            Array1::zeros(count.len())
        };

        let weight = if total > 0.0 {
            &count * (100.0 / total)
        } else {
            Array1::zeros(count.len())
        };

        Self {
            count,
            norm,
            weight,
        }
    }

    pub fn total(&self) -> f64 {
        self.count.sum()
    }

    pub fn len(&self) -> usize {
        self.count.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
    }
}

/// Distribution over one axis together with the categories it is indexed by
#[derive(Debug, Clone, PartialEq)]
pub struct Marginal<K> {
    pub categories: Vec<K>,
    pub distribution: Distribution,
}

impl<K: Copy + PartialEq> Marginal<K> {
    pub fn get(&self, category: K) -> Option<(f64, f64, f64)> {
        let i = self.categories.iter().position(|&k| k == category)?;
        let d = &self.distribution;
        Some((d.count[i], d.norm[i], d.weight[i]))
    }
}

/// Dense sector x class occurrence counts
pub type JointCounts = Array2<f64>;

/// Output of [`classify`]
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub joint: JointCounts,
    pub sectors: Marginal<Sector>,
    pub classes: Marginal<SpeedClass>,
}

/// Counts the observations in `[start, end]` per (sector, class) cell,
/// keeping only the selected sectors and classes, and derives both
/// marginals.
pub fn classify(
    table: &ObservationTable,
    start: NaiveDateTime,
    end: NaiveDateTime,
    selection: &Selection,
) -> Classification {
    let mut joint = JointCounts::zeros((NUM_SECTORS, NUM_CLASSES));

    for o in table.slice(start, end) {
        let sector = Sector::from_degrees(o.direction);
        let class = SpeedClass::from_speed(o.speed);

        if selection.contains(sector, class) {
            joint[[sector.index(), class.index()]] += 1.0;
        }
    }

    let sector_counts = selection
        .sectors()
        .iter()
        .map(|s| joint.row(s.index()).sum())
        .collect::<Array1<f64>>();

    let class_counts = selection
        .classes()
        .iter()
        .map(|c| joint.column(c.index()).sum())
        .collect::<Array1<f64>>();

    Classification {
        sectors: Marginal {
            categories: selection.sectors().to_vec(),
            distribution: Distribution::from_counts(sector_counts),
        },
        classes: Marginal {
            categories: selection.classes().to_vec(),
            distribution: Distribution::from_counts(class_counts),
        },
        joint,
    }
}

/// [`classify`] over all 16 sectors and 12 classes
pub fn classify_all(
    table: &ObservationTable,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Classification {
    classify(table, start, end, &Selection::all())
}
