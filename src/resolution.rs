//! Resolution ladders and the rules for choosing a bin size at each level.

use nonempty::NonEmpty;
use tracing::debug;

use crate::coordinate::fragment::FragmentRange;

/// An error related to a [`Ladder`].
#[derive(Debug)]
pub enum Error {
    /// The ladder had no entries.
    Empty,

    /// An entry was zero.
    Zero,

    /// The entries were not strictly decreasing.
    NotDecreasing(u64, u64),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Empty => write!(f, "resolution ladder is empty"),
            Error::Zero => write!(f, "resolution ladder contains a zero entry"),
            Error::NotDecreasing(a, b) => write!(
                f,
                "resolution ladder must be strictly decreasing: {a} is followed by {b}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The unit a ladder is measured in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unit {
    /// Base pairs.
    BasePair,

    /// Restriction fragments.
    Fragment,
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::BasePair => write!(f, "BP"),
            Unit::Fragment => write!(f, "FRAG"),
        }
    }
}

/// The outcome of choosing a resolution from a [`Ladder`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Selection {
    /// An entry satisfied the minimum bin count.
    Fit(u64),

    /// No entry satisfied the minimum bin count, so the finest entry was
    /// chosen.
    Exhausted(u64),
}

impl Selection {
    /// Gets the chosen resolution.
    pub fn resolution(&self) -> u64 {
        match self {
            Selection::Fit(resolution) => *resolution,
            Selection::Exhausted(resolution) => *resolution,
        }
    }

    /// Returns whether the ladder was exhausted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Selection::Exhausted(_))
    }
}

/// An ordered list of allowed bin sizes, coarse to fine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ladder(NonEmpty<u64>);

impl Ladder {
    /// Attempts to create a new [`Ladder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::resolution::Ladder;
    ///
    /// let ladder = Ladder::try_new(vec![2_500_000, 500_000, 100_000])?;
    /// assert_eq!(ladder.coarsest(), 2_500_000);
    /// assert_eq!(ladder.finest(), 100_000);
    ///
    /// assert!(Ladder::try_new(vec![100_000, 500_000]).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(entries: Vec<u64>) -> Result<Self> {
        let entries = NonEmpty::from_vec(entries).ok_or(Error::Empty)?;

        if entries.iter().any(|entry| *entry == 0) {
            return Err(Error::Zero);
        }

        for (a, b) in entries.iter().zip(entries.iter().skip(1)) {
            if a <= b {
                return Err(Error::NotDecreasing(*a, *b));
            }
        }

        Ok(Self(entries))
    }

    /// Gets the coarsest (largest) entry.
    pub fn coarsest(&self) -> u64 {
        *self.0.first()
    }

    /// Gets the finest (smallest) entry.
    pub fn finest(&self) -> u64 {
        *self.0.last()
    }

    /// Iterates over the entries, coarse to fine.
    pub fn iter(&self) -> impl Iterator<Item = &u64> {
        self.0.iter()
    }

    /// Gets the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: a ladder has at least one entry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns whether `resolution` is one of the entries.
    pub fn contains(&self, resolution: u64) -> bool {
        self.0.iter().any(|entry| *entry == resolution)
    }

    /// Chooses the coarsest entry `r` with `span / r > min_bins`, falling
    /// back to the finest entry when none qualifies.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::resolution::Ladder;
    /// use hicmatrix::resolution::Selection;
    ///
    /// let ladder = Ladder::try_new(vec![2_500_000, 500_000, 100_000])?;
    ///
    /// assert_eq!(ladder.select(250_000_000, 200), Selection::Fit(500_000));
    /// assert_eq!(ladder.select(1_000_000, 200), Selection::Exhausted(100_000));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn select(&self, span: u64, min_bins: u64) -> Selection {
        // `span / r > min_bins` without losing the fractional part.
        let fits = |r: u64| (span as u128) > (min_bins as u128) * (r as u128);

        match self.0.iter().find(|r| fits(**r)) {
            Some(r) => Selection::Fit(*r),
            None => {
                debug!(
                    span,
                    min_bins,
                    finest = self.finest(),
                    "resolution ladder exhausted"
                );
                Selection::Exhausted(self.finest())
            }
        }
    }
}

/// The binning used to fetch and place contacts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolutionRequest {
    /// Fixed-width base-pair bins.
    BasePair {
        /// The bin size in base pairs.
        resolution: u64,
    },

    /// Bins of `resolution` consecutive restriction fragments.
    Fragment {
        /// The number of fragments per bin.
        resolution: u64,

        /// The fragment ids covered on the first (lead) chromosome.
        a: FragmentRange,

        /// The fragment ids covered on the second (follow) chromosome.
        b: FragmentRange,
    },
}

impl ResolutionRequest {
    /// Gets the bin size, in the request's unit.
    pub fn resolution(&self) -> u64 {
        match self {
            ResolutionRequest::BasePair { resolution } => *resolution,
            ResolutionRequest::Fragment { resolution, .. } => *resolution,
        }
    }

    /// Gets the unit of the request.
    pub fn unit(&self) -> Unit {
        match self {
            ResolutionRequest::BasePair { .. } => Unit::BasePair,
            ResolutionRequest::Fragment { .. } => Unit::Fragment,
        }
    }

    /// Swaps the fragment ranges (when the request is re-expressed with the
    /// chromosomes in the opposite order).
    pub fn swapped(self) -> Self {
        match self {
            ResolutionRequest::BasePair { .. } => self,
            ResolutionRequest::Fragment { resolution, a, b } => ResolutionRequest::Fragment {
                resolution,
                a: b,
                b: a,
            },
        }
    }
}

impl std::fmt::Display for ResolutionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionRequest::BasePair { resolution } => write!(f, "{resolution} bp"),
            ResolutionRequest::Fragment { resolution, .. } => write!(f, "{resolution} frag"),
        }
    }
}

/// The unit chosen for the detail level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetailUnit {
    /// Base-pair bins at the selected resolution.
    BasePair(Selection),

    /// The base-pair ladder was exhausted and a fragment table is available,
    /// so the windows must be resolved to fragment ids first.
    Fragment,
}

/// Chooses the resolution shown at the whole-genome level.
pub fn whole_genome(ladder: &Ladder) -> u64 {
    ladder.coarsest()
}

/// Chooses the resolution for a chromosome pair given the longer of the two
/// chromosome lengths.
pub fn chromosome_pair(ladder: &Ladder, longest: u64, min_bins: u64) -> Selection {
    ladder.select(longest, min_bins)
}

/// Decides between base-pair and fragment mode for the detail level.
///
/// Fragment mode is chosen only when fragments are available for the genome
/// and even the finest base-pair entry yields too few bins for `span`.
///
/// # Examples
///
/// ```
/// use hicmatrix::resolution::DetailUnit;
/// use hicmatrix::resolution::Ladder;
/// use hicmatrix::resolution::Selection;
/// use hicmatrix::resolution::detail_unit;
///
/// let ladder = Ladder::try_new(vec![2_500_000, 500_000, 100_000])?;
///
/// assert_eq!(
///     detail_unit(&ladder, 1_000_000, 200, false),
///     DetailUnit::BasePair(Selection::Exhausted(100_000))
/// );
/// assert_eq!(detail_unit(&ladder, 1_000_000, 200, true), DetailUnit::Fragment);
/// assert_eq!(
///     detail_unit(&ladder, 100_000_000, 200, true),
///     DetailUnit::BasePair(Selection::Fit(100_000))
/// );
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn detail_unit(
    ladder: &Ladder,
    span: u64,
    min_bins: u64,
    fragments_available: bool,
) -> DetailUnit {
    match ladder.select(span, min_bins) {
        Selection::Exhausted(_) if fragments_available => DetailUnit::Fragment,
        selection => DetailUnit::BasePair(selection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_validates_ladders() {
        assert_eq!(
            Ladder::try_new(Vec::new()).unwrap_err().to_string(),
            "resolution ladder is empty"
        );
        assert_eq!(
            Ladder::try_new(vec![10, 0]).unwrap_err().to_string(),
            "resolution ladder contains a zero entry"
        );
        assert_eq!(
            Ladder::try_new(vec![10, 10]).unwrap_err().to_string(),
            "resolution ladder must be strictly decreasing: 10 is followed by 10"
        );
    }

    #[test]
    fn it_selects_the_coarsest_qualifying_entry_for_every_span() {
        let ladder = Ladder::try_new(vec![2_500_000, 1_000_000, 500_000, 100_000, 5_000]).unwrap();
        let min_bins = 200;

        for span in [0, 1, 999, 1_000_000, 20_000_001, 100_000_000, 500_000_001, u32::MAX as u64]
        {
            let expected = ladder
                .iter()
                .copied()
                .find(|r| span / r > min_bins || (span / r == min_bins && span % r > 0))
                .map(Selection::Fit)
                .unwrap_or(Selection::Exhausted(5_000));

            assert_eq!(ladder.select(span, min_bins), expected, "span {span}");
        }
    }

    #[test]
    fn it_falls_back_to_the_finest_entry_when_exhausted() {
        // 1,000,000 / 500,000 = 2 and 1,000,000 / 100,000 = 10, neither > 200.
        let ladder = Ladder::try_new(vec![2_500_000, 500_000, 100_000]).unwrap();
        let selection = ladder.select(1_000_000, 200);

        assert!(selection.is_exhausted());
        assert_eq!(selection.resolution(), 100_000);
    }

    #[test]
    fn it_uses_the_coarsest_entry_for_the_whole_genome() {
        let ladder = Ladder::try_new(vec![2_500_000, 500_000]).unwrap();
        assert_eq!(whole_genome(&ladder), 2_500_000);
    }

    #[test]
    fn it_swaps_fragment_ranges() {
        let request = ResolutionRequest::Fragment {
            resolution: 5,
            a: FragmentRange::new(0, 10),
            b: FragmentRange::new(20, 40),
        };

        match request.swapped() {
            ResolutionRequest::Fragment { a, b, .. } => {
                assert_eq!(a, FragmentRange::new(20, 40));
                assert_eq!(b, FragmentRange::new(0, 10));
            }
            ResolutionRequest::BasePair { .. } => unreachable!(),
        }

        assert_eq!(request.unit(), Unit::Fragment);
        assert_eq!(request.resolution(), 5);
    }
}
