//! Restriction fragment boundaries and lookups between genomic positions and
//! fragment ids.

use rust_lapper as lapper;
use serde::Deserialize;
use serde::Serialize;

use crate::genome::Locus;

/// An error related to building a [`FragmentMap`].
#[derive(Debug)]
pub enum Error {
    /// A fragment had a start at or after its stop.
    InvalidSpan(u64),

    /// The same fragment id was returned more than once.
    Duplicate(u64),

    /// The fragment ids have a gap.
    NonContiguous {
        /// The id that was expected next.
        expected: u64,

        /// The id that was found instead.
        found: u64,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidSpan(id) => write!(f, "fragment {id} has an empty span"),
            Error::Duplicate(id) => write!(f, "fragment {id} was listed more than once"),
            Error::NonContiguous { expected, found } => write!(
                f,
                "fragment ids are not contiguous: expected {expected}, found {found}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// One restriction fragment as returned by the fragment boundary feed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    /// The start position (inclusive).
    start: u64,

    /// The stop position (exclusive).
    stop: u64,

    /// The fragment id.
    fragment_id: u64,
}

impl Fragment {
    /// Creates a new [`Fragment`].
    pub fn new(fragment_id: u64, start: u64, stop: u64) -> Self {
        Self {
            start,
            stop,
            fragment_id,
        }
    }

    /// Gets the fragment id.
    pub fn id(&self) -> u64 {
        self.fragment_id
    }

    /// Gets the start position (inclusive).
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Gets the stop position (exclusive).
    pub fn stop(&self) -> u64 {
        self.stop
    }
}

/// A request for the fragments overlapping a genomic window.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FragmentQuery {
    /// The restriction enzyme the fragments were cut with.
    enzyme: String,

    /// The window.
    locus: Locus,
}

impl FragmentQuery {
    /// Creates a new [`FragmentQuery`].
    pub fn new(enzyme: impl Into<String>, locus: Locus) -> Self {
        Self {
            enzyme: enzyme.into(),
            locus,
        }
    }

    /// Gets the restriction enzyme.
    pub fn enzyme(&self) -> &str {
        &self.enzyme
    }

    /// Gets the window.
    pub fn locus(&self) -> &Locus {
        &self.locus
    }

    /// Gets the chromosome of the window.
    pub fn chromosome(&self) -> &str {
        self.locus.chromosome()
    }

    /// Gets the start of the window.
    pub fn start(&self) -> u64 {
        self.locus.start()
    }

    /// Gets the stop of the window.
    pub fn stop(&self) -> u64 {
        self.locus.stop()
    }
}

impl std::fmt::Display for FragmentQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} fragments in {}", self.enzyme, self.locus)
    }
}

/// An inclusive range of fragment ids.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FragmentRange {
    /// The smallest id.
    min: u64,

    /// The largest id.
    max: u64,
}

impl FragmentRange {
    /// Creates a new [`FragmentRange`], ordering the bounds if needed.
    pub fn new(a: u64, b: u64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Gets the smallest id.
    pub fn min(&self) -> u64 {
        self.min
    }

    /// Gets the largest id.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Gets the number of fragments covered.
    pub fn count(&self) -> u64 {
        self.max - self.min + 1
    }

    /// Returns whether `id` falls within the range.
    pub fn contains(&self, id: u64) -> bool {
        self.min <= id && id <= self.max
    }
}

impl std::fmt::Display for FragmentRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// A bidirectional map between fragment ids and their genomic spans for one
/// queried region.
#[derive(Clone, Debug)]
pub struct FragmentMap {
    /// The chromosome the fragments lie on.
    chromosome: String,

    /// The first (smallest) fragment id.
    first: u64,

    /// The `[start, stop)` spans indexed by `id - first`.
    spans: Vec<(u64, u64)>,

    /// An interval index from genomic position to fragment id.
    lookup: lapper::Lapper<u64, u64>,
}

impl FragmentMap {
    /// Attempts to build a [`FragmentMap`] from fragments in any order.
    ///
    /// The ids must form a contiguous run once sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::coordinate::fragment::Fragment;
    /// use hicmatrix::coordinate::fragment::FragmentMap;
    ///
    /// let map = FragmentMap::try_new(
    ///     "chr1",
    ///     vec![Fragment::new(11, 2_000, 5_000), Fragment::new(10, 1_000, 2_000)],
    /// )?;
    ///
    /// assert_eq!(map.fragment_at(3_000), Some(11));
    /// assert_eq!(map.span(10), Some((1_000, 2_000)));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(chromosome: impl Into<String>, mut fragments: Vec<Fragment>) -> Result<Self> {
        fragments.sort_by_key(|fragment| fragment.id());

        let first = fragments.first().map(|fragment| fragment.id()).unwrap_or(0);
        let mut spans = Vec::with_capacity(fragments.len());
        let mut intervals = Vec::with_capacity(fragments.len());

        for (i, fragment) in fragments.iter().enumerate() {
            if fragment.start() >= fragment.stop() {
                return Err(Error::InvalidSpan(fragment.id()));
            }

            let expected = first + i as u64;

            if fragment.id() != expected {
                return Err(match fragment.id() < expected {
                    true => Error::Duplicate(fragment.id()),
                    false => Error::NonContiguous {
                        expected,
                        found: fragment.id(),
                    },
                });
            }

            spans.push((fragment.start(), fragment.stop()));
            intervals.push(lapper::Interval {
                start: fragment.start(),
                stop: fragment.stop(),
                val: fragment.id(),
            });
        }

        Ok(Self {
            chromosome: chromosome.into(),
            first,
            spans,
            lookup: lapper::Lapper::new(intervals),
        })
    }

    /// Gets the chromosome the fragments lie on.
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// Gets the number of fragments.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns whether the map holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Gets the range of every id in the map.
    pub fn range(&self) -> Option<FragmentRange> {
        match self.spans.len() {
            0 => None,
            n => Some(FragmentRange::new(self.first, self.first + n as u64 - 1)),
        }
    }

    /// Gets the `[start, stop)` span of a fragment.
    pub fn span(&self, id: u64) -> Option<(u64, u64)> {
        let index = id.checked_sub(self.first)?;
        self.spans.get(usize::try_from(index).ok()?).copied()
    }

    /// Gets the id of the fragment containing `position`.
    pub fn fragment_at(&self, position: u64) -> Option<u64> {
        self.lookup
            .find(position, position.saturating_add(1))
            .map(|interval| interval.val)
            .min()
    }

    /// Resolves the genomic window `[start, stop)` to the range of fragment
    /// ids overlapping it.
    pub fn resolve(&self, start: u64, stop: u64) -> Option<FragmentRange> {
        let mut ids = self.lookup.find(start, stop).map(|interval| interval.val);
        let first = ids.next()?;

        let (min, max) = ids.fold((first, first), |(min, max), id| (min.min(id), max.max(id)));
        Some(FragmentRange::new(min, max))
    }

    /// Gets the genomic span of the bin of `resolution` fragments starting at
    /// `id`.
    ///
    /// The bin ends where the fragment `id + resolution` starts. When that
    /// fragment is not in the map, the bin is `resolution` base pairs wide.
    /// [`None`] is returned when `id` itself has no mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::coordinate::fragment::Fragment;
    /// use hicmatrix::coordinate::fragment::FragmentMap;
    ///
    /// let map = FragmentMap::try_new(
    ///     "chr1",
    ///     vec![
    ///         Fragment::new(0, 0, 100),
    ///         Fragment::new(1, 100, 350),
    ///         Fragment::new(2, 350, 400),
    ///     ],
    /// )?;
    ///
    /// assert_eq!(map.bin_span(0, 2), Some((0, 350)));
    /// assert_eq!(map.bin_span(2, 2), Some((350, 352)));
    /// assert_eq!(map.bin_span(7, 2), None);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn bin_span(&self, id: u64, resolution: u64) -> Option<(u64, u64)> {
        let (start, _) = self.span(id)?;

        let stop = id
            .checked_add(resolution)
            .and_then(|next| self.span(next))
            .map(|(next, _)| next)
            .unwrap_or_else(|| start.saturating_add(resolution));

        Some((start, stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> FragmentMap {
        FragmentMap::try_new(
            "chr1",
            vec![
                Fragment::new(10, 1_000, 2_000),
                Fragment::new(11, 2_000, 5_000),
                Fragment::new(12, 5_000, 5_500),
            ],
        )
        .unwrap()
    }

    #[test]
    fn it_resolves_positions_to_fragment_ids() {
        let map = map();

        assert_eq!(map.fragment_at(1_000), Some(10));
        assert_eq!(map.fragment_at(1_999), Some(10));
        assert_eq!(map.fragment_at(2_000), Some(11));
        assert_eq!(map.fragment_at(3_000), Some(11));
        assert_eq!(map.fragment_at(999), None);
        assert_eq!(map.fragment_at(5_500), None);
    }

    #[test]
    fn it_resolves_windows_to_fragment_ranges() {
        let map = map();

        assert_eq!(map.resolve(1_500, 5_001), Some(FragmentRange::new(10, 12)));
        assert_eq!(map.resolve(2_500, 3_000), Some(FragmentRange::new(11, 11)));
        assert_eq!(map.resolve(6_000, 7_000), None);
        assert_eq!(map.range(), Some(FragmentRange::new(10, 12)));
        assert_eq!(map.range().map(|range| range.count()), Some(3));
    }

    #[test]
    fn it_rejects_gaps_and_duplicates() {
        let err = FragmentMap::try_new(
            "chr1",
            vec![Fragment::new(1, 0, 10), Fragment::new(3, 10, 20)],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "fragment ids are not contiguous: expected 2, found 3"
        );

        let err = FragmentMap::try_new(
            "chr1",
            vec![Fragment::new(1, 0, 10), Fragment::new(1, 10, 20)],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "fragment 1 was listed more than once");

        let err = FragmentMap::try_new("chr1", vec![Fragment::new(1, 10, 10)]).unwrap_err();
        assert_eq!(err.to_string(), "fragment 1 has an empty span");
    }

    #[test]
    fn it_deserializes_boundary_feed_items() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let fragments = serde_json::from_str::<Vec<Fragment>>(
            r#"[{"start": 1000, "stop": 2000, "fragmentId": 10}]"#,
        )?;
        assert_eq!(fragments, vec![Fragment::new(10, 1_000, 2_000)]);
        Ok(())
    }

    #[test]
    fn bins_past_the_map_fall_back_to_the_resolution_width() {
        let map = map();

        assert_eq!(map.bin_span(10, 1), Some((1_000, 2_000)));
        assert_eq!(map.bin_span(10, 2), Some((1_000, 5_000)));
        assert_eq!(map.bin_span(11, 2), Some((2_000, 2_002)));
        assert_eq!(map.bin_span(12, 1), Some((5_000, 5_001)));
        assert_eq!(map.bin_span(9, 1), None);
    }

    #[test]
    fn it_allows_empty_maps() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let map = FragmentMap::try_new("chr1", Vec::new())?;
        assert!(map.is_empty());
        assert_eq!(map.range(), None);
        assert_eq!(map.resolve(0, 100), None);
        Ok(())
    }
}
