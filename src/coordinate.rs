//! Conversions between genomic coordinates, fragment ids, bins, and pixels.

use crate::contact::ContactTuple;
use crate::genome::Locus;
use crate::genome::Orientation;

pub mod fragment;

pub use fragment::FragmentMap;
pub use fragment::FragmentRange;

/// Gets the index of the bin containing `position`.
///
/// `resolution` must be non-zero, which every [`Ladder`] entry is.
///
/// [`Ladder`]: crate::resolution::Ladder
pub fn bin(position: u64, resolution: u64) -> u64 {
    position / resolution
}

/// Gets the start position of the bin containing `position`.
///
/// # Examples
///
/// ```
/// use hicmatrix::coordinate::bin_origin;
///
/// assert_eq!(bin_origin(12_345, 5_000), 10_000);
/// assert_eq!(bin_origin(bin_origin(12_345, 5_000), 5_000), 10_000);
/// ```
pub fn bin_origin(position: u64, resolution: u64) -> u64 {
    bin(position, resolution) * resolution
}

/// Gets the number of bins needed to cover `length` base pairs.
pub fn bin_count(length: u64, resolution: u64) -> u64 {
    length.div_ceil(resolution)
}

/// Synthesizes the full symmetric matrix of an intra-chromosome tile from the
/// single triangle the data service returns.
///
/// Every off-diagonal `(a, b, v)` gains a `(b, a, v)` partner.
///
/// # Examples
///
/// ```
/// use hicmatrix::contact::ContactTuple;
/// use hicmatrix::coordinate::mirror;
///
/// let tuples = mirror(&[ContactTuple::new(0, 0, 1.0), ContactTuple::new(0, 10, 2.0)]);
///
/// assert_eq!(tuples.len(), 3);
/// assert!(tuples.contains(&ContactTuple::new(10, 0, 2.0)));
/// ```
pub fn mirror(tuples: &[ContactTuple]) -> Vec<ContactTuple> {
    let mut result = Vec::with_capacity(tuples.len() * 2);

    for tuple in tuples {
        result.push(*tuple);

        if tuple.a() != tuple.b() {
            result.push(tuple.swapped());
        }
    }

    result
}

/// Exchanges the two positions of every tuple.
pub fn transpose(tuples: &[ContactTuple]) -> Vec<ContactTuple> {
    tuples.iter().map(ContactTuple::swapped).collect()
}

/// Re-expresses canonical tuples so that `a` lies on the x chromosome.
pub fn orient(tuples: &[ContactTuple], orientation: Orientation) -> Vec<ContactTuple> {
    match orientation {
        Orientation::Forward => tuples.to_vec(),
        Orientation::Swapped => transpose(tuples),
    }
}

/// A rectangle of pixels occupied by one contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// The left edge in pixels.
    pub x: f64,

    /// The top edge in pixels.
    pub y: f64,

    /// The width in pixels.
    pub width: f64,

    /// The height in pixels.
    pub height: f64,

    /// The contact value.
    pub value: f64,
}

/// A genomic window laid over a run of pixels.
#[derive(Clone, Copy, Debug)]
pub struct Axis<'a> {
    /// The visible window.
    locus: &'a Locus,

    /// The number of pixels the window is drawn across.
    width_px: f64,
}

impl<'a> Axis<'a> {
    /// Creates a new [`Axis`].
    pub fn new(locus: &'a Locus, width_px: f64) -> Self {
        Self { locus, width_px }
    }

    /// Gets the pixel offset of a genomic position.
    pub fn px(&self, position: u64) -> f64 {
        (position as f64 - self.locus.start() as f64) * self.width_px / self.locus.span() as f64
    }

    /// Gets the genomic position under a pixel offset.
    pub fn position(&self, px: f64) -> u64 {
        let offset = px * self.locus.span() as f64 / self.width_px;
        (self.locus.start() as f64 + offset).max(0.0) as u64
    }
}

/// How tuple positions are turned into genomic spans in the detail view.
#[derive(Clone, Copy, Debug)]
pub enum Binning<'a> {
    /// Positions are base-pair bin starts of a fixed width.
    BasePair(u64),

    /// Positions are fragment ids binned `resolution` at a time; the maps
    /// hold the fragments of the x and y windows.
    Fragment {
        /// The number of fragments per bin.
        resolution: u64,

        /// The fragments of the x window.
        x: &'a FragmentMap,

        /// The fragments of the y window.
        y: &'a FragmentMap,
    },
}

impl Binning<'_> {
    /// Gets the genomic span of the bin at `position` along the x axis.
    fn x_span(&self, position: u64) -> Option<(u64, u64)> {
        match self {
            Binning::BasePair(resolution) => Some((position, position + resolution)),
            Binning::Fragment { resolution, x, .. } => x.bin_span(position, *resolution),
        }
    }

    /// Gets the genomic span of the bin at `position` along the y axis.
    fn y_span(&self, position: u64) -> Option<(u64, u64)> {
        match self {
            Binning::BasePair(resolution) => Some((position, position + resolution)),
            Binning::Fragment { resolution, y, .. } => y.bin_span(position, *resolution),
        }
    }
}

/// The cells produced by [`place()`].
#[derive(Clone, Debug, Default)]
pub struct Placement {
    /// The cells to paint.
    pub cells: Vec<Cell>,

    /// The number of tuples dropped because a fragment id had no mapping.
    pub unmapped: usize,
}

/// Places tuples onto the detail raster.
///
/// The data service is not told which axis is first, so each tuple is tried
/// both forward (`a` on x, `b` on y) and swapped (`b` on x, `a` on y). Every
/// placement whose bin overlaps both visible windows becomes a cell. For
/// tuples on the diagonal the two placements coincide and only one cell is
/// produced.
///
/// # Examples
///
/// ```
/// use hicmatrix::contact::ContactTuple;
/// use hicmatrix::coordinate::Binning;
/// use hicmatrix::coordinate::place;
/// use hicmatrix::genome::Locus;
///
/// let x = Locus::try_new("chr1", 0, 1_000)?;
/// let y = Locus::try_new("chr1", 0, 1_000)?;
///
/// let placement = place(
///     &[ContactTuple::new(0, 500, 3.0)],
///     &x,
///     &y,
///     (100.0, 100.0),
///     &Binning::BasePair(100),
/// );
///
/// assert_eq!(placement.cells.len(), 2);
/// assert_eq!((placement.cells[0].x, placement.cells[0].y), (0.0, 50.0));
/// assert_eq!((placement.cells[1].x, placement.cells[1].y), (50.0, 0.0));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn place(
    tuples: &[ContactTuple],
    x: &Locus,
    y: &Locus,
    (width_x, width_y): (f64, f64),
    binning: &Binning<'_>,
) -> Placement {
    let x_axis = Axis::new(x, width_x);
    let y_axis = Axis::new(y, width_y);

    let mut placement = Placement::default();

    for tuple in tuples {
        let candidates = match tuple.a() == tuple.b() {
            true => vec![(tuple.a(), tuple.b())],
            false => vec![(tuple.a(), tuple.b()), (tuple.b(), tuple.a())],
        };

        let mut placed = false;
        let mut unmapped = false;

        for (px, py) in candidates {
            let (xs, ys) = match (binning.x_span(px), binning.y_span(py)) {
                (Some(xs), Some(ys)) => (xs, ys),
                _ => {
                    unmapped = true;
                    continue;
                }
            };

            if !x.overlaps(xs.0, xs.1) || !y.overlaps(ys.0, ys.1) {
                continue;
            }

            let left = x_axis.px(xs.0);
            let top = y_axis.px(ys.0);

            placement.cells.push(Cell {
                x: left,
                y: top,
                width: x_axis.px(xs.1) - left,
                height: y_axis.px(ys.1) - top,
                value: tuple.value(),
            });
            placed = true;
        }

        if !placed && unmapped {
            placement.unmapped += 1;
        }
    }

    placement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::fragment::Fragment;

    #[test]
    fn binning_is_idempotent() {
        for resolution in [1, 7, 5_000, 2_500_000] {
            for position in [0, 1, 4_999, 5_000, 123_456_789] {
                let once = bin_origin(position, resolution);
                assert_eq!(bin_origin(once, resolution), once);
                assert_eq!(bin(once, resolution), bin(position, resolution));
            }
        }
    }

    #[test]
    fn bin_counts_round_up() {
        assert_eq!(bin_count(10_000, 5_000), 2);
        assert_eq!(bin_count(10_001, 5_000), 3);
        assert_eq!(bin_count(1, 5_000), 1);
    }

    #[test]
    fn mirroring_adds_the_opposite_triangle() {
        let tuples = [
            ContactTuple::new(0, 0, 10.0),
            ContactTuple::new(0, 5_000, 20.0),
            ContactTuple::new(5_000, 15_000, 1.5),
        ];
        let mirrored = mirror(&tuples);

        for tuple in &tuples {
            assert!(mirrored.contains(tuple));
            assert!(mirrored.contains(&tuple.swapped()));
        }

        assert_eq!(mirrored.len(), 5);
    }

    #[test]
    fn orienting_swaps_only_when_needed() {
        let tuples = [ContactTuple::new(1, 2, 3.0)];

        assert_eq!(orient(&tuples, Orientation::Forward), tuples.to_vec());
        assert_eq!(
            orient(&tuples, Orientation::Swapped),
            vec![ContactTuple::new(2, 1, 3.0)]
        );
    }

    #[test]
    fn axes_map_positions_to_pixels() -> Result<(), Box<dyn std::error::Error>> {
        let locus = Locus::try_new("chr1", 1_000, 2_000)?;
        let axis = Axis::new(&locus, 500.0);

        assert_eq!(axis.px(1_000), 0.0);
        assert_eq!(axis.px(1_500), 250.0);
        assert_eq!(axis.px(2_000), 500.0);
        assert_eq!(axis.position(250.0), 1_500);
        Ok(())
    }

    #[test]
    fn placement_skips_tuples_outside_both_windows() -> Result<(), Box<dyn std::error::Error>> {
        let x = Locus::try_new("chr1", 0, 1_000)?;
        let y = Locus::try_new("chr2", 5_000, 6_000)?;

        let tuples = [
            // Forward placement only.
            ContactTuple::new(100, 5_500, 1.0),
            // Swapped placement only.
            ContactTuple::new(5_100, 200, 2.0),
            // Neither.
            ContactTuple::new(9_000, 9_000, 3.0),
        ];

        let placement = place(&tuples, &x, &y, (1_000.0, 1_000.0), &Binning::BasePair(100));

        assert_eq!(placement.cells.len(), 2);
        assert_eq!(placement.cells[0].x, 100.0);
        assert_eq!(placement.cells[0].y, 500.0);
        assert_eq!(placement.cells[0].width, 100.0);
        assert_eq!(placement.cells[1].x, 200.0);
        assert_eq!(placement.cells[1].y, 100.0);
        assert_eq!(placement.cells[1].value, 2.0);
        assert_eq!(placement.unmapped, 0);
        Ok(())
    }

    #[test]
    fn fragment_placement_uses_variable_widths() -> Result<(), Box<dyn std::error::Error>> {
        let x = Locus::try_new("chr1", 1_000, 5_000)?;
        let y = Locus::try_new("chr1", 1_000, 5_000)?;

        let fragments = FragmentMap::try_new(
            "chr1",
            vec![
                Fragment::new(10, 1_000, 2_000),
                Fragment::new(11, 2_000, 5_000),
                Fragment::new(12, 5_000, 5_500),
            ],
        )?;

        let binning = Binning::Fragment {
            resolution: 1,
            x: &fragments,
            y: &fragments,
        };

        let tuples = [
            ContactTuple::new(10, 11, 4.0),
            ContactTuple::new(10, 99, 1.0),
        ];
        let placement = place(&tuples, &x, &y, (400.0, 400.0), &binning);

        assert_eq!(placement.cells.len(), 2);

        let forward = placement.cells[0];
        assert_eq!((forward.x, forward.width), (0.0, 100.0));
        assert_eq!((forward.y, forward.height), (100.0, 300.0));

        let swapped = placement.cells[1];
        assert_eq!((swapped.x, swapped.width), (100.0, 300.0));

        assert_eq!(placement.unmapped, 1);
        Ok(())
    }
}
