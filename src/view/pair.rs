//! The chromosome-pair level.

use crate::contact::ContactTuple;
use crate::contact::Normalization;
use crate::coordinate;
use crate::genome::Orientation;
use crate::genome::Pair;
use crate::raster;
use crate::raster::Raster;
use crate::resolution::Selection;

/// One chromosome drawn along an axis of the chromosome-pair raster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Side {
    /// The chromosome name.
    name: String,

    /// The chromosome length.
    length: u64,
}

impl Side {
    /// Creates a new [`Side`].
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    /// Gets the chromosome name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the chromosome length.
    pub fn length(&self) -> u64 {
        self.length
    }
}

/// The state of the chromosome-pair level.
///
/// The data is held in canonical (lead, follow) order; the raster is drawn
/// with `x` along the horizontal axis in click order.
#[derive(Clone, Debug)]
pub struct PairView {
    /// The chromosome along x.
    x: Side,

    /// The chromosome along y.
    y: Side,

    /// The canonical pair.
    pair: Pair,

    /// How (x, y) relates to the canonical pair.
    orientation: Orientation,

    /// The resolution.
    selection: Selection,

    /// The pixels per cell.
    bin_px: u32,

    /// The bins drawn per cell. Above one when there are more bins than
    /// pixels in the budget.
    stride: u64,

    /// The normalization the data was (or is being) fetched with.
    normalization: Normalization,

    /// The held data.
    tuples: Option<Vec<ContactTuple>>,

    /// The painted raster.
    raster: Option<Raster>,
}

impl PairView {
    /// Creates a [`PairView`] with no data.
    ///
    /// The longer chromosome is fit into `max_px` pixels. Bins are widened to
    /// whole pixels when there are fewer bins than pixels; otherwise
    /// neighboring bins share a pixel so the raster never exceeds `max_px`
    /// along either side.
    pub fn new(
        x: Side,
        y: Side,
        (pair, orientation): (Pair, Orientation),
        selection: Selection,
        max_px: u32,
        normalization: Normalization,
    ) -> Self {
        let longest = x.length().max(y.length());
        let bins = coordinate::bin_count(longest, selection.resolution()).max(1);
        let max_px = u64::from(max_px.max(1));

        let stride = bins.div_ceil(max_px);
        let cells = bins.div_ceil(stride);
        let bin_px = u32::try_from(max_px / cells).unwrap_or(u32::MAX).max(1);

        Self {
            x,
            y,
            pair,
            orientation,
            selection,
            bin_px,
            stride,
            normalization,
            tuples: None,
            raster: None,
        }
    }

    /// Gets the chromosome along x.
    pub fn x(&self) -> &Side {
        &self.x
    }

    /// Gets the chromosome along y.
    pub fn y(&self) -> &Side {
        &self.y
    }

    /// Gets the canonical pair.
    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    /// Gets the orientation of (x, y) against the canonical pair.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Gets the resolution.
    pub fn resolution(&self) -> u64 {
        self.selection.resolution()
    }

    /// Gets the resolution selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Gets the pixels per cell.
    pub fn bin_px(&self) -> u32 {
        self.bin_px
    }

    /// Gets the number of bins drawn per cell.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Gets the genomic span of one cell.
    fn cell_span(&self) -> u64 {
        self.resolution().saturating_mul(self.stride)
    }

    /// Gets the normalization method.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Gets the held data in canonical order.
    pub fn tuples(&self) -> Option<&[ContactTuple]> {
        self.tuples.as_deref()
    }

    /// Gets the painted raster.
    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    /// Gets the raster size `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        let extent = |length: u64| {
            let cells = coordinate::bin_count(length, self.cell_span());
            u32::try_from(cells)
                .unwrap_or(u32::MAX)
                .saturating_mul(self.bin_px)
        };

        (extent(self.x.length()), extent(self.y.length()))
    }

    /// Returns whether the held data can be shown for `pair` under
    /// `normalization` without fetching.
    pub fn holds(&self, pair: &Pair, normalization: Normalization) -> bool {
        self.tuples.is_some() && &self.pair == pair && self.normalization == normalization
    }

    /// Takes the held data, leaving the view empty.
    pub fn take_tuples(&mut self) -> Option<Vec<ContactTuple>> {
        self.tuples.take()
    }

    /// Replaces the held data.
    pub fn load(&mut self, tuples: Vec<ContactTuple>) {
        self.tuples = Some(tuples);
    }

    /// Clears the held data for a new normalization, keeping the raster until
    /// new data arrives.
    pub fn invalidate(&mut self, normalization: Normalization) {
        self.tuples = None;
        self.normalization = normalization;
    }

    /// Repaints the raster from the held data.
    pub fn paint(&mut self, cutoff: f64) {
        let Some(tuples) = self.tuples.as_deref() else {
            return;
        };

        let mut oriented = coordinate::orient(tuples, self.orientation);

        if self.pair.is_intra() {
            oriented = coordinate::mirror(&oriented);
        }

        self.raster = Some(raster::paint_bins(
            &oriented,
            self.cell_span(),
            self.bin_px,
            self.size(),
            cutoff,
        ));
    }

    /// Converts a raster pixel into genomic anchors `(x, y)`.
    ///
    /// Returns [`None`] outside the raster.
    pub fn anchor(&self, px: u32, py: u32) -> Option<(u64, u64)> {
        let (width, height) = self.size();

        if px >= width || py >= height {
            return None;
        }

        let span = self.cell_span();
        let scale = |p: u32, length: u64| {
            let position = p as u64 * span / self.bin_px as u64;
            position.min(length.saturating_sub(1))
        };

        Some((scale(px, self.x.length()), scale(py, self.y.length())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Chromosome;
    use crate::genome::Genome;

    fn view(x: &str, y: &str) -> PairView {
        let genome = Genome::try_new([
            Chromosome::new("chr1", 1_000_000),
            Chromosome::new("chr2", 400_000),
        ])
        .unwrap();

        let canonical = Pair::canonical(&genome, x, y).unwrap();
        let side = |name: &str| Side::new(name, genome.length(name).unwrap());

        PairView::new(
            side(x),
            side(y),
            canonical,
            Selection::Fit(5_000),
            800,
            Normalization::None,
        )
    }

    #[test]
    fn it_fits_the_longer_chromosome_in_the_pixel_budget() {
        let view = view("chr1", "chr2");

        // 200 bins into 800 pixels.
        assert_eq!(view.bin_px(), 4);
        assert_eq!(view.size(), (800, 320));
    }

    #[test]
    fn it_shares_pixels_when_there_are_more_bins_than_pixels() {
        let genome = Genome::try_new([
            Chromosome::new("chr1", 1_000_000),
            Chromosome::new("chr2", 400_000),
        ])
        .unwrap();

        let mut view = PairView::new(
            Side::new("chr1", 1_000_000),
            Side::new("chr2", 400_000),
            Pair::canonical(&genome, "chr1", "chr2").unwrap(),
            Selection::Fit(10),
            800,
            Normalization::None,
        );

        // 100,000 bins drawn 125 to a pixel.
        assert_eq!(view.stride(), 125);
        assert_eq!(view.bin_px(), 1);
        assert_eq!(view.size(), (800, 320));

        view.load(vec![
            ContactTuple::new(500_000, 0, 100.0),
            ContactTuple::new(501_000, 1_000, 100.0),
        ]);
        view.paint(50.0);

        let raster = view.raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (800, 320));
        assert_eq!(raster.painted(), 1);
        assert_eq!(raster.pixel(400, 0), Some([255, 0, 0, 255]));

        assert_eq!(view.anchor(400, 1), Some((500_000, 1_250)));
    }

    #[test]
    fn it_paints_in_click_order() {
        let mut view = view("chr2", "chr1");
        assert_eq!(view.orientation(), Orientation::Swapped);

        // Canonical: chr1 position 10,000 against chr2 position 0.
        view.load(vec![ContactTuple::new(10_000, 0, 100.0)]);
        view.paint(50.0);

        let raster = view.raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (320, 800));
        assert_eq!(raster.painted(), 16);
        assert_eq!(raster.pixel(0, 8), Some([255, 0, 0, 255]));
    }

    #[test]
    fn it_converts_clicks_to_anchors() {
        let view = view("chr1", "chr2");

        assert_eq!(view.anchor(4, 8), Some((5_000, 10_000)));
        assert_eq!(view.anchor(799, 319), Some((998_750, 398_750)));
        assert_eq!(view.anchor(800, 0), None);
    }

    #[test]
    fn it_reuses_data_only_for_the_same_normalization() {
        let mut view = view("chr1", "chr2");
        let pair = view.pair().clone();
        assert!(!view.holds(&pair, Normalization::None));

        view.load(Vec::new());
        assert!(view.holds(&pair, Normalization::None));
        assert!(!view.holds(&pair, Normalization::Vc));

        view.invalidate(Normalization::Vc);
        assert!(!view.holds(&pair, Normalization::Vc));
    }
}
