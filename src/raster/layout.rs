//! The whole-genome canvas layout: where each chromosome pair is drawn, plus
//! the static decorations that do not depend on contact data.

use crate::coordinate;
use crate::genome::Genome;
use crate::genome::Pair;
use crate::raster::Raster;

/// The background of even chromosome blocks.
const LIGHT_BAND: [u8; 4] = [255, 255, 255, 255];

/// The background of odd chromosome blocks.
const DARK_BAND: [u8; 4] = [238, 238, 238, 255];

/// The span of one chromosome along either axis of the canvas.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Extent {
    /// The chromosome name.
    name: String,

    /// The first pixel.
    offset: u32,

    /// The number of pixels.
    size: u32,
}

/// The axis a [`Label`] is drawn along.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    /// Along the top edge.
    Horizontal,

    /// Along the left edge.
    Vertical,
}

/// A chromosome name positioned at the center of its extent.
///
/// Labels are emitted as positions only; rendering text is left to the host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Label {
    /// The text.
    pub text: String,

    /// The axis the label is drawn along.
    pub orientation: Orientation,

    /// The pixel the label is centered on, along its axis.
    pub center: u32,
}

/// One chromosome block of the checkerboard background.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Band {
    /// The left edge.
    pub x: u32,

    /// The top edge.
    pub y: u32,

    /// The width.
    pub width: u32,

    /// The height.
    pub height: u32,

    /// The fill color.
    pub color: [u8; 4],
}

/// The pixel placement of every chromosome on the whole-genome canvas.
///
/// Both axes share the same chromosome order, so the canvas is square.
#[derive(Clone, Debug)]
pub struct Layout {
    /// The whole-genome resolution.
    resolution: u64,

    /// The pixels per bin.
    bin_px: u32,

    /// The pixels between adjacent chromosomes.
    border_px: u32,

    /// The extents, in display order.
    extents: Vec<Extent>,

    /// The total size in pixels.
    size: u32,
}

impl Layout {
    /// Lays out the chromosomes of `genome`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Chromosome;
    /// use hicmatrix::genome::Genome;
    /// use hicmatrix::raster::Layout;
    ///
    /// let genome = Genome::try_new([
    ///     Chromosome::new("chr1", 10_000),
    ///     Chromosome::new("chr2", 12_000),
    /// ])?;
    ///
    /// let layout = Layout::new(&genome, 5_000, 2, 1);
    /// assert_eq!(layout.extent("chr1"), Some((0, 4)));
    /// assert_eq!(layout.extent("chr2"), Some((5, 6)));
    /// assert_eq!(layout.size(), 11);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(genome: &Genome, resolution: u64, bin_px: u32, border_px: u32) -> Self {
        let mut extents = Vec::with_capacity(genome.len());
        let mut offset = 0u32;

        for (i, chromosome) in genome.iter().enumerate() {
            if i > 0 {
                offset = offset.saturating_add(border_px);
            }

            let bins = coordinate::bin_count(chromosome.length(), resolution);
            let size = u32::try_from(bins)
                .unwrap_or(u32::MAX)
                .saturating_mul(bin_px);

            extents.push(Extent {
                name: chromosome.name().to_string(),
                offset,
                size,
            });

            offset = offset.saturating_add(size);
        }

        Self {
            resolution,
            bin_px,
            border_px,
            extents,
            size: offset,
        }
    }

    /// Gets the whole-genome resolution.
    pub fn resolution(&self) -> u64 {
        self.resolution
    }

    /// Gets the pixels per bin.
    pub fn bin_px(&self) -> u32 {
        self.bin_px
    }

    /// Gets the pixels between adjacent chromosomes.
    pub fn border_px(&self) -> u32 {
        self.border_px
    }

    /// Gets the width (and height) of the canvas.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Gets the `(offset, size)` of a chromosome along either axis.
    pub fn extent(&self, name: &str) -> Option<(u32, u32)> {
        self.extents
            .iter()
            .find(|extent| extent.name == name)
            .map(|extent| (extent.offset, extent.size))
    }

    /// Gets the origin of a pair's direct raster: lead along x, follow along y.
    pub fn direct_origin(&self, pair: &Pair) -> Option<(u32, u32)> {
        let (x, _) = self.extent(pair.lead())?;
        let (y, _) = self.extent(pair.follow())?;
        Some((x, y))
    }

    /// Gets the origin of a pair's transposed raster: follow along x, lead
    /// along y.
    pub fn transposed_origin(&self, pair: &Pair) -> Option<(u32, u32)> {
        let (x, _) = self.extent(pair.follow())?;
        let (y, _) = self.extent(pair.lead())?;
        Some((x, y))
    }

    /// Gets the size of a pair's direct raster.
    pub fn direct_size(&self, pair: &Pair) -> Option<(u32, u32)> {
        let (_, width) = self.extent(pair.lead())?;
        let (_, height) = self.extent(pair.follow())?;
        Some((width, height))
    }

    /// Finds the chromosome under a pixel along either axis, with the pixel
    /// offset inside its extent.
    fn chromosome_at(&self, px: u32) -> Option<(&str, u32)> {
        self.extents
            .iter()
            .find(|extent| extent.offset <= px && px < extent.offset + extent.size)
            .map(|extent| (extent.name.as_str(), px - extent.offset))
    }

    /// Finds the chromosomes (x, y) under a canvas pixel.
    ///
    /// Returns [`None`] for borders and pixels outside the canvas.
    pub fn locate(&self, px: u32, py: u32) -> Option<(&str, &str)> {
        let (x, _) = self.chromosome_at(px)?;
        let (y, _) = self.chromosome_at(py)?;
        Some((x, y))
    }

    /// Gets the canvas pixel of a genomic position along either axis.
    pub fn position_px(&self, name: &str, position: u64) -> Option<u32> {
        let (offset, size) = self.extent(name)?;
        let bin = u32::try_from(coordinate::bin(position, self.resolution)).ok()?;
        let px = bin.saturating_mul(self.bin_px);

        match px < size {
            true => Some(offset + px),
            false => None,
        }
    }

    /// Gets the chromosome and genomic position (the bin start) under a
    /// canvas pixel along either axis.
    pub fn position_at(&self, px: u32) -> Option<(&str, u64)> {
        let (name, inside) = self.chromosome_at(px)?;
        let bin = (inside / self.bin_px.max(1)) as u64;
        Some((name, bin * self.resolution))
    }

    /// Gets the checkerboard background bands, one per chromosome block.
    pub fn bands(&self) -> Vec<Band> {
        let mut bands = Vec::with_capacity(self.extents.len() * self.extents.len());

        for (i, x) in self.extents.iter().enumerate() {
            for (j, y) in self.extents.iter().enumerate() {
                bands.push(Band {
                    x: x.offset,
                    y: y.offset,
                    width: x.size,
                    height: y.size,
                    color: match (i + j) % 2 {
                        0 => LIGHT_BAND,
                        _ => DARK_BAND,
                    },
                });
            }
        }

        bands
    }

    /// Gets the axis labels, one per chromosome on each axis.
    pub fn labels(&self) -> Vec<Label> {
        [Orientation::Horizontal, Orientation::Vertical]
            .into_iter()
            .flat_map(|orientation| {
                self.extents.iter().map(move |extent| Label {
                    text: extent.name.clone(),
                    orientation,
                    center: extent.offset + extent.size / 2,
                })
            })
            .collect()
    }

    /// Paints the background bands onto a new canvas-sized raster.
    pub fn decorate(&self) -> Raster {
        let mut raster = Raster::new(self.size, self.size);

        for band in self.bands() {
            raster.fill(
                band.x as f64,
                band.y as f64,
                band.width as f64,
                band.height as f64,
                band.color,
            );
        }

        raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Chromosome;

    fn layout() -> Layout {
        let genome = Genome::try_new([
            Chromosome::new("chr1", 10_000),
            Chromosome::new("chr2", 5_000),
        ])
        .unwrap();

        Layout::new(&genome, 5_000, 1, 1)
    }

    #[test]
    fn it_places_pairs_in_both_triangles() {
        let layout = layout();
        let genome = Genome::try_new([
            Chromosome::new("chr1", 10_000),
            Chromosome::new("chr2", 5_000),
        ])
        .unwrap();
        let (pair, _) = Pair::canonical(&genome, "chr2", "chr1").unwrap();

        assert_eq!(layout.direct_origin(&pair), Some((0, 3)));
        assert_eq!(layout.transposed_origin(&pair), Some((3, 0)));
        assert_eq!(layout.direct_size(&pair), Some((2, 1)));
    }

    #[test]
    fn it_hit_tests_the_canvas() {
        let layout = layout();

        assert_eq!(layout.size(), 4);
        assert_eq!(layout.locate(0, 3), Some(("chr1", "chr2")));
        assert_eq!(layout.locate(3, 1), Some(("chr2", "chr1")));
        assert_eq!(layout.locate(2, 0), None);
        assert_eq!(layout.locate(9, 0), None);

        assert_eq!(layout.position_at(1), Some(("chr1", 5_000)));
        assert_eq!(layout.position_px("chr2", 4_999), Some(3));
        assert_eq!(layout.position_px("chr2", 5_000), None);
    }

    #[test]
    fn it_decorates_independently_of_data() {
        let layout = layout();
        let bands = layout.bands();

        assert_eq!(bands.len(), 4);
        assert_eq!(bands[0].color, LIGHT_BAND);
        assert_eq!(bands[1].color, DARK_BAND);

        let raster = layout.decorate();
        assert_eq!(raster.pixel(0, 0), Some(LIGHT_BAND));
        assert_eq!(raster.pixel(0, 3), Some(DARK_BAND));
        assert_eq!(raster.pixel(2, 2), Some([0, 0, 0, 0]));

        let labels = layout.labels();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels[0].text, "chr1");
        assert_eq!(labels[0].center, 1);
        assert_eq!(labels[3].orientation, Orientation::Vertical);
        assert_eq!(labels[3].center, 3);
    }
}
