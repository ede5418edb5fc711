//! RGBA pixel surfaces and the contact color ramp.

use image::imageops;
use image::Rgba;
use image::RgbaImage;

use crate::contact::ContactTuple;
use crate::coordinate;
use crate::coordinate::Cell;

pub mod layout;

pub use layout::Layout;

/// A fully transparent pixel.
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Gets the green and blue channel intensity for a contact value.
///
/// Values at or above `cutoff` saturate to `0` (pure red). Below it, the
/// intensity falls linearly from `255` at a value of zero.
///
/// # Examples
///
/// ```
/// use hicmatrix::raster::shade;
///
/// assert_eq!(shade(0.0, 50.0), 255);
/// assert_eq!(shade(25.0, 50.0), 128);
/// assert_eq!(shade(50.0, 50.0), 0);
/// assert_eq!(shade(1_000.0, 50.0), 0);
/// ```
pub fn shade(value: f64, cutoff: f64) -> u8 {
    if cutoff <= 0.0 || value >= cutoff {
        return 0;
    }

    let scaled = (255.0 * value.max(0.0) / cutoff).floor() as u8;
    255 - scaled
}

/// Gets the color of a contact value: red, darkened on the green and blue
/// channels by [`shade()`].
pub fn color(value: f64, cutoff: f64) -> [u8; 4] {
    let s = shade(value, cutoff);
    [255, s, s, 255]
}

/// A rectangular RGBA surface. Unpainted pixels are transparent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Raster(RgbaImage);

impl Raster {
    /// Creates a new, fully transparent [`Raster`].
    pub fn new(width: u32, height: u32) -> Self {
        Self(RgbaImage::new(width, height))
    }

    /// Gets the width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Gets the height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Gets the underlying image.
    pub fn as_image(&self) -> &RgbaImage {
        &self.0
    }

    /// Consumes self and returns the underlying image.
    pub fn into_image(self) -> RgbaImage {
        self.0
    }

    /// Gets the raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.0.as_raw()
    }

    /// Gets the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.0.get_pixel_checked(x, y).map(|pixel| pixel.0)
    }

    /// Counts the pixels that are not transparent.
    pub fn painted(&self) -> usize {
        self.0.pixels().filter(|pixel| pixel.0[3] > 0).count()
    }

    /// Fills a rectangle, clipped to the surface.
    ///
    /// Fractional edges are widened to whole pixels so that every cell with
    /// a positive area covers at least one pixel.
    pub fn fill(&mut self, x: f64, y: f64, width: f64, height: f64, color: [u8; 4]) {
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return;
        }

        let clip = |value: f64, max: u32| value.clamp(0.0, max as f64) as u32;
        let (w, h) = self.0.dimensions();

        let left = clip(x.floor(), w);
        let top = clip(y.floor(), h);
        let right = clip((x + width.max(0.0)).ceil().max(x.floor() + 1.0), w);
        let bottom = clip((y + height.max(0.0)).ceil().max(y.floor() + 1.0), h);

        for row in top..bottom {
            for column in left..right {
                self.0.put_pixel(column, row, Rgba(color));
            }
        }
    }

    /// Draws `other` onto self with its top left corner at `(x, y)`.
    /// Transparent pixels of `other` leave self untouched.
    pub fn blit(&mut self, other: &Raster, x: u32, y: u32) {
        imageops::overlay(&mut self.0, &other.0, i64::from(x), i64::from(y));
    }
}

/// Paints base-pair binned tuples onto a new raster.
///
/// Each tuple becomes a `bin_px` square at
/// `(bin(a) × bin_px, bin(b) × bin_px)`. Tuples with a non-finite value are
/// skipped.
///
/// # Examples
///
/// ```
/// use hicmatrix::contact::ContactTuple;
/// use hicmatrix::raster::paint_bins;
///
/// let tuples = [ContactTuple::new(0, 0, 10.0), ContactTuple::new(0, 5_000, 20.0)];
/// let raster = paint_bins(&tuples, 5_000, 1, (2, 2), 50.0);
///
/// assert_eq!(raster.painted(), 2);
/// assert_eq!(raster.pixel(0, 1), Some([255, 153, 153, 255]));
/// ```
pub fn paint_bins(
    tuples: &[ContactTuple],
    resolution: u64,
    bin_px: u32,
    (width, height): (u32, u32),
    cutoff: f64,
) -> Raster {
    let mut raster = Raster::new(width, height);
    let size = bin_px as f64;

    for tuple in tuples {
        if !tuple.value().is_finite() {
            continue;
        }

        let x = coordinate::bin(tuple.a(), resolution) as f64 * size;
        let y = coordinate::bin(tuple.b(), resolution) as f64 * size;

        raster.fill(x, y, size, size, color(tuple.value(), cutoff));
    }

    raster
}

/// Paints placed cells onto a new raster.
pub fn paint_cells(cells: &[Cell], (width, height): (u32, u32), cutoff: f64) -> Raster {
    let mut raster = Raster::new(width, height);

    for cell in cells {
        if !cell.value.is_finite() {
            continue;
        }

        raster.fill(
            cell.x,
            cell.y,
            cell.width,
            cell.height,
            color(cell.value, cutoff),
        );
    }

    raster
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shading_is_monotonic_and_saturates() {
        let mut last = u8::MAX;

        for value in [0.0, 1.0, 5.0, 12.5, 25.0, 49.9, 50.0, 75.0] {
            let s = shade(value, 50.0);
            assert!(s <= last);
            last = s;
        }

        assert_eq!(shade(49.9, 50.0), 1);
        assert_eq!(shade(75.0, 50.0), 0);
        assert_eq!(shade(10.0, 0.0), 0);
    }

    #[test]
    fn filling_clips_to_the_surface() {
        let mut raster = Raster::new(4, 4);
        raster.fill(-2.0, 2.0, 4.0, 10.0, [1, 2, 3, 255]);

        assert_eq!(raster.painted(), 4);
        assert_eq!(raster.pixel(0, 3), Some([1, 2, 3, 255]));
        assert_eq!(raster.pixel(2, 3), Some(TRANSPARENT));
        assert_eq!(raster.pixel(4, 0), None);
    }

    #[test]
    fn thin_cells_cover_a_pixel() {
        let mut raster = Raster::new(4, 4);
        raster.fill(1.2, 1.2, 0.1, 0.1, [9, 9, 9, 255]);

        assert_eq!(raster.painted(), 1);
        assert_eq!(raster.pixel(1, 1), Some([9, 9, 9, 255]));
    }

    #[test]
    fn blitting_skips_transparent_pixels() {
        let mut base = Raster::new(3, 3);
        base.fill(0.0, 0.0, 3.0, 3.0, [7, 7, 7, 255]);

        let mut top = Raster::new(2, 2);
        top.fill(1.0, 1.0, 1.0, 1.0, [1, 1, 1, 255]);

        base.blit(&top, 1, 1);

        assert_eq!(base.pixel(1, 1), Some([7, 7, 7, 255]));
        assert_eq!(base.pixel(2, 2), Some([1, 1, 1, 255]));
    }

    #[test]
    fn painting_uses_bin_pixel_size() {
        let tuples = [ContactTuple::new(10_000, 0, 100.0)];
        let raster = paint_bins(&tuples, 5_000, 3, (9, 9), 50.0);

        assert_eq!(raster.painted(), 9);
        assert_eq!(raster.pixel(6, 0), Some([255, 0, 0, 255]));
        assert_eq!(raster.pixel(5, 0), Some(TRANSPARENT));
    }
}
