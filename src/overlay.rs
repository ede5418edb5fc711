//! Structural-variant breakpoints drawn over the whole-genome raster.

use serde::Deserialize;
use serde::Serialize;

use crate::raster::Layout;

/// An error related to an [`Overlay`].
#[derive(Debug)]
pub enum Error {
    /// The breakpoint list could not be decoded.
    Json(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Json(err) => write!(f, "invalid breakpoint list: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A pair of genomic positions joined by a structural variant.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    /// The first chromosome.
    chr_a: String,

    /// The position on the first chromosome.
    pos_a: u64,

    /// The second chromosome.
    chr_b: String,

    /// The position on the second chromosome.
    pos_b: u64,
}

impl Breakpoint {
    /// Creates a new [`Breakpoint`].
    pub fn new(chr_a: impl Into<String>, pos_a: u64, chr_b: impl Into<String>, pos_b: u64) -> Self {
        Self {
            chr_a: chr_a.into(),
            pos_a,
            chr_b: chr_b.into(),
            pos_b,
        }
    }

    /// Gets the first chromosome.
    pub fn chr_a(&self) -> &str {
        &self.chr_a
    }

    /// Gets the position on the first chromosome.
    pub fn pos_a(&self) -> u64 {
        self.pos_a
    }

    /// Gets the second chromosome.
    pub fn chr_b(&self) -> &str {
        &self.chr_b
    }

    /// Gets the position on the second chromosome.
    pub fn pos_b(&self) -> u64 {
        self.pos_b
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.chr_a, self.pos_a, self.chr_b, self.pos_b
        )
    }
}

/// Where a breakpoint is drawn on the whole-genome canvas.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Marker {
    /// The index of the breakpoint in its [`Overlay`].
    pub index: usize,

    /// The canvas column.
    pub x: u32,

    /// The canvas row.
    pub y: u32,
}

/// A list of breakpoints.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Overlay(Vec<Breakpoint>);

impl Overlay {
    /// Creates a new [`Overlay`].
    pub fn new(breakpoints: Vec<Breakpoint>) -> Self {
        Self(breakpoints)
    }

    /// Deserializes a JSON array of breakpoints.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map(Self).map_err(Error::Json)
    }

    /// Gets the breakpoints.
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.0
    }

    /// Gets a breakpoint by index.
    pub fn get(&self, index: usize) -> Option<&Breakpoint> {
        self.0.get(index)
    }

    /// Places every breakpoint on the canvas, once in each triangle.
    ///
    /// Breakpoints on chromosomes missing from the layout (or past their
    /// ends) are skipped. A breakpoint that lands on the diagonal is placed
    /// once.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Chromosome;
    /// use hicmatrix::genome::Genome;
    /// use hicmatrix::overlay::Breakpoint;
    /// use hicmatrix::overlay::Overlay;
    /// use hicmatrix::raster::Layout;
    ///
    /// let genome = Genome::try_new([
    ///     Chromosome::new("chr1", 10_000),
    ///     Chromosome::new("chr2", 10_000),
    /// ])?;
    /// let layout = Layout::new(&genome, 1_000, 1, 1);
    ///
    /// let overlay = Overlay::new(vec![Breakpoint::new("chr1", 2_500, "chr2", 7_000)]);
    /// let markers = overlay.markers(&layout);
    ///
    /// assert_eq!(markers.len(), 2);
    /// assert_eq!((markers[0].x, markers[0].y), (2, 18));
    /// assert_eq!((markers[1].x, markers[1].y), (18, 2));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn markers(&self, layout: &Layout) -> Vec<Marker> {
        let mut markers = Vec::with_capacity(self.0.len() * 2);

        for (index, breakpoint) in self.0.iter().enumerate() {
            let a = layout.position_px(&breakpoint.chr_a, breakpoint.pos_a);
            let b = layout.position_px(&breakpoint.chr_b, breakpoint.pos_b);

            let (Some(a), Some(b)) = (a, b) else {
                continue;
            };

            markers.push(Marker { index, x: a, y: b });

            if a != b {
                markers.push(Marker { index, x: b, y: a });
            }
        }

        markers
    }

    /// Finds the breakpoint whose marker is closest to a clicked pixel,
    /// within `tolerance` pixels along both axes.
    pub fn hit(&self, layout: &Layout, px: u32, py: u32, tolerance: u32) -> Option<&Breakpoint> {
        self.markers(layout)
            .into_iter()
            .map(|marker| (marker.index, marker.x.abs_diff(px).max(marker.y.abs_diff(py))))
            .filter(|(_, distance)| *distance <= tolerance)
            .min_by_key(|(_, distance)| *distance)
            .and_then(|(index, _)| self.0.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Chromosome;
    use crate::genome::Genome;

    fn layout() -> Layout {
        let genome = Genome::try_new([
            Chromosome::new("chr1", 10_000),
            Chromosome::new("chr2", 10_000),
        ])
        .unwrap();

        Layout::new(&genome, 1_000, 1, 1)
    }

    #[test]
    fn it_deserializes_breakpoint_lists() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let overlay = Overlay::from_json(
            r#"[{"chrA": "chr1", "posA": 100, "chrB": "chr2", "posB": 200}]"#,
        )?;

        assert_eq!(overlay.get(0), Some(&Breakpoint::new("chr1", 100, "chr2", 200)));
        assert_eq!(overlay.breakpoints()[0].to_string(), "chr1:100-chr2:200");
        Ok(())
    }

    #[test]
    fn it_places_diagonal_breakpoints_once_and_skips_unknown_ones() {
        let overlay = Overlay::new(vec![
            Breakpoint::new("chr1", 4_200, "chr1", 4_700),
            Breakpoint::new("chr1", 0, "chrX", 0),
            Breakpoint::new("chr2", 50_000, "chr1", 0),
        ]);

        let markers = overlay.markers(&layout());
        assert_eq!(markers, vec![Marker { index: 0, x: 4, y: 4 }]);
    }

    #[test]
    fn it_hits_the_closest_marker_within_tolerance() {
        let layout = layout();
        let overlay = Overlay::new(vec![
            Breakpoint::new("chr1", 2_000, "chr2", 2_000),
            Breakpoint::new("chr1", 5_000, "chr2", 5_000),
        ]);

        // Markers at (2, 13), (13, 2), (5, 16) and (16, 5).
        assert_eq!(overlay.hit(&layout, 14, 3, 1), overlay.get(0));
        assert_eq!(overlay.hit(&layout, 5, 15, 2), overlay.get(1));
        assert_eq!(overlay.hit(&layout, 9, 9, 2), None);
    }
}
