//! The detail level: two linked axis windows, the data fetched for them, and
//! the pan/zoom synchronizer that decides when to fetch again.

use tracing::debug;
use tracing::warn;

use crate::contact::ContactTuple;
use crate::coordinate;
use crate::coordinate::Binning;
use crate::coordinate::FragmentMap;
use crate::genome::Locus;
use crate::raster;
use crate::raster::Raster;
use crate::resolution::ResolutionRequest;
use crate::view::axis::AxisCommand;
use crate::view::axis::AxisEvent;
use crate::view::axis::AxisId;

/// What the synchronizer decided after an [`AxisEvent`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Only the live drag offset changed; reposition the raster.
    Moved,

    /// At least one axis has not settled yet.
    Waiting,

    /// Both axes have settled on the window that was last fetched.
    Unchanged,

    /// Both axes have settled on a new window, which must be fetched.
    Refetch,
}

/// A pair of values, one per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct PerAxis<T> {
    /// The x value.
    x: T,

    /// The y value.
    y: T,
}

impl<T> PerAxis<T> {
    /// Gets a mutable reference to the value for `axis`.
    fn get_mut(&mut self, axis: AxisId) -> &mut T {
        match axis {
            AxisId::X => &mut self.x,
            AxisId::Y => &mut self.y,
        }
    }
}

/// The state of the detail level.
#[derive(Clone, Debug)]
pub struct Detail {
    /// The x window.
    x: Locus,

    /// The y window.
    y: Locus,

    /// The pixel width of each axis.
    width_px: PerAxis<f64>,

    /// The live drag offsets.
    offset_px: PerAxis<f64>,

    /// Whether each axis has a change that has not settled.
    pending: PerAxis<bool>,

    /// The window most recently requested.
    requested: Option<(Locus, Locus)>,

    /// The fragment maps received so far for the window being resolved.
    resolving: PerAxis<Option<FragmentMap>>,

    /// The binning of the held data.
    request: Option<ResolutionRequest>,

    /// The held data, replaced on every fetch.
    tuples: Option<Vec<ContactTuple>>,

    /// The fragment maps (x, y) the held data is placed with.
    fragments: Option<(FragmentMap, FragmentMap)>,

    /// The painted raster.
    raster: Option<Raster>,

    /// The number of tuples dropped at the last paint.
    unmapped: usize,
}

impl Detail {
    /// Creates a [`Detail`] showing `x` against `y`, each drawn across
    /// `width_px` pixels until the axes report their own widths.
    pub fn new(x: Locus, y: Locus, width_px: f64) -> Self {
        Self {
            x,
            y,
            width_px: PerAxis {
                x: width_px,
                y: width_px,
            },
            offset_px: PerAxis::default(),
            pending: PerAxis::default(),
            requested: None,
            resolving: PerAxis::default(),
            request: None,
            tuples: None,
            fragments: None,
            raster: None,
            unmapped: 0,
        }
    }

    /// Gets the x window.
    pub fn x(&self) -> &Locus {
        &self.x
    }

    /// Gets the y window.
    pub fn y(&self) -> &Locus {
        &self.y
    }

    /// Gets the window for `axis`.
    pub fn locus(&self, axis: AxisId) -> &Locus {
        match axis {
            AxisId::X => &self.x,
            AxisId::Y => &self.y,
        }
    }

    /// Gets the pixel widths `(x, y)`.
    pub fn width_px(&self) -> (f64, f64) {
        (self.width_px.x, self.width_px.y)
    }

    /// Gets the live drag offsets `(x, y)` in pixels.
    pub fn offset_px(&self) -> (f64, f64) {
        (self.offset_px.x, self.offset_px.y)
    }

    /// Gets the larger of the two spans.
    pub fn span(&self) -> u64 {
        self.x.span().max(self.y.span())
    }

    /// Gets the binning of the held data.
    pub fn request(&self) -> Option<&ResolutionRequest> {
        self.request.as_ref()
    }

    /// Gets the held data.
    pub fn tuples(&self) -> Option<&[ContactTuple]> {
        self.tuples.as_deref()
    }

    /// Gets the painted raster.
    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    /// Gets the number of tuples dropped at the last paint because a fragment
    /// id had no mapping.
    pub fn unmapped(&self) -> usize {
        self.unmapped
    }

    /// Returns whether either axis has an unsettled change.
    pub fn is_pending(&self) -> bool {
        self.pending.x || self.pending.y
    }

    /// Applies an event from a linked axis.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Locus;
    /// use hicmatrix::view::axis::AxisEvent;
    /// use hicmatrix::view::axis::AxisId;
    /// use hicmatrix::view::detail::Detail;
    /// use hicmatrix::view::detail::Outcome;
    ///
    /// let x = Locus::try_new("chr1", 0, 1_000)?;
    /// let y = Locus::try_new("chr2", 0, 1_000)?;
    ///
    /// let mut detail = Detail::new(x.clone(), y.clone(), 500.0);
    /// detail.begin_fetch();
    ///
    /// let panning = AxisEvent::Panning { axis: AxisId::X, offset_px: -12.0 };
    /// assert_eq!(detail.observe(panning), Outcome::Moved);
    /// assert_eq!(detail.offset_px(), (-12.0, 0.0));
    ///
    /// let settled = AxisEvent::Settled {
    ///     axis: AxisId::X,
    ///     locus: Locus::try_new("chr1", 24, 1_024)?,
    ///     width_px: 500.0,
    /// };
    /// assert_eq!(detail.observe(settled), Outcome::Refetch);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn observe(&mut self, event: AxisEvent) -> Outcome {
        match event {
            AxisEvent::Panning { axis, offset_px } => {
                *self.offset_px.get_mut(axis) = offset_px;
                *self.pending.get_mut(axis) = true;
                Outcome::Moved
            }
            AxisEvent::Settled {
                axis,
                locus,
                width_px,
            } => {
                debug!(%axis, %locus, width_px, "axis settled");

                match axis {
                    AxisId::X => self.x = locus,
                    AxisId::Y => self.y = locus,
                }

                if width_px.is_finite() && width_px > 0.0 {
                    *self.width_px.get_mut(axis) = width_px;
                }

                *self.pending.get_mut(axis) = false;

                if self.is_pending() {
                    Outcome::Waiting
                } else if self.requested.as_ref() == Some(&(self.x.clone(), self.y.clone())) {
                    Outcome::Unchanged
                } else {
                    Outcome::Refetch
                }
            }
        }
    }

    /// Scales both spans by `factor` around their centers and returns the
    /// commands that move the axes there. Both axes stay pending until they
    /// report back.
    pub fn zoom(&mut self, factor: f64, x_length: u64, y_length: u64) -> Vec<AxisCommand> {
        self.x = self.x.zoom(factor, x_length);
        self.y = self.y.zoom(factor, y_length);
        self.pending = PerAxis { x: true, y: true };

        vec![
            AxisCommand::SetInterval {
                axis: AxisId::X,
                locus: self.x.clone(),
            },
            AxisCommand::SetInterval {
                axis: AxisId::Y,
                locus: self.y.clone(),
            },
        ]
    }

    /// Records that the current window is being fetched and clears the live
    /// offsets.
    pub fn begin_fetch(&mut self) -> (Locus, Locus) {
        let window = (self.x.clone(), self.y.clone());
        self.requested = Some(window.clone());
        self.resolving = PerAxis::default();
        self.offset_px = PerAxis::default();
        window
    }

    /// Stores the fragment map for one axis. Once both axes are resolved the
    /// pair of maps is returned.
    pub fn resolve_fragments(
        &mut self,
        axis: AxisId,
        map: FragmentMap,
    ) -> Option<(FragmentMap, FragmentMap)> {
        *self.resolving.get_mut(axis) = Some(map);

        match (&self.resolving.x, &self.resolving.y) {
            (Some(_), Some(_)) => {
                let x = self.resolving.x.take()?;
                let y = self.resolving.y.take()?;
                Some((x, y))
            }
            _ => None,
        }
    }

    /// Replaces the held data.
    pub fn load(
        &mut self,
        request: ResolutionRequest,
        tuples: Vec<ContactTuple>,
        fragments: Option<(FragmentMap, FragmentMap)>,
    ) {
        self.request = Some(request);
        self.tuples = Some(tuples);
        self.fragments = fragments;
    }

    /// Clears the held data, keeping the raster until new data arrives.
    pub fn invalidate(&mut self) {
        self.requested = None;
        self.request = None;
        self.tuples = None;
        self.fragments = None;
    }

    /// Repaints the raster from the held data.
    pub fn paint(&mut self, cutoff: f64) {
        let (Some(request), Some(tuples)) = (self.request.as_ref(), self.tuples.as_deref()) else {
            return;
        };

        let binning = match (request, self.fragments.as_ref()) {
            (ResolutionRequest::BasePair { resolution }, _) => Binning::BasePair(*resolution),
            (ResolutionRequest::Fragment { resolution, .. }, Some((x, y))) => Binning::Fragment {
                resolution: *resolution,
                x,
                y,
            },
            (ResolutionRequest::Fragment { .. }, None) => return,
        };

        let widths = (self.width_px.x, self.width_px.y);
        let placement = coordinate::place(tuples, &self.x, &self.y, widths, &binning);

        if placement.unmapped > 0 {
            warn!(
                unmapped = placement.unmapped,
                "dropped contacts with unmapped fragment ids"
            );
        }

        let size = (
            widths.0.round().max(1.0) as u32,
            widths.1.round().max(1.0) as u32,
        );

        self.unmapped = placement.unmapped;
        self.raster = Some(raster::paint_cells(&placement.cells, size, cutoff));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> Detail {
        Detail::new(
            Locus::try_new("chr1", 0, 1_000).unwrap(),
            Locus::try_new("chr1", 0, 1_000).unwrap(),
            100.0,
        )
    }

    #[test]
    fn it_waits_for_both_axes_to_settle() -> Result<(), Box<dyn std::error::Error>> {
        let mut detail = detail();
        detail.begin_fetch();

        let commands = detail.zoom(0.5, 10_000, 10_000);
        assert_eq!(commands.len(), 2);
        assert!(detail.is_pending());

        let first = AxisEvent::Settled {
            axis: AxisId::X,
            locus: Locus::try_new("chr1", 250, 750)?,
            width_px: 100.0,
        };
        assert_eq!(detail.observe(first), Outcome::Waiting);

        let second = AxisEvent::Settled {
            axis: AxisId::Y,
            locus: Locus::try_new("chr1", 250, 750)?,
            width_px: 80.0,
        };
        assert_eq!(detail.observe(second), Outcome::Refetch);
        assert_eq!(detail.width_px(), (100.0, 80.0));
        Ok(())
    }

    #[test]
    fn settling_on_the_fetched_window_does_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let mut detail = detail();
        detail.begin_fetch();

        let event = AxisEvent::Settled {
            axis: AxisId::X,
            locus: Locus::try_new("chr1", 0, 1_000)?,
            width_px: 100.0,
        };
        assert_eq!(detail.observe(event), Outcome::Unchanged);
        Ok(())
    }

    #[test]
    fn fetching_resets_the_live_offsets() {
        let mut detail = detail();
        detail.observe(AxisEvent::Panning {
            axis: AxisId::Y,
            offset_px: 40.0,
        });
        assert_eq!(detail.offset_px(), (0.0, 40.0));

        detail.begin_fetch();
        assert_eq!(detail.offset_px(), (0.0, 0.0));
    }

    #[test]
    fn painting_replaces_rather_than_merges() {
        let mut detail = detail();
        let request = ResolutionRequest::BasePair { resolution: 100 };

        detail.load(request, vec![ContactTuple::new(0, 500, 10.0)], None);
        detail.paint(50.0);
        assert_eq!(detail.raster().map(|raster| raster.painted()), Some(200));

        detail.load(request, vec![ContactTuple::new(900, 900, 10.0)], None);
        detail.paint(50.0);
        assert_eq!(detail.raster().map(|raster| raster.painted()), Some(100));
        assert_eq!(detail.tuples().map(|tuples| tuples.len()), Some(1));
    }
}
