//! Messages exchanged with the two linked genomic axis views.
//!
//! Axis views are owned by the host. They report what they show through
//! [`AxisEvent`]s and receive [`AxisCommand`]s; the engine never reads their
//! internal state.

use crate::genome::Locus;

/// One of the two linked axes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AxisId {
    /// The horizontal axis.
    X,

    /// The vertical axis.
    Y,
}

impl std::fmt::Display for AxisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisId::X => write!(f, "x"),
            AxisId::Y => write!(f, "y"),
        }
    }
}

/// An event reported by a linked axis view.
#[derive(Clone, Debug, PartialEq)]
pub enum AxisEvent {
    /// The axis is being dragged and is currently `offset_px` pixels away
    /// from where it was last settled.
    Panning {
        /// The axis.
        axis: AxisId,

        /// The live drag offset in pixels.
        offset_px: f64,
    },

    /// The axis has finished loading a new interval.
    Settled {
        /// The axis.
        axis: AxisId,

        /// The visible interval.
        locus: Locus,

        /// The pixel width the interval is drawn across.
        width_px: f64,
    },
}

impl AxisEvent {
    /// Gets the axis that emitted the event.
    pub fn axis(&self) -> AxisId {
        match self {
            AxisEvent::Panning { axis, .. } => *axis,
            AxisEvent::Settled { axis, .. } => *axis,
        }
    }
}

/// A command for a linked axis view.
#[derive(Clone, Debug, PartialEq)]
pub enum AxisCommand {
    /// Show exactly this interval.
    SetInterval {
        /// The axis.
        axis: AxisId,

        /// The interval to show.
        locus: Locus,
    },

    /// Multiply the visible span by `factor` around its center.
    ZoomBy {
        /// The axis.
        axis: AxisId,

        /// The factor.
        factor: f64,
    },
}

impl AxisCommand {
    /// Gets the axis the command is for.
    pub fn axis(&self) -> AxisId {
        match self {
            AxisCommand::SetInterval { axis, .. } => *axis,
            AxisCommand::ZoomBy { axis, .. } => *axis,
        }
    }

    /// Routes the command to the matching axis view.
    pub fn apply<X, Y>(&self, x: &mut X, y: &mut Y)
    where
        X: LinkedAxis,
        Y: LinkedAxis,
    {
        let target = match self.axis() {
            AxisId::X => x as &mut dyn LinkedAxis,
            AxisId::Y => y as &mut dyn LinkedAxis,
        };

        match self {
            AxisCommand::SetInterval { locus, .. } => target.set_interval(locus),
            AxisCommand::ZoomBy { factor, .. } => target.zoom_by(*factor),
        }
    }
}

/// A genomic axis view owned by the host.
pub trait LinkedAxis {
    /// Shows exactly `locus`.
    fn set_interval(&mut self, locus: &Locus);

    /// Multiplies the visible span by `factor` around its center.
    fn zoom_by(&mut self, factor: f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ruler {
        shown: Option<Locus>,
        zoom: f64,
    }

    impl LinkedAxis for Ruler {
        fn set_interval(&mut self, locus: &Locus) {
            self.shown = Some(locus.clone());
        }

        fn zoom_by(&mut self, factor: f64) {
            self.zoom = factor;
        }
    }

    #[test]
    fn commands_reach_the_matching_axis() -> Result<(), Box<dyn std::error::Error>> {
        let mut x = Ruler::default();
        let mut y = Ruler::default();

        let locus = Locus::try_new("chr1", 0, 100)?;
        AxisCommand::SetInterval {
            axis: AxisId::Y,
            locus: locus.clone(),
        }
        .apply(&mut x, &mut y);
        AxisCommand::ZoomBy {
            axis: AxisId::X,
            factor: 0.5,
        }
        .apply(&mut x, &mut y);

        assert_eq!(y.shown, Some(locus));
        assert!(x.shown.is_none());
        assert_eq!(x.zoom, 0.5);
        assert_eq!(y.zoom, 0.0);
        Ok(())
    }
}
