//! The level-of-detail state machine.
//!
//! A [`Controller`] tracks which of the three levels is active and a
//! generation counter that increases on every transition or refresh. Each
//! fetch issued for the chromosome-pair or detail level carries the
//! [`Stamp`] current at the time; a response whose stamp is no longer current
//! is discarded.

use tracing::debug;

pub mod axis;
pub mod detail;
pub mod pair;

pub use detail::Detail;
pub use pair::PairView;

/// An error related to a [`Controller`].
#[derive(Debug)]
pub enum Error {
    /// The transition is not part of the state machine.
    InvalidTransition {
        /// The active level.
        from: Level,

        /// The requested level.
        to: Level,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidTransition { from, to } => {
                write!(f, "cannot move from the {from} level to the {to} level")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A level of detail.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Level {
    /// Every chromosome pair at the coarsest resolution.
    WholeGenome,

    /// One chromosome pair in full.
    ChromosomePair,

    /// A window of one chromosome against a window of another (or the same)
    /// chromosome.
    Detail,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::WholeGenome => write!(f, "whole-genome"),
            Level::ChromosomePair => write!(f, "chromosome-pair"),
            Level::Detail => write!(f, "detail"),
        }
    }
}

/// The level and generation a fetch was issued under.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Stamp {
    /// The level.
    level: Level,

    /// The generation.
    generation: u64,
}

impl Stamp {
    /// Gets the level.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Gets the generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The level-of-detail state machine.
///
/// ```text
/// WholeGenome ──select──▶ ChromosomePair ──click──▶ Detail
///      ▲  └──────────────launch──────────────────────▲ │
///      └──────────zoom out──────── ChromosomePair ◀──┘
/// ```
#[derive(Clone, Debug)]
pub struct Controller {
    /// The active level.
    level: Level,

    /// The generation, bumped on every transition or refresh.
    generation: u64,
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            level: Level::WholeGenome,
            generation: 0,
        }
    }
}

impl Controller {
    /// Creates a [`Controller`] at the whole-genome level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the active level.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Gets the current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Gets the current [`Stamp`].
    pub fn stamp(&self) -> Stamp {
        Stamp {
            level: self.level,
            generation: self.generation,
        }
    }

    /// Returns whether a stamp is still current.
    pub fn is_current(&self, stamp: &Stamp) -> bool {
        *stamp == self.stamp()
    }

    /// Moves to another level.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::view::Controller;
    /// use hicmatrix::view::Level;
    ///
    /// let mut controller = Controller::new();
    /// let stamp = controller.transition(Level::ChromosomePair)?;
    /// assert!(controller.is_current(&stamp));
    ///
    /// controller.transition(Level::WholeGenome)?;
    /// assert!(!controller.is_current(&stamp));
    ///
    /// assert!(controller.transition(Level::WholeGenome).is_ok());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn transition(&mut self, to: Level) -> Result<Stamp> {
        let allowed = matches!(
            (self.level, to),
            (_, Level::WholeGenome)
                | (Level::WholeGenome, Level::ChromosomePair)
                | (Level::Detail, Level::ChromosomePair)
                | (_, Level::Detail)
        );

        if !allowed {
            return Err(Error::InvalidTransition {
                from: self.level,
                to,
            });
        }

        debug!(from = %self.level, %to, generation = self.generation + 1, "transition");

        self.level = to;
        Ok(self.refresh())
    }

    /// Starts a new generation at the same level, superseding any fetch in
    /// flight.
    pub fn refresh(&mut self) -> Stamp {
        self.generation += 1;
        self.stamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_transitions_outside_the_state_machine() {
        let mut controller = Controller::new();
        controller.transition(Level::ChromosomePair).unwrap();

        let err = controller.transition(Level::ChromosomePair).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot move from the chromosome-pair level to the chromosome-pair level"
        );
    }

    #[test]
    fn every_transition_bumps_the_generation() -> Result<()> {
        let mut controller = Controller::new();
        assert_eq!(controller.level(), Level::WholeGenome);

        let pair = controller.transition(Level::ChromosomePair)?;
        let detail = controller.transition(Level::Detail)?;
        let refreshed = controller.refresh();

        assert_eq!(pair.generation(), 1);
        assert_eq!(detail.generation(), 2);
        assert_eq!(refreshed.level(), Level::Detail);
        assert!(!controller.is_current(&detail));
        assert!(controller.is_current(&refreshed));

        controller.transition(Level::ChromosomePair)?;
        controller.transition(Level::WholeGenome)?;
        assert_eq!(controller.generation(), 5);
        Ok(())
    }
}
