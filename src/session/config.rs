//! Session configuration and its builder.

use crate::contact::Normalization;

/// An error related to a [`Builder`].
#[derive(Debug)]
pub enum Error {
    /// A field that must be positive was zero.
    Zero(&'static str),

    /// The cutoff was not a positive, finite number.
    Cutoff(f64),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Zero(field) => write!(f, "{field} must be greater than zero"),
            Error::Cutoff(value) => {
                write!(f, "cutoff must be a positive, finite number: {value}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Checks that a cutoff is usable.
pub(crate) fn check_cutoff(cutoff: f64) -> Result<f64> {
    match cutoff.is_finite() && cutoff > 0.0 {
        true => Ok(cutoff),
        false => Err(Error::Cutoff(cutoff)),
    }
}

/// The tunables of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The pixels per bin at the whole-genome level.
    whole_genome_bin_px: u32,

    /// The pixels between chromosomes at the whole-genome level.
    border_px: u32,

    /// The minimum bin count along the longer chromosome at the
    /// chromosome-pair level.
    chromosome_pair_min_bins: u64,

    /// The pixel budget of the longer chromosome at the chromosome-pair level.
    chromosome_pair_max_px: u32,

    /// The minimum bin count across the detail span in base-pair mode.
    detail_min_bins: u64,

    /// The minimum bin count across the detail span in fragment mode.
    fragment_min_bins: u64,

    /// The number of chromosome-pair bins the detail level opens on.
    detail_initial_bins: u64,

    /// The pixel width of each detail axis until the axes report their own.
    detail_width_px: u32,

    /// The initial cutoff.
    cutoff: f64,

    /// The initial normalization method.
    normalization: Normalization,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whole_genome_bin_px: 1,
            border_px: 1,
            chromosome_pair_min_bins: 200,
            chromosome_pair_max_px: 800,
            detail_min_bins: 200,
            fragment_min_bins: 300,
            detail_initial_bins: 20,
            detail_width_px: 800,
            cutoff: 50.0,
            normalization: Normalization::None,
        }
    }
}

impl Config {
    /// Gets a [`Builder`] seeded with the defaults.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Gets the pixels per bin at the whole-genome level.
    pub fn whole_genome_bin_px(&self) -> u32 {
        self.whole_genome_bin_px
    }

    /// Gets the pixels between chromosomes at the whole-genome level.
    pub fn border_px(&self) -> u32 {
        self.border_px
    }

    /// Gets the minimum bin count at the chromosome-pair level.
    pub fn chromosome_pair_min_bins(&self) -> u64 {
        self.chromosome_pair_min_bins
    }

    /// Gets the pixel budget at the chromosome-pair level.
    pub fn chromosome_pair_max_px(&self) -> u32 {
        self.chromosome_pair_max_px
    }

    /// Gets the minimum bin count at the detail level in base-pair mode.
    pub fn detail_min_bins(&self) -> u64 {
        self.detail_min_bins
    }

    /// Gets the minimum bin count at the detail level in fragment mode.
    pub fn fragment_min_bins(&self) -> u64 {
        self.fragment_min_bins
    }

    /// Gets the number of chromosome-pair bins the detail level opens on.
    pub fn detail_initial_bins(&self) -> u64 {
        self.detail_initial_bins
    }

    /// Gets the default pixel width of each detail axis.
    pub fn detail_width_px(&self) -> u32 {
        self.detail_width_px
    }

    /// Gets the initial cutoff.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Gets the initial normalization method.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }
}

/// A builder for a [`Config`].
///
/// # Examples
///
/// ```
/// use hicmatrix::contact::Normalization;
/// use hicmatrix::session::Config;
///
/// let config = Config::builder()
///     .cutoff(10.0)
///     .normalization(Normalization::Vc)
///     .detail_width_px(400)
///     .try_build()?;
///
/// assert_eq!(config.cutoff(), 10.0);
/// assert_eq!(config.chromosome_pair_min_bins(), 200);
///
/// assert!(Config::builder().cutoff(0.0).try_build().is_err());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder(Config);

impl Builder {
    /// Sets the pixels per bin at the whole-genome level.
    pub fn whole_genome_bin_px(mut self, value: u32) -> Self {
        self.0.whole_genome_bin_px = value;
        self
    }

    /// Sets the pixels between chromosomes at the whole-genome level.
    pub fn border_px(mut self, value: u32) -> Self {
        self.0.border_px = value;
        self
    }

    /// Sets the minimum bin count at the chromosome-pair level.
    pub fn chromosome_pair_min_bins(mut self, value: u64) -> Self {
        self.0.chromosome_pair_min_bins = value;
        self
    }

    /// Sets the pixel budget at the chromosome-pair level.
    pub fn chromosome_pair_max_px(mut self, value: u32) -> Self {
        self.0.chromosome_pair_max_px = value;
        self
    }

    /// Sets the minimum bin count at the detail level in base-pair mode.
    pub fn detail_min_bins(mut self, value: u64) -> Self {
        self.0.detail_min_bins = value;
        self
    }

    /// Sets the minimum bin count at the detail level in fragment mode.
    pub fn fragment_min_bins(mut self, value: u64) -> Self {
        self.0.fragment_min_bins = value;
        self
    }

    /// Sets the number of chromosome-pair bins the detail level opens on.
    pub fn detail_initial_bins(mut self, value: u64) -> Self {
        self.0.detail_initial_bins = value;
        self
    }

    /// Sets the default pixel width of each detail axis.
    pub fn detail_width_px(mut self, value: u32) -> Self {
        self.0.detail_width_px = value;
        self
    }

    /// Sets the initial cutoff.
    pub fn cutoff(mut self, value: f64) -> Self {
        self.0.cutoff = value;
        self
    }

    /// Sets the initial normalization method.
    pub fn normalization(mut self, value: Normalization) -> Self {
        self.0.normalization = value;
        self
    }

    /// Consumes `self` to attempt to build a [`Config`].
    pub fn try_build(self) -> Result<Config> {
        let config = self.0;

        let positive = [
            ("whole_genome_bin_px", config.whole_genome_bin_px as u64),
            ("chromosome_pair_min_bins", config.chromosome_pair_min_bins),
            ("chromosome_pair_max_px", config.chromosome_pair_max_px as u64),
            ("detail_min_bins", config.detail_min_bins),
            ("fragment_min_bins", config.fragment_min_bins),
            ("detail_initial_bins", config.detail_initial_bins),
            ("detail_width_px", config.detail_width_px as u64),
        ];

        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Zero(*field));
        }

        check_cutoff(config.cutoff)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_builder_starts_from_the_defaults() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        assert_eq!(Builder::default().try_build()?, Config::default());
        Ok(())
    }

    #[test]
    fn it_rejects_zero_sizes_and_bad_cutoffs() {
        let err = Config::builder().detail_width_px(0).try_build().unwrap_err();
        assert_eq!(err.to_string(), "detail_width_px must be greater than zero");

        let err = Config::builder().cutoff(f64::NAN).try_build().unwrap_err();
        assert_eq!(err.to_string(), "cutoff must be a positive, finite number: NaN");

        assert!(Config::builder().border_px(0).try_build().is_ok());
    }
}
