//! A window of one chromosome shown along a single axis.

use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::LazyLock;

use omics::coordinate::interbase::Coordinate;
use omics::coordinate::interval::interbase::Interval;
use omics::coordinate::Strand;
use regex::Regex;

/// A locus written as `chr1:1,000-5,000` (commas optional).
static LOCUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:\s]+):([\d,]+)-([\d,]+)$").unwrap());

/// An interbase interval as displayed by [`omics`] (`chr1:+:1000-5000`).
static STRANDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:\s]+):([+-]):(\d+)-(\d+)$").unwrap());

/// An error associated with parsing a [`Locus`].
#[derive(Debug)]
pub enum ParseError {
    /// The value did not look like a locus.
    Format(String),

    /// A position could not be parsed.
    InvalidPosition(ParseIntError),

    /// The value was a valid interval but on the negative strand.
    NegativeStrand(String),

    /// The value looked like an interval but could not be made into one.
    Interval(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Format(value) => write!(f, "invalid locus format: {value}"),
            ParseError::InvalidPosition(err) => write!(f, "invalid position: {err}"),
            ParseError::NegativeStrand(value) => {
                write!(f, "negative-stranded intervals cannot be displayed: {value}")
            }
            ParseError::Interval(err) => write!(f, "invalid interval: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to a [`Locus`].
#[derive(Debug)]
pub enum Error {
    /// The start was not strictly before the stop.
    Empty(u64, u64),

    /// A parse error.
    Parse(ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Empty(start, stop) => {
                write!(f, "locus start ({start}) must be before its stop ({stop})")
            }
            Error::Parse(err) => write!(f, "parse error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A zero-based, half-open window `[start, stop)` on one chromosome.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Locus {
    /// The chromosome name.
    chromosome: String,

    /// The start position (inclusive).
    start: u64,

    /// The stop position (exclusive).
    stop: u64,
}

impl Locus {
    /// Attempts to create a new [`Locus`].
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Locus;
    ///
    /// let locus = Locus::try_new("chr1", 1_000, 5_000)?;
    /// assert_eq!(locus.span(), 4_000);
    /// assert_eq!(locus.center(), 3_000);
    ///
    /// assert!(Locus::try_new("chr1", 5_000, 5_000).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(chromosome: impl Into<String>, start: u64, stop: u64) -> Result<Self> {
        if start >= stop {
            return Err(Error::Empty(start, stop));
        }

        Ok(Self {
            chromosome: chromosome.into(),
            start,
            stop,
        })
    }

    /// Creates a [`Locus`] of width `span` centered on `center`, shifted as
    /// needed to stay within `[0, length)`.
    ///
    /// The span is reduced to `length` if the chromosome is shorter.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Locus;
    ///
    /// let locus = Locus::centered("chr1", 500, 2_000, 10_000);
    /// assert_eq!((locus.start(), locus.stop()), (0, 2_000));
    ///
    /// let locus = Locus::centered("chr1", 9_900, 2_000, 10_000);
    /// assert_eq!((locus.start(), locus.stop()), (8_000, 10_000));
    /// ```
    pub fn centered(chromosome: impl Into<String>, center: u64, span: u64, length: u64) -> Self {
        let length = length.max(1);
        let span = span.clamp(1, length);

        let start = center.saturating_sub(span / 2).min(length - span);

        Self {
            chromosome: chromosome.into(),
            start,
            stop: start + span,
        }
    }

    /// Gets the chromosome name.
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// Gets the start position (inclusive).
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Gets the stop position (exclusive).
    pub fn stop(&self) -> u64 {
        self.stop
    }

    /// Gets the number of base pairs covered.
    pub fn span(&self) -> u64 {
        self.stop - self.start
    }

    /// Gets the midpoint of the window.
    pub fn center(&self) -> u64 {
        self.start + self.span() / 2
    }

    /// Returns whether `[start, stop)` overlaps this window.
    pub fn overlaps(&self, start: u64, stop: u64) -> bool {
        start < self.stop && self.start < stop
    }

    /// Multiplies the span by `factor` around the current center, staying
    /// within a chromosome of `length` base pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Locus;
    ///
    /// let locus = Locus::try_new("chr1", 4_000, 6_000)?;
    ///
    /// let zoomed = locus.zoom(0.5, 100_000);
    /// assert_eq!((zoomed.start(), zoomed.stop()), (4_500, 5_500));
    ///
    /// let zoomed = locus.zoom(2.0, 100_000);
    /// assert_eq!((zoomed.start(), zoomed.stop()), (3_000, 7_000));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn zoom(&self, factor: f64, length: u64) -> Self {
        let span = (self.span() as f64 * factor).round().max(1.0) as u64;
        Self::centered(self.chromosome.clone(), self.center(), span, length)
    }

    /// Converts the locus into a positive-stranded interbase [`Interval`].
    pub fn to_interval(&self) -> std::result::Result<Interval, ParseError> {
        let start = Coordinate::new(self.chromosome.as_str(), Strand::Positive, self.start);
        let end = Coordinate::new(self.chromosome.as_str(), Strand::Positive, self.stop);

        Interval::try_new(start, end).map_err(|err| ParseError::Interval(err.to_string()))
    }
}

impl TryFrom<&Interval> for Locus {
    type Error = Error;

    fn try_from(interval: &Interval) -> Result<Self> {
        if interval.strand() == Strand::Negative {
            return Err(Error::Parse(ParseError::NegativeStrand(
                interval.to_string(),
            )));
        }

        Self::try_new(
            interval.contig().as_str(),
            interval.start().position().get(),
            interval.end().position().get(),
        )
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start, self.stop)
    }
}

impl FromStr for Locus {
    type Err = Error;

    /// Parses either `chr1:1,000-5,000` or an interbase interval such as
    /// `chr1:+:1000-5000`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if STRANDED.is_match(s) {
            let interval = s
                .parse::<Interval>()
                .map_err(|err| Error::Parse(ParseError::Interval(err.to_string())))?;
            return Self::try_from(&interval);
        }

        let captures = LOCUS
            .captures(s)
            .ok_or_else(|| Error::Parse(ParseError::Format(s.to_string())))?;

        let start = parse_position(&captures[2])?;
        let stop = parse_position(&captures[3])?;

        Self::try_new(&captures[1], start, stop)
    }
}

/// Parses a position that may contain thousands separators.
fn parse_position(value: &str) -> Result<u64> {
    value
        .replace(',', "")
        .parse::<u64>()
        .map_err(|err| Error::Parse(ParseError::InvalidPosition(err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_loci_with_separators() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let locus = "chr1:1,000-5,000".parse::<Locus>()?;
        assert_eq!(locus.chromosome(), "chr1");
        assert_eq!(locus.start(), 1_000);
        assert_eq!(locus.stop(), 5_000);
        assert_eq!(locus.to_string(), "chr1:1000-5000");
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_loci() {
        let err = "chr1".parse::<Locus>().unwrap_err();
        assert_eq!(err.to_string(), "parse error: invalid locus format: chr1");

        let err = "chr1:5000-1000".parse::<Locus>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "locus start (5000) must be before its stop (1000)"
        );
    }

    #[test]
    fn it_round_trips_through_interbase_intervals(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let locus = Locus::try_new("chr2", 10, 250)?;
        let interval = locus.to_interval()?;
        let back = Locus::try_from(&interval)?;
        assert_eq!(locus, back);

        assert_eq!(interval.contig().as_str(), "chr2");
        assert_eq!(interval.start().position().get(), 10);
        assert_eq!(interval.end().position().get(), 250);

        let parsed = "chr2:+:10-250".parse::<Locus>()?;
        assert_eq!(parsed, locus);
        Ok(())
    }

    #[test]
    fn it_rejects_negative_stranded_intervals(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let start = Coordinate::try_new("chr2", "-", 250)?;
        let end = Coordinate::try_new("chr2", "-", 10)?;
        let interval = Interval::try_new(start, end)?;

        let err = Locus::try_from(&interval).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::NegativeStrand(_))));
        Ok(())
    }

    #[test]
    fn it_keeps_centered_windows_inside_the_chromosome() {
        let locus = Locus::centered("chr1", 50, 1_000, 300);
        assert_eq!((locus.start(), locus.stop()), (0, 300));

        let locus = Locus::centered("chr1", 5_000, 1_000, 100_000);
        assert_eq!((locus.start(), locus.stop()), (4_500, 5_500));
    }

    #[test]
    fn it_checks_overlap() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let locus = Locus::try_new("chr1", 100, 200)?;
        assert!(locus.overlaps(150, 400));
        assert!(locus.overlaps(0, 101));
        assert!(!locus.overlaps(200, 300));
        assert!(!locus.overlaps(0, 100));
        Ok(())
    }
}
