//! Contact tuples, normalization methods, and contact queries.

use std::str::FromStr;

use serde::Deserialize;

use crate::genome::Locus;
use crate::genome::Pair;
use crate::resolution::ResolutionRequest;

/// An error associated with parsing a [`Normalization`].
#[derive(Debug)]
pub enum ParseError {
    /// The normalization method is not known.
    Unknown(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Unknown(value) => write!(f, "unknown normalization method: {value}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// A single matrix cell returned by the data service.
///
/// The positions are bin start coordinates in base pairs or fragment ids
/// depending on the [`ResolutionRequest`] used to fetch the tuple. `a` is on
/// the first chromosome of the query and `b` on the second.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(from = "(u64, u64, f64)")]
pub struct ContactTuple {
    /// The position (or fragment id) on the first chromosome.
    a: u64,

    /// The position (or fragment id) on the second chromosome.
    b: u64,

    /// The (possibly normalized) contact value.
    value: f64,
}

impl ContactTuple {
    /// Creates a new [`ContactTuple`].
    pub fn new(a: u64, b: u64, value: f64) -> Self {
        Self { a, b, value }
    }

    /// Gets the position (or fragment id) on the first chromosome.
    pub fn a(&self) -> u64 {
        self.a
    }

    /// Gets the position (or fragment id) on the second chromosome.
    pub fn b(&self) -> u64 {
        self.b
    }

    /// Gets the contact value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the tuple with its two positions exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            value: self.value,
        }
    }
}

impl From<(u64, u64, f64)> for ContactTuple {
    fn from((a, b, value): (u64, u64, f64)) -> Self {
        Self::new(a, b, value)
    }
}

/// A named transform applied to raw contact counts by the data service.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Normalization {
    /// Raw counts.
    #[default]
    None,

    /// Vanilla coverage.
    Vc,

    /// Square root of vanilla coverage.
    VcSqrt,

    /// Knight-Ruiz matrix balancing.
    Kr,
}

impl std::fmt::Display for Normalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Normalization::None => write!(f, "NONE"),
            Normalization::Vc => write!(f, "VC"),
            Normalization::VcSqrt => write!(f, "VC_SQRT"),
            Normalization::Kr => write!(f, "KR"),
        }
    }
}

impl FromStr for Normalization {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Normalization::None),
            "VC" => Ok(Normalization::Vc),
            "VC_SQRT" => Ok(Normalization::VcSqrt),
            "KR" => Ok(Normalization::Kr),
            _ => Err(ParseError::Unknown(s.to_string())),
        }
    }
}

/// One side of a contact query: a chromosome and, optionally, the window of
/// it that is needed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Region {
    /// The chromosome name.
    chromosome: String,

    /// The `[start, stop)` window in base pairs, or [`None`] for the whole
    /// chromosome.
    window: Option<(u64, u64)>,
}

impl Region {
    /// Creates a [`Region`] covering an entire chromosome.
    pub fn whole(chromosome: impl Into<String>) -> Self {
        Self {
            chromosome: chromosome.into(),
            window: None,
        }
    }

    /// Gets the chromosome name.
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// Gets the window, if one was requested.
    pub fn window(&self) -> Option<(u64, u64)> {
        self.window
    }

    /// Returns whether `position` falls inside the region.
    pub fn contains(&self, position: u64) -> bool {
        match self.window {
            Some((start, stop)) => start <= position && position < stop,
            None => true,
        }
    }
}

impl From<&Locus> for Region {
    fn from(locus: &Locus) -> Self {
        Self {
            chromosome: locus.chromosome().to_string(),
            window: Some((locus.start(), locus.stop())),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.window {
            Some((start, stop)) => write!(f, "{}:{}-{}", self.chromosome, start, stop),
            None => write!(f, "{}", self.chromosome),
        }
    }
}

/// A request for the contacts between two regions.
///
/// Queries are always canonical: `a` is on the lead chromosome and `b` on
/// the follow chromosome of the pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactQuery {
    /// The region on the lead chromosome.
    a: Region,

    /// The region on the follow chromosome.
    b: Region,

    /// The normalization method.
    normalization: Normalization,

    /// The binning.
    resolution: ResolutionRequest,
}

impl ContactQuery {
    /// Creates a query for an entire chromosome pair.
    pub fn pair(pair: &Pair, normalization: Normalization, resolution: ResolutionRequest) -> Self {
        Self {
            a: Region::whole(pair.lead()),
            b: Region::whole(pair.follow()),
            normalization,
            resolution,
        }
    }

    /// Creates a query for two regions, which must already be in canonical
    /// order.
    pub fn regions(
        a: Region,
        b: Region,
        normalization: Normalization,
        resolution: ResolutionRequest,
    ) -> Self {
        Self {
            a,
            b,
            normalization,
            resolution,
        }
    }

    /// Gets the region on the lead chromosome.
    pub fn a(&self) -> &Region {
        &self.a
    }

    /// Gets the region on the follow chromosome.
    pub fn b(&self) -> &Region {
        &self.b
    }

    /// Gets the normalization method.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Gets the binning.
    pub fn resolution(&self) -> &ResolutionRequest {
        &self.resolution
    }

    /// Returns whether both regions are on the same chromosome.
    pub fn is_intra(&self) -> bool {
        self.a.chromosome == self.b.chromosome
    }
}

impl std::fmt::Display for ContactQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} x {} @ {} ({})",
            self.a, self.b, self.resolution, self.normalization
        )
    }
}

/// Gets the value at quantile `q` (clamped to `[0, 1]`) of the finite values,
/// or [`None`] if there are none.
///
/// # Examples
///
/// ```
/// let values = [4.0, 1.0, 3.0, 2.0, 100.0];
///
/// assert_eq!(hicmatrix::contact::quantile(values, 0.0), Some(1.0));
/// assert_eq!(hicmatrix::contact::quantile(values, 0.5), Some(3.0));
/// assert_eq!(hicmatrix::contact::quantile(values, 1.0), Some(100.0));
/// assert_eq!(hicmatrix::contact::quantile(Vec::new(), 0.5), None);
/// ```
pub fn quantile(values: impl IntoIterator<Item = f64>, q: f64) -> Option<f64> {
    let mut values = values
        .into_iter()
        .filter(|value| value.is_finite())
        .collect::<Vec<_>>();

    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);

    let index = ((values.len() - 1) as f64 * q.clamp(0.0, 1.0)).round() as usize;
    Some(values[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_deserializes_tuples_from_arrays() -> Result<(), Box<dyn std::error::Error>> {
        let tuples = serde_json::from_str::<Vec<ContactTuple>>("[[0, 0, 10], [0, 5000, 20.5]]")?;

        assert_eq!(
            tuples,
            vec![
                ContactTuple::new(0, 0, 10.0),
                ContactTuple::new(0, 5_000, 20.5)
            ]
        );
        Ok(())
    }

    #[test]
    fn it_parses_normalization_methods() -> Result<(), Box<dyn std::error::Error>> {
        for method in ["NONE", "VC", "VC_SQRT", "KR"] {
            assert_eq!(method.parse::<Normalization>()?.to_string(), method);
        }

        assert_eq!("vc_sqrt".parse::<Normalization>()?, Normalization::VcSqrt);

        let err = "ICE".parse::<Normalization>().unwrap_err();
        assert_eq!(err.to_string(), "unknown normalization method: ICE");
        Ok(())
    }

    #[test]
    fn it_describes_queries() -> Result<(), Box<dyn std::error::Error>> {
        let locus = "chr1:100-200".parse::<Locus>()?;
        let query = ContactQuery::regions(
            Region::from(&locus),
            Region::whole("chr2"),
            Normalization::Vc,
            ResolutionRequest::BasePair { resolution: 50 },
        );

        assert_eq!(query.to_string(), "chr1:100-200 x chr2 @ 50 bp (VC)");
        assert!(!query.is_intra());
        assert!(query.a().contains(150));
        assert!(!query.a().contains(200));
        assert!(query.b().contains(u64::MAX));
        Ok(())
    }
}
