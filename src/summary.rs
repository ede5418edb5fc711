//! The dataset summary and its validation.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::contact;
use crate::contact::Normalization;
use crate::genome;
use crate::genome::Chromosome;
use crate::genome::Genome;
use crate::resolution;
use crate::resolution::Ladder;

/// An error related to a dataset summary.
///
/// Any of these is fatal to creating a session.
#[derive(Debug)]
pub enum Error {
    /// A chromosome in the order has no length.
    MissingLength(String),

    /// The chromosome list is invalid.
    Genome(genome::Error),

    /// The base-pair resolution ladder is invalid.
    BasePairLadder(resolution::Error),

    /// The fragment resolution ladder is invalid.
    FragmentLadder(resolution::Error),

    /// A listed normalization method is not known.
    Normalization(contact::ParseError),

    /// The summary could not be deserialized.
    Json(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingLength(name) => write!(f, "no length given for chromosome: {name}"),
            Error::Genome(err) => write!(f, "invalid chromosome list: {err}"),
            Error::BasePairLadder(err) => write!(f, "invalid base-pair ladder: {err}"),
            Error::FragmentLadder(err) => write!(f, "invalid fragment ladder: {err}"),
            Error::Normalization(err) => write!(f, "invalid normalization list: {err}"),
            Error::Json(err) => write!(f, "invalid summary: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The dataset summary as served by the data service.
///
/// # Examples
///
/// ```
/// use hicmatrix::summary::Summary;
///
/// let summary = Summary::from_json(
///     r#"{
///         "chromosomeOrder": ["chr1", "chr2"],
///         "baseResolutionLadder": [2500000, 500000, 100000],
///         "perChromosomeLength": {"chr1": 248956422, "chr2": 242193529}
///     }"#,
/// )?;
///
/// let dataset = summary.validate()?;
/// assert_eq!(dataset.genome().len(), 2);
/// assert!(dataset.fragment_ladder().is_none());
/// assert!(!dataset.fragments_available());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The chromosome names in display order.
    pub chromosome_order: Vec<String>,

    /// The base-pair resolution ladder, coarse to fine.
    pub base_resolution_ladder: Vec<u64>,

    /// The fragment resolution ladder, coarse to fine.
    #[serde(default)]
    pub fragment_resolution_ladder: Vec<u64>,

    /// The length of each chromosome.
    pub per_chromosome_length: HashMap<String, u64>,

    /// The restriction enzyme fragment boundaries are available for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enzyme: Option<String>,

    /// The normalization methods the service supports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizations: Option<Vec<String>>,
}

impl Summary {
    /// Deserializes a summary from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(Error::Json)
    }

    /// Validates the summary.
    pub fn validate(&self) -> Result<Dataset> {
        let chromosomes = self
            .chromosome_order
            .iter()
            .map(|name| {
                self.per_chromosome_length
                    .get(name)
                    .map(|length| Chromosome::new(name.clone(), *length))
                    .ok_or_else(|| Error::MissingLength(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let genome = Genome::try_new(chromosomes).map_err(Error::Genome)?;

        let base_pair_ladder =
            Ladder::try_new(self.base_resolution_ladder.clone()).map_err(Error::BasePairLadder)?;

        let fragment_ladder = match self.fragment_resolution_ladder.is_empty() {
            true => None,
            false => Some(
                Ladder::try_new(self.fragment_resolution_ladder.clone())
                    .map_err(Error::FragmentLadder)?,
            ),
        };

        let normalizations = self
            .normalizations
            .as_ref()
            .map(|methods| {
                methods
                    .iter()
                    .map(|method| method.parse::<Normalization>())
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(Error::Normalization)?;

        Ok(Dataset {
            genome,
            base_pair_ladder,
            fragment_ladder,
            enzyme: self.enzyme.clone(),
            normalizations,
        })
    }
}

/// A validated dataset summary.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// The chromosomes.
    genome: Genome,

    /// The base-pair ladder.
    base_pair_ladder: Ladder,

    /// The fragment ladder, if any.
    fragment_ladder: Option<Ladder>,

    /// The restriction enzyme, if any.
    enzyme: Option<String>,

    /// The supported normalization methods, if the service listed them.
    normalizations: Option<Vec<Normalization>>,
}

impl Dataset {
    /// Gets the chromosomes.
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Gets the base-pair ladder.
    pub fn base_pair_ladder(&self) -> &Ladder {
        &self.base_pair_ladder
    }

    /// Gets the fragment ladder.
    pub fn fragment_ladder(&self) -> Option<&Ladder> {
        self.fragment_ladder.as_ref()
    }

    /// Gets the restriction enzyme.
    pub fn enzyme(&self) -> Option<&str> {
        self.enzyme.as_deref()
    }

    /// Returns whether fragment mode can be used: an enzyme is configured
    /// and a fragment ladder exists.
    pub fn fragments_available(&self) -> bool {
        self.enzyme.is_some() && self.fragment_ladder.is_some()
    }

    /// Returns whether the service supports a normalization method. Every
    /// method is assumed supported when the service did not list any.
    pub fn supports(&self, normalization: Normalization) -> bool {
        match &self.normalizations {
            Some(methods) => methods.contains(&normalization),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary {
            chromosome_order: vec![String::from("chr1"), String::from("chr2")],
            base_resolution_ladder: vec![500_000, 100_000],
            fragment_resolution_ladder: vec![500, 100, 1],
            per_chromosome_length: HashMap::from([
                (String::from("chr1"), 1_000_000),
                (String::from("chr2"), 800_000),
            ]),
            enzyme: Some(String::from("DpnII")),
            normalizations: Some(vec![String::from("NONE"), String::from("VC")]),
        }
    }

    #[test]
    fn it_validates_a_complete_summary() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dataset = summary().validate()?;

        assert_eq!(dataset.genome().rank("chr2"), Some(1));
        assert_eq!(dataset.base_pair_ladder().finest(), 100_000);
        assert_eq!(dataset.fragment_ladder().map(|ladder| ladder.len()), Some(3));
        assert_eq!(dataset.enzyme(), Some("DpnII"));
        assert!(dataset.fragments_available());
        assert!(dataset.supports(Normalization::Vc));
        assert!(!dataset.supports(Normalization::Kr));
        Ok(())
    }

    #[test]
    fn it_reports_missing_fields() {
        let mut incomplete = summary();
        incomplete.per_chromosome_length.remove("chr2");
        assert_eq!(
            incomplete.validate().unwrap_err().to_string(),
            "no length given for chromosome: chr2"
        );

        let mut incomplete = summary();
        incomplete.base_resolution_ladder.clear();
        assert_eq!(
            incomplete.validate().unwrap_err().to_string(),
            "invalid base-pair ladder: resolution ladder is empty"
        );

        let mut incomplete = summary();
        incomplete.normalizations = Some(vec![String::from("ICE")]);
        assert_eq!(
            incomplete.validate().unwrap_err().to_string(),
            "invalid normalization list: unknown normalization method: ICE"
        );

        assert!(Summary::from_json(r#"{"chromosomeOrder": []}"#).is_err());
    }

    #[test]
    fn it_round_trips_through_json() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(&summary())?;
        assert!(json.contains("\"perChromosomeLength\""));
        assert_eq!(Summary::from_json(&json)?, summary());
        Ok(())
    }
}
