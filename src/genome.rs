//! Chromosomes, their fixed global ordering, and canonical chromosome pairs.

use std::collections::HashMap;

pub mod locus;

pub use locus::Locus;

/// An error related to a [`Genome`].
#[derive(Debug)]
pub enum Error {
    /// No chromosomes were provided.
    Empty,

    /// A chromosome was listed more than once.
    Duplicate(String),

    /// A chromosome was declared with a length of zero.
    ZeroLength(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Empty => write!(f, "no chromosomes were provided"),
            Error::Duplicate(name) => write!(f, "duplicate chromosome: {name}"),
            Error::ZeroLength(name) => write!(f, "chromosome has a length of zero: {name}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A chromosome and its length in base pairs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Chromosome {
    /// The name.
    name: String,

    /// The length in base pairs.
    length: u64,
}

impl Chromosome {
    /// Creates a new [`Chromosome`].
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    /// Gets the name of the chromosome.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the length of the chromosome in base pairs.
    pub fn length(&self) -> u64 {
        self.length
    }
}

/// The chromosomes of a dataset in their fixed display order.
///
/// The rank of a chromosome (its index in this order) decides which member
/// of a pair is the lead chromosome.
#[derive(Clone, Debug)]
pub struct Genome {
    /// The chromosomes in order.
    chromosomes: Vec<Chromosome>,

    /// A lookup from chromosome name to rank.
    ranks: HashMap<String, usize>,
}

impl Genome {
    /// Attempts to create a [`Genome`] from chromosomes in display order.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Chromosome;
    /// use hicmatrix::genome::Genome;
    ///
    /// let genome = Genome::try_new([
    ///     Chromosome::new("chr1", 248_956_422),
    ///     Chromosome::new("chr2", 242_193_529),
    /// ])?;
    ///
    /// assert_eq!(genome.len(), 2);
    /// assert_eq!(genome.rank("chr2"), Some(1));
    /// assert_eq!(genome.length("chr1"), Some(248_956_422));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(chromosomes: impl IntoIterator<Item = Chromosome>) -> Result<Self> {
        let chromosomes = chromosomes.into_iter().collect::<Vec<_>>();

        if chromosomes.is_empty() {
            return Err(Error::Empty);
        }

        let mut ranks = HashMap::with_capacity(chromosomes.len());

        for (rank, chromosome) in chromosomes.iter().enumerate() {
            if chromosome.length() == 0 {
                return Err(Error::ZeroLength(chromosome.name().to_string()));
            }

            if ranks.insert(chromosome.name().to_string(), rank).is_some() {
                return Err(Error::Duplicate(chromosome.name().to_string()));
            }
        }

        Ok(Self { chromosomes, ranks })
    }

    /// Gets the number of chromosomes.
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    /// Returns whether there are no chromosomes.
    ///
    /// This is always `false` for a successfully constructed [`Genome`].
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Iterates over the chromosomes in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes.iter()
    }

    /// Gets a chromosome by name.
    pub fn get(&self, name: &str) -> Option<&Chromosome> {
        self.ranks.get(name).map(|rank| &self.chromosomes[*rank])
    }

    /// Gets the rank of a chromosome within the display order.
    pub fn rank(&self, name: &str) -> Option<usize> {
        self.ranks.get(name).copied()
    }

    /// Gets the length of a chromosome.
    pub fn length(&self, name: &str) -> Option<u64> {
        self.get(name).map(|chromosome| chromosome.length())
    }

    /// Gets a [`Locus`] spanning an entire chromosome.
    pub fn whole(&self, name: &str) -> Option<Locus> {
        let chromosome = self.get(name)?;
        Locus::try_new(chromosome.name(), 0, chromosome.length()).ok()
    }

    /// Iterates over every unordered chromosome pair in the fixed pairwise
    /// order used to populate the whole-genome view.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Chromosome;
    /// use hicmatrix::genome::Genome;
    ///
    /// let genome = Genome::try_new([
    ///     Chromosome::new("chr1", 100),
    ///     Chromosome::new("chr2", 100),
    /// ])?;
    ///
    /// let pairs = genome.pairs().map(|pair| pair.to_string()).collect::<Vec<_>>();
    /// assert_eq!(pairs, vec!["chr1-chr1", "chr1-chr2", "chr2-chr2"]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn pairs(&self) -> impl Iterator<Item = Pair> + '_ {
        self.chromosomes
            .iter()
            .enumerate()
            .flat_map(move |(i, lead)| {
                self.chromosomes[i..].iter().map(move |follow| Pair {
                    lead: lead.name().to_string(),
                    follow: follow.name().to_string(),
                })
            })
    }
}

/// How a pair of chromosomes given in display order (x, y) relates to its
/// canonical form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    /// The x chromosome is the lead chromosome.
    Forward,

    /// The y chromosome is the lead chromosome.
    Swapped,
}

/// A canonical chromosome pair.
///
/// The lead chromosome is the one with the lower rank in the genome's fixed
/// ordering, which keeps fetches identical regardless of click order.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Pair {
    /// The lead chromosome.
    lead: String,

    /// The follow chromosome.
    follow: String,
}

impl Pair {
    /// Canonicalizes the pair of chromosomes shown on the x and y axes.
    ///
    /// Returns [`None`] if either chromosome is not part of the genome.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::genome::Chromosome;
    /// use hicmatrix::genome::Genome;
    /// use hicmatrix::genome::Orientation;
    /// use hicmatrix::genome::Pair;
    ///
    /// let genome = Genome::try_new([
    ///     Chromosome::new("chr1", 100),
    ///     Chromosome::new("chr2", 100),
    /// ])?;
    ///
    /// let (pair, orientation) = Pair::canonical(&genome, "chr2", "chr1").unwrap();
    /// assert_eq!(pair.lead(), "chr1");
    /// assert_eq!(pair.follow(), "chr2");
    /// assert_eq!(orientation, Orientation::Swapped);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn canonical(genome: &Genome, x: &str, y: &str) -> Option<(Self, Orientation)> {
        let rx = genome.rank(x)?;
        let ry = genome.rank(y)?;

        if rx <= ry {
            let pair = Self {
                lead: x.to_string(),
                follow: y.to_string(),
            };
            Some((pair, Orientation::Forward))
        } else {
            let pair = Self {
                lead: y.to_string(),
                follow: x.to_string(),
            };
            Some((pair, Orientation::Swapped))
        }
    }

    /// Gets the lead chromosome.
    pub fn lead(&self) -> &str {
        &self.lead
    }

    /// Gets the follow chromosome.
    pub fn follow(&self) -> &str {
        &self.follow
    }

    /// Returns whether both members are the same chromosome.
    pub fn is_intra(&self) -> bool {
        self.lead == self.follow
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.lead, self.follow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genome() -> Genome {
        Genome::try_new([
            Chromosome::new("chr1", 1_000),
            Chromosome::new("chr2", 800),
            Chromosome::new("chrX", 500),
        ])
        .unwrap()
    }

    #[test]
    fn it_rejects_empty_and_duplicate_chromosomes() {
        let err = Genome::try_new(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "no chromosomes were provided");

        let err = Genome::try_new([Chromosome::new("chr1", 10), Chromosome::new("chr1", 10)])
            .unwrap_err();
        assert_eq!(err.to_string(), "duplicate chromosome: chr1");

        let err = Genome::try_new([Chromosome::new("chr1", 0)]).unwrap_err();
        assert_eq!(err.to_string(), "chromosome has a length of zero: chr1");
    }

    #[test]
    fn it_canonicalizes_pairs_by_rank_not_click_order() {
        let genome = genome();

        let (forward, orientation) = Pair::canonical(&genome, "chr2", "chrX").unwrap();
        assert_eq!(orientation, Orientation::Forward);

        let (swapped, orientation) = Pair::canonical(&genome, "chrX", "chr2").unwrap();
        assert_eq!(orientation, Orientation::Swapped);

        assert_eq!(forward, swapped);
        assert_eq!(forward.lead(), "chr2");
        assert_eq!(forward.follow(), "chrX");
        assert!(!forward.is_intra());

        assert!(Pair::canonical(&genome, "chr1", "chr9").is_none());
    }

    #[test]
    fn it_enumerates_pairs_in_fixed_order() {
        let pairs = genome()
            .pairs()
            .map(|pair| pair.to_string())
            .collect::<Vec<_>>();

        assert_eq!(
            pairs,
            vec![
                "chr1-chr1",
                "chr1-chr2",
                "chr1-chrX",
                "chr2-chr2",
                "chr2-chrX",
                "chrX-chrX"
            ]
        );
    }

    #[test]
    fn it_builds_whole_chromosome_loci() {
        let locus = genome().whole("chr2").unwrap();
        assert_eq!(locus.chromosome(), "chr2");
        assert_eq!(locus.start(), 0);
        assert_eq!(locus.stop(), 800);
        assert!(genome().whole("chr3").is_none());
    }
}
