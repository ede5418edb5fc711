//! An in-memory data source.
//!
//! [`Memory`] holds raw, unbinned contacts and answers queries the way the
//! contact service does: it bins the contacts at the requested resolution,
//! sums them per cell, and applies the requested normalization. It is the
//! source behind contact dumps and the test suite.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io::BufRead;

use tracing::debug;

use crate::contact::ContactQuery;
use crate::contact::ContactTuple;
use crate::contact::Normalization;
use crate::contact::Region;
use crate::coordinate;
use crate::coordinate::fragment;
use crate::coordinate::fragment::Fragment;
use crate::coordinate::fragment::FragmentQuery;
use crate::coordinate::FragmentMap;
use crate::coordinate::FragmentRange;
use crate::dump;
use crate::dump::Directive;
use crate::dump::Line;
use crate::resolution::ResolutionRequest;
use crate::resolution::Unit;
use crate::source;
use crate::source::Source;
use crate::summary;
use crate::summary::Dataset;
use crate::summary::Summary;

/// An error related to building a [`Memory`] source.
#[derive(Debug)]
pub enum Error {
    /// The contact dump could not be read.
    Dump(dump::Error),

    /// The dataset summary is invalid.
    Summary(summary::Error),

    /// A chromosome is not part of the dataset.
    UnknownChromosome(String),

    /// A position lies past the end of its chromosome.
    OutOfBounds(String, u64),

    /// The fragments of a chromosome are invalid.
    Fragments(String, fragment::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Dump(err) => write!(f, "dump error: {err}"),
            Error::Summary(err) => write!(f, "summary error: {err}"),
            Error::UnknownChromosome(name) => write!(f, "unknown chromosome: {name}"),
            Error::OutOfBounds(name, position) => {
                write!(f, "position {position} lies past the end of {name}")
            }
            Error::Fragments(name, err) => write!(f, "invalid fragments on {name}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// One end of a raw contact: a chromosome rank and a base-pair position.
type End = (usize, u64);

/// A raw contact with its ends in canonical order.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Raw {
    /// The end on the lead chromosome (the lower position for intra
    /// contacts).
    a: End,

    /// The end on the follow chromosome.
    b: End,

    /// The contact count.
    value: f64,
}

/// An in-memory data source.
///
/// # Examples
///
/// ```
/// use hicmatrix::contact::ContactQuery;
/// use hicmatrix::contact::ContactTuple;
/// use hicmatrix::contact::Normalization;
/// use hicmatrix::genome::Pair;
/// use hicmatrix::resolution::ResolutionRequest;
/// use hicmatrix::source::Memory;
/// use hicmatrix::source::Source as _;
/// use hicmatrix::summary::Summary;
///
/// let summary = Summary {
///     chromosome_order: vec![String::from("chr1")],
///     base_resolution_ladder: vec![1_000, 100],
///     per_chromosome_length: [(String::from("chr1"), 5_000)].into(),
///     ..Default::default()
/// };
///
/// let mut memory = Memory::try_new(summary)?;
/// memory.add_contact("chr1", 150, "chr1", 2_300, 2.0)?;
/// memory.add_contact("chr1", 2_900, "chr1", 400, 1.0)?;
///
/// let (pair, _) = Pair::canonical(memory.dataset().genome(), "chr1", "chr1").unwrap();
/// let query = ContactQuery::pair(
///     &pair,
///     Normalization::None,
///     ResolutionRequest::BasePair { resolution: 1_000 },
/// );
///
/// assert_eq!(memory.contacts(&query)?, vec![ContactTuple::new(0, 2_000, 3.0)]);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Memory {
    /// The summary as served.
    summary: Summary,

    /// The validated summary.
    dataset: Dataset,

    /// The raw contacts.
    contacts: Vec<Raw>,

    /// The fragments of each chromosome.
    fragments: HashMap<String, FragmentMap>,
}

impl Memory {
    /// Attempts to create an empty [`Memory`] source for a dataset.
    pub fn try_new(summary: Summary) -> Result<Self> {
        let dataset = summary.validate().map_err(Error::Summary)?;

        Ok(Self {
            summary,
            dataset,
            contacts: Vec::new(),
            fragments: HashMap::new(),
        })
    }

    /// Reads a contact dump into a [`Memory`] source.
    ///
    /// Directives may appear anywhere in the dump; chromosomes are ordered as
    /// they are declared.
    pub fn from_reader<T>(inner: T) -> Result<Self>
    where
        T: BufRead,
    {
        let mut reader = dump::Reader::new(inner);

        let mut summary = Summary::default();
        let mut fragments = BTreeMap::<String, Vec<Fragment>>::new();
        let mut records = Vec::new();

        for line in reader.lines() {
            match line.map_err(Error::Dump)? {
                Line::Empty => {}
                Line::Directive(Directive::Chromosome { name, length }) => {
                    summary.per_chromosome_length.insert(name.clone(), length);
                    summary.chromosome_order.push(name);
                }
                Line::Directive(Directive::Resolutions { unit, entries }) => match unit {
                    Unit::BasePair => summary.base_resolution_ladder = entries,
                    Unit::Fragment => summary.fragment_resolution_ladder = entries,
                },
                Line::Directive(Directive::Enzyme(name)) => summary.enzyme = Some(name),
                Line::Directive(Directive::Normalizations(methods)) => {
                    summary.normalizations = Some(methods)
                }
                Line::Directive(Directive::Fragment {
                    chromosome,
                    fragment,
                }) => fragments.entry(chromosome).or_default().push(fragment),
                Line::Record(record) => records.push(record),
            }
        }

        let mut memory = Self::try_new(summary)?;

        for (chromosome, fragments) in fragments {
            memory.add_fragments(chromosome, fragments)?;
        }

        for record in records {
            memory.add_contact(
                record.chr_a(),
                record.pos_a(),
                record.chr_b(),
                record.pos_b(),
                record.value(),
            )?;
        }

        debug!(
            chromosomes = memory.dataset.genome().len(),
            contacts = memory.contacts.len(),
            fragmented = memory.fragments.len(),
            "loaded contact dump"
        );

        Ok(memory)
    }

    /// Gets the validated summary.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Gets the number of raw contacts held.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Returns whether no contacts are held.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Adds a raw contact between two base-pair positions.
    pub fn add_contact(
        &mut self,
        chr_a: &str,
        pos_a: u64,
        chr_b: &str,
        pos_b: u64,
        value: f64,
    ) -> Result<()> {
        let a = self.end(chr_a, pos_a)?;
        let b = self.end(chr_b, pos_b)?;

        let (a, b) = match a <= b {
            true => (a, b),
            false => (b, a),
        };

        self.contacts.push(Raw { a, b, value });
        Ok(())
    }

    /// Replaces the fragments of a chromosome.
    pub fn add_fragments(
        &mut self,
        chromosome: impl Into<String>,
        fragments: Vec<Fragment>,
    ) -> Result<()> {
        let chromosome = chromosome.into();

        if self.dataset.genome().get(&chromosome).is_none() {
            return Err(Error::UnknownChromosome(chromosome));
        }

        let map = FragmentMap::try_new(chromosome.clone(), fragments)
            .map_err(|err| Error::Fragments(chromosome.clone(), err))?;

        self.fragments.insert(chromosome, map);
        Ok(())
    }

    /// Checks one end of a contact.
    fn end(&self, chromosome: &str, position: u64) -> Result<End> {
        let genome = self.dataset.genome();

        let rank = genome
            .rank(chromosome)
            .ok_or_else(|| Error::UnknownChromosome(chromosome.to_string()))?;

        match genome.length(chromosome).is_some_and(|length| position < length) {
            true => Ok((rank, position)),
            false => Err(Error::OutOfBounds(chromosome.to_string(), position)),
        }
    }

    /// Gets the fragment map of a chromosome as a fetch error.
    fn fragment_map(&self, chromosome: &str) -> source::Result<&FragmentMap> {
        self.fragments
            .get(chromosome)
            .ok_or_else(|| source::Error::Unsupported(format!("no fragments on {chromosome}")))
    }
}

/// Assigns positions on one side of a query to bins and tests whether they
/// fall inside the queried region.
enum Side<'a> {
    /// Base-pair bins.
    BasePair {
        /// The bin size.
        resolution: u64,

        /// The queried region.
        region: &'a Region,
    },

    /// Fragment bins anchored at the first queried fragment.
    Fragment {
        /// The number of fragments per bin.
        resolution: u64,

        /// The queried fragment ids.
        range: FragmentRange,

        /// The fragments of the chromosome.
        map: &'a FragmentMap,
    },
}

impl Side<'_> {
    /// Gets the bin of a position if the position falls inside the region.
    fn bin(&self, position: u64) -> Option<u64> {
        match self {
            Side::BasePair { resolution, region } => {
                let origin = coordinate::bin_origin(position, *resolution);

                let inside = match region.window() {
                    Some((start, stop)) => {
                        origin < stop && origin.saturating_add(*resolution) > start
                    }
                    None => true,
                };

                inside.then_some(origin)
            }
            Side::Fragment {
                resolution,
                range,
                map,
            } => {
                let id = map.fragment_at(position)?;

                range
                    .contains(id)
                    .then(|| range.min() + (id - range.min()) / resolution * resolution)
            }
        }
    }
}

/// Sums the coverage of every base-pair bin across the genome, scaled to a
/// mean of one over the covered bins.
fn coverage(contacts: &[Raw], resolution: u64) -> HashMap<End, f64> {
    let mut coverage = HashMap::<End, f64>::new();

    for raw in contacts {
        let a = (raw.a.0, coordinate::bin_origin(raw.a.1, resolution));
        let b = (raw.b.0, coordinate::bin_origin(raw.b.1, resolution));

        *coverage.entry(a).or_default() += raw.value;

        if a != b {
            *coverage.entry(b).or_default() += raw.value;
        }
    }

    coverage.retain(|_, sum| *sum > 0.0);

    let mean = coverage.values().sum::<f64>() / coverage.len().max(1) as f64;

    for sum in coverage.values_mut() {
        *sum /= mean;
    }

    coverage
}

impl Source for Memory {
    fn summary(&self) -> source::Result<Summary> {
        Ok(self.summary.clone())
    }

    fn contacts(&self, query: &ContactQuery) -> source::Result<Vec<ContactTuple>> {
        let normalization = query.normalization();

        if normalization == Normalization::Kr || !self.dataset.supports(normalization) {
            return Err(source::Error::Unsupported(format!(
                "{normalization} normalization"
            )));
        }

        let genome = self.dataset.genome();
        let rank = |region: &Region| {
            genome
                .rank(region.chromosome())
                .ok_or_else(|| source::Error::UnknownChromosome(region.chromosome().to_string()))
        };

        let lead = rank(query.a())?;
        let follow = rank(query.b())?;

        if lead > follow {
            return Err(source::Error::Service(format!(
                "query is not in canonical order: {query}"
            )));
        }

        let (a, b) = match *query.resolution() {
            ResolutionRequest::BasePair { resolution } => {
                if !self.dataset.base_pair_ladder().contains(resolution) {
                    return Err(source::Error::Unsupported(format!(
                        "resolution {resolution} bp"
                    )));
                }

                (
                    Side::BasePair {
                        resolution,
                        region: query.a(),
                    },
                    Side::BasePair {
                        resolution,
                        region: query.b(),
                    },
                )
            }
            ResolutionRequest::Fragment { resolution, a, b } => {
                if normalization != Normalization::None {
                    return Err(source::Error::Unsupported(format!(
                        "{normalization} normalization at fragment resolution"
                    )));
                }

                let fits = self
                    .dataset
                    .fragment_ladder()
                    .is_some_and(|ladder| ladder.contains(resolution));

                if !fits {
                    return Err(source::Error::Unsupported(format!(
                        "resolution {resolution} frag"
                    )));
                }

                (
                    Side::Fragment {
                        resolution,
                        range: a,
                        map: self.fragment_map(query.a().chromosome())?,
                    },
                    Side::Fragment {
                        resolution,
                        range: b,
                        map: self.fragment_map(query.b().chromosome())?,
                    },
                )
            }
        };

        let intra = lead == follow;
        let mut cells = BTreeMap::<(u64, u64), f64>::new();

        for raw in &self.contacts {
            if raw.a.0 != lead || raw.b.0 != follow {
                continue;
            }

            let forward = a.bin(raw.a.1).zip(b.bin(raw.b.1));
            let swapped = || match intra {
                true => a.bin(raw.b.1).zip(b.bin(raw.a.1)),
                false => None,
            };

            if let Some(cell) = forward.or_else(swapped) {
                *cells.entry(cell).or_default() += raw.value;
            }
        }

        let scale: Box<dyn Fn(u64, u64) -> Option<f64>> = match (normalization, query.resolution())
        {
            (Normalization::Vc | Normalization::VcSqrt, ResolutionRequest::BasePair { resolution }) => {
                let coverage = coverage(&self.contacts, *resolution);
                let sqrt = normalization == Normalization::VcSqrt;

                Box::new(move |x: u64, y: u64| {
                    let product = coverage.get(&(lead, x))? * coverage.get(&(follow, y))?;
                    Some(match sqrt {
                        true => product.sqrt(),
                        false => product,
                    })
                })
            }
            _ => Box::new(|_: u64, _: u64| Some(1.0)),
        };

        Ok(cells
            .into_iter()
            .filter_map(|((x, y), value)| {
                let scale = scale(x, y)?;
                Some(ContactTuple::new(x, y, value / scale))
            })
            .collect())
    }

    fn fragments(&self, query: &FragmentQuery) -> source::Result<Vec<Fragment>> {
        if self.summary.enzyme.as_deref() != Some(query.enzyme()) {
            return Err(source::Error::Unsupported(format!(
                "restriction enzyme {}",
                query.enzyme()
            )));
        }

        if self.dataset.genome().get(query.chromosome()).is_none() {
            return Err(source::Error::UnknownChromosome(
                query.chromosome().to_string(),
            ));
        }

        let Some(map) = self.fragments.get(query.chromosome()) else {
            return Ok(Vec::new());
        };

        let Some(range) = map.resolve(query.start(), query.stop()) else {
            return Ok(Vec::new());
        };

        Ok((range.min()..=range.max())
            .filter_map(|id| map.span(id).map(|(start, stop)| Fragment::new(id, start, stop)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Locus;
    use crate::genome::Pair;

    const DUMP: &[u8] = b"#chromosome\tchr1\t10000
#chromosome\tchr2\t5000
#resolutions\tbp\t1000\t100
#resolutions\tfrag\t2\t1
#enzyme\tHindIII
#normalizations\tNONE\tVC\tVC_SQRT

#fragment\tchr1\t0\t2500\t0
#fragment\tchr1\t2500\t4000\t1
#fragment\tchr1\t4000\t10000\t2
chr1\t100\tchr1\t200\t4
chr1\t100\tchr2\t1500\t2
chr2\t4500\tchr1\t9999\t6
chr1\t3000\tchr1\t5000\t1
";

    fn memory() -> Memory {
        Memory::from_reader(DUMP).unwrap()
    }

    fn pair(x: &str, y: &str) -> Pair {
        let memory = memory();
        Pair::canonical(memory.dataset().genome(), x, y).unwrap().0
    }

    #[test]
    fn it_reads_dumps() {
        let memory = memory();
        let dataset = memory.dataset();

        assert_eq!(memory.len(), 4);
        assert_eq!(dataset.genome().len(), 2);
        assert_eq!(dataset.enzyme(), Some("HindIII"));
        assert!(dataset.fragments_available());
        assert!(!dataset.supports(Normalization::Kr));
    }

    #[test]
    fn it_bins_inter_contacts_canonically() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let query = ContactQuery::pair(
            &pair("chr2", "chr1"),
            Normalization::None,
            ResolutionRequest::BasePair { resolution: 1_000 },
        );

        assert_eq!(
            memory().contacts(&query)?,
            vec![
                ContactTuple::new(0, 1_000, 2.0),
                ContactTuple::new(9_000, 4_000, 6.0)
            ]
        );
        Ok(())
    }

    #[test]
    fn it_restricts_windows_in_either_orientation_for_intra_queries(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let x = Locus::try_new("chr1", 4_000, 6_000)?;
        let y = Locus::try_new("chr1", 2_000, 4_000)?;

        let query = ContactQuery::regions(
            Region::from(&x),
            Region::from(&y),
            Normalization::None,
            ResolutionRequest::BasePair { resolution: 100 },
        );

        // Stored as (3000, 5000); only the swapped orientation fits.
        assert_eq!(
            memory().contacts(&query)?,
            vec![ContactTuple::new(5_000, 3_000, 1.0)]
        );
        Ok(())
    }

    #[test]
    fn it_normalizes_by_coverage() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let memory = memory();

        let query = |normalization| {
            ContactQuery::pair(
                &pair("chr1", "chr1"),
                normalization,
                ResolutionRequest::BasePair { resolution: 1_000 },
            )
        };

        // Coverage at 1 kb: chr1:0 = 4 + 2 = 6, chr1:3000 = 1, chr1:5000 = 1,
        // chr1:9000 = 6, chr2:1000 = 2, chr2:4000 = 6. The mean is 22 / 6.
        let raw = memory.contacts(&query(Normalization::None))?;
        assert_eq!(raw[0], ContactTuple::new(0, 0, 4.0));

        let vc = memory.contacts(&query(Normalization::Vc))?;
        let expected = 4.0 / ((6.0 * 6.0 / 22.0) * (6.0 * 6.0 / 22.0));
        assert!((vc[0].value() - expected).abs() < 1e-9);

        let sqrt = memory.contacts(&query(Normalization::VcSqrt))?;
        assert!((sqrt[0].value() - 4.0 / (6.0 * 6.0 / 22.0)).abs() < 1e-9);

        let err = memory.contacts(&query(Normalization::Kr)).unwrap_err();
        assert_eq!(err.to_string(), "unsupported request: KR normalization");
        Ok(())
    }

    #[test]
    fn it_bins_fragments_from_the_first_queried_id(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let memory = memory();
        let window = Locus::try_new("chr1", 3_000, 9_000)?;

        let fragments = memory.fragments(&FragmentQuery::new("HindIII", window.clone()))?;
        assert_eq!(
            fragments,
            vec![Fragment::new(1, 2_500, 4_000), Fragment::new(2, 4_000, 10_000)]
        );

        let range = FragmentRange::new(1, 2);
        let query = ContactQuery::regions(
            Region::from(&window),
            Region::from(&window),
            Normalization::None,
            ResolutionRequest::Fragment {
                resolution: 1,
                a: range,
                b: range,
            },
        );

        assert_eq!(memory.contacts(&query)?, vec![ContactTuple::new(1, 2, 1.0)]);

        let err = memory
            .fragments(&FragmentQuery::new("MboI", window))
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported request: restriction enzyme MboI");
        Ok(())
    }

    #[test]
    fn it_rejects_contacts_off_the_genome() {
        let mut memory = memory();

        let err = memory.add_contact("chr3", 0, "chr1", 0, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "unknown chromosome: chr3");

        let err = memory.add_contact("chr2", 5_000, "chr1", 0, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "position 5000 lies past the end of chr2");
    }
}
