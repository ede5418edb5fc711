//! A directive line in a contact dump.

use std::num::ParseIntError;
use std::str::FromStr;

use crate::coordinate::fragment::Fragment;
use crate::resolution::Unit;

/// The prefix of a directive line.
pub const DIRECTIVE_PREFIX: &str = "#";

/// An error associated with parsing a directive.
#[derive(Debug)]
pub enum ParseError {
    /// The line does not start with [`DIRECTIVE_PREFIX`].
    InvalidPrefix(String),

    /// The directive keyword is not recognized.
    UnknownDirective(String),

    /// A directive had the wrong number of fields.
    IncorrectNumberOfFields(&'static str, usize),

    /// A resolution unit other than `bp` or `frag`.
    InvalidUnit(String),

    /// An integer field could not be parsed.
    InvalidNumber(ParseIntError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidPrefix(s) => {
                write!(f, "invalid prefix: expected \"{DIRECTIVE_PREFIX}\", found \"{s}\"")
            }
            ParseError::UnknownDirective(s) => write!(f, "unknown directive: {s}"),
            ParseError::IncorrectNumberOfFields(directive, n) => {
                write!(f, "invalid number of fields in {directive} directive: {n}")
            }
            ParseError::InvalidUnit(s) => {
                write!(f, "invalid resolution unit: expected \"bp\" or \"frag\", found \"{s}\"")
            }
            ParseError::InvalidNumber(err) => write!(f, "invalid number: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// A directive within a contact dump.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Directive {
    /// `#chromosome name length`: appends a chromosome to the display order.
    Chromosome {
        /// The chromosome name.
        name: String,

        /// The chromosome length.
        length: u64,
    },

    /// `#resolutions bp|frag entry...`: a resolution ladder.
    Resolutions {
        /// The unit of the ladder.
        unit: Unit,

        /// The entries, coarse to fine.
        entries: Vec<u64>,
    },

    /// `#enzyme name`: the restriction enzyme the fragments belong to.
    Enzyme(String),

    /// `#normalizations method...`: the supported normalization methods.
    Normalizations(Vec<String>),

    /// `#fragment chromosome start stop id`: one restriction fragment.
    Fragment {
        /// The chromosome name.
        chromosome: String,

        /// The fragment.
        fragment: Fragment,
    },
}

impl FromStr for Directive {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(DIRECTIVE_PREFIX)
            .ok_or_else(|| ParseError::InvalidPrefix(s.chars().take(1).collect()))?;

        let mut fields = rest.split_whitespace();
        let keyword = fields.next().unwrap_or_default();
        let fields = fields.collect::<Vec<_>>();

        let number = |s: &str| s.parse::<u64>().map_err(ParseError::InvalidNumber);

        match keyword {
            "chromosome" => match fields[..] {
                [name, length] => Ok(Directive::Chromosome {
                    name: name.to_string(),
                    length: number(length)?,
                }),
                _ => Err(ParseError::IncorrectNumberOfFields("chromosome", fields.len())),
            },
            "resolutions" => {
                let (unit, entries) = fields
                    .split_first()
                    .ok_or(ParseError::IncorrectNumberOfFields("resolutions", 0))?;

                let unit = match *unit {
                    "bp" | "BP" => Unit::BasePair,
                    "frag" | "FRAG" => Unit::Fragment,
                    other => return Err(ParseError::InvalidUnit(other.to_string())),
                };

                let entries = entries
                    .iter()
                    .map(|entry| number(*entry))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Directive::Resolutions { unit, entries })
            }
            "enzyme" => match fields[..] {
                [name] => Ok(Directive::Enzyme(name.to_string())),
                _ => Err(ParseError::IncorrectNumberOfFields("enzyme", fields.len())),
            },
            "normalizations" => Ok(Directive::Normalizations(
                fields.iter().map(|method| method.to_string()).collect(),
            )),
            "fragment" => match fields[..] {
                [chromosome, start, stop, id] => Ok(Directive::Fragment {
                    chromosome: chromosome.to_string(),
                    fragment: Fragment::new(number(id)?, number(start)?, number(stop)?),
                }),
                _ => Err(ParseError::IncorrectNumberOfFields("fragment", fields.len())),
            },
            other => Err(ParseError::UnknownDirective(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_every_directive() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            "#chromosome\tchr1\t1000".parse::<Directive>()?,
            Directive::Chromosome {
                name: String::from("chr1"),
                length: 1000
            }
        );
        assert_eq!(
            "#resolutions frag 5 1".parse::<Directive>()?,
            Directive::Resolutions {
                unit: Unit::Fragment,
                entries: vec![5, 1]
            }
        );
        assert_eq!(
            "#enzyme HindIII".parse::<Directive>()?,
            Directive::Enzyme(String::from("HindIII"))
        );
        assert_eq!(
            "#normalizations NONE VC".parse::<Directive>()?,
            Directive::Normalizations(vec![String::from("NONE"), String::from("VC")])
        );
        assert_eq!(
            "#fragment\tchr1\t0\t120\t7".parse::<Directive>()?,
            Directive::Fragment {
                chromosome: String::from("chr1"),
                fragment: Fragment::new(7, 0, 120)
            }
        );
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_directives() {
        let err = "#chromosome chr1".parse::<Directive>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields in chromosome directive: 1"
        );

        let err = "#resolutions kb 5".parse::<Directive>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid resolution unit: expected \"bp\" or \"frag\", found \"kb\""
        );

        let err = "#genome hg38".parse::<Directive>().unwrap_err();
        assert_eq!(err.to_string(), "unknown directive: genome");
    }
}
