//! A raw contact record in a contact dump.

use std::num::ParseFloatError;
use std::num::ParseIntError;
use std::str::FromStr;

/// The number of expected fields in a contact record.
pub const NUM_RECORD_FIELDS: usize = 5;

/// An error associated with parsing a contact record.
#[derive(Debug)]
pub enum ParseError {
    /// An incorrect number of fields.
    IncorrectNumberOfFields(usize),

    /// An invalid position.
    InvalidPosition(ParseIntError),

    /// An invalid contact count.
    InvalidValue(ParseFloatError),

    /// A contact count that is negative or not finite.
    NegativeValue(f64),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(n) => write!(
                f,
                "invalid number of fields in contact record: expected \
                 {NUM_RECORD_FIELDS} fields, found {n} fields"
            ),
            ParseError::InvalidPosition(err) => write!(f, "invalid position: {err}"),
            ParseError::InvalidValue(err) => write!(f, "invalid value: {err}"),
            ParseError::NegativeValue(value) => {
                write!(f, "value must be a non-negative, finite number: {value}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// An unbinned contact between two base-pair positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// The first chromosome.
    chr_a: String,

    /// The position on the first chromosome.
    pos_a: u64,

    /// The second chromosome.
    chr_b: String,

    /// The position on the second chromosome.
    pos_b: u64,

    /// The contact count.
    value: f64,
}

impl Record {
    /// Gets the first chromosome.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::dump::record::Record;
    ///
    /// let record = "chr1\t100\tchr2\t250\t3".parse::<Record>()?;
    /// assert_eq!(record.chr_a(), "chr1");
    /// assert_eq!(record.pos_b(), 250);
    /// assert_eq!(record.value(), 3.0);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn chr_a(&self) -> &str {
        &self.chr_a
    }

    /// Gets the position on the first chromosome.
    pub fn pos_a(&self) -> u64 {
        self.pos_a
    }

    /// Gets the second chromosome.
    pub fn chr_b(&self) -> &str {
        &self.chr_b
    }

    /// Gets the position on the second chromosome.
    pub fn pos_b(&self) -> u64 {
        self.pos_b
    }

    /// Gets the contact count.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl FromStr for Record {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split_whitespace().collect::<Vec<_>>();

        let [chr_a, pos_a, chr_b, pos_b, value] = parts[..] else {
            return Err(ParseError::IncorrectNumberOfFields(parts.len()));
        };

        let value = value.parse::<f64>().map_err(ParseError::InvalidValue)?;

        if !value.is_finite() || value < 0.0 {
            return Err(ParseError::NegativeValue(value));
        }

        Ok(Self {
            chr_a: chr_a.to_string(),
            pos_a: pos_a.parse().map_err(ParseError::InvalidPosition)?,
            chr_b: chr_b.to_string(),
            pos_b: pos_b.parse().map_err(ParseError::InvalidPosition)?,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_malformed_records() {
        let err = "chr1\t100\tchr2".parse::<Record>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields in contact record: expected 5 fields, found 3 fields"
        );

        let err = "chr1 100 chr2 -5 1".parse::<Record>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidPosition(_)));

        let err = "chr1 100 chr2 5 -1".parse::<Record>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "value must be a non-negative, finite number: -1"
        );
    }
}
