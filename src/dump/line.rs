//! A line within a contact dump.

use std::str::FromStr;

use crate::dump::directive;
use crate::dump::directive::Directive;
use crate::dump::directive::DIRECTIVE_PREFIX;
use crate::dump::record;
use crate::dump::record::Record;

/// An error associated with parsing a contact dump line.
#[derive(Debug)]
pub enum ParseError {
    /// An invalid directive.
    InvalidDirective(directive::ParseError, String),

    /// An invalid contact record.
    InvalidRecord(record::ParseError, String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidDirective(err, line) => {
                write!(f, "invalid directive: {err}\n\nline: {line}")
            }
            ParseError::InvalidRecord(err, line) => {
                write!(f, "invalid contact record: {err}\n\nline: {line}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A line within a contact dump.
#[derive(Clone, Debug, PartialEq)]
pub enum Line {
    /// An empty line.
    Empty,

    /// A directive line.
    Directive(Directive),

    /// A contact record.
    Record(Record),
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            Ok(Self::Empty)
        } else if s.starts_with(DIRECTIVE_PREFIX) {
            s.parse::<Directive>()
                .map(Line::Directive)
                .map_err(|e| ParseError::InvalidDirective(e, s.into()))
        } else {
            s.parse::<Record>()
                .map(Line::Record)
                .map_err(|e| ParseError::InvalidRecord(e, s.into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_dispatches_on_the_prefix() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!("".parse::<Line>()?, Line::Empty);
        assert_eq!("  \t".parse::<Line>()?, Line::Empty);
        assert!(matches!("#enzyme MboI".parse::<Line>()?, Line::Directive(_)));
        assert!(matches!("chr1 0 chr1 0 1".parse::<Line>()?, Line::Record(_)));
        Ok(())
    }

    #[test]
    fn it_reports_the_offending_line() {
        let err = "chr1\t0\tchr1\tx\t1".parse::<Line>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid contact record: invalid position: invalid digit found in string\n\n\
             line: chr1\t0\tchr1\tx\t1"
        );
    }
}
