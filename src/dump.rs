//! A contact dump reader.
//!
//! A contact dump is a line-oriented text file (optionally gzip-compressed)
//! that describes a dataset and its raw, unbinned contacts:
//!
//! ```text
//! #chromosome  chr1  248956422
//! #resolutions bp    2500000  500000  100000
//! #resolutions frag  500  100  20
//! #enzyme      HindIII
//! #normalizations NONE VC VC_SQRT
//! #fragment    chr1  0  16007  0
//! chr1  10500  chr1  96000  3
//! ```
//!
//! Fields are separated by tabs or spaces. Empty lines are allowed anywhere.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::{self};
use std::iter;
use std::path::Path;

use flate2::read::MultiGzDecoder;

pub mod directive;
pub mod line;
pub mod record;

pub use directive::Directive;
pub use line::Line;
pub use record::Record;

/// The new line character.
const NEW_LINE: char = '\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

/// The magic bytes that open a gzip stream.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// An error related to a [`Reader`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A line error, with its one-based line number.
    Line(line::ParseError, usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::Line(err, number) => write!(f, "line {number}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A contact dump reader.
#[derive(Clone, Debug)]
pub struct Reader<T>
where
    T: BufRead,
{
    /// The inner reader.
    inner: T,

    /// The number of lines read so far.
    line_number: usize,
}

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates a contact dump reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"#chromosome\tchr1\t1000\nchr1\t0\tchr1\t500\t2\n";
    /// let reader = hicmatrix::dump::Reader::new(&data[..]);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::from(inner)
    }

    /// Gets a reference to the inner reader.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Gets a mutable reference to the inner reader.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consumes self and returns the inner reader.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Gets the number of lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads a raw, textual line from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// let data = b"#enzyme MboI\r\nchr1 0 chr1 0 1";
    /// let mut reader = hicmatrix::dump::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 14);
    /// assert_eq!(buffer, "#enzyme MboI");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 15);
    /// assert_eq!(buffer, "chr1 0 chr1 0 1");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 0);
    ///
    /// # Ok::<(), io::Error>(())
    /// ```
    pub fn read_line_raw(&mut self, buffer: &mut String) -> io::Result<usize> {
        let read = read_line(&mut self.inner, buffer)?;

        if read > 0 {
            self.line_number += 1;
        }

        Ok(read)
    }

    /// Attempts to read a [`Line`] from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::dump::Line;
    ///
    /// let data = b"#chromosome\tchr1\t1000\n\nchr1\t0\tchr1\t500\t2\n";
    /// let mut reader = hicmatrix::dump::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    /// assert!(matches!(
    ///     reader.read_line(&mut buffer)?,
    ///     Some(Line::Directive(_))
    /// ));
    /// assert!(matches!(reader.read_line(&mut buffer)?, Some(Line::Empty)));
    /// assert!(matches!(reader.read_line(&mut buffer)?, Some(Line::Record(_))));
    /// assert!(reader.read_line(&mut buffer)?.is_none());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_line(&mut self, buffer: &mut String) -> Result<Option<Line>, Error> {
        let read = self.read_line_raw(buffer).map_err(Error::Io)?;

        match read {
            0 => Ok(None),
            _ => {
                let line = buffer
                    .parse::<Line>()
                    .map_err(|err| Error::Line(err, self.line_number))?;
                Ok(Some(line))
            }
        }
    }

    /// Returns an iterator over the [`Line`]s in the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"#chromosome\tchr1\t1000\nchr1\t0\tchr1\t500\t2\nchr1\t0\n";
    /// let mut reader = hicmatrix::dump::Reader::new(&data[..]);
    ///
    /// let lines = reader.lines().collect::<Vec<_>>();
    /// assert_eq!(lines.len(), 3);
    /// assert!(lines[2].is_err());
    /// ```
    pub fn lines(&mut self) -> impl Iterator<Item = Result<Line, Error>> + '_ {
        let mut buffer = String::new();
        iter::from_fn(move || self.read_line(&mut buffer).transpose())
    }
}

impl<T> From<T> for Reader<T>
where
    T: BufRead,
{
    fn from(inner: T) -> Self {
        Self {
            inner,
            line_number: 0,
        }
    }
}

impl Reader<Box<dyn BufRead>> {
    /// Opens a contact dump on disk, decompressing it if it starts with the
    /// gzip magic bytes.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let compressed = file.fill_buf()?.starts_with(&GZIP_MAGIC);

        let inner: Box<dyn BufRead> = match compressed {
            true => Box::new(BufReader::new(MultiGzDecoder::new(file))),
            false => Box::new(file),
        };

        Ok(Self::new(inner))
    }
}

/// Reads a line from a buffered reader, stripping the line terminator.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    match reader.read_line(buffer) {
        Ok(0) => Ok(0),
        Ok(n) => {
            if buffer.ends_with(NEW_LINE) {
                buffer.pop();

                if buffer.ends_with(CARRIAGE_RETURN) {
                    buffer.pop();
                }
            }

            Ok(n)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    #[test]
    fn test_read_line() {
        let data = b"hello\r\nworld!";
        let mut cursor = io::Cursor::new(data);

        let mut buffer = String::new();
        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "hello");
        assert_eq!(len, 7);

        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "world!");
        assert_eq!(len, 6);
    }

    #[test]
    fn it_numbers_the_offending_line() {
        let data = b"#enzyme MboI\n\n#resolutions kb 5\n";
        let mut reader = Reader::new(&data[..]);

        let err = reader.lines().find_map(|line| line.err()).unwrap();
        assert!(err.to_string().starts_with("line 3: invalid directive"));
    }

    #[test]
    fn it_opens_compressed_dumps() -> Result<(), Box<dyn std::error::Error>> {
        let path = std::env::temp_dir().join(format!("hicmatrix-{}.txt.gz", std::process::id()));

        let mut encoder = GzEncoder::new(File::create(&path)?, Compression::default());
        encoder.write_all(b"#enzyme MboI\nchr1 0 chr1 0 1\n")?;
        encoder.finish()?;

        let mut reader = Reader::open(&path)?;
        let lines = reader.lines().collect::<Result<Vec<_>, _>>();
        std::fs::remove_file(&path)?;

        let lines = lines?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], Line::Directive(Directive::Enzyme(String::from("MboI"))));
        Ok(())
    }
}
