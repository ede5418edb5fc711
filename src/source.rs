//! Data sources and the synchronous event loop that serves a session from
//! one.

use std::collections::VecDeque;

use tracing::debug;

use crate::contact::ContactQuery;
use crate::contact::ContactTuple;
use crate::coordinate::fragment::Fragment;
use crate::coordinate::fragment::FragmentQuery;
use crate::session::Actions;
use crate::session::Request;
use crate::session::Response;
use crate::session::Session;
use crate::summary::Summary;
use crate::view::axis::AxisCommand;

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

#[cfg(feature = "http")]
pub use http::Http;
pub use memory::Memory;

/// An error raised while fetching from a [`Source`].
///
/// Fetch errors are recoverable: the session records them as notices and
/// keeps the previous raster.
#[derive(Debug)]
pub enum Error {
    /// The service reported an error.
    Service(String),

    /// The request asked for something the source cannot provide.
    Unsupported(String),

    /// A chromosome in the request is not part of the dataset.
    UnknownChromosome(String),

    /// A response could not be decoded.
    Json(serde_json::Error),

    /// A transport error.
    #[cfg(feature = "http")]
    Http(reqwest::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Service(message) => write!(f, "service error: {message}"),
            Error::Unsupported(message) => write!(f, "unsupported request: {message}"),
            Error::UnknownChromosome(name) => write!(f, "unknown chromosome: {name}"),
            Error::Json(err) => write!(f, "invalid response: {err}"),
            #[cfg(feature = "http")]
            Error::Http(err) => write!(f, "http error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A provider of dataset summaries, contacts, and fragment boundaries.
pub trait Source {
    /// Fetches the dataset summary.
    fn summary(&self) -> Result<Summary>;

    /// Fetches the contacts for a query.
    fn contacts(&self, query: &ContactQuery) -> Result<Vec<ContactTuple>>;

    /// Fetches the fragments overlapping a window.
    fn fragments(&self, query: &FragmentQuery) -> Result<Vec<Fragment>>;
}

/// Performs one request against a source.
pub fn fetch<S>(source: &S, request: Request) -> Response
where
    S: Source + ?Sized,
{
    match request {
        Request::Contacts { ticket, query } => {
            debug!(%query, "fetching contacts");
            Response::Contacts {
                ticket,
                result: source.contacts(&query),
            }
        }
        Request::Fragments { ticket, query } => {
            debug!(%query, "fetching fragments");
            Response::Fragments {
                ticket,
                result: source.fragments(&query),
            }
        }
    }
}

/// Serves every request in `actions` (and every request that follows from
/// the responses) from `source`, one at a time and in order.
///
/// Returns the axis commands emitted along the way.
///
/// # Examples
///
/// ```
/// use hicmatrix::Session;
/// use hicmatrix::session::Config;
/// use hicmatrix::source;
/// use hicmatrix::source::Memory;
/// use hicmatrix::source::Source as _;
///
/// let data = b"#chromosome\tchr1\t10000
/// #chromosome\tchr2\t10000
/// #resolutions\tbp\t5000
/// chr1\t0\tchr2\t5000\t20
/// ";
///
/// let memory = Memory::from_reader(&data[..])?;
/// let mut session = Session::try_new(&memory.summary()?, Config::default())?;
///
/// let actions = session.start();
/// source::drive(&mut session, &memory, actions);
///
/// let raster = session.whole_genome_raster();
/// assert_eq!(raster.pixel(0, 4), Some([255, 153, 153, 255]));
/// assert_eq!(raster.pixel(4, 0), Some([255, 153, 153, 255]));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn drive<S>(session: &mut Session, source: &S, actions: Actions) -> Vec<AxisCommand>
where
    S: Source + ?Sized,
{
    let mut requests = VecDeque::from(actions.requests);
    let mut commands = actions.commands;

    while let Some(request) = requests.pop_front() {
        let response = fetch(source, request);
        let next = session.complete(response);

        requests.extend(next.requests);
        commands.extend(next.commands);
    }

    commands
}
