//! `hicmatrix` is a crate for binning, coloring, and navigating
//! multi-resolution Hi-C contact matrices.
//!
//! The crate is the engine behind a three-level matrix viewer:
//!
//! - The **whole-genome** level draws every chromosome pair at the coarsest
//!   resolution, one tile at a time.
//! - The **chromosome-pair** level draws one pair in full at a resolution
//!   chosen for the longer chromosome.
//! - The **detail** level draws a window of one chromosome against a window
//!   of another, linked to two genomic axis views that can be panned and
//!   zoomed. When even the finest base-pair resolution is too coarse for the
//!   window, contacts are binned by restriction fragment instead.
//!
//! ## Sessions
//!
//! A [`Session`] holds the state of one viewer. It never performs I/O.
//! Instead, every operation returns the [`Actions`](session::Actions) the
//! host must carry out: [data requests](session::Request) and
//! [commands](view::axis::AxisCommand) for the linked axes. The answers are
//! handed back through [`Session::complete()`], and answers that arrive after
//! the user has moved on are discarded.
//!
//! Hosts that are happy to block can let [`source::drive()`] serve the
//! requests from any [`Source`](source::Source): an in-memory
//! [contact dump](source::Memory) or, with the `http` feature, the
//! [contact service](source::Http).
//!
//! ```
//! use hicmatrix::source;
//! use hicmatrix::source::Memory;
//! use hicmatrix::source::Source as _;
//! use hicmatrix::session::Config;
//! use hicmatrix::Session;
//!
//! let data = b"#chromosome\tchr1\t10000
//! #chromosome\tchr2\t10000
//! #resolutions\tbp\t5000\t1000
//! chr1\t0\tchr2\t5000\t20
//! ";
//!
//! let memory = Memory::from_reader(&data[..])?;
//! let mut session = Session::try_new(&memory.summary()?, Config::default())?;
//!
//! // Load the whole-genome level.
//! let actions = session.start();
//! source::drive(&mut session, &memory, actions);
//! let raster = session.whole_genome_raster();
//! assert_eq!(raster.pixel(0, 4), Some([255, 153, 153, 255]));
//!
//! // Open chromosome 1 against chromosome 2.
//! let actions = session.select_pair("chr1", "chr2")?;
//! source::drive(&mut session, &memory, actions);
//!
//! let view = session.chromosome_pair().unwrap();
//! assert_eq!(view.resolution(), 1_000);
//! assert!(view.raster().is_some());
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Contact dumps
//!
//! The [`dump`] module reads the line-oriented text format the in-memory
//! source is loaded from. See the module documentation for its layout.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod contact;
pub mod coordinate;
pub mod dump;
pub mod genome;
pub mod overlay;
pub mod raster;
pub mod resolution;
pub mod session;
pub mod source;
pub mod summary;
pub mod view;

pub use session::Session;
