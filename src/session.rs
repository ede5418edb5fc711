//! A matrix viewer session.
//!
//! A [`Session`] never performs I/O. Every operation returns the [`Actions`]
//! the host must carry out: data [`Request`]s to perform (in any manner, at
//! any time) and [`AxisCommand`]s to route to the linked axis views. Each
//! request carries a [`Ticket`]; the answer is handed back through
//! [`Session::complete()`] together with that ticket, which is how stale
//! answers are recognized and discarded.

use std::collections::BTreeMap;

use tracing::debug;
use tracing::warn;

use crate::cache::Pipeline;
use crate::cache::Tile;
use crate::contact;
use crate::contact::ContactQuery;
use crate::contact::ContactTuple;
use crate::contact::Normalization;
use crate::contact::Region;
use crate::coordinate::fragment;
use crate::coordinate::fragment::Fragment;
use crate::coordinate::fragment::FragmentMap;
use crate::coordinate::fragment::FragmentQuery;
use crate::genome::Genome;
use crate::genome::Locus;
use crate::genome::Orientation;
use crate::genome::Pair;
use crate::overlay::Breakpoint;
use crate::raster::layout::Label;
use crate::raster::Layout;
use crate::raster::Raster;
use crate::resolution;
use crate::resolution::DetailUnit;
use crate::resolution::ResolutionRequest;
use crate::source;
use crate::summary;
use crate::summary::Dataset;
use crate::summary::Summary;
use crate::view;
use crate::view::axis::AxisCommand;
use crate::view::axis::AxisEvent;
use crate::view::axis::AxisId;
use crate::view::detail::Outcome;
use crate::view::pair::Side;
use crate::view::Controller;
use crate::view::Detail;
use crate::view::Level;
use crate::view::PairView;
use crate::view::Stamp;

pub mod config;

pub use config::Config;

/// An error related to a [`Session`].
#[derive(Debug)]
pub enum Error {
    /// The dataset summary is invalid.
    Summary(summary::Error),

    /// The configuration is invalid.
    Config(config::Error),

    /// The requested level change is not allowed.
    Transition(view::Error),

    /// A chromosome is not part of the dataset.
    UnknownChromosome(String),

    /// A locus reaches past the end of its chromosome.
    OutOfBounds(Locus),

    /// The service does not support a normalization method.
    Unsupported(Normalization),

    /// The operation needs a different level to be active.
    Inactive(Level),

    /// A click fell outside the raster or on a border.
    Outside(u32, u32),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Summary(err) => write!(f, "summary error: {err}"),
            Error::Config(err) => write!(f, "config error: {err}"),
            Error::Transition(err) => write!(f, "transition error: {err}"),
            Error::UnknownChromosome(name) => write!(f, "unknown chromosome: {name}"),
            Error::OutOfBounds(locus) => write!(f, "locus is out of bounds: {locus}"),
            Error::Unsupported(normalization) => {
                write!(f, "unsupported normalization method: {normalization}")
            }
            Error::Inactive(level) => write!(f, "the {level} level is not active"),
            Error::Outside(x, y) => write!(f, "no chromosome pair at pixel ({x}, {y})"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// What a request was issued for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Target {
    /// A whole-genome tile, during the given tile epoch.
    Tile {
        /// The pair.
        pair: Pair,

        /// The tile epoch.
        epoch: u64,
    },

    /// The chromosome-pair raster.
    ChromosomePair(Stamp),

    /// The detail raster.
    Detail(Stamp),

    /// The fragment map of one detail axis.
    Fragments(Stamp, AxisId),
}

/// Identifies a request so that its answer can be matched up (or discarded).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ticket {
    /// A sequence number, unique within the session.
    id: u64,

    /// What the request was issued for.
    target: Target,
}

impl Ticket {
    /// Gets the sequence number.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Gets what the request was issued for.
    pub fn target(&self) -> &Target {
        &self.target
    }
}

/// A data request for the host to perform.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Fetch contacts.
    Contacts {
        /// The ticket to answer with.
        ticket: Ticket,

        /// The query.
        query: ContactQuery,
    },

    /// Fetch fragment boundaries.
    Fragments {
        /// The ticket to answer with.
        ticket: Ticket,

        /// The query.
        query: FragmentQuery,
    },
}

impl Request {
    /// Gets the ticket.
    pub fn ticket(&self) -> &Ticket {
        match self {
            Request::Contacts { ticket, .. } => ticket,
            Request::Fragments { ticket, .. } => ticket,
        }
    }
}

/// The answer to a [`Request`].
#[derive(Debug)]
pub enum Response {
    /// The answer to [`Request::Contacts`].
    Contacts {
        /// The ticket of the request.
        ticket: Ticket,

        /// The outcome.
        result: source::Result<Vec<ContactTuple>>,
    },

    /// The answer to [`Request::Fragments`].
    Fragments {
        /// The ticket of the request.
        ticket: Ticket,

        /// The outcome.
        result: source::Result<Vec<Fragment>>,
    },
}

/// The work a session operation hands back to the host.
#[derive(Debug, Default)]
pub struct Actions {
    /// The data requests to perform.
    pub requests: Vec<Request>,

    /// The commands for the linked axis views.
    pub commands: Vec<AxisCommand>,
}

impl Actions {
    /// Returns whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.commands.is_empty()
    }

    /// Creates [`Actions`] holding a single request.
    fn request(request: Request) -> Self {
        Self {
            requests: vec![request],
            commands: Vec::new(),
        }
    }
}

/// Where a [`Notice`] applies.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Scope {
    /// One whole-genome tile.
    Tile(Pair),

    /// The chromosome-pair raster.
    ChromosomePair(Pair),

    /// The detail raster.
    Detail,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Tile(pair) => write!(f, "whole-genome tile {pair}"),
            Scope::ChromosomePair(pair) => write!(f, "chromosome pair {pair}"),
            Scope::Detail => write!(f, "detail view"),
        }
    }
}

/// A recoverable problem to show next to the affected raster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    /// Where the problem applies.
    scope: Scope,

    /// The message.
    message: String,
}

impl Notice {
    /// Gets where the problem applies.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Gets the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.scope, self.message)
    }
}

/// The binning and fragment maps of the detail request in flight.
#[derive(Debug)]
struct DetailFetch {
    /// The stamp the request was issued under.
    stamp: Stamp,

    /// The binning, with `a` on x and `b` on y.
    request: ResolutionRequest,

    /// The fragment maps (x, y) in fragment mode.
    fragments: Option<(FragmentMap, FragmentMap)>,
}

/// One matrix viewer instance.
#[derive(Debug)]
pub struct Session {
    /// The validated dataset summary.
    dataset: Dataset,

    /// The configuration.
    config: Config,

    /// The active normalization method.
    normalization: Normalization,

    /// The active cutoff.
    cutoff: f64,

    /// The level-of-detail state machine.
    controller: Controller,

    /// The whole-genome canvas layout.
    layout: Layout,

    /// The whole-genome tiles.
    tiles: BTreeMap<Pair, Tile>,

    /// The whole-genome fetch queue.
    pipeline: Pipeline,

    /// The chromosome-pair level.
    pair: Option<PairView>,

    /// The detail level.
    detail: Option<Detail>,

    /// The detail request in flight.
    detail_fetch: Option<DetailFetch>,

    /// The recoverable problems recorded so far.
    notices: Vec<Notice>,

    /// The next ticket id.
    next_ticket: u64,
}

impl Session {
    /// Attempts to create a [`Session`] for a dataset.
    ///
    /// The session starts at the whole-genome level; call
    /// [`start()`](Session::start) to begin loading it.
    pub fn try_new(summary: &Summary, config: Config) -> Result<Self> {
        let dataset = summary.validate().map_err(Error::Summary)?;

        if !dataset.supports(config.normalization()) {
            return Err(Error::Unsupported(config.normalization()));
        }

        let cutoff = config::check_cutoff(config.cutoff()).map_err(Error::Config)?;

        let layout = Layout::new(
            dataset.genome(),
            resolution::whole_genome(dataset.base_pair_ladder()),
            config.whole_genome_bin_px(),
            config.border_px(),
        );

        let tiles = dataset
            .genome()
            .pairs()
            .map(|pair| (pair.clone(), Tile::new(pair)))
            .collect();

        Ok(Self {
            normalization: config.normalization(),
            cutoff,
            dataset,
            config,
            controller: Controller::new(),
            layout,
            tiles,
            pipeline: Pipeline::new(),
            pair: None,
            detail: None,
            detail_fetch: None,
            notices: Vec::new(),
            next_ticket: 0,
        })
    }

    /// Gets the validated dataset summary.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Gets the chromosomes.
    pub fn genome(&self) -> &Genome {
        self.dataset.genome()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the active level.
    pub fn level(&self) -> Level {
        self.controller.level()
    }

    /// Gets the active normalization method.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Gets the active cutoff.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Gets the whole-genome canvas layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Gets the whole-genome axis labels.
    pub fn labels(&self) -> Vec<Label> {
        self.layout.labels()
    }

    /// Gets the whole-genome tile for a canonical pair.
    pub fn tile(&self, pair: &Pair) -> Option<&Tile> {
        self.tiles.get(pair)
    }

    /// Iterates over the whole-genome tiles in pairwise order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Gets the whole-genome fetch queue.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Gets the chromosome-pair level, if one has been opened.
    pub fn chromosome_pair(&self) -> Option<&PairView> {
        self.pair.as_ref()
    }

    /// Gets the detail level, if one has been opened.
    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    /// Gets the recoverable problems recorded so far.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Takes the recoverable problems recorded so far.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Begins loading the whole-genome level.
    pub fn start(&mut self) -> Actions {
        debug!(
            chromosomes = self.genome().len(),
            resolution = self.layout.resolution(),
            "starting session"
        );

        self.queue_tiles();
        self.pump()
    }

    /// Returns to the whole-genome level from any level.
    pub fn show_whole_genome(&mut self) -> Result<Actions> {
        self.controller
            .transition(Level::WholeGenome)
            .map_err(Error::Transition)?;

        self.queue_tiles();
        Ok(self.pump())
    }

    /// Moves to the chromosome-pair level for `x` (along the horizontal
    /// axis) against `y`.
    pub fn select_pair(&mut self, x: &str, y: &str) -> Result<Actions> {
        let canonical = self.canonical(x, y)?;

        let stamp = self
            .controller
            .transition(Level::ChromosomePair)
            .map_err(Error::Transition)?;
        self.pipeline.pause();

        Ok(self.open_pair(x, y, canonical, stamp))
    }

    /// Handles a click on the whole-genome raster.
    pub fn click_whole_genome(&mut self, px: u32, py: u32) -> Result<Actions> {
        self.require(Level::WholeGenome)?;

        let (x, y) = self
            .layout
            .locate(px, py)
            .map(|(x, y)| (x.to_string(), y.to_string()))
            .ok_or(Error::Outside(px, py))?;

        self.select_pair(&x, &y)
    }

    /// Handles a click on the chromosome-pair raster by opening the detail
    /// level centered on the clicked position.
    pub fn click_pair(&mut self, px: u32, py: u32) -> Result<Actions> {
        self.require(Level::ChromosomePair)?;

        let view = self.pair.as_ref().ok_or(Error::Inactive(Level::ChromosomePair))?;
        let (ax, ay) = view.anchor(px, py).ok_or(Error::Outside(px, py))?;
        let span = view.resolution() * self.config.detail_initial_bins();

        let x = Locus::centered(view.x().name(), ax, span, view.x().length());
        let y = Locus::centered(view.y().name(), ay, span, view.y().length());

        self.launch_detail(x, y)
    }

    /// Opens the detail level on `x` against `y`.
    ///
    /// The returned commands move the linked axes onto the new windows.
    pub fn launch_detail(&mut self, x: Locus, y: Locus) -> Result<Actions> {
        self.check_locus(&x)?;
        self.check_locus(&y)?;

        let stamp = self
            .controller
            .transition(Level::Detail)
            .map_err(Error::Transition)?;
        self.pipeline.pause();

        debug!(%x, %y, "opening detail level");

        let commands = vec![
            AxisCommand::SetInterval {
                axis: AxisId::X,
                locus: x.clone(),
            },
            AxisCommand::SetInterval {
                axis: AxisId::Y,
                locus: y.clone(),
            },
        ];

        self.detail = Some(Detail::new(x, y, self.config.detail_width_px() as f64));

        let mut actions = self.fetch_detail(stamp);
        actions.commands = commands;
        Ok(actions)
    }

    /// Opens the detail level centered on a breakpoint.
    ///
    /// The window spans the same number of bins as a click on the
    /// chromosome-pair raster would open.
    pub fn launch_breakpoint(&mut self, breakpoint: &Breakpoint) -> Result<Actions> {
        let length = |name: &str| {
            self.genome()
                .length(name)
                .ok_or_else(|| Error::UnknownChromosome(name.to_string()))
        };

        let a = length(breakpoint.chr_a())?;
        let b = length(breakpoint.chr_b())?;

        let selection = resolution::chromosome_pair(
            self.dataset.base_pair_ladder(),
            a.max(b),
            self.config.chromosome_pair_min_bins(),
        );
        let span = selection.resolution() * self.config.detail_initial_bins();

        let x = Locus::centered(breakpoint.chr_a(), breakpoint.pos_a(), span, a);
        let y = Locus::centered(breakpoint.chr_b(), breakpoint.pos_b(), span, b);

        self.launch_detail(x, y)
    }

    /// Moves one level up: detail to chromosome pair, chromosome pair to
    /// whole genome.
    pub fn zoom_out(&mut self) -> Result<Actions> {
        match self.level() {
            Level::WholeGenome => Ok(Actions::default()),
            Level::ChromosomePair => self.show_whole_genome(),
            Level::Detail => {
                let (x, y) = self
                    .detail
                    .as_ref()
                    .map(|detail| {
                        (
                            detail.x().chromosome().to_string(),
                            detail.y().chromosome().to_string(),
                        )
                    })
                    .ok_or(Error::Inactive(Level::Detail))?;

                let canonical = self.canonical(&x, &y)?;
                let stamp = self
                    .controller
                    .transition(Level::ChromosomePair)
                    .map_err(Error::Transition)?;

                Ok(self.open_pair(&x, &y, canonical, stamp))
            }
        }
    }

    /// Applies an event from a linked axis view.
    ///
    /// Events are ignored unless the detail level is active.
    pub fn handle_axis_event(&mut self, event: AxisEvent) -> Actions {
        if self.level() != Level::Detail {
            debug!(axis = %event.axis(), level = %self.level(), "ignoring axis event");
            return Actions::default();
        }

        let Some(detail) = self.detail.as_mut() else {
            return Actions::default();
        };

        match detail.observe(event) {
            Outcome::Refetch => {
                let stamp = self.controller.refresh();
                self.fetch_detail(stamp)
            }
            Outcome::Moved | Outcome::Waiting | Outcome::Unchanged => Actions::default(),
        }
    }

    /// Scales both detail axes by `factor` around their centers.
    ///
    /// The returned commands move the linked axes; once both report back
    /// through [`handle_axis_event()`](Session::handle_axis_event) the new
    /// window is fetched.
    pub fn zoom_by(&mut self, factor: f64) -> Result<Actions> {
        self.require(Level::Detail)?;

        let genome = self.dataset.genome();
        let detail = self.detail.as_mut().ok_or(Error::Inactive(Level::Detail))?;

        let x = genome.length(detail.x().chromosome()).unwrap_or(u64::MAX);
        let y = genome.length(detail.y().chromosome()).unwrap_or(u64::MAX);

        Ok(Actions {
            requests: Vec::new(),
            commands: detail.zoom(factor, x, y),
        })
    }

    /// Halves both detail spans.
    pub fn zoom_in(&mut self) -> Result<Actions> {
        self.zoom_by(0.5)
    }

    /// Doubles both detail spans.
    pub fn zoom_out_detail(&mut self) -> Result<Actions> {
        self.zoom_by(2.0)
    }

    /// Switches the normalization method.
    ///
    /// Every held tile and view is invalidated. All tiles are queued again
    /// and the active level is fetched anew.
    pub fn set_normalization(&mut self, normalization: Normalization) -> Result<Actions> {
        if !self.dataset.supports(normalization) {
            return Err(Error::Unsupported(normalization));
        }

        if normalization == self.normalization {
            return Ok(Actions::default());
        }

        debug!(from = %self.normalization, to = %normalization, "switching normalization");
        self.normalization = normalization;

        self.pipeline.cancel();
        for tile in self.tiles.values_mut() {
            tile.invalidate();
        }
        self.queue_tiles();

        if let Some(view) = self.pair.as_mut() {
            view.invalidate(normalization);
        }

        if let Some(detail) = self.detail.as_mut() {
            detail.invalidate();
        }
        self.detail_fetch = None;

        Ok(match self.level() {
            Level::WholeGenome => self.pump(),
            Level::ChromosomePair => {
                let stamp = self.controller.refresh();
                self.fetch_pair(stamp)
            }
            Level::Detail => {
                let stamp = self.controller.refresh();
                self.fetch_detail(stamp)
            }
        })
    }

    /// Changes the cutoff and repaints every raster from cached data.
    pub fn set_cutoff(&mut self, cutoff: f64) -> Result<()> {
        self.cutoff = config::check_cutoff(cutoff).map_err(Error::Config)?;
        debug!(cutoff, "repainting with new cutoff");
        self.repaint();
        Ok(())
    }

    /// Sets the cutoff to the `quantile` of the values held for the active
    /// level and repaints.
    ///
    /// Returns the new cutoff, or [`None`] (leaving the cutoff unchanged) when
    /// no positive value is held.
    pub fn auto_cutoff(&mut self, quantile: f64) -> Option<f64> {
        let values = match self.level() {
            Level::WholeGenome => self
                .tiles
                .values()
                .filter_map(|tile| tile.tuples())
                .flatten()
                .map(|tuple| tuple.value())
                .collect::<Vec<_>>(),
            Level::ChromosomePair => self
                .pair
                .as_ref()
                .and_then(|view| view.tuples())
                .map(|tuples| tuples.iter().map(|tuple| tuple.value()).collect())
                .unwrap_or_default(),
            Level::Detail => self
                .detail
                .as_ref()
                .and_then(|detail| detail.tuples())
                .map(|tuples| tuples.iter().map(|tuple| tuple.value()).collect())
                .unwrap_or_default(),
        };

        let cutoff = contact::quantile(values, quantile)?;
        self.set_cutoff(cutoff).ok()?;
        Some(cutoff)
    }

    /// Composes the whole-genome raster: background bands plus every painted
    /// tile in both triangles.
    pub fn whole_genome_raster(&self) -> Raster {
        let mut canvas = self.layout.decorate();

        for tile in self.tiles.values() {
            tile.compose(&self.layout, &mut canvas);
        }

        canvas
    }

    /// Hands back the answer to a request.
    pub fn complete(&mut self, response: Response) -> Actions {
        match response {
            Response::Contacts { ticket, result } => match ticket.target {
                Target::Tile { pair, epoch } => self.complete_tile(pair, epoch, result),
                Target::ChromosomePair(stamp) => {
                    self.complete_pair(stamp, result);
                    Actions::default()
                }
                Target::Detail(stamp) => {
                    self.complete_detail(stamp, result);
                    Actions::default()
                }
                Target::Fragments(..) => {
                    warn!(id = ticket.id, "contacts returned for a fragment request");
                    Actions::default()
                }
            },
            Response::Fragments { ticket, result } => match ticket.target {
                Target::Fragments(stamp, axis) => self.complete_fragments(stamp, axis, result),
                _ => {
                    warn!(id = ticket.id, "fragments returned for a contact request");
                    Actions::default()
                }
            },
        }
    }

    //////////////////////////////////////////////////////////////////////////
    // Helpers
    //////////////////////////////////////////////////////////////////////////

    /// Fails unless `level` is active.
    fn require(&self, level: Level) -> Result<()> {
        match self.level() == level {
            true => Ok(()),
            false => Err(Error::Inactive(level)),
        }
    }

    /// Canonicalizes a pair of chromosome names.
    fn canonical(&self, x: &str, y: &str) -> Result<(Pair, Orientation)> {
        let genome = self.genome();

        for name in [x, y] {
            if genome.get(name).is_none() {
                return Err(Error::UnknownChromosome(name.to_string()));
            }
        }

        Pair::canonical(genome, x, y).ok_or_else(|| Error::UnknownChromosome(x.to_string()))
    }

    /// Checks that a locus lies on a known chromosome.
    fn check_locus(&self, locus: &Locus) -> Result<()> {
        let length = self
            .genome()
            .length(locus.chromosome())
            .ok_or_else(|| Error::UnknownChromosome(locus.chromosome().to_string()))?;

        match locus.stop() <= length {
            true => Ok(()),
            false => Err(Error::OutOfBounds(locus.clone())),
        }
    }

    /// Issues a new ticket.
    fn ticket(&mut self, target: Target) -> Ticket {
        let id = self.next_ticket;
        self.next_ticket += 1;
        Ticket { id, target }
    }

    /// Records a recoverable problem.
    fn notice(&mut self, scope: Scope, message: impl Into<String>) {
        let notice = Notice {
            scope,
            message: message.into(),
        };

        warn!(%notice, "fetch failed");
        self.notices.push(notice);
    }

    /// Repaints every raster from cached data.
    fn repaint(&mut self) {
        for tile in self.tiles.values_mut() {
            tile.paint(&self.layout, self.cutoff);
        }

        if let Some(view) = self.pair.as_mut() {
            view.paint(self.cutoff);
        }

        if let Some(detail) = self.detail.as_mut() {
            detail.paint(self.cutoff);
        }
    }

    //////////////////////////////////////////////////////////////////////////
    // Whole genome
    //////////////////////////////////////////////////////////////////////////

    /// Queues every tile without data, in pairwise order, and resumes the
    /// pipeline.
    fn queue_tiles(&mut self) {
        for pair in self.dataset.genome().pairs() {
            let needs_fetch = self.tiles.get(&pair).is_some_and(|tile| tile.needs_fetch());

            if needs_fetch {
                self.pipeline.push(pair);
            }
        }

        self.pipeline.resume();
    }

    /// Issues the next whole-genome fetch, if the level is active and the
    /// pipeline's slot is free.
    fn pump(&mut self) -> Actions {
        if self.level() != Level::WholeGenome {
            self.pipeline.pause();
            return Actions::default();
        }

        let Some(pair) = self.pipeline.issue() else {
            return Actions::default();
        };

        let Some(epoch) = self.tiles.get_mut(&pair).map(|tile| tile.request()) else {
            self.pipeline.finish(&pair);
            return Actions::default();
        };

        let query = ContactQuery::pair(
            &pair,
            self.normalization,
            ResolutionRequest::BasePair {
                resolution: self.layout.resolution(),
            },
        );
        let ticket = self.ticket(Target::Tile { pair, epoch });

        Actions::request(Request::Contacts { ticket, query })
    }

    /// Stores a whole-genome tile response and moves the pipeline along.
    fn complete_tile(
        &mut self,
        pair: Pair,
        epoch: u64,
        result: source::Result<Vec<ContactTuple>>,
    ) -> Actions {
        self.pipeline.finish(&pair);

        if let Some(tile) = self.tiles.get_mut(&pair) {
            match result {
                Ok(tuples) => match tile.load(epoch, tuples) {
                    true => tile.paint(&self.layout, self.cutoff),
                    false => debug!(%pair, epoch, "discarding stale tile"),
                },
                Err(err) => {
                    if tile.fail(epoch) {
                        self.notice(Scope::Tile(pair), err.to_string());
                    }
                }
            }
        }

        self.pump()
    }

    //////////////////////////////////////////////////////////////////////////
    // Chromosome pair
    //////////////////////////////////////////////////////////////////////////

    /// Sets up the chromosome-pair level, reusing held data for the same pair
    /// and normalization.
    fn open_pair(
        &mut self,
        x: &str,
        y: &str,
        (pair, orientation): (Pair, Orientation),
        stamp: Stamp,
    ) -> Actions {
        let genome = self.dataset.genome();
        let x = Side::new(x, genome.length(x).unwrap_or_default());
        let y = Side::new(y, genome.length(y).unwrap_or_default());

        let selection = resolution::chromosome_pair(
            self.dataset.base_pair_ladder(),
            x.length().max(y.length()),
            self.config.chromosome_pair_min_bins(),
        );

        let held = self
            .pair
            .as_mut()
            .filter(|view| view.holds(&pair, self.normalization))
            .and_then(|view| view.take_tuples());

        let mut view = PairView::new(
            x,
            y,
            (pair, orientation),
            selection,
            self.config.chromosome_pair_max_px(),
            self.normalization,
        );

        debug!(
            pair = %view.pair(),
            resolution = view.resolution(),
            bin_px = view.bin_px(),
            reused = held.is_some(),
            "opening chromosome-pair level"
        );

        match held {
            Some(tuples) => {
                view.load(tuples);
                view.paint(self.cutoff);
                self.pair = Some(view);
                Actions::default()
            }
            None => {
                self.pair = Some(view);
                self.fetch_pair(stamp)
            }
        }
    }

    /// Requests the data of the chromosome-pair level.
    fn fetch_pair(&mut self, stamp: Stamp) -> Actions {
        let Some(view) = self.pair.as_ref() else {
            return Actions::default();
        };

        let query = ContactQuery::pair(
            view.pair(),
            self.normalization,
            ResolutionRequest::BasePair {
                resolution: view.resolution(),
            },
        );
        let ticket = self.ticket(Target::ChromosomePair(stamp));

        Actions::request(Request::Contacts { ticket, query })
    }

    /// Stores a chromosome-pair response if it is still current.
    fn complete_pair(&mut self, stamp: Stamp, result: source::Result<Vec<ContactTuple>>) {
        if !self.controller.is_current(&stamp) {
            debug!(generation = stamp.generation(), "discarding stale chromosome-pair data");
            return;
        }

        let Some(view) = self.pair.as_mut() else {
            return;
        };

        match result {
            Ok(tuples) => {
                view.load(tuples);
                view.paint(self.cutoff);
            }
            Err(err) => {
                let scope = Scope::ChromosomePair(view.pair().clone());
                self.notice(scope, err.to_string());
            }
        }
    }

    //////////////////////////////////////////////////////////////////////////
    // Detail
    //////////////////////////////////////////////////////////////////////////

    /// Requests the data of the detail level for its current window.
    ///
    /// In base-pair mode the contacts are requested directly. In fragment
    /// mode both windows are first resolved to fragment ids.
    fn fetch_detail(&mut self, stamp: Stamp) -> Actions {
        let fragments_available = self.dataset.fragments_available();
        let ladder = self.dataset.base_pair_ladder();
        let min_bins = self.config.detail_min_bins();

        let Some(detail) = self.detail.as_mut() else {
            return Actions::default();
        };

        let (x, y) = detail.begin_fetch();
        detail.paint(self.cutoff);
        self.detail_fetch = None;

        let unit = resolution::detail_unit(ladder, detail.span(), min_bins, fragments_available);
        debug!(%x, %y, ?unit, "fetching detail");

        match unit {
            DetailUnit::BasePair(selection) => {
                let request = ResolutionRequest::BasePair {
                    resolution: selection.resolution(),
                };
                self.request_detail(stamp, &x, &y, request, None)
            }
            DetailUnit::Fragment => {
                let enzyme = self.dataset.enzyme().unwrap_or_default().to_string();
                let mut actions = Actions::default();

                for (axis, locus) in [(AxisId::X, x), (AxisId::Y, y)] {
                    let ticket = self.ticket(Target::Fragments(stamp, axis));
                    let query = FragmentQuery::new(enzyme.clone(), locus);
                    actions.requests.push(Request::Fragments { ticket, query });
                }

                actions
            }
        }
    }

    /// Requests the detail contacts for a window with a resolved binning
    /// (`a` on x, `b` on y).
    fn request_detail(
        &mut self,
        stamp: Stamp,
        x: &Locus,
        y: &Locus,
        request: ResolutionRequest,
        fragments: Option<(FragmentMap, FragmentMap)>,
    ) -> Actions {
        let Ok((_, orientation)) = self.canonical(x.chromosome(), y.chromosome()) else {
            return Actions::default();
        };

        let query = match orientation {
            Orientation::Forward => {
                ContactQuery::regions(Region::from(x), Region::from(y), self.normalization, request)
            }
            Orientation::Swapped => ContactQuery::regions(
                Region::from(y),
                Region::from(x),
                self.normalization,
                request.swapped(),
            ),
        };

        self.detail_fetch = Some(DetailFetch {
            stamp,
            request,
            fragments,
        });

        let ticket = self.ticket(Target::Detail(stamp));
        Actions::request(Request::Contacts { ticket, query })
    }

    /// Stores one axis' fragment map and, once both are in, picks a fragment
    /// resolution and requests the contacts.
    fn complete_fragments(
        &mut self,
        stamp: Stamp,
        axis: AxisId,
        result: source::Result<Vec<Fragment>>,
    ) -> Actions {
        if !self.controller.is_current(&stamp) {
            debug!(generation = stamp.generation(), %axis, "discarding stale fragments");
            return Actions::default();
        }

        let Some(detail) = self.detail.as_mut() else {
            return Actions::default();
        };

        let fragments = match result {
            Ok(fragments) => fragments,
            Err(err) => {
                self.notice(Scope::Detail, err.to_string());
                return Actions::default();
            }
        };

        let chromosome = detail.locus(axis).chromosome().to_string();
        let map = match FragmentMap::try_new(chromosome, fragments) {
            Ok(map) => map,
            Err(err) => {
                self.notice(Scope::Detail, err.to_string());
                return Actions::default();
            }
        };

        let Some((x_map, y_map)) = detail.resolve_fragments(axis, map) else {
            return Actions::default();
        };

        let (x, y) = (detail.x().clone(), detail.y().clone());

        let ranges = (
            x_map.resolve(x.start(), x.stop()),
            y_map.resolve(y.start(), y.stop()),
        );

        let (Some(a), Some(b)) = ranges else {
            self.notice(Scope::Detail, missing_fragments(&x, &y, ranges));
            return Actions::default();
        };

        let count = a.count().max(b.count());
        let resolution = match self.dataset.fragment_ladder() {
            Some(ladder) => ladder
                .select(count, self.config.fragment_min_bins())
                .resolution(),
            None => 1,
        };

        debug!(x = %a, y = %b, resolution, "resolved detail window to fragments");

        let request = ResolutionRequest::Fragment { resolution, a, b };
        self.request_detail(stamp, &x, &y, request, Some((x_map, y_map)))
    }

    /// Stores a detail response if it is still current.
    fn complete_detail(&mut self, stamp: Stamp, result: source::Result<Vec<ContactTuple>>) {
        let fetch = match self.detail_fetch.take() {
            Some(fetch) if fetch.stamp == stamp && self.controller.is_current(&stamp) => fetch,
            other => {
                self.detail_fetch = other;
                debug!(generation = stamp.generation(), "discarding stale detail data");
                return;
            }
        };

        let Some(detail) = self.detail.as_mut() else {
            return;
        };

        match result {
            Ok(tuples) => {
                detail.load(fetch.request, tuples, fetch.fragments);
                detail.paint(self.cutoff);
            }
            Err(err) => self.notice(Scope::Detail, err.to_string()),
        }
    }
}

/// Describes a detail window with no fragments on at least one axis.
fn missing_fragments(
    x: &Locus,
    y: &Locus,
    ranges: (Option<fragment::FragmentRange>, Option<fragment::FragmentRange>),
) -> String {
    let empty = match ranges {
        (None, None) => format!("{x} and {y}"),
        (None, Some(_)) => x.to_string(),
        _ => y.to_string(),
    };

    format!("no fragments overlap {empty}")
}
