//! Whole-genome tiles and the sequential pipeline that fills them.

use std::collections::VecDeque;

use tracing::debug;

use crate::contact::ContactTuple;
use crate::coordinate;
use crate::genome::Pair;
use crate::raster;
use crate::raster::Layout;
use crate::raster::Raster;

/// The fetch state of a [`Tile`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// No data is held and no request is out.
    Empty,

    /// A request is out.
    Requested,

    /// Data is held.
    Loaded,

    /// The last request failed.
    Failed,
}

/// The cached data and rasters for one chromosome pair at the whole-genome
/// level.
#[derive(Clone, Debug)]
pub struct Tile {
    /// The canonical pair.
    pair: Pair,

    /// Bumped on every invalidation so that responses to earlier requests can
    /// be recognized.
    epoch: u64,

    /// The fetch state.
    state: State,

    /// The tuples as returned (one triangle for intra-chromosome pairs).
    tuples: Option<Vec<ContactTuple>>,

    /// The raster placed at the direct origin.
    direct: Option<Raster>,

    /// The raster placed at the transposed origin (inter-chromosome pairs
    /// only).
    transposed: Option<Raster>,
}

impl Tile {
    /// Creates an empty [`Tile`].
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            epoch: 0,
            state: State::Empty,
            tuples: None,
            direct: None,
            transposed: None,
        }
    }

    /// Gets the pair.
    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    /// Gets the current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Gets the fetch state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Gets the cached tuples.
    pub fn tuples(&self) -> Option<&[ContactTuple]> {
        self.tuples.as_deref()
    }

    /// Gets the direct raster.
    pub fn direct(&self) -> Option<&Raster> {
        self.direct.as_ref()
    }

    /// Gets the transposed raster.
    pub fn transposed(&self) -> Option<&Raster> {
        self.transposed.as_ref()
    }

    /// Returns whether a request should be issued for this tile.
    pub fn needs_fetch(&self) -> bool {
        matches!(self.state, State::Empty | State::Failed)
    }

    /// Marks a request as issued and returns the epoch it belongs to.
    pub fn request(&mut self) -> u64 {
        self.state = State::Requested;
        self.epoch
    }

    /// Stores the response to a request made during `epoch`.
    ///
    /// Returns `false` (and leaves the tile untouched) if the tile has been
    /// invalidated since.
    pub fn load(&mut self, epoch: u64, tuples: Vec<ContactTuple>) -> bool {
        if epoch != self.epoch {
            return false;
        }

        self.tuples = Some(tuples);
        self.state = State::Loaded;
        true
    }

    /// Records a failed request made during `epoch`. Any raster already held
    /// is kept.
    pub fn fail(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }

        self.state = State::Failed;
        true
    }

    /// Clears the data and starts a new epoch. The rasters stay until the
    /// next successful load repaints them.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        self.state = State::Empty;
        self.tuples = None;
    }

    /// Repaints both rasters from the cached tuples.
    ///
    /// Intra-chromosome tuples are mirrored into a single square raster.
    /// Inter-chromosome tuples produce a direct raster (lead along x) and a
    /// transposed raster (follow along x).
    pub fn paint(&mut self, layout: &Layout, cutoff: f64) {
        let Some(tuples) = self.tuples.as_deref() else {
            return;
        };

        let Some((width, height)) = layout.direct_size(&self.pair) else {
            return;
        };

        let resolution = layout.resolution();
        let bin_px = layout.bin_px();

        match self.pair.is_intra() {
            true => {
                let mirrored = coordinate::mirror(tuples);
                self.direct = Some(raster::paint_bins(
                    &mirrored,
                    resolution,
                    bin_px,
                    (width, height),
                    cutoff,
                ));
                self.transposed = None;
            }
            false => {
                self.direct = Some(raster::paint_bins(
                    tuples,
                    resolution,
                    bin_px,
                    (width, height),
                    cutoff,
                ));

                let transposed = coordinate::transpose(tuples);
                self.transposed = Some(raster::paint_bins(
                    &transposed,
                    resolution,
                    bin_px,
                    (height, width),
                    cutoff,
                ));
            }
        }
    }

    /// Draws the tile's rasters onto the whole-genome canvas.
    pub fn compose(&self, layout: &Layout, canvas: &mut Raster) {
        if let (Some(direct), Some((x, y))) = (&self.direct, layout.direct_origin(&self.pair)) {
            canvas.blit(direct, x, y);
        }

        if let (Some(transposed), Some((x, y))) =
            (&self.transposed, layout.transposed_origin(&self.pair))
        {
            canvas.blit(transposed, x, y);
        }
    }
}

/// A sequential queue of whole-genome tile fetches.
///
/// Pairs are issued strictly in queue order, one at a time. The in-flight
/// slot is released only when the response (stale or not) is handed back
/// through [`Pipeline::finish()`].
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    /// The pairs waiting to be fetched.
    queue: VecDeque<Pair>,

    /// The pair whose request is out.
    in_flight: Option<Pair>,

    /// Whether issuing is suspended.
    paused: bool,
}

impl Pipeline {
    /// Creates an empty, running [`Pipeline`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair unless it is already queued.
    ///
    /// # Examples
    ///
    /// ```
    /// use hicmatrix::cache::Pipeline;
    /// use hicmatrix::genome::Chromosome;
    /// use hicmatrix::genome::Genome;
    ///
    /// let genome = Genome::try_new([
    ///     Chromosome::new("chr1", 100),
    ///     Chromosome::new("chr2", 100),
    /// ])?;
    ///
    /// let mut pipeline = Pipeline::new();
    /// genome.pairs().for_each(|pair| pipeline.push(pair));
    ///
    /// let first = pipeline.issue().unwrap();
    /// assert_eq!(first.to_string(), "chr1-chr1");
    ///
    /// // Nothing else is issued until the first response is handed back.
    /// assert!(pipeline.issue().is_none());
    ///
    /// pipeline.finish(&first);
    /// assert_eq!(pipeline.issue().unwrap().to_string(), "chr1-chr2");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn push(&mut self, pair: Pair) {
        if !self.queue.contains(&pair) {
            self.queue.push_back(pair);
        }
    }

    /// Issues the next pair if nothing is in flight and the pipeline is not
    /// paused.
    pub fn issue(&mut self) -> Option<Pair> {
        if self.paused || self.in_flight.is_some() {
            return None;
        }

        let pair = self.queue.pop_front()?;
        debug!(%pair, remaining = self.queue.len(), "issuing whole-genome tile");
        self.in_flight = Some(pair.clone());
        Some(pair)
    }

    /// Releases the in-flight slot if it is held by `pair`.
    pub fn finish(&mut self, pair: &Pair) -> bool {
        match self.in_flight.as_ref() == Some(pair) {
            true => {
                self.in_flight = None;
                true
            }
            false => false,
        }
    }

    /// Stops issuing new requests.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes issuing requests.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Returns whether the pipeline is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drops every queued pair. A request already in flight keeps its slot
    /// until its response arrives.
    pub fn cancel(&mut self) {
        if !self.queue.is_empty() {
            debug!(dropped = self.queue.len(), "cancelling whole-genome pipeline");
        }

        self.queue.clear();
    }

    /// Gets the pair whose request is out.
    pub fn in_flight(&self) -> Option<&Pair> {
        self.in_flight.as_ref()
    }

    /// Gets the number of queued pairs.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether no pairs are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Chromosome;
    use crate::genome::Genome;

    fn genome() -> Genome {
        Genome::try_new([Chromosome::new("chr1", 10_000), Chromosome::new("chr2", 5_000)]).unwrap()
    }

    fn pair(genome: &Genome, x: &str, y: &str) -> Pair {
        Pair::canonical(genome, x, y).unwrap().0
    }

    #[test]
    fn it_paints_a_transposed_raster_for_inter_chromosome_pairs() {
        let genome = Genome::try_new([
            Chromosome::new("chr1", 10_000),
            Chromosome::new("chr2", 10_000),
        ])
        .unwrap();
        let layout = Layout::new(&genome, 5_000, 1, 1);

        let mut tile = Tile::new(pair(&genome, "chr1", "chr2"));
        let epoch = tile.request();
        assert!(tile.load(
            epoch,
            vec![ContactTuple::new(0, 0, 10.0), ContactTuple::new(0, 5_000, 20.0)]
        ));
        tile.paint(&layout, 50.0);

        let direct = tile.direct().unwrap();
        assert_eq!(direct.painted(), 2);
        assert_eq!(direct.pixel(0, 0), Some(raster::color(10.0, 50.0)));
        assert_eq!(direct.pixel(0, 1), Some(raster::color(20.0, 50.0)));

        let transposed = tile.transposed().unwrap();
        assert_eq!(transposed.painted(), 2);
        assert_eq!(transposed.pixel(1, 0), Some(raster::color(20.0, 50.0)));
        assert_eq!(transposed.pixel(0, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn it_mirrors_intra_chromosome_tiles() {
        let genome = genome();
        let layout = Layout::new(&genome, 5_000, 1, 1);

        let mut tile = Tile::new(pair(&genome, "chr1", "chr1"));
        let epoch = tile.request();
        tile.load(epoch, vec![ContactTuple::new(0, 5_000, 1.0)]);
        tile.paint(&layout, 50.0);

        let direct = tile.direct().unwrap();
        assert_eq!(direct.painted(), 2);
        assert!(tile.transposed().is_none());
    }

    #[test]
    fn it_rejects_responses_from_earlier_epochs() {
        let genome = genome();
        let mut tile = Tile::new(pair(&genome, "chr1", "chr2"));

        let epoch = tile.request();
        tile.invalidate();

        assert!(!tile.load(epoch, Vec::new()));
        assert!(tile.tuples().is_none());
        assert!(tile.needs_fetch());
    }

    #[test]
    fn it_keeps_rasters_on_failure() {
        let genome = genome();
        let layout = Layout::new(&genome, 5_000, 1, 1);
        let mut tile = Tile::new(pair(&genome, "chr1", "chr1"));

        let epoch = tile.request();
        tile.load(epoch, vec![ContactTuple::new(0, 0, 1.0)]);
        tile.paint(&layout, 50.0);

        let epoch = tile.request();
        assert!(tile.fail(epoch));
        assert_eq!(tile.state(), State::Failed);
        assert!(tile.direct().is_some());
    }

    #[test]
    fn invalidating_keeps_the_rasters_until_new_data_arrives() {
        let genome = genome();
        let layout = Layout::new(&genome, 5_000, 1, 1);
        let mut tile = Tile::new(pair(&genome, "chr1", "chr2"));

        let epoch = tile.request();
        tile.load(epoch, vec![ContactTuple::new(0, 0, 10.0)]);
        tile.paint(&layout, 50.0);

        tile.invalidate();
        assert!(tile.tuples().is_none());
        assert!(tile.needs_fetch());
        assert_eq!(
            tile.direct().and_then(|raster| raster.pixel(0, 0)),
            Some(raster::color(10.0, 50.0))
        );
        assert!(tile.transposed().is_some());

        let epoch = tile.request();
        assert!(tile.fail(epoch));
        assert!(tile.direct().is_some());

        let epoch = tile.request();
        tile.load(epoch, vec![ContactTuple::new(0, 0, 40.0)]);
        tile.paint(&layout, 50.0);
        assert_eq!(
            tile.direct().and_then(|raster| raster.pixel(0, 0)),
            Some(raster::color(40.0, 50.0))
        );
    }

    #[test]
    fn the_pipeline_holds_its_slot_while_paused_and_cancelled() {
        let genome = genome();
        let mut pipeline = Pipeline::new();
        genome.pairs().for_each(|pair| pipeline.push(pair));
        genome.pairs().for_each(|pair| pipeline.push(pair));
        assert_eq!(pipeline.len(), 3);

        let first = pipeline.issue().unwrap();
        pipeline.pause();
        pipeline.cancel();

        assert!(pipeline.is_empty());
        assert_eq!(pipeline.in_flight(), Some(&first));

        pipeline.resume();
        assert!(pipeline.issue().is_none());

        assert!(!pipeline.finish(&pair(&genome, "chr2", "chr2")));
        assert!(pipeline.finish(&first));
        assert!(pipeline.in_flight().is_none());
    }
}
