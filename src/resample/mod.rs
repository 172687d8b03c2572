//! Arc-length resampling of spaced trees.
//!
//! Each slab of a tree is treated as a polyline through its node locations,
//! parameterized by cumulative arc length. The slab is replaced by
//! `n = ceil(length / max_edge_length) + 1` evenly spaced samples of a cubic
//! spline through the polyline:
//! * the first and last sample are the slab's original end nodes
//!   (same ids, bit-identical locations),
//! * interior samples are new synthetic nodes with fresh negative ids,
//! * slabs yielding fewer than 3 samples are kept unchanged.
//!
//! Should the spline bulge so that a chord between consecutive samples exceeds
//! the maximum edge length, the sample count is raised in proportion to the
//! excess until it does not. If that takes more than
//! [`Resampler::with_max_refinements()`] rounds, the remaining long chords are
//! split linearly, so no edge of a resampled slab is ever longer than the
//! maximum.
//!
//! # Example
//! ```
//! use arbor::model::{Location, SpacedTree};
//! use std::collections::BTreeMap;
//!
//! let locations = BTreeMap::from([
//!     (1, Location::new(0.0, 0.0, 0.0)),
//!     (2, Location::new(10.0, 0.0, 0.0)),
//! ]);
//! let tree = SpacedTree::from_edges([(1, 2)], locations, BTreeMap::new()).unwrap();
//! let resampled = tree.resample(2.5).unwrap();
//! assert_eq!(resampled.len(), 5);
//! ```

pub mod spline;

pub use spline::CubicSpline;

use crate::error::{ArborError, Result};
use crate::model::{IdGenerator, Location, NodeId, SpacedTree, TreeGraph};
use std::collections::BTreeMap;
use tracing::{debug, instrument, trace, warn};

/// Default first id (before negation) handed out to synthetic nodes.
const DEFAULT_ID_START: NodeId = 1;

/// Default number of times the sample count may be raised for one slab.
const DEFAULT_MAX_REFINEMENTS: usize = 32;

/// Relative slack when comparing chords against the maximum edge length.
const LENGTH_TOLERANCE: f64 = 1e-9;

/// Upper bound on the samples taken from a single slab.
const MAX_SLAB_SAMPLES: usize = 1 << 30;

// =#========================================================================#=
// RESAMPLER
// =#========================================================================#=
/// Configurable resampler for [SpacedTree]s.
///
/// # Example
/// ```
/// use arbor::resample::Resampler;
///
/// let resampler = Resampler::new(500.0)
///     .with_id_start(1000)
///     .with_max_refinements(8);
/// assert_eq!(resampler.max_edge_length(), 500.0);
/// ```
#[derive(Debug, Clone)]
pub struct Resampler {
    max_edge_length: f64,
    id_start: NodeId,
    max_refinements: usize,
}

impl Resampler {
    /// Creates a resampler producing edges of at most `max_edge_length`.
    ///
    /// # Panics
    /// Panics if `max_edge_length` is not positive and finite.
    pub fn new(max_edge_length: f64) -> Self {
        assert!(
            max_edge_length > 0.0 && max_edge_length.is_finite(),
            "Maximum edge length must be positive and finite, got {}",
            max_edge_length
        );
        Resampler {
            max_edge_length,
            id_start: DEFAULT_ID_START,
            max_refinements: DEFAULT_MAX_REFINEMENTS,
        }
    }

    /// Synthetic ids are `-start`, `-(start + 1)`, ... skipping ids in use.
    ///
    /// # Panics
    /// Panics if `start` is not positive.
    pub fn with_id_start(mut self, start: NodeId) -> Self {
        assert!(start > 0, "Synthetic id start must be positive, got {}", start);
        self.id_start = start;
        self
    }

    /// Limits how often the sample count of a slab may be raised.
    pub fn with_max_refinements(mut self, max_refinements: usize) -> Self {
        self.max_refinements = max_refinements;
        self
    }

    pub fn max_edge_length(&self) -> f64 {
        self.max_edge_length
    }

    /// Resamples `tree`, returning a new tree.
    ///
    /// Radii are kept for surviving original nodes; synthetic nodes get none.
    ///
    /// # Errors
    /// [ArborError::Structural] if the root cannot be determined or a slab
    /// is too long to be sampled at the maximum edge length.
    #[instrument(level = "debug", skip_all)]
    pub fn resample(&self, tree: &SpacedTree) -> Result<SpacedTree> {
        let (graph, locations) = self.resample_slabs(tree.slabs()?, tree.node_loc())?;
        let radius = tree
            .node_radius()
            .iter()
            .filter(|(n, _)| graph.contains(**n))
            .map(|(&n, &r)| (n, r))
            .collect();
        debug!(
            max_edge_length = self.max_edge_length,
            before = tree.len(),
            after = graph.len(),
            "resampled"
        );
        Ok(SpacedTree::new_unchecked(graph, locations, radius))
    }

    /// Resamples each slab and joins the results into one tree.
    ///
    /// # Returns
    /// The new topology and locations for every node in it.
    ///
    /// # Errors
    /// [ArborError::Structural] if a slab node has no location, a slab is too
    /// long to be sampled, or synthetic ids run out.
    pub fn resample_slabs(
        &self,
        slabs: impl IntoIterator<Item = Vec<NodeId>>,
        locations: &BTreeMap<NodeId, Location>,
    ) -> Result<(TreeGraph, BTreeMap<NodeId, Location>)> {
        let mut ids = IdGenerator::new(-self.id_start, locations.keys().copied());
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut new_locations = BTreeMap::new();

        for slab in slabs {
            let (Some(&first), Some(&last)) = (slab.first(), slab.last()) else {
                continue;
            };
            let linestring = slab
                .iter()
                .map(|n| locations.get(n).copied().ok_or_else(|| ArborError::missing_node(*n)))
                .collect::<Result<Vec<Location>>>()?;
            let resampled = self.resample_linestring(&linestring)?;

            let this_ids: Vec<NodeId> = if resampled == linestring {
                slab
            } else {
                let mut this_ids = Vec::with_capacity(resampled.len());
                this_ids.push(first);
                for _ in 2..resampled.len() {
                    this_ids.push(ids.next().ok_or_else(ArborError::ids_exhausted)?);
                }
                this_ids.push(last);
                this_ids
            };
            trace!(resampled_len = this_ids.len(), "slab resampled");

            nodes.extend(this_ids.iter().copied());
            edges.extend(this_ids.windows(2).map(|pair| (pair[0], pair[1])));
            new_locations.extend(this_ids.into_iter().zip(resampled));
        }

        Ok((TreeGraph::assemble(nodes, edges), new_locations))
    }

    /// Resamples a polyline, keeping its first and last point.
    ///
    /// Returns the input unchanged if it would yield fewer than 3 samples.
    ///
    /// # Errors
    /// [ArborError::Structural] if the polyline is too long (or not finite)
    /// to be sampled at the maximum edge length.
    pub fn resample_linestring(&self, linestring: &[Location]) -> Result<Vec<Location>> {
        let (Some(&first), Some(&last)) = (linestring.first(), linestring.last()) else {
            return Ok(Vec::new());
        };
        let arc = ArcLength::of(first, linestring);
        let too_many = || ArborError::too_many_samples(arc.total, self.max_edge_length);

        // ceil to over-sample (so that max_edge_length is an upper bound),
        // +1 for fenceposts rather than fences
        let mut n_samples = sample_count(arc.total / self.max_edge_length).ok_or_else(too_many)?;
        if n_samples < 3 {
            return Ok(linestring.to_vec());
        }

        let Some(spline) = CubicSpline::fit(&arc.knots, &arc.values) else {
            warn!(points = linestring.len(), "no spline through slab, resampling linearly");
            return self.split_long_chords(linestring).ok_or_else(too_many);
        };

        let limit = self.max_edge_length * (1.0 + LENGTH_TOLERANCE);
        let mut samples = sample_evenly(&spline, arc.total, n_samples, first, last);
        for _ in 0..self.max_refinements {
            let longest = longest_edge(&samples);
            if longest <= limit {
                return Ok(samples);
            }
            // Chords shrink roughly in proportion to the parameter step
            let segments = (n_samples - 1) as f64 * longest / self.max_edge_length;
            n_samples = sample_count(segments).ok_or_else(too_many)?.max(n_samples + 1);
            samples = sample_evenly(&spline, arc.total, n_samples, first, last);
        }
        if longest_edge(&samples) <= limit {
            return Ok(samples);
        }

        warn!(
            n_samples,
            max_refinements = self.max_refinements,
            "refinement limit reached, splitting long chords linearly"
        );
        self.split_long_chords(&samples).ok_or_else(too_many)
    }

    /// Inserts evenly spaced points on every chord longer than the maximum.
    fn split_long_chords(&self, points: &[Location]) -> Option<Vec<Location>> {
        let (&first, rest) = points.split_first()?;
        let mut split = vec![first];
        let mut previous = first;
        for &point in rest {
            let pieces = sample_count(previous.distance(&point) / self.max_edge_length)? - 1;
            let step = (point - previous) * (1.0 / pieces.max(1) as f64);
            split.extend((1..pieces).map(|i| previous + step * i as f64));
            split.push(point);
            previous = point;
        }
        Some(split)
    }
}

/// Resamples `linestring` with default [Resampler] settings.
///
/// # Errors
/// See [Resampler::resample_linestring()].
///
/// # Panics
/// Panics if `max_edge_length` is not positive and finite.
pub fn resample_linestring(linestring: &[Location], max_edge_length: f64) -> Result<Vec<Location>> {
    Resampler::new(max_edge_length).resample_linestring(linestring)
}

// =#========================================================================#=
// HELPERS
// =#========================================================================#=
/// Arc-length parameterization of a polyline, with repeated points dropped
/// so that the knots are strictly increasing.
struct ArcLength {
    knots: Vec<f64>,
    values: Vec<Location>,
    total: f64,
}

impl ArcLength {
    fn of(first: Location, linestring: &[Location]) -> Self {
        let mut knots = vec![0.0];
        let mut values = vec![first];
        let mut total = 0.0;

        for pair in linestring.windows(2) {
            let step = pair[0].distance(&pair[1]);
            total += step;
            if step > 0.0 {
                knots.push(total);
                values.push(pair[1]);
            }
        }

        // Keep the exact end point even if it coincides with its predecessor
        if let (Some(end), Some(&last)) = (values.last_mut(), linestring.last()) {
            *end = last;
        }

        ArcLength { knots, values, total }
    }
}

/// Number of samples spanning `segments` chords (rounded up), or `None`
/// if that is not finite or beyond [MAX_SLAB_SAMPLES].
fn sample_count(segments: f64) -> Option<usize> {
    (segments.is_finite() && segments < (MAX_SLAB_SAMPLES - 1) as f64)
        .then(|| segments.ceil() as usize + 1)
}

fn sample_evenly(
    spline: &CubicSpline,
    total: f64,
    n_samples: usize,
    first: Location,
    last: Location,
) -> Vec<Location> {
    let step = total / (n_samples - 1) as f64;
    let mut samples = Vec::with_capacity(n_samples);
    samples.push(first);
    samples.extend((1..n_samples - 1).map(|i| spline.evaluate(step * i as f64)));
    samples.push(last);
    samples
}

fn longest_edge(samples: &[Location]) -> f64 {
    samples
        .windows(2)
        .map(|pair| pair[0].distance(&pair[1]))
        .fold(0.0, f64::max)
}
