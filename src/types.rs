use std::fmt::{Debug, Display};

use num::{Integer, PrimInt, Signed};
use serde::{Deserialize, Serialize};

use crate::error::{MatchingError, Result};

/// An undirected edge `(u, v, w)` between vertices u and v with weight w.
pub type Edge<W> = (usize, usize, W);

/// Integer edge weights. Dual variables are kept in the same type, so all
/// arithmetic stays exact.
///
/// Every weight must lie within `-W::max_value() / 8 ..= W::max_value() / 8`
/// (see [`weight_limit`]). Vertex duals start at the largest weight and may
/// reach twice that, and an edge's slack adds two duals and subtracts the
/// weight twice, so this keeps every slack inside `W`. Larger weights are
/// rejected with [`MatchingError::WeightOutOfRange`].
///
/// In max-cardinality mode duals can drift further, growing with the number
/// of vertices. A vertex dual update that would leave
/// `-W::max_value() / 4 ..= W::max_value() / 4` fails with
/// [`MatchingError::DualOverflow`] instead of wrapping. Pick a type with room
/// to spare, such as `i64`, for large graphs.
pub trait Weight: PrimInt + Signed + Integer + Debug + Display {}

impl<T> Weight for T where T: PrimInt + Signed + Integer + Debug + Display {}

/// The largest absolute weight the engine accepts for `W`.
pub fn weight_limit<W: Weight>() -> W {
    dual_limit::<W>() / (W::one() + W::one())
}

/// The largest absolute vertex dual, twice [`weight_limit`].
pub(crate) fn dual_limit<W: Weight>() -> W {
    let four = W::one() + W::one() + W::one() + W::one();
    W::max_value() / four
}

/// Check that every weight is within [`weight_limit`].
pub(crate) fn check_weights<W: Weight>(weighted_edges: &[Edge<W>]) -> Result<()> {
    let limit = weight_limit::<W>();
    match weighted_edges
        .iter()
        .position(|&(_, _, w)| w > limit || w < -limit)
    {
        Some(edge) => Err(MatchingError::WeightOutOfRange { edge }),
        None => Ok(()),
    }
}

/// Role of a vertex or top-level blossom in the current stage's search forest.
///
/// Outer (S) vertices sit at even distance from a tree root, inner (T) vertices
/// at odd distance. `Visited` only exists while `scan_blossom` walks the trees.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub(crate) enum BlossomLabel {
    #[default]
    Unlabeled,
    Outer,
    Inner,
    Visited,
}

/// Half-edge view of an edge list.
///
/// Edge `k` owns the endpoints `2k` (its first vertex) and `2k + 1` (its second
/// vertex), so `p ^ 1` is the opposite end of endpoint `p` and `p / 2` its edge.
#[derive(Debug, Clone)]
pub struct EdgeIndex<W> {
    pub(crate) edges: Vec<Edge<W>>,
    pub(crate) n_vertices: usize,
    // endpoints[p] is the vertex at endpoint p
    pub(crate) endpoints: Vec<usize>,
    // for each vertex, the remote endpoints of its incident edges
    pub(crate) neighborhood_endpoints: Vec<Vec<usize>>,
    pub(crate) max_weight: W,
}

impl<W: Weight> EdgeIndex<W> {
    /// Index `weighted_edges`. Vertices are numbered `0..n` where n is one past
    /// the largest vertex of a non-loop edge; self-loops keep their edge slot
    /// but are never scanned.
    ///
    /// Fails if a weight, self-loops included, is outside [`weight_limit`].
    pub fn new(weighted_edges: &[Edge<W>]) -> Result<Self> {
        check_weights(weighted_edges)?;

        let mut n_vertices = 0;
        let mut max_weight = W::zero();
        for &(i, j, w) in weighted_edges.iter() {
            if i != j {
                n_vertices = n_vertices.max(i + 1).max(j + 1);
            }
            if w > max_weight {
                max_weight = w;
            }
        }

        let mut endpoints = Vec::with_capacity(2 * weighted_edges.len());
        for &(i, j, _) in weighted_edges.iter() {
            endpoints.push(i);
            endpoints.push(j);
        }

        let mut neighborhood_endpoints = vec![Vec::new(); n_vertices];
        for (k, &(i, j, _)) in weighted_edges.iter().enumerate() {
            if i == j {
                continue;
            }
            neighborhood_endpoints[i].push(2 * k + 1);
            neighborhood_endpoints[j].push(2 * k);
        }

        Ok(EdgeIndex {
            edges: weighted_edges.to_vec(),
            n_vertices,
            endpoints,
            neighborhood_endpoints,
            max_weight,
        })
    }

    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    pub(crate) fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// The larger of zero and the heaviest edge weight; every vertex dual
    /// starts here so that no edge begins with negative slack.
    pub fn max_weight(&self) -> W {
        self.max_weight
    }

    /// Remote endpoints of the edges incident to `v`.
    pub(crate) fn neighbors(&self, v: usize) -> &[usize] {
        &self.neighborhood_endpoints[v]
    }

    /// The vertex at endpoint `p`.
    pub(crate) fn endpoint(&self, p: usize) -> usize {
        self.endpoints[p]
    }
}

/// A matching over vertices `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matching<W> {
    mates: Vec<Option<usize>>,
    weight: W,
}

impl<W: Weight> Matching<W> {
    pub(crate) fn new(mates: Vec<Option<usize>>, weight: W) -> Self {
        Matching { mates, weight }
    }

    pub fn empty() -> Self {
        Matching {
            mates: Vec::new(),
            weight: W::zero(),
        }
    }

    /// `mates()[v]` is the vertex matched to v, or `None` if v is single.
    pub fn mates(&self) -> &[Option<usize>] {
        &self.mates
    }

    pub fn into_mates(self) -> Vec<Option<usize>> {
        self.mates
    }

    pub fn partner(&self, v: usize) -> Option<usize> {
        self.mates.get(v).copied().flatten()
    }

    pub fn n_vertices(&self) -> usize {
        self.mates.len()
    }

    /// Each matched edge once, as `(u, v)` with `u < v`, ordered by `u`.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.mates
            .iter()
            .enumerate()
            .filter_map(|(v, mate)| match *mate {
                Some(u) if v < u => Some((v, u)),
                _ => None,
            })
            .collect()
    }

    pub fn cardinality(&self) -> usize {
        self.mates.iter().filter(|m| m.is_some()).count() / 2
    }

    /// Total weight of the matched edges.
    pub fn weight(&self) -> W {
        self.weight
    }
}
