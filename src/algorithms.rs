use crate::blossom_data::{trace_step, BlossomData};
use crate::error::{MatchingError, Result};
use crate::options::MatchingOptions;
use crate::types::{check_weights, BlossomLabel, Edge, EdgeIndex, Matching, Weight};

/// Edmonds' blossom algorithm for maximum weight matchings in general graphs.
///
/// Runs in O(n^3) time for n vertices. Each instance carries its own
/// [`MatchingOptions`], so independent instances never influence each other.
///
/// ```
/// use blossom_matching::MaximumWeightMatching;
///
/// let edges = [(1, 2, 10i64), (2, 3, 11)];
/// let matching = MaximumWeightMatching::new().solve(&edges).unwrap();
/// assert_eq!(matching.pairs(), vec![(2, 3)]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaximumWeightMatching {
    options: MatchingOptions,
}

impl MaximumWeightMatching {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MatchingOptions) -> Self {
        MaximumWeightMatching { options }
    }

    /// Only accept matchings of maximum cardinality.
    pub fn max_cardinality(mut self, max_cardinality: bool) -> Self {
        self.options.max_cardinality = max_cardinality;
        self
    }

    /// Log each algorithm step at `debug` level.
    pub fn trace(mut self, trace: bool) -> Self {
        self.options.trace = trace;
        self
    }

    /// Check the dual certificate before returning.
    pub fn verify_optimum(mut self, verify_optimum: bool) -> Self {
        self.options.verify_optimum = verify_optimum;
        self
    }

    pub fn options(&self) -> &MatchingOptions {
        &self.options
    }

    /// Compute a maximum weight matching of the graph given by
    /// `weighted_edges`, a list of `(u, v, w)` triples.
    ///
    /// Vertices are `0..n` where n is one past the largest vertex of any
    /// non-loop edge. Self-loops never take part in a matching. Duplicate
    /// edges are the caller's responsibility.
    ///
    /// Weights must stay within [`weight_limit`](crate::types::weight_limit),
    /// and in max-cardinality mode the duals must also fit the weight type.
    /// Any other error means an internal invariant broke. Either way no
    /// matching is produced.
    pub fn solve<W: Weight>(&self, weighted_edges: &[Edge<W>]) -> Result<Matching<W>> {
        let graph = EdgeIndex::new(weighted_edges)?;
        let n_vertices = graph.n_vertices();
        if n_vertices == 0 {
            return Ok(Matching::empty());
        }
        let max_cardinality = self.options.max_cardinality;

        // this data structure holds the entire state of the blossom algorithm:
        // the matching, the dual solution, and a forest whose leaves are
        // vertices, nodes sharing a parent when they lie on one odd cycle
        let mut blossom_data = BlossomData::new(&graph, self.options.trace);

        // every stage but the last grows the matching by one edge, so this is
        // only an upper bound and the loop normally breaks out much earlier
        for stage in 0..n_vertices {
            trace_step!(blossom_data, "STAGE {}", stage);
            // forget the previous search forest without reallocating
            blossom_data.clear();

            // every single vertex is the root of a tree
            for v in 0..n_vertices {
                if blossom_data.matching[v].is_none()
                    && blossom_data.blossom_labels[blossom_data.blossom_id[v]]
                        == BlossomLabel::Unlabeled
                {
                    blossom_data.assign_label(v, BlossomLabel::Outer, None)?;
                }
            }

            // grow the forest, updating the duals whenever it gets stuck,
            // until an augmenting path shows up or the duals prove optimality
            let augmented = loop {
                trace_step!(blossom_data, "SUBSTAGE");
                if blossom_data.scan_stack()? {
                    break true;
                }
                let (delta, update_mode) =
                    blossom_data.determine_delta_and_update_mode(max_cardinality)?;
                blossom_data.update_dual_soln(delta)?;
                if blossom_data.update_blossom_structure(update_mode)? {
                    break false;
                }
            };

            // a stage without augmentation means the matching is optimal
            if !augmented {
                break;
            }

            // end of this stage, expand the outer blossoms whose dual is zero
            for b in n_vertices..2 * n_vertices {
                if blossom_data.s_blossom_is_tight(b) {
                    blossom_data.expand_blossom(b, true)?;
                }
            }
        }

        if self.options.verify_optimum {
            blossom_data.verify_optimum(max_cardinality)?;
        }

        blossom_data.into_matching()
    }
}

/// Compute a maximum weight matching and return it as a list of pairs
/// `(u, v)` with `u < v`, ordered by `u`.
///
/// If `max_cardinality` is true, only matchings of maximum cardinality are
/// considered, and the heaviest of those is returned.
pub fn max_weight_matching<W: Weight>(
    weighted_edges: &[Edge<W>],
    max_cardinality: bool,
) -> Result<Vec<(usize, usize)>> {
    let matching = MaximumWeightMatching::new()
        .max_cardinality(max_cardinality)
        .solve(weighted_edges)?;
    Ok(matching.pairs())
}

/// Same as [`max_weight_matching`], but returns the mate of every vertex:
/// vertex `v` is matched to `mates[v]`, or single if it is `None`.
pub fn max_weight_mates<W: Weight>(
    weighted_edges: &[Edge<W>],
    max_cardinality: bool,
) -> Result<Vec<Option<usize>>> {
    let matching = MaximumWeightMatching::new()
        .max_cardinality(max_cardinality)
        .solve(weighted_edges)?;
    Ok(matching.into_mates())
}

/// Call the blossom algorithm on negated weights to get a minimum weight
/// matching among those of maximum cardinality.
///
/// The returned matching's weight is expressed in the original weights.
pub fn min_weight_max_cardinality_matching<W: Weight>(
    weighted_edges: &[Edge<W>],
) -> Result<Matching<W>> {
    // the accepted range is symmetric, so checked weights negate safely
    check_weights(weighted_edges)?;
    let negated: Vec<Edge<W>> = weighted_edges.iter().map(|&(i, j, w)| (i, j, -w)).collect();
    let matching = MaximumWeightMatching::new()
        .max_cardinality(true)
        .solve(&negated)?;
    let weight = W::zero()
        .checked_sub(&matching.weight())
        .ok_or(MatchingError::DualOverflow("matching weight"))?;
    Ok(Matching::new(matching.into_mates(), weight))
}
