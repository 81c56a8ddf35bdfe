use crate::error::{ensure, MatchingError, Result};
use crate::types::{BlossomLabel, EdgeIndex, Matching, Weight};

/// Log an algorithm step when this computation was asked to trace.
macro_rules! trace_step {
    ($data:expr, $($arg:tt)+) => {
        if $data.trace {
            ::log::debug!($($arg)+);
        }
    };
}

pub(crate) use trace_step;

/// The whole mutable state of one run of the blossom algorithm.
///
/// Ids `0..n_vertices` are vertices, ids `n_vertices..2 * n_vertices` are
/// blossoms. Every per-blossom table is indexed by both, a vertex being the
/// trivial blossom of itself.
pub(crate) struct BlossomData<'g, W> {
    pub(crate) graph: &'g EdgeIndex<W>,
    pub(crate) n_vertices: usize,
    pub(crate) trace: bool,

    // matching[v] is the remote endpoint of the edge matching v,
    // or None if v is single
    pub(crate) matching: Vec<Option<usize>>,

    // labels of vertices and top-level blossoms; a vertex inside an inner
    // blossom carries its own label only once it has been reached
    pub(crate) blossom_labels: Vec<BlossomLabel>,

    // if b is a top-level labeled blossom, label_endpoints[b] is the remote
    // endpoint of the edge through which b got its label (None for roots);
    // for a reached vertex inside an inner blossom, the edge through which
    // the vertex was reached
    pub(crate) label_endpoints: Vec<Option<usize>>,

    // top-level blossom containing each vertex
    pub(crate) blossom_id: Vec<usize>,

    pub(crate) blossom_parent: Vec<Option<usize>>,
    // children of a non-trivial blossom, listed around the cycle from the base
    pub(crate) blossom_children: Vec<Vec<usize>>,
    pub(crate) blossom_base: Vec<Option<usize>>,
    // blossom_endpoints[b][i] is the endpoint connecting child i to child i + 1,
    // seen from child i; the last entry closes the cycle back to the base
    pub(crate) blossom_endpoints: Vec<Vec<usize>>,

    // least-slack edge to an outer blossom, for free vertices and for
    // top-level outer blossoms
    pub(crate) best_edge: Vec<Option<usize>>,
    // for non-trivial top-level outer blossoms, the least-slack edge to each
    // neighboring outer blossom; None means "recompute from the leaves"
    pub(crate) blossom_best_edges: Vec<Option<Vec<usize>>>,

    pub(crate) unused_blossoms: Vec<usize>,

    // vertex duals u(v) followed by blossom duals z(b)
    pub(crate) dual_soln: Vec<W>,

    // allowed_edge[k] means edge k is known to be tight
    pub(crate) allowed_edge: Vec<bool>,

    // outer vertices whose edges still need scanning, popped last-in first-out
    pub(crate) stack: Vec<usize>,
}

/// Depth-first walk over the vertices nested inside a blossom.
pub(crate) struct BlossomLeaves<'a> {
    blossom_children: &'a [Vec<usize>],
    n_vertices: usize,
    single: Option<usize>,
    // (blossom, position of the next child to visit)
    branch_path: Vec<(usize, usize)>,
}

impl<'a> BlossomLeaves<'a> {
    pub(crate) fn new(blossom_children: &'a [Vec<usize>], n_vertices: usize, b: usize) -> Self {
        if b < n_vertices {
            BlossomLeaves {
                blossom_children,
                n_vertices,
                single: Some(b),
                branch_path: Vec::new(),
            }
        } else {
            let mut branch_path = Vec::with_capacity(8);
            branch_path.push((b, 0));
            BlossomLeaves {
                blossom_children,
                n_vertices,
                single: None,
                branch_path,
            }
        }
    }
}

impl<'a> Iterator for BlossomLeaves<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.single.take() {
            return Some(v);
        }
        while let Some(top) = self.branch_path.last_mut() {
            let (b, i) = *top;
            if i == self.blossom_children[b].len() {
                self.branch_path.pop();
                continue;
            }
            top.1 += 1;
            let child = self.blossom_children[b][i];
            if child < self.n_vertices {
                return Some(child);
            }
            self.branch_path.push((child, 0));
        }
        None
    }
}

impl<'g, W: Weight> BlossomData<'g, W> {
    pub(crate) fn new(graph: &'g EdgeIndex<W>, trace: bool) -> Self {
        let n_vertices = graph.n_vertices();
        let mut blossom_base: Vec<Option<usize>> = (0..n_vertices).map(Some).collect();
        blossom_base.resize(2 * n_vertices, None);
        let mut dual_soln = vec![graph.max_weight(); n_vertices];
        dual_soln.resize(2 * n_vertices, W::zero());
        BlossomData {
            graph,
            n_vertices,
            trace,
            matching: vec![None; n_vertices],
            blossom_labels: vec![BlossomLabel::Unlabeled; 2 * n_vertices],
            label_endpoints: vec![None; 2 * n_vertices],
            blossom_id: (0..n_vertices).collect(),
            blossom_parent: vec![None; 2 * n_vertices],
            blossom_children: vec![Vec::new(); 2 * n_vertices],
            blossom_base,
            blossom_endpoints: vec![Vec::new(); 2 * n_vertices],
            best_edge: vec![None; 2 * n_vertices],
            blossom_best_edges: vec![None; 2 * n_vertices],
            unused_blossoms: (n_vertices..2 * n_vertices).collect(),
            dual_soln,
            allowed_edge: vec![false; graph.n_edges()],
            stack: Vec::with_capacity(n_vertices),
        }
    }

    /// Forget the previous stage's search forest without reallocating.
    pub(crate) fn clear(&mut self) {
        self.blossom_labels.fill(BlossomLabel::Unlabeled);
        self.best_edge.fill(None);
        self.blossom_best_edges.fill(None);
        self.allowed_edge.fill(false);
        self.stack.clear();
    }

    /// `u(i) + u(j) - 2 w(i, j)`; blossom duals are not included.
    pub(crate) fn slack(&self, edge_idx: usize) -> W {
        let (i, j, w) = self.graph.edges[edge_idx];
        // |w| <= max / 8 and |u| <= max / 4, so this fits
        self.dual_soln[i] + self.dual_soln[j] - w - w
    }

    pub(crate) fn leaves(&self, b: usize) -> BlossomLeaves<'_> {
        BlossomLeaves::new(&self.blossom_children, self.n_vertices, b)
    }

    /// Label the top-level blossom containing `vertex`, reached through
    /// `endpoint`. Outer blossoms have their vertices queued for scanning;
    /// an inner blossom immediately labels the mate of its base as outer.
    pub(crate) fn assign_label(
        &mut self,
        vertex: usize,
        label: BlossomLabel,
        endpoint: Option<usize>,
    ) -> Result<()> {
        trace_step!(self, "assign_label({}, {:?}, {:?})", vertex, label, endpoint);
        let b = self.blossom_id[vertex];
        ensure!(
            self.blossom_labels[vertex] == BlossomLabel::Unlabeled
                && self.blossom_labels[b] == BlossomLabel::Unlabeled,
            MatchingError::AlreadyLabeled { vertex, blossom: b }
        );
        self.blossom_labels[vertex] = label;
        self.blossom_labels[b] = label;
        self.label_endpoints[vertex] = endpoint;
        self.label_endpoints[b] = endpoint;
        self.best_edge[vertex] = None;
        self.best_edge[b] = None;
        match label {
            BlossomLabel::Outer => {
                let pushed = self.stack.len();
                self.stack.extend(BlossomLeaves::new(
                    &self.blossom_children,
                    self.n_vertices,
                    b,
                ));
                trace_step!(self, "PUSH {:?}", &self.stack[pushed..]);
                Ok(())
            }
            BlossomLabel::Inner => {
                let base = self.blossom_base[b].ok_or(MatchingError::BrokenNesting {
                    blossom: b,
                    reason: "labeled blossom has no base",
                })?;
                let mate = self.matching[base]
                    .ok_or(MatchingError::UnmatchedBase { blossom: b, base })?;
                self.assign_label(self.graph.endpoint(mate), BlossomLabel::Outer, Some(mate ^ 1))
            }
            _ => Err(MatchingError::UnexpectedLabel {
                blossom: b,
                reason: "only outer and inner labels can be assigned",
            }),
        }
    }

    /// Scan the queued outer vertices until the queue is empty or an
    /// augmenting path has been applied. Returns whether the matching grew.
    pub(crate) fn scan_stack(&mut self) -> Result<bool> {
        let graph = self.graph;
        while let Some(v) = self.stack.pop() {
            trace_step!(self, "POP v={}", v);
            ensure!(
                self.blossom_labels[self.blossom_id[v]] == BlossomLabel::Outer,
                MatchingError::UnexpectedLabel {
                    blossom: self.blossom_id[v],
                    reason: "queued vertex is not in an outer blossom",
                }
            );

            for &p in graph.neighbors(v).iter() {
                let edge_idx = p / 2;
                let w = graph.endpoint(p);
                // edges inside one top-level blossom carry no information
                if self.blossom_id[v] == self.blossom_id[w] {
                    continue;
                }

                let mut edge_slack = None;
                if !self.allowed_edge[edge_idx] {
                    let s = self.slack(edge_idx);
                    if s <= W::zero() {
                        self.allowed_edge[edge_idx] = true;
                    }
                    edge_slack = Some(s);
                }

                let bw = self.blossom_id[w];
                let label = self.blossom_labels[bw];
                if self.allowed_edge[edge_idx] {
                    match label {
                        BlossomLabel::Unlabeled => {
                            // w is free or matched outside the forest: grow the tree
                            self.assign_label(w, BlossomLabel::Inner, Some(p ^ 1))?;
                        }
                        BlossomLabel::Outer => match self.scan_blossom(v, w)? {
                            Some(base) => self.add_blossom(base, edge_idx)?,
                            None => {
                                self.augment_matching(edge_idx)?;
                                return Ok(true);
                            }
                        },
                        _ if self.blossom_labels[w] == BlossomLabel::Unlabeled => {
                            // w sits inside an inner blossom and is reached for
                            // the first time; remember how, in case the blossom
                            // gets expanded later in this stage
                            ensure!(
                                label == BlossomLabel::Inner,
                                MatchingError::UnexpectedLabel {
                                    blossom: bw,
                                    reason: "reached vertex is not inside an inner blossom",
                                }
                            );
                            self.blossom_labels[w] = BlossomLabel::Inner;
                            self.label_endpoints[w] = Some(p ^ 1);
                        }
                        _ => (),
                    }
                } else if let Some(edge_slack) = edge_slack {
                    if label == BlossomLabel::Outer {
                        let b = self.blossom_id[v];
                        if self.best_edge[b].map_or(true, |e| edge_slack < self.slack(e)) {
                            self.best_edge[b] = Some(edge_idx);
                        }
                    } else if self.blossom_labels[w] == BlossomLabel::Unlabeled
                        && self.best_edge[w].map_or(true, |e| edge_slack < self.slack(e))
                    {
                        self.best_edge[w] = Some(edge_idx);
                    }
                }
            }
        }
        Ok(false)
    }

    /// Turn the endpoint-based mates into vertex mates and total the weight.
    pub(crate) fn into_matching(self) -> Result<Matching<W>> {
        let graph = self.graph;
        let mates: Vec<Option<usize>> = self
            .matching
            .iter()
            .map(|mate| mate.map(|p| graph.endpoint(p)))
            .collect();

        let mut weight = W::zero();
        for (v, mate) in mates.iter().enumerate() {
            let Some(u) = *mate else {
                continue;
            };
            ensure!(
                mates[u] == Some(v),
                MatchingError::AsymmetricMate { vertex: v, mate: u }
            );
            if v < u {
                if let Some(p) = self.matching[v] {
                    weight = weight
                        .checked_add(&graph.edges[p / 2].2)
                        .ok_or(MatchingError::DualOverflow("matching weight"))?;
                }
            }
        }
        Ok(Matching::new(mates, weight))
    }
}
