//! Contraction and expansion of blossoms.
//!
//! A blossom is an odd alternating cycle found while growing the search
//! forest. It is contracted into a fresh id from the pool, behaves as a single
//! outer vertex for the rest of the stage, and is expanded again once its dual
//! variable drops to zero.

use crate::blossom_data::{trace_step, BlossomData};
use crate::error::{ensure, MatchingError, Result};
use crate::types::{BlossomLabel, Weight};

/// Index into a blossom's cyclic child list, counting negative offsets from
/// the end.
pub(crate) fn cyclic(j: isize, len: usize) -> usize {
    j.rem_euclid(len as isize) as usize
}

impl<'g, W: Weight> BlossomData<'g, W> {
    /// Walk up the alternating trees of the outer vertices `v` and `w` in
    /// turn. Returns the base of the first blossom both paths share, or `None`
    /// if they end in different roots, i.e. an augmenting path was found.
    pub(crate) fn scan_blossom(&mut self, v: usize, w: usize) -> Result<Option<usize>> {
        trace_step!(self, "scan_blossom({}, {})", v, w);
        let mut path = Vec::new();
        let mut base = None;
        let (mut v, mut w) = (Some(v), Some(w));
        while let Some(x) = v {
            let b = self.blossom_id[x];
            if self.blossom_labels[b] == BlossomLabel::Visited {
                base = self.blossom_base[b];
                break;
            }
            ensure!(
                self.blossom_labels[b] == BlossomLabel::Outer,
                MatchingError::UnexpectedLabel {
                    blossom: b,
                    reason: "tree path passes a non-outer blossom",
                }
            );
            path.push(b);
            self.blossom_labels[b] = BlossomLabel::Visited;
            ensure!(
                self.label_endpoints[b] == self.base_mate(b),
                MatchingError::UnexpectedLabel {
                    blossom: b,
                    reason: "outer blossom was not reached through its base's mate",
                }
            );
            v = match self.label_endpoints[b] {
                // reached a root
                None => None,
                Some(p) => {
                    let t = self.graph.endpoint(p);
                    let bt = self.blossom_id[t];
                    ensure!(
                        self.blossom_labels[bt] == BlossomLabel::Inner,
                        MatchingError::UnexpectedLabel {
                            blossom: bt,
                            reason: "mate of an outer base is not inner",
                        }
                    );
                    let q = self.label_endpoints[bt]
                        .ok_or(MatchingError::MissingLabelEnd { blossom: bt })?;
                    Some(self.graph.endpoint(q))
                }
            };
            // alternate between both paths
            if w.is_some() {
                std::mem::swap(&mut v, &mut w);
            }
        }

        for b in path {
            self.blossom_labels[b] = BlossomLabel::Outer;
        }
        Ok(base)
    }

    /// Contract the odd cycle closed by edge `edge_idx` whose sides meet at
    /// vertex `base` into a new outer blossom.
    pub(crate) fn add_blossom(&mut self, base: usize, edge_idx: usize) -> Result<()> {
        let graph = self.graph;
        let (mut v, mut w, _) = graph.edges[edge_idx];
        let bb = self.blossom_id[base];
        let mut bv = self.blossom_id[v];
        let mut bw = self.blossom_id[w];
        let b = self
            .unused_blossoms
            .pop()
            .ok_or(MatchingError::BlossomPoolExhausted)?;
        trace_step!(
            self,
            "add_blossom({}, {}) (v={} w={}) -> {}",
            base,
            edge_idx,
            v,
            w,
            b
        );

        self.blossom_base[b] = Some(base);
        self.blossom_parent[b] = None;
        self.blossom_parent[bb] = Some(b);

        // trace back from v to the base
        let mut children = Vec::new();
        let mut endpoints = Vec::new();
        while bv != bb {
            self.blossom_parent[bv] = Some(b);
            children.push(bv);
            let p = self.cycle_link(bv)?;
            endpoints.push(p);
            v = graph.endpoint(p);
            bv = self.blossom_id[v];
        }

        // the cycle starts at the base and runs through v's side first
        children.push(bb);
        children.reverse();
        endpoints.reverse();
        endpoints.push(2 * edge_idx);

        // then back from w to the base
        while bw != bb {
            self.blossom_parent[bw] = Some(b);
            children.push(bw);
            let p = self.cycle_link(bw)?;
            endpoints.push(p ^ 1);
            w = graph.endpoint(p);
            bw = self.blossom_id[w];
        }

        ensure!(
            self.blossom_labels[bb] == BlossomLabel::Outer,
            MatchingError::UnexpectedLabel {
                blossom: bb,
                reason: "blossom base is not outer",
            }
        );
        self.blossom_labels[b] = BlossomLabel::Outer;
        self.label_endpoints[b] = self.label_endpoints[bb];
        self.dual_soln[b] = W::zero();
        self.blossom_children[b] = children;
        self.blossom_endpoints[b] = endpoints;

        // formerly inner vertices become outer and need scanning
        let leaves: Vec<usize> = self.leaves(b).collect();
        for leaf in leaves {
            if self.blossom_labels[self.blossom_id[leaf]] == BlossomLabel::Inner {
                self.stack.push(leaf);
            }
            self.blossom_id[leaf] = b;
        }

        // merge the children's least-slack edges to other outer blossoms
        let mut best_edge_to: Vec<Option<usize>> = vec![None; 2 * self.n_vertices];
        for c in 0..self.blossom_children[b].len() {
            let child = self.blossom_children[b][c];
            let candidates: Vec<usize> = match self.blossom_best_edges[child].take() {
                Some(edges) => edges,
                None => self
                    .leaves(child)
                    .flat_map(move |leaf| graph.neighbors(leaf).iter().map(|p| p / 2))
                    .collect(),
            };
            for k in candidates {
                let (i, j, _) = graph.edges[k];
                let j = if self.blossom_id[j] == b { i } else { j };
                let bj = self.blossom_id[j];
                if bj != b
                    && self.blossom_labels[bj] == BlossomLabel::Outer
                    && best_edge_to[bj].map_or(true, |e| self.slack(k) < self.slack(e))
                {
                    best_edge_to[bj] = Some(k);
                }
            }
            self.best_edge[child] = None;
        }
        let best_edges: Vec<usize> = best_edge_to.into_iter().flatten().collect();
        let best = best_edges.iter().copied().min_by_key(|&k| self.slack(k));
        self.best_edge[b] = best;
        self.blossom_best_edges[b] = Some(best_edges);

        trace_step!(self, "blossom_children[{}]={:?}", b, self.blossom_children[b]);
        Ok(())
    }

    /// Dissolve blossom `blossom_id`, whose dual is zero. At the end of a
    /// stage zero-dual sub-blossoms are dissolved as well; in the middle of a
    /// stage an inner blossom passes its label on to the children on the even
    /// path from the entry child to the base.
    pub(crate) fn expand_blossom(&mut self, blossom_id: usize, endstage: bool) -> Result<()> {
        trace_step!(
            self,
            "expand_blossom({}, {}) {:?}",
            blossom_id,
            endstage,
            self.blossom_children[blossom_id]
        );
        let children = self.blossom_children[blossom_id].clone();
        for &c in children.iter() {
            self.blossom_parent[c] = None;
            if c < self.n_vertices {
                self.blossom_id[c] = c;
            } else if endstage && self.dual_soln[c] == W::zero() {
                self.expand_blossom(c, endstage)?;
            } else {
                let leaves: Vec<usize> = self.leaves(c).collect();
                for v in leaves {
                    self.blossom_id[v] = c;
                }
            }
        }

        if !endstage && self.blossom_labels[blossom_id] == BlossomLabel::Inner {
            self.relabel_expanded(blossom_id, &children)?;
        }

        // recycle the blossom id
        self.blossom_labels[blossom_id] = BlossomLabel::Unlabeled;
        self.label_endpoints[blossom_id] = None;
        self.blossom_children[blossom_id].clear();
        self.blossom_endpoints[blossom_id].clear();
        self.blossom_base[blossom_id] = None;
        self.best_edge[blossom_id] = None;
        self.blossom_best_edges[blossom_id] = None;
        self.unused_blossoms.push(blossom_id);
        Ok(())
    }

    // Walk from the entry child to the base along the even-length side of the
    // cycle, labeling it as an alternating path, then clean up the labels of
    // the children on the other side.
    fn relabel_expanded(&mut self, blossom_id: usize, children: &[usize]) -> Result<()> {
        let endpoints = self.blossom_endpoints[blossom_id].clone();
        let len = children.len();
        let entry_endpoint = self.label_endpoints[blossom_id]
            .ok_or(MatchingError::MissingLabelEnd { blossom: blossom_id })?;
        let entry_child = self.blossom_id[self.graph.endpoint(entry_endpoint ^ 1)];
        let (mut j, jstep, endptrick) = self.walk_direction(blossom_id, entry_child)?;

        let mut p = entry_endpoint;
        while j != 0 {
            // relabel the inner sub-blossom
            let q = endpoints[cyclic(j - endptrick as isize, len)];
            self.blossom_labels[self.graph.endpoint(p ^ 1)] = BlossomLabel::Unlabeled;
            self.blossom_labels[self.graph.endpoint(q ^ endptrick ^ 1)] = BlossomLabel::Unlabeled;
            self.assign_label(self.graph.endpoint(p ^ 1), BlossomLabel::Inner, Some(p))?;
            // the edge to the next outer sub-blossom is tight
            self.allowed_edge[q / 2] = true;
            j += jstep;
            p = endpoints[cyclic(j - endptrick as isize, len)] ^ endptrick;
            // and so is the edge to the next inner sub-blossom
            self.allowed_edge[p / 2] = true;
            j += jstep;
        }

        // the base child becomes inner without labeling its mate, which is
        // already labeled through the blossom
        let bv = children[cyclic(j, len)];
        let t = self.graph.endpoint(p ^ 1);
        self.blossom_labels[t] = BlossomLabel::Inner;
        self.blossom_labels[bv] = BlossomLabel::Inner;
        self.label_endpoints[t] = Some(p);
        self.label_endpoints[bv] = Some(p);
        self.best_edge[bv] = None;
        j += jstep;

        // children on the odd side may have been reached from outside;
        // those become inner blossoms of their own
        while children[cyclic(j, len)] != entry_child {
            let bv = children[cyclic(j, len)];
            if self.blossom_labels[bv] == BlossomLabel::Outer {
                // already labeled through the even side
                j += jstep;
                continue;
            }
            let reached = self
                .leaves(bv)
                .find(|&v| self.blossom_labels[v] != BlossomLabel::Unlabeled);
            if let Some(v) = reached {
                ensure!(
                    self.blossom_labels[v] == BlossomLabel::Inner,
                    MatchingError::UnexpectedLabel {
                        blossom: v,
                        reason: "reached vertex of an expanded blossom is not inner",
                    }
                );
                ensure!(
                    self.blossom_id[v] == bv,
                    MatchingError::BrokenNesting {
                        blossom: bv,
                        reason: "reached vertex is not inside its sub-blossom",
                    }
                );
                self.blossom_labels[v] = BlossomLabel::Unlabeled;
                let base = self.blossom_base[bv].ok_or(MatchingError::BrokenNesting {
                    blossom: bv,
                    reason: "sub-blossom has no base",
                })?;
                let mate = self.matching[base]
                    .ok_or(MatchingError::UnmatchedBase { blossom: bv, base })?;
                self.blossom_labels[self.graph.endpoint(mate)] = BlossomLabel::Unlabeled;
                self.assign_label(v, BlossomLabel::Inner, self.label_endpoints[v])?;
            }
            j += jstep;
        }
        Ok(())
    }

    /// Starting position and direction for walking from `child` to the base
    /// of `blossom_id` along the even-length side of the cycle. An odd
    /// position goes forward (wrapping past the end), an even one backward;
    /// going backward the connecting endpoints are read one slot earlier and
    /// from the other side.
    pub(crate) fn walk_direction(
        &self,
        blossom_id: usize,
        child: usize,
    ) -> Result<(isize, isize, usize)> {
        let children = &self.blossom_children[blossom_id];
        let i = children
            .iter()
            .position(|&c| c == child)
            .ok_or(MatchingError::BrokenNesting {
                blossom: blossom_id,
                reason: "child not found in blossom",
            })?;
        if i & 1 == 1 {
            Ok((i as isize - children.len() as isize, 1, 0))
        } else {
            Ok((i as isize, -1, 1))
        }
    }

    /// Endpoint through which sub-blossom `bv` links towards the base of the
    /// blossom being formed.
    fn cycle_link(&self, bv: usize) -> Result<usize> {
        let label = self.blossom_labels[bv];
        ensure!(
            label == BlossomLabel::Inner
                || (label == BlossomLabel::Outer && self.label_endpoints[bv] == self.base_mate(bv)),
            MatchingError::UnexpectedLabel {
                blossom: bv,
                reason: "cycle member is neither inner nor outer through its mate",
            }
        );
        self.label_endpoints[bv].ok_or(MatchingError::MissingLabelEnd { blossom: bv })
    }

    /// Mate endpoint of the base of blossom `b`.
    pub(crate) fn base_mate(&self, b: usize) -> Option<usize> {
        self.blossom_base[b].and_then(|base| self.matching[base])
    }

    /// Top-level outer blossoms whose dual reached zero are expanded at the
    /// end of every stage.
    pub(crate) fn s_blossom_is_tight(&self, b: usize) -> bool {
        self.blossom_parent[b].is_none()
            && self.blossom_base[b].is_some()
            && self.blossom_labels[b] == BlossomLabel::Outer
            && self.dual_soln[b] == W::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeIndex;

    #[test]
    fn cyclic_wraps_negative_offsets() {
        assert_eq!(cyclic(0, 5), 0);
        assert_eq!(cyclic(3, 5), 3);
        assert_eq!(cyclic(-1, 5), 4);
        assert_eq!(cyclic(-5, 5), 0);
        assert_eq!(cyclic(5, 5), 0);
    }

    // Triangle 0-1-2 with all vertices free and outer; edge 1 (1-2) closes it.
    fn labeled_triangle(graph: &EdgeIndex<i64>) -> BlossomData<'_, i64> {
        let mut data = BlossomData::new(graph, false);
        // 0 and 1 matched through edge 0, vertex 2 free
        data.matching[0] = Some(1);
        data.matching[1] = Some(0);
        data.assign_label(2, BlossomLabel::Outer, None).unwrap();
        // 2 reaches 0 over edge 2 (endpoints 4: vertex 2, 5: vertex 0)
        data.assign_label(0, BlossomLabel::Inner, Some(4)).unwrap();
        data.stack.clear();
        data
    }

    #[test]
    fn scan_finds_common_base() {
        let graph = EdgeIndex::new(&[(0, 1, 5i64), (1, 2, 5), (2, 0, 5)]).unwrap();
        let mut data = labeled_triangle(&graph);
        assert_eq!(data.scan_blossom(1, 2).unwrap(), Some(2));
        // breadcrumbs are removed
        assert_eq!(data.blossom_labels[1], BlossomLabel::Outer);
        assert_eq!(data.blossom_labels[2], BlossomLabel::Outer);
    }

    #[test]
    fn scan_between_roots_finds_augmenting_path() {
        let graph = EdgeIndex::new(&[(0, 1, 5i64)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.assign_label(1, BlossomLabel::Outer, None).unwrap();
        assert_eq!(data.scan_blossom(0, 1).unwrap(), None);
    }

    #[test]
    fn add_then_expand_restores_vertices() {
        let graph = EdgeIndex::new(&[(0, 1, 5i64), (1, 2, 5), (2, 0, 5)]).unwrap();
        let mut data = labeled_triangle(&graph);
        data.add_blossom(2, 1).unwrap();
        let b = 5;
        assert_eq!(data.blossom_base[b], Some(2));
        assert_eq!(data.blossom_children[b], vec![2, 0, 1]);
        // child i's end of the edge leading to child i + 1
        assert_eq!(data.blossom_endpoints[b], vec![4, 0, 2]);
        assert!(data.blossom_id.iter().all(|&id| id == b));
        assert_eq!(data.blossom_labels[b], BlossomLabel::Outer);
        // the inner vertex 0 is now outer and queued
        assert_eq!(data.stack, vec![0]);
        assert_eq!(data.leaves(b).collect::<Vec<_>>(), vec![2, 0, 1]);

        data.expand_blossom(b, true).unwrap();
        assert_eq!(data.blossom_id, vec![0, 1, 2]);
        assert_eq!(data.blossom_parent[..3], [None, None, None]);
        assert_eq!(data.blossom_base[b], None);
        assert!(data.blossom_children[b].is_empty());
        assert_eq!(data.unused_blossoms.last(), Some(&b));
    }

    #[test]
    fn walk_direction_depends_on_parity() {
        let graph = EdgeIndex::new(&[(0, 1, 5i64), (1, 2, 5), (2, 0, 5)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.blossom_children[4] = vec![2, 0, 1];
        assert_eq!(data.walk_direction(4, 0).unwrap(), (-2, 1, 0));
        assert_eq!(data.walk_direction(4, 1).unwrap(), (2, -1, 1));
        assert!(data.walk_direction(4, 7).is_err());
    }
}
