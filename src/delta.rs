use crate::blossom_data::{trace_step, BlossomData};
use crate::error::{ensure, MatchingError, Result};
use crate::types::{dual_limit, BlossomLabel, Weight};

/// The dual update chosen for a substage, named after what limits it.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(crate) enum UpdateMode {
    /// Type 1: a vertex dual reaches zero; no further improvement possible.
    Vertex,
    /// Type 2: the edge from an outer vertex to a free vertex becomes tight.
    SVertexFreeVertex(usize),
    /// Type 3: the edge between two outer blossoms becomes tight.
    SBlossom(usize),
    /// Type 4: the dual of an inner blossom reaches zero.
    TBlossom(usize),
}

impl UpdateMode {
    fn delta_type(self) -> u8 {
        match self {
            UpdateMode::Vertex => 1,
            UpdateMode::SVertexFreeVertex(_) => 2,
            UpdateMode::SBlossom(_) => 3,
            UpdateMode::TBlossom(_) => 4,
        }
    }
}

// keep the first candidate among equals, so that types are preferred in order
fn offer<W: Weight>(best: &mut Option<(W, UpdateMode)>, delta: W, mode: UpdateMode) {
    if best.map_or(true, |(d, _)| delta < d) {
        *best = Some((delta, mode));
    }
}

impl<'g, W: Weight> BlossomData<'g, W> {
    fn compute_delta_vertices(&self) -> Option<W> {
        self.dual_soln[..self.n_vertices].iter().copied().min()
    }

    fn compute_delta_s_vertex_free_vertex(&self, best: &mut Option<(W, UpdateMode)>) {
        for v in 0..self.n_vertices {
            if self.blossom_labels[self.blossom_id[v]] != BlossomLabel::Unlabeled {
                continue;
            }
            if let Some(k) = self.best_edge[v] {
                offer(best, self.slack(k), UpdateMode::SVertexFreeVertex(k));
            }
        }
    }

    fn compute_delta_s_blossoms(&self, best: &mut Option<(W, UpdateMode)>) -> Result<()> {
        for b in 0..2 * self.n_vertices {
            if self.blossom_parent[b].is_some() || self.blossom_labels[b] != BlossomLabel::Outer {
                continue;
            }
            if let Some(k) = self.best_edge[b] {
                let slack = self.slack(k);
                ensure!(slack.is_even(), MatchingError::OddSlack { edge: k });
                offer(best, slack / (W::one() + W::one()), UpdateMode::SBlossom(k));
            }
        }
        Ok(())
    }

    fn compute_delta_t_blossoms(&self, best: &mut Option<(W, UpdateMode)>) {
        for b in self.n_vertices..2 * self.n_vertices {
            if self.blossom_base[b].is_some()
                && self.blossom_parent[b].is_none()
                && self.blossom_labels[b] == BlossomLabel::Inner
            {
                offer(best, self.dual_soln[b], UpdateMode::TBlossom(b));
            }
        }
    }

    /// Pick the largest dual change that keeps every dual constraint
    /// satisfied, and what it will unlock.
    pub(crate) fn determine_delta_and_update_mode(
        &self,
        max_cardinality: bool,
    ) -> Result<(W, UpdateMode)> {
        let mut best = None;
        if !max_cardinality {
            if let Some(d) = self.compute_delta_vertices() {
                offer(&mut best, d, UpdateMode::Vertex);
            }
        }
        self.compute_delta_s_vertex_free_vertex(&mut best);
        self.compute_delta_s_blossoms(&mut best)?;
        self.compute_delta_t_blossoms(&mut best);

        let (delta, mode) = match best {
            Some(found) => found,
            None => {
                // no further improvement possible; the max-cardinality optimum
                // is reached, do a final update so the optimum is verifiable
                ensure!(max_cardinality, MatchingError::NoDeltaCandidate);
                let largest = self.dual_soln[..self.n_vertices]
                    .iter()
                    .copied()
                    .fold(W::zero(), W::max);
                (largest, UpdateMode::Vertex)
            }
        };
        trace_step!(self, "delta{}={}", mode.delta_type(), delta);
        Ok((delta, mode))
    }

    pub(crate) fn update_dual_soln(&mut self, delta: W) -> Result<()> {
        // the dual solution starts by satisfying the constraints
        // 1) every slack and every vertex dual is non-negative
        // 2) matched edges and edges inside blossoms have zero slack
        // 3) blossoms with positive dual are full
        // and every update preserves them while moving towards
        // 4) single vertices have zero dual
        for v in 0..self.n_vertices {
            let dual = match self.blossom_labels[self.blossom_id[v]] {
                BlossomLabel::Outer => self.dual_soln[v].checked_sub(&delta),
                BlossomLabel::Inner => self.dual_soln[v].checked_add(&delta),
                _ => continue,
            };
            self.dual_soln[v] = bounded_dual(dual, "vertex dual")?;
        }
        for b in self.n_vertices..2 * self.n_vertices {
            if self.blossom_base[b].is_none() || self.blossom_parent[b].is_some() {
                continue;
            }
            // blossom duals never enter a slack, they only need to fit
            let dual = match self.blossom_labels[b] {
                BlossomLabel::Outer => self.dual_soln[b].checked_add(&delta),
                BlossomLabel::Inner => self.dual_soln[b].checked_sub(&delta),
                _ => continue,
            };
            self.dual_soln[b] = dual.ok_or(MatchingError::DualOverflow("blossom dual"))?;
        }
        Ok(())
    }

    /// Act on the chosen update. Returns true when the stage is over without
    /// an augmenting path.
    pub(crate) fn update_blossom_structure(&mut self, mode: UpdateMode) -> Result<bool> {
        match mode {
            UpdateMode::Vertex => return Ok(true),
            UpdateMode::SVertexFreeVertex(edge_idx) => {
                self.allowed_edge[edge_idx] = true;
                let (mut i, j, _) = self.graph.edges[edge_idx];
                if self.blossom_labels[self.blossom_id[i]] == BlossomLabel::Unlabeled {
                    i = j;
                }
                self.queue_outer(i)?;
            }
            UpdateMode::SBlossom(edge_idx) => {
                self.allowed_edge[edge_idx] = true;
                let (i, _, _) = self.graph.edges[edge_idx];
                self.queue_outer(i)?;
            }
            UpdateMode::TBlossom(b) => self.expand_blossom(b, false)?,
        }
        Ok(false)
    }

    fn queue_outer(&mut self, v: usize) -> Result<()> {
        ensure!(
            self.blossom_labels[self.blossom_id[v]] == BlossomLabel::Outer,
            MatchingError::UnexpectedLabel {
                blossom: self.blossom_id[v],
                reason: "newly tight edge has no outer end",
            }
        );
        self.stack.push(v);
        Ok(())
    }
}

/// Accept an updated vertex dual only within [`dual_limit`], which keeps
/// every slack computation inside the weight type.
fn bounded_dual<W: Weight>(dual: Option<W>, what: &'static str) -> Result<W> {
    let limit = dual_limit::<W>();
    match dual {
        Some(d) if d <= limit && d >= -limit => Ok(d),
        _ => Err(MatchingError::DualOverflow(what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeIndex;

    #[test]
    fn vertex_delta_without_max_cardinality() {
        let graph = EdgeIndex::new(&[(0, 1, 4i64), (1, 2, 6)]).unwrap();
        let data = BlossomData::new(&graph, false);
        let (delta, mode) = data.determine_delta_and_update_mode(false).unwrap();
        assert_eq!((delta, mode), (6, UpdateMode::Vertex));
    }

    #[test]
    fn free_vertex_edge_is_preferred_when_smaller() {
        let graph = EdgeIndex::new(&[(0, 1, 4i64), (1, 2, 6)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.best_edge[1] = Some(0);
        // slack of edge 0 is 6 + 6 - 8 = 4 < 6
        let (delta, mode) = data.determine_delta_and_update_mode(false).unwrap();
        assert_eq!((delta, mode), (4, UpdateMode::SVertexFreeVertex(0)));
    }

    #[test]
    fn ties_keep_the_lower_type() {
        let graph = EdgeIndex::new(&[(0, 1, 3i64)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.best_edge[1] = Some(0);
        // slack 0 + 6 - 6 and the smallest vertex dual are both zero
        data.dual_soln[0] = 0;
        data.dual_soln[1] = 6;
        let (delta, mode) = data.determine_delta_and_update_mode(false).unwrap();
        assert_eq!((delta, mode), (0, UpdateMode::Vertex));
    }

    #[test]
    fn outer_blossom_slack_is_halved() {
        let graph = EdgeIndex::new(&[(0, 1, 1i64)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.assign_label(1, BlossomLabel::Outer, None).unwrap();
        data.dual_soln[0] = 5;
        data.dual_soln[1] = 5;
        data.best_edge[0] = Some(0);
        let (delta, mode) = data.determine_delta_and_update_mode(true).unwrap();
        assert_eq!((delta, mode), (4, UpdateMode::SBlossom(0)));
    }

    #[test]
    fn odd_outer_slack_is_fatal() {
        let graph = EdgeIndex::new(&[(0, 1, 1i64)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.dual_soln[0] = 2;
        data.best_edge[0] = Some(0);
        assert_eq!(
            data.determine_delta_and_update_mode(true),
            Err(MatchingError::OddSlack { edge: 0 })
        );
    }

    #[test]
    fn max_cardinality_falls_back_to_largest_dual() {
        let graph = EdgeIndex::new(&[(0, 1, 7i64)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.dual_soln[1] = 9;
        let (delta, mode) = data.determine_delta_and_update_mode(true).unwrap();
        assert_eq!((delta, mode), (9, UpdateMode::Vertex));
    }

    #[test]
    fn dual_update_follows_labels() {
        let graph = EdgeIndex::new(&[(0, 1, 2i64), (1, 2, 2)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.matching[1] = Some(3);
        data.matching[2] = Some(2);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.assign_label(1, BlossomLabel::Inner, Some(0)).unwrap();
        data.update_dual_soln(1).unwrap();
        assert_eq!(data.dual_soln[..3], [1, 3, 1]);
    }

    #[test]
    fn dual_update_stops_at_the_weight_limit() {
        let graph = EdgeIndex::new(&[(0, 1, 15i8), (1, 2, 15)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.matching[1] = Some(3);
        data.matching[2] = Some(2);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.assign_label(1, BlossomLabel::Inner, Some(0)).unwrap();
        data.dual_soln[..3].copy_from_slice(&[29, 30, 29]);
        // the inner vertex may reach 31 but not 32
        data.update_dual_soln(1).unwrap();
        assert_eq!(data.dual_soln[..3], [28, 31, 28]);
        assert_eq!(
            data.update_dual_soln(1),
            Err(MatchingError::DualOverflow("vertex dual"))
        );
    }

    #[test]
    fn vertex_update_ends_the_stage() {
        let graph = EdgeIndex::new(&[(0, 1, 2i64)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        assert!(data.update_blossom_structure(UpdateMode::Vertex).unwrap());
    }

    #[test]
    fn tight_edge_queues_its_outer_end() {
        let graph = EdgeIndex::new(&[(0, 1, 2i64)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.assign_label(1, BlossomLabel::Outer, None).unwrap();
        data.stack.clear();
        let done = data
            .update_blossom_structure(UpdateMode::SVertexFreeVertex(0))
            .unwrap();
        assert!(!done);
        assert!(data.allowed_edge[0]);
        assert_eq!(data.stack, vec![1]);
    }
}
