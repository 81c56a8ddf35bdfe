use crate::blossom::cyclic;
use crate::blossom_data::{trace_step, BlossomData};
use crate::error::{ensure, MatchingError, Result};
use crate::types::{BlossomLabel, Weight};

impl<'g, W: Weight> BlossomData<'g, W> {
    // this function simultaneously rotates blossoms
    // and appropriately augments the matching
    //
    // swap matched and unmatched edges along the even path from vertex to the
    // base of blossom_id, recursing into sub-blossoms, so that vertex becomes
    // the new base
    pub(crate) fn augment_blossom(&mut self, blossom_id: usize, vertex: usize) -> Result<()> {
        trace_step!(self, "augment_blossom({}, {})", blossom_id, vertex);
        // let t be the direct child of blossom_id containing vertex
        let mut t = vertex;
        while self.blossom_parent[t] != Some(blossom_id) {
            t = self.blossom_parent[t].ok_or(MatchingError::BrokenNesting {
                blossom: blossom_id,
                reason: "vertex is not nested in the blossom being augmented",
            })?;
        }
        // if t is a non-trivial blossom, make vertex its base first
        if t >= self.n_vertices {
            self.augment_blossom(t, vertex)?;
        }

        let len = self.blossom_children[blossom_id].len();
        let (mut j, jstep, endptrick) = self.walk_direction(blossom_id, t)?;
        let i = cyclic(j, len);
        while j != 0 {
            // step to the next sub-blossom and augment it
            j += jstep;
            let t = self.blossom_children[blossom_id][cyclic(j, len)];
            let p = self.blossom_endpoints[blossom_id][cyclic(j - endptrick as isize, len)]
                ^ endptrick;
            if t >= self.n_vertices {
                self.augment_blossom(t, self.graph.endpoint(p))?;
            }
            // and the one after it
            j += jstep;
            let t = self.blossom_children[blossom_id][cyclic(j, len)];
            if t >= self.n_vertices {
                self.augment_blossom(t, self.graph.endpoint(p ^ 1))?;
            }
            // match the edge connecting those sub-blossoms
            self.matching[self.graph.endpoint(p)] = Some(p ^ 1);
            self.matching[self.graph.endpoint(p ^ 1)] = Some(p);
            trace_step!(
                self,
                "PAIR {} {} (k={})",
                self.graph.endpoint(p),
                self.graph.endpoint(p ^ 1),
                p / 2
            );
        }

        // rotate the cycle so that the new base comes first
        self.blossom_children[blossom_id].rotate_left(i);
        self.blossom_endpoints[blossom_id].rotate_left(i);
        self.blossom_base[blossom_id] = self.blossom_base[self.blossom_children[blossom_id][0]];
        ensure!(
            self.blossom_base[blossom_id] == Some(vertex),
            MatchingError::BrokenNesting {
                blossom: blossom_id,
                reason: "rotated blossom does not have the requested base",
            }
        );
        Ok(())
    }

    /// Flip the augmenting path through edge `edge_idx`, which connects two
    /// outer vertices of different trees, from each end back to its root.
    pub(crate) fn augment_matching(&mut self, edge_idx: usize) -> Result<()> {
        let (v, w, _) = self.graph.edges[edge_idx];
        trace_step!(self, "augment_matching({}) (v={} w={})", edge_idx, v, w);
        trace_step!(self, "PAIR {} {} (k={})", v, w, edge_idx);
        for (mut s, mut p) in [(v, 2 * edge_idx + 1), (w, 2 * edge_idx)] {
            // s is an outer vertex about to be matched through endpoint p
            loop {
                let bs = self.blossom_id[s];
                ensure!(
                    self.blossom_labels[bs] == BlossomLabel::Outer,
                    MatchingError::UnexpectedLabel {
                        blossom: bs,
                        reason: "augmenting path passes a non-outer blossom",
                    }
                );
                ensure!(
                    self.label_endpoints[bs] == self.base_mate(bs),
                    MatchingError::UnexpectedLabel {
                        blossom: bs,
                        reason: "outer blossom was not reached through its base's mate",
                    }
                );
                // make s the base of its blossom
                if bs >= self.n_vertices {
                    self.augment_blossom(bs, s)?;
                }
                self.matching[s] = Some(p);

                // a root ends the path
                let Some(label_endpoint) = self.label_endpoints[bs] else {
                    break;
                };
                let t = self.graph.endpoint(label_endpoint);
                let bt = self.blossom_id[t];
                ensure!(
                    self.blossom_labels[bt] == BlossomLabel::Inner,
                    MatchingError::UnexpectedLabel {
                        blossom: bt,
                        reason: "augmenting path passes a non-inner blossom",
                    }
                );
                let inner_endpoint = self.label_endpoints[bt]
                    .ok_or(MatchingError::MissingLabelEnd { blossom: bt })?;
                // trace one step back through the inner blossom
                s = self.graph.endpoint(inner_endpoint);
                let j = self.graph.endpoint(inner_endpoint ^ 1);
                ensure!(
                    self.blossom_base[bt] == Some(t),
                    MatchingError::BrokenNesting {
                        blossom: bt,
                        reason: "inner blossom was not entered at its base",
                    }
                );
                if bt >= self.n_vertices {
                    self.augment_blossom(bt, j)?;
                }
                self.matching[j] = Some(inner_endpoint);
                p = inner_endpoint ^ 1;
                trace_step!(self, "PAIR {} {} (k={})", s, j, p / 2);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeIndex;

    #[test]
    fn augment_between_two_roots() {
        let graph = EdgeIndex::new(&[(0, 1, 3i64)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.assign_label(1, BlossomLabel::Outer, None).unwrap();
        data.augment_matching(0).unwrap();
        assert_eq!(data.matching, vec![Some(1), Some(0)]);
    }

    #[test]
    fn augment_along_alternating_path() {
        // path 0 - 1 = 2 - 3 with 1-2 matched
        let graph = EdgeIndex::new(&[(0, 1, 3i64), (1, 2, 5), (2, 3, 3)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.matching[1] = Some(3);
        data.matching[2] = Some(2);
        data.assign_label(0, BlossomLabel::Outer, None).unwrap();
        data.assign_label(3, BlossomLabel::Outer, None).unwrap();
        // 0 reaches 1 over edge 0, which labels 2 outer
        data.assign_label(1, BlossomLabel::Inner, Some(0)).unwrap();
        data.augment_matching(2).unwrap();
        assert_eq!(data.matching, vec![Some(1), Some(0), Some(5), Some(4)]);
    }

    #[test]
    fn augment_blossom_rebases_cycle() {
        // triangle 0-1-2 contracted with base 2, 0-1 matched
        let graph = EdgeIndex::new(&[(0, 1, 5i64), (1, 2, 5), (2, 0, 5)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.matching[0] = Some(1);
        data.matching[1] = Some(0);
        data.assign_label(2, BlossomLabel::Outer, None).unwrap();
        data.assign_label(0, BlossomLabel::Inner, Some(4)).unwrap();
        data.add_blossom(2, 1).unwrap();
        let b = 5;

        data.augment_blossom(b, 1).unwrap();
        assert_eq!(data.blossom_base[b], Some(1));
        assert_eq!(data.blossom_children[b][0], 1);
        // 2 and 0 are now matched through edge 2
        assert_eq!(data.matching[2], Some(5));
        assert_eq!(data.matching[0], Some(4));
    }
}
