//! Check that the final dual solution certifies the matching as optimal.
//!
//! Only meaningful with integer weights, which is all the engine accepts.

use crate::blossom_data::BlossomData;
use crate::error::{ensure, MatchingError, Result};
use crate::types::Weight;

impl<'g, W: Weight> BlossomData<'g, W> {
    // chain of blossoms containing v, outermost first
    fn ancestry(&self, v: usize) -> Vec<usize> {
        let mut chain = vec![v];
        let mut b = v;
        while let Some(parent) = self.blossom_parent[b] {
            chain.push(parent);
            b = parent;
        }
        chain.reverse();
        chain
    }

    /// Verify the complementary slackness conditions of the current matching
    /// and dual solution. Must run before the mate table is translated.
    pub(crate) fn verify_optimum(&self, max_cardinality: bool) -> Result<()> {
        let n = self.n_vertices;
        let two = W::one() + W::one();
        let min_vertex_dual = self.dual_soln[..n].iter().copied().min().unwrap_or_else(W::zero);
        // in max-cardinality mode vertex duals may go negative; shift them
        let offset = if max_cardinality {
            W::zero().max(-min_vertex_dual)
        } else {
            W::zero()
        };

        ensure!(
            min_vertex_dual + offset >= W::zero(),
            MatchingError::NotOptimal("negative vertex dual")
        );
        ensure!(
            self.dual_soln[n..].iter().all(|&z| z >= W::zero()),
            MatchingError::NotOptimal("negative blossom dual")
        );

        for (k, &(i, j, _)) in self.graph.edges.iter().enumerate() {
            if i == j {
                continue;
            }
            let mut s = self.slack(k);
            for (bi, bj) in self.ancestry(i).into_iter().zip(self.ancestry(j)) {
                if bi != bj {
                    break;
                }
                s = self.dual_soln[bi]
                    .checked_mul(&two)
                    .and_then(|z| s.checked_add(&z))
                    .ok_or(MatchingError::DualOverflow("edge slack"))?;
            }
            ensure!(s >= W::zero(), MatchingError::NotOptimal("negative edge slack"));

            let matched_i = self.matching[i].map(|p| p / 2) == Some(k);
            let matched_j = self.matching[j].map(|p| p / 2) == Some(k);
            if matched_i || matched_j {
                ensure!(
                    matched_i && matched_j,
                    MatchingError::NotOptimal("matched edge is recorded at one end only")
                );
                ensure!(
                    s == W::zero(),
                    MatchingError::NotOptimal("matched edge is not tight")
                );
            }
        }

        for v in 0..n {
            ensure!(
                self.matching[v].is_some() || self.dual_soln[v] + offset == W::zero(),
                MatchingError::NotOptimal("single vertex has non-zero dual")
            );
        }

        for b in n..2 * n {
            if self.blossom_base[b].is_none() || self.dual_soln[b] <= W::zero() {
                continue;
            }
            let endpoints = &self.blossom_endpoints[b];
            ensure!(
                endpoints.len() % 2 == 1,
                MatchingError::NotOptimal("blossom has an even cycle")
            );
            for &p in endpoints.iter().skip(1).step_by(2) {
                ensure!(
                    self.matching[self.graph.endpoint(p)] == Some(p ^ 1)
                        && self.matching[self.graph.endpoint(p ^ 1)] == Some(p),
                    MatchingError::NotOptimal("blossom with positive dual is not full")
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeIndex;

    fn matched_pair() -> EdgeIndex<i64> {
        EdgeIndex::new(&[(0, 1, 6), (1, 2, 2)]).unwrap()
    }

    #[test]
    fn accepts_tight_certificate() {
        let graph = matched_pair();
        let mut data = BlossomData::new(&graph, false);
        data.matching[0] = Some(1);
        data.matching[1] = Some(0);
        data.dual_soln[..3].copy_from_slice(&[6, 6, 0]);
        assert_eq!(data.verify_optimum(false), Ok(()));
    }

    #[test]
    fn rejects_negative_slack() {
        let graph = matched_pair();
        let mut data = BlossomData::new(&graph, false);
        data.matching[0] = Some(1);
        data.matching[1] = Some(0);
        data.dual_soln[..3].copy_from_slice(&[6, 6, 0]);
        data.dual_soln[1] = 5;
        assert_eq!(
            data.verify_optimum(false),
            Err(MatchingError::NotOptimal("negative edge slack"))
        );
    }

    #[test]
    fn rejects_single_vertex_with_dual() {
        let graph = matched_pair();
        let mut data = BlossomData::new(&graph, false);
        data.matching[0] = Some(1);
        data.matching[1] = Some(0);
        data.dual_soln[..3].copy_from_slice(&[6, 6, 1]);
        assert_eq!(
            data.verify_optimum(false),
            Err(MatchingError::NotOptimal("single vertex has non-zero dual"))
        );
    }

    #[test]
    fn max_cardinality_shifts_negative_duals() {
        let graph = EdgeIndex::new(&[(0, 1, -3i64), (1, 2, -8)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.matching[0] = Some(1);
        data.matching[1] = Some(0);
        // u = (-2, -4, 2) with offset 4 gives (2, 0, 6)
        data.dual_soln[..3].copy_from_slice(&[-2, -4, 2]);
        assert!(data.verify_optimum(false).is_err());
        assert_eq!(
            data.verify_optimum(true),
            Err(MatchingError::NotOptimal("single vertex has non-zero dual"))
        );
        data.dual_soln[..3].copy_from_slice(&[1, -7, -7]);
        assert_eq!(data.verify_optimum(true), Ok(()));
    }

    #[test]
    fn blossom_dual_counts_for_inner_edges() {
        // triangle with 0-1 matched, contracted into blossom 5 with dual 1
        let graph = EdgeIndex::new(&[(0, 1, 4i64), (1, 2, 4), (2, 0, 4)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.matching[0] = Some(1);
        data.matching[1] = Some(0);
        data.dual_soln[..3].copy_from_slice(&[3, 3, 3]);
        data.dual_soln[5] = 1;
        data.blossom_base[5] = Some(2);
        data.blossom_children[5] = vec![2, 0, 1];
        data.blossom_endpoints[5] = vec![4, 0, 2];
        for v in 0..3 {
            data.blossom_parent[v] = Some(5);
        }
        // vertex 2 is single with a non-zero dual
        assert_eq!(
            data.verify_optimum(false),
            Err(MatchingError::NotOptimal("single vertex has non-zero dual"))
        );
        data.dual_soln[..3].copy_from_slice(&[3, 3, 0]);
        // slack of edge 1 is 3 + 0 - 8 + 2 < 0
        assert_eq!(
            data.verify_optimum(false),
            Err(MatchingError::NotOptimal("negative edge slack"))
        );
    }

    #[test]
    fn positive_blossom_must_be_full() {
        let graph = EdgeIndex::new(&[(0, 1, 4i64), (1, 2, 4), (2, 0, 4)]).unwrap();
        let mut data = BlossomData::new(&graph, false);
        data.dual_soln[..3].copy_from_slice(&[0, 0, 0]);
        data.dual_soln[5] = 4;
        data.blossom_base[5] = Some(2);
        data.blossom_children[5] = vec![2, 0, 1];
        data.blossom_endpoints[5] = vec![4, 0, 2];
        for v in 0..3 {
            data.blossom_parent[v] = Some(5);
        }
        assert_eq!(
            data.verify_optimum(false),
            Err(MatchingError::NotOptimal("blossom with positive dual is not full"))
        );
        data.matching[0] = Some(1);
        data.matching[1] = Some(0);
        assert_eq!(data.verify_optimum(false), Ok(()));
    }
}
