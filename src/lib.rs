//! Maximum weight matching in general graphs.
//!
//! An implementation of Edmonds' blossom algorithm with the primal-dual
//! method of Galil, running in O(n^3) time. Odd cycles found while growing
//! alternating trees are contracted into blossoms, kept in flat tables indexed
//! by vertex ids `0..n` and blossom ids `n..2n`.
//!
//! ```
//! use blossom_matching::max_weight_matching;
//!
//! let edges = [(1, 2, 2i64), (1, 3, -2), (2, 3, 1), (2, 4, -1), (3, 4, -6)];
//! assert_eq!(max_weight_matching(&edges, false).unwrap(), vec![(1, 2)]);
//! assert_eq!(max_weight_matching(&edges, true).unwrap(), vec![(1, 3), (2, 4)]);
//! ```

pub mod algorithms;
mod augment;
mod blossom;
mod blossom_data;
mod delta;
pub mod error;
pub mod options;
pub mod types;
mod verify;

pub use algorithms::{
    max_weight_matching, max_weight_mates, min_weight_max_cardinality_matching,
    MaximumWeightMatching,
};
pub use error::{MatchingError, Result};
pub use options::MatchingOptions;
pub use types::{weight_limit, Edge, EdgeIndex, Matching, Weight};

#[cfg(test)]
mod tests {
    use crate::algorithms::*;

    fn verified_mates(
        weighted_edges: &[(usize, usize, i64)],
        max_cardinality: bool,
    ) -> Vec<Option<usize>> {
        MaximumWeightMatching::new()
            .max_cardinality(max_cardinality)
            .verify_optimum(true)
            .solve(weighted_edges)
            .unwrap()
            .into_mates()
    }

    #[test]
    fn max_weight_matching1() {
        let weighted_edges = vec![(1, 2, 5), (2, 3, 11), (3, 4, 5)];
        let matching = verified_mates(&weighted_edges, false);
        assert_eq!(matching, vec![None, None, Some(3), Some(2), None]);
    }

    #[test]
    fn max_weight_matching2() {
        let weighted_edges = vec![
            (1, 2, 9),
            (1, 3, 9),
            (2, 3, 10),
            (2, 4, 8),
            (3, 5, 8),
            (4, 5, 10),
            (5, 6, 6),
        ];
        let matching = verified_mates(&weighted_edges, false);
        assert_eq!(
            matching,
            vec![None, Some(3), Some(4), Some(1), Some(2), Some(6), Some(5)]
        );
    }

    #[test]
    fn max_weight_matching3() {
        let weighted_edges = vec![
            (1, 2, 40),
            (1, 3, 40),
            (2, 3, 60),
            (2, 4, 55),
            (3, 5, 55),
            (4, 5, 50),
            (1, 8, 15),
            (5, 7, 30),
            (7, 6, 10),
            (8, 10, 10),
            (4, 9, 30),
        ];
        let matching = verified_mates(&weighted_edges, false);
        assert_eq!(
            matching,
            vec![
                None,
                Some(2),
                Some(1),
                Some(5),
                Some(9),
                Some(3),
                Some(7),
                Some(6),
                Some(10),
                Some(4),
                Some(8)
            ]
        );
    }

    #[test]
    fn max_weight_matching4() {
        let weighted_edges = vec![
            (1, 2, 45),
            (1, 7, 45),
            (2, 3, 50),
            (3, 4, 45),
            (4, 5, 95),
            (4, 6, 94),
            (5, 6, 94),
            (6, 7, 50),
            (1, 8, 30),
            (3, 11, 35),
            (5, 9, 36),
            (7, 10, 26),
            (11, 12, 5),
        ];
        let matching = verified_mates(&weighted_edges, false);
        assert_eq!(
            matching,
            vec![
                None,
                Some(8),
                Some(3),
                Some(2),
                Some(6),
                Some(9),
                Some(4),
                Some(10),
                Some(1),
                Some(5),
                Some(7),
                Some(12),
                Some(11)
            ]
        );
    }

    #[test]
    fn max_weight_max_card_matching() {
        let weighted_edges = vec![(1, 2, 2), (1, 3, -2), (2, 3, 1), (2, 4, -1), (3, 4, -6)];
        let matching = verified_mates(&weighted_edges, true);
        assert_eq!(matching, vec![None, Some(3), Some(4), Some(1), Some(2)]);
    }

    #[test]
    fn pairs_and_mates_agree() {
        let weighted_edges = vec![(1, 2, 2), (1, 3, -2), (2, 3, 1), (2, 4, -1), (3, 4, -6)];
        assert_eq!(
            max_weight_matching(&weighted_edges, true).unwrap(),
            vec![(1, 3), (2, 4)]
        );
        assert_eq!(
            max_weight_mates(&weighted_edges, false).unwrap(),
            vec![None, Some(2), Some(1), None, None]
        );
    }
}
