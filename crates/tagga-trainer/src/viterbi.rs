//! # Viterbi Decoding for CRF
//!
//! Finds the highest scoring tag sequence given per-token emission scores,
//! a transition matrix and the BIO transition constraints.

use crate::bio::BioTag;

/// Viterbi decoder for constrained BIO tag sequences.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    num_tags: usize,
    valid_transitions: Vec<Vec<bool>>,
}

impl ViterbiDecoder {
    /// Create a decoder from a `[from][to]` matrix of allowed transitions.
    pub fn new(valid_transitions: Vec<Vec<bool>>) -> Self {
        Self {
            num_tags: valid_transitions.len(),
            valid_transitions,
        }
    }

    /// Decode the optimal tag sequence.
    ///
    /// # Arguments
    /// * `emission_scores` - Matrix of shape [seq_len, num_tags]
    /// * `transition_matrix` - Matrix of shape [num_tags, num_tags], indexed `[from][to]`
    ///
    /// # Returns
    /// The optimal tag sequence as indices. Forbidden transitions are never
    /// taken, and the sequence never opens with an inside tag.
    pub fn decode(&self, emission_scores: &[Vec<f32>], transition_matrix: &[Vec<f32>]) -> Vec<usize> {
        let seq_len = emission_scores.len();
        if seq_len == 0 || self.num_tags == 0 {
            return Vec::new();
        }

        // DP table
        let mut dp: Vec<Vec<f32>> = vec![vec![f32::NEG_INFINITY; self.num_tags]; seq_len];
        let mut backptr: Vec<Vec<Option<usize>>> = vec![vec![None; self.num_tags]; seq_len];

        // Initialize
        for tag in 0..self.num_tags {
            if BioTag::from_index(tag).can_start() {
                dp[0][tag] = emission_scores[0][tag];
            }
        }

        // Forward pass with constraints
        for pos in 1..seq_len {
            for curr_tag in 0..self.num_tags {
                let mut best_score = f32::NEG_INFINITY;
                let mut best_prev = None;

                for prev_tag in 0..self.num_tags {
                    if !self.valid_transitions[prev_tag][curr_tag]
                        || dp[pos - 1][prev_tag] == f32::NEG_INFINITY
                    {
                        continue;
                    }

                    let score = dp[pos - 1][prev_tag]
                        + transition_matrix[prev_tag][curr_tag]
                        + emission_scores[pos][curr_tag];

                    if best_prev.is_none() || score > best_score {
                        best_score = score;
                        best_prev = Some(prev_tag);
                    }
                }

                dp[pos][curr_tag] = best_score;
                backptr[pos][curr_tag] = best_prev;
            }
        }

        // Backtrack
        let mut best_final_tag = 0;
        let mut best_final_score = f32::NEG_INFINITY;
        for tag in 0..self.num_tags {
            if dp[seq_len - 1][tag] > best_final_score {
                best_final_score = dp[seq_len - 1][tag];
                best_final_tag = tag;
            }
        }

        let mut path = vec![best_final_tag];
        let mut curr_tag = best_final_tag;

        for pos in (1..seq_len).rev() {
            curr_tag = backptr[pos][curr_tag].unwrap_or(0);
            path.push(curr_tag);
        }

        path.reverse();
        path
    }
}
