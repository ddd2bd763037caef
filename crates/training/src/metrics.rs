use serde::{Deserialize, Serialize};

/// Pixel-level confusion counts between a ground-truth and a predicted mask.
/// Values above 0.5 count as positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_pos: u64,
    pub false_pos: u64,
    pub false_neg: u64,
    pub true_neg: u64,
}

impl ConfusionCounts {
    pub fn from_masks(truth: &[f32], pred: &[f32]) -> Self {
        debug_assert_eq!(truth.len(), pred.len());
        let mut counts = Self::default();
        for (t, p) in truth.iter().zip(pred) {
            match (*t > 0.5, *p > 0.5) {
                (true, true) => counts.true_pos += 1,
                (false, true) => counts.false_pos += 1,
                (true, false) => counts.false_neg += 1,
                (false, false) => counts.true_neg += 1,
            }
        }
        counts
    }

    pub fn merge(&mut self, other: &Self) {
        self.true_pos += other.true_pos;
        self.false_pos += other.false_pos;
        self.false_neg += other.false_neg;
        self.true_neg += other.true_neg;
    }

    /// Intersection over union. An empty union scores 0.
    pub fn jaccard(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_pos + self.false_neg)
    }

    pub fn dice(&self) -> f64 {
        ratio(
            2 * self.true_pos,
            2 * self.true_pos + self.false_pos + self.false_neg,
        )
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_pos)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_neg)
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Jaccard score of two flattened binary masks.
pub fn jaccard(truth: &[f32], pred: &[f32]) -> f64 {
    ConfusionCounts::from_masks(truth, pred).jaccard()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_overlapping_pixel_of_two_in_union() {
        // |T ∩ P| = 1, |T ∪ P| = 2.
        let score = jaccard(&[1.0, 1.0, 0.0, 0.0], &[1.0, 0.0, 0.0, 0.0]);
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_union_scores_zero() {
        assert_eq!(jaccard(&[0.0; 4], &[0.0; 4]), 0.0);
    }

    #[test]
    fn precision_and_recall_split_the_errors() {
        let counts = ConfusionCounts::from_masks(&[1.0, 1.0, 1.0, 0.0], &[1.0, 0.0, 0.0, 1.0]);
        assert!((counts.precision() - 0.5).abs() < 1e-12);
        assert!((counts.recall() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(ConfusionCounts::default().precision(), 0.0);
    }

    #[test]
    fn merged_counts_equal_counts_of_concatenation() {
        let (t1, p1) = ([1.0, 0.0, 1.0], [1.0, 1.0, 0.0]);
        let (t2, p2) = ([0.0, 1.0], [0.0, 1.0]);
        let mut merged = ConfusionCounts::from_masks(&t1, &p1);
        merged.merge(&ConfusionCounts::from_masks(&t2, &p2));

        let truth: Vec<f32> = t1.iter().chain(&t2).copied().collect();
        let pred: Vec<f32> = p1.iter().chain(&p2).copied().collect();
        assert_eq!(merged, ConfusionCounts::from_masks(&truth, &pred));
        assert!((merged.jaccard() - 0.5).abs() < 1e-12);
        assert!((merged.dice() - 2.0 / 3.0).abs() < 1e-12);
    }
}
