use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

const EPS: f64 = 1e-7;

/// Binary Dice loss on raw logits.
///
/// Probabilities come from a sigmoid. Overlap is summed over the batch and all
/// pixels per class, `dice = 2 * |P * T| / max(|P| + |T|, eps)`, and the loss
/// is `1 - dice`. Classes without any positive target pixel contribute zero.
/// Returns the mean over classes as a one-element tensor.
pub fn dice_loss<B: Backend>(logits: Tensor<B, 4>, targets: Tensor<B, 4>) -> Tensor<B, 1> {
    let [n, c, h, w] = logits.dims();
    let probs = sigmoid(logits).reshape([n, c, h * w]);
    let targets = targets.reshape([n, c, h * w]);

    let intersection = (probs.clone() * targets.clone()).sum_dim(2).sum_dim(0);
    let cardinality = (probs + targets.clone()).sum_dim(2).sum_dim(0);
    let dice = intersection.mul_scalar(2.0) / cardinality.clamp_min(EPS);
    let loss = dice.neg().add_scalar(1.0);

    let present = targets.sum_dim(2).sum_dim(0).greater_elem(0.0).float();
    (loss * present).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{ElementConversion, TensorData};
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn tensor(values: Vec<f32>, shape: [usize; 4]) -> Tensor<B, 4> {
        Tensor::from_data(TensorData::new(values, shape), &Default::default())
    }

    fn value(t: Tensor<B, 1>) -> f32 {
        t.into_scalar().elem::<f32>()
    }

    #[test]
    fn uncertain_logits_give_half_overlap() {
        // p = 0.5 everywhere; |P*T| = 1, |P| + |T| = 2 + 2.
        let logits = tensor(vec![0.0; 4], [1, 1, 2, 2]);
        let targets = tensor(vec![1.0, 1.0, 0.0, 0.0], [1, 1, 2, 2]);
        assert!((value(dice_loss(logits, targets)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn confident_correct_logits_approach_zero() {
        let logits = tensor(vec![20.0, 20.0, -20.0, -20.0], [1, 1, 2, 2]);
        let targets = tensor(vec![1.0, 1.0, 0.0, 0.0], [1, 1, 2, 2]);
        assert!(value(dice_loss(logits, targets)) < 1e-5);
    }

    #[test]
    fn confident_wrong_logits_approach_one() {
        let logits = tensor(vec![-20.0, -20.0, 20.0, 20.0], [1, 1, 2, 2]);
        let targets = tensor(vec![1.0, 1.0, 0.0, 0.0], [1, 1, 2, 2]);
        assert!((value(dice_loss(logits, targets)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_ground_truth_contributes_nothing() {
        let logits = tensor(vec![3.0, -1.0, 2.0, 0.5, 1.0, 1.0, 1.0, 1.0], [2, 1, 2, 2]);
        let targets = tensor(vec![0.0; 8], [2, 1, 2, 2]);
        assert_eq!(value(dice_loss(logits, targets)), 0.0);
    }

    #[test]
    fn overlap_is_pooled_across_the_batch() {
        // Sample 0 has all the lesion pixels, sample 1 none; pooled dice is still 0.5.
        let logits = tensor(vec![0.0; 8], [2, 1, 2, 2]);
        let targets = tensor(vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0], [2, 1, 2, 2]);
        // |P*T| = 2, |P| = 4, |T| = 4 -> dice = 0.5.
        assert!((value(dice_loss(logits, targets)) - 0.5).abs() < 1e-6);
    }
}
