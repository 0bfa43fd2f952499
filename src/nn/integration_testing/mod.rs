use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use crate::nn::classifier::Classifier;
use crate::nn::fc_net::FullyConnectedNet;
use crate::nn::generic_storage::ParamKey;
use crate::nn::train_config::{FcNetConfig, Normalization};
use crate::nn::two_layer_net::TwoLayerNet;
use crate::utils::{argmax_rows, arrays_almost_equal, Array2F, F, Labels};

const N: usize = 30;
const D: usize = 5;
const H: usize = 50;
const C: usize = 3;

/// Points labelled by a random linear map, so every classifier here can fit them
fn separable_batch(seed: u64) -> (Array2F, Labels) {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(0.0, 1.0).unwrap();
    let inputs = Array2F::random_using((N, D), dist, &mut rng);
    let map = Array2F::random_using((D, C), dist, &mut rng);
    let labels = argmax_rows(&inputs.dot(&map));
    (inputs, labels)
}

/// Full-batch gradient descent. Returns the first and the last loss.
fn train(net: &mut impl Classifier, inputs: &Array2F, labels: &Labels, steps: usize, lr: F) -> (F, F) {
    let mut losses = Vec::with_capacity(steps);
    for _ in 0..steps {
        let (loss, grads) = net.loss(inputs, Some(labels)).unwrap().into_loss().unwrap();
        for key in grads.keys() {
            net.params_mut().get_mut(&key).unwrap().scaled_add(-lr, grads.get(&key).unwrap());
        }
        losses.push(loss);
    }
    (losses[0], losses[steps - 1])
}

fn fc_config(normalization: Normalization, dropout_keep: F) -> FcNetConfig {
    FcNetConfig {
        hidden_dims: vec![H],
        input_dim: D,
        num_classes: C,
        dropout_keep,
        normalization,
        weight_scale: 0.1,
        seed: Some(1),
        ..Default::default()
    }
}

#[test]
fn test_single_hidden_layer_matches_two_layer_net() {
    let (inputs, labels) = separable_batch(1);
    let mut two_layer = TwoLayerNet::with_seed(D, H, C, 0.1, 0.4, 2).unwrap();
    let mut fc = FullyConnectedNet::with_seed(FcNetConfig { reg: 0.4, ..fc_config(Normalization::None, 1.0) }, 3).unwrap();
    for key in two_layer.params().keys() {
        fc.params_mut().insert(key, two_layer.params().get(&key).unwrap().clone());
    }

    let two_layer_scores = two_layer.loss(&inputs, None).unwrap().into_scores().unwrap();
    let fc_scores = fc.loss(&inputs, None).unwrap().into_scores().unwrap();
    assert!(arrays_almost_equal(&two_layer_scores, &fc_scores));

    let (two_layer_loss, two_layer_grads) = two_layer.loss(&inputs, Some(&labels)).unwrap().into_loss().unwrap();
    let (fc_loss, fc_grads) = fc.loss(&inputs, Some(&labels)).unwrap().into_loss().unwrap();
    assert!((two_layer_loss - fc_loss).abs() < 1e-10);
    assert_eq!(two_layer_grads.keys(), fc_grads.keys());
    for key in fc_grads.keys() {
        assert!(arrays_almost_equal(two_layer_grads.get(&key).unwrap(), fc_grads.get(&key).unwrap()), "{} differs", key);
    }
}

#[test]
fn test_two_layer_net_fits_separable_data() {
    let (inputs, labels) = separable_batch(4);
    let mut net = TwoLayerNet::with_seed(D, H, C, 0.1, 0.0, 5).unwrap();

    let (first, last) = train(&mut net, &inputs, &labels, 200, 0.5);
    assert!(last < first * 0.3, "loss went from {} to {}", first, last);
    assert!(net.check_accuracy(&inputs, &labels).unwrap() >= 0.9);
}

#[test]
fn test_fc_nets_learn() {
    let (inputs, labels) = separable_batch(6);
    for (normalization, keep) in [
        (Normalization::None, 1.0),
        (Normalization::BatchNorm, 1.0),
        (Normalization::LayerNorm, 1.0),
        (Normalization::BatchNorm, 0.75),
    ] {
        let mut net = FullyConnectedNet::with_seed(fc_config(normalization, keep), 7).unwrap();
        let (first, last) = train(&mut net, &inputs, &labels, 200, 0.1);
        assert!(last < first * 0.5, "loss went from {} to {} with {}, keep {}", first, last, normalization, keep);
        assert_eq!(net.predict(&inputs).unwrap().len(), N);
    }
}

#[test]
fn test_deeper_net_keeps_parameter_layout() {
    let config = FcNetConfig {
        hidden_dims: vec![8, 6, 4],
        normalization: Normalization::LayerNorm,
        ..fc_config(Normalization::None, 1.0)
    };
    let mut net = FullyConnectedNet::with_seed(config, 8).unwrap();
    let (inputs, labels) = separable_batch(9);
    let (_, grads) = net.loss(&inputs, Some(&labels)).unwrap().into_loss().unwrap();

    assert_eq!(net.num_layers(), 4);
    assert_eq!(grads.len(), 4 * 2 + 3 * 2);
    for key in grads.keys() {
        assert_eq!(grads.get(&key).unwrap().shape(), net.params().get(&key).unwrap().shape());
    }
    assert!(!grads.contains(&ParamKey::gamma(4)));
}
