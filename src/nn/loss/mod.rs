pub mod softmax_loss;
