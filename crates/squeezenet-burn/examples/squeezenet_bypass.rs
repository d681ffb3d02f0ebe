//! Instantiate the stock `SqueezeNet`-Bypass model and run a forward pass.

use burn::backend::NdArray;
use burn::prelude::Tensor;
use burn::tensor::Distribution;
use squeezenet_burn::models::squeezenet::prefabs::squeezenet_bypass;

fn main() {
    type B = NdArray<f32>;
    let device = Default::default();

    let config = squeezenet_bypass();
    let model = config.init::<B>(&device);

    let input = Tensor::random([1, 3, 224, 224], Distribution::Default, &device);
    let probs = model.forward(input);

    println!("output shape: {:?}", probs.dims());
    println!("top class: {}", probs.argmax(1).into_scalar());
}
