//! # `SqueezeNet` Classification Head
//!
//! A 1x1 conv with one filter per class, global average pooling,
//! and a softmax over the class dimension.

use crate::layers::blocks::conv_act::{ConvAct2d, ConvAct2dConfig, ConvAct2dMeta};
use crate::models::squeezenet::util::GLOROT_UNIFORM_INITIALIZER;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::Initializer;
use burn::nn::conv::Conv2dConfig;
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig};
use burn::prelude::{Backend, Config, Module, Tensor};
use burn::tensor::activation::softmax;

/// [`Classifier`] Meta API.
pub trait ClassifierMeta {
    /// The number of input feature channels.
    fn in_channels(&self) -> usize;

    /// The number of output classes.
    fn num_classes(&self) -> usize;
}

/// [`Classifier`] Config.
///
/// Implements [`ClassifierMeta`].
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// The number of input feature channels.
    pub in_channels: usize,

    /// The number of output classes.
    pub num_classes: usize,

    /// The [`Conv2d`](burn::nn::conv::Conv2d) initializer.
    #[config(default = "GLOROT_UNIFORM_INITIALIZER.clone()")]
    pub initializer: Initializer,
}

impl ClassifierMeta for ClassifierConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

impl ClassifierConfig {
    /// Initialize a [`Classifier`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> Classifier<B> {
        // One filter per class.
        let conv: ConvAct2dConfig =
            Conv2dConfig::new([self.in_channels, self.num_classes], [1, 1])
                .with_initializer(self.initializer.clone())
                .into();

        // Reduce each filter (class) to a single value.
        let avgpool = AdaptiveAvgPool2dConfig::new([1, 1]);

        Classifier {
            conv: conv.init(device),
            avgpool: avgpool.init(),
        }
    }
}

/// `SqueezeNet` classification head.
///
/// Implements [`ClassifierMeta`].
#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    /// The class-mapping conv.
    pub conv: ConvAct2d<B>,

    /// Global average pooling.
    pub avgpool: AdaptiveAvgPool2d,
}

impl<B: Backend> ClassifierMeta for Classifier<B> {
    fn in_channels(&self) -> usize {
        self.conv.in_channels()
    }

    fn num_classes(&self) -> usize {
        self.conv.out_channels()
    }
}

impl<B: Backend> Classifier<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, height, width]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, num_classes]`` tensor of class probabilities.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_channels", "height", "width"],
            &input,
            &["batch"],
            &[("in_channels", self.in_channels())],
        );

        let x = self.conv.forward(input);

        // [batch, num_classes, H, W] -> [batch, num_classes, 1, 1]
        let x = self.avgpool.forward(x);
        // [batch, num_classes, 1, 1] -> [batch, num_classes]
        let x = x.flatten(1, 3);

        let x = softmax(x, 1);

        assert_shape_contract_periodically!(
            ["batch", "num_classes"],
            &x,
            &[("batch", batch), ("num_classes", self.num_classes())],
        );

        x
    }
}
