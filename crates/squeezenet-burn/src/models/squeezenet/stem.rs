//! # `SqueezeNet` Input Stem
//!
//! A 7x7/2 "same"-padded conv with ReLU, followed by a 3x3/2
//! un-padded max pool.

use crate::layers::blocks::conv_act::{ConvAct2d, ConvAct2dConfig, ConvAct2dMeta};
use crate::models::squeezenet::util::{
    GLOROT_UNIFORM_INITIALIZER, same_conv_output_resolution, valid_pool_output_resolution,
};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::conv::Conv2dConfig;
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Initializer, PaddingConfig2d};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`Stem`] Meta API.
pub trait StemMeta {
    /// The number of input image channels.
    fn in_channels(&self) -> usize;

    /// The number of output feature channels.
    fn out_channels(&self) -> usize;

    /// Get the output resolution for a given input resolution.
    ///
    /// # Arguments
    ///
    /// - `input_resolution`: ``[in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[out_height, out_width]``
    ///
    /// # Panics
    ///
    /// If the conv output resolution is smaller than the pooling window.
    fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        valid_pool_output_resolution(same_conv_output_resolution(input_resolution, 2), 3, 2)
    }
}

/// [`Stem`] Config.
///
/// Implements [`StemMeta`].
#[derive(Config, Debug)]
pub struct StemConfig {
    /// The number of input image channels.
    #[config(default = 3)]
    pub in_channels: usize,

    /// The number of output feature channels.
    #[config(default = 96)]
    pub out_channels: usize,

    /// The [`Conv2d`](burn::nn::conv::Conv2d) initializer.
    #[config(default = "GLOROT_UNIFORM_INITIALIZER.clone()")]
    pub initializer: Initializer,
}

impl StemMeta for StemConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        self.out_channels
    }
}

impl StemConfig {
    /// Initialize a [`Stem`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> Stem<B> {
        let conv: ConvAct2dConfig =
            Conv2dConfig::new([self.in_channels, self.out_channels], [7, 7])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Same)
                .with_initializer(self.initializer.clone())
                .into();

        let pool = MaxPool2dConfig::new([3, 3]).with_strides([2, 2]);

        Stem {
            conv: conv.init(device),
            pool: pool.init(),
        }
    }
}

/// `SqueezeNet` input stem.
///
/// Implements [`StemMeta`].
#[derive(Module, Debug)]
pub struct Stem<B: Backend> {
    /// The stem conv.
    pub conv: ConvAct2d<B>,

    /// The stem pool.
    pub pool: MaxPool2d,
}

impl<B: Backend> StemMeta for Stem<B> {
    fn in_channels(&self) -> usize {
        self.conv.in_channels()
    }

    fn out_channels(&self) -> usize {
        self.conv.out_channels()
    }
}

impl<B: Backend> Stem<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_channels, out_height, out_width]`` tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, in_height, in_width] = unpack_shape_contract!(
            ["batch", "in_channels", "in_height", "in_width"],
            &input,
            &["batch", "in_height", "in_width"],
            &[("in_channels", self.in_channels())],
        );
        let [out_height, out_width] = self.output_resolution([in_height, in_width]);

        let x = self.conv.forward(input);
        let x = self.pool.forward(x);

        assert_shape_contract_periodically!(
            ["batch", "out_channels", "out_height", "out_width"],
            &x,
            &[
                ("batch", batch),
                ("out_channels", self.out_channels()),
                ("out_height", out_height),
                ("out_width", out_width)
            ],
        );

        x
    }
}
