//! # `ConvAct2d` - conv/activation block.
//!
//! A [`ConvAct2d`] module is:
//! * a [`Conv2d`] layer,
//! * a [`Relu`] layer.
//!
//! `SqueezeNet`-style convolutions carry a bias and no norm layer,
//! so this is a thinner seam than the usual conv/norm/act stack.

use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::config::Config;
use burn::module::Module;
use burn::nn::Relu;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::prelude::{Backend, Tensor};

/// [`ConvAct2d`] Meta.
pub trait ConvAct2dMeta {
    /// Number of input channels.
    fn in_channels(&self) -> usize;

    /// Number of output channels.
    fn out_channels(&self) -> usize;

    /// Get the stride.
    fn stride(&self) -> [usize; 2];
}

/// [`ConvAct2d`] Config.
///
/// Implements [`ConvAct2dMeta`].
#[derive(Config, Debug)]
pub struct ConvAct2dConfig {
    /// The [`Conv2d`] config.
    pub conv: Conv2dConfig,
}

impl From<Conv2dConfig> for ConvAct2dConfig {
    fn from(conv: Conv2dConfig) -> Self {
        Self { conv }
    }
}

impl ConvAct2dMeta for ConvAct2dConfig {
    fn in_channels(&self) -> usize {
        self.conv.channels[0]
    }

    fn out_channels(&self) -> usize {
        self.conv.channels[1]
    }

    fn stride(&self) -> [usize; 2] {
        self.conv.stride
    }
}

impl ConvAct2dConfig {
    /// Initialize a [`ConvAct2d`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> ConvAct2d<B> {
        ConvAct2d {
            conv: self.conv.init(device),
            act: Relu::new(),
        }
    }
}

/// Sequenced conv/activation block.
///
/// Implements [`ConvAct2dMeta`].
#[derive(Module, Debug)]
pub struct ConvAct2d<B: Backend> {
    /// Internal Conv2d layer.
    pub conv: Conv2d<B>,

    /// Activation layer.
    pub act: Relu,
}

impl<B: Backend> ConvAct2dMeta for ConvAct2d<B> {
    fn in_channels(&self) -> usize {
        self.conv.weight.shape().dims[1] * self.conv.groups
    }

    fn out_channels(&self) -> usize {
        self.conv.weight.shape().dims[0]
    }

    fn stride(&self) -> [usize; 2] {
        self.conv.stride
    }
}

impl<B: Backend> ConvAct2d<B> {
    /// Forward Pass.
    ///
    /// Applies the conv/act layers in sequence.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, out_channels, out_height, out_width]``
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_channels", "in_height", "in_width"],
            &input,
            &["batch"],
            &[("in_channels", self.in_channels())],
        );

        let x = self.conv.forward(input);
        let x = self.act.forward(x);

        assert_shape_contract_periodically!(
            ["batch", "out_channels", "out_height", "out_width"],
            &x,
            &[("batch", batch), ("out_channels", self.out_channels())],
        );

        x
    }
}
