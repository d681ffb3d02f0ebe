//! # Fire Block for `SqueezeNet`
//!
//! [`FireBlock`] is the core `SqueezeNet` convolution unit.
//!
//! [`FireBlockMeta`] defines a common meta API for [`FireBlock`]
//! and [`FireBlockConfig`].
//!
//! [`FireBlockConfig`] implements [`Config`], and provides
//! [`FireBlockConfig::init`] to initialize a [`FireBlock`].
//!
//! [`FireBlock`] implements [`Module`], and provides
//! [`FireBlock::forward`].

use crate::layers::blocks::conv_act::{ConvAct2d, ConvAct2dConfig, ConvAct2dMeta};
use crate::models::squeezenet::util::GLOROT_UNIFORM_INITIALIZER;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::conv::Conv2dConfig;
use burn::nn::{Initializer, PaddingConfig2d};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`FireBlock`] Meta trait.
pub trait FireBlockMeta {
    /// The size of the in channels dimension.
    fn in_channels(&self) -> usize;

    /// The squeeze conv output channels.
    fn squeeze_channels(&self) -> usize;

    /// Per-branch control factor for the expand conv channels.
    fn expansion_factor(&self) -> usize;

    /// Whether the block has an identity shortcut.
    fn bypass(&self) -> bool;

    /// Expand conv output channels, per branch.
    ///
    /// ``expand_channels = squeeze_channels * expansion_factor``
    fn expand_channels(&self) -> usize {
        self.squeeze_channels() * self.expansion_factor()
    }

    /// The size of the out channels dimension.
    ///
    /// The 1x1 and 3x3 expand branches are concatenated:
    /// ``out_channels = 2 * expand_channels``
    fn out_channels(&self) -> usize {
        2 * self.expand_channels()
    }
}

/// [`FireBlock`] Config.
///
/// Implements [`FireBlockMeta`].
#[derive(Config, Debug)]
pub struct FireBlockConfig {
    /// The size of the in channels dimension.
    pub in_channels: usize,

    /// The squeeze conv output channels.
    pub squeeze_channels: usize,

    /// Per-branch control factor for the expand conv channels.
    #[config(default = 4)]
    pub expansion_factor: usize,

    /// Whether the block has an identity shortcut.
    #[config(default = false)]
    pub bypass: bool,

    /// The [`Conv2d`](burn::nn::conv::Conv2d) initializer.
    #[config(default = "GLOROT_UNIFORM_INITIALIZER.clone()")]
    pub initializer: Initializer,
}

impl FireBlockMeta for FireBlockConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn squeeze_channels(&self) -> usize {
        self.squeeze_channels
    }

    fn expansion_factor(&self) -> usize {
        self.expansion_factor
    }

    fn bypass(&self) -> bool {
        self.bypass
    }
}

impl FireBlockConfig {
    /// Check if the config is valid.
    ///
    /// The identity shortcut is only well-formed when the block
    /// preserves the channel count.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        if self.bypass && self.in_channels() != self.out_channels() {
            return Err(format!(
                "bypass requires in_channels({}) == out_channels({})\n{:#?}",
                self.in_channels(),
                self.out_channels(),
                self,
            ));
        }
        Ok(())
    }

    /// Panic if `try_validate` returns an error.
    pub fn expect_valid(&self) {
        match self.try_validate() {
            Ok(_) => (),
            Err(err) => panic!("{}", err),
        }
    }

    /// Initialize a [`FireBlock`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> FireBlock<B> {
        self.expect_valid();

        let in_channels = self.in_channels();
        let squeeze_channels = self.squeeze_channels();
        let expand_channels = self.expand_channels();

        let squeeze: ConvAct2dConfig = Conv2dConfig::new([in_channels, squeeze_channels], [1, 1])
            .with_initializer(self.initializer.clone())
            .into();

        let expand1x1: ConvAct2dConfig =
            Conv2dConfig::new([squeeze_channels, expand_channels], [1, 1])
                .with_initializer(self.initializer.clone())
                .into();

        let expand3x3: ConvAct2dConfig =
            Conv2dConfig::new([squeeze_channels, expand_channels], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .with_initializer(self.initializer.clone())
                .into();

        FireBlock {
            bypass: self.bypass,

            squeeze: squeeze.init(device),
            expand1x1: expand1x1.init(device),
            expand3x3: expand3x3.init(device),
        }
    }
}

/// Fire Block for `SqueezeNet`.
///
/// A 1x1 squeeze conv feeding parallel 1x1 and 3x3 expand convs,
/// concatenated on the channel dimension, with an optional
/// identity shortcut.
///
/// Implements [`FireBlockMeta`].
#[derive(Module, Debug)]
pub struct FireBlock<B: Backend> {
    /// Whether the block has an identity shortcut.
    pub bypass: bool,

    /// Squeeze conv layer.
    pub squeeze: ConvAct2d<B>,

    /// 1x1 expand branch.
    pub expand1x1: ConvAct2d<B>,

    /// 3x3 expand branch.
    pub expand3x3: ConvAct2d<B>,
}

impl<B: Backend> FireBlockMeta for FireBlock<B> {
    fn in_channels(&self) -> usize {
        self.squeeze.in_channels()
    }

    fn squeeze_channels(&self) -> usize {
        self.squeeze.out_channels()
    }

    fn expansion_factor(&self) -> usize {
        self.expand1x1.out_channels() / self.squeeze_channels()
    }

    fn bypass(&self) -> bool {
        self.bypass
    }

    fn out_channels(&self) -> usize {
        self.expand1x1.out_channels() + self.expand3x3.out_channels()
    }
}

impl<B: Backend> FireBlock<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, height, width]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_channels=2*expand_channels, height, width]`` tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, height, width] = unpack_shape_contract!(
            ["batch", "in_channels", "height", "width"],
            &input,
            &["batch", "height", "width"],
            &[("in_channels", self.in_channels())],
        );

        let shortcut = if self.bypass {
            Some(input.clone())
        } else {
            None
        };

        let squeeze = self.squeeze.forward(input);

        let expand1x1 = self.expand1x1.forward(squeeze.clone());
        let expand3x3 = self.expand3x3.forward(squeeze);

        let x = Tensor::cat(vec![expand1x1, expand3x3], 1);

        let x = match shortcut {
            Some(shortcut) => x + shortcut,
            None => x,
        };

        assert_shape_contract_periodically!(
            ["batch", "out_channels", "height", "width"],
            &x,
            &[
                ("batch", batch),
                ("out_channels", self.out_channels()),
                ("height", height),
                ("width", width)
            ],
        );

        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::Distribution;

    #[test]
    fn test_fire_block_config() {
        let config = FireBlockConfig::new(96, 16);
        assert_eq!(config.in_channels(), 96);
        assert_eq!(config.squeeze_channels(), 16);
        assert_eq!(config.expansion_factor(), 4);
        assert_eq!(config.expand_channels(), 64);
        assert_eq!(config.out_channels(), 128);
        assert!(!config.bypass());
        config.expect_valid();

        let config = FireBlockConfig::new(128, 16).with_bypass(true);
        assert!(config.bypass());
        config.expect_valid();
    }

    #[test]
    fn test_fire_block_config_bypass_mismatch() {
        let config = FireBlockConfig::new(96, 16).with_bypass(true);
        assert!(config.try_validate().is_err());
    }

    #[test]
    #[should_panic(expected = "bypass requires in_channels(96) == out_channels(128)")]
    fn test_fire_block_config_bypass_mismatch_panic() {
        FireBlockConfig::new(96, 16).with_bypass(true).expect_valid();
    }

    #[test]
    fn test_fire_block_meta() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: FireBlock<B> = FireBlockConfig::new(8, 4).init(&device);

        assert_eq!(block.in_channels(), 8);
        assert_eq!(block.squeeze_channels(), 4);
        assert_eq!(block.expansion_factor(), 4);
        assert_eq!(block.expand_channels(), 16);
        assert_eq!(block.out_channels(), 32);
        assert!(!block.bypass());
    }

    #[test]
    fn test_fire_block_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let batch_size = 2;
        let height = 8;
        let width = 8;

        let block: FireBlock<B> = FireBlockConfig::new(8, 4).init(&device);

        let input = Tensor::random(
            [batch_size, 8, height, width],
            Distribution::Default,
            &device,
        );
        let output = block.forward(input.clone());

        assert_shape_contract!(
            ["batch", "out_channels", "height", "width"],
            &output,
            &[
                ("batch", batch_size),
                ("out_channels", 32),
                ("height", height),
                ("width", width)
            ],
        );

        let expected = {
            let squeeze = block.squeeze.forward(input);
            let expand1x1 = block.expand1x1.forward(squeeze.clone());
            let expand3x3 = block.expand3x3.forward(squeeze);
            Tensor::cat(vec![expand1x1, expand3x3], 1)
        };
        output.to_data().assert_eq(&expected.to_data(), true);
    }

    #[test]
    fn test_fire_block_forward_bypass() {
        type B = NdArray<f32>;
        let device = Default::default();

        let batch_size = 2;
        let channels = 32;
        let height = 8;
        let width = 8;

        let block: FireBlock<B> = FireBlockConfig::new(channels, 4).with_bypass(true).init(&device);
        assert_eq!(block.out_channels(), channels);

        let input = Tensor::random(
            [batch_size, channels, height, width],
            Distribution::Default,
            &device,
        );
        let output = block.forward(input.clone());

        let expected = {
            let squeeze = block.squeeze.forward(input.clone());
            let expand1x1 = block.expand1x1.forward(squeeze.clone());
            let expand3x3 = block.expand3x3.forward(squeeze);
            Tensor::cat(vec![expand1x1, expand3x3], 1) + input
        };
        output.to_data().assert_eq(&expected.to_data(), true);
    }

    #[test]
    fn test_fire_block_forward_autodiff() {
        type B = Autodiff<NdArray<f32>>;
        let device = Default::default();

        let block: FireBlock<B> = FireBlockConfig::new(32, 4).with_bypass(true).init(&device);

        let input = Tensor::ones([2, 32, 4, 4], &device);
        let output = block.forward(input);

        assert_shape_contract!(
            ["batch", "out_channels", "height", "width"],
            &output,
            &[
                ("batch", 2),
                ("out_channels", 32),
                ("height", 4),
                ("width", 4)
            ],
        );
    }
}
