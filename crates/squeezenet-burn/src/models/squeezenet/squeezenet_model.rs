//! # `SqueezeNet`-Bypass Core Model
//!
//! [`SqueezeNetBypassConfig`] expands a declarative group table
//! ([`FireBlockSpec`]s) into a concrete layered graph: the stem,
//! a sequence of [`FireGroup`]s with delayed downsampling, dropout,
//! and the classification head.

use crate::models::squeezenet::classifier::{Classifier, ClassifierConfig, ClassifierMeta};
use crate::models::squeezenet::fire_block::{FireBlockConfig, FireBlockMeta};
use crate::models::squeezenet::fire_group::{FireGroup, FireGroupConfig};
use crate::models::squeezenet::stem::{Stem, StemConfig, StemMeta};
use crate::models::squeezenet::util::GLOROT_UNIFORM_INITIALIZER;
use burn::nn::{Dropout, DropoutConfig, Initializer};
use burn::prelude::{Backend, Config, Module, Tensor};

/// Declarative spec for one fire block in the group table.
#[derive(Config, Debug, PartialEq, Eq)]
pub struct FireBlockSpec {
    /// The squeeze conv output channels.
    pub squeeze_channels: usize,

    /// Whether the block has an identity shortcut.
    #[config(default = false)]
    pub bypass: bool,
}

impl From<(usize, bool)> for FireBlockSpec {
    fn from((squeeze_channels, bypass): (usize, bool)) -> Self {
        Self {
            squeeze_channels,
            bypass,
        }
    }
}

/// [`SqueezeNetBypass`] Config.
#[derive(Config, Debug)]
pub struct SqueezeNetBypassConfig {
    /// Fire blocks per group.
    ///
    /// Every group but the last is followed by a downsampling pool.
    pub groups: Vec<Vec<FireBlockSpec>>,

    /// Dropout rate, applied after the last fire group.
    #[config(default = 0.5)]
    pub dropout: f64,

    /// The number of input image channels.
    #[config(default = 3)]
    pub in_channels: usize,

    /// The stem conv output channels.
    #[config(default = 96)]
    pub stem_channels: usize,

    /// The number of output classes.
    #[config(default = 1000)]
    pub num_classes: usize,

    /// The [`Conv2d`](burn::nn::conv::Conv2d) initializer.
    #[config(default = "GLOROT_UNIFORM_INITIALIZER.clone()")]
    pub initializer: Initializer,
}

impl SqueezeNetBypassConfig {
    /// Expand the group table into [`FireGroupConfig`]s.
    ///
    /// Channel counts are chained from the stem through the table;
    /// every group but the last gets a downsampling pool.
    pub fn group_configs(&self) -> Vec<FireGroupConfig> {
        let num_groups = self.groups.len();

        let mut in_channels = self.stem_channels;
        let mut groups = Vec::with_capacity(num_groups);
        for (idx, specs) in self.groups.iter().enumerate() {
            let mut blocks = Vec::with_capacity(specs.len());
            for spec in specs {
                let block = FireBlockConfig::new(in_channels, spec.squeeze_channels)
                    .with_bypass(spec.bypass)
                    .with_initializer(self.initializer.clone());
                in_channels = block.out_channels();
                blocks.push(block);
            }
            groups.push(FireGroupConfig::new(blocks).with_downsample(idx + 1 < num_groups));
        }
        groups
    }

    /// The number of feature channels entering the classifier.
    pub fn feature_channels(&self) -> usize {
        let mut channels = self.stem_channels;
        for spec in self.groups.iter().flatten() {
            channels = FireBlockConfig::new(channels, spec.squeeze_channels).out_channels();
        }
        channels
    }

    /// Check if the config is valid.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        if self.groups.is_empty() {
            return Err("groups is empty".to_string());
        }

        for group in self.group_configs() {
            group.try_validate()?;
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

    /// Initialize a [`SqueezeNetBypass`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> SqueezeNetBypass<B> {
        self.expect_valid();

        let stem = StemConfig::new()
            .with_in_channels(self.in_channels)
            .with_out_channels(self.stem_channels)
            .with_initializer(self.initializer.clone());

        let groups = self.group_configs();

        let classifier = ClassifierConfig::new(self.feature_channels(), self.num_classes)
            .with_initializer(self.initializer.clone());

        SqueezeNetBypass {
            stem: stem.init(device),
            groups: groups.into_iter().map(|group| group.init(device)).collect(),
            dropout: DropoutConfig::new(self.dropout).init(),
            classifier: classifier.init(device),
        }
    }
}

/// `SqueezeNet` v1.0 with simple bypass.
#[derive(Module, Debug)]
pub struct SqueezeNetBypass<B: Backend> {
    /// The input stem.
    pub stem: Stem<B>,

    /// The fire groups.
    pub groups: Vec<FireGroup<B>>,

    /// Dropout, delayed to the end of the fire groups.
    pub dropout: Dropout,

    /// The classification head.
    pub classifier: Classifier<B>,
}

impl<B: Backend> SqueezeNetBypass<B> {
    /// The number of input image channels.
    pub fn in_channels(&self) -> usize {
        self.stem.in_channels()
    }

    /// The number of output classes.
    pub fn num_classes(&self) -> usize {
        self.classifier.num_classes()
    }

    /// `SqueezeNetBypass` forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, height, width]``.
    ///
    /// # Returns
    ///
    /// A ``[batch, num_classes]`` tensor of class probabilities.
    #[tracing::instrument(skip_all)]
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let x = self.stem.forward(input);

        let x = self.groups.iter().fold(x, |x, group| group.forward(x));

        let x = self.dropout.forward(x);

        self.classifier.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::squeezenet::fire_group::FireGroupMeta;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::Distribution;

    fn tiny_config() -> SqueezeNetBypassConfig {
        SqueezeNetBypassConfig::new(vec![
            vec![(2, false).into(), (2, true).into()],
            vec![(4, false).into()],
        ])
        .with_stem_channels(16)
        .with_num_classes(5)
    }

    #[test]
    fn test_config_group_configs() {
        let config = tiny_config();
        config.expect_valid();

        let groups = config.group_configs();
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].in_channels(), 16);
        assert_eq!(groups[0].out_channels(), 16);
        assert!(groups[0].downsample());

        assert_eq!(groups[1].len(), 1);
        assert_eq!(groups[1].in_channels(), 16);
        assert_eq!(groups[1].out_channels(), 32);
        assert!(!groups[1].downsample());

        assert_eq!(config.feature_channels(), 32);
    }

    #[test]
    fn test_config_validation() {
        let config = SqueezeNetBypassConfig::new(vec![]);
        assert!(config.try_validate().is_err());

        let config = SqueezeNetBypassConfig::new(vec![vec![]]);
        assert!(config.try_validate().is_err());

        // 96 in-channels != 16 * 8 out-channels.
        let config = SqueezeNetBypassConfig::new(vec![vec![(16, true).into()]]);
        let err = config.try_validate().unwrap_err();
        assert!(err.contains("bypass requires in_channels(96) == out_channels(128)"));
    }

    #[test]
    #[should_panic(expected = "groups is empty")]
    fn test_config_empty_panic() {
        SqueezeNetBypassConfig::new(vec![]).expect_valid();
    }

    #[test]
    fn test_model_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let config = tiny_config();
        let model: SqueezeNetBypass<B> = config.init(&device);

        assert_eq!(model.in_channels(), 3);
        assert_eq!(model.num_classes(), 5);
        assert_eq!(model.groups.len(), 2);

        let batch_size = 2;
        let input = Tensor::random([batch_size, 3, 32, 32], Distribution::Default, &device);
        let output = model.forward(input);

        assert_shape_contract!(
            ["batch", "num_classes"],
            &output,
            &[("batch", batch_size), ("num_classes", 5)],
        );

        let data = output.to_data().to_vec::<f32>().unwrap();
        for row in data.chunks(5) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "row sum {sum} != 1.0");
        }
    }

    #[test]
    fn test_model_forward_autodiff() {
        type B = Autodiff<NdArray<f32>>;
        let device = Default::default();

        let model: SqueezeNetBypass<B> = tiny_config().init(&device);

        let input = Tensor::ones([1, 3, 32, 32], &device);
        let output = model.forward(input);

        assert_shape_contract!(
            ["batch", "num_classes"],
            &output,
            &[("batch", 1), ("num_classes", 5)],
        );
    }
}
