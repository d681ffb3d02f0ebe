//! # `SqueezeNet` Fire Group
//!
//! A [`FireGroup`] is a sequence of [`FireBlock`]s followed by
//! delayed downsampling.
//!
//! [`FireGroupMeta`] defines a common meta API for [`FireGroup`]
//! and [`FireGroupConfig`].
//!
//! [`FireGroupConfig`] implements [`Config`], and provides
//! [`FireGroupConfig::init`] to initialize a [`FireGroup`].
//!
//! [`FireGroup`] implements [`Module`], and provides
//! [`FireGroup::forward`].

use crate::models::squeezenet::fire_block::{FireBlock, FireBlockConfig, FireBlockMeta};
use crate::models::squeezenet::util::valid_pool_output_resolution;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::config::Config;
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::prelude::{Backend, Module, Tensor};

/// The downsampling pool window size.
pub const DOWNSAMPLE_KERNEL_SIZE: usize = 3;

/// The downsampling pool stride.
pub const DOWNSAMPLE_STRIDE: usize = 2;

/// [`FireGroup`] Meta API.
pub trait FireGroupMeta {
    /// The number of blocks.
    fn len(&self) -> usize;

    /// Check if the group is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of input feature channels.
    fn in_channels(&self) -> usize;

    /// The number of output feature channels.
    fn out_channels(&self) -> usize;

    /// Whether the group ends with a downsampling pool.
    fn downsample(&self) -> bool;

    /// Get the output resolution for a given input resolution.
    ///
    /// Fire blocks preserve resolution; only the trailing pool
    /// (when present) reduces it.
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
    /// If the input resolution is smaller than the pooling window.
    fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        if self.downsample() {
            valid_pool_output_resolution(input_resolution, DOWNSAMPLE_KERNEL_SIZE, DOWNSAMPLE_STRIDE)
        } else {
            input_resolution
        }
    }
}

/// [`FireGroup`] Configuration.
#[derive(Config, Debug)]
pub struct FireGroupConfig {
    /// The component blocks.
    pub blocks: Vec<FireBlockConfig>,

    /// Whether the group ends with a downsampling pool.
    #[config(default = true)]
    pub downsample: bool,
}

impl From<Vec<FireBlockConfig>> for FireGroupConfig {
    fn from(blocks: Vec<FireBlockConfig>) -> Self {
        Self {
            blocks,
            downsample: true,
        }
    }
}

impl FireGroupMeta for FireGroupConfig {
    fn len(&self) -> usize {
        self.blocks.len()
    }

    fn in_channels(&self) -> usize {
        self.blocks[0].in_channels()
    }

    fn out_channels(&self) -> usize {
        self.blocks[self.blocks.len() - 1].out_channels()
    }

    fn downsample(&self) -> bool {
        self.downsample
    }
}

impl FireGroupConfig {
    /// Check if the config is valid.
    ///
    /// # Returns
    ///
    /// A `Result<(), String>`
    pub fn try_validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("blocks is empty".to_string());
        }

        for idx in 1..self.blocks.len() {
            let prev = &self.blocks[idx - 1];
            let curr = &self.blocks[idx];
            if prev.out_channels() != curr.in_channels() {
                return Err(format!(
                    "block[{}].out_channels({}) != block[{}].in_channels({})\n{:#?}",
                    idx - 1,
                    prev.out_channels(),
                    idx,
                    curr.in_channels(),
                    self,
                ));
            }
        }

        for block in &self.blocks {
            block.try_validate()?;
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

    /// Initialize a new [`FireGroup`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> FireGroup<B> {
        self.expect_valid();

        let pool = if self.downsample {
            Some(
                MaxPool2dConfig::new([DOWNSAMPLE_KERNEL_SIZE, DOWNSAMPLE_KERNEL_SIZE])
                    .with_strides([DOWNSAMPLE_STRIDE, DOWNSAMPLE_STRIDE])
                    .init(),
            )
        } else {
            None
        };

        FireGroup {
            blocks: self
                .blocks
                .into_iter()
                .map(|block| block.init(device))
                .collect(),
            pool,
        }
    }
}

/// Fire group.
#[derive(Module, Debug)]
pub struct FireGroup<B: Backend> {
    /// Internal blocks.
    pub blocks: Vec<FireBlock<B>>,

    /// Optional trailing downsampling pool.
    pub pool: Option<MaxPool2d>,
}

impl<B: Backend> FireGroupMeta for FireGroup<B> {
    fn len(&self) -> usize {
        self.blocks.len()
    }

    fn in_channels(&self) -> usize {
        self.blocks[0].in_channels()
    }

    fn out_channels(&self) -> usize {
        self.blocks[self.blocks.len() - 1].out_channels()
    }

    fn downsample(&self) -> bool {
        self.pool.is_some()
    }
}

impl<B: Backend> FireGroup<B> {
    /// Apply the fire group.
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

        let x = self.blocks.iter().fold(input, |x, block| block.forward(x));

        let x = match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        };

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
