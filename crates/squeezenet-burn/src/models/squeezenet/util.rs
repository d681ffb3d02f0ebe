//! # `SqueezeNet` Utilities
use burn::nn::Initializer;

/// Default conv initializer; glorot/xavier uniform.
pub static GLOROT_UNIFORM_INITIALIZER: Initializer = Initializer::XavierUniform { gain: 1.0 };

/// Get the output resolution of a "same"-padded strided conv.
///
/// # Arguments
///
/// - `input_resolution`: ``[in_height, in_width]``.
/// - `stride`: the conv stride.
///
/// # Returns
///
/// ``[ceil(in_height / stride), ceil(in_width / stride)]``
#[inline(always)]
pub fn same_conv_output_resolution(
    input_resolution: [usize; 2],
    stride: usize,
) -> [usize; 2] {
    input_resolution.map(|dim| dim.div_ceil(stride))
}

/// Get the output resolution of an un-padded ("valid") pooling window.
///
/// # Arguments
///
/// - `input_resolution`: ``[in_height, in_width]``.
/// - `kernel_size`: the pooling window size.
/// - `stride`: the pooling stride.
///
/// # Returns
///
/// ``[(in_height - kernel_size) / stride + 1, (in_width - kernel_size) / stride + 1]``
///
/// # Panics
///
/// If the input resolution is smaller than the pooling window.
#[inline(always)]
pub fn valid_pool_output_resolution(
    input_resolution: [usize; 2],
    kernel_size: usize,
    stride: usize,
) -> [usize; 2] {
    input_resolution.map(|dim| {
        assert!(
            dim >= kernel_size,
            "input resolution {dim} is smaller than the pooling window {kernel_size}",
        );
        (dim - kernel_size) / stride + 1
    })
}
