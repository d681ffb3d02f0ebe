#![warn(missing_docs)]
//!# squeezenet-burn - SqueezeNet-Bypass Image Models
//!
//! ## Notable Components
//!
//! * [`layers`] - reusable neural network modules.
//!   * [`layers::blocks`] - miscellaneous blocks.
//!     * [`layers::blocks::conv_act`] - ``Conv2d + ReLU`` block.
//! * [`models`] - complete model families.
//!   * [`models::squeezenet`] - SqueezeNet v1.0 with simple bypass.

extern crate core;
/// Test-only macro import.
#[cfg(test)]
#[allow(unused_imports)]
#[macro_use]
extern crate hamcrest;

pub mod layers;

pub mod models;
