//! # `SqueezeNet` v1.0 with simple bypass (2016)
//!
//! Paper: <https://arxiv.org/pdf/1602.07360.pdf>

pub mod classifier;
pub mod fire_block;
pub mod fire_group;
pub mod prefabs;
pub mod squeezenet_model;
pub mod stem;
pub mod util;
