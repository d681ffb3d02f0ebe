//! Miscellaneous blocks.
pub mod conv_act;
