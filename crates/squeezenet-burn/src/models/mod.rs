//! Complete model families.
pub mod squeezenet;
