//! Implements the constitutive models of the immersed elastic body

mod elastic;
pub use crate::material::elastic::*;
