//! Binary asset formats
//!
//! This module contains the on-disk layout of exported models.

mod model;

pub use model::*;
