//! Per-candidate feature extraction: normalization, syntax trees and the
//! sequence ratios built on top of them.

pub mod ast;
pub mod normalize;
pub mod similarity;
