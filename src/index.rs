//! Slice addressing - which axis a request runs along, and the coordinate on it

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Addressing mode for a slice request.
///
/// A closed set of four variants; [`crate::SeismicCube`] matches exhaustively
/// on it, so adding a variant forces every dispatch site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SliceIndex {
    /// All traces at one in-line number
    Inline(i32),
    /// All traces at one cross-line number
    Crossline(i32),
    /// One sample from every trace, at a depth coordinate
    Depth(f64),
    /// The single trace at an (in-line, cross-line) position
    Cdp(i32, i32),
}

impl fmt::Display for SliceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceIndex::Inline(v) => write!(f, "in-line {}", v),
            SliceIndex::Crossline(v) => write!(f, "cross-line {}", v),
            SliceIndex::Depth(v) => write!(f, "depth {}", v),
            SliceIndex::Cdp(il, xl) => write!(f, "CDP ({}, {})", il, xl),
        }
    }
}

/// Samples returned by a slice read.
///
/// In-line, cross-line and depth requests produce a 2D section; a CDP request
/// produces the single 1D trace.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceData {
    /// 2D section. Axis order is `[secondary spatial axis, depth]` for
    /// in-line/cross-line sections and `[in-line, cross-line]` for depth
    /// slices.
    Section(Array2<f32>),
    /// 1D trace of `n_depth` samples
    Trace(Array1<f32>),
}

impl SliceData {
    /// The 2D section, if this is one.
    pub fn into_section(self) -> Option<Array2<f32>> {
        match self {
            SliceData::Section(section) => Some(section),
            SliceData::Trace(_) => None,
        }
    }

    /// The 1D trace, if this is one.
    pub fn into_trace(self) -> Option<Array1<f32>> {
        match self {
            SliceData::Trace(trace) => Some(trace),
            SliceData::Section(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_index_display() {
        assert_eq!(SliceIndex::Inline(120).to_string(), "in-line 120");
        assert_eq!(SliceIndex::Crossline(305).to_string(), "cross-line 305");
        assert_eq!(SliceIndex::Depth(850.0).to_string(), "depth 850");
        assert_eq!(SliceIndex::Cdp(120, 305).to_string(), "CDP (120, 305)");
    }

    #[test]
    fn test_slice_data_accessors() {
        let section = SliceData::Section(arr2(&[[1.0f32, 2.0], [3.0, 4.0]]));
        assert!(section.clone().into_trace().is_none());
        assert_eq!(section.into_section().unwrap().shape(), &[2, 2]);
    }
}
