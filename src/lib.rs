//! Seiscube - coordinate-indexed access to regular 3D seismic volumes
//!
//! A pure Rust library for reading and writing 2D slices of a regularly
//! sampled 3D seismic data volume held in trace-based storage, addressed by
//! survey coordinates instead of file offsets.
//!
//! # Features
//!
//! - Grid geometry (in-line/cross-line/depth ranges and steps) derived once
//!   from the backend's trace headers, validated for regularity
//! - Slice addressing by in-line, cross-line, depth coordinate or single
//!   (in-line, cross-line) CDP trace
//! - Nearest-grid-node snapping for off-grid coordinates
//! - In-place overwrite of one in-line's traces
//! - Storage behind the `TraceStore` trait; in-memory and flat-file backends
//!   included, implement the trait for anything else
//!
//! # Example
//!
//! ```rust,ignore
//! use seiscube::{FlatFileStore, SeismicCube, SliceIndex};
//!
//! fn example() -> seiscube::Result<()> {
//!     let store = FlatFileStore::open("/data/surveys/north-sea")?;
//!     let cube = SeismicCube::open(Box::new(store))?;
//!
//!     // One in-line section, shape [n_north, n_depth]
//!     let section = cube.read(SliceIndex::Inline(120))?;
//!
//!     // Off-grid coordinates snap to the nearest trace position
//!     let (il, xl) = cube.snap_to_nearest_node(121, 3007);
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod error;
pub mod file;
pub mod geometry;
pub mod index;
pub mod store;
pub mod utils;

// Re-exports
pub use access::SeismicCube;
pub use error::{CubeError, Result};
pub use file::{FlatFileStore, SurveyHeader};
pub use geometry::{DepthAxis, GeometryModel, LineAxis};
pub use index::{SliceData, SliceIndex};
pub use store::{MemoryStore, ReadHandle, TraceStore, WriteHandle};

/// Version of the seiscube implementation
pub const SEISCUBE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!SEISCUBE_VERSION.is_empty());
    }
}
