//! Seismic cube access - main API for reading and writing volume slices

use crate::error::{CubeError, Result};
use crate::geometry::GeometryModel;
use crate::index::{SliceData, SliceIndex};
use crate::store::TraceStore;
use ndarray::{Array1, Array2};
use std::fmt;

/// Main interface to one seismic volume.
///
/// Opens the backend once to derive the [`GeometryModel`], then translates
/// every [`SliceIndex`] request into the matching backend call. Each read or
/// write opens a fresh scoped handle and drops it before returning, on error
/// paths included; no handle is cached across calls.
pub struct SeismicCube {
    store: Box<dyn TraceStore>,
    geometry: GeometryModel,
}

impl SeismicCube {
    /// Open a volume: scan the backend's trace headers and derive the grid.
    ///
    /// Fails with [`CubeError::MalformedGeometry`] when the headers do not
    /// describe a regular grid.
    pub fn open(store: Box<dyn TraceStore>) -> Result<Self> {
        let geometry = {
            let handle = store.open_read()?;
            GeometryModel::derive(
                &handle.distinct_inlines()?,
                &handle.distinct_crosslines()?,
                &handle.sample_coordinates()?,
            )?
        };
        Ok(Self { store, geometry })
    }

    /// The derived grid description
    pub fn geometry(&self) -> &GeometryModel {
        &self.geometry
    }

    /// Read the slice addressed by `index`.
    ///
    /// In-line, cross-line and depth requests demand an exact grid node and
    /// fail with [`CubeError::InvalidCoordinate`] otherwise; reads never
    /// auto-snap. CDP requests pass through unvalidated and surface a missing
    /// trace as [`CubeError::TraceNotFound`].
    pub fn read(&self, index: SliceIndex) -> Result<SliceData> {
        match index {
            SliceIndex::Inline(v) => self.inline(v).map(SliceData::Section),
            SliceIndex::Crossline(v) => self.crossline(v).map(SliceData::Section),
            SliceIndex::Depth(v) => self.depth(v).map(SliceData::Section),
            SliceIndex::Cdp(il, xl) => self.cdp(il, xl).map(SliceData::Trace),
        }
    }

    /// In-line section, cross-line ascending; shape `[n_north, n_depth]`.
    pub fn inline(&self, inline: i32) -> Result<Array2<f32>> {
        let axis = &self.geometry.inline;
        if !axis.contains_node(inline) {
            return Err(CubeError::InvalidCoordinate(format!(
                "in-line {} is not on the {} - {} - {} grid",
                inline, axis.start, axis.end, axis.step
            )));
        }
        let mut handle = self.store.open_read()?;
        handle.inline_section(inline)
    }

    /// Cross-line section, in-line ascending; shape `[n_east, n_depth]`.
    pub fn crossline(&self, crossline: i32) -> Result<Array2<f32>> {
        let axis = &self.geometry.crossline;
        if !axis.contains_node(crossline) {
            return Err(CubeError::InvalidCoordinate(format!(
                "cross-line {} is not on the {} - {} - {} grid",
                crossline, axis.start, axis.end, axis.step
            )));
        }
        let mut handle = self.store.open_read()?;
        handle.crossline_section(crossline)
    }

    /// Depth slice; shape `[n_east, n_north]`.
    pub fn depth(&self, depth: f64) -> Result<Array2<f32>> {
        let axis = &self.geometry.depth;
        if axis.index_of(depth).is_none() {
            return Err(CubeError::InvalidCoordinate(format!(
                "depth {} is not on the {} - {} - {} grid",
                depth, axis.start, axis.end, axis.step
            )));
        }
        let mut handle = self.store.open_read()?;
        handle.depth_slice(depth)
    }

    /// The single trace at (in-line, cross-line); length `n_depth`.
    pub fn cdp(&self, inline: i32, crossline: i32) -> Result<Array1<f32>> {
        let mut handle = self.store.open_read()?;
        handle.trace(inline, crossline)
    }

    /// Overwrite the slice addressed by `index` with `section`.
    ///
    /// Only [`SliceIndex::Inline`] is a writable target; the payload must
    /// have shape `(n_north, n_depth)`, checked before any I/O so a shape
    /// error leaves the backend untouched. Backend I/O failures surface as
    /// [`CubeError::StorageWrite`]; there is exactly one attempt, retry
    /// policy is the caller's.
    pub fn write(&mut self, index: SliceIndex, section: &Array2<f32>) -> Result<()> {
        let inline = match index {
            SliceIndex::Inline(v) => v,
            other => {
                return Err(CubeError::UnsupportedOperation(format!(
                    "only in-line sections are writable, got {}",
                    other
                )))
            }
        };

        let expected = (self.geometry.n_north(), self.geometry.n_depth());
        if section.dim() != expected {
            return Err(CubeError::ShapeMismatch {
                expected,
                actual: section.dim(),
            });
        }

        let mut handle = self.store.open_read_write().map_err(as_write_error)?;
        handle
            .overwrite_inline(inline, section)
            .map_err(as_write_error)
    }

    /// Snap an arbitrary (in-line, cross-line) coordinate to the nearest grid
    /// node. See [`GeometryModel::snap_to_nearest_node`] for the tie rule.
    pub fn snap_to_nearest_node(&self, inline: i32, crossline: i32) -> (i32, i32) {
        self.geometry.snap_to_nearest_node(inline, crossline)
    }
}

impl fmt::Debug for SeismicCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeismicCube")
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SeismicCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.geometry, f)
    }
}

fn as_write_error(err: CubeError) -> CubeError {
    match err {
        e @ (CubeError::StorageWrite(_) | CubeError::ShapeMismatch { .. }) => e,
        other => CubeError::StorageWrite(other.to_string()),
    }
}
