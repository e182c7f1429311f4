//! Storage backends for trace-based seismic volumes
//!
//! A [`TraceStore`] hands out short-lived read or read-write handles. Handles
//! are scoped: the accessor opens one per call and drops it on every exit
//! path, so no file handle outlives a single read or write.

use crate::error::{CubeError, Result};
use ndarray::{Array1, Array2};
use parking_lot::RwLock;
use std::sync::Arc;

/// A storage backend holding one seismic volume as fixed-length traces.
pub trait TraceStore {
    /// Open the volume for reading
    fn open_read(&self) -> Result<Box<dyn ReadHandle>>;

    /// Open the volume for in-place modification
    fn open_read_write(&self) -> Result<Box<dyn WriteHandle>>;
}

/// Read access to one volume. Closed when dropped.
pub trait ReadHandle {
    /// Ordered distinct in-line numbers from the trace headers
    fn distinct_inlines(&self) -> Result<Vec<i32>>;

    /// Ordered distinct cross-line numbers from the trace headers
    fn distinct_crosslines(&self) -> Result<Vec<i32>>;

    /// Ordered depth coordinates of the trace samples
    fn sample_coordinates(&self) -> Result<Vec<f64>>;

    /// All traces at one in-line, cross-line ascending; shape `[n_north, n_depth]`
    fn inline_section(&mut self, inline: i32) -> Result<Array2<f32>>;

    /// All traces at one cross-line, in-line ascending; shape `[n_east, n_depth]`
    fn crossline_section(&mut self, crossline: i32) -> Result<Array2<f32>>;

    /// One sample from every trace at a depth coordinate; shape `[n_east, n_north]`
    fn depth_slice(&mut self, depth: f64) -> Result<Array2<f32>>;

    /// The single trace at (in-line, cross-line); length `n_depth`
    fn trace(&mut self, inline: i32, crossline: i32) -> Result<Array1<f32>>;
}

/// Write access to one volume. Closed when dropped.
pub trait WriteHandle {
    /// Overwrite every trace at one in-line with the rows of `section`,
    /// cross-line ascending; `section` has shape `[n_north, n_depth]`.
    fn overwrite_inline(&mut self, inline: i32, section: &Array2<f32>) -> Result<()>;
}

struct MemoryInner {
    inlines: Vec<i32>,
    crosslines: Vec<i32>,
    samples: Vec<f64>,
    // Inline-major trace order, n_depth samples per trace
    data: RwLock<Vec<f32>>,
}

impl MemoryInner {
    fn inline_index(&self, inline: i32) -> Result<usize> {
        self.inlines
            .iter()
            .position(|&il| il == inline)
            .ok_or_else(|| CubeError::NotFound(format!("in-line {} not in store", inline)))
    }

    fn crossline_index(&self, crossline: i32) -> Result<usize> {
        self.crosslines
            .iter()
            .position(|&xl| xl == crossline)
            .ok_or_else(|| CubeError::NotFound(format!("cross-line {} not in store", crossline)))
    }

    fn sample_index(&self, depth: f64) -> Result<usize> {
        let tolerance = if self.samples.len() > 1 {
            (self.samples[1] - self.samples[0]).abs() * 1e-4
        } else {
            f64::EPSILON
        };
        self.samples
            .iter()
            .position(|&s| (s - depth).abs() <= tolerance)
            .ok_or_else(|| CubeError::NotFound(format!("depth {} not in store", depth)))
    }

    fn trace_offset(&self, inline_idx: usize, crossline_idx: usize) -> usize {
        (inline_idx * self.crosslines.len() + crossline_idx) * self.samples.len()
    }
}

/// In-memory trace store.
///
/// Useful as a test double and for building synthetic cubes. Clones share the
/// underlying volume. Concurrent reads are safe; writers take the lock
/// exclusively, but coordinating overlapping writes is still the caller's
/// responsibility.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    /// Create a zero-filled volume over the given header tables.
    pub fn new(inlines: Vec<i32>, crosslines: Vec<i32>, samples: Vec<f64>) -> Self {
        let len = inlines.len() * crosslines.len() * samples.len();
        Self {
            inner: Arc::new(MemoryInner {
                inlines,
                crosslines,
                samples,
                data: RwLock::new(vec![0.0; len]),
            }),
        }
    }

    /// Create a volume with every sample produced by `fill(inline, crossline, depth)`.
    pub fn from_fn<F>(
        inlines: Vec<i32>,
        crosslines: Vec<i32>,
        samples: Vec<f64>,
        fill: F,
    ) -> Self
    where
        F: Fn(i32, i32, f64) -> f32,
    {
        let mut data = Vec::with_capacity(inlines.len() * crosslines.len() * samples.len());
        for &il in &inlines {
            for &xl in &crosslines {
                for &depth in &samples {
                    data.push(fill(il, xl, depth));
                }
            }
        }
        Self {
            inner: Arc::new(MemoryInner {
                inlines,
                crosslines,
                samples,
                data: RwLock::new(data),
            }),
        }
    }

    /// Snapshot of the raw sample buffer, inline-major trace order.
    pub fn raw_samples(&self) -> Vec<f32> {
        self.inner.data.read().clone()
    }
}

impl TraceStore for MemoryStore {
    fn open_read(&self) -> Result<Box<dyn ReadHandle>> {
        Ok(Box::new(MemoryHandle {
            inner: Arc::clone(&self.inner),
        }))
    }

    fn open_read_write(&self) -> Result<Box<dyn WriteHandle>> {
        Ok(Box::new(MemoryHandle {
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MemoryHandle {
    inner: Arc<MemoryInner>,
}

impl ReadHandle for MemoryHandle {
    fn distinct_inlines(&self) -> Result<Vec<i32>> {
        Ok(self.inner.inlines.clone())
    }

    fn distinct_crosslines(&self) -> Result<Vec<i32>> {
        Ok(self.inner.crosslines.clone())
    }

    fn sample_coordinates(&self) -> Result<Vec<f64>> {
        Ok(self.inner.samples.clone())
    }

    fn inline_section(&mut self, inline: i32) -> Result<Array2<f32>> {
        let inner = &self.inner;
        let il_idx = inner.inline_index(inline)?;
        let n_north = inner.crosslines.len();
        let n_depth = inner.samples.len();

        let data = inner.data.read();
        let start = inner.trace_offset(il_idx, 0);
        let block = data[start..start + n_north * n_depth].to_vec();
        Array2::from_shape_vec((n_north, n_depth), block)
            .map_err(|e| CubeError::InvalidFormat(e.to_string()))
    }

    fn crossline_section(&mut self, crossline: i32) -> Result<Array2<f32>> {
        let inner = &self.inner;
        let xl_idx = inner.crossline_index(crossline)?;
        let n_east = inner.inlines.len();
        let n_depth = inner.samples.len();

        let data = inner.data.read();
        let mut section = Vec::with_capacity(n_east * n_depth);
        for il_idx in 0..n_east {
            let start = inner.trace_offset(il_idx, xl_idx);
            section.extend_from_slice(&data[start..start + n_depth]);
        }
        Array2::from_shape_vec((n_east, n_depth), section)
            .map_err(|e| CubeError::InvalidFormat(e.to_string()))
    }

    fn depth_slice(&mut self, depth: f64) -> Result<Array2<f32>> {
        let inner = &self.inner;
        let sample_idx = inner.sample_index(depth)?;
        let n_east = inner.inlines.len();
        let n_north = inner.crosslines.len();

        let data = inner.data.read();
        let mut slice = Vec::with_capacity(n_east * n_north);
        for il_idx in 0..n_east {
            for xl_idx in 0..n_north {
                slice.push(data[inner.trace_offset(il_idx, xl_idx) + sample_idx]);
            }
        }
        Array2::from_shape_vec((n_east, n_north), slice)
            .map_err(|e| CubeError::InvalidFormat(e.to_string()))
    }

    fn trace(&mut self, inline: i32, crossline: i32) -> Result<Array1<f32>> {
        let inner = &self.inner;
        let il_idx = inner
            .inline_index(inline)
            .map_err(|_| CubeError::TraceNotFound { inline, crossline })?;
        let xl_idx = inner
            .crossline_index(crossline)
            .map_err(|_| CubeError::TraceNotFound { inline, crossline })?;
        let n_depth = inner.samples.len();

        let data = inner.data.read();
        let start = inner.trace_offset(il_idx, xl_idx);
        Ok(Array1::from_vec(data[start..start + n_depth].to_vec()))
    }
}

impl WriteHandle for MemoryHandle {
    fn overwrite_inline(&mut self, inline: i32, section: &Array2<f32>) -> Result<()> {
        let inner = &self.inner;
        let il_idx = inner
            .inline_index(inline)
            .map_err(|e| CubeError::StorageWrite(e.to_string()))?;
        let n_north = inner.crosslines.len();
        let n_depth = inner.samples.len();

        if section.dim() != (n_north, n_depth) {
            return Err(CubeError::ShapeMismatch {
                expected: (n_north, n_depth),
                actual: section.dim(),
            });
        }

        let mut data = inner.data.write();
        for (xl_idx, row) in section.outer_iter().enumerate() {
            let start = inner.trace_offset(il_idx, xl_idx);
            for (k, &sample) in row.iter().enumerate() {
                data[start + k] = sample;
            }
        }
        Ok(())
    }
}
