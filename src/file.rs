//! Flat-file trace store
//!
//! One volume lives in a directory holding `survey.json` (header tables and
//! timestamps) and `traces.bin` (little-endian f32 samples, inline-major
//! trace order). Traces are fixed length, so any trace, in-line block or
//! single sample is addressable by offset; writes overwrite one in-line's
//! block in place.

use crate::error::{CubeError, Result};
use crate::store::{ReadHandle, TraceStore, WriteHandle};
use crate::utils::{bytes_to_samples, samples_to_bytes};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER_FILE: &str = "survey.json";
const TRACES_FILE: &str = "traces.bin";

/// Flat-file format version
pub const FORMAT_VERSION: u32 = 1;

/// Header of a flat-file volume: the axis tables every geometry scan reads,
/// plus bookkeeping timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyHeader {
    /// Format version
    pub version: u32,

    /// Ordered distinct in-line numbers
    pub inlines: Vec<i32>,

    /// Ordered distinct cross-line numbers
    pub crosslines: Vec<i32>,

    /// Ordered depth coordinates of the trace samples
    pub samples: Vec<f64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl SurveyHeader {
    /// Create a header over the given axis tables.
    pub fn new(inlines: Vec<i32>, crosslines: Vec<i32>, samples: Vec<f64>) -> Self {
        let now = Utc::now();
        Self {
            version: FORMAT_VERSION,
            inlines,
            crosslines,
            samples,
            created_at: now,
            modified_at: now,
        }
    }

    /// Total number of traces in the volume
    pub fn n_traces(&self) -> usize {
        self.inlines.len() * self.crosslines.len()
    }

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

    fn trace_bytes(&self) -> u64 {
        self.samples.len() as u64 * 4
    }

    fn trace_offset(&self, inline_idx: usize, crossline_idx: usize) -> u64 {
        (inline_idx * self.crosslines.len() + crossline_idx) as u64 * self.trace_bytes()
    }
}

/// Trace store backed by a flat file pair on the local filesystem.
#[derive(Debug)]
pub struct FlatFileStore {
    root: PathBuf,
}

impl FlatFileStore {
    /// Open an existing volume directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.join(HEADER_FILE).is_file() {
            return Err(CubeError::NotFound(format!(
                "no {} under {}",
                HEADER_FILE,
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Create a new zero-filled volume directory over the given axis tables.
    pub fn create(
        root: impl AsRef<Path>,
        inlines: Vec<i32>,
        crosslines: Vec<i32>,
        samples: Vec<f64>,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.join(HEADER_FILE).is_file() {
            return Err(CubeError::AlreadyExists(format!(
                "{} already holds a volume",
                root.display()
            )));
        }
        fs::create_dir_all(&root)?;

        let header = SurveyHeader::new(inlines, crosslines, samples);
        write_header(&root, &header)?;

        // Zero-fill one in-line block at a time
        let mut file = File::create(root.join(TRACES_FILE))?;
        let block = vec![0u8; header.crosslines.len() * header.samples.len() * 4];
        for _ in 0..header.inlines.len() {
            file.write_all(&block)?;
        }
        file.flush()?;

        Ok(Self { root })
    }

    /// Directory holding this volume
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the volume header.
    pub fn header(&self) -> Result<SurveyHeader> {
        read_header(&self.root)
    }
}

fn read_header(root: &Path) -> Result<SurveyHeader> {
    let text = fs::read_to_string(root.join(HEADER_FILE))?;
    let header: SurveyHeader = serde_json::from_str(&text)?;
    if header.version != FORMAT_VERSION {
        return Err(CubeError::InvalidFormat(format!(
            "unsupported flat-file version {}",
            header.version
        )));
    }
    Ok(header)
}

fn write_header(root: &Path, header: &SurveyHeader) -> Result<()> {
    let text = serde_json::to_string_pretty(header)?;
    fs::write(root.join(HEADER_FILE), text)?;
    Ok(())
}

impl TraceStore for FlatFileStore {
    fn open_read(&self) -> Result<Box<dyn ReadHandle>> {
        let header = read_header(&self.root)?;
        let file = File::open(self.root.join(TRACES_FILE))?;
        Ok(Box::new(FlatFileReadHandle { header, file }))
    }

    fn open_read_write(&self) -> Result<Box<dyn WriteHandle>> {
        let header = read_header(&self.root)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.root.join(TRACES_FILE))?;
        Ok(Box::new(FlatFileWriteHandle {
            header,
            file,
            root: self.root.clone(),
        }))
    }
}

struct FlatFileReadHandle {
    header: SurveyHeader,
    file: File,
}

impl FlatFileReadHandle {
    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<f32>> {
        let mut buf = vec![0u8; len * 4];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;
        bytes_to_samples(&buf)
    }
}

impl ReadHandle for FlatFileReadHandle {
    fn distinct_inlines(&self) -> Result<Vec<i32>> {
        Ok(self.header.inlines.clone())
    }

    fn distinct_crosslines(&self) -> Result<Vec<i32>> {
        Ok(self.header.crosslines.clone())
    }

    fn sample_coordinates(&self) -> Result<Vec<f64>> {
        Ok(self.header.samples.clone())
    }

    fn inline_section(&mut self, inline: i32) -> Result<Array2<f32>> {
        let il_idx = self.header.inline_index(inline)?;
        let n_north = self.header.crosslines.len();
        let n_depth = self.header.samples.len();

        let offset = self.header.trace_offset(il_idx, 0);
        let block = self.read_at(offset, n_north * n_depth)?;
        Array2::from_shape_vec((n_north, n_depth), block)
            .map_err(|e| CubeError::InvalidFormat(e.to_string()))
    }

    fn crossline_section(&mut self, crossline: i32) -> Result<Array2<f32>> {
        let xl_idx = self.header.crossline_index(crossline)?;
        let n_east = self.header.inlines.len();
        let n_depth = self.header.samples.len();

        let mut section = Vec::with_capacity(n_east * n_depth);
        for il_idx in 0..n_east {
            let offset = self.header.trace_offset(il_idx, xl_idx);
            section.extend(self.read_at(offset, n_depth)?);
        }
        Array2::from_shape_vec((n_east, n_depth), section)
            .map_err(|e| CubeError::InvalidFormat(e.to_string()))
    }

    fn depth_slice(&mut self, depth: f64) -> Result<Array2<f32>> {
        let sample_idx = self.header.sample_index(depth)?;
        let n_east = self.header.inlines.len();
        let n_north = self.header.crosslines.len();

        let mut slice = Vec::with_capacity(n_east * n_north);
        for il_idx in 0..n_east {
            for xl_idx in 0..n_north {
                let offset = self.header.trace_offset(il_idx, xl_idx) + sample_idx as u64 * 4;
                slice.push(self.read_at(offset, 1)?[0]);
            }
        }
        Array2::from_shape_vec((n_east, n_north), slice)
            .map_err(|e| CubeError::InvalidFormat(e.to_string()))
    }

    fn trace(&mut self, inline: i32, crossline: i32) -> Result<Array1<f32>> {
        let il_idx = self
            .header
            .inline_index(inline)
            .map_err(|_| CubeError::TraceNotFound { inline, crossline })?;
        let xl_idx = self
            .header
            .crossline_index(crossline)
            .map_err(|_| CubeError::TraceNotFound { inline, crossline })?;

        let offset = self.header.trace_offset(il_idx, xl_idx);
        let samples = self.read_at(offset, self.header.samples.len())?;
        Ok(Array1::from_vec(samples))
    }
}

struct FlatFileWriteHandle {
    header: SurveyHeader,
    file: File,
    root: PathBuf,
}

impl WriteHandle for FlatFileWriteHandle {
    fn overwrite_inline(&mut self, inline: i32, section: &Array2<f32>) -> Result<()> {
        let il_idx = self
            .header
            .inline_index(inline)
            .map_err(|e| CubeError::StorageWrite(e.to_string()))?;
        let n_north = self.header.crosslines.len();
        let n_depth = self.header.samples.len();

        if section.dim() != (n_north, n_depth) {
            return Err(CubeError::ShapeMismatch {
                expected: (n_north, n_depth),
                actual: section.dim(),
            });
        }

        let flat: Vec<f32> = section.iter().copied().collect();
        let bytes = samples_to_bytes(&flat);
        let offset = self.header.trace_offset(il_idx, 0);

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| CubeError::StorageWrite(e.to_string()))?;
        self.file
            .write_all(&bytes)
            .map_err(|e| CubeError::StorageWrite(e.to_string()))?;
        self.file
            .flush()
            .map_err(|e| CubeError::StorageWrite(e.to_string()))?;

        self.header.modified_at = Utc::now();
        write_header(&self.root, &self.header)
            .map_err(|e| CubeError::StorageWrite(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use tempfile::TempDir;

    fn create_store(dir: &TempDir) -> FlatFileStore {
        FlatFileStore::create(
            dir.path().join("volume"),
            vec![10, 20],
            vec![1, 2, 3],
            vec![0.0, 4.0],
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_open() {
        let dir = TempDir::new().unwrap();
        let store = create_store(&dir);

        let header = store.header().unwrap();
        assert_eq!(header.version, FORMAT_VERSION);
        assert_eq!(header.inlines, vec![10, 20]);
        assert_eq!(header.n_traces(), 6);

        let reopened = FlatFileStore::open(dir.path().join("volume")).unwrap();
        let handle = reopened.open_read().unwrap();
        assert_eq!(handle.distinct_crosslines().unwrap(), vec![1, 2, 3]);
        assert_eq!(handle.sample_coordinates().unwrap(), vec![0.0, 4.0]);
    }

    #[test]
    fn test_create_refuses_existing_volume() {
        let dir = TempDir::new().unwrap();
        create_store(&dir);
        let err =
            FlatFileStore::create(dir.path().join("volume"), vec![1, 2], vec![1, 2], vec![0.0])
                .unwrap_err();
        assert!(matches!(err, CubeError::AlreadyExists(_)));
    }

    #[test]
    fn test_open_missing_volume() {
        let dir = TempDir::new().unwrap();
        let err = FlatFileStore::open(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, CubeError::NotFound(_)));
    }

    #[test]
    fn test_new_volume_reads_zero() {
        let dir = TempDir::new().unwrap();
        let store = create_store(&dir);
        let mut handle = store.open_read().unwrap();
        let section = handle.inline_section(10).unwrap();
        assert_eq!(section.shape(), &[3, 2]);
        assert!(section.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_overwrite_then_read_back() {
        let dir = TempDir::new().unwrap();
        let store = create_store(&dir);

        let section = arr2(&[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        {
            let mut handle = store.open_read_write().unwrap();
            handle.overwrite_inline(20, &section).unwrap();
        }

        let mut handle = store.open_read().unwrap();
        assert_eq!(handle.inline_section(20).unwrap(), section);
        // The other in-line block stays zero
        assert!(handle.inline_section(10).unwrap().iter().all(|&s| s == 0.0));

        // Cross-cutting views see the same samples
        assert_eq!(
            handle.crossline_section(2).unwrap(),
            arr2(&[[0.0, 0.0], [3.0, 4.0]])
        );
        assert_eq!(
            handle.depth_slice(4.0).unwrap(),
            arr2(&[[0.0, 0.0, 0.0], [2.0, 4.0, 6.0]])
        );
        assert_eq!(handle.trace(20, 3).unwrap().to_vec(), vec![5.0, 6.0]);
    }

    #[test]
    fn test_missing_trace_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = create_store(&dir);
        let mut handle = store.open_read().unwrap();
        let err = handle.trace(15, 1).unwrap_err();
        assert!(matches!(
            err,
            CubeError::TraceNotFound {
                inline: 15,
                crossline: 1
            }
        ));
    }

    #[test]
    fn test_write_bumps_modified_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = create_store(&dir);
        let before = store.header().unwrap();

        let section = arr2(&[[0.5f32, 0.5], [0.5, 0.5], [0.5, 0.5]]);
        let mut handle = store.open_read_write().unwrap();
        handle.overwrite_inline(10, &section).unwrap();

        let after = store.header().unwrap();
        assert_eq!(after.created_at, before.created_at);
        assert!(after.modified_at >= before.modified_at);
    }
}
