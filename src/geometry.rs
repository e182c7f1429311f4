//! Survey geometry - the regular 3D grid derived from trace header metadata

use crate::error::{CubeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Allowed deviation of a depth sample from its derived grid position,
/// as a fraction of the step size. Header sample tables are float-valued,
/// so exact equality is too strict.
const DEPTH_TOLERANCE_FRAC: f64 = 1e-4;

/// A regularly sampled integer survey axis (in-line or cross-line)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAxis {
    /// First line number
    pub start: i32,
    /// Last line number
    pub end: i32,
    /// Constant increment between adjacent lines
    pub step: i32,
    /// Number of lines on the axis
    pub count: usize,
}

impl LineAxis {
    /// Derive an axis from the ordered list of distinct line numbers found in
    /// the trace headers.
    ///
    /// Fails with [`CubeError::MalformedGeometry`] when fewer than two lines
    /// exist (the step would be undefined) or when the numbers do not lie on a
    /// constant-step grid.
    pub fn from_lines(name: &str, lines: &[i32]) -> Result<Self> {
        if lines.len() < 2 {
            return Err(CubeError::MalformedGeometry(format!(
                "{} axis needs at least 2 distinct values, got {}",
                name,
                lines.len()
            )));
        }

        let start = lines[0];
        let end = lines[lines.len() - 1];
        let count = lines.len();
        let span = i64::from(end) - i64::from(start);
        let intervals = (count - 1) as i64;

        if span == 0 || span % intervals != 0 {
            return Err(CubeError::MalformedGeometry(format!(
                "{} axis span {} is not divisible into {} equal steps",
                name, span, intervals
            )));
        }
        let step = (span / intervals) as i32;

        for (i, &line) in lines.iter().enumerate() {
            if line != start + i as i32 * step {
                return Err(CubeError::MalformedGeometry(format!(
                    "{} axis is irregular: {} at position {} is off the {}-step grid",
                    name, line, i, step
                )));
            }
        }

        Ok(Self {
            start,
            end,
            step,
            count,
        })
    }

    /// Whether `line` lies exactly on a grid node of this axis.
    pub fn contains_node(&self, line: i32) -> bool {
        let offset = i64::from(line) - i64::from(self.start);
        let step = i64::from(self.step);
        if offset % step != 0 {
            return false;
        }
        let index = offset / step;
        index >= 0 && (index as usize) < self.count
    }

    /// Zero-based grid index of `line`, if it is a node.
    pub fn index_of(&self, line: i32) -> Option<usize> {
        if self.contains_node(line) {
            let offset = i64::from(line) - i64::from(self.start);
            Some((offset / i64::from(self.step)) as usize)
        } else {
            None
        }
    }

    /// Snap an arbitrary line number to the nearest grid node.
    ///
    /// Uses floor-division plus the rounded fractional grid offset, so a
    /// coordinate exactly halfway between two nodes snaps to the
    /// higher-coordinate node. Values outside `[start, end]` extrapolate
    /// along the same step and never fail.
    pub fn nearest_node(&self, line: i32) -> i32 {
        let g = f64::from(line - self.start) / f64::from(self.step);
        let base = g.floor();
        let index = base as i32 + (g - base).round() as i32;
        self.start + index * self.step
    }

    /// Lazy ascending iterator over all line numbers on the axis.
    pub fn iter(&self) -> impl Iterator<Item = i32> {
        let Self { start, step, count, .. } = *self;
        (0..count).map(move |i| start + i as i32 * step)
    }
}

/// The regularly sampled depth (or two-way time) axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthAxis {
    /// Coordinate of the first sample
    pub start: f64,
    /// Coordinate of the last sample
    pub end: f64,
    /// Constant sample interval
    pub step: f64,
    /// Number of samples per trace
    pub count: usize,
}

impl DepthAxis {
    /// Derive the depth axis from the ordered sample coordinate table.
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        if samples.len() < 2 {
            return Err(CubeError::MalformedGeometry(format!(
                "depth axis needs at least 2 samples, got {}",
                samples.len()
            )));
        }

        let start = samples[0];
        let end = samples[samples.len() - 1];
        let count = samples.len();
        let step = (end - start) / (count - 1) as f64;

        if !step.is_finite() || step == 0.0 {
            return Err(CubeError::MalformedGeometry(format!(
                "depth axis has degenerate step {}",
                step
            )));
        }

        let tolerance = step.abs() * DEPTH_TOLERANCE_FRAC;
        for (i, &sample) in samples.iter().enumerate() {
            let expected = start + i as f64 * step;
            if (sample - expected).abs() > tolerance {
                return Err(CubeError::MalformedGeometry(format!(
                    "depth axis is irregular: sample {} at position {} deviates from the {}-step grid",
                    sample, i, step
                )));
            }
        }

        Ok(Self {
            start,
            end,
            step,
            count,
        })
    }

    /// Sample index of the depth coordinate `depth`, if it is a grid node.
    pub fn index_of(&self, depth: f64) -> Option<usize> {
        let g = (depth - self.start) / self.step;
        let index = g.round();
        if (g - index).abs() > DEPTH_TOLERANCE_FRAC {
            return None;
        }
        if index < 0.0 || index as usize >= self.count {
            return None;
        }
        Some(index as usize)
    }

    /// Coordinate of the sample at `index`. Computed from the index rather
    /// than by repeated addition, so there is no cumulative float drift.
    pub fn value_at(&self, index: usize) -> f64 {
        self.start + index as f64 * self.step
    }

    /// Lazy iterator over all sample coordinates.
    pub fn iter(&self) -> impl Iterator<Item = f64> {
        let axis = *self;
        (0..axis.count).map(move |i| axis.value_at(i))
    }
}

/// Description of the regular 3D grid of a seismic survey.
///
/// Built once when a volume is opened, from the backend's header scan, and
/// immutable afterwards. The in-line axis spans `n_east` lines, the
/// cross-line axis `n_north` lines, and every trace carries `n_depth`
/// samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryModel {
    /// In-line axis
    pub inline: LineAxis,
    /// Cross-line axis
    pub crossline: LineAxis,
    /// Depth/time axis
    pub depth: DepthAxis,
}

impl GeometryModel {
    /// Derive the grid from the distinct in-line numbers, distinct cross-line
    /// numbers and sample coordinate table reported by the storage backend.
    pub fn derive(inlines: &[i32], crosslines: &[i32], samples: &[f64]) -> Result<Self> {
        Ok(Self {
            inline: LineAxis::from_lines("in-line", inlines)?,
            crossline: LineAxis::from_lines("cross-line", crosslines)?,
            depth: DepthAxis::from_samples(samples)?,
        })
    }

    /// Number of in-lines (easting extent of the grid)
    pub fn n_east(&self) -> usize {
        self.inline.count
    }

    /// Number of cross-lines (northing extent of the grid)
    pub fn n_north(&self) -> usize {
        self.crossline.count
    }

    /// Number of samples per trace
    pub fn n_depth(&self) -> usize {
        self.depth.count
    }

    /// Total number of traces in the volume
    pub fn n_traces(&self) -> usize {
        self.n_east() * self.n_north()
    }

    /// Iterator over in-line numbers, ascending
    pub fn inlines(&self) -> impl Iterator<Item = i32> {
        self.inline.iter()
    }

    /// Iterator over cross-line numbers, ascending
    pub fn crosslines(&self) -> impl Iterator<Item = i32> {
        self.crossline.iter()
    }

    /// Iterator over depth sample coordinates
    pub fn depths(&self) -> impl Iterator<Item = f64> {
        self.depth.iter()
    }

    /// Cartesian product of in-lines and cross-lines, in-line major.
    /// Visits every trace position once; used for full-volume traversal.
    pub fn inline_crossline_pairs(&self) -> impl Iterator<Item = (i32, i32)> {
        let crossline = self.crossline;
        self.inline
            .iter()
            .flat_map(move |il| crossline.iter().map(move |xl| (il, xl)))
    }

    /// Snap an arbitrary (in-line, cross-line) coordinate to the nearest grid
    /// node, per axis independently.
    ///
    /// A coordinate exactly halfway between two nodes snaps to the
    /// higher-coordinate node. Coordinates outside the survey extrapolate
    /// along the axis step, so this never fails.
    pub fn snap_to_nearest_node(&self, inline: i32, crossline: i32) -> (i32, i32) {
        (
            self.inline.nearest_node(inline),
            self.crossline.nearest_node(crossline),
        )
    }
}

impl fmt::Display for GeometryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "A seismic data cube")?;
        writeln!(
            f,
            "In-line range: {} - {} - {}",
            self.inline.start, self.inline.end, self.inline.step
        )?;
        writeln!(
            f,
            "Cross-line range: {} - {} - {}",
            self.crossline.start, self.crossline.end, self.crossline.step
        )?;
        write!(
            f,
            "Z range: {} - {} - {}",
            self.depth.start, self.depth.end, self.depth.step
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_geometry() -> GeometryModel {
        // 100-200 step 2, 300-350 step 1, 0-1000 step 4
        let inlines: Vec<i32> = (0..51).map(|i| 100 + i * 2).collect();
        let crosslines: Vec<i32> = (300..=350).collect();
        let samples: Vec<f64> = (0..251).map(|i| f64::from(i) * 4.0).collect();
        GeometryModel::derive(&inlines, &crosslines, &samples).unwrap()
    }

    #[test]
    fn test_derive_counts_match_header_lists() {
        let geometry = test_geometry();
        assert_eq!(geometry.n_east(), 51);
        assert_eq!(geometry.n_north(), 51);
        assert_eq!(geometry.n_depth(), 251);
        assert_eq!(geometry.n_traces(), 51 * 51);

        assert_eq!(geometry.inline.start, 100);
        assert_eq!(geometry.inline.end, 200);
        assert_eq!(geometry.inline.step, 2);
        assert_eq!(geometry.crossline.step, 1);
        assert_eq!(geometry.depth.step, 4.0);
    }

    #[test]
    fn test_derive_rejects_degenerate_axes() {
        let err = LineAxis::from_lines("in-line", &[100]).unwrap_err();
        assert!(matches!(err, CubeError::MalformedGeometry(_)));

        let err = DepthAxis::from_samples(&[0.0]).unwrap_err();
        assert!(matches!(err, CubeError::MalformedGeometry(_)));

        // Zero span
        let err = LineAxis::from_lines("in-line", &[5, 5]).unwrap_err();
        assert!(matches!(err, CubeError::MalformedGeometry(_)));
    }

    #[test]
    fn test_derive_rejects_irregular_axes() {
        // Span divides evenly but the interior point is off-grid
        let err = LineAxis::from_lines("cross-line", &[0, 3, 4]).unwrap_err();
        assert!(matches!(err, CubeError::MalformedGeometry(_)));

        let err = DepthAxis::from_samples(&[0.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, CubeError::MalformedGeometry(_)));
    }

    #[test]
    fn test_inline_iterator_values() {
        let geometry = test_geometry();
        let inlines: Vec<i32> = geometry.inlines().collect();
        assert_eq!(inlines.len(), 51);
        assert_eq!(inlines[0], 100);
        assert_eq!(inlines[1], 102);
        assert_eq!(*inlines.last().unwrap(), 200);
        assert!(inlines.windows(2).all(|w| w[0] < w[1]));

        // Restartable
        assert_eq!(geometry.inlines().count(), 51);
    }

    #[test]
    fn test_depth_iterator_has_no_float_drift() {
        let samples: Vec<f64> = (0..1001).map(|i| 1500.0 + f64::from(i) * 0.1).collect();
        let axis = DepthAxis::from_samples(&samples).unwrap();
        let depths: Vec<f64> = axis.iter().collect();
        assert_eq!(depths.len(), 1001);
        // Indexed from count, so the last value is exact
        assert_eq!(*depths.last().unwrap(), 1500.0 + 1000.0 * axis.step);
    }

    #[test]
    fn test_pair_iterator_is_inline_major() {
        let inlines = [0, 10];
        let crosslines = [5, 6, 7];
        let samples = [0.0, 1.0];
        let geometry = GeometryModel::derive(&inlines, &crosslines, &samples).unwrap();

        let pairs: Vec<(i32, i32)> = geometry.inline_crossline_pairs().collect();
        assert_eq!(
            pairs,
            vec![(0, 5), (0, 6), (0, 7), (10, 5), (10, 6), (10, 7)]
        );
    }

    #[test]
    fn test_snap_is_identity_on_grid_nodes() {
        let geometry = test_geometry();
        for il in geometry.inlines() {
            assert_eq!(geometry.snap_to_nearest_node(il, 320), (il, 320));
        }
    }

    #[test]
    fn test_snap_halfway_rounds_up() {
        let geometry = test_geometry();
        // 101 sits exactly between in-lines 100 and 102
        assert_eq!(geometry.snap_to_nearest_node(101, 300), (102, 300));
        // 103 likewise between 102 and 104
        assert_eq!(geometry.snap_to_nearest_node(103, 300), (104, 300));
    }

    #[test]
    fn test_snap_extrapolates_outside_survey() {
        let geometry = test_geometry();
        // 97 is exactly halfway between the extrapolated 96 and 98 nodes
        assert_eq!(geometry.snap_to_nearest_node(97, 299), (98, 299));
        assert_eq!(geometry.snap_to_nearest_node(205, 360), (206, 360));
        // Half a step below the start rounds up onto the start
        assert_eq!(geometry.snap_to_nearest_node(99, 300), (100, 300));

        // Off-tie extrapolation on a step-3 axis
        let axis = LineAxis::from_lines("in-line", &[0, 3, 6]).unwrap();
        assert_eq!(axis.nearest_node(-2), -3);
        assert_eq!(axis.nearest_node(7), 6);
        assert_eq!(axis.nearest_node(8), 9);
    }

    #[test]
    fn test_line_axis_node_lookup() {
        let axis = LineAxis::from_lines("in-line", &[100, 102, 104, 106]).unwrap();
        assert!(axis.contains_node(104));
        assert!(!axis.contains_node(105));
        assert!(!axis.contains_node(98));
        assert!(!axis.contains_node(108));
        assert_eq!(axis.index_of(106), Some(3));
        assert_eq!(axis.index_of(107), None);
    }

    #[test]
    fn test_depth_axis_index_lookup() {
        let geometry = test_geometry();
        assert_eq!(geometry.depth.index_of(0.0), Some(0));
        assert_eq!(geometry.depth.index_of(400.0), Some(100));
        assert_eq!(geometry.depth.index_of(1000.0), Some(250));
        assert_eq!(geometry.depth.index_of(402.0), None);
        assert_eq!(geometry.depth.index_of(1004.0), None);
        assert_eq!(geometry.depth.index_of(-4.0), None);
    }

    #[test]
    fn test_display_summary() {
        let geometry = test_geometry();
        let text = geometry.to_string();
        assert!(text.contains("In-line range: 100 - 200 - 2"));
        assert!(text.contains("Cross-line range: 300 - 350 - 1"));
        assert!(text.contains("Z range: 0 - 1000 - 4"));
    }
}
