//! Per-slice separation of merged left and right lungs.
//!
//! For every axial slice of a label map the splitter decides whether the
//! lungs form a single connected component, and if so routes a minimum-cost
//! path through the merge zone of the matching CT slice and erases a radius
//! around it. Dark voxels are penalized by the default cost configuration,
//! so the path follows the bright tissue septum between the lungs.
//!
//! Slice analysis is read-only and slice-independent, so it fans out across
//! worker threads; erasures are buffered per slice and applied after the
//! join, in ascending slice order, which keeps the output deterministic and
//! guarantees that a failed slice never mutates the label map.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::builder::GraphBuilder;
use crate::components::{label_components, ComponentStats};
use crate::cost::CostFunction;
use crate::dijkstra::MinCostPathSolver;
use crate::error::SplitError;
use crate::volume::{
    LabelMap, LabelSlice, PixelIndex, Region2, ScalarSlice, ScalarVolume, VoxelIndex,
};

/// Flat option set for the splitting operation. Every field has a default.
#[derive(Debug, Clone, Copy)]
pub struct SplitConfig {
    /// Lower intensity bound for graph node membership.
    pub lower_threshold: f64,
    /// Upper intensity bound for graph node membership.
    pub upper_threshold: f64,
    /// Explicit in-plane start anchor; `None` selects it per slice from the
    /// merge geometry.
    pub start_index: Option<PixelIndex>,
    /// Explicit in-plane end anchor; `None` selects it per slice.
    pub end_index: Option<PixelIndex>,
    /// Intensity-to-cost mapping used for node and edge weights.
    pub cost_function: CostFunction,
    /// Analyze the whole slice instead of the lung bounding box. Slower,
    /// more robust against under-detected merges.
    pub aggressive_splitter: bool,
    /// In-plane erosion radius applied around each path point.
    pub split_radius: usize,
}

impl Default for SplitConfig {
    fn default() -> SplitConfig {
        SplitConfig {
            lower_threshold: f64::NEG_INFINITY,
            upper_threshold: f64::INFINITY,
            start_index: None,
            end_index: None,
            cost_function: CostFunction::default(),
            aggressive_splitter: false,
            split_radius: 3,
        }
    }
}

/// Result bookkeeping of one splitting run.
#[derive(Debug, Clone, Default)]
pub struct SplitReport {
    /// Every voxel erased, in ascending slice order, path order within a
    /// slice.
    pub removed_indices: Vec<VoxelIndex>,
    /// Slices where a merge was detected.
    pub merged_slices: usize,
    /// Slices where a path was found and erasures were applied.
    pub split_slices: usize,
}

/// What the read-only analysis of one slice decided.
enum SliceOutcome {
    /// No lung voxels or no merge; nothing to do.
    Quiet,
    /// Merge detected but no usable path; the slice stays untouched.
    Unsplit,
    /// Merge detected; erase these in-plane pixels.
    Erase(Vec<PixelIndex>),
}

/// Splits merged left/right lungs in a label map, slice by slice.
#[derive(Debug, Clone)]
pub struct LeftRightSplitter {
    config: SplitConfig,
}

impl LeftRightSplitter {
    pub fn new(config: SplitConfig) -> LeftRightSplitter {
        LeftRightSplitter { config }
    }

    pub fn with_defaults() -> LeftRightSplitter {
        LeftRightSplitter::new(SplitConfig::default())
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Split every merged slice of `label_map`, reading intensities from
    /// the matching CT volume.
    ///
    /// Per-slice failures (no eligible pixels, unreachable anchors) are
    /// logged and skipped; the label map is only mutated for slices whose
    /// complete path was found.
    ///
    /// # Errors
    /// `Configuration` for mismatched volume dimensions, an inverted
    /// threshold window, or explicit anchors outside the volume.
    pub fn split(
        &self,
        label_map: &mut LabelMap,
        intensity: &ScalarVolume,
    ) -> Result<SplitReport, SplitError> {
        let dims = label_map.dims();
        if intensity.dims() != dims {
            return Err(SplitError::Configuration(format!(
                "label map dimensions {:?} do not match intensity volume {:?}",
                dims,
                intensity.dims()
            )));
        }
        if self.config.lower_threshold > self.config.upper_threshold {
            return Err(SplitError::Configuration(format!(
                "inverted thresholds: lower {} exceeds upper {}",
                self.config.lower_threshold, self.config.upper_threshold
            )));
        }
        let (nx, ny, nz) = dims;
        for anchor in [self.config.start_index, self.config.end_index]
            .into_iter()
            .flatten()
        {
            if anchor[0] >= nx || anchor[1] >= ny {
                return Err(SplitError::Configuration(format!(
                    "anchor [{}, {}] lies outside the {}x{} slice extent",
                    anchor[0], anchor[1], nx, ny
                )));
            }
        }

        let labels: &LabelMap = label_map;
        let outcomes: Vec<SliceOutcome> = (0..nz)
            .into_par_iter()
            .map(|z| self.analyze_slice(intensity, labels, z))
            .collect();

        let mut report = SplitReport::default();
        for (z, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                SliceOutcome::Quiet => {}
                SliceOutcome::Unsplit => report.merged_slices += 1,
                SliceOutcome::Erase(pixels) => {
                    report.merged_slices += 1;
                    report.split_slices += 1;
                    for [x, y] in pixels {
                        let index = [x, y, z];
                        if label_map.is_lung_voxel(index) {
                            label_map.erase(index);
                            report.removed_indices.push(index);
                        }
                    }
                }
            }
        }
        Ok(report)
    }

    /// Read-only analysis of one slice: merge detection, graph build, path
    /// search, erasure planning.
    fn analyze_slice(&self, intensity: &ScalarVolume, labels: &LabelMap, z: usize) -> SliceOutcome {
        let label_slice = labels.extract_slice(z);
        let Some(bounds) = label_slice.lung_bounding_box() else {
            return SliceOutcome::Quiet;
        };

        let (nx, ny) = label_slice.dims();
        let region = if self.config.aggressive_splitter {
            Region2::new([0, 0], [nx - 1, ny - 1])
        } else {
            bounds
        };

        let Some(merged) = merged_component(&label_slice, region) else {
            return SliceOutcome::Quiet;
        };
        debug!(slice = z, "lungs merged within the analysis region");

        let slice = intensity.extract_slice(z);
        let builder = GraphBuilder::new(self.config.cost_function)
            .with_thresholds(self.config.lower_threshold, self.config.upper_threshold);

        let mut graph = match builder.build(&slice, region) {
            Ok(graph) => graph,
            Err(err) => {
                warn!(slice = z, error = %err, "slice left unmodified");
                return SliceOutcome::Unsplit;
            }
        };

        let (start_px, end_px) = self.anchors(&builder, &slice, region, &merged);
        let (Some(start), Some(end)) = (graph.node_at(start_px), graph.node_at(end_px)) else {
            warn!(slice = z, "no threshold-eligible anchor pixels; slice left unmodified");
            return SliceOutcome::Unsplit;
        };

        let path = match MinCostPathSolver::new(start, end).solve(&mut graph) {
            Ok(path) => path,
            Err(err) => {
                warn!(slice = z, error = %err, "slice left unmodified");
                return SliceOutcome::Unsplit;
            }
        };
        debug!(
            slice = z,
            nodes = graph.node_count(),
            path_len = path.indices.len(),
            "minimum-cost split path found"
        );

        SliceOutcome::Erase(self.erosion_pixels(&path.indices, nx, ny))
    }

    /// Anchor coordinates for the path search: the configured indices when
    /// present, otherwise the merge component's mean column against the
    /// region's top and bottom rows. Either way the anchors are snapped to
    /// the nearest threshold-eligible pixel so they exist in the graph.
    fn anchors(
        &self,
        builder: &GraphBuilder,
        slice: &ScalarSlice,
        region: Region2,
        merged: &ComponentStats,
    ) -> (PixelIndex, PixelIndex) {
        let column = merged.mean_x().clamp(region.min[0], region.max[0]);
        let start = self.config.start_index.unwrap_or([column, region.min[1]]);
        let end = self.config.end_index.unwrap_or([column, region.max[1]]);
        (
            snap_to_node(builder, slice, region, start),
            snap_to_node(builder, slice, region, end),
        )
    }

    /// All pixels within the split radius (Euclidean, in-plane) of any path
    /// point, clipped to the slice, in path order.
    fn erosion_pixels(&self, path: &[PixelIndex], nx: usize, ny: usize) -> Vec<PixelIndex> {
        let radius = self.config.split_radius as i64;
        let mut pixels = Vec::new();
        for &[px, py] in path {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx * dx + dy * dy > radius * radius {
                        continue;
                    }
                    let x = px as i64 + dx;
                    let y = py as i64 + dy;
                    if x >= 0 && y >= 0 && (x as usize) < nx && (y as usize) < ny {
                        pixels.push([x as usize, y as usize]);
                    }
                }
            }
        }
        pixels
    }
}

/// Whether the lungs are merged within `region`: true when a single
/// connected component of lung pixels spans from the left third to the
/// right third of the region's x-extent.
pub fn detect_merge(slice: &LabelSlice, region: Region2) -> bool {
    merged_component(slice, region).is_some()
}

/// The component that makes the slice count as merged, if any.
fn merged_component(slice: &LabelSlice, region: Region2) -> Option<ComponentStats> {
    let width = region.width();
    let left_band = region.min[0] + width / 3;
    let right_band = region.min[0] + (2 * width) / 3;
    let components = label_components(|p| slice.is_lung(p), region);
    components
        .stats()
        .iter()
        .find(|stats| stats.min[0] <= left_band && stats.max[0] >= right_band)
        .copied()
}

/// Snap a requested anchor to the nearest threshold-eligible pixel in the
/// region (squared Euclidean distance, scan order as tiebreak). Returns the
/// request unchanged when nothing in the region is eligible; the caller
/// discovers that through the graph lookup.
fn snap_to_node(
    builder: &GraphBuilder,
    slice: &ScalarSlice,
    region: Region2,
    request: PixelIndex,
) -> PixelIndex {
    if region.contains(request) && builder.is_pixel_a_node(slice, request) {
        return request;
    }
    let mut best: Option<(u64, PixelIndex)> = None;
    for y in region.min[1]..=region.max[1] {
        for x in region.min[0]..=region.max[0] {
            if !builder.is_pixel_a_node(slice, [x, y]) {
                continue;
            }
            let dx = x.abs_diff(request[0]) as u64;
            let dy = y.abs_diff(request[1]) as u64;
            let distance = dx * dx + dy * dy;
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, [x, y]));
            }
        }
    }
    best.map_or(request, |(_, index)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conventions::{pack, ChestRegion, ChestType};

    /// Two lung blobs on either side of a bright septum, optionally joined
    /// by a one-pixel bridge row. Lung air is dark (-900), tissue bright
    /// (40).
    fn bridged_phantom(bridge: bool) -> (LabelMap, ScalarVolume) {
        let dims = (16, 12, 1);
        let mut labels = LabelMap::new(dims);
        let mut ct = ScalarVolume::new_fill(dims, 40.0);
        let lung = pack(ChestRegion::WholeLung, ChestType::NormalParenchyma);

        for y in 2..10 {
            for x in 2..7 {
                labels.set_value([x, y, 0], lung);
                ct.set([x, y, 0], -900.0);
            }
            for x in 9..14 {
                labels.set_value([x, y, 0], lung);
                ct.set([x, y, 0], -900.0);
            }
        }
        if bridge {
            for x in 7..9 {
                labels.set_value([x, 5, 0], lung);
                ct.set([x, 5, 0], -900.0);
            }
        }
        (labels, ct)
    }

    #[test]
    fn test_detect_merge_on_bridge() {
        let (labels, _) = bridged_phantom(true);
        let slice = labels.extract_slice(0);
        let region = slice.lung_bounding_box().unwrap();
        assert!(detect_merge(&slice, region));
    }

    #[test]
    fn test_no_merge_without_bridge() {
        let (labels, _) = bridged_phantom(false);
        let slice = labels.extract_slice(0);
        let region = slice.lung_bounding_box().unwrap();
        assert!(!detect_merge(&slice, region));
    }

    #[test]
    fn test_split_erases_bridge_and_separates_components() {
        let (mut labels, ct) = bridged_phantom(true);
        let splitter = LeftRightSplitter::with_defaults();

        let report = splitter.split(&mut labels, &ct).unwrap();
        assert_eq!(report.merged_slices, 1);
        assert_eq!(report.split_slices, 1);
        assert!(!report.removed_indices.is_empty());

        // Every removed index was a lung voxel and is now erased.
        for &index in &report.removed_indices {
            assert!(!labels.is_lung_voxel(index));
        }

        let slice = labels.extract_slice(0);
        let region = Region2::new([0, 0], [15, 11]);
        assert!(
            !detect_merge(&slice, region),
            "the lungs must no longer form one component"
        );
        let components = label_components(|p| slice.is_lung(p), region);
        assert_eq!(components.count(), 2, "exactly left and right remain");
    }

    #[test]
    fn test_split_is_idempotent() {
        let (mut labels, ct) = bridged_phantom(true);
        let splitter = LeftRightSplitter::with_defaults();

        let first = splitter.split(&mut labels, &ct).unwrap();
        assert!(first.split_slices > 0);

        let second = splitter.split(&mut labels, &ct).unwrap();
        assert_eq!(second.merged_slices, 0);
        assert!(second.removed_indices.is_empty(), "second run must be a no-op");
    }

    #[test]
    fn test_unsplit_slice_stays_untouched() {
        // Threshold window admits nothing: graph construction fails and the
        // slice must be left exactly as it was.
        let (mut labels, ct) = bridged_phantom(true);
        let before = labels.clone();
        let splitter = LeftRightSplitter::new(SplitConfig {
            lower_threshold: 5000.0,
            upper_threshold: 6000.0,
            ..SplitConfig::default()
        });

        let report = splitter.split(&mut labels, &ct).unwrap();
        assert_eq!(report.split_slices, 0);
        assert!(report.removed_indices.is_empty());
        assert_eq!(labels.data(), before.data(), "no partial writes");
    }

    #[test]
    fn test_dimension_mismatch_is_configuration_error() {
        let (mut labels, _) = bridged_phantom(true);
        let ct = ScalarVolume::new_fill((4, 4, 1), 0.0);
        let err = LeftRightSplitter::with_defaults()
            .split(&mut labels, &ct)
            .unwrap_err();
        assert!(matches!(err, SplitError::Configuration(_)));
    }

    #[test]
    fn test_inverted_thresholds_are_configuration_error() {
        let (mut labels, ct) = bridged_phantom(true);
        let splitter = LeftRightSplitter::new(SplitConfig {
            lower_threshold: 100.0,
            upper_threshold: -100.0,
            ..SplitConfig::default()
        });
        let err = splitter.split(&mut labels, &ct).unwrap_err();
        assert!(matches!(err, SplitError::Configuration(_)));
    }

    #[test]
    fn test_out_of_bounds_anchor_is_configuration_error() {
        let (mut labels, ct) = bridged_phantom(true);
        let splitter = LeftRightSplitter::new(SplitConfig {
            start_index: Some([99, 0]),
            ..SplitConfig::default()
        });
        let err = splitter.split(&mut labels, &ct).unwrap_err();
        assert!(matches!(err, SplitError::Configuration(_)));
    }

    #[test]
    fn test_aggressive_mode_widens_region() {
        let (mut labels, ct) = bridged_phantom(true);
        let splitter = LeftRightSplitter::new(SplitConfig {
            aggressive_splitter: true,
            ..SplitConfig::default()
        });
        let report = splitter.split(&mut labels, &ct).unwrap();
        assert_eq!(report.split_slices, 1, "aggressive mode still splits the bridge");
    }

    #[test]
    fn test_erosion_disk_respects_radius_and_bounds() {
        let splitter = LeftRightSplitter::new(SplitConfig {
            split_radius: 2,
            ..SplitConfig::default()
        });
        let pixels = splitter.erosion_pixels(&[[0, 0]], 8, 8);

        assert!(pixels.contains(&[0, 2]));
        assert!(pixels.contains(&[2, 0]));
        assert!(pixels.contains(&[1, 1]));
        assert!(
            !pixels.contains(&[2, 2]),
            "corner at distance sqrt(8) lies outside radius 2"
        );
        // Negative coordinates were clipped.
        assert!(pixels.iter().all(|&[x, y]| x < 8 && y < 8));
    }

    #[test]
    fn test_snap_to_node_prefers_nearest_eligible() {
        let mut slice = ScalarSlice::new_fill((5, 5), -1000.0);
        slice.set([3, 1], 10.0);
        slice.set([0, 4], 10.0);
        let builder = GraphBuilder::new(CostFunction::default()).with_thresholds(0.0, 100.0);
        let region = Region2::new([0, 0], [4, 4]);

        assert_eq!(snap_to_node(&builder, &slice, region, [4, 0]), [3, 1]);
        assert_eq!(snap_to_node(&builder, &slice, region, [0, 3]), [0, 4]);
        // Already eligible: unchanged.
        assert_eq!(snap_to_node(&builder, &slice, region, [3, 1]), [3, 1]);
    }

    #[test]
    fn test_multi_slice_volume_only_touches_merged_slices() {
        let dims = (16, 12, 3);
        let mut labels = LabelMap::new(dims);
        let mut ct = ScalarVolume::new_fill(dims, 40.0);
        let lung = pack(ChestRegion::WholeLung, ChestType::NormalParenchyma);

        // Slice 0: separated. Slice 1: bridged. Slice 2: empty.
        for z in 0..2 {
            for y in 2..10 {
                for x in 2..7 {
                    labels.set_value([x, y, z], lung);
                    ct.set([x, y, z], -900.0);
                }
                for x in 9..14 {
                    labels.set_value([x, y, z], lung);
                    ct.set([x, y, z], -900.0);
                }
            }
        }
        for x in 7..9 {
            labels.set_value([x, 5, 1], lung);
            ct.set([x, 5, 1], -900.0);
        }

        let report = LeftRightSplitter::with_defaults()
            .split(&mut labels, &ct)
            .unwrap();

        assert_eq!(report.merged_slices, 1);
        assert_eq!(report.split_slices, 1);
        assert!(report.removed_indices.iter().all(|&[_, _, z]| z == 1));

        // Slice 0 kept its full lung mask.
        let untouched = labels.extract_slice(0);
        let expected = 8 * 5 * 2;
        let count = (0..12)
            .flat_map(|y| (0..16).map(move |x| [x, y]))
            .filter(|&p| untouched.is_lung(p))
            .count();
        assert_eq!(count, expected);
    }
}
