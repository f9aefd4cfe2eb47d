//! Common test utilities: synthetic chest phantoms for splitter tests.

use lungsplit_core::conventions::{pack, ChestRegion, ChestType};
use lungsplit_core::volume::{LabelMap, Region2, ScalarVolume};

/// Air inside the lungs, in Hounsfield units.
pub const LUNG_HU: f64 = -900.0;

/// Soft tissue between and around the lungs.
pub const TISSUE_HU: f64 = 40.0;

/// The label value used for lung voxels in the phantoms.
pub fn lung_label() -> u16 {
    pack(ChestRegion::WholeLung, ChestType::NormalParenchyma)
}

/// A phantom volume holding two lung blobs per slice with a bright tissue
/// gap between them. `bridge_slices` lists the z indices where a dark
/// one-row bridge joins the blobs across the gap.
///
/// Geometry per slice (dims `(nx, ny, nz)`, needs nx >= 16, ny >= 12):
/// left blob x in [2, 6], right blob x in [nx-7, nx-3], both y in
/// [2, ny-3]; the bridge fills the gap columns at the middle row.
pub fn two_lung_phantom(
    dims: (usize, usize, usize),
    bridge_slices: &[usize],
) -> (LabelMap, ScalarVolume) {
    let (nx, ny, nz) = dims;
    assert!(nx >= 16 && ny >= 12, "phantom needs at least a 16x12 slice");

    let mut labels = LabelMap::new(dims);
    let mut ct = ScalarVolume::new_fill(dims, TISSUE_HU);
    let label = lung_label();

    let left = 2..=6;
    let right = (nx - 7)..=(nx - 3);
    let rows = 2..=(ny - 3);
    let mid_row = ny / 2;

    for z in 0..nz {
        for y in rows.clone() {
            for x in left.clone().chain(right.clone()) {
                labels.set_value([x, y, z], label);
                ct.set([x, y, z], LUNG_HU);
            }
        }
        if bridge_slices.contains(&z) {
            for x in 7..(nx - 7) {
                labels.set_value([x, mid_row, z], label);
                ct.set([x, mid_row, z], LUNG_HU);
            }
        }
    }

    (labels, ct)
}

/// Count the lung components of one axial slice over its full extent.
pub fn lung_component_count(labels: &LabelMap, z: usize) -> usize {
    let (nx, ny, _) = labels.dims();
    let slice = labels.extract_slice(z);
    let region = Region2::new([0, 0], [nx - 1, ny - 1]);
    lungsplit_core::components::label_components(|p| slice.is_lung(p), region).count()
}

/// Count every lung voxel of the volume.
pub fn lung_voxel_count(labels: &LabelMap) -> usize {
    let (nx, ny, nz) = labels.dims();
    let mut count = 0;
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                if labels.is_lung_voxel([x, y, z]) {
                    count += 1;
                }
            }
        }
    }
    count
}
