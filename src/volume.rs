//! Flat-storage volumes, axial slices, and the label-map accessor.
//!
//! All volumes use Fortran (column-major) ordering to match NIfTI
//! convention: `index = x + y*nx + z*nx*ny`. Axial slices are taken at
//! fixed z.

use crate::conventions::{self, ChestRegion, ChestType};
use crate::error::SplitError;

/// 3D voxel coordinate `[x, y, z]`.
pub type VoxelIndex = [usize; 3];

/// 2D in-plane coordinate `[x, y]`.
pub type PixelIndex = [usize; 2];

/// Inclusive 2D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region2 {
    pub min: PixelIndex,
    pub max: PixelIndex,
}

impl Region2 {
    pub fn new(min: PixelIndex, max: PixelIndex) -> Region2 {
        debug_assert!(min[0] <= max[0] && min[1] <= max[1]);
        Region2 { min, max }
    }

    pub fn width(&self) -> usize {
        self.max[0] - self.min[0] + 1
    }

    pub fn height(&self) -> usize {
        self.max[1] - self.min[1] + 1
    }

    pub fn contains(&self, index: PixelIndex) -> bool {
        index[0] >= self.min[0]
            && index[0] <= self.max[0]
            && index[1] >= self.min[1]
            && index[1] <= self.max[1]
    }

    /// Grow the region by `margin` on every side, clamped to
    /// `[0, nx) x [0, ny)`.
    pub fn padded(&self, margin: usize, nx: usize, ny: usize) -> Region2 {
        Region2 {
            min: [
                self.min[0].saturating_sub(margin),
                self.min[1].saturating_sub(margin),
            ],
            max: [
                (self.max[0] + margin).min(nx - 1),
                (self.max[1] + margin).min(ny - 1),
            ],
        }
    }
}

/// 3D scalar intensity volume (e.g. a CT image in Hounsfield units).
#[derive(Debug, Clone)]
pub struct ScalarVolume {
    nx: usize,
    ny: usize,
    nz: usize,
    data: Vec<f64>,
}

impl ScalarVolume {
    /// Wrap existing voxel data. Fails if the length does not match the
    /// dimensions.
    pub fn from_vec(dims: (usize, usize, usize), data: Vec<f64>) -> Result<ScalarVolume, SplitError> {
        let (nx, ny, nz) = dims;
        if data.len() != nx * ny * nz {
            return Err(SplitError::Configuration(format!(
                "volume data length {} does not match dimensions {}x{}x{}",
                data.len(),
                nx,
                ny,
                nz
            )));
        }
        Ok(ScalarVolume { nx, ny, nz, data })
    }

    pub fn new_fill(dims: (usize, usize, usize), value: f64) -> ScalarVolume {
        let (nx, ny, nz) = dims;
        ScalarVolume {
            nx,
            ny,
            nz,
            data: vec![value; nx * ny * nz],
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    #[inline]
    fn offset(&self, index: VoxelIndex) -> usize {
        index[0] + index[1] * self.nx + index[2] * self.nx * self.ny
    }

    #[inline]
    pub fn get(&self, index: VoxelIndex) -> f64 {
        self.data[self.offset(index)]
    }

    pub fn set(&mut self, index: VoxelIndex, value: f64) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Copy out the axial slice at `z`.
    pub fn extract_slice(&self, z: usize) -> ScalarSlice {
        let plane = self.nx * self.ny;
        ScalarSlice {
            nx: self.nx,
            ny: self.ny,
            data: self.data[z * plane..(z + 1) * plane].to_vec(),
        }
    }
}

/// 2D scalar intensity slice.
#[derive(Debug, Clone)]
pub struct ScalarSlice {
    nx: usize,
    ny: usize,
    data: Vec<f64>,
}

impl ScalarSlice {
    pub fn from_vec(dims: (usize, usize), data: Vec<f64>) -> Result<ScalarSlice, SplitError> {
        let (nx, ny) = dims;
        if data.len() != nx * ny {
            return Err(SplitError::Configuration(format!(
                "slice data length {} does not match dimensions {}x{}",
                data.len(),
                nx,
                ny
            )));
        }
        Ok(ScalarSlice { nx, ny, data })
    }

    pub fn new_fill(dims: (usize, usize), value: f64) -> ScalarSlice {
        let (nx, ny) = dims;
        ScalarSlice {
            nx,
            ny,
            data: vec![value; nx * ny],
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    #[inline]
    pub fn get(&self, index: PixelIndex) -> f64 {
        self.data[index[0] + index[1] * self.nx]
    }

    pub fn set(&mut self, index: PixelIndex, value: f64) {
        self.data[index[0] + index[1] * self.nx] = value;
    }
}

/// 3D label map of packed region/type values (see [`crate::conventions`]).
#[derive(Debug, Clone)]
pub struct LabelMap {
    nx: usize,
    ny: usize,
    nz: usize,
    data: Vec<u16>,
}

impl LabelMap {
    pub fn from_vec(dims: (usize, usize, usize), data: Vec<u16>) -> Result<LabelMap, SplitError> {
        let (nx, ny, nz) = dims;
        if data.len() != nx * ny * nz {
            return Err(SplitError::Configuration(format!(
                "label data length {} does not match dimensions {}x{}x{}",
                data.len(),
                nx,
                ny,
                nz
            )));
        }
        Ok(LabelMap { nx, ny, nz, data })
    }

    /// An all-undefined (background) label map.
    pub fn new(dims: (usize, usize, usize)) -> LabelMap {
        let (nx, ny, nz) = dims;
        LabelMap {
            nx,
            ny,
            nz,
            data: vec![0u16; nx * ny * nz],
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    #[inline]
    fn offset(&self, index: VoxelIndex) -> usize {
        index[0] + index[1] * self.nx + index[2] * self.nx * self.ny
    }

    #[inline]
    pub fn value(&self, index: VoxelIndex) -> u16 {
        self.data[self.offset(index)]
    }

    pub fn set_value(&mut self, index: VoxelIndex, value: u16) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Whether the voxel carries any defined lung region.
    #[inline]
    pub fn is_lung_voxel(&self, index: VoxelIndex) -> bool {
        conventions::region_of(self.value(index)) != ChestRegion::Undefined
    }

    /// Decode the voxel into its (region, type) pair.
    pub fn region_type(&self, index: VoxelIndex) -> (ChestRegion, ChestType) {
        let value = self.value(index);
        (conventions::region_of(value), conventions::type_of(value))
    }

    /// Set the voxel to the undefined region and type.
    pub fn erase(&mut self, index: VoxelIndex) {
        self.set_value(index, 0);
    }

    /// Copy out the axial slice at `z`.
    pub fn extract_slice(&self, z: usize) -> LabelSlice {
        let plane = self.nx * self.ny;
        LabelSlice {
            nx: self.nx,
            ny: self.ny,
            data: self.data[z * plane..(z + 1) * plane].to_vec(),
        }
    }
}

/// 2D label slice, used for per-slice merge analysis.
#[derive(Debug, Clone)]
pub struct LabelSlice {
    nx: usize,
    ny: usize,
    data: Vec<u16>,
}

impl LabelSlice {
    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    #[inline]
    pub fn value(&self, index: PixelIndex) -> u16 {
        self.data[index[0] + index[1] * self.nx]
    }

    #[inline]
    pub fn is_lung(&self, index: PixelIndex) -> bool {
        conventions::region_of(self.value(index)) != ChestRegion::Undefined
    }

    /// Tight bounding box of all lung pixels, or `None` for an empty slice.
    pub fn lung_bounding_box(&self) -> Option<Region2> {
        let mut found = false;
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        for y in 0..self.ny {
            for x in 0..self.nx {
                if self.is_lung([x, y]) {
                    found = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if found {
            Some(Region2::new([min_x, min_y], [max_x, max_y]))
        } else {
            None
        }
    }
}
