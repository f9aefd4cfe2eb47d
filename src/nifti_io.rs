//! NIfTI file I/O for CT volumes and label maps.
//!
//! Loads intensity volumes and packed `u16` label maps from `.nii` or
//! `.nii.gz` bytes (gzip is auto-detected) and writes label maps back as
//! uncompressed or gzipped NIfTI-1. Volumes are stored in Fortran
//! (column-major) order to match NIfTI convention: `index = x + y*nx +
//! z*nx*ny`.

use std::io::Cursor;

use flate2::read::GzDecoder;
use ndarray::Array;
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiHeader, NiftiObject};

use crate::volume::{LabelMap, ScalarVolume};

/// An intensity volume together with the header fields callers care about.
pub struct NiftiVolume {
    pub volume: ScalarVolume,
    /// Voxel sizes in mm.
    pub voxel_size: (f64, f64, f64),
    /// 4x4 affine, row-major.
    pub affine: [f64; 16],
    /// Data scaling slope as stored in the header (0 is normalized to 1).
    pub scl_slope: f64,
    /// Data scaling intercept.
    pub scl_inter: f64,
}

/// Check if bytes are gzip compressed
fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

struct Decoded {
    data: Vec<f64>,
    dims: (usize, usize, usize),
    voxel_size: (f64, f64, f64),
    affine: [f64; 16],
    scl_slope: f64,
    scl_inter: f64,
}

/// Shared load path: parse the object, pull out header fields, and copy the
/// first volume into a flat Fortran-order buffer.
fn decode(bytes: &[u8]) -> Result<Decoded, String> {
    let obj: InMemNiftiObject = if is_gzip(bytes) {
        let decoder = GzDecoder::new(Cursor::new(bytes));
        InMemNiftiObject::from_reader(decoder)
            .map_err(|e| format!("Failed to read gzipped NIfTI: {}", e))?
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes))
            .map_err(|e| format!("Failed to read NIfTI: {}", e))?
    };

    let header = obj.header();
    let ndim = header.dim[0] as usize;
    if ndim < 3 {
        return Err(format!("Expected at least 3D volume, got {}D", ndim));
    }

    let pixdim = header.pixdim;
    let voxel_size = (pixdim[1] as f64, pixdim[2] as f64, pixdim[3] as f64);
    let scl_slope = if header.scl_slope == 0.0 {
        1.0
    } else {
        header.scl_slope as f64
    };
    let scl_inter = header.scl_inter as f64;
    let affine = affine_from_header(header);

    let volume = obj.into_volume();
    let array: Array<f64, _> = volume
        .into_ndarray()
        .map_err(|e| format!("Failed to convert to ndarray: {}", e))?;

    let shape = array.shape().to_vec();
    if shape.len() < 3 {
        return Err(format!("Expected at least 3D array, got {}D", shape.len()));
    }
    let dims = (shape[0], shape[1], shape[2]);

    // Copy out in Fortran order (x varies fastest); for 4D data take the
    // first volume.
    let mut data = Vec::with_capacity(dims.0 * dims.1 * dims.2);
    for k in 0..dims.2 {
        for j in 0..dims.1 {
            for i in 0..dims.0 {
                let value = if shape.len() == 3 {
                    array[[i, j, k]]
                } else {
                    array[[i, j, k, 0]]
                };
                data.push(value);
            }
        }
    }

    Ok(Decoded {
        data,
        dims,
        voxel_size,
        affine,
        scl_slope,
        scl_inter,
    })
}

/// Load an intensity volume (e.g. a CT image) from NIfTI bytes.
pub fn load_volume(bytes: &[u8]) -> Result<NiftiVolume, String> {
    let decoded = decode(bytes)?;
    let volume = ScalarVolume::from_vec(decoded.dims, decoded.data)
        .map_err(|e| format!("Inconsistent NIfTI volume: {}", e))?;
    Ok(NiftiVolume {
        volume,
        voxel_size: decoded.voxel_size,
        affine: decoded.affine,
        scl_slope: decoded.scl_slope,
        scl_inter: decoded.scl_inter,
    })
}

/// Load a packed label map from NIfTI bytes.
///
/// Values must be non-negative integers that fit in 16 bits; anything else
/// means the file is not a label map and loading fails.
pub fn load_label_map(bytes: &[u8]) -> Result<LabelMap, String> {
    let decoded = decode(bytes)?;
    let mut labels = Vec::with_capacity(decoded.data.len());
    for (i, &value) in decoded.data.iter().enumerate() {
        if !(0.0..=65535.0).contains(&value) || (value - value.round()).abs() > 1e-6 {
            return Err(format!(
                "Voxel {} holds {} which is not a 16-bit label value",
                i, value
            ));
        }
        labels.push(value.round() as u16);
    }
    LabelMap::from_vec(decoded.dims, labels)
        .map_err(|e| format!("Inconsistent NIfTI volume: {}", e))
}

/// Get affine transformation matrix from header
fn affine_from_header(header: &NiftiHeader) -> [f64; 16] {
    // Prefer sform if available (sform_code > 0)
    if header.sform_code > 0 {
        let s = &header.srow_x;
        let t = &header.srow_y;
        let u = &header.srow_z;
        [
            s[0] as f64, s[1] as f64, s[2] as f64, s[3] as f64,
            t[0] as f64, t[1] as f64, t[2] as f64, t[3] as f64,
            u[0] as f64, u[1] as f64, u[2] as f64, u[3] as f64,
            0.0, 0.0, 0.0, 1.0,
        ]
    } else {
        // Fall back to identity with voxel scaling
        let (vsx, vsy, vsz) = (
            header.pixdim[1] as f64,
            header.pixdim[2] as f64,
            header.pixdim[3] as f64,
        );
        [
            vsx, 0.0, 0.0, 0.0,
            0.0, vsy, 0.0, 0.0,
            0.0, 0.0, vsz, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }
}

/// Save a label map as uncompressed NIfTI-1 bytes (UINT16 payload).
pub fn save_label_map(
    map: &LabelMap,
    voxel_size: (f64, f64, f64),
    affine: &[f64; 16],
) -> Result<Vec<u8>, String> {
    use std::io::Write;

    let (nx, ny, nz) = map.dims();
    let (vsx, vsy, vsz) = voxel_size;

    // NIfTI-1 header (348 bytes)
    let mut header = [0u8; 348];

    // sizeof_hdr = 348
    header[0..4].copy_from_slice(&348i32.to_le_bytes());

    // dim[0..7]
    let dim: [i16; 8] = [3, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1];
    for (i, &d) in dim.iter().enumerate() {
        let offset = 40 + i * 2;
        header[offset..offset + 2].copy_from_slice(&d.to_le_bytes());
    }

    // datatype = 512 (UINT16), bitpix = 16
    header[70..72].copy_from_slice(&512i16.to_le_bytes());
    header[72..74].copy_from_slice(&16i16.to_le_bytes());

    // pixdim[0..7]
    let pixdim: [f32; 8] = [1.0, vsx as f32, vsy as f32, vsz as f32, 1.0, 1.0, 1.0, 1.0];
    for (i, &p) in pixdim.iter().enumerate() {
        let offset = 76 + i * 4;
        header[offset..offset + 4].copy_from_slice(&p.to_le_bytes());
    }

    // vox_offset = 352 (header + 4 byte extension)
    header[108..112].copy_from_slice(&352.0f32.to_le_bytes());

    // scl_slope = 1.0, scl_inter = 0.0: label values are never rescaled
    header[112..116].copy_from_slice(&1.0f32.to_le_bytes());
    header[116..120].copy_from_slice(&0.0f32.to_le_bytes());

    // sform_code = 1 (scanner anat)
    header[254..256].copy_from_slice(&1i16.to_le_bytes());

    // srow_x, srow_y, srow_z
    for row in 0..3 {
        for col in 0..4 {
            let offset = 280 + row * 16 + col * 4;
            let value = affine[row * 4 + col] as f32;
            header[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    // magic = "n+1\0" for NIfTI-1 single file
    header[344..348].copy_from_slice(b"n+1\0");

    let mut buffer = Vec::with_capacity(352 + map.data().len() * 2);
    buffer
        .write_all(&header)
        .map_err(|e| format!("Write header failed: {}", e))?;
    // Extension flag (4 bytes, all zeros = no extension)
    buffer
        .write_all(&[0u8; 4])
        .map_err(|e| format!("Write extension failed: {}", e))?;
    for &value in map.data() {
        buffer
            .write_all(&value.to_le_bytes())
            .map_err(|e| format!("Write data failed: {}", e))?;
    }

    Ok(buffer)
}

/// Save a label map as gzipped NIfTI bytes (.nii.gz).
pub fn save_label_map_gz(
    map: &LabelMap,
    voxel_size: (f64, f64, f64),
    affine: &[f64; 16],
) -> Result<Vec<u8>, String> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let uncompressed = save_label_map(map, voxel_size, affine)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| format!("Gzip compression failed: {}", e))?;
    encoder
        .finish()
        .map_err(|e| format!("Gzip finish failed: {}", e))
}

/// Read an intensity volume from a filesystem path (.nii or .nii.gz).
pub fn read_volume_file(path: &std::path::Path) -> Result<NiftiVolume, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;
    load_volume(&bytes)
}

/// Read a label map from a filesystem path (.nii or .nii.gz).
pub fn read_label_map_file(path: &std::path::Path) -> Result<LabelMap, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;
    load_label_map(&bytes)
}

/// Save a label map to a file; `.nii.gz` paths are gzip compressed.
pub fn save_label_map_to_file(
    path: &std::path::Path,
    map: &LabelMap,
    voxel_size: (f64, f64, f64),
    affine: &[f64; 16],
) -> Result<(), String> {
    let bytes = if path.to_string_lossy().ends_with(".nii.gz") {
        save_label_map_gz(map, voxel_size, affine)?
    } else {
        save_label_map(map, voxel_size, affine)?
    };
    std::fs::write(path, &bytes)
        .map_err(|e| format!("Failed to write file '{}': {}", path.display(), e))
}
