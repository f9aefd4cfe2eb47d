//! Split merged left/right lungs in a label map, end to end.
//!
//! Usage: cargo run --release --example split_lungs -- <ct.nii[.gz]> <labels.nii[.gz]> <out.nii[.gz]>

use std::path::Path;
use std::time::Instant;

use lungsplit_core::nifti_io::{read_label_map_file, read_volume_file, save_label_map_to_file};
use lungsplit_core::splitter::{LeftRightSplitter, SplitConfig};

fn main() -> Result<(), String> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        return Err(format!(
            "Usage: {} <ct.nii[.gz]> <labels.nii[.gz]> <out.nii[.gz]>",
            args[0]
        ));
    }

    let total_start = Instant::now();

    println!("[INFO] Loading CT volume...");
    let start = Instant::now();
    let ct = read_volume_file(Path::new(&args[1]))?;
    let (nx, ny, nz) = ct.volume.dims();
    let (vsx, vsy, vsz) = ct.voxel_size;
    println!("[INFO] Loaded in {:.2?}", start.elapsed());
    println!(
        "[INFO] Volume: {}x{}x{}, Voxel: {:.2}x{:.2}x{:.2} mm",
        nx, ny, nz, vsx, vsy, vsz
    );

    println!("[INFO] Loading label map...");
    let mut labels = read_label_map_file(Path::new(&args[2]))?;
    if labels.dims() != ct.volume.dims() {
        return Err(format!(
            "Label map dims {:?} do not match CT dims {:?}",
            labels.dims(),
            ct.volume.dims()
        ));
    }

    println!("[INFO] Splitting left and right lungs...");
    let start = Instant::now();
    let splitter = LeftRightSplitter::new(SplitConfig::default());
    let report = splitter
        .split(&mut labels, &ct.volume)
        .map_err(|e| format!("Split failed: {}", e))?;
    println!("[INFO] Split in {:.2?}", start.elapsed());
    println!(
        "[INFO] Merged slices: {}, split slices: {}, voxels removed: {}",
        report.merged_slices,
        report.split_slices,
        report.removed_indices.len()
    );

    println!("[INFO] Saving split label map...");
    save_label_map_to_file(Path::new(&args[3]), &labels, ct.voxel_size, &ct.affine)?;

    println!("[INFO] Done in {:.2?}", total_start.elapsed());
    Ok(())
}
