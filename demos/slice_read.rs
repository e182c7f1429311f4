//! Example: create a small flat-file volume, write one in-line and read it
//! back through each addressing mode
//!
//! Run with: cargo run --example slice_read

use ndarray::Array2;
use seiscube::{FlatFileStore, SeismicCube, SliceIndex};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Seiscube Example: Slice Access");
    println!("==============================\n");

    // A 21 x 21 trace survey with 101 samples per trace
    let temp_dir = tempfile::tempdir()?;
    let volume_path = temp_dir.path().join("demo-survey");
    println!("Creating volume at: {}", volume_path.display());

    let store = FlatFileStore::create(
        &volume_path,
        (0..21).map(|i| 2000 + i * 5).collect(),
        (0..21).map(|i| 7000 + i * 2).collect(),
        (0..101).map(|i| f64::from(i) * 4.0).collect(),
    )?;

    let mut cube = SeismicCube::open(Box::new(store))?;
    println!("\n{}\n", cube);

    let geometry = cube.geometry().clone();
    println!(
        "Grid: {} in-lines x {} cross-lines x {} samples",
        geometry.n_east(),
        geometry.n_north(),
        geometry.n_depth()
    );

    // Write a synthetic section at in-line 2050
    let section = Array2::from_shape_fn((geometry.n_north(), geometry.n_depth()), |(row, k)| {
        ((row * k) as f32).sin()
    });
    cube.write(SliceIndex::Inline(2050), &section)?;
    println!("Wrote section at in-line 2050");

    // Read it back by every addressing mode
    let inline = cube.inline(2050)?;
    println!("In-line 2050 section: {:?}", inline.shape());

    let crossline = cube.crossline(7010)?;
    println!("Cross-line 7010 section: {:?}", crossline.shape());

    let depth = cube.depth(200.0)?;
    println!("Depth 200 slice: {:?}", depth.shape());

    let trace = cube.cdp(2050, 7010)?;
    println!("CDP (2050, 7010) trace: {} samples", trace.len());

    // Off-grid coordinates snap to the nearest trace position
    let (il, xl) = cube.snap_to_nearest_node(2052, 7011);
    println!("(2052, 7011) snaps to ({}, {})", il, xl);

    // Reads demand exact grid nodes
    match cube.read(SliceIndex::Inline(2052)) {
        Ok(_) => println!("unexpected"),
        Err(e) => println!("Read at off-grid in-line 2052 fails: {}", e),
    }

    println!("\nDone");
    Ok(())
}
