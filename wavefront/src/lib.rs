//! Reading and writing Wavefront .obj meshes as flat, gpu-ready arrays.
//!
//! Only polygon meshes are handled: no curves or surfaces, and materials,
//! groups and smoothing groups are skipped. Faces must all have the same
//! number of corners.

mod error;
mod mesh;
mod reader;
mod writer;

pub use error::{Result, WavefrontError};
pub use mesh::MeshData;
pub use reader::MeshReader;
pub use writer::MeshWriter;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Reads the obj file at `path`. Missing normals are synthesized.
pub fn read_mesh(path: impl AsRef<Path>) -> Result<MeshData> {
    let file = File::open(path.as_ref())?;
    log::debug!("reading {}", path.as_ref().display());
    MeshReader::read(BufReader::new(file))
}

/// Writes `mesh` to `path`, replacing whatever is there.
pub fn write_mesh(path: impl AsRef<Path>, mesh: &MeshData, name: Option<&str>) -> Result<()> {
    // check before truncating anything
    writer::validate(mesh)?;
    let file = File::create(path.as_ref())?;
    log::debug!("writing {}", path.as_ref().display());
    MeshWriter::write(BufWriter::new(file), mesh, name)?;
    Ok(())
}
