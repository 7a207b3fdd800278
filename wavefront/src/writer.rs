use crate::error::{Result, WavefrontError};
use crate::mesh::MeshData;
use std::io::Write;

/// Writes synchronized mesh arrays back out as obj.
///
/// There's no index splitting here: vertex `i` becomes the `i+1`th `v`, `vt`
/// and `vn` line, and every face corner reuses that one index for all of them.
pub struct MeshWriter<W: Write> {
    sink: W,
    has_texcoords: bool,
    has_normals: bool,
}

impl<W: Write> MeshWriter<W> {
    pub fn write(sink: W, mesh: &MeshData, name: Option<&str>) -> Result<W> {
        validate(mesh)?;
        let mut writer = Self {
            sink,
            has_texcoords: mesh.texcoords.is_some(),
            has_normals: mesh.normals.is_some(),
        };
        writer.write_mesh(mesh, name)?;
        writer.sink.flush()?;
        Ok(writer.sink)
    }

    fn write_mesh(&mut self, mesh: &MeshData, name: Option<&str>) -> Result<()> {
        if mesh.faces.is_none() && mesh.vertex_count() % 3 != 0 {
            log::warn!(
                "unindexed mesh has {} vertices; the last {} don't make a triangle and are left out of the faces",
                mesh.vertex_count(),
                mesh.vertex_count() % 3
            );
        }

        writeln!(self.sink, "# Wavefront OBJ file")?;
        writeln!(self.sink, "# Created by wavefront-rs.")?;
        writeln!(self.sink, "#")?;
        match name {
            Some(name) if !name.is_empty() => writeln!(self.sink, "# object {}", name)?,
            _ => writeln!(self.sink, "# unnamed object")?,
        }
        writeln!(self.sink, "# {}", mesh.summary())?;
        writeln!(self.sink)?;

        for v in &mesh.vertices {
            self.write_tuple("v", v, 3)?;
        }
        if let Some(normals) = &mesh.normals {
            for n in normals {
                self.write_tuple("vn", n, 3)?;
            }
        }
        if let Some(texcoords) = &mesh.texcoords {
            for t in texcoords {
                self.write_tuple("vt", t, 2)?;
            }
        }
        for face in mesh.face_indices() {
            self.write_face(&face)?;
        }
        Ok(())
    }

    // `vt` lines only carry u and v; any third texcoord component is dropped
    fn write_tuple(&mut self, what: &str, values: &[f32], max: usize) -> Result<()> {
        write!(self.sink, "{}", what)?;
        for v in values.iter().take(max) {
            write!(self.sink, " {}", v)?;
        }
        writeln!(self.sink)?;
        Ok(())
    }

    fn write_face(&mut self, face: &[u32]) -> Result<()> {
        write!(self.sink, "f")?;
        for &i in face {
            // obj counts from 1
            let i = i + 1;
            match (self.has_texcoords, self.has_normals) {
                (true, true) => write!(self.sink, " {}/{}/{}", i, i, i)?,
                (false, true) => write!(self.sink, " {}//{}", i, i)?,
                (true, false) => write!(self.sink, " {}/{}", i, i)?,
                (false, false) => write!(self.sink, " {}", i)?,
            }
        }
        writeln!(self.sink)?;
        Ok(())
    }
}

// catch meshes that would come out as a file nothing can read back
pub(crate) fn validate(mesh: &MeshData) -> Result<()> {
    let n = mesh.vertex_count();
    check_vertex_count(n)?;
    if let Some(normals) = &mesh.normals {
        if normals.len() != n {
            return Err(WavefrontError::format(
                0,
                format!("{} normals for {} vertices", normals.len(), n),
            ));
        }
    }
    if let Some(texcoords) = &mesh.texcoords {
        if texcoords.len() != n {
            return Err(WavefrontError::format(
                0,
                format!("{} texcoords for {} vertices", texcoords.len(), n),
            ));
        }
        if let Some((i, t)) = texcoords
            .iter()
            .enumerate()
            .find(|(_, t)| !(2..=3).contains(&t.len()))
        {
            return Err(WavefrontError::format(
                0,
                format!("texcoord {} has {} components, expected 2 or 3", i, t.len()),
            ));
        }
    }
    if let Some(faces) = &mesh.faces {
        let arity = mesh.arity();
        for (f, face) in faces.iter().enumerate() {
            if face.len() < 3 || face.len() != arity {
                return Err(WavefrontError::format(
                    0,
                    format!("face {} has {} corners, expected {}", f, face.len(), arity),
                ));
            }
            if let Some(&i) = face.iter().find(|&&i| i as usize >= n) {
                return Err(WavefrontError::format(
                    0,
                    format!("face {} uses vertex {} but there are only {}", f, i, n),
                ));
            }
        }
    }
    Ok(())
}

// indices are u32 and get written 1-based
fn check_vertex_count(n: usize) -> Result<()> {
    if n > u32::MAX as usize {
        return Err(WavefrontError::format(
            0,
            format!("{} vertices don't fit in 32-bit indices", n),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(mesh: &MeshData, name: Option<&str>) -> String {
        let out = MeshWriter::write(Vec::<u8>::new(), mesh, name).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn triangle() -> MeshData {
        MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.5, 0.0]],
            faces: Some(vec![vec![0, 1, 2]]),
            normals: None,
            texcoords: None,
        }
    }

    #[test]
    fn header_and_records_in_order() {
        let mut mesh = triangle();
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
        mesh.texcoords = Some(vec![vec![0.0, 0.0, 7.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
        let text = write(&mesh, Some("tri"));
        let expected = "\
# Wavefront OBJ file
# Created by wavefront-rs.
#
# object tri
# 3 vertices, 3 texcoords, 3 normals, 1 faces

v 0 0 0
v 1 0 0
v 0 1.5 0
vn 0 0 1
vn 0 0 1
vn 0 0 1
vt 0 0
vt 1 0
vt 0 1
f 1/1/1 2/2/2 3/3/3
";
        assert_eq!(text, expected);
    }

    #[test]
    fn face_tokens_follow_present_attributes() {
        let mut mesh = triangle();
        assert!(write(&mesh, None).ends_with("f 1 2 3\n"));
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
        assert!(write(&mesh, None).ends_with("f 1//1 2//2 3//3\n"));
        mesh.normals = None;
        mesh.texcoords = Some(vec![vec![0.0, 0.0]; 3]);
        assert!(write(&mesh, None).ends_with("f 1/1 2/2 3/3\n"));
    }

    #[test]
    fn unnamed_object_header() {
        let text = write(&triangle(), None);
        assert!(text.contains("# unnamed object\n"));
        assert!(text.contains("# 3 vertices, no texcoords, no normals, 1 faces\n"));
    }

    #[test]
    fn unindexed_mesh_gets_consecutive_faces() {
        let mesh = MeshData {
            vertices: vec![[0.0; 3]; 7],
            ..Default::default()
        };
        let text = write(&mesh, None);
        let faces = text.lines().filter(|l| l.starts_with("f ")).collect::<Vec<_>>();
        assert_eq!(faces, vec!["f 1 2 3", "f 4 5 6"]);
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 7);
    }

    #[test]
    fn out_of_range_face_is_rejected() {
        let mut mesh = triangle();
        mesh.faces = Some(vec![vec![0, 1, 3]]);
        assert!(MeshWriter::write(Vec::<u8>::new(), &mesh, None).is_err());
    }

    #[test]
    fn unsynchronized_normals_are_rejected() {
        let mut mesh = triangle();
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]]);
        assert!(MeshWriter::write(Vec::<u8>::new(), &mesh, None).is_err());
    }

    #[test]
    fn texcoords_without_two_or_three_components_are_rejected() {
        let mut mesh = triangle();
        mesh.texcoords = Some(vec![vec![]; 3]);
        assert!(MeshWriter::write(Vec::<u8>::new(), &mesh, None).is_err());
        mesh.texcoords = Some(vec![vec![0.0, 0.0], vec![1.0], vec![0.0, 1.0]]);
        assert!(MeshWriter::write(Vec::<u8>::new(), &mesh, None).is_err());
        mesh.texcoords = Some(vec![vec![0.0; 4]; 3]);
        assert!(MeshWriter::write(Vec::<u8>::new(), &mesh, None).is_err());
    }

    #[test]
    fn vertex_counts_past_u32_are_rejected() {
        assert!(check_vertex_count(u32::MAX as usize).is_ok());
        if let Some(n) = (u32::MAX as usize).checked_add(1) {
            assert!(check_vertex_count(n).is_err());
        }
    }
}
