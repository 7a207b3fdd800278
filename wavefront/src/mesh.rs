use nalgebra::Vector3;

/// Flat, gpu-ready mesh arrays.
///
/// When `faces` is present every index addresses `vertices`, `normals` and
/// `texcoords` at the same position; no per-attribute index spaces survive
/// past the reader.
///
/// Indices are `u32`, so a mesh holds at most `u32::MAX` vertices; the reader
/// and writer both refuse anything bigger.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<[f32; 3]>,
    // all faces share one arity, normally 3 or 4
    // None means consecutive triples of vertices
    pub faces: Option<Vec<Vec<u32>>>,
    pub normals: Option<Vec<[f32; 3]>>,
    // 2 or 3 components each
    pub texcoords: Option<Vec<Vec<f32>>>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        match &self.faces {
            Some(faces) => faces.len(),
            None => self.vertices.len() / 3,
        }
    }

    /// Corners per face; unindexed meshes are always triangles.
    pub fn arity(&self) -> usize {
        self.faces
            .as_ref()
            .and_then(|faces| faces.first())
            .map(|face| face.len())
            .unwrap_or(3)
    }

    /// The faces as written, or consecutive triples for an unindexed mesh.
    /// A trailing partial triple is left out.
    pub fn face_indices(&self) -> Vec<Vec<u32>> {
        match &self.faces {
            Some(faces) => faces.clone(),
            None => (0..self.face_count() as u32)
                .map(|f| vec![f * 3, f * 3 + 1, f * 3 + 2])
                .collect(),
        }
    }

    /// Fans every face into triangles, so quads come out as (a, b, c) + (a, c, d).
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let mut tris = vec![];
        for face in self.face_indices() {
            for i in 1..face.len().saturating_sub(1) {
                tris.push([face[0], face[i], face[i + 1]]);
            }
        }
        tris
    }

    pub fn summary(&self) -> String {
        let n = self.vertex_count();
        let texcoords = match self.texcoords {
            Some(_) => format!("{} texcoords", n),
            None => "no texcoords".to_string(),
        };
        let normals = match self.normals {
            Some(_) => format!("{} normals", n),
            None => "no normals".to_string(),
        };
        format!(
            "{} vertices, {}, {}, {} faces",
            n,
            texcoords,
            normals,
            self.face_count()
        )
    }

    /// Smooth per-vertex normals: every adjacent face adds its unit normal once,
    /// then the sums get normalized. A vertex no face touches ends up as zero.
    pub fn compute_normals(&self) -> Vec<[f32; 3]> {
        let mut sums = vec![Vector3::<f32>::zeros(); self.vertices.len()];
        for tri in self.triangles() {
            let [a, b, c] = tri.map(|i| i as usize);
            if a >= sums.len() || b >= sums.len() || c >= sums.len() {
                log::warn!("skipping triangle {:?} that points past the vertex array", tri);
                continue;
            }
            let pa: Vector3<f32> = self.vertices[a].into();
            let pb: Vector3<f32> = self.vertices[b].into();
            let pc: Vector3<f32> = self.vertices[c].into();
            // degenerate triangles contribute nothing instead of NaNs
            let n = unit_or_zero((pb - pa).cross(&(pc - pa)));
            sums[a] += n;
            sums[b] += n;
            sums[c] += n;
        }
        sums.into_iter().map(|s| unit_or_zero(s).into()).collect()
    }
}

fn unit_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn single_triangle_faces_up() {
        let mesh = MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            faces: Some(vec![vec![0, 1, 2]]),
            ..Default::default()
        };
        for n in mesh.compute_normals() {
            assert!(close(n, [0.0, 0.0, 1.0]));
        }
    }

    #[test]
    fn unreferenced_vertex_gets_zero_normal() {
        let mesh = MeshData {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [5.0, 5.0, 5.0],
            ],
            faces: Some(vec![vec![0, 1, 2]]),
            ..Default::default()
        };
        let normals = mesh.compute_normals();
        assert_eq!(normals[3], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn degenerate_triangle_does_not_produce_nan() {
        let mesh = MeshData {
            vertices: vec![[1.0, 1.0, 1.0]; 3],
            faces: None,
            ..Default::default()
        };
        let normals = mesh.compute_normals();
        assert!(normals.iter().flatten().all(|c| !c.is_nan()));
    }

    #[test]
    fn quad_corners_all_receive_a_normal() {
        let mesh = MeshData {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            faces: Some(vec![vec![0, 1, 2, 3]]),
            ..Default::default()
        };
        assert_eq!(mesh.triangles(), vec![[0, 1, 2], [0, 2, 3]]);
        for n in mesh.compute_normals() {
            assert!(close(n, [0.0, 0.0, 1.0]));
        }
    }

    #[test]
    fn unindexed_mesh_uses_consecutive_triples() {
        let mesh = MeshData {
            vertices: vec![[0.0; 3]; 7],
            ..Default::default()
        };
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.face_indices(), vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(mesh.arity(), 3);
    }

    #[test]
    fn summary_mentions_missing_streams() {
        let mesh = MeshData {
            vertices: vec![[0.0; 3]; 3],
            faces: Some(vec![vec![0, 1, 2]]),
            normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
            texcoords: None,
        };
        assert_eq!(
            mesh.summary(),
            "3 vertices, no texcoords, 3 normals, 1 faces"
        );
    }
}
