// obj lets every face corner index positions, texcoords and normals separately;
// gpus want one index per vertex. so every distinct (v, vt, vn) combination
// a face uses becomes its own vertex in the output, and all three output
// arrays stay the same length the whole time

use crate::error::{Result, WavefrontError};
use crate::mesh::MeshData;
use std::collections::HashMap;
use std::io::BufRead;
use std::time::Instant;

// whether the mesh as a whole carries an attribute stream
// decided by the first corner we see, and any disagreement afterwards kills it for good
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stream {
    Unknown,
    // the first corner had it, every corner since too
    Present,
    // the first corner didn't have it
    Absent,
    // corners disagreed; nothing from this stream makes it out
    Collapsed,
}

impl Stream {
    // returns true when the component of this corner should be stored
    fn observe(&mut self, given: bool, what: &str) -> bool {
        match (*self, given) {
            (Stream::Unknown, true) => *self = Stream::Present,
            (Stream::Unknown, false) => *self = Stream::Absent,
            (Stream::Present, false) | (Stream::Absent, true) => {
                log::warn!(
                    "ignoring {} because they are not specified for all faces",
                    what
                );
                *self = Stream::Collapsed;
            }
            _ => {}
        }
        *self == Stream::Present
    }
}

// resolved raw indices of one face corner; identical corners share an output vertex
type CornerKey = (usize, Option<usize>, Option<usize>);

pub struct MeshReader {
    // as declared in the file, each with its own numbering
    raw_positions: Vec<[f32; 3]>,
    raw_texcoords: Vec<Vec<f32>>,
    raw_normals: Vec<[f32; 3]>,

    seen: HashMap<CornerKey, u32>,

    // synchronized output
    vertices: Vec<[f32; 3]>,
    texcoords: Vec<Vec<f32>>,
    normals: Vec<[f32; 3]>,
    faces: Vec<Vec<u32>>,

    texcoord_stream: Stream,
    normal_stream: Stream,
}

impl MeshReader {
    pub fn create() -> Self {
        Self {
            raw_positions: vec![],
            raw_texcoords: vec![],
            raw_normals: vec![],
            seen: HashMap::new(),
            vertices: vec![],
            texcoords: vec![],
            normals: vec![],
            faces: vec![],
            texcoord_stream: Stream::Unknown,
            normal_stream: Stream::Unknown,
        }
    }

    /// Reads a whole obj stream into a [`MeshData`].
    ///
    /// Non-ascii bytes are dropped. Unsupported directives and attribute
    /// streams that not every face provides are logged and skipped; bad
    /// numbers, bad indices and faces of differing arity are fatal.
    pub fn read<R: BufRead>(source: R) -> Result<MeshData> {
        let t0 = Instant::now();
        let mut reader = Self::create();
        for (idx, line) in source.split(b'\n').enumerate() {
            let line: String = line?
                .into_iter()
                .filter(u8::is_ascii)
                .map(char::from)
                .collect();
            reader.read_line(idx + 1, &line)?;
        }
        let mesh = reader.finish();
        log::debug!("read mesh ({}) in {:?}", mesh.summary(), t0.elapsed());
        Ok(mesh)
    }

    /// Handles one line of the file; `lineno` is 1-based and only used for errors.
    pub fn read_line(&mut self, lineno: usize, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let mut tokens = line.split_whitespace();
        let tag = tokens.next().unwrap_or_default();
        match tag {
            "v" => {
                let p = read_numbers(lineno, tokens, 3)?;
                self.raw_positions
                    .push(exactly_three(lineno, &p, "vertex position")?);
            }
            "vt" => {
                let mut t = read_numbers(lineno, tokens, 3)?;
                if t.is_empty() {
                    return Err(WavefrontError::format(
                        lineno,
                        "texture coordinate without components",
                    ));
                }
                // `vt u` means v = 0
                if t.len() == 1 {
                    t.push(0.0);
                }
                self.raw_texcoords.push(t);
            }
            "vn" => {
                let n = read_numbers(lineno, tokens, 3)?;
                self.raw_normals.push(exactly_three(lineno, &n, "normal")?);
            }
            "f" => self.read_face(lineno, tokens.collect())?,
            "g" | "s" | "o" | "usemtl" => {}
            "mtllib" => log::info!("material properties are ignored"),
            _ => log::info!("ignoring {} command", line),
        }
        Ok(())
    }

    fn read_face(&mut self, lineno: usize, corners: Vec<&str>) -> Result<()> {
        if corners.len() < 3 {
            return Err(WavefrontError::format(
                lineno,
                format!("face needs at least 3 corners, got {}", corners.len()),
            ));
        }
        if let Some(first) = self.faces.first() {
            if first.len() != corners.len() {
                return Err(WavefrontError::format(
                    lineno,
                    format!(
                        "face has {} corners but earlier faces have {}; faces must be all triangles or all quads",
                        corners.len(),
                        first.len()
                    ),
                ));
            }
        }

        let mut face = Vec::with_capacity(corners.len());
        for corner in corners {
            let key = self.resolve_corner(lineno, corner)?;
            if let Some(&index) = self.seen.get(&key) {
                face.push(index);
                continue;
            }

            let index = next_index(lineno, self.vertices.len())?;
            self.seen.insert(key, index);
            face.push(index);

            let (v, vt, vn) = key;
            self.vertices.push(self.raw_positions[v]);
            if self.texcoord_stream.observe(vt.is_some(), "texture coordinates") {
                if let Some(vt) = vt {
                    self.texcoords.push(self.raw_texcoords[vt].clone());
                }
            }
            if self.normal_stream.observe(vn.is_some(), "normals") {
                if let Some(vn) = vn {
                    self.normals.push(self.raw_normals[vn]);
                }
            }
        }
        self.faces.push(face);
        Ok(())
    }

    // `v`, `v/vt`, `v//vn` or `v/vt/vn`
    fn resolve_corner(&self, lineno: usize, corner: &str) -> Result<CornerKey> {
        let parts = corner.split('/').collect::<Vec<_>>();
        if parts.len() > 3 {
            return Err(WavefrontError::format(
                lineno,
                format!("bad face corner {:?}", corner),
            ));
        }
        let v = resolve_index(lineno, parts[0], self.raw_positions.len(), "vertex")?;
        let vt = match parts.get(1) {
            Some(s) if !s.is_empty() => Some(resolve_index(
                lineno,
                s,
                self.raw_texcoords.len(),
                "texture coordinate",
            )?),
            _ => None,
        };
        let vn = match parts.get(2) {
            Some(s) if !s.is_empty() => {
                Some(resolve_index(lineno, s, self.raw_normals.len(), "normal")?)
            }
            _ => None,
        };
        Ok((v, vt, vn))
    }

    /// Turns everything gathered so far into a [`MeshData`].
    ///
    /// A file without faces yields its positions as an unindexed mesh.
    /// Normals are synthesized whenever the faces didn't all provide them.
    pub fn finish(self) -> MeshData {
        let mut mesh = if self.faces.is_empty() {
            MeshData {
                vertices: self.raw_positions,
                faces: None,
                normals: None,
                texcoords: None,
            }
        } else {
            MeshData {
                vertices: self.vertices,
                faces: Some(self.faces),
                normals: (self.normal_stream == Stream::Present).then_some(self.normals),
                texcoords: (self.texcoord_stream == Stream::Present).then_some(self.texcoords),
            }
        };
        if mesh.normals.is_none() {
            mesh.normals = Some(mesh.compute_normals());
        }
        mesh
    }
}

// output indices are u32
fn next_index(lineno: usize, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        WavefrontError::format(lineno, "too many distinct vertices for 32-bit indices")
    })
}

// takes at most `max` numbers, the rest of the line is ignored
fn read_numbers<'a>(
    lineno: usize,
    tokens: impl Iterator<Item = &'a str>,
    max: usize,
) -> Result<Vec<f32>> {
    tokens
        .take(max)
        .map(|t| {
            t.parse::<f32>()
                .map_err(|_| WavefrontError::format(lineno, format!("bad number {:?}", t)))
        })
        .collect()
}

fn exactly_three(lineno: usize, numbers: &[f32], what: &str) -> Result<[f32; 3]> {
    <[f32; 3]>::try_from(numbers).map_err(|_| {
        WavefrontError::format(
            lineno,
            format!("{} needs 3 components, got {}", what, numbers.len()),
        )
    })
}

// 1-based, or negative to count back from the end of what's been declared so far
fn resolve_index(lineno: usize, token: &str, len: usize, what: &str) -> Result<usize> {
    let i: i64 = token
        .parse()
        .map_err(|_| WavefrontError::format(lineno, format!("bad {} index {:?}", what, token)))?;
    let resolved = match i {
        i if i > 0 => i - 1,
        i if i < 0 => len as i64 + i,
        _ => {
            return Err(WavefrontError::format(
                lineno,
                format!("{} index 0 is not valid; obj counts from 1", what),
            ))
        }
    };
    if resolved < 0 || resolved >= len as i64 {
        return Err(WavefrontError::format(
            lineno,
            format!(
                "{} index {} is out of range ({} declared so far)",
                what, i, len
            ),
        ));
    }
    Ok(resolved as usize)
}
