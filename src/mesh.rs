//! Indexed triangle meshes: built-in shapes and Wavefront OBJ loading

use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::math::{Vec2, Vec3};
use crate::types::MeshVertex;

/// Vertex buffer plus triangle-list indices, counter-clockwise when seen
/// from outside
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Load every model in an OBJ file into one mesh. Faces are
    /// triangulated; material libraries are ignored.
    pub fn from_obj<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let (models, _materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
        let mesh = Self::from_models(&models)?;
        tracing::info!(
            path = %path.display(),
            vertices = mesh.vertices.len(),
            triangles = mesh.triangle_count(),
            "loaded mesh"
        );
        Ok(mesh)
    }

    /// Parse OBJ text. There is no directory to resolve `mtllib` against, so
    /// materials are never loaded.
    pub fn from_obj_str(source: &str) -> PipelineResult<Self> {
        let mut reader = source.as_bytes();
        let (models, _materials) =
            tobj::load_obj_buf(&mut reader, &tobj::GPU_LOAD_OPTIONS, |_| Err(tobj::LoadError::OpenFileFailed))?;
        Self::from_models(&models)
    }

    fn from_models(models: &[tobj::Model]) -> PipelineResult<Self> {
        let mut mesh = Mesh::default();
        for model in models {
            let m = &model.mesh;
            let base = mesh.vertices.len();
            for i in 0..m.positions.len() / 3 {
                let pos = Vec3::new(m.positions[3 * i], m.positions[3 * i + 1], m.positions[3 * i + 2]);
                let uv = match m.texcoords.get(2 * i..2 * i + 2) {
                    Some(t) => Vec2::new(t[0], t[1]),
                    None => Vec2::ZERO,
                };
                let normal = match m.normals.get(3 * i..3 * i + 3) {
                    Some(n) => Vec3::new(n[0], n[1], n[2]),
                    None => Vec3::ZERO,
                };
                mesh.vertices.push(MeshVertex::new(pos, uv, normal));
            }
            mesh.indices.extend(m.indices.iter().map(|&i| base as u32 + i));
            if m.normals.is_empty() {
                mesh.smooth_normals(base, mesh.indices.len() - m.indices.len());
            }
        }

        if mesh.triangle_count() == 0 {
            return Err(PipelineError::validation("OBJ contains no triangles"));
        }
        Ok(mesh)
    }

    /// Area-weighted vertex normals for vertices from `first_vertex` on,
    /// using triangles from `first_index` on
    fn smooth_normals(&mut self, first_vertex: usize, first_index: usize) {
        let mut sums = vec![Vec3::ZERO; self.vertices.len() - first_vertex];
        for tri in self.indices[first_index..].chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
            let (Some(pa), Some(pb), Some(pc)) = (self.vertices.get(a), self.vertices.get(b), self.vertices.get(c)) else {
                continue;
            };
            let face = (pb.pos - pa.pos).cross(pc.pos - pa.pos);
            for i in [a, b, c] {
                if let Some(sum) = i.checked_sub(first_vertex).and_then(|k| sums.get_mut(k)) {
                    *sum = *sum + face;
                }
            }
        }
        for (vertex, sum) in self.vertices[first_vertex..].iter_mut().zip(sums) {
            vertex.normal = sum.normalize();
        }
    }

    /// One vertex per index, for non-indexed draws
    pub fn flattened(&self) -> Vec<MeshVertex> {
        self.indices
            .iter()
            .filter_map(|&i| self.vertices.get(i as usize).copied())
            .collect()
    }

    /// Push a four-corner face as two triangles. Corners go counter-clockwise
    /// and get UVs (0,0), (1,0), (1,1), (0,1).
    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let base = self.vertices.len() as u32;
        for (pos, uv) in corners.into_iter().zip(uvs) {
            self.vertices.push(MeshVertex::new(pos, uv, normal));
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Axis-aligned square of side `size` in the XY plane at `z`, facing +Z
    pub fn quad(size: f32, z: f32) -> Self {
        let h = size * 0.5;
        let mut mesh = Mesh::default();
        mesh.push_quad(
            [
                Vec3::new(-h, -h, z),
                Vec3::new(h, -h, z),
                Vec3::new(h, h, z),
                Vec3::new(-h, h, z),
            ],
            Vec3::new(0.0, 0.0, 1.0),
        );
        mesh
    }

    /// Unit-radius cube centered on the origin, 24 vertices with per-face
    /// normals and UVs
    pub fn cube() -> Self {
        let v = Vec3::new;
        let faces = [
            // Front
            ([v(-1.0, -1.0, 1.0), v(1.0, -1.0, 1.0), v(1.0, 1.0, 1.0), v(-1.0, 1.0, 1.0)], v(0.0, 0.0, 1.0)),
            // Back
            ([v(1.0, -1.0, -1.0), v(-1.0, -1.0, -1.0), v(-1.0, 1.0, -1.0), v(1.0, 1.0, -1.0)], v(0.0, 0.0, -1.0)),
            // Top
            ([v(-1.0, 1.0, 1.0), v(1.0, 1.0, 1.0), v(1.0, 1.0, -1.0), v(-1.0, 1.0, -1.0)], v(0.0, 1.0, 0.0)),
            // Bottom
            ([v(-1.0, -1.0, -1.0), v(1.0, -1.0, -1.0), v(1.0, -1.0, 1.0), v(-1.0, -1.0, 1.0)], v(0.0, -1.0, 0.0)),
            // Right
            ([v(1.0, -1.0, 1.0), v(1.0, -1.0, -1.0), v(1.0, 1.0, -1.0), v(1.0, 1.0, 1.0)], v(1.0, 0.0, 0.0)),
            // Left
            ([v(-1.0, -1.0, -1.0), v(-1.0, -1.0, 1.0), v(-1.0, 1.0, 1.0), v(-1.0, 1.0, -1.0)], v(-1.0, 0.0, 0.0)),
        ];

        let mut mesh = Mesh::default();
        for (corners, normal) in faces {
            mesh.push_quad(corners, normal);
        }
        mesh
    }
}
