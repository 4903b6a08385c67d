use std::collections::HashMap;

use crate::gpu::GpuContext;
use crate::mesh::MeshBuffer;
use crate::tessellate::{PrimitiveKind, ShapeParams};

/// One uploaded mesh per primitive kind, all built from the same parameters.
///
/// Shapes reference meshes by kind, so a scene with a hundred spheres still
/// holds a single sphere buffer.
#[derive(Default)]
pub struct ShapeCache {
    params: ShapeParams,
    meshes: HashMap<PrimitiveKind, MeshBuffer>,
}

impl ShapeCache {
    pub fn new(gpu: &GpuContext, params: ShapeParams) -> Self {
        let mut cache = Self::default();
        cache.update_params(gpu, params);
        cache
    }

    /// Drops every buffer and retessellates all primitives with `params`.
    pub fn update_params(&mut self, gpu: &GpuContext, params: ShapeParams) {
        self.meshes.clear();
        self.params = params;

        for kind in PrimitiveKind::ALL {
            let mesh = kind.tessellate(params);
            log::debug!(
                "Tessellated {kind} at ({}, {}): {} triangles",
                params.param1(),
                params.param2(),
                mesh.triangle_count()
            );
            if let Some(buffer) = MeshBuffer::upload(gpu, &mesh, kind.name()) {
                self.meshes.insert(kind, buffer);
            }
        }
    }

    pub fn params(&self) -> ShapeParams {
        self.params
    }

    pub fn get(&self, kind: PrimitiveKind) -> Option<&MeshBuffer> {
        self.meshes.get(&kind)
    }

    pub fn release(&mut self) {
        self.meshes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::test_gpu;

    #[test]
    fn rebuilds_every_kind_on_param_change() {
        let gpu = test_gpu::noop(4, 4);

        let mut cache = ShapeCache::new(&gpu, ShapeParams::new(1, 3));
        assert_eq!(cache.get(PrimitiveKind::Cube).map(MeshBuffer::vertex_count), Some(36));

        cache.update_params(&gpu, ShapeParams::new(3, 8));
        assert_eq!(cache.params(), ShapeParams::new(3, 8));
        assert_eq!(cache.get(PrimitiveKind::Cube).map(MeshBuffer::vertex_count), Some(324));
        for kind in PrimitiveKind::ALL {
            let expected = kind.tessellate(cache.params()).vertex_count() as u32;
            assert_eq!(cache.get(kind).map(MeshBuffer::vertex_count), Some(expected));
        }

        cache.release();
        assert!(cache.is_empty());
    }
}
