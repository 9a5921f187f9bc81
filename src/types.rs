//! Input and output types for skinned mesh splitting.

use glam::Mat4;

/// Number of bone influence slots per vertex
pub const MAX_INFLUENCES: usize = 4;

/// One draw range of the source mesh, with its material binding.
///
/// Ranges address the shared index buffer; `index_count` is a multiple of
/// 3 because the topology is always a triangle list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submesh {
    /// First entry of this submesh in the shared index buffer
    pub index_base: usize,
    /// Number of indices in this submesh
    pub index_count: usize,
    /// Material reference, passed through to the output untouched
    pub material: usize,
}

/// A mesh's bone table, indexed by global bone id.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    pub inverse_bind_poses: Vec<Mat4>,
    pub bone_names: Vec<String>,
}

impl Skin {
    pub fn bone_count(&self) -> usize {
        self.bone_names.len()
    }
}

/// One GPU draw call's worth of geometry after splitting.
///
/// The vertex/index ranges address the merged buffers of the owning
/// [`SplitMesh`]. The skin is this draw's compact bone palette: vertex
/// bone indices inside the range are local indices into it.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedMesh {
    pub vertex_start: usize,
    pub vertex_count: usize,
    pub index_start: usize,
    pub index_count: usize,
    /// Reordered bone table, at most `bone_limit` entries
    pub skin: Skin,
    /// Material inherited from the originating submesh
    pub material: usize,
}

/// Result of splitting: merged buffers plus one descriptor per draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitMesh {
    /// Merged vertex data, one buffer per source stream, same strides
    pub vertex_streams: Vec<Vec<u8>>,
    /// Merged index buffer; entries are absolute into the merged streams
    pub indices: Vec<u32>,
    /// Per-draw-call descriptors, in partition order
    pub meshes: Vec<PartitionedMesh>,
}
