//! nether-skinsplit
//!
//! Splits a skinned mesh into sub-meshes that each fit a GPU draw call's
//! bone palette limit.
//!
//! A vertex-skinning shader binds its bone matrices as a uniform array of
//! bounded size, so one draw call can reference only so many distinct
//! bones. Rigged meshes routinely exceed that bound. At import time this
//! crate splits such a mesh into partitions: each output sub-mesh
//! references at most `bone_limit` distinct bones, carries its own
//! reordered bone table, and has its vertex bone indices rewritten to
//! index that table. Triangles are never cut and all non-bone vertex
//! attributes are copied byte for byte.
//!
//! This is a one-shot, load-time transformation invoked once per mesh;
//! nothing here runs per frame.
//!
//! # Example
//!
//! ```ignore
//! use nether_skinsplit::{load_skinned_glb, split_skinned_mesh};
//!
//! let source = load_skinned_glb(&glb_bytes)?;
//! let streams: Vec<&[u8]> = source.streams.iter().map(Vec::as_slice).collect();
//! let split = split_skinned_mesh(
//!     &streams,
//!     &source.format,
//!     &source.indices,
//!     &source.submeshes,
//!     &source.skin,
//!     bone_limit,
//! )?;
//!
//! for mesh in &split.meshes {
//!     // one draw call per mesh, uploading mesh.skin as the bone palette
//! }
//! ```

mod assemble;
mod error;
mod extract;
mod format;
mod gltf;
mod partition;
mod types;

pub use error::SkinSplitError;
pub use format::{
    ComponentType, SkinningElements, VertexElement, VertexFormat, SEMANTIC_BONE_INDICES,
    SEMANTIC_BONE_WEIGHTS,
};
pub use gltf::{load_skinned_glb, GltfMeshSource};
pub use types::{PartitionedMesh, Skin, SplitMesh, Submesh, MAX_INFLUENCES};

use extract::VertexExtractor;

/// Reserved vertex-shader uniform vectors for non-bone data: model, view,
/// projection and shadow matrices, light positions, the eye position and
/// texture transforms of the standard skinned shader.
const RESERVED_UNIFORM_VECTORS: usize = 41;
/// Uniform vectors per palette entry: bone matrices upload as 3 vec4 rows.
const VECTORS_PER_BONE: usize = 3;
/// Cap on the palette size regardless of the uniform budget. Oversized
/// palettes have shown pathological performance on some GPUs.
const MAX_BONE_LIMIT: usize = 128;

/// Estimate how many bones fit a vertex shader's uniform vector budget.
///
/// The render backend typically feeds the result into
/// [`split_skinned_mesh`] as `bone_limit`.
pub fn bone_limit_for_uniform_budget(vertex_uniform_vectors: usize) -> usize {
    let available = vertex_uniform_vectors.saturating_sub(RESERVED_UNIFORM_VECTORS);
    (available / VECTORS_PER_BONE).min(MAX_BONE_LIMIT)
}

/// Split a skinned mesh so every output sub-mesh references at most
/// `bone_limit` distinct bones.
///
/// Inputs are borrowed for the duration of the call; the returned
/// [`SplitMesh`] owns freshly allocated buffers. Identical inputs always
/// produce byte-identical output.
///
/// Triangles are processed per submesh, in index order, and greedily
/// packed into the first partition whose bone set still fits. Partitions
/// never mix geometry from two submeshes. A mesh without skinning
/// attributes yields an empty result, as does an empty submesh list.
///
/// # Errors
///
/// Fails with [`SkinSplitError::InvalidBoneLimit`] for a zero limit and
/// [`SkinSplitError::UnsatisfiableTriangle`] when a single triangle's own
/// bone set exceeds the limit; such a triangle can never be placed. Any
/// error discards all partial state.
pub fn split_skinned_mesh(
    streams: &[&[u8]],
    format: &VertexFormat,
    indices: &[u32],
    submeshes: &[Submesh],
    skin: &Skin,
    bone_limit: usize,
) -> Result<SplitMesh, SkinSplitError> {
    if bone_limit == 0 {
        return Err(SkinSplitError::InvalidBoneLimit);
    }
    validate_format(streams, format)?;

    let Some(skinning) = format.skinning_elements() else {
        tracing::warn!("mesh carries no skinning attributes; nothing to split");
        return Ok(empty_split(format));
    };

    let mut extractor = VertexExtractor::new(streams, format, skinning);
    let partitions = partition::build_partitions(&mut extractor, indices, submeshes, bone_limit)?;
    let split = assemble::assemble(&partitions, format, skinning, skin)?;

    tracing::info!(
        "split skinned mesh: {} submeshes -> {} partitions ({} vertices, {} indices, bone limit {})",
        submeshes.len(),
        split.meshes.len(),
        split.meshes.iter().map(|m| m.vertex_count).sum::<usize>(),
        split.indices.len(),
        bone_limit,
    );

    Ok(split)
}

/// Check the stream table against the format before touching any bytes.
fn validate_format(streams: &[&[u8]], format: &VertexFormat) -> Result<(), SkinSplitError> {
    if streams.len() != format.stream_strides.len() {
        return Err(SkinSplitError::StreamCountMismatch {
            streams: streams.len(),
            strides: format.stream_strides.len(),
        });
    }
    for elem in &format.elements {
        let fits = format
            .stream_strides
            .get(elem.stream)
            .is_some_and(|&stride| {
                elem.offset + elem.component_count * elem.component_type.size() <= stride
            });
        if !fits {
            return Err(SkinSplitError::ElementOutOfStride {
                semantic: elem.semantic.clone(),
                stream: elem.stream,
            });
        }
    }
    Ok(())
}

fn empty_split(format: &VertexFormat) -> SplitMesh {
    SplitMesh {
        vertex_streams: format.stream_strides.iter().map(|_| Vec::new()).collect(),
        indices: Vec::new(),
        meshes: Vec::new(),
    }
}
