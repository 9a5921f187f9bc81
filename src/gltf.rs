//! glTF import adapter.
//!
//! Builds the splitter's inputs from an in-memory GLB: one interleaved
//! vertex stream, a shared index buffer with one submesh range per
//! primitive, and the bone table of the document's skin.

use anyhow::{bail, Context, Result};
use bytemuck::cast_slice;
use glam::Mat4;

use crate::format::{
    ComponentType, VertexElement, VertexFormat, SEMANTIC_BONE_INDICES, SEMANTIC_BONE_WEIGHTS,
};
use crate::types::{Skin, Submesh};

// Interleaved layout produced by the adapter. Bone indices are u16 so
// skins past 255 joints import unclamped; splitting them down to a
// byte-addressable palette is this crate's whole job.
// position f32x3, normal f32x3, uv f32x2, bone indices u16x4, weights f32x4
const OFFSET_NORMAL: usize = 12;
const OFFSET_UV: usize = 24;
const OFFSET_BONE_INDICES: usize = 32;
const OFFSET_BONE_WEIGHTS: usize = 40;
const VERTEX_STRIDE: usize = 56;

/// Splitter inputs extracted from a GLB
#[derive(Debug, Clone)]
pub struct GltfMeshSource {
    /// Vertex streams (a single interleaved stream for glTF imports)
    pub streams: Vec<Vec<u8>>,
    /// Format describing the interleaved stream
    pub format: VertexFormat,
    /// Shared index buffer across all primitives
    pub indices: Vec<u32>,
    /// One submesh per glTF primitive, in primitive order
    pub submeshes: Vec<Submesh>,
    /// Bone table of the document's first skin
    pub skin: Skin,
}

/// Extract the first skinned mesh and skin from a GLB.
///
/// Every primitive of the mesh becomes one submesh over a shared index
/// buffer. Missing normals/UVs get neutral defaults; missing skinning
/// data is an error, since an unskinned mesh has nothing to split.
pub fn load_skinned_glb(glb: &[u8]) -> Result<GltfMeshSource> {
    let (document, buffers, _images) =
        gltf::import_slice(glb).context("Failed to parse GLB data")?;

    let mesh = document.meshes().next().context("No meshes found in glTF")?;

    let mut stream: Vec<u8> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut submeshes: Vec<Submesh> = Vec::new();
    let mut vertex_base = 0u32;

    for (prim_index, primitive) in mesh.primitives().enumerate() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .with_context(|| format!("Primitive {prim_index} has no positions"))?
            .collect();

        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let uvs: Option<Vec<[f32; 2]>> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect());

        let joints: Vec<[u16; 4]> = reader
            .read_joints(0)
            .with_context(|| format!("Primitive {prim_index} has no JOINTS_0"))?
            .into_u16()
            .collect();
        let weights: Vec<[f32; 4]> = reader
            .read_weights(0)
            .with_context(|| format!("Primitive {prim_index} has no WEIGHTS_0"))?
            .into_f32()
            .collect();

        if joints.len() != positions.len() || weights.len() != positions.len() {
            bail!("Primitive {prim_index} has mismatched skinning data");
        }

        for i in 0..positions.len() {
            stream.extend_from_slice(cast_slice(&positions[i]));
            let normal = normals.as_ref().map(|n| n[i]).unwrap_or([0.0, 1.0, 0.0]);
            stream.extend_from_slice(cast_slice(&normal));
            let uv = uvs.as_ref().map(|u| u[i]).unwrap_or([0.0, 0.0]);
            stream.extend_from_slice(cast_slice(&uv));
            stream.extend_from_slice(cast_slice(&joints[i]));
            stream.extend_from_slice(cast_slice(&weights[i]));
        }

        let prim_indices: Vec<u32> = reader
            .read_indices()
            .with_context(|| format!("Primitive {prim_index} has no index buffer"))?
            .into_u32()
            .map(|i| i + vertex_base)
            .collect();

        submeshes.push(Submesh {
            index_base: indices.len(),
            index_count: prim_indices.len(),
            material: primitive.material().index().unwrap_or(0),
        });
        indices.extend(prim_indices);
        vertex_base += positions.len() as u32;
    }

    let skin = load_skin(&document, &buffers)?;

    tracing::debug!(
        "imported skinned glTF mesh: {} vertices, {} indices, {} submeshes, {} bones",
        vertex_base,
        indices.len(),
        submeshes.len(),
        skin.bone_count(),
    );

    Ok(GltfMeshSource {
        streams: vec![stream],
        format: interleaved_format(),
        indices,
        submeshes,
        skin,
    })
}

/// Bone table from the document's first skin.
fn load_skin(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<Skin> {
    let skin = document.skins().next().context("No skins found in glTF")?;
    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));

    let inverse_bind_poses: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .context("Skin has no inverse bind matrices")?
        .map(|m| Mat4::from_cols_array_2d(&m))
        .collect();

    let bone_names: Vec<String> = skin
        .joints()
        .enumerate()
        .map(|(i, joint)| {
            joint
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("bone_{i}"))
        })
        .collect();

    if inverse_bind_poses.len() != bone_names.len() {
        bail!(
            "Skin has {} inverse bind matrices for {} joints",
            inverse_bind_poses.len(),
            bone_names.len()
        );
    }

    Ok(Skin {
        inverse_bind_poses,
        bone_names,
    })
}

/// Format of the adapter's interleaved stream.
fn interleaved_format() -> VertexFormat {
    let element = |semantic: &str, offset, component_count, component_type| VertexElement {
        semantic: semantic.to_string(),
        stream: 0,
        offset,
        component_count,
        component_type,
    };

    VertexFormat {
        elements: vec![
            element("vertex_position", 0, 3, ComponentType::F32),
            element("vertex_normal", OFFSET_NORMAL, 3, ComponentType::F32),
            element("vertex_texCoord0", OFFSET_UV, 2, ComponentType::F32),
            element(
                SEMANTIC_BONE_INDICES,
                OFFSET_BONE_INDICES,
                4,
                ComponentType::U16,
            ),
            element(
                SEMANTIC_BONE_WEIGHTS,
                OFFSET_BONE_WEIGHTS,
                4,
                ComponentType::F32,
            ),
        ],
        stream_strides: vec![VERTEX_STRIDE],
    }
}
