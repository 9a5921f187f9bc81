//! Flattens the partition list into merged GPU-ready buffers.
//!
//! Vertex payloads are appended stream by stream in partition order, the
//! per-partition index lists are offset into the merged vertex range, and
//! each partition gets a compact skin built by reordering the original
//! bone table through its `bone_indices`.

use crate::error::SkinSplitError;
use crate::format::{ComponentType, SkinningElements, VertexElement, VertexFormat};
use crate::partition::SkinPartition;
use crate::types::{PartitionedMesh, Skin, SplitMesh, MAX_INFLUENCES};

pub(crate) fn assemble(
    partitions: &[SkinPartition],
    format: &VertexFormat,
    skinning: SkinningElements,
    skin: &Skin,
) -> Result<SplitMesh, SkinSplitError> {
    let mut vertex_streams: Vec<Vec<u8>> =
        format.stream_strides.iter().map(|_| Vec::new()).collect();
    let mut merged_indices: Vec<u32> = Vec::new();
    let mut meshes = Vec::with_capacity(partitions.len());

    let indices_elem = &format.elements[skinning.indices];

    let mut vertex_cursor = 0usize;
    let mut index_cursor = 0usize;

    for (partition_index, partition) in partitions.iter().enumerate() {
        let vertex_start = vertex_cursor;
        let vertex_count = partition.vertices.len();
        let index_start = index_cursor;
        let index_count = partition.indices.len();

        for vertex in &partition.vertices {
            for (stream, bytes) in vertex.payload.iter().enumerate() {
                let base = vertex_streams[stream].len();
                vertex_streams[stream].extend_from_slice(bytes);
                // Only the bone-index components are rewritten; every
                // other attribute byte is the source vertex verbatim.
                if stream == indices_elem.stream {
                    encode_bone_indices(
                        &mut vertex_streams[stream][base..],
                        indices_elem,
                        &vertex.bone_indices,
                    );
                }
            }
        }

        for &local in &partition.indices {
            merged_indices.push(local + vertex_start as u32);
        }

        let palette = reorder_skin(skin, &partition.bone_indices)?;

        tracing::debug!(
            "partition {}: {} vertices, {} indices, {} bones",
            partition_index,
            vertex_count,
            index_count,
            palette.bone_count(),
        );

        meshes.push(PartitionedMesh {
            vertex_start,
            vertex_count,
            index_start,
            index_count,
            skin: palette,
            material: partition.material,
        });

        vertex_cursor += vertex_count;
        index_cursor += index_count;
    }

    Ok(SplitMesh {
        vertex_streams,
        indices: merged_indices,
        meshes,
    })
}

/// Build a partition's bone palette: entry `i` of the palette is the
/// original skin's entry for global bone `bone_indices[i]`.
fn reorder_skin(skin: &Skin, bone_indices: &[u32]) -> Result<Skin, SkinSplitError> {
    let mut inverse_bind_poses = Vec::with_capacity(bone_indices.len());
    let mut bone_names = Vec::with_capacity(bone_indices.len());

    for &bone in bone_indices {
        let out_of_range = || SkinSplitError::BoneOutOfRange {
            bone,
            bone_count: skin.bone_count(),
        };
        let pose = skin
            .inverse_bind_poses
            .get(bone as usize)
            .ok_or_else(out_of_range)?;
        let name = skin.bone_names.get(bone as usize).ok_or_else(out_of_range)?;
        inverse_bind_poses.push(*pose);
        bone_names.push(name.clone());
    }

    Ok(Skin {
        inverse_bind_poses,
        bone_names,
    })
}

/// Rewrite the bone-index components inside one freshly copied vertex.
fn encode_bone_indices(
    vertex_bytes: &mut [u8],
    elem: &VertexElement,
    local: &[u32; MAX_INFLUENCES],
) {
    let size = elem.component_type.size();
    for (slot, &value) in local
        .iter()
        .enumerate()
        .take(elem.component_count.min(MAX_INFLUENCES))
    {
        let start = elem.offset + slot * size;
        let dst = &mut vertex_bytes[start..start + size];
        match elem.component_type {
            ComponentType::U8 => dst[0] = value as u8,
            ComponentType::U16 => dst.copy_from_slice(&(value as u16).to_le_bytes()),
            ComponentType::U32 => dst.copy_from_slice(&value.to_le_bytes()),
            ComponentType::F32 => dst.copy_from_slice(&(value as f32).to_le_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn test_reorder_skin_follows_partition_order() {
        let skin = Skin {
            inverse_bind_poses: (0..4)
                .map(|i| Mat4::from_translation(glam::Vec3::new(i as f32, 0.0, 0.0)))
                .collect(),
            bone_names: (0..4).map(|i| format!("bone_{i}")).collect(),
        };

        let palette = reorder_skin(&skin, &[2, 0]).unwrap();
        assert_eq!(palette.bone_names, vec!["bone_2", "bone_0"]);
        assert_eq!(palette.inverse_bind_poses[0], skin.inverse_bind_poses[2]);
        assert_eq!(palette.inverse_bind_poses[1], skin.inverse_bind_poses[0]);
    }

    #[test]
    fn test_reorder_skin_rejects_unknown_bone() {
        let skin = Skin {
            inverse_bind_poses: vec![Mat4::IDENTITY],
            bone_names: vec!["root".to_string()],
        };
        assert_eq!(
            reorder_skin(&skin, &[1]),
            Err(SkinSplitError::BoneOutOfRange {
                bone: 1,
                bone_count: 1
            })
        );
    }

    #[test]
    fn test_encode_bone_indices_u8() {
        let elem = VertexElement {
            semantic: crate::format::SEMANTIC_BONE_INDICES.to_string(),
            stream: 0,
            offset: 2,
            component_count: 4,
            component_type: ComponentType::U8,
        };
        let mut bytes = vec![0xAA, 0xBB, 9, 9, 9, 9, 0xCC];
        encode_bone_indices(&mut bytes, &elem, &[1, 2, 3, 4]);
        // Surrounding attribute bytes stay untouched
        assert_eq!(bytes, vec![0xAA, 0xBB, 1, 2, 3, 4, 0xCC]);
    }

    #[test]
    fn test_encode_bone_indices_u16() {
        let elem = VertexElement {
            semantic: crate::format::SEMANTIC_BONE_INDICES.to_string(),
            stream: 0,
            offset: 0,
            component_count: 2,
            component_type: ComponentType::U16,
        };
        let mut bytes = vec![0u8; 4];
        encode_bone_indices(&mut bytes, &elem, &[258, 3, 0, 0]);
        assert_eq!(bytes, vec![2, 1, 3, 0]);
    }
}
