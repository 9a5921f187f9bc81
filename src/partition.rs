//! Greedy triangle-to-partition assignment.
//!
//! Walks each submesh's triangles in index order and places every
//! triangle into the first partition (in creation order) whose running
//! bone set still fits the palette limit after adding the triangle's
//! bones. Triangles that fit nowhere open a new partition. Partitions
//! created by earlier submeshes are frozen, so no partition ever mixes
//! two submeshes' geometry.
//!
//! First-fit keeps the partition count low for index buffers with the
//! usual bone locality: neighbouring triangles tend to share bones.

use hashbrown::HashMap;

use crate::error::SkinSplitError;
use crate::extract::{SourceVertex, VertexExtractor};
use crate::types::{Submesh, MAX_INFLUENCES};

/// One sub-mesh under construction, bounded to `bone_limit` distinct bones.
#[derive(Debug)]
pub(crate) struct SkinPartition {
    /// Global bone ids; a bone's position here is its local index
    pub bone_indices: Vec<u32>,
    /// Vertex copies with bone indices rewritten to local values
    pub vertices: Vec<SourceVertex>,
    /// Triangle list of partition-local vertex indices
    pub indices: Vec<u32>,
    /// Source vertex index -> local vertex index, for this partition only.
    /// The same source vertex may map to a different local vertex in
    /// another partition, because its bone remap differs there.
    index_map: HashMap<u32, u32>,
    /// Material of the submesh this partition was opened for
    pub material: usize,
}

impl SkinPartition {
    fn new(material: usize) -> Self {
        Self {
            bone_indices: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            index_map: HashMap::new(),
            material,
        }
    }

    /// Local index of a global bone id, if already present.
    fn bone_local(&self, bone: u32) -> Option<u32> {
        self.bone_indices
            .iter()
            .position(|&b| b == bone)
            .map(|i| i as u32)
    }

    /// Local index of a global bone id, appending it on first use.
    fn bone_local_or_add(&mut self, bone: u32) -> u32 {
        match self.bone_local(bone) {
            Some(local) => local,
            None => {
                self.bone_indices.push(bone);
                (self.bone_indices.len() - 1) as u32
            }
        }
    }

    /// Distinct weighted bones of the triangle that this partition does
    /// not hold yet, in first-seen order.
    fn missing_bones(&self, triangle: &[SourceVertex; 3]) -> Vec<u32> {
        let mut missing = Vec::new();
        for vertex in triangle {
            for slot in 0..MAX_INFLUENCES {
                if vertex.bone_weights[slot] > 0.0 {
                    let bone = vertex.bone_indices[slot];
                    if self.bone_local(bone).is_none() && !missing.contains(&bone) {
                        missing.push(bone);
                    }
                }
            }
        }
        missing
    }

    /// Try to place a triangle. Returns false, leaving the partition
    /// untouched, when the combined bone set would exceed the limit.
    fn try_add_triangle(
        &mut self,
        triangle: &[SourceVertex; 3],
        source_indices: [u32; 3],
        bone_limit: usize,
    ) -> bool {
        let missing = self.missing_bones(triangle);
        if self.bone_indices.len() + missing.len() > bone_limit {
            return false;
        }
        self.bone_indices.extend(missing);

        for (vertex, source_index) in triangle.iter().zip(source_indices) {
            self.add_vertex(vertex, source_index);
        }
        true
    }

    /// Append one triangle corner, reusing the partition-local vertex if
    /// this source index was added before.
    fn add_vertex(&mut self, vertex: &SourceVertex, source_index: u32) {
        if let Some(&local) = self.index_map.get(&source_index) {
            self.indices.push(local);
            return;
        }

        let mut copy = vertex.clone();
        for slot in 0..MAX_INFLUENCES {
            if copy.bone_weights[slot] > 0.0 {
                copy.bone_indices[slot] = self.bone_local_or_add(copy.bone_indices[slot]);
            }
        }
        let local = self.vertices.len() as u32;
        self.vertices.push(copy);
        self.indices.push(local);
        self.index_map.insert(source_index, local);
    }
}

/// Number of distinct weighted bones across a triangle's three corners.
fn distinct_bones(triangle: &[SourceVertex; 3]) -> usize {
    let mut bones: Vec<u32> = Vec::with_capacity(3 * MAX_INFLUENCES);
    for vertex in triangle {
        for slot in 0..MAX_INFLUENCES {
            let bone = vertex.bone_indices[slot];
            if vertex.bone_weights[slot] > 0.0 && !bones.contains(&bone) {
                bones.push(bone);
            }
        }
    }
    bones.len()
}

/// Assign every triangle of every submesh to a partition.
///
/// Returns the ordered partition list, or fails if a single triangle's
/// own bone set already exceeds `bone_limit`.
pub(crate) fn build_partitions(
    extractor: &mut VertexExtractor<'_>,
    indices: &[u32],
    submeshes: &[Submesh],
    bone_limit: usize,
) -> Result<Vec<SkinPartition>, SkinSplitError> {
    let mut partitions: Vec<SkinPartition> = Vec::new();

    for (submesh_index, submesh) in submeshes.iter().enumerate() {
        let range = submesh
            .index_base
            .checked_add(submesh.index_count)
            .filter(|&end| end <= indices.len() && submesh.index_count % 3 == 0)
            .map(|end| &indices[submesh.index_base..end])
            .ok_or(SkinSplitError::MalformedSubmesh {
                submesh: submesh_index,
            })?;

        // Partitions from earlier submeshes are frozen from here on.
        let base_partition = partitions.len();

        for (triangle_index, corners) in range.chunks_exact(3).enumerate() {
            let source_indices = [corners[0], corners[1], corners[2]];
            let triangle = [
                extractor.vertex(source_indices[0])?,
                extractor.vertex(source_indices[1])?,
                extractor.vertex(source_indices[2])?,
            ];

            let bone_count = distinct_bones(&triangle);
            if bone_count > bone_limit {
                return Err(SkinSplitError::UnsatisfiableTriangle {
                    submesh: submesh_index,
                    triangle: triangle_index,
                    bone_count,
                    bone_limit,
                });
            }

            let mut placed = false;
            for partition in &mut partitions[base_partition..] {
                if partition.try_add_triangle(&triangle, source_indices, bone_limit) {
                    placed = true;
                    break;
                }
            }

            if !placed {
                let mut partition = SkinPartition::new(submesh.material);
                let fits = partition.try_add_triangle(&triangle, source_indices, bone_limit);
                debug_assert!(fits, "a fresh partition admits any triangle within the limit");
                partitions.push(partition);
            }
        }

        tracing::debug!(
            "submesh {}: {} triangles into {} partitions",
            submesh_index,
            submesh.index_count / 3,
            partitions.len() - base_partition,
        );
    }

    Ok(partitions)
}
