//! Vertex decoding.
//!
//! Splitting operates on raw vertex streams. The only attributes it has
//! to understand are the two skinning arrays; everything else is carried
//! as an opaque byte payload, one slice per stream, and copied verbatim
//! into the output.

use hashbrown::HashMap;

use crate::error::SkinSplitError;
use crate::format::{ComponentType, SkinningElements, VertexElement, VertexFormat};
use crate::types::MAX_INFLUENCES;

/// A decoded vertex: opaque payload plus decoded skinning data.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceVertex {
    /// Verbatim vertex bytes, one stride-sized slice per stream
    pub payload: Vec<Vec<u8>>,
    /// Influence weights; a slot with weight 0 is unused
    pub bone_weights: [f32; MAX_INFLUENCES],
    /// Bone ids paired with the weights. Global ids when extracted,
    /// partition-local after remapping.
    pub bone_indices: [u32; MAX_INFLUENCES],
}

/// Decodes vertices out of the raw streams, caching each decoded vertex
/// so triangles sharing a vertex don't pay for repeat decoding.
pub(crate) struct VertexExtractor<'a> {
    streams: &'a [&'a [u8]],
    format: &'a VertexFormat,
    skinning: SkinningElements,
    cache: HashMap<u32, SourceVertex>,
}

impl<'a> VertexExtractor<'a> {
    pub fn new(
        streams: &'a [&'a [u8]],
        format: &'a VertexFormat,
        skinning: SkinningElements,
    ) -> Self {
        Self {
            streams,
            format,
            skinning,
            cache: HashMap::new(),
        }
    }

    /// Fetch a decoded vertex by source index, decoding on first use.
    pub fn vertex(&mut self, index: u32) -> Result<SourceVertex, SkinSplitError> {
        if let Some(vertex) = self.cache.get(&index) {
            return Ok(vertex.clone());
        }
        let vertex = self.decode(index)?;
        self.cache.insert(index, vertex.clone());
        Ok(vertex)
    }

    fn decode(&self, index: u32) -> Result<SourceVertex, SkinSplitError> {
        let mut payload = Vec::with_capacity(self.streams.len());
        for (stream, (bytes, &stride)) in self
            .streams
            .iter()
            .zip(&self.format.stream_strides)
            .enumerate()
        {
            let start = index as usize * stride;
            let end = start + stride;
            if end > bytes.len() {
                return Err(SkinSplitError::VertexOutOfRange {
                    stream,
                    vertex: index,
                });
            }
            payload.push(bytes[start..end].to_vec());
        }

        let weights_elem = &self.format.elements[self.skinning.weights];
        let indices_elem = &self.format.elements[self.skinning.indices];

        let mut bone_weights = [0.0; MAX_INFLUENCES];
        let mut bone_indices = [0; MAX_INFLUENCES];
        for slot in 0..weights_elem.component_count.min(MAX_INFLUENCES) {
            bone_weights[slot] = decode_weight(
                component_bytes(&payload, weights_elem, slot),
                weights_elem.component_type,
            );
        }
        for slot in 0..indices_elem.component_count.min(MAX_INFLUENCES) {
            bone_indices[slot] = decode_index(
                component_bytes(&payload, indices_elem, slot),
                indices_elem.component_type,
            );
        }

        Ok(SourceVertex {
            payload,
            bone_weights,
            bone_indices,
        })
    }
}

/// Bytes of one component of an element within a decoded payload.
fn component_bytes<'v>(payload: &'v [Vec<u8>], elem: &VertexElement, slot: usize) -> &'v [u8] {
    let size = elem.component_type.size();
    let start = elem.offset + slot * size;
    &payload[elem.stream][start..start + size]
}

/// Decode one influence weight to f32. Integer component types are
/// unorm-normalized, the usual GPU encoding for weights.
fn decode_weight(bytes: &[u8], ty: ComponentType) -> f32 {
    match ty {
        ComponentType::F32 => read_f32(bytes),
        ComponentType::U8 => bytes[0] as f32 / 255.0,
        ComponentType::U16 => read_u16(bytes) as f32 / 65535.0,
        ComponentType::U32 => read_u32(bytes) as f32 / u32::MAX as f32,
    }
}

/// Decode one bone index to a global bone id.
fn decode_index(bytes: &[u8], ty: ComponentType) -> u32 {
    match ty {
        ComponentType::U8 => bytes[0] as u32,
        ComponentType::U16 => read_u16(bytes) as u32,
        ComponentType::U32 => read_u32(bytes),
        // Some exporters store indices as floats; truncate.
        ComponentType::F32 => read_f32(bytes) as u32,
    }
}

fn read_f32(b: &[u8]) -> f32 {
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn read_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn read_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}
