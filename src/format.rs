//! Vertex format description.
//!
//! A mesh's vertex data is one or more byte streams, each with a fixed
//! per-vertex stride. [`VertexFormat`] records where every attribute
//! lives: which stream, the byte offset inside one vertex, and the
//! component type and count. Attributes are identified by semantic name;
//! the splitter only interprets the two skinning semantics and treats
//! everything else as opaque bytes.

/// Semantic name of the per-vertex bone weight attribute
pub const SEMANTIC_BONE_WEIGHTS: &str = "vertex_boneWeights";
/// Semantic name of the per-vertex bone index attribute
pub const SEMANTIC_BONE_INDICES: &str = "vertex_boneIndices";

/// Scalar component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    F32,
    U8,
    U16,
    U32,
}

impl ComponentType {
    /// Size of one component in bytes
    pub const fn size(self) -> usize {
        match self {
            ComponentType::F32 | ComponentType::U32 => 4,
            ComponentType::U16 => 2,
            ComponentType::U8 => 1,
        }
    }
}

/// One attribute within a vertex format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexElement {
    /// Semantic name (e.g. `vertex_position`, `vertex_boneWeights`)
    pub semantic: String,
    /// Vertex stream the attribute lives in
    pub stream: usize,
    /// Byte offset from the start of one vertex within the stream
    pub offset: usize,
    /// Number of components (1 to 4)
    pub component_count: usize,
    /// Scalar type of each component
    pub component_type: ComponentType,
}

/// Ordered attribute list plus per-stream vertex strides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexFormat {
    pub elements: Vec<VertexElement>,
    /// Byte stride of one vertex in each stream
    pub stream_strides: Vec<usize>,
}

/// Positions of the two skinning attributes inside a [`VertexFormat`].
///
/// Resolved once per format so per-vertex decoding never rescans
/// semantic names.
#[derive(Debug, Clone, Copy)]
pub struct SkinningElements {
    /// Index of the bone weight element in `VertexFormat::elements`
    pub weights: usize,
    /// Index of the bone index element in `VertexFormat::elements`
    pub indices: usize,
}

impl VertexFormat {
    /// Resolve the skinning attribute lookup table.
    ///
    /// Returns `None` when either skinning attribute is missing, in which
    /// case the mesh is not skinned and there is nothing to split.
    pub fn skinning_elements(&self) -> Option<SkinningElements> {
        let weights = self
            .elements
            .iter()
            .position(|e| e.semantic == SEMANTIC_BONE_WEIGHTS)?;
        let indices = self
            .elements
            .iter()
            .position(|e| e.semantic == SEMANTIC_BONE_INDICES)?;
        Some(SkinningElements { weights, indices })
    }
}
