//! Error types for skinned mesh splitting.

use thiserror::Error;

/// Errors produced while splitting a skinned mesh.
///
/// Any error aborts the whole split; there is no partial output, because
/// the renderer needs one complete, internally consistent partition set
/// per mesh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkinSplitError {
    /// The bone palette must admit at least one bone.
    #[error("bone limit must be positive")]
    InvalidBoneLimit,

    /// A single triangle references more distinct bones than the palette
    /// can hold, so no partition (existing or fresh) can ever admit it.
    #[error(
        "triangle {triangle} of submesh {submesh} references {bone_count} distinct bones, \
         exceeding the bone limit of {bone_limit}"
    )]
    UnsatisfiableTriangle {
        submesh: usize,
        triangle: usize,
        bone_count: usize,
        bone_limit: usize,
    },

    /// The number of vertex streams does not match the format's stride table.
    #[error("got {streams} vertex streams but the format describes {strides}")]
    StreamCountMismatch { streams: usize, strides: usize },

    /// A vertex element's components do not fit inside its stream's stride.
    #[error("vertex element '{semantic}' does not fit the stride of stream {stream}")]
    ElementOutOfStride { semantic: String, stream: usize },

    /// An index buffer entry points past the end of a vertex stream.
    #[error("vertex {vertex} is out of range for stream {stream}")]
    VertexOutOfRange { stream: usize, vertex: u32 },

    /// A submesh's index range is out of bounds or not a whole number of
    /// triangles.
    #[error("submesh {submesh} does not describe a valid triangle list range")]
    MalformedSubmesh { submesh: usize },

    /// A vertex references a bone the skin does not define.
    #[error("bone {bone} is out of range for a skin with {bone_count} bones")]
    BoneOutOfRange { bone: u32, bone_count: usize },
}
