//! Programmatic GLB generation for integration tests.
//!
//! Builds a minimal skinned ribbon: a vertical strip of quads where each
//! ring of two vertices is bound rigidly to its own bone. Triangles
//! bridging two rings therefore reference exactly two distinct bones,
//! which makes partition boundaries easy to predict for any bone limit.
//!
//! The mesh deliberately has no normals or UVs, so the importer's
//! neutral defaults get exercised too. Joints are stored as u16 so tall
//! ribbons can cover skins with more than 256 bones.

use gltf_json as json;
use json::validation::Checked::Valid;

/// Bones in the default test skeleton, one per vertex ring
pub const BONE_COUNT: usize = 6;
/// Quad segments in the default ribbon (rings minus one)
pub const SEGMENT_COUNT: usize = BONE_COUNT - 1;
/// Two vertices per ring
pub const VERTEX_COUNT: usize = BONE_COUNT * 2;
/// Two triangles per segment
pub const INDEX_COUNT: usize = SEGMENT_COUNT * 6;

/// Generate the default skinned ribbon GLB: positions, joints, weights,
/// indices, a bone chain and a skin with inverse bind matrices.
pub fn generate_ribbon_glb() -> Vec<u8> {
    generate_ribbon_glb_with_bones(BONE_COUNT)
}

/// Generate a ribbon with one ring (and one bone) per `bone_count`.
pub fn generate_ribbon_glb_with_bones(bone_count: usize) -> Vec<u8> {
    assert!(bone_count >= 2 && bone_count * 2 <= u16::MAX as usize);

    let mut buffer = Vec::new();
    let mut views = Vec::new();
    let mut accessors = Vec::new();

    // Ring r sits at y = r with vertices at x = 0 and x = 1, bound to bone r
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(bone_count * 2);
    let mut joints: Vec<[u16; 4]> = Vec::with_capacity(bone_count * 2);
    let mut weights: Vec<[f32; 4]> = Vec::with_capacity(bone_count * 2);
    for ring in 0..bone_count {
        for x in 0..2 {
            positions.push([x as f32, ring as f32, 0.0]);
            joints.push([ring as u16, 0, 0, 0]);
            weights.push([1.0, 0.0, 0.0, 0.0]);
        }
    }

    // Two triangles between ring r and ring r + 1
    let mut indices: Vec<u16> = Vec::with_capacity((bone_count - 1) * 6);
    for seg in 0..(bone_count as u16 - 1) {
        let v = seg * 2;
        indices.extend_from_slice(&[v, v + 1, v + 2, v + 1, v + 3, v + 2]);
    }

    // Bone r's bind position is (0, r, 0)
    let inverse_bind_matrices: Vec<[[f32; 4]; 4]> = (0..bone_count)
        .map(|r| {
            [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, -(r as f32), 0.0, 1.0],
            ]
        })
        .collect();

    let positions_accessor = push_accessor(
        &mut buffer,
        &mut views,
        &mut accessors,
        bytemuck::cast_slice(&positions),
        positions.len(),
        json::accessor::ComponentType::F32,
        json::accessor::Type::Vec3,
        Some(Valid(json::buffer::Target::ArrayBuffer)),
        Some(position_bounds(&positions)),
    );
    let joints_accessor = push_accessor(
        &mut buffer,
        &mut views,
        &mut accessors,
        bytemuck::cast_slice(&joints),
        joints.len(),
        json::accessor::ComponentType::U16,
        json::accessor::Type::Vec4,
        Some(Valid(json::buffer::Target::ArrayBuffer)),
        None,
    );
    let weights_accessor = push_accessor(
        &mut buffer,
        &mut views,
        &mut accessors,
        bytemuck::cast_slice(&weights),
        weights.len(),
        json::accessor::ComponentType::F32,
        json::accessor::Type::Vec4,
        Some(Valid(json::buffer::Target::ArrayBuffer)),
        None,
    );
    let indices_accessor = push_accessor(
        &mut buffer,
        &mut views,
        &mut accessors,
        bytemuck::cast_slice(&indices),
        indices.len(),
        json::accessor::ComponentType::U16,
        json::accessor::Type::Scalar,
        Some(Valid(json::buffer::Target::ElementArrayBuffer)),
        None,
    );
    let ibm_accessor = push_accessor(
        &mut buffer,
        &mut views,
        &mut accessors,
        bytemuck::cast_slice(&inverse_bind_matrices),
        inverse_bind_matrices.len(),
        json::accessor::ComponentType::F32,
        json::accessor::Type::Mat4,
        None,
        None,
    );

    // Nodes 0..bone_count form a chain of bones; the last node holds the mesh
    let mesh_node = bone_count as u32;
    let mut nodes: Vec<json::Node> = (0..bone_count)
        .map(|r| json::Node {
            camera: None,
            children: if r + 1 < bone_count {
                Some(vec![json::Index::new(r as u32 + 1)])
            } else {
                None
            },
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: None,
            name: Some(format!("ring_{r}")),
            rotation: None,
            scale: None,
            translation: Some([0.0, if r == 0 { 0.0 } else { 1.0 }, 0.0]),
            skin: None,
            weights: None,
        })
        .collect();
    nodes.push(json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: Some(json::Index::new(0)),
        name: Some("Ribbon".to_string()),
        rotation: None,
        scale: None,
        translation: None,
        skin: Some(json::Index::new(0)),
        weights: None,
    });

    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(
        Valid(json::mesh::Semantic::Positions),
        json::Index::new(positions_accessor),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Joints(0)),
        json::Index::new(joints_accessor),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Weights(0)),
        json::Index::new(weights_accessor),
    );

    let meshes = vec![json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("RibbonMesh".to_string()),
        primitives: vec![json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(json::Index::new(indices_accessor)),
            material: None,
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        }],
        weights: None,
    }];

    let skins = vec![json::Skin {
        extensions: Default::default(),
        extras: Default::default(),
        inverse_bind_matrices: Some(json::Index::new(ibm_accessor)),
        joints: (0..bone_count as u32).map(json::Index::new).collect(),
        name: Some("RibbonSkeleton".to_string()),
        skeleton: Some(json::Index::new(0)),
    }];

    let scenes = vec![json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        nodes: vec![json::Index::new(0), json::Index::new(mesh_node)],
    }];

    let root = json::Root {
        accessors,
        animations: Vec::new(),
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some("nether-skinsplit-test".to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers: vec![json::Buffer {
            byte_length: buffer.len().into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }],
        buffer_views: views,
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes,
        nodes,
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes,
        skins,
        textures: Vec::new(),
    };

    assemble_glb(&root, &buffer)
}

/// Append one tightly packed buffer view plus its accessor, returning the
/// accessor index. Pads the buffer to 4-byte alignment first.
#[allow(clippy::too_many_arguments)]
fn push_accessor(
    buffer: &mut Vec<u8>,
    views: &mut Vec<json::buffer::View>,
    accessors: &mut Vec<json::Accessor>,
    bytes: &[u8],
    count: usize,
    component_type: json::accessor::ComponentType,
    type_: json::accessor::Type,
    target: Option<json::validation::Checked<json::buffer::Target>>,
    bounds: Option<(Vec<f32>, Vec<f32>)>,
) -> u32 {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
    let offset = buffer.len();
    buffer.extend_from_slice(bytes);

    views.push(json::buffer::View {
        buffer: json::Index::new(0),
        byte_length: bytes.len().into(),
        byte_offset: Some(offset.into()),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        target,
    });

    let to_value = |v: Vec<f32>| {
        json::Value::Array(v.into_iter().map(|c| json::Value::from(c as f64)).collect())
    };
    let (min, max) = match bounds {
        Some((min, max)) => (Some(to_value(min)), Some(to_value(max))),
        None => (None, None),
    };

    accessors.push(json::Accessor {
        buffer_view: Some(json::Index::new(views.len() as u32 - 1)),
        byte_offset: Some(0u64.into()),
        count: count.into(),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min,
        max,
        name: None,
        normalized: false,
        sparse: None,
    });
    accessors.len() as u32 - 1
}

fn position_bounds(positions: &[[f32; 3]]) -> (Vec<f32>, Vec<f32>) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for pos in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(pos[axis]);
            max[axis] = max[axis].max(pos[axis]);
        }
    }
    (min.to_vec(), max.to_vec())
}

/// Wrap the JSON root and binary buffer into GLB chunks.
fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Vec<u8> {
    let json_string = json::serialize::to_string(root).expect("Failed to serialize JSON");
    let json_bytes = json_string.as_bytes();

    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;
    let total_length = 12 + 8 + json_chunk_length + 8 + buffer_chunk_length;

    let mut glb = Vec::with_capacity(total_length);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // "JSON"
    glb.extend_from_slice(json_bytes);
    glb.extend(std::iter::repeat(0x20u8).take(json_padding));

    glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // "BIN\0"
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat(0u8).take(buffer_padding));

    glb
}
