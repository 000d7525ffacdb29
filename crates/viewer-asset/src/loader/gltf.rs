use std::{
    collections::{HashMap, HashSet},
    error::Error,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use glam::{Mat4, Quat, Vec3};
use gltf::{
    accessor::{DataType, Dimensions},
    material::AlphaMode,
    mesh::Mode,
    scene::Transform,
    Accessor, Document, Gltf, Material, Mesh, Node, Primitive, Scene, Semantic,
};
use log::{debug, warn};

use crate::{
    material::{MaterialAlphaMode, MaterialAsset},
    mesh::MeshAsset,
    node::{DecomposedTransform, MatrixNodeTransform, NodeAsset, NodeTransform},
    primitive::{PrimitiveAsset, PrimitiveAssetMode},
    scene::SceneAsset,
};

/// Required extensions the loader can honor. Anything else in
/// `extensionsRequired` (mesh compression included) fails the load.
pub const SUPPORTED_REQUIRED_EXTENSIONS: &[&str] = &[
    "KHR_materials_unlit",
    "KHR_materials_emissive_strength",
    "KHR_texture_transform",
    "KHR_lights_punctual",
];

/// Deepest node hierarchy accepted. Deeper files are rejected instead of
/// exhausting the stack.
pub const MAX_NODE_DEPTH: usize = 128;

#[derive(Debug)]
pub enum GltfLoaderError {
    Gltf(gltf::Error),
    NoScene,
    UnsupportedExtension(String),
    /// The node is reached twice, so the hierarchy is not a tree.
    NodeCycle(usize),
    NodeTooDeep(usize),
    MissingPositions {
        mesh: usize,
        primitive: usize,
    },
    BadAccessorDataType(DataType, DataType),
    BadAccessorDimensions(Dimensions, Dimensions),
    IndexOutOfBounds {
        mesh: usize,
        primitive: usize,
        index: u32,
        vertices: usize,
    },
}

impl Display for GltfLoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfLoaderError::Gltf(error) => Display::fmt(error, f),
            GltfLoaderError::NoScene => write!(f, "The file contains no scene"),
            GltfLoaderError::UnsupportedExtension(name) => {
                write!(f, "Required extension {} is not supported", name)
            }
            GltfLoaderError::NodeCycle(index) => write!(
                f,
                "Node #{} appears more than once in the hierarchy",
                index
            ),
            GltfLoaderError::NodeTooDeep(index) => write!(
                f,
                "Node #{} is nested deeper than {} levels",
                index, MAX_NODE_DEPTH
            ),
            GltfLoaderError::MissingPositions { mesh, primitive } => write!(
                f,
                "Primitive #{} of mesh #{} has no POSITION attribute",
                primitive, mesh
            ),
            GltfLoaderError::BadAccessorDataType(expected, actual) => {
                write!(
                    f,
                    "Bad accessor data type: expected {:?}, but got {:?}",
                    expected, actual
                )
            }
            GltfLoaderError::BadAccessorDimensions(expected, actual) => {
                write!(
                    f,
                    "Bad accessor dimensions: expected {:?}, but got {:?}",
                    expected, actual
                )
            }
            GltfLoaderError::IndexOutOfBounds {
                mesh,
                primitive,
                index,
                vertices,
            } => write!(
                f,
                "Index {} out of bounds in primitive #{} of mesh #{} ({} vertices)",
                index, primitive, mesh, vertices
            ),
        }
    }
}

impl From<gltf::Error> for GltfLoaderError {
    fn from(value: gltf::Error) -> Self {
        Self::Gltf(value)
    }
}

impl Error for GltfLoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GltfLoaderError::Gltf(error) => Some(error),
            _ => None,
        }
    }
}

struct GltfDocumentLoader<'a> {
    document: &'a Document,
    buffers: &'a [gltf::buffer::Data],
    material_cache: HashMap<Option<usize>, Arc<MaterialAsset>>,
    visited_nodes: HashSet<usize>,
}

impl<'a> GltfDocumentLoader<'a> {
    fn new(document: &'a Document, buffers: &'a [gltf::buffer::Data]) -> Self {
        Self {
            document,
            buffers,
            material_cache: HashMap::new(),
            visited_nodes: HashSet::new(),
        }
    }

    #[inline]
    fn check_accessor(
        accessor: &Accessor,
        data_type: DataType,
        dimensions: Dimensions,
    ) -> Result<(), GltfLoaderError> {
        let actual_data_type = accessor.data_type();
        if actual_data_type != data_type {
            return Err(GltfLoaderError::BadAccessorDataType(
                data_type,
                actual_data_type,
            ));
        }

        let actual_dimensions = accessor.dimensions();
        if actual_dimensions != dimensions {
            return Err(GltfLoaderError::BadAccessorDimensions(
                dimensions,
                actual_dimensions,
            ));
        }

        Ok(())
    }

    fn load_mode(mode: Mode) -> PrimitiveAssetMode {
        match mode {
            Mode::Points => PrimitiveAssetMode::Points,
            Mode::Lines => PrimitiveAssetMode::LineList,
            Mode::LineLoop => PrimitiveAssetMode::LineLoop,
            Mode::LineStrip => PrimitiveAssetMode::LineStrip,
            Mode::Triangles => PrimitiveAssetMode::TriangleList,
            Mode::TriangleStrip => PrimitiveAssetMode::TriangleStrip,
            Mode::TriangleFan => PrimitiveAssetMode::TriangleFan,
        }
    }

    fn load_material(&mut self, material: Material) -> Arc<MaterialAsset> {
        if let Some(material) = self.material_cache.get(&material.index()) {
            return material.clone();
        }

        let pbr = material.pbr_metallic_roughness();
        let alpha_mode = match material.alpha_mode() {
            AlphaMode::Opaque => MaterialAlphaMode::Opaque,
            AlphaMode::Mask => MaterialAlphaMode::Mask(material.alpha_cutoff().unwrap_or(0.5)),
            AlphaMode::Blend => MaterialAlphaMode::Blend,
        };
        let asset = Arc::new(MaterialAsset {
            index: material.index(),
            name: material.name().map(str::to_string),
            base_color_factor: pbr.base_color_factor(),
            metallic_factor: pbr.metallic_factor(),
            roughness_factor: pbr.roughness_factor(),
            emissive_factor: material.emissive_factor(),
            has_base_color_texture: pbr.base_color_texture().is_some(),
            alpha_mode,
            double_sided: material.double_sided(),
        });
        self.material_cache.insert(material.index(), asset.clone());
        asset
    }

    fn load_primitive(
        &mut self,
        mesh_index: usize,
        primitive: Primitive,
    ) -> Result<PrimitiveAsset, GltfLoaderError> {
        let missing_positions = || GltfLoaderError::MissingPositions {
            mesh: mesh_index,
            primitive: primitive.index(),
        };
        let position_accessor = primitive
            .get(&Semantic::Positions)
            .ok_or_else(missing_positions)?;
        Self::check_accessor(&position_accessor, DataType::F32, Dimensions::Vec3)?;
        if let Some(normal_accessor) = primitive.get(&Semantic::Normals) {
            Self::check_accessor(&normal_accessor, DataType::F32, Dimensions::Vec3)?;
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
        let position: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(missing_positions)?
            .collect();
        let normal = reader
            .read_normals()
            .map(|normals| normals.collect::<Vec<_>>())
            .filter(|normals| normals.len() == position.len());
        let indices = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect::<Vec<_>>());
        if let Some(index) = indices
            .iter()
            .flatten()
            .find(|index| **index as usize >= position.len())
        {
            return Err(GltfLoaderError::IndexOutOfBounds {
                mesh: mesh_index,
                primitive: primitive.index(),
                index: *index,
                vertices: position.len(),
            });
        }

        Ok(PrimitiveAsset {
            position,
            normal,
            indices,
            material: Some(self.load_material(primitive.material())),
            mode: Self::load_mode(primitive.mode()),
        })
    }

    fn load_mesh(&mut self, mesh: Mesh) -> Result<MeshAsset, GltfLoaderError> {
        let mesh_index = mesh.index();
        let primitives = mesh
            .primitives()
            .map(|primitive| self.load_primitive(mesh_index, primitive))
            .collect::<Result<_, _>>()?;
        Ok(MeshAsset {
            name: mesh.name().map(str::to_string),
            primitives,
        })
    }

    fn load_node(&mut self, node: Node, depth: usize) -> Result<NodeAsset, GltfLoaderError> {
        if !self.visited_nodes.insert(node.index()) {
            return Err(GltfLoaderError::NodeCycle(node.index()));
        }
        if depth >= MAX_NODE_DEPTH {
            return Err(GltfLoaderError::NodeTooDeep(node.index()));
        }
        let transform = match node.transform() {
            Transform::Matrix { matrix } => {
                NodeTransform::Matrix(MatrixNodeTransform(Mat4::from_cols_array_2d(&matrix)))
            }
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::from_array(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from_array(scale),
            }),
        };
        let mesh = node.mesh().map(|mesh| self.load_mesh(mesh)).transpose()?;
        let children = node
            .children()
            .map(|child| self.load_node(child, depth + 1))
            .collect::<Result<_, _>>()?;

        Ok(NodeAsset {
            index: node.index(),
            name: node.name().map(str::to_string),
            transform,
            mesh,
            children,
        })
    }

    fn load_scene(&mut self, scene: Scene) -> Result<SceneAsset, GltfLoaderError> {
        Ok(SceneAsset {
            name: scene.name().map(str::to_string),
            nodes: scene
                .nodes()
                .map(|node| self.load_node(node, 0))
                .collect::<Result<_, _>>()?,
        })
    }

    fn load(&mut self) -> Result<SceneAsset, GltfLoaderError> {
        let scene = self
            .document
            .default_scene()
            .or_else(|| self.document.scenes().next())
            .ok_or(GltfLoaderError::NoScene)?;
        if self.document.scenes().len() > 1 {
            warn!(
                "File has {} scenes, only scene #{} is loaded",
                self.document.scenes().len(),
                scene.index()
            );
        }
        self.load_scene(scene)
    }
}

fn check_required_extensions(document: &Document) -> Result<(), GltfLoaderError> {
    match document
        .extensions_required()
        .find(|name| !SUPPORTED_REQUIRED_EXTENSIONS.contains(name))
    {
        Some(name) => Err(GltfLoaderError::UnsupportedExtension(name.to_string())),
        None => Ok(()),
    }
}

/// Decode a GLB (or self-contained GLTF) buffer into its default scene.
///
/// Buffers referenced by external URIs can't be resolved from a slice and
/// fail with [`GltfLoaderError::Gltf`].
pub fn load_glb_from_buffer(buffer: &[u8]) -> Result<SceneAsset, GltfLoaderError> {
    let gltf = Gltf::from_slice_without_validation(buffer)?;
    check_required_extensions(&gltf.document)?;

    let (document, buffers, _images) = gltf::import_slice(buffer)?;
    let mut loader = GltfDocumentLoader::new(&document, &buffers);
    let scene = loader.load()?;
    debug!(
        "Decoded GLB of {} bytes: {} primitives",
        buffer.len(),
        scene.primitive_count()
    );
    Ok(scene)
}

#[cfg(test)]
mod test {
    use crate::{
        loader::fixture::{glb, GlbFixture},
        primitive::PrimitiveAssetMode,
    };

    use super::{load_glb_from_buffer, GltfLoaderError, MAX_NODE_DEPTH};

    /// One non-indexed triangle mesh, referenced by whichever nodes are given.
    fn triangle_document(nodes: &str) -> Vec<u8> {
        let bin: Vec<u8> = GlbFixture::TRIANGLE
            .iter()
            .flatten()
            .flat_map(|component| component.to_le_bytes())
            .collect();
        let json = format!(
            concat!(
                r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],"#,
                r#""nodes":{},"meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}}}}]}}],"#,
                r#""buffers":[{{"byteLength":36}}],"#,
                r#""bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":36}}],"#,
                r#""accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}}]}}"#
            ),
            nodes
        );
        glb(&json, &bin)
    }

    #[test]
    fn load_indexed_triangles() {
        let buffer = GlbFixture::triangles(3).named(1, "Bracket").build();
        let scene = load_glb_from_buffer(&buffer).unwrap();

        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.primitive_count(), 3);
        assert_eq!(scene.nodes[0].name, None);
        assert_eq!(scene.nodes[1].name.as_deref(), Some("Bracket"));

        let primitive = &scene.nodes[2].mesh.as_ref().unwrap().primitives[0];
        assert_eq!(primitive.mode, PrimitiveAssetMode::TriangleList);
        assert_eq!(primitive.position, GlbFixture::TRIANGLE.to_vec());
        assert_eq!(primitive.indices, Some(vec![0, 1, 2]));
        assert_eq!(primitive.normal, None);
        assert_eq!(primitive.triangle_count(), 1);
    }

    #[test]
    fn load_node_translation() {
        let buffer = GlbFixture::triangles(2).build();
        let scene = load_glb_from_buffer(&buffer).unwrap();
        let matrix = scene.nodes[1].matrix();
        assert_eq!(matrix.w_axis.x, 2.0);
    }

    #[test]
    fn load_non_indexed_triangles() {
        let buffer = GlbFixture::triangles(1).non_indexed().build();
        let scene = load_glb_from_buffer(&buffer).unwrap();
        let primitive = &scene.nodes[0].mesh.as_ref().unwrap().primitives[0];
        assert_eq!(primitive.indices, None);
        assert_eq!(primitive.triangle_count(), 1);
    }

    #[test]
    fn material_is_shared_between_meshes() {
        let buffer = GlbFixture::triangles(2).build();
        let scene = load_glb_from_buffer(&buffer).unwrap();
        let first = scene.nodes[0].mesh.as_ref().unwrap().primitives[0]
            .material
            .clone()
            .unwrap();
        let second = scene.nodes[1].mesh.as_ref().unwrap().primitives[0]
            .material
            .clone()
            .unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(first.name.as_deref(), Some("Base"));
        assert_eq!(first.base_color_factor, GlbFixture::BASE_COLOR);
        assert_eq!(first.metallic_factor, 0.25);
        assert_eq!(first.roughness_factor, 0.75);
    }

    #[test]
    fn reject_unsupported_required_extension() {
        let buffer = GlbFixture::triangles(1)
            .requiring("KHR_draco_mesh_compression")
            .build();
        match load_glb_from_buffer(&buffer) {
            Err(GltfLoaderError::UnsupportedExtension(name)) => {
                assert_eq!(name, "KHR_draco_mesh_compression")
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn reject_garbage() {
        let result = load_glb_from_buffer(b"definitely not a model");
        assert!(matches!(result, Err(GltfLoaderError::Gltf(_))));
    }

    #[test]
    fn reject_self_referencing_node() {
        let buffer = triangle_document(r#"[{"mesh":0,"children":[0]}]"#);
        match load_glb_from_buffer(&buffer) {
            Err(GltfLoaderError::NodeCycle(index)) => assert_eq!(index, 0),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn reject_node_loop_through_children() {
        let buffer = triangle_document(r#"[{"mesh":0,"children":[1]},{"children":[0]}]"#);
        assert!(matches!(
            load_glb_from_buffer(&buffer),
            Err(GltfLoaderError::NodeCycle(0))
        ));
    }

    #[test]
    fn reject_too_deep_hierarchy() {
        let count = MAX_NODE_DEPTH + 10;
        let nodes: Vec<String> = (0..count)
            .map(|index| {
                if index + 1 < count {
                    format!(r#"{{"children":[{}]}}"#, index + 1)
                } else {
                    String::from(r#"{"mesh":0}"#)
                }
            })
            .collect();
        let buffer = triangle_document(&format!("[{}]", nodes.join(",")));
        assert!(matches!(
            load_glb_from_buffer(&buffer),
            Err(GltfLoaderError::NodeTooDeep(index)) if index == MAX_NODE_DEPTH
        ));
    }

    #[test]
    fn accept_chain_within_depth_limit() {
        let buffer = triangle_document(r#"[{"children":[1]},{"children":[2]},{"mesh":0}]"#);
        let scene = load_glb_from_buffer(&buffer).unwrap();
        assert_eq!(scene.primitive_count(), 1);
    }

    #[test]
    fn reject_index_out_of_bounds() {
        let mut buffer = GlbFixture::triangles(1).build();
        let length = buffer.len();
        buffer[length - 4..].copy_from_slice(&7u32.to_le_bytes());
        match load_glb_from_buffer(&buffer) {
            Err(GltfLoaderError::IndexOutOfBounds {
                index, vertices, ..
            }) => {
                assert_eq!(index, 7);
                assert_eq!(vertices, 3);
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
