use std::fmt::{self, Display, Formatter};

use glam::{Mat3, Mat4, Vec3};
use log::warn;
use viewer_asset::{
    material::MaterialAsset,
    node::NodeAsset,
    normal::calculate_normal,
    primitive::{PrimitiveAsset, PrimitiveAssetMode},
    scene::SceneAsset,
};

use crate::{
    config::SubtreeParams,
    pick::{intersect_aabb, intersect_triangle, Ray},
    treatment::Treatment,
};

/// Tag carried by every subtree produced by a load, so the previous one can
/// be found and detached.
pub const LOADED_MODEL_NAME: &str = "loaded-model";

/// Stable key of an interactive node, assigned in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(pub u32);

impl Display for NodeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(
            Aabb {
                min: first,
                max: first,
            },
            |aabb, point| Aabb {
                min: aabb.min.min(point),
                max: aabb.max.max(point),
            },
        ))
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// World-space triangle list of one node. Read-only after load.
#[derive(Debug, Clone)]
pub struct NodeGeometry {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Option<Vec<u32>>,
}

impl NodeGeometry {
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Index count over three for indexed geometry, vertex count over three
    /// otherwise.
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        (0..self.triangle_count()).map(move |triangle| {
            let base = triangle * 3;
            match &self.indices {
                Some(indices) => [
                    self.positions[indices[base] as usize],
                    self.positions[indices[base + 1] as usize],
                    self.positions[indices[base + 2] as usize],
                ],
                None => [
                    self.positions[base],
                    self.positions[base + 1],
                    self.positions[base + 2],
                ],
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    key: NodeKey,
    name: String,
    geometry: NodeGeometry,
    bounds: Aabb,
    base: Treatment,
    displayed: Treatment,
}

impl SceneNode {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &NodeGeometry {
        &self.geometry
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// The treatment the node was loaded with.
    pub fn base_treatment(&self) -> &Treatment {
        &self.base
    }

    pub fn displayed(&self) -> &Treatment {
        &self.displayed
    }

    pub(crate) fn set_displayed(&mut self, treatment: Treatment) {
        self.displayed = treatment;
    }

    /// Distance along the ray to the closest triangle hit.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        intersect_aabb(ray, &self.bounds)?;
        self.geometry
            .triangles()
            .filter_map(|[v0, v1, v2]| intersect_triangle(ray, v0, v1, v2))
            .min_by(f32::total_cmp)
    }
}

/// Everything produced by one successful load.
#[derive(Debug, Clone)]
pub struct SceneSubtree {
    tag: &'static str,
    display_name: String,
    generation: u64,
    nodes: Vec<SceneNode>,
    bounds: Option<Aabb>,
}

struct SubtreeBuilder {
    nodes: Vec<SceneNode>,
    default_material: MaterialAsset,
}

impl SubtreeBuilder {
    fn add_primitive(
        &mut self,
        node: &NodeAsset,
        primitive_index: usize,
        primitive_total: usize,
        primitive: &PrimitiveAsset,
        world: &Mat4,
    ) {
        if primitive.mode != PrimitiveAssetMode::TriangleList {
            warn!(
                "Skipping primitive #{} of node #{}: {:?} is not pickable",
                primitive_index, node.index, primitive.mode
            );
            return;
        }
        let positions: Vec<Vec3> = primitive
            .position
            .iter()
            .map(|position| world.transform_point3(Vec3::from_array(*position)))
            .collect();
        let Some(bounds) = Aabb::from_points(positions.iter().copied()) else {
            warn!(
                "Skipping primitive #{} of node #{}: no vertices",
                primitive_index, node.index
            );
            return;
        };
        let normals = match &primitive.normal {
            Some(normals) => {
                let normal_matrix = Mat3::from_mat4(*world).inverse().transpose();
                normals
                    .iter()
                    .map(|normal| {
                        (normal_matrix * Vec3::from_array(*normal))
                            .try_normalize()
                            .unwrap_or(Vec3::Y)
                    })
                    .collect()
            }
            None => {
                let world_positions: Vec<[f32; 3]> =
                    positions.iter().map(|position| position.to_array()).collect();
                calculate_normal(&world_positions, primitive.indices.as_deref())
                    .into_iter()
                    .map(Vec3::from_array)
                    .collect()
            }
        };

        let position_in_load = self.nodes.len() + 1;
        let name = match node.name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) if primitive_total > 1 => format!("{}_{}", name, primitive_index),
            Some(name) => name.to_string(),
            None => format!("Component_{}", position_in_load),
        };
        let material = primitive
            .material
            .as_deref()
            .unwrap_or(&self.default_material);
        let base = Treatment::from_material(material);

        self.nodes.push(SceneNode {
            key: NodeKey(self.nodes.len() as u32),
            name,
            geometry: NodeGeometry {
                positions,
                normals,
                indices: primitive.indices.clone(),
            },
            bounds,
            displayed: base.clone(),
            base,
        });
    }

    fn add_node(&mut self, node: &NodeAsset, parent: &Mat4) {
        let world = *parent * node.matrix();
        if let Some(mesh) = &node.mesh {
            let total = mesh.primitives.len();
            for (index, primitive) in mesh.primitives.iter().enumerate() {
                self.add_primitive(node, index, total, primitive, &world);
            }
        }
        for child in &node.children {
            self.add_node(child, &world);
        }
    }
}

impl SceneSubtree {
    /// Flatten a decoded scene into interactive nodes.
    ///
    /// Each triangle-list primitive becomes one node, keyed and named in
    /// depth-first load order. Unnamed nodes are called `Component_<n>`,
    /// `n` being their 1-based position among interactive nodes.
    pub fn build(
        asset: &SceneAsset,
        params: &SubtreeParams,
        display_name: String,
        generation: u64,
    ) -> Self {
        let root = Mat4::from_scale_rotation_translation(
            Vec3::splat(params.scale),
            Default::default(),
            params.translation,
        );
        let mut builder = SubtreeBuilder {
            nodes: Vec::new(),
            default_material: MaterialAsset::default(),
        };
        for node in &asset.nodes {
            builder.add_node(node, &root);
        }
        let bounds = builder
            .nodes
            .iter()
            .map(|node| node.bounds)
            .reduce(|a, b| a.union(&b));
        Self {
            tag: LOADED_MODEL_NAME,
            display_name,
            generation,
            nodes: builder.nodes,
            bounds,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bounds(&self) -> Option<&Aabb> {
        self.bounds.as_ref()
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.iter().map(SceneNode::key)
    }

    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes
            .get(key.0 as usize)
            .filter(|node| node.key == key)
    }

    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes
            .get_mut(key.0 as usize)
            .filter(|node| node.key == key)
    }

    /// The nearest node hit by the ray.
    pub fn pick(&self, ray: &Ray) -> Option<(NodeKey, f32)> {
        self.nodes
            .iter()
            .filter_map(|node| node.intersect(ray).map(|distance| (node.key, distance)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
    }
}

#[cfg(test)]
mod test {
    use glam::Vec3;
    use viewer_asset::{
        loader::{fixture::GlbFixture, gltf::load_glb_from_buffer},
        mesh::MeshAsset,
        node::{NodeAsset, NodeTransform},
        primitive::{PrimitiveAsset, PrimitiveAssetMode},
        scene::SceneAsset,
    };

    use crate::{config::SubtreeParams, pick::Ray};

    use super::{NodeKey, SceneSubtree, LOADED_MODEL_NAME};

    fn subtree(fixture: GlbFixture) -> SceneSubtree {
        let asset = load_glb_from_buffer(&fixture.build()).unwrap();
        SceneSubtree::build(&asset, &SubtreeParams::default(), "test.glb".into(), 1)
    }

    #[test]
    fn unnamed_nodes_get_positional_names() {
        let subtree = subtree(GlbFixture::triangles(10));
        assert_eq!(subtree.len(), 10);
        assert_eq!(subtree.tag(), LOADED_MODEL_NAME);
        let names: Vec<&str> = subtree.nodes().iter().map(|node| node.name()).collect();
        let expected: Vec<String> = (1..=10).map(|n| format!("Component_{}", n)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn named_nodes_keep_their_names() {
        let subtree = subtree(GlbFixture::triangles(3).named(1, "Hinge"));
        let names: Vec<&str> = subtree.nodes().iter().map(|node| node.name()).collect();
        assert_eq!(names, ["Component_1", "Hinge", "Component_3"]);
    }

    #[test]
    fn keys_address_nodes() {
        let subtree = subtree(GlbFixture::triangles(4));
        let keys: Vec<NodeKey> = subtree.keys().collect();
        assert_eq!(keys, (0..4).map(NodeKey).collect::<Vec<_>>());
        assert_eq!(subtree.node(NodeKey(2)).unwrap().name(), "Component_3");
        assert!(subtree.node(NodeKey(4)).is_none());
    }

    #[test]
    fn geometry_is_in_world_space() {
        let subtree = subtree(GlbFixture::triangles(3));
        let node = subtree.node(NodeKey(2)).unwrap();
        assert_eq!(node.bounds().min, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(node.bounds().max, Vec3::new(5.0, 1.0, 0.0));
        assert_eq!(node.geometry().normals()[0], Vec3::Z);

        let bounds = subtree.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(5.0, 1.0, 0.0));
    }

    #[test]
    fn subtree_params_scale_and_offset() {
        let asset = load_glb_from_buffer(&GlbFixture::triangles(1).build()).unwrap();
        let params = SubtreeParams {
            scale: 2.0,
            translation: Vec3::new(0.0, 0.0, -1.0),
        };
        let subtree = SceneSubtree::build(&asset, &params, String::new(), 1);
        let bounds = subtree.node(NodeKey(0)).unwrap().bounds();
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 2.0, -1.0));
    }

    #[test]
    fn triangle_count_follows_indexing() {
        let indexed = subtree(GlbFixture::triangles(1));
        assert_eq!(indexed.nodes()[0].geometry().triangle_count(), 1);
        let plain = subtree(GlbFixture::triangles(1).non_indexed());
        assert_eq!(plain.nodes()[0].geometry().triangle_count(), 1);
    }

    #[test]
    fn non_triangle_primitives_are_skipped() {
        let line = PrimitiveAsset {
            position: vec![[0.0; 3], [1.0; 3]],
            normal: None,
            indices: None,
            material: None,
            mode: PrimitiveAssetMode::LineList,
        };
        let triangle = PrimitiveAsset {
            position: GlbFixture::TRIANGLE.to_vec(),
            normal: None,
            indices: None,
            material: None,
            mode: PrimitiveAssetMode::TriangleList,
        };
        let asset = SceneAsset {
            name: None,
            nodes: vec![NodeAsset {
                index: 0,
                name: Some(String::from("Frame")),
                transform: NodeTransform::default(),
                mesh: Some(MeshAsset {
                    name: None,
                    primitives: vec![line, triangle],
                }),
                children: Vec::new(),
            }],
        };
        let subtree = SceneSubtree::build(&asset, &SubtreeParams::default(), String::new(), 1);
        assert_eq!(subtree.len(), 1);
        assert_eq!(subtree.nodes()[0].name(), "Frame_1");
        assert_eq!(subtree.nodes()[0].base_treatment().name, "Default");
    }

    #[test]
    fn pick_returns_nearest_node() {
        let subtree = subtree(GlbFixture::triangles(3));
        let ray = Ray::new(Vec3::new(2.25, 0.25, 5.0), Vec3::NEG_Z);
        let (key, distance) = subtree.pick(&ray).unwrap();
        assert_eq!(key, NodeKey(1));
        assert!((distance - 5.0).abs() < 1e-5);

        let miss = Ray::new(Vec3::new(1.5, 0.5, 5.0), Vec3::NEG_Z);
        assert!(subtree.pick(&miss).is_none());
    }
}
