use super::node::NodeAsset;

#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub name: Option<String>,
    pub nodes: Vec<NodeAsset>,
}

impl SceneAsset {
    /// Count the primitives reachable from the scene roots.
    pub fn primitive_count(&self) -> usize {
        fn count(node: &NodeAsset) -> usize {
            let own = node
                .mesh
                .as_ref()
                .map(|mesh| mesh.primitives.len())
                .unwrap_or(0);
            own + node.children.iter().map(count).sum::<usize>()
        }
        self.nodes.iter().map(count).sum()
    }
}
