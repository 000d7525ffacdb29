use std::collections::HashMap;

use log::debug;

use crate::{
    scene::{NodeKey, SceneSubtree},
    treatment::Treatment,
};

/// Per-node treatment bookkeeping for hover highlighting and user overrides.
///
/// Originals are captured the first time a node is touched and never
/// overwritten afterwards. An override always shows, except while its node
/// is hovered.
#[derive(Debug, Clone)]
pub struct HighlightTracker {
    originals: HashMap<NodeKey, Treatment>,
    overrides: HashMap<NodeKey, Treatment>,
    hovered: Option<NodeKey>,
    hover_treatment: Treatment,
    default_treatment: Treatment,
}

impl HighlightTracker {
    pub fn new(hover_treatment: Treatment, default_treatment: Treatment) -> Self {
        Self {
            originals: HashMap::new(),
            overrides: HashMap::new(),
            hovered: None,
            hover_treatment,
            default_treatment,
        }
    }

    /// Forget everything. Called when a new subtree replaces the old one.
    pub fn reset(&mut self) {
        self.originals.clear();
        self.overrides.clear();
        self.hovered = None;
    }

    pub fn hovered(&self) -> Option<NodeKey> {
        self.hovered
    }

    pub fn original(&self, key: NodeKey) -> Option<&Treatment> {
        self.originals.get(&key)
    }

    pub fn override_for(&self, key: NodeKey) -> Option<&Treatment> {
        self.overrides.get(&key)
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Record the load-time treatment of a node, unless already recorded.
    pub fn capture_original(&mut self, scene: &SceneSubtree, key: NodeKey) {
        if self.originals.contains_key(&key) {
            return;
        }
        if let Some(node) = scene.node(key) {
            self.originals.insert(key, node.base_treatment().clone());
        }
    }

    /// Override if present, else original.
    pub fn effective(&self, key: NodeKey) -> Option<&Treatment> {
        self.overrides.get(&key).or_else(|| self.originals.get(&key))
    }

    /// What a node shows when it is not hovered.
    pub fn resting_treatment(&self, key: NodeKey) -> &Treatment {
        self.effective(key).unwrap_or(&self.default_treatment)
    }

    /// Move the hover highlight. Returns whether anything changed.
    pub fn hover(&mut self, scene: &mut SceneSubtree, key: Option<NodeKey>) -> bool {
        if self.hovered == key {
            return false;
        }
        if let Some(previous) = self.hovered.take() {
            let resting = self.resting_treatment(previous).clone();
            if let Some(node) = scene.node_mut(previous) {
                node.set_displayed(resting);
            }
        }
        if let Some(key) = key {
            self.capture_original(scene, key);
            if let Some(node) = scene.node_mut(key) {
                node.set_displayed(self.hover_treatment.clone());
                self.hovered = Some(key);
            }
        }
        true
    }

    pub fn apply_override(&mut self, scene: &mut SceneSubtree, key: NodeKey, treatment: Treatment) {
        let Some(node) = scene.node_mut(key) else {
            debug!("Ignoring override for unknown node {}", key);
            return;
        };
        node.set_displayed(treatment.clone());
        self.overrides.insert(key, treatment);
        if self.hovered == Some(key) {
            self.hovered = None;
        }
    }

    pub fn clear_override(&mut self, scene: &mut SceneSubtree, key: NodeKey) {
        self.overrides.remove(&key);
        let resting = self.resting_treatment(key).clone();
        if let Some(node) = scene.node_mut(key) {
            node.set_displayed(resting);
        }
        if self.hovered == Some(key) {
            self.hovered = None;
        }
    }
}

#[cfg(test)]
mod test {
    use viewer_asset::loader::{fixture::GlbFixture, gltf::load_glb_from_buffer};

    use crate::{
        config::SubtreeParams,
        scene::{NodeKey, SceneSubtree},
        treatment::Treatment,
    };

    use super::HighlightTracker;

    fn setup(count: usize) -> (SceneSubtree, HighlightTracker) {
        let asset = load_glb_from_buffer(&GlbFixture::triangles(count).build()).unwrap();
        let scene = SceneSubtree::build(&asset, &SubtreeParams::default(), String::new(), 1);
        (
            scene,
            HighlightTracker::new(Treatment::hover(), Treatment::default_gray()),
        )
    }

    fn displayed(scene: &SceneSubtree, key: NodeKey) -> &Treatment {
        scene.node(key).unwrap().displayed()
    }

    #[test]
    fn hover_swaps_and_restores() {
        let (mut scene, mut tracker) = setup(2);
        let base = displayed(&scene, NodeKey(0)).clone();

        assert!(tracker.hover(&mut scene, Some(NodeKey(0))));
        assert_eq!(displayed(&scene, NodeKey(0)), &Treatment::hover());
        assert!(!tracker.hover(&mut scene, Some(NodeKey(0))));

        assert!(tracker.hover(&mut scene, Some(NodeKey(1))));
        assert_eq!(displayed(&scene, NodeKey(0)), &base);
        assert_eq!(displayed(&scene, NodeKey(1)), &Treatment::hover());

        assert!(tracker.hover(&mut scene, None));
        assert_eq!(displayed(&scene, NodeKey(1)), &base);
        assert_eq!(tracker.hovered(), None);
    }

    #[test]
    fn original_is_captured_once() {
        let (mut scene, mut tracker) = setup(1);
        let key = NodeKey(0);
        let base = displayed(&scene, key).clone();

        tracker.hover(&mut scene, Some(key));
        assert_eq!(tracker.original(key), Some(&base));
        // the hover treatment is showing now, the original must not follow it
        tracker.capture_original(&scene, key);
        assert_eq!(tracker.original(key), Some(&base));
    }

    #[test]
    fn override_survives_hover() {
        let (mut scene, mut tracker) = setup(2);
        let key = NodeKey(0);
        let red = Treatment::from_srgb_hex("Red", 0xff0000);

        tracker.capture_original(&scene, key);
        tracker.apply_override(&mut scene, key, red.clone());
        assert_eq!(displayed(&scene, key), &red);

        tracker.hover(&mut scene, Some(key));
        assert_eq!(displayed(&scene, key), &Treatment::hover());
        tracker.hover(&mut scene, Some(NodeKey(1)));
        assert_eq!(displayed(&scene, key), &red);
        assert_eq!(tracker.override_for(key), Some(&red));
    }

    #[test]
    fn override_on_hovered_node_shows_at_once() {
        let (mut scene, mut tracker) = setup(1);
        let key = NodeKey(0);
        let blue = Treatment::from_srgb_hex("Blue", 0x0000ff);

        tracker.hover(&mut scene, Some(key));
        tracker.apply_override(&mut scene, key, blue.clone());
        assert_eq!(displayed(&scene, key), &blue);
        assert_eq!(tracker.hovered(), None);

        tracker.hover(&mut scene, Some(key));
        assert_eq!(displayed(&scene, key), &Treatment::hover());
    }

    #[test]
    fn clear_restores_original() {
        let (mut scene, mut tracker) = setup(1);
        let key = NodeKey(0);
        let base = displayed(&scene, key).clone();

        tracker.capture_original(&scene, key);
        tracker.apply_override(&mut scene, key, Treatment::from_srgb_hex("Green", 0x00ff00));
        tracker.clear_override(&mut scene, key);
        assert_eq!(displayed(&scene, key), &base);
        assert_eq!(tracker.override_count(), 0);
        assert_eq!(tracker.effective(key), Some(&base));
    }

    #[test]
    fn clear_without_original_uses_default() {
        let (mut scene, mut tracker) = setup(1);
        let key = NodeKey(0);
        tracker.clear_override(&mut scene, key);
        assert_eq!(displayed(&scene, key), &Treatment::default_gray());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let (mut scene, mut tracker) = setup(1);
        tracker.apply_override(&mut scene, NodeKey(7), Treatment::hover());
        assert_eq!(tracker.override_count(), 0);
        tracker.hover(&mut scene, Some(NodeKey(7)));
        assert_eq!(tracker.hovered(), None);
    }

    #[test]
    fn reset_forgets_everything() {
        let (mut scene, mut tracker) = setup(1);
        let key = NodeKey(0);
        tracker.hover(&mut scene, Some(key));
        tracker.apply_override(&mut scene, key, Treatment::hover());
        tracker.reset();
        assert_eq!(tracker.hovered(), None);
        assert_eq!(tracker.override_count(), 0);
        assert_eq!(tracker.original(key), None);
    }
}
