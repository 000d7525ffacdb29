use glam::Vec2;
use log::{debug, info};

use crate::{
    config::ViewerConfig,
    inspector::InspectorInfo,
    menu::ContextMenu,
    pick::Ray,
    scene::{NodeKey, SceneSubtree},
    tracker::HighlightTracker,
    treatment::Treatment,
};

/// All interaction state of one view.
///
/// Every side table is keyed by [`NodeKey`] and dropped wholesale when a new
/// subtree is attached.
#[derive(Debug)]
pub struct ViewSession {
    scene: Option<SceneSubtree>,
    tracker: HighlightTracker,
    menu: ContextMenu,
    selected: Option<NodeKey>,
}

impl ViewSession {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            scene: None,
            tracker: HighlightTracker::new(
                config.hover_treatment.clone(),
                config.default_treatment.clone(),
            ),
            menu: ContextMenu::default(),
            selected: None,
        }
    }

    pub fn scene(&self) -> Option<&SceneSubtree> {
        self.scene.as_ref()
    }

    pub fn tracker(&self) -> &HighlightTracker {
        &self.tracker
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn selected(&self) -> Option<NodeKey> {
        self.selected
    }

    /// Attach a freshly loaded subtree, returning the detached one.
    pub fn replace_scene(&mut self, subtree: SceneSubtree) -> Option<SceneSubtree> {
        self.tracker.reset();
        self.menu.close();
        self.selected = None;
        info!(
            "Loaded {}: {} interactive nodes",
            subtree.display_name(),
            subtree.len()
        );
        let previous = self.scene.replace(subtree);
        if let Some(previous) = &previous {
            debug!(
                "Detached {} ({}) from generation {}",
                previous.tag(),
                previous.display_name(),
                previous.generation()
            );
        }
        previous
    }

    fn pick(&self, ray: &Ray) -> Option<NodeKey> {
        self.scene
            .as_ref()
            .and_then(|scene| scene.pick(ray))
            .map(|(key, _)| key)
    }

    /// Update the hover highlight. Returns whether the display changed.
    pub fn pointer_move(&mut self, ray: &Ray) -> bool {
        let target = self.pick(ray);
        self.hover(target)
    }

    /// The pointer left the view or moved onto a panel.
    pub fn pointer_left(&mut self) -> bool {
        self.hover(None)
    }

    fn hover(&mut self, target: Option<NodeKey>) -> bool {
        match &mut self.scene {
            Some(scene) => self.tracker.hover(scene, target),
            None => false,
        }
    }

    /// Select the nearest node for the inspector. A miss keeps the selection.
    pub fn click(&mut self, ray: &Ray) -> Option<NodeKey> {
        let scene = self.scene.as_ref()?;
        let (key, _) = scene.pick(ray)?;
        self.tracker.capture_original(scene, key);
        self.selected = Some(key);
        Some(key)
    }

    /// Open the recolor menu on the nearest node, or close it on a miss.
    pub fn context_click(&mut self, ray: &Ray, position: Vec2) -> Option<NodeKey> {
        let Some((scene, key)) = self
            .scene
            .as_ref()
            .and_then(|scene| scene.pick(ray).map(|(key, _)| (scene, key)))
        else {
            self.menu.close();
            return None;
        };
        self.tracker.capture_original(scene, key);
        self.menu.open(position, key);
        Some(key)
    }

    /// Recolor the menu's target and close the menu.
    pub fn apply_override(&mut self, treatment: Treatment) -> Option<NodeKey> {
        let target = self.menu.target()?;
        self.menu.close();
        let scene = self.scene.as_mut()?;
        info!(
            "Override {} on {}",
            treatment.name,
            scene.node(target)?.name()
        );
        self.tracker.apply_override(scene, target, treatment);
        Some(target)
    }

    /// Drop the menu target's override and close the menu.
    pub fn clear_override(&mut self) -> Option<NodeKey> {
        let target = self.menu.target()?;
        self.menu.close();
        let scene = self.scene.as_mut()?;
        self.tracker.clear_override(scene, target);
        Some(target)
    }

    pub fn close_menu(&mut self) {
        self.menu.close();
    }

    pub fn close_inspector(&mut self) {
        self.selected = None;
    }

    /// Inspector contents for the current selection, derived on every call.
    pub fn inspector(&self) -> Option<InspectorInfo> {
        let scene = self.scene.as_ref()?;
        InspectorInfo::collect(scene, &self.tracker, self.selected?)
    }
}

#[cfg(test)]
mod test {
    use glam::{Vec2, Vec3};
    use viewer_asset::loader::{fixture::GlbFixture, gltf::load_glb_from_buffer};

    use crate::{
        config::ViewerConfig,
        pick::Ray,
        scene::{NodeKey, SceneSubtree},
        treatment::Treatment,
    };

    use super::ViewSession;

    fn subtree(fixture: GlbFixture, name: &str, generation: u64) -> SceneSubtree {
        let asset = load_glb_from_buffer(&fixture.build()).unwrap();
        let config = ViewerConfig::default();
        SceneSubtree::build(&asset, &config.subtree, name.to_string(), generation)
    }

    /// A ray straight down the Z axis onto triangle `index` of the fixture.
    fn ray_at(index: usize) -> Ray {
        Ray::new(Vec3::new(index as f32 * 2.0 + 0.25, 0.25, 5.0), Vec3::NEG_Z)
    }

    fn miss() -> Ray {
        Ray::new(Vec3::new(0.0, 10.0, 5.0), Vec3::NEG_Z)
    }

    fn displayed(session: &ViewSession, key: NodeKey) -> Treatment {
        session.scene().unwrap().node(key).unwrap().displayed().clone()
    }

    #[test]
    fn recolor_scenario() {
        let config = ViewerConfig::default();
        let mut session = ViewSession::new(&config);
        session.replace_scene(subtree(GlbFixture::triangles(10), "parts.glb", 1));

        let names: Vec<String> = session
            .scene()
            .unwrap()
            .nodes()
            .iter()
            .map(|node| node.name().to_string())
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("Component_1"));
        assert_eq!(names.last().map(String::as_str), Some("Component_10"));

        let third = NodeKey(2);
        let before = displayed(&session, third);

        // right-click mesh 3, choose Red
        assert_eq!(session.context_click(&ray_at(2), Vec2::new(5.0, 5.0)), Some(third));
        let red = config.palette.by_name("Red").unwrap().clone();
        assert_eq!(session.apply_override(red.clone()), Some(third));
        assert_eq!(displayed(&session, third), red);
        assert_eq!(session.tracker().override_count(), 1);
        assert!(!session.menu().is_open());

        // hover mesh 3, then move away
        assert!(session.pointer_move(&ray_at(2)));
        assert_eq!(displayed(&session, third), config.hover_treatment);
        assert!(session.pointer_move(&ray_at(4)));
        assert_eq!(displayed(&session, third), red);

        // right-click mesh 3, Remove Color
        session.context_click(&ray_at(2), Vec2::new(5.0, 5.0));
        assert_eq!(session.clear_override(), Some(third));
        assert_eq!(displayed(&session, third), before);
        assert_eq!(session.tracker().override_count(), 0);
    }

    #[test]
    fn context_click_captures_pre_hover_treatment() {
        let config = ViewerConfig::default();
        let mut session = ViewSession::new(&config);
        session.replace_scene(subtree(GlbFixture::triangles(2), "a.glb", 1));
        let key = NodeKey(0);
        let before = displayed(&session, key);

        session.pointer_move(&ray_at(0));
        session.context_click(&ray_at(0), Vec2::ZERO);
        assert_eq!(session.tracker().original(key), Some(&before));
        assert_eq!(session.menu().target(), Some(key));
    }

    #[test]
    fn context_click_miss_closes_menu() {
        let mut session = ViewSession::new(&ViewerConfig::default());
        session.replace_scene(subtree(GlbFixture::triangles(2), "a.glb", 1));
        session.context_click(&ray_at(1), Vec2::ZERO);
        assert!(session.menu().is_open());
        assert_eq!(session.context_click(&miss(), Vec2::ZERO), None);
        assert!(!session.menu().is_open());
        assert_eq!(session.apply_override(Treatment::hover()), None);
    }

    #[test]
    fn click_selects_and_miss_keeps_selection() {
        let mut session = ViewSession::new(&ViewerConfig::default());
        session.replace_scene(subtree(GlbFixture::triangles(3), "a.glb", 1));

        assert_eq!(session.click(&ray_at(1)), Some(NodeKey(1)));
        assert_eq!(session.click(&miss()), None);
        assert_eq!(session.selected(), Some(NodeKey(1)));

        let info = session.inspector().unwrap();
        assert_eq!(info.name, "Component_2");
        assert_eq!(info.triangle_count, 1);

        session.close_inspector();
        assert!(session.inspector().is_none());
    }

    #[test]
    fn inspector_tracks_overrides_live() {
        let mut session = ViewSession::new(&ViewerConfig::default());
        session.replace_scene(subtree(GlbFixture::triangles(1), "a.glb", 1));
        session.click(&ray_at(0));
        assert_eq!(session.inspector().unwrap().material.name, "Base");

        session.context_click(&ray_at(0), Vec2::ZERO);
        session.apply_override(Treatment::from_srgb_hex("Purple", 0x800080));
        assert_eq!(session.inspector().unwrap().material.name, "Purple");
    }

    #[test]
    fn second_load_replaces_first() {
        let mut session = ViewSession::new(&ViewerConfig::default());
        assert!(session
            .replace_scene(subtree(GlbFixture::triangles(4), "first.glb", 1))
            .is_none());
        session.pointer_move(&ray_at(0));
        session.click(&ray_at(1));
        session.context_click(&ray_at(2), Vec2::ZERO);
        session.apply_override(Treatment::hover());

        let previous = session
            .replace_scene(subtree(GlbFixture::triangles(2).named(0, "Lid"), "second.glb", 2))
            .unwrap();
        assert_eq!(previous.display_name(), "first.glb");

        let scene = session.scene().unwrap();
        assert_eq!(scene.display_name(), "second.glb");
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.nodes()[0].name(), "Lid");
        assert_eq!(session.tracker().override_count(), 0);
        assert_eq!(session.tracker().hovered(), None);
        assert_eq!(session.selected(), None);
        assert!(!session.menu().is_open());
    }

    #[test]
    fn pointer_left_clears_hover() {
        let mut session = ViewSession::new(&ViewerConfig::default());
        assert!(!session.pointer_left());
        session.replace_scene(subtree(GlbFixture::triangles(1), "a.glb", 1));
        let before = displayed(&session, NodeKey(0));
        session.pointer_move(&ray_at(0));
        assert!(session.pointer_left());
        assert_eq!(displayed(&session, NodeKey(0)), before);
        assert!(!session.pointer_move(&miss()));
    }
}
