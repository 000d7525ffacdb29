use glam::Vec3;

use crate::{
    scene::{NodeKey, SceneSubtree},
    tracker::HighlightTracker,
    treatment::Treatment,
};

/// Round to two decimals for display. Negative zero prints as zero.
pub fn round2(value: f32) -> f32 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn round_vec(value: Vec3) -> Vec3 {
    Vec3::new(round2(value.x), round2(value.y), round2(value.z))
}

/// Facts about the selected node, as shown in the inspector panel.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectorInfo {
    pub key: NodeKey,
    pub name: String,
    /// Width, height, depth of the world bounds, rounded.
    pub dimensions: Vec3,
    /// Center of the world bounds, rounded.
    pub center: Vec3,
    pub triangle_count: usize,
    pub material: Treatment,
    pub overridden: bool,
}

impl InspectorInfo {
    pub fn collect(scene: &SceneSubtree, tracker: &HighlightTracker, key: NodeKey) -> Option<Self> {
        let node = scene.node(key)?;
        let bounds = node.bounds();
        Some(Self {
            key,
            name: node.name().to_string(),
            dimensions: round_vec(bounds.size()),
            center: round_vec(bounds.center()),
            triangle_count: node.geometry().triangle_count(),
            material: tracker
                .effective(key)
                .unwrap_or_else(|| node.base_treatment())
                .clone(),
            overridden: tracker.override_for(key).is_some(),
        })
    }

    pub fn dimensions_label(&self) -> String {
        format!(
            "{:.2} × {:.2} × {:.2}",
            self.dimensions.x, self.dimensions.y, self.dimensions.z
        )
    }

    pub fn center_label(&self) -> String {
        format!(
            "({:.2}, {:.2}, {:.2})",
            self.center.x, self.center.y, self.center.z
        )
    }
}
