use glam::Vec2;

use crate::scene::NodeKey;

/// Where the menu is shown and which node it acts on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuAnchor {
    /// Physical pixels from the top-left corner of the view.
    pub position: Vec2,
    pub target: NodeKey,
}

/// The recolor menu. At most one is open per view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMenu {
    anchor: Option<MenuAnchor>,
}

impl ContextMenu {
    pub fn open(&mut self, position: Vec2, target: NodeKey) {
        self.anchor = Some(MenuAnchor { position, target });
    }

    pub fn close(&mut self) {
        self.anchor = None;
    }

    pub fn is_open(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<&MenuAnchor> {
        self.anchor.as_ref()
    }

    pub fn target(&self) -> Option<NodeKey> {
        self.anchor.map(|anchor| anchor.target)
    }
}

#[cfg(test)]
mod test {
    use glam::Vec2;

    use crate::scene::NodeKey;

    use super::ContextMenu;

    #[test]
    fn reopening_moves_the_anchor() {
        let mut menu = ContextMenu::default();
        assert!(!menu.is_open());
        menu.open(Vec2::new(10.0, 20.0), NodeKey(1));
        menu.open(Vec2::new(30.0, 40.0), NodeKey(2));
        assert_eq!(menu.target(), Some(NodeKey(2)));
        assert_eq!(menu.anchor().unwrap().position, Vec2::new(30.0, 40.0));
        menu.close();
        assert_eq!(menu.target(), None);
    }
}
