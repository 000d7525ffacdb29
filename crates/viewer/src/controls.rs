use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDrag {
    pub mode: DragMode,
    /// Pixels moved since the last reported drag.
    pub delta: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    button: PointerButton,
    origin: Vec2,
    last: Vec2,
    mode: DragMode,
    dragging: bool,
}

/// Tells clicks from camera drags.
///
/// A press becomes a drag once the pointer travels past the threshold.
/// Releasing a press that never became a drag is a click.
#[derive(Debug, Clone)]
pub struct PointerGesture {
    threshold: f32,
    press: Option<Press>,
}

impl PointerGesture {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            press: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.press.map(|press| press.dragging).unwrap_or(false)
    }

    pub fn press(&mut self, button: PointerButton, position: Vec2, shift: bool) {
        if self.press.is_some() {
            return;
        }
        let mode = match button {
            PointerButton::Primary if !shift => DragMode::Rotate,
            _ => DragMode::Pan,
        };
        self.press = Some(Press {
            button,
            origin: position,
            last: position,
            mode,
            dragging: false,
        });
    }

    pub fn moved(&mut self, position: Vec2) -> Option<CameraDrag> {
        let press = self.press.as_mut()?;
        if !press.dragging {
            if position.distance(press.origin) <= self.threshold {
                return None;
            }
            press.dragging = true;
        }
        let delta = position - press.last;
        press.last = position;
        Some(CameraDrag {
            mode: press.mode,
            delta,
        })
    }

    /// Returns the button if the press ended as a click.
    pub fn release(&mut self, button: PointerButton) -> Option<PointerButton> {
        let press = self.press.filter(|press| press.button == button)?;
        self.press = None;
        (!press.dragging).then_some(button)
    }

    pub fn cancel(&mut self) {
        self.press = None;
    }
}

#[cfg(test)]
mod test {
    use glam::Vec2;

    use super::{CameraDrag, DragMode, PointerButton, PointerGesture};

    #[test]
    fn small_travel_is_a_click() {
        let mut gesture = PointerGesture::new(4.0);
        gesture.press(PointerButton::Primary, Vec2::new(10.0, 10.0), false);
        assert_eq!(gesture.moved(Vec2::new(12.0, 11.0)), None);
        assert_eq!(
            gesture.release(PointerButton::Primary),
            Some(PointerButton::Primary)
        );
    }

    #[test]
    fn drag_reports_deltas_and_suppresses_click() {
        let mut gesture = PointerGesture::new(4.0);
        gesture.press(PointerButton::Primary, Vec2::ZERO, false);
        assert_eq!(
            gesture.moved(Vec2::new(10.0, 0.0)),
            Some(CameraDrag {
                mode: DragMode::Rotate,
                delta: Vec2::new(10.0, 0.0)
            })
        );
        assert_eq!(
            gesture.moved(Vec2::new(12.0, 1.0)).map(|drag| drag.delta),
            Some(Vec2::new(2.0, 1.0))
        );
        assert!(gesture.is_dragging());
        assert_eq!(gesture.release(PointerButton::Primary), None);
        assert!(!gesture.is_dragging());
    }

    #[test]
    fn pan_buttons() {
        let mut gesture = PointerGesture::new(1.0);
        gesture.press(PointerButton::Primary, Vec2::ZERO, true);
        assert_eq!(
            gesture.moved(Vec2::new(5.0, 5.0)).map(|drag| drag.mode),
            Some(DragMode::Pan)
        );
        gesture.release(PointerButton::Primary);

        gesture.press(PointerButton::Middle, Vec2::ZERO, false);
        assert_eq!(
            gesture.moved(Vec2::new(5.0, 5.0)).map(|drag| drag.mode),
            Some(DragMode::Pan)
        );
    }

    #[test]
    fn other_buttons_do_not_end_the_press() {
        let mut gesture = PointerGesture::new(4.0);
        gesture.press(PointerButton::Secondary, Vec2::ZERO, false);
        gesture.press(PointerButton::Primary, Vec2::ZERO, false);
        assert_eq!(gesture.release(PointerButton::Primary), None);
        assert_eq!(
            gesture.release(PointerButton::Secondary),
            Some(PointerButton::Secondary)
        );
        assert_eq!(gesture.moved(Vec2::new(50.0, 0.0)), None);
    }
}
