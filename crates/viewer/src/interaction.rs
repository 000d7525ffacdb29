use glam::Vec2;

use crate::{
    controls::{DragMode, PointerButton, PointerGesture},
    pick::Ray,
    renderer::camera::OrbitCamera,
    session::ViewSession,
};

/// Routes pointer input to the camera and the session.
///
/// Positions are physical pixels from the top-left corner of the view.
#[derive(Debug, Clone)]
pub struct ViewInput {
    gesture: PointerGesture,
    pointer: Option<Vec2>,
    shift_pressed: bool,
    viewport: Vec2,
}

impl ViewInput {
    pub fn new(click_threshold: f32, size: (u32, u32)) -> Self {
        Self {
            gesture: PointerGesture::new(click_threshold),
            pointer: None,
            shift_pressed: false,
            viewport: Self::viewport(size),
        }
    }

    fn viewport(size: (u32, u32)) -> Vec2 {
        Vec2::new(size.0 as f32, size.1 as f32)
    }

    pub fn resize(&mut self, size: (u32, u32)) {
        self.viewport = Self::viewport(size);
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    pub fn set_shift_pressed(&mut self, pressed: bool) {
        self.shift_pressed = pressed;
    }

    fn ray_at(&self, position: Vec2, camera: &OrbitCamera) -> Option<Ray> {
        let aspect = self.viewport.x.max(1.0) / self.viewport.y.max(1.0);
        Ray::from_viewport(position, self.viewport, camera.matrix(aspect).inverse())
    }

    /// Re-pick under the resting pointer.
    pub fn refresh_hover(&self, camera: &OrbitCamera, session: &mut ViewSession) -> bool {
        match self.pointer.and_then(|position| self.ray_at(position, camera)) {
            Some(ray) => session.pointer_move(&ray),
            None => false,
        }
    }

    /// The camera moved under the pointer. Hover stays frozen during a drag.
    pub fn camera_moved(&self, camera: &OrbitCamera, session: &mut ViewSession) -> bool {
        !self.gesture.is_dragging() && self.refresh_hover(camera, session)
    }

    /// Drop any gesture in progress, for instance after a new model is attached.
    pub fn cancel(&mut self) {
        self.gesture.cancel();
    }

    pub fn pointer_moved(
        &mut self,
        position: Vec2,
        camera: &mut OrbitCamera,
        session: &mut ViewSession,
    ) {
        self.pointer = Some(position);
        if let Some(drag) = self.gesture.moved(position) {
            match drag.mode {
                DragMode::Rotate => camera.rotate(drag.delta),
                DragMode::Pan => camera.pan(drag.delta),
            }
            return;
        }
        if !self.gesture.is_dragging() {
            self.refresh_hover(camera, session);
        }
    }

    pub fn pointer_left(&mut self, session: &mut ViewSession) {
        self.pointer = None;
        self.gesture.cancel();
        session.pointer_left();
    }

    pub fn pointer_button(
        &mut self,
        button: PointerButton,
        pressed: bool,
        camera: &OrbitCamera,
        session: &mut ViewSession,
    ) {
        let Some(position) = self.pointer else {
            return;
        };
        if pressed {
            if button == PointerButton::Primary {
                session.close_menu();
            }
            self.gesture.press(button, position, self.shift_pressed);
            return;
        }
        let was_dragging = self.gesture.is_dragging();
        let Some(clicked) = self.gesture.release(button) else {
            if was_dragging && !self.gesture.is_dragging() {
                self.refresh_hover(camera, session);
            }
            return;
        };
        let Some(ray) = self.ray_at(position, camera) else {
            return;
        };
        match clicked {
            PointerButton::Primary => {
                session.click(&ray);
            }
            PointerButton::Secondary => {
                session.context_click(&ray, position);
            }
            PointerButton::Middle => (),
        }
    }
}
