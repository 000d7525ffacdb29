use std::time::Duration;

use glam::{Mat4, Vec2, Vec3};

use crate::{
    config::{OrbitLimits, ViewerConfig},
    scene::Aabb,
};

const INITIAL_AZIMUTH: f32 = 45.0;
const INITIAL_POLAR: f32 = 60.0;
/// Margin around fitted bounds.
const FIT_PADDING: f32 = 1.2;

#[derive(Debug, Clone)]
pub enum CameraProjection {
    Perspective {
        yfov: f32,
        znear: f32,
        zfar: Option<f32>,
    },
    Orthographic {
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

impl CameraProjection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match self {
            CameraProjection::Perspective { yfov, znear, zfar } => match zfar {
                Some(zfar) => Mat4::perspective_rh(yfov.to_radians(), aspect, *znear, *zfar),
                None => Mat4::perspective_infinite_rh(yfov.to_radians(), aspect, *znear),
            },
            CameraProjection::Orthographic { ymag, znear, zfar } => {
                let xmag = ymag * aspect;
                Mat4::orthographic_rh(
                    -xmag / 2.0,
                    xmag / 2.0,
                    -ymag / 2.0,
                    ymag / 2.0,
                    *znear,
                    *zfar,
                )
            }
        }
    }
}

/// Spherical camera placement around a target. Angles in degrees, polar
/// measured from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitPose {
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
}

impl OrbitPose {
    pub fn offset(&self) -> Vec3 {
        let azimuth = self.azimuth.to_radians();
        let polar = self.polar.to_radians();
        Vec3::new(
            polar.sin() * azimuth.sin(),
            polar.cos(),
            polar.sin() * azimuth.cos(),
        ) * self.distance
    }

    pub fn eye(&self) -> Vec3 {
        self.target + self.offset()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    fn clamp(mut self, limits: &OrbitLimits) -> Self {
        self.distance = self
            .distance
            .clamp(limits.min_distance, limits.max_distance);
        self.polar = self
            .polar
            .clamp(limits.min_polar_angle, limits.max_polar_angle);
        self
    }

    fn approach(&self, goal: &OrbitPose, t: f32) -> Self {
        let lerp = |from: f32, to: f32| from + (to - from) * t;
        Self {
            target: self.target.lerp(goal.target, t),
            distance: lerp(self.distance, goal.distance),
            azimuth: lerp(self.azimuth, goal.azimuth),
            polar: lerp(self.polar, goal.polar),
        }
    }
}

/// Orbit camera with damping. Input moves the goal pose and [`update`]
/// eases the current pose towards it.
///
/// [`update`]: OrbitCamera::update
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub projection: CameraProjection,
    limits: OrbitLimits,
    current: OrbitPose,
    goal: OrbitPose,
    home: OrbitPose,
    rotate_speed: f32,
    pan_speed: f32,
    zoom_speed: f32,
    damping: f32,
}

impl OrbitCamera {
    pub fn new(config: &ViewerConfig) -> Self {
        let home = OrbitPose {
            target: Vec3::ZERO,
            distance: config.initial_distance,
            azimuth: INITIAL_AZIMUTH,
            polar: INITIAL_POLAR,
        }
        .clamp(&config.orbit_limits);
        Self {
            projection: CameraProjection::Perspective {
                yfov: config.fov_y,
                znear: config.znear,
                zfar: Some(config.zfar),
            },
            limits: config.orbit_limits,
            current: home,
            goal: home,
            home,
            rotate_speed: config.rotate_speed,
            pan_speed: config.pan_speed,
            zoom_speed: config.zoom_speed,
            damping: config.damping,
        }
    }

    pub fn pose(&self) -> &OrbitPose {
        &self.current
    }

    pub fn goal(&self) -> &OrbitPose {
        &self.goal
    }

    pub fn eye(&self) -> Vec3 {
        self.current.eye()
    }

    pub fn matrix(&self, aspect: f32) -> Mat4 {
        self.projection.matrix(aspect) * self.current.view_matrix()
    }

    /// Drag in pixels. Horizontal turns around the target, vertical tilts.
    pub fn rotate(&mut self, delta: Vec2) {
        self.goal.azimuth -= delta.x * self.rotate_speed;
        self.goal.polar -= delta.y * self.rotate_speed;
        self.goal = self.goal.clamp(&self.limits);
    }

    /// Drag in pixels. Moves the target in the view plane.
    pub fn pan(&mut self, delta: Vec2) {
        let forward = -self.current.offset().normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        let scale = self.pan_speed * self.goal.distance;
        self.goal.target += (up * delta.y - right * delta.x) * scale;
    }

    /// Wheel lines, positive towards the target.
    pub fn zoom(&mut self, lines: f32) {
        self.goal.distance *= (1.0 - self.zoom_speed).powf(lines);
        self.goal = self.goal.clamp(&self.limits);
    }

    /// Ease towards the goal. Returns whether the pose moved.
    pub fn update(&mut self, elapsed: Duration) -> bool {
        if self.current == self.goal {
            return false;
        }
        let t = if self.damping > 0.0 {
            1.0 - (-self.damping * elapsed.as_secs_f32()).exp()
        } else {
            1.0
        };
        let next = self.current.approach(&self.goal, t);
        self.current = if (next.eye() - self.goal.eye()).length() < 1e-4
            && (next.target - self.goal.target).length() < 1e-4
        {
            self.goal
        } else {
            next
        };
        true
    }

    /// Look at the bounds from the current angle, and make that the home pose.
    pub fn fit(&mut self, bounds: &Aabb) {
        let radius = (bounds.size().length() * 0.5).max(f32::EPSILON);
        let half_fov = match self.projection {
            CameraProjection::Perspective { yfov, .. } => (yfov * 0.5).to_radians(),
            CameraProjection::Orthographic { .. } => std::f32::consts::FRAC_PI_4,
        };
        let pose = OrbitPose {
            target: bounds.center(),
            distance: radius / half_fov.sin() * FIT_PADDING,
            azimuth: INITIAL_AZIMUTH,
            polar: INITIAL_POLAR,
        }
        .clamp(&self.limits);
        self.home = pose;
        self.goal = pose;
        self.current = pose;
    }

    pub fn reset(&mut self) {
        self.goal = self.home;
    }
}
