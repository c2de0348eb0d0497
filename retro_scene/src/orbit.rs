//! Damped drag-to-rotate camera around the monitor. Scroll owns the camera's
//! height and distance; the rig only swings it around the target.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitLimits {
    pub min_polar: f32,
    pub max_polar: f32,
    pub damping: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_polar: FRAC_PI_4,
            max_polar: FRAC_PI_2,
            damping: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrbitRig {
    eye: Vec3,
    target: Vec3,
    limits: OrbitLimits,
    pending_azimuth: f32,
    pending_polar: f32,
}

impl OrbitRig {
    pub fn new(eye: Vec3, target: Vec3, limits: OrbitLimits) -> Self {
        let mut rig = Self {
            eye,
            target,
            limits,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
        };
        rig.update();
        rig
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Moves the camera to a scroll-driven height and distance while keeping
    /// whatever sideways offset the user has dragged in.
    pub fn apply_placement(&mut self, placement: &crate::zoom::CameraPlacement) {
        self.eye = placement.eye(self.eye.x);
        self.target = placement.target;
    }

    /// Queues rotation for a pointer drag in pixels. A drag the full height
    /// of the viewport turns the camera once around.
    pub fn drag(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.pending_azimuth -= 2.0 * PI * dx / height;
        self.pending_polar -= 2.0 * PI * dy / height;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_azimuth.abs() < 1e-5 && self.pending_polar.abs() < 1e-5
    }

    /// Applies a damped share of the queued rotation and clamps the polar
    /// angle. Called once per frame.
    pub fn update(&mut self) -> Vec3 {
        let offset = self.eye - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return self.eye;
        }

        let damping = self.limits.damping;
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        azimuth += self.pending_azimuth * damping;
        polar += self.pending_polar * damping;
        polar = polar.clamp(self.limits.min_polar, self.limits.max_polar);
        self.pending_azimuth *= 1.0 - damping;
        self.pending_polar *= 1.0 - damping;

        let sin_polar = polar.sin();
        self.eye = self.target
            + Vec3::new(
                radius * sin_polar * azimuth.sin(),
                radius * polar.cos(),
                radius * sin_polar * azimuth.cos(),
            );
        self.eye
    }

    pub fn polar_angle(&self) -> f32 {
        let offset = self.eye - self.target;
        let radius = offset.length().max(f32::EPSILON);
        (offset.y / radius).clamp(-1.0, 1.0).acos()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> OrbitRig {
        OrbitRig::new(
            Vec3::new(0.0, 1.5, 3.0),
            Vec3::new(0.0, 1.2, 0.0),
            OrbitLimits::default(),
        )
    }

    #[test]
    fn idle_rig_keeps_camera_in_place() {
        let mut rig = rig();
        let before = rig.eye();
        for _ in 0..10 {
            rig.update();
        }
        assert!((rig.eye() - before).length() < 1e-4);
    }

    #[test]
    fn drag_rotates_and_preserves_radius() {
        let mut rig = rig();
        let radius = (rig.eye() - rig.target()).length();
        rig.drag(100.0, 0.0, 800.0);
        for _ in 0..400 {
            rig.update();
        }
        assert!(rig.eye().x.abs() > 0.1);
        assert!(((rig.eye() - rig.target()).length() - radius).abs() < 1e-3);
        assert!(rig.is_settled());
    }

    #[test]
    fn polar_angle_stays_within_limits() {
        let limits = OrbitLimits::default();
        let mut rig = rig();
        rig.drag(0.0, -5_000.0, 800.0);
        for _ in 0..300 {
            rig.update();
            let polar = rig.polar_angle();
            assert!(polar >= limits.min_polar - 1e-4, "{polar}");
            assert!(polar <= limits.max_polar + 1e-4, "{polar}");
        }
        rig.drag(0.0, 5_000.0, 800.0);
        for _ in 0..300 {
            rig.update();
            assert!(rig.polar_angle() <= limits.max_polar + 1e-4);
        }
    }

    #[test]
    fn placement_keeps_dragged_x() {
        let mut rig = rig();
        rig.drag(50.0, 0.0, 800.0);
        for _ in 0..100 {
            rig.update();
        }
        let x = rig.eye().x;
        rig.apply_placement(&crate::zoom::CameraPlacement {
            distance: 5.0,
            height: 1.7,
            target: Vec3::new(0.0, 1.2, 0.0),
        });
        assert_eq!(rig.eye(), Vec3::new(x, 1.7, 5.0));
    }
}
