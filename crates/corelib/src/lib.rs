//! Core types: math re-exports, Camera, frame transforms.

pub use glam::{Mat4, Vec3, vec3};

pub mod camera;
pub mod transform;

pub use camera::Camera;
pub use transform::FrameTransforms;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_pv_is_finite() {
        let cam = camera::Camera::viewer_default(640.0 / 480.0);
        let pv = cam.proj_view();
        let a = pv.to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let cam = camera::Camera::viewer_default(640.0 / 480.0);
        let clip = cam.proj_view() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn frame_transforms_with_identity_model() {
        let cam = camera::Camera::viewer_default(640.0 / 480.0);
        let ft = FrameTransforms::untransformed(&cam);
        assert_eq!(ft.model, Mat4::IDENTITY);
        assert_eq!(ft.mvp, cam.proj_view());
    }

    #[test]
    fn mvp_applies_model_first() {
        let cam = camera::Camera::viewer_default(640.0 / 480.0);
        let model = Mat4::from_translation(vec3(1.0, 2.0, 3.0));
        let ft = FrameTransforms::new(&cam, model);
        assert_eq!(ft.model, model);
        assert_eq!(ft.mvp, cam.proj_view() * model);
    }
}
