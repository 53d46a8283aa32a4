use crate::{Mat4, camera::Camera};

/// The two matrices uploaded once before the render loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransforms {
    pub model: Mat4,
    pub mvp: Mat4,
}

impl FrameTransforms {
    pub fn new(camera: &Camera, model: Mat4) -> Self {
        Self {
            model,
            mvp: camera.proj_view() * model,
        }
    }

    /// Mesh drawn in place: identity model matrix.
    pub fn untransformed(camera: &Camera) -> Self {
        Self::new(camera, Mat4::IDENTITY)
    }
}
