use crate::math::{mat3_bytes, mat4_bytes, Mat3, Mat4};

/// Compute a raw projection matrix which transforms from view-space to
/// Vulkan clip-space coordinates.
///
/// # View Space
///
/// View Space is a vector space with bounds:
///
///   - X in [left, right]
///   - Y in [bottom, top]
///   - Z in [near, far]
///
/// # Vulkan Clip Space
///
/// Reference: https://registry.khronos.org/vulkan/specs/1.3-extensions/html/vkspec.html#vertexpostproc-clipping
///
/// Thus, the mappings are:-
///
///   - [left, right] -> [-1.0, 1.0]
///   - [bottom, top] -> [1.0, -1.0]
///   - [near, far] -> [0.0, 1.0]
pub fn ortho_projection(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    let mh = 2.0 / (right - left);
    let bh = (right + left) / (left - right);
    let mv = 2.0 / (bottom - top);
    let bv = (top + bottom) / (top - bottom);
    let mz = 1.0 / (far - near);
    let bz = near / (near - far);
    Mat4::new(
        mh, 0.0, 0.0, bh, //
        0.0, mv, 0.0, bv, //
        0.0, 0.0, mz, bz, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// A view and a projection. The renderer uploads the derived
/// [CameraUniforms] at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }
}

impl Camera {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// A camera looking down +Z with an orthographic projection.
    pub fn ortho(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            view: Mat4::identity(),
            projection: ortho_projection(left, right, bottom, top, near, far),
        }
    }

    /// The uniforms for geometry with an identity model matrix.
    pub fn uniforms(&self) -> CameraUniforms {
        let model_view = self.view;
        let normal = model_view
            .fixed_view::<3, 3>(0, 0)
            .into_owned()
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Mat3::identity);
        CameraUniforms {
            model_view_projection: self.projection * model_view,
            model_view,
            normal,
        }
    }
}

/// The camera uniform block at descriptor set 1, binding 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraUniforms {
    pub model_view_projection: Mat4,
    pub model_view: Mat4,

    /// The inverse transpose of the model view rotation and scale.
    pub normal: Mat3,
}

impl CameraUniforms {
    /// The size of the uniform block in bytes. The normal matrix takes
    /// three padded columns.
    pub const SIZE: u64 = 64 + 64 + 48;

    pub fn to_bytes(&self) -> Vec<u8> {
        mat4_bytes(&self.model_view_projection)
            .chain(mat4_bytes(&self.model_view))
            .chain(mat3_bytes(&self.normal))
            .collect()
    }
}
