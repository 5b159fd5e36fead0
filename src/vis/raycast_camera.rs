//! Camera and grid uniforms for the raycast visualization shader.

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, SquareMatrix};
use static_assertions::const_assert_eq;

/// Uniform block consumed by `octree_vis.wgsl`
///
/// `grid_transform` maps the biunit cube onto the voxel volume in world
/// space; its inverse carries rays into grid space.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RaycastCameraUniform {
    pub view_inverse: [[f32; 4]; 4],
    pub grid_transform: [[f32; 4]; 4],
    pub grid_transform_inverse: [[f32; 4]; 4],
    pub ratio: f32,
    pub y_fov_deg: f32,
    pub far_plane: f32,
    pub grid_resolution: f32,
    pub levels: u32,
    pub _padding: [u32; 3],
}

const_assert_eq!(std::mem::size_of::<RaycastCameraUniform>(), 224);

impl RaycastCameraUniform {
    pub fn from_matrices(
        view: &Matrix4<f32>,
        grid_transform: &Matrix4<f32>,
        ratio: f32,
        y_fov_deg: f32,
        far_plane: f32,
        grid_resolution: u32,
        levels: u32,
    ) -> Self {
        let view_inverse = view.invert().unwrap_or_else(Matrix4::identity);
        let grid_inverse = grid_transform.invert().unwrap_or_else(Matrix4::identity);

        Self {
            view_inverse: view_inverse.into(),
            grid_transform: (*grid_transform).into(),
            grid_transform_inverse: grid_inverse.into(),
            ratio,
            y_fov_deg,
            far_plane,
            grid_resolution: grid_resolution as f32,
            levels,
            _padding: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Vector3};

    #[test]
    fn test_from_matrices_inverts_view() {
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        let uniform = RaycastCameraUniform::from_matrices(
            &view,
            &Matrix4::identity(),
            16.0 / 9.0,
            60.0,
            100.0,
            128,
            7,
        );

        // The inverse view carries the origin back to the eye position
        let eye = uniform.view_inverse[3];
        assert!((eye[0] - 0.0).abs() < 1e-5);
        assert!((eye[1] - 0.0).abs() < 1e-5);
        assert!((eye[2] - 5.0).abs() < 1e-5);

        assert_eq!(uniform.levels, 7);
        assert_eq!(uniform.grid_resolution, 128.0);
    }
}
