//! Octree raycast visualization pass.

pub mod octree_vis_pass;
pub mod raycast_camera;

pub use octree_vis_pass::{
    create_octree_vis_pass, record_octree_vis_pass, update_camera, OctreeVisPassData,
};
pub use raycast_camera::RaycastCameraUniform;
