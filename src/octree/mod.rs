//! Sparse voxel octree state: the node pool, the voxel fragment list that
//! feeds it, and the CPU mirror of the per-level build.

pub mod node_pool_data;
pub mod node_pool_operations;

pub use node_pool_data::{
    DrawCommand, FragmentListData, NodePoolData, NodePoolStats, OctreeNode, VoxelFragment,
};
