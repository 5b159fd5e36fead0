//! Octree Node Pool Data - Pure DOP
//!
//! Just data. All transformations happen in node_pool_operations.rs

use crate::constants::node::{NODE_MASK_FLAG, NODE_MASK_NEXT};
use bytemuck::{Pod, Zeroable};
use static_assertions::assert_eq_size;

/// Packed octree node format for GPU storage
/// Uses 32 bits per node:
/// - Bit 31: "flagged" tag (marked by the current build level, or an occupied leaf)
/// - Bit 30: reserved
/// - Bits 0-29: address of the first node of the child brick (0 = no children)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct OctreeNode(pub u32);

assert_eq_size!(OctreeNode, u32);

impl OctreeNode {
    pub const NULL: Self = Self(0);

    #[inline]
    pub fn new(flagged: bool, next: u32) -> Self {
        let mut word = next & NODE_MASK_NEXT;
        if flagged {
            word |= NODE_MASK_FLAG;
        }
        Self(word)
    }

    #[inline]
    pub fn flagged(&self) -> bool {
        self.0 & NODE_MASK_FLAG != 0
    }

    /// Address of the first of the node's 8 consecutive children, 0 if none.
    #[inline]
    pub fn next(&self) -> u32 {
        self.0 & NODE_MASK_NEXT
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.next() != 0
    }

    #[inline]
    pub fn with_flag(self, flagged: bool) -> Self {
        Self::new(flagged, self.next())
    }

    #[inline]
    pub fn with_next(self, next: u32) -> Self {
        Self::new(self.flagged(), next)
    }
}

/// One entry of the voxel fragment list produced by the voxelization stage
/// Grid coordinates are packed 10 bits per axis, color is RGBA8
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct VoxelFragment {
    pub position: u32,
    pub color: u32,
}

impl VoxelFragment {
    #[inline]
    pub fn new(x: u32, y: u32, z: u32, color: u32) -> Self {
        let position = (x & 0x3FF) | ((y & 0x3FF) << 10) | ((z & 0x3FF) << 20);
        Self { position, color }
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.position & 0x3FF
    }

    #[inline]
    pub fn y(&self) -> u32 {
        (self.position >> 10) & 0x3FF
    }

    #[inline]
    pub fn z(&self) -> u32 {
        (self.position >> 20) & 0x3FF
    }
}

/// Indirect draw command driven by the fragment-count atomic counter
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawCommand {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

/// GPU-resident octree node pool
pub struct NodePoolData {
    /// Node pool storage buffer, one packed u32 per node
    pub node_buffer: wgpu::Buffer,

    /// Next-free-address atomic counter buffer (single u32)
    pub next_free_buffer: wgpu::Buffer,

    /// Total nodes the buffer can hold
    pub node_capacity: u32,
    /// Nodes allocated by the last build (CPU mirror of the counter)
    pub allocated_nodes: u32,

    /// Voxel grid resolution the octree subdivides
    pub grid_resolution: u32,
    /// Number of subdivision levels (log2 of the resolution)
    pub levels: u32,
}

/// GPU-resident voxel fragment list
pub struct FragmentListData {
    /// Fragment storage buffer
    pub fragment_buffer: wgpu::Buffer,

    /// Fragment-count atomic counter buffer (single u32)
    pub count_buffer: wgpu::Buffer,

    /// Indirect draw command buffer fed by the counter (4 u32 words)
    pub indirect_buffer: wgpu::Buffer,

    pub fragment_capacity: u32,
    pub fragment_count: u32,
}

/// Node pool statistics
#[derive(Debug, Clone)]
pub struct NodePoolStats {
    pub allocated_nodes: u32,
    pub node_capacity: u32,
    pub levels: u32,
    pub memory_usage_mb: f32,
}
