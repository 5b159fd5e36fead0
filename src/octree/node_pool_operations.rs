//! Octree Node Pool Operations - Pure DOP Functions
//!
//! All functions take data and return results; GPU state is only touched
//! through the explicit device/queue parameters.

use super::node_pool_data::{
    DrawCommand, FragmentListData, NodePoolData, NodePoolStats, OctreeNode, VoxelFragment,
};
use crate::constants::node::{CHILDREN_PER_BRICK, NULL_ADDRESS};
use crate::error::{ProbeError, ProbeResult};
use wgpu::{Device, Queue};

/// Create the GPU node pool for a voxel grid
///
/// `grid_resolution` must be a power of two (see `ProbeConfig::validate`).
pub fn create_node_pool(device: &Device, grid_resolution: u32, node_capacity: u32) -> NodePoolData {
    let levels = grid_resolution.trailing_zeros();
    let buffer_size = node_capacity as u64 * std::mem::size_of::<OctreeNode>() as u64;

    log::info!(
        "[NodePool] Creating node pool: {} nodes, {} levels, {} KB",
        node_capacity,
        levels,
        buffer_size / 1024
    );

    let node_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Octree Node Pool"),
        size: buffer_size,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let next_free_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Octree Next Free Counter"),
        size: std::mem::size_of::<u32>() as u64,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    NodePoolData {
        node_buffer,
        next_free_buffer,
        node_capacity,
        allocated_nodes: 0,
        grid_resolution,
        levels,
    }
}

/// Create the voxel fragment list buffers
pub fn create_fragment_list(device: &Device, fragment_capacity: u32) -> FragmentListData {
    let buffer_size = fragment_capacity as u64 * std::mem::size_of::<VoxelFragment>() as u64;

    log::info!(
        "[FragmentList] Creating fragment list: {} entries, {} KB",
        fragment_capacity,
        buffer_size / 1024
    );

    let fragment_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Voxel Fragment List"),
        size: buffer_size,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let count_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Voxel Fragment Counter"),
        size: std::mem::size_of::<u32>() as u64,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let indirect_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Fragment List Indirect Command"),
        size: std::mem::size_of::<DrawCommand>() as u64,
        usage: wgpu::BufferUsages::INDIRECT
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    FragmentListData {
        fragment_buffer,
        count_buffer,
        indirect_buffer,
        fragment_capacity,
        fragment_count: 0,
    }
}

/// One point per voxel fragment, drawn in a single instance
pub fn draw_command_for(fragment_count: u32) -> DrawCommand {
    DrawCommand {
        vertex_count: fragment_count,
        instance_count: 1,
        first_vertex: 0,
        first_instance: 0,
    }
}

/// Upload voxel fragments, their count and the derived indirect draw command
pub fn upload_fragments(
    data: &mut FragmentListData,
    queue: &Queue,
    fragments: &[VoxelFragment],
) -> ProbeResult<()> {
    let count = fragments.len() as u32;
    if count > data.fragment_capacity {
        return Err(ProbeError::CapacityExceeded {
            requested: count,
            capacity: data.fragment_capacity,
        });
    }

    queue.write_buffer(&data.fragment_buffer, 0, bytemuck::cast_slice(fragments));
    queue.write_buffer(&data.count_buffer, 0, bytemuck::bytes_of(&count));

    let command = draw_command_for(count);
    queue.write_buffer(&data.indirect_buffer, 0, bytemuck::bytes_of(&command));

    data.fragment_count = count;
    log::info!("[FragmentList] Uploaded {} fragments", count);
    Ok(())
}

/// Which child octant of a node holds the given grid position
/// x selects bit 0, y bit 1, z bit 2
pub fn child_octant(x: u32, y: u32, z: u32, level: u32, levels: u32) -> usize {
    let shift = levels - 1 - level;
    (((x >> shift) & 1) | (((y >> shift) & 1) << 1) | (((z >> shift) & 1) << 2)) as usize
}

/// Walk `depth` levels down from the root toward a fragment's grid cell
/// Returns None once an unallocated branch is reached
fn descend(
    nodes: &[OctreeNode],
    fragment: &VoxelFragment,
    depth: u32,
    levels: u32,
) -> Option<u32> {
    let mut address = 0u32;
    for level in 0..depth {
        let next = nodes[address as usize].next();
        if next == NULL_ADDRESS {
            return None;
        }
        address = next + child_octant(fragment.x(), fragment.y(), fragment.z(), level, levels) as u32;
    }
    Some(address)
}

/// CPU mirror of the voxelization stage's per-level flag/allocate build
///
/// For each level the nodes touched by a fragment are flagged, then every
/// flagged node receives a fresh brick of 8 children and its flag is
/// cleared. Leaf-level nodes keep the flag as the occupancy tag. Returns
/// the allocated prefix of the pool and the next-free address.
pub fn build_nodes(
    fragments: &[VoxelFragment],
    levels: u32,
    grid_resolution: u32,
    node_capacity: u32,
) -> ProbeResult<(Vec<OctreeNode>, u32)> {
    for (index, fragment) in fragments.iter().enumerate() {
        if fragment.x() >= grid_resolution
            || fragment.y() >= grid_resolution
            || fragment.z() >= grid_resolution
        {
            return Err(ProbeError::FragmentOutOfGrid {
                index,
                resolution: grid_resolution,
            });
        }
    }

    let mut nodes = vec![OctreeNode::NULL; node_capacity as usize];
    let mut next_free = 1u32;

    for level in 0..levels {
        // Flag pass: mark the node at this level touched by each fragment
        for fragment in fragments {
            if let Some(address) = descend(&nodes, fragment, level, levels) {
                nodes[address as usize] = nodes[address as usize].with_flag(true);
            }
        }

        // Alloc pass: give every flagged node a child brick
        for address in 0..next_free {
            if nodes[address as usize].flagged() {
                if next_free + CHILDREN_PER_BRICK > node_capacity {
                    return Err(ProbeError::NodePoolOverflow {
                        needed: next_free + CHILDREN_PER_BRICK,
                        capacity: node_capacity,
                    });
                }
                nodes[address as usize] = OctreeNode::new(false, next_free);
                next_free += CHILDREN_PER_BRICK;
            }
        }
    }

    // Leaf pass: the tag stays set on occupied leaves
    for fragment in fragments {
        if let Some(address) = descend(&nodes, fragment, levels, levels) {
            nodes[address as usize] = nodes[address as usize].with_flag(true);
        }
    }

    nodes.truncate(next_free as usize);
    Ok((nodes, next_free))
}

/// Build the octree from fragments and upload nodes plus the next-free counter
pub fn build_from_fragments(
    data: &mut NodePoolData,
    queue: &Queue,
    fragments: &[VoxelFragment],
) -> ProbeResult<()> {
    let (nodes, next_free) = build_nodes(
        fragments,
        data.levels,
        data.grid_resolution,
        data.node_capacity,
    )?;

    queue.write_buffer(&data.node_buffer, 0, bytemuck::cast_slice(&nodes));
    queue.write_buffer(&data.next_free_buffer, 0, bytemuck::bytes_of(&next_free));
    data.allocated_nodes = next_free;

    log::info!(
        "[NodePool] Built octree: {} fragments, {} nodes allocated, {} levels",
        fragments.len(),
        next_free,
        data.levels
    );
    Ok(())
}

/// Get node pool statistics
pub fn node_pool_stats(data: &NodePoolData) -> NodePoolStats {
    NodePoolStats {
        allocated_nodes: data.allocated_nodes,
        node_capacity: data.node_capacity,
        levels: data.levels,
        memory_usage_mb: (data.allocated_nodes as f32 * std::mem::size_of::<OctreeNode>() as f32)
            / (1024.0 * 1024.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_octant_axis_bits() {
        // Grid of 2: one level, the coordinate's single bit picks the octant
        assert_eq!(child_octant(0, 0, 0, 0, 1), 0);
        assert_eq!(child_octant(1, 0, 0, 0, 1), 1);
        assert_eq!(child_octant(0, 1, 0, 0, 1), 2);
        assert_eq!(child_octant(0, 0, 1, 0, 1), 4);
        assert_eq!(child_octant(1, 1, 1, 0, 1), 7);
    }

    #[test]
    fn test_child_octant_per_level() {
        // Grid of 4: level 0 reads the high bit, level 1 the low bit
        assert_eq!(child_octant(2, 0, 0, 0, 2), 1);
        assert_eq!(child_octant(2, 0, 0, 1, 2), 0);
        assert_eq!(child_octant(3, 3, 3, 1, 2), 7);
    }

    #[test]
    fn test_draw_command_for() {
        let command = draw_command_for(42);
        assert_eq!(command.vertex_count, 42);
        assert_eq!(command.instance_count, 1);
        assert_eq!(command.first_vertex, 0);
        assert_eq!(command.first_instance, 0);
    }

    #[test]
    fn test_build_empty() {
        let (nodes, next_free) = match build_nodes(&[], 3, 8, 64) {
            Ok(built) => built,
            Err(e) => panic!("build failed: {}", e),
        };
        assert_eq!(next_free, 1);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0], OctreeNode::NULL);
    }

    #[test]
    fn test_build_single_level() {
        let fragments = [
            VoxelFragment::new(0, 0, 0, 0),
            VoxelFragment::new(1, 1, 1, 0),
        ];
        let (nodes, next_free) = match build_nodes(&fragments, 1, 2, 64) {
            Ok(built) => built,
            Err(e) => panic!("build failed: {}", e),
        };

        // Root plus one brick
        assert_eq!(next_free, 9);
        assert_eq!(nodes.len(), 9);

        // Root points at the brick and had its flag cleared
        assert!(!nodes[0].flagged());
        assert_eq!(nodes[0].next(), 1);

        // Octants 0 and 7 are occupied leaves
        assert!(nodes[1].flagged());
        assert!(nodes[8].flagged());
        for address in 2..8 {
            assert_eq!(nodes[address], OctreeNode::NULL);
        }
    }

    #[test]
    fn test_build_two_levels() {
        let fragments = [
            VoxelFragment::new(0, 0, 0, 0),
            VoxelFragment::new(3, 3, 3, 0),
        ];
        let (nodes, next_free) = match build_nodes(&fragments, 2, 4, 64) {
            Ok(built) => built,
            Err(e) => panic!("build failed: {}", e),
        };

        // Root brick plus one brick per occupied level-1 node
        assert_eq!(next_free, 25);

        // Root's brick: octants 0 and 7 subdivided, scan order fixes their bricks
        assert_eq!(nodes[0].next(), 1);
        assert_eq!(nodes[1].next(), 9);
        assert_eq!(nodes[8].next(), 17);

        // Leaves sit at the near and far corners of their bricks
        assert!(nodes[9].flagged());
        assert!(nodes[24].flagged());
        assert!(!nodes[10].flagged());
    }

    #[test]
    fn test_build_shared_path() {
        // Two fragments in the same octant share the level-1 node
        let fragments = [
            VoxelFragment::new(0, 0, 0, 0),
            VoxelFragment::new(1, 1, 1, 0),
        ];
        let (nodes, next_free) = match build_nodes(&fragments, 2, 4, 64) {
            Ok(built) => built,
            Err(e) => panic!("build failed: {}", e),
        };

        assert_eq!(next_free, 17);
        assert_eq!(nodes[0].next(), 1);
        assert_eq!(nodes[1].next(), 9);
        assert!(nodes[9].flagged());
        assert!(nodes[16].flagged());
    }

    #[test]
    fn test_build_overflow() {
        let fragments = [VoxelFragment::new(0, 0, 0, 0)];
        let result = build_nodes(&fragments, 3, 8, 16);
        match result {
            Err(ProbeError::NodePoolOverflow { needed, capacity }) => {
                assert!(needed > capacity);
                assert_eq!(capacity, 16);
            }
            other => panic!("expected overflow, got {:?}", other.map(|(_, n)| n)),
        }
    }

    #[test]
    fn test_build_rejects_out_of_grid() {
        let fragments = [VoxelFragment::new(8, 0, 0, 0)];
        match build_nodes(&fragments, 3, 8, 64) {
            Err(ProbeError::FragmentOutOfGrid { index, resolution }) => {
                assert_eq!(index, 0);
                assert_eq!(resolution, 8);
            }
            other => panic!("expected rejection, got {:?}", other.map(|(_, n)| n)),
        }
    }

    #[test]
    fn test_next_free_counts_whole_bricks() {
        let fragments = [VoxelFragment::new(0, 0, 0, 0)];
        let (_, next_free) = match build_nodes(&fragments, 3, 8, 64) {
            Ok(built) => built,
            Err(e) => panic!("build failed: {}", e),
        };
        // One brick per level
        assert_eq!(next_free, 1 + 3 * 8);
    }
}
