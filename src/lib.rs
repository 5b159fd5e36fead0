//! svo-probe: GPU sparse voxel octree visualization and introspection.
//!
//! Owns the octree node pool and voxel fragment list of a voxel cone
//! tracing style renderer, draws a raycast visualization of the octree,
//! and maps the buffers back to the host to print atomic counters,
//! fragment lists, indirect draw commands and node contents.

pub mod constants;
pub mod error;
pub mod inspect;
pub mod octree;
pub mod readback;
pub mod vis;

use anyhow::Result;

pub use error::{ProbeError, ProbeResult};
pub use inspect::{log_dump, run_debug_dumps, DumpConfig};
pub use octree::node_pool_operations;
pub use octree::{
    DrawCommand, FragmentListData, NodePoolData, NodePoolStats, OctreeNode, VoxelFragment,
};
pub use readback::{create_staging, read_pod, read_pod_slice, read_u32, ReadbackStaging};
pub use vis::{
    create_octree_vis_pass, record_octree_vis_pass, update_camera, OctreeVisPassData,
    RaycastCameraUniform,
};

// Re-export wgpu so hosts can bind the probe's buffers without a version skew
pub use wgpu;

/// Probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Voxel grid resolution, a power of two up to 1024
    pub grid_resolution: u32,
    /// Node pool capacity in nodes
    pub node_capacity: u32,
    /// Fragment list capacity in entries
    pub fragment_capacity: u32,
    /// Diagnostic dumps to run with the pass
    pub dumps: DumpConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            grid_resolution: constants::grid::DEFAULT_GRID_RESOLUTION,
            node_capacity: constants::grid::DEFAULT_NODE_CAPACITY,
            fragment_capacity: constants::grid::DEFAULT_FRAGMENT_CAPACITY,
            dumps: DumpConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.grid_resolution.is_power_of_two() {
            return Err(anyhow::anyhow!(
                "ProbeConfig: grid_resolution {} must be a power of two",
                self.grid_resolution
            ));
        }

        if self.grid_resolution < 2 || self.grid_resolution > constants::grid::MAX_GRID_RESOLUTION {
            return Err(anyhow::anyhow!(
                "ProbeConfig: grid_resolution {} outside supported range 2..={}",
                self.grid_resolution,
                constants::grid::MAX_GRID_RESOLUTION
            ));
        }

        if self.node_capacity == 0 {
            return Err(anyhow::anyhow!("ProbeConfig: node_capacity cannot be 0"));
        }

        // Child pointers are 30-bit addresses
        if self.node_capacity - 1 > constants::node::NODE_MASK_NEXT {
            return Err(anyhow::anyhow!(
                "ProbeConfig: node_capacity {} exceeds the 30-bit node address space",
                self.node_capacity
            ));
        }

        let node_bytes = self.node_capacity as u64 * std::mem::size_of::<OctreeNode>() as u64;
        if node_bytes > constants::gpu_limits::MAX_BUFFER_BINDING_SIZE {
            return Err(anyhow::anyhow!(
                "ProbeConfig: node pool of {} MB exceeds GPU binding limit of {} MB",
                node_bytes / (1024 * 1024),
                constants::gpu_limits::MAX_BUFFER_BINDING_SIZE / (1024 * 1024)
            ));
        }

        if self.fragment_capacity == 0 {
            return Err(anyhow::anyhow!(
                "ProbeConfig: fragment_capacity cannot be 0"
            ));
        }

        let fragment_bytes =
            self.fragment_capacity as u64 * std::mem::size_of::<VoxelFragment>() as u64;
        if fragment_bytes > constants::gpu_limits::MAX_BUFFER_BINDING_SIZE {
            return Err(anyhow::anyhow!(
                "ProbeConfig: fragment list of {} MB exceeds GPU binding limit of {} MB",
                fragment_bytes / (1024 * 1024),
                constants::gpu_limits::MAX_BUFFER_BINDING_SIZE / (1024 * 1024)
            ));
        }

        log::info!(
            "[ProbeConfig] Validated: grid {}^3 ({} levels), {} node capacity ({} KB), {} fragment capacity",
            self.grid_resolution,
            self.levels(),
            self.node_capacity,
            node_bytes / 1024,
            self.fragment_capacity
        );
        Ok(())
    }

    /// Number of octree subdivision levels for the configured resolution
    pub fn levels(&self) -> u32 {
        self.grid_resolution.trailing_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ProbeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.levels(), 7);
    }

    #[test]
    fn test_rejects_non_power_of_two_grid() {
        let config = ProbeConfig {
            grid_resolution: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let config = ProbeConfig {
            grid_resolution: 2048,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_capacities() {
        let config = ProbeConfig {
            node_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ProbeConfig {
            fragment_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_node_capacity_beyond_address_space() {
        let config = ProbeConfig {
            node_capacity: constants::node::NODE_MASK_NEXT + 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
