//! Diagnostic dumps of the octree's GPU buffers.
//!
//! `run_debug_dumps` is the pass's introspection hook: it maps whichever
//! buffers `DumpConfig` enables back to the host and prints their decoded
//! contents through the log facade.

pub mod octree_dump;

pub use octree_dump::{
    dump_draw_command, dump_fragment_count, dump_fragment_positions, dump_next_free,
    dump_node_pool, dump_octree_levels,
};

use crate::error::ProbeResult;
use crate::octree::{DrawCommand, FragmentListData, NodePoolData, OctreeNode, VoxelFragment};
use crate::readback::{self, ReadbackStaging};
use wgpu::{Device, Queue};

/// Which diagnostic dumps run alongside the visualization pass
#[derive(Debug, Clone)]
pub struct DumpConfig {
    pub next_free_counter: bool,
    pub fragment_count: bool,
    pub fragment_list: bool,
    pub indirect_command: bool,
    pub node_pool: bool,
    pub octree_levels: bool,
    /// Linear node-pool dumps stop after this many entries
    pub max_printed_nodes: usize,
}

impl Default for DumpConfig {
    fn default() -> Self {
        // Only the counter and indirect-command dumps are cheap enough to
        // leave on every frame
        Self {
            next_free_counter: true,
            fragment_count: false,
            fragment_list: false,
            indirect_command: true,
            node_pool: false,
            octree_levels: false,
            max_printed_nodes: crate::constants::dump::DEFAULT_MAX_PRINTED_NODES,
        }
    }
}

/// Feed a multi-line dump through the log facade
pub fn log_dump(text: &str) {
    for line in text.lines() {
        log::info!("[OctreeProbe] {}", line);
    }
}

/// Read back and log every dump enabled in `config`
pub fn run_debug_dumps(
    device: &Device,
    queue: &Queue,
    staging: &ReadbackStaging,
    pool: &NodePoolData,
    fragments: &FragmentListData,
    config: &DumpConfig,
) -> ProbeResult<()> {
    if config.next_free_counter {
        let value = readback::read_u32(
            device,
            queue,
            staging,
            &pool.next_free_buffer,
            "next free counter",
        )?;
        log_dump(&dump_next_free(value));
    }

    if config.fragment_count {
        let value = readback::read_u32(
            device,
            queue,
            staging,
            &fragments.count_buffer,
            "fragment count",
        )?;
        log_dump(&dump_fragment_count(value));
    }

    if config.indirect_command {
        let command: DrawCommand = readback::read_pod(
            device,
            queue,
            staging,
            &fragments.indirect_buffer,
            "indirect command",
        )?;
        log_dump(&dump_draw_command(&command));
    }

    if config.fragment_list {
        let list: Vec<VoxelFragment> = readback::read_pod_slice(
            device,
            queue,
            staging,
            &fragments.fragment_buffer,
            0,
            fragments.fragment_count as usize,
            "fragment list",
        )?;
        log_dump(&dump_fragment_positions(&list));
    }

    if config.node_pool || config.octree_levels {
        let nodes: Vec<OctreeNode> = readback::read_pod_slice(
            device,
            queue,
            staging,
            &pool.node_buffer,
            0,
            pool.allocated_nodes.max(1) as usize,
            "node pool",
        )?;
        if config.node_pool {
            log_dump(&dump_node_pool(&nodes, config.max_printed_nodes));
        }
        if config.octree_levels {
            log_dump(&dump_octree_levels(&nodes, pool.levels));
        }
    }

    Ok(())
}
