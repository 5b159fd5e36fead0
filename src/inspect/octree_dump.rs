//! Formatting for octree buffer dumps.
//!
//! Every formatter is a pure function returning the dump text;
//! `inspect::log_dump` feeds it to the console.

use crate::constants::node::{CHILDREN_PER_BRICK, NULL_ADDRESS};
use crate::octree::{DrawCommand, OctreeNode, VoxelFragment};
use std::fmt::Write;

/// Marker emitted when a brick lies beyond the decoded slice. Readback may
/// cover only a prefix of the pool, so this is reported, not an error.
const TRUNCATED: &str = "<truncated>  ";

pub fn dump_next_free(value: u32) -> String {
    format!("Next free node-pool address: {}", value)
}

pub fn dump_fragment_count(value: u32) -> String {
    format!("Number of voxels: {}", value)
}

pub fn dump_fragment_positions(fragments: &[VoxelFragment]) -> String {
    let mut out = format!(
        "Voxel fragment list position contents ({} voxels):\n",
        fragments.len()
    );
    for fragment in fragments {
        let _ = writeln!(
            out,
            "{:>10}  ({}, {}, {})",
            fragment.position,
            fragment.x(),
            fragment.y(),
            fragment.z()
        );
    }
    out
}

pub fn dump_draw_command(command: &DrawCommand) -> String {
    format!(
        "Fragment list indirect draw command: {} {} {} {}",
        command.vertex_count, command.instance_count, command.first_vertex, command.first_instance
    )
}

/// Linear dump of the first `max_entries` node-pool entries
pub fn dump_node_pool(nodes: &[OctreeNode], max_entries: usize) -> String {
    let shown = nodes.len().min(max_entries);
    let mut out = String::from("Node pool contents:\n");
    for (address, node) in nodes.iter().take(shown).enumerate() {
        let _ = writeln!(
            out,
            "{:>6}  ({} | {})",
            address,
            node.flagged() as u32,
            node.next()
        );
    }
    if shown < nodes.len() {
        let _ = writeln!(out, "... {} more nodes", nodes.len() - shown);
    }
    out
}

/// One `flag|next` cell, the first cell of a brick prefixed with its address
fn write_node(out: &mut String, address: u32, node: OctreeNode, with_address: bool) {
    if with_address {
        let _ = write!(out, "{}: {}|{}  ", address, node.flagged() as u32, node.next());
    } else {
        let _ = write!(out, "{}|{}  ", node.flagged() as u32, node.next());
    }
}

/// Fixed-depth recursive descent printing every node row at `target_level`
///
/// Child addresses are recovered by masking the parent's next pointer;
/// a zero pointer terminates the branch.
fn traverse_level(
    out: &mut String,
    nodes: &[OctreeNode],
    parent: u32,
    level: u32,
    target_level: u32,
) {
    let parent_node = match nodes.get(parent as usize) {
        Some(node) => *node,
        None => {
            out.push_str(TRUNCATED);
            return;
        }
    };

    if parent == 0 && level == target_level {
        write_node(out, 0, parent_node, true);
        return;
    }

    let next = parent_node.next();
    if next == NULL_ADDRESS {
        return;
    }

    for child in 0..CHILDREN_PER_BRICK {
        let address = next + child;
        if level + 1 == target_level {
            match nodes.get(address as usize) {
                Some(node) => write_node(out, address, *node, child == 0),
                None => out.push_str(TRUNCATED),
            }
        } else {
            traverse_level(out, nodes, address, level + 1, target_level);
        }
    }

    // Gap between sibling bricks
    if level + 1 == target_level {
        out.push('\t');
    }
}

/// Level-by-level dump: one row of `flag|next` cells per octree depth,
/// from the root (depth 0) down to the leaves (depth `levels`)
pub fn dump_octree_levels(nodes: &[OctreeNode], levels: u32) -> String {
    let mut out = String::from("Node pool by level:\n");
    for target_level in 0..=levels {
        let mut row = String::new();
        traverse_level(&mut row, nodes, 0, 0, target_level);
        let row = row.trim_end();
        if row.is_empty() {
            let _ = writeln!(out, "L{}:", target_level);
        } else {
            let _ = writeln!(out, "L{}: {}", target_level, row);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octree::node_pool_operations::build_nodes;

    fn built(fragments: &[VoxelFragment], levels: u32, resolution: u32) -> Vec<OctreeNode> {
        match build_nodes(fragments, levels, resolution, 1024) {
            Ok((nodes, _)) => nodes,
            Err(e) => panic!("build failed: {}", e),
        }
    }

    #[test]
    fn test_counter_dumps() {
        assert_eq!(dump_next_free(9), "Next free node-pool address: 9");
        assert_eq!(dump_fragment_count(2), "Number of voxels: 2");
    }

    #[test]
    fn test_draw_command_dump() {
        let command = DrawCommand {
            vertex_count: 7,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        };
        assert_eq!(
            dump_draw_command(&command),
            "Fragment list indirect draw command: 7 1 0 0"
        );
    }

    #[test]
    fn test_fragment_positions_dump() {
        let fragments = [VoxelFragment::new(1, 2, 3, 0)];
        let out = dump_fragment_positions(&fragments);
        assert!(out.starts_with("Voxel fragment list position contents (1 voxels):"));
        assert!(out.contains("(1, 2, 3)"));
    }

    #[test]
    fn test_linear_dump() {
        let nodes = [OctreeNode::new(false, 1), OctreeNode::new(true, 0)];
        let out = dump_node_pool(&nodes, 100);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Node pool contents:");
        assert_eq!(lines[1], "     0  (0 | 1)");
        assert_eq!(lines[2], "     1  (1 | 0)");
    }

    #[test]
    fn test_linear_dump_truncates() {
        let nodes = vec![OctreeNode::NULL; 10];
        let out = dump_node_pool(&nodes, 4);
        assert!(out.contains("... 6 more nodes"));
        assert_eq!(out.lines().count(), 6);
    }

    #[test]
    fn test_level_dump_empty_pool() {
        // Root only: every row is just the root cell or empty
        let nodes = [OctreeNode::NULL];
        let out = dump_octree_levels(&nodes, 2);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "L0: 0: 0|0");
        assert_eq!(lines[2], "L1:");
        assert_eq!(lines[3], "L2:");
    }

    #[test]
    fn test_level_dump_single_level() {
        let nodes = built(
            &[VoxelFragment::new(0, 0, 0, 0), VoxelFragment::new(1, 1, 1, 0)],
            1,
            2,
        );
        let out = dump_octree_levels(&nodes, 1);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "L0: 0: 0|1");
        assert_eq!(lines[2], "L1: 1: 1|0  0|0  0|0  0|0  0|0  0|0  0|0  1|0");
    }

    #[test]
    fn test_level_dump_brick_addresses() {
        let nodes = built(
            &[VoxelFragment::new(0, 0, 0, 0), VoxelFragment::new(3, 3, 3, 0)],
            2,
            4,
        );
        let out = dump_octree_levels(&nodes, 2);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[1], "L0: 0: 0|1");
        // The two subdivided level-1 nodes carry their brick pointers
        assert_eq!(lines[2], "L1: 1: 0|9  0|0  0|0  0|0  0|0  0|0  0|0  0|17");
        // Leaf row: one brick per subdivided parent, tab-separated
        assert!(lines[3].starts_with("L2: 9: 1|0  "));
        assert!(lines[3].contains("\t17: 0|0  "));
        assert!(lines[3].ends_with("1|0"));
    }

    #[test]
    fn test_level_dump_truncated_brick() {
        // A node pointing past the decoded slice reports truncation
        let nodes = [OctreeNode::new(false, 4)];
        let out = dump_octree_levels(&nodes, 1);
        assert!(out.contains("<truncated>"));
    }
}
