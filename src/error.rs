//! Error handling for the octree probe.
//!
//! A single error type covers every fallible probe operation so callers can
//! propagate readback and build failures with `?` instead of panicking.

use std::error::Error as StdError;
use std::fmt;

/// Main error type for svo-probe
#[derive(Debug)]
pub enum ProbeError {
    // Readback errors
    BufferMapFailed {
        label: String,
    },
    ChannelClosed {
        label: String,
    },
    ReadbackTooLarge {
        requested: u64,
        staging: u64,
    },
    ReadbackOutOfBounds {
        offset: u64,
        size: u64,
        buffer: u64,
    },

    // Octree build errors
    NodePoolOverflow {
        needed: u32,
        capacity: u32,
    },
    FragmentOutOfGrid {
        index: usize,
        resolution: u32,
    },
    CapacityExceeded {
        requested: u32,
        capacity: u32,
    },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::BufferMapFailed { label } => {
                write!(f, "Buffer mapping failed for {}", label)
            }
            ProbeError::ChannelClosed { label } => {
                write!(f, "Readback channel closed for {}", label)
            }
            ProbeError::ReadbackTooLarge { requested, staging } => write!(
                f,
                "Readback of {} bytes exceeds staging buffer size {}",
                requested, staging
            ),
            ProbeError::ReadbackOutOfBounds {
                offset,
                size,
                buffer,
            } => write!(
                f,
                "Readback range {}..{} out of bounds for buffer of {} bytes",
                offset,
                offset + size,
                buffer
            ),

            ProbeError::NodePoolOverflow { needed, capacity } => write!(
                f,
                "Node pool overflow: build needs {} nodes, capacity is {}",
                needed, capacity
            ),
            ProbeError::FragmentOutOfGrid { index, resolution } => write!(
                f,
                "Fragment {} lies outside the {}^3 voxel grid",
                index, resolution
            ),
            ProbeError::CapacityExceeded {
                requested,
                capacity,
            } => write!(
                f,
                "Fragment upload of {} entries exceeds capacity {}",
                requested, capacity
            ),
        }
    }
}

impl StdError for ProbeError {}

/// Type alias for Results in svo-probe
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProbeError::NodePoolOverflow {
            needed: 4104,
            capacity: 4096,
        };
        assert_eq!(
            err.to_string(),
            "Node pool overflow: build needs 4104 nodes, capacity is 4096"
        );
    }

    #[test]
    fn test_readback_range_display() {
        let err = ProbeError::ReadbackOutOfBounds {
            offset: 16,
            size: 32,
            buffer: 40,
        };
        assert_eq!(
            err.to_string(),
            "Readback range 16..48 out of bounds for buffer of 40 bytes"
        );
    }
}
