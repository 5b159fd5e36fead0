//! Blocking GPU→CPU buffer introspection.
//!
//! Diagnostic dumps copy GPU state into a `MAP_READ` staging buffer, block
//! until the mapping completes, and hand back host copies. Readback is
//! synchronous: the probe runs on one thread and waits on the device.

use crate::error::{ProbeError, ProbeResult};
use bytemuck::Pod;
use wgpu::{Buffer, Device, Queue};

/// Reusable staging buffer for mapping GPU data back to the host
pub struct ReadbackStaging {
    pub buffer: Buffer,
    pub size: u64,
}

/// Create a staging buffer able to hold `size` bytes
pub fn create_staging(device: &Device, size: u64) -> ReadbackStaging {
    log::debug!("[Readback] Creating staging buffer ({} bytes)", size);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Probe Readback Staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    ReadbackStaging { buffer, size }
}

/// Copy `size` bytes out of `source` and block until the host can read them
fn copy_and_map(
    device: &Device,
    queue: &Queue,
    staging: &ReadbackStaging,
    source: &Buffer,
    offset: u64,
    size: u64,
    label: &str,
) -> ProbeResult<Vec<u8>> {
    if size > staging.size {
        return Err(ProbeError::ReadbackTooLarge {
            requested: size,
            staging: staging.size,
        });
    }
    if offset + size > source.size() {
        return Err(ProbeError::ReadbackOutOfBounds {
            offset,
            size,
            buffer: source.size(),
        });
    }

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Probe Readback"),
    });
    encoder.copy_buffer_to_buffer(source, offset, &staging.buffer, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = staging.buffer.slice(..size);
    let (sender, receiver) = flume::bounded(1);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    device.poll(wgpu::Maintain::Wait);
    receiver
        .recv()
        .map_err(|_| ProbeError::ChannelClosed {
            label: label.to_string(),
        })?
        .map_err(|_| ProbeError::BufferMapFailed {
            label: label.to_string(),
        })?;

    let mapped = buffer_slice.get_mapped_range();
    let bytes = mapped.to_vec();
    drop(mapped);
    staging.buffer.unmap();

    log::debug!("[Readback] {}: {} bytes mapped", label, size);
    Ok(bytes)
}

/// Read a single Pod record from the start of `source`
pub fn read_pod<T: Pod>(
    device: &Device,
    queue: &Queue,
    staging: &ReadbackStaging,
    source: &Buffer,
    label: &str,
) -> ProbeResult<T> {
    let size = std::mem::size_of::<T>() as u64;
    let bytes = copy_and_map(device, queue, staging, source, 0, size, label)?;
    Ok(*bytemuck::from_bytes::<T>(&bytes))
}

/// Read a counter word
pub fn read_u32(
    device: &Device,
    queue: &Queue,
    staging: &ReadbackStaging,
    source: &Buffer,
    label: &str,
) -> ProbeResult<u32> {
    read_pod::<u32>(device, queue, staging, source, label)
}

/// Read `count` Pod records starting `offset` bytes into `source`
pub fn read_pod_slice<T: Pod>(
    device: &Device,
    queue: &Queue,
    staging: &ReadbackStaging,
    source: &Buffer,
    offset: u64,
    count: usize,
    label: &str,
) -> ProbeResult<Vec<T>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let size = (count * std::mem::size_of::<T>()) as u64;
    let bytes = copy_and_map(device, queue, staging, source, offset, size, label)?;
    Ok(bytemuck::cast_slice(&bytes).to_vec())
}
