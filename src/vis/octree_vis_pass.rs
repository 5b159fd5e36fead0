//! Octree raycast visualization pass.
//!
//! Draws the node pool as a fullscreen raycast: one triangle covering the
//! target, with the fragment stage marching rays through the voxel grid.
//! Depth testing stays off so the visualization draws over whatever the
//! host renderer produced.

use super::raycast_camera::RaycastCameraUniform;
use crate::octree::NodePoolData;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};

/// GPU resources of the visualization pass
pub struct OctreeVisPassData {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    pub camera_buffer: wgpu::Buffer,
}

/// Create the visualization pipeline targeting `target_format`
pub fn create_octree_vis_pass(
    device: &Device,
    target_format: TextureFormat,
    pool: &NodePoolData,
) -> OctreeVisPassData {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Octree Vis Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/octree_vis.wgsl").into()),
    });

    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Octree Vis Camera"),
        size: std::mem::size_of::<RaycastCameraUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Octree Vis Layout"),
        entries: &[
            // Camera and grid uniforms
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Node pool
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Octree Vis Bind Group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: pool.node_buffer.as_entire_binding(),
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Octree Vis Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Octree Vis Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[],
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
    });

    log::info!("[OctreeVisPass] Pipeline created for {:?}", target_format);

    OctreeVisPassData {
        pipeline,
        bind_group_layout,
        bind_group,
        camera_buffer,
    }
}

/// Upload the camera uniform for the next frame
pub fn update_camera(data: &OctreeVisPassData, queue: &Queue, uniform: &RaycastCameraUniform) {
    queue.write_buffer(&data.camera_buffer, 0, bytemuck::bytes_of(uniform));
}

/// Encode the fullscreen raycast draw into `target`
pub fn record_octree_vis_pass(
    data: &OctreeVisPassData,
    encoder: &mut CommandEncoder,
    target: &TextureView,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Octree Vis Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    render_pass.set_pipeline(&data.pipeline);
    render_pass.set_bind_group(0, &data.bind_group, &[]);
    render_pass.draw(0..3, 0..1);
}
