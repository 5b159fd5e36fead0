//! Headless octree probe demo.
//!
//! Builds a small octree from a diagonal run of voxel fragments, runs
//! every diagnostic dump, and encodes one visualization frame into an
//! offscreen target. Run with RUST_LOG=info to see the dumps.

use anyhow::{Context, Result};
use cgmath::{Matrix4, Point3, Vector3};
use svo_probe::{node_pool_operations, wgpu, DumpConfig, ProbeConfig, RaycastCameraUniform, VoxelFragment};

fn main() -> Result<()> {
    env_logger::init();

    let (device, queue) = pollster::block_on(create_device())?;

    let config = ProbeConfig {
        grid_resolution: 16,
        node_capacity: 4096,
        fragment_capacity: 1024,
        dumps: DumpConfig {
            fragment_count: true,
            fragment_list: true,
            node_pool: true,
            octree_levels: true,
            ..Default::default()
        },
    };
    config.validate()?;

    let fragments: Vec<VoxelFragment> = (0..16)
        .map(|i| VoxelFragment::new(i, i, i, 0xFF40C0FF))
        .collect();

    let mut pool =
        node_pool_operations::create_node_pool(&device, config.grid_resolution, config.node_capacity);
    let mut list = node_pool_operations::create_fragment_list(&device, config.fragment_capacity);
    node_pool_operations::upload_fragments(&mut list, &queue, &fragments)?;
    node_pool_operations::build_from_fragments(&mut pool, &queue, &fragments)?;

    let staging = svo_probe::create_staging(
        &device,
        pool.node_capacity as u64 * std::mem::size_of::<u32>() as u64,
    );
    svo_probe::run_debug_dumps(&device, &queue, &staging, &pool, &list, &config.dumps)?;

    // One visualization frame into an offscreen target
    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Probe Target"),
        size: wgpu::Extent3d {
            width: 640,
            height: 360,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let pass = svo_probe::create_octree_vis_pass(&device, wgpu::TextureFormat::Rgba8Unorm, &pool);

    let view = Matrix4::look_at_rh(
        Point3::new(2.5, 2.0, 2.5),
        Point3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
    );
    let uniform = RaycastCameraUniform::from_matrices(
        &view,
        &Matrix4::from_scale(1.0),
        640.0 / 360.0,
        60.0,
        100.0,
        config.grid_resolution,
        config.levels(),
    );
    svo_probe::update_camera(&pass, &queue, &uniform);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Probe Frame"),
    });
    svo_probe::record_octree_vis_pass(&pass, &mut encoder, &target_view);
    queue.submit(std::iter::once(encoder.finish()));
    device.poll(wgpu::Maintain::Wait);

    let stats = node_pool_operations::node_pool_stats(&pool);
    log::info!("[Demo] Octree stats: {:?}", stats);
    Ok(())
}

async fn create_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .context("no GPU adapter available")?;
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Probe Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        )
        .await
        .context("failed to create GPU device")?;
    Ok((device, queue))
}
