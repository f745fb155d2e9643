use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use framepipe_buffers::{BufferAccess, BufferPool};
use framepipe_common::{Guid, Viewport};
use framepipe_mesh::{MeshBuilder, ResourceContext, UiRect, VertexType};
use framepipe_render::{
    ApplyStats, DebugTextRenderer, FrameConfig, FrameReport, MatrixType, RenderBackendService,
    RenderScene, RenderThread, Renderer,
};
use framepipe_render_wgpu::WgpuRenderer;
use framepipe_uniform::{UniformBuffer, UniformVar, VarReader};
use glam::{Mat4, Vec3, Vec4};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "framepipe-cli", about = "CLI tool for the frame pipeline")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML frame config; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info and the effective frame config
    Info,
    /// Run frames through the render thread with the text renderer
    Demo {
        /// Number of frames to commit
        #[arg(short, long, default_value = "3")]
        frames: u32,
        /// Print per-frame stats as JSON lines instead of the scene dump
        #[arg(long)]
        json: bool,
    },
    /// Build a text box mesh and describe it
    Text {
        text: String,
        /// Glyph cell size in pixels
        #[arg(short, long, default_value = "16")]
        size: f32,
    },
    /// Encode sample uniforms and decode them again
    Uniforms {
        /// Matrices in the sample matrix array
        #[arg(short, long, default_value = "4")]
        bones: usize,
    },
    /// Run frames through the render thread on a headless GPU
    Headless {
        #[arg(short, long, default_value = "3")]
        frames: u32,
        #[arg(long, default_value = "320")]
        width: u32,
        #[arg(long, default_value = "240")]
        height: u32,
    },
}

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = match &cli.config {
        Some(path) => FrameConfig::load(path)
            .with_context(|| format!("loading frame config {}", path.display()))?,
        None => FrameConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("framepipe-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", framepipe_common::crate_info());
            println!("buffers: {}", framepipe_buffers::crate_info());
            println!("uniform: {}", framepipe_uniform::crate_info());
            println!("mesh: {}", framepipe_mesh::crate_info());
            println!("render: {}", framepipe_render::crate_info());
            println!("config: {}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Demo { frames, json } => {
            let mut last = String::new();
            let scene = run_frames(&config, DebugTextRenderer::new(), frames, WIDTH, HEIGHT, |applied, output| {
                if json {
                    println!("{}", serde_json::to_string(&applied)?);
                }
                last = output;
                Ok(())
            })?;
            if !json {
                print!("{last}");
            }
            println!(
                "Applied {} frames: passes={}, batches={}, meshes={}",
                scene.frames_applied(),
                scene.passes().len(),
                scene.num_batches(),
                scene.num_meshes()
            );
        }
        Commands::Text { text, size } => {
            let mut ctx = context_for(&config);
            let mesh = MeshBuilder::new(&mut ctx)
                .alloc_text_box(0.0, 0.0, size, &text, BufferAccess::ReadWrite)?
                .finish()
                .context("text is empty")?;
            let groups: Vec<_> = mesh
                .primitive_groups()
                .iter()
                .map(|g| {
                    serde_json::json!({
                        "primitive": g.primitive(),
                        "index_type": g.index_type(),
                        "start": g.start_index(),
                        "count": g.num_indices(),
                    })
                })
                .collect();
            let summary = serde_json::json!({
                "guid": mesh.guid().0,
                "glyphs": text.chars().count(),
                "vertices": mesh.num_vertices(),
                "indices": mesh.num_indices(),
                "index_type": mesh.index_type(),
                "material": mesh.material().map(|m| m.name.clone()),
                "groups": groups,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Uniforms { bones } => {
            let mut ub = UniformBuffer::create(config.uniform_buffer_size);
            let vars = [
                UniformVar::float("time", 1.25)?,
                UniformVar::int("frame", 42)?,
                UniformVar::mat4("mvp", Mat4::perspective_rh(1.0, 4.0 / 3.0, 0.1, 100.0))?,
                UniformVar::mat4_array("bones", &vec![Mat4::IDENTITY; bones])?,
            ];
            for var in &vars {
                ub.write_var(var)?;
            }
            println!(
                "Wrote {} vars, {} of {} bytes",
                ub.num_vars(),
                ub.pos(),
                ub.capacity()
            );
            for var in VarReader::new(ub.written()) {
                let var = var?;
                println!("  {:<8} {:>5} bytes", var.name, var.data.len());
            }
            let head: Vec<String> = ub.written().iter().take(32).map(|b| format!("{b:02x}")).collect();
            println!("head: {}", head.join(" "));
        }
        Commands::Headless {
            frames,
            width,
            height,
        } => {
            let renderer = WgpuRenderer::headless(width, height)?;
            println!("adapter: {}", renderer.context().adapter_name());
            run_frames(&config, renderer, frames, width, height, |applied, stats| {
                println!(
                    "{}",
                    serde_json::json!({ "applied": applied, "gpu": stats })
                );
                Ok(())
            })?;
        }
    }

    Ok(())
}

fn context_for(config: &FrameConfig) -> ResourceContext {
    ResourceContext::with_pool(BufferPool::new(
        config.buffer_pool_blocks,
        config.buffer_pool_policy,
    ))
}

/// Records the demo scene, then commits `frames` animated frames to a render
/// thread running `renderer`. Returns the thread's final scene.
fn run_frames<R>(
    config: &FrameConfig,
    renderer: R,
    frames: u32,
    width: u32,
    height: u32,
    mut on_frame: impl FnMut(ApplyStats, R::Output) -> anyhow::Result<()>,
) -> anyhow::Result<RenderScene>
where
    R: Renderer + Send + 'static,
    R::Output: Send + 'static,
{
    let mut ctx = context_for(config);
    let mut svc = RenderBackendService::new(config.clone());
    let label = record_scene(&mut svc, &mut ctx, width, height)?;
    let thread = RenderThread::spawn(renderer, config.frames_in_flight)?;

    let mut finish = |svc: &mut RenderBackendService, report: FrameReport<R::Output>| {
        let FrameReport {
            frame,
            applied,
            output,
        } = report;
        svc.recycle_frame(frame);
        on_frame(applied, output?)
    };

    for i in 0..frames {
        animate(&mut svc, &mut ctx, label, i)?;
        let frame = svc.commit_next_frame()?;
        tracing::debug!(sequence = frame.sequence(), commands = frame.num_cmds(), "submitting frame");
        thread.submit(frame)?;
        if svc.frames_in_flight() >= config.frames_in_flight {
            finish(&mut svc, thread.recv_report()?)?;
        }
    }
    while svc.frames_in_flight() > 0 {
        finish(&mut svc, thread.recv_report()?)?;
    }

    let stats = ctx.buffers.stats();
    tracing::info!(in_use = stats.in_use, high_water = stats.high_water, "buffer pool");
    Ok(thread.shutdown()?)
}

/// A 3D pass with a cube and axis lines, and a HUD pass with a text label
/// over a UI panel. Returns the label's guid.
fn record_scene(
    svc: &mut RenderBackendService,
    ctx: &mut ResourceContext,
    width: u32,
    height: u32,
) -> anyhow::Result<Guid> {
    svc.create_default_3d_pipeline();
    svc.create_default_2d_pipeline();
    let aspect = width as f32 / height.max(1) as f32;

    svc.begin_pass("main")?;
    svc.set_viewport(Viewport::new(0, 0, width as i32, height as i32))?;
    svc.set_pass_camera(
        Mat4::look_at_rh(Vec3::new(2.0, 2.0, 4.0), Vec3::ZERO, Vec3::Y),
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, aspect, 0.1, 100.0),
    )?;

    svc.begin_render_batch("opaque")?;
    let mut cube = MeshBuilder::new(ctx)
        .create_cube(VertexType::ColorVertex, 1.0, 1.0, 1.0, BufferAccess::ReadWrite)?
        .finish()?;
    cube.set_model_matrix(Some(Mat4::from_translation(Vec3::splat(-0.5))));
    svc.add_mesh(cube, 1)?;

    let axes = MeshBuilder::new(ctx)
        .alloc_line_list(
            VertexType::ColorVertex,
            BufferAccess::ReadOnly,
            &[Vec3::ZERO, Vec3::X * 2.0, Vec3::ZERO, Vec3::Y * 2.0, Vec3::ZERO, Vec3::Z * 2.0],
            &[Vec3::X, Vec3::X, Vec3::Y, Vec3::Y, Vec3::Z, Vec3::Z],
            &[0, 1, 2, 3, 4, 5],
        )?
        .finish()?;
    svc.add_mesh(axes, 1)?;
    svc.end_render_batch()?;
    svc.end_pass()?;

    svc.begin_pass("hud")?;
    svc.begin_render_batch("labels")?;
    svc.set_matrix(
        MatrixType::Projection,
        Mat4::orthographic_rh(0.0, width as f32, height as f32, 0.0, -1.0, 1.0),
    )?;
    let panel = MeshBuilder::new(ctx)
        .alloc_ui_quads(
            &[(UiRect::new(4.0, 4.0, 180.0, 24.0), Vec4::new(0.0, 0.0, 0.0, 0.6))],
            BufferAccess::ReadOnly,
        )?
        .finish()?;
    svc.add_mesh(panel, 1)?;
    let label = MeshBuilder::new(ctx)
        .alloc_text_box(8.0, 8.0, 16.0, "frame 0", BufferAccess::ReadWrite)?
        .finish()?;
    let label = svc.add_mesh(label, 1)?;
    svc.end_render_batch()?;
    svc.end_pass()?;
    Ok(label)
}

/// Spins the cube, ticks the clock uniform and rewrites the label.
fn animate(
    svc: &mut RenderBackendService,
    ctx: &mut ResourceContext,
    label: Guid,
    frame: u32,
) -> anyhow::Result<()> {
    svc.begin_pass("main")?;
    svc.begin_render_batch("opaque")?;
    svc.set_matrix(MatrixType::Model, Mat4::from_rotation_y(frame as f32 * 0.1))?;
    svc.set_uniform(UniformVar::float("time", frame as f32 / 60.0)?)?;
    svc.end_render_batch()?;
    svc.end_pass()?;

    if let Some(mesh) = svc.mesh_mut(label) {
        MeshBuilder::new(ctx).update_text_box(mesh, 16.0, &format!("frame {frame}"))?;
    }
    svc.update_mesh(label)?;
    Ok(())
}
