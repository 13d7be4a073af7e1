//! WebGPU tilemap renderer.
//!
//! One storage of per-cell bytes, three textures, one draw call:
//!
//! - **tilemap** (`Rgba8Uint`, cols × rows): each texel is one screen cell,
//!   `(tile_x, tile_y, color_lo, color_hi)` — uploaded in full whenever the
//!   screen is dirty (the tilemap is tens of KB; partial updates are not
//!   worth the bookkeeping).
//! - **glyph atlas** (`R8Unorm`): built by `glyph_atlas`, rebuilt on resize.
//! - **palette** (`Rgba8Unorm`, 256 × 256): the constant 5/6/5 color
//!   expansion table, built once at init.
//!
//! Each frame draws a single full-screen quad; the fragment stage does the
//! cell addressing, atlas lookup, and palette colorization per pixel, and
//! discards pixels of blank cells.

use std::fmt;

/// Size of the uniform buffer in bytes (vec4<f32> + vec4<u32> = 32 bytes).
#[cfg(any(target_arch = "wasm32", test))]
const UNIFORM_BYTES: usize = 32;

/// Renderer initialization or frame errors.
///
/// All of these are unrecoverable for the session: the wasm surface reports
/// them to the console and stops rendering; there is no fallback pipeline.
#[derive(Debug, Clone)]
pub enum RendererError {
    /// WebGPU adapter not available.
    NoAdapter,
    /// Device request failed.
    DeviceError(String),
    /// Surface configuration or presentation failed.
    SurfaceError(String),
}

impl fmt::Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "WebGPU adapter not available"),
            Self::DeviceError(msg) => write!(f, "WebGPU device error: {msg}"),
            Self::SurfaceError(msg) => write!(f, "WebGPU surface error: {msg}"),
        }
    }
}

impl std::error::Error for RendererError {}

// ---------------------------------------------------------------------------
// WGSL shader (inline)
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
const TILEMAP_SHADER_WGSL: &str = r#"
struct Uniforms {
    // (viewport_width, viewport_height, tile_width, tile_height) in device px
    viewport: vec4<f32>,
    // (cols, rows, 0, 0)
    grid: vec4<u32>,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var tilemap: texture_2d<u32>;
@group(0) @binding(2) var glyph_atlas: texture_2d<f32>;
@group(0) @binding(3) var palette: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    // One full-screen quad, 2 triangles. Fragment positions have their origin
    // at the top-left, which matches row 0 at the top of the grid.
    var quad = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
    );
    var out: VertexOutput;
    out.position = vec4<f32>(quad[vertex_index], 0.0, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let tile = uniforms.viewport.zw;
    let cell = min(
        vec2<u32>(in.position.xy / tile),
        uniforms.grid.xy - vec2<u32>(1u, 1u),
    );

    let t = textureLoad(tilemap, cell, 0);
    if (t.x == 0u && t.y == 0u) {
        // Blank cell: let the canvas background through.
        discard;
    }

    let origin = vec2<f32>(f32(t.x), f32(t.y)) * tile;
    let offset = in.position.xy - vec2<f32>(cell) * tile;
    let ink = textureLoad(glyph_atlas, vec2<u32>(origin + offset), 0).r;
    if (ink <= 0.0) {
        discard;
    }

    let color_index = t.z | (t.w << 8u);
    let rgba = textureLoad(
        palette,
        vec2<u32>(color_index & 0xFFu, color_index >> 8u),
        0,
    );
    return vec4<f32>(rgba.rgb, ink);
}
"#;

// ---------------------------------------------------------------------------
// WebGPU implementation (wasm32 only)
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
mod gpu {
    use super::*;
    use crate::glyph_atlas::GlyphAtlas;
    use tracegrid_core::color::{PALETTE_DIM, palette_texture_bytes};
    use tracegrid_core::screen::CELL_BYTES;
    use web_sys::HtmlCanvasElement;
    use wgpu;

    /// WebGPU renderer owning all GPU resources for one canvas.
    ///
    /// Resource sizes change in exactly two places: `resize` (surface +
    /// tilemap texture) and `set_atlas` (atlas texture). The palette is
    /// immutable after init.
    pub struct TilemapRenderer {
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
        pipeline: wgpu::RenderPipeline,
        bind_group_layout: wgpu::BindGroupLayout,
        bind_group: wgpu::BindGroup,
        uniform_buffer: wgpu::Buffer,
        tilemap_texture: wgpu::Texture,
        tilemap_view: wgpu::TextureView,
        atlas_texture: wgpu::Texture,
        atlas_view: wgpu::TextureView,
        _palette_texture: wgpu::Texture,
        palette_view: wgpu::TextureView,
        cols: u16,
        rows: u16,
        tile_width: u32,
        tile_height: u32,
    }

    impl TilemapRenderer {
        /// Initialize the renderer on the given canvas.
        pub async fn init(
            canvas: HtmlCanvasElement,
            atlas: &GlyphAtlas,
            cols: u16,
            rows: u16,
        ) -> Result<Self, RendererError> {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::BROWSER_WEBGPU,
                ..Default::default()
            });

            let surface = instance
                .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
                .map_err(|e| RendererError::SurfaceError(e.to_string()))?;

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|_| RendererError::NoAdapter)?;

            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("tracegrid"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                    ..Default::default()
                })
                .await
                .map_err(|e| RendererError::DeviceError(e.to_string()))?;

            let tile_width = atlas.layout().tile_width();
            let tile_height = atlas.layout().tile_height();
            let pixel_width = u32::from(cols) * tile_width;
            let pixel_height = u32::from(rows) * tile_height;

            let surface_caps = surface.get_capabilities(&adapter);
            let format = surface_caps
                .formats
                .first()
                .copied()
                .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

            let surface_config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: pixel_width.max(1),
                height: pixel_height.max(1),
                present_mode: wgpu::PresentMode::Fifo,
                desired_maximum_frame_latency: 2,
                alpha_mode: surface_caps
                    .alpha_modes
                    .first()
                    .copied()
                    .unwrap_or(wgpu::CompositeAlphaMode::Auto),
                view_formats: vec![],
            };
            surface.configure(&device, &surface_config);

            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("tilemap_shader"),
                source: wgpu::ShaderSource::Wgsl(TILEMAP_SHADER_WGSL.into()),
            });

            // Uniform + tilemap (uint) + atlas + palette, all textureLoad-only:
            // no sampler binding anywhere.
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("tilemap_bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Uint,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 3,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                    ],
                });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("tilemap_pl"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("tilemap_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

            let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("uniforms"),
                size: UNIFORM_BYTES as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(
                &uniform_buffer,
                0,
                &uniforms_bytes(
                    pixel_width as f32,
                    pixel_height as f32,
                    tile_width as f32,
                    tile_height as f32,
                    u32::from(cols),
                    u32::from(rows),
                ),
            );

            let (tilemap_texture, tilemap_view) = create_tilemap_texture(&device, cols, rows);

            let (atlas_texture, atlas_view) = create_atlas_texture(&device, &queue, atlas);

            let palette_texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("palette"),
                size: wgpu::Extent3d {
                    width: PALETTE_DIM,
                    height: PALETTE_DIM,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &palette_texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &palette_texture_bytes(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(PALETTE_DIM * 4),
                    rows_per_image: Some(PALETTE_DIM),
                },
                wgpu::Extent3d {
                    width: PALETTE_DIM,
                    height: PALETTE_DIM,
                    depth_or_array_layers: 1,
                },
            );
            let palette_view = palette_texture.create_view(&wgpu::TextureViewDescriptor::default());

            let bind_group = create_bind_group(
                &device,
                &bind_group_layout,
                &uniform_buffer,
                &tilemap_view,
                &atlas_view,
                &palette_view,
            );

            Ok(Self {
                device,
                queue,
                surface,
                surface_config,
                pipeline,
                bind_group_layout,
                bind_group,
                uniform_buffer,
                tilemap_texture,
                tilemap_view,
                atlas_texture,
                atlas_view,
                _palette_texture: palette_texture,
                palette_view,
                cols,
                rows,
                tile_width,
                tile_height,
            })
        }

        /// Resize the grid. Reconfigures the surface, recreates the tilemap
        /// texture, and rewrites the uniforms — the only place grid-sized GPU
        /// state changes.
        pub fn resize(&mut self, cols: u16, rows: u16) {
            if cols == self.cols && rows == self.rows {
                return;
            }
            self.cols = cols;
            self.rows = rows;

            let pixel_w = u32::from(cols) * self.tile_width;
            let pixel_h = u32::from(rows) * self.tile_height;
            self.surface_config.width = pixel_w.max(1);
            self.surface_config.height = pixel_h.max(1);
            self.surface.configure(&self.device, &self.surface_config);

            let (texture, view) = create_tilemap_texture(&self.device, cols, rows);
            self.tilemap_texture = texture;
            self.tilemap_view = view;

            self.queue.write_buffer(
                &self.uniform_buffer,
                0,
                &uniforms_bytes(
                    pixel_w as f32,
                    pixel_h as f32,
                    self.tile_width as f32,
                    self.tile_height as f32,
                    u32::from(cols),
                    u32::from(rows),
                ),
            );

            self.rebuild_bind_group();
        }

        /// Swap in a rebuilt glyph atlas (font size or DPR changed).
        pub fn set_atlas(&mut self, atlas: &GlyphAtlas) {
            self.tile_width = atlas.layout().tile_width();
            self.tile_height = atlas.layout().tile_height();
            let (texture, view) = create_atlas_texture(&self.device, &self.queue, atlas);
            self.atlas_texture = texture;
            self.atlas_view = view;
            self.rebuild_bind_group();
        }

        fn rebuild_bind_group(&mut self) {
            self.bind_group = create_bind_group(
                &self.device,
                &self.bind_group_layout,
                &self.uniform_buffer,
                &self.tilemap_view,
                &self.atlas_view,
                &self.palette_view,
            );
        }

        /// Upload the full tilemap byte array as the tilemap texture.
        ///
        /// Called only when the screen was dirty; `bytes` must be
        /// `cols * rows * 4` long.
        pub fn upload_tilemap(&self, bytes: &[u8]) {
            let expected = usize::from(self.cols) * usize::from(self.rows) * CELL_BYTES;
            if bytes.len() != expected || expected == 0 {
                return;
            }
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.tilemap_texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytes,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(u32::from(self.cols) * CELL_BYTES as u32),
                    rows_per_image: Some(u32::from(self.rows)),
                },
                wgpu::Extent3d {
                    width: u32::from(self.cols),
                    height: u32::from(self.rows),
                    depth_or_array_layers: 1,
                },
            );
        }

        /// Encode and submit one frame: a single 6-vertex quad draw.
        pub fn render_frame(&mut self) -> Result<(), RendererError> {
            let output = self
                .surface
                .get_current_texture()
                .map_err(|e| RendererError::SurfaceError(e.to_string()))?;

            let view = output
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame"),
                });

            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("tilemap_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });

                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.draw(0..6, 0..1);
            }

            self.queue.submit(std::iter::once(encoder.finish()));
            output.present();
            Ok(())
        }

        /// Current grid dimensions.
        #[must_use]
        pub fn grid_size(&self) -> (u16, u16) {
            (self.cols, self.rows)
        }
    }

    fn create_tilemap_texture(
        device: &wgpu::Device,
        cols: u16,
        rows: u16,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tilemap"),
            size: wgpu::Extent3d {
                width: u32::from(cols).max(1),
                height: u32::from(rows).max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Uint,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn create_atlas_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        atlas: &GlyphAtlas,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let size = atlas.layout().atlas_size();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph_atlas"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            atlas.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &wgpu::Buffer,
        tilemap: &wgpu::TextureView,
        atlas: &wgpu::TextureView,
        palette: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tilemap_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(tilemap),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(atlas),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(palette),
                },
            ],
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub use gpu::TilemapRenderer;

// ---------------------------------------------------------------------------
// Helpers (used by the wasm32-only gpu module and tests)
// ---------------------------------------------------------------------------

#[cfg(any(target_arch = "wasm32", test))]
fn uniforms_bytes(
    viewport_w: f32,
    viewport_h: f32,
    tile_w: f32,
    tile_h: f32,
    cols: u32,
    rows: u32,
) -> [u8; UNIFORM_BYTES] {
    let mut buf = [0u8; UNIFORM_BYTES];
    buf[0..4].copy_from_slice(&viewport_w.to_le_bytes());
    buf[4..8].copy_from_slice(&viewport_h.to_le_bytes());
    buf[8..12].copy_from_slice(&tile_w.to_le_bytes());
    buf[12..16].copy_from_slice(&tile_h.to_le_bytes());
    buf[16..20].copy_from_slice(&cols.to_le_bytes());
    buf[20..24].copy_from_slice(&rows.to_le_bytes());
    // bytes 24..32 are padding (zeroed).
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_bytes_layout() {
        let buf = uniforms_bytes(960.0, 480.0, 8.0, 16.0, 120, 30);
        assert_eq!(buf.len(), UNIFORM_BYTES);
        assert_eq!(f32::from_le_bytes(buf[0..4].try_into().unwrap()), 960.0);
        assert_eq!(f32::from_le_bytes(buf[4..8].try_into().unwrap()), 480.0);
        assert_eq!(f32::from_le_bytes(buf[8..12].try_into().unwrap()), 8.0);
        assert_eq!(f32::from_le_bytes(buf[12..16].try_into().unwrap()), 16.0);
        assert_eq!(u32::from_le_bytes(buf[16..20].try_into().unwrap()), 120);
        assert_eq!(u32::from_le_bytes(buf[20..24].try_into().unwrap()), 30);
        assert_eq!(&buf[24..32], &[0u8; 8]);
    }

    #[test]
    fn renderer_errors_display() {
        assert_eq!(
            RendererError::NoAdapter.to_string(),
            "WebGPU adapter not available"
        );
        assert!(
            RendererError::DeviceError("lost".into())
                .to_string()
                .contains("lost")
        );
    }
}
