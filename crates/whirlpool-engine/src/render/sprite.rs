use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::render::texture::{ImageRgba8, Texture, TextureError, TextureId};
use crate::render::{RenderCtx, RenderTarget};

/// One textured unit quad to draw this frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    pub texture: TextureId,
    pub model: Mat4,
}

/// Textured-quad renderer.
///
/// Every sprite shares one unit quad (`[-0.5, 0.5]²`, image top at +Y). The model
/// matrix travels as per-instance data and the camera (projection · view) as a
/// uniform. Sprites are drawn in slice order, one draw call each, so later sprites
/// composite over earlier ones. Blending is straight-alpha source-over; there is
/// no depth test.
pub struct SpriteRenderer {
    view_proj: Mat4,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    camera_bgl: Option<wgpu::BindGroupLayout>,
    camera_bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,

    texture_bgl: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
    textures: Vec<SpriteTexture>,
    /// Id of `textures[0]`. Advances on release so released ids are never reissued.
    texture_base: usize,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    warned_unknown_texture: bool,
}

struct SpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

impl SpriteRenderer {
    pub fn new(view_proj: Mat4) -> Self {
        Self {
            view_proj,
            pipeline_format: None,
            pipeline: None,
            camera_bgl: None,
            camera_bind_group: None,
            camera_ubo: None,
            texture_bgl: None,
            sampler: None,
            textures: Vec::new(),
            texture_base: 0,
            quad_vbo: None,
            quad_ibo: None,
            instance_vbo: None,
            instance_capacity: 0,
            warned_unknown_texture: false,
        }
    }

    /// Number of textures currently owned by the renderer.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn next_texture_id(&self) -> TextureId {
        TextureId::from_index(self.texture_base + self.textures.len())
    }

    /// Decodes `path` and uploads it as a sprite texture.
    pub fn load_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        path: impl AsRef<Path>,
    ) -> Result<TextureId, TextureError> {
        let path = path.as_ref();

        let image = ImageRgba8::load(path)?;
        image.check_fits(path, ctx.device.limits().max_texture_dimension_2d)?;

        let label = path.display().to_string();
        let texture = Texture::upload(ctx.device, ctx.queue, &label, &image);
        let id = self.next_texture_id();

        let device = ctx.device;
        let bgl = self.texture_bgl.get_or_insert_with(|| create_texture_layout(device));
        let sampler = self.sampler.get_or_insert_with(|| create_sampler(device));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("whirlpool sprite texture bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        log::info!("loaded {label} ({}x{}) as {id}", texture.width, texture.height);
        self.textures.push(SpriteTexture { texture, bind_group });
        Ok(id)
    }

    /// Drops every texture; returns how many were released.
    ///
    /// Handles issued before this call become invalid and their sprites are skipped.
    /// Textures loaded afterwards get fresh ids.
    pub fn release_textures(&mut self) -> usize {
        let released = self.textures.len();
        for entry in self.textures.drain(..) {
            entry.texture.texture.destroy();
        }
        self.texture_base += released;
        released
    }

    /// Renders `sprites` into `target` in slice order.
    ///
    /// Sprites referring to unknown textures are skipped (one-time warning).
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, sprites: &[Sprite]) {
        let batch = collect_instances(sprites, self.texture_base, self.textures.len());
        if batch.len() < sprites.len() && !self.warned_unknown_texture {
            log::warn!("SpriteRenderer: skipping sprites with unknown textures");
            self.warned_unknown_texture = true;
        }
        if batch.is_empty() {
            return;
        }

        self.ensure_texture_layout(ctx);
        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_camera_bindings(ctx);

        // Mutating methods must happen before borrowing pipeline/buffers immutably.
        self.write_camera_uniform(ctx);
        self.ensure_instance_capacity(ctx, batch.len());

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        let raw: Vec<SpriteInstance> = batch.iter().map(|(_, inst)| *inst).collect();
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&raw));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(camera_bind_group) = self.camera_bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("whirlpool sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, camera_bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        for (i, (texture_index, _)) in batch.iter().enumerate() {
            let i = i as u32;
            rpass.set_bind_group(1, &self.textures[*texture_index].bind_group, &[]);
            rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, i..i + 1);
        }

        log::trace!("drew {} sprites", batch.len());
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_texture_layout(&mut self, ctx: &RenderCtx<'_>) {
        if self.texture_bgl.is_none() {
            self.texture_bgl = Some(create_texture_layout(ctx.device));
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }
        let Some(texture_bgl) = self.texture_bgl.as_ref() else { return };

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("whirlpool sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });

        let camera_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("whirlpool sprite camera bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<CameraUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("whirlpool sprite pipeline layout"),
            bind_group_layouts: &[&camera_bgl, texture_bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("whirlpool sprite pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), SpriteInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(straight_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.camera_bgl = Some(camera_bgl);

        self.camera_bind_group = None;
        self.camera_ubo = None;
    }

    fn ensure_camera_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.camera_bind_group.is_some() && self.camera_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.camera_bgl.as_ref() else { return };

        let camera_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("whirlpool sprite camera ubo"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("whirlpool sprite camera bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            }],
        });

        self.camera_ubo = Some(camera_ubo);
        self.camera_bind_group = Some(bind_group);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("whirlpool sprite quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("whirlpool sprite quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn write_camera_uniform(&mut self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        let u = CameraUniform {
            view_proj: self.view_proj.to_cols_array_2d(),
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required_instances: usize) {
        if required_instances <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required_instances.next_power_of_two().max(8);
        let new_size = (new_cap * std::mem::size_of::<SpriteInstance>()) as u64;

        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("whirlpool sprite instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

fn create_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("whirlpool sprite texture bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Pixel-art sprites: nearest filtering, no mipmaps.
fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("whirlpool sprite sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// Pairs each drawable sprite with its slot in the live texture list, preserving order.
///
/// Live ids are `base..base + texture_count`; anything else is skipped.
fn collect_instances(
    sprites: &[Sprite],
    base: usize,
    texture_count: usize,
) -> Vec<(usize, SpriteInstance)> {
    sprites
        .iter()
        .filter_map(|s| {
            let slot = s.texture.index().checked_sub(base)?;
            (slot < texture_count).then(|| {
                (
                    slot,
                    SpriteInstance {
                        model: s.model.to_cols_array_2d(),
                    },
                )
            })
        })
        .collect()
}

/// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` on every channel, as fixed-function GL blending does.
fn straight_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2  // uv
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// v is flipped: texture row 0 (image top) maps to the quad's +Y edge.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [-0.5, -0.5], uv: [0.0, 1.0] },
    QuadVertex { pos: [0.5, -0.5], uv: [1.0, 1.0] },
    QuadVertex { pos: [0.5, 0.5], uv: [1.0, 0.0] },
    QuadVertex { pos: [-0.5, 0.5], uv: [0.0, 0.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SpriteInstance {
    model: [[f32; 4]; 4],
}

impl SpriteInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4, // model column 0
        3 => Float32x4, // model column 1
        4 => Float32x4, // model column 2
        5 => Float32x4  // model column 3
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn sprite(index: usize, x: f32) -> Sprite {
        Sprite {
            texture: TextureId::from_index(index),
            model: Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
        }
    }

    #[test]
    fn instances_keep_draw_order() {
        let sprites = [sprite(0, 1.0), sprite(2, 2.0), sprite(1, 3.0)];
        let batch = collect_instances(&sprites, 0, 3);

        let slots: Vec<usize> = batch.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots, vec![0, 2, 1]);
        assert_eq!(batch[1].1.model, sprites[1].model.to_cols_array_2d());
    }

    #[test]
    fn unknown_textures_are_skipped() {
        let sprites = [sprite(0, 1.0), sprite(5, 2.0)];
        let batch = collect_instances(&sprites, 0, 1);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].0, 0);
    }

    #[test]
    fn released_ids_are_not_reissued() {
        let mut renderer = SpriteRenderer::new(Mat4::IDENTITY);
        assert_eq!(renderer.next_texture_id(), TextureId::from_index(0));

        // Three textures were loaded and then released.
        renderer.texture_base = 3;
        assert_eq!(renderer.release_textures(), 0);
        assert_eq!(renderer.next_texture_id(), TextureId::from_index(3));

        // One texture reloaded after the release lives at slot 0 with id 3.
        let sprites = [sprite(0, 1.0), sprite(2, 2.0), sprite(3, 3.0)];
        let batch = collect_instances(&sprites, 3, 1);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].0, 0);
        assert_eq!(batch[0].1.model, sprites[2].model.to_cols_array_2d());
    }

    #[test]
    fn quad_is_unit_sized_and_centered() {
        let xs: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.pos[0]).collect();
        let ys: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.pos[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 0.5);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), -0.5);

        // Top edge samples the first image row.
        for v in QUAD_VERTICES.iter().filter(|v| v.pos[1] > 0.0) {
            assert_eq!(v.uv[1], 0.0);
        }
    }

    #[test]
    fn instance_layout_matches_matrix_size() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 64);
        assert_eq!(SpriteInstance::layout().array_stride, 64);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }

    #[test]
    fn blend_is_source_over() {
        let blend = straight_alpha_blend();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }
}
