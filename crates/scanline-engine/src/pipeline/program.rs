use std::path::Path;

use crate::device::capture_validation;
use crate::math::{Mat4, Vec4};
use crate::render::{RenderCtx, RenderTarget};
use crate::resource::GpuResource;
use crate::texture::GpuTexture;

use super::link::{self, LinkPlan};
use super::reflect::{ResourceKind, UniformField};
use super::stage::{self, CompiledStage};
use super::vertex_spec::{Attribute, VertexSpec};
use super::{PipelineError, QuadGeometry, ShaderStage};

/// Source and destination rectangles for [`ShaderProgram::render`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RenderRequest {
    pub source_width: u32,
    pub source_height: u32,
    /// Target rectangle in pixels, top-left origin.
    pub target_x: u32,
    pub target_y: u32,
    pub target_width: u32,
    pub target_height: u32,
}

impl RenderRequest {
    /// Stretches a `source_width × source_height` image over a whole
    /// `target_width × target_height` attachment.
    pub fn full(source_width: u32, source_height: u32, target_width: u32, target_height: u32) -> Self {
        Self {
            source_width,
            source_height,
            target_x: 0,
            target_y: 0,
            target_width,
            target_height,
        }
    }

    /// Viewport clamped to a `width × height` attachment; `None` when empty
    /// or when there is no source image to sample.
    fn viewport(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if self.source_width == 0 || self.source_height == 0 {
            return None;
        }
        let x = self.target_x.min(width);
        let y = self.target_y.min(height);
        let w = self.target_width.min(width - x);
        let h = self.target_height.min(height - y);
        if w == 0 || h == 0 { None } else { Some((x, y, w, h)) }
    }
}

/// A uniform block's CPU copy and GPU buffer.
struct UniformBlock {
    fields: Vec<UniformField>,
    data: Vec<u8>,
    buffer: wgpu::Buffer,
}

impl UniformBlock {
    /// Copies `bytes` to the field called `name`. Returns `false` if the
    /// block has no such field or it is a different size.
    fn write(&mut self, name: &str, bytes: &[u8]) -> bool {
        let Some(f) = self.fields.iter().find(|f| f.name == name) else {
            return false;
        };
        if f.size as usize != bytes.len() {
            log::trace!("uniform `{name}` is {} bytes, got {}", f.size, bytes.len());
            return false;
        }
        let start = f.offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        true
    }
}

enum BindingSlot {
    Uniform(usize),
    Texture,
    Sampler,
}

/// The linked program: pipeline objects plus name tables from reflection.
struct LinkedProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bindings: Vec<(u32, BindingSlot)>,
    uniforms: Vec<UniformBlock>,
    /// Attribute per vertex-buffer slot.
    attributes: Vec<(Attribute, u32)>,
}

impl LinkedProgram {
    /// Creates the GPU objects for `plan`. Anything the device rejects comes
    /// back as a linker log.
    fn build(
        device: &wgpu::Device,
        vs: &CompiledStage,
        fs: &CompiledStage,
        plan: LinkPlan,
        color_format: wgpu::TextureFormat,
    ) -> Result<Self, String> {
        capture_validation(device, || Self::create(device, vs, fs, plan, color_format))
            .map_err(|e| e.to_string())
    }

    fn create(
        device: &wgpu::Device,
        vs: &CompiledStage,
        fs: &CompiledStage,
        plan: LinkPlan,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scanline vertex shader"),
            source: wgpu::ShaderSource::Wgsl(vs.source.as_str().into()),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scanline fragment shader"),
            source: wgpu::ShaderSource::Wgsl(fs.source.as_str().into()),
        });

        let mut layout_entries = Vec::with_capacity(plan.resources.len());
        let mut bindings = Vec::with_capacity(plan.resources.len());
        let mut uniforms = Vec::new();

        for linked in plan.resources {
            let binding = linked.resource.binding;
            let (ty, slot) = match linked.resource.kind {
                ResourceKind::Uniform { size, fields } => {
                    // Uniform bindings are sized in 16-byte units.
                    let padded = size.max(16).next_multiple_of(16);
                    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("scanline uniform block"),
                        size: padded,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    uniforms.push(UniformBlock {
                        fields,
                        data: vec![0; padded as usize],
                        buffer,
                    });
                    (
                        wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(size),
                        },
                        BindingSlot::Uniform(uniforms.len() - 1),
                    )
                }
                ResourceKind::Texture => (
                    wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    BindingSlot::Texture,
                ),
                ResourceKind::Sampler => (
                    wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    BindingSlot::Sampler,
                ),
            };

            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding,
                visibility: linked.visibility,
                ty,
                count: None,
            });
            bindings.push((binding, slot));
        }

        let bind_group_layout = (!layout_entries.is_empty()).then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("scanline program bgl"),
                entries: &layout_entries,
            })
        });

        let layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scanline program pipeline layout"),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        // One buffer per attribute, each starting at offset 0.
        let vertex_attrs: Vec<[wgpu::VertexAttribute; 1]> = plan
            .attributes
            .iter()
            .map(|(attr, location)| {
                [wgpu::VertexAttribute {
                    format: attr.format(),
                    offset: 0,
                    shader_location: *location,
                }]
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout<'_>> = plan
            .attributes
            .iter()
            .zip(&vertex_attrs)
            .map(|((attr, _), attributes)| wgpu::VertexBufferLayout {
                array_stride: attr.stride(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let mut targets = vec![None; plan.color_location as usize + 1];
        targets[plan.color_location as usize] = Some(wgpu::ColorTargetState {
            format: color_format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scanline program pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: Some(vs.entry_point().name.as_str()),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs_module,
                entry_point: Some(fs.entry_point().name.as_str()),
                compilation_options: Default::default(),
                targets: &targets,
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
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

        Self {
            pipeline,
            bind_group_layout,
            bindings,
            uniforms,
            attributes: plan.attributes,
        }
    }

    /// Writes `bytes` to every block declaring `name`. Absent names are
    /// skipped.
    fn set_uniform(&mut self, name: &str, bytes: &[u8]) {
        let mut found = false;
        for block in &mut self.uniforms {
            found |= block.write(name, bytes);
        }
        if !found {
            log::trace!("uniform `{name}` not active in program; skipped");
        }
    }

    fn set_vec4(&mut self, name: &str, value: &Vec4) {
        self.set_uniform(name, bytemuck::cast_slice(value));
    }

    fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.set_uniform(name, bytemuck::cast_slice(value));
    }

    fn flush_uniforms(&self, queue: &wgpu::Queue) {
        for block in &self.uniforms {
            queue.write_buffer(&block.buffer, 0, &block.data);
        }
    }

    fn bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> Option<wgpu::BindGroup> {
        let layout = self.bind_group_layout.as_ref()?;

        // Every texture/sampler binding sees the source texture (unit 0).
        let entries: Vec<wgpu::BindGroupEntry<'_>> = self
            .bindings
            .iter()
            .map(|(binding, slot)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match slot {
                    BindingSlot::Uniform(i) => self.uniforms[*i].buffer.as_entire_binding(),
                    BindingSlot::Texture => wgpu::BindingResource::TextureView(view),
                    BindingSlot::Sampler => wgpu::BindingResource::Sampler(sampler),
                },
            })
            .collect();

        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scanline program bind group"),
            layout,
            entries: &entries,
        }))
    }

    fn has_uniform(&self, name: &str) -> bool {
        self.uniforms
            .iter()
            .any(|b| b.fields.iter().any(|f| f.name == name))
    }

    fn destroy(self) {
        for block in self.uniforms {
            block.buffer.destroy();
        }
    }
}

/// Shader program plus the vertex resources of its full-viewport quad.
///
/// Lifecycle: [`init`](Self::init) once, [`load_program`](Self::load_program)
/// one or more times, [`bind`](Self::bind), then [`render`](Self::render) each
/// frame. [`free`](Self::free) (or drop) releases everything.
pub struct ShaderProgram {
    label: Option<String>,
    color_format: wgpu::TextureFormat,

    program: Option<LinkedProgram>,
    vertex_spec: Option<VertexSpec>,
    bound: bool,

    /// Log of the most recent failed link, reported again by `bind`.
    last_link_log: String,
}

impl ShaderProgram {
    /// Program drawing into attachments of `color_format`.
    pub fn new(color_format: wgpu::TextureFormat) -> Self {
        Self {
            label: None,
            color_format,
            program: None,
            vertex_spec: None,
            bound: false,
            last_link_log: String::new(),
        }
    }

    pub fn with_label(color_format: wgpu::TextureFormat, label: impl Into<String>) -> Self {
        let mut program = Self::new(color_format);
        program.label = Some(label.into());
        program
    }

    /// Allocates the vertex specification and its attribute buffers.
    pub fn init(&mut self, device: &wgpu::Device) {
        if self.vertex_spec.is_some() {
            log::warn!("program {}: vertex specification already initialized", self.name());
            return;
        }
        self.vertex_spec = Some(VertexSpec::new(device));
        log::trace!("program {}: vertex specification created", self.name());
    }

    /// Compiles and links `vertex_source` + `fragment_source`, replacing any
    /// previous program. On failure no program is retained.
    pub fn load_program(
        &mut self,
        device: &wgpu::Device,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<(), PipelineError> {
        self.free_program();

        let vs = compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fs = compile_stage(ShaderStage::Fragment, fragment_source)?;

        let linked = link::link(&vs, &fs, &device.limits())
            .and_then(|plan| LinkedProgram::build(device, &vs, &fs, plan, self.color_format));
        let program = match linked {
            Ok(program) => program,
            Err(log) => {
                log::error!("error linking program {}!\n{log}", self.name());
                self.last_link_log = log.clone();
                return Err(PipelineError::Link {
                    program: self.name().to_owned(),
                    log,
                });
            }
        };

        self.program = Some(program);
        self.last_link_log.clear();
        log::debug!("program {} linked", self.name());
        Ok(())
    }

    /// [`load_program`](Self::load_program) with stage sources read from disk.
    pub fn load_program_from_files(
        &mut self,
        device: &wgpu::Device,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<(), PipelineError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| {
                log::error!("unable to open file {}", path.display());
                PipelineError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })
        };

        let vertex_source = match read(vertex_path.as_ref()) {
            Ok(s) => s,
            Err(e) => {
                self.free_program();
                return Err(e);
            }
        };
        let fragment_source = match read(fragment_path.as_ref()) {
            Ok(s) => s,
            Err(e) => {
                self.free_program();
                return Err(e);
            }
        };

        self.load_program(device, &vertex_source, &fragment_source)
    }

    /// Makes this the active program for [`render`](Self::render).
    pub fn bind(&mut self) -> Result<(), PipelineError> {
        if self.program.is_some() {
            self.bound = true;
            return Ok(());
        }

        let reason = "no linked program".to_owned();
        log::error!("error binding shader! {reason}");
        if self.last_link_log.is_empty() {
            log::warn!("{} is not a program", self.name());
        } else {
            log::error!("{}", self.last_link_log);
        }
        Err(PipelineError::Bind {
            reason,
            link_log: self.last_link_log.clone(),
        })
    }

    /// Leaves no program active.
    pub fn unbind(&mut self) {
        self.bound = false;
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.vertex_spec.is_some()
    }

    #[inline]
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    /// Linker log of the last failed [`load_program`](Self::load_program).
    pub fn last_link_log(&self) -> &str {
        &self.last_link_log
    }

    /// Whether the linked program declares a uniform called `name`
    /// (`sourceSize[0]` style element names included).
    pub fn has_uniform(&self, name: &str) -> bool {
        self.program.as_ref().is_some_and(|p| p.has_uniform(name))
    }

    /// Shader location of `attr`, or `None` if the program does not read it.
    pub fn attribute_location(&self, attr: Attribute) -> Option<u32> {
        let program = self.program.as_ref()?;
        program
            .attributes
            .iter()
            .find(|(a, _)| *a == attr)
            .map(|(_, location)| *location)
    }

    /// Draws `texture` stretched over the request's target rectangle.
    ///
    /// Uniforms (`targetSize`, `outputSize`, `sourceSize[0]`, `modelView`,
    /// `projection`, `modelViewProjection`) and attributes (`vertex`,
    /// `position`, `texCoord`) are matched by name; names the program does
    /// not declare are skipped.
    ///
    /// A target rectangle reaching past the attachment is cropped: the
    /// visible part keeps the scale of the full rectangle. Nothing is drawn
    /// for an empty viewport or a zero-sized source.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        request: &RenderRequest,
        texture: &GpuTexture,
    ) -> Result<(), PipelineError> {
        let Some(spec) = self.vertex_spec.as_ref() else {
            return Err(PipelineError::NotInitialized);
        };
        let (true, Some(program)) = (self.bound, self.program.as_mut()) else {
            return Err(PipelineError::NotBound);
        };
        let Some(source) = texture.binding() else {
            return Err(PipelineError::MissingTexture);
        };
        let Some((vx, vy, vw, vh)) = request.viewport(target.width, target.height) else {
            log::debug!("render skipped: nothing to draw for {request:?}");
            return Ok(());
        };

        let quad = QuadGeometry::cropped(
            request.source_width,
            request.source_height,
            request.target_width,
            request.target_height,
            vw,
            vh,
        );

        program.set_vec4("targetSize", &quad.target_size);
        program.set_vec4("outputSize", &quad.output_size);
        program.set_vec4("sourceSize[0]", &quad.source_size);
        program.set_mat4("modelView", &quad.model_view);
        program.set_mat4("projection", &quad.projection);
        program.set_mat4("modelViewProjection", &quad.model_view_projection);
        program.flush_uniforms(ctx.queue);

        ctx.queue.write_buffer(
            spec.buffer(Attribute::Vertex),
            0,
            bytemuck::cast_slice(&quad.vertices),
        );
        ctx.queue.write_buffer(
            spec.buffer(Attribute::Position),
            0,
            bytemuck::cast_slice(&quad.positions),
        );
        ctx.queue.write_buffer(
            spec.buffer(Attribute::TexCoord),
            0,
            bytemuck::cast_slice(&quad.tex_coords),
        );

        let bind_group = program.bind_group(ctx.device, source.view, source.sampler);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scanline quad pass"),
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

        rpass.set_viewport(vx as f32, vy as f32, vw as f32, vh as f32, 0.0, 1.0);
        rpass.set_pipeline(&program.pipeline);
        if let Some(bind_group) = bind_group.as_ref() {
            rpass.set_bind_group(0, bind_group, &[]);
        }
        for (slot, (attr, _)) in program.attributes.iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, spec.buffer(*attr).slice(..));
        }
        rpass.draw(0..VertexSpec::VERTEX_COUNT, 0..1);

        Ok(())
    }

    /// Releases the program and vertex resources. Safe to call repeatedly.
    pub fn free(&mut self) {
        if let Some(spec) = self.vertex_spec.take() {
            spec.destroy();
        }
        self.free_program();
    }

    fn free_program(&mut self) {
        self.bound = false;
        if let Some(program) = self.program.take() {
            program.destroy();
            log::trace!("program {} freed", self.name());
        }
    }

    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }
}

fn compile_stage(stage: ShaderStage, source: &str) -> Result<CompiledStage, PipelineError> {
    stage::compile(stage, source).map_err(|log| {
        log::error!("unable to compile {stage}!\n{log}");
        PipelineError::Compile { stage, log }
    })
}

impl GpuResource for ShaderProgram {
    fn free(&mut self) {
        ShaderProgram::free(self);
    }

    /// A linked program exists.
    fn is_valid(&self) -> bool {
        self.program.is_some()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_support::{
        assert_rgba_near, headless_gpu, offscreen_target, OFFSCREEN_FORMAT,
    };
    use crate::pipeline::shaders::{CRT_FRAGMENT, DEFAULT_FRAGMENT, DEFAULT_VERTEX};
    use crate::pixels::pack_rgba;
    use crate::texture::read_texture_rgba;

    const BROKEN_FRAGMENT: &str = "@fragment fn main() -> @location(0) vec4<f32> { return; }";

    // ── without a device ─────────────────────────────────────────────────

    #[test]
    fn new_program_is_invalid_and_unbound() {
        let p = ShaderProgram::new(OFFSCREEN_FORMAT);
        assert!(!p.is_valid());
        assert!(!p.is_bound());
        assert!(!p.is_initialized());
        assert!(!p.has_uniform("targetSize"));
    }

    #[test]
    fn labelled_program_keeps_format() {
        let p = ShaderProgram::with_label(wgpu::TextureFormat::Bgra8Unorm, "scanline");
        assert_eq!(p.name(), "scanline");
        assert_eq!(p.color_format(), wgpu::TextureFormat::Bgra8Unorm);
        assert!(!p.is_valid());
    }

    #[test]
    fn bind_without_program_fails() {
        let mut p = ShaderProgram::with_label(OFFSCREEN_FORMAT, "unlinked");
        let err = p.bind().unwrap_err();
        assert!(matches!(err, PipelineError::Bind { .. }));
        assert!(!p.is_bound());
    }

    #[test]
    fn free_twice_without_resources() {
        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.free();
        p.free();
        assert!(!p.is_valid());
    }

    #[test]
    fn viewport_is_clamped_to_attachment() {
        let full = RenderRequest::full(480, 270, 960, 540);
        assert_eq!(full.viewport(960, 540), Some((0, 0, 960, 540)));
        assert_eq!(full.viewport(800, 600), Some((0, 0, 800, 540)));

        let offset = RenderRequest {
            target_x: 900,
            target_y: 10,
            ..full
        };
        assert_eq!(offset.viewport(960, 540), Some((900, 10, 60, 530)));
        assert_eq!(offset.viewport(900, 540), None);
    }

    #[test]
    fn zero_sized_source_has_no_viewport() {
        let request = RenderRequest::full(0, 270, 960, 540);
        assert_eq!(request.viewport(960, 540), None);
        let request = RenderRequest::full(480, 0, 960, 540);
        assert_eq!(request.viewport(960, 540), None);
    }

    // ── load / link ──────────────────────────────────────────────────────

    #[test]
    fn invalid_fragment_leaves_program_invalid() {
        let Some(gpu) = headless_gpu() else { return };
        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.init(gpu.device());

        let err = p
            .load_program(gpu.device(), DEFAULT_VERTEX, BROKEN_FRAGMENT)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert!(!p.is_valid());
        assert!(p.bind().is_err());
    }

    #[test]
    fn failed_reload_drops_previous_program() {
        let Some(gpu) = headless_gpu() else { return };
        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.load_program(gpu.device(), DEFAULT_VERTEX, DEFAULT_FRAGMENT)
            .unwrap();
        p.bind().unwrap();
        assert!(p.is_valid());

        assert!(p.load_program(gpu.device(), DEFAULT_VERTEX, BROKEN_FRAGMENT).is_err());
        assert!(!p.is_valid());
        assert!(!p.is_bound());
    }

    #[test]
    fn link_failure_keeps_log_for_bind() {
        let Some(gpu) = headless_gpu() else { return };
        let fragment = r#"
            @fragment fn main(@location(5) shade: vec4<f32>) -> @location(0) vec4<f32> {
                return shade;
            }
        "#;
        let mut p = ShaderProgram::with_label(OFFSCREEN_FORMAT, "mismatched");
        let err = p.load_program(gpu.device(), DEFAULT_VERTEX, fragment).unwrap_err();
        assert!(matches!(err, PipelineError::Link { ref program, .. } if program == "mismatched"));
        assert!(!p.last_link_log().is_empty());

        let PipelineError::Bind { link_log, .. } = p.bind().unwrap_err() else {
            panic!("expected bind error");
        };
        assert_eq!(link_log, p.last_link_log());
    }

    #[test]
    fn reflection_exposes_names() {
        let Some(gpu) = headless_gpu() else { return };
        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.load_program(gpu.device(), DEFAULT_VERTEX, CRT_FRAGMENT).unwrap();

        assert!(p.has_uniform("sourceSize[0]"));
        assert!(p.has_uniform("modelViewProjection"));
        assert!(!p.has_uniform("sourceSize[1]"));
        assert_eq!(p.attribute_location(Attribute::Vertex), Some(0));
        assert_eq!(p.attribute_location(Attribute::TexCoord), Some(2));
    }

    #[test]
    fn integer_frag_color_is_a_link_error() {
        let Some(gpu) = headless_gpu() else { return };
        let f = r#"
            struct Out { @location(0) fragColor: vec4<u32> };
            @fragment fn main() -> Out { return Out(vec4<u32>(1u)); }
        "#;
        let mut p = ShaderProgram::with_label(OFFSCREEN_FORMAT, "uint output");
        let err = p.load_program(gpu.device(), DEFAULT_VERTEX, f).unwrap_err();
        assert!(matches!(err, PipelineError::Link { .. }), "{err}");
        assert!(!p.is_valid());
        assert!(p.last_link_log().contains("fragColor"));
    }

    #[test]
    fn vertex_input_past_device_limit_is_a_link_error() {
        let Some(gpu) = headless_gpu() else { return };
        let v = r#"
            @vertex fn main(@location(40) vertex: vec4<f32>) -> @builtin(position) vec4<f32> {
                return vertex;
            }
        "#;
        let f = "@fragment fn main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        let err = p.load_program(gpu.device(), v, f).unwrap_err();
        assert!(matches!(err, PipelineError::Link { .. }), "{err}");
        assert!(!p.is_valid());
        assert!(p.last_link_log().contains("location 40"));
    }

    #[test]
    fn pipeline_rejected_by_device_is_a_link_error() {
        let Some(gpu) = headless_gpu() else { return };
        // Float output into an integer attachment passes naga but not wgpu.
        let mut p = ShaderProgram::new(wgpu::TextureFormat::R32Uint);
        let err = p
            .load_program(gpu.device(), DEFAULT_VERTEX, DEFAULT_FRAGMENT)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Link { .. }), "{err}");
        assert!(!p.is_valid());
        assert!(!p.last_link_log().is_empty());
        assert!(p.bind().is_err());

        // The device is still usable afterwards.
        let mut ok = ShaderProgram::new(OFFSCREEN_FORMAT);
        ok.load_program(gpu.device(), DEFAULT_VERTEX, DEFAULT_FRAGMENT)
            .unwrap();
        assert!(ok.is_valid());
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn init_twice_is_a_noop() {
        let Some(gpu) = headless_gpu() else { return };
        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.init(gpu.device());
        p.init(gpu.device());
        assert!(p.is_initialized());
    }

    #[test]
    fn free_twice_after_load() {
        let Some(gpu) = headless_gpu() else { return };
        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.init(gpu.device());
        p.load_program(gpu.device(), DEFAULT_VERTEX, DEFAULT_FRAGMENT)
            .unwrap();
        p.free();
        p.free();
        assert!(!p.is_valid());
        assert!(!p.is_initialized());
    }

    #[test]
    fn render_requires_init_and_bind() {
        let Some(gpu) = headless_gpu() else { return };
        let mut tex = GpuTexture::new();
        tex.load_from_pixels(&gpu, &[0; 4], 2, 2).unwrap();
        let (_target, view) = offscreen_target(&gpu, 4, 4);
        let mut encoder = gpu.encoder("test encoder");
        let ctx = RenderCtx::from(&gpu);
        let request = RenderRequest::full(2, 2, 4, 4);

        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.load_program(gpu.device(), DEFAULT_VERTEX, DEFAULT_FRAGMENT)
            .unwrap();
        let mut target = RenderTarget::new(&mut encoder, &view, 4, 4);
        assert!(matches!(
            p.render(&ctx, &mut target, &request, &tex),
            Err(PipelineError::NotInitialized)
        ));

        p.init(gpu.device());
        assert!(matches!(
            p.render(&ctx, &mut target, &request, &tex),
            Err(PipelineError::NotBound)
        ));

        p.bind().unwrap();
        let empty = GpuTexture::new();
        assert!(matches!(
            p.render(&ctx, &mut target, &request, &empty),
            Err(PipelineError::MissingTexture)
        ));
    }

    // ── drawing ──────────────────────────────────────────────────────────

    #[test]
    fn default_program_stretches_source_upright() {
        let Some(gpu) = headless_gpu() else { return };
        let corners = [
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [255, 255, 255, 255],
        ];
        let src: Vec<u32> = corners
            .iter()
            .map(|&[r, g, b, a]| pack_rgba(r, g, b, a))
            .collect();
        let mut tex = GpuTexture::new();
        tex.load_from_pixels(&gpu, &src, 2, 2).unwrap();

        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.init(gpu.device());
        p.load_program(gpu.device(), DEFAULT_VERTEX, DEFAULT_FRAGMENT)
            .unwrap();
        p.bind().unwrap();

        let (target_tex, view) = offscreen_target(&gpu, 4, 4);
        let mut encoder = gpu.encoder("test encoder");
        {
            let mut target = RenderTarget::new(&mut encoder, &view, 4, 4);
            p.render(
                &RenderCtx::from(&gpu),
                &mut target,
                &RenderRequest::full(2, 2, 4, 4),
                &tex,
            )
            .unwrap();
        }
        gpu.submit(encoder);

        let out = read_texture_rgba(&gpu, &target_tex, 4, 4).unwrap();
        let at = |x: usize, y: usize| -> [u8; 4] {
            let i = (y * 4 + x) * 4;
            [out[i], out[i + 1], out[i + 2], out[i + 3]]
        };
        assert_rgba_near(at(0, 0), corners[0], 2);
        assert_rgba_near(at(3, 0), corners[1], 2);
        assert_rgba_near(at(0, 3), corners[2], 2);
        assert_rgba_near(at(3, 3), corners[3], 2);
    }

    #[test]
    fn oversized_target_is_cropped_not_squeezed() {
        let Some(gpu) = headless_gpu() else { return };
        let corners = [
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [255, 255, 255, 255],
        ];
        let src: Vec<u32> = corners
            .iter()
            .map(|&[r, g, b, a]| pack_rgba(r, g, b, a))
            .collect();
        let mut tex = GpuTexture::new();
        tex.load_from_pixels(&gpu, &src, 2, 2).unwrap();

        let mut p = ShaderProgram::new(OFFSCREEN_FORMAT);
        p.init(gpu.device());
        p.load_program(gpu.device(), DEFAULT_VERTEX, DEFAULT_FRAGMENT)
            .unwrap();
        p.bind().unwrap();

        // An 8x8 target rectangle on a 4x4 attachment: only its top-left
        // quarter is on screen.
        let (target_tex, view) = offscreen_target(&gpu, 4, 4);
        let mut encoder = gpu.encoder("test encoder");
        {
            let mut target = RenderTarget::new(&mut encoder, &view, 4, 4);
            p.render(
                &RenderCtx::from(&gpu),
                &mut target,
                &RenderRequest::full(2, 2, 8, 8),
                &tex,
            )
            .unwrap();
        }
        gpu.submit(encoder);

        let out = read_texture_rgba(&gpu, &target_tex, 4, 4).unwrap();
        let at = |x: usize, y: usize| -> [u8; 4] {
            let i = (y * 4 + x) * 4;
            [out[i], out[i + 1], out[i + 2], out[i + 3]]
        };
        assert_rgba_near(at(0, 0), corners[0], 2);
        // Squeezing would put the white texel here.
        let [_, g, b, _] = at(3, 3);
        assert!(g < 150 && b < 150, "{:?}", at(3, 3));
    }
}
