use crate::meshes::{self, GridVertex, Vertex};
use crate::shaders;
use crate::textures;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use std::collections::BTreeMap;
use std::ops::Range;
use vitrine_common::ObjectId;
use vitrine_render::PerspectiveCamera;
use vitrine_scene::{Card, ObjectKind, Reflector, Scene, Side};

const MAX_LIGHTS: usize = 3;
const CLEAR: wgpu::Color = wgpu::Color::WHITE;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    clip_plane: [f32; 4],
    ambient: [f32; 4],
    light_dir: [[f32; 4]; MAX_LIGHTS],
    light_color: [[f32; 4]; MAX_LIGHTS],
    viewport: [f32; 4],
}

impl FrameUniforms {
    /// `clip_plane` is `(normal, offset)`; `size` is the target in pixels.
    fn new(
        view_proj: Mat4,
        eye: Vec3,
        clip_plane: Vec4,
        scene: &Scene,
        size: (u32, u32),
        has_environment: bool,
    ) -> Self {
        let ambient = scene.ambient();
        let mut light_dir = [[0.0; 4]; MAX_LIGHTS];
        let mut light_color = [[0.0; 4]; MAX_LIGHTS];
        let mut count = 0;
        for (transform, light) in scene.directional_lights().take(MAX_LIGHTS) {
            light_dir[count] = light.direction_from(transform.position).extend(0.0).to_array();
            let c = light.color.to_linear();
            light_color[count] = [
                c[0] * light.intensity,
                c[1] * light.intensity,
                c[2] * light.intensity,
                1.0,
            ];
            count += 1;
        }
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: eye.extend(1.0).to_array(),
            clip_plane: clip_plane.to_array(),
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
            light_dir,
            light_color,
            viewport: [
                size.0 as f32,
                size.1 as f32,
                if has_environment { 1.0 } else { 0.0 },
                count as f32,
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
    specular: [f32; 4],
}

impl ObjectUniforms {
    fn with_model(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            ..Self::default()
        }
    }

    fn card_face(model: Mat4, card: &Card, face: usize) -> Self {
        let material = &card.faces[face];
        let s = material.specular.to_linear();
        let double = if material.side == Side::Double { 1.0 } else { 0.0 };
        Self {
            model: model.to_cols_array_2d(),
            color: [1.0; 4],
            params: [0.0, 0.0, 1.0, material.shininess],
            specular: [s[0], s[1], s[2], double],
        }
    }
}

/// Mirrored view-projection and eye for a planar reflector at `height`.
fn mirror_view(view_proj: Mat4, eye: Vec3, height: f32) -> (Mat4, Vec3) {
    let reflect = meshes::reflection_matrix(height);
    (view_proj * reflect, reflect.transform_point3(eye))
}

/// Keep only what lies above the mirror, nudged by `reflector.clip_bias`.
fn mirror_clip_plane(height: f32, reflector: &Reflector) -> Vec4 {
    Vec4::new(0.0, 1.0, 0.0, -(height + reflector.clip_bias))
}

/// Clip plane that never discards.
const NO_CLIP: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

struct Layouts {
    frame: wgpu::BindGroupLayout,
    object: wgpu::BindGroupLayout,
    texture: wgpu::BindGroupLayout,
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let uniform = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                uniform(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
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
        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
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
        });
        Self {
            frame,
            object,
            texture,
        }
    }
}

/// Fixed-function state that differs between the pipelines.
struct PipelineDesc<'a> {
    label: &'a str,
    source: String,
    vs: &'a str,
    fs: &'a str,
    bind_groups: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_pipeline(
    device: &wgpu::Device,
    desc: PipelineDesc<'_>,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_groups,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(desc.vs),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(desc.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: textures::DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: desc.depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
const GRID_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

fn mesh_buffer() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRIBUTES,
    }
}

fn grid_buffer() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GridVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &GRID_ATTRIBUTES,
    }
}

/// Objects visible in the planar reflection. The ground is only ever seen
/// from below there, and the reflector does not reflect itself.
fn drawn_in_reflection(kind: &ObjectKind) -> bool {
    matches!(kind, ObjectKind::Grid(_) | ObjectKind::Card(_))
}

/// Pipelines for one target format and sample count.
struct ScenePipelines {
    sky: wgpu::RenderPipeline,
    grid: wgpu::RenderPipeline,
    phong: wgpu::RenderPipeline,
    /// Ground and reflector. Absent for the reflection target.
    surfaces: Option<SurfacePipelines>,
}

struct SurfacePipelines {
    standard: wgpu::RenderPipeline,
    mirror: wgpu::RenderPipeline,
}

impl ScenePipelines {
    /// Sky, grid and card pipelines only.
    fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let mesh_buffers = [mesh_buffer()];
        let grid_buffers = [grid_buffer()];
        let frame_only = [&layouts.frame];
        let with_object = [&layouts.frame, &layouts.object];
        let textured = [&layouts.frame, &layouts.object, &layouts.texture];

        let sky = create_pipeline(
            device,
            PipelineDesc {
                label: "sky_pipeline",
                source: shaders::module_source(&[shaders::SKY]),
                vs: "vs_sky",
                fs: "fs_sky",
                bind_groups: &frame_only,
                buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Always,
            },
            format,
            sample_count,
        );
        let grid = create_pipeline(
            device,
            PipelineDesc {
                label: "grid_pipeline",
                source: shaders::module_source(&[shaders::OBJECT, shaders::GRID]),
                vs: "vs_grid",
                fs: "fs_grid",
                bind_groups: &with_object,
                buffers: &grid_buffers,
                topology: wgpu::PrimitiveTopology::LineList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
            format,
            sample_count,
        );
        let phong = create_pipeline(
            device,
            PipelineDesc {
                label: "phong_pipeline",
                source: shaders::module_source(&[shaders::OBJECT, shaders::PHONG]),
                vs: "vs_mesh",
                fs: "fs_phong",
                bind_groups: &textured,
                buffers: &mesh_buffers,
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
            format,
            sample_count,
        );
        Self {
            sky,
            grid,
            phong,
            surfaces: None,
        }
    }

    /// Add the ground and reflector pipelines.
    fn with_surfaces(
        mut self,
        device: &wgpu::Device,
        layouts: &Layouts,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let mesh_buffers = [mesh_buffer()];
        let with_object = [&layouts.frame, &layouts.object];
        let textured = [&layouts.frame, &layouts.object, &layouts.texture];

        let standard = create_pipeline(
            device,
            PipelineDesc {
                label: "standard_pipeline",
                source: shaders::module_source(&[shaders::OBJECT, shaders::STANDARD]),
                vs: "vs_mesh",
                fs: "fs_standard",
                bind_groups: &with_object,
                buffers: &mesh_buffers,
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
            format,
            sample_count,
        );
        let mirror = create_pipeline(
            device,
            PipelineDesc {
                label: "mirror_pipeline",
                source: shaders::module_source(&[shaders::OBJECT, shaders::MIRROR]),
                vs: "vs_mesh",
                fs: "fs_mirror",
                bind_groups: &textured,
                buffers: &mesh_buffers,
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
            format,
            sample_count,
        );
        self.surfaces = Some(SurfacePipelines { standard, mirror });
        self
    }
}

struct Binding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Binding {
    fn object(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<ObjectUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    fn frame(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        environment: &wgpu::TextureView,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = frame_bind_group(device, layout, label, &buffer, environment);
        Self { buffer, bind_group }
    }
}

fn frame_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    buffer: &wgpu::Buffer,
    environment: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(environment),
            },
        ],
    })
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

struct Mesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_format: wgpu::IndexFormat,
    index_count: u32,
}

impl Mesh {
    fn new<V: Pod, I: Pod>(
        device: &wgpu::Device,
        label: &str,
        vertices: &[V],
        indices: &[I],
        index_format: wgpu::IndexFormat,
    ) -> Self {
        use wgpu::util::DeviceExt;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices: vertex_buffer,
            indices: index_buffer,
            index_format,
            index_count: indices.len() as u32,
        }
    }

    fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.set_index_buffer(self.indices.slice(..), self.index_format);
    }
}

/// GPU resources for one scene object, created the first time it is drawn.
enum DrawObject {
    Ground {
        mesh: Mesh,
        object: Binding,
    },
    Reflector {
        mesh: Mesh,
        object: Binding,
    },
    Grid {
        vertices: wgpu::Buffer,
        vertex_count: u32,
        object: Binding,
    },
    Card {
        mesh: Mesh,
        faces: Vec<(Range<u32>, Binding)>,
    },
}

impl DrawObject {
    fn create(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, kind: &ObjectKind) -> Option<Self> {
        match kind {
            ObjectKind::Ground(ground) => {
                let (vertices, indices) = meshes::plane_mesh(&ground.geometry);
                Some(Self::Ground {
                    mesh: Mesh::new(device, "ground_mesh", &vertices, &indices, wgpu::IndexFormat::Uint32),
                    object: Binding::object(device, layout, "ground_object"),
                })
            }
            ObjectKind::Reflector(reflector) => {
                let (vertices, indices) = meshes::plane_mesh(&reflector.geometry);
                Some(Self::Reflector {
                    mesh: Mesh::new(device, "reflector_mesh", &vertices, &indices, wgpu::IndexFormat::Uint32),
                    object: Binding::object(device, layout, "reflector_object"),
                })
            }
            ObjectKind::Grid(grid) => {
                use wgpu::util::DeviceExt;
                let verts = meshes::grid_mesh(grid);
                let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("grid_vertex_buffer"),
                    contents: bytemuck::cast_slice(&verts),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                Some(Self::Grid {
                    vertices,
                    vertex_count: verts.len() as u32,
                    object: Binding::object(device, layout, "grid_object"),
                })
            }
            ObjectKind::Card(card) => {
                let (vertices, indices, ranges) = meshes::card_mesh(card.size);
                let faces = ranges
                    .into_iter()
                    .map(|range| (range, Binding::object(device, layout, "card_face_object")))
                    .collect();
                Some(Self::Card {
                    mesh: Mesh::new(device, "card_mesh", &vertices, &indices, wgpu::IndexFormat::Uint16),
                    faces,
                })
            }
            ObjectKind::DirectionalLight(_) | ObjectKind::AmbientLight(_) => None,
        }
    }
}

/// Offscreen target the mirror pass renders into.
struct ReflectionTarget {
    size: (u32, u32),
    depth: wgpu::TextureView,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// wgpu scene renderer.
///
/// Mirrors the scene's objects into GPU resources on first sight and keeps
/// them for the lifetime of the renderer. The environment map is uploaded
/// once, the first frame after it appears in the scene.
pub struct WgpuRenderer {
    layouts: Layouts,
    main: ScenePipelines,
    mirror: ScenePipelines,
    main_frame: Binding,
    mirror_frame: Binding,
    environment: wgpu::TextureView,
    has_environment: bool,
    sampler: wgpu::Sampler,
    textures: Vec<wgpu::BindGroup>,
    objects: BTreeMap<ObjectId, DrawObject>,
    reflection: Option<ReflectionTarget>,
    depth_texture: wgpu::TextureView,
    msaa_texture: Option<wgpu::TextureView>,
    size: (u32, u32),
    sample_count: u32,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    /// `sample_count` is 1 or a count the adapter supports for `surface_format`.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let layouts = Layouts::new(device);
        let main = ScenePipelines::new(device, &layouts, surface_format, sample_count)
            .with_surfaces(device, &layouts, surface_format, sample_count);
        let mirror = ScenePipelines::new(device, &layouts, surface_format, 1);

        let environment = textures::placeholder_environment(device, queue);
        let main_frame = Binding::frame(device, &layouts.frame, "main_frame", &environment);
        let mirror_frame = Binding::frame(device, &layouts.frame, "mirror_frame", &environment);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        tracing::info!(?surface_format, sample_count, width, height, "wgpu renderer ready");

        Self {
            layouts,
            main,
            mirror,
            main_frame,
            mirror_frame,
            environment,
            has_environment: false,
            sampler,
            textures: Vec::new(),
            objects: BTreeMap::new(),
            reflection: None,
            depth_texture: textures::create_depth_texture(device, width, height, sample_count),
            msaa_texture: (sample_count > 1).then(|| {
                textures::create_msaa_texture(device, surface_format, width, height, sample_count)
            }),
            size: (width.max(1), height.max(1)),
            sample_count,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        self.depth_texture = textures::create_depth_texture(device, width, height, self.sample_count);
        if self.sample_count > 1 {
            self.msaa_texture = Some(textures::create_msaa_texture(
                device,
                self.surface_format,
                width,
                height,
                self.sample_count,
            ));
        }
    }

    fn sync_resources(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        if !self.has_environment {
            if let Some(environment) = scene.environment() {
                self.environment = textures::upload_environment(device, queue, environment);
                self.main_frame.bind_group = frame_bind_group(
                    device,
                    &self.layouts.frame,
                    "main_frame",
                    &self.main_frame.buffer,
                    &self.environment,
                );
                self.mirror_frame.bind_group = frame_bind_group(
                    device,
                    &self.layouts.frame,
                    "mirror_frame",
                    &self.mirror_frame.buffer,
                    &self.environment,
                );
                self.has_environment = true;
                tracing::debug!(
                    width = environment.width,
                    height = environment.height,
                    "environment uploaded"
                );
            }
        }

        for texture in &scene.textures()[self.textures.len().min(scene.textures().len())..] {
            let view = textures::upload_texture(device, queue, texture);
            self.textures.push(texture_bind_group(
                device,
                &self.layouts.texture,
                &texture.label,
                &view,
                &self.sampler,
            ));
        }

        for object in scene.objects() {
            if !self.objects.contains_key(&object.id) {
                if let Some(draw) = DrawObject::create(device, &self.layouts.object, &object.kind) {
                    tracing::debug!(id = object.id.0, name = %object.name, "gpu resources created");
                    self.objects.insert(object.id, draw);
                }
            }
        }
    }

    fn ensure_reflection_target(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        let size = (size.0.max(1), size.1.max(1));
        if self.reflection.as_ref().is_some_and(|t| t.size == size) {
            return;
        }
        let view = textures::create_render_target(device, self.surface_format, size.0, size.1);
        let bind_group = texture_bind_group(
            device,
            &self.layouts.texture,
            "reflection_bind_group",
            &view,
            &self.sampler,
        );
        tracing::debug!(width = size.0, height = size.1, "reflection target allocated");
        self.reflection = Some(ReflectionTarget {
            size,
            depth: textures::create_depth_texture(device, size.0, size.1, 1),
            view,
            bind_group,
        });
    }

    fn write_object_uniforms(&self, queue: &wgpu::Queue, scene: &Scene) {
        for object in scene.objects() {
            let Some(draw) = self.objects.get(&object.id) else {
                continue;
            };
            let model = object.transform.matrix();
            match (draw, &object.kind) {
                (DrawObject::Ground { object: binding, .. }, ObjectKind::Ground(ground)) => {
                    let m = &ground.material;
                    let c = m.color.to_linear();
                    let opacity = if m.transparent { m.opacity } else { 1.0 };
                    let uniforms = ObjectUniforms {
                        color: [c[0], c[1], c[2], 1.0],
                        params: [m.metalness, m.roughness, opacity, 0.0],
                        ..ObjectUniforms::with_model(model)
                    };
                    queue.write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniforms));
                }
                (DrawObject::Reflector { object: binding, .. }, ObjectKind::Reflector(reflector)) => {
                    let c = reflector.color.to_linear();
                    let uniforms = ObjectUniforms {
                        color: [c[0], c[1], c[2], 1.0],
                        ..ObjectUniforms::with_model(model)
                    };
                    queue.write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniforms));
                }
                (DrawObject::Grid { object: binding, .. }, ObjectKind::Grid(_)) => {
                    let uniforms = ObjectUniforms::with_model(model);
                    queue.write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniforms));
                }
                (DrawObject::Card { faces, .. }, ObjectKind::Card(card)) => {
                    for (face, (_, binding)) in faces.iter().enumerate() {
                        let uniforms = ObjectUniforms::card_face(model, card, face);
                        queue.write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniforms));
                    }
                }
                _ => {}
            }
        }
    }

    /// Draw the objects of `scene` that pass `filter`, in scene order.
    fn draw_objects(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipelines: &ScenePipelines,
        scene: &Scene,
        reflection: Option<&wgpu::BindGroup>,
        filter: impl Fn(&ObjectKind) -> bool,
    ) {
        for scene_object in scene.objects().iter().filter(|o| filter(&o.kind)) {
            let Some(draw) = self.objects.get(&scene_object.id) else {
                continue;
            };
            match (draw, &scene_object.kind) {
                (DrawObject::Ground { mesh, object }, _) => {
                    let Some(surfaces) = &pipelines.surfaces else {
                        continue;
                    };
                    pass.set_pipeline(&surfaces.standard);
                    pass.set_bind_group(1, &object.bind_group, &[]);
                    mesh.bind(pass);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
                (DrawObject::Reflector { mesh, object }, _) => {
                    let (Some(surfaces), Some(reflection)) = (&pipelines.surfaces, reflection) else {
                        continue;
                    };
                    pass.set_pipeline(&surfaces.mirror);
                    pass.set_bind_group(1, &object.bind_group, &[]);
                    pass.set_bind_group(2, reflection, &[]);
                    mesh.bind(pass);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
                (
                    DrawObject::Grid {
                        vertices,
                        vertex_count,
                        object,
                    },
                    _,
                ) => {
                    pass.set_pipeline(&pipelines.grid);
                    pass.set_bind_group(1, &object.bind_group, &[]);
                    pass.set_vertex_buffer(0, vertices.slice(..));
                    pass.draw(0..*vertex_count, 0..1);
                }
                (DrawObject::Card { mesh, faces }, ObjectKind::Card(card)) => {
                    pass.set_pipeline(&pipelines.phong);
                    mesh.bind(pass);
                    for ((range, object), material) in faces.iter().zip(card.faces.iter()) {
                        let Some(texture) = self.textures.get(material.map.0 as usize) else {
                            continue;
                        };
                        pass.set_bind_group(1, &object.bind_group, &[]);
                        pass.set_bind_group(2, texture, &[]);
                        pass.draw_indexed(range.clone(), 0, 0..1);
                    }
                }
                _ => {}
            }
        }
    }

    /// Render one frame into `view`: the mirror pass first, then the scene.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        self.sync_resources(device, queue, scene);
        self.write_object_uniforms(queue, scene);

        let view_proj = camera.view_projection();
        queue.write_buffer(
            &self.main_frame.buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(
                view_proj,
                camera.position,
                NO_CLIP,
                scene,
                self.size,
                self.has_environment,
            )),
        );

        let mirror = scene.objects().iter().find_map(|o| match &o.kind {
            ObjectKind::Reflector(r) => Some((o.transform.position.y, *r)),
            _ => None,
        });
        if let Some((height, reflector)) = mirror {
            self.ensure_reflection_target(device, reflector.texture_size);
            let (mirror_vp, mirror_eye) = mirror_view(view_proj, camera.position, height);
            queue.write_buffer(
                &self.mirror_frame.buffer,
                0,
                bytemuck::bytes_of(&FrameUniforms::new(
                    mirror_vp,
                    mirror_eye,
                    mirror_clip_plane(height, &reflector),
                    scene,
                    reflector.texture_size,
                    self.has_environment,
                )),
            );
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        if let (Some(_), Some(target)) = (mirror, self.reflection.as_ref()) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("reflection_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.mirror_frame.bind_group, &[]);
            pass.set_pipeline(&self.mirror.sky);
            pass.draw(0..3, 0..1);
            self.draw_objects(&mut pass, &self.mirror, scene, None, drawn_in_reflection);
        }

        {
            let (color_view, resolve_target) = match &self.msaa_texture {
                Some(msaa) => (msaa, Some(view)),
                None => (view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.main_frame.bind_group, &[]);
            pass.set_pipeline(&self.main.sky);
            pass.draw(0..3, 0..1);
            let reflection = self.reflection.as_ref().map(|t| &t.bind_group);
            self.draw_objects(&mut pass, &self.main, scene, reflection, |kind| {
                matches!(kind, ObjectKind::Reflector(_) | ObjectKind::Grid(_))
            });
            self.draw_objects(&mut pass, &self.main, scene, reflection, |kind| {
                matches!(kind, ObjectKind::Ground(_))
            });
            self.draw_objects(&mut pass, &self.main, scene, reflection, |kind| {
                matches!(kind, ObjectKind::Card(_))
            });
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}
