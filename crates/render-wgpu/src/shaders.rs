//! WGSL sources. Every module is prefixed with [`FRAME`], which declares the
//! per-frame bindings in group 0.

/// Per-frame uniforms and the environment map, shared by all passes.
pub const FRAME: &str = r#"
const PI: f32 = 3.141592653589793;

struct Frame {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // Fragments with dot(plane.xyz, p) + plane.w < 0 are discarded.
    clip_plane: vec4<f32>,
    ambient: vec4<f32>,
    light_dir: array<vec4<f32>, 3>,
    light_color: array<vec4<f32>, 3>,
    // width, height, has_environment, light_count
    viewport: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(0) @binding(1)
var environment: texture_2d<f32>;

fn clip_to_plane(world: vec3<f32>) {
    if dot(frame.clip_plane.xyz, world) + frame.clip_plane.w < 0.0 {
        discard;
    }
}

// Equirectangular lookup, rows top to bottom.
fn sample_environment(dir: vec3<f32>) -> vec3<f32> {
    let d = normalize(dir);
    let u = atan2(d.z, d.x) / (2.0 * PI) + 0.5;
    let v = 0.5 - asin(clamp(d.y, -1.0, 1.0)) / PI;
    let size = vec2<f32>(textureDimensions(environment));
    let texel = clamp(vec2<i32>(vec2<f32>(u, v) * size), vec2<i32>(0), vec2<i32>(size) - 1);
    return textureLoad(environment, texel, 0).rgb;
}
"#;

/// Per-object model matrix and material parameters, group 1.
pub const OBJECT: &str = r#"
struct Object {
    model: mat4x4<f32>,
    color: vec4<f32>,
    // metalness, roughness, opacity, shininess
    params: vec4<f32>,
    // rgb specular, w = 1 for double-sided
    specular: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> object: Object;

struct MeshInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct MeshOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_mesh(in: MeshInput) -> MeshOutput {
    let world = object.model * vec4<f32>(in.position, 1.0);
    var out: MeshOutput;
    out.clip_position = frame.view_proj * world;
    out.world = world.xyz;
    out.normal = normalize((object.model * vec4<f32>(in.normal, 0.0)).xyz);
    out.uv = in.uv;
    return out;
}
"#;

/// Fullscreen environment background.
pub const SKY: &str = r#"
struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_sky(@builtin(vertex_index) index: u32) -> SkyOutput {
    let xy = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u)) * 2.0 - 1.0;
    var out: SkyOutput;
    out.clip_position = vec4<f32>(xy, 1.0, 1.0);
    out.ndc = xy;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    if frame.viewport.z < 0.5 {
        discard;
    }
    let near_point = frame.inv_view_proj * vec4<f32>(in.ndc, 0.0, 1.0);
    let far_point = frame.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let dir = far_point.xyz / far_point.w - near_point.xyz / near_point.w;
    return vec4<f32>(sample_environment(dir), 1.0);
}
"#;

/// Grid lines.
pub const GRID: &str = r#"
struct GridVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct GridOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_grid(vertex: GridVertex) -> GridOutput {
    let world = object.model * vec4<f32>(vertex.position, 1.0);
    var out: GridOutput;
    out.clip_position = frame.view_proj * world;
    out.world = world.xyz;
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_grid(in: GridOutput) -> @location(0) vec4<f32> {
    clip_to_plane(in.world);
    return in.color;
}
"#;

/// Textured Blinn-Phong, one draw per card face.
pub const PHONG: &str = r#"
@group(2) @binding(0)
var face_map: texture_2d<f32>;
@group(2) @binding(1)
var face_sampler: sampler;

@fragment
fn fs_phong(in: MeshOutput, @builtin(front_facing) is_front: bool) -> @location(0) vec4<f32> {
    let base = textureSample(face_map, face_sampler, in.uv);
    clip_to_plane(in.world);
    var n = normalize(in.normal);
    if !is_front && object.specular.w > 0.5 {
        n = -n;
    }
    let v = normalize(frame.camera_pos.xyz - in.world);
    let shininess = object.params.w;

    var diffuse = frame.ambient.rgb;
    var specular = vec3<f32>(0.0);
    let count = i32(frame.viewport.w);
    for (var i = 0; i < count; i++) {
        let l = normalize(frame.light_dir[i].xyz);
        let irradiance = max(dot(n, l), 0.0) * frame.light_color[i].rgb;
        diffuse += irradiance;
        let h = normalize(l + v);
        let lobe = (shininess * 0.5 + 1.0) * pow(max(dot(n, h), 0.0), shininess);
        specular += irradiance * lobe;
    }
    let rgb = base.rgb * diffuse / PI + object.specular.rgb * specular / PI;
    return vec4<f32>(rgb, base.a * object.params.z);
}
"#;

/// Metallic ground that mirrors the environment.
pub const STANDARD: &str = r#"
@fragment
fn fs_standard(in: MeshOutput, @builtin(front_facing) is_front: bool) -> @location(0) vec4<f32> {
    clip_to_plane(in.world);
    var n = normalize(in.normal);
    if !is_front {
        n = -n;
    }
    let v = normalize(frame.camera_pos.xyz - in.world);
    let metalness = object.params.x;
    let roughness = object.params.y;
    let base = object.color.rgb;

    let f0 = mix(vec3<f32>(0.04), base, metalness);
    let albedo = base * (1.0 - metalness);

    var diffuse = frame.ambient.rgb;
    var specular = vec3<f32>(0.0);
    let alpha = max(roughness * roughness, 0.002);
    let count = i32(frame.viewport.w);
    for (var i = 0; i < count; i++) {
        let l = normalize(frame.light_dir[i].xyz);
        let irradiance = max(dot(n, l), 0.0) * frame.light_color[i].rgb;
        diffuse += irradiance;
        let h = normalize(l + v);
        let nh = max(dot(n, h), 0.0);
        let denom = nh * nh * (alpha * alpha - 1.0) + 1.0;
        let ggx = alpha * alpha / (PI * denom * denom);
        specular += irradiance * ggx * 0.25;
    }

    var reflected = frame.ambient.rgb;
    if frame.viewport.z > 0.5 {
        reflected = sample_environment(reflect(-v, n));
    }
    let fresnel = f0 + (1.0 - f0) * pow(1.0 - max(dot(n, v), 0.0), 5.0);
    let gloss = 1.0 - roughness;

    let rgb = albedo * diffuse / PI + f0 * specular + reflected * fresnel * gloss;
    return vec4<f32>(rgb, object.params.z);
}
"#;

/// Planar mirror: samples the offscreen reflection in screen space.
pub const MIRROR: &str = r#"
@group(2) @binding(0)
var reflection: texture_2d<f32>;
@group(2) @binding(1)
var reflection_sampler: sampler;

fn overlay(base: f32, blend: f32) -> f32 {
    if base < 0.5 {
        return 2.0 * base * blend;
    }
    return 1.0 - 2.0 * (1.0 - base) * (1.0 - blend);
}

@fragment
fn fs_mirror(in: MeshOutput) -> @location(0) vec4<f32> {
    let uv = in.clip_position.xy / frame.viewport.xy;
    let base = textureSample(reflection, reflection_sampler, uv).rgb;
    clip_to_plane(in.world);
    let tint = object.color.rgb;
    return vec4<f32>(
        overlay(base.r, tint.r),
        overlay(base.g, tint.g),
        overlay(base.b, tint.b),
        1.0,
    );
}
"#;

/// Concatenate the frame prelude with the given stages.
pub fn module_source(parts: &[&str]) -> String {
    std::iter::once(FRAME).chain(parts.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_module_starts_with_frame_bindings() {
        let source = module_source(&[OBJECT, PHONG]);
        assert!(source.starts_with(FRAME));
        assert!(source.contains("fn vs_mesh"));
        assert!(source.contains("fn fs_phong"));
    }

    #[test]
    fn pipeline_modules_validate() {
        use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

        let modules: [&[&str]; 5] = [
            &[SKY],
            &[OBJECT, GRID],
            &[OBJECT, PHONG],
            &[OBJECT, STANDARD],
            &[OBJECT, MIRROR],
        ];
        for parts in modules {
            let source = module_source(parts);
            let module = wgpu::naga::front::wgsl::parse_str(&source)
                .unwrap_or_else(|e| panic!("{}", e.emit_to_string(&source)));
            Validator::new(ValidationFlags::all(), Capabilities::default())
                .validate(&module)
                .unwrap_or_else(|e| panic!("{e:?}"));
        }
    }

    #[test]
    fn entry_points_are_unique() {
        for name in ["vs_sky", "fs_sky", "vs_grid", "fs_grid", "vs_mesh", "fs_phong", "fs_standard", "fs_mirror"] {
            let count = [FRAME, OBJECT, SKY, GRID, PHONG, STANDARD, MIRROR]
                .iter()
                .filter(|s| s.contains(&format!("fn {name}(")))
                .count();
            assert_eq!(count, 1, "{name}");
        }
    }
}
