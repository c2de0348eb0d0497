use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use retro_scene::{PhongMaterial, SceneLighting};

/// Film-grain backdrop drawn behind the computer. Values are authored in
/// display space and converted so the sRGB target stores them unchanged.
pub(super) const BACKGROUND_SHADER_SOURCE: &str = r#"
struct BackgroundUniforms {
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> background: BackgroundUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}

fn random(st: vec2<f32>) -> f32 {
    return fract(sin(dot(st, vec2<f32>(12.9898, 78.233))) * 43758.5453123);
}

fn to_linear(color: vec3<f32>) -> vec3<f32> {
    let low = color / 12.92;
    let high = pow((color + 0.055) / 1.055, vec3<f32>(2.4));
    return select(high, low, color <= vec3<f32>(0.04045));
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let st = input.uv;
    let time = background.params.x;
    let noise = random(st + time * 0.1) * 0.015;
    var color = vec3<f32>(0.12) + vec3<f32>(noise);
    let vignette = 1.0 - smoothstep(0.5, 1.5, length(st - 0.5) * 2.0);
    color = color * (0.8 + vignette * 0.2);
    return vec4<f32>(to_linear(color), 1.0);
}
"#;

pub(super) const MESH_SHADER_SOURCE: &str = r#"
struct CameraUniforms {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    ambient: vec4<f32>,
    key_light: vec4<f32>,
    point_light: vec4<f32>,
};

struct PartUniforms {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    specular: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniforms;
@group(1) @binding(0)
var<uniform> part: PartUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    let world = part.model * vec4<f32>(input.position, 1.0);
    var out: VertexOutput;
    out.position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (part.normal * vec4<f32>(input.normal, 0.0)).xyz;
    out.uv = input.uv;
    return out;
}

fn blinn_phong(
    normal: vec3<f32>,
    view_dir: vec3<f32>,
    light_dir: vec3<f32>,
    radiance: f32,
) -> vec3<f32> {
    let diffuse = max(dot(normal, light_dir), 0.0);
    let half_dir = normalize(light_dir + view_dir);
    let shininess = part.specular.w;
    let highlight = pow(max(dot(normal, half_dir), 0.0), shininess) * step(0.0, diffuse);
    return radiance * (part.color.rgb * diffuse + part.specular.rgb * highlight);
}

@fragment
fn fs_phong(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let view_dir = normalize(camera.eye.xyz - input.world_pos);

    var color = part.color.rgb * camera.ambient.rgb;
    color += blinn_phong(normal, view_dir, normalize(camera.key_light.xyz), camera.key_light.w);

    let to_point = camera.point_light.xyz - input.world_pos;
    let distance_sq = max(dot(to_point, to_point), 0.0001);
    color += blinn_phong(
        normal,
        view_dir,
        normalize(to_point),
        camera.point_light.w / distance_sq,
    );
    return vec4<f32>(color, part.color.a);
}

@group(2) @binding(0)
var screen_texture: texture_2d<f32>;
@group(2) @binding(1)
var screen_sampler: sampler;

@fragment
fn fs_screen(input: VertexOutput) -> @location(0) vec4<f32> {
    let uv = clamp(input.uv, vec2<f32>(0.0, 0.0), vec2<f32>(1.0, 1.0));
    return textureSample(screen_texture, screen_sampler, uv);
}
"#;

/// Presents the offscreen scene with the scroll-driven blur and fade.
pub(super) const COMPOSITE_SHADER_SOURCE: &str = r#"
struct CompositeUniforms {
    params: vec4<f32>,
    flags: vec4<f32>,
};

@group(0) @binding(0)
var scene_texture: texture_2d<f32>;
@group(0) @binding(1)
var scene_sampler: sampler;
@group(0) @binding(2)
var<uniform> composite: CompositeUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}

fn encode_srgb(color: vec3<f32>) -> vec3<f32> {
    let low = color * 12.92;
    let high = 1.055 * pow(color, vec3<f32>(1.0 / 2.4)) - 0.055;
    return select(high, low, color <= vec3<f32>(0.0031308));
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let texel = composite.params.xy;
    let sigma = composite.params.z;
    let opacity = composite.params.w;

    var color = vec3<f32>(0.0);
    if sigma < 0.01 {
        color = textureSampleLevel(scene_texture, scene_sampler, input.uv, 0.0).rgb;
    } else {
        let spacing = max(sigma * 0.5, 1.0);
        var total = 0.0;
        for (var y = -4; y <= 4; y = y + 1) {
            for (var x = -4; x <= 4; x = x + 1) {
                let offset = vec2<f32>(f32(x), f32(y)) * spacing;
                let weight = exp(-dot(offset, offset) / (2.0 * sigma * sigma));
                let uv = input.uv + offset * texel;
                color += textureSampleLevel(scene_texture, scene_sampler, uv, 0.0).rgb * weight;
                total += weight;
            }
        }
        color = color / total;
    }

    if composite.flags.x > 0.5 {
        color = encode_srgb(color);
    }
    return vec4<f32>(color, opacity);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub ambient: [f32; 4],
    pub key_light: [f32; 4],
    pub point_light: [f32; 4],
}

impl CameraUniforms {
    pub fn new(view_proj: Mat4, eye: Vec3, lighting: &SceneLighting) -> Self {
        let key = lighting.directional_position.normalize_or_zero();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            ambient: [lighting.ambient, lighting.ambient, lighting.ambient, 1.0],
            key_light: key.extend(lighting.directional_intensity).to_array(),
            point_light: lighting
                .point_position
                .extend(lighting.point_intensity)
                .to_array(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct PartUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub specular: [f32; 4],
}

impl PartUniforms {
    pub fn new(model: Mat4, material: Option<&PhongMaterial>) -> Self {
        let normal = Mat4::from_mat3(Mat3::from_mat4(model).inverse().transpose());
        let (color, specular) = match material {
            Some(material) => (
                [material.color[0], material.color[1], material.color[2], 1.0],
                [
                    material.specular[0],
                    material.specular[1],
                    material.specular[2],
                    material.shininess,
                ],
            ),
            None => ([1.0; 4], [0.0, 0.0, 0.0, 1.0]),
        };
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            color,
            specular,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct BackgroundUniforms {
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct CompositeUniforms {
    pub params: [f32; 4],
    pub flags: [f32; 4],
}

impl CompositeUniforms {
    pub fn new(size: (u32, u32), sigma_px: f32, opacity: f32, encode_srgb: bool) -> Self {
        Self {
            params: [
                1.0 / size.0.max(1) as f32,
                1.0 / size.1.max(1) as f32,
                sigma_px.max(0.0),
                opacity.clamp(0.0, 1.0),
            ],
            flags: [if encode_srgb { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 128);
        assert_eq!(std::mem::size_of::<PartUniforms>(), 160);
        assert_eq!(std::mem::size_of::<CompositeUniforms>(), 32);
    }

    #[test]
    fn key_light_points_from_upper_right() {
        let uniforms = CameraUniforms::new(Mat4::IDENTITY, Vec3::ZERO, &SceneLighting::default());
        let [x, y, z, intensity] = uniforms.key_light;
        assert!((x - y).abs() < 1e-6 && (y - z).abs() < 1e-6 && x > 0.0);
        assert_eq!(intensity, 1.0);
        assert_eq!(uniforms.point_light, [0.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn composite_clamps_opacity() {
        let uniforms = CompositeUniforms::new((200, 100), -2.0, 1.4, true);
        assert_eq!(uniforms.params, [0.005, 0.01, 0.0, 1.0]);
        assert_eq!(uniforms.flags[0], 1.0);
    }
}
