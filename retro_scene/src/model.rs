//! Procedural geometry for the retro computer: a monitor built from bevelled
//! extrusions, the textured screen plane, and an optional keyboard.
//!
//! Every part is kept in its own local space with a transform, the same way a
//! scene graph would hold it, so the renderer can upload one buffer per part
//! and apply the layout scale as a single root matrix.

use std::f32::consts::FRAC_PI_2;

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3};

pub const KEY_COLUMNS: i32 = 10;
pub const KEY_ROWS: i32 = 4;
pub const KEY_PITCH_X: f32 = 0.1;
pub const KEY_PITCH_Z: f32 = 0.08;
const KEYBOARD_Z: f32 = 1.3;

const SCREEN_CENTER_Y: f32 = 1.35;
const MONITOR_TILT: f32 = -0.1;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
        });
        index
    }

    /// Flat-shaded quad; corners are wound counter-clockwise seen from the
    /// side the normal points to.
    fn push_quad(&mut self, corners: [Vec3; 4], uvs: [Vec2; 4]) {
        let normal = (corners[1] - corners[0])
            .cross(corners[3] - corners[0])
            .try_normalize()
            .or_else(|| {
                (corners[2] - corners[1])
                    .cross(corners[0] - corners[1])
                    .try_normalize()
            })
            .unwrap_or(Vec3::Z);
        let base = self.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            self.push_vertex(*corner, normal, *uv);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Copies `other` into this mesh with `transform` applied to positions and
    /// its inverse transpose applied to normals.
    pub fn append(&mut self, other: &Mesh, transform: Mat4) {
        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().map(|vertex| {
            let position = transform.transform_point3(Vec3::from(vertex.position));
            let normal = (normal_matrix * Vec3::from(vertex.normal)).normalize_or_zero();
            MeshVertex {
                position: position.into(),
                normal: normal.into(),
                uv: vertex.uv,
            }
        }));
        self.indices
            .extend(other.indices.iter().map(|index| index + base));
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.vertices.iter().map(|vertex| Vec3::from(vertex.position));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), point| {
            (min.min(point), max.max(point))
        }))
    }
}

/// Outline of a rounded rectangle centred on the origin, counter-clockwise,
/// with each corner approximated by a quadratic curve through `segments`
/// steps.
pub fn rounded_rect_outline(width: f32, height: f32, radius: f32, segments: u32) -> Vec<Vec2> {
    let w = width / 2.0;
    let h = height / 2.0;
    let r = radius.clamp(0.0, w.min(h));
    let corners = [
        (Vec2::new(w - r, -h), Vec2::new(w, -h), Vec2::new(w, -h + r)),
        (Vec2::new(w, h - r), Vec2::new(w, h), Vec2::new(w - r, h)),
        (Vec2::new(-w + r, h), Vec2::new(-w, h), Vec2::new(-w, h - r)),
        (Vec2::new(-w, -h + r), Vec2::new(-w, -h), Vec2::new(-w + r, -h)),
    ];
    let mut outline = Vec::new();
    for (start, control, end) in corners {
        push_quadratic(&mut outline, start, control, end, segments);
    }
    dedup_outline(outline)
}

/// Screen bezel outline: the top-left corner is cut diagonally and the other
/// three are rounded.
pub fn frame_outline(half_width: f32, half_height: f32, radius: f32, segments: u32) -> Vec<Vec2> {
    let w = half_width;
    let h = half_height;
    let r = radius.clamp(0.0, w.min(h));
    let mut outline = vec![Vec2::new(-w, h - r)];
    push_quadratic(
        &mut outline,
        Vec2::new(w - r, h),
        Vec2::new(w, h),
        Vec2::new(w, h - r),
        segments,
    );
    push_quadratic(
        &mut outline,
        Vec2::new(w, -h + r),
        Vec2::new(w, -h),
        Vec2::new(w - r, -h),
        segments,
    );
    push_quadratic(
        &mut outline,
        Vec2::new(-w + r, -h),
        Vec2::new(-w, -h),
        Vec2::new(-w, -h + r),
        segments,
    );
    // wound clockwise above; flip so sides face outward
    outline.reverse();
    dedup_outline(outline)
}

fn push_quadratic(outline: &mut Vec<Vec2>, start: Vec2, control: Vec2, end: Vec2, segments: u32) {
    let steps = segments.max(1);
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let inv = 1.0 - t;
        outline.push(start * inv * inv + control * 2.0 * inv * t + end * t * t);
    }
}

fn dedup_outline(mut outline: Vec<Vec2>) -> Vec<Vec2> {
    outline.dedup_by(|a, b| a.distance_squared(*b) < 1e-10);
    while outline.len() > 1 {
        let (first, last) = (outline[0], outline[outline.len() - 1]);
        if first.distance_squared(last) < 1e-10 {
            outline.pop();
        } else {
            break;
        }
    }
    outline
}

#[derive(Debug, Clone, Copy)]
pub struct Bevel {
    pub thickness: f32,
    pub size: f32,
    pub segments: u32,
}

/// Extrudes a convex counter-clockwise outline from z = 0 to z = `depth`,
/// adding bevel rings that grow the outline by `bevel.size` while the caps
/// sit `bevel.thickness` beyond each end.
pub fn extrude(outline: &[Vec2], depth: f32, bevel: Bevel) -> Mesh {
    let mut mesh = Mesh::default();
    if outline.len() < 3 {
        return mesh;
    }

    let segments = bevel.segments.max(1);
    let mut rings: Vec<(f32, f32)> = Vec::with_capacity(2 * (segments as usize + 1));
    for step in 0..=segments {
        let angle = step as f32 / segments as f32 * FRAC_PI_2;
        rings.push((-bevel.thickness * angle.cos(), bevel.size * angle.sin()));
    }
    for step in (0..=segments).rev() {
        let angle = step as f32 / segments as f32 * FRAC_PI_2;
        rings.push((depth + bevel.thickness * angle.cos(), bevel.size * angle.sin()));
    }

    let miters = miter_vectors(outline);
    let ring_points: Vec<Vec<Vec3>> = rings
        .iter()
        .map(|(z, grow)| {
            outline
                .iter()
                .zip(miters.iter())
                .map(|(point, miter)| (*point + *miter * *grow).extend(*z))
                .collect()
        })
        .collect();

    let count = outline.len();
    let ring_span = (rings.len() - 1) as f32;
    for (ring_index, pair) in ring_points.windows(2).enumerate() {
        let (back, front) = (&pair[0], &pair[1]);
        let v0 = ring_index as f32 / ring_span;
        let v1 = (ring_index + 1) as f32 / ring_span;
        for i in 0..count {
            let next = (i + 1) % count;
            let u0 = i as f32 / count as f32;
            let u1 = (i + 1) as f32 / count as f32;
            mesh.push_quad(
                [back[i], back[next], front[next], front[i]],
                [
                    Vec2::new(u0, v0),
                    Vec2::new(u1, v0),
                    Vec2::new(u1, v1),
                    Vec2::new(u0, v1),
                ],
            );
        }
    }

    let back_z = -bevel.thickness;
    let front_z = depth + bevel.thickness;
    push_cap(&mut mesh, outline, back_z, false);
    push_cap(&mut mesh, outline, front_z, true);
    mesh
}

/// Per-vertex offsets that move each edge of the outline outward by one
/// unit.
fn miter_vectors(outline: &[Vec2]) -> Vec<Vec2> {
    let count = outline.len();
    (0..count)
        .map(|i| {
            let prev = outline[(i + count - 1) % count];
            let point = outline[i];
            let next = outline[(i + 1) % count];
            let n1 = edge_normal(prev, point);
            let n2 = edge_normal(point, next);
            let direction = (n1 + n2).try_normalize().unwrap_or(n1);
            let cos = direction.dot(n1).max(0.2);
            direction / cos
        })
        .collect()
}

fn edge_normal(from: Vec2, to: Vec2) -> Vec2 {
    let edge = to - from;
    Vec2::new(edge.y, -edge.x).normalize_or_zero()
}

fn push_cap(mesh: &mut Mesh, outline: &[Vec2], z: f32, facing_front: bool) {
    let (min, max) = outline
        .iter()
        .fold((outline[0], outline[0]), |(min, max), point| {
            (min.min(*point), max.max(*point))
        });
    let extent = (max - min).max(Vec2::splat(f32::EPSILON));
    let uv_of = |point: Vec2| (point - min) / extent;
    let normal = if facing_front { Vec3::Z } else { Vec3::NEG_Z };

    let centroid = outline.iter().copied().sum::<Vec2>() / outline.len() as f32;
    let center = mesh.push_vertex(centroid.extend(z), normal, uv_of(centroid));
    let first = mesh.vertices.len() as u32;
    for point in outline {
        mesh.push_vertex(point.extend(z), normal, uv_of(*point));
    }
    let count = outline.len() as u32;
    for i in 0..count {
        let current = first + i;
        let next = first + (i + 1) % count;
        if facing_front {
            mesh.indices.extend_from_slice(&[center, current, next]);
        } else {
            mesh.indices.extend_from_slice(&[center, next, current]);
        }
    }
}

pub fn rounded_box(width: f32, height: f32, depth: f32, radius: f32, segments: u32) -> Mesh {
    extrude(
        &rounded_rect_outline(width, height, radius, segments),
        depth,
        Bevel {
            thickness: radius,
            size: radius,
            segments,
        },
    )
}

/// Axis-aligned box centred on the origin.
pub fn build_box(width: f32, height: f32, depth: f32) -> Mesh {
    #[rustfmt::skip]
    let faces: [[[f32; 3]; 4]; 6] = [
        // +X
        [[0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5], [0.5, -0.5, 0.5]],
        // -X
        [[-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5], [-0.5, -0.5, -0.5]],
        // +Y
        [[-0.5, 0.5, -0.5], [-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5]],
        // -Y
        [[-0.5, -0.5, 0.5], [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5]],
        // +Z
        [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]],
        // -Z
        [[0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5]],
    ];

    let size = Vec3::new(width, height, depth);
    let uvs = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
    let mut mesh = Mesh::default();
    for corners in faces {
        mesh.push_quad(corners.map(|corner| Vec3::from(corner) * size), uvs);
    }
    mesh
}

/// Plane in the XY plane facing +Z. Texture row 0 maps to the top edge.
pub fn build_plane(width: f32, height: f32) -> Mesh {
    let w = width / 2.0;
    let h = height / 2.0;
    let mut mesh = Mesh::default();
    mesh.push_quad(
        [
            Vec3::new(-w, -h, 0.0),
            Vec3::new(w, -h, 0.0),
            Vec3::new(w, h, 0.0),
            Vec3::new(-w, h, 0.0),
        ],
        [Vec2::Y, Vec2::ONE, Vec2::X, Vec2::ZERO],
    );
    mesh
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub color: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

impl PhongMaterial {
    pub fn from_hex(color: u32, specular: u32, shininess: f32) -> Self {
        Self {
            color: hex_to_linear(color),
            specular: hex_to_linear(specular),
            shininess,
        }
    }

    pub fn plastic() -> Self {
        Self::from_hex(0x111111, 0x222222, 30.0)
    }

    pub fn bezel() -> Self {
        Self::from_hex(0x111111, 0x222222, 50.0)
    }

    pub fn key() -> Self {
        Self::from_hex(0xFFFFFF, 0x999999, 100.0)
    }
}

fn hex_to_linear(value: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let srgb = ((value >> shift) & 0xFF) as f32 / 255.0;
        if srgb <= 0.04045 {
            srgb / 12.92
        } else {
            ((srgb + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartSurface {
    Phong(PhongMaterial),
    /// Unlit, sampled from the boot screen texture.
    ScreenTexture,
}

#[derive(Debug, Clone)]
pub struct ModelPart {
    pub name: &'static str,
    pub mesh: Mesh,
    pub transform: Mat4,
    pub surface: PartSurface,
}

/// Light rig the scene is lit with: ambient fill, a key light from the upper
/// right and a point light in front of the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLighting {
    pub ambient: f32,
    pub directional_position: Vec3,
    pub directional_intensity: f32,
    pub point_position: Vec3,
    pub point_intensity: f32,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            ambient: 2.0,
            directional_position: Vec3::new(5.0, 5.0, 5.0),
            directional_intensity: 1.0,
            point_position: Vec3::new(0.0, 2.0, 3.0),
            point_intensity: 1.0,
        }
    }
}

pub struct ComputerModel {
    parts: Vec<ModelPart>,
    key_count: usize,
}

impl ComputerModel {
    pub fn build(keyboard: bool) -> Self {
        let mut parts = Vec::new();

        parts.push(ModelPart {
            name: "base",
            mesh: rounded_box(3.2, 1.6, 0.2, 0.1, 6),
            transform: placed(Vec3::new(0.0, -0.1, 0.0), FRAC_PI_2),
            surface: PartSurface::Phong(PhongMaterial::plastic()),
        });
        parts.push(ModelPart {
            name: "neck",
            mesh: rounded_box(0.4, 0.4, 0.4, 0.05, 4),
            transform: placed(Vec3::new(0.0, 0.2, 0.0), 0.0),
            surface: PartSurface::Phong(PhongMaterial::plastic()),
        });
        parts.push(ModelPart {
            name: "head",
            mesh: rounded_box(3.0, 2.0, 1.0, 0.15, 8),
            transform: placed(Vec3::new(0.0, 1.3, -0.5), MONITOR_TILT),
            surface: PartSurface::Phong(PhongMaterial::plastic()),
        });
        parts.push(ModelPart {
            name: "frame",
            mesh: extrude(
                &frame_outline(1.2, 0.8, 0.5, 12),
                0.05,
                Bevel {
                    thickness: 0.02,
                    size: 0.02,
                    segments: 5,
                },
            ),
            transform: placed(Vec3::new(0.0, SCREEN_CENTER_Y, 0.45), MONITOR_TILT),
            surface: PartSurface::Phong(PhongMaterial::bezel()),
        });
        parts.push(ModelPart {
            name: "screen",
            mesh: build_plane(2.2, 1.4),
            transform: placed(Vec3::new(0.0, SCREEN_CENTER_Y, 0.7), MONITOR_TILT),
            surface: PartSurface::ScreenTexture,
        });

        let mut key_count = 0;
        if keyboard {
            parts.push(ModelPart {
                name: "keyboard",
                mesh: build_box(2.2, 0.15, 0.8),
                transform: Mat4::from_translation(Vec3::new(0.0, -0.1, KEYBOARD_Z)),
                surface: PartSurface::Phong(PhongMaterial::plastic()),
            });
            let key = build_box(0.08, 0.05, 0.08);
            let mut keys = Mesh::default();
            for column in -KEY_COLUMNS..=KEY_COLUMNS {
                for row in -KEY_ROWS..=KEY_ROWS {
                    let offset = Vec3::new(
                        column as f32 * KEY_PITCH_X,
                        0.0,
                        row as f32 * KEY_PITCH_Z + KEYBOARD_Z,
                    );
                    keys.append(&key, Mat4::from_translation(offset));
                    key_count += 1;
                }
            }
            parts.push(ModelPart {
                name: "keys",
                mesh: keys,
                transform: Mat4::IDENTITY,
                surface: PartSurface::Phong(PhongMaterial::key()),
            });
        }

        log::debug!(
            "built computer model: {} parts, {} triangles, {} keys",
            parts.len(),
            parts.iter().map(|part| part.mesh.triangle_count()).sum::<usize>(),
            key_count
        );
        Self { parts, key_count }
    }

    pub fn parts(&self) -> &[ModelPart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&ModelPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    pub fn screen(&self) -> Option<&ModelPart> {
        self.parts
            .iter()
            .find(|part| part.surface == PartSurface::ScreenTexture)
    }

    pub fn key_count(&self) -> usize {
        self.key_count
    }

    /// Root transform for a layout scale.
    pub fn root_transform(scale: f32) -> Mat4 {
        Mat4::from_scale(Vec3::splat(scale))
    }
}

fn placed(position: Vec3, tilt_x: f32) -> Mat4 {
    let rotation = Quat::from_euler(EulerRot::XYZ, tilt_x, 0.0, 0.0);
    Mat4::from_rotation_translation(rotation, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(mesh: &Mesh) {
        assert_eq!(mesh.indices.len() % 3, 0);
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|index| *index < count));
    }

    #[test]
    fn rounded_outline_stays_inside_bounds() {
        let outline = rounded_rect_outline(3.0, 2.0, 0.15, 8);
        assert_eq!(outline.len(), 4 * 9);
        for point in &outline {
            assert!(point.x.abs() <= 1.5 + 1e-5 && point.y.abs() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn extrusion_bevel_grows_outline() {
        let mesh = rounded_box(1.0, 1.0, 0.4, 0.1, 4);
        assert_indices_in_range(&mesh);
        let (min, max) = mesh.bounds().expect("bounds");
        assert!((max.x - 0.6).abs() < 1e-3, "{max:?}");
        assert!((min.z + 0.1).abs() < 1e-4 && (max.z - 0.5).abs() < 1e-4);
    }

    #[test]
    fn side_normals_face_outward() {
        let mesh = rounded_box(1.0, 1.0, 0.4, 0.1, 4);
        for vertex in &mesh.vertices {
            let position = Vec3::from(vertex.position);
            let normal = Vec3::from(vertex.normal);
            let center = Vec3::new(0.0, 0.0, 0.2);
            assert!(normal.dot(position - center) > -1e-4, "{vertex:?}");
        }
    }

    #[test]
    fn box_faces_point_away_from_center() {
        let mesh = build_box(2.0, 1.0, 0.5);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        for vertex in &mesh.vertices {
            let position = Vec3::from(vertex.position);
            assert!(Vec3::from(vertex.normal).dot(position) > 0.0);
        }
    }

    #[test]
    fn plane_maps_top_edge_to_first_texture_row() {
        let mesh = build_plane(2.2, 1.4);
        for vertex in &mesh.vertices {
            let expected_v = if vertex.position[1] > 0.0 { 0.0 } else { 1.0 };
            assert_eq!(vertex.uv[1], expected_v);
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn monitor_without_keyboard() {
        let model = ComputerModel::build(false);
        let names: Vec<_> = model.parts().iter().map(|part| part.name).collect();
        assert_eq!(names, vec!["base", "neck", "head", "frame", "screen"]);
        assert_eq!(model.key_count(), 0);
        let screen = model.screen().expect("screen part");
        let center = screen.transform.transform_point3(Vec3::ZERO);
        assert!((center - Vec3::new(0.0, 1.35, 0.7)).length() < 1e-5);
        for part in model.parts() {
            assert_indices_in_range(&part.mesh);
        }
    }

    #[test]
    fn keyboard_has_full_key_grid() {
        let model = ComputerModel::build(true);
        assert_eq!(model.key_count(), 21 * 9);
        let keys = model.part("keys").expect("keys");
        assert_eq!(keys.mesh.vertices.len(), 189 * 24);
        assert_indices_in_range(&keys.mesh);
        assert!(model.part("keyboard").is_some());
        let (min, max) = keys.mesh.bounds().expect("bounds");
        assert!((min.x + 1.04).abs() < 1e-4 && (max.x - 1.04).abs() < 1e-4);
        assert!((min.z - (1.3 - 0.36)).abs() < 1e-4);
    }

    #[test]
    fn frame_outline_is_counter_clockwise() {
        let outline = frame_outline(1.2, 0.8, 0.5, 12);
        let area: f32 = outline
            .iter()
            .zip(outline.iter().cycle().skip(1))
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum();
        assert!(area > 0.0);
    }
}
