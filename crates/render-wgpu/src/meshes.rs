use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::ops::Range;
use vitrine_scene::{GridHelper, PlaneGeometry};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Subdivided plane in local XY, facing +Z, centered on the origin.
pub(crate) fn plane_mesh(geometry: &PlaneGeometry) -> (Vec<Vertex>, Vec<u32>) {
    let segments_x = geometry.width_segments.max(1);
    let segments_y = geometry.height_segments.max(1);
    let half_w = geometry.width / 2.0;
    let half_h = geometry.height / 2.0;
    let step_x = geometry.width / segments_x as f32;
    let step_y = geometry.height / segments_y as f32;
    let row = segments_x + 1;

    let mut vertices = Vec::with_capacity((row * (segments_y + 1)) as usize);
    for iy in 0..=segments_y {
        let y = half_h - iy as f32 * step_y;
        for ix in 0..=segments_x {
            let x = ix as f32 * step_x - half_w;
            vertices.push(Vertex {
                position: [x, y, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [
                    ix as f32 / segments_x as f32,
                    iy as f32 / segments_y as f32,
                ],
            });
        }
    }

    let mut indices = Vec::with_capacity((segments_x * segments_y * 6) as usize);
    for iy in 0..segments_y {
        for ix in 0..segments_x {
            let a = ix + row * iy;
            let b = ix + row * (iy + 1);
            let c = ix + 1 + row * (iy + 1);
            let d = ix + 1 + row * iy;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    (vertices, indices)
}

/// Box of `size` centered on the origin, four vertices per face.
///
/// Faces come in material order (+X, -X, +Y, -Y, +Z, -Z); the returned
/// ranges index into the index buffer, one per face. Each face's texture
/// origin is its top-left corner as seen from outside the box.
pub(crate) fn card_mesh(size: Vec3) -> (Vec<Vertex>, Vec<u16>, [Range<u32>; 6]) {
    let h = size / 2.0;
    // (top-left corner, right edge, down edge, outward normal)
    let faces = [
        (Vec3::new(h.x, h.y, h.z), Vec3::new(0.0, 0.0, -size.z), Vec3::new(0.0, -size.y, 0.0), Vec3::X),
        (Vec3::new(-h.x, h.y, -h.z), Vec3::new(0.0, 0.0, size.z), Vec3::new(0.0, -size.y, 0.0), Vec3::NEG_X),
        (Vec3::new(-h.x, h.y, -h.z), Vec3::new(size.x, 0.0, 0.0), Vec3::new(0.0, 0.0, size.z), Vec3::Y),
        (Vec3::new(-h.x, -h.y, h.z), Vec3::new(size.x, 0.0, 0.0), Vec3::new(0.0, 0.0, -size.z), Vec3::NEG_Y),
        (Vec3::new(-h.x, h.y, h.z), Vec3::new(size.x, 0.0, 0.0), Vec3::new(0.0, -size.y, 0.0), Vec3::Z),
        (Vec3::new(h.x, h.y, -h.z), Vec3::new(-size.x, 0.0, 0.0), Vec3::new(0.0, -size.y, 0.0), Vec3::NEG_Z),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    let ranges = std::array::from_fn(|face| {
        let (corner, right, down, normal) = faces[face];
        let base = vertices.len() as u16;
        for (offset, uv) in [
            (Vec3::ZERO, [0.0, 0.0]),
            (right, [1.0, 0.0]),
            (right + down, [1.0, 1.0]),
            (down, [0.0, 1.0]),
        ] {
            vertices.push(Vertex {
                position: (corner + offset).to_array(),
                normal: normal.to_array(),
                uv,
            });
        }
        let start = indices.len() as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        start..indices.len() as u32
    });
    (vertices, indices, ranges)
}

/// Line list for a grid in the local XZ plane.
pub(crate) fn grid_mesh(grid: &GridHelper) -> Vec<GridVertex> {
    let half = grid.size / 2.0;
    let step = grid.step();
    let center = grid.divisions / 2;
    let rgba = |c: [f32; 3]| [c[0], c[1], c[2], 1.0];
    let center_color = rgba(grid.center_color.to_linear());
    let line_color = rgba(grid.line_color.to_linear());

    let mut verts = Vec::with_capacity(((grid.divisions + 1) * 4) as usize);
    for i in 0..=grid.divisions {
        let k = -half + i as f32 * step;
        let color = if i == center { center_color } else { line_color };
        verts.push(GridVertex { position: [-half, 0.0, k], color });
        verts.push(GridVertex { position: [half, 0.0, k], color });
        verts.push(GridVertex { position: [k, 0.0, -half], color });
        verts.push(GridVertex { position: [k, 0.0, half], color });
    }
    verts
}

/// Mirror across the horizontal plane `y = height`.
pub(crate) fn reflection_matrix(height: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, height, 0.0))
        * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
        * Mat4::from_translation(Vec3::new(0.0, -height, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_common::Color;

    #[test]
    fn plane_counts() {
        let geometry = PlaneGeometry {
            width: 100_000.0,
            height: 100_000.0,
            width_segments: 100,
            height_segments: 100,
        };
        let (vertices, indices) = plane_mesh(&geometry);
        assert_eq!(vertices.len(), 101 * 101);
        assert_eq!(indices.len(), 100 * 100 * 6);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        assert_eq!(vertices[0].position, [-50_000.0, 50_000.0, 0.0]);
        assert_eq!(vertices.last().unwrap().position, [50_000.0, -50_000.0, 0.0]);
    }

    #[test]
    fn card_faces_follow_material_order() {
        let (vertices, indices, ranges) = card_mesh(Vec3::new(118.1, 174.8, 0.1));
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert_eq!(ranges[0], 0..6);
        assert_eq!(ranges[5], 30..36);

        let normals = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (face, normal) in normals.iter().enumerate() {
            for v in &vertices[face * 4..face * 4 + 4] {
                assert_eq!(Vec3::from(v.normal), *normal);
                // Every vertex of a face sits on that face's side of the box.
                assert!(Vec3::from(v.position).dot(*normal) > 0.0);
            }
        }
    }

    #[test]
    fn card_front_is_upright() {
        let (vertices, _, _) = card_mesh(Vec3::new(2.0, 4.0, 0.1));
        let front = &vertices[16..20];
        assert_eq!(front[0].uv, [0.0, 0.0]);
        assert_eq!(front[0].position, [-1.0, 2.0, 0.05]);
        assert_eq!(front[2].uv, [1.0, 1.0]);
        assert_eq!(front[2].position, [1.0, -2.0, 0.05]);
    }

    #[test]
    fn grid_lines() {
        let grid = GridHelper {
            size: 10_000.0,
            divisions: 250,
            center_color: Color::rgb(1.0, 0.0, 0.0),
            line_color: Color::from_hex(0xf2f2f2),
        };
        let verts = grid_mesh(&grid);
        assert_eq!(verts.len(), 251 * 4);
        assert_eq!(verts[0].position, [-5000.0, 0.0, -5000.0]);
        let center = &verts[125 * 4];
        assert_eq!(center.position, [-5000.0, 0.0, 0.0]);
        assert_eq!(center.color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn reflection_flips_about_plane() {
        let m = reflection_matrix(-100.0);
        let p = m.transform_point3(Vec3::new(3.0, -90.0, 4.0));
        assert!((p - Vec3::new(3.0, -110.0, 4.0)).length() < 1e-4);
        let on_plane = m.transform_point3(Vec3::new(7.0, -100.0, 0.0));
        assert!((on_plane - Vec3::new(7.0, -100.0, 0.0)).length() < 1e-4);
    }
}
