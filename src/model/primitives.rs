use super::vertex::{QuadVertex, SkyboxVertex};

const fn sky(x: f32, y: f32, z: f32) -> SkyboxVertex {
    SkyboxVertex {
        position: [x, y, z],
    }
}

/// Unit cube around the eye, 12 triangles, wound to face inward.
pub const SKYBOX_VERTICES: [SkyboxVertex; 36] = [
    // -Z
    sky(-1.0, 1.0, -1.0),
    sky(-1.0, -1.0, -1.0),
    sky(1.0, -1.0, -1.0),
    sky(1.0, -1.0, -1.0),
    sky(1.0, 1.0, -1.0),
    sky(-1.0, 1.0, -1.0),
    // -X
    sky(-1.0, -1.0, 1.0),
    sky(-1.0, -1.0, -1.0),
    sky(-1.0, 1.0, -1.0),
    sky(-1.0, 1.0, -1.0),
    sky(-1.0, 1.0, 1.0),
    sky(-1.0, -1.0, 1.0),
    // +X
    sky(1.0, -1.0, -1.0),
    sky(1.0, -1.0, 1.0),
    sky(1.0, 1.0, 1.0),
    sky(1.0, 1.0, 1.0),
    sky(1.0, 1.0, -1.0),
    sky(1.0, -1.0, -1.0),
    // +Z
    sky(-1.0, -1.0, 1.0),
    sky(-1.0, 1.0, 1.0),
    sky(1.0, 1.0, 1.0),
    sky(1.0, 1.0, 1.0),
    sky(1.0, -1.0, 1.0),
    sky(-1.0, -1.0, 1.0),
    // +Y
    sky(-1.0, 1.0, -1.0),
    sky(1.0, 1.0, -1.0),
    sky(1.0, 1.0, 1.0),
    sky(1.0, 1.0, 1.0),
    sky(-1.0, 1.0, 1.0),
    sky(-1.0, 1.0, -1.0),
    // -Y
    sky(-1.0, -1.0, -1.0),
    sky(-1.0, -1.0, 1.0),
    sky(1.0, -1.0, -1.0),
    sky(1.0, -1.0, -1.0),
    sky(-1.0, -1.0, 1.0),
    sky(1.0, -1.0, 1.0),
];

/// Unit quad in the XY plane, triangle strip order.
pub const GLASS_QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
        tex_coords: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
        tex_coords: [1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
        tex_coords: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
        tex_coords: [1.0, 1.0],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skybox_cube_spans_unit_box() {
        assert_eq!(SKYBOX_VERTICES.len(), 36);
        for v in &SKYBOX_VERTICES {
            assert!(v.position.iter().all(|c| c.abs() == 1.0));
        }
        // Each face has one fixed coordinate shared by all six of its corners
        for face in SKYBOX_VERTICES.chunks(6) {
            let fixed = (0..3).filter(|&axis| face.iter().all(|v| v.position[axis] == face[0].position[axis]));
            assert_eq!(fixed.count(), 1);
        }
    }

    #[test]
    fn test_glass_quad_covers_unit_square() {
        let corners: Vec<_> = GLASS_QUAD_VERTICES.iter().map(|v| (v.position[0], v.position[1])).collect();
        for corner in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            assert!(corners.contains(&corner));
        }
        for v in &GLASS_QUAD_VERTICES {
            assert_eq!(v.position[2], 0.0);
            assert_eq!(v.tex_coords, [(v.position[0] + 1.0) / 2.0, (v.position[1] + 1.0) / 2.0]);
        }
    }
}
