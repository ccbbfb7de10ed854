use glam::{Mat4, Vec3};

/// Model-space placement recipe.
///
/// The matrix is rebuilt from these fixed parameters every frame; only the
/// rotation angle varies, and it is supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation_axis: Option<Vec3>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation_axis: None,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation_axis(mut self, axis: Vec3) -> Self {
        self.rotation_axis = Some(axis);
        self
    }

    /// translate * scale * rotate, with the angle in degrees.
    pub fn to_matrix(&self, angle_degrees: f32) -> Mat4 {
        let translation = Mat4::from_translation(self.position);
        let scale = Mat4::from_scale(self.scale);
        let rotation = match self.rotation_axis {
            Some(axis) => Mat4::from_axis_angle(axis.normalize(), angle_degrees.to_radians()),
            None => Mat4::IDENTITY,
        };
        translation * scale * rotation
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
