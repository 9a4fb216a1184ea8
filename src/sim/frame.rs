use super::math::{Float3, Quaternion};

/// Below this magnitude `tangent x world-up` is treated as degenerate
/// (tangent within ~0.6 degrees of vertical).
const VERTICAL_EPSILON: f32 = 1e-2;

/// Orthonormal reference frame riding on the rail.
///
/// Right-handed with three orthogonal unit vectors:
/// - `tangent`: direction of travel
/// - `up`: rider's head direction (not necessarily world-up)
/// - `right`: `tangent x up`
///
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub tangent: Float3,
    pub up: Float3,
    pub right: Float3,
}

impl Frame {
    pub const fn new(tangent: Float3, up: Float3, right: Float3) -> Self {
        Self { tangent, up, right }
    }

    /// Level frame travelling along +X.
    pub const DEFAULT: Self = Self::new(Float3::RIGHT, Float3::UP, Float3::FORWARD);

    /// Builds the world-up anchored frame for a tangent.
    ///
    /// `right = tangent x worldUp`, `up = right x tangent`. When the tangent is
    /// near vertical the cross product degenerates and an arbitrary horizontal
    /// perpendicular is used instead.
    pub fn from_tangent(tangent: Float3) -> Self {
        let tangent = tangent.normalize();
        if tangent == Float3::ZERO {
            return Self::DEFAULT;
        }

        let mut right = tangent.cross(Float3::UP);
        if right.magnitude() < VERTICAL_EPSILON {
            let reference = if tangent.x.abs() < 0.9 {
                Float3::RIGHT
            } else {
                Float3::FORWARD
            };
            right = tangent.cross(reference);
        }
        let right = right.normalize();
        let up = right.cross(tangent).normalize();

        Self::new(tangent, up, right).reorthonormalize()
    }

    /// Builds a frame from a tangent and an approximate up vector.
    ///
    /// Falls back to [`Frame::from_tangent`] when `up_hint` is parallel to the
    /// tangent.
    pub fn from_tangent_and_up(tangent: Float3, up_hint: Float3) -> Self {
        let tangent = tangent.normalize();
        if tangent == Float3::ZERO {
            return Self::DEFAULT;
        }

        let up = up_hint - tangent * tangent.dot(up_hint);
        if up.magnitude() < VERTICAL_EPSILON {
            return Self::from_tangent(tangent);
        }
        let up = up.normalize();
        let right = tangent.cross(up).normalize();

        Self::new(tangent, up, right).reorthonormalize()
    }

    /// Re-orthonormalizes the frame using the Gram-Schmidt process.
    ///
    /// Preserves the tangent exactly, orthogonalizes `right` against it and
    /// recomputes `up` as `right x tangent`.
    pub fn reorthonormalize(self) -> Self {
        let tangent = self.tangent.normalize();
        let right = (self.right - tangent * tangent.dot(self.right)).normalize();
        let up = right.cross(tangent).normalize();
        Self::new(tangent, up, right)
    }

    /// Rotates `up` and `right` around the tangent by `bank` radians.
    ///
    /// Positive bank tips `up` toward `right`.
    pub fn with_bank(self, bank: f32) -> Self {
        if bank.abs() < 1e-6 {
            return self;
        }
        let q = Quaternion::from_axis_angle(self.tangent, bank);
        let up = q.mul_vec(self.up).normalize();
        let right = q.mul_vec(self.right).normalize();
        Self::new(self.tangent, up, right)
    }

    /// Angle of the tangent above the horizontal plane, in radians.
    pub fn pitch(self) -> f32 {
        let horizontal = (self.tangent.x * self.tangent.x + self.tangent.z * self.tangent.z).sqrt();
        self.tangent.y.atan2(horizontal)
    }

    /// Roll of the frame relative to a level rail, in radians.
    pub fn bank(self) -> f32 {
        (-self.right.y).atan2(self.up.y)
    }

    /// Largest deviation from orthonormality (unit lengths and pairwise dots).
    pub fn orthonormal_error(self) -> f32 {
        let lengths = [
            (self.tangent.magnitude() - 1.0).abs(),
            (self.up.magnitude() - 1.0).abs(),
            (self.right.magnitude() - 1.0).abs(),
        ];
        let dots = [
            self.tangent.dot(self.up).abs(),
            self.tangent.dot(self.right).abs(),
            self.up.dot(self.right).abs(),
        ];
        lengths.into_iter().chain(dots).fold(0.0, f32::max)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::DEFAULT
    }
}
