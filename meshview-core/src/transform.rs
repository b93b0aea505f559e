/// 3D transformation matrices, rotation state and render poses
use nalgebra::{Matrix4, Point3, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RotationState {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Euler angles given in degrees
    pub fn from_degrees(degrees: [f64; 3]) -> Self {
        let [x, y, z] = degrees.map(f64::to_radians);
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

/// A 4x4 homogeneous transform.
///
/// Rotations compose as `Rz * Ry * Rx`: a column vector is rotated about X
/// first, then Y, then Z, all about the fixed world axes. Right-handed, so
/// a positive X rotation turns +Y towards +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(pub Matrix4<f64>);

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Translation in model units plus XYZ Euler angles in degrees.
    ///
    /// Non-finite input is not validated and propagates into the matrix.
    pub fn from_translation_rotation(translation: [f64; 3], rotation_degrees: [f64; 3]) -> Self {
        let [tx, ty, tz] = translation;
        let rotation = Self::rotation_matrix(&RotationState::from_degrees(rotation_degrees));
        Self(Self::translation_matrix(tx, ty, tz) * rotation)
    }

    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f64> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // Apply rotations in order: Z, Y, X
        rz * ry * rx
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f64, y: f64, z: f64) -> Matrix4<f64> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f64>,
        view: &Matrix4<f64>,
        projection: &Matrix4<f64>,
    ) -> Matrix4<f64> {
        projection * view * model
    }
}

/// Where a mesh sits in the scene at render time.
///
/// A pose is handed to the renderer alongside the mesh and never written
/// back into vertex data.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose(Option<Transform>);

impl Pose {
    /// Pose from CLI-style inputs; `None` when neither part was given.
    pub fn from_parts(translation: Option<[f64; 3]>, rotation_degrees: Option<[f64; 3]>) -> Self {
        if translation.is_none() && rotation_degrees.is_none() {
            return Self(None);
        }
        Self(Some(Transform::from_translation_rotation(
            translation.unwrap_or_default(),
            rotation_degrees.unwrap_or_default(),
        )))
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.0.as_ref()
    }

    pub fn matrix(&self) -> Matrix4<f64> {
        self.0.map(|t| t.0).unwrap_or_else(Matrix4::identity)
    }
}

impl From<Transform> for Pose {
    fn from(transform: Transform) -> Self {
        Self(Some(transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-12);
        assert!((state.y - 0.2).abs() < 1e-12);
        assert!((state.z - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_identity_rotation() {
        let rotation = RotationState::zero();
        let matrix = Transform::rotation_matrix(&rotation);
        assert!((matrix - Matrix4::identity()).norm() < 1e-12);
    }

    #[test]
    fn translation_fills_last_column() {
        let t = Transform::from_translation_rotation([1.0, 2.0, 3.0], [0.0, 0.0, 0.0]);
        let expected = Matrix4::new(
            1.0, 0.0, 0.0, 1.0, //
            0.0, 1.0, 0.0, 2.0, //
            0.0, 0.0, 1.0, 3.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        assert_eq!(t.0, expected);
    }

    #[test]
    fn x_rotation_turns_y_into_z() {
        let t = Transform::from_translation_rotation([0.0; 3], [90.0, 0.0, 0.0]);
        assert_relative_eq!(t.0.transform_vector(&Vector3::y()), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn x_is_applied_before_z() {
        // Rx(90) sends +Y to +Z; Rz(90) then leaves +Z alone.
        let t = Transform::from_translation_rotation([0.0; 3], [90.0, 0.0, 90.0]);
        assert_relative_eq!(t.0.transform_vector(&Vector3::y()), Vector3::z(), epsilon = 1e-12);
        // Rx(90) leaves +X alone; Rz(90) turns it into +Y.
        assert_relative_eq!(t.0.transform_vector(&Vector3::x()), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn bottom_row_and_orthonormal_block() {
        let t = Transform::from_translation_rotation([4.0, -1.0, 0.5], [33.0, -71.0, 140.0]);
        assert_eq!(t.0.row(3).clone_owned(), nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0));
        let r = t.0.fixed_view::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(r.transpose() * r, nalgebra::Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn nan_propagates() {
        let t = Transform::from_translation_rotation([f64::NAN, 0.0, 0.0], [0.0; 3]);
        assert!(t.0[(0, 3)].is_nan());
        assert_ne!(t.0, Matrix4::identity());
    }

    #[test]
    fn pose_is_absent_without_inputs() {
        assert!(Pose::from_parts(None, None).transform().is_none());
        assert_eq!(Pose::default().matrix(), Matrix4::identity());
        let pose = Pose::from_parts(Some([0.0, 0.0, 2.0]), None);
        assert_eq!(
            pose.matrix().transform_point(&Point3::origin()),
            Point3::new(0.0, 0.0, 2.0)
        );
    }
}
