/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
        }
    }
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
    /// Vertical field of view in radians
    pub fov: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f64::consts::PI / 4.0, // 45 degrees
            aspect: width as f64 / height.max(1) as f64,
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Perspective camera placed by a camera-to-world pose.
    ///
    /// With an identity rotation the camera looks down -Z with +Y up.
    pub fn from_pose(pose: &Matrix4<f64>, fov: f64, aspect: f64, near: f64, far: f64) -> Self {
        let position = pose.transform_point(&Point3::origin());
        let forward = pose.transform_vector(&-Vector3::z());
        Self {
            position,
            target: position + forward,
            up: pose.transform_vector(&Vector3::y()),
            fov,
            aspect,
            near,
            far,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Moves the camera back along its view axis until a sphere around the
    /// bounds fits the vertical field of view.
    pub fn frame_bounds(&mut self, min: &Point3<f64>, max: &Point3<f64>) {
        let center = nalgebra::center(min, max);
        let radius = ((max - min).norm() * 0.5).max(1e-6);
        let direction = (self.position - self.target)
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::z);
        let distance = radius / (self.fov * 0.5).sin();

        self.target = center;
        self.position = center + direction * distance;
        self.near = (distance - radius).max(distance * 1e-3);
        self.far = distance + radius * 2.0;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                // Same framing as the perspective view at the target distance
                let distance = (self.position - self.target).norm();
                let height = 2.0 * distance * (self.fov * 0.5).tan();
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Project a 3D point to screen space.
    ///
    /// Returns pixel x, pixel y (origin top-left) and NDC depth in [-1, 1].
    /// Points behind the camera or outside the depth range yield `None`;
    /// points off the sides of the screen are kept so rasterizers can clip.
    pub fn project_to_screen(
        &self,
        point: &Point3<f64>,
        model_matrix: &Matrix4<f64>,
        width: u32,
        height: u32,
    ) -> Option<(f64, f64, f64)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        Self::project_with(&mvp, point, width, height)
    }

    /// Same as [`Camera::project_to_screen`] with a precomputed MVP matrix.
    pub fn project_with(
        mvp: &Matrix4<f64>,
        point: &Point3<f64>,
        width: u32,
        height: u32,
    ) -> Option<(f64, f64, f64)> {
        let clip: Vector4<f64> = mvp * point.to_homogeneous();

        // Prevent division by near-zero or negative w
        if clip.w < 1e-9 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let depth = clip.z / clip.w;

        if !(-1.0..=1.0).contains(&depth) {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc_x + 1.0) * 0.5 * width as f64;
        let screen_y = (1.0 - ndc_y) * 0.5 * height as f64;

        Some((screen_x, screen_y, depth))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
