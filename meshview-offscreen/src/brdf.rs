//! CPU-side BRDF evaluation for metallic-roughness materials.

use std::f64::consts::PI;

use meshview_core::Material;
use nalgebra::Vector3;

/// Reflectance at normal incidence for dielectrics.
const DIELECTRIC_F0: f64 = 0.04;

/// Roughness floor; keeps the GGX lobe finite.
const MIN_ROUGHNESS: f64 = 0.04;

/// GGX distribution function (normal distribution)
pub fn distribution_ggx(n_dot_h: f64, roughness: f64) -> f64 {
    let alpha = roughness * roughness;
    let alpha2 = alpha * alpha;
    let n_dot_h2 = n_dot_h * n_dot_h;

    let denom = PI * (n_dot_h2 * (alpha2 - 1.0) + 1.0).powi(2);
    alpha2 / denom.max(1e-12)
}

/// Schlick-GGX geometry term for one direction
pub fn geometry_schlick_ggx(n_dot_v: f64, roughness: f64) -> f64 {
    let r = roughness + 1.0;
    let k = (r * r) / 8.0;
    n_dot_v / (n_dot_v * (1.0 - k) + k)
}

/// Smith geometry function (masking-shadowing)
pub fn geometry_smith(n_dot_v: f64, n_dot_l: f64, roughness: f64) -> f64 {
    geometry_schlick_ggx(n_dot_v, roughness) * geometry_schlick_ggx(n_dot_l, roughness)
}

/// Fresnel-Schlick approximation
pub fn fresnel_schlick(cos_theta: f64, f0: Vector3<f64>) -> Vector3<f64> {
    let weight = (1.0 - cos_theta).max(0.0).powi(5);
    f0 + (Vector3::repeat(1.0) - f0) * weight
}

/// Cook-Torrance specular plus Lambert diffuse, times `n·l`.
///
/// `light_dir` and `view_dir` point away from the surface, towards the
/// light and the viewer.
pub fn evaluate(
    material: &Material,
    light_dir: &Vector3<f64>,
    view_dir: &Vector3<f64>,
    normal: &Vector3<f64>,
) -> Vector3<f64> {
    let n_dot_v = normal.dot(view_dir);
    let n_dot_l = normal.dot(light_dir);
    if n_dot_l <= 0.0 || n_dot_v <= 0.0 {
        return Vector3::zeros();
    }

    let h = (light_dir + view_dir).normalize();
    let n_dot_h = normal.dot(&h).max(0.0);
    let v_dot_h = view_dir.dot(&h).max(0.0);

    let base_color = Vector3::from(material.rgb());
    let metallic = material.metallic;
    let roughness = material.roughness.max(MIN_ROUGHNESS);

    let f0 = Vector3::repeat(DIELECTRIC_F0).lerp(&base_color, metallic);
    let d = distribution_ggx(n_dot_h, roughness);
    let g = geometry_smith(n_dot_v, n_dot_l, roughness);
    let f = fresnel_schlick(v_dot_h, f0);

    let specular = f * (d * g / (4.0 * n_dot_v * n_dot_l).max(1e-12));
    let kd = (Vector3::repeat(1.0) - f) * (1.0 - metallic);
    let diffuse = kd.component_mul(&base_color) / PI;

    (diffuse + specular) * n_dot_l
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fresnel_is_f0_head_on_and_white_at_grazing() {
        let f0 = Vector3::new(0.5, 0.4, 0.3);
        assert_relative_eq!(fresnel_schlick(1.0, f0), f0);
        assert_relative_eq!(fresnel_schlick(0.0, f0), Vector3::repeat(1.0));
    }

    #[test]
    fn ggx_peaks_at_the_normal() {
        assert!(distribution_ggx(1.0, 0.3) > distribution_ggx(0.9, 0.3));
        // Rougher surfaces spread the lobe out
        assert!(distribution_ggx(1.0, 0.2) > distribution_ggx(1.0, 0.5));
    }

    #[test]
    fn light_behind_the_surface_contributes_nothing() {
        let n = Vector3::z();
        let radiance = evaluate(&Material::IRON, &-Vector3::z(), &Vector3::z(), &n);
        assert_eq!(radiance, Vector3::zeros());
    }

    #[test]
    fn smoother_metal_has_a_brighter_highlight() {
        let n = Vector3::z();
        let iron = evaluate(&Material::IRON, &n, &n, &n);
        let aluminum = evaluate(&Material::ALUMINUM, &n, &n, &n);
        assert!(aluminum.x > iron.x);
        assert!(iron.iter().all(|c| *c > 0.0));
    }
}
