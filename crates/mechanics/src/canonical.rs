//! Canonical linear equations of motion of the Whipple-Carvallo bicycle.
//!
//! About the upright, straight-ahead configuration with forward speed `v`:
//!
//! ```text
//! M q'' + v C1 q' + (g K0 + v^2 K2) q = f,    q = [roll, steer]
//! ```
//!
//! The coefficient expressions follow Meijaard et al. (2007), Appendix A.

use std::collections::BTreeMap;

use nalgebra::{Matrix2, Matrix4, Matrix4x2};
use simcore::{ConfigurationError, Result, SimError};

/// Mass, damping-like and stiffness matrices of the canonical form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalMatrices {
    pub m: Matrix2<f64>,
    pub c1: Matrix2<f64>,
    pub k0: Matrix2<f64>,
    pub k2: Matrix2<f64>,
}

impl CanonicalMatrices {
    /// Evaluates the benchmark expressions for one full set of values.
    pub fn from_parameters(par: &BTreeMap<String, f64>) -> std::result::Result<Self, ConfigurationError> {
        let p = |name: &str| {
            par.get(name)
                .copied()
                .ok_or_else(|| ConfigurationError::MissingParameter(name.to_string()))
        };

        let (w, c, lam) = (p("w")?, p("c")?, p("lam")?);
        let (r_r, m_r, i_rxx, i_ryy) = (p("rR")?, p("mR")?, p("IRxx")?, p("IRyy")?);
        let (x_b, z_b, m_b) = (p("xB")?, p("zB")?, p("mB")?);
        let (i_bxx, i_bzz, i_bxz) = (p("IBxx")?, p("IBzz")?, p("IBxz")?);
        let (x_h, z_h, m_h) = (p("xH")?, p("zH")?, p("mH")?);
        let (i_hxx, i_hzz, i_hxz) = (p("IHxx")?, p("IHzz")?, p("IHxz")?);
        let (r_f, m_f, i_fxx, i_fyy) = (p("rF")?, p("mF")?, p("IFxx")?, p("IFyy")?);
        // wheels are axisymmetric
        let i_rzz = i_rxx;
        let i_fzz = i_fxx;

        // whole bicycle
        let m_t = m_r + m_b + m_h + m_f;
        let x_t = (x_b * m_b + x_h * m_h + w * m_f) / m_t;
        let z_t = (-r_r * m_r + z_b * m_b + z_h * m_h - r_f * m_f) / m_t;
        let i_txx = i_rxx + i_bxx + i_hxx + i_fxx
            + m_r * r_r.powi(2)
            + m_b * z_b.powi(2)
            + m_h * z_h.powi(2)
            + m_f * r_f.powi(2);
        let i_txz = i_bxz + i_hxz - m_b * x_b * z_b - m_h * x_h * z_h + m_f * w * r_f;
        let i_tzz = i_rzz + i_bzz + i_hzz + i_fzz
            + m_b * x_b.powi(2)
            + m_h * x_h.powi(2)
            + m_f * w.powi(2);

        // front assembly: handlebar, fork and front wheel
        let m_a = m_h + m_f;
        let x_a = (x_h * m_h + w * m_f) / m_a;
        let z_a = (z_h * m_h - r_f * m_f) / m_a;
        let i_axx = i_hxx + i_fxx + m_h * (z_h - z_a).powi(2) + m_f * (r_f + z_a).powi(2);
        let i_axz = i_hxz - m_h * (x_h - x_a) * (z_h - z_a) + m_f * (w - x_a) * (r_f + z_a);
        let i_azz = i_hzz + i_fzz + m_h * (x_h - x_a).powi(2) + m_f * (w - x_a).powi(2);

        let (sin_lam, cos_lam) = lam.sin_cos();
        // perpendicular distance of the front assembly centre of mass ahead of the steer axis
        let u_a = (x_a - w - c) * cos_lam - z_a * sin_lam;
        let i_all = m_a * u_a.powi(2)
            + i_axx * sin_lam.powi(2)
            + 2.0 * i_axz * sin_lam * cos_lam
            + i_azz * cos_lam.powi(2);
        let i_alx = -m_a * u_a * z_a + i_axx * sin_lam + i_axz * cos_lam;
        let i_alz = m_a * u_a * x_a + i_axz * sin_lam + i_azz * cos_lam;

        let mu = c / w * cos_lam;

        // gyrostatic coefficients
        let s_r = i_ryy / r_r;
        let s_f = i_fyy / r_f;
        let s_t = s_r + s_f;
        let s_a = m_a * u_a + mu * m_t * x_t;

        let m = Matrix2::new(
            i_txx,
            i_alx + mu * i_txz,
            i_alx + mu * i_txz,
            i_all + 2.0 * mu * i_alz + mu.powi(2) * i_tzz,
        );
        let k0 = Matrix2::new(m_t * z_t, -s_a, -s_a, -s_a * sin_lam);
        let k2 = Matrix2::new(
            0.0,
            (s_t - m_t * z_t) / w * cos_lam,
            0.0,
            (s_a + s_f * sin_lam) / w * cos_lam,
        );
        let c1 = Matrix2::new(
            0.0,
            mu * s_t + s_f * cos_lam + i_txz / w * cos_lam - mu * m_t * z_t,
            -(mu * s_t + s_f * cos_lam),
            i_alz / w * cos_lam + mu * (s_a + i_tzz / w * cos_lam),
        );

        Ok(Self { m, c1, k0, k2 })
    }
}

/// First-order form of the canonical equations at speed `v` and gravity `g`.
///
/// ```text
/// A = | 0                     I          |    B = | 0    |
///     | -M^-1 (g K0 + v^2 K2) -v M^-1 C1 |        | M^-1 |
/// ```
pub fn ab_matrix(
    canonical: &CanonicalMatrices,
    v: f64,
    g: f64,
) -> Result<(Matrix4<f64>, Matrix4x2<f64>)> {
    let CanonicalMatrices { m, c1, k0, k2 } = canonical;
    let inv_m = m
        .try_inverse()
        .filter(|inv| inv.iter().all(|x| x.is_finite()))
        .ok_or_else(|| SimError::SingularMassMatrix(m.determinant()))?;

    let mut a = Matrix4::zeros();
    a.fixed_view_mut::<2, 2>(0, 2).fill_with_identity();
    a.fixed_view_mut::<2, 2>(2, 0)
        .copy_from(&(-inv_m * (k0 * g + k2 * v.powi(2))));
    a.fixed_view_mut::<2, 2>(2, 2).copy_from(&(-inv_m * c1 * v));

    let mut b = Matrix4x2::zeros();
    b.fixed_view_mut::<2, 2>(2, 0).copy_from(&inv_m);

    Ok((a, b))
}
