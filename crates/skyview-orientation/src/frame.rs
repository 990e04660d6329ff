//! Device frame to geographic frame transform.
//!
//! Device axes: x = right, y = top of screen, z = out of the screen toward the
//! user. The back camera looks along -z. The rotation matrix is
//! `R = Rz(alpha) * Rx(beta) * Ry(gamma)` and maps device axes into the
//! geographic frame (X = east, Y = north, Z = up).

use crate::types::{DevicePointing, EulerAngles, WorldVector};
use glam::DVec3;

/// Below this horizontal length the view axis is treated as vertical and the
/// horizon roll is undefined.
const MIN_HORIZONTAL: f64 = 0.01;

/// Compute where the back of the device points and how far the horizon is rolled.
pub fn device_pointing(angles: EulerAngles) -> DevicePointing {
    let a = angles.alpha.to_radians();
    let b = angles.beta.to_radians();
    let g = angles.gamma.to_radians();

    let (sa, ca) = a.sin_cos();
    let (sb, cb) = b.sin_cos();
    let (sg, cg) = g.sin_cos();

    // Second column of R: device +y in world coordinates.
    let device_up = DVec3::new(-sa * cb, ca * cb, sb);

    // Third column of R: device +z in world coordinates.
    let device_out = DVec3::new(
        ca * sg + sa * sb * cg,
        sa * sg - ca * sb * cg,
        cb * cg,
    );

    let pointing = -device_out;
    let vector = WorldVector {
        east: pointing.x,
        north: pointing.y,
        up: pointing.z,
    };

    let horizontal = vector.horizontal();
    let roll = if horizontal > MIN_HORIZONTAL {
        // Right-hand side of the view, kept in the horizontal plane.
        let right = DVec3::new(-vector.north, vector.east, 0.0) / horizontal;
        let dot_right = device_up.dot(right);
        let dot_up = device_up.z;
        -dot_right.atan2(dot_up)
    } else {
        // Looking straight up or down: fall back to the raw side tilt.
        g
    };

    DevicePointing { vector, roll }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angles(alpha: f64, beta: f64, gamma: f64) -> EulerAngles {
        EulerAngles { alpha, beta, gamma }
    }

    #[test]
    fn upright_facing_north() {
        let p = device_pointing(angles(0.0, 90.0, 0.0));
        assert!(p.vector.east.abs() < 1e-9);
        assert!((p.vector.north - 1.0).abs() < 1e-9);
        assert!(p.vector.up.abs() < 1e-9);
        assert!(p.roll.abs() < 1e-9);
    }

    #[test]
    fn upright_turned_ninety_degrees() {
        let p = device_pointing(angles(90.0, 90.0, 0.0));
        assert!((p.vector.east + 1.0).abs() < 1e-9);
        assert!(p.vector.north.abs() < 1e-9);
        assert!(p.vector.up.abs() < 1e-9);
    }

    #[test]
    fn flat_on_table_points_down() {
        let p = device_pointing(angles(0.0, 0.0, 0.0));
        assert!((p.vector.up + 1.0).abs() < 1e-9);
        // Degenerate horizontal component: roll falls back to gamma.
        assert_eq!(p.roll, 0.0);
    }

    #[test]
    fn vertical_view_uses_gamma_for_roll() {
        let p = device_pointing(angles(30.0, 180.0, 0.0));
        assert!((p.vector.up - 1.0).abs() < 1e-9);
        assert_eq!(p.roll, 0.0);

        let p = device_pointing(angles(0.0, 0.0, 0.3));
        assert!(p.vector.horizontal() < MIN_HORIZONTAL);
        assert!((p.roll - 0.3_f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn side_tilt_rolls_horizon() {
        // Raised 60 degrees facing north, tilted 20 degrees to the side.
        let p = device_pointing(angles(0.0, 60.0, 20.0));
        assert!(p.roll.abs() > 0.1);
        let mirrored = device_pointing(angles(0.0, 60.0, -20.0));
        assert!((p.roll + mirrored.roll).abs() < 1e-9);
    }

    #[test]
    fn pointing_is_unit_length() {
        for alpha in (0..360).step_by(15) {
            for beta in (-180..=180).step_by(15) {
                for gamma in (-90..=90).step_by(15) {
                    let p = device_pointing(angles(alpha as f64, beta as f64, gamma as f64));
                    let len = p.vector.as_dvec3().length();
                    assert!(
                        (len - 1.0).abs() < 1e-9,
                        "length {len} at ({alpha}, {beta}, {gamma})"
                    );
                    assert!(p.roll.is_finite());
                }
            }
        }
    }
}
