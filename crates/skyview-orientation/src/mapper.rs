use crate::types::WorldVector;

/// Map a geographic-frame vector onto the observer's yaw and pitch.
///
/// The observer frame is X = north, Y = east, Z = up, so yaw 0 is north and
/// yaw π/2 is east. Yaw lies in `(-π, π]`, pitch in `[-π/2, π/2]`.
pub fn yaw_pitch(vector: &WorldVector) -> (f64, f64) {
    let (x, y, z) = (vector.north, vector.east, vector.up);
    let yaw = y.atan2(x);
    let pitch = z.atan2(x.hypot(y));
    (yaw, pitch)
}
