use mesk_core::GeoPoint;

/// Empirical scale from squared degrees to acres.
///
/// Only meaningful for small polygons near the equator; this is a planar
/// approximation, not a geodesic area.
pub const ACRES_PER_SQUARE_DEGREE: f64 = 247.105;

/// Unsigned shoelace area of the polygon, in squared degrees.
///
/// The boundary is implicitly closed (last point connects to the first).
/// Fewer than three points enclose nothing and yield 0. Self-intersecting
/// polygons are not rejected; their result is the net signed sum and is not a
/// meaningful area.
pub fn planar_area(points: &[GeoPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let raw: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.lat * q.lng - q.lat * p.lng)
        .sum();

    raw.abs() / 2.0
}

/// Approximate area in acres.
pub fn area_acres(points: &[GeoPoint]) -> f64 {
    planar_area(points) * ACRES_PER_SQUARE_DEGREE
}

/// Rounds to two decimals, the precision farms are saved and shown with.
pub fn round_acres(acres: f64) -> f64 {
    (acres * 100.0).round() / 100.0
}
