use crate::latlng::LatLng;
use crate::math::Point;

/// Earth radius used by spherical (web) mercator, meters.
pub const MERCATOR_R: f64 = 6_378_137.0;
/// Latitude limit where web mercator becomes square.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_8;
/// Pixel width of one tile at zoom 0.
pub const TILE_SIZE: f64 = 256.0;

/// Spherical mercator (EPSG:3857) with the standard web-map pixel transform.
///
/// Pixel coordinates at zoom `z` span `[0, 256 * 2^z]` on both axes, with
/// y growing southwards.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct WebMercator;

impl WebMercator {
    /// Pixel scale for a zoom level.
    pub fn scale(zoom: f64) -> f64 {
        TILE_SIZE * 2f64.powf(zoom)
    }

    /// Projects to mercator meters.
    pub fn project(ll: LatLng) -> Point {
        let d = std::f64::consts::PI / 180.0;
        let lat = ll.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
        let sin = (lat * d).sin();
        Point::new(
            MERCATOR_R * ll.lng * d,
            MERCATOR_R * ((1.0 + sin) / (1.0 - sin)).ln() / 2.0,
        )
    }

    pub fn unproject(p: Point) -> LatLng {
        let d = 180.0 / std::f64::consts::PI;
        LatLng::new(
            (2.0 * (p.y / MERCATOR_R).exp().atan() - std::f64::consts::FRAC_PI_2) * d,
            p.x * d / MERCATOR_R,
        )
    }

    /// World pixel coordinate of `ll` at `zoom`.
    pub fn lat_lng_to_pixel(ll: LatLng, zoom: f64) -> Point {
        let m = Self::project(ll);
        let k = 0.5 / (std::f64::consts::PI * MERCATOR_R);
        let scale = Self::scale(zoom);
        Point::new(scale * (k * m.x + 0.5), scale * (-k * m.y + 0.5))
    }

    pub fn pixel_to_lat_lng(p: Point, zoom: f64) -> LatLng {
        let k = 0.5 / (std::f64::consts::PI * MERCATOR_R);
        let scale = Self::scale(zoom);
        let m = Point::new((p.x / scale - 0.5) / k, (p.y / scale - 0.5) / -k);
        Self::unproject(m)
    }
}

#[cfg(test)]
mod tests {
    use super::{MERCATOR_MAX_LAT, WebMercator};
    use crate::latlng::LatLng;
    use crate::math::Point;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_world_center() {
        let p = WebMercator::lat_lng_to_pixel(LatLng::new(0.0, 0.0), 0.0);
        assert_close(p.x, 128.0, 1e-9);
        assert_close(p.y, 128.0, 1e-9);
    }

    #[test]
    fn corners_map_to_world_edges() {
        let nw = WebMercator::lat_lng_to_pixel(LatLng::new(MERCATOR_MAX_LAT, -180.0), 1.0);
        assert_close(nw.x, 0.0, 1e-6);
        assert_close(nw.y, 0.0, 1e-6);
        let se = WebMercator::lat_lng_to_pixel(LatLng::new(-MERCATOR_MAX_LAT, 180.0), 1.0);
        assert_close(se.x, 512.0, 1e-6);
        assert_close(se.y, 512.0, 1e-6);
    }

    #[test]
    fn zoom_step_doubles_pixel_distance() {
        let a = WebMercator::lat_lng_to_pixel(LatLng::new(10.0, 20.0), 3.0);
        let b = WebMercator::lat_lng_to_pixel(LatLng::new(10.0, 20.0), 4.0);
        assert_close(b.x, a.x * 2.0, 1e-9);
        assert_close(b.y, a.y * 2.0, 1e-9);
    }

    #[test]
    fn round_trip_pixel_lat_lng() {
        let ll = LatLng::new(-33.86, 151.21);
        let p = WebMercator::lat_lng_to_pixel(ll, 7.0);
        let back = WebMercator::pixel_to_lat_lng(p, 7.0);
        assert_close(back.lat, ll.lat, 1e-9);
        assert_close(back.lng, ll.lng, 1e-9);
        let center = WebMercator::pixel_to_lat_lng(Point::new(128.0, 128.0), 0.0);
        assert_close(center.lat, 0.0, 1e-12);
        assert_close(center.lng, 0.0, 1e-12);
    }
}
