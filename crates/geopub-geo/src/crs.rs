//! Fixed EPSG:2056 to EPSG:3857 coordinate transform.
//!
//! Stored geometries use the Swiss LV95 grid (EPSG:2056, oblique Mercator on
//! the Bessel 1841 ellipsoid); browsable map artifacts use spherical Web
//! Mercator (EPSG:3857). The transform runs in three fixed stages:
//!
//! 1. inverse oblique-Mercator projection to geographic coordinates on
//!    Bessel 1841,
//! 2. geocentric datum shift to WGS84 (translation-only Helmert,
//!    dX/dY/dZ = 674.374 / 15.056 / 405.346),
//! 3. forward spherical Web Mercator projection.
//!
//! All projection parameters are hard-coded; the transform is a pure
//! function of its input and is shared freely across threads.

use crate::geometry::{Coord, Geometry};

// Bessel 1841 ellipsoid.
const BESSEL_A: f64 = 6_377_397.155;
const BESSEL_RF: f64 = 299.152_812_8;

// WGS84 ellipsoid.
const WGS84_A: f64 = 6_378_137.0;
const WGS84_RF: f64 = 298.257_223_563;

// LV95 projection origin (old Bern observatory) and false origin.
const LAT0_DEG: f64 = 46.952_405_555_555_56;
const LON0_DEG: f64 = 7.439_583_333_333_333;
const FALSE_EASTING: f64 = 2_600_000.0;
const FALSE_NORTHING: f64 = 1_200_000.0;

// Bessel -> WGS84 geocentric translation.
const DX: f64 = 674.374;
const DY: f64 = 15.056;
const DZ: f64 = 405.346;

/// Transform from the Swiss LV95 grid to spherical Web Mercator.
///
/// Construction precomputes the oblique-Mercator constants; afterwards the
/// transform holds no mutable state.
#[derive(Debug, Clone)]
pub struct SwissGridTransform {
    lon0: f64,
    e_bessel: f64,
    e2_bessel: f64,
    e2_wgs84: f64,
    /// Radius of the projection sphere.
    r: f64,
    /// Sphere-to-ellipsoid latitude scaling.
    alpha: f64,
    /// Latitude of the projection origin on the sphere.
    b0: f64,
    /// Integration constant of the conformal mapping.
    k: f64,
}

impl Default for SwissGridTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl SwissGridTransform {
    pub fn new() -> Self {
        let lat0 = LAT0_DEG.to_radians();
        let lon0 = LON0_DEG.to_radians();

        let f = 1.0 / BESSEL_RF;
        let e2 = 2.0 * f - f * f;
        let e = e2.sqrt();

        let f_w = 1.0 / WGS84_RF;
        let e2_w = 2.0 * f_w - f_w * f_w;

        let sin_lat0 = lat0.sin();
        let r = BESSEL_A * (1.0 - e2).sqrt() / (1.0 - e2 * sin_lat0 * sin_lat0);
        let alpha = (1.0 + e2 / (1.0 - e2) * lat0.cos().powi(4)).sqrt();
        let b0 = (sin_lat0 / alpha).asin();
        let k = (std::f64::consts::FRAC_PI_4 + b0 / 2.0).tan().ln()
            - alpha * (std::f64::consts::FRAC_PI_4 + lat0 / 2.0).tan().ln()
            + alpha * e / 2.0 * ((1.0 + e * sin_lat0) / (1.0 - e * sin_lat0)).ln();

        Self {
            lon0,
            e_bessel: e,
            e2_bessel: e2,
            e2_wgs84: e2_w,
            r,
            alpha,
            b0,
            k,
        }
    }

    /// Transforms one LV95 coordinate to Web Mercator.
    pub fn transform(&self, coord: Coord) -> Coord {
        let (lat, lon) = self.lv95_to_bessel(coord.x, coord.y);
        let (lat, lon) = self.bessel_to_wgs84(lat, lon);
        Coord::new(WGS84_A * lon, WGS84_A * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln())
    }

    /// Transforms every coordinate of a geometry tree in place. Topology is
    /// untouched: ring order, part counts and vertex counts stay identical.
    pub fn transform_geometry(&self, geometry: &mut Geometry) {
        geometry.map_coords(&|c| self.transform(c));
    }

    /// Inverse oblique-Mercator projection: grid easting/northing to
    /// geographic latitude/longitude on Bessel 1841 (radians).
    fn lv95_to_bessel(&self, easting: f64, northing: f64) -> (f64, f64) {
        let quarter_pi = std::f64::consts::FRAC_PI_4;

        let y = easting - FALSE_EASTING;
        let x = northing - FALSE_NORTHING;

        let rot_i = y / self.r;
        let rot_b = 2.0 * ((x / self.r).exp().atan() - quarter_pi);

        let b = (self.b0.cos() * rot_b.sin() + self.b0.sin() * rot_b.cos() * rot_i.cos()).asin();
        let i = rot_i
            .sin()
            .atan2(self.b0.cos() * rot_i.cos() - self.b0.sin() * rot_b.tan());
        let lon = self.lon0 + i / self.alpha;

        // Newton-style fixed point for the ellipsoidal latitude; converges
        // in a handful of iterations for the Swiss extent.
        let mut lat = b;
        let mut prev = f64::NEG_INFINITY;
        let mut iterations = 0;
        while (lat - prev).abs() > 1e-12 && iterations < 30 {
            let s = 1.0 / self.alpha * ((quarter_pi + b / 2.0).tan().ln() - self.k)
                + self.e_bessel
                    * (quarter_pi + (self.e_bessel * lat.sin()).asin() / 2.0)
                        .tan()
                        .ln();
            prev = lat;
            lat = 2.0 * s.exp().atan() - std::f64::consts::FRAC_PI_2;
            iterations += 1;
        }

        (lat, lon)
    }

    /// Translation-only Helmert shift via geocentric coordinates, Bessel to
    /// WGS84, at ellipsoidal height zero.
    fn bessel_to_wgs84(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let n = BESSEL_A / (1.0 - self.e2_bessel * sin_lat * sin_lat).sqrt();
        let x = n * cos_lat * cos_lon + DX;
        let y = n * cos_lat * sin_lon + DY;
        let z = n * (1.0 - self.e2_bessel) * sin_lat + DZ;

        let lon_w = y.atan2(x);
        let p = x.hypot(y);
        let mut lat_w = z.atan2(p * (1.0 - self.e2_wgs84));
        for _ in 0..10 {
            let nw = WGS84_A / (1.0 - self.e2_wgs84 * lat_w.sin().powi(2)).sqrt();
            let h = p / lat_w.cos() - nw;
            lat_w = z.atan2(p * (1.0 - self.e2_wgs84 * nw / (nw + h)));
        }

        (lat_w, lon_w)
    }
}
