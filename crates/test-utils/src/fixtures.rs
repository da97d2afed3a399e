//! Common test fixtures for velocity cube tests.
//!
//! The GeoJSON builders produce features shaped like the entries of the
//! ITS_LIVE `catalog_v02.json` document: a WGS84 `geometry`, plus
//! `properties.geometry_epsg` (the footprint in the cube's projection),
//! `properties.epsg` and `properties.zarr_url`.

use serde_json::{json, Value};

/// Well-known query locations as `(lon, lat)`.
pub mod points {
    /// Jakobshavn region, Greenland (EPSG:3413 cubes)
    pub const JAKOBSHAVN: (f64, f64) = (-49.09, 70.0);

    /// Northern Greenland, inside cube N70W040 X-50000_Y-1650000
    pub const NORTH_GREENLAND: (f64, f64) = (-45.1, 75.0);

    /// Dronning Maud Land, Antarctica (EPSG:3031 cubes)
    pub const DRONNING_MAUD: (f64, f64) = (-10.0, -76.1);

    /// Karakoram, UTM zone 43N (EPSG:32643 cubes)
    pub const KARAKORAM: (f64, f64) = (76.2, 33.5);

    /// Gulf of Guinea, no glaciers
    pub const NULL_ISLAND: (f64, f64) = (0.0, 0.0);
}

/// Real cube URLs as they appear in the catalog.
pub mod urls {
    pub const BASE: &str = "http://its-live-data.s3.amazonaws.com/datacubes";

    pub const N70W040: &str = "http://its-live-data.s3.amazonaws.com/datacubes/v02/N70W040/ITS_LIVE_vel_EPSG3413_G0120_X-50000_Y-1650000.zarr";

    pub const S70W000: &str = "http://its-live-data.s3.amazonaws.com/datacubes/v02/S70W000/ITS_LIVE_vel_EPSG3031_G0120_X-250000_Y1450000.zarr";

    pub const N30E070: &str = "http://its-live-data.s3.amazonaws.com/datacubes/v02/N30E070/ITS_LIVE_vel_EPSG32643_G0120_X650000_Y3750000.zarr";

    /// Build a URL in the catalog naming scheme for a synthetic cube.
    pub fn cube_url(tile: &str, epsg: u32, center_x: f64, center_y: f64) -> String {
        format!(
            "{}/v02/{}/ITS_LIVE_vel_EPSG{}_G0120_X{}_Y{}.zarr",
            BASE, tile, epsg, center_x as i64, center_y as i64
        )
    }
}

/// Closed counter-clockwise square ring centred on `(center_x, center_y)`.
pub fn square_ring(center_x: f64, center_y: f64, half_width: f64) -> Vec<(f64, f64)> {
    vec![
        (center_x - half_width, center_y - half_width),
        (center_x + half_width, center_y - half_width),
        (center_x + half_width, center_y + half_width),
        (center_x - half_width, center_y + half_width),
        (center_x - half_width, center_y - half_width),
    ]
}

/// Square ring with `per_edge` vertices along each edge.
///
/// Useful when the ring is reprojected vertex by vertex: curved edges in the
/// target CRS are approximated closely enough for containment tests.
pub fn densified_square_ring(
    center_x: f64,
    center_y: f64,
    half_width: f64,
    per_edge: usize,
) -> Vec<(f64, f64)> {
    let corners = square_ring(center_x, center_y, half_width);
    let steps = per_edge.max(1);
    let mut ring = Vec::with_capacity(steps * 4 + 1);
    for edge in corners.windows(2) {
        let (x0, y0) = edge[0];
        let (x1, y1) = edge[1];
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            ring.push((x0 + (x1 - x0) * t, y0 + (y1 - y0) * t));
        }
    }
    ring.push(corners[0]);
    ring
}

/// GeoJSON Polygon geometry from a single exterior ring.
pub fn polygon_json(ring: &[(f64, f64)]) -> Value {
    let coords: Vec<Value> = ring.iter().map(|(x, y)| json!([x, y])).collect();
    json!({
        "type": "Polygon",
        "coordinates": [coords],
    })
}

/// A catalog feature with the properties the resolver reads.
///
/// `epsg` is written as a string, matching the published catalog.
pub fn feature_json(
    wgs84_ring: &[(f64, f64)],
    epsg: u32,
    projected_ring: &[(f64, f64)],
    zarr_url: &str,
) -> Value {
    json!({
        "type": "Feature",
        "geometry": polygon_json(wgs84_ring),
        "properties": {
            "epsg": epsg.to_string(),
            "geometry_epsg": polygon_json(projected_ring),
            "zarr_url": zarr_url,
            "fill-opacity": 0.98,
            "roi_percent_coverage": 100.0,
        },
    })
}

/// Wrap features in a FeatureCollection.
pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_ring_closed() {
        let ring = square_ring(-50_000.0, -1_650_000.0, 50_000.0);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[0], (-100_000.0, -1_700_000.0));
    }

    #[test]
    fn test_densified_ring() {
        let ring = densified_square_ring(0.0, 0.0, 1.0, 4);
        assert_eq!(ring.len(), 17);
        assert_eq!(ring.first(), ring.last());
        assert!(ring.contains(&(0.0, -1.0)));
    }

    #[test]
    fn test_feature_json_shape() {
        let ring = square_ring(0.0, 0.0, 1.0);
        let feature = feature_json(&ring, 3413, &ring, urls::N70W040);
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["properties"]["epsg"], "3413");
        assert_eq!(feature["properties"]["zarr_url"], urls::N70W040);
        assert_eq!(feature["geometry"]["coordinates"][0][0][0], -1.0);

        let collection = feature_collection(vec![feature]);
        assert_eq!(collection["features"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_cube_url_scheme() {
        assert_eq!(
            urls::cube_url("N70W040", 3413, -50_000.0, -1_650_000.0),
            urls::N70W040
        );
    }
}
