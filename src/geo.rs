//! Region boundaries: GeoJSON parsing, Mercator projection fitted to a box, and
//! point-in-region hit testing for the map tooltip.

use crate::error::{ChartError, Result};
use crate::models::RegionFeature;
use ::geo::{Contains, Coord, CoordsIter, LineString, MapCoords, MultiPolygon, Point, Polygon};
use serde_json::Value;
use std::f64::consts::FRAC_PI_4;

const CODE_PROPERTIES: [&str; 5] = ["code", "LAD23CD", "LAD22CD", "LAD20CD", "GSS_CODE"];
const NAME_PROPERTIES: [&str; 7] = ["name", "LAD23NM", "LAD22NM", "LAD20NM", "NAME", "Borough", "borough"];

fn first_property(props: Option<&Value>, keys: &[&str]) -> String {
    let Some(props) = props else {
        return String::new();
    };
    keys.iter()
        .filter_map(|k| props.get(*k))
        .find_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

fn parse_ring(v: &Value) -> Result<LineString<f64>> {
    let positions = v
        .as_array()
        .ok_or_else(|| ChartError::Geo("ring is not an array".into()))?;
    positions
        .iter()
        .map(|p| match p.as_array().map(|a| a.as_slice()) {
            Some([lon, lat, ..]) => match (lon.as_f64(), lat.as_f64()) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(ChartError::Geo("non-numeric position".into())),
            },
            _ => Err(ChartError::Geo("position needs two coordinates".into())),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

/// Outer ring first, then holes.
fn parse_polygon(v: &Value) -> Result<Polygon<f64>> {
    let mut rings = v
        .as_array()
        .ok_or_else(|| ChartError::Geo("polygon is not an array of rings".into()))?
        .iter()
        .map(parse_ring);
    let exterior = rings
        .next()
        .ok_or_else(|| ChartError::Geo("polygon without an outer ring".into()))??;
    Ok(Polygon::new(exterior, rings.collect::<Result<_>>()?))
}

fn parse_geometry(g: &Value) -> Result<MultiPolygon<f64>> {
    let coords = g
        .get("coordinates")
        .ok_or_else(|| ChartError::Geo("geometry without coordinates".into()))?;
    match g.get("type").and_then(Value::as_str) {
        Some("Polygon") => Ok(MultiPolygon::new(vec![parse_polygon(coords)?])),
        Some("MultiPolygon") => coords
            .as_array()
            .ok_or_else(|| ChartError::Geo("MultiPolygon coordinates are not an array".into()))?
            .iter()
            .map(parse_polygon)
            .collect::<Result<Vec<_>>>()
            .map(MultiPolygon::new),
        other => Err(ChartError::Geo(format!("unsupported geometry type {other:?}"))),
    }
}

/// Parse a `FeatureCollection` of polygon features.
///
/// Features without geometry are skipped; anything else malformed is an error.
pub fn parse_geojson(text: &str) -> Result<Vec<RegionFeature>> {
    let root: Value = serde_json::from_str(text)?;
    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| ChartError::Geo("expected a FeatureCollection with a features array".into()))?;
    let mut out = Vec::with_capacity(features.len());
    for f in features {
        let Some(geometry) = f.get("geometry").filter(|g| !g.is_null()) else {
            continue;
        };
        let props = f.get("properties");
        out.push(RegionFeature {
            code: first_property(props, &CODE_PROPERTIES),
            name: first_property(props, &NAME_PROPERTIES),
            geometry: parse_geometry(geometry)?,
        });
    }
    if out.is_empty() {
        return Err(ChartError::Geo("no polygon features".into()));
    }
    Ok(out)
}

fn mercator_raw(lon: f64, lat: f64) -> (f64, f64) {
    let (lambda, phi) = (lon.to_radians(), lat.to_radians());
    (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
}

/// Spherical Mercator scaled and translated to fit a pixel box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

impl MercatorProjection {
    /// Largest projection that fits every feature into `[x0, x1] × [y0, y1]`, centered.
    pub fn fit_extent(features: &[RegionFeature], (x0, y0): (f64, f64), (x1, y1): (f64, f64)) -> Option<Self> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for c in features.iter().flat_map(|f| f.geometry.coords_iter()) {
            let (x, y) = mercator_raw(c.x, c.y);
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x), d.max(y)),
            });
        }
        let (min_x, min_y, max_x, max_y) = bounds?;
        let (w, h) = (x1 - x0, y1 - y0);
        let (dx, dy) = (max_x - min_x, max_y - min_y);
        let scale = match (dx > 0.0, dy > 0.0) {
            (true, true) => (w / dx).min(h / dy),
            (true, false) => w / dx,
            (false, true) => h / dy,
            (false, false) => 1.0,
        };
        Some(Self {
            scale,
            tx: x0 + (w - scale * dx) / 2.0 - scale * min_x,
            ty: y0 + (h - scale * dy) / 2.0 + scale * max_y,
        })
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = mercator_raw(lon, lat);
        (self.tx + self.scale * x, self.ty - self.scale * y)
    }

    /// The feature's boundary in pixel space. Holes stay holes.
    pub fn project_feature(&self, feature: &RegionFeature) -> MultiPolygon<f64> {
        feature.geometry.map_coords(|c| {
            let (x, y) = self.project(c.x, c.y);
            Coord { x, y }
        })
    }
}

/// Index of the first projected shape containing `p`.
pub fn shape_at(shapes: &[MultiPolygon<f64>], (x, y): (f64, f64)) -> Option<usize> {
    let p = Point::new(x, y);
    shapes.iter().position(|shape| shape.contains(&p))
}
