//! TopoJSON decoding.
//!
//! Topologies store shared borders once as "arcs"; polygons reference arcs
//! by index (negative indices `!i` mean arc `i` reversed). Decoding stitches
//! arcs back into rings and yields plain [`Feature`]s.

use serde_json::Value;

use crate::error::FormatError;
use crate::geojson::{Feature, FeatureCollection, GeoPoint, Geometry, Ring, id_to_string};

/// Quantization transform: positions are delta-encoded integers when present.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Quantization {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    arcs: Vec<Vec<GeoPoint>>,
    objects: serde_json::Map<String, Value>,
}

impl Topology {
    pub fn from_json_str(payload: &str) -> Result<Self, FormatError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, FormatError> {
        let Value::Object(mut obj) = value else {
            return Err(FormatError::NotATopology);
        };
        if obj.get("type").and_then(|v| v.as_str()) != Some("Topology") {
            return Err(FormatError::NotATopology);
        }

        let quantization = match obj.get("transform") {
            Some(t) => Some(parse_quantization(t)?),
            None => None,
        };

        let arcs_val = obj
            .get("arcs")
            .and_then(|v| v.as_array())
            .ok_or(FormatError::NotATopology)?;
        let mut arcs = Vec::with_capacity(arcs_val.len());
        for (index, arc) in arcs_val.iter().enumerate() {
            let decoded = decode_arc(arc, quantization)
                .map_err(|reason| FormatError::InvalidArc { index, reason })?;
            arcs.push(decoded);
        }

        let objects = match obj.remove("objects") {
            Some(Value::Object(map)) => map,
            _ => return Err(FormatError::NotATopology),
        };

        Ok(Self { arcs, objects })
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(|k| k.as_str())
    }

    /// Converts the named object (usually a `GeometryCollection`) to features.
    pub fn feature_collection(&self, object: &str) -> Result<FeatureCollection, FormatError> {
        let obj = self
            .objects
            .get(object)
            .ok_or_else(|| FormatError::MissingObject(object.to_string()))?;

        let geometries: Vec<&Value> =
            if obj.get("type").and_then(|v| v.as_str()) == Some("GeometryCollection") {
                obj.get("geometries")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().collect())
                    .unwrap_or_default()
            } else {
                vec![obj]
            };

        let mut features = Vec::with_capacity(geometries.len());
        for (index, geom) in geometries.into_iter().enumerate() {
            let geometry = self
                .geometry(geom)
                .map_err(|reason| FormatError::InvalidFeature { index, reason })?;
            let properties = geom
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();
            features.push(Feature {
                id: id_to_string(geom.get("id")),
                properties,
                geometry,
            });
        }
        Ok(FeatureCollection { features })
    }

    fn geometry(&self, geom: &Value) -> Result<Geometry, String> {
        match geom.get("type").and_then(|v| v.as_str()) {
            Some("Polygon") => {
                let rings = geom
                    .get("arcs")
                    .ok_or("Polygon missing arcs".to_string())?;
                Ok(Geometry::Polygon(self.polygon(rings)?))
            }
            Some("MultiPolygon") => {
                let polys = geom
                    .get("arcs")
                    .and_then(|v| v.as_array())
                    .ok_or("MultiPolygon arcs must be an array".to_string())?;
                let mut out = Vec::with_capacity(polys.len());
                for poly in polys {
                    out.push(self.polygon(poly)?);
                }
                Ok(Geometry::MultiPolygon(out))
            }
            _ => Ok(Geometry::Empty),
        }
    }

    fn polygon(&self, rings: &Value) -> Result<Vec<Ring>, String> {
        let rings = rings
            .as_array()
            .ok_or("polygon arcs must be an array of rings".to_string())?;
        let mut out = Vec::with_capacity(rings.len());
        for ring in rings {
            let indices = ring
                .as_array()
                .ok_or("ring must be an array of arc indices".to_string())?
                .iter()
                .map(|v| v.as_i64().ok_or("arc index must be an integer".to_string()))
                .collect::<Result<Vec<i64>, String>>()?;
            out.push(self.stitch(&indices)?);
        }
        Ok(out)
    }

    /// Joins arcs end to start. Consecutive arcs share an endpoint, which is
    /// dropped once.
    fn stitch(&self, indices: &[i64]) -> Result<Ring, String> {
        let mut points: Ring = Vec::new();
        for &i in indices {
            let (idx, reversed) = if i < 0 { (!i, true) } else { (i, false) };
            let arc = usize::try_from(idx)
                .ok()
                .and_then(|idx| self.arcs.get(idx))
                .ok_or_else(|| format!("arc index {i} out of range"))?;
            points.pop();
            let start = points.len();
            points.extend_from_slice(arc);
            if reversed {
                points[start..].reverse();
            }
        }
        Ok(points)
    }
}

fn parse_quantization(value: &Value) -> Result<Quantization, FormatError> {
    let pair = |key: &str| -> Result<[f64; 2], FormatError> {
        let arr = value
            .get(key)
            .and_then(|v| v.as_array())
            .filter(|a| a.len() == 2)
            .ok_or(FormatError::NotATopology)?;
        match (arr[0].as_f64(), arr[1].as_f64()) {
            (Some(a), Some(b)) => Ok([a, b]),
            _ => Err(FormatError::NotATopology),
        }
    };
    Ok(Quantization {
        scale: pair("scale")?,
        translate: pair("translate")?,
    })
}

fn decode_arc(arc: &Value, quantization: Option<Quantization>) -> Result<Vec<GeoPoint>, String> {
    let positions = arc.as_array().ok_or("arc must be an array".to_string())?;
    let mut out = Vec::with_capacity(positions.len());
    let (mut x, mut y) = (0.0, 0.0);
    for pos in positions {
        let pos = pos
            .as_array()
            .filter(|p| p.len() >= 2)
            .ok_or("arc position must be [x, y]".to_string())?;
        let (px, py) = match (pos[0].as_f64(), pos[1].as_f64()) {
            (Some(px), Some(py)) => (px, py),
            _ => return Err("arc position must be numeric".to_string()),
        };
        let point = match quantization {
            Some(q) => {
                x += px;
                y += py;
                GeoPoint::new(
                    x * q.scale[0] + q.translate[0],
                    y * q.scale[1] + q.translate[1],
                )
            }
            None => GeoPoint::new(px, py),
        };
        out.push(point);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::Topology;
    use crate::error::FormatError;
    use crate::geojson::{GeoPoint, Geometry};
    use pretty_assertions::assert_eq;

    // Two squares sharing the edge x=1; arc 1 is the shared border.
    const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "arcs": [
            [[1, 0], [0, 0], [0, 1], [1, 1]],
            [[1, 1], [1, 0]],
            [[1, 1], [2, 1], [2, 0], [1, 0]]
        ],
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "id": "250", "properties": { "name": "West" }, "arcs": [[0, 1]] },
                    { "type": "MultiPolygon", "id": 276, "properties": { "name": "East" }, "arcs": [[[2, -2]]] },
                    { "type": null, "id": "010", "properties": { "name": "Nowhere" } }
                ]
            }
        }
    }"#;

    fn pts(coords: &[(f64, f64)]) -> Vec<GeoPoint> {
        coords.iter().map(|&(x, y)| GeoPoint::new(x, y)).collect()
    }

    #[test]
    fn stitches_shared_arcs() {
        let topo = Topology::from_json_str(TWO_SQUARES).expect("topology");
        let fc = topo.feature_collection("countries").expect("countries");
        assert_eq!(fc.len(), 3);

        let west = &fc.features[0];
        assert_eq!(west.id.as_deref(), Some("250"));
        assert_eq!(west.property_str("name").as_deref(), Some("West"));
        assert_eq!(
            west.geometry,
            Geometry::Polygon(vec![pts(&[(1.0, 0.0), (0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])])
        );

        // Reversed arc 1 runs (1,0) -> (1,1).
        let east = &fc.features[1];
        assert_eq!(east.id.as_deref(), Some("276"));
        assert_eq!(
            east.geometry,
            Geometry::MultiPolygon(vec![vec![pts(&[
                (1.0, 1.0),
                (2.0, 1.0),
                (2.0, 0.0),
                (1.0, 0.0),
                (1.0, 1.0)
            ])]])
        );

        assert_eq!(fc.features[2].geometry, Geometry::Empty);
    }

    #[test]
    fn decodes_quantized_delta_arcs() {
        let payload = r#"{
            "type": "Topology",
            "transform": { "scale": [0.5, 0.25], "translate": [-10, 20] },
            "arcs": [[[0, 0], [4, 0], [0, 4], [-4, -4]]],
            "objects": { "land": { "type": "Polygon", "arcs": [[0]] } }
        }"#;
        let topo = Topology::from_json_str(payload).expect("topology");
        assert_eq!(topo.object_names().collect::<Vec<_>>(), vec!["land"]);
        let fc = topo.feature_collection("land").expect("land");
        assert_eq!(
            fc.features[0].geometry,
            Geometry::Polygon(vec![pts(&[(-10.0, 20.0), (-8.0, 20.0), (-8.0, 21.0), (-10.0, 20.0)])])
        );
    }

    #[test]
    fn missing_object_and_bad_arc_index_are_errors() {
        let topo = Topology::from_json_str(TWO_SQUARES).expect("topology");
        assert_eq!(
            topo.feature_collection("land").unwrap_err(),
            FormatError::MissingObject("land".to_string())
        );

        let payload = r#"{
            "type": "Topology",
            "arcs": [],
            "objects": { "land": { "type": "Polygon", "arcs": [[3]] } }
        }"#;
        let topo = Topology::from_json_str(payload).expect("topology");
        assert!(matches!(
            topo.feature_collection("land"),
            Err(FormatError::InvalidFeature { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_feature_collections() {
        let err = Topology::from_json_str(r#"{"type":"FeatureCollection","features":[]}"#).unwrap_err();
        assert_eq!(err, FormatError::NotATopology);
    }
}
