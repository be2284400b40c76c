//! On-disk shape of a scene file
//!
//! ```json
//! {
//!   "camera": { "translation": "x y z", "rotation": "w x y z" },
//!   "objects": {
//!     "<id>": { "type": "point", "name": "Point1", "forming objects": [0.0, 1.0, 2.0] },
//!     "<id>": { "type": "line", "name": "Line1", "forming objects": ["<id>", "<id>"],
//!               "construction": "two_points" }
//!   },
//!   "children": { "<id>": ["<id>", ...] }
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::primitive::PrimitiveKind;
use crate::render::CameraSettings;

/// `type` value of a point
pub const TYPE_POINT: &str = "point";
/// `type` value of a line
pub const TYPE_LINE: &str = "line";
/// `type` value of a plane
pub const TYPE_PLANE: &str = "plane";
/// `type` value of a segment
pub const TYPE_SEGMENT: &str = "segment";
/// `type` value of a triangle
pub const TYPE_TRIANGLE: &str = "triangle";
/// `type` value of a body
pub const TYPE_BODY: &str = "base_3d_body";
/// Older spelling of [`TYPE_BODY`], accepted when reading
pub const TYPE_BODY_LEGACY: &str = "base_3d_object";

/// `type` string written for a kind
pub fn type_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Point => TYPE_POINT,
        PrimitiveKind::Line => TYPE_LINE,
        PrimitiveKind::Plane => TYPE_PLANE,
        PrimitiveKind::Segment => TYPE_SEGMENT,
        PrimitiveKind::Triangle => TYPE_TRIANGLE,
        PrimitiveKind::Body => TYPE_BODY,
    }
}

/// Kind named by a `type` string
pub fn kind_of_type(name: &str) -> Option<PrimitiveKind> {
    match name {
        TYPE_POINT => Some(PrimitiveKind::Point),
        TYPE_LINE => Some(PrimitiveKind::Line),
        TYPE_PLANE => Some(PrimitiveKind::Plane),
        TYPE_SEGMENT => Some(PrimitiveKind::Segment),
        TYPE_TRIANGLE => Some(PrimitiveKind::Triangle),
        TYPE_BODY | TYPE_BODY_LEGACY => Some(PrimitiveKind::Body),
        _ => None,
    }
}

/// Whole scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    /// Camera pose
    pub camera: CameraSettings,
    /// Objects by id, in scene order
    pub objects: OrderedMap<ObjectRecord>,
    /// Child ids by parent id
    #[serde(default)]
    pub children: OrderedMap<Vec<String>>,
}

/// One serialized primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Kind, see [`type_name`]
    #[serde(rename = "type")]
    pub kind: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Coordinates of a point, ids of the defining objects otherwise
    #[serde(rename = "forming objects")]
    pub forming_objects: Vec<FormingObject>,
    /// Lines cutting a plane
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cuts: Vec<String>,
    /// Which construction of the kind this is; absent in older files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction: Option<String>,
}

/// Entry of `forming objects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormingObject {
    /// Point coordinate
    Coordinate(f64),
    /// Id of a defining object
    Reference(String),
}

/// String-keyed JSON object that keeps its entries in file order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    /// Empty map
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an entry
    pub fn push(&mut self, key: impl Into<String>, value: V) {
        self.0.push((key.into(), value));
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map keyed by object id")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            entries.push((key, value));
        }
        Ok(OrderedMap(entries))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_order_survives_parsing() {
        let text = r#"{
            "camera": { "translation": "0 0 0", "rotation": "1 0 0 0" },
            "objects": {
                "b": { "type": "point", "name": "B", "forming objects": [1, 2, 3] },
                "a": { "type": "segment", "name": "A", "forming objects": ["b", "c"] }
            },
            "children": {}
        }"#;
        let file: SceneFile = serde_json::from_str(text).expect("parse");
        let ids: Vec<&str> = file.objects.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let point = file.objects.get("b").expect("point");
        assert_eq!(point.forming_objects[2], FormingObject::Coordinate(3.0));
        let segment = file.objects.get("a").expect("segment");
        assert_eq!(segment.forming_objects[0], FormingObject::Reference("b".to_string()));
        assert!(segment.construction.is_none());
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let record = ObjectRecord {
            kind: TYPE_SEGMENT.to_string(),
            name: "Edge1".to_string(),
            forming_objects: vec![FormingObject::Reference("x".to_string())],
            cuts: Vec::new(),
            construction: None,
        };
        let json = serde_json::to_string(&record).expect("json");
        assert_eq!(json, r#"{"type":"segment","name":"Edge1","forming objects":["x"]}"#);
    }

    #[test]
    fn test_legacy_body_type_is_read() {
        assert_eq!(kind_of_type("base_3d_object"), Some(PrimitiveKind::Body));
        assert_eq!(kind_of_type(type_name(PrimitiveKind::Body)), Some(PrimitiveKind::Body));
        assert_eq!(kind_of_type("sphere"), None);
    }
}
