//! Geometric primitives
//!
//! A [`Primitive`] is an identified, named construction. Derived constructions
//! reference their defining primitives by [`ObjectId`] and never store resolved
//! coordinates: geometry is recomputed on demand through a [`PrimitiveLookup`]
//! (see [`resolve`]), so moving a defining point is immediately visible to
//! everything built on it.

pub mod resolve;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::foundation::math::Vec3;

pub use resolve::PrimitiveLookup;

/// Persistent object identifier, shared by a primitive and its scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its hyphenated string form
    pub fn parse(text: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(text).map(Self)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Kind of geometric primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    /// A free point
    Point,
    /// An infinite line
    Line,
    /// An infinite plane
    Plane,
    /// A segment between two points (an edge)
    Segment,
    /// A triangle over three points (a face)
    Triangle,
    /// A generic N-point body
    Body,
}

impl PrimitiveKind {
    /// All kinds, in declaration order
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::Point,
        PrimitiveKind::Line,
        PrimitiveKind::Plane,
        PrimitiveKind::Segment,
        PrimitiveKind::Triangle,
        PrimitiveKind::Body,
    ];

    /// Prefix used for automatically generated names
    pub fn name_prefix(self) -> &'static str {
        match self {
            PrimitiveKind::Point => "Point",
            PrimitiveKind::Line => "Line",
            PrimitiveKind::Plane => "Plane",
            PrimitiveKind::Segment => "Edge",
            PrimitiveKind::Triangle => "Triangle",
            PrimitiveKind::Body => "Body",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::Point => "point",
            PrimitiveKind::Line => "line",
            PrimitiveKind::Plane => "plane",
            PrimitiveKind::Segment => "segment",
            PrimitiveKind::Triangle => "triangle",
            PrimitiveKind::Body => "body",
        };
        f.pad(name)
    }
}

/// How a primitive is defined
#[derive(Debug, Clone, PartialEq)]
pub enum Construction {
    /// Free point at a position
    Point {
        /// World position
        position: Vec3,
    },
    /// Line through two points
    LineByTwoPoints {
        /// First point
        a: ObjectId,
        /// Second point
        b: ObjectId,
    },
    /// Line through a point, parallel to another line
    LineByPointAndLine {
        /// Point on the new line
        point: ObjectId,
        /// Line giving the direction
        line: ObjectId,
    },
    /// Plane through three non-collinear points
    PlaneByThreePoints {
        /// First point
        a: ObjectId,
        /// Second point
        b: ObjectId,
        /// Third point
        c: ObjectId,
    },
    /// Plane through a point, parallel to another plane
    PlaneByPointAndPlane {
        /// Point on the new plane
        point: ObjectId,
        /// Plane giving the orientation
        plane: ObjectId,
    },
    /// Plane through a point and a line
    PlaneByPointAndLine {
        /// Point off the line
        point: ObjectId,
        /// Line contained in the plane
        line: ObjectId,
    },
    /// Plane through a point and a segment
    PlaneByPointAndSegment {
        /// Point off the segment
        point: ObjectId,
        /// Segment contained in the plane
        segment: ObjectId,
    },
    /// Segment between two points
    Segment {
        /// First endpoint
        a: ObjectId,
        /// Second endpoint
        b: ObjectId,
    },
    /// Triangle over three points
    Triangle {
        /// First corner
        a: ObjectId,
        /// Second corner
        b: ObjectId,
        /// Third corner
        c: ObjectId,
    },
    /// Body over an arbitrary list of points
    Body {
        /// Corner points
        points: Vec<ObjectId>,
    },
}

impl Construction {
    /// Kind of primitive this construction produces
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Construction::Point { .. } => PrimitiveKind::Point,
            Construction::LineByTwoPoints { .. } | Construction::LineByPointAndLine { .. } => PrimitiveKind::Line,
            Construction::PlaneByThreePoints { .. }
            | Construction::PlaneByPointAndPlane { .. }
            | Construction::PlaneByPointAndLine { .. }
            | Construction::PlaneByPointAndSegment { .. } => PrimitiveKind::Plane,
            Construction::Segment { .. } => PrimitiveKind::Segment,
            Construction::Triangle { .. } => PrimitiveKind::Triangle,
            Construction::Body { .. } => PrimitiveKind::Body,
        }
    }

    /// Referenced primitives together with the kind each must have
    pub fn requirements(&self) -> Vec<(ObjectId, PrimitiveKind)> {
        use PrimitiveKind as K;
        match self {
            Construction::Point { .. } => Vec::new(),
            Construction::LineByTwoPoints { a, b } | Construction::Segment { a, b } => vec![(*a, K::Point), (*b, K::Point)],
            Construction::LineByPointAndLine { point, line } => vec![(*point, K::Point), (*line, K::Line)],
            Construction::PlaneByThreePoints { a, b, c } | Construction::Triangle { a, b, c } => {
                vec![(*a, K::Point), (*b, K::Point), (*c, K::Point)]
            }
            Construction::PlaneByPointAndPlane { point, plane } => vec![(*point, K::Point), (*plane, K::Plane)],
            Construction::PlaneByPointAndLine { point, line } => vec![(*point, K::Point), (*line, K::Line)],
            Construction::PlaneByPointAndSegment { point, segment } => vec![(*point, K::Point), (*segment, K::Segment)],
            Construction::Body { points } => points.iter().map(|id| (*id, K::Point)).collect(),
        }
    }

    /// Ids of the forming objects, in order
    pub fn forming_ids(&self) -> Vec<ObjectId> {
        self.requirements().into_iter().map(|(id, _)| id).collect()
    }

    /// Explicit discriminator for derived kinds with several constructions
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Construction::LineByTwoPoints { .. } => Some("two_points"),
            Construction::LineByPointAndLine { .. } => Some("point_and_line"),
            Construction::PlaneByThreePoints { .. } => Some("three_points"),
            Construction::PlaneByPointAndPlane { .. } => Some("point_and_plane"),
            Construction::PlaneByPointAndLine { .. } => Some("point_and_line"),
            Construction::PlaneByPointAndSegment { .. } => Some("point_and_segment"),
            _ => None,
        }
    }
}

/// An identified, named geometric construction
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Persistent id
    pub id: ObjectId,
    /// Display name
    pub name: String,
    /// Definition
    pub construction: Construction,
    /// Lines cutting this plane (planes only, non-owning)
    pub cuts: Vec<ObjectId>,
}

impl Primitive {
    /// Create a primitive with a fresh id and no name
    pub fn new(construction: Construction) -> Self {
        Self::with_id(ObjectId::new(), String::new(), construction)
    }

    /// Create a primitive with a known id and name
    pub fn with_id(id: ObjectId, name: impl Into<String>, construction: Construction) -> Self {
        Self {
            id,
            name: name.into(),
            construction,
            cuts: Vec::new(),
        }
    }

    /// Kind of this primitive
    pub fn kind(&self) -> PrimitiveKind {
        self.construction.kind()
    }

    /// Position of a free point
    pub fn position(&self) -> Option<Vec3> {
        match &self.construction {
            Construction::Point { position } => Some(*position),
            _ => None,
        }
    }

    /// Register a cutting line; a no-op if already present
    pub fn add_cut(&mut self, line: ObjectId) {
        if !self.cuts.contains(&line) {
            self.cuts.push(line);
        }
    }

    /// Unregister a cutting line
    pub fn remove_cut(&mut self, line: ObjectId) -> bool {
        let before = self.cuts.len();
        self.cuts.retain(|id| *id != line);
        self.cuts.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_display_parses_back() {
        let id = ObjectId::new();
        assert_eq!(ObjectId::parse(&id.to_string()).expect("uuid"), id);
    }

    #[test]
    fn test_requirements_follow_construction() {
        let (p, l) = (ObjectId::new(), ObjectId::new());
        let c = Construction::LineByPointAndLine { point: p, line: l };
        assert_eq!(c.kind(), PrimitiveKind::Line);
        assert_eq!(c.requirements(), vec![(p, PrimitiveKind::Point), (l, PrimitiveKind::Line)]);
        assert_eq!(c.tag(), Some("point_and_line"));
        assert_eq!(Construction::Segment { a: p, b: l }.tag(), None);
    }

    #[test]
    fn test_cuts_are_unique() {
        let mut plane = Primitive::new(Construction::PlaneByThreePoints {
            a: ObjectId::new(),
            b: ObjectId::new(),
            c: ObjectId::new(),
        });
        let line = ObjectId::new();
        plane.add_cut(line);
        plane.add_cut(line);
        assert_eq!(plane.cuts, vec![line]);
        assert!(plane.remove_cut(line));
        assert!(!plane.remove_cut(line));
    }
}
