//! # Scene Files
//!
//! JSON persistence of a scene and its camera pose. See [`format`] for the
//! file layout.
//!
//! Derived objects carry a `construction` tag naming how they were built.
//! Files without it are still read: the construction is inferred from the
//! kind of the second forming object.
//!
//! Loading builds the whole scene before handing it over, so a broken file
//! never yields a partial scene.

pub mod format;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::core::config::EditorConfig;
use crate::foundation::math::Vec3;
use crate::primitive::{Construction, ObjectId, Primitive, PrimitiveKind};
use crate::render::{Camera, CameraSettings, CameraSettingsError};
use crate::scene::{ObjectKey, Scene, SceneError};

pub use format::{FormingObject, ObjectRecord, OrderedMap, SceneFile};

/// Scene file errors
#[derive(thiserror::Error, Debug)]
pub enum SerializationError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON of the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An object refers to an id the file does not contain
    #[error("Object {object} references missing object {reference}")]
    MissingReference {
        /// Referring object
        object: String,
        /// Absent id
        reference: String,
    },

    /// Unrecognized `type`
    #[error("Object {object} has unknown type {kind:?}")]
    UnknownType {
        /// Offending object
        object: String,
        /// The type string
        kind: String,
    },

    /// Unrecognized `construction` tag
    #[error("Object {object} has unknown construction {tag:?}")]
    UnknownConstruction {
        /// Offending object
        object: String,
        /// The tag
        tag: String,
    },

    /// An id that is not a UUID
    #[error("Invalid object id {0:?}")]
    InvalidId(String),

    /// Wrong number or kind of forming objects
    #[error("Object {object} is malformed: {reason}")]
    Malformed {
        /// Offending object
        object: String,
        /// What is wrong
        reason: String,
    },

    /// An object depends on itself
    #[error("Object {0} depends on itself")]
    Cycle(String),

    /// Bad camera settings
    #[error(transparent)]
    Camera(#[from] CameraSettingsError),

    /// The scene rejected a loaded object
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Result type for scene file operations
pub type SerializationResult<T> = Result<T, SerializationError>;

/// A scene read from a file, with the camera pose stored alongside it
pub struct LoadedScene {
    /// Reconstructed scene
    pub scene: Scene,
    /// Camera pose to apply
    pub camera: CameraSettings,
}

impl LoadedScene {
    /// Move `camera` to the stored pose
    pub fn apply_camera(&self, camera: &mut Camera) -> SerializationResult<()> {
        camera.apply_settings(&self.camera)?;
        Ok(())
    }
}

/// Build the file representation of a scene
pub fn encode(scene: &Scene, camera: CameraSettings) -> SceneFile {
    let mut objects = OrderedMap::new();
    let mut children = OrderedMap::new();

    for (_, object) in scene.objects() {
        let primitive = object.primitive();
        let forming_objects = match &primitive.construction {
            Construction::Point { position } => position.iter().copied().map(FormingObject::Coordinate).collect(),
            construction => construction
                .forming_ids()
                .into_iter()
                .map(|id| FormingObject::Reference(id.to_string()))
                .collect(),
        };
        objects.push(
            primitive.id.to_string(),
            ObjectRecord {
                kind: format::type_name(primitive.kind()).to_string(),
                name: primitive.name.clone(),
                forming_objects,
                cuts: primitive.cuts.iter().map(ObjectId::to_string).collect(),
                construction: primitive.construction.tag().map(str::to_string),
            },
        );

        let child_ids = object.children().iter().filter_map(|key| scene.id_of(*key)).map(|id| id.to_string()).collect();
        children.push(primitive.id.to_string(), child_ids);
    }

    SceneFile { camera, objects, children }
}

/// Serialize a scene to a JSON string
pub fn to_json(scene: &Scene, camera: CameraSettings) -> SerializationResult<String> {
    Ok(serde_json::to_string_pretty(&encode(scene, camera))?)
}

/// Write a scene file
pub fn save_scene(scene: &Scene, camera: CameraSettings, path: impl AsRef<Path>) -> SerializationResult<()> {
    let path = path.as_ref();
    std::fs::write(path, to_json(scene, camera)?)?;
    log::info!("Saved {} objects to {}", scene.len(), path.display());
    Ok(())
}

/// Parse a scene from a JSON string
pub fn from_json(text: &str, config: EditorConfig) -> SerializationResult<LoadedScene> {
    let file: SceneFile = serde_json::from_str(text)?;
    decode(&file, config)
}

/// Read a scene file
pub fn load_scene(path: impl AsRef<Path>, config: EditorConfig) -> SerializationResult<LoadedScene> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let loaded = from_json(&text, config)?;
    log::info!("Loaded {} objects from {}", loaded.scene.len(), path.display());
    Ok(loaded)
}

/// Rebuild a scene from its file representation
pub fn decode(file: &SceneFile, config: EditorConfig) -> SerializationResult<LoadedScene> {
    let mut decoder = Decoder::new(file);
    for (id, _) in file.objects.iter() {
        decoder.decode(id)?;
    }
    let Decoder { primitives, cuts, .. } = decoder;

    let mut scene = Scene::new(config);
    scene.add_objects(primitives)?;

    for (parent, child_ids) in file.children.iter() {
        let parent_key = key_in(&scene, parent, parent)?;
        for child in child_ids {
            let child_key = key_in(&scene, parent, child)?;
            scene.add_parents(child_key, &[parent_key])?;
        }
    }

    for (plane, line) in cuts {
        let plane_key = key_in(&scene, &plane, &plane)?;
        let line_key = key_in(&scene, &plane, &line)?;
        scene.add_cut(plane_key, line_key)?;
    }

    Ok(LoadedScene { scene, camera: file.camera.clone() })
}

fn parse_id(id: &str) -> SerializationResult<ObjectId> {
    ObjectId::parse(id).map_err(|_| SerializationError::InvalidId(id.to_string()))
}

fn key_in(scene: &Scene, object: &str, reference: &str) -> SerializationResult<ObjectKey> {
    parse_id(reference)
        .ok()
        .and_then(|id| scene.key_of(id))
        .ok_or_else(|| SerializationError::MissingReference { object: object.to_string(), reference: reference.to_string() })
}

/// Depth-first, memoized reconstruction: every primitive is emitted after the
/// primitives it references, and shared dependencies are emitted once
struct Decoder<'a> {
    records: HashMap<&'a str, &'a ObjectRecord>,
    kinds: HashMap<&'a str, PrimitiveKind>,
    in_progress: HashSet<&'a str>,
    primitives: Vec<Primitive>,
    cuts: Vec<(String, String)>,
}

impl<'a> Decoder<'a> {
    fn new(file: &'a SceneFile) -> Self {
        let mut records = HashMap::with_capacity(file.objects.len());
        for (id, record) in file.objects.iter() {
            records.entry(id).or_insert(record);
        }
        Self {
            records,
            kinds: HashMap::new(),
            in_progress: HashSet::new(),
            primitives: Vec::with_capacity(file.objects.len()),
            cuts: Vec::new(),
        }
    }

    fn decode(&mut self, id: &'a str) -> SerializationResult<PrimitiveKind> {
        if let Some(kind) = self.kinds.get(id) {
            return Ok(*kind);
        }
        if !self.in_progress.insert(id) {
            return Err(SerializationError::Cycle(id.to_string()));
        }
        let record = *self.records.get(id).ok_or_else(|| SerializationError::InvalidId(id.to_string()))?;
        let malformed = |reason: &str| SerializationError::Malformed { object: id.to_string(), reason: reason.to_string() };

        let kind = format::kind_of_type(&record.kind)
            .ok_or_else(|| SerializationError::UnknownType { object: id.to_string(), kind: record.kind.clone() })?;

        let construction = if kind == PrimitiveKind::Point {
            let coordinates: Vec<f64> = record
                .forming_objects
                .iter()
                .map(|forming| match forming {
                    FormingObject::Coordinate(value) => Some(*value),
                    FormingObject::Reference(_) => None,
                })
                .collect::<Option<_>>()
                .ok_or_else(|| malformed("point coordinates must be numbers"))?;
            let [x, y, z]: [f64; 3] = coordinates.try_into().map_err(|_| malformed("a point needs three coordinates"))?;
            Construction::Point { position: Vec3::new(x, y, z) }
        } else {
            let mut forming = Vec::with_capacity(record.forming_objects.len());
            for entry in &record.forming_objects {
                let FormingObject::Reference(reference) = entry else {
                    return Err(malformed("forming objects of a derived object must be ids"));
                };
                if !self.records.contains_key(reference.as_str()) {
                    return Err(SerializationError::MissingReference {
                        object: id.to_string(),
                        reference: reference.clone(),
                    });
                }
                let dependency_kind = self.decode(reference)?;
                forming.push((parse_id(reference)?, dependency_kind));
            }
            construction_for(id, kind, record.construction.as_deref(), &forming)?
        };

        let primitive = Primitive::with_id(parse_id(id)?, record.name.clone(), construction);
        for line in &record.cuts {
            if !self.records.contains_key(line.as_str()) {
                return Err(SerializationError::MissingReference { object: id.to_string(), reference: line.clone() });
            }
            self.cuts.push((id.to_string(), line.clone()));
        }

        self.in_progress.remove(id);
        self.kinds.insert(id, kind);
        self.primitives.push(primitive);
        Ok(kind)
    }
}

/// Pick the construction of a derived object from its tag, or from the kind
/// of its second forming object when the tag is absent
fn construction_for(
    object: &str,
    kind: PrimitiveKind,
    tag: Option<&str>,
    forming: &[(ObjectId, PrimitiveKind)],
) -> SerializationResult<Construction> {
    let arity = |n: usize| {
        if forming.len() == n {
            Ok(())
        } else {
            Err(SerializationError::Malformed {
                object: object.to_string(),
                reason: format!("expected {} forming objects, found {}", n, forming.len()),
            })
        }
    };
    let ids: Vec<ObjectId> = forming.iter().map(|(id, _)| *id).collect();
    let second = forming.get(1).map(|(_, kind)| *kind);

    let tag = match tag {
        Some(tag) => tag,
        None => match (kind, second) {
            (PrimitiveKind::Line, Some(PrimitiveKind::Line)) => "point_and_line",
            (PrimitiveKind::Line, _) => "two_points",
            (PrimitiveKind::Plane, Some(PrimitiveKind::Plane)) => "point_and_plane",
            (PrimitiveKind::Plane, Some(PrimitiveKind::Line)) => "point_and_line",
            (PrimitiveKind::Plane, Some(PrimitiveKind::Segment)) => "point_and_segment",
            (PrimitiveKind::Plane, _) => "three_points",
            _ => "",
        },
    };

    Ok(match (kind, tag) {
        (PrimitiveKind::Line, "two_points") => {
            arity(2)?;
            Construction::LineByTwoPoints { a: ids[0], b: ids[1] }
        }
        (PrimitiveKind::Line, "point_and_line") => {
            arity(2)?;
            Construction::LineByPointAndLine { point: ids[0], line: ids[1] }
        }
        (PrimitiveKind::Plane, "three_points") => {
            arity(3)?;
            Construction::PlaneByThreePoints { a: ids[0], b: ids[1], c: ids[2] }
        }
        (PrimitiveKind::Plane, "point_and_plane") => {
            arity(2)?;
            Construction::PlaneByPointAndPlane { point: ids[0], plane: ids[1] }
        }
        (PrimitiveKind::Plane, "point_and_line") => {
            arity(2)?;
            Construction::PlaneByPointAndLine { point: ids[0], line: ids[1] }
        }
        (PrimitiveKind::Plane, "point_and_segment") => {
            arity(2)?;
            Construction::PlaneByPointAndSegment { point: ids[0], segment: ids[1] }
        }
        (PrimitiveKind::Segment, _) => {
            arity(2)?;
            Construction::Segment { a: ids[0], b: ids[1] }
        }
        (PrimitiveKind::Triangle, _) => {
            arity(3)?;
            Construction::Triangle { a: ids[0], b: ids[1], c: ids[2] }
        }
        (PrimitiveKind::Body, _) => Construction::Body { points: ids },
        (_, tag) => {
            return Err(SerializationError::UnknownConstruction { object: object.to_string(), tag: tag.to_string() })
        }
    })
}
