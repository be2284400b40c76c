//! # Scene Object Graph
//!
//! The scene is the single owner of every object. Objects live in a slot map
//! keyed by [`ObjectKey`]; dependency edges, the selection and the id index are
//! plain key lists resolved through that table, so there are no reference
//! cycles to manage.
//!
//! ## Graph Rules
//!
//! - Edges mirror primitive dependencies: a derived object is a child of every
//!   object named in its construction (plus any extra parents registered with
//!   [`Scene::add_parents`]). The graph stays acyclic.
//! - Removing an object removes all of its descendants and nothing else.
//! - Moving a point refreshes exactly the point and its descendants.
//! - Every batch of changes is reported once, synchronously, after it has been
//!   fully applied.

pub mod mesh;
pub mod object;

use std::collections::{HashMap, HashSet, VecDeque};

use slotmap::SlotMap;

use crate::core::EditorConfig;
use crate::events::{ObjectHandle, ObserverList, SceneEvent, SceneObserver, SubscriptionToken};
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::GeometryError;
use crate::primitive::{Construction, ObjectId, Primitive, PrimitiveKind, PrimitiveLookup};
use crate::render::{BufferAllocator, MeshArena, RenderError};

pub use object::{LocalMesh, ObjectKey, ObjectMesh, SceneObject, SelectionMask};

/// Render layer assigned to new objects
pub const DEFAULT_RENDER_LAYER: i32 = 1;

/// Scene errors
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// The key does not name a live object
    #[error("No object with key {0:?}")]
    MissingObject(ObjectKey),

    /// A construction references an id that is not in the scene
    #[error("No object with id {0}")]
    UnknownId(ObjectId),

    /// An object with this id already exists
    #[error("Duplicate object id {0}")]
    DuplicateId(ObjectId),

    /// The requested edge would make an object its own ancestor
    #[error("Making {parent} a parent of {child} would create a dependency cycle")]
    Cycle {
        /// Would-be child
        child: ObjectId,
        /// Would-be parent
        parent: ObjectId,
    },

    /// Geometry could not be resolved
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Vertex storage failure
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Owning table of scene objects plus selection, observers and mesh storage
pub struct Scene {
    objects: SlotMap<ObjectKey, SceneObject>,
    order: Vec<ObjectKey>,
    by_id: HashMap<ObjectId, ObjectKey>,
    selection: Vec<ObjectKey>,
    observers: ObserverList,
    name_counters: HashMap<PrimitiveKind, u32>,
    arena: MeshArena,
    config: EditorConfig,
}

impl Scene {
    /// Create an empty scene with host-memory vertex storage
    pub fn new(config: EditorConfig) -> Self {
        let arena = MeshArena::host(config.arena.block_vertex_capacity);
        Self::with_arena(config, arena)
    }

    /// Create an empty scene whose vertex blocks come from `allocator`
    pub fn with_allocator(config: EditorConfig, allocator: Box<dyn BufferAllocator>) -> Self {
        let arena = MeshArena::new(allocator, config.arena.block_vertex_capacity);
        Self::with_arena(config, arena)
    }

    fn with_arena(config: EditorConfig, arena: MeshArena) -> Self {
        Self {
            objects: SlotMap::with_key(),
            order: Vec::new(),
            by_id: HashMap::new(),
            selection: Vec::new(),
            observers: ObserverList::new(),
            name_counters: HashMap::new(),
            arena,
            config,
        }
    }

    /// Editor configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Shared vertex storage
    pub fn arena(&self) -> &MeshArena {
        &self.arena
    }

    // ---- Creation ----

    /// Create an object from a construction, with a fresh id and generated name
    pub fn create(&mut self, construction: Construction) -> SceneResult<ObjectKey> {
        self.add_object(Primitive::new(construction))
    }

    /// Create a free point
    pub fn create_point(&mut self, position: Vec3) -> SceneResult<ObjectKey> {
        self.create(Construction::Point { position })
    }

    /// Add one object; its forming objects must already be in the scene
    pub fn add_object(&mut self, primitive: Primitive) -> SceneResult<ObjectKey> {
        let key = self.insert(primitive)?;
        let handles = self.handle(key).into_iter().collect();
        self.observers.notify(&SceneEvent::ObjectsAdded(handles));
        Ok(key)
    }

    /// Add objects in order with a single notification.
    ///
    /// Each primitive may reference those before it. On failure nothing is
    /// added.
    pub fn add_objects(&mut self, primitives: Vec<Primitive>) -> SceneResult<Vec<ObjectKey>> {
        let mut keys = Vec::with_capacity(primitives.len());
        for primitive in primitives {
            match self.insert(primitive) {
                Ok(key) => keys.push(key),
                Err(err) => {
                    for key in keys.iter().rev() {
                        self.detach(*key);
                    }
                    let added: HashSet<ObjectKey> = keys.into_iter().collect();
                    self.order.retain(|k| !added.contains(k));
                    self.selection.retain(|k| !added.contains(k));
                    return Err(err);
                }
            }
        }
        let handles = keys.iter().filter_map(|key| self.handle(*key)).collect();
        self.observers.notify(&SceneEvent::ObjectsAdded(handles));
        Ok(keys)
    }

    fn insert(&mut self, mut primitive: Primitive) -> SceneResult<ObjectKey> {
        if self.by_id.contains_key(&primitive.id) {
            return Err(SceneError::DuplicateId(primitive.id));
        }

        let mut parents = Vec::new();
        for id in primitive.construction.forming_ids() {
            let parent = self.key_of(id).ok_or(SceneError::UnknownId(id))?;
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }

        let kind = primitive.kind();
        let geometry = mesh::build_geometry(&*self, &primitive, &self.config.display)?;
        if primitive.name.is_empty() {
            primitive.name = self.next_name(kind);
        }

        let mode = mesh::render_mode(kind);
        let color = mesh::color(kind, false);
        let vertex_count = geometry.positions.len();
        let object_mesh = if mesh::uses_shared_mesh(kind) {
            let lease = self.arena.request_mesh(vertex_count as u32, mode)?;
            lease.set_positions(&mut self.arena, &geometry.positions)?;
            lease.set_colors(&mut self.arena, &vec![color; vertex_count])?;
            ObjectMesh::Shared(lease)
        } else {
            ObjectMesh::Unique(LocalMesh { positions: geometry.positions, colors: vec![color; vertex_count] })
        };

        let id = primitive.id;
        let object = SceneObject {
            primitive,
            transform: Transform::from_translation(geometry.translation),
            selected: false,
            selection_mask: SelectionMask::for_kind(kind),
            render_mode: mode,
            render_layer: DEFAULT_RENDER_LAYER,
            parents: parents.clone(),
            children: Vec::new(),
            mesh: object_mesh,
        };

        let key = self.objects.insert(object);
        for parent in &parents {
            if let Some(parent) = self.objects.get_mut(*parent) {
                parent.children.push(key);
            }
        }
        self.by_id.insert(id, key);
        self.order.push(key);
        log::trace!("Added {} {} with {} parents", kind, id, parents.len());
        Ok(key)
    }

    fn next_name(&mut self, kind: PrimitiveKind) -> String {
        let counter = self.name_counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{}{}", kind.name_prefix(), counter)
    }

    // ---- Removal ----

    /// Remove an object and all of its descendants
    pub fn remove_object(&mut self, key: ObjectKey) -> SceneResult<Vec<ObjectHandle>> {
        self.remove_objects(&[key])
    }

    /// Remove objects and all of their descendants with a single notification
    pub fn remove_objects(&mut self, keys: &[ObjectKey]) -> SceneResult<Vec<ObjectHandle>> {
        if let Some(missing) = keys.iter().find(|key| !self.objects.contains_key(**key)) {
            return Err(SceneError::MissingObject(*missing));
        }

        let mut doomed = Vec::new();
        let mut seen = HashSet::new();
        for key in keys {
            for k in std::iter::once(*key).chain(self.descendants(*key)) {
                if seen.insert(k) {
                    doomed.push(k);
                }
            }
        }

        let removed_ids: HashSet<ObjectId> = doomed.iter().filter_map(|k| self.id_of(*k)).collect();
        for object in self.objects.values_mut() {
            object.primitive.cuts.retain(|id| !removed_ids.contains(id));
        }

        let handles: Vec<ObjectHandle> = doomed.iter().filter_map(|key| self.detach(*key)).collect();
        self.order.retain(|k| !seen.contains(k));
        self.selection.retain(|k| !seen.contains(k));
        log::debug!("Removed {} objects ({} requested)", handles.len(), keys.len());
        self.observers.notify(&SceneEvent::ObjectsRemoved(handles.clone()));
        Ok(handles)
    }

    /// Remove one object from the slot map, the id map, its neighbours and
    /// the arena. The caller prunes `order` and `selection`.
    fn detach(&mut self, key: ObjectKey) -> Option<ObjectHandle> {
        let object = self.objects.remove(key)?;
        for parent in &object.parents {
            if let Some(parent) = self.objects.get_mut(*parent) {
                parent.children.retain(|child| *child != key);
            }
        }
        for child in &object.children {
            if let Some(child) = self.objects.get_mut(*child) {
                child.parents.retain(|parent| *parent != key);
            }
        }
        self.by_id.remove(&object.id());
        if let ObjectMesh::Shared(lease) = &object.mesh {
            if let Err(err) = self.arena.release(lease) {
                log::warn!("Failed to release mesh of {}: {}", object.id(), err);
            }
        }
        Some(ObjectHandle { key, id: object.id() })
    }

    /// Remove everything and dispose the vertex storage
    pub fn clear(&mut self) {
        let handles: Vec<ObjectHandle> = self.order.iter().filter_map(|key| self.handle(*key)).collect();
        self.objects.clear();
        self.order.clear();
        self.by_id.clear();
        self.selection.clear();
        self.name_counters.clear();
        self.arena.dispose();
        log::info!("Scene cleared ({} objects)", handles.len());
        self.observers.notify(&SceneEvent::ObjectsRemoved(handles));
    }

    // ---- Position updates ----

    /// Move an object.
    ///
    /// A point moves to `position`. Any other object is shifted by moving its
    /// direct parent points by the offset between `position` and its current
    /// reference position. Afterwards each moved point and every descendant is
    /// refreshed exactly once.
    pub fn update_position(&mut self, key: ObjectKey, position: Vec3) -> SceneResult<()> {
        let object = self.objects.get(key).ok_or(SceneError::MissingObject(key))?;
        let targets: Vec<(ObjectKey, Vec3)> = if object.kind() == PrimitiveKind::Point {
            vec![(key, position)]
        } else {
            let delta = position - object.transform.translation;
            object
                .parents
                .iter()
                .filter_map(|parent| {
                    let parent_object = self.objects.get(*parent)?;
                    let current = parent_object.primitive.position()?;
                    Some((*parent, current + delta))
                })
                .collect()
        };

        for (target, position) in &targets {
            if let Some(object) = self.objects.get_mut(*target) {
                object.primitive.construction = Construction::Point { position: *position };
            }
        }

        let mut visited = HashSet::new();
        let mut queue: VecDeque<ObjectKey> = targets.iter().map(|(k, _)| *k).collect();
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next) {
                continue;
            }
            self.refresh_mesh(next);
            if let Some(object) = self.objects.get(next) {
                queue.extend(object.children.iter().copied());
            }
        }
        log::trace!("Position update of {:?} refreshed {} objects", key, visited.len());
        Ok(())
    }

    /// Recompute an object's mesh from its forming objects; failures keep the old mesh
    fn refresh_mesh(&mut self, key: ObjectKey) {
        let Some(object) = self.objects.get(key) else {
            return;
        };
        let geometry = match mesh::build_geometry(&*self, &object.primitive, &self.config.display) {
            Ok(geometry) => geometry,
            Err(err) => {
                log::error!("Failed to refresh {} '{}': {}", object.kind(), object.name(), err);
                return;
            }
        };

        let Some(object) = self.objects.get_mut(key) else {
            return;
        };
        object.transform.translation = geometry.translation;
        match &mut object.mesh {
            ObjectMesh::Shared(lease) => {
                if let Err(err) = lease.set_positions(&mut self.arena, &geometry.positions) {
                    log::error!("Failed to write positions of '{}': {}", object.primitive.name, err);
                }
            }
            ObjectMesh::Unique(local) => local.positions = geometry.positions,
        }
    }

    // ---- Selection ----

    /// Select objects; returns (and reports) only those that changed state
    pub fn select(&mut self, keys: &[ObjectKey]) -> Vec<ObjectHandle> {
        let changed = self.set_selected(keys, true);
        self.observers.notify(&SceneEvent::ObjectsSelected(changed.clone()));
        changed
    }

    /// Deselect objects; returns (and reports) only those that changed state
    pub fn deselect(&mut self, keys: &[ObjectKey]) -> Vec<ObjectHandle> {
        let changed = self.set_selected(keys, false);
        self.observers.notify(&SceneEvent::ObjectsDeselected(changed.clone()));
        changed
    }

    /// Deselect everything
    pub fn deselect_all(&mut self) -> Vec<ObjectHandle> {
        let keys = self.selection.clone();
        self.deselect(&keys)
    }

    fn set_selected(&mut self, keys: &[ObjectKey], selected: bool) -> Vec<ObjectHandle> {
        let mut changed = Vec::new();
        for key in keys {
            let Some(object) = self.objects.get_mut(*key) else {
                log::warn!("Ignoring selection change of missing object {:?}", key);
                continue;
            };
            if object.selected == selected {
                continue;
            }
            object.selected = selected;
            changed.push(ObjectHandle { key: *key, id: object.id() });
            if selected {
                self.selection.push(*key);
            } else {
                self.selection.retain(|k| k != key);
            }
            self.recolor(*key);
        }
        changed
    }

    fn recolor(&mut self, key: ObjectKey) {
        let Some(object) = self.objects.get_mut(key) else {
            return;
        };
        let color = mesh::color(object.kind(), object.selected);
        match &mut object.mesh {
            ObjectMesh::Shared(lease) => {
                let colors = vec![color; lease.vertex_count() as usize];
                if let Err(err) = lease.set_colors(&mut self.arena, &colors) {
                    log::error!("Failed to recolor '{}': {}", object.primitive.name, err);
                }
            }
            ObjectMesh::Unique(local) => local.colors = vec![color; local.positions.len()],
        }
    }

    /// Selected objects, in selection order
    pub fn selected(&self) -> &[ObjectKey] {
        &self.selection
    }

    /// Whether an object is selected
    pub fn is_selected(&self, key: ObjectKey) -> bool {
        self.objects.get(key).map_or(false, SceneObject::is_selected)
    }

    // ---- Graph queries and edits ----

    /// Object by key
    pub fn get(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    /// Key of the object with a persistent id
    pub fn key_of(&self, id: ObjectId) -> Option<ObjectKey> {
        self.by_id.get(&id).copied()
    }

    /// Persistent id of an object
    pub fn id_of(&self, key: ObjectKey) -> Option<ObjectId> {
        self.objects.get(key).map(SceneObject::id)
    }

    fn handle(&self, key: ObjectKey) -> Option<ObjectHandle> {
        self.id_of(key).map(|id| ObjectHandle { key, id })
    }

    /// Objects in insertion order
    pub fn objects(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> + '_ {
        self.order.iter().filter_map(move |key| self.objects.get(*key).map(|object| (*key, object)))
    }

    /// Keys in insertion order
    pub fn keys(&self) -> &[ObjectKey] {
        &self.order
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the scene is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether a key names a live object
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    /// Number of objects of a kind
    pub fn count_of(&self, kind: PrimitiveKind) -> usize {
        self.objects().filter(|(_, object)| object.kind() == kind).count()
    }

    /// Direct parents of an object
    pub fn parents(&self, key: ObjectKey) -> &[ObjectKey] {
        self.objects.get(key).map(|object| object.parents.as_slice()).unwrap_or_default()
    }

    /// Direct children of an object
    pub fn children(&self, key: ObjectKey) -> &[ObjectKey] {
        self.objects.get(key).map(|object| object.children.as_slice()).unwrap_or_default()
    }

    /// Every object reachable through child edges, breadth first, excluding `key`
    pub fn descendants(&self, key: ObjectKey) -> Vec<ObjectKey> {
        let mut result = Vec::new();
        let mut visited = HashSet::from([key]);
        let mut queue: VecDeque<ObjectKey> = self.children(key).iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next) {
                continue;
            }
            result.push(next);
            queue.extend(self.children(next).iter().copied());
        }
        result
    }

    /// An existing object of `kind` that already depends on every one of `parents`
    pub fn common_child(&self, parents: &[ObjectKey], kind: PrimitiveKind) -> Option<ObjectKey> {
        let (first, rest) = parents.split_first()?;
        self.children(*first).iter().copied().find(|child| {
            self.objects
                .get(*child)
                .map_or(false, |object| object.kind() == kind && rest.iter().all(|p| object.parents.contains(p)))
        })
    }

    /// Register extra dependency edges; existing edges are skipped
    pub fn add_parents(&mut self, child: ObjectKey, parents: &[ObjectKey]) -> SceneResult<()> {
        let child_id = self.id_of(child).ok_or(SceneError::MissingObject(child))?;
        let descendants: HashSet<ObjectKey> = self.descendants(child).into_iter().collect();
        for parent in parents {
            let parent_id = self.id_of(*parent).ok_or(SceneError::MissingObject(*parent))?;
            if *parent == child || descendants.contains(parent) {
                return Err(SceneError::Cycle { child: child_id, parent: parent_id });
            }
        }

        for parent in parents {
            if self.parents(child).contains(parent) {
                continue;
            }
            if let Some(object) = self.objects.get_mut(child) {
                object.parents.push(*parent);
            }
            if let Some(object) = self.objects.get_mut(*parent) {
                object.children.push(child);
            }
        }
        Ok(())
    }

    fn expect_kind(&self, key: ObjectKey, expected: PrimitiveKind) -> SceneResult<ObjectId> {
        let object = self.objects.get(key).ok_or(SceneError::MissingObject(key))?;
        if object.kind() != expected {
            return Err(GeometryError::WrongKind { id: object.id(), expected, found: object.kind() }.into());
        }
        Ok(object.id())
    }

    /// Register `line` as cutting `plane`
    pub fn add_cut(&mut self, plane: ObjectKey, line: ObjectKey) -> SceneResult<()> {
        let line_id = self.expect_kind(line, PrimitiveKind::Line)?;
        self.expect_kind(plane, PrimitiveKind::Plane)?;
        if let Some(object) = self.objects.get_mut(plane) {
            object.primitive.add_cut(line_id);
        }
        Ok(())
    }

    /// Unregister a cut; returns whether it was present
    pub fn remove_cut(&mut self, plane: ObjectKey, line: ObjectKey) -> SceneResult<bool> {
        let line_id = self.id_of(line).ok_or(SceneError::MissingObject(line))?;
        self.expect_kind(plane, PrimitiveKind::Plane)?;
        Ok(self.objects.get_mut(plane).map_or(false, |object| object.primitive.remove_cut(line_id)))
    }

    // ---- Observers ----

    /// Register an observer; it is called synchronously after every batch
    pub fn subscribe(&mut self, observer: impl SceneObserver + 'static) -> SubscriptionToken {
        self.observers.subscribe(Box::new(observer))
    }

    /// Remove an observer; returns whether it was registered
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.observers.unsubscribe(token)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl PrimitiveLookup for Scene {
    fn find_primitive(&self, id: ObjectId) -> Option<&Primitive> {
        self.key_of(id).and_then(|key| self.objects.get(key)).map(SceneObject::primitive)
    }
}
