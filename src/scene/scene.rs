use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;
use slotmap::Key;

use super::camera::Camera;
use super::graph::SceneGraph;
use super::primitive::{ContainerData, GeometryData, LightData, ParticleData, Primitive, PrimitiveKind};
use super::PrimitiveKey;
use crate::animation::MotionState;
use crate::assets::{ListenerToken, ResourceNotifier};
use crate::errors::Result;
use crate::math::{Aabb, Frustum, Transform};
use crate::particles::{ParticleEffectState, ParticleSystem, ParticleSystemPlayer};
use crate::physics::{ControllerData, HeightField, HeightFieldActorData, PhysicsScene, RigidActorData};
use crate::resources::container_prototype::{ContainerPrototype, PayloadDescriptor, PrimitiveDescriptor};
use crate::resources::geometry::Geometry;
use crate::spatial::AccelerationStructure;
use rustc_hash::FxHashSet;

/// Collaborators a scene is wired to.
///
/// Notifiers come from the matching resource managers; any of them (and the
/// player/physics scene) may be absent in headless setups.
#[derive(Default)]
pub struct SceneDescriptor {
    /// Acceleration structure over geometry and particle primitives.
    pub geometry_accel: Option<Arc<dyn AccelerationStructure>>,
    /// Acceleration structure over light primitives.
    pub light_accel: Option<Arc<dyn AccelerationStructure>>,
    /// Player simulating this scene's particle primitives.
    pub particle_player: Option<Arc<ParticleSystemPlayer>>,
    /// Physics world for rigid actors and controllers.
    pub physics_scene: Option<Arc<PhysicsScene>>,
    /// Geometry manager's loaded notifier (bounds refresh).
    pub geometry_notifier: Option<Arc<ResourceNotifier<Geometry>>>,
    /// Particle-system manager's loaded notifier (stream allocation).
    pub particle_notifier: Option<Arc<ResourceNotifier<ParticleSystem>>>,
    /// Container manager's loaded notifier (prototype instantiation).
    pub prototype_notifier: Option<Arc<ResourceNotifier<ContainerPrototype>>>,
    /// Heightfield manager's loaded notifier (shape building).
    pub height_field_notifier: Option<Arc<ResourceNotifier<HeightField>>>,
}

/// A scene: a specialized container owning acceleration structures and
/// cameras, reacting to child add/remove by registering primitives with its
/// spatial structures, the particle player and the physics scene.
pub struct Scene {
    graph: SceneGraph,
    root: PrimitiveKey,

    geometry_accel: Option<Arc<dyn AccelerationStructure>>,
    light_accel: Option<Arc<dyn AccelerationStructure>>,
    particle_player: Option<Arc<ParticleSystemPlayer>>,
    physics_scene: Option<Arc<PhysicsScene>>,

    geometry_notifier: Option<Arc<ResourceNotifier<Geometry>>>,
    particle_notifier: Option<Arc<ResourceNotifier<ParticleSystem>>>,
    prototype_notifier: Option<Arc<ResourceNotifier<ContainerPrototype>>>,
    height_field_notifier: Option<Arc<ResourceNotifier<HeightField>>>,

    camera: Camera,
    occlusion_camera: Camera,
    occlusion_camera_frozen: bool,

    registered: FxHashSet<PrimitiveKey>,

    // Deferred work queued from notifier callbacks (which run on worker
    // threads and cannot touch the graph).
    pending_refresh: Arc<Mutex<Vec<PrimitiveKey>>>,
    pending_prototypes: Arc<Mutex<Vec<PrimitiveKey>>>,
    pending_shapes: Arc<Mutex<Vec<PrimitiveKey>>>,

    touched: Vec<PrimitiveKey>,
}

impl Scene {
    /// Creates a scene with a root container at identity.
    #[must_use]
    pub fn new(descriptor: SceneDescriptor) -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Primitive::container(Transform::IDENTITY));

        Self {
            graph,
            root,
            geometry_accel: descriptor.geometry_accel,
            light_accel: descriptor.light_accel,
            particle_player: descriptor.particle_player,
            physics_scene: descriptor.physics_scene,
            geometry_notifier: descriptor.geometry_notifier,
            particle_notifier: descriptor.particle_notifier,
            prototype_notifier: descriptor.prototype_notifier,
            height_field_notifier: descriptor.height_field_notifier,
            camera: Camera::default(),
            occlusion_camera: Camera::default(),
            occlusion_camera_frozen: false,
            registered: FxHashSet::default(),
            pending_refresh: Arc::new(Mutex::new(Vec::new())),
            pending_prototypes: Arc::new(Mutex::new(Vec::new())),
            pending_shapes: Arc::new(Mutex::new(Vec::new())),
            touched: Vec::new(),
        }
    }

    /// The root container.
    #[must_use]
    pub fn root(&self) -> PrimitiveKey {
        self.root
    }

    /// Shared access to a primitive.
    #[must_use]
    pub fn primitive(&self, key: PrimitiveKey) -> Option<&Primitive> {
        self.graph.get(key)
    }

    /// Mutable payload access. Transforms go through the scene's mutators.
    pub fn primitive_mut(&mut self, key: PrimitiveKey) -> Option<&mut Primitive> {
        self.graph.get_mut(key)
    }

    /// Number of primitives including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Whether only the root exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.len() <= 1
    }

    /// The geometry/particle acceleration structure, shared with render
    /// passes.
    #[must_use]
    pub fn geometry_accel(&self) -> Option<Arc<dyn AccelerationStructure>> {
        self.geometry_accel.clone()
    }

    /// The light acceleration structure, shared with render passes.
    #[must_use]
    pub fn light_accel(&self) -> Option<Arc<dyn AccelerationStructure>> {
        self.light_accel.clone()
    }

    // ========================================================================
    // Cameras
    // ========================================================================

    /// The render camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable render camera.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The camera culling queries run against. Mirrors the render camera
    /// unless frozen for culling debugging.
    #[must_use]
    pub fn occlusion_camera(&self) -> &Camera {
        if self.occlusion_camera_frozen {
            &self.occlusion_camera
        } else {
            &self.camera
        }
    }

    /// Freezes (or releases) the occlusion camera at the current render
    /// camera.
    pub fn freeze_occlusion_camera(&mut self, frozen: bool) {
        if frozen && !self.occlusion_camera_frozen {
            self.occlusion_camera = self.camera.clone();
        }
        self.occlusion_camera_frozen = frozen;
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Adds a fresh primitive as a child of `parent`, registers its subtree
    /// with the scene's structures and refreshes derived transforms.
    pub fn add_child(&mut self, parent: PrimitiveKey, primitive: Primitive) -> Result<PrimitiveKey> {
        let mut touched = std::mem::take(&mut self.touched);
        touched.clear();

        let key = self.graph.add_child(parent, primitive, &mut touched)?;
        self.register_subtree(key);
        for touched_key in &touched {
            self.refresh_spatial(*touched_key);
        }

        self.touched = touched;
        Ok(key)
    }

    /// Adds several primitives as children of `parent`, in order.
    pub fn add_children(
        &mut self,
        parent: PrimitiveKey,
        primitives: Vec<Primitive>,
    ) -> Result<Vec<PrimitiveKey>> {
        let mut keys = Vec::with_capacity(primitives.len());
        for primitive in primitives {
            keys.push(self.add_child(parent, primitive)?);
        }
        Ok(keys)
    }

    /// Detaches a primitive (and its subtree) from its parent, unregistering
    /// it from the scene's structures. The subtree stays alive as a detached
    /// root and can be re-attached with [`Self::attach`].
    pub fn remove_child(&mut self, child: PrimitiveKey) {
        // Listeners see a still-attached primitive.
        self.unregister_subtree(child);

        let mut touched = std::mem::take(&mut self.touched);
        touched.clear();
        self.graph.detach(child, &mut touched);
        self.touched = touched;
    }

    /// Re-attaches a detached primitive under `parent` and registers its
    /// subtree.
    pub fn attach(&mut self, parent: PrimitiveKey, child: PrimitiveKey) -> Result<()> {
        let mut touched = std::mem::take(&mut self.touched);
        touched.clear();

        self.graph.attach(parent, child, &mut touched)?;
        self.register_subtree(child);
        for touched_key in &touched {
            self.refresh_spatial(*touched_key);
        }

        self.touched = touched;
        Ok(())
    }

    /// Destroys a primitive and its subtree.
    pub fn destroy(&mut self, key: PrimitiveKey) {
        self.unregister_subtree(key);

        let mut removed = Vec::new();
        self.graph.destroy(key, &mut removed);
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Sets a primitive's local transform and refreshes the subtree.
    pub fn set_local_transform(&mut self, key: PrimitiveKey, transform: Transform) {
        let mut touched = std::mem::take(&mut self.touched);
        touched.clear();

        self.graph.set_local_transform(key, transform, &mut touched);
        for touched_key in &touched {
            self.refresh_spatial(*touched_key);
        }

        self.touched = touched;
    }

    /// Sets a primitive's global transform and refreshes the subtree.
    pub fn set_global_transform(&mut self, key: PrimitiveKey, transform: Transform) {
        let mut touched = std::mem::take(&mut self.touched);
        touched.clear();

        self.graph.set_global_transform(key, transform, &mut touched);
        for touched_key in &touched {
            self.refresh_spatial(*touched_key);
        }

        self.touched = touched;
    }

    /// Replaces only the local translation.
    pub fn set_local_translation(&mut self, key: PrimitiveKey, translation: Vec3) {
        if let Some(primitive) = self.graph.get(key) {
            let mut transform = primitive.local_transform();
            transform.translation = translation;
            self.set_local_transform(key, transform);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Geometry and particle primitives intersecting a box.
    pub fn query_geometry_aabb(&self, bounds: &Aabb, output: &mut Vec<PrimitiveKey>) {
        if let Some(accel) = &self.geometry_accel {
            accel.query_aabb(bounds, output);
        }
    }

    /// Geometry and particle primitives intersecting a frustum.
    pub fn query_geometry_frustum(&self, frustum: &Frustum, output: &mut Vec<PrimitiveKey>) {
        if let Some(accel) = &self.geometry_accel {
            accel.query_frustum(frustum, output);
        }
    }

    /// Lights intersecting a box.
    pub fn query_lights_aabb(&self, bounds: &Aabb, output: &mut Vec<PrimitiveKey>) {
        if let Some(accel) = &self.light_accel {
            accel.query_aabb(bounds, output);
        }
    }

    /// Lights intersecting a frustum.
    pub fn query_lights_frustum(&self, frustum: &Frustum, output: &mut Vec<PrimitiveKey>) {
        if let Some(accel) = &self.light_accel {
            accel.query_frustum(frustum, output);
        }
    }

    // ========================================================================
    // Per-frame maintenance
    // ========================================================================

    /// Applies deferred notifier work and advances animations. Runs on the
    /// host thread between resource-manager `end` and the render passes.
    pub fn update(&mut self, elapsed_time: f32) {
        let refresh = std::mem::take(&mut *self.pending_refresh.lock());
        for key in refresh {
            self.refresh_spatial(key);
        }

        let shapes = std::mem::take(&mut *self.pending_shapes.lock());
        for key in shapes {
            self.build_height_field_shape(key);
        }

        let prototypes = std::mem::take(&mut *self.pending_prototypes.lock());
        for key in prototypes {
            self.instantiate_prototype(key);
        }

        self.update_animations(elapsed_time);
    }

    /// Advances every animated geometry primitive.
    pub fn update_animations(&mut self, elapsed_time: f32) {
        let mut animated = Vec::new();
        for (key, primitive) in self.graph.iter() {
            if let PrimitiveKind::Geometry(data) = primitive.kind()
                && data.animation.is_some()
            {
                animated.push(key);
            }
        }

        for key in animated {
            let Some(primitive) = self.graph.get_mut(key) else {
                continue;
            };
            let global = primitive.global_transform;
            if let PrimitiveKind::Geometry(data) = primitive.kind_mut() {
                data.update_animation(&global, elapsed_time);
            }
        }
    }

    /// Fires a motion-graph event on a motion-geometry primitive.
    pub fn emit_motion_event(&mut self, key: PrimitiveKey, name: &str) {
        if let Some(primitive) = self.graph.get_mut(key)
            && let PrimitiveKind::Geometry(data) = primitive.kind_mut()
            && let Some(motion_state) = data.motion_state_mut()
        {
            motion_state.emit_event(name);
        }
    }

    /// Mutable motion state of a motion-geometry primitive.
    pub fn motion_state_mut(&mut self, key: PrimitiveKey) -> Option<&mut MotionState> {
        match self.graph.get_mut(key)?.kind_mut() {
            PrimitiveKind::Geometry(data) => data.motion_state_mut(),
            _ => None,
        }
    }

    // ========================================================================
    // Prototype instantiation
    // ========================================================================

    /// Spawns a descriptor subtree under `parent`.
    pub fn spawn_descriptor(
        &mut self,
        parent: PrimitiveKey,
        descriptor: &PrimitiveDescriptor,
    ) -> Result<PrimitiveKey> {
        let local_transform = descriptor.local_transform;
        match &descriptor.payload {
            PayloadDescriptor::Container {
                prototype,
                children,
            } => {
                let key = self.add_child(
                    parent,
                    Primitive::new(
                        PrimitiveKind::Container(ContainerData {
                            prototype: prototype.clone(),
                        }),
                        local_transform,
                    ),
                )?;
                for child in children {
                    self.spawn_descriptor(key, child)?;
                }
                Ok(key)
            }
            PayloadDescriptor::Geometry {
                geometry,
                material,
                shadow_material,
            } => self.add_child(
                parent,
                Primitive::new(
                    PrimitiveKind::Geometry(GeometryData::new(
                        geometry.clone(),
                        material.clone(),
                        shadow_material.clone(),
                    )),
                    local_transform,
                ),
            ),
            PayloadDescriptor::AnimatedGeometry {
                geometry,
                material,
                shadow_material,
                animation,
            } => self.add_child(
                parent,
                Primitive::new(
                    PrimitiveKind::Geometry(GeometryData::animated(
                        geometry.clone(),
                        material.clone(),
                        shadow_material.clone(),
                        animation.clone(),
                    )),
                    local_transform,
                ),
            ),
            PayloadDescriptor::MotionGeometry {
                geometry,
                material,
                shadow_material,
                motion_graph,
            } => self.add_child(
                parent,
                Primitive::new(
                    PrimitiveKind::Geometry(GeometryData::motion(
                        geometry.clone(),
                        material.clone(),
                        shadow_material.clone(),
                        MotionState::new(motion_graph.clone()),
                    )),
                    local_transform,
                ),
            ),
            PayloadDescriptor::Light { color, radius } => self.add_child(
                parent,
                Primitive::new(
                    PrimitiveKind::Light(LightData::new(*color, *radius)),
                    local_transform,
                ),
            ),
            PayloadDescriptor::ParticleSystem { particle_system } => self.add_child(
                parent,
                Primitive::new(
                    PrimitiveKind::ParticleSystem(ParticleData {
                        effect: ParticleEffectState::new(particle_system.clone()),
                    }),
                    local_transform,
                ),
            ),
            PayloadDescriptor::BoxRigidActor {
                half_extent,
                is_kinematic,
            } => self.add_child(
                parent,
                Primitive::new(
                    PrimitiveKind::RigidActor(RigidActorData::new(*half_extent, *is_kinematic)),
                    local_transform,
                ),
            ),
            PayloadDescriptor::CapsuleController { radius, height } => self.add_child(
                parent,
                Primitive::new(
                    PrimitiveKind::Controller(ControllerData::new(*radius, *height)),
                    local_transform,
                ),
            ),
            PayloadDescriptor::HeightFieldRigidActor { height_field } => self.add_child(
                parent,
                Primitive::new(
                    PrimitiveKind::HeightFieldActor(HeightFieldActorData::new(
                        height_field.clone(),
                    )),
                    local_transform,
                ),
            ),
        }
    }

    fn instantiate_prototype(&mut self, container: PrimitiveKey) {
        let Some(primitive) = self.graph.get(container) else {
            return;
        };
        let PrimitiveKind::Container(data) = primitive.kind() else {
            return;
        };
        let Some(prototype) = data.prototype.clone() else {
            return;
        };

        // Re-instantiation replaces previous children.
        let children: Vec<PrimitiveKey> = primitive.children().to_vec();
        for child in children {
            self.destroy(child);
        }

        // Clone the descriptors out so the slot lock is not held while the
        // spawned children take their own subscriptions.
        let descriptors: Vec<PrimitiveDescriptor> = prototype.read().primitives().to_vec();
        for descriptor in &descriptors {
            if let Err(error) = self.spawn_descriptor(container, descriptor) {
                log::error!("failed to instantiate container prototype: {error}");
            }
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    fn listener_token(key: PrimitiveKey) -> ListenerToken {
        ListenerToken(key.data().as_ffi())
    }

    fn register_subtree(&mut self, key: PrimitiveKey) {
        let mut subtree = Vec::new();
        self.graph.collect_subtree(key, &mut subtree);

        for key in subtree {
            self.register_primitive(key);
        }
    }

    fn register_primitive(&mut self, key: PrimitiveKey) {
        let Some(primitive) = self.graph.get(key) else {
            return;
        };
        let global = primitive.global_transform;
        let token = Self::listener_token(key);

        match primitive.kind() {
            PrimitiveKind::Geometry(data) => {
                let geometry = data.geometry.clone();
                let bounds = data.compute_bounds(&global);

                if let Some(accel) = &self.geometry_accel {
                    accel.add(key, bounds);
                    self.registered.insert(key);
                }
                if let PrimitiveKind::Geometry(data) =
                    self.graph.get_mut(key).expect("primitive alive").kind_mut()
                {
                    data.bounds = bounds;
                }

                // Refit bounds once the mesh data arrives.
                if let (Some(notifier), Some(geometry)) = (&self.geometry_notifier, geometry) {
                    let queue = Arc::clone(&self.pending_refresh);
                    notifier.subscribe(&geometry, token, move |_| {
                        queue.lock().push(key);
                    });
                }
            }
            PrimitiveKind::Light(data) => {
                let bounds = data.compute_bounds(&global);

                if let Some(accel) = &self.light_accel {
                    accel.add(key, bounds);
                    self.registered.insert(key);
                }
                if let PrimitiveKind::Light(data) =
                    self.graph.get_mut(key).expect("primitive alive").kind_mut()
                {
                    data.bounds = bounds;
                }
            }
            PrimitiveKind::ParticleSystem(data) => {
                let effect = Arc::clone(&data.effect);
                let bounds = effect.set_global_transform(global);

                if let Some(accel) = &self.geometry_accel {
                    accel.add(key, bounds);
                    self.registered.insert(key);
                }
                if let Some(player) = &self.particle_player {
                    player.add(Arc::clone(&effect));
                }

                // Allocate streams and refit bounds once the system loads.
                if let (Some(notifier), Some(system)) =
                    (&self.particle_notifier, effect.particle_system())
                {
                    let queue = Arc::clone(&self.pending_refresh);
                    let subscribed_effect = Arc::clone(&effect);
                    notifier.subscribe(&system, token, move |_| {
                        subscribed_effect.on_system_loaded();
                        queue.lock().push(key);
                    });
                }
            }
            PrimitiveKind::Container(data) => {
                if let (Some(notifier), Some(prototype)) =
                    (&self.prototype_notifier, data.prototype.clone())
                {
                    let queue = Arc::clone(&self.pending_prototypes);
                    notifier.subscribe(&prototype, token, move |_| {
                        queue.lock().push(key);
                    });
                }
            }
            PrimitiveKind::RigidActor(_) | PrimitiveKind::Controller(_) => {
                if let Some(physics) = &self.physics_scene {
                    physics.add_actor(key);
                }
            }
            PrimitiveKind::HeightFieldActor(data) => {
                if let Some(physics) = &self.physics_scene {
                    physics.add_actor(key);
                }
                if let (Some(notifier), Some(height_field)) =
                    (&self.height_field_notifier, data.height_field.clone())
                {
                    let queue = Arc::clone(&self.pending_shapes);
                    notifier.subscribe(&height_field, token, move |_| {
                        queue.lock().push(key);
                    });
                }
            }
        }
    }

    fn unregister_subtree(&mut self, key: PrimitiveKey) {
        let mut subtree = Vec::new();
        self.graph.collect_subtree(key, &mut subtree);

        for key in subtree {
            self.unregister_primitive(key);
        }
    }

    fn unregister_primitive(&mut self, key: PrimitiveKey) {
        let Some(primitive) = self.graph.get(key) else {
            return;
        };
        let token = Self::listener_token(key);

        match primitive.kind() {
            PrimitiveKind::Geometry(data) => {
                if self.registered.remove(&key)
                    && let Some(accel) = &self.geometry_accel
                {
                    accel.remove(key);
                }
                if let (Some(notifier), Some(geometry)) = (&self.geometry_notifier, &data.geometry)
                {
                    notifier.unsubscribe(geometry, token);
                }
            }
            PrimitiveKind::Light(_) => {
                if self.registered.remove(&key)
                    && let Some(accel) = &self.light_accel
                {
                    accel.remove(key);
                }
            }
            PrimitiveKind::ParticleSystem(data) => {
                if self.registered.remove(&key)
                    && let Some(accel) = &self.geometry_accel
                {
                    accel.remove(key);
                }
                if let Some(player) = &self.particle_player {
                    player.remove(&data.effect);
                }
                if let (Some(notifier), Some(system)) =
                    (&self.particle_notifier, data.effect.particle_system())
                {
                    notifier.unsubscribe(&system, token);
                }
            }
            PrimitiveKind::Container(data) => {
                if let (Some(notifier), Some(prototype)) =
                    (&self.prototype_notifier, &data.prototype)
                {
                    notifier.unsubscribe(prototype, token);
                }
            }
            PrimitiveKind::RigidActor(_) | PrimitiveKind::Controller(_) => {
                if let Some(physics) = &self.physics_scene {
                    physics.remove_actor(key);
                }
            }
            PrimitiveKind::HeightFieldActor(data) => {
                if let Some(physics) = &self.physics_scene {
                    physics.remove_actor(key);
                }
                if let (Some(notifier), Some(height_field)) =
                    (&self.height_field_notifier, &data.height_field)
                {
                    notifier.unsubscribe(height_field, token);
                }
            }
        }
    }

    /// Recomputes the world bounds a spatial primitive derives from its
    /// global transform, telling the acceleration structure before the new
    /// bounds are stored.
    fn refresh_spatial(&mut self, key: PrimitiveKey) {
        let Some(primitive) = self.graph.get(key) else {
            return;
        };
        let global = primitive.global_transform;
        let is_registered = self.registered.contains(&key);

        match primitive.kind() {
            PrimitiveKind::Geometry(data) => {
                let bounds = data.compute_bounds(&global);
                if is_registered
                    && let Some(accel) = &self.geometry_accel
                {
                    accel.update(key, bounds);
                }
                if let PrimitiveKind::Geometry(data) =
                    self.graph.get_mut(key).expect("primitive alive").kind_mut()
                {
                    data.bounds = bounds;
                }
            }
            PrimitiveKind::Light(data) => {
                let bounds = data.compute_bounds(&global);
                if is_registered
                    && let Some(accel) = &self.light_accel
                {
                    accel.update(key, bounds);
                }
                if let PrimitiveKind::Light(data) =
                    self.graph.get_mut(key).expect("primitive alive").kind_mut()
                {
                    data.bounds = bounds;
                }
            }
            PrimitiveKind::ParticleSystem(data) => {
                let bounds = data.effect.set_global_transform(global);
                if is_registered
                    && let Some(accel) = &self.geometry_accel
                {
                    accel.update(key, bounds);
                }
            }
            _ => {}
        }
    }

    fn build_height_field_shape(&mut self, key: PrimitiveKey) {
        let Some(primitive) = self.graph.get_mut(key) else {
            return;
        };
        let scale = primitive.global_transform.scale;
        if let PrimitiveKind::HeightFieldActor(data) = primitive.kind_mut() {
            data.build_shape(scale, key);
        }
    }
}
