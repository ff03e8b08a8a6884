//! Revision coordination
//!
//! Integer generation counters decide when the static layer cache must be
//! dropped. Callers read `revision()` to learn whether lighting changed
//! without diffing any state.

use super::light_source::LightSource;

/// Validity of the static layer cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Valid,
    Invalidated,
}

/// Kind of structural mutation reported to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    LightAdded,
    LightRemoved,
    LightMoved,
    GlobalLightChanged,
}

/// Per-category mutation counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationCounts {
    pub lights_added: u64,
    pub lights_removed: u64,
    pub lights_moved: u64,
    pub global_changes: u64,
}

/// Tracks the lighting revision and the static cache state
#[derive(Debug, Clone)]
pub struct RevisionCoordinator {
    revision: u64,
    /// Bumped on every static cache invalidation
    static_generation: u64,
    static_cache: CacheState,
    counts: MutationCounts,
}

impl Default for RevisionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionCoordinator {
    pub fn new() -> Self {
        Self {
            revision: 0,
            static_generation: 0,
            static_cache: CacheState::Valid,
            counts: MutationCounts::default(),
        }
    }

    /// Monotonic counter of every structural mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn static_generation(&self) -> u64 {
        self.static_generation
    }

    pub fn static_cache_state(&self) -> CacheState {
        self.static_cache
    }

    pub fn counts(&self) -> MutationCounts {
        self.counts
    }

    pub fn on_light_added(&mut self, light: &LightSource) {
        self.record(Mutation::LightAdded, affects_static_layer(light));
    }

    pub fn on_light_removed(&mut self, light: &LightSource) {
        self.record(Mutation::LightRemoved, affects_static_layer(light));
    }

    /// A moved dynamic light leaves the static cache valid
    pub fn on_light_moved(&mut self, light: &LightSource) {
        self.record(Mutation::LightMoved, affects_static_layer(light));
    }

    /// Time of day, region exposure edits and similar global changes
    pub fn on_global_light_changed(&mut self) {
        self.record(Mutation::GlobalLightChanged, true);
    }

    /// Consume a pending invalidation; true if the cache must be cleared
    pub fn take_invalidation(&mut self) -> bool {
        match self.static_cache {
            CacheState::Valid => false,
            CacheState::Invalidated => {
                self.static_cache = CacheState::Valid;
                true
            }
        }
    }

    fn record(&mut self, mutation: Mutation, invalidates_static: bool) {
        self.revision += 1;
        match mutation {
            Mutation::LightAdded => self.counts.lights_added += 1,
            Mutation::LightRemoved => self.counts.lights_removed += 1,
            Mutation::LightMoved => self.counts.lights_moved += 1,
            Mutation::GlobalLightChanged => self.counts.global_changes += 1,
        }
        if invalidates_static {
            self.static_generation += 1;
            self.static_cache = CacheState::Invalidated;
        }
        log::trace!(
            "[RevisionCoordinator] {:?} -> revision {} (static generation {})",
            mutation,
            self.revision,
            self.static_generation
        );
    }
}

/// Whether a light contributes to the cached static layer
pub fn affects_static_layer(light: &LightSource) -> bool {
    light.is_static() || light.is_directional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::light_source::{Flicker, LightId};
    use crate::lighting::tile::TilePos;
    use glam::{Vec2, Vec3};

    fn torch() -> LightSource {
        LightSource::new_static(LightId(1), TilePos::new(1, 1), 3.0, Vec3::ONE)
    }

    fn lantern() -> LightSource {
        LightSource::new_dynamic(LightId(2), TilePos::new(1, 1), 3.0, Vec3::ONE, Flicker::none(), None)
    }

    #[test]
    fn test_static_light_invalidates() {
        let mut coordinator = RevisionCoordinator::new();
        coordinator.on_light_added(&torch());
        assert_eq!(coordinator.revision(), 1);
        assert_eq!(coordinator.static_cache_state(), CacheState::Invalidated);
        assert!(coordinator.take_invalidation());
        assert_eq!(coordinator.static_cache_state(), CacheState::Valid);
        assert!(!coordinator.take_invalidation());
    }

    #[test]
    fn test_moved_dynamic_light_keeps_cache_valid() {
        let mut coordinator = RevisionCoordinator::new();
        coordinator.on_light_moved(&lantern());
        assert_eq!(coordinator.revision(), 1);
        assert_eq!(coordinator.static_generation(), 0);
        assert_eq!(coordinator.static_cache_state(), CacheState::Valid);
    }

    #[test]
    fn test_directional_and_global_changes_invalidate() {
        let mut coordinator = RevisionCoordinator::new();
        let sun = LightSource::new_directional(LightId(3), Vec2::X, 1.0, Vec3::ONE);
        coordinator.on_light_moved(&sun);
        assert!(coordinator.take_invalidation());
        coordinator.on_global_light_changed();
        assert!(coordinator.take_invalidation());
        assert_eq!(coordinator.static_generation(), 2);
    }

    #[test]
    fn test_counts_per_mutation_type() {
        let mut coordinator = RevisionCoordinator::new();
        coordinator.on_light_added(&torch());
        coordinator.on_light_added(&lantern());
        coordinator.on_light_removed(&lantern());
        coordinator.on_light_moved(&lantern());
        coordinator.on_global_light_changed();

        let counts = coordinator.counts();
        assert_eq!(counts.lights_added, 2);
        assert_eq!(counts.lights_removed, 1);
        assert_eq!(counts.lights_moved, 1);
        assert_eq!(counts.global_changes, 1);
        assert_eq!(coordinator.revision(), 5);
        // Only the torch and the global change touched the static layer
        assert_eq!(coordinator.static_generation(), 2);
    }
}
