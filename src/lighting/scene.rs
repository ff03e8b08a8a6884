//! Collaborator interfaces consumed by the executors
//!
//! The engine never owns lights or map data. Each `compute_lightmap` call
//! borrows a `LightingScene`: a read-only snapshot of the light registry plus
//! the tile sampler and occluder index.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::light_source::{ActorId, LightSource};
use super::tile::TilePos;

/// Tile grouping with a shared sky exposure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Visible-sky fraction in [0, 1]
    pub sky_exposure: f32,
}

impl Region {
    pub fn new(sky_exposure: f32) -> Self {
        Self {
            sky_exposure: sky_exposure.clamp(0.0, 1.0),
        }
    }

    pub fn outdoors() -> Self {
        Self::new(1.0)
    }

    pub fn indoors() -> Self {
        Self::new(0.0)
    }
}

/// Map queries needed to light a tile
pub trait TileSampler {
    /// Region containing `pos`, if any
    fn region_at(&self, pos: TilePos) -> Option<Region>;

    /// Whether light passes through `pos`
    fn is_transparent(&self, pos: TilePos) -> bool;

    /// Whether `pos` casts a shadow
    fn is_shadow_caster(&self, pos: TilePos) -> bool;

    /// Map dimensions in tiles; tiles live in `[0, width) x [0, height)`
    fn dimensions(&self) -> (u32, u32);

    /// Counter bumped on every map-geometry change
    fn structural_revision(&self) -> u64;

    /// Sky exposure at `pos`, zero outside any region
    fn sky_exposure(&self, pos: TilePos) -> f32 {
        self.region_at(pos).map(|r| r.sky_exposure).unwrap_or(0.0)
    }
}

/// An actor that may block light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occluder {
    pub id: ActorId,
    pub position: TilePos,
    pub blocks_light: bool,
}

/// Spatial query over actors
pub trait ActorIndex {
    /// Actors within `radius` tiles of `center`
    fn actors_in_radius(&self, center: TilePos, radius: f32) -> Vec<Occluder>;
}

/// Read-only snapshot handed to one `compute_lightmap` call
#[derive(Clone, Copy)]
pub struct LightingScene<'a> {
    pub lights: &'a [LightSource],
    pub tiles: &'a dyn TileSampler,
    pub actors: &'a dyn ActorIndex,
    /// Actor whose lights get the higher daylight floor
    pub player: Option<ActorId>,
}

impl<'a> LightingScene<'a> {
    pub fn new(
        lights: &'a [LightSource],
        tiles: &'a dyn TileSampler,
        actors: &'a dyn ActorIndex,
    ) -> Self {
        Self {
            lights,
            tiles,
            actors,
            player: None,
        }
    }

    pub fn with_player(mut self, player: ActorId) -> Self {
        self.player = Some(player);
        self
    }

    pub fn static_lights(&self) -> impl Iterator<Item = &'a LightSource> {
        let lights: &'a [LightSource] = self.lights;
        lights.iter().filter(|l| l.is_static())
    }

    pub fn dynamic_lights(&self) -> impl Iterator<Item = &'a LightSource> {
        let lights: &'a [LightSource] = self.lights;
        lights.iter().filter(|l| l.is_dynamic())
    }

    pub fn directional_lights(&self) -> impl Iterator<Item = &'a LightSource> {
        let lights: &'a [LightSource] = self.lights;
        lights.iter().filter(|l| l.is_directional())
    }

    pub fn point_lights(&self) -> impl Iterator<Item = &'a LightSource> {
        let lights: &'a [LightSource] = self.lights;
        lights.iter().filter(|l| l.point().is_some())
    }

    /// Combined sun strength used for daylight attenuation, capped at 1
    pub fn sun_intensity(&self) -> f32 {
        self.directional_lights()
            .filter_map(|l| l.directional())
            .map(|(_, intensity)| intensity)
            .sum::<f32>()
            .min(1.0)
    }

    /// Sum of `color * intensity` over all directional lights
    pub fn sun_color(&self) -> Vec3 {
        self.directional_lights()
            .filter_map(|l| l.directional().map(|(_, intensity)| l.color * intensity))
            .fold(Vec3::ZERO, |acc, c| acc + c)
    }

    /// Whether `light` belongs to the player actor
    pub fn is_player_light(&self, light: &LightSource) -> bool {
        match (light.owner(), self.player) {
            (Some(owner), Some(player)) => owner == player,
            _ => false,
        }
    }
}

/// Simple grid-backed map for demos, benches and tests
#[derive(Debug, Clone)]
pub struct GridMap {
    width: u32,
    height: u32,
    regions: Vec<Region>,
    /// Region index per tile
    region_ids: Vec<Option<u16>>,
    transparent: Vec<bool>,
    shadow_caster: Vec<bool>,
    actors: Vec<Occluder>,
    structural_revision: u64,
}

impl GridMap {
    /// Open map, every tile transparent and outside any region
    pub fn new(width: u32, height: u32) -> Self {
        let tiles = width as usize * height as usize;
        Self {
            width,
            height,
            regions: Vec::new(),
            region_ids: vec![None; tiles],
            transparent: vec![true; tiles],
            shadow_caster: vec![false; tiles],
            actors: Vec::new(),
            structural_revision: 0,
        }
    }

    /// Open map where every tile belongs to one region of `sky_exposure`
    pub fn with_uniform_exposure(width: u32, height: u32, sky_exposure: f32) -> Self {
        let mut map = Self::new(width, height);
        let region = map.add_region(Region::new(sky_exposure));
        map.fill_region(0, 0, width, height, region);
        map
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width as i32 || pos.y >= self.height as i32 {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// Register a region and return its index
    pub fn add_region(&mut self, region: Region) -> u16 {
        self.regions.push(region);
        (self.regions.len() - 1) as u16
    }

    /// Change the exposure of an existing region
    pub fn set_region_exposure(&mut self, region: u16, sky_exposure: f32) {
        if let Some(r) = self.regions.get_mut(region as usize) {
            *r = Region::new(sky_exposure);
            self.structural_revision += 1;
        }
    }

    /// Assign a rectangle of tiles to `region`
    pub fn fill_region(&mut self, x: i32, y: i32, width: u32, height: u32, region: u16) {
        for ty in y..y + height as i32 {
            for tx in x..x + width as i32 {
                if let Some(i) = self.index(TilePos::new(tx, ty)) {
                    self.region_ids[i] = Some(region);
                }
            }
        }
        self.structural_revision += 1;
    }

    /// Make a tile an opaque, shadow-casting wall
    pub fn set_wall(&mut self, pos: TilePos) {
        self.set_tile(pos, false, true);
    }

    /// Set the transparency and shadow flags of a tile
    pub fn set_tile(&mut self, pos: TilePos, transparent: bool, shadow_caster: bool) {
        if let Some(i) = self.index(pos) {
            self.transparent[i] = transparent;
            self.shadow_caster[i] = shadow_caster;
            self.structural_revision += 1;
        }
    }

    pub fn add_actor(&mut self, occluder: Occluder) {
        self.actors.push(occluder);
    }

    pub fn move_actor(&mut self, id: ActorId, position: TilePos) {
        if let Some(actor) = self.actors.iter_mut().find(|a| a.id == id) {
            actor.position = position;
        }
    }

    pub fn remove_actor(&mut self, id: ActorId) {
        self.actors.retain(|a| a.id != id);
    }
}

impl TileSampler for GridMap {
    fn region_at(&self, pos: TilePos) -> Option<Region> {
        let region = self.region_ids[self.index(pos)?]?;
        self.regions.get(region as usize).copied()
    }

    fn is_transparent(&self, pos: TilePos) -> bool {
        self.index(pos).map(|i| self.transparent[i]).unwrap_or(false)
    }

    fn is_shadow_caster(&self, pos: TilePos) -> bool {
        self.index(pos).map(|i| self.shadow_caster[i]).unwrap_or(false)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn structural_revision(&self) -> u64 {
        self.structural_revision
    }
}

impl ActorIndex for GridMap {
    fn actors_in_radius(&self, center: TilePos, radius: f32) -> Vec<Occluder> {
        let radius_sq = (radius * radius) as i64;
        self.actors
            .iter()
            .filter(|a| a.position.distance_squared(center) <= radius_sq)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::light_source::LightId;
    use glam::Vec2;

    #[test]
    fn test_grid_map_sampling() {
        let mut map = GridMap::new(8, 8);
        let inside = map.add_region(Region::indoors());
        let outside = map.add_region(Region::outdoors());
        map.fill_region(0, 0, 4, 8, inside);
        map.fill_region(4, 0, 4, 8, outside);
        map.set_wall(TilePos::new(2, 2));

        assert_eq!(map.sky_exposure(TilePos::new(1, 1)), 0.0);
        assert_eq!(map.sky_exposure(TilePos::new(6, 1)), 1.0);
        assert_eq!(map.sky_exposure(TilePos::new(-1, 1)), 0.0);
        assert!(!map.is_transparent(TilePos::new(2, 2)));
        assert!(map.is_shadow_caster(TilePos::new(2, 2)));
        assert!(!map.is_transparent(TilePos::new(20, 2)));
        assert_eq!(map.structural_revision(), 3);

        map.set_region_exposure(outside, 0.5);
        assert_eq!(map.sky_exposure(TilePos::new(6, 1)), 0.5);
        assert_eq!(map.structural_revision(), 4);
    }

    #[test]
    fn test_actor_radius_query() {
        let mut map = GridMap::new(16, 16);
        map.add_actor(Occluder {
            id: ActorId(1),
            position: TilePos::new(5, 5),
            blocks_light: true,
        });
        map.add_actor(Occluder {
            id: ActorId(2),
            position: TilePos::new(12, 12),
            blocks_light: true,
        });

        let near = map.actors_in_radius(TilePos::new(4, 4), 3.0);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, ActorId(1));

        map.move_actor(ActorId(2), TilePos::new(6, 4));
        assert_eq!(map.actors_in_radius(TilePos::new(4, 4), 3.0).len(), 2);
        map.remove_actor(ActorId(1));
        assert_eq!(map.actors_in_radius(TilePos::new(4, 4), 3.0).len(), 1);
    }

    #[test]
    fn test_scene_sun_and_ownership() {
        let map = GridMap::new(4, 4);
        let lights = vec![
            LightSource::new_directional(LightId(1), Vec2::new(1.0, 0.0), 0.7, Vec3::ONE),
            LightSource::new_directional(LightId(2), Vec2::new(0.0, 1.0), 0.6, Vec3::X),
            LightSource::new_dynamic(
                LightId(3),
                TilePos::new(1, 1),
                3.0,
                Vec3::ONE,
                Default::default(),
                Some(ActorId(9)),
            ),
        ];
        let scene = LightingScene::new(&lights, &map, &map).with_player(ActorId(9));

        assert_eq!(scene.sun_intensity(), 1.0);
        assert!((scene.sun_color() - Vec3::new(1.3, 0.7, 0.7)).length() < 1e-6);
        assert!(scene.is_player_light(&lights[2]));
        assert!(!scene.is_player_light(&lights[0]));
    }
}
