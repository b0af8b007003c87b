// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The four typed resource caches and the disposer registry.

use super::lru::{CacheStats, LruCache};
use aurora_core::config::CacheConfig;
use aurora_core::resource::{
    Disposable, GeometryResource, MaterialResource, PreloadedAsset, ShaderResource,
    TextureResource,
};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Handle returned by [`ResourceCacheManager::track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisposerId(u64);

/// Per-cache statistics plus the totals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CacheManagerStats {
    /// Texture cache.
    pub textures: CacheStats,
    /// Geometry cache.
    pub geometries: CacheStats,
    /// Material cache.
    pub materials: CacheStats,
    /// Shader cache.
    pub shaders: CacheStats,
    /// Disposables registered outside the caches.
    pub tracked: usize,
    /// Sum of the caches' estimated bytes.
    pub total_memory_usage: usize,
}

/// Owns every cached render resource of the scene.
pub struct ResourceCacheManager {
    textures: LruCache<Box<dyn TextureResource>>,
    geometries: LruCache<Box<dyn GeometryResource>>,
    materials: LruCache<Box<dyn MaterialResource>>,
    shaders: LruCache<Box<dyn ShaderResource>>,
    tracked: HashMap<DisposerId, Box<dyn Disposable>>,
    next_disposer: u64,
    retain_fraction: f32,
}

impl ResourceCacheManager {
    /// Builds the caches from their configured limits and TTL.
    pub fn new(config: &CacheConfig) -> Self {
        let ttl = config.ttl();
        Self {
            textures: LruCache::with_ttl("texture", config.textures, ttl),
            geometries: LruCache::with_ttl("geometry", config.geometries, ttl),
            materials: LruCache::with_ttl("material", config.materials, ttl),
            shaders: LruCache::with_ttl("shader", config.shaders, ttl),
            tracked: HashMap::new(),
            next_disposer: 0,
            retain_fraction: config.aggressive_retain_fraction,
        }
    }

    // --- Textures ---

    /// Caches a texture under `key`.
    pub fn set_texture(&mut self, key: impl Into<String>, texture: Box<dyn TextureResource>) {
        self.set_texture_at(key, texture, Instant::now());
    }

    /// Caches a texture under `key` at `now`.
    pub fn set_texture_at(
        &mut self,
        key: impl Into<String>,
        texture: Box<dyn TextureResource>,
        now: Instant,
    ) {
        let bytes = texture.estimated_bytes();
        self.textures.set_at(key, texture, bytes, now);
    }

    /// Looks a texture up.
    pub fn texture(&mut self, key: &str) -> Option<&dyn TextureResource> {
        self.texture_at(key, Instant::now())
    }

    /// Looks a texture up at `now`.
    pub fn texture_at(&mut self, key: &str, now: Instant) -> Option<&dyn TextureResource> {
        self.textures.get_at(key, now).map(|t| &**t)
    }

    // --- Geometries ---

    /// Caches a geometry under `key`.
    pub fn set_geometry(&mut self, key: impl Into<String>, geometry: Box<dyn GeometryResource>) {
        self.set_geometry_at(key, geometry, Instant::now());
    }

    /// Caches a geometry under `key` at `now`.
    pub fn set_geometry_at(
        &mut self,
        key: impl Into<String>,
        geometry: Box<dyn GeometryResource>,
        now: Instant,
    ) {
        let bytes = geometry.estimated_bytes();
        self.geometries.set_at(key, geometry, bytes, now);
    }

    /// Looks a geometry up.
    pub fn geometry(&mut self, key: &str) -> Option<&dyn GeometryResource> {
        self.geometry_at(key, Instant::now())
    }

    /// Looks a geometry up at `now`.
    pub fn geometry_at(&mut self, key: &str, now: Instant) -> Option<&dyn GeometryResource> {
        self.geometries.get_at(key, now).map(|g| &**g)
    }

    // --- Materials ---

    /// Caches a material under `key`.
    pub fn set_material(&mut self, key: impl Into<String>, material: Box<dyn MaterialResource>) {
        self.set_material_at(key, material, Instant::now());
    }

    /// Caches a material under `key` at `now`.
    pub fn set_material_at(
        &mut self,
        key: impl Into<String>,
        material: Box<dyn MaterialResource>,
        now: Instant,
    ) {
        let bytes = material.estimated_bytes();
        self.materials.set_at(key, material, bytes, now);
    }

    /// Looks a material up.
    pub fn material(&mut self, key: &str) -> Option<&dyn MaterialResource> {
        self.material_at(key, Instant::now())
    }

    /// Looks a material up at `now`.
    pub fn material_at(&mut self, key: &str, now: Instant) -> Option<&dyn MaterialResource> {
        self.materials.get_at(key, now).map(|m| &**m)
    }

    // --- Shaders ---

    /// Caches a shader under `key`.
    pub fn set_shader(&mut self, key: impl Into<String>, shader: Box<dyn ShaderResource>) {
        self.set_shader_at(key, shader, Instant::now());
    }

    /// Caches a shader under `key` at `now`.
    pub fn set_shader_at(
        &mut self,
        key: impl Into<String>,
        shader: Box<dyn ShaderResource>,
        now: Instant,
    ) {
        let bytes = shader.estimated_bytes();
        self.shaders.set_at(key, shader, bytes, now);
    }

    /// Looks a shader up.
    pub fn shader(&mut self, key: &str) -> Option<&dyn ShaderResource> {
        self.shader_at(key, Instant::now())
    }

    /// Looks a shader up at `now`.
    pub fn shader_at(&mut self, key: &str, now: Instant) -> Option<&dyn ShaderResource> {
        self.shaders.get_at(key, now).map(|s| &**s)
    }

    /// Routes a preloaded asset to its cache.
    ///
    /// Returns `false` for [`PreloadedAsset::Untracked`], which has nothing to cache.
    pub fn insert_asset(&mut self, key: impl Into<String>, asset: PreloadedAsset) -> bool {
        let now = Instant::now();
        match asset {
            PreloadedAsset::Texture(t) => self.set_texture_at(key, t, now),
            PreloadedAsset::Geometry(g) => self.set_geometry_at(key, g, now),
            PreloadedAsset::Material(m) => self.set_material_at(key, m, now),
            PreloadedAsset::Shader(s) => self.set_shader_at(key, s, now),
            PreloadedAsset::Untracked => return false,
        }
        true
    }

    /// Evicts expired entries from every cache. Returns the eviction count.
    pub fn cleanup(&mut self, now: Instant) -> usize {
        let evicted = self.textures.evict_expired(now)
            + self.geometries.evict_expired(now)
            + self.materials.evict_expired(now)
            + self.shaders.evict_expired(now);
        if evicted > 0 {
            log::debug!(
                "ResourceCacheManager: periodic cleanup evicted {} entries, {} bytes left",
                evicted,
                self.memory_usage()
            );
        }
        evicted
    }

    /// Shrinks every cache to the configured retain fraction of its limits.
    pub fn aggressive_cleanup(&mut self) -> usize {
        let fraction = self.retain_fraction;
        let before = self.memory_usage();
        let evicted = self.textures.shrink_to(fraction)
            + self.geometries.shrink_to(fraction)
            + self.materials.shrink_to(fraction)
            + self.shaders.shrink_to(fraction);
        log::warn!(
            "ResourceCacheManager: aggressive cleanup evicted {} entries ({} -> {} bytes)",
            evicted,
            before,
            self.memory_usage()
        );
        evicted
    }

    /// Clears every cache and disposes every tracked disposable.
    pub fn clear(&mut self) {
        self.textures.clear();
        self.geometries.clear();
        self.materials.clear();
        self.shaders.clear();
        let tracked = self.tracked.len();
        for (_, mut disposable) in self.tracked.drain() {
            disposable.dispose();
        }
        log::debug!("ResourceCacheManager: cleared all caches and {} tracked disposables", tracked);
    }

    /// Registers a disposable that lives outside the caches.
    ///
    /// It is disposed by [`clear`](Self::clear) unless untracked first.
    pub fn track(&mut self, disposable: Box<dyn Disposable>) -> DisposerId {
        self.next_disposer += 1;
        let id = DisposerId(self.next_disposer);
        self.tracked.insert(id, disposable);
        id
    }

    /// Hands a tracked disposable back without disposing it.
    pub fn untrack(&mut self, id: DisposerId) -> Option<Box<dyn Disposable>> {
        self.tracked.remove(&id)
    }

    /// Number of tracked disposables.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Estimated bytes held across all caches.
    pub fn memory_usage(&self) -> usize {
        self.textures.memory_usage()
            + self.geometries.memory_usage()
            + self.materials.memory_usage()
            + self.shaders.memory_usage()
    }

    /// Statistics of every cache.
    pub fn stats(&self) -> CacheManagerStats {
        CacheManagerStats {
            textures: self.textures.stats(),
            geometries: self.geometries.stats(),
            materials: self.materials.stats(),
            shaders: self.shaders.stats(),
            tracked: self.tracked.len(),
            total_memory_usage: self.memory_usage(),
        }
    }

    /// The texture cache.
    pub fn textures(&self) -> &LruCache<Box<dyn TextureResource>> {
        &self.textures
    }

    /// The geometry cache.
    pub fn geometries(&self) -> &LruCache<Box<dyn GeometryResource>> {
        &self.geometries
    }

    /// The material cache.
    pub fn materials(&self) -> &LruCache<Box<dyn MaterialResource>> {
        &self.materials
    }

    /// The shader cache.
    pub fn shaders(&self) -> &LruCache<Box<dyn ShaderResource>> {
        &self.shaders
    }
}

impl Default for ResourceCacheManager {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl Drop for ResourceCacheManager {
    fn drop(&mut self) {
        for (_, mut disposable) in self.tracked.drain() {
            disposable.dispose();
        }
    }
}

impl fmt::Debug for ResourceCacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCacheManager")
            .field("textures", &self.textures)
            .field("geometries", &self.geometries)
            .field("materials", &self.materials)
            .field("shaders", &self.shaders)
            .field("tracked", &self.tracked.len())
            .finish()
    }
}
