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

//! Capability traits for render resources held by the governor's caches.
//!
//! The governor never creates GPU objects itself. The scene code hands it
//! opaque handles that implement one of the resource traits below, and the
//! caches take ownership: they are the only place allowed to call
//! [`Disposable::dispose`] on a cached handle.

use std::fmt;

/// Bytes per texel assumed when estimating texture memory (RGBA8).
pub const BYTES_PER_TEXEL: usize = 4;

/// Flat estimate for a material's uniform block and bookkeeping.
pub const MATERIAL_ESTIMATE_BYTES: usize = 1024;

/// Minimum estimate for a compiled shader program.
pub const SHADER_MIN_ESTIMATE_BYTES: usize = 1024;

/// A resource that owns something which must be released explicitly.
///
/// Implementations must tolerate being disposed more than once.
pub trait Disposable: Send {
    /// Releases the underlying resource.
    fn dispose(&mut self);
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
    fn dispose(&mut self) {
        (**self).dispose();
    }
}

/// An image-like resource (texture, render target).
pub trait TextureResource: Disposable {
    /// Width and height in texels.
    fn dimensions(&self) -> (u32, u32);

    /// Estimated memory footprint in bytes.
    fn estimated_bytes(&self) -> usize {
        let (width, height) = self.dimensions();
        estimate_texture_bytes(width, height)
    }
}

/// A mesh-like resource made of vertex attribute buffers.
pub trait GeometryResource: Disposable {
    /// Byte length of each vertex attribute buffer.
    fn attribute_byte_lengths(&self) -> Vec<usize>;

    /// Byte length of the index buffer, if any.
    fn index_byte_length(&self) -> usize {
        0
    }

    /// Estimated memory footprint in bytes.
    fn estimated_bytes(&self) -> usize {
        estimate_geometry_bytes(&self.attribute_byte_lengths(), self.index_byte_length())
    }
}

/// A material (uniform parameters plus texture bindings).
pub trait MaterialResource: Disposable {
    /// Estimated memory footprint in bytes.
    fn estimated_bytes(&self) -> usize {
        MATERIAL_ESTIMATE_BYTES
    }
}

/// A compiled shader program.
pub trait ShaderResource: Disposable {
    /// Length of the shader source in bytes.
    fn source_len(&self) -> usize;

    /// Estimated memory footprint in bytes.
    fn estimated_bytes(&self) -> usize {
        self.source_len().max(SHADER_MIN_ESTIMATE_BYTES)
    }
}

/// Estimates the size of an RGBA8 image of the given dimensions.
pub fn estimate_texture_bytes(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(BYTES_PER_TEXEL)
}

/// Estimates the size of a mesh from its attribute and index buffer lengths.
pub fn estimate_geometry_bytes(attribute_byte_lengths: &[usize], index_byte_length: usize) -> usize {
    attribute_byte_lengths
        .iter()
        .fold(index_byte_length, |acc, len| acc.saturating_add(*len))
}

/// A resource produced by a preload task.
///
/// Typed variants are routed to the matching cache; `Untracked` is for loaders
/// whose work is a side effect (warming a decoder, compiling a pipeline the
/// renderer keeps itself).
pub enum PreloadedAsset {
    /// An image-like resource.
    Texture(Box<dyn TextureResource>),
    /// A mesh-like resource.
    Geometry(Box<dyn GeometryResource>),
    /// A material.
    Material(Box<dyn MaterialResource>),
    /// A shader program.
    Shader(Box<dyn ShaderResource>),
    /// Nothing to cache.
    Untracked,
}

impl PreloadedAsset {
    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PreloadedAsset::Texture(_) => "texture",
            PreloadedAsset::Geometry(_) => "geometry",
            PreloadedAsset::Material(_) => "material",
            PreloadedAsset::Shader(_) => "shader",
            PreloadedAsset::Untracked => "untracked",
        }
    }

    /// Estimated footprint of the wrapped resource (0 for `Untracked`).
    pub fn estimated_bytes(&self) -> usize {
        match self {
            PreloadedAsset::Texture(t) => t.estimated_bytes(),
            PreloadedAsset::Geometry(g) => g.estimated_bytes(),
            PreloadedAsset::Material(m) => m.estimated_bytes(),
            PreloadedAsset::Shader(s) => s.estimated_bytes(),
            PreloadedAsset::Untracked => 0,
        }
    }
}

impl fmt::Debug for PreloadedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadedAsset")
            .field("kind", &self.kind())
            .field("estimated_bytes", &self.estimated_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Mesh {
        attributes: Vec<usize>,
        disposed: Arc<AtomicUsize>,
    }

    impl Disposable for Mesh {
        fn dispose(&mut self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl GeometryResource for Mesh {
        fn attribute_byte_lengths(&self) -> Vec<usize> {
            self.attributes.clone()
        }
        fn index_byte_length(&self) -> usize {
            600
        }
    }

    struct Program(usize);

    impl Disposable for Program {
        fn dispose(&mut self) {}
    }

    impl ShaderResource for Program {
        fn source_len(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_texture_estimate_is_rgba8() {
        assert_eq!(estimate_texture_bytes(512, 256), 512 * 256 * 4);
        assert_eq!(estimate_texture_bytes(0, 1024), 0);
    }

    #[test]
    fn test_geometry_estimate_sums_buffers() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mesh = Mesh {
            attributes: vec![1200, 1200, 800],
            disposed: disposed.clone(),
        };
        assert_eq!(mesh.estimated_bytes(), 3800);
    }

    #[test]
    fn test_shader_estimate_has_a_floor() {
        assert_eq!(Program(10).estimated_bytes(), SHADER_MIN_ESTIMATE_BYTES);
        assert_eq!(Program(4096).estimated_bytes(), 4096);
    }

    #[test]
    fn test_boxed_resource_forwards_dispose() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut boxed: Box<dyn GeometryResource> = Box::new(Mesh {
            attributes: vec![],
            disposed: disposed.clone(),
        });
        boxed.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preloaded_asset_kind() {
        let asset = PreloadedAsset::Shader(Box::new(Program(2048)));
        assert_eq!(asset.kind(), "shader");
        assert_eq!(asset.estimated_bytes(), 2048);
        assert_eq!(PreloadedAsset::Untracked.estimated_bytes(), 0);
    }
}
