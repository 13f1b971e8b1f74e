use crate::renderer::{Mesh, Texture};
use std::fmt;
use std::marker::PhantomData;

/// Copyable, type-tagged index into the asset store.
#[derive(PartialEq, Eq, Hash)]
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

// Written out by hand: the derives would demand `T: Clone` / `T: Debug`,
// and GPU resources like `Texture` implement neither.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.index).finish()
    }
}

impl<T> Handle<T> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Shared meshes and textures, immutable once inserted. Entities refer to
/// entries by handle; the store outlives every reference.
#[derive(Default)]
pub struct Assets {
    meshes: Vec<Mesh>,
    textures: Vec<Texture>,
}

impl Assets {
    pub fn add_mesh(&mut self, mesh: Mesh) -> Handle<Mesh> {
        let handle = Handle::new(self.meshes.len());
        self.meshes.push(mesh);
        handle
    }

    pub fn mesh(&self, handle: Handle<Mesh>) -> &Mesh {
        &self.meshes[handle.index()]
    }

    pub fn add_texture(&mut self, texture: Texture) -> Handle<Texture> {
        let handle = Handle::new(self.textures.len());
        self.textures.push(texture);
        handle
    }

    pub fn texture(&self, handle: Handle<Texture>) -> &Texture {
        &self.textures[handle.index()]
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_copy() {
        let h1: Handle<String> = Handle::new(5);
        let h2 = h1;
        let h3 = h1;
        assert_eq!(h1.index(), h2.index());
        assert_eq!(h1.index(), h3.index());
    }

    #[test]
    fn handle_debug_does_not_need_a_debug_payload() {
        struct Opaque;
        let handle: Handle<Opaque> = Handle::new(3);
        assert_eq!(format!("{handle:?}"), "Handle(3)");
    }
}
