//! Add-in library handle
//!
//! One loaded add-in library, shared by every component instance created
//! from it.

use std::path::Path;
use std::sync::Arc;

use addin_abi::{Library, NativeSurface, ProxyApi};

use crate::component::{Component, ComponentOptions, TypeDescriptor};
use crate::error::AddinResult;

/// A named add-in library
#[derive(Clone)]
pub struct AddinLibrary {
    name: String,
    surface: Arc<dyn NativeSurface>,
}

impl AddinLibrary {
    /// Load a shared library and resolve its entry points
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> AddinResult<Self> {
        let name = name.into();
        let library = Arc::new(Library::open(path.as_ref())?);
        let surface = ProxyApi::load(library)?;
        tracing::debug!(library = %name, path = %path.as_ref().display(), "add-in library loaded");
        Ok(Self {
            name,
            surface: Arc::new(surface),
        })
    }

    /// Wrap an already available surface (statically linked entry points,
    /// in-memory components)
    pub fn from_surface(name: impl Into<String>, surface: Arc<dyn NativeSurface>) -> Self {
        Self {
            name: name.into(),
            surface,
        }
    }

    /// Library name as registered with the host
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surface(&self) -> &Arc<dyn NativeSurface> {
        &self.surface
    }

    /// Create an instance of `component`, typed `AddIn.<library>.<component>`
    pub fn create_component(
        &self,
        component: &str,
        options: &ComponentOptions,
    ) -> AddinResult<Component> {
        Component::create(
            self.surface.clone(),
            TypeDescriptor::new(self.name.clone(), component),
            options,
        )
    }
}

impl std::fmt::Debug for AddinLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddinLibrary").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AddinError;
    use addin_abi::AbiError;

    #[test]
    fn test_open_missing_library() {
        match AddinLibrary::open("Missing", "/nonexistent/libmissing.so") {
            Err(AddinError::Abi(AbiError::LibraryNotFound { .. }))
            | Err(AddinError::Abi(AbiError::Platform(_))) => {}
            other => panic!("expected load failure, got {:?}", other),
        }
    }
}
