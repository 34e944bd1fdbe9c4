/// Model catalog: the selectable models and how to find them by name
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, RotatorError};
use crate::geometry::{Mesh, Shape};
use crate::stl::{load_stl, StlError};

/// Where a model's triangles come from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    Builtin(Shape),
    Stl(PathBuf),
}

impl Geometry {
    /// Build or read the triangles. STL reads hit the filesystem.
    pub fn load(&self) -> Result<Mesh, StlError> {
        match self {
            Geometry::Builtin(shape) => Ok(shape.mesh()),
            Geometry::Stl(path) => load_stl(path),
        }
    }
}

/// One selectable model. Immutable once it leaves the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Lookup key
    pub name: String,
    /// Title shown to the user
    pub label: String,
    /// Category tag; the picker only offers models of the same kind
    pub kind: String,
    pub geometry: Geometry,
}

impl ModelDescriptor {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: impl Into<String>,
        geometry: Geometry,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: kind.into(),
            geometry,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    models: Vec<ModelDescriptor>,
}

/// Ordered list of models. The first entry is the default.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<Arc<ModelDescriptor>>,
}

impl ModelCatalog {
    pub fn new(models: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        Self {
            models: models.into_iter().map(Arc::new).collect(),
        }
    }

    /// Catalog of the shapes that ship with the crate
    pub fn builtin() -> Self {
        Self::new([
            ModelDescriptor::new("cube", "Cube", "primitive", Geometry::Builtin(Shape::Cube)),
            ModelDescriptor::new(
                "octahedron",
                "Octahedron",
                "primitive",
                Geometry::Builtin(Shape::Octahedron),
            ),
        ])
    }

    /// Read a TOML catalog made of `[[models]]` tables.
    ///
    /// Relative STL paths are taken relative to the catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&content).map_err(|source| RotatorError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let models = file.models.into_iter().map(|mut model| {
            if let Geometry::Stl(stl) = &model.geometry {
                if stl.is_relative() {
                    model.geometry = Geometry::Stl(base.join(stl));
                }
            }
            model
        });
        Ok(Self::new(models))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn models(&self) -> &[Arc<ModelDescriptor>] {
        &self.models
    }

    pub fn first(&self) -> Option<&Arc<ModelDescriptor>> {
        self.models.first()
    }

    pub fn find(&self, name: &str) -> Result<&Arc<ModelDescriptor>> {
        self.models
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| RotatorError::ModelNotFound(name.to_string()))
    }

    /// Look `name` up, falling back to the first model when it is missing.
    pub fn resolve_or_first(&self, name: &str) -> Result<Arc<ModelDescriptor>> {
        match self.find(name) {
            Ok(model) => Ok(Arc::clone(model)),
            Err(err) => {
                let fallback = self.first().ok_or(RotatorError::EmptyCatalog)?;
                warn!(%err, fallback = %fallback.name, "using default model");
                Ok(Arc::clone(fallback))
            }
        }
    }

    /// Models sharing the category tag `kind`, in catalog order
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Arc<ModelDescriptor>> {
        self.models.iter().filter(move |m| m.kind == kind)
    }
}
