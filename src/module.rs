use std::path::{Path, PathBuf};

/// Name given to sources that do not come from a file.
pub const ANONYMOUS: &str = "__anonymous__";

/// Identifies the compilation unit a source belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceModule {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl SourceModule {
    /// Names the module after the file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> SourceModule {
        let path = path.into();
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(ANONYMOUS)
            .to_owned();
        SourceModule {
            name,
            path: Some(path),
        }
    }

    pub fn anonymous() -> SourceModule {
        SourceModule {
            name: ANONYMOUS.to_owned(),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("module '{0}' not found")]
    NotFound(String),
}

/// Finds the module an import refers to.
pub trait ModuleResolver {
    fn resolve(&self, name: &str) -> Result<SourceModule, ResolveError>;
}

/// Resolves nothing; every lookup fails.
#[derive(Copy, Clone, Debug, Default)]
pub struct Unresolved;

impl ModuleResolver for Unresolved {
    fn resolve(&self, name: &str) -> Result<SourceModule, ResolveError> {
        Err(ResolveError::NotFound(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_come_from_the_file_stem() {
        let module = SourceModule::from_path("programs/hello.lore");
        assert_eq!(module.name, "hello");
        assert_eq!(module.path(), Some(Path::new("programs/hello.lore")));
        assert_eq!(SourceModule::anonymous().name, ANONYMOUS);
    }

    #[test]
    fn the_stub_resolver_finds_nothing() {
        assert_eq!(
            Unresolved.resolve("std").unwrap_err().to_string(),
            "module 'std' not found"
        );
    }
}
