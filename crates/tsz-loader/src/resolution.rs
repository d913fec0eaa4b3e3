//! Module resolver contract and resolution caches.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use tsz_common::CompilerOptions;

use crate::host::ResolutionHost;
use crate::parsed_config::ParsedCommandLine;
use crate::source_file::ResolutionMode;

/// Inputs shared by every resolver call.
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Effective host. With project reference sources in use this is the
    /// DTS-faking host, not the disk host.
    pub host: &'a dyn ResolutionHost,
    pub options: &'a CompilerOptions,
    /// Config of the referenced project the containing file belongs to.
    pub redirect: Option<&'a ParsedCommandLine>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedModule {
    pub resolved_file_name: Option<String>,
    /// Found by searching `node_modules`.
    pub is_external_library_import: bool,
}

impl ResolvedModule {
    #[must_use]
    pub fn resolved(file_name: impl Into<String>, is_external_library_import: bool) -> Self {
        Self {
            resolved_file_name: Some(file_name.into()),
            is_external_library_import,
        }
    }

    #[must_use]
    pub const fn unresolved() -> Self {
        Self {
            resolved_file_name: None,
            is_external_library_import: false,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved_file_name.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedTypeReferenceDirective {
    pub resolved_file_name: Option<String>,
    /// Found in a type root rather than by a `node_modules` walk.
    pub primary: bool,
    pub is_external_library_import: bool,
}

impl ResolvedTypeReferenceDirective {
    #[must_use]
    pub fn resolved(file_name: impl Into<String>, primary: bool, is_external: bool) -> Self {
        Self {
            resolved_file_name: Some(file_name.into()),
            primary,
            is_external_library_import: is_external,
        }
    }

    #[must_use]
    pub const fn unresolved() -> Self {
        Self {
            resolved_file_name: None,
            primary: false,
            is_external_library_import: false,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved_file_name.is_some()
    }
}

/// The external module resolution algorithm.
pub trait ModuleResolver: Send + Sync {
    fn resolve_module_name(
        &self,
        module_name: &str,
        containing_file: &str,
        mode: ResolutionMode,
        ctx: ResolutionContext<'_>,
    ) -> ResolvedModule;

    fn resolve_type_reference_directive(
        &self,
        type_reference_directive_name: &str,
        containing_file: &str,
        mode: ResolutionMode,
        ctx: ResolutionContext<'_>,
    ) -> ResolvedTypeReferenceDirective;

    /// Names of the type packages included without an explicit reference.
    fn get_automatic_type_directive_names(&self, ctx: ResolutionContext<'_>) -> Vec<String>;

    /// `type` field of the `package.json` nearest to `file_name`.
    fn get_package_json_type(&self, file_name: &str, ctx: ResolutionContext<'_>) -> Option<String>;
}

/// Resolution results are keyed by name and mode: the same specifier may
/// resolve differently under `import` and `require`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModeAwareCacheKey {
    pub name: String,
    pub mode: ResolutionMode,
}

impl ModeAwareCacheKey {
    #[must_use]
    pub fn new(name: impl Into<String>, mode: ResolutionMode) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }
}

/// Insertion-ordered so reports list resolutions in source order.
pub type ModeAwareCache<T> = IndexMap<ModeAwareCacheKey, T, FxBuildHasher>;
