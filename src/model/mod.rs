// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build model: everything evaluation learned about the project.
//!
//! ```text
//! BuildModel
//!   targets[] + name index (case-insensitive fallback on Windows)
//!   cache { value, type, docstring, forced }
//!   environment shadow map (unset = tombstone)
//!   install rules  { Target | File | Program | Directory }
//!   output custom commands, test registry, CPack metadata
//!   project metadata, platform flags, default configuration
//!   genex warning cache
//! ```
//!
//! The model doubles as the `TargetSource` the generator-expression
//! evaluator reads target properties and artifact paths from.

pub mod cpack;
mod graph;
pub mod target;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ModelError;
use crate::genex::TargetSource;

pub use cpack::{CpackComponent, CpackComponentGroup, CpackInstallType, CpackMetadata};
pub use target::{
    BuildTarget, CommandStage, ConditionalEntry, CustomCommand, CustomCommandFlags, TargetKind,
    Visibility,
};

/// One cache variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// Cached value.
    pub value: String,
    /// Entry type (`BOOL`, `STRING`, `PATH`, `FILEPATH`, `INTERNAL`).
    pub entry_type: String,
    /// Help string.
    pub docstring: String,
    /// Written with `FORCE`.
    pub forced: bool,
}

/// Kind of an `install()` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallKind {
    /// `install(TARGETS ...)`.
    Target,
    /// `install(FILES ...)`.
    File,
    /// `install(PROGRAMS ...)`.
    Program,
    /// `install(DIRECTORY ...)`.
    Directory,
}

impl InstallKind {
    /// Keyword spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Target => "TARGETS",
            Self::File => "FILES",
            Self::Program => "PROGRAMS",
            Self::Directory => "DIRECTORY",
        }
    }
}

/// One `install()` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRule {
    /// What is installed.
    pub kind: InstallKind,
    /// Targets/files/directories being installed.
    pub items: Vec<String>,
    /// `DESTINATION`.
    pub destination: String,
    /// `COMPONENT`.
    pub component: Option<String>,
    /// `OPTIONAL` flag.
    pub optional: bool,
    /// `RENAME` (single-file rules).
    pub rename: Option<String>,
    /// `PERMISSIONS` keywords.
    pub permissions: Vec<String>,
}

/// One registered test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    /// Unique test name.
    pub name: String,
    /// Command argv.
    pub command: Vec<String>,
    /// `WORKING_DIRECTORY`.
    pub working_directory: Option<String>,
    /// `set_tests_properties` bag.
    pub properties: BTreeMap<String, String>,
}

/// `project()` metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    /// Project name.
    pub name: String,
    /// `VERSION`.
    pub version: String,
    /// `DESCRIPTION`.
    pub description: String,
    /// `LANGUAGES`.
    pub languages: Vec<String>,
}

/// Host platform flags the evaluator and codegen consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformFlags {
    /// Windows host.
    pub is_windows: bool,
    /// Unix-ish host.
    pub is_unix: bool,
    /// macOS host.
    pub is_apple: bool,
    /// Linux host.
    pub is_linux: bool,
}

impl Default for PlatformFlags {
    fn default() -> Self {
        Self {
            is_windows: cfg!(windows),
            is_unix: cfg!(unix),
            is_apple: cfg!(target_os = "macos"),
            is_linux: cfg!(target_os = "linux"),
        }
    }
}

impl PlatformFlags {
    /// `$<PLATFORM_ID>` spelling.
    #[must_use]
    pub const fn platform_id(self) -> &'static str {
        if self.is_windows {
            "Windows"
        } else if self.is_apple {
            "Darwin"
        } else if self.is_linux {
            "Linux"
        } else if self.is_unix {
            "UNIX"
        } else {
            "Generic"
        }
    }
}

/// In-memory description of the whole build.
#[derive(Debug, Clone, Default)]
pub struct BuildModel {
    /// All declared targets.
    pub targets: Vec<BuildTarget>,
    name_index: BTreeMap<String, usize>,

    /// Cache variables.
    pub cache: BTreeMap<String, CacheEntry>,
    /// Shadow environment; `None` marks an explicit unset.
    environment: BTreeMap<String, Option<String>>,

    /// Install rules in declaration order.
    pub install_rules: Vec<InstallRule>,
    /// OUTPUT-form custom commands.
    pub output_commands: Vec<CustomCommand>,
    /// Registered tests.
    pub tests: Vec<TestCase>,
    /// `enable_testing()` seen.
    pub testing_enabled: bool,
    /// CPack metadata.
    pub cpack: CpackMetadata,
    /// CPack pseudo-modules initialized via `include()` (slugs such as
    /// `deb`, `rpm`, `archive`), in initialization order.
    pub cpack_modules: Vec<String>,
    /// `project()` metadata.
    pub project: ProjectMetadata,
    /// Host platform flags.
    pub platform: PlatformFlags,
    /// Configuration used when `CMAKE_BUILD_TYPE` is unset.
    pub default_configuration: String,
    /// Binary directory artifact paths are rooted at.
    pub build_dir: String,
    /// Deduplicates generator-expression warnings.
    pub genex_warn_cache: BTreeSet<String>,
}

impl BuildModel {
    /// Fresh model with host platform flags and a `build/` binary dir.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_configuration: "Release".to_string(),
            build_dir: "build".to_string(),
            ..Self::default()
        }
    }

    // --- targets ---

    /// Declares a target, returning its index.
    ///
    /// Redeclaring an existing name with the same kind returns the
    /// existing index; an incompatible kind is a conflict.
    ///
    /// # Errors
    ///
    /// [`ModelError::TargetConflict`] on name + incompatible kind.
    pub fn add_target(&mut self, name: &str, kind: TargetKind) -> Result<usize, ModelError> {
        if let Some(&idx) = self.name_index.get(name) {
            let existing = &self.targets[idx];
            if existing.kind.compatible_with(kind) && existing.alias_of.is_none() {
                return Ok(idx);
            }
            return Err(ModelError::TargetConflict {
                name: name.to_string(),
            });
        }
        let idx = self.targets.len();
        self.targets.push(BuildTarget::new(name, kind));
        self.name_index.insert(name.to_string(), idx);
        Ok(idx)
    }

    /// Declares an ALIAS target pointing at `referent`.
    ///
    /// # Errors
    ///
    /// [`ModelError::TargetConflict`] when the alias name is taken,
    /// [`ModelError::UnknownTarget`] when the referent does not exist.
    pub fn add_alias(&mut self, name: &str, referent: &str) -> Result<usize, ModelError> {
        if self.name_index.contains_key(name) {
            return Err(ModelError::TargetConflict {
                name: name.to_string(),
            });
        }
        if self.find_target_index(referent).is_none() {
            return Err(ModelError::UnknownTarget {
                referrer: name.to_string(),
                name: referent.to_string(),
            });
        }
        let idx = self.targets.len();
        let mut alias = BuildTarget::new(name, TargetKind::Alias);
        alias.alias_of = Some(referent.to_string());
        self.targets.push(alias);
        self.name_index.insert(name.to_string(), idx);
        Ok(idx)
    }

    /// O(1) name lookup, with a case-insensitive scan fallback on Windows.
    #[must_use]
    pub fn find_target_index(&self, name: &str) -> Option<usize> {
        if let Some(&idx) = self.name_index.get(name) {
            return Some(idx);
        }
        if self.platform.is_windows {
            // Target-name resolution is case-insensitive on Windows.
            return self
                .targets
                .iter()
                .position(|t| t.name.eq_ignore_ascii_case(name));
        }
        None
    }

    /// Shared target lookup by name.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&BuildTarget> {
        self.find_target_index(name).map(|idx| &self.targets[idx])
    }

    /// Mutable target lookup by name.
    pub fn target_mut(&mut self, name: &str) -> Option<&mut BuildTarget> {
        self.find_target_index(name)
            .map(|idx| &mut self.targets[idx])
    }

    /// Follows an alias chain to the concrete target index.
    #[must_use]
    pub fn resolve_alias_index(&self, name: &str) -> Option<usize> {
        let mut idx = self.find_target_index(name)?;
        // Bounded walk: alias chains cannot be longer than the target list.
        for _ in 0..self.targets.len() {
            match &self.targets[idx].alias_of {
                Some(referent) => idx = self.find_target_index(referent)?,
                None => return Some(idx),
            }
        }
        None
    }

    /// Follows an alias chain to the concrete target.
    #[must_use]
    pub fn resolve_alias(&self, name: &str) -> Option<&BuildTarget> {
        self.resolve_alias_index(name).map(|idx| &self.targets[idx])
    }

    // --- cache ---

    /// Writes a cache entry. Without `force`, an existing entry keeps its
    /// value (only the docstring/type are filled in when empty).
    pub fn set_cache_entry(
        &mut self,
        name: &str,
        value: &str,
        entry_type: &str,
        docstring: &str,
        force: bool,
    ) -> bool {
        if let Some(existing) = self.cache.get_mut(name) {
            if !force {
                if existing.entry_type.is_empty() {
                    existing.entry_type = entry_type.to_string();
                }
                if existing.docstring.is_empty() {
                    existing.docstring = docstring.to_string();
                }
                return false;
            }
            existing.value = value.to_string();
            existing.entry_type = entry_type.to_string();
            existing.docstring = docstring.to_string();
            existing.forced = true;
            return true;
        }
        self.cache.insert(
            name.to_string(),
            CacheEntry {
                value: value.to_string(),
                entry_type: entry_type.to_string(),
                docstring: docstring.to_string(),
                forced: force,
            },
        );
        true
    }

    /// Cache value lookup.
    #[must_use]
    pub fn cache_value(&self, name: &str) -> Option<&str> {
        self.cache.get(name).map(|entry| entry.value.as_str())
    }

    /// Cache existence check.
    #[must_use]
    pub fn has_cache_entry(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Removes a cache entry.
    pub fn unset_cache_entry(&mut self, name: &str) {
        self.cache.remove(name);
    }

    // --- environment ---

    /// Environment read: shadow map first, then the real process
    /// environment. An explicit unset shadows a real variable.
    #[must_use]
    pub fn env_value(&self, name: &str) -> Option<String> {
        match self.environment.get(name) {
            Some(Some(value)) => Some(value.clone()),
            Some(None) => None,
            None => std::env::var(name).ok(),
        }
    }

    /// Environment write; never leaks to the real environment.
    pub fn set_env(&mut self, name: &str, value: &str) {
        self.environment
            .insert(name.to_string(), Some(value.to_string()));
    }

    /// Environment unset; tombstones shadow the real environment.
    pub fn unset_env(&mut self, name: &str) {
        self.environment.insert(name.to_string(), None);
    }

    /// Environment existence check.
    #[must_use]
    pub fn has_env(&self, name: &str) -> bool {
        self.env_value(name).is_some()
    }

    // --- artifacts ---

    /// Configuration in effect (cache `CMAKE_BUILD_TYPE` or default).
    #[must_use]
    pub fn active_configuration(&self) -> &str {
        self.cache_value("CMAKE_BUILD_TYPE")
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_configuration)
    }

    /// File name of the target's primary artifact, honoring
    /// `OUTPUT_NAME`/`PREFIX`/`SUFFIX` overrides. `None` for kinds that
    /// produce no artifact.
    #[must_use]
    pub fn artifact_file_name(&self, target: &BuildTarget) -> Option<String> {
        let output = target
            .properties
            .get("OUTPUT_NAME")
            .cloned()
            .unwrap_or_else(|| target.name.clone());

        let (default_prefix, default_suffix) = match target.kind {
            TargetKind::Executable => ("", if self.platform.is_windows { ".exe" } else { "" }),
            TargetKind::StaticLib => {
                if self.platform.is_windows {
                    ("", ".lib")
                } else {
                    ("lib", ".a")
                }
            }
            TargetKind::SharedLib | TargetKind::ModuleLib => {
                if self.platform.is_windows {
                    ("", ".dll")
                } else if self.platform.is_apple {
                    ("lib", ".dylib")
                } else {
                    ("lib", ".so")
                }
            }
            _ => return None,
        };

        let prefix = target
            .properties
            .get("PREFIX")
            .map_or(default_prefix, String::as_str);
        let suffix = target
            .properties
            .get("SUFFIX")
            .map_or(default_suffix, String::as_str);
        Some(format!("{prefix}{output}{suffix}"))
    }

    /// Build-dir-relative path of the target's primary artifact.
    #[must_use]
    pub fn artifact_path(&self, target: &BuildTarget) -> Option<String> {
        self.artifact_file_name(target)
            .map(|file| format!("{}/{file}", self.build_dir))
    }

    /// Path the linker consumes: the import library for Windows shared
    /// libraries, the artifact itself otherwise.
    #[must_use]
    pub fn linker_artifact_path(&self, target: &BuildTarget) -> Option<String> {
        if self.platform.is_windows
            && matches!(target.kind, TargetKind::SharedLib | TargetKind::ModuleLib)
        {
            let output = target
                .properties
                .get("OUTPUT_NAME")
                .cloned()
                .unwrap_or_else(|| target.name.clone());
            return Some(format!("{}/{output}.lib", self.build_dir));
        }
        self.artifact_path(target)
    }

    /// Transitive closure of link libraries for a target: interface libs
    /// and link libs of every reachable target, external entries kept,
    /// deduplicated in first-seen order.
    #[must_use]
    pub fn transitive_link_libraries(&self, name: &str) -> Vec<String> {
        let mut seen_targets = BTreeSet::new();
        let mut seen_libs = BTreeSet::new();
        let mut libs = Vec::new();
        self.collect_libs(name, &mut seen_targets, &mut seen_libs, &mut libs);
        libs
    }

    fn collect_libs(
        &self,
        name: &str,
        seen_targets: &mut BTreeSet<usize>,
        seen_libs: &mut BTreeSet<String>,
        libs: &mut Vec<String>,
    ) {
        let Some(idx) = self.resolve_alias_index(name) else {
            // External library.
            if seen_libs.insert(name.to_string()) {
                libs.push(name.to_string());
            }
            return;
        };
        if !seen_targets.insert(idx) {
            return;
        }
        let target = &self.targets[idx];
        for item in target.link_libraries.iter().chain(&target.interface_libs) {
            if item.is_empty() {
                continue;
            }
            self.collect_libs(item, seen_targets, seen_libs, libs);
        }
        for dep in target
            .dependencies
            .iter()
            .chain(&target.interface_dependencies)
            .chain(&target.object_dependencies)
        {
            if self.find_target_index(dep).is_some() {
                self.collect_libs(dep, seen_targets, seen_libs, libs);
            }
        }
    }
}

impl BuildModel {
    /// Links every target to the OUTPUT custom commands producing files
    /// the target consumes as sources. Called before codegen reads the
    /// model.
    pub fn link_output_commands(&mut self) {
        let outputs: Vec<(usize, Vec<String>)> = self
            .output_commands
            .iter()
            .enumerate()
            .map(|(idx, command)| (idx, command.outputs.clone()))
            .collect();
        for target in &mut self.targets {
            target.consumed_outputs.clear();
            for source in &target.sources {
                for (idx, command_outputs) in &outputs {
                    if command_outputs.iter().any(|output| output == source)
                        && !target.consumed_outputs.contains(idx)
                    {
                        target.consumed_outputs.push(*idx);
                    }
                }
            }
        }
    }
}

impl TargetSource for BuildModel {
    fn read_target_property(&self, target: &str, property: &str) -> Option<String> {
        self.resolve_alias(target)
            .and_then(|t| t.get_property_computed(property, self.active_configuration()))
    }

    fn read_target_file(&self, target: &str) -> Option<String> {
        self.resolve_alias(target)
            .and_then(|t| self.artifact_path(t))
    }

    fn read_target_linker_file(&self, target: &str) -> Option<String> {
        self.resolve_alias(target)
            .and_then(|t| self.linker_artifact_path(t))
    }
}
