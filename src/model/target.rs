// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build target entity and its mutation operations.
//!
//! ```text
//! BuildTarget
//!   kind          Executable | StaticLib | SharedLib | ModuleLib
//!                 ObjectLib | InterfaceLib | Alias | Imported
//!                 Utility | Custom
//!   sources       ordered, deduplicated
//!   usage lists   definitions/options/includes/link_* per visibility
//!                 + conditional_* entries {condition, visibility, value}
//!   commands      PRE_BUILD / PRE_LINK / POST_BUILD
//!   properties    flat bag + well-known fields via set_property_smart
//! ```

use bitflags::bitflags;
use std::collections::BTreeMap;

/// Target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// `add_executable`.
    Executable,
    /// `add_library(... STATIC ...)`.
    StaticLib,
    /// `add_library(... SHARED ...)`.
    SharedLib,
    /// `add_library(... MODULE ...)`.
    ModuleLib,
    /// `add_library(... OBJECT ...)`.
    ObjectLib,
    /// `add_library(... INTERFACE)`.
    InterfaceLib,
    /// `add_library(... ALIAS real)` / `add_executable(... ALIAS real)`.
    Alias,
    /// `IMPORTED` target.
    Imported,
    /// `add_custom_target`.
    Utility,
    /// Internal synthetic target.
    Custom,
}

impl TargetKind {
    /// `get_target_property(... TYPE)` spelling.
    #[must_use]
    pub const fn type_string(self) -> &'static str {
        match self {
            Self::Executable => "EXECUTABLE",
            Self::StaticLib => "STATIC_LIBRARY",
            Self::SharedLib => "SHARED_LIBRARY",
            Self::ModuleLib => "MODULE_LIBRARY",
            Self::ObjectLib => "OBJECT_LIBRARY",
            Self::InterfaceLib => "INTERFACE_LIBRARY",
            Self::Alias => "ALIAS",
            Self::Imported => "IMPORTED",
            Self::Utility => "UTILITY",
            Self::Custom => "CUSTOM",
        }
    }

    /// True for the library kinds that produce a linkable artifact.
    #[must_use]
    pub const fn is_linkable_library(self) -> bool {
        matches!(
            self,
            Self::StaticLib | Self::SharedLib | Self::ModuleLib | Self::InterfaceLib
        )
    }

    /// Redeclaring a target with a compatible kind is accepted.
    #[must_use]
    pub fn compatible_with(self, other: Self) -> bool {
        self == other
    }
}

/// Usage-requirement visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Applies to the target itself only.
    #[default]
    Private,
    /// Applies to consumers only.
    Interface,
    /// Applies to both.
    Public,
}

impl Visibility {
    /// Parses a visibility keyword, case-sensitively like CMake.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "PRIVATE" => Some(Self::Private),
            "INTERFACE" => Some(Self::Interface),
            "PUBLIC" => Some(Self::Public),
            _ => None,
        }
    }

    /// Keyword spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::Interface => "INTERFACE",
            Self::Public => "PUBLIC",
        }
    }

    /// The entry applies to the target's own compile/link step.
    #[must_use]
    pub const fn applies_to_self(self) -> bool {
        matches!(self, Self::Private | Self::Public)
    }

    /// The entry propagates to consumers.
    #[must_use]
    pub const fn applies_to_consumers(self) -> bool {
        matches!(self, Self::Interface | Self::Public)
    }
}

/// One configuration-conditional usage entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalEntry {
    /// Logic condition gating the entry; empty means unconditional.
    /// Config filters encode as `CMAKE_BUILD_TYPE STREQUAL <Config>`.
    pub condition: String,
    /// Propagation scope.
    pub visibility: Visibility,
    /// The flag/path/library text, genexes preserved literally.
    pub value: String,
}

impl ConditionalEntry {
    /// Condition string for an optional config filter.
    #[must_use]
    pub fn condition_for_config(config: Option<&str>) -> String {
        config.map_or_else(String::new, |cfg| {
            format!("CMAKE_BUILD_TYPE STREQUAL {cfg}")
        })
    }

    /// True when the entry applies under `config`.
    #[must_use]
    pub fn matches_config(&self, config: &str) -> bool {
        if self.condition.is_empty() {
            return true;
        }
        self.condition
            .strip_prefix("CMAKE_BUILD_TYPE STREQUAL ")
            .is_some_and(|cfg| cfg.eq_ignore_ascii_case(config))
    }
}

/// Build stage a TARGET-form custom command is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandStage {
    /// Before compiling sources.
    PreBuild,
    /// After compiling, before linking.
    PreLink,
    /// After the link step.
    #[default]
    PostBuild,
}

impl CommandStage {
    /// Keyword spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreBuild => "PRE_BUILD",
            Self::PreLink => "PRE_LINK",
            Self::PostBuild => "POST_BUILD",
        }
    }
}

bitflags! {
    /// Option flags of `add_custom_command`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CustomCommandFlags: u32 {
        /// Escape command arguments for the shell exactly once.
        const VERBATIM = 0x01;
        /// Command needs direct terminal access.
        const USES_TERMINAL = 0x02;
        /// Append to an existing OUTPUT rule.
        const APPEND = 0x04;
        /// Expand `;`-lists in COMMAND arguments.
        const COMMAND_EXPAND_LISTS = 0x08;
        /// Only the explicit DEPENDS order the command.
        const DEPENDS_EXPLICIT_ONLY = 0x10;
        /// Command participates in the codegen build step.
        const CODEGEN = 0x20;
        /// Pass the job-server environment through.
        const JOB_SERVER_AWARE = 0x40;
    }
}

/// A custom command: TARGET form (staged) or OUTPUT form (rule).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomCommand {
    /// OUTPUT form: files the rule produces.
    pub outputs: Vec<String>,
    /// Command lines; each is argv-style.
    pub commands: Vec<Vec<String>>,
    /// TARGET form: stage the command runs at.
    pub stage: CommandStage,
    /// Explicit dependencies.
    pub depends: Vec<String>,
    /// Extra files the command produces besides `outputs`.
    pub byproducts: Vec<String>,
    /// OUTPUT form: primary input.
    pub main_dependency: Option<String>,
    /// Dependency file emitted by the command.
    pub depfile: Option<String>,
    /// Implicit C/C++ dependencies (`IMPLICIT_DEPENDS` pairs).
    pub implicit_depends: Vec<(String, String)>,
    /// Working directory for the command.
    pub working_directory: Option<String>,
    /// Progress message.
    pub comment: Option<String>,
    /// Ninja job pool.
    pub job_pool: Option<String>,
    /// Option flags.
    pub flags: CustomCommandFlags,
}

/// A named unit of build output.
#[derive(Debug, Clone)]
pub struct BuildTarget {
    /// Unique target name.
    pub name: String,
    /// Target kind.
    pub kind: TargetKind,
    /// ALIAS referent.
    pub alias_of: Option<String>,

    /// Ordered, deduplicated source files.
    pub sources: Vec<String>,

    /// Compile definitions visible to the target itself.
    pub definitions: Vec<String>,
    /// Compile definitions propagated to consumers.
    pub interface_definitions: Vec<String>,
    /// Compile options for the target itself.
    pub compile_options: Vec<String>,
    /// Compile options propagated to consumers.
    pub interface_compile_options: Vec<String>,
    /// Include directories for the target itself.
    pub include_directories: Vec<String>,
    /// Include directories propagated to consumers.
    pub interface_include_directories: Vec<String>,
    /// Link options for the target's link step.
    pub link_options: Vec<String>,
    /// Link options propagated to consumers.
    pub interface_link_options: Vec<String>,
    /// Link search directories.
    pub link_directories: Vec<String>,
    /// Link search directories propagated to consumers.
    pub interface_link_directories: Vec<String>,
    /// Libraries linked into the target.
    pub link_libraries: Vec<String>,
    /// Libraries propagated to consumers.
    pub interface_libs: Vec<String>,

    /// Conditional projections of the lists above.
    pub conditional_definitions: Vec<ConditionalEntry>,
    /// Conditional compile options.
    pub conditional_compile_options: Vec<ConditionalEntry>,
    /// Conditional include directories.
    pub conditional_include_directories: Vec<ConditionalEntry>,
    /// Conditional link options.
    pub conditional_link_options: Vec<ConditionalEntry>,
    /// Conditional link directories.
    pub conditional_link_directories: Vec<ConditionalEntry>,
    /// Conditional link libraries.
    pub conditional_link_libraries: Vec<ConditionalEntry>,

    /// `add_dependencies` edges.
    pub dependencies: Vec<String>,
    /// Dependencies propagated to consumers.
    pub interface_dependencies: Vec<String>,
    /// `$<TARGET_OBJECTS>`-style object library edges.
    pub object_dependencies: Vec<String>,

    /// PRE_BUILD/PRE_LINK/POST_BUILD commands in declaration order.
    pub staged_commands: Vec<CustomCommand>,
    /// Indices into the model's OUTPUT custom-command list whose outputs
    /// this target consumes.
    pub consumed_outputs: Vec<usize>,

    /// Target excluded from the default build.
    pub exclude_from_all: bool,
    /// `WIN32_EXECUTABLE` flag.
    pub win32_executable: bool,
    /// `MACOSX_BUNDLE` flag.
    pub macosx_bundle: bool,
    /// Imported location known, no build actions.
    pub imported: bool,
    /// Interface includes are treated as SYSTEM.
    pub system: bool,

    /// Flat custom-property bag.
    pub properties: BTreeMap<String, String>,
}

impl BuildTarget {
    /// Creates an empty target of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            alias_of: None,
            sources: Vec::new(),
            definitions: Vec::new(),
            interface_definitions: Vec::new(),
            compile_options: Vec::new(),
            interface_compile_options: Vec::new(),
            include_directories: Vec::new(),
            interface_include_directories: Vec::new(),
            link_options: Vec::new(),
            interface_link_options: Vec::new(),
            link_directories: Vec::new(),
            interface_link_directories: Vec::new(),
            link_libraries: Vec::new(),
            interface_libs: Vec::new(),
            conditional_definitions: Vec::new(),
            conditional_compile_options: Vec::new(),
            conditional_include_directories: Vec::new(),
            conditional_link_options: Vec::new(),
            conditional_link_directories: Vec::new(),
            conditional_link_libraries: Vec::new(),
            dependencies: Vec::new(),
            interface_dependencies: Vec::new(),
            object_dependencies: Vec::new(),
            staged_commands: Vec::new(),
            consumed_outputs: Vec::new(),
            exclude_from_all: false,
            win32_executable: false,
            macosx_bundle: false,
            imported: false,
            system: false,
            properties: BTreeMap::new(),
        }
    }

    /// Appends a source iff not already present.
    pub fn add_source(&mut self, path: &str) {
        if !self.sources.iter().any(|s| s == path) {
            self.sources.push(path.to_string());
        }
    }

    /// Adds a dependency edge, deduplicated.
    pub fn add_dependency(&mut self, name: &str) {
        push_unique(&mut self.dependencies, name);
    }

    /// Adds an interface dependency edge, deduplicated.
    pub fn add_interface_dependency(&mut self, name: &str) {
        push_unique(&mut self.interface_dependencies, name);
    }

    /// Adds an object-library edge, deduplicated.
    pub fn add_object_dependency(&mut self, name: &str) {
        push_unique(&mut self.object_dependencies, name);
    }

    /// Adds a compile definition to the visibility lists and the
    /// conditional projection.
    pub fn add_definition(&mut self, value: &str, visibility: Visibility, config: Option<&str>) {
        if visibility.applies_to_self() {
            self.definitions.push(value.to_string());
        }
        if visibility.applies_to_consumers() {
            self.interface_definitions.push(value.to_string());
        }
        self.conditional_definitions.push(ConditionalEntry {
            condition: ConditionalEntry::condition_for_config(config),
            visibility,
            value: value.to_string(),
        });
    }

    /// Adds a compile option (dual-write like `add_definition`).
    pub fn add_compile_option(
        &mut self,
        value: &str,
        visibility: Visibility,
        config: Option<&str>,
    ) {
        if visibility.applies_to_self() {
            self.compile_options.push(value.to_string());
        }
        if visibility.applies_to_consumers() {
            self.interface_compile_options.push(value.to_string());
        }
        self.conditional_compile_options.push(ConditionalEntry {
            condition: ConditionalEntry::condition_for_config(config),
            visibility,
            value: value.to_string(),
        });
    }

    /// Adds an include directory (dual-write).
    pub fn add_include_directory(
        &mut self,
        value: &str,
        visibility: Visibility,
        config: Option<&str>,
    ) {
        if visibility.applies_to_self() {
            self.include_directories.push(value.to_string());
        }
        if visibility.applies_to_consumers() {
            self.interface_include_directories.push(value.to_string());
        }
        self.conditional_include_directories.push(ConditionalEntry {
            condition: ConditionalEntry::condition_for_config(config),
            visibility,
            value: value.to_string(),
        });
    }

    /// Adds a link option (dual-write).
    pub fn add_link_option(&mut self, value: &str, visibility: Visibility, config: Option<&str>) {
        if visibility.applies_to_self() {
            self.link_options.push(value.to_string());
        }
        if visibility.applies_to_consumers() {
            self.interface_link_options.push(value.to_string());
        }
        self.conditional_link_options.push(ConditionalEntry {
            condition: ConditionalEntry::condition_for_config(config),
            visibility,
            value: value.to_string(),
        });
    }

    /// Adds a link directory (dual-write).
    pub fn add_link_directory(
        &mut self,
        value: &str,
        visibility: Visibility,
        config: Option<&str>,
    ) {
        if visibility.applies_to_self() {
            self.link_directories.push(value.to_string());
        }
        if visibility.applies_to_consumers() {
            self.interface_link_directories.push(value.to_string());
        }
        self.conditional_link_directories.push(ConditionalEntry {
            condition: ConditionalEntry::condition_for_config(config),
            visibility,
            value: value.to_string(),
        });
    }

    /// Adds a link library (dual-write).
    pub fn add_link_library(&mut self, value: &str, visibility: Visibility, config: Option<&str>) {
        if visibility.applies_to_self() {
            self.link_libraries.push(value.to_string());
        }
        if visibility.applies_to_consumers() {
            self.interface_libs.push(value.to_string());
        }
        self.conditional_link_libraries.push(ConditionalEntry {
            condition: ConditionalEntry::condition_for_config(config),
            visibility,
            value: value.to_string(),
        });
    }

    /// Sets a raw property bag entry.
    pub fn set_property(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), value.to_string());
    }

    /// Appends to a property bag entry as a `;` list.
    pub fn append_property(&mut self, key: &str, value: &str) {
        match self.properties.get_mut(key) {
            Some(existing) if !existing.is_empty() => {
                existing.push(';');
                existing.push_str(value);
            }
            _ => {
                self.properties.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Appends to a property bag entry as a plain string.
    pub fn append_property_string(&mut self, key: &str, value: &str) {
        self.properties
            .entry(key.to_string())
            .or_default()
            .push_str(value);
    }

    /// Sets a property, feeding well-known keys into the matching typed
    /// fields and conditional lists in addition to the flat bag.
    pub fn set_property_smart(&mut self, key: &str, value: &str) {
        match key {
            "EXCLUDE_FROM_ALL" => self.exclude_from_all = is_truthy_property(value),
            "WIN32_EXECUTABLE" => self.win32_executable = is_truthy_property(value),
            "MACOSX_BUNDLE" => self.macosx_bundle = is_truthy_property(value),
            "IMPORTED" => self.imported = is_truthy_property(value),
            "SYSTEM" => self.system = is_truthy_property(value),
            "COMPILE_DEFINITIONS" => {
                for item in split_list(value) {
                    self.add_definition(item, Visibility::Private, None);
                }
            }
            "COMPILE_OPTIONS" => {
                for item in split_list(value) {
                    self.add_compile_option(item, Visibility::Private, None);
                }
            }
            "INCLUDE_DIRECTORIES" => {
                for item in split_list(value) {
                    self.add_include_directory(item, Visibility::Private, None);
                }
            }
            "LINK_OPTIONS" => {
                for item in split_list(value) {
                    self.add_link_option(item, Visibility::Private, None);
                }
            }
            "LINK_DIRECTORIES" => {
                for item in split_list(value) {
                    self.add_link_directory(item, Visibility::Private, None);
                }
            }
            "LINK_LIBRARIES" => {
                for item in split_list(value) {
                    self.add_link_library(item, Visibility::Private, None);
                }
            }
            _ => {
                if let Some(config) = config_suffix(key, "COMPILE_DEFINITIONS_") {
                    for item in split_list(value) {
                        self.add_definition(item, Visibility::Private, Some(&config));
                    }
                } else if let Some(config) = config_suffix(key, "LINK_OPTIONS_") {
                    for item in split_list(value) {
                        self.add_link_option(item, Visibility::Private, Some(&config));
                    }
                } else if let Some(config) = config_suffix(key, "LINK_DIRECTORIES_") {
                    for item in split_list(value) {
                        self.add_link_directory(item, Visibility::Private, Some(&config));
                    }
                }
            }
        }
        self.set_property(key, value);
    }

    /// Live, configured projection of a property.
    ///
    /// Synthetic read-only keys (`NAME`, `TYPE`) come first, then list
    /// projections for the given config, then the flat bag.
    #[must_use]
    pub fn get_property_computed(&self, key: &str, config: &str) -> Option<String> {
        match key {
            "NAME" => Some(self.name.clone()),
            "TYPE" => Some(self.kind.type_string().to_string()),
            "ALIASED_TARGET" => self.alias_of.clone(),
            "OUTPUT_NAME" => Some(
                self.properties
                    .get("OUTPUT_NAME")
                    .cloned()
                    .unwrap_or_else(|| self.name.clone()),
            ),
            "SOURCES" => Some(self.sources.join(";")),
            "COMPILE_DEFINITIONS" => Some(self.project_conditional(
                &self.conditional_definitions,
                config,
            )),
            "COMPILE_OPTIONS" => Some(self.project_conditional(
                &self.conditional_compile_options,
                config,
            )),
            "INCLUDE_DIRECTORIES" => Some(self.project_conditional(
                &self.conditional_include_directories,
                config,
            )),
            "LINK_OPTIONS" => Some(self.project_conditional(
                &self.conditional_link_options,
                config,
            )),
            "LINK_DIRECTORIES" => Some(self.project_conditional(
                &self.conditional_link_directories,
                config,
            )),
            "LINK_LIBRARIES" => Some(self.project_conditional(
                &self.conditional_link_libraries,
                config,
            )),
            "EXCLUDE_FROM_ALL" => Some(bool_property(self.exclude_from_all)),
            "WIN32_EXECUTABLE" => Some(bool_property(self.win32_executable)),
            "MACOSX_BUNDLE" => Some(bool_property(self.macosx_bundle)),
            "IMPORTED" => Some(bool_property(self.imported)),
            "SYSTEM" => Some(bool_property(self.system)),
            _ => self.properties.get(key).cloned(),
        }
    }

    fn project_conditional(&self, entries: &[ConditionalEntry], config: &str) -> String {
        let values: Vec<&str> = entries
            .iter()
            .filter(|e| e.matches_config(config))
            .map(|e| e.value.as_str())
            .collect();
        values.join(";")
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(';').filter(|s| !s.is_empty())
}

fn is_truthy_property(value: &str) -> bool {
    !crate::expr::logic::is_false_constant(value)
}

fn bool_property(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

/// `COMPILE_DEFINITIONS_DEBUG` -> `Debug`-style config suffix.
fn config_suffix(key: &str, prefix: &str) -> Option<String> {
    key.strip_prefix(prefix).map(|suffix| {
        let mut chars = suffix.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
        })
    })
}
