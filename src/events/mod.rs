// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Semantic events emitted by the evaluator.
//!
//! ```text
//! Evaluator ──► Event { origin, kind } ──► codegen consumer
//!
//! ordering: command-source order; an include()'s events sit between its
//! DirPush and DirPop. Consumers treat the stream as a linear log.
//! ```
//!
//! Every payload owns its strings, so events outlive any evaluator
//! scratch state.

use crate::model::{CommandStage, InstallKind, TargetKind, Visibility};
use crate::parser::ast::Origin;

/// How `TargetPropSet` mutates the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropOp {
    /// Replace the value.
    Set,
    /// Append as a `;` list element.
    Append,
    /// Append as a plain string.
    AppendString,
}

/// One semantic action described by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// New target declared.
    TargetDeclare {
        /// Target name.
        name: String,
        /// Declared kind.
        kind: TargetKind,
    },
    /// Source file attached to a target.
    TargetAddSource {
        /// Target name.
        target: String,
        /// Source path.
        source: String,
    },
    /// `target_link_libraries`.
    TargetLinkLibraries {
        /// Consuming target.
        target: String,
        /// Scope of the entries.
        visibility: Visibility,
        /// Library names/paths/targets.
        libraries: Vec<String>,
    },
    /// Target property mutation.
    TargetPropSet {
        /// Target name.
        target: String,
        /// Property key.
        key: String,
        /// New value / appended value.
        value: String,
        /// Mutation kind.
        op: PropOp,
    },
    /// Entering a subdirectory or included file.
    DirPush {
        /// Directory or file being entered.
        dir: String,
    },
    /// Leaving a subdirectory or included file.
    DirPop {
        /// Directory or file being left.
        dir: String,
    },
    /// TARGET-form custom command.
    CustomCommandTarget {
        /// Target the command is attached to.
        target: String,
        /// Build stage.
        stage: CommandStage,
    },
    /// OUTPUT-form custom command.
    CustomCommandOutput {
        /// Declared outputs.
        outputs: Vec<String>,
    },
    /// `add_test`.
    TestAdd {
        /// Test name.
        name: String,
    },
    /// `enable_testing()`.
    TestingEnable,
    /// Cache entry written.
    SetCacheEntry {
        /// Variable name.
        name: String,
        /// Value written.
        value: String,
        /// Entry type.
        entry_type: String,
        /// `FORCE` given.
        forced: bool,
    },
    /// `install()` rule recorded.
    InstallRule {
        /// Rule kind.
        kind: InstallKind,
        /// Installed items.
        items: Vec<String>,
        /// Destination.
        destination: String,
    },
    /// `cpack_add_install_type`.
    CpackAddInstallType {
        /// Install type name.
        name: String,
    },
    /// `cpack_add_component_group`.
    CpackAddComponentGroup {
        /// Group name.
        name: String,
    },
    /// `cpack_add_component`.
    CpackAddComponent {
        /// Component name.
        name: String,
    },
}

/// A tagged event with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Where the triggering command was written.
    pub origin: Origin,
    /// Payload.
    pub kind: EventKind,
}

impl Event {
    /// Builds an event at the given origin.
    #[must_use]
    pub const fn new(origin: Origin, kind: EventKind) -> Self {
        Self { origin, kind }
    }

    /// Short tag for logs.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match &self.kind {
            EventKind::TargetDeclare { .. } => "TARGET_DECLARE",
            EventKind::TargetAddSource { .. } => "TARGET_ADD_SOURCE",
            EventKind::TargetLinkLibraries { .. } => "TARGET_LINK_LIBRARIES",
            EventKind::TargetPropSet { .. } => "TARGET_PROP_SET",
            EventKind::DirPush { .. } => "DIR_PUSH",
            EventKind::DirPop { .. } => "DIR_POP",
            EventKind::CustomCommandTarget { .. } => "CUSTOM_COMMAND_TARGET",
            EventKind::CustomCommandOutput { .. } => "CUSTOM_COMMAND_OUTPUT",
            EventKind::TestAdd { .. } => "TEST_ADD",
            EventKind::TestingEnable => "TESTING_ENABLE",
            EventKind::SetCacheEntry { .. } => "SET_CACHE_ENTRY",
            EventKind::InstallRule { .. } => "INSTALL_RULE",
            EventKind::CpackAddInstallType { .. } => "CPACK_ADD_INSTALL_TYPE",
            EventKind::CpackAddComponentGroup { .. } => "CPACK_ADD_COMPONENT_GROUP",
            EventKind::CpackAddComponent { .. } => "CPACK_ADD_COMPONENT",
        }
    }
}
