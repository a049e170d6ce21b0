// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! CPack packaging metadata: install types, component groups, components.
//! All three collections deduplicate by name.

/// `cpack_add_install_type` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpackInstallType {
    /// Unique name.
    pub name: String,
    /// `DISPLAY_NAME`.
    pub display_name: String,
}

/// `cpack_add_component_group` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpackComponentGroup {
    /// Unique name.
    pub name: String,
    /// `DISPLAY_NAME`.
    pub display_name: String,
    /// `DESCRIPTION`.
    pub description: String,
    /// `PARENT_GROUP`.
    pub parent_group: String,
    /// `EXPANDED` flag.
    pub expanded: bool,
    /// `BOLD_TITLE` flag.
    pub bold_title: bool,
}

/// `cpack_add_component` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpackComponent {
    /// Unique name.
    pub name: String,
    /// `DISPLAY_NAME`.
    pub display_name: String,
    /// `DESCRIPTION`.
    pub description: String,
    /// `GROUP` the component belongs to.
    pub group: String,
    /// `DEPENDS` component names.
    pub depends: Vec<String>,
    /// `INSTALL_TYPES` the component appears in.
    pub install_types: Vec<String>,
    /// `REQUIRED` flag.
    pub required: bool,
    /// `HIDDEN` flag.
    pub hidden: bool,
    /// `DISABLED` flag.
    pub disabled: bool,
    /// `DOWNLOADED` flag.
    pub downloaded: bool,
    /// `ARCHIVE_FILE` override.
    pub archive_file: String,
    /// `PLIST` file (productbuild).
    pub plist: String,
}

/// Packaging metadata attached to the build model.
#[derive(Debug, Clone, Default)]
pub struct CpackMetadata {
    /// Install types, dedup by name.
    pub install_types: Vec<CpackInstallType>,
    /// Component groups, dedup by name.
    pub component_groups: Vec<CpackComponentGroup>,
    /// Components, dedup by name.
    pub components: Vec<CpackComponent>,
}

impl CpackMetadata {
    /// Index of the install type, creating it on first use.
    pub fn ensure_install_type(&mut self, name: &str) -> usize {
        if let Some(idx) = self.install_types.iter().position(|t| t.name == name) {
            return idx;
        }
        self.install_types.push(CpackInstallType {
            name: name.to_string(),
            display_name: String::new(),
        });
        self.install_types.len() - 1
    }

    /// Index of the component group, creating it on first use.
    pub fn ensure_component_group(&mut self, name: &str) -> usize {
        if let Some(idx) = self.component_groups.iter().position(|g| g.name == name) {
            return idx;
        }
        self.component_groups.push(CpackComponentGroup {
            name: name.to_string(),
            ..CpackComponentGroup::default()
        });
        self.component_groups.len() - 1
    }

    /// Index of the component, creating it on first use.
    pub fn ensure_component(&mut self, name: &str) -> usize {
        if let Some(idx) = self.components.iter().position(|c| c.name == name) {
            return idx;
        }
        self.components.push(CpackComponent {
            name: name.to_string(),
            ..CpackComponent::default()
        });
        self.components.len() - 1
    }
}
