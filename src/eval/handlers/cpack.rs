// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! CPack commands and the packaging pseudo-modules.
//!
//! ```text
//! include(CPackDeb) etc. never loads script text; a table drives:
//!   CMAKE_CPACK_<P>_MODULE_INITIALIZED=ON   CPACK_<P>_ENABLED=ON
//!   name slugging, architecture defaults, file-name extensions
//!
//! derived CPACK_* values live in the cache and are recomputed whenever
//! a CPACK_* variable is set, so later set(CPACK_PACKAGE_NAME ...) is
//! reflected in CPACK_DEBIAN_PACKAGE_NAME and friends
//! ```

use tracing::debug;

use crate::eval::opt::{OptKind, OptSpec, parse_opts};
use crate::eval::{Evaluator, Flow, Invocation};
use crate::events::EventKind;

/// One packaging pseudo-module.
struct CpackModule {
    include_name: &'static str,
    slug: &'static str,
    prefix: &'static str,
    architecture: &'static str,
    extension: &'static str,
}

/// The emulated module table. New modules are a row here, not code.
const MODULES: [CpackModule; 12] = [
    CpackModule {
        include_name: "CPackArchive",
        slug: "archive",
        prefix: "ARCHIVE",
        architecture: "",
        extension: ".tar.gz",
    },
    CpackModule {
        include_name: "CPackDeb",
        slug: "deb",
        prefix: "DEBIAN",
        architecture: "amd64",
        extension: ".deb",
    },
    CpackModule {
        include_name: "CPackRPM",
        slug: "rpm",
        prefix: "RPM",
        architecture: "x86_64",
        extension: ".rpm",
    },
    CpackModule {
        include_name: "CPackNSIS",
        slug: "nsis",
        prefix: "NSIS",
        architecture: "",
        extension: ".exe",
    },
    CpackModule {
        include_name: "CPackWIX",
        slug: "wix",
        prefix: "WIX",
        architecture: "x64",
        extension: ".msi",
    },
    CpackModule {
        include_name: "CPackDMG",
        slug: "dmg",
        prefix: "DMG",
        architecture: "",
        extension: ".dmg",
    },
    CpackModule {
        include_name: "CPackBundle",
        slug: "bundle",
        prefix: "BUNDLE",
        architecture: "",
        extension: ".tar.gz",
    },
    CpackModule {
        include_name: "CPackProductBuild",
        slug: "productbuild",
        prefix: "PRODUCTBUILD",
        architecture: "",
        extension: ".pkg",
    },
    CpackModule {
        include_name: "CPackIFW",
        slug: "ifw",
        prefix: "IFW",
        architecture: "",
        extension: ".run",
    },
    CpackModule {
        include_name: "CPackNuGet",
        slug: "nuget",
        prefix: "NUGET",
        architecture: "",
        extension: ".nupkg",
    },
    CpackModule {
        include_name: "CPackFreeBSD",
        slug: "freebsd",
        prefix: "FREEBSD",
        architecture: "amd64",
        extension: ".pkg",
    },
    CpackModule {
        include_name: "CPackCygwin",
        slug: "cygwin",
        prefix: "CYGWIN",
        architecture: "",
        extension: ".tar.bz2",
    },
];

fn module_for(name: &str) -> Option<&'static CpackModule> {
    let stem = name.strip_suffix(".cmake").unwrap_or(name);
    MODULES
        .iter()
        .find(|module| module.include_name.eq_ignore_ascii_case(stem))
}

/// `include(CPack...)` interception; true when the name was one of the
/// emulated packaging modules.
pub(crate) fn include_pseudo_module(ev: &mut Evaluator<'_>, name: &str) -> bool {
    let stem = name.strip_suffix(".cmake").unwrap_or(name);
    if stem.eq_ignore_ascii_case("CPack") || stem.eq_ignore_ascii_case("CPackComponent") {
        // Provides the cpack_add_* commands; CPack itself also seeds the
        // package-level defaults.
        ev.set_variable("CMAKE_CPACK_COMPONENT_COMMANDS", "ON");
        renormalize_modules(ev);
        return true;
    }

    let Some(module) = module_for(stem) else {
        return false;
    };
    if !ev.model.cpack_modules.iter().any(|m| m == module.slug) {
        ev.model.cpack_modules.push(module.slug.to_string());
    }
    debug!(module = module.include_name, "packaging pseudo-module initialized");

    let initialized = format!("CMAKE_CPACK_{}_MODULE_INITIALIZED", module.prefix);
    let enabled = format!("CPACK_{}_ENABLED", module.prefix);
    ev.model.set_cache_entry(&initialized, "ON", "INTERNAL", "", true);
    ev.model.set_cache_entry(&enabled, "ON", "INTERNAL", "", true);
    renormalize_modules(ev);
    true
}

/// Lowercase slug: non-alphanumerics collapse to single dashes.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn effective(ev: &Evaluator<'_>, name: &str, fallback: &str) -> String {
    crate::eval::expand::VarSource::lookup_var(ev, name)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Recomputes derived CPACK_* cache values for every initialized module.
/// Called after `project()`, module initialization and any
/// `set(CPACK_*)`.
pub(crate) fn renormalize_modules(ev: &mut Evaluator<'_>) {
    let package_name = effective(ev, "CPACK_PACKAGE_NAME", &ev.model.project.name);
    let package_version = effective(ev, "CPACK_PACKAGE_VERSION", &ev.model.project.version);
    if package_name.is_empty() {
        return;
    }
    let file_name = if package_version.is_empty() {
        package_name.clone()
    } else {
        format!("{package_name}-{package_version}")
    };

    let mut set = |name: String, value: &str| {
        ev.model.set_cache_entry(&name, value, "INTERNAL", "", true);
    };
    set("CPACK_PACKAGE_NAME".to_string(), &package_name);
    set("CPACK_PACKAGE_VERSION".to_string(), &package_version);
    set("CPACK_PACKAGE_FILE_NAME".to_string(), &file_name);

    let depends = crate::eval::expand::VarSource::lookup_var(ev, "CPACK_PACKAGE_DEPENDS")
        .unwrap_or_default()
        .split(';')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let contact =
        crate::eval::expand::VarSource::lookup_var(ev, "CPACK_PACKAGE_CONTACT").unwrap_or_default();
    let slug = slugify(&package_name);

    let modules: Vec<String> = ev.model.cpack_modules.clone();
    for slug_name in modules {
        let Some(module) = MODULES.iter().find(|m| m.slug == slug_name) else {
            continue;
        };
        let prefix = module.prefix;
        let mut set = |name: String, value: &str| {
            ev.model.set_cache_entry(&name, value, "INTERNAL", "", true);
        };
        match module.slug {
            "archive" => {
                set(format!("CPACK_{prefix}_GENERATORS"), "TGZ");
                set(
                    format!("CPACK_{prefix}_FILE_NAME"),
                    &format!("{file_name}{}", module.extension),
                );
            }
            "deb" => {
                set(format!("CPACK_{prefix}_PACKAGE_NAME"), &slug);
                set(format!("CPACK_{prefix}_PACKAGE_VERSION"), &package_version);
                set(
                    format!("CPACK_{prefix}_PACKAGE_ARCHITECTURE"),
                    module.architecture,
                );
                set(format!("CPACK_{prefix}_PACKAGE_DEPENDS"), &depends);
                set(
                    format!("CPACK_{prefix}_FILE_NAME"),
                    &format!("{slug}_{package_version}_{}.deb", module.architecture),
                );
            }
            "rpm" => {
                set(format!("CPACK_{prefix}_PACKAGE_NAME"), &slug);
                set(format!("CPACK_{prefix}_PACKAGE_VERSION"), &package_version);
                set(
                    format!("CPACK_{prefix}_PACKAGE_ARCHITECTURE"),
                    module.architecture,
                );
                set(format!("CPACK_{prefix}_PACKAGE_REQUIRES"), &depends);
                set(
                    format!("CPACK_{prefix}_FILE_NAME"),
                    &format!("{slug}-{package_version}.{}.rpm", module.architecture),
                );
            }
            "nsis" => {
                set(format!("CPACK_{prefix}_DISPLAY_NAME"), &package_name);
                set(
                    format!("CPACK_{prefix}_PACKAGE_INSTALL_DIRECTORY"),
                    &package_name,
                );
                set(format!("CPACK_{prefix}_CONTACT"), &contact);
                set(
                    format!("CPACK_{prefix}_FILE_NAME"),
                    &format!("{file_name}.exe"),
                );
            }
            "wix" => {
                set(format!("CPACK_{prefix}_PRODUCT_NAME"), &package_name);
                set(format!("CPACK_{prefix}_ARCHITECTURE"), module.architecture);
                set(format!("CPACK_{prefix}_CULTURES"), "en-us");
                set(
                    format!("CPACK_{prefix}_FILE_NAME"),
                    &format!("{file_name}.msi"),
                );
            }
            _ => {
                set(format!("CPACK_{prefix}_PACKAGE_NAME"), &slug);
                if !module.architecture.is_empty() {
                    set(
                        format!("CPACK_{prefix}_PACKAGE_ARCHITECTURE"),
                        module.architecture,
                    );
                }
                set(
                    format!("CPACK_{prefix}_FILE_NAME"),
                    &format!("{file_name}{}", module.extension),
                );
            }
        }
    }
}

/// `cpack_add_install_type(<name> [DISPLAY_NAME <text>])`.
pub(crate) fn cmd_cpack_add_install_type(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 1] = [OptSpec::new("DISPLAY_NAME", OptKind::Single)];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("cpack_add_install_type", message);
            return Flow::Normal;
        }
    };
    let Some(name) = parsed.positionals().first().cloned() else {
        ev.error("cpack_add_install_type", "missing install type name");
        return Flow::Normal;
    };

    let idx = ev.model.cpack.ensure_install_type(&name);
    if let Some(display_name) = parsed.one("DISPLAY_NAME") {
        ev.model.cpack.install_types[idx].display_name = display_name.to_string();
    }
    ev.emit(EventKind::CpackAddInstallType { name });
    Flow::Normal
}

/// `cpack_add_component_group(<name> [DISPLAY_NAME ...] [DESCRIPTION ...]
/// [PARENT_GROUP ...] [EXPANDED] [BOLD_TITLE])`.
pub(crate) fn cmd_cpack_add_component_group(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 5] = [
        OptSpec::new("DISPLAY_NAME", OptKind::Single),
        OptSpec::new("DESCRIPTION", OptKind::Single),
        OptSpec::new("PARENT_GROUP", OptKind::Single),
        OptSpec::new("EXPANDED", OptKind::Flag),
        OptSpec::new("BOLD_TITLE", OptKind::Flag),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("cpack_add_component_group", message);
            return Flow::Normal;
        }
    };
    let Some(name) = parsed.positionals().first().cloned() else {
        ev.error("cpack_add_component_group", "missing group name");
        return Flow::Normal;
    };

    let idx = ev.model.cpack.ensure_component_group(&name);
    let group = &mut ev.model.cpack.component_groups[idx];
    if let Some(display_name) = parsed.one("DISPLAY_NAME") {
        group.display_name = display_name.to_string();
    }
    if let Some(description) = parsed.one("DESCRIPTION") {
        group.description = description.to_string();
    }
    if let Some(parent) = parsed.one("PARENT_GROUP") {
        group.parent_group = parent.to_string();
    }
    group.expanded |= parsed.has("EXPANDED");
    group.bold_title |= parsed.has("BOLD_TITLE");
    ev.emit(EventKind::CpackAddComponentGroup { name });
    Flow::Normal
}

/// `cpack_add_component(<name> [DISPLAY_NAME ...] [DESCRIPTION ...]
/// [GROUP ...] [DEPENDS ...] [INSTALL_TYPES ...] [REQUIRED] [HIDDEN]
/// [DISABLED] [DOWNLOADED] [ARCHIVE_FILE ...] [PLIST ...])`.
pub(crate) fn cmd_cpack_add_component(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    const SPECS: [OptSpec; 11] = [
        OptSpec::new("DISPLAY_NAME", OptKind::Single),
        OptSpec::new("DESCRIPTION", OptKind::Single),
        OptSpec::new("GROUP", OptKind::Single),
        OptSpec::new("DEPENDS", OptKind::Multi),
        OptSpec::new("INSTALL_TYPES", OptKind::Multi),
        OptSpec::new("REQUIRED", OptKind::Flag),
        OptSpec::new("HIDDEN", OptKind::Flag),
        OptSpec::new("DISABLED", OptKind::Flag),
        OptSpec::new("DOWNLOADED", OptKind::Flag),
        OptSpec::new("ARCHIVE_FILE", OptKind::Single),
        OptSpec::new("PLIST", OptKind::Single),
    ];
    let values = inv.values();
    let parsed = match parse_opts(&values, 0, &SPECS) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("cpack_add_component", message);
            return Flow::Normal;
        }
    };
    let Some(name) = parsed.positionals().first().cloned() else {
        ev.error("cpack_add_component", "missing component name");
        return Flow::Normal;
    };

    let idx = ev.model.cpack.ensure_component(&name);
    let component = &mut ev.model.cpack.components[idx];
    if let Some(display_name) = parsed.one("DISPLAY_NAME") {
        component.display_name = display_name.to_string();
    }
    if let Some(description) = parsed.one("DESCRIPTION") {
        component.description = description.to_string();
    }
    if let Some(group) = parsed.one("GROUP") {
        component.group = group.to_string();
    }
    for dep in parsed.many("DEPENDS") {
        if !component.depends.contains(dep) {
            component.depends.push(dep.clone());
        }
    }
    for install_type in parsed.many("INSTALL_TYPES") {
        if !component.install_types.contains(install_type) {
            component.install_types.push(install_type.clone());
        }
    }
    component.required |= parsed.has("REQUIRED");
    component.hidden |= parsed.has("HIDDEN");
    component.disabled |= parsed.has("DISABLED");
    component.downloaded |= parsed.has("DOWNLOADED");
    if let Some(archive_file) = parsed.one("ARCHIVE_FILE") {
        component.archive_file = archive_file.to_string();
    }
    if let Some(plist) = parsed.one("PLIST") {
        component.plist = plist.to_string();
    }
    ev.emit(EventKind::CpackAddComponent { name });
    Flow::Normal
}
