// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dependency graph validation and topological ordering.
//!
//! ```text
//! edges: dependencies + object_dependencies
//!        + link libraries that name targets (aliases resolved)
//!
//! validate_dependencies: existence + 3-color DFS acyclicity
//! topological_sort:      deps first; empty result on cycle
//! ```

use super::BuildModel;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl BuildModel {
    /// Target indices the target at `idx` depends on.
    pub(crate) fn dependency_indices(&self, idx: usize) -> Vec<usize> {
        let target = &self.targets[idx];
        let mut deps = Vec::new();
        let mut push = |name: &str| {
            if let Some(dep_idx) = self.resolve_alias_index(name)
                && dep_idx != idx
                && !deps.contains(&dep_idx)
            {
                deps.push(dep_idx);
            }
        };
        for name in &target.dependencies {
            push(name);
        }
        for name in &target.object_dependencies {
            push(name);
        }
        // Link libraries may be external (m, pthread, ...); only entries
        // naming a target become edges.
        for name in &target.link_libraries {
            push(name);
        }
        for name in &target.interface_libs {
            push(name);
        }
        deps
    }

    /// Checks that every `add_dependencies` edge names an existing target
    /// and that the graph is acyclic.
    #[must_use]
    pub fn validate_dependencies(&self) -> bool {
        for target in &self.targets {
            for name in target
                .dependencies
                .iter()
                .chain(&target.interface_dependencies)
                .chain(&target.object_dependencies)
            {
                if self.find_target_index(name).is_none() {
                    tracing::error!(
                        target_name = %target.name,
                        dependency = %name,
                        "dependency references unknown target"
                    );
                    return false;
                }
            }
            if let Some(alias_of) = &target.alias_of
                && self.find_target_index(alias_of).is_none()
            {
                tracing::error!(
                    target_name = %target.name,
                    referent = %alias_of,
                    "alias references unknown target"
                );
                return false;
            }
        }
        !self.has_cycle()
    }

    fn has_cycle(&self) -> bool {
        let mut colors = vec![Color::White; self.targets.len()];
        for idx in 0..self.targets.len() {
            if colors[idx] == Color::White && self.cycle_dfs(idx, &mut colors) {
                return true;
            }
        }
        false
    }

    fn cycle_dfs(&self, idx: usize, colors: &mut Vec<Color>) -> bool {
        match colors[idx] {
            Color::Gray => return true,
            Color::Black => return false,
            Color::White => {}
        }
        colors[idx] = Color::Gray;
        for dep in self.dependency_indices(idx) {
            if self.cycle_dfs(dep, colors) {
                return true;
            }
        }
        colors[idx] = Color::Black;
        false
    }

    /// Orders targets dependencies-first. Returns an empty vector when the
    /// graph has a cycle; ALIAS targets are skipped (they contribute no
    /// build actions).
    #[must_use]
    pub fn topological_sort(&self) -> Vec<usize> {
        let mut colors = vec![Color::White; self.targets.len()];
        let mut order = Vec::with_capacity(self.targets.len());

        for idx in 0..self.targets.len() {
            if colors[idx] == Color::White
                && !self.topo_dfs(idx, &mut colors, &mut order)
            {
                return Vec::new();
            }
        }

        order.retain(|&idx| self.targets[idx].alias_of.is_none());
        order
    }

    fn topo_dfs(&self, idx: usize, colors: &mut Vec<Color>, order: &mut Vec<usize>) -> bool {
        match colors[idx] {
            Color::Gray => return false,
            Color::Black => return true,
            Color::White => {}
        }
        colors[idx] = Color::Gray;
        for dep in self.dependency_indices(idx) {
            if !self.topo_dfs(dep, colors, order) {
                return false;
            }
        }
        colors[idx] = Color::Black;
        order.push(idx);
        true
    }
}
