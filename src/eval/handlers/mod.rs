// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Built-in command handlers, one module per family.
//!
//! ```text
//! dispatch(name)
//!   project     project cmake_minimum_required cmake_policy message ...
//!   targets     add_executable add_library target_* ...
//!   custom      add_custom_command execute_process
//!   directives  add_definitions include_directories set_property ...
//!   vars        set unset math separate_arguments option
//!   strings     string()
//!   lists       list()
//!   files       file() configure_file
//!   probes      try_compile try_run check_*
//!   testing     enable_testing add_test set_tests_properties ...
//!   install     install export
//!   cpack       cpack_add_* + pseudo-modules
//!   ctest       ctest_* script mode
//!   fileapi     cmake_file_api cmake_instrumentation
//! ```
//!
//! Every handler is `fn(&mut Evaluator, &Invocation) -> Flow`.

pub(crate) mod cpack;
pub(crate) mod ctest;
pub(crate) mod custom;
pub(crate) mod directives;
pub(crate) mod fileapi;
pub(crate) mod files;
pub(crate) mod files_extra;
pub(crate) mod hash;
pub(crate) mod install;
pub(crate) mod lists;
pub(crate) mod probes;
pub(crate) mod project;
pub(crate) mod strings;
pub(crate) mod targets;
pub(crate) mod testing;
pub(crate) mod vars;

use super::{Evaluator, Flow, Invocation, include};

/// Control-flow words that the evaluator handles structurally; they count
/// as commands for `if(COMMAND ...)`.
const CONTROL_COMMANDS: [&str; 16] = [
    "if",
    "elseif",
    "else",
    "endif",
    "while",
    "endwhile",
    "foreach",
    "endforeach",
    "function",
    "endfunction",
    "macro",
    "endmacro",
    "return",
    "break",
    "continue",
    "block",
];

/// Dispatches a built-in handler; `None` means "not a built-in".
#[allow(clippy::too_many_lines)]
pub(crate) fn dispatch(ev: &mut Evaluator<'_>, inv: &Invocation) -> Option<Flow> {
    let flow = match inv.name.as_str() {
        // Project & metadata.
        "project" => project::cmd_project(ev, inv),
        "cmake_minimum_required" => project::cmd_cmake_minimum_required(ev, inv),
        "cmake_policy" => project::cmd_cmake_policy(ev, inv),
        "get_cmake_property" => project::cmd_get_cmake_property(ev, inv),
        "message" => project::cmd_message(ev, inv),
        "option" => project::cmd_option(ev, inv),
        "variable_watch" => project::cmd_variable_watch(ev, inv),
        "variable_requires" => project::cmd_variable_requires(ev, inv),

        // Targets.
        "add_executable" => targets::cmd_add_executable(ev, inv),
        "add_library" => targets::cmd_add_library(ev, inv),
        "add_custom_target" => targets::cmd_add_custom_target(ev, inv),
        "add_dependencies" => targets::cmd_add_dependencies(ev, inv),
        "set_target_properties" => targets::cmd_set_target_properties(ev, inv),
        "get_target_property" => targets::cmd_get_target_property(ev, inv),
        "target_sources" => targets::cmd_target_sources(ev, inv),
        "target_link_libraries" => targets::cmd_target_link_libraries(ev, inv),
        "target_link_options" => targets::cmd_target_link_options(ev, inv),
        "target_link_directories" => targets::cmd_target_link_directories(ev, inv),
        "target_include_directories" => targets::cmd_target_include_directories(ev, inv),
        "target_compile_definitions" => targets::cmd_target_compile_definitions(ev, inv),
        "target_compile_options" => targets::cmd_target_compile_options(ev, inv),
        "target_compile_features" => targets::cmd_target_compile_features(ev, inv),
        "target_precompile_headers" => targets::cmd_target_precompile_headers(ev, inv),

        // Custom commands & processes.
        "add_custom_command" => custom::cmd_add_custom_command(ev, inv),
        "execute_process" => custom::cmd_execute_process(ev, inv),

        // Global directives.
        "add_compile_options" => directives::cmd_add_compile_options(ev, inv),
        "add_compile_definitions" => directives::cmd_add_compile_definitions(ev, inv),
        "add_definitions" => directives::cmd_add_definitions(ev, inv),
        "add_link_options" => directives::cmd_add_link_options(ev, inv),
        "include_directories" => directives::cmd_include_directories(ev, inv),
        "link_directories" => directives::cmd_link_directories(ev, inv),
        "link_libraries" => directives::cmd_link_libraries(ev, inv),
        "set_directory_properties" => directives::cmd_set_directory_properties(ev, inv),
        "set_source_files_properties" => directives::cmd_set_source_files_properties(ev, inv),
        "set_property" => directives::cmd_set_property(ev, inv),
        "get_property" => directives::cmd_get_property(ev, inv),

        // Control / include.
        "include" => include::cmd_include(ev, inv),
        "add_subdirectory" => include::cmd_add_subdirectory(ev, inv),
        "include_guard" => include::cmd_include_guard(ev, inv),

        // Variables / math.
        "set" => vars::cmd_set(ev, inv),
        "unset" => vars::cmd_unset(ev, inv),
        "math" => vars::cmd_math(ev, inv),
        "separate_arguments" => vars::cmd_separate_arguments(ev, inv),
        "mark_as_advanced" => vars::cmd_mark_as_advanced(ev, inv),

        // Strings & lists.
        "string" => strings::cmd_string(ev, inv),
        "list" => lists::cmd_list(ev, inv),

        // File I/O.
        "file" => files::cmd_file(ev, inv),
        "configure_file" => files::cmd_configure_file(ev, inv),

        // Probes.
        "try_compile" => probes::cmd_try_compile(ev, inv),
        "try_run" => probes::cmd_try_run(ev, inv),
        "check_c_source_compiles" => probes::cmd_check_c_source_compiles(ev, inv),
        "check_c_source_runs" => probes::cmd_check_c_source_runs(ev, inv),
        "check_symbol_exists" => probes::cmd_check_symbol_exists(ev, inv),
        "check_include_file" => probes::cmd_check_include_file(ev, inv),
        "check_include_files" => probes::cmd_check_include_files(ev, inv),
        "check_function_exists" => probes::cmd_check_function_exists(ev, inv),
        "check_library_exists" => probes::cmd_check_library_exists(ev, inv),
        "check_type_size" => probes::cmd_check_type_size(ev, inv),
        "check_c_compiler_flag" => probes::cmd_check_c_compiler_flag(ev, inv),
        "check_struct_has_member" => probes::cmd_check_struct_has_member(ev, inv),

        // Testing & packaging.
        "enable_testing" => testing::cmd_enable_testing(ev, inv),
        "add_test" => testing::cmd_add_test(ev, inv),
        "set_tests_properties" => testing::cmd_set_tests_properties(ev, inv),
        "get_test_property" => testing::cmd_get_test_property(ev, inv),
        "install" => install::cmd_install(ev, inv),
        "export" => install::cmd_export(ev, inv),
        "cpack_add_install_type" => cpack::cmd_cpack_add_install_type(ev, inv),
        "cpack_add_component_group" => cpack::cmd_cpack_add_component_group(ev, inv),
        "cpack_add_component" => cpack::cmd_cpack_add_component(ev, inv),

        // CTest script mode.
        "ctest_start" => ctest::cmd_ctest_start(ev, inv),
        "ctest_configure" => ctest::cmd_ctest_configure(ev, inv),
        "ctest_build" => ctest::cmd_ctest_build(ev, inv),
        "ctest_test" => ctest::cmd_ctest_test(ev, inv),
        "ctest_coverage" => ctest::cmd_ctest_coverage(ev, inv),
        "ctest_memcheck" => ctest::cmd_ctest_memcheck(ev, inv),
        "ctest_submit" => ctest::cmd_ctest_submit(ev, inv),
        "ctest_upload" => ctest::cmd_ctest_upload(ev, inv),
        "ctest_read_custom_files" => ctest::cmd_ctest_read_custom_files(ev, inv),
        "ctest_empty_binary_directory" => ctest::cmd_ctest_empty_binary_directory(ev, inv),
        "ctest_sleep" => ctest::cmd_ctest_sleep(ev, inv),
        "ctest_run_script" => ctest::cmd_ctest_run_script(ev, inv),

        // File API.
        "cmake_file_api" => fileapi::cmd_cmake_file_api(ev, inv),
        "cmake_instrumentation" => fileapi::cmd_cmake_instrumentation(ev, inv),

        _ => return None,
    };
    Some(flow)
}

/// True for names the dispatcher (or the structural evaluator) answers
/// to, used by `if(COMMAND ...)`.
pub(crate) fn is_builtin(name: &str) -> bool {
    if CONTROL_COMMANDS.contains(&name) {
        return true;
    }
    matches!(
        name,
        "project"
            | "cmake_minimum_required"
            | "cmake_policy"
            | "get_cmake_property"
            | "message"
            | "option"
            | "variable_watch"
            | "variable_requires"
            | "add_executable"
            | "add_library"
            | "add_custom_target"
            | "add_dependencies"
            | "set_target_properties"
            | "get_target_property"
            | "target_sources"
            | "target_link_libraries"
            | "target_link_options"
            | "target_link_directories"
            | "target_include_directories"
            | "target_compile_definitions"
            | "target_compile_options"
            | "target_compile_features"
            | "target_precompile_headers"
            | "add_custom_command"
            | "execute_process"
            | "add_compile_options"
            | "add_compile_definitions"
            | "add_definitions"
            | "add_link_options"
            | "include_directories"
            | "link_directories"
            | "link_libraries"
            | "set_directory_properties"
            | "set_source_files_properties"
            | "set_property"
            | "get_property"
            | "include"
            | "add_subdirectory"
            | "include_guard"
            | "set"
            | "unset"
            | "math"
            | "separate_arguments"
            | "mark_as_advanced"
            | "string"
            | "list"
            | "file"
            | "configure_file"
            | "try_compile"
            | "try_run"
            | "check_c_source_compiles"
            | "check_c_source_runs"
            | "check_symbol_exists"
            | "check_include_file"
            | "check_include_files"
            | "check_function_exists"
            | "check_library_exists"
            | "check_type_size"
            | "check_c_compiler_flag"
            | "check_struct_has_member"
            | "enable_testing"
            | "add_test"
            | "set_tests_properties"
            | "get_test_property"
            | "install"
            | "export"
            | "cpack_add_install_type"
            | "cpack_add_component_group"
            | "cpack_add_component"
            | "ctest_start"
            | "ctest_configure"
            | "ctest_build"
            | "ctest_test"
            | "ctest_coverage"
            | "ctest_memcheck"
            | "ctest_submit"
            | "ctest_upload"
            | "ctest_read_custom_files"
            | "ctest_empty_binary_directory"
            | "ctest_sleep"
            | "ctest_run_script"
            | "cmake_file_api"
            | "cmake_instrumentation"
    )
}
