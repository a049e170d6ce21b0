// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;

use super::{EvalOptions, Evaluator, Severity};
use crate::effects::{FakeExecutor, ProcessOutcome};
use crate::events::EventKind;
use crate::model::{TargetKind, Visibility};
use crate::parser::parse_str;

fn with_eval<R>(source: &str, f: impl FnOnce(&mut Evaluator<'_>) -> R) -> R {
    with_eval_opts(source, EvalOptions::default(), f)
}

fn with_eval_opts<R>(
    source: &str,
    options: EvalOptions,
    f: impl FnOnce(&mut Evaluator<'_>) -> R,
) -> R {
    let effects = FakeExecutor::new();
    let mut ev = Evaluator::new(options, &effects);
    let list = parse_str(source, "CMakeLists.txt").expect("test script parses");
    ev.evaluate_list_file(&list);
    f(&mut ev)
}

fn var(ev: &Evaluator<'_>, name: &str) -> String {
    ev.variable(name).unwrap_or_default()
}

// =============================================================================
// Targets & events
// =============================================================================

#[test]
fn test_library_and_executable_link() {
    with_eval(
        "project(P)\n\
         add_library(core STATIC core.c)\n\
         add_executable(app main.c)\n\
         target_link_libraries(app PRIVATE core)\n",
        |ev| {
            let core = ev.model.target("core").unwrap();
            assert_eq!(core.kind, TargetKind::StaticLib);
            assert_eq!(core.sources, vec!["core.c"]);

            let app = ev.model.target("app").unwrap();
            assert_eq!(app.kind, TargetKind::Executable);
            assert_eq!(app.link_libraries, vec!["core"]);

            let tags: Vec<&str> = ev.events().iter().map(crate::events::Event::tag).collect();
            assert_eq!(
                tags,
                vec![
                    "TARGET_DECLARE",
                    "TARGET_ADD_SOURCE",
                    "TARGET_DECLARE",
                    "TARGET_ADD_SOURCE",
                    "TARGET_LINK_LIBRARIES",
                ]
            );
            let link = ev.events().last().unwrap();
            assert!(matches!(
                &link.kind,
                EventKind::TargetLinkLibraries { target, visibility, libraries }
                    if target == "app"
                        && *visibility == Visibility::Private
                        && libraries == &vec!["core".to_string()]
            ));
            assert!(!ev.has_errors());
        },
    );
}

#[test]
fn test_alias_and_conflict() {
    with_eval(
        "add_library(core STATIC core.c)\n\
         add_library(ns::core ALIAS core)\n\
         add_executable(core main.c)\n",
        |ev| {
            assert_eq!(ev.model.resolve_alias("ns::core").unwrap().name, "core");
            // Redeclaring with a different kind is a handler error.
            assert!(ev.has_errors());
        },
    );
}

#[test]
fn test_target_usage_requirements() {
    with_eval(
        "add_library(core STATIC core.c)\n\
         target_compile_definitions(core PUBLIC CORE_API PRIVATE -DINTERNAL)\n\
         target_include_directories(core PUBLIC include PRIVATE src)\n\
         target_compile_options(core INTERFACE -Wall)\n",
        |ev| {
            let core = ev.model.target("core").unwrap();
            assert_eq!(core.definitions, vec!["CORE_API", "INTERNAL"]);
            assert_eq!(core.interface_definitions, vec!["CORE_API"]);
            assert_eq!(core.include_directories, vec!["include", "src"]);
            assert_eq!(core.interface_include_directories, vec!["include"]);
            assert_eq!(core.interface_compile_options, vec!["-Wall"]);
            assert!(core.compile_options.is_empty());
        },
    );
}

#[test]
fn test_custom_target_and_command() {
    with_eval(
        "add_executable(app main.c)\n\
         add_custom_target(docs ALL COMMAND doxygen Doxyfile COMMENT \"docs\")\n\
         add_custom_command(TARGET app POST_BUILD COMMAND strip app)\n\
         add_custom_command(OUTPUT gen.c COMMAND gen --out gen.c DEPENDS gen.in)\n",
        |ev| {
            let docs = ev.model.target("docs").unwrap();
            assert_eq!(docs.kind, TargetKind::Utility);
            assert!(!docs.exclude_from_all);
            assert_eq!(docs.staged_commands.len(), 1);
            assert_eq!(docs.staged_commands[0].commands[0], vec!["doxygen", "Doxyfile"]);

            let app = ev.model.target("app").unwrap();
            assert_eq!(app.staged_commands.len(), 1);
            assert_eq!(
                app.staged_commands[0].stage,
                crate::model::CommandStage::PostBuild
            );

            assert_eq!(ev.model.output_commands.len(), 1);
            assert_eq!(ev.model.output_commands[0].outputs, vec!["gen.c"]);
            assert_eq!(ev.model.output_commands[0].depends, vec!["gen.in"]);
        },
    );
}

#[test]
fn test_dependency_cycle_detected() {
    with_eval(
        "add_library(a STATIC a.c)\n\
         add_library(b STATIC b.c)\n\
         add_dependencies(a b)\n\
         add_dependencies(b a)\n",
        |ev| {
            assert!(!ev.model.validate_dependencies());
            assert!(ev.model.topological_sort().is_empty());
        },
    );
}

#[test]
fn test_directory_directives_apply_to_later_targets() {
    with_eval(
        "add_compile_definitions(GLOBAL_DEF)\n\
         include_directories(common)\n\
         add_library(core STATIC core.c)\n",
        |ev| {
            let core = ev.model.target("core").unwrap();
            assert!(core.definitions.contains(&"GLOBAL_DEF".to_string()));
            assert!(core.include_directories.contains(&"common".to_string()));
        },
    );
}

// =============================================================================
// Variables, scopes, control flow
// =============================================================================

#[test]
fn test_set_and_list_semantics() {
    with_eval(
        "set(X hello)\n\
         set(L a b c)\n\
         set(EMPTY)\n",
        |ev| {
            assert_eq!(var(ev, "X"), "hello");
            assert_eq!(var(ev, "L"), "a;b;c");
            assert!(ev.variable("EMPTY").is_none() || var(ev, "EMPTY").is_empty());
        },
    );
}

#[test]
fn test_variable_interpolation() {
    with_eval(
        "set(NAME world)\n\
         set(GREETING \"hello ${NAME}\")\n\
         set(INDIRECT NAME)\n\
         set(NESTED ${${INDIRECT}})\n\
         set(MISSING \"x${NOT_SET}y\")\n",
        |ev| {
            assert_eq!(var(ev, "GREETING"), "hello world");
            assert_eq!(var(ev, "NESTED"), "world");
            assert_eq!(var(ev, "MISSING"), "xy");
        },
    );
}

#[test]
fn test_list_splitting_of_unquoted_expansion() {
    with_eval(
        "set(L a;b)\n\
         foreach(item ${L})\n\
           set(LAST ${item})\n\
         endforeach()\n\
         set(QUOTED \"${L}\")\n",
        |ev| {
            assert_eq!(var(ev, "LAST"), "b");
            assert_eq!(var(ev, "QUOTED"), "a;b");
        },
    );
}

#[test]
fn test_cache_and_env() {
    with_eval(
        "set(VAR 1 CACHE STRING \"doc\")\n\
         set(VAR 2 CACHE STRING \"doc\")\n\
         set(VAR 3 CACHE STRING \"doc\" FORCE)\n\
         set(ENV{NOBIFY_TEST_ENV_VAR} abc)\n\
         set(FROM_ENV $ENV{NOBIFY_TEST_ENV_VAR})\n\
         unset(ENV{NOBIFY_TEST_ENV_VAR})\n",
        |ev| {
            assert_eq!(ev.model.cache_value("VAR"), Some("3"));
            assert_eq!(var(ev, "FROM_ENV"), "abc");
            assert!(ev.model.env_value("NOBIFY_TEST_ENV_VAR").is_none());
        },
    );
}

#[test]
fn test_if_elseif_else() {
    with_eval(
        "set(MODE two)\n\
         if(MODE STREQUAL one)\n\
           set(R 1)\n\
         elseif(MODE STREQUAL two)\n\
           set(R 2)\n\
         else()\n\
           set(R 3)\n\
         endif()\n",
        |ev| assert_eq!(var(ev, "R"), "2"),
    );
}

#[test]
fn test_while_break_continue() {
    with_eval(
        "set(I 0)\n\
         set(SUM 0)\n\
         while(I LESS 10)\n\
           math(EXPR I \"${I} + 1\")\n\
           if(I EQUAL 3)\n\
             continue()\n\
           endif()\n\
           if(I GREATER 5)\n\
             break()\n\
           endif()\n\
           math(EXPR SUM \"${SUM} + ${I}\")\n\
         endwhile()\n",
        |ev| {
            // 1 + 2 + 4 + 5; 3 skipped, loop breaks at 6.
            assert_eq!(var(ev, "SUM"), "12");
        },
    );
}

#[test]
fn test_foreach_forms() {
    with_eval(
        "set(ACC)\n\
         foreach(i RANGE 3)\n\
           list(APPEND ACC ${i})\n\
         endforeach()\n\
         foreach(i RANGE 2 6 2)\n\
           list(APPEND ACC ${i})\n\
         endforeach()\n\
         set(L x y)\n\
         foreach(i IN LISTS L ITEMS z)\n\
           list(APPEND ACC ${i})\n\
         endforeach()\n",
        |ev| {
            assert_eq!(var(ev, "ACC"), "0;1;2;3;2;4;6;x;y;z");
        },
    );
}

#[test]
fn test_foreach_variable_scoped_to_loop() {
    with_eval(
        "set(i preserved)\n\
         foreach(i RANGE 2)\n\
         endforeach()\n",
        |ev| assert_eq!(var(ev, "i"), "preserved"),
    );
}

#[test]
fn test_function_scope_isolation() {
    with_eval(
        "set(OUTER original)\n\
         function(f)\n\
           set(OUTER changed)\n\
           set(LOCAL inner)\n\
         endfunction()\n\
         f()\n",
        |ev| {
            // No PARENT_SCOPE write: caller-visible state is unchanged.
            assert_eq!(var(ev, "OUTER"), "original");
            assert!(ev.variable("LOCAL").is_none());
        },
    );
}

#[test]
fn test_function_parent_scope_and_args() {
    with_eval(
        "function(f first)\n\
           set(${first} \"got ${ARGC} args, extra: ${ARGN}\" PARENT_SCOPE)\n\
         endfunction()\n\
         f(RESULT a b)\n",
        |ev| {
            assert_eq!(var(ev, "RESULT"), "got 3 args, extra: a;b");
        },
    );
}

#[test]
fn test_macro_runs_in_caller_scope() {
    with_eval(
        "macro(m value)\n\
           set(FROM_MACRO ${value})\n\
         endmacro()\n\
         m(visible)\n",
        |ev| {
            assert_eq!(var(ev, "FROM_MACRO"), "visible");
            // The untouched call binding does not leak into the caller.
            assert!(ev.variable("value").is_none());
        },
    );
}

#[test]
fn test_macro_write_to_parameter_name_persists() {
    with_eval(
        "macro(set_flag name)\n\
           set(name ON)\n\
         endmacro()\n\
         set_flag(x)\n",
        |ev| {
            // Macros push no scope: set() on a bare name that happens to
            // match a parameter is a caller-scope write and survives the
            // call instead of being rolled back with the binding.
            assert_eq!(var(ev, "name"), "ON");
        },
    );
}

#[test]
fn test_macro_unset_of_binding_persists() {
    with_eval(
        "set(ARGN stale)\n\
         macro(m)\n\
           unset(ARGN)\n\
         endmacro()\n\
         m(extra)\n",
        |ev| assert!(ev.variable("ARGN").is_none()),
    );
}

#[test]
fn test_return_ends_function_only() {
    with_eval(
        "function(f)\n\
           set(BEFORE 1 PARENT_SCOPE)\n\
           return()\n\
           set(AFTER 1 PARENT_SCOPE)\n\
         endfunction()\n\
         f()\n\
         set(CONTINUED 1)\n",
        |ev| {
            assert_eq!(var(ev, "BEFORE"), "1");
            assert!(ev.variable("AFTER").is_none());
            assert_eq!(var(ev, "CONTINUED"), "1");
        },
    );
}

// =============================================================================
// math() / string() / list()
// =============================================================================

#[test]
fn test_math_wrap_and_hex_output() {
    with_eval(
        "math(EXPR V \"1 << 65\")\n\
         math(EXPR W \"-1\" OUTPUT_FORMAT HEXADECIMAL)\n",
        |ev| {
            assert_eq!(var(ev, "V"), "2");
            assert_eq!(var(ev, "W"), "0xffffffffffffffff");
        },
    );
}

#[test]
fn test_math_error_is_diagnostic() {
    with_eval("math(EXPR V \"1 / 0\")\n", |ev| {
        assert!(ev.has_errors());
        assert!(ev.variable("V").is_none());
    });
}

#[test]
fn test_string_operations() {
    with_eval(
        "string(TOUPPER hello UP)\n\
         string(REPLACE l L REPL hello)\n\
         string(SUBSTRING hello 1 3 SUB)\n\
         string(FIND hello llo POS)\n\
         string(REGEX MATCH \"l+\" M hello)\n\
         string(REGEX REPLACE \"(h)(e)\" \"\\\\2\\\\1\" SWAPPED hello)\n\
         string(JOIN - J a b c)\n",
        |ev| {
            assert_eq!(var(ev, "UP"), "HELLO");
            assert_eq!(var(ev, "REPL"), "heLLo");
            assert_eq!(var(ev, "SUB"), "ell");
            assert_eq!(var(ev, "POS"), "2");
            assert_eq!(var(ev, "M"), "ll");
            assert_eq!(var(ev, "SWAPPED"), "ehllo");
            assert_eq!(var(ev, "J"), "a-b-c");
        },
    );
}

#[test]
fn test_string_hashes_are_host_independent() {
    with_eval(
        "string(MD5 H1 abc)\n\
         string(SHA256 H2 abc)\n\
         string(SHA3_256 H3 abc)\n",
        |ev| {
            assert_eq!(var(ev, "H1"), "900150983cd24fb0d6963f7d28e17f72");
            assert_eq!(
                var(ev, "H2"),
                "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
            );
            assert_eq!(
                var(ev, "H3"),
                "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
            );
        },
    );
}

#[test]
fn test_list_operations() {
    with_eval(
        "set(L c a b a)\n\
         list(REMOVE_DUPLICATES L)\n\
         list(SORT L)\n\
         list(LENGTH L LEN)\n\
         list(GET L 0 -1 PICKED)\n\
         list(FIND L b POS)\n\
         list(INSERT L 1 z)\n\
         list(REVERSE L)\n\
         list(POP_FRONT L FIRST)\n\
         list(FILTER L EXCLUDE REGEX \"^z$\")\n",
        |ev| {
            assert_eq!(var(ev, "LEN"), "3");
            assert_eq!(var(ev, "PICKED"), "a;c");
            assert_eq!(var(ev, "POS"), "1");
            assert_eq!(var(ev, "FIRST"), "c");
            assert_eq!(var(ev, "L"), "b;a");
        },
    );
}

#[test]
fn test_separate_arguments() {
    with_eval(
        "separate_arguments(OUT UNIX_COMMAND \"gcc -c 'my file.c' -o out\")\n",
        |ev| assert_eq!(var(ev, "OUT"), "gcc;-c;my file.c;-o;out"),
    );
}

// =============================================================================
// Diagnostics & stop behavior
// =============================================================================

#[test]
fn test_unknown_command_classification() {
    with_eval("definitely_not_a_command(x)\n", |ev| {
        let diag = ev
            .diagnostics()
            .iter()
            .find(|d| d.cause.contains("unknown command"))
            .expect("diagnostic for unknown command");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code, super::DiagCode::Unsupported);
        assert_eq!(diag.class, super::ErrorClass::EngineLimitation);
    });
}

#[test]
fn test_fatal_error_stops_evaluation() {
    with_eval(
        "set(BEFORE 1)\n\
         message(FATAL_ERROR \"boom\")\n\
         set(AFTER 1)\n",
        |ev| {
            assert_eq!(var(ev, "BEFORE"), "1");
            assert!(ev.variable("AFTER").is_none());
            assert!(ev.should_stop);
        },
    );
}

#[test]
fn test_continue_on_fatal_error() {
    let options = EvalOptions {
        continue_on_fatal_error: true,
        ..EvalOptions::default()
    };
    with_eval_opts(
        "message(FATAL_ERROR \"boom\")\nset(AFTER 1)\n",
        options,
        |ev| {
            assert_eq!(var(ev, "AFTER"), "1");
            assert!(ev.has_errors());
        },
    );
}

// =============================================================================
// Policies
// =============================================================================

#[test]
fn test_policy_stack() {
    with_eval(
        "cmake_policy(SET CMP0077 NEW)\n\
         cmake_policy(PUSH)\n\
         cmake_policy(SET CMP0077 OLD)\n\
         cmake_policy(GET CMP0077 INNER)\n\
         cmake_policy(POP)\n\
         cmake_policy(GET CMP0077 OUTER)\n",
        |ev| {
            assert_eq!(var(ev, "INNER"), "OLD");
            assert_eq!(var(ev, "OUTER"), "NEW");
        },
    );
}

// =============================================================================
// Probes
// =============================================================================

#[test]
fn test_try_run_cross_compile_simulation() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("source.c"), "int main(void){return 0;}\n").unwrap();
    let source = format!(
        "set(CMAKE_CROSSCOMPILING ON)\n\
         try_run(RUN_RC COMPILE_RC {bin} {src})\n",
        bin = dir.path().display(),
        src = dir.path().join("source.c").display()
    );
    with_eval(&source, |ev| {
        assert_eq!(var(ev, "COMPILE_RC"), "1");
        assert_eq!(var(ev, "RUN_RC"), "FAILED_TO_RUN");
    });
}

#[test]
fn test_check_source_compiles_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_BINARY_DIR {bin})\n\
         check_c_source_compiles(\"int main(void) {{ return 0; }}\" HAVE_OK)\n\
         check_c_source_compiles(\"#error nope\" HAVE_BAD)\n",
        bin = dir.path().display()
    );
    with_eval(&source, |ev| {
        assert_eq!(var(ev, "HAVE_OK"), "1");
        assert_eq!(var(ev, "HAVE_BAD"), "");
        // Results are cached.
        assert!(ev.model.has_cache_entry("HAVE_OK"));
    });
}

#[test]
fn test_check_type_size_fallback_table() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_BINARY_DIR {bin})\n\
         check_type_size(int SIZEOF_INT)\n\
         check_type_size(\"void*\" SIZEOF_PTR)\n",
        bin = dir.path().display()
    );
    with_eval(&source, |ev| {
        assert_eq!(var(ev, "SIZEOF_INT"), "4");
        assert_eq!(var(ev, "SIZEOF_PTR"), "8");
        assert_eq!(var(ev, "HAVE_SIZEOF_INT"), "1");
    });
}

// =============================================================================
// Testing & packaging
// =============================================================================

#[test]
fn test_add_test_modern_and_legacy() {
    with_eval(
        "enable_testing()\n\
         add_test(NAME unit COMMAND runner --fast)\n\
         add_test(legacy runner2 arg)\n\
         set_tests_properties(unit PROPERTIES TIMEOUT 30)\n\
         get_test_property(unit TIMEOUT T)\n",
        |ev| {
            assert!(ev.model.testing_enabled);
            assert_eq!(ev.model.tests.len(), 2);
            assert_eq!(ev.model.tests[0].command, vec!["runner", "--fast"]);
            assert_eq!(var(ev, "T"), "30");
            // Legacy signature warns as WARN_LEGACY.
            assert!(ev.diagnostics().iter().any(|d| {
                d.code == super::DiagCode::WarnLegacy && d.command == "add_test"
            }));
        },
    );
}

#[test]
fn test_install_rules() {
    with_eval(
        "add_executable(app main.c)\n\
         install(TARGETS app DESTINATION bin COMPONENT runtime)\n\
         install(FILES readme.txt DESTINATION share/doc OPTIONAL)\n",
        |ev| {
            assert_eq!(ev.model.install_rules.len(), 2);
            assert_eq!(ev.model.install_rules[0].destination, "bin");
            assert_eq!(
                ev.model.install_rules[0].component.as_deref(),
                Some("runtime")
            );
            assert!(ev.model.install_rules[1].optional);
        },
    );
}

#[test]
fn test_cpack_component_dedup_and_fields() {
    with_eval(
        "include(CPackComponent)\n\
         cpack_add_component(runtime DISPLAY_NAME \"Runtime\" REQUIRED)\n\
         cpack_add_component(runtime DEPENDS core)\n\
         cpack_add_component(core)\n\
         cpack_add_component_group(apps EXPANDED)\n\
         cpack_add_install_type(Full DISPLAY_NAME \"Everything\")\n",
        |ev| {
            assert_eq!(ev.model.cpack.components.len(), 2);
            let runtime = &ev.model.cpack.components[0];
            assert_eq!(runtime.display_name, "Runtime");
            assert!(runtime.required);
            assert_eq!(runtime.depends, vec!["core"]);
            assert!(ev.model.cpack.component_groups[0].expanded);
            assert_eq!(ev.model.cpack.install_types[0].display_name, "Everything");
        },
    );
}

#[test]
fn test_cpack_deb_module_normalization() {
    with_eval(
        "project(MyProj VERSION 3.2.1)\n\
         include(CPackDeb)\n\
         set(CPACK_PACKAGE_NAME \"My Suite\")\n\
         set(CPACK_PACKAGE_DEPENDS libssl;zlib1g)\n\
         set(N \"${CPACK_DEBIAN_PACKAGE_NAME}\")\n\
         set(V \"${CPACK_DEBIAN_PACKAGE_VERSION}\")\n\
         set(A \"${CPACK_DEBIAN_PACKAGE_ARCHITECTURE}\")\n\
         set(D \"${CPACK_DEBIAN_PACKAGE_DEPENDS}\")\n\
         set(F \"${CPACK_DEBIAN_FILE_NAME}\")\n\
         set(E \"${CPACK_DEB_ENABLED}\")\n",
        |ev| {
            assert_eq!(var(ev, "N"), "my-suite");
            assert_eq!(var(ev, "V"), "3.2.1");
            assert_eq!(var(ev, "A"), "amd64");
            assert_eq!(var(ev, "D"), "libssl, zlib1g");
            assert_eq!(var(ev, "F"), "my-suite_3.2.1_amd64.deb");
            assert_eq!(var(ev, "E"), "ON");
            assert_eq!(ev.model.cpack_modules, vec!["deb"]);
        },
    );
}

#[test]
fn test_cpack_archive_defaults_from_project() {
    with_eval(
        "project(Awesome VERSION 1.4.0)\n\
         include(CPackArchive)\n\
         set(G \"${CPACK_ARCHIVE_GENERATORS}\")\n\
         set(F \"${CPACK_PACKAGE_FILE_NAME}\")\n",
        |ev| {
            assert_eq!(var(ev, "G"), "TGZ");
            assert_eq!(var(ev, "F"), "Awesome-1.4.0");
        },
    );
}

// =============================================================================
// CTest script mode
// =============================================================================

#[test]
fn test_ctest_sequence_populates_return_values() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_BINARY_DIR {bin})\n\
         enable_testing()\n\
         add_test(NAME t COMMAND t)\n\
         ctest_start(Nightly TRACK Continuous)\n\
         ctest_configure(RETURN_VALUE CFG)\n\
         ctest_build(RETURN_VALUE BLD NUMBER_ERRORS ERRS)\n\
         ctest_test(RETURN_VALUE TST)\n\
         ctest_coverage(RETURN_VALUE COV)\n\
         ctest_submit(RETURN_VALUE SUB)\n",
        bin = dir.path().display()
    );
    with_eval(&source, |ev| {
        assert_eq!(var(ev, "CTEST_DASHBOARD_MODEL"), "Nightly");
        assert_eq!(var(ev, "CTEST_DASHBOARD_TRACK"), "Continuous");
        assert_eq!(var(ev, "CFG"), "0");
        assert_eq!(var(ev, "CTEST_CONFIGURE_RETURN_VALUE"), "0");
        assert_eq!(var(ev, "BLD"), "0");
        assert_eq!(var(ev, "ERRS"), "0");
        assert_eq!(var(ev, "TST"), "0");
        assert_eq!(var(ev, "CTEST_TESTS_RUN"), "1");
        assert_eq!(var(ev, "COV"), "0");
        assert_eq!(var(ev, "SUB"), "0");
    });

    // The coverage bundle landed with the documented bit-level contents.
    let coverage = dir.path().join("Testing/CoverageInfo");
    let data = fs::read_to_string(coverage.join("data.json")).unwrap();
    assert!(data.contains("\"format\": \"cmk2nob-cdash-gcov-v1\""));
    assert_eq!(fs::read_to_string(coverage.join("Labels.json")).unwrap(), "{}\n");
    let xml = fs::read_to_string(coverage.join("Coverage.xml")).unwrap();
    assert!(xml.starts_with("<Site BuildName=\"cmk2nob\" Name=\"cmk2nob\">"));
}

#[test]
fn test_ctest_step_before_start_is_error() {
    with_eval("ctest_build()\n", |ev| {
        assert!(ev.has_errors());
    });
}

// =============================================================================
// File API & instrumentation
// =============================================================================

#[test]
fn test_cmake_file_api_query_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_BINARY_DIR {bin})\n\
         cmake_file_api(QUERY codemodel 2 cache)\n\
         cmake_file_api(QUERY CLIENT ide toolchains v1)\n",
        bin = dir.path().display()
    );
    with_eval(&source, |ev| assert!(!ev.has_errors()));

    let query = dir.path().join(".cmake/api/v1/query");
    assert_eq!(fs::read(query.join("codemodel-v2.json")).unwrap(), b"");
    assert_eq!(fs::read(query.join("cache-v1.json")).unwrap(), b"");
    assert_eq!(
        fs::read(query.join("client-ide/toolchains-v1.json")).unwrap(),
        b""
    );
}

#[test]
fn test_cmake_instrumentation_json() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_BINARY_DIR {bin})\n\
         cmake_instrumentation(API_VERSION 1 DATA_VERSION 1\n\
           HOOKS postBuild preCMakeBuild QUERIES staticSystemInformation CALLBACK echo)\n",
        bin = dir.path().display()
    );
    with_eval(&source, |ev| {
        assert_eq!(var(ev, "CMAKE_INSTRUMENTATION"), "1");
        assert_eq!(var(ev, "CMAKE_INSTRUMENTATION_API_VERSION"), "1");
        assert_eq!(
            var(ev, "CMAKE_INSTRUMENTATION_HOOKS"),
            "postBuild;preCMakeBuild"
        );
        assert_eq!(var(ev, "CMAKE_INSTRUMENTATION_CALLBACKS"), "echo");
    });

    let json =
        fs::read_to_string(dir.path().join(".cmake/instrumentation/query_1.json")).unwrap();
    assert!(json.contains("\"version\": 1"));
    assert!(json.contains("\"hooks\": [\"postBuild\", \"preCMakeBuild\"]"));
    assert!(json.contains("\"queries\": [\"staticSystemInformation\"]"));
    assert!(json.contains("\"callbacks\": [\"echo\"]"));
}

// =============================================================================
// configure_file & file()
// =============================================================================

#[test]
fn test_configure_file_substitution() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.h.in"),
        "#define NAME \"@PROJECT_NAME@\"\n\
         #cmakedefine HAVE_FEATURE\n\
         #cmakedefine01 FEATURE_FLAG\n\
         #define VALUE ${MY_VALUE}\n",
    )
    .unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_SOURCE_DIR {dir})\n\
         set(CMAKE_CURRENT_BINARY_DIR {dir})\n\
         project(Demo)\n\
         set(HAVE_FEATURE ON)\n\
         set(FEATURE_FLAG OFF)\n\
         set(MY_VALUE 42)\n\
         configure_file(config.h.in config.h)\n",
        dir = dir.path().display()
    );
    with_eval(&source, |ev| assert!(!ev.has_errors()));

    let output = fs::read_to_string(dir.path().join("config.h")).unwrap();
    assert!(output.contains("#define NAME \"Demo\""));
    assert!(output.contains("#define HAVE_FEATURE"));
    assert!(output.contains("#define FEATURE_FLAG 0"));
    assert!(output.contains("#define VALUE 42"));
}

#[test]
fn test_file_write_read_glob_hash() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_SOURCE_DIR {dir})\n\
         set(CMAKE_CURRENT_BINARY_DIR {dir})\n\
         file(WRITE sub/a.c \"int a;\")\n\
         file(WRITE sub/b.c \"int b;\")\n\
         file(WRITE sub/note.txt \"note\")\n\
         file(APPEND sub/note.txt \"!\")\n\
         file(READ sub/note.txt CONTENT)\n\
         file(GLOB SOURCES RELATIVE {dir} sub/*.c)\n\
         file(SIZE sub/a.c SIZE_A)\n\
         file(MD5 sub/note.txt DIGEST)\n",
        dir = dir.path().display()
    );
    with_eval(&source, |ev| {
        assert_eq!(var(ev, "CONTENT"), "note!");
        assert_eq!(var(ev, "SOURCES"), "sub/a.c;sub/b.c");
        assert_eq!(var(ev, "SIZE_A"), "6");
        assert_eq!(var(ev, "DIGEST").len(), 32);
        assert!(!ev.has_errors());
    });
}

#[test]
fn test_file_generate_with_genex_condition() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_BINARY_DIR {dir})\n\
         set(CMAKE_BUILD_TYPE Release CACHE STRING \"\")\n\
         file(GENERATE OUTPUT yes.txt CONTENT \"cfg=$<CONFIG>\" CONDITION $<CONFIG:Release>)\n\
         file(GENERATE OUTPUT no.txt CONTENT x CONDITION $<CONFIG:Debug>)\n",
        dir = dir.path().display()
    );
    with_eval(&source, |ev| assert!(!ev.has_errors()));
    assert_eq!(
        fs::read_to_string(dir.path().join("yes.txt")).unwrap(),
        "cfg=Release"
    );
    assert!(!dir.path().join("no.txt").exists());
}

#[test]
fn test_export_targets_file_contract() {
    let dir = tempfile::tempdir().unwrap();
    let source = format!(
        "set(CMAKE_CURRENT_BINARY_DIR {dir})\n\
         add_library(core STATIC core.c)\n\
         add_library(extra STATIC extra.c)\n\
         export(TARGETS core extra FILE exports.cmake NAMESPACE ns::)\n\
         export(TARGETS core FILE exports.cmake APPEND)\n",
        dir = dir.path().display()
    );
    with_eval(&source, |ev| assert!(!ev.has_errors()));

    let content = fs::read_to_string(dir.path().join("exports.cmake")).unwrap();
    assert!(content.starts_with("# cmk2nob export support\n# signature: targets\n"));
    assert!(content.contains("# namespace: ns::\n"));
    assert!(content.contains("set(_CMK2NOB_EXPORTED_TARGETS core;extra)\n"));
    assert!(content.contains("set(_CMK2NOB_EXPORTED_NAMESPACE \"ns::\")\n"));
    // Appended block follows the first one.
    assert_eq!(content.matches("# cmk2nob export support").count(), 2);
}

// =============================================================================
// Include machinery
// =============================================================================

#[test]
fn test_include_and_guard_in_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    fs::write(
        dir.path().join("guarded.cmake"),
        "include_guard(DIRECTORY)\n\
         math(EXPR GUARD_RUNS \"${GUARD_RUNS} + 1\")\n\
         set(ALREADY 1)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("sub/CMakeLists.txt"),
        "include(${CMAKE_SOURCE_DIR}/guarded.cmake)\n\
         include(${CMAKE_SOURCE_DIR}/guarded.cmake)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("CMakeLists.txt"),
        "set(GUARD_RUNS 0)\n\
         add_subdirectory(sub)\n\
         include(missing_module OPTIONAL RESULT_VARIABLE FOUND)\n",
    )
    .unwrap();

    let effects = FakeExecutor::new();
    let mut ev = Evaluator::new(EvalOptions::default(), &effects);
    ev.evaluate_source_dir(dir.path(), &dir.path().join("build"))
        .unwrap();

    // Guarded file evaluated twice, observable effect happened once.
    assert_eq!(var(&ev, "GUARD_RUNS"), "1");
    assert_eq!(var(&ev, "ALREADY"), "1");
    assert_eq!(var(&ev, "FOUND"), "NOTFOUND");

    // DirPush/DirPop bracket the inner include events.
    let tags: Vec<&str> = ev.events().iter().map(crate::events::Event::tag).collect();
    let first_push = tags.iter().position(|t| *t == "DIR_PUSH").unwrap();
    let last_pop = tags.iter().rposition(|t| *t == "DIR_POP").unwrap();
    assert!(first_push < last_pop);
    assert!(!ev.has_errors());
}

#[test]
fn test_mandatory_include_missing_is_error() {
    with_eval("include(NoSuchModule)\n", |ev| {
        assert!(ev.has_errors());
    });
}

#[test]
fn test_subdirectory_system_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("vendor")).unwrap();
    fs::write(
        dir.path().join("vendor/CMakeLists.txt"),
        "add_library(third STATIC third.c)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("CMakeLists.txt"),
        "add_subdirectory(vendor SYSTEM)\n\
         add_library(mine STATIC mine.c)\n",
    )
    .unwrap();

    let effects = FakeExecutor::new();
    let mut ev = Evaluator::new(EvalOptions::default(), &effects);
    ev.evaluate_source_dir(dir.path(), &dir.path().join("build"))
        .unwrap();

    assert!(ev.model.target("third").unwrap().system);
    assert!(!ev.model.target("mine").unwrap().system);
}

#[test]
fn test_subdirectory_exclude_from_all() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("extras")).unwrap();
    fs::write(
        dir.path().join("extras/CMakeLists.txt"),
        "add_library(extra STATIC extra.c)\n\
         add_custom_target(extra_docs ALL COMMAND gen-docs)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("CMakeLists.txt"),
        "add_subdirectory(extras EXCLUDE_FROM_ALL)\n\
         add_library(mine STATIC mine.c)\n",
    )
    .unwrap();

    let effects = FakeExecutor::new();
    let mut ev = Evaluator::new(EvalOptions::default(), &effects);
    ev.evaluate_source_dir(dir.path(), &dir.path().join("build"))
        .unwrap();

    assert!(ev.model.target("extra").unwrap().exclude_from_all);
    // Even ALL custom targets stay excluded inside an excluded directory.
    assert!(ev.model.target("extra_docs").unwrap().exclude_from_all);
    assert!(!ev.model.target("mine").unwrap().exclude_from_all);
    // The default is scoped to the subdirectory.
    assert!(ev.variable("NOBIFY_SUBDIR_EXCLUDE_DEFAULT").is_none());
}

// =============================================================================
// execute_process
// =============================================================================

#[test]
fn test_execute_process_canned() {
    let effects = FakeExecutor::new();
    effects.push_process_outcome(ProcessOutcome::ok("captured output\n"));
    let mut ev = Evaluator::new(EvalOptions::default(), &effects);
    let list = parse_str(
        "execute_process(COMMAND tool --version\n\
           RESULT_VARIABLE RC OUTPUT_VARIABLE OUT OUTPUT_STRIP_TRAILING_WHITESPACE)\n",
        "CMakeLists.txt",
    )
    .unwrap();
    ev.evaluate_list_file(&list);

    assert_eq!(var(&ev, "RC"), "0");
    assert_eq!(var(&ev, "OUT"), "captured output");
}

// =============================================================================
// set_property / get_property scopes
// =============================================================================

#[test]
fn test_property_scopes() {
    with_eval(
        "add_library(core STATIC core.c)\n\
         set_property(GLOBAL PROPERTY G_KEY g1)\n\
         set_property(GLOBAL APPEND PROPERTY G_KEY g2)\n\
         set_property(TARGET core PROPERTY MY_PROP abc)\n\
         set_property(TARGET core APPEND_STRING PROPERTY MY_PROP def)\n\
         get_property(G GLOBAL PROPERTY G_KEY)\n\
         get_property(T TARGET core PROPERTY MY_PROP)\n\
         get_target_property(T2 core MY_PROP)\n\
         get_target_property(MISSING core NO_SUCH_PROP)\n",
        |ev| {
            assert_eq!(var(ev, "G"), "g1;g2");
            assert_eq!(var(ev, "T"), "abcdef");
            assert_eq!(var(ev, "T2"), "abcdef");
            assert_eq!(var(ev, "MISSING"), "MISSING-NOTFOUND");
        },
    );
}
