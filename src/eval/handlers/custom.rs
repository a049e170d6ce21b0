// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! `add_custom_command` (TARGET and OUTPUT signatures) and
//! `execute_process`.
//!
//! ```text
//! add_custom_command(TARGET t PRE_BUILD|PRE_LINK|POST_BUILD COMMAND...)
//!   -> staged command on the target
//! add_custom_command(OUTPUT o... COMMAND... [APPEND] [DEPFILE] ...)
//!   -> model.output_commands rule (APPEND merges into the first rule
//!      with the same leading output)
//! execute_process(COMMAND ... RESULT_VARIABLE OUTPUT_VARIABLE ...)
//!   -> process effect; commands run in sequence
//! ```

use tracing::debug;

use crate::effects::ProcessRequest;
use crate::eval::{Evaluator, Flow, Invocation};
use crate::events::EventKind;
use crate::model::{CommandStage, CustomCommand, CustomCommandFlags};

/// Parsed argument set shared by `add_custom_command` and
/// `add_custom_target`.
#[derive(Debug, Default)]
pub(crate) struct CustomArgs {
    pub(crate) target: Option<String>,
    pub(crate) outputs: Vec<String>,
    pub(crate) commands: Vec<Vec<String>>,
    pub(crate) stage: CommandStage,
    pub(crate) depends: Vec<String>,
    pub(crate) byproducts: Vec<String>,
    pub(crate) main_dependency: Option<String>,
    pub(crate) depfile: Option<String>,
    pub(crate) implicit_depends: Vec<(String, String)>,
    pub(crate) working_directory: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) job_pool: Option<String>,
    pub(crate) flags: CustomCommandFlags,
    pub(crate) all: bool,
    pub(crate) sources: Vec<String>,
}

impl CustomArgs {
    pub(crate) fn into_custom_command(self) -> CustomCommand {
        CustomCommand {
            outputs: self.outputs,
            commands: self.commands,
            stage: self.stage,
            depends: self.depends,
            byproducts: self.byproducts,
            main_dependency: self.main_dependency,
            depfile: self.depfile,
            implicit_depends: self.implicit_depends,
            working_directory: self.working_directory,
            comment: self.comment,
            job_pool: self.job_pool,
            flags: self.flags,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Collect {
    None,
    Output,
    Command,
    Depends,
    Byproducts,
    ImplicitDepends,
    Sources,
}

/// Hand-rolled walk: repeated `COMMAND` keywords each open a new command
/// line, which the table-driven option parser cannot express.
#[allow(clippy::too_many_lines)]
pub(crate) fn parse_custom_args(values: &[String]) -> Result<CustomArgs, String> {
    let mut parsed = CustomArgs::default();
    let mut collect = Collect::None;
    let mut pending_single: Option<&'static str> = None;

    for value in values {
        if let Some(keyword) = pending_single.take() {
            match keyword {
                "MAIN_DEPENDENCY" => parsed.main_dependency = Some(value.clone()),
                "DEPFILE" => parsed.depfile = Some(value.clone()),
                "WORKING_DIRECTORY" => parsed.working_directory = Some(value.clone()),
                "COMMENT" => parsed.comment = Some(value.clone()),
                "JOB_POOL" => parsed.job_pool = Some(value.clone()),
                "TARGET" => parsed.target = Some(value.clone()),
                _ => {}
            }
            continue;
        }

        match value.as_str() {
            "OUTPUT" => collect = Collect::Output,
            "COMMAND" => {
                parsed.commands.push(Vec::new());
                collect = Collect::Command;
            }
            "DEPENDS" => collect = Collect::Depends,
            "BYPRODUCTS" => collect = Collect::Byproducts,
            "IMPLICIT_DEPENDS" => collect = Collect::ImplicitDepends,
            "SOURCES" => collect = Collect::Sources,
            "MAIN_DEPENDENCY" | "DEPFILE" | "WORKING_DIRECTORY" | "COMMENT" | "JOB_POOL"
            | "TARGET" => {
                pending_single = Some(match value.as_str() {
                    "MAIN_DEPENDENCY" => "MAIN_DEPENDENCY",
                    "DEPFILE" => "DEPFILE",
                    "WORKING_DIRECTORY" => "WORKING_DIRECTORY",
                    "COMMENT" => "COMMENT",
                    "JOB_POOL" => "JOB_POOL",
                    _ => "TARGET",
                });
                collect = Collect::None;
            }
            "PRE_BUILD" => parsed.stage = CommandStage::PreBuild,
            "PRE_LINK" => parsed.stage = CommandStage::PreLink,
            "POST_BUILD" => parsed.stage = CommandStage::PostBuild,
            "VERBATIM" => parsed.flags |= CustomCommandFlags::VERBATIM,
            "APPEND" => parsed.flags |= CustomCommandFlags::APPEND,
            "USES_TERMINAL" => parsed.flags |= CustomCommandFlags::USES_TERMINAL,
            "COMMAND_EXPAND_LISTS" => parsed.flags |= CustomCommandFlags::COMMAND_EXPAND_LISTS,
            "DEPENDS_EXPLICIT_ONLY" => parsed.flags |= CustomCommandFlags::DEPENDS_EXPLICIT_ONLY,
            "CODEGEN" => parsed.flags |= CustomCommandFlags::CODEGEN,
            "JOB_SERVER_AWARE" => parsed.flags |= CustomCommandFlags::JOB_SERVER_AWARE,
            "ALL" => parsed.all = true,
            _ => match collect {
                Collect::Output => parsed.outputs.push(value.clone()),
                Collect::Command => {
                    if let Some(last) = parsed.commands.last_mut() {
                        last.push(value.clone());
                    }
                }
                Collect::Depends => parsed.depends.push(value.clone()),
                Collect::Byproducts => parsed.byproducts.push(value.clone()),
                Collect::ImplicitDepends => {
                    // Pairs of <lang> <file>.
                    match parsed.implicit_depends.last_mut() {
                        Some(pair) if pair.1.is_empty() => pair.1 = value.clone(),
                        _ => parsed.implicit_depends.push((value.clone(), String::new())),
                    }
                }
                Collect::Sources => parsed.sources.push(value.clone()),
                Collect::None => {
                    return Err(format!("unexpected argument '{value}'"));
                }
            },
        }
    }

    if let Some(keyword) = pending_single {
        return Err(format!("missing value after {keyword}"));
    }
    parsed.commands.retain(|command| !command.is_empty());
    Ok(parsed)
}

/// `add_custom_command(...)` - both signatures.
pub(crate) fn cmd_add_custom_command(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let parsed = match parse_custom_args(&values) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("add_custom_command", message);
            return Flow::Normal;
        }
    };

    if let Some(target_name) = parsed.target.clone() {
        if !parsed.outputs.is_empty() {
            ev.error(
                "add_custom_command",
                "TARGET and OUTPUT signatures are mutually exclusive",
            );
            return Flow::Normal;
        }
        let Some(idx) = ev.model.find_target_index(&target_name) else {
            ev.error(
                "add_custom_command",
                format!("no target named '{target_name}'"),
            );
            return Flow::Normal;
        };
        let command = parsed.into_custom_command();
        let stage = command.stage;
        ev.model.targets[idx].staged_commands.push(command);
        ev.emit(EventKind::CustomCommandTarget {
            target: target_name,
            stage,
        });
        return Flow::Normal;
    }

    if parsed.outputs.is_empty() {
        ev.error(
            "add_custom_command",
            "either TARGET or OUTPUT must be given",
        );
        return Flow::Normal;
    }

    if parsed.flags.contains(CustomCommandFlags::APPEND) {
        let first = parsed.outputs[0].clone();
        if let Some(existing) = ev
            .model
            .output_commands
            .iter_mut()
            .find(|command| command.outputs.first() == Some(&first))
        {
            existing.commands.extend(parsed.commands);
            existing.depends.extend(parsed.depends);
            existing.byproducts.extend(parsed.byproducts);
            return Flow::Normal;
        }
        ev.error(
            "add_custom_command",
            format!("APPEND given but no existing rule produces '{first}'"),
        );
        return Flow::Normal;
    }

    let outputs = parsed.outputs.clone();
    debug!(outputs = ?outputs, "output custom command");
    ev.model.output_commands.push(parsed.into_custom_command());
    ev.emit(EventKind::CustomCommandOutput { outputs });
    Flow::Normal
}

/// `execute_process(COMMAND <argv>... [COMMAND ...] [options])`.
pub(crate) fn cmd_execute_process(ev: &mut Evaluator<'_>, inv: &Invocation) -> Flow {
    let values = inv.values();
    let parsed = match parse_execute_args(&values) {
        Ok(parsed) => parsed,
        Err(message) => {
            ev.error("execute_process", message);
            return Flow::Normal;
        }
    };
    if parsed.commands.is_empty() {
        ev.error("execute_process", "requires at least one COMMAND");
        return Flow::Normal;
    }

    let mut last_exit = 0;
    let mut stdout = String::new();
    let mut stderr = String::new();
    for argv in &parsed.commands {
        let mut request = ProcessRequest::new(argv.clone());
        request.working_dir = parsed.working_directory.clone().map(Into::into);
        request.timeout_ms = parsed.timeout_ms;
        let outcome = ev.effects.run_process(&request);
        last_exit = outcome.exit_code;
        stdout.push_str(&outcome.stdout);
        stderr.push_str(&outcome.stderr);
        if outcome.timed_out {
            break;
        }
    }

    if let Some(variable) = &parsed.result_variable {
        ev.set_variable(variable, &last_exit.to_string());
    }
    if let Some(variable) = &parsed.output_variable {
        let mut text = stdout.clone();
        if parsed.strip_output {
            text.truncate(text.trim_end().len());
        }
        ev.set_variable(variable, &text);
    }
    if let Some(variable) = &parsed.error_variable {
        let mut text = stderr;
        if parsed.strip_error {
            text.truncate(text.trim_end().len());
        }
        ev.set_variable(variable, &text);
    }
    Flow::Normal
}

#[derive(Debug, Default)]
struct ExecuteArgs {
    commands: Vec<Vec<String>>,
    working_directory: Option<String>,
    timeout_ms: u64,
    result_variable: Option<String>,
    output_variable: Option<String>,
    error_variable: Option<String>,
    strip_output: bool,
    strip_error: bool,
}

fn parse_execute_args(values: &[String]) -> Result<ExecuteArgs, String> {
    let mut parsed = ExecuteArgs::default();
    let mut pending: Option<&'static str> = None;
    let mut in_command = false;

    for value in values {
        if let Some(keyword) = pending.take() {
            match keyword {
                "WORKING_DIRECTORY" => parsed.working_directory = Some(value.clone()),
                "TIMEOUT" => {
                    let seconds: f64 = value
                        .parse()
                        .map_err(|_| format!("invalid TIMEOUT '{value}'"))?;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    {
                        parsed.timeout_ms = (seconds * 1000.0) as u64;
                    }
                }
                "RESULT_VARIABLE" => parsed.result_variable = Some(value.clone()),
                "OUTPUT_VARIABLE" => parsed.output_variable = Some(value.clone()),
                "ERROR_VARIABLE" => parsed.error_variable = Some(value.clone()),
                _ => {}
            }
            in_command = false;
            continue;
        }
        match value.as_str() {
            "COMMAND" => {
                parsed.commands.push(Vec::new());
                in_command = true;
            }
            "WORKING_DIRECTORY" | "TIMEOUT" | "RESULT_VARIABLE" | "OUTPUT_VARIABLE"
            | "ERROR_VARIABLE" | "COMMAND_ECHO" => {
                pending = Some(match value.as_str() {
                    "WORKING_DIRECTORY" => "WORKING_DIRECTORY",
                    "TIMEOUT" => "TIMEOUT",
                    "RESULT_VARIABLE" => "RESULT_VARIABLE",
                    "OUTPUT_VARIABLE" => "OUTPUT_VARIABLE",
                    "ERROR_VARIABLE" => "ERROR_VARIABLE",
                    _ => "COMMAND_ECHO",
                });
                in_command = false;
            }
            "OUTPUT_QUIET" => {
                parsed.output_variable = None;
                in_command = false;
            }
            "ERROR_QUIET" => {
                parsed.error_variable = None;
                in_command = false;
            }
            "OUTPUT_STRIP_TRAILING_WHITESPACE" => {
                parsed.strip_output = true;
                in_command = false;
            }
            "ERROR_STRIP_TRAILING_WHITESPACE" => {
                parsed.strip_error = true;
                in_command = false;
            }
            "ECHO_OUTPUT_VARIABLE" | "ECHO_ERROR_VARIABLE" => {
                in_command = false;
            }
            _ if in_command => {
                if let Some(last) = parsed.commands.last_mut() {
                    last.push(value.clone());
                }
            }
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }
    if let Some(keyword) = pending {
        return Err(format!("missing value after {keyword}"));
    }
    parsed.commands.retain(|command| !command.is_empty());
    Ok(parsed)
}
