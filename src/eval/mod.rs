// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Script evaluator core.
//!
//! ```text
//! Evaluator::new(options, effects)
//!     .evaluate_source_dir(src, bin)
//!        |
//!   exec_node:  Command | If | While | Foreach | Def
//!        |
//!   dispatch:  built-in table -> handlers::dispatch
//!              user functions (new scope) / macros (caller scope)
//!              unknown -> WARNING diagnostic
//!        |
//!   outputs:  Event stream + BuildModel + Diagnostics
//!
//! scopes:   Vec<BTreeMap>; PARENT_SCOPE writes len-2
//! policies: stack of {id -> OLD|NEW} frames
//! locks:    released when their owning file/function scope exits
//! stop:     first FATAL sets should_stop (unless continue_on_fatal)
//! ```

pub mod diag;
pub mod expand;
pub mod handlers;
pub mod include;
pub mod opt;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, error, trace, warn};

use crate::config::Config;
use crate::effects::EffectExecutor;
use crate::error::Result;
use crate::events::{Event, EventKind};
use crate::expr::logic::{self, CondToken, LogicHost};
use crate::genex::{self, GenexContext};
use crate::model::BuildModel;
use crate::parser::ast::{Command, DefKind, IfBranch, ListFile, Node, Origin, Token};

pub use diag::{DiagCode, Diagnostic, ErrorClass, Severity};
pub use expand::{Arg, VarSource};

/// Control-flow signal bubbling out of node execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going.
    Normal,
    /// `break()`: exit the enclosing loop.
    Break,
    /// `continue()`: restart the enclosing loop.
    Continue,
    /// `return()`: end the enclosing function/file.
    Return,
}

/// Evaluator options distilled from [`Config`] and the environment.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Record FATAL diagnostics but keep evaluating.
    pub continue_on_fatal_error: bool,
    /// Probe handlers invoke the real toolchain.
    pub real_probes: bool,
    /// Configuration when `CMAKE_BUILD_TYPE` is unset.
    pub default_configuration: String,
    /// Genex recursion bound.
    pub max_genex_depth: usize,
    /// Genex TARGET_PROPERTY stack bound.
    pub max_genex_property_depth: usize,
    /// Include/subdirectory nesting bound.
    pub max_file_depth: usize,
    /// Probe timeout.
    pub probe_timeout_ms: u64,
    /// C compiler driver for probes; empty selects `$CC`/`cc`.
    pub c_compiler: String,
    /// Emulated CMake installation root (`<root>/Modules`).
    pub cmake_root: PathBuf,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EvalOptions {
    /// Derives options from the loaded configuration plus the
    /// `NOBIFY_REAL_PROBES` environment toggle.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let env_real_probes = std::env::var("NOBIFY_REAL_PROBES")
            .map(|v| !logic::is_false_constant(&v))
            .unwrap_or(false);
        Self {
            continue_on_fatal_error: config.evaluator.continue_on_fatal_error,
            real_probes: config.probes.real_probes || env_real_probes,
            default_configuration: config.evaluator.default_configuration.to_string(),
            max_genex_depth: config.evaluator.max_genex_depth,
            max_genex_property_depth: config.evaluator.max_genex_property_depth,
            max_file_depth: config.evaluator.max_file_depth,
            probe_timeout_ms: config.probes.timeout_ms,
            c_compiler: config.probes.c_compiler.to_string_lossy().into_owned(),
            cmake_root: config.paths.cmake_root.clone(),
        }
    }
}

/// A user-defined function or macro.
#[derive(Debug, Clone)]
pub(crate) struct UserDef {
    pub(crate) kind: DefKind,
    pub(crate) params: Vec<String>,
    pub(crate) body: Vec<Node>,
}

/// Policy setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySetting {
    /// Old behavior requested.
    Old,
    /// New behavior requested.
    New,
}

/// `file(LOCK)` guard scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockGuard {
    /// Held until context teardown.
    Process,
    /// Released when the owning file scope exits.
    File,
    /// Released when the owning function scope exits.
    Function,
}

/// One tracked file lock.
pub(crate) struct FileLock {
    pub(crate) path: String,
    pub(crate) handle: Option<std::fs::File>,
    pub(crate) guard: LockGuard,
    pub(crate) owner_file_depth: usize,
    pub(crate) owner_function_depth: usize,
}

/// Directory-scoped directive state (`add_compile_options`,
/// `include_directories`, ...). Applied to targets declared afterwards
/// in the same directory; saved/restored around `add_subdirectory`.
#[derive(Debug, Clone, Default)]
pub struct DirectiveState {
    /// `add_compile_options`.
    pub compile_options: Vec<String>,
    /// `add_compile_definitions` / `add_definitions`.
    pub compile_definitions: Vec<String>,
    /// `add_link_options`.
    pub link_options: Vec<String>,
    /// `include_directories`.
    pub include_directories: Vec<String>,
    /// `link_directories`.
    pub link_directories: Vec<String>,
    /// `link_libraries`.
    pub link_libraries: Vec<String>,
}

/// One dispatched command with expanded arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Command name as written.
    pub name: String,
    /// Source location.
    pub origin: Origin,
    /// Expanded arguments.
    pub args: Vec<Arg>,
}

impl Invocation {
    /// Argument values, quoting dropped.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.args.iter().map(|a| a.value.clone()).collect()
    }

    /// Value at `index`, or `""`.
    #[must_use]
    pub fn value(&self, index: usize) -> &str {
        self.args.get(index).map_or("", |a| a.value.as_str())
    }
}

/// The script evaluator. One instance per evaluation run.
pub struct Evaluator<'e> {
    pub(crate) options: EvalOptions,
    pub(crate) effects: &'e dyn EffectExecutor,
    /// Build model assembled during evaluation.
    pub model: BuildModel,
    pub(crate) events: Vec<Event>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) scopes: Vec<BTreeMap<String, String>>,
    pub(crate) policy_stack: Vec<BTreeMap<String, PolicySetting>>,
    pub(crate) defs: BTreeMap<String, UserDef>,
    pub(crate) include_guards: BTreeSet<String>,
    pub(crate) locks: Vec<FileLock>,
    pub(crate) file_depth: usize,
    pub(crate) function_depth: usize,
    pub(crate) loop_depth: usize,
    pub(crate) should_stop: bool,
    pub(crate) current_origin: Origin,
    pub(crate) dir_state: DirectiveState,
    pub(crate) directory_properties: BTreeMap<String, String>,
    pub(crate) global_properties: BTreeMap<String, String>,
    pub(crate) source_properties: BTreeMap<String, BTreeMap<String, String>>,
    pub(crate) ctest_state: handlers::ctest::CtestState,
    pub(crate) instrumentation_queries: usize,
}

impl<'e> Evaluator<'e> {
    /// Creates a fresh evaluation context.
    #[must_use]
    pub fn new(options: EvalOptions, effects: &'e dyn EffectExecutor) -> Self {
        let mut model = BuildModel::new();
        model.default_configuration = options.default_configuration.clone();
        let mut evaluator = Self {
            options,
            effects,
            model,
            events: Vec::new(),
            diagnostics: Vec::new(),
            scopes: vec![BTreeMap::new()],
            policy_stack: vec![BTreeMap::new()],
            defs: BTreeMap::new(),
            include_guards: BTreeSet::new(),
            locks: Vec::new(),
            file_depth: 0,
            function_depth: 0,
            loop_depth: 0,
            should_stop: false,
            current_origin: Origin::default(),
            dir_state: DirectiveState::default(),
            directory_properties: BTreeMap::new(),
            global_properties: BTreeMap::new(),
            source_properties: BTreeMap::new(),
            ctest_state: handlers::ctest::CtestState::default(),
            instrumentation_queries: 0,
        };
        evaluator.seed_builtin_variables();
        evaluator
    }

    fn seed_builtin_variables(&mut self) {
        let platform = self.model.platform;
        if platform.is_windows {
            self.set_variable("WIN32", "1");
        }
        if platform.is_unix {
            self.set_variable("UNIX", "1");
        }
        if platform.is_apple {
            self.set_variable("APPLE", "1");
        }
        if platform.is_linux {
            self.set_variable("LINUX", "1");
        }
        self.set_variable("CMAKE_VERSION", "3.30.0");
        self.set_variable("CMAKE_C_COMPILER_ID", "GNU");
        let root = self.options.cmake_root.to_string_lossy().into_owned();
        if !root.is_empty() {
            self.set_variable("CMAKE_ROOT", &root);
        }
    }

    // --- variables ---

    /// Innermost-scope-first variable lookup.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<String> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        None
    }

    /// Writes into the innermost scope.
    pub fn set_variable(&mut self, name: &str, value: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value.to_string());
        }
    }

    /// Writes into the enclosing scope (`PARENT_SCOPE`).
    pub fn set_variable_parent(&mut self, name: &str, value: &str) {
        let len = self.scopes.len();
        if len >= 2 {
            self.scopes[len - 2].insert(name.to_string(), value.to_string());
        } else if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value.to_string());
        }
    }

    /// Removes from the innermost scope.
    pub fn unset_variable(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.remove(name);
        }
    }

    /// Removes from the enclosing scope.
    pub fn unset_variable_parent(&mut self, name: &str) {
        let len = self.scopes.len();
        if len >= 2 {
            self.scopes[len - 2].remove(name);
        }
    }

    // --- events & diagnostics ---

    /// Emits an event at the current command origin.
    pub fn emit(&mut self, kind: EventKind) {
        let event = Event::new(self.current_origin.clone(), kind);
        trace!(tag = event.tag(), origin = %event.origin, "event");
        self.events.push(event);
    }

    /// Pushes a diagnostic; FATAL sets `should_stop` unless the context
    /// opted into `continue_on_fatal_error`.
    pub fn diag(
        &mut self,
        severity: Severity,
        component: &str,
        command: &str,
        cause: impl Into<String>,
        detail: impl Into<String>,
    ) {
        let diagnostic = Diagnostic::new(
            severity,
            component,
            command,
            self.current_origin.clone(),
            cause,
            detail,
        );
        match severity {
            Severity::Warning => warn!(%diagnostic, "diagnostic"),
            _ => error!(%diagnostic, "diagnostic"),
        }
        if severity == Severity::Fatal && !self.options.continue_on_fatal_error {
            self.should_stop = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Shorthand for a handler-level ERROR on the current command.
    pub fn error(&mut self, command: &str, cause: impl Into<String>) {
        self.diag(Severity::Error, "evaluator", command, cause, "");
    }

    /// Accumulated events.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Accumulated diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when any diagnostic of severity >= ERROR was pushed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Error)
    }

    /// Consumes the evaluator, returning the model, events and
    /// diagnostics for the codegen consumer.
    #[must_use]
    pub fn into_parts(self) -> (BuildModel, Vec<Event>, Vec<Diagnostic>) {
        (self.model, self.events, self.diagnostics)
    }

    // --- policies ---

    /// Pushes a policy frame.
    pub fn push_policy_scope(&mut self) {
        self.policy_stack.push(BTreeMap::new());
    }

    /// Pops a policy frame; the outermost frame stays.
    pub fn pop_policy_scope(&mut self) -> bool {
        if self.policy_stack.len() > 1 {
            self.policy_stack.pop();
            return true;
        }
        false
    }

    /// Sets a policy in the innermost frame.
    pub fn set_policy(&mut self, id: &str, setting: PolicySetting) {
        if let Some(frame) = self.policy_stack.last_mut() {
            frame.insert(id.to_ascii_uppercase(), setting);
        }
    }

    /// Innermost-frame-first policy lookup; `None` when unset.
    #[must_use]
    pub fn policy(&self, id: &str) -> Option<PolicySetting> {
        let key = id.to_ascii_uppercase();
        for frame in self.policy_stack.iter().rev() {
            if let Some(setting) = frame.get(&key) {
                return Some(*setting);
            }
        }
        None
    }

    // --- file locks ---

    /// Tracks an acquired lock.
    pub(crate) fn track_lock(&mut self, lock: FileLock) {
        self.locks.push(lock);
    }

    /// Releases a lock by path, if held.
    pub(crate) fn release_lock(&mut self, path: &str) -> bool {
        let before = self.locks.len();
        self.locks.retain(|lock| lock.path != path);
        before != self.locks.len()
    }

    /// Releases locks whose owning scope has exited.
    fn release_scoped_locks(&mut self) {
        let file_depth = self.file_depth;
        let function_depth = self.function_depth;
        self.locks.retain(|lock| match lock.guard {
            LockGuard::Process => true,
            LockGuard::File => lock.owner_file_depth <= file_depth,
            LockGuard::Function => lock.owner_function_depth <= function_depth,
        });
    }

    // --- expansion ---

    /// Expands one raw token.
    #[must_use]
    pub fn expand_token(&self, token: &Token) -> Vec<Arg> {
        expand::expand_token(self, token)
    }

    /// Expands every token of a command into arguments.
    #[must_use]
    pub fn expand_args(&self, command: &Command) -> Vec<Arg> {
        command
            .args
            .iter()
            .flat_map(|token| self.expand_token(token))
            .collect()
    }

    /// Evaluates generator expressions in `value` against the model.
    /// Errors are demoted to one warning per distinct message and leave
    /// the input unchanged.
    pub fn eval_genex(&mut self, value: &str, current_target: &str) -> String {
        if !genex::contains_genex(value) {
            return value.to_string();
        }
        let config = self.model.active_configuration().to_string();
        let result = {
            let mut ctx = GenexContext::new(&self.model, &config, self.model.platform.platform_id());
            ctx.current_target = current_target;
            ctx.max_depth = self.options.max_genex_depth;
            ctx.max_property_depth = self.options.max_genex_property_depth;
            genex::eval(&ctx, value)
        };
        match result {
            Ok(evaluated) => evaluated,
            Err(e) => {
                let message = e.to_string();
                if self.model.genex_warn_cache.insert(message.clone()) {
                    self.diag(
                        Severity::Warning,
                        "genex",
                        "",
                        message,
                        value.to_string(),
                    );
                }
                value.to_string()
            }
        }
    }

    // --- evaluation ---

    /// Evaluates a project rooted at `source_dir` into the model.
    ///
    /// # Errors
    ///
    /// Returns an error when the root `CMakeLists.txt` cannot be read or
    /// parsed. Script-level problems surface as diagnostics instead.
    pub fn evaluate_source_dir(&mut self, source_dir: &Path, binary_dir: &Path) -> Result<()> {
        let source = source_dir.to_string_lossy().replace('\\', "/");
        let binary = binary_dir.to_string_lossy().replace('\\', "/");
        self.set_variable("CMAKE_SOURCE_DIR", &source);
        self.set_variable("CMAKE_BINARY_DIR", &binary);
        self.set_variable("CMAKE_CURRENT_SOURCE_DIR", &source);
        self.set_variable("CMAKE_CURRENT_BINARY_DIR", &binary);
        self.model.build_dir = binary;

        let list_path = source_dir.join("CMakeLists.txt");
        let list = crate::parser::parse_file(&list_path)?;
        self.evaluate_list_file(&list);
        self.release_scoped_locks();
        Ok(())
    }

    /// Evaluates one parsed list file in the current scope.
    pub fn evaluate_list_file(&mut self, list: &ListFile) {
        let file = list.file.replace('\\', "/");
        let dir = Path::new(&file)
            .parent()
            .map_or_else(|| ".".to_string(), |p| p.to_string_lossy().replace('\\', "/"));
        self.set_variable("CMAKE_CURRENT_LIST_FILE", &file);
        self.set_variable("CMAKE_CURRENT_LIST_DIR", &dir);

        debug!(file = %file, "evaluating list file");
        self.exec_nodes(&list.nodes);
    }

    /// Executes a node sequence until a flow signal or `should_stop`.
    pub(crate) fn exec_nodes(&mut self, nodes: &[Node]) -> Flow {
        for node in nodes {
            if self.should_stop {
                return Flow::Normal;
            }
            match self.exec_node(node) {
                Flow::Normal => {}
                flow => return flow,
            }
        }
        Flow::Normal
    }

    fn exec_node(&mut self, node: &Node) -> Flow {
        match node {
            Node::Command(command) => self.dispatch(command),
            Node::If { branches, .. } => self.exec_if(branches),
            Node::While { condition, body } => self.exec_while(condition, body),
            Node::Foreach { header, body } => self.exec_foreach(header, body),
            Node::Def { kind, header, body } => {
                self.register_def(*kind, header, body);
                Flow::Normal
            }
        }
    }

    /// Evaluates a condition command's tokens through the logic language.
    pub(crate) fn eval_condition(&mut self, command: &Command) -> bool {
        self.current_origin = command.origin.clone();
        let tokens: Vec<CondToken> = command
            .args
            .iter()
            .flat_map(|token| self.expand_token(token))
            .map(|arg| CondToken {
                text: arg.value,
                quoted: arg.quoted,
            })
            .collect();
        match logic::eval_condition(&tokens, self) {
            Ok(result) => result,
            Err(message) => {
                self.error(&command.name.to_ascii_lowercase(), message);
                false
            }
        }
    }

    fn exec_if(&mut self, branches: &[IfBranch]) -> Flow {
        for branch in branches {
            let selected = match &branch.condition {
                Some(condition) => self.eval_condition(condition),
                None => true,
            };
            if selected {
                return self.exec_nodes(&branch.body);
            }
            if self.should_stop {
                return Flow::Normal;
            }
        }
        Flow::Normal
    }

    fn exec_while(&mut self, condition: &Command, body: &[Node]) -> Flow {
        self.loop_depth += 1;
        let flow = loop {
            if self.should_stop {
                break Flow::Normal;
            }
            if !self.eval_condition(condition) {
                break Flow::Normal;
            }
            match self.exec_nodes(body) {
                Flow::Normal | Flow::Continue => {}
                Flow::Break => break Flow::Normal,
                Flow::Return => break Flow::Return,
            }
        };
        self.loop_depth -= 1;
        flow
    }

    fn exec_foreach(&mut self, header: &Command, body: &[Node]) -> Flow {
        self.current_origin = header.origin.clone();
        let args = self.expand_args(header);
        let values: Vec<String> = args.into_iter().map(|a| a.value).collect();
        let Some((loop_var, spec)) = values.split_first() else {
            self.error("foreach", "missing loop variable");
            return Flow::Normal;
        };

        let items = match self.foreach_items(spec) {
            Ok(items) => items,
            Err(message) => {
                self.error("foreach", message);
                return Flow::Normal;
            }
        };

        // The iteration variable is scoped to the loop.
        let saved = self.variable(loop_var);
        self.loop_depth += 1;
        let mut flow = Flow::Normal;
        for item in items {
            if self.should_stop {
                break;
            }
            self.set_variable(loop_var, &item);
            match self.exec_nodes(body) {
                Flow::Normal | Flow::Continue => {}
                Flow::Break => break,
                Flow::Return => {
                    flow = Flow::Return;
                    break;
                }
            }
        }
        self.loop_depth -= 1;
        match saved {
            Some(value) => self.set_variable(loop_var, &value),
            None => self.unset_variable(loop_var),
        }
        flow
    }

    fn foreach_items(&self, spec: &[String]) -> std::result::Result<Vec<String>, String> {
        match spec.first().map(String::as_str) {
            Some("RANGE") => {
                let numbers: Vec<i64> = spec[1..]
                    .iter()
                    .map(|s| s.parse::<i64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| "RANGE arguments must be integers".to_string())?;
                let (start, stop, step) = match numbers.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => return Err("RANGE expects 1 to 3 arguments".to_string()),
                };
                if step <= 0 {
                    return Err("RANGE step must be positive".to_string());
                }
                if stop < start {
                    return Err("RANGE stop must not be less than start".to_string());
                }
                let mut items = Vec::new();
                let mut value = start;
                while value <= stop {
                    items.push(value.to_string());
                    value += step;
                }
                Ok(items)
            }
            Some("IN") => {
                let mut items = Vec::new();
                let mut mode = "";
                for token in &spec[1..] {
                    match token.as_str() {
                        "ITEMS" | "LISTS" => mode = token.as_str(),
                        _ => match mode {
                            "ITEMS" => items.push(token.clone()),
                            "LISTS" => {
                                let list = self.variable(token).unwrap_or_default();
                                items.extend(
                                    list.split(';')
                                        .filter(|s| !s.is_empty())
                                        .map(str::to_string),
                                );
                            }
                            _ => {
                                return Err(format!(
                                    "expected ITEMS or LISTS before '{token}'"
                                ));
                            }
                        },
                    }
                }
                Ok(items)
            }
            _ => Ok(spec.to_vec()),
        }
    }

    fn register_def(&mut self, kind: DefKind, header: &Command, body: &[Node]) {
        self.current_origin = header.origin.clone();
        let args = self.expand_args(header);
        let values: Vec<String> = args.into_iter().map(|a| a.value).collect();
        let Some((name, params)) = values.split_first() else {
            let command = match kind {
                DefKind::Function => "function",
                DefKind::Macro => "macro",
            };
            self.error(command, "missing name");
            return;
        };
        debug!(name = %name, kind = ?kind, "registering definition");
        self.defs.insert(
            name.to_ascii_lowercase(),
            UserDef {
                kind,
                params: params.to_vec(),
                body: body.to_vec(),
            },
        );
    }

    /// Dispatches one command: built-ins, then user definitions, then the
    /// unknown-command diagnostic.
    pub(crate) fn dispatch(&mut self, command: &Command) -> Flow {
        if self.should_stop {
            return Flow::Normal;
        }
        self.current_origin = command.origin.clone();
        let name = command.name.to_ascii_lowercase();

        match name.as_str() {
            "return" => return Flow::Return,
            "break" => {
                if self.loop_depth == 0 {
                    self.error("break", "break() outside of a loop");
                    return Flow::Normal;
                }
                return Flow::Break;
            }
            "continue" => {
                if self.loop_depth == 0 {
                    self.error("continue", "continue() outside of a loop");
                    return Flow::Normal;
                }
                return Flow::Continue;
            }
            _ => {}
        }

        let invocation = Invocation {
            name: name.clone(),
            origin: command.origin.clone(),
            args: self.expand_args(command),
        };

        if let Some(flow) = handlers::dispatch(self, &invocation) {
            return flow;
        }

        if self.defs.contains_key(&name) {
            return self.call_user_def(&name, &invocation);
        }

        self.diag(
            Severity::Warning,
            "evaluator",
            &name,
            crate::error::EvalError::UnknownCommand(name.clone()).to_string(),
            "command is neither a built-in nor a user definition",
        );
        Flow::Normal
    }

    fn call_user_def(&mut self, name: &str, invocation: &Invocation) -> Flow {
        let Some(def) = self.defs.get(name).cloned() else {
            return Flow::Normal;
        };
        let values = invocation.values();
        match def.kind {
            DefKind::Function => self.call_function(&def, &values),
            DefKind::Macro => self.call_macro(&def, &values),
        }
    }

    fn call_function(&mut self, def: &UserDef, values: &[String]) -> Flow {
        self.scopes.push(BTreeMap::new());
        self.function_depth += 1;
        self.bind_call_arguments(def, values);

        let flow = self.exec_nodes(&def.body);

        self.function_depth -= 1;
        self.release_scoped_locks();
        self.scopes.pop();
        // return() ends the call; it does not propagate further.
        match flow {
            Flow::Return | Flow::Normal => Flow::Normal,
            other => other,
        }
    }

    fn call_macro(&mut self, def: &UserDef, values: &[String]) -> Flow {
        // Macros run in the caller's scope. The injected call bindings
        // (params, ARGC/ARGV/ARGN/ARGV<n>) are scratch and are rolled
        // back afterwards, but only while the body left them untouched:
        // a set()/unset() in the body targeting one of these names is a
        // legitimate caller-scope write and must persist.
        let mut bind_names = vec![
            "ARGC".to_string(),
            "ARGV".to_string(),
            "ARGN".to_string(),
        ];
        bind_names.extend(def.params.iter().cloned());
        for i in 0..values.len().max(def.params.len()) {
            bind_names.push(format!("ARGV{i}"));
        }
        let saved: Vec<(String, Option<String>)> = bind_names
            .iter()
            .map(|name| (name.clone(), self.variable(name)))
            .collect();

        self.bind_call_arguments(def, values);
        let injected: Vec<Option<String>> = bind_names
            .iter()
            .map(|name| self.variable(name))
            .collect();

        let flow = self.exec_nodes(&def.body);

        for ((name, before), injected_value) in saved.into_iter().zip(injected) {
            if self.variable(&name) != injected_value {
                continue;
            }
            match before {
                Some(value) => self.set_variable(&name, &value),
                None => self.unset_variable(&name),
            }
        }
        // return() inside a macro ends the macro but pops no scope.
        match flow {
            Flow::Return | Flow::Normal => Flow::Normal,
            other => other,
        }
    }

    fn bind_call_arguments(&mut self, def: &UserDef, values: &[String]) {
        for (i, param) in def.params.iter().enumerate() {
            let value = values.get(i).map_or("", String::as_str);
            self.set_variable(param, value);
        }
        self.set_variable("ARGC", &values.len().to_string());
        self.set_variable("ARGV", &values.join(";"));
        for (i, value) in values.iter().enumerate() {
            self.set_variable(&format!("ARGV{i}"), value);
        }
        let extra: Vec<&str> = values
            .iter()
            .skip(def.params.len())
            .map(String::as_str)
            .collect();
        self.set_variable("ARGN", &extra.join(";"));
    }

    /// True when a built-in or user definition answers to `name`.
    #[must_use]
    pub fn is_command(&self, name: &str) -> bool {
        let lowered = name.to_ascii_lowercase();
        handlers::is_builtin(&lowered) || self.defs.contains_key(&lowered)
    }
}

// --- trait bridges ---

impl VarSource for Evaluator<'_> {
    fn lookup_var(&self, name: &str) -> Option<String> {
        self.variable(name)
            .or_else(|| self.model.cache_value(name).map(str::to_string))
    }

    fn lookup_env(&self, name: &str) -> Option<String> {
        self.model.env_value(name)
    }

    fn lookup_cache(&self, name: &str) -> Option<String> {
        self.model.cache_value(name).map(str::to_string)
    }
}

impl LogicHost for Evaluator<'_> {
    fn variable(&self, name: &str) -> Option<String> {
        Evaluator::variable(self, name)
            .or_else(|| self.model.cache_value(name).map(str::to_string))
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.model.env_value(name)
    }

    fn cache_var(&self, name: &str) -> Option<String> {
        self.model.cache_value(name).map(str::to_string)
    }

    fn is_command(&self, name: &str) -> bool {
        Evaluator::is_command(self, name)
    }

    fn is_target(&self, name: &str) -> bool {
        self.model.find_target_index(name).is_some()
    }

    fn set_match_var(&mut self, name: &str, value: String) {
        self.set_variable(name, &value);
    }
}
