//! Virtual-module bundler.
//!
//! Walks the import graph from the entry point, resolving every specifier
//! against the virtual file map or a stub namespace, and emits one bundle:
//!
//! - `resolver`: specifier -> (path, namespace)
//! - `loader`: (path, namespace) -> contents + loader hint
//! - `scanner`: syntax checks and statement discovery
//! - `linker`: ESM statements -> registry calls
//! - `emit`: registry IIFE
//!
//! Missing project files and unknown packages never fail the build; only
//! syntax problems the scanner or linker can prove do.

mod emit;
mod linker;
mod loader;
mod resolver;
mod scanner;
mod stubs;
#[cfg(test)]
mod tests;
mod types;

use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::BuildFailure;
use crate::vfs::VirtualFileStore;

pub use emit::js_string;
pub use loader::load;
pub use resolver::{package_name, ModuleResolver, VIRTUAL_CANDIDATE_SUFFIXES};
pub use stubs::{NPM_GLOBALS, REACT_DOM_EXPORTS, REACT_EXPORTS};
pub use types::{
    BuildArtifact, Diagnostic, LoadedModule, Loader, Location, Namespace, ResolutionRequest,
    ResolutionResult, Severity,
};

use emit::{emit, EmittedModule, ModuleBody};

/// Entry points tried in order.
pub const ENTRY_CANDIDATES: [&str; 8] = [
    "/src/main.tsx",
    "/src/main.ts",
    "/src/main.jsx",
    "/src/main.js",
    "/src/index.tsx",
    "/src/index.ts",
    "/src/index.jsx",
    "/src/index.js",
];

/// Stylesheet injected before any imported one.
pub const GLOBAL_STYLESHEET: &str = "/src/index.css";

/// First entry candidate present in the store.
pub fn find_entry(store: &VirtualFileStore) -> Option<&'static str> {
    ENTRY_CANDIDATES
        .iter()
        .copied()
        .find(|path| store.contains(path))
}

/// Bundle a project from its conventional entry point.
pub fn bundle(store: &VirtualFileStore) -> Result<BuildArtifact, BuildFailure> {
    match find_entry(store) {
        Some(entry) => bundle_entry(store, entry),
        None => Err(BuildFailure::single(Diagnostic::error(
            "Entry point not found: expected /src/main.{tsx,ts,jsx,js} or /src/index.{tsx,ts,jsx,js}",
            None,
        ))),
    }
}

/// Bundle a project from an explicit entry path.
pub fn bundle_entry(store: &VirtualFileStore, entry: &str) -> Result<BuildArtifact, BuildFailure> {
    let started = Instant::now();
    let resolver = ModuleResolver::new(store);

    let entry = ResolutionResult::new(entry, Namespace::Virtual);
    let mut pending: Vec<(ResolutionResult, String)> = vec![(entry.clone(), entry.resolved_path.clone())];
    let mut visited: HashSet<ResolutionResult> = HashSet::new();
    let mut modules: Vec<EmittedModule> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut imported_styles: Vec<String> = Vec::new();

    while let Some((resolved, importer)) = pending.pop() {
        if !visited.insert(resolved.clone()) {
            continue;
        }
        let id = resolved.module_id();

        let body = match resolved.namespace {
            Namespace::CssStub => {
                if store.contains(&resolved.resolved_path) {
                    if !imported_styles.contains(&resolved.resolved_path) {
                        imported_styles.push(resolved.resolved_path.clone());
                    }
                } else {
                    warn!("Stylesheet {} not found", resolved.resolved_path);
                    diagnostics.push(Diagnostic::warning(
                        format!(
                            "Stylesheet \"{}\" imported by {} was not found",
                            resolved.resolved_path, importer
                        ),
                        None,
                    ));
                }
                ModuleBody::Plain(String::new())
            }
            Namespace::Virtual if !store.contains(&resolved.resolved_path) => {
                debug!(
                    "Unresolved import {} from {}, using an empty module",
                    resolved.resolved_path, importer
                );
                diagnostics.push(Diagnostic::warning(
                    format!(
                        "Module \"{}\" imported by {} was not found; using an empty module",
                        resolved.resolved_path, importer
                    ),
                    None,
                ));
                ModuleBody::Plain(String::new())
            }
            _ => {
                let loaded = load(store, &resolved);
                match module_body(&resolver, &resolved, loaded, &mut diagnostics) {
                    Some((body, dependencies)) => {
                        // Reverse so the first import is visited first.
                        for dependency in dependencies.into_iter().rev() {
                            if !visited.contains(&dependency) {
                                pending.push((dependency, id.clone()));
                            }
                        }
                        body
                    }
                    None => continue,
                }
            }
        };

        modules.push(EmittedModule { id, body });
    }

    if diagnostics.iter().any(Diagnostic::is_error) {
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        warn!("Build failed with {} error(s)", errors);
        return Err(BuildFailure::new(diagnostics));
    }

    let mut stylesheets = Vec::new();
    if let Some(global) = store.content(GLOBAL_STYLESHEET) {
        stylesheets.push(global.to_string());
    }
    for path in imported_styles.iter().filter(|p| *p != GLOBAL_STYLESHEET) {
        if let Some(text) = store.content(path) {
            stylesheets.push(text.to_string());
        }
    }

    let code = emit(&modules, &entry.module_id());
    info!(
        "Bundled {} module(s), {} stylesheet(s), {} warning(s) in {:?}",
        modules.len(),
        stylesheets.len(),
        diagnostics.len(),
        started.elapsed()
    );

    Ok(BuildArtifact {
        code,
        diagnostics,
        stylesheets,
    })
}

/// Turn loaded contents into a registry body plus the modules it imports.
///
/// Returns `None` when the module produced errors.
fn module_body(
    resolver: &ModuleResolver<'_>,
    resolved: &ResolutionResult,
    loaded: LoadedModule,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(ModuleBody, Vec<ResolutionResult>)> {
    let path = resolved.module_id();

    match loaded.loader {
        loader if loader.is_script() => {
            let scanned = scanner::scan(&path, &loaded.contents, loader.allows_jsx());
            if !scanned.diagnostics.is_empty() {
                diagnostics.extend(scanned.diagnostics);
                return None;
            }

            let linked = linker::link(&path, &loaded.contents, &scanned.statements, resolver);
            if !linked.diagnostics.is_empty() {
                diagnostics.extend(linked.diagnostics);
                return None;
            }

            let body = if resolved.namespace == Namespace::Virtual {
                ModuleBody::Compiled {
                    loader,
                    source: linked.code,
                }
            } else {
                ModuleBody::Plain(linked.code)
            };
            Some((body, linked.dependencies))
        }
        Loader::Json => match serde_json::from_str::<serde_json::Value>(&loaded.contents) {
            Ok(value) => Some((
                ModuleBody::Plain(format!("module.exports = {};", value)),
                Vec::new(),
            )),
            Err(e) => {
                let line_text = loaded
                    .contents
                    .lines()
                    .nth(e.line().saturating_sub(1))
                    .unwrap_or_default()
                    .to_string();
                diagnostics.push(Diagnostic::error(
                    format!("Invalid JSON: {}", e),
                    Some(Location {
                        file: path,
                        line: e.line(),
                        column: e.column(),
                        line_text,
                    }),
                ));
                None
            }
        },
        Loader::Text => Some((
            ModuleBody::Plain(format!("module.exports = {};", js_string(&loaded.contents))),
            Vec::new(),
        )),
        _ => Some((ModuleBody::Plain(String::new()), Vec::new())),
    }
}
