use tracing::debug;

use crate::domain::Language;
use crate::vfs::VirtualFileStore;

use super::stubs::{framework_stub, npm_stub};
use super::types::{LoadedModule, Loader, Namespace, ResolutionResult};

/// Produce module contents for a resolved import.
///
/// A virtual path that is not in the store loads as an empty module.
pub fn load(store: &VirtualFileStore, resolved: &ResolutionResult) -> LoadedModule {
    match resolved.namespace {
        Namespace::Virtual => match store.get(&resolved.resolved_path) {
            Some(entry) => match entry.language {
                Language::Tsx => LoadedModule::new(entry.content.clone(), Loader::Tsx),
                Language::Ts => LoadedModule::new(entry.content.clone(), Loader::Ts),
                Language::Jsx => LoadedModule::new(entry.content.clone(), Loader::Jsx),
                Language::Js => LoadedModule::new(entry.content.clone(), Loader::Js),
                Language::Json => LoadedModule::new(entry.content.clone(), Loader::Json),
                Language::Css => {
                    debug!("Scrubbing stylesheet {} from the module graph", entry.path);
                    LoadedModule::empty()
                }
                Language::Md | Language::Html | Language::Plaintext => {
                    LoadedModule::new(entry.content.clone(), Loader::Text)
                }
            },
            None => LoadedModule::empty(),
        },
        Namespace::FrameworkStub => {
            LoadedModule::new(framework_stub(&resolved.resolved_path), Loader::Js)
        }
        Namespace::NpmStub => LoadedModule::new(npm_stub(&resolved.resolved_path), Loader::Js),
        Namespace::CssStub => LoadedModule::empty(),
    }
}
