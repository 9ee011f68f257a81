//! Import specifier resolution against the virtual file map.
//!
//! Rules, first match wins:
//!
//! 1. `./x`, `../x`: joined onto the importer's directory; `.css` targets
//!    go to the stylesheet stub, everything else to the virtual namespace.
//! 2. `/x`: same, without the join.
//! 3. Bare names without a scheme: the framework packages (and their
//!    subpaths) go to the framework stub, everything else to the npm stub.
//! 4. Specifiers with a URL scheme go to the npm stub, which reports them
//!    as unavailable at runtime.
//!
//! Virtual lookups try the path as given, then with `.tsx`, then `.ts`.

use tracing::debug;
use url::Url;

use crate::vfs::paths::{dirname, join, normalize};
use crate::vfs::VirtualFileStore;

use super::stubs::FRAMEWORK_PACKAGES;
use super::types::{Namespace, ResolutionRequest, ResolutionResult};

/// Suffixes tried, in order, when looking up a virtual path.
pub const VIRTUAL_CANDIDATE_SUFFIXES: [&str; 3] = ["", ".tsx", ".ts"];

/// Stateless resolver over a store snapshot.
pub struct ModuleResolver<'a> {
    store: &'a VirtualFileStore,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(store: &'a VirtualFileStore) -> Self {
        Self { store }
    }

    pub fn resolve(&self, request: &ResolutionRequest) -> ResolutionResult {
        let specifier = request.specifier.trim();

        if specifier.starts_with('.') {
            let target = join(dirname(&request.importer_path), specifier)
                .unwrap_or_else(|_| "/".to_string());
            return self.resolve_path(target);
        }

        if specifier.starts_with('/') {
            let target = normalize(specifier).unwrap_or_else(|_| "/".to_string());
            return self.resolve_path(target);
        }

        if has_scheme(specifier) {
            debug!("Specifier {} has a URL scheme, stubbing", specifier);
            return ResolutionResult::new(specifier, Namespace::NpmStub);
        }

        let package = package_name(specifier);
        if FRAMEWORK_PACKAGES.contains(&package) {
            return ResolutionResult::new(specifier, Namespace::FrameworkStub);
        }
        ResolutionResult::new(specifier, Namespace::NpmStub)
    }

    fn resolve_path(&self, target: String) -> ResolutionResult {
        if target.to_ascii_lowercase().ends_with(".css") {
            return ResolutionResult::new(target, Namespace::CssStub);
        }
        let resolved = self.lookup_virtual(&target).unwrap_or(target);
        ResolutionResult::new(resolved, Namespace::Virtual)
    }

    /// First candidate path present in the store.
    pub fn lookup_virtual(&self, path: &str) -> Option<String> {
        VIRTUAL_CANDIDATE_SUFFIXES
            .iter()
            .map(|suffix| format!("{}{}", path, suffix))
            .find(|candidate| self.store.contains(candidate))
    }
}

/// `@scope/name/sub` -> `@scope/name`, `name/sub` -> `name`.
pub fn package_name(specifier: &str) -> &str {
    let mut parts = specifier.splitn(3, '/');
    let first = parts.next().unwrap_or(specifier);
    if first.starts_with('@') {
        match parts.next() {
            Some(second) => &specifier[..first.len() + 1 + second.len()],
            None => first,
        }
    } else {
        first
    }
}

fn has_scheme(specifier: &str) -> bool {
    Url::parse(specifier)
        .map(|url| url.scheme().len() > 1)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VirtualFileStore {
        VirtualFileStore::from_files([
            ("/src/main.tsx", ""),
            ("/src/App.tsx", ""),
            ("/src/utils/format.ts", ""),
            ("/src/data.json", "{}"),
        ])
        .unwrap()
    }

    fn resolve(store: &VirtualFileStore, specifier: &str, importer: &str) -> ResolutionResult {
        ModuleResolver::new(store).resolve(&ResolutionRequest::new(specifier, importer))
    }

    #[test]
    fn test_relative_with_extension_candidates() {
        let store = store();
        assert_eq!(
            resolve(&store, "./App", "/src/main.tsx"),
            ResolutionResult::new("/src/App.tsx", Namespace::Virtual)
        );
        assert_eq!(
            resolve(&store, "../utils/format", "/src/components/Button.tsx"),
            ResolutionResult::new("/src/utils/format.ts", Namespace::Virtual)
        );
        assert_eq!(
            resolve(&store, "./data.json", "/src/main.tsx"),
            ResolutionResult::new("/src/data.json", Namespace::Virtual)
        );
    }

    #[test]
    fn test_missing_relative_keeps_joined_path() {
        let store = store();
        assert_eq!(
            resolve(&store, "./Missing", "/src/main.tsx"),
            ResolutionResult::new("/src/Missing", Namespace::Virtual)
        );
    }

    #[test]
    fn test_exact_path_wins_over_suffixes() {
        let store =
            VirtualFileStore::from_files([("/src/x", "plain"), ("/src/x.tsx", "tsx")]).unwrap();
        for _ in 0..2 {
            assert_eq!(
                resolve(&store, "./x", "/src/main.tsx").resolved_path,
                "/src/x"
            );
        }
    }

    #[test]
    fn test_stylesheets() {
        let store = store();
        assert_eq!(
            resolve(&store, "./App.css", "/src/App.tsx"),
            ResolutionResult::new("/src/App.css", Namespace::CssStub)
        );
        assert_eq!(
            resolve(&store, "/src/index.css", "/src/main.tsx").namespace,
            Namespace::CssStub
        );
    }

    #[test]
    fn test_bare_packages() {
        let store = store();
        assert_eq!(
            resolve(&store, "react", "/src/App.tsx").namespace,
            Namespace::FrameworkStub
        );
        assert_eq!(
            resolve(&store, "react-dom/client", "/src/main.tsx"),
            ResolutionResult::new("react-dom/client", Namespace::FrameworkStub)
        );
        assert_eq!(
            resolve(&store, "react-router-dom", "/src/App.tsx").namespace,
            Namespace::NpmStub
        );
        assert_eq!(
            resolve(&store, "@emotion/styled", "/src/App.tsx").namespace,
            Namespace::NpmStub
        );
        assert_eq!(
            resolve(&store, "https://esm.sh/lodash", "/src/App.tsx"),
            ResolutionResult::new("https://esm.sh/lodash", Namespace::NpmStub)
        );
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("react"), "react");
        assert_eq!(package_name("react-dom/client"), "react-dom");
        assert_eq!(package_name("@emotion/react"), "@emotion/react");
        assert_eq!(package_name("@mui/material/Button"), "@mui/material");
    }
}
