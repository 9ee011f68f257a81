//! Synthesized modules for packages provided as browser globals.
//!
//! Stub sources are ordinary ES modules; they go through the same linker as
//! project files but are emitted without in-sandbox compilation.

use super::emit::js_string;
use super::resolver::package_name;

/// Bare package names served by the pre-loaded framework runtime.
pub const FRAMEWORK_PACKAGES: [&str; 2] = ["react", "react-dom"];

/// Named exports of the React 18 UMD global.
pub const REACT_EXPORTS: &[&str] = &[
    "Children",
    "Component",
    "Fragment",
    "Profiler",
    "PureComponent",
    "StrictMode",
    "Suspense",
    "act",
    "cloneElement",
    "createContext",
    "createElement",
    "createFactory",
    "createRef",
    "forwardRef",
    "isValidElement",
    "lazy",
    "memo",
    "startTransition",
    "unstable_act",
    "useCallback",
    "useContext",
    "useDebugValue",
    "useDeferredValue",
    "useEffect",
    "useId",
    "useImperativeHandle",
    "useInsertionEffect",
    "useLayoutEffect",
    "useMemo",
    "useReducer",
    "useRef",
    "useState",
    "useSyncExternalStore",
    "useTransition",
    "version",
];

/// Named exports of the ReactDOM 18 UMD global (client entry included).
pub const REACT_DOM_EXPORTS: &[&str] = &[
    "createPortal",
    "createRoot",
    "findDOMNode",
    "flushSync",
    "hydrate",
    "hydrateRoot",
    "render",
    "unmountComponentAtNode",
    "unstable_batchedUpdates",
    "unstable_renderSubtreeIntoContainer",
    "version",
];

/// Packages loaded into the sandbox from a CDN, with their global names.
pub const NPM_GLOBALS: &[(&str, &str)] = &[
    ("react-router-dom", "ReactRouterDOM"),
    ("axios", "axios"),
    ("styled-components", "styled"),
    ("@emotion/react", "emotionReact"),
    ("@emotion/styled", "emotionStyled"),
];

/// Global object name for a CDN-provided package, if known.
pub fn npm_global(specifier: &str) -> Option<&'static str> {
    NPM_GLOBALS
        .iter()
        .find(|(name, _)| *name == specifier)
        .map(|(_, global)| *global)
}

fn not_loaded(specifier: &str) -> String {
    js_string(&format!(
        "Package \"{}\" is not loaded. Add it to index.html via CDN.",
        specifier
    ))
}

fn guarded_global(binding: &str, global: &str, specifier: &str) -> String {
    format!(
        "const {binding} = window[{global}];\nif (!{binding}) {{\n  throw new Error({message});\n}}\n",
        binding = binding,
        global = js_string(global),
        message = not_loaded(specifier),
    )
}

/// Module re-exporting the framework global for `react`, `react-dom` and
/// their subpaths.
pub fn framework_stub(specifier: &str) -> String {
    let package = package_name(specifier);
    let (global, exports) = if package == "react-dom" {
        ("ReactDOM", REACT_DOM_EXPORTS)
    } else {
        ("React", REACT_EXPORTS)
    };

    let mut source = guarded_global("__global", global, specifier);
    source.push_str("export default __global;\n");
    for name in exports {
        source.push_str(&format!("export const {0} = __global.{0};\n", name));
    }

    if matches!(specifier, "react/jsx-runtime" | "react/jsx-dev-runtime") {
        source.push_str(
            "export function jsx(type, props, key) {\n  \
             return __global.createElement(type, key === undefined ? props : Object.assign({}, props, { key: key }));\n\
             }\n\
             export const jsxs = jsx;\n\
             export const jsxDEV = jsx;\n",
        );
    }

    source
}

/// Module for a bare package that is not part of the framework.
///
/// Known CDN packages re-export their global and throw when it is missing;
/// unknown packages throw as soon as they are imported.
pub fn npm_stub(specifier: &str) -> String {
    match npm_global(specifier) {
        Some(global) => {
            let mut source = guarded_global("__pkg", global, specifier);
            source.push_str("export default __pkg;\n__exportStar(exports, __pkg);\n");
            source
        }
        None => format!(
            "throw new Error({});\n",
            js_string(&format!(
                "Package \"{}\" is not available. Please check if it has a UMD build or use vanilla React patterns.",
                specifier
            ))
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_stub_exports_everything() {
        let source = framework_stub("react");
        assert!(source.contains("window[\"React\"]"));
        for name in REACT_EXPORTS {
            assert!(source.contains(&format!("export const {0} = __global.{0};", name)));
        }

        let dom = framework_stub("react-dom/client");
        assert!(dom.contains("export const createRoot = __global.createRoot;"));
        assert!(dom.contains("Package \\\"react-dom/client\\\" is not loaded"));
    }

    #[test]
    fn test_npm_stub_known_package() {
        let source = npm_stub("react-router-dom");
        assert!(source.contains("window[\"ReactRouterDOM\"]"));
        assert!(source.contains("__exportStar(exports, __pkg);"));
    }

    #[test]
    fn test_npm_stub_unknown_package_throws() {
        let source = npm_stub("left-pad");
        assert!(source.starts_with("throw new Error("));
        assert!(source.contains("Package \\\"left-pad\\\" is not available."));
    }
}
