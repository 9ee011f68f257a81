//! Virtual path helpers.
//!
//! Store keys are always `/`-rooted, use forward slashes and contain no
//! `.`/`..` segments. Assistant responses are sloppier than that, so
//! updates and deletes search an ordered candidate list instead.

use crate::error::StoreError;

/// Normalize a virtual path into its canonical `/`-rooted form.
///
/// `..` segments that would climb above the root are dropped.
pub fn normalize(path: &str) -> Result<String, StoreError> {
    let cleaned = path.trim().replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in cleaned.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }

    Ok(format!("/{}", segments.join("/")))
}

/// Directory portion of a normalized path (`/src/App.tsx` -> `/src`).
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Join a relative specifier onto a directory and normalize the result.
pub fn join(dir: &str, relative: &str) -> Result<String, StoreError> {
    normalize(&format!("{}/{}", dir, relative))
}

/// Same path with a leading slash added, or stripped if already present.
fn toggle_leading_slash(raw: &str) -> String {
    match raw.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => format!("/{}", raw),
    }
}

fn push_unique(list: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !list.contains(&candidate) {
        list.push(candidate);
    }
}

/// Ordered lookup candidates for an Update target.
///
/// The first candidate present in the store wins. When none is present the
/// update falls back to creating the first (normalized) candidate.
pub fn update_candidates(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let mut candidates = Vec::new();

    if let Ok(normalized) = normalize(raw) {
        push_unique(&mut candidates, normalized);
    }
    push_unique(&mut candidates, raw.to_string());
    push_unique(&mut candidates, format!("/{}", raw));
    push_unique(&mut candidates, toggle_leading_slash(raw));
    if raw.starts_with("src/") {
        push_unique(&mut candidates, format!("/{}", raw));
    }
    if !raw.starts_with('/') && !raw.starts_with("src/") {
        push_unique(&mut candidates, format!("/src/{}", raw));
    }

    candidates
}

/// Ordered lookup candidates for a Delete target.
pub fn delete_candidates(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let mut candidates = Vec::new();

    if let Ok(normalized) = normalize(raw) {
        push_unique(&mut candidates, normalized);
    }
    push_unique(&mut candidates, raw.to_string());

    candidates
}

/// File extension (lowercased, without the dot) of the last path segment.
pub fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("src/App.tsx").unwrap(), "/src/App.tsx");
        assert_eq!(normalize("/src//App.tsx").unwrap(), "/src/App.tsx");
        assert_eq!(normalize("./src/./App.tsx").unwrap(), "/src/App.tsx");
        assert_eq!(
            normalize("/src/components/../App.tsx").unwrap(),
            "/src/App.tsx"
        );
        assert_eq!(normalize("/../../x.ts").unwrap(), "/x.ts");
        assert_eq!(normalize("src\\win\\path.ts").unwrap(), "/src/win/path.ts");
        assert!(normalize("").is_err());
        assert!(normalize("/").is_err());
    }

    #[test]
    fn test_dirname_and_join() {
        assert_eq!(dirname("/src/App.tsx"), "/src");
        assert_eq!(dirname("/index.html"), "/");
        assert_eq!(
            join("/src/components", "../utils/format").unwrap(),
            "/src/utils/format"
        );
        assert_eq!(join("/", "./main.tsx").unwrap(), "/main.tsx");
    }

    #[test]
    fn test_update_candidates_order() {
        assert_eq!(
            update_candidates("App.tsx"),
            vec!["/App.tsx", "App.tsx", "/src/App.tsx"]
        );
        assert_eq!(
            update_candidates("src/App.tsx"),
            vec!["/src/App.tsx", "src/App.tsx"]
        );
        assert_eq!(
            update_candidates("/src/App.tsx"),
            vec!["/src/App.tsx", "//src/App.tsx", "src/App.tsx"]
        );
    }

    #[test]
    fn test_delete_candidates() {
        assert_eq!(delete_candidates("src/a.ts"), vec!["/src/a.ts", "src/a.ts"]);
        assert_eq!(delete_candidates("/src/a.ts"), vec!["/src/a.ts"]);
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("/src/App.TSX"), Some("tsx".to_string()));
        assert_eq!(extension("/src/Makefile"), None);
        assert_eq!(extension("/a.b/c"), None);
    }
}
