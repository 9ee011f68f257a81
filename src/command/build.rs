use anyhow::Result;
use std::path::{Path, PathBuf};

use super::project::{print_build, Project};
use crate::config::Config;

pub async fn run_build(config: &Config, dir: &Path, out: Option<PathBuf>, open: bool) -> Result<()> {
    let project = Project::open(config, dir, out, open).await?;
    let snapshot = project.settle().await;
    let preview = project.preview.clone();
    project.close().await;

    print_build(&snapshot?, &preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::run_init;

    #[tokio::test]
    async fn test_build_writes_preview_page() {
        let dir = tempfile::tempdir().unwrap();
        run_init(dir.path(), Some("demo".to_string())).await.unwrap();

        let config = Config::default();
        run_build(&config, dir.path(), None, false).await.unwrap();

        let page = std::fs::read_to_string(dir.path().join(".livepad/preview.html")).unwrap();
        assert!(page.contains("sandbox=\"allow-scripts\""));
        assert!(page.contains("data:text/html;base64,"));
    }

    #[tokio::test]
    async fn test_build_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.tsx"), "import './missing';\nconst x = (;\n")
            .unwrap();

        let config = Config::default();
        let err = run_build(&config, dir.path(), None, false).await.unwrap_err();
        assert_eq!(err.to_string(), "Build failed");
        assert!(!dir.path().join(".livepad/preview.html").exists());
    }
}
