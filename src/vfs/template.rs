//! Starter project written by `livepad init`.

use super::store::VirtualFileStore;
use crate::error::StoreError;

/// Strip everything but ASCII alphanumerics, `-` and `_` from a project name.
pub fn sanitize_project_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Files of the React starter project, as `(path, content)` pairs.
pub fn react_starter_files(name: &str) -> Vec<(&'static str, String)> {
    let app = format!(
        r#"import React from 'react'
import './App.css'

function App() {{
  return (
    <div className="App">
      <h1>Welcome to {name}!</h1>
      <p>Start editing to see your changes.</p>
    </div>
  )
}}

export default App"#
    );

    let main = r#"import React from 'react'
import ReactDOM from 'react-dom/client'
import App from './App'
import './index.css'

ReactDOM.createRoot(document.getElementById('root') as HTMLElement).render(
  <React.StrictMode>
    <App />
  </React.StrictMode>,
)"#
    .to_string();

    let app_css = r#".App {
  max-width: 1280px;
  margin: 0 auto;
  padding: 2rem;
  text-align: center;
}

h1 {
  font-size: 3.2em;
  line-height: 1.1;
  color: #646cff;
}

p {
  color: #888;
}"#
    .to_string();

    let index_css = r#":root {
  font-family: Inter, system-ui, Avenir, Helvetica, Arial, sans-serif;
  line-height: 1.5;
  font-weight: 400;

  color-scheme: light dark;
  color: rgba(255, 255, 255, 0.87);
  background-color: #242424;

  font-synthesis: none;
  text-rendering: optimizeLegibility;
  -webkit-font-smoothing: antialiased;
  -moz-osx-font-smoothing: grayscale;
}

body {
  margin: 0;
  display: flex;
  place-items: center;
  min-width: 320px;
  min-height: 100vh;
}

h1 {
  font-size: 3.2em;
  line-height: 1.1;
}

@media (prefers-color-scheme: light) {
  :root {
    color: #213547;
    background-color: #ffffff;
  }
}"#
    .to_string();

    let index_html = format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{name}</title>
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="/src/main.tsx"></script>
  </body>
</html>"#
    );

    vec![
        ("/src/App.tsx", app),
        ("/src/main.tsx", main),
        ("/src/App.css", app_css),
        ("/src/index.css", index_css),
        ("/index.html", index_html),
    ]
}

/// The starter project loaded into a fresh store.
pub fn react_starter(name: &str) -> Result<VirtualFileStore, StoreError> {
    VirtualFileStore::from_files(react_starter_files(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_project_name() {
        assert_eq!(sanitize_project_name("my app!"), "myapp");
        assert_eq!(sanitize_project_name("todo-list_v2"), "todo-list_v2");
        assert_eq!(sanitize_project_name("../etc"), "etc");
    }

    #[test]
    fn test_react_starter() {
        let store = react_starter("demo").unwrap();
        assert_eq!(store.len(), 5);
        assert!(store.content("/src/App.tsx").unwrap().contains("Welcome to demo!"));
        assert!(store.content("/index.html").unwrap().contains("<title>demo</title>"));
        assert!(store.contains("/src/main.tsx"));
    }
}
