//! Bundle emission.
//!
//! The bundle is one IIFE holding a module registry. Project script modules
//! are embedded as string literals and compiled on first `require` by Babel
//! standalone inside the sandbox, with presets chosen by loader hint.
//! Everything else (stubs, JSON, text) is emitted as a plain factory.

use super::types::Loader;

/// How a module appears in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleBody {
    /// Linked TS/JS source, lowered in the sandbox.
    Compiled { loader: Loader, source: String },
    /// Factory body emitted verbatim.
    Plain(String),
}

/// A module ready to be written into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedModule {
    pub id: String,
    pub body: ModuleBody,
}

/// Encode text as a JS string literal.
pub fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

const FACTORY_PARAMS: &str = "require, module, exports, __export, __exportStar, __importDefault";

const RUNTIME: &str = r#"  "use strict";
  var __modules = Object.create(null);
  var __cache = Object.create(null);
  var __classic = ["react", { runtime: "classic" }];
  var __presets = {
    tsx: [["typescript", { isTSX: true, allExtensions: true }], __classic],
    ts: [["typescript", { allExtensions: true }]],
    jsx: [__classic],
    js: [__classic]
  };
  function __export(target, getters) {
    Object.defineProperty(target, "__esModule", { value: true, configurable: true });
    Object.keys(getters).forEach(function (name) {
      Object.defineProperty(target, name, { enumerable: true, configurable: true, get: getters[name] });
    });
  }
  function __exportStar(target, source) {
    Object.keys(source).forEach(function (name) {
      if (name === "default" || Object.prototype.hasOwnProperty.call(target, name)) return;
      Object.defineProperty(target, name, {
        enumerable: true,
        configurable: true,
        get: function () { return source[name]; }
      });
    });
  }
  function __importDefault(mod) {
    return mod && mod.__esModule ? mod["default"] : mod;
  }
  function __compile(id, hint, source) {
    return function (require, module, exports) {
      if (!window.Babel) {
        throw new Error("Babel standalone is not loaded; cannot compile " + id);
      }
      var output = window.Babel.transform(source, {
        filename: id,
        presets: __presets[hint],
        sourceType: "script"
      }).code;
      var factory = new Function(
        "require", "module", "exports", "__export", "__exportStar", "__importDefault",
        output + "\n//# sourceURL=" + id
      );
      factory(require, module, exports, __export, __exportStar, __importDefault);
    };
  }
  function __require(id) {
    var cached = __cache[id];
    if (cached) return cached.exports;
    var factory = __modules[id];
    if (!factory) throw new Error("Module not found in bundle: " + id);
    var module = { exports: {} };
    __cache[id] = module;
    try {
      factory(__require, module, module.exports, __export, __exportStar, __importDefault);
    } catch (error) {
      delete __cache[id];
      throw error;
    }
    return module.exports;
  }
"#;

/// Write the registry IIFE. `entry_id` is required last.
pub fn emit(modules: &[EmittedModule], entry_id: &str) -> String {
    let mut code = String::from("(function () {\n");
    code.push_str(RUNTIME);

    for module in modules {
        let id = js_string(&module.id);
        match &module.body {
            ModuleBody::Compiled { loader, source } => {
                code.push_str(&format!(
                    "  __modules[{}] = __compile({}, {}, {});\n",
                    id,
                    id,
                    js_string(loader.as_str()),
                    js_string(source)
                ));
            }
            ModuleBody::Plain(body) => {
                code.push_str(&format!(
                    "  __modules[{}] = function ({}) {{\n{}\n  }};\n",
                    id, FACTORY_PARAMS, body
                ));
            }
        }
    }

    code.push_str(&format!("  __require({});\n}})();\n", js_string(entry_id)));
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("a\"b\n</script>"), "\"a\\\"b\\n</script>\"");
    }

    #[test]
    fn test_emit_registry() {
        let modules = vec![
            EmittedModule {
                id: "/src/main.tsx".to_string(),
                body: ModuleBody::Compiled {
                    loader: Loader::Tsx,
                    source: "var App = __importDefault(require(\"/src/App.tsx\"));".to_string(),
                },
            },
            EmittedModule {
                id: "npm-stub:left-pad".to_string(),
                body: ModuleBody::Plain("throw new Error(\"nope\");".to_string()),
            },
        ];
        let code = emit(&modules, "/src/main.tsx");
        assert!(code.starts_with("(function () {\n"));
        assert!(code.contains(
            "__modules[\"/src/main.tsx\"] = __compile(\"/src/main.tsx\", \"tsx\", \"var App = __importDefault(require(\\\"/src/App.tsx\\\"));\");"
        ));
        assert!(code.contains(
            "__modules[\"npm-stub:left-pad\"] = function (require, module, exports, __export, __exportStar, __importDefault) {\nthrow new Error(\"nope\");\n  };"
        ));
        assert!(code.ends_with("  __require(\"/src/main.tsx\");\n})();\n"));
    }
}
