//! Transpilation configuration.

use crate::error::ParseModuleKindError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The module convention the output targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// `require()` calls and `exports` assignments (default).
    #[default]
    #[serde(alias = "commonJs", alias = "cjs")]
    CommonJs,
    /// `define([...], function (...) {})` wrappers.
    Amd,
    /// Universal wrapper working under CommonJS, AMD and browser globals.
    Umd,
    /// `System.register` wrappers.
    System,
    /// Keep `import`/`export` syntax; only erase types.
    #[serde(alias = "esModule", alias = "esm")]
    EsModule,
}

impl ModuleKind {
    /// Returns the canonical name of this module kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::CommonJs => "commonjs",
            ModuleKind::Amd => "amd",
            ModuleKind::Umd => "umd",
            ModuleKind::System => "system",
            ModuleKind::EsModule => "esmodule",
        }
    }

    /// Whether the module pass rewrites imports into `require`-style loads.
    pub(crate) fn uses_require_interop(&self) -> bool {
        matches!(
            self,
            ModuleKind::CommonJs | ModuleKind::Amd | ModuleKind::Umd
        )
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = ParseModuleKindError;

    /// Parses the `compilerOptions.module` vocabulary of a tsconfig file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "commonjs" | "cjs" | "none" | "node16" | "node18" | "nodenext" => {
                Ok(ModuleKind::CommonJs)
            }
            "amd" => Ok(ModuleKind::Amd),
            "umd" => Ok(ModuleKind::Umd),
            "system" => Ok(ModuleKind::System),
            "es6" | "es2015" | "es2020" | "es2022" | "esnext" | "preserve" | "esmodule"
            | "esm" => Ok(ModuleKind::EsModule),
            _ => Err(ParseModuleKindError {
                name: s.to_string(),
            }),
        }
    }
}

/// How default and namespace imports are bridged to `require()` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportInterop {
    /// Babel-compatible `__esModule` interop helpers (default).
    #[default]
    Swc,
    /// Node.js semantics: `module.exports` is the default export.
    Node,
    /// No interop helpers; `require()` results are used as-is.
    None,
}

/// Options for a single transpilation.
///
/// The default selects CommonJS output, which is what [`crate::transpile`]
/// always uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranspileOptions {
    /// Output module convention.
    pub module: ModuleKind,
    /// File name used for diagnostics and the source map.
    pub file_name: Option<String>,
    /// Parse JSX syntax (`.tsx`). JSX is preserved in the output.
    pub jsx: bool,
    /// Also produce a JSON source map.
    pub source_map: bool,
    /// Import interop flavour for CommonJS, AMD and UMD output.
    pub import_interop: ImportInterop,
    /// Compile decorators with the legacy TypeScript semantics
    /// (`experimentalDecorators`) instead of the standard 2022-03 proposal.
    pub experimental_decorators: bool,
}

impl TranspileOptions {
    /// Creates options targeting the given module kind.
    pub fn new(module: ModuleKind) -> Self {
        Self {
            module,
            ..Default::default()
        }
    }

    /// Sets the file name.
    ///
    /// A `.tsx` extension also turns on JSX parsing.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        if file_name.ends_with(".tsx") {
            self.jsx = true;
        }
        self.file_name = Some(file_name);
        self
    }

    /// Enables or disables source map generation.
    pub fn with_source_map(mut self, source_map: bool) -> Self {
        self.source_map = source_map;
        self
    }

    /// Sets the import interop flavour.
    pub fn with_import_interop(mut self, import_interop: ImportInterop) -> Self {
        self.import_interop = import_interop;
        self
    }

    /// Selects legacy (`experimentalDecorators`) decorator semantics.
    pub fn with_experimental_decorators(mut self, experimental_decorators: bool) -> Self {
        self.experimental_decorators = experimental_decorators;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_commonjs() {
        let options = TranspileOptions::default();
        assert_eq!(options.module, ModuleKind::CommonJs);
        assert_eq!(options.import_interop, ImportInterop::Swc);
        assert!(!options.jsx);
        assert!(!options.source_map);
        assert!(options.file_name.is_none());
        assert!(!options.experimental_decorators);
    }

    #[test]
    fn test_module_kind_from_tsconfig_names() {
        assert_eq!("CommonJS".parse(), Ok(ModuleKind::CommonJs));
        assert_eq!("NodeNext".parse(), Ok(ModuleKind::CommonJs));
        assert_eq!("AMD".parse(), Ok(ModuleKind::Amd));
        assert_eq!("umd".parse(), Ok(ModuleKind::Umd));
        assert_eq!("System".parse(), Ok(ModuleKind::System));
        assert_eq!("ES2015".parse(), Ok(ModuleKind::EsModule));
        assert_eq!("ESNext".parse(), Ok(ModuleKind::EsModule));
        assert_eq!("preserve".parse(), Ok(ModuleKind::EsModule));
    }

    #[test]
    fn test_module_kind_unknown() {
        let err = "jsonp".parse::<ModuleKind>().unwrap_err();
        assert_eq!(err.name, "jsonp");
    }

    #[test]
    fn test_module_kind_display_round_trips() {
        for kind in [
            ModuleKind::CommonJs,
            ModuleKind::Amd,
            ModuleKind::Umd,
            ModuleKind::System,
            ModuleKind::EsModule,
        ] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn test_tsx_file_name_enables_jsx() {
        let options = TranspileOptions::default().with_file_name("App.tsx");
        assert!(options.jsx);
        assert_eq!(options.file_name.as_deref(), Some("App.tsx"));

        let options = TranspileOptions::default().with_file_name("app.ts");
        assert!(!options.jsx);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let options: TranspileOptions = serde_json::from_str(
            r#"{ "module": "amd", "sourceMap": true, "importInterop": "node" }"#,
        )
        .unwrap();
        assert_eq!(options.module, ModuleKind::Amd);
        assert!(options.source_map);
        assert_eq!(options.import_interop, ImportInterop::Node);
        assert!(!options.jsx);

        let options: TranspileOptions =
            serde_json::from_str(r#"{ "experimentalDecorators": true }"#).unwrap();
        assert!(options.experimental_decorators);
    }

    #[test]
    fn test_serialize_default() {
        insta::assert_json_snapshot!(TranspileOptions::default(), @r#"
        {
          "module": "commonjs",
          "fileName": null,
          "jsx": false,
          "sourceMap": false,
          "importInterop": "swc",
          "experimentalDecorators": false
        }
        "#);
    }
}
