//! Built-in template sets.
//!
//! A template set is a named group of files whose marker regions the
//! generator owns. Three sets ship with Stamp:
//!
//! | Set          | What it scaffolds                                   |
//! |--------------|-----------------------------------------------------|
//! | `mfe-shell`  | micro-frontend host that imports remote components   |
//! | `mfe-remote` | micro-frontend remote exposing components            |
//! | `rest-api`   | HTTP service skeleton with generated route wiring    |
//!
//! # Overriding a set
//!
//! If `$STAMP_TEMPLATES_DIR` points at a directory containing a subdirectory
//! named after a set, every file below that subdirectory replaces the
//! built-in set of the same name. Owned regions are kept from the built-in
//! set.

use std::path::PathBuf;

use tracing::{debug, info, instrument};

use stamp_core::{
    application::ApplicationError,
    domain::{RelativePath, TargetFile},
    error::StampResult,
};

use crate::descriptor::load_template_dir;

/// Environment variable naming a directory of template set overrides.
pub const TEMPLATES_DIR_ENV: &str = "STAMP_TEMPLATES_DIR";

/// A named group of template files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub name: String,
    pub description: String,
    pub files: Vec<TargetFile>,
    /// Regions the set's files declare. They are managed (cleared when no
    /// unit targets them) for every sub-project using the set.
    pub owned_regions: Vec<String>,
}

impl TemplateSet {
    pub fn file(&self, path: &str) -> Option<&TargetFile> {
        self.files
            .iter()
            .find(|f| f.path.as_path() == std::path::Path::new(path))
    }
}

struct BuiltinSet {
    name: &'static str,
    description: &'static str,
    owned_regions: &'static [&'static str],
    files: &'static [(&'static str, &'static str)],
}

impl BuiltinSet {
    fn to_set(&self) -> StampResult<TemplateSet> {
        let files = self
            .files
            .iter()
            .map(|(path, template)| Ok(TargetFile::new(RelativePath::try_new(*path)?, *template)))
            .collect::<StampResult<Vec<_>>>()?;

        Ok(TemplateSet {
            name: self.name.to_string(),
            description: self.description.to_string(),
            files,
            owned_regions: self.owned_regions.iter().map(|r| r.to_string()).collect(),
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Names of the sets that ship with Stamp.
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN.iter().map(|s| s.name).collect()
}

/// Every built-in set, in a stable order.
pub fn builtin_sets() -> StampResult<Vec<TemplateSet>> {
    BUILTIN.iter().map(BuiltinSet::to_set).collect()
}

/// Resolve a set by name, honouring `$STAMP_TEMPLATES_DIR` overrides.
#[instrument]
pub fn find_set(name: &str) -> StampResult<TemplateSet> {
    let builtin = BUILTIN.iter().find(|s| s.name == name);

    if let Some(dir) = override_dir(name) {
        let files = load_template_dir(&dir)?;
        info!(path = %dir.display(), files = files.len(), "using template set override");
        return Ok(TemplateSet {
            name: name.to_string(),
            description: format!("custom set from {}", dir.display()),
            files,
            owned_regions: builtin
                .map(|s| s.owned_regions.iter().map(|r| r.to_string()).collect())
                .unwrap_or_default(),
        });
    }

    match builtin {
        Some(set) => set.to_set(),
        None => Err(ApplicationError::NotFound {
            what: "template set",
            path: PathBuf::from(name),
        }
        .into()),
    }
}

/// Template text for a `set:path` reference, e.g. `mfe-shell:src/App.jsx`.
pub fn builtin_file(reference: &str) -> StampResult<String> {
    let not_found = || ApplicationError::NotFound {
        what: "built-in template file",
        path: PathBuf::from(reference),
    };

    let (set, path) = reference.split_once(':').ok_or_else(not_found)?;
    let set = find_set(set)?;
    set.file(path)
        .map(|f| f.template.clone())
        .ok_or_else(|| not_found().into())
}

fn override_dir(name: &str) -> Option<PathBuf> {
    let root = std::env::var_os(TEMPLATES_DIR_ENV)?;
    let dir = PathBuf::from(root).join(name);
    debug!(path = %dir.display(), "checking template set override");
    dir.is_dir().then_some(dir)
}

// ── Built-in sets ─────────────────────────────────────────────────────────────

const BUILTIN: &[BuiltinSet] = &[
    BuiltinSet {
        name: "mfe-shell",
        description: "Micro-frontend host application",
        owned_regions: &["remotes", "imports", "usages"],
        files: &[
            ("package.json", SHELL_PACKAGE_JSON),
            ("webpack.config.js", SHELL_WEBPACK),
            ("src/App.jsx", SHELL_APP),
            ("src/index.js", SHELL_INDEX),
            ("public/index.html", PUBLIC_INDEX_HTML),
        ],
    },
    BuiltinSet {
        name: "mfe-remote",
        description: "Micro-frontend remote exposing components",
        owned_regions: &["exposes", "exports", "imports", "usages"],
        files: &[
            ("package.json", REMOTE_PACKAGE_JSON),
            ("webpack.config.js", REMOTE_WEBPACK),
            ("src/App.jsx", REMOTE_APP),
            ("src/index.js", REMOTE_INDEX),
            ("public/index.html", PUBLIC_INDEX_HTML),
        ],
    },
    BuiltinSet {
        name: "rest-api",
        description: "HTTP service skeleton with generated route wiring",
        owned_regions: &["imports", "routes", "env"],
        files: &[
            ("package.json", API_PACKAGE_JSON),
            ("src/server.js", API_SERVER),
            ("src/routes/index.js", API_ROUTES),
            (".env.example", API_ENV),
        ],
    },
];

const SHELL_PACKAGE_JSON: &str = r#"{
  "name": "{{PROJECT_NAME_KEBAB}}",
  "version": "0.1.0",
  "private": true,
  "scripts": {
    "start": "webpack serve --mode development",
    "build": "webpack --mode production"
  }
}
"#;

const SHELL_WEBPACK: &str = r#"const { ModuleFederationPlugin } = require('webpack').container;

module.exports = {
  entry: './src/index.js',
  plugins: [
    new ModuleFederationPlugin({
      name: '{{PROJECT_NAME_SNAKE}}',
      remotes: {
        // GENERATOR:START
        // GENERATOR:ID:remotes
        // GENERATOR:END
      },
      shared: { react: { singleton: true }, 'react-dom': { singleton: true } },
    }),
  ],
};
"#;

const SHELL_APP: &str = r#"import React from 'react';
// GENERATOR:START
// GENERATOR:ID:imports
// GENERATOR:END

export default function App() {
  return (
    <main className="{{PROJECT_NAME_KEBAB}}">
      {/* GENERATOR:START */}
      {/* GENERATOR:ID:usages */}
      {/* GENERATOR:END */}
    </main>
  );
}
"#;

const SHELL_INDEX: &str = r#"import('./bootstrap');
"#;

const PUBLIC_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>{{PROJECT_NAME}}</title>
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#;

const REMOTE_PACKAGE_JSON: &str = r#"{
  "name": "{{PROJECT_NAME_KEBAB}}",
  "version": "0.1.0",
  "private": true,
  "main": "src/index.js",
  "scripts": {
    "start": "webpack serve --mode development",
    "build": "webpack --mode production"
  }
}
"#;

const REMOTE_WEBPACK: &str = r#"const { ModuleFederationPlugin } = require('webpack').container;

module.exports = {
  entry: './src/index.js',
  plugins: [
    new ModuleFederationPlugin({
      name: '{{PROJECT_NAME_SNAKE}}',
      filename: 'remoteEntry.js',
      exposes: {
        // GENERATOR:START
        // GENERATOR:ID:exposes
        // GENERATOR:END
      },
      shared: { react: { singleton: true }, 'react-dom': { singleton: true } },
    }),
  ],
};
"#;

const REMOTE_APP: &str = r#"import React from 'react';
// GENERATOR:START
// GENERATOR:ID:imports
// GENERATOR:END

export default function App() {
  return (
    <section className="{{PROJECT_NAME_KEBAB}}">
      {/* GENERATOR:START */}
      {/* GENERATOR:ID:usages */}
      {/* GENERATOR:END */}
    </section>
  );
}
"#;

const REMOTE_INDEX: &str = r#"// GENERATOR:START
// GENERATOR:ID:exports
// GENERATOR:END
"#;

const API_PACKAGE_JSON: &str = r#"{
  "name": "{{PROJECT_NAME_KEBAB}}",
  "version": "0.1.0",
  "private": true,
  "main": "src/server.js",
  "scripts": {
    "start": "node src/server.js"
  }
}
"#;

const API_SERVER: &str = r#"const express = require('express');
const routes = require('./routes');

const app = express();
app.use(express.json());
app.use('/api', routes);

const port = process.env.PORT || 3000;
app.listen(port, () => console.log(`{{PROJECT_NAME}} listening on ${port}`));
"#;

const API_ROUTES: &str = r#"const { Router } = require('express');
// GENERATOR:START
// GENERATOR:ID:imports
// GENERATOR:END

const router = Router();

// GENERATOR:START
// GENERATOR:ID:routes
// GENERATOR:END

module.exports = router;
"#;

const API_ENV: &str = r#"PORT=3000
# GENERATOR:START
# GENERATOR:ID:env
# GENERATOR:END
"#;
