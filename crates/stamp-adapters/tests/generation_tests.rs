//! End-to-end generation over a real directory: descriptor on disk, local
//! filesystem adapter, core generation service.

use std::fs;
use std::path::Path;

use stamp_adapters::{DescriptorLoader, LocalFilesystem, MemoryFilesystem};
use stamp_core::{domain::IssueKind, prelude::*};
use tempfile::TempDir;

const DESCRIPTOR: &str = r#"
[[remotes]]
name = "shell"
root = "apps/shell"
builtin = "mfe-shell"

[[remotes.units]]
kind = "import"
region = "imports"
name = "Cart"
from = "checkout"
file = "src/App.jsx"

[[remotes.units]]
kind = "usage"
region = "usages"
name = "Cart"
file = "src/App.jsx"

[[remotes.units]]
kind = "raw"
region = "remotes"
text = "checkout: 'checkout@http://localhost:3001/remoteEntry.js',"

[[remotes]]
name = "checkout"
root = "apps/checkout"
builtin = "mfe-remote"

[[remotes.units]]
kind = "component"
region = "exposes"
name = "Cart"

[[remotes.units]]
kind = "export"
region = "exports"
name = "Cart"
"#;

fn workspace(descriptor: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("stamp.toml"), descriptor).unwrap();
    tmp
}

fn run(dir: &Path) -> GenerationReport {
    let loaded = DescriptorLoader::new(dir.join("stamp.toml")).load().unwrap();
    GenerationService::new(Box::new(LocalFilesystem::new()))
        .generate(&loaded.sub_projects)
        .unwrap()
}

#[test]
fn first_run_creates_then_second_run_is_unchanged() {
    let tmp = workspace(DESCRIPTOR);

    let first = run(tmp.path());
    assert!(first.is_success(), "{:?}", first.errors());
    assert_eq!(first.created().len(), 10);

    let app = fs::read_to_string(tmp.path().join("apps/shell/src/App.jsx")).unwrap();
    assert!(app.contains("// GENERATOR:ID:imports\nimport Cart from 'checkout/Cart';\n// GENERATOR:END"));
    assert!(app.contains("      {/* GENERATOR:ID:usages */}\n      <Cart />\n      {/* GENERATOR:END */}"));

    let snapshot = app.clone();
    let second = run(tmp.path());
    assert!(second.is_success());
    assert_eq!(second.unchanged().len(), 10);
    assert!(!second.has_changes());
    assert_eq!(
        fs::read_to_string(tmp.path().join("apps/shell/src/App.jsx")).unwrap(),
        snapshot
    );
}

#[test]
fn hand_edits_outside_regions_survive() {
    let tmp = workspace(DESCRIPTOR);
    run(tmp.path());

    let path = tmp.path().join("apps/shell/src/App.jsx");
    let edited = fs::read_to_string(&path)
        .unwrap()
        .replace("import React from 'react';", "import React, { useState } from 'react';\n// my note")
        .replace("import Cart from 'checkout/Cart';", "import Stale from 'x/Stale';");
    fs::write(&path, &edited).unwrap();

    let report = run(tmp.path());
    assert_eq!(report.updated(), [path.clone()]);

    let after = fs::read_to_string(&path).unwrap();
    assert!(after.starts_with("import React, { useState } from 'react';\n// my note\n"));
    assert!(after.contains("import Cart from 'checkout/Cart';"));
    assert!(!after.contains("Stale"));
}

#[test]
fn removed_unit_clears_owned_region() {
    let tmp = workspace(DESCRIPTOR);
    run(tmp.path());

    let without_usage = DESCRIPTOR.replace(
        "[[remotes.units]]\nkind = \"usage\"\nregion = \"usages\"\nname = \"Cart\"\nfile = \"src/App.jsx\"\n",
        "",
    );
    fs::write(tmp.path().join("stamp.toml"), without_usage).unwrap();

    let report = run(tmp.path());
    assert!(report.is_success());

    let app = fs::read_to_string(tmp.path().join("apps/shell/src/App.jsx")).unwrap();
    assert!(!app.contains("<Cart />"));
    assert!(app.contains("{/* GENERATOR:ID:usages */}\n      {/* GENERATOR:END */}"));
}

#[test]
fn units_render_in_declaration_order() {
    let descriptor = r#"
[[remotes]]
name = "api"
builtin = "rest-api"

[[remotes.units]]
kind = "raw"
region = "routes"
text = "router.use('/orders', orders);"

[[remotes.units]]
kind = "raw"
region = "routes"
text = "router.use('/accounts', accounts);"
"#;
    let tmp = workspace(descriptor);
    run(tmp.path());

    let routes = fs::read_to_string(tmp.path().join("api/src/routes/index.js")).unwrap();
    let orders = routes.find("/orders").unwrap();
    let accounts = routes.find("/accounts").unwrap();
    assert!(orders < accounts);
}

#[test]
fn duplicate_region_leaves_file_untouched() {
    let tmp = workspace(DESCRIPTOR);
    run(tmp.path());

    let path = tmp.path().join("apps/checkout/src/index.js");
    let broken = format!(
        "{}// GENERATOR:START\n// GENERATOR:ID:exports\n// GENERATOR:END\n",
        fs::read_to_string(&path).unwrap()
    );
    fs::write(&path, &broken).unwrap();

    let report = run(tmp.path());
    assert!(!report.is_success());
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, IssueKind::DuplicateMarkerId);
    assert_eq!(fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn invalid_name_writes_nothing() {
    let tmp = workspace("[[remotes]]\nname = \"Bad Name\"\nbuiltin = \"mfe-remote\"\n");

    let report = run(tmp.path());

    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.errors()[0].kind, IssueKind::InvalidName);
    assert!(!tmp.path().join("Bad Name").exists());
}

#[test]
fn dry_run_reports_without_touching_disk() {
    let tmp = workspace(DESCRIPTOR);
    let loaded = DescriptorLoader::new(tmp.path().join("stamp.toml"))
        .load()
        .unwrap();

    let report = GenerationService::new(Box::new(LocalFilesystem::new()))
        .with_options(GenerationOptions {
            concurrency: 2,
            dry_run: true,
        })
        .generate(&loaded.sub_projects)
        .unwrap();

    assert!(report.is_dry_run());
    assert_eq!(report.created().len(), 10);
    assert!(!tmp.path().join("apps").exists());
}

#[test]
fn memory_filesystem_write_failure_is_isolated() {
    let tmp = workspace(DESCRIPTOR);
    let loaded = DescriptorLoader::new(tmp.path().join("stamp.toml"))
        .load()
        .unwrap();

    let locked = tmp.path().join("apps/checkout/webpack.config.js");
    let fs = MemoryFilesystem::new().fail_writes_to(&locked);
    let view = fs.clone();

    let report = GenerationService::new(Box::new(fs))
        .generate(&loaded.sub_projects)
        .unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, IssueKind::WriteFailure);
    assert_eq!(failures[0].path, locked);
    assert_eq!(view.write_count(), 9);
    assert!(view.read_file(&locked).is_none());
}

fn local_service() -> GenerationService {
    GenerationService::new(Box::new(LocalFilesystem::new())).with_options(GenerationOptions {
        concurrency: 2,
        dry_run: false,
    })
}

#[test]
fn crlf_file_regenerates_idempotently() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("env/.env.example");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        "TOP=1\r\n# GENERATOR:START\r\n# GENERATOR:ID:env\r\nSTALE=1\r\n# GENERATOR:END\r\nBOTTOM=1\r\n",
    )
    .unwrap();

    let sp = SubProject::new("env", tmp.path().join("env"))
        .with_file(TargetFile::new(RelativePath::new(".env.example"), ""))
        .with_registry(
            UnitRegistry::new()
                .with_unit(GenerationUnit::raw("env", "CART_URL=http://localhost:3001"))
                .with_unit(GenerationUnit::raw("env", "API_URL=http://localhost:4000")),
        );
    let service = local_service();

    let first = service.generate(std::slice::from_ref(&sp)).unwrap();
    assert!(first.is_success(), "{:?}", first.errors());
    assert_eq!(first.updated(), [path.clone()]);

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "TOP=1\r\n# GENERATOR:START\r\n# GENERATOR:ID:env\r\nCART_URL=http://localhost:3001\r\nAPI_URL=http://localhost:4000\r\n# GENERATOR:END\r\nBOTTOM=1\r\n"
    );

    let second = service.generate(&[sp]).unwrap();
    assert!(second.created().is_empty());
    assert!(second.updated().is_empty());
    assert_eq!(second.unchanged(), [path.clone()]);
    assert!(second.errors().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), written);
}

#[test]
fn inline_region_with_custom_tokens_updates_then_settles() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("c/index.js");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "/*START*//*ID:imports*/ OLD /*END*/").unwrap();

    let sp = SubProject::new("checkout", tmp.path().join("c"))
        .with_file(TargetFile::new(RelativePath::new("index.js"), ""))
        .with_registry(UnitRegistry::new().with_unit(GenerationUnit::raw(
            "imports",
            "import A from './A'; import B from './B';",
        )));
    let service = local_service().with_syntax(MarkerSyntax::new("START", "ID:", "END").unwrap());

    let first = service.generate(std::slice::from_ref(&sp)).unwrap();
    assert!(first.is_success(), "{:?}", first.errors());
    assert_eq!(first.updated(), [path.clone()]);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "/*START*//*ID:imports*/import A from './A'; import B from './B';/*END*/"
    );

    let second = service.generate(&[sp]).unwrap();
    assert!(second.updated().is_empty());
    assert_eq!(second.unchanged(), [path]);
}
