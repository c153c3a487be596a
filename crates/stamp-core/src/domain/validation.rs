//! Naming gate.
//!
//! Sub-project names follow npm package-name rules; component names must be
//! JavaScript identifiers. Any error or warning rejects a name, and every
//! problem found is reported at once.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{entities::sub_project::SubProject, error::DomainError};

const MAX_PACKAGE_NAME_LEN: usize = 214;

const BLACKLIST: &[&str] = &["node_modules", "favicon.ico"];

const CORE_MODULES: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2",
    "https", "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode",
    "querystring", "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls",
    "trace_events", "tty", "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
];

const JS_RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield", "let", "static",
    "implements", "interface", "package", "private", "protected", "public", "await",
];

/// `@scope/name` or `name`, each part free of `/`.
static SCOPED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:@([^/]+?)/)?([^/]+?)$").expect("scoped name pattern"));

/// Characters `encodeURIComponent` leaves alone.
static URL_SAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_.!~*'()]+$").expect("url-safe pattern"));

static JS_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern"));

static REGION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("region id pattern"));

/// Problems found in one name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl NameValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Fold another validation in, prefixing its messages.
    fn absorb(&mut self, prefix: &str, other: NameValidation) {
        self.errors
            .extend(other.errors.into_iter().map(|e| format!("{prefix}: {e}")));
        self.warnings
            .extend(other.warnings.into_iter().map(|w| format!("{prefix}: {w}")));
    }

    pub fn into_result(self, subject: impl Into<String>) -> Result<(), DomainError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DomainError::InvalidName {
                subject: subject.into(),
                errors: self.errors,
                warnings: self.warnings,
            })
        }
    }
}

pub struct NameValidator;

impl NameValidator {
    /// npm package-name rules.
    pub fn validate_package_name(name: &str) -> NameValidation {
        let mut v = NameValidation::default();

        if name.is_empty() {
            v.errors.push("name length must be greater than zero".into());
            return v;
        }
        if name.starts_with('.') {
            v.errors.push("name cannot start with a period".into());
        }
        if name.starts_with('_') {
            v.errors.push("name cannot start with an underscore".into());
        }
        if name.trim() != name {
            v.errors
                .push("name cannot contain leading or trailing spaces".into());
        }
        if BLACKLIST.contains(&name.to_lowercase().as_str()) {
            v.errors.push(format!("{name} is a blacklisted name"));
        }
        if name.chars().count() > MAX_PACKAGE_NAME_LEN {
            v.errors.push(format!(
                "name cannot contain more than {MAX_PACKAGE_NAME_LEN} characters"
            ));
        }
        if !Self::is_url_safe(name) {
            v.errors
                .push("name can only contain URL-friendly characters".into());
        }

        if CORE_MODULES.contains(&name.to_lowercase().as_str()) {
            v.warnings.push(format!("{name} is a core module name"));
        }
        if name.to_lowercase() != name {
            v.warnings
                .push("name can no longer contain capital letters".into());
        }
        let last_segment = name.rsplit('/').next().unwrap_or(name);
        if last_segment.contains(['~', '\'', '!', '(', ')', '*']) {
            v.warnings.push(
                "name can no longer contain special characters (\"~'!()*\")".into(),
            );
        }

        v
    }

    fn is_url_safe(name: &str) -> bool {
        if URL_SAFE.is_match(name) {
            return true;
        }
        SCOPED_NAME.captures(name).is_some_and(|caps| {
            let scope = caps.get(1).map(|m| m.as_str());
            let pkg = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            scope.is_some_and(|s| URL_SAFE.is_match(s)) && URL_SAFE.is_match(pkg)
        })
    }

    /// JavaScript identifier, PascalCase by convention.
    pub fn validate_component_name(name: &str) -> NameValidation {
        let mut v = NameValidation::default();

        if name.is_empty() {
            v.errors.push("component name cannot be empty".into());
            return v;
        }
        if !JS_IDENTIFIER.is_match(name) {
            v.errors.push(format!(
                "{name} is not a valid JavaScript identifier"
            ));
        } else if JS_RESERVED.contains(&name) {
            v.errors.push(format!("{name} is a reserved word"));
        }
        if name.starts_with(|c: char| c.is_ascii_lowercase()) {
            v.warnings
                .push("component names should start with an uppercase letter".into());
        }

        v
    }

    /// Gate for a whole sub-project: its name, and the component names,
    /// import sources and region ids of its units.
    pub fn validate_sub_project(sub_project: &SubProject) -> Result<(), DomainError> {
        let mut v = Self::validate_package_name(&sub_project.name);
        let mut seen_names = HashSet::new();
        let mut seen_regions = HashSet::new();
        let mut seen_remotes = HashSet::new();

        for unit in sub_project.registry.units() {
            if unit.kind.renders_name() && seen_names.insert(unit.name.as_str()) {
                v.absorb(
                    &format!("component '{}'", unit.name),
                    Self::validate_component_name(&unit.name),
                );
            }
            if let Some(remote) = unit.from.as_deref() {
                if seen_remotes.insert(remote) {
                    v.absorb(
                        &format!("remote '{remote}'"),
                        Self::validate_package_name(remote),
                    );
                }
            }
            if seen_regions.insert(unit.region.as_str()) && !REGION_ID.is_match(&unit.region) {
                v.errors.push(format!(
                    "region '{}': ids may only contain letters, digits, '_', '.' and '-'",
                    unit.region
                ));
            }
        }

        v.into_result(&sub_project.name)
    }
}
