//! Template files and variable rendering.
//!
//! A [`TargetFile`] is one file of a sub-project: where it lives and the text
//! it starts from when it does not exist yet. [`RenderContext`] fills the
//! `{{VARIABLE}}` placeholders of that text before marker regions are
//! synthesized into it.

use std::collections::BTreeMap;

use super::common::RelativePath;

/// One file a sub-project owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFile {
    /// Location relative to the sub-project root.
    pub path: RelativePath,
    /// Initial content, used only when the file is missing on disk.
    pub template: String,
}

impl TargetFile {
    pub fn new(path: RelativePath, template: impl Into<String>) -> Self {
        Self {
            path,
            template: template.into(),
        }
    }
}

/// Variables available to template text.
///
/// ## Built-in Variables
///
/// | Variable | Example |
/// |----------|---------|
/// | `PROJECT_NAME` | "product-list" |
/// | `PROJECT_NAME_SNAKE` | "product_list" |
/// | `PROJECT_NAME_KEBAB` | "product-list" |
/// | `PROJECT_NAME_PASCAL` | "ProductList" |
///
/// Nothing time-dependent is derived, so rendering the same template twice
/// always gives the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    project_name: String,
    variables: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new(project_name: impl Into<String>) -> Self {
        let name = project_name.into();
        let mut vars = BTreeMap::new();

        vars.insert("PROJECT_NAME".to_string(), name.clone());
        vars.insert("PROJECT_NAME_SNAKE".to_string(), to_snake_case(&name));
        vars.insert("PROJECT_NAME_KEBAB".to_string(), to_kebab_case(&name));
        vars.insert("PROJECT_NAME_PASCAL".to_string(), to_pascal_case(&name));

        Self {
            project_name: name,
            variables: vars,
        }
    }

    /// Add a custom variable. Built-ins can be overridden.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|s| s.as_str())
    }

    /// Replace `{{VARIABLE}}` placeholders in one left-to-right pass.
    ///
    /// Unknown placeholders are left as written, which keeps template-engine
    /// syntax such as `{{ GENERATOR:START }}` intact. Substituted values are
    /// never scanned again.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let replaced = after.find("}}").and_then(|close| {
                let key = &after[..close];
                self.variables
                    .get(key)
                    .map(|value| (value, open + 2 + close + 2))
            });
            match replaced {
                Some((value, consumed)) => {
                    out.push_str(value);
                    rest = &rest[consumed..];
                }
                None => {
                    out.push('{');
                    rest = &rest[open + 1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

// ============================================================================
// String Case Conversion Helpers
// ============================================================================

/// `MyApp` / `my-app` → `my_app`
pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// `MyApp` / `my_app` → `my-app`
pub fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

/// `my-app` → `MyApp`, `HTTPRequest` → `HttpRequest`
pub fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::new();
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                    out
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Split on separators (`_`, `-`, `.`, `/`, `@`, whitespace), on camelCase
/// transitions and on acronym boundaries (`HTTPServer` → `http` + `server`).
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if matches!(c, '_' | '-' | '.' | '/' | '@') || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(next) = chars.peek() {
            if c.is_lowercase() && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(|n| n.is_lowercase())
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_standard_variables() {
        let ctx = RenderContext::new("product-list");

        assert_eq!(ctx.get("PROJECT_NAME"), Some("product-list"));
        assert_eq!(ctx.get("PROJECT_NAME_SNAKE"), Some("product_list"));
        assert_eq!(ctx.get("PROJECT_NAME_KEBAB"), Some("product-list"));
        assert_eq!(ctx.get("PROJECT_NAME_PASCAL"), Some("ProductList"));
    }

    #[test]
    fn scoped_names_split_on_scope() {
        let ctx = RenderContext::new("@acme/checkout");
        assert_eq!(ctx.get("PROJECT_NAME_PASCAL"), Some("AcmeCheckout"));
        assert_eq!(ctx.get("PROJECT_NAME_SNAKE"), Some("acme_checkout"));
    }

    #[test]
    fn case_helpers_handle_acronyms() {
        assert_eq!(to_snake_case("XMLHttpRequest"), "xml_http_request");
        assert_eq!(to_kebab_case("myAwesomeApp"), "my-awesome-app");
        assert_eq!(to_pascal_case("HTTPRequest"), "HttpRequest");
    }

    #[test]
    fn renders_known_placeholders_only() {
        let ctx = RenderContext::new("shop").with_variable("PORT", "3000");
        let out = ctx.render("name={{PROJECT_NAME}} port={{PORT}} {{UNKNOWN}} {{ GENERATOR:START }}");
        assert_eq!(out, "name=shop port=3000 {{UNKNOWN}} {{ GENERATOR:START }}");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let ctx = RenderContext::new("{{PROJECT_NAME_SNAKE}}");
        assert_eq!(ctx.render("{{PROJECT_NAME}}"), "{{PROJECT_NAME_SNAKE}}");
    }

    #[test]
    fn unterminated_placeholder_is_kept() {
        let ctx = RenderContext::new("shop");
        assert_eq!(ctx.render("a {{PROJECT_NAME"), "a {{PROJECT_NAME");
        assert_eq!(ctx.render("{{{PROJECT_NAME}}}"), "{shop}");
    }
}
