//! Variable substitution for script templates.

use std::collections::HashMap;

/// Variable substitution context for script templates.
///
/// Variables use the `{varname}` syntax. Substitution is a single left to
/// right pass: inserted values are never scanned again, so a value that
/// itself contains `{module}` is written out literally. Placeholders with no
/// matching variable are left untouched.
///
/// # Example
///
/// ```
/// use rifs_script::TemplateContext;
///
/// let ctx = TemplateContext::new()
///     .with_var("module", "rifs.demo")
///     .with_var("class_name", "DemoRif");
///
/// assert_eq!(
///     ctx.substitute("from {module} import {class_name}"),
///     "from rifs.demo import DemoRif"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty template context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn with_var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Set a variable.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_string(), value.into());
    }

    /// Get a variable value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Substitute variables in a string.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let replaced = after.find('}').and_then(|close| {
                let key = &after[..close];
                self.vars.get(key).map(|value| (value, close))
            });
            match replaced {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_vars() {
        let ctx = TemplateContext::new()
            .with_var("quality", "high")
            .with_var("codec", "hevc");

        assert_eq!(
            ctx.substitute("output_{quality}_{codec}.mkv"),
            "output_high_hevc.mkv"
        );
    }

    #[test]
    fn repeated_placeholder() {
        let ctx = TemplateContext::new().with_var("class_name", "DemoRif");
        assert_eq!(
            ctx.substitute("{class_name}(**kwargs) # {class_name}"),
            "DemoRif(**kwargs) # DemoRif"
        );
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        let ctx = TemplateContext::new().with_var("a", "1");
        assert_eq!(ctx.substitute("{a} {b} {"), "1 {b} {");
        assert_eq!(ctx.substitute("{'k': {a}}"), "{'k': 1}");
    }

    #[test]
    fn values_are_not_rescanned() {
        let ctx = TemplateContext::new()
            .with_var("kwargs", "{'note': '{module}'}")
            .with_var("module", "rifs.demo");
        assert_eq!(
            ctx.substitute("{module}: {kwargs}"),
            "rifs.demo: {'note': '{module}'}"
        );
    }

    #[test]
    fn set_and_get() {
        let mut ctx = TemplateContext::new();
        assert!(ctx.get("module").is_none());
        ctx.set("module", "rifs.demo");
        assert_eq!(ctx.get("module"), Some("rifs.demo"));
    }
}
