//! Variable interpolation for probe commands and arguments.
//!
//! # Syntax
//!
//! - `${variable_name}` - replaced with variable value
//! - `$${escaped}` - produces literal `${escaped}` in output
//! - a `$` not followed by `{` is kept as is
//!
//! # Example
//!
//! ```yaml
//! probes:
//!   - command: "${bin_dir}/yt-dlp"
//!     args: ["-v"]
//! ```

use crate::error::{ProvisorError, Result};
use std::collections::{BTreeSet, HashMap};

/// A segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference: ${name}
    Variable(String),
}

/// Split a string into literal and variable segments.
///
/// An unterminated `${` is an error.
pub fn parse_interpolation(input: &str) -> std::result::Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(escaped) = after.strip_prefix("${") {
            // $${...} -> literal ${...}
            let end = escaped
                .find('}')
                .ok_or_else(|| format!("unterminated '$${{' in '{}'", input))?;
            literal.push_str("${");
            literal.push_str(&escaped[..=end]);
            rest = &escaped[end + 1..];
        } else if let Some(body) = after.strip_prefix('{') {
            let end = body
                .find('}')
                .ok_or_else(|| format!("unterminated '${{' in '{}'", input))?;
            let name = body[..end].trim();
            if name.is_empty() {
                return Err(format!("empty variable name in '{}'", input));
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Variable(name.to_string()));
            rest = &body[end + 1..];
        } else {
            literal.push('$');
            rest = after;
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

/// Variable names referenced by `input`, sorted.
pub fn extract_variables(input: &str) -> BTreeSet<String> {
    parse_interpolation(input)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Variable(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Context for variable resolution.
///
/// Variables are resolved in priority order:
/// 1. Explicit variables (profile and settings `env`)
/// 2. Built-in variables (`python`, `venv`, `bin_dir`, `profile`, `provisor_version`)
/// 3. Process environment
#[derive(Debug, Default, Clone)]
pub struct InterpolationContext {
    /// Explicit variables
    pub vars: HashMap<String, String>,

    /// Built-in variables
    pub builtins: HashMap<String, String>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl InterpolationContext {
    /// Create a context holding only `provisor_version`.
    pub fn new() -> Self {
        let mut builtins = HashMap::new();
        builtins.insert(
            "provisor_version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );

        Self {
            builtins,
            ..Default::default()
        }
    }

    /// Add the process environment. Variables that are not valid UTF-8 are skipped.
    pub fn with_system_env(mut self) -> Self {
        self.env = std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        self
    }

    /// Set a built-in variable.
    pub fn with_builtin(mut self, name: &str, value: impl Into<String>) -> Self {
        self.builtins.insert(name.to_string(), value.into());
        self
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .or_else(|| self.builtins.get(name))
            .or_else(|| self.env.get(name))
            .cloned()
    }
}

/// Resolve all variables in an interpolated string.
///
/// # Errors
///
/// Returns `ConfigValidationError` for malformed input or an unknown variable.
pub fn resolve_string(input: &str, context: &InterpolationContext) -> Result<String> {
    let segments =
        parse_interpolation(input).map_err(|message| ProvisorError::ConfigValidationError {
            message,
        })?;

    let mut out = String::with_capacity(input.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Variable(name) => {
                let value =
                    context
                        .resolve(&name)
                        .ok_or_else(|| ProvisorError::ConfigValidationError {
                            message: format!("Unknown variable '${{{}}}' in '{}'", name, input),
                        })?;
                out.push_str(&value);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_only() {
        assert_eq!(
            parse_interpolation("yt-dlp -v").unwrap(),
            vec![Segment::Literal("yt-dlp -v".into())]
        );
    }

    #[test]
    fn parses_variables_between_literals() {
        assert_eq!(
            parse_interpolation("${bin_dir}/tool-${profile}").unwrap(),
            vec![
                Segment::Variable("bin_dir".into()),
                Segment::Literal("/tool-".into()),
                Segment::Variable("profile".into()),
            ]
        );
    }

    #[test]
    fn escaped_variable_is_literal() {
        assert_eq!(
            parse_interpolation("echo $${HOME}").unwrap(),
            vec![Segment::Literal("echo ${HOME}".into())]
        );
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(
            parse_interpolation("cost $5").unwrap(),
            vec![Segment::Literal("cost $5".into())]
        );
    }

    #[test]
    fn unterminated_variable_is_error() {
        assert!(parse_interpolation("${venv/bin").is_err());
    }

    #[test]
    fn empty_variable_name_is_error() {
        assert!(parse_interpolation("${}").is_err());
    }

    #[test]
    fn extract_variables_collects_names() {
        let vars = extract_variables("${a} ${b} ${a}");
        assert_eq!(vars.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn resolve_uses_priority_order() {
        let mut ctx = InterpolationContext::new().with_builtin("python", "/venv/bin/python");
        ctx.env.insert("python".into(), "from-env".into());
        ctx.env.insert("HOME".into(), "/home/me".into());
        assert_eq!(ctx.resolve("python").as_deref(), Some("/venv/bin/python"));

        ctx.vars.insert("python".into(), "explicit".into());
        assert_eq!(ctx.resolve("python").as_deref(), Some("explicit"));
        assert_eq!(ctx.resolve("HOME").as_deref(), Some("/home/me"));
    }

    #[test]
    fn resolve_string_substitutes() {
        let ctx = InterpolationContext::new().with_builtin("bin_dir", "/tmp/env1/bin");
        assert_eq!(
            resolve_string("${bin_dir}/yt-dlp", &ctx).unwrap(),
            "/tmp/env1/bin/yt-dlp"
        );
    }

    #[test]
    fn resolve_string_unknown_variable_is_error() {
        let ctx = InterpolationContext::new();
        let err = resolve_string("${nope}", &ctx).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn provisor_version_is_builtin() {
        let ctx = InterpolationContext::new();
        assert_eq!(
            resolve_string("${provisor_version}", &ctx).unwrap(),
            env!("CARGO_PKG_VERSION")
        );
    }
}
