//! Package specs with extras.
//!
//! A spec has up to four parts, e.g. `yt-dlp[default,curl-cffi]>=2025.1 @ https://host/src.tar.gz`:
//! a base (name, path or `.`), an extras list, a version specifier and a
//! direct URL. [`PackageSpec`] renders back to a single install target, so
//! every extra is requested in the same install invocation.

use crate::error::{ProvisorError, Result};
use serde::Serialize;
use std::fmt;

/// A parsed package spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSpec {
    /// Package name, local path, or `.`.
    pub base: String,

    /// Requested extras, de-duplicated in first-seen order.
    pub extras: Vec<String>,

    /// Version specifier following the extras (e.g. `>=1.0`).
    pub specifier: String,

    /// Direct URL after ` @`.
    pub url: Option<String>,
}

impl PackageSpec {
    /// Parse a package spec.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |message: &str| ProvisorError::InvalidPackageSpec {
            spec: input.to_string(),
            message: message.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("package spec is empty"));
        }

        let (requirement, url) = match trimmed.split_once(" @") {
            Some((req, url)) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(invalid("direct URL after '@' is empty"));
                }
                (req.trim(), Some(url.to_string()))
            }
            None => (trimmed, None),
        };

        let (base, extras, specifier) = match requirement.find('[') {
            Some(open) => {
                let close = requirement[open..]
                    .find(']')
                    .map(|i| open + i)
                    .ok_or_else(|| invalid("extras list is not closed with ']'"))?;
                let inner = &requirement[open + 1..close];
                if inner.contains('[') {
                    return Err(invalid("nested '[' in extras list"));
                }
                let extras = parse_extras(inner).map_err(|m| invalid(&m))?;
                (
                    &requirement[..open],
                    extras,
                    requirement[close + 1..].trim(),
                )
            }
            None => {
                if requirement.contains(']') {
                    return Err(invalid("unexpected ']' without '['"));
                }
                let split = requirement
                    .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | ';'))
                    .unwrap_or(requirement.len());
                (
                    &requirement[..split],
                    Vec::new(),
                    requirement[split..].trim(),
                )
            }
        };

        let base = base.trim();
        if base.is_empty() {
            return Err(invalid("package name or path is missing"));
        }
        if specifier.contains('[') || specifier.contains(']') {
            return Err(invalid("extras must directly follow the package name"));
        }

        Ok(Self {
            base: base.to_string(),
            extras,
            specifier: specifier.to_string(),
            url,
        })
    }

    /// Add an extra unless it is already requested.
    pub fn add_extra(&mut self, extra: &str) {
        let extra = extra.trim();
        if !extra.is_empty() && !self.has_extra(extra) {
            self.extras.push(extra.to_string());
        }
    }

    /// Whether `extra` is requested.
    pub fn has_extra(&self, extra: &str) -> bool {
        self.extras.iter().any(|e| e == extra)
    }

    /// The single install target passed to pip.
    pub fn install_target(&self) -> String {
        self.to_string()
    }
}

fn parse_extras(inner: &str) -> std::result::Result<Vec<String>, String> {
    let mut extras: Vec<String> = Vec::new();
    for raw in inner.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            return Err("extras list contains an empty name".to_string());
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(format!("invalid extra name '{}'", name));
        }
        if !extras.iter().any(|e| e == name) {
            extras.push(name.to_string());
        }
    }
    Ok(extras)
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        write!(f, "{}", self.specifier)?;
        if let Some(url) = &self.url {
            write!(f, " @ {}", url)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for PackageSpec {
    type Err = ProvisorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_path_with_extras() {
        let spec = PackageSpec::parse(".[default,curl-cffi]").unwrap();
        assert_eq!(spec.base, ".");
        assert_eq!(spec.extras, vec!["default", "curl-cffi"]);
        assert_eq!(spec.specifier, "");
        assert_eq!(spec.url, None);
        assert_eq!(spec.install_target(), ".[default,curl-cffi]");
    }

    #[test]
    fn parses_plain_name() {
        let spec = PackageSpec::parse("yt-dlp").unwrap();
        assert_eq!(spec.base, "yt-dlp");
        assert!(spec.extras.is_empty());
        assert_eq!(spec.install_target(), "yt-dlp");
    }

    #[test]
    fn parses_specifier_without_extras() {
        let spec = PackageSpec::parse("yt-dlp>=2025.1").unwrap();
        assert_eq!(spec.base, "yt-dlp");
        assert_eq!(spec.specifier, ">=2025.1");
        assert_eq!(spec.install_target(), "yt-dlp>=2025.1");
    }

    #[test]
    fn parses_extras_specifier_and_url() {
        let spec =
            PackageSpec::parse("yt-dlp[default] ==2025.1 @ https://example.com/src.tar.gz")
                .unwrap();
        assert_eq!(spec.base, "yt-dlp");
        assert_eq!(spec.extras, vec!["default"]);
        assert_eq!(spec.specifier, "==2025.1");
        assert_eq!(spec.url.as_deref(), Some("https://example.com/src.tar.gz"));
        assert_eq!(
            spec.to_string(),
            "yt-dlp[default]==2025.1 @ https://example.com/src.tar.gz"
        );
    }

    #[test]
    fn extras_are_trimmed_and_deduplicated() {
        let spec = PackageSpec::parse("pkg[ a , b,a ]").unwrap();
        assert_eq!(spec.extras, vec!["a", "b"]);
        assert_eq!(spec.install_target(), "pkg[a,b]");
    }

    #[test]
    fn add_extra_keeps_a_single_list() {
        let mut spec = PackageSpec::parse(".[default]").unwrap();
        spec.add_extra("X");
        spec.add_extra("default");
        spec.add_extra(" ");
        assert_eq!(spec.install_target(), ".[default,X]");
        assert!(spec.has_extra("X"));
    }

    #[test]
    fn rejects_empty_spec() {
        assert!(PackageSpec::parse("  ").is_err());
    }

    #[test]
    fn rejects_unclosed_extras() {
        let err = PackageSpec::parse("pkg[a,b").unwrap_err();
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn rejects_empty_extra_name() {
        assert!(PackageSpec::parse("pkg[a,,b]").is_err());
        assert!(PackageSpec::parse("pkg[]").is_err());
    }

    #[test]
    fn rejects_missing_base() {
        assert!(PackageSpec::parse("[default]").is_err());
    }

    #[test]
    fn rejects_stray_bracket() {
        assert!(PackageSpec::parse("pkg]").is_err());
        assert!(PackageSpec::parse("pkg[a]>=1[b]").is_err());
    }

    #[test]
    fn rejects_empty_url() {
        assert!(PackageSpec::parse("pkg @ ").is_err());
    }

    #[test]
    fn from_str_parses() {
        let spec: PackageSpec = ".[default,X]".parse().unwrap();
        assert_eq!(spec.extras.len(), 2);
    }
}
