//! Label selector parsing and matching.
//!
//! Implements the equality- and set-based selector grammar used by the
//! host metrics-query API:
//!
//! ```text
//! app=web                      equality
//! tier!=cache                  inequality
//! env in (prod, staging)       set membership
//! env notin (dev)              set exclusion
//! gpu                          key exists
//! !gpu                         key does not exist
//! ```
//!
//! Requirements are comma-separated and conjoined: every requirement
//! must hold for a label set to match. The empty selector matches
//! everything.
//!
//! Inequality and set exclusion follow the host API's semantics for
//! absent keys: `tier!=cache` and `tier notin (cache)` both match a
//! label set that has no `tier` key at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Name part of a label key, and label values: alphanumeric ends with
/// `-`, `_`, `.` allowed in between, max 63 characters.
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$").unwrap());

/// Optional DNS-subdomain prefix of a label key, max 253 characters.
static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
});

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// Errors produced while parsing selector text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorParseError {
    #[error("empty requirement in selector {0:?}")]
    EmptyRequirement(String),

    #[error("invalid label key {0:?}")]
    InvalidKey(String),

    #[error("invalid label value {0:?}")]
    InvalidValue(String),

    #[error("unparseable requirement {0:?}")]
    InvalidRequirement(String),

    #[error("empty value set in requirement {0:?}")]
    EmptyValueSet(String),

    #[error("unbalanced parentheses in selector {0:?}")]
    UnbalancedParens(String),
}

// ── Requirements ───────────────────────────────────────────────────

/// A single parsed selector requirement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Requirement {
    /// `key=value` (also written `key==value`).
    Equals { key: String, value: String },
    /// `key!=value`. Matches when the key is absent.
    NotEquals { key: String, value: String },
    /// `key in (v1, v2)`.
    In { key: String, values: Vec<String> },
    /// `key notin (v1, v2)`. Matches when the key is absent.
    NotIn { key: String, values: Vec<String> },
    /// `key`: the label exists, any value.
    Exists { key: String },
    /// `!key`: the label does not exist.
    DoesNotExist { key: String },
}

impl Requirement {
    /// Whether `labels` satisfies this requirement.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Requirement::Equals { key, value } => labels.get(key) == Some(value),
            Requirement::NotEquals { key, value } => labels.get(key) != Some(value),
            Requirement::In { key, values } => {
                labels.get(key).is_some_and(|v| values.contains(v))
            }
            Requirement::NotIn { key, values } => {
                labels.get(key).is_none_or(|v| !values.contains(v))
            }
            Requirement::Exists { key } => labels.contains_key(key),
            Requirement::DoesNotExist { key } => !labels.contains_key(key),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Equals { key, value } => write!(f, "{key}={value}"),
            Requirement::NotEquals { key, value } => write!(f, "{key}!={value}"),
            Requirement::In { key, values } => write!(f, "{key} in ({})", values.join(",")),
            Requirement::NotIn { key, values } => {
                write!(f, "{key} notin ({})", values.join(","))
            }
            Requirement::Exists { key } => f.write_str(key),
            Requirement::DoesNotExist { key } => write!(f, "!{key}"),
        }
    }
}

// ── Selector ───────────────────────────────────────────────────────

/// A parsed label selector: a conjunction of requirements.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Parse selector text. Empty or whitespace-only text yields the
    /// match-everything selector.
    pub fn parse(text: &str) -> Result<Self, SelectorParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }
        let mut requirements = Vec::new();
        for part in split_requirements(text)? {
            let part = part.trim();
            if part.is_empty() {
                return Err(SelectorParseError::EmptyRequirement(text.to_string()));
            }
            requirements.push(parse_requirement(part)?);
        }
        Ok(Self { requirements })
    }

    /// Whether `labels` satisfies every requirement.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|req| req.matches(labels))
    }

    /// True for the match-everything selector.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

impl FromStr for LabelSelector {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, req) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{req}")?;
        }
        Ok(())
    }
}

// ── Parsing ────────────────────────────────────────────────────────

/// Split selector text on commas that sit outside value-set parens.
fn split_requirements(text: &str) -> Result<Vec<&str>, SelectorParseError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SelectorParseError::UnbalancedParens(text.to_string()))?;
            }
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SelectorParseError::UnbalancedParens(text.to_string()));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn parse_requirement(req: &str) -> Result<Requirement, SelectorParseError> {
    if let Some(key) = req.strip_prefix('!') {
        return Ok(Requirement::DoesNotExist { key: validated_key(key)? });
    }
    // Operator order matters: `!=` and `==` both contain `=`.
    if let Some((key, value)) = req.split_once("!=") {
        return Ok(Requirement::NotEquals {
            key: validated_key(key)?,
            value: validated_value(value)?,
        });
    }
    if let Some((key, value)) = req.split_once("==") {
        return Ok(Requirement::Equals {
            key: validated_key(key)?,
            value: validated_value(value)?,
        });
    }
    if let Some((key, value)) = req.split_once('=') {
        return Ok(Requirement::Equals {
            key: validated_key(key)?,
            value: validated_value(value)?,
        });
    }
    if let Some((key, rest)) = req.split_once(char::is_whitespace) {
        let rest = rest.trim_start();
        if let Some(list) = rest.strip_prefix("notin") {
            return Ok(Requirement::NotIn {
                key: validated_key(key)?,
                values: parse_value_set(req, list)?,
            });
        }
        if let Some(list) = rest.strip_prefix("in") {
            return Ok(Requirement::In {
                key: validated_key(key)?,
                values: parse_value_set(req, list)?,
            });
        }
        return Err(SelectorParseError::InvalidRequirement(req.to_string()));
    }
    Ok(Requirement::Exists { key: validated_key(req)? })
}

/// Parse a parenthesized value set. Values are sorted and deduplicated
/// so equal sets render identically.
fn parse_value_set(req: &str, list: &str) -> Result<Vec<String>, SelectorParseError> {
    let inner = list
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| SelectorParseError::InvalidRequirement(req.to_string()))?;
    if inner.trim().is_empty() {
        return Err(SelectorParseError::EmptyValueSet(req.to_string()));
    }
    let mut values = Vec::new();
    for value in inner.split(',') {
        values.push(validated_value(value)?);
    }
    values.sort();
    values.dedup();
    Ok(values)
}

/// Whether `key` is a legal label key.
pub fn is_valid_label_key(key: &str) -> bool {
    validated_key(key).is_ok()
}

/// Whether `value` is a legal label value.
pub fn is_valid_label_value(value: &str) -> bool {
    validated_value(value).is_ok()
}

/// Validate a label key: optional DNS-subdomain prefix, a `/`, then a
/// name part.
fn validated_key(key: &str) -> Result<String, SelectorParseError> {
    let key = key.trim();
    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty()
                || prefix.len() > MAX_PREFIX_LEN
                || !PREFIX_RE.is_match(prefix)
                || name.contains('/')
            {
                return Err(SelectorParseError::InvalidKey(key.to_string()));
            }
            name
        }
        None => key,
    };
    if name.is_empty() || name.len() > MAX_NAME_LEN || !NAME_RE.is_match(name) {
        return Err(SelectorParseError::InvalidKey(key.to_string()));
    }
    Ok(key.to_string())
}

/// Validate a label value. The empty value is legal.
fn validated_value(value: &str) -> Result<String, SelectorParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }
    if value.len() > MAX_NAME_LEN || !NAME_RE.is_match(value) {
        return Err(SelectorParseError::InvalidValue(value.to_string()));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_selector_matches_everything() {
        let sel = LabelSelector::parse("").unwrap();
        assert!(sel.is_empty());
        assert!(sel.matches(&labels(&[])));
        assert!(sel.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn equality_forms() {
        let sel = LabelSelector::parse("app=web").unwrap();
        assert!(sel.matches(&labels(&[("app", "web")])));
        assert!(!sel.matches(&labels(&[("app", "api")])));
        assert!(!sel.matches(&labels(&[])));

        let double = LabelSelector::parse("app==web").unwrap();
        assert_eq!(sel, double);
    }

    #[test]
    fn inequality_matches_absent_key() {
        let sel = LabelSelector::parse("tier!=cache").unwrap();
        assert!(sel.matches(&labels(&[("tier", "web")])));
        assert!(sel.matches(&labels(&[])));
        assert!(!sel.matches(&labels(&[("tier", "cache")])));
    }

    #[test]
    fn set_membership() {
        let sel = LabelSelector::parse("env in (prod, staging)").unwrap();
        assert!(sel.matches(&labels(&[("env", "prod")])));
        assert!(sel.matches(&labels(&[("env", "staging")])));
        assert!(!sel.matches(&labels(&[("env", "dev")])));
        assert!(!sel.matches(&labels(&[])));
    }

    #[test]
    fn set_exclusion_matches_absent_key() {
        let sel = LabelSelector::parse("env notin (dev)").unwrap();
        assert!(sel.matches(&labels(&[("env", "prod")])));
        assert!(sel.matches(&labels(&[])));
        assert!(!sel.matches(&labels(&[("env", "dev")])));
    }

    #[test]
    fn exists_and_not_exists() {
        let exists = LabelSelector::parse("gpu").unwrap();
        assert!(exists.matches(&labels(&[("gpu", "a100")])));
        assert!(!exists.matches(&labels(&[])));

        let absent = LabelSelector::parse("!gpu").unwrap();
        assert!(!absent.matches(&labels(&[("gpu", "a100")])));
        assert!(absent.matches(&labels(&[])));
    }

    #[test]
    fn requirements_conjoin() {
        let sel = LabelSelector::parse("app=web,env in (prod, staging),!canary").unwrap();
        assert!(sel.matches(&labels(&[("app", "web"), ("env", "prod")])));
        assert!(!sel.matches(&labels(&[("app", "web"), ("env", "dev")])));
        assert!(!sel.matches(&labels(&[("app", "web"), ("env", "prod"), ("canary", "true")])));
    }

    #[test]
    fn whitespace_is_tolerated() {
        let sel = LabelSelector::parse(" app = web , env in ( prod , staging ) ").unwrap();
        assert!(sel.matches(&labels(&[("app", "web"), ("env", "staging")])));
    }

    #[test]
    fn display_is_canonical() {
        let sel = LabelSelector::parse("app==web, env in (staging,prod,prod), !canary").unwrap();
        assert_eq!(sel.to_string(), "app=web,env in (prod,staging),!canary");
        // Canonical text re-parses to the same selector.
        assert_eq!(LabelSelector::parse(&sel.to_string()).unwrap(), sel);
    }

    #[test]
    fn prefixed_keys_are_legal() {
        let sel = LabelSelector::parse("example.com/tier=web").unwrap();
        assert!(sel.matches(&labels(&[("example.com/tier", "web")])));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            LabelSelector::parse("app=web,,env=prod"),
            Err(SelectorParseError::EmptyRequirement(_))
        ));
        assert!(matches!(
            LabelSelector::parse("-bad-=web"),
            Err(SelectorParseError::InvalidKey(_))
        ));
        assert!(matches!(
            LabelSelector::parse("app=sp ace"),
            Err(SelectorParseError::InvalidValue(_))
        ));
        assert!(matches!(
            LabelSelector::parse("env in (prod"),
            Err(SelectorParseError::UnbalancedParens(_))
        ));
        assert!(matches!(
            LabelSelector::parse("env in ()"),
            Err(SelectorParseError::EmptyValueSet(_))
        ));
        assert!(matches!(
            LabelSelector::parse("env around (prod)"),
            Err(SelectorParseError::InvalidRequirement(_))
        ));
    }

    #[test]
    fn empty_value_is_legal() {
        let sel = LabelSelector::parse("app=").unwrap();
        assert!(sel.matches(&labels(&[("app", "")])));
        assert!(!sel.matches(&labels(&[("app", "web")])));
    }
}
