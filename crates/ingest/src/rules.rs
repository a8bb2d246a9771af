//! Versioned, ordered rule tables for the normalizer and the content filter.
//!
//! Rules are data: each table is a YAML document with `apiVersion`, `kind`,
//! `metadata` and `spec`, compiled once into [`CompiledRuleTable`].

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Only supported `apiVersion`.
pub const API_VERSION: &str = "v1";

pub const NORMALIZER_RULES_FILE: &str = "normalizer.yml";
pub const CONTENT_FILTER_RULES_FILE: &str = "content-filter.yml";

const BUILTIN_NORMALIZER: &str = include_str!("../../../data/rules/normalizer.yml");
const BUILTIN_CONTENT_FILTER: &str = include_str!("../../../data/rules/content-filter.yml");

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("failed to read rule file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rule YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported apiVersion '{0}' (expected '{API_VERSION}')")]
    UnsupportedVersion(String),

    #[error("expected a {expected:?} table, found {found:?}")]
    WrongKind { expected: RuleKind, found: RuleKind },

    #[error("rule '{id}' has an invalid pattern: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{id}': normalizer rules must be line-anchored drop rules")]
    NotLineRule { id: String },
}

impl From<RuleError> for ragprep_core::PipelineError {
    fn from(e: RuleError) -> Self {
        ragprep_core::PipelineError::Rules(e.to_string())
    }
}

// ── YAML-level types ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RuleKind {
    NormalizerRules,
    ContentFilterRules,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Remove the whole line (normalizer) or chunk (content filter).
    Drop,
    /// Substitute every match with `replacement`.
    Replace,
}

/// Top-level rule table document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleTable {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: RuleKind,
    pub metadata: RuleMetadata,
    pub spec: RuleTableSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleMetadata {
    pub name: String,
    pub version: u32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RuleTableSpec {
    /// Evaluated in order.
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub noise_phrases: Vec<String>,
    #[serde(default = "default_noise_min_repeats")]
    pub noise_min_repeats: usize,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_noise_min_repeats() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RuleSpec {
    pub id: String,
    pub pattern: String,
    pub action: RuleAction,
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub description: Option<String>,
}

// ── Compiled types ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    pub action: RuleAction,
    pub regex: Regex,
    pub replacement: String,
}

#[derive(Debug, Clone)]
pub struct CompiledRuleTable {
    pub name: String,
    pub version: u32,
    pub kind: RuleKind,
    pub rules: Vec<CompiledRule>,
    pub noise_phrases: Vec<String>,
    pub noise_min_repeats: usize,
    pub keywords: Vec<String>,
}

impl CompiledRuleTable {
    pub fn drop_rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter().filter(|r| r.action == RuleAction::Drop)
    }

    pub fn replace_rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter().filter(|r| r.action == RuleAction::Replace)
    }

    /// Id of the first drop rule matching `text`, if any.
    pub fn first_drop_match(&self, text: &str) -> Option<&str> {
        self.drop_rules()
            .find(|r| r.regex.is_match(text))
            .map(|r| r.id.as_str())
    }
}

impl RuleTable {
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Validate and compile every pattern, preserving rule order.
    pub fn compile(&self, expected: RuleKind) -> Result<CompiledRuleTable, RuleError> {
        if self.api_version != API_VERSION {
            return Err(RuleError::UnsupportedVersion(self.api_version.clone()));
        }
        if self.kind != expected {
            return Err(RuleError::WrongKind {
                expected,
                found: self.kind,
            });
        }

        let line_rules = self.kind == RuleKind::NormalizerRules;
        let mut rules = Vec::with_capacity(self.spec.rules.len());
        for spec in &self.spec.rules {
            if line_rules && !is_line_rule(spec) {
                return Err(RuleError::NotLineRule { id: spec.id.clone() });
            }
            let regex = RegexBuilder::new(&spec.pattern)
                .case_insensitive(spec.case_insensitive)
                .multi_line(line_rules)
                .build()
                .map_err(|source| RuleError::InvalidPattern {
                    id: spec.id.clone(),
                    source,
                })?;
            rules.push(CompiledRule {
                id: spec.id.clone(),
                action: spec.action,
                regex,
                replacement: spec.replacement.clone(),
            });
        }

        Ok(CompiledRuleTable {
            name: self.metadata.name.clone(),
            version: self.metadata.version,
            kind: self.kind,
            rules,
            noise_phrases: self.spec.noise_phrases.clone(),
            noise_min_repeats: self.spec.noise_min_repeats.max(1),
            keywords: self.spec.keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }
}

fn is_line_rule(spec: &RuleSpec) -> bool {
    let p = spec.pattern.trim();
    spec.action == RuleAction::Drop && p.starts_with('^') && p.ends_with('$')
}

// ── Loading ─────────────────────────────────────────────────────────

/// Normalizer rules from `rules_dir/normalizer.yml`, or the built-in table.
pub fn normalizer_rules(rules_dir: Option<&Path>) -> Result<CompiledRuleTable, RuleError> {
    load_or_builtin(rules_dir, NORMALIZER_RULES_FILE, BUILTIN_NORMALIZER)?
        .compile(RuleKind::NormalizerRules)
}

/// Content filter rules from `rules_dir/content-filter.yml`, or the built-in table.
pub fn content_filter_rules(rules_dir: Option<&Path>) -> Result<CompiledRuleTable, RuleError> {
    load_or_builtin(rules_dir, CONTENT_FILTER_RULES_FILE, BUILTIN_CONTENT_FILTER)?
        .compile(RuleKind::ContentFilterRules)
}

fn load_or_builtin(
    rules_dir: Option<&Path>,
    file_name: &str,
    builtin: &str,
) -> Result<RuleTable, RuleError> {
    if let Some(dir) = rules_dir {
        let path = dir.join(file_name);
        if path.is_file() {
            tracing::info!(path = %path.display(), "loading rule table override");
            return RuleTable::load(&path);
        }
    }
    RuleTable::from_yaml(builtin)
}
