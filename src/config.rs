//! The configuration subsystem: pull/push option updates, coerced
//! against each option's declared static type, with type-preserving
//! fallback to the previous value on mismatch.
//!
//! Because Rust has no compile-time field reflection, [`Config`]'s options
//! are declared once in [`DESCRIPTORS`], a static table of [`OptionDescriptor`]s
//! keyed by their wire name (`zls.<option>`). Everything else in this module
//! — building the pull request, merging a push update, answering a single
//! `workspace/configuration` item — is generic over that table.

use lsp_types::ConfigurationItem;
use serde_json::Value;

/// The fixed id every `workspace/configuration` pull request carries.
pub const PULL_REQUEST_ID: &str = "i_haz_configuration";

/// The effective configuration record. Process-lifetime; mutated only
/// through [`Config::apply_pull_response`] / [`Config::apply_push`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub zig_exe_path: String,
    pub zig_lib_path: String,
    pub build_runner_path: String,
    pub enable_snippets: bool,
    pub enable_inlay_hints: bool,
    pub enable_autofix: bool,
    pub warn_style: bool,
    pub semantic_tokens: SemanticTokensMode,
    pub max_inlay_hint_length: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            zig_exe_path: "zig".to_string(),
            zig_lib_path: String::new(),
            build_runner_path: String::new(),
            enable_snippets: true,
            enable_inlay_hints: true,
            enable_autofix: false,
            warn_style: false,
            semantic_tokens: SemanticTokensMode::Full,
            max_inlay_hint_length: 0,
        }
    }
}

/// The enum-typed `zls.semanticTokens` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticTokensMode {
    Full,
    Partial,
    None,
}

impl SemanticTokensMode {
    const VARIANTS: &'static [&'static str] = &["full", "partial", "none"];

    fn as_str(self) -> &'static str {
        match self {
            SemanticTokensMode::Full => "full",
            SemanticTokensMode::Partial => "partial",
            SemanticTokensMode::None => "none",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "full" => Some(SemanticTokensMode::Full),
            "partial" => Some(SemanticTokensMode::Partial),
            "none" => Some(SemanticTokensMode::None),
            _ => None,
        }
    }
}

/// The declared static type of an option, used to drive coercion.
pub enum OptionKind {
    String,
    Bool,
    Int { min: i64, max: i64 },
    Enum(&'static [&'static str]),
}

/// A reflection stand-in for one `Config` field: its wire key, declared type, and a pair of
/// closures that get/set the field on an owned `Config`.
pub struct OptionDescriptor {
    /// Wire key, e.g. `"zls.zigExePath"`.
    pub key: &'static str,
    pub kind: OptionKind,
    get: fn(&Config) -> Value,
    set: fn(&mut Config, Value) -> SetOutcome,
}

impl OptionDescriptor {
    /// The portion of `key` after the `zls.` prefix.
    pub fn short_name(&self) -> &'static str {
        self.key.strip_prefix("zls.").unwrap_or(self.key)
    }
}

enum SetOutcome {
    Changed,
    Unchanged,
    /// Rejected with a human-readable reason; the field is left untouched.
    Rejected(String),
}

/// Trims a string option and rejects empty strings or the literal `"nil"`
/// sentinel.
fn coerce_string(value: &Value) -> Result<String, String> {
    let Value::String(s) = value else {
        return Err(format!("expected a string, got {value}"));
    };
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "nil" {
        return Err(format!("rejected empty/nil string value {s:?}"));
    }
    Ok(trimmed.to_string())
}

fn coerce_bool(value: &Value) -> Result<bool, String> {
    value.as_bool().ok_or_else(|| format!("expected a bool, got {value}"))
}

fn coerce_int(value: &Value, min: i64, max: i64) -> Result<i64, String> {
    let n = value.as_i64().ok_or_else(|| format!("expected an integer, got {value}"))?;
    if n < min || n > max {
        return Err(format!("{n} is outside the allowed range [{min}, {max}]"));
    }
    Ok(n)
}

fn coerce_enum(value: &Value, variants: &[&'static str]) -> Result<&'static str, String> {
    let s = value.as_str().ok_or_else(|| format!("expected a string, got {value}"))?;
    variants
        .iter()
        .find(|v| **v == s)
        .copied()
        .ok_or_else(|| format!("{s:?} is not one of {variants:?}"))
}

/// The static option table: the single source of truth for the pull
/// request's item list, the push merger, and per-item coercion.
pub static DESCRIPTORS: &[OptionDescriptor] = &[
    OptionDescriptor {
        key: "zls.zigExePath",
        kind: OptionKind::String,
        get: |c| Value::String(c.zig_exe_path.clone()),
        set: |c, v| match coerce_string(&v) {
            Ok(s) if s == c.zig_exe_path => SetOutcome::Unchanged,
            Ok(s) => {
                c.zig_exe_path = s;
                SetOutcome::Changed
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
    OptionDescriptor {
        key: "zls.zigLibPath",
        kind: OptionKind::String,
        get: |c| Value::String(c.zig_lib_path.clone()),
        set: |c, v| match coerce_string(&v) {
            Ok(s) if s == c.zig_lib_path => SetOutcome::Unchanged,
            Ok(s) => {
                c.zig_lib_path = s;
                SetOutcome::Changed
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
    OptionDescriptor {
        key: "zls.buildRunnerPath",
        kind: OptionKind::String,
        get: |c| Value::String(c.build_runner_path.clone()),
        set: |c, v| match coerce_string(&v) {
            Ok(s) if s == c.build_runner_path => SetOutcome::Unchanged,
            Ok(s) => {
                c.build_runner_path = s;
                SetOutcome::Changed
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
    OptionDescriptor {
        key: "zls.enableSnippets",
        kind: OptionKind::Bool,
        get: |c| Value::Bool(c.enable_snippets),
        set: |c, v| match coerce_bool(&v) {
            Ok(b) if b == c.enable_snippets => SetOutcome::Unchanged,
            Ok(b) => {
                c.enable_snippets = b;
                SetOutcome::Changed
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
    OptionDescriptor {
        key: "zls.enableInlayHints",
        kind: OptionKind::Bool,
        get: |c| Value::Bool(c.enable_inlay_hints),
        set: |c, v| match coerce_bool(&v) {
            Ok(b) if b == c.enable_inlay_hints => SetOutcome::Unchanged,
            Ok(b) => {
                c.enable_inlay_hints = b;
                SetOutcome::Changed
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
    OptionDescriptor {
        key: "zls.enableAutofix",
        kind: OptionKind::Bool,
        get: |c| Value::Bool(c.enable_autofix),
        set: |c, v| match coerce_bool(&v) {
            Ok(b) if b == c.enable_autofix => SetOutcome::Unchanged,
            Ok(b) => {
                c.enable_autofix = b;
                SetOutcome::Changed
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
    OptionDescriptor {
        key: "zls.warnStyle",
        kind: OptionKind::Bool,
        get: |c| Value::Bool(c.warn_style),
        set: |c, v| match coerce_bool(&v) {
            Ok(b) if b == c.warn_style => SetOutcome::Unchanged,
            Ok(b) => {
                c.warn_style = b;
                SetOutcome::Changed
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
    OptionDescriptor {
        key: "zls.semanticTokens",
        kind: OptionKind::Enum(SemanticTokensMode::VARIANTS),
        get: |c| Value::String(c.semantic_tokens.as_str().to_string()),
        set: |c, v| match coerce_enum(&v, SemanticTokensMode::VARIANTS) {
            Ok(s) => {
                let mode = SemanticTokensMode::from_str(s).expect("variant already validated");
                if mode == c.semantic_tokens {
                    SetOutcome::Unchanged
                } else {
                    c.semantic_tokens = mode;
                    SetOutcome::Changed
                }
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
    OptionDescriptor {
        key: "zls.maxInlayHintLength",
        kind: OptionKind::Int { min: 0, max: 1024 },
        get: |c| Value::from(c.max_inlay_hint_length),
        set: |c, v| match coerce_int(&v, 0, 1024) {
            Ok(n) if n == c.max_inlay_hint_length => SetOutcome::Unchanged,
            Ok(n) => {
                c.max_inlay_hint_length = n;
                SetOutcome::Changed
            }
            Err(reason) => SetOutcome::Rejected(reason),
        },
    },
];

/// A non-fatal rejection emitted while applying a configuration update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: &'static str,
    pub reason: String,
}

/// Outcome of applying a pull response or a push update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigUpdateReport {
    pub warnings: Vec<ConfigWarning>,
    /// True if `zls.zigExePath` changed, signaling the document store's
    /// build-file cache must be invalidated.
    pub toolchain_path_changed: bool,
    /// True if any option actually changed value.
    pub changed: bool,
}

impl Config {
    /// Builds the `workspace/configuration` request items, one per
    /// descriptor, each keyed `zls.<option>`.
    pub fn pull_request_items() -> Vec<ConfigurationItem> {
        DESCRIPTORS
            .iter()
            .map(|d| ConfigurationItem { scope_uri: None, section: Some(d.key.to_string()) })
            .collect()
    }

    /// Applies an ordered pull response: `values[i]` corresponds to
    /// `DESCRIPTORS[i]`.
    /// A response shorter than the descriptor table only updates the
    /// options it has entries for.
    pub fn apply_pull_response(&mut self, values: Vec<Value>) -> ConfigUpdateReport {
        let mut report = ConfigUpdateReport::default();
        for (descriptor, value) in DESCRIPTORS.iter().zip(values.into_iter()) {
            self.apply_one(descriptor, value, &mut report);
        }
        report
    }

    /// Applies a `workspace/didChangeConfiguration` push. `settings`
    /// is interpreted as its `zls` sub-object if present, else as the whole
    /// value; every descriptor whose short name is present in that object is
    /// coerced and applied.
    pub fn apply_push(&mut self, settings: &Value) -> ConfigUpdateReport {
        let mut report = ConfigUpdateReport::default();
        let scoped = settings.get("zls").unwrap_or(settings);
        let Some(obj) = scoped.as_object() else {
            return report;
        };
        for descriptor in DESCRIPTORS {
            if let Some(value) = obj.get(descriptor.short_name()) {
                self.apply_one(descriptor, value.clone(), &mut report);
            }
        }
        report
    }

    fn apply_one(&mut self, descriptor: &OptionDescriptor, value: Value, report: &mut ConfigUpdateReport) {
        if value.is_null() {
            return;
        }
        match (descriptor.set)(self, value) {
            SetOutcome::Changed => {
                report.changed = true;
                if descriptor.key == "zls.zigExePath" {
                    report.toolchain_path_changed = true;
                }
                log::debug!("configuration option {} updated", descriptor.key);
            }
            SetOutcome::Unchanged => {}
            SetOutcome::Rejected(reason) => {
                log::warn!("configuration option {} rejected: {reason}", descriptor.key);
                report.warnings.push(ConfigWarning { key: descriptor.key, reason });
            }
        }
    }

    /// Reads the current value of every option, keyed by its wire name —
    /// used to answer a single `workspace/configuration` item outside of a
    /// full pull cycle.
    pub fn snapshot(&self) -> Vec<(&'static str, Value)> {
        DESCRIPTORS.iter().map(|d| (d.key, (d.get)(self))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pull_request_enumerates_every_option_prefixed_zls() {
        let items = Config::pull_request_items();
        assert_eq!(items.len(), DESCRIPTORS.len());
        assert!(items.iter().all(|i| i.section.as_deref().unwrap().starts_with("zls.")));
    }

    #[test]
    fn pull_response_updates_matching_options_in_order() {
        let mut config = Config::default();
        let values: Vec<Value> = DESCRIPTORS
            .iter()
            .map(|d| match d.key {
                "zls.zigExePath" => json!("/usr/bin/zig"),
                _ => (d.get)(&config),
            })
            .collect();
        let report = config.apply_pull_response(values);
        assert_eq!(config.zig_exe_path, "/usr/bin/zig");
        assert!(report.changed);
        assert!(report.toolchain_path_changed);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn string_option_trims_and_rejects_nil_sentinel() {
        let mut config = Config::default();
        let report = config.apply_push(&json!({"zigExePath": "  /opt/zig  "}));
        assert_eq!(config.zig_exe_path, "/opt/zig");
        assert!(report.warnings.is_empty());

        let before = config.zig_exe_path.clone();
        let report = config.apply_push(&json!({"zigExePath": "nil"}));
        assert_eq!(config.zig_exe_path, before);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn type_mismatch_keeps_previous_value_and_warns() {
        let mut config = Config::default();
        let before = config.enable_snippets;
        let report = config.apply_push(&json!({"enableSnippets": "yes"}));
        assert_eq!(config.enable_snippets, before);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].key, "zls.enableSnippets");
    }

    #[test]
    fn int_option_rejects_out_of_range_value() {
        let err = coerce_int(&json!(999), 0, 10).unwrap_err();
        assert!(err.contains("outside the allowed range"));
        assert_eq!(coerce_int(&json!(5), 0, 10), Ok(5));
    }

    #[test]
    fn int_option_applies_and_rejects_through_the_descriptor_table() {
        let mut config = Config::default();
        let report = config.apply_push(&json!({"maxInlayHintLength": 40}));
        assert_eq!(config.max_inlay_hint_length, 40);
        assert!(report.changed);
        assert!(report.warnings.is_empty());

        let report = config.apply_push(&json!({"maxInlayHintLength": 5000}));
        assert_eq!(config.max_inlay_hint_length, 40);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn enum_option_requires_known_variant() {
        let mut config = Config::default();
        let report = config.apply_push(&json!({"semanticTokens": "bogus"}));
        assert_eq!(config.semantic_tokens, SemanticTokensMode::Full);
        assert_eq!(report.warnings.len(), 1);

        let report = config.apply_push(&json!({"semanticTokens": "partial"}));
        assert_eq!(config.semantic_tokens, SemanticTokensMode::Partial);
        assert!(report.warnings.is_empty());
        assert!(report.changed);
    }

    #[test]
    fn push_prefers_zls_sub_object_over_whole_settings() {
        let mut config = Config::default();
        config.apply_push(&json!({"zls": {"enableAutofix": true}, "enableAutofix": false}));
        assert!(config.enable_autofix);
    }

    #[test]
    fn push_falls_back_to_whole_settings_when_no_zls_key() {
        let mut config = Config::default();
        config.apply_push(&json!({"enableAutofix": true}));
        assert!(config.enable_autofix);
    }

    #[test]
    fn null_settings_value_is_a_no_op() {
        let mut config = Config::default();
        let before = config.clone();
        config.apply_push(&json!({"zigExePath": null}));
        assert_eq!(config, before);
    }
}
