use thiserror::Error;

use crate::config::keymap::ContextSpec;
use crate::config::Config;

use super::buffer::Buffer;
use super::prefix::{is_prefixed, PrefixState};
use super::scope::ScopeEngine;
use super::selection::SelectionSet;

/// A wrong boolean here would corrupt keybinding dispatch, so an unknown
/// operator is fatal rather than silently defaulted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("unsupported context operator {0:?}")]
    UnsupportedOperator(String),
}

/// The selector namespace, parsed once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `latex_prefix_key`
    PrefixKey,
    /// `latex_prefix_key.math_selector`
    MathSelector,
    /// `latex_prefix_key.default_prefix_key_enabled`
    DefaultPrefixKeyEnabled,
    /// `latex_prefix_key.mode` or `latex_prefix_key.mode.<name>`
    Mode(Option<String>),
}

impl Selector {
    /// `None` for anything outside the `latex_prefix_key` namespace;
    /// those queries belong to other providers.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "latex_prefix_key" {
            return Some(Selector::PrefixKey);
        }
        let rest = raw.strip_prefix("latex_prefix_key.")?;
        match rest {
            "math_selector" => Some(Selector::MathSelector),
            "default_prefix_key_enabled" => Some(Selector::DefaultPrefixKeyEnabled),
            "mode" => Some(Selector::Mode(None)),
            _ => {
                let name = rest.strip_prefix("mode.")?;
                if name.is_empty() {
                    Some(Selector::Mode(None))
                } else {
                    Some(Selector::Mode(Some(name.to_string())))
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOp {
    Equal,
    NotEqual,
}

impl QueryOp {
    pub fn parse(raw: &str) -> Result<Self, ContextError> {
        match raw {
            "equal" => Ok(QueryOp::Equal),
            "not_equal" => Ok(QueryOp::NotEqual),
            other => Err(ContextError::UnsupportedOperator(other.to_string())),
        }
    }

    pub fn compare(self, result: bool, operand: bool) -> bool {
        match self {
            QueryOp::Equal => result == operand,
            QueryOp::NotEqual => result != operand,
        }
    }
}

/// Read-only view state a context query is evaluated against.
pub struct QueryInput<'a> {
    pub buffer: &'a Buffer,
    pub selections: &'a SelectionSet,
    pub prefix: &'a PrefixState,
    pub config: &'a Config,
    pub scopes: &'a ScopeEngine,
}

impl QueryInput<'_> {
    /// Mode-scoped enabled check: label suffix must match (any mode when
    /// `mode` is `None`) and the view must still be prefixed.
    fn mode_enabled(&self, mode: Option<&str>) -> bool {
        let Some(prefix) = self.prefix.prefix() else {
            return false;
        };
        let label = self.prefix.mode_label().unwrap_or("");
        let is_mode = match mode {
            None => true,
            Some(m) => label.ends_with(m),
        };
        is_mode && is_prefixed(self.buffer, self.selections, prefix)
    }

    /// Scope check against the configured math selector, aggregated over
    /// the caret set with AND (`match_all`) or OR semantics.
    fn math_scope(&self, match_all: bool) -> bool {
        let selector = &self.config.math_scope_selector;
        let check = |sel: &crate::editor::selection::Selection| {
            self.scopes.score_selector(self.buffer, sel.end, selector)
        };
        if match_all {
            self.selections.iter().all(check)
        } else {
            self.selections.iter().any(check)
        }
    }
}

/// Evaluate one keybinding context query.
///
/// Selectors outside our namespace resolve to false (defer to other
/// providers). Mode names starting with "math" are additionally gated by
/// the scope check, which is how math-only modes stay out of text scopes.
pub fn evaluate(spec: &ContextSpec, input: &QueryInput<'_>) -> Result<bool, ContextError> {
    let Some(selector) = Selector::parse(&spec.key) else {
        return Ok(false);
    };
    let op = QueryOp::parse(&spec.operator)?;

    let result = match &selector {
        Selector::PrefixKey => input.mode_enabled(None),
        Selector::MathSelector => input.math_scope(spec.match_all),
        Selector::DefaultPrefixKeyEnabled => !input.config.disable_default_prefix_key,
        Selector::Mode(mode) => {
            let mut enabled = input.mode_enabled(mode.as_deref());
            if enabled && mode.as_deref().is_some_and(|m| m.starts_with("math")) {
                enabled = input.math_scope(spec.match_all);
            }
            enabled
        }
    };

    Ok(op.compare(result, spec.operand))
}
