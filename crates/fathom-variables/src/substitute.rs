use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{TemplateError, TemplateResolutionWarning};

/// `{{ root.path.0.key }}` with optional whitespace inside the braces.
/// Identifiers may contain `-` and `_` so node ids like `kb-1` resolve.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\{\{\s*([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}")
    .expect("reference pattern is valid")
});

/// How unresolved references are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
  /// Leave the reference verbatim and log a warning.
  #[default]
  Lenient,
  /// Fail on the first unresolved reference.
  Strict,
}

/// True if the string contains at least one `{{path}}` reference.
pub fn has_references(template: &str) -> bool {
  template.contains("{{") && REFERENCE.is_match(template)
}

/// Resolve a dot-separated path against the scope.
///
/// Returns `None` when the root or any intermediate segment is missing.
pub fn lookup<'a>(scope: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
  let mut segments = path.split('.');
  let mut current = scope.get(segments.next()?)?;

  for segment in segments {
    current = match current {
      Value::Object(map) => map.get(segment)?,
      Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
      _ => return None,
    };
  }

  Some(current)
}

/// Render a JSON value the way it appears inside substituted text.
pub fn stringify(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => "null".to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    other => serde_json::to_string(other).unwrap_or_default(),
  }
}

/// Substitute every reference in `template`, leaving unresolved ones as-is.
pub fn substitute(template: &str, scope: &Map<String, Value>) -> String {
  match substitute_with(template, scope, Strictness::Lenient) {
    Ok(rendered) => rendered,
    // Lenient substitution never fails.
    Err(_) => template.to_string(),
  }
}

/// Substitute every reference in `template` under the given strictness.
pub fn substitute_with(
  template: &str,
  scope: &Map<String, Value>,
  strictness: Strictness,
) -> Result<String, TemplateError> {
  if !template.contains("{{") {
    return Ok(template.to_string());
  }

  let mut unresolved: Option<String> = None;
  let rendered = REFERENCE.replace_all(template, |caps: &Captures| {
    let path = &caps[1];
    match lookup(scope, path) {
      Some(value) => stringify(value),
      None => {
        report_unresolved(path, strictness, &mut unresolved);
        caps[0].to_string()
      }
    }
  });

  match unresolved {
    Some(reference) => Err(TemplateError::Unresolved { reference }),
    None => Ok(rendered.into_owned()),
  }
}

/// Recursively substitute references in every string inside `value`.
/// Numbers, booleans and nulls pass through untouched.
pub fn substitute_value(value: &Value, scope: &Map<String, Value>) -> Value {
  match substitute_value_with(value, scope, Strictness::Lenient) {
    Ok(resolved) => resolved,
    Err(_) => value.clone(),
  }
}

pub fn substitute_value_with(
  value: &Value,
  scope: &Map<String, Value>,
  strictness: Strictness,
) -> Result<Value, TemplateError> {
  Ok(match value {
    Value::String(s) => Value::String(substitute_with(s, scope, strictness)?),
    Value::Array(items) => Value::Array(
      items
        .iter()
        .map(|item| substitute_value_with(item, scope, strictness))
        .collect::<Result<_, _>>()?,
    ),
    Value::Object(map) => {
      let mut resolved = Map::with_capacity(map.len());
      for (key, item) in map {
        resolved.insert(key.clone(), substitute_value_with(item, scope, strictness)?);
      }
      Value::Object(resolved)
    }
    other => other.clone(),
  })
}

/// Resolve a template to a JSON value.
///
/// A template that is exactly one reference yields the referenced value with
/// its structure intact; anything else yields the substituted string.
pub fn resolve_value(template: &str, scope: &Map<String, Value>) -> Value {
  match resolve_value_with(template, scope, Strictness::Lenient) {
    Ok(value) => value,
    Err(_) => Value::String(template.to_string()),
  }
}

pub fn resolve_value_with(
  template: &str,
  scope: &Map<String, Value>,
  strictness: Strictness,
) -> Result<Value, TemplateError> {
  if let Some(path) = single_reference(template) {
    if let Some(value) = lookup(scope, path) {
      return Ok(value.clone());
    }
  }
  substitute_with(template, scope, strictness).map(Value::String)
}

/// The path of a template consisting of exactly one reference.
pub(crate) fn single_reference(template: &str) -> Option<&str> {
  let trimmed = template.trim();
  let caps = REFERENCE.captures(trimmed)?;
  let whole = caps.get(0)?;
  if whole.start() == 0 && whole.end() == trimmed.len() {
    caps.get(1).map(|m| m.as_str())
  } else {
    None
  }
}

/// Replace references with literals an expression parser accepts.
///
/// Strings become quoted literals, objects and arrays become JSON literals,
/// null becomes `none`. Unresolved references become `none` in lenient mode.
pub(crate) fn inline_literals(
  expression: &str,
  scope: &Map<String, Value>,
  strictness: Strictness,
) -> Result<String, TemplateError> {
  if !expression.contains("{{") {
    return Ok(expression.to_string());
  }

  let mut unresolved: Option<String> = None;
  let rendered = REFERENCE.replace_all(expression, |caps: &Captures| {
    let path = &caps[1];
    match lookup(scope, path) {
      Some(Value::Null) => "none".to_string(),
      Some(value) => serde_json::to_string(value).unwrap_or_else(|_| "none".to_string()),
      None => {
        report_unresolved(path, strictness, &mut unresolved);
        "none".to_string()
      }
    }
  });

  match unresolved {
    Some(reference) => Err(TemplateError::Unresolved { reference }),
    None => Ok(rendered.into_owned()),
  }
}

fn report_unresolved(path: &str, strictness: Strictness, unresolved: &mut Option<String>) {
  match strictness {
    Strictness::Lenient => {
      let warning = TemplateResolutionWarning {
        reference: path.to_string(),
      };
      warn!(reference = %path, "{}", warning);
    }
    Strictness::Strict => {
      if unresolved.is_none() {
        *unresolved = Some(path.to_string());
      }
    }
  }
}
