// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette diagnostics.
//!
//! Unknown keys get a "did you mean" hint (Jaro-Winkler via `strsim`) and,
//! when the offending file is known, a label pointing at the key.

#![allow(unused_assignments)] // emitted by the miette derive

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity a candidate must beat before it is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A single problem found while loading `bosun.toml`.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no config table accepts.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(bosun::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The key as written in the file.
        key: String,
        /// Closest valid key, if any came near enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the enclosing table.
        valid_keys: String,
        /// Location of the key, when the source file is known.
        #[label("not a recognised key")]
        span: Option<SourceSpan>,
        /// Contents of the file the key came from.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the field's type.
    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(bosun::config::invalid_type), help("use a value of type {expected}"))]
    InvalidType {
        /// Dotted path such as `engine.command_buffer`.
        key: String,
        /// Found and expected types, as reported by figment.
        detail: String,
        /// The type the field wants.
        expected: String,
        /// Location of the value, when the source file is known.
        #[label("here")]
        span: Option<SourceSpan>,
        /// Contents of the file the value came from.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A required key with no default.
    #[error("required key `{key}` is missing")]
    #[diagnostic(code(bosun::config::missing_key), help("set `{key}` in bosun.toml"))]
    MissingKey {
        /// Dotted path of the missing key.
        key: String,
    },

    /// A value parsed fine but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(bosun::config::validation))]
    Validation {
        /// Which value broke which rule.
        message: String,
    },

    /// Anything figment reports that has no dedicated variant.
    #[error("configuration error: {0}")]
    #[diagnostic(code(bosun::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    if let Some(s) = suggestion {
        format!("did you mean `{s}`? Valid keys: {valid_keys}")
    } else {
        format!("valid keys: {valid_keys}")
    }
}

/// Map every error carried by `err` to a [`ConfigError`].
///
/// `sources` pairs a file path with its contents so spans can be attached
/// to unknown keys that came from that file.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert_one(&error, sources))
        .collect()
}

fn convert_one(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    let path: Vec<String> = error.path.clone();
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = locate(error, &path, field, sources).unzip();
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, *expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: qualified(&path, field),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: path.join("."),
            detail: format!("found {actual}, expected {expected}"),
            expected: expected.clone(),
            span: None,
            src: None,
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

fn qualified(path: &[String], field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", path.join("."))
    }
}

/// Resolve the file an error came from and the byte span of `field` in it.
fn locate(
    error: &figment::Error,
    path: &[String],
    field: &str,
    sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let origin = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(file) => file.display().to_string(),
        _ => return None,
    };
    let (name, content) = sources.iter().find(|(name, _)| *name == origin)?;
    let offset = find_key_offset(content, path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(name, content.clone()),
    ))
}

/// Byte offset of `field` as a key inside the table named by `path[0]`.
///
/// An empty `path` searches the whole document.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        None => 0,
        Some(table) => {
            let header = format!("[{table}]");
            content.find(&header)? + header.len()
        }
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let rest = &line[indent..];
        let is_key = rest
            .strip_prefix(field)
            .and_then(|tail| tail.chars().next())
            .is_some_and(|c| c == '=' || c == ' ' || c == '\t');
        if is_key {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Closest key to `unknown` by Jaro-Winkler similarity, above the threshold.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, candidates: &[S]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(unknown, c.as_ref()), c.as_ref()))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print each error to stderr with miette's graphical renderer.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
