//! Decomposition of qualified field names.
//!
//! A qualified field name reads `schema[.element[.qualifier]][language]`,
//! for example `dc.contributor.author[en]`. The language suffix belongs to
//! the whole name, not to one segment.
//!
//! Every derived part is returned escaped for use inside a double-quoted XML
//! attribute.

use std::{borrow::Cow, sync::LazyLock};

use quick_xml::{escape::escape, events::BytesStart};
use regex::Regex;

pub(crate) const DCVALUE_TAG: &str = "dcvalue";

static LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w+)\]").expect("Invalid language suffix regex"));

/// Returns the part of `name` before the first `[`.
pub fn strip_language(name: &str) -> &str {
    name.split('[').next().unwrap_or(name)
}

/// Returns the escaped schema of `name`.
///
/// Leading and trailing underscores are trimmed, so `_local.note` belongs to
/// schema `local`.
pub fn schema_of(name: &str) -> String {
    let schema = strip_language(name)
        .split('.')
        .next()
        .unwrap_or_default()
        .trim_matches('_');
    escape(schema).into_owned()
}

/// Returns the escaped element of `name`, the second `.` segment.
pub fn element_of(name: &str) -> Option<String> {
    segment(name, 1)
}

/// Returns the escaped qualifier of `name`, the third `.` segment.
pub fn qualifier_of(name: &str) -> Option<String> {
    segment(name, 2)
}

/// Returns the escaped language suffix of `name`, e.g. `en` for `dc.title[en]`.
pub fn language_of(name: &str) -> Option<String> {
    LANGUAGE
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|language| escape(language.as_str()).into_owned())
}

fn segment(name: &str, index: usize) -> Option<String> {
    strip_language(name)
        .split('.')
        .nth(index)
        .map(|segment| escape(segment).into_owned())
}

/// A qualified field name split into its escaped parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    schema: String,
    element: Option<String>,
    qualifier: Option<String>,
    language: Option<String>,
}

impl QualifiedName {
    /// Splits `name` into schema, element, qualifier and language.
    ///
    /// Parsing never fails: a malformed name degrades to a bare schema with
    /// absent parts.
    pub fn parse(name: &str) -> Self {
        Self {
            schema: schema_of(name),
            element: element_of(name),
            qualifier: qualifier_of(name),
            language: language_of(name),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Opening `<dcvalue>` tag carrying element, qualifier and language, in
    /// that order. Absent parts are omitted.
    pub(crate) fn dcvalue_start(&self) -> BytesStart<'static> {
        let mut tag = BytesStart::new(DCVALUE_TAG);
        let parts = [
            ("element", self.element()),
            ("qualifier", self.qualifier()),
            ("language", self.language()),
        ];
        for (key, value) in parts {
            if let Some(value) = value {
                // values are escaped at parse time
                tag.push_attribute((key.as_bytes(), value.as_bytes()));
            }
        }
        tag
    }
}

/// Escapes a value for XML text or attribute content.
pub fn escape_value(value: &str) -> Cow<'_, str> {
    escape(value)
}
