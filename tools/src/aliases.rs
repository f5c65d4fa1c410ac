// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Removal of repeated `pub type` aliases from bindgen output.
//!
//! Under some configurations bindgen emits the same alias twice, e.g. when two
//! headers typedef the same integer type, and rustc then rejects the bindings
//! with E0428. Only the first alias of each name is kept.
//!
//! The match is purely textual and line based: an alias split over several
//! lines, or declared with another visibility, is left alone.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::trace;

#[allow(clippy::unwrap_used)]
static PUB_TYPE_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pub type\s+(\w+)\s*=").unwrap());

/// A declaration dropped because its name was already declared above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedAlias<'a> {
    /// The alias identifier.
    pub name: &'a str,
    /// 1-based line number in the input.
    pub line_number: usize,
    /// The dropped line, verbatim.
    pub line: &'a str,
}

/// Result of [`dedup_type_aliases`]. Borrows from the input text.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Deduplicated<'a> {
    lines: Vec<&'a str>,
    removed: Vec<RemovedAlias<'a>>,
}

impl<'a> Deduplicated<'a> {
    /// Surviving lines, in input order.
    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Dropped declarations, in input order.
    pub fn removed(&self) -> &[RemovedAlias<'a>] {
        &self.removed
    }

    /// True when no line was dropped.
    pub fn is_unchanged(&self) -> bool {
        self.removed.is_empty()
    }

    /// Number of lines the input was split into.
    pub fn input_line_count(&self) -> usize {
        self.lines.len() + self.removed.len()
    }

    /// Joins the surviving lines back together with `\n`.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Returns the identifier declared by `line` if it is a single-line
/// `pub type <ident> = ...` alias. Surrounding whitespace is ignored.
pub fn alias_name(line: &str) -> Option<&str> {
    PUB_TYPE_ALIAS
        .captures(line.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Drops every `pub type` alias whose name was already declared earlier in
/// `content`. All other lines are kept untouched and in order.
///
/// The input is split on `\n` only, so a trailing `\r` stays part of its line
/// and the output keeps the input's line endings.
pub fn dedup_type_aliases(content: &str) -> Deduplicated<'_> {
    let mut seen = HashSet::new();
    let mut result = Deduplicated::default();

    for (idx, line) in content.split('\n').enumerate() {
        match alias_name(line) {
            Some(name) if !seen.insert(name) => {
                trace!(name, line_number = idx + 1, "dropping duplicate alias");
                result.removed.push(RemovedAlias {
                    name,
                    line_number: idx + 1,
                    line,
                });
            }
            _ => result.lines.push(line),
        }
    }
    result
}
