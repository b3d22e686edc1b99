//! User-supplied patterns that never fail to compile
//!
//! A malformed regular expression or glob from a tool caller must not abort a
//! search. Compilation always yields a matcher: the intended one, or a
//! literal fallback.

use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};

/// `*` stays within one path segment, `**` crosses segments, dotfiles are not special
const GLOB_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled content pattern
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    Regex(Regex),
    /// The pattern was not a valid regex and is matched as an escaped literal
    LiteralFallback(Regex),
    /// Even the escaped literal exceeded the regex size limit
    Never,
}

impl CompiledPattern {
    pub fn compile(pattern: &str, case_insensitive: bool) -> Self {
        match build_regex(pattern, case_insensitive) {
            Ok(regex) => Self::Regex(regex),
            Err(e) => {
                tracing::debug!(
                    "Pattern '{}' is not a valid regex ({}), matching it literally",
                    pattern,
                    e
                );
                match build_regex(&regex::escape(pattern), case_insensitive) {
                    Ok(literal) => Self::LiteralFallback(literal),
                    Err(e) => {
                        tracing::warn!("Pattern '{}' cannot be compiled at all: {}", pattern, e);
                        Self::Never
                    }
                }
            }
        }
    }

    /// First matched substring of `haystack`
    pub fn find<'h>(&self, haystack: &'h str) -> Option<&'h str> {
        match self {
            Self::Regex(regex) | Self::LiteralFallback(regex) => {
                regex.find(haystack).map(|m| m.as_str())
            }
            Self::Never => None,
        }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.find(haystack).is_some()
    }

    pub fn is_literal_fallback(&self) -> bool {
        matches!(self, Self::LiteralFallback(_))
    }
}

fn build_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
}

/// A compiled file path glob
#[derive(Debug, Clone)]
pub enum FileGlob {
    Pattern(Pattern),
    /// Unparseable globs compare the whole path literally
    Literal(String),
}

impl FileGlob {
    pub fn new(pattern: &str) -> Self {
        match Pattern::new(pattern) {
            Ok(compiled) => Self::Pattern(compiled),
            Err(e) => {
                tracing::debug!(
                    "Glob '{}' is invalid ({}), comparing paths literally",
                    pattern,
                    e
                );
                Self::Literal(pattern.to_string())
            }
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Pattern(pattern) => pattern.matches_with(path, GLOB_MATCH_OPTIONS),
            Self::Literal(literal) => literal == path,
        }
    }
}
