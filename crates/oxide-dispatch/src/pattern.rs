//! Route pattern normalization and wildcard translation.
//!
//! Route strings may contain wildcard tokens:
//!
//! | token | matches |
//! |---|---|
//! | `(:alpha)` | `[A-Za-z]+` |
//! | `(:num)` | `[0-9]+` |
//! | `(:any)` | `[A-Za-z0-9.\-_%=]+` |
//! | `(:all)` | `.*` |
//!
//! Each token may be made optional with a `?` suffix (`/(:num?)`), in which
//! case it must be preceded by `/` and the slash becomes optional with it.
//! Text between tokens is passed to the regex engine as-is.

use regex::Regex;

use crate::error::{DispatchError, Result};

/// Normalized pattern of the root route.
pub const ROOT: &str = "/";

/// Character that opens a wildcard group.
pub const WILDCARD_OPENER: char = '(';

/// The character class behind a wildcard token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcard {
    /// `(:alpha)`
    Alpha,
    /// `(:num)`
    Num,
    /// `(:any)`
    Any,
    /// `(:all)`
    All,
}

impl Wildcard {
    /// Every wildcard, in substitution order.
    pub const ALL: [Self; 4] = [Self::Alpha, Self::Num, Self::Any, Self::All];

    /// Token name between `(:` and `)`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Num => "num",
            Self::Any => "any",
            Self::All => "all",
        }
    }

    /// Regex class the token expands to.
    pub const fn class(self) -> &'static str {
        match self {
            Self::Alpha => "[A-Za-z]+",
            Self::Num => "[0-9]+",
            Self::Any => r"[A-Za-z0-9.\-_%=]+",
            Self::All => ".*",
        }
    }

    fn mandatory_token(self) -> String {
        format!("(:{})", self.name())
    }

    fn optional_token(self) -> String {
        format!("/(:{}?)", self.name())
    }

    fn bare_optional_token(self) -> String {
        format!("(:{}?)", self.name())
    }
}

/// A lexed piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Mandatory(Wildcard),
    Optional(Wildcard),
}

/// Splits a pattern into literal text and wildcard tokens.
///
/// Optional tokens are recognized before mandatory ones so that `/(:any?)`
/// is never read as `/` followed by a malformed `(:any?)`.
fn lex(pattern: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < pattern.len() {
        let rest = &pattern[i..];
        let token = Wildcard::ALL
            .iter()
            .find_map(|w| {
                let t = w.optional_token();
                rest.starts_with(&t).then_some((Piece::Optional(*w), t.len()))
            })
            .or_else(|| {
                Wildcard::ALL.iter().find_map(|w| {
                    let t = w.mandatory_token();
                    rest.starts_with(&t).then_some((Piece::Mandatory(*w), t.len()))
                })
            });

        if let Some((piece, len)) = token {
            if literal_start < i {
                pieces.push(Piece::Literal(&pattern[literal_start..i]));
            }
            pieces.push(piece);
            i += len;
            literal_start = i;
        } else {
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    if literal_start < pattern.len() {
        pieces.push(Piece::Literal(&pattern[literal_start..]));
    }

    pieces
}

/// Rejects optional tokens that are not trailing `/`-prefixed segments.
fn check_optional(pattern: &str, pieces: &[Piece<'_>]) -> Result<()> {
    for (i, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Literal(text)
                if Wildcard::ALL
                    .iter()
                    .any(|w| text.contains(&w.bare_optional_token())) =>
            {
                return Err(DispatchError::Configuration(format!(
                    "optional wildcard in `{pattern}` must follow `/`"
                )));
            }
            Piece::Optional(_)
                if pieces[i + 1..]
                    .iter()
                    .any(|p| !matches!(p, Piece::Optional(_))) =>
            {
                return Err(DispatchError::Configuration(format!(
                    "optional wildcard in `{pattern}` must be a trailing segment"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Normalizes a route-definition string.
///
/// Dashes become underscores, surrounding whitespace and slashes are
/// stripped, and the empty string maps to [`ROOT`].
pub fn normalize_pattern(raw: &str) -> String {
    let pattern = raw.trim().replace('-', "_");
    let pattern = pattern.trim_matches('/');
    if pattern.is_empty() {
        ROOT.to_string()
    } else {
        pattern.to_string()
    }
}

/// Normalizes a request path: slashes trimmed, lower-cased, empty → [`ROOT`].
pub fn normalize_path(raw: &str) -> String {
    let path = raw.trim().trim_matches('/').to_lowercase();
    if path.is_empty() {
        ROOT.to_string()
    } else {
        path
    }
}

/// Folds dashes to underscores the way registration does.
///
/// Used as the exact-route lookup key and as the text wildcard routes are
/// matched against. The fold keeps byte offsets, so capture spans still
/// index into the unfolded path.
pub fn exact_key(normalized_path: &str) -> String {
    normalized_path.replace('-', "_")
}

/// Returns true if a normalized pattern is a fallback pattern.
pub fn is_pattern(normalized: &str) -> bool {
    normalized.starts_with(WILDCARD_OPENER)
}

/// Returns true if a pattern contains a wildcard group anywhere.
pub fn has_wildcards(normalized: &str) -> bool {
    normalized.contains(WILDCARD_OPENER)
}

/// A route pattern translated into an anchored regex.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    mandatory: usize,
    optional: usize,
}

impl CompiledPattern {
    /// Translates a normalized pattern.
    ///
    /// Optional tokens each open a non-capturing group; one `)?` closer per
    /// optional token is appended after the whole pattern, so later optional
    /// segments nest inside earlier ones.
    ///
    /// # Errors
    ///
    /// Fails on an empty pattern, on an optional token that is not a
    /// trailing `/`-prefixed segment, or when the translated text is not a
    /// valid regex.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_dispatch::CompiledPattern;
    ///
    /// let pattern = CompiledPattern::compile("users/(:num)").unwrap();
    /// assert_eq!(pattern.captures("users/42"), Some(vec!["42".to_string()]));
    /// assert_eq!(pattern.captures("users/abc"), None);
    /// ```
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(DispatchError::Configuration(
                "cannot compile an empty route pattern".to_string(),
            ));
        }

        let pieces = lex(pattern);
        check_optional(pattern, &pieces)?;

        let mut body = String::with_capacity(pattern.len() * 2);
        let mut mandatory = 0;
        let mut optional = 0;

        for piece in pieces {
            match piece {
                Piece::Literal(text) => body.push_str(text),
                Piece::Mandatory(w) => {
                    mandatory += 1;
                    body.push('(');
                    body.push_str(w.class());
                    body.push(')');
                }
                Piece::Optional(w) => {
                    optional += 1;
                    body.push_str("(?:/(");
                    body.push_str(w.class());
                    body.push(')');
                }
            }
        }

        let closers = ")?".repeat(optional);
        let regex = Regex::new(&format!("^{body}{closers}$")).map_err(|source| {
            DispatchError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            mandatory,
            optional,
        })
    }

    /// Matches a normalized path, returning the captured segments.
    ///
    /// The path is matched with dashes folded, like the pattern itself, but
    /// captures are cut from the path as given. They come back in
    /// left-to-right order. Optional groups that did not participate are
    /// dropped from the tail; interior gaps become empty strings so later
    /// positions keep their index.
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let folded = exact_key(path);
        let caps = self.regex.captures(&folded)?;

        let mut values: Vec<Option<String>> = caps
            .iter()
            .skip(1)
            .map(|m| m.and_then(|m| path.get(m.range())).map(str::to_string))
            .collect();

        while matches!(values.last(), Some(None)) {
            values.pop();
        }

        Some(values.into_iter().map(Option::unwrap_or_default).collect())
    }

    /// Returns the pattern this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the translated regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Number of mandatory wildcard tokens.
    pub const fn mandatory_count(&self) -> usize {
        self.mandatory
    }

    /// Number of optional wildcard tokens.
    pub const fn optional_count(&self) -> usize {
        self.optional
    }
}

/// Builds a URL path by filling a pattern's wildcards with `params`.
///
/// Parameters are consumed left to right. Once an optional token has no
/// parameter left, it and everything after it is dropped.
///
/// # Errors
///
/// Returns [`DispatchError::MissingParameter`] when a mandatory token has no
/// parameter.
///
/// # Example
///
/// ```
/// use oxide_dispatch::pattern::fill;
///
/// assert_eq!(fill("posts/(:num)/(:any?)", &["7"]).unwrap(), "/posts/7");
/// assert_eq!(fill("posts/(:num)/(:any?)", &["7", "intro"]).unwrap(), "/posts/7/intro");
/// ```
pub fn fill<S: AsRef<str>>(pattern: &str, params: &[S]) -> Result<String> {
    if pattern == ROOT {
        return Ok(ROOT.to_string());
    }

    let mut path = String::from("/");
    let mut params = params.iter().map(AsRef::as_ref).enumerate();
    let mut consumed = 0;

    for piece in lex(pattern) {
        match piece {
            Piece::Literal(text) => path.push_str(text),
            Piece::Mandatory(w) => {
                let (index, value) =
                    params.next().ok_or_else(|| DispatchError::MissingParameter {
                        index: consumed,
                        token: w.mandatory_token(),
                    })?;
                consumed = index + 1;
                path.push_str(value);
            }
            Piece::Optional(_) => match params.next() {
                Some((index, value)) => {
                    consumed = index + 1;
                    path.push('/');
                    path.push_str(value);
                }
                None => break,
            },
        }
    }

    Ok(path)
}
