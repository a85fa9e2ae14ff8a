//! Heuristic element naming from a signature line.
//!
//! There is no parser behind this. Rules are tried in a fixed order and the
//! first one that produces a name wins, so `if (x)` is happily named `if`.

use std::sync::LazyLock;

use regex::Regex;

/// `class Foo` / `struct Foo` anchored at the start of the signature.
static TYPE_DECL: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?:class|struct)\s+(\w+)").expect("valid regex"));

/// First word directly followed by an opening parenthesis.
static CALL: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(\w+)\s*\(").expect("valid regex"));

/// One naming rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentRule {
    /// `class Name` or `struct Name` at the start.
    TypeDecl,
    /// `name(` anywhere, leftmost match.
    Call,
    /// First whitespace-delimited token.
    FirstToken,
    /// `unnamed_<k>`, where `k` counts elements already emitted in the file.
    Synthesized,
}

/// A derived identifier and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    /// The identifier.
    pub name: String,
    /// Which rule matched.
    pub rule: IdentRule,
}

impl IdentRule {
    /// Rules that look at the signature, in evaluation order.
    pub const ORDER: [Self; 3] = [Self::TypeDecl, Self::Call, Self::FirstToken];

    /// Apply this rule alone. `Synthesized` never matches a signature.
    pub fn apply(self, sig: &str) -> Option<String> {
        return match self {
            Self::TypeDecl => first_capture(&TYPE_DECL, sig),
            Self::Call => first_capture(&CALL, sig),
            Self::FirstToken => sig.split_whitespace().next().map(str::to_string),
            Self::Synthesized => None,
        };
    }
}

/// Group 1 of the leftmost match, if any.
fn first_capture(re: &Regex, sig: &str) -> Option<String> {
    return re
        .captures(sig)
        .and_then(|caps| return caps.get(1))
        .map(|m| return m.as_str().to_string());
}

/// Run the signature rules in order and return the first hit.
pub fn derive(sig: &str) -> Option<Derived> {
    return IdentRule::ORDER.iter().find_map(|&rule| {
        return rule.apply(sig).map(|name| return Derived { name, rule });
    });
}

/// Derive a name, falling back to `unnamed_<emitted>` when no rule matches.
pub fn derive_or_synthesize(sig: &str, emitted: usize) -> Derived {
    return derive(sig).unwrap_or_else(|| {
        return Derived {
            name: format!("unnamed_{emitted}"),
            rule: IdentRule::Synthesized,
        };
    });
}
