//! RDF terms and triples as stored in an HDT dictionary.
//!
//! Dictionary strings carry their kind in a leading marker: `_:` for blank
//! nodes, `"` for literals (closed by the *last* quote and optionally
//! followed by `^^<datatype>` or `@lang`), anything else is an IRI.

use std::fmt;

/// RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// IRI/URI node.
    Iri(String),
    /// Blank node label, without the `_:` prefix.
    BNode(String),
    /// Literal with optional datatype or language tag.
    Literal {
        lex: String,
        dt: Option<String>,
        lang: Option<String>,
    },
}

impl Term {
    pub fn iri(s: impl Into<String>) -> Self {
        Term::Iri(s.into())
    }

    /// Blank node; a leading `_:` is stripped.
    pub fn bnode(label: impl Into<String>) -> Self {
        let label = label.into();
        match label.strip_prefix("_:") {
            Some(rest) => Term::BNode(rest.to_string()),
            None => Term::BNode(label),
        }
    }

    pub fn literal(lex: impl Into<String>) -> Self {
        Term::Literal {
            lex: lex.into(),
            dt: None,
            lang: None,
        }
    }

    pub fn typed_literal(lex: impl Into<String>, dt: impl Into<String>) -> Self {
        Term::Literal {
            lex: lex.into(),
            dt: Some(dt.into()),
            lang: None,
        }
    }

    pub fn lang_literal(lex: impl Into<String>, lang: impl Into<String>) -> Self {
        Term::Literal {
            lex: lex.into(),
            dt: None,
            lang: Some(lang.into()),
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    /// Parse a dictionary string.
    pub fn from_hdt_str(s: &str) -> Self {
        classify(s, 0, false)
    }

    /// Render the dictionary string for this term. Backslashes are written
    /// as `\u005C` so that unescaping on read is lossless.
    pub fn to_hdt_string(&self) -> String {
        let raw = match self {
            Term::Iri(s) => s.clone(),
            Term::BNode(b) => format!("_:{b}"),
            Term::Literal { lex, dt, lang } => match (dt, lang) {
                (Some(dt), _) => format!("\"{lex}\"^^<{dt}>"),
                (None, Some(lang)) => format!("\"{lex}\"@{lang}"),
                (None, None) => format!("\"{lex}\""),
            },
        };
        if raw.contains('\\') {
            raw.replace('\\', "\\u005C")
        } else {
            raw
        }
    }
}

impl fmt::Display for Term {
    /// N-Triples term syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(s) => write!(f, "<{s}>"),
            Term::BNode(b) => write!(f, "_:{b}"),
            Term::Literal { lex, dt, lang } => {
                f.write_str("\"")?;
                for c in lex.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")?;
                if let Some(dt) = dt {
                    write!(f, "^^<{dt}>")
                } else if let Some(lang) = lang {
                    write!(f, "@{lang}")
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Subject, predicate, object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

impl From<(Term, Term, Term)> for Triple {
    fn from((s, p, o): (Term, Term, Term)) -> Self {
        Triple::new(s, p, o)
    }
}

/// Classify a raw dictionary string decoded for `id`. With `simplify_bnodes`
/// blank nodes get the synthetic label `b<id>`.
pub(crate) fn classify(raw: &str, id: u64, simplify_bnodes: bool) -> Term {
    let unescaped;
    let s = if raw.contains('\\') {
        unescaped = unescape(raw);
        unescaped.as_str()
    } else {
        raw
    };
    if let Some(label) = s.strip_prefix("_:") {
        return if simplify_bnodes {
            Term::BNode(format!("b{id}"))
        } else {
            Term::BNode(label.to_string())
        };
    }
    if let Some(body) = s.strip_prefix('"') {
        let Some(close) = body.rfind('"') else {
            return Term::literal(body);
        };
        let lex = body[..close].to_string();
        let suffix = &body[close + 1..];
        if let Some(dt) = suffix.strip_prefix("^^<") {
            let dt = dt.strip_suffix('>').unwrap_or(dt);
            return Term::typed_literal(lex, dt);
        }
        if let Some(lang) = suffix.strip_prefix('@') {
            return Term::lang_literal(lex, lang);
        }
        return Term::literal(lex);
    }
    Term::Iri(s.to_string())
}

/// Replace `\uXXXX` and `\UXXXXXXXX` escapes; malformed escapes are kept verbatim.
pub(crate) fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find('\\') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        match decode_escape(rest) {
            Some((c, used)) => {
                out.push(c);
                rest = &rest[used..];
            }
            None => {
                out.push('\\');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one escape at the start of `s`; returns the char and bytes consumed.
fn decode_escape(s: &str) -> Option<(char, usize)> {
    let (digits, len) = match s.as_bytes().get(1)? {
        b'u' => (4, 6),
        b'U' => (8, 10),
        _ => return None,
    };
    let hex = s.get(2..2 + digits)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let code = u32::from_str_radix(hex, 16).ok()?;
    if let Some(c) = char::from_u32(code) {
        return Some((c, len));
    }
    // high surrogate followed by an escaped low surrogate
    if digits == 4 && (0xD800..0xDC00).contains(&code) {
        let next = s.get(len..)?;
        if next.starts_with("\\u") {
            let low_hex = next.get(2..6)?;
            if !low_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let low = u32::from_str_radix(low_hex, 16).ok()?;
            if (0xDC00..0xE000).contains(&low) {
                let c = char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00))?;
                return Some((c, len + 6));
            }
        }
    }
    None
}

#[cfg(feature = "oxigraph")]
mod ox {
    use super::{Term, Triple};
    use crate::error::HdtError;
    use oxigraph::model as ox;

    const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    impl TryFrom<&Term> for ox::Term {
        type Error = HdtError;

        fn try_from(t: &Term) -> Result<Self, HdtError> {
            Ok(match t {
                Term::Iri(s) => ox::NamedNode::new(s.as_str())
                    .map_err(|_| HdtError::Invalid(format!("invalid IRI {s}")))?
                    .into(),
                Term::BNode(b) => ox::BlankNode::new(b.as_str())
                    .map_err(|_| HdtError::Invalid(format!("invalid blank node {b}")))?
                    .into(),
                Term::Literal { lex, dt, lang } => {
                    if let Some(dt) = dt {
                        let nn = ox::NamedNode::new(dt.as_str())
                            .map_err(|_| HdtError::Invalid(format!("invalid datatype IRI {dt}")))?;
                        ox::Literal::new_typed_literal(lex.as_str(), nn).into()
                    } else if let Some(lang) = lang {
                        ox::Literal::new_language_tagged_literal(lex.as_str(), lang.as_str())
                            .map_err(|_| HdtError::Invalid(format!("invalid lang tag {lang}")))?
                            .into()
                    } else {
                        ox::Literal::new_simple_literal(lex.as_str()).into()
                    }
                }
            })
        }
    }

    impl TryFrom<&Triple> for ox::Triple {
        type Error = HdtError;

        fn try_from(t: &Triple) -> Result<Self, HdtError> {
            let s: ox::NamedOrBlankNode = match &t.subject {
                Term::Iri(s) => ox::NamedNode::new(s.as_str())
                    .map_err(|_| HdtError::Invalid(format!("invalid subject IRI {s}")))?
                    .into(),
                Term::BNode(b) => ox::BlankNode::new(b.as_str())
                    .map_err(|_| HdtError::Invalid(format!("invalid blank node {b}")))?
                    .into(),
                Term::Literal { .. } => {
                    return Err(HdtError::Invalid("literal subject".into()));
                }
            };
            let p = match &t.predicate {
                Term::Iri(p) => ox::NamedNode::new(p.as_str())
                    .map_err(|_| HdtError::Invalid(format!("invalid predicate IRI {p}")))?,
                _ => return Err(HdtError::Invalid("non-IRI predicate".into())),
            };
            let o = ox::Term::try_from(&t.object)?;
            Ok(ox::Triple::new(s, p, o))
        }
    }

    impl TryFrom<ox::Term> for Term {
        type Error = HdtError;

        fn try_from(t: ox::Term) -> Result<Self, HdtError> {
            Ok(match t {
                ox::Term::NamedNode(n) => Term::Iri(n.into_string()),
                ox::Term::BlankNode(b) => Term::BNode(b.into_string()),
                ox::Term::Literal(l) => {
                    let lex = l.value().to_string();
                    let lang = l.language().map(str::to_string);
                    let dt = l.datatype().as_str();
                    let dt = (lang.is_none() && dt != XSD_STRING).then(|| dt.to_string());
                    Term::Literal { lex, dt, lang }
                }
                #[allow(unreachable_patterns)]
                _ => return Err(HdtError::Invalid("unsupported term kind".into())),
            })
        }
    }

    impl TryFrom<ox::Triple> for Triple {
        type Error = HdtError;

        fn try_from(t: ox::Triple) -> Result<Self, HdtError> {
            let s = Term::try_from(ox::Term::from(t.subject))?;
            let p = Term::Iri(t.predicate.into_string());
            let o = Term::try_from(t.object)?;
            Ok(Triple::new(s, p, o))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_leading_marker() {
        assert_eq!(classify("_:node1", 7, false), Term::bnode("node1"));
        assert_eq!(classify("_:node1", 7, true), Term::BNode("b7".into()));
        assert_eq!(
            classify("http://example.org/a", 1, false),
            Term::iri("http://example.org/a")
        );
        assert_eq!(classify("\"plain\"", 1, false), Term::literal("plain"));
        assert_eq!(
            classify("\"chat\"@fr", 1, false),
            Term::lang_literal("chat", "fr")
        );
        assert_eq!(
            classify("\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>", 1, false),
            Term::typed_literal("42", "http://www.w3.org/2001/XMLSchema#integer")
        );
    }

    #[test]
    fn literal_closes_at_last_quote() {
        assert_eq!(
            classify("\"say \"hi\"\"@en", 1, false),
            Term::lang_literal("say \"hi\"", "en")
        );
        assert_eq!(classify("\"\"", 1, false), Term::literal(""));
        assert_eq!(classify("\"unterminated", 1, false), Term::literal("unterminated"));
    }

    #[test]
    fn unescapes_unicode() {
        assert_eq!(unescape("caf\\u00E9"), "café");
        assert_eq!(unescape("\\U0001F600!"), "\u{1F600}!");
        assert_eq!(unescape("\\uD83D\\uDE00"), "\u{1F600}");
        assert_eq!(unescape("a\\nb\\u12"), "a\\nb\\u12");
        assert_eq!(unescape("\\u005Cu0041"), "\\u0041");
        assert_eq!(
            classify("\"caf\\u00E9\"@fr", 1, false),
            Term::lang_literal("café", "fr")
        );
    }

    #[test]
    fn hdt_string_is_inverse_of_classify() {
        let terms = [
            Term::iri("http://example.org/x"),
            Term::bnode("_:b0"),
            Term::literal("with \"quotes\" and \\u0041 backslash"),
            Term::lang_literal("hello", "en-GB"),
            Term::typed_literal("1", "http://www.w3.org/2001/XMLSchema#int"),
        ];
        for t in terms {
            assert_eq!(Term::from_hdt_str(&t.to_hdt_string()), t);
        }
    }

    #[test]
    fn displays_as_ntriples() {
        let t = Triple::new(
            Term::iri("http://example.org/s"),
            Term::iri("http://example.org/p"),
            Term::lang_literal("a \"b\"\n", "en"),
        );
        assert_eq!(
            t.to_string(),
            "<http://example.org/s> <http://example.org/p> \"a \\\"b\\\"\\n\"@en ."
        );
        assert_eq!(Term::bnode("x").to_string(), "_:x");
    }
}
