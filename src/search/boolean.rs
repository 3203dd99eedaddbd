//! Restricted boolean search grammar for exact (stemmed) mode.
//!
//! The grammar is deliberately small and left-to-right:
//! - quoted text is one phrase term;
//! - adjacent bare tokens are ANDed;
//! - a bare `or` joins only its immediate left and right term/phrase;
//! - a leading `-` negates the single following term/phrase.
//!
//! Parsing is strict: a malformed expression is a [`SearchError::QuerySyntax`]
//! carrying the offending fragment, raised at spec-build time so no query is
//! ever issued for garbage input.

use crate::error::{Result, SearchError};

/// A single matchable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Word(String),
    Phrase(String),
}

/// One AND-level conjunct: a term, or an OR-group of terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Term(Term),
    Or(Vec<Term>),
}

/// Parsed expression: conjunction of `must` nodes minus `must_not` terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolQuery {
    pub must: Vec<Node>,
    pub must_not: Vec<Term>,
}

#[derive(Debug)]
enum Tok {
    Term(Term),
    Or,
    Neg,
}

fn tokenize(input: &str) -> Result<Vec<Tok>> {
    let mut toks = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '-' {
            chars.next();
            match chars.peek() {
                Some(ch) if !ch.is_whitespace() => toks.push(Tok::Neg),
                _ => return Err(SearchError::syntax("-", "dangling negation")),
            }
        } else if c == '"' {
            chars.next();
            let mut phrase = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '"' {
                    closed = true;
                    break;
                }
                phrase.push(ch);
            }
            if !closed {
                return Err(SearchError::syntax(format!("\"{phrase}"), "unterminated phrase"));
            }
            let phrase = phrase.trim().to_string();
            if phrase.is_empty() {
                return Err(SearchError::syntax("\"\"", "empty phrase"));
            }
            toks.push(Tok::Term(Term::Phrase(phrase)));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '"' {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            if word.eq_ignore_ascii_case("or") {
                toks.push(Tok::Or);
            } else {
                toks.push(Tok::Term(Term::Word(word)));
            }
        }
    }
    Ok(toks)
}

/// Parse a raw search expression.
pub fn parse(input: &str) -> Result<BoolQuery> {
    let toks = tokenize(input)?;
    let mut must: Vec<Node> = Vec::new();
    let mut must_not: Vec<Term> = Vec::new();
    let mut neg_pending = false;
    let mut or_pending = false;

    for tok in toks {
        match tok {
            Tok::Term(term) => {
                if neg_pending {
                    must_not.push(term);
                    neg_pending = false;
                } else if or_pending {
                    // The left operand is already an Or group or a lone term.
                    match must.pop() {
                        Some(Node::Or(mut terms)) => {
                            terms.push(term);
                            must.push(Node::Or(terms));
                        }
                        Some(Node::Term(left)) => must.push(Node::Or(vec![left, term])),
                        None => unreachable!("or_pending requires a left operand"),
                    }
                    or_pending = false;
                } else {
                    must.push(Node::Term(term));
                }
            }
            Tok::Or => {
                if neg_pending || or_pending {
                    return Err(SearchError::syntax("or", "misplaced \"or\""));
                }
                if must.is_empty() {
                    return Err(SearchError::syntax(
                        "or",
                        "\"or\" needs a term or phrase on both sides",
                    ));
                }
                or_pending = true;
            }
            Tok::Neg => {
                if or_pending {
                    return Err(SearchError::syntax("or -", "negation cannot follow \"or\""));
                }
                if neg_pending {
                    return Err(SearchError::syntax("--", "double negation"));
                }
                neg_pending = true;
            }
        }
    }

    if neg_pending {
        return Err(SearchError::syntax("-", "dangling negation"));
    }
    if or_pending {
        return Err(SearchError::syntax("or", "\"or\" missing its right operand"));
    }
    if must.is_empty() {
        if must_not.is_empty() {
            return Err(SearchError::syntax(input.trim(), "empty search expression"));
        }
        return Err(SearchError::syntax(
            input.trim(),
            "expression needs at least one non-negated term",
        ));
    }

    Ok(BoolQuery { must, must_not })
}

fn fts5_string(term: &Term) -> String {
    // FTS5 string literals double embedded quotes.
    let text = match term {
        Term::Word(w) | Term::Phrase(w) => w.replace('"', "\"\""),
    };
    format!("\"{text}\"")
}

impl BoolQuery {
    /// Render the expression as an FTS5 MATCH string. NOT groups are
    /// parenthesized explicitly so FTS5 precedence can never reorder them.
    pub fn to_match_expr(&self) -> String {
        let mut expr = self
            .must
            .iter()
            .map(|node| match node {
                Node::Term(t) => fts5_string(t),
                Node::Or(terms) => {
                    let inner = terms.iter().map(fts5_string).collect::<Vec<_>>().join(" OR ");
                    format!("({inner})")
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        for term in &self.must_not {
            expr = format!("({expr}) NOT {}", fts5_string(term));
        }
        expr
    }
}
