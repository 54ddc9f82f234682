//! Line-based N-Triples codec for canonical quads
//!
//! One quad per line, dot-terminated. Named graphs serialize as a fourth
//! term (N-Quads style); quads in the default graph serialize as plain
//! triples. Empty lines and lines starting with `#` are ignored on parse.
//! `parse_quads(serialize_quads(qs))` is a bag-equality identity.

use super::term::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};
use crate::errors::{ChrysalisError, Result};
use crate::model::namespaces;

/// Serialize quads to N-Triples text, one line per quad
pub fn serialize_quads(quads: &[Quad]) -> String {
    let mut out = String::new();
    for quad in quads {
        serialize_quad_into(quad, &mut out);
        out.push('\n');
    }
    out
}

fn serialize_quad_into(quad: &Quad, out: &mut String) {
    match &quad.subject {
        Subject::Named(n) => write_named(n, out),
        Subject::Blank(b) => write_blank(b, out),
    }
    out.push(' ');
    write_named(&quad.predicate, out);
    out.push(' ');
    write_object(&quad.object, out);
    if let GraphName::Named(g) = &quad.graph {
        out.push(' ');
        write_named(g, out);
    }
    out.push_str(" .");
}

fn write_named(node: &NamedNode, out: &mut String) {
    out.push('<');
    out.push_str(node.as_str());
    out.push('>');
}

fn write_blank(node: &BlankNode, out: &mut String) {
    out.push_str("_:");
    out.push_str(node.as_str());
}

fn write_object(term: &Term, out: &mut String) {
    match term {
        Term::Named(n) => write_named(n, out),
        Term::Blank(b) => write_blank(b, out),
        Term::Literal(lit) => write_literal(lit, out),
        // DefaultGraph is not a legal object; emit an empty literal rather
        // than panicking
        Term::DefaultGraph => out.push_str("\"\""),
    }
}

fn write_literal(lit: &Literal, out: &mut String) {
    out.push('"');
    for c in lit.lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    if let Some(lang) = &lit.language {
        out.push('@');
        out.push_str(lang);
    } else if lit.datatype != namespaces::xsd("string") {
        out.push_str("^^");
        out.push('<');
        out.push_str(&lit.datatype);
        out.push('>');
    }
}

/// Parse N-Triples text into quads
///
/// Accepts both triple lines (default graph) and quad lines (named graph).
pub fn parse_quads(input: &str) -> Result<Vec<Quad>> {
    let mut quads = Vec::new();
    for (lineno, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let quad = parse_line(trimmed)
            .map_err(|e| ChrysalisError::serialization(format!("line {}: {}", lineno + 1, e)))?;
        quads.push(quad);
    }
    Ok(quads)
}

fn parse_line(line: &str) -> std::result::Result<Quad, String> {
    let mut cursor = Cursor::new(line);

    let subject = match cursor.parse_term()? {
        Term::Named(n) => Subject::Named(n),
        Term::Blank(b) => Subject::Blank(b),
        other => return Err(format!("illegal subject term {:?}", other)),
    };

    let predicate = match cursor.parse_term()? {
        Term::Named(n) => n,
        other => return Err(format!("illegal predicate term {:?}", other)),
    };

    let object = cursor.parse_term()?;
    if object == Term::DefaultGraph {
        return Err("illegal object term".to_string());
    }

    cursor.skip_whitespace();
    let graph = if cursor.peek() == Some('.') {
        GraphName::Default
    } else {
        match cursor.parse_term()? {
            Term::Named(n) => GraphName::Named(n),
            other => return Err(format!("illegal graph term {:?}", other)),
        }
    };

    cursor.skip_whitespace();
    if cursor.next() != Some('.') {
        return Err("missing terminating dot".to_string());
    }
    cursor.skip_whitespace();
    if cursor.peek().is_some() {
        return Err("trailing content after dot".to_string());
    }

    Ok(Quad {
        subject,
        predicate,
        object,
        graph,
    })
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.next();
        }
    }

    fn parse_term(&mut self) -> std::result::Result<Term, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('<') => self.parse_iri().map(Term::named),
            Some('_') => self.parse_blank(),
            Some('"') => self.parse_literal(),
            Some(c) => Err(format!("unexpected character '{}'", c)),
            None => Err("unexpected end of line".to_string()),
        }
    }

    fn parse_iri(&mut self) -> std::result::Result<String, String> {
        self.next(); // consume '<'
        let mut iri = String::new();
        loop {
            match self.next() {
                Some('>') => return Ok(iri),
                Some(c) => iri.push(c),
                None => return Err("unterminated IRI".to_string()),
            }
        }
    }

    fn parse_blank(&mut self) -> std::result::Result<Term, String> {
        self.next(); // consume '_'
        if self.next() != Some(':') {
            return Err("malformed blank node".to_string());
        }
        let mut id = String::new();
        while matches!(self.peek(), Some(c) if !c.is_whitespace()) {
            // Blank node labels never contain the terminating dot; a '.'
            // here belongs to the line terminator
            if self.peek() == Some('.') {
                break;
            }
            if let Some(c) = self.next() {
                id.push(c);
            }
        }
        if id.is_empty() {
            return Err("empty blank node label".to_string());
        }
        Ok(Term::blank(id))
    }

    fn parse_literal(&mut self) -> std::result::Result<Term, String> {
        self.next(); // consume opening '"'
        let mut lexical = String::new();
        loop {
            match self.next() {
                Some('\\') => match self.next() {
                    Some('\\') => lexical.push('\\'),
                    Some('"') => lexical.push('"'),
                    Some('n') => lexical.push('\n'),
                    Some('r') => lexical.push('\r'),
                    Some('t') => lexical.push('\t'),
                    Some(c) => return Err(format!("unknown escape '\\{}'", c)),
                    None => return Err("unterminated escape".to_string()),
                },
                Some('"') => break,
                Some(c) => lexical.push(c),
                None => return Err("unterminated literal".to_string()),
            }
        }

        match self.peek() {
            Some('@') => {
                self.next();
                let mut lang = String::new();
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '-') {
                    if let Some(c) = self.next() {
                        lang.push(c);
                    }
                }
                if lang.is_empty() {
                    return Err("empty language tag".to_string());
                }
                Ok(Term::Literal(Literal::lang(lexical, lang)))
            }
            Some('^') => {
                self.next();
                if self.next() != Some('^') {
                    return Err("malformed datatype marker".to_string());
                }
                if self.peek() != Some('<') {
                    return Err("datatype must be an IRI".to_string());
                }
                let datatype = self.parse_iri()?;
                Ok(Term::Literal(Literal::typed(lexical, datatype)))
            }
            _ => Ok(Term::Literal(Literal::string(lexical))),
        }
    }
}
