// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lexer::*;
use crate::number::Number;
use crate::term::Term;

use core::str::FromStr;

use anyhow::{bail, Result};

#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
    line: u32,
    end: u32,
    wildcards: u32,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            source: source.clone(),
            lexer,
            tok,
            line: 0,
            end: 0,
            wildcards: 0,
        })
    }

    pub fn token_text(&self) -> &str {
        match self.tok.0 {
            TokenKind::Symbol | TokenKind::Number | TokenKind::Ident | TokenKind::Eof => {
                self.tok.1.text()
            }
            TokenKind::String | TokenKind::RawString => "",
        }
    }

    pub fn next_token(&mut self) -> Result<()> {
        self.line = self.tok.1.line;
        self.end = self.tok.1.end;
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, text: &str, context: &str) -> Result<()> {
        if self.token_text() == text && self.tok.0 == TokenKind::Symbol {
            self.next_token()
        } else {
            let msg = format!("expecting `{text}` {context}");
            Err(self.source.error(self.tok.1.line, self.tok.1.col, &msg))
        }
    }

    fn expect_eof(&mut self, context: &str) -> Result<()> {
        match self.tok.0 {
            TokenKind::Eof => Ok(()),
            _ => Err(self.source.error(
                self.tok.1.line,
                self.tok.1.col,
                &format!("unexpected token {context}"),
            )),
        }
    }

    fn is_keyword(&self, ident: &str) -> bool {
        matches!(ident, "false" | "null" | "true")
    }

    fn parse_ident(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident if self.is_keyword(span.text()) || span.text() == "_" => Err(self
                .source
                .error(
                    self.tok.1.line,
                    self.tok.1.col,
                    &format!("unexpected keyword `{}`", span.text()),
                )),
            TokenKind::Ident => {
                self.next_token()?;
                Ok(span)
            }
            _ => Err(self
                .source
                .error(self.tok.1.line, self.tok.1.col, "expecting identifier")),
        }
    }

    // Every `_` is a distinct variable. The `$` prefix keeps wildcards apart
    // from user variables and out of query results.
    fn fresh_wildcard(&mut self) -> Term {
        let name = format!("$_{}", self.wildcards);
        self.wildcards += 1;
        Term::var(&name)
    }

    fn read_number(span: &Span) -> Result<Term> {
        match Number::from_str(span.text()) {
            Ok(n) => Ok(Term::Number(n)),
            Err(_) => bail!(span.error("could not parse number")),
        }
    }

    fn parse_scalar_or_var(&mut self) -> Result<Term> {
        let span = self.tok.1.clone();
        let term = match &self.tok.0 {
            TokenKind::Number => Self::read_number(&span)?,
            TokenKind::String => {
                match serde_json::from_str::<String>(format!("\"{}\"", span.text()).as_str()) {
                    Ok(s) => Term::string(&s),
                    Err(e) => bail!(span.error(format!("invalid string literal. {e}").as_str())),
                }
            }
            TokenKind::RawString => Term::string(span.text()),
            TokenKind::Ident => match self.token_text() {
                "null" => Term::Null,
                "true" => Term::Bool(true),
                "false" => Term::Bool(false),
                "_" => self.fresh_wildcard(),
                _ => {
                    let ident = self.parse_ident()?;
                    return self.parse_ref(ident);
                }
            },
            _ => {
                return Err(self.source.error(
                    self.tok.1.line,
                    self.tok.1.col,
                    "expecting term",
                ))
            }
        };
        self.next_token()?;
        Ok(term)
    }

    // Parses the segments following `base`. A plain identifier without
    // segments is a variable.
    fn parse_ref(&mut self, base: Span) -> Result<Term> {
        let mut path = vec![];
        loop {
            let sep_pos = self.tok.1.start;
            match self.token_text() {
                "." | "[" if self.tok.0 == TokenKind::Symbol && self.tok.1.start != self.end => {
                    if self.line != self.tok.1.line {
                        // Newline encountered. This could be a separate
                        // expression.
                        break;
                    }
                    bail!(
                        "{}",
                        self.source.error(
                            self.tok.1.line,
                            self.tok.1.col,
                            format!("invalid whitespace before {}", self.token_text()).as_str()
                        )
                    );
                }
                "." if self.tok.0 == TokenKind::Symbol => {
                    self.next_token()?;
                    let field = self.parse_ident()?;

                    // Disallow any whitespace between . and identifier.
                    if field.start != sep_pos + 1 {
                        bail!(
                            "{}",
                            self.source.error(
                                field.line,
                                field.col - 1,
                                "invalid whitespace between . and identifier"
                            )
                        );
                    }
                    path.push(Term::string(field.text()));
                }
                "[" if self.tok.0 == TokenKind::Symbol => {
                    self.next_token()?;
                    let index = self.parse_term()?;
                    self.expect("]", "while parsing bracketed reference")?;
                    path.push(index);
                }
                _ => break,
            }
        }

        if path.is_empty() {
            Ok(Term::var(base.text()))
        } else {
            Ok(Term::reference(base.text(), path))
        }
    }

    fn parse_array(&mut self) -> Result<Term> {
        self.expect("[", "while parsing array")?;
        let mut items = vec![];
        if self.token_text() != "]" {
            items.push(self.parse_term()?);
            while self.token_text() == "," {
                self.next_token()?;
                match self.token_text() {
                    "]" => break,
                    _ => items.push(self.parse_term()?),
                }
            }
        }
        self.expect("]", "while parsing array")?;
        Ok(Term::array(items))
    }

    fn parse_object(&mut self) -> Result<Term> {
        self.expect("{", "while parsing object")?;
        let mut fields: Vec<(Term, Term)> = vec![];
        if self.token_text() != "}" {
            loop {
                let key_span = self.tok.1.clone();
                let key = self.parse_term()?;
                self.expect(":", "while parsing object")?;
                let value = self.parse_term()?;

                if key.is_ground() && !key.has_refs() && fields.iter().any(|(k, _)| *k == key) {
                    bail!(key_span.error(format!("duplicate key {key} in object").as_str()));
                }
                fields.push((key, value));

                if self.token_text() != "," {
                    break;
                }
                self.next_token()?;
                if self.token_text() == "}" {
                    break;
                }
            }
        }
        self.expect("}", "while parsing object")?;
        Ok(Term::object(fields))
    }

    pub fn parse_term(&mut self) -> Result<Term> {
        match self.token_text() {
            "[" if self.tok.0 == TokenKind::Symbol => self.parse_array(),
            "{" if self.tok.0 == TokenKind::Symbol => self.parse_object(),
            _ => self.parse_scalar_or_var(),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let a = self.parse_term()?;
        if self.token_text() == "=" && self.tok.0 == TokenKind::Symbol {
            self.next_token()?;
            let b = self.parse_term()?;
            Ok(Expr::Eq(a, b))
        } else {
            Ok(Expr::Term(a))
        }
    }

    pub fn parse_body(&mut self) -> Result<Vec<Expr>> {
        let mut body = vec![self.parse_expr()?];
        while self.token_text() == "," && self.tok.0 == TokenKind::Symbol {
            self.next_token()?;
            body.push(self.parse_expr()?);
        }
        Ok(body)
    }

    fn parse_rule_head(&mut self) -> Result<RuleHead> {
        match self.token_text() {
            "=" => {
                self.next_token()?;
                Ok(RuleHead::Scalar {
                    value: self.parse_term()?,
                })
            }
            "[" => {
                self.next_token()?;
                let key = self.parse_term()?;
                self.expect("]", "while parsing rule head")?;
                if self.token_text() == "=" {
                    self.next_token()?;
                    let value = self.parse_term()?;
                    Ok(RuleHead::Object { key, value })
                } else {
                    Ok(RuleHead::Set { key })
                }
            }
            _ => Err(self.source.error(
                self.tok.1.line,
                self.tok.1.col,
                "expecting `=` or `[` after rule name",
            )),
        }
    }

    pub fn parse_rule(&mut self) -> Result<Rule> {
        let name = self.parse_ident()?;
        let head = self.parse_rule_head()?;
        self.expect(":-", "after rule head")?;
        let body = self.parse_body()?;
        Ok(Rule::new(name.text(), head, body))
    }

    pub fn parse_rules(&mut self) -> Result<Vec<Rule>> {
        let mut rules = vec![];
        while self.tok.0 != TokenKind::Eof {
            rules.push(self.parse_rule()?);
        }
        Ok(rules)
    }

    pub fn parse_query(&mut self) -> Result<Vec<Expr>> {
        let body = self.parse_body()?;
        self.expect_eof("after query")?;
        Ok(body)
    }
}

fn with_parser<T>(
    file: &str,
    text: &str,
    f: impl FnOnce(&mut Parser<'_>) -> Result<T>,
) -> Result<T> {
    let source = Source::from_contents(file.to_string(), text.to_string())?;
    let mut parser = Parser::new(&source)?;
    f(&mut parser)
}

/// Parses exactly one rule.
pub fn parse_rule(text: &str) -> Result<Rule> {
    with_parser("<rule>", text, |p| {
        let rule = p.parse_rule()?;
        p.expect_eof("after rule")?;
        Ok(rule)
    })
}

/// Parses a sequence of rules. `file` is only used in error messages.
pub fn parse_rules(file: &str, text: &str) -> Result<Vec<Rule>> {
    with_parser(file, text, |p| p.parse_rules())
}

/// Parses a comma separated list of expressions.
pub fn parse_query(text: &str) -> Result<Vec<Expr>> {
    with_parser("<query>", text, |p| p.parse_query())
}

pub fn parse_term(text: &str) -> Result<Term> {
    with_parser("<term>", text, |p| {
        let term = p.parse_term()?;
        p.expect_eof("after term")?;
        Ok(term)
    })
}
