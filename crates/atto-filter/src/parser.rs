//! Recursive-descent parser for filter text.

use atto_core::PropertyValue;

use crate::error::{FilterError, FilterResult};
use crate::filter::Filter;
use crate::pattern::SubstringPattern;

/// Deepest nesting of compound operators a filter may use.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parse filter text into a [`Filter`].
pub(crate) fn parse(input: &str) -> FilterResult<Filter> {
    let text = input.trim();
    if text.is_empty() {
        return Err(FilterError::syntax(input, "empty filter"));
    }
    if text == "*" {
        return Ok(Filter::All);
    }

    let mut parser = Parser { src: text, pos: 0 };
    let filter = parser.filter(0)?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(FilterError::syntax(
            parser.rest(),
            "unexpected input after filter",
        ));
    }
    Ok(filter)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equal,
    LessOrEqual,
    GreaterOrEqual,
    Approx,
}

/// One unit of a comparison value: a literal character or an unescaped `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    Wildcard,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos = self.pos.saturating_add(c.len_utf8());
        Some(c)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn since(&self, start: usize) -> &'a str {
        &self.src[start..self.pos]
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char, start: usize, reason: &str) -> FilterResult<()> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            let end = self.src.len();
            Err(FilterError::syntax(&self.src[start..end], reason))
        }
    }

    /// `"(" body ")"`, enclosed by `depth` compound operators.
    fn filter(&mut self, depth: usize) -> FilterResult<Filter> {
        self.skip_ws();
        let start = self.pos;
        self.expect('(', start, "expected '('")?;
        self.skip_ws();

        let compound = matches!(self.peek(), Some('&' | '|' | '!'));
        if compound && depth >= MAX_NESTING_DEPTH {
            return Err(FilterError::syntax(self.since(start), "nesting too deep"));
        }

        let filter = match self.peek() {
            Some('&') => {
                self.bump();
                Filter::And(self.children(start, depth)?)
            },
            Some('|') => {
                self.bump();
                Filter::Or(self.children(start, depth)?)
            },
            Some('!') => {
                self.bump();
                Filter::Not(self.children(start, depth)?)
            },
            Some(_) => self.item(start)?,
            None => return Err(FilterError::syntax(self.since(start), "unbalanced parentheses")),
        };

        self.skip_ws();
        self.expect(')', start, "unbalanced parentheses")?;
        Ok(filter)
    }

    /// One or more parenthesized sub-filters of a compound operator.
    fn children(&mut self, start: usize, depth: usize) -> FilterResult<Vec<Filter>> {
        let mut children = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() != Some('(') {
                break;
            }
            children.push(self.filter(depth.saturating_add(1))?);
        }
        if children.is_empty() {
            return Err(FilterError::syntax(
                self.since(start),
                "compound operator requires at least one sub-filter",
            ));
        }
        Ok(children)
    }

    /// `attr op value`, or a lone `*`.
    fn item(&mut self, start: usize) -> FilterResult<Filter> {
        let attr_start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '<' | '>' | '~' | '(' | ')') {
                break;
            }
            self.bump();
        }
        let attr = self.since(attr_start).trim();

        let op = match self.peek() {
            Some('=') => {
                self.bump();
                Operator::Equal
            },
            Some(c @ ('<' | '>' | '~')) => {
                self.bump();
                if self.peek() != Some('=') {
                    return Err(FilterError::syntax(
                        self.since(start),
                        format!("unknown operator '{c}'"),
                    ));
                }
                self.bump();
                match c {
                    '<' => Operator::LessOrEqual,
                    '>' => Operator::GreaterOrEqual,
                    _ => Operator::Approx,
                }
            },
            Some(')') if attr == "*" => return Ok(Filter::All),
            Some('(') => {
                return Err(FilterError::syntax(self.since(start), "unexpected '('"));
            },
            _ => return Err(FilterError::syntax(self.since(start), "missing operator")),
        };

        if attr.is_empty() {
            return Err(FilterError::syntax(self.since(start), "missing attribute name"));
        }
        let attr = attr.to_string();

        let tokens = self.value(start)?;
        if tokens.is_empty() {
            return Err(FilterError::syntax(self.since(start), "missing value"));
        }

        if op == Operator::Equal && tokens.contains(&Token::Wildcard) {
            if tokens == [Token::Wildcard] {
                return Ok(Filter::Present { attr });
            }
            let pattern = SubstringPattern::new(pieces(&tokens))?;
            return Ok(Filter::Substring { attr, pattern });
        }

        let text: String = tokens
            .iter()
            .map(|t| match t {
                Token::Char(c) => *c,
                Token::Wildcard => '*',
            })
            .collect();
        Ok(match op {
            Operator::Equal => Filter::Eq {
                attr,
                value: PropertyValue::String(text),
            },
            Operator::LessOrEqual => Filter::Lte {
                attr,
                value: PropertyValue::String(text),
            },
            Operator::GreaterOrEqual => Filter::Gte {
                attr,
                value: PropertyValue::String(text),
            },
            Operator::Approx => Filter::Approx { attr, value: text },
        })
    }

    /// Value characters up to the closing parenthesis, resolving escapes.
    fn value(&mut self, start: usize) -> FilterResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                ')' => break,
                '(' => {
                    return Err(FilterError::syntax(
                        self.since(start),
                        "unescaped '(' in value",
                    ));
                },
                '\\' => {
                    self.bump();
                    let escaped = self.bump().ok_or_else(|| {
                        FilterError::syntax(self.since(start), "dangling escape")
                    })?;
                    tokens.push(Token::Char(escaped));
                },
                '*' => {
                    self.bump();
                    tokens.push(Token::Wildcard);
                },
                other => {
                    self.bump();
                    tokens.push(Token::Char(other));
                },
            }
        }
        Ok(tokens)
    }
}

/// Split tokens into the literal pieces around each wildcard.
fn pieces(tokens: &[Token]) -> Vec<String> {
    let mut pieces = vec![String::new()];
    for token in tokens {
        match token {
            Token::Char(c) => {
                if let Some(last) = pieces.last_mut() {
                    last.push(*c);
                }
            },
            Token::Wildcard => pieces.push(String::new()),
        }
    }
    pieces
}
