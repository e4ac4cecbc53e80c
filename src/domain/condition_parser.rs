//! Condition text parser.
//!
//! Recursive descent over the condition grammar, bound to a target
//! [`Schema`] so every identifier resolves (or fails) at parse time:
//!
//! ```text
//! condition  := comparison (("and" | "or") comparison)*
//! comparison := operand cmp_op operand
//! operand    := column-name | number
//! cmp_op     := "<" | ">" | "<=" | ">=" | "==" | "!="
//! ```
//!
//! Identifiers are whole words of `[a-z0-9_]`, so a short column name is
//! never matched inside a longer one (`k` vs `rsi_k`). Input is expected
//! to be lower-cased already; [`Condition::new`] does that.
//!
//! [`Condition::new`]: crate::domain::condition::Condition::new

use crate::domain::condition::{CmpOp, Comparison, Connector, Operand, Predicate};
use crate::domain::error::ParseError;
use crate::domain::schema::Schema;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    schema: &'a Schema,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, schema: &'a Schema) -> Self {
        Self {
            input,
            pos: 0,
            schema,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.input.len()
    }

    fn is_word_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    fn peek_word(&self) -> String {
        let mut word = String::new();
        for ch in self.remaining().chars() {
            if Self::is_word_char(ch) {
                word.push(ch);
            } else {
                break;
            }
        }
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && !remaining[keyword.len()..]
                .chars()
                .next()
                .map(Self::is_word_char)
                .unwrap_or(false)
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut digits = 0;
        let mut has_dot = false;

        if self.peek() == Some('-') || self.peek() == Some('+') {
            self.advance();
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }
        // Exponent suffix: 1e6, -1e18, 2.5e-3.
        if self.peek() == Some('e') {
            let mark = self.pos;
            self.advance();
            if self.peek() == Some('-') || self.peek() == Some('+') {
                self.advance();
            }
            let mut exp_digits = 0;
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    exp_digits += 1;
                    self.advance();
                } else {
                    break;
                }
            }
            if exp_digits == 0 {
                self.pos = mark;
            }
        }

        // `100and` is not a number followed by a keyword; connectors only
        // count at word boundaries.
        if self.peek().is_some_and(Self::is_word_char) {
            return Err(ParseError {
                message: format!(
                    "invalid number: {}{}",
                    &self.input[start..self.pos],
                    self.peek_word()
                ),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        self.skip_whitespace();

        if self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || ch == '-' || ch == '+' || ch == '.')
        {
            return Ok(Operand::Number(self.parse_number()?));
        }

        let word = self.peek_word();
        if word == "and" || word == "or" {
            return Err(ParseError {
                message: format!("expected column or number, found '{}'", word),
                position: self.pos,
            });
        }
        if !word.chars().next().is_some_and(Self::is_word_char) {
            return Err(ParseError {
                message: format!("expected column or number, found '{}'", word),
                position: self.pos,
            });
        }
        if !self.schema.contains(&word) {
            return Err(ParseError {
                message: format!("unknown column '{}' for {} schema", word, self.schema.kind()),
                position: self.pos,
            });
        }
        self.pos += word.len();
        Ok(Operand::Column(word))
    }

    fn parse_cmp_op(&mut self) -> Result<CmpOp, ParseError> {
        self.skip_whitespace();
        for (text, op) in [
            ("<=", CmpOp::Le),
            (">=", CmpOp::Ge),
            ("==", CmpOp::Eq),
            ("!=", CmpOp::Ne),
            ("<", CmpOp::Lt),
            (">", CmpOp::Gt),
        ] {
            if self.remaining().starts_with(text) {
                self.pos += text.len();
                return Ok(op);
            }
        }
        Err(ParseError {
            message: format!("expected comparison operator, found '{}'", self.peek_word()),
            position: self.pos,
        })
    }

    fn parse_comparison(&mut self) -> Result<Comparison, ParseError> {
        let left = self.parse_operand()?;
        let op = self.parse_cmp_op()?;
        let right = self.parse_operand()?;
        Ok(Comparison { left, op, right })
    }

    fn parse(&mut self) -> Result<Predicate, ParseError> {
        if self.at_end() {
            return Err(ParseError {
                message: "expected condition".to_string(),
                position: self.pos,
            });
        }
        let first = self.parse_comparison()?;
        let mut rest = Vec::new();

        while !self.at_end() {
            let connector = if self.consume_keyword("and") {
                Connector::And
            } else if self.consume_keyword("or") {
                Connector::Or
            } else {
                return Err(ParseError {
                    message: format!("expected 'and' or 'or', found '{}'", self.peek_word()),
                    position: self.pos,
                });
            };
            rest.push((connector, self.parse_comparison()?));
        }

        Ok(Predicate { first, rest })
    }
}

/// Parse lower-cased condition text against a schema.
pub fn parse(input: &str, schema: &Schema) -> Result<Predicate, ParseError> {
    Parser::new(input, schema).parse()
}
