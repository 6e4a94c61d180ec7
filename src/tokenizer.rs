// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Statement head tokenizer
//!
//! Splits the beginning of a dump line into tokens. Only the tokens needed to
//! recognise `INSERT INTO <table>` are distinguished; everything else comes
//! out as [`Token::Char`]. Tokens are produced lazily, so the (potentially
//! huge) values part of an insert is never read.

use std::fmt;
use std::io::BufRead;
use std::iter::Peekable;
use utf8_chars::{BufReadCharsExt, Chars};

/// Statement head token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A keyword (like INSERT) or an optionally quoted SQL identifier
    Word(Word),
    /// Whitespace (space, tab, newline)
    Whitespace(char),
    /// Period, separating the parts of a qualified name
    Period,
    /// Left parenthesis `(`
    LParen,
    /// Any character that is not interesting for the statement head
    Char(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Word(ref w) => write!(f, "{}", w),
            Token::Whitespace(c) => write!(f, "{}", c),
            Token::Period => f.write_str("."),
            Token::LParen => f.write_str("("),
            Token::Char(c) => write!(f, "{}", c),
        }
    }
}

/// A keyword or an optionally quoted SQL identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// The value of the token, without the enclosing quotes
    pub value: String,
    /// The quote that opened or closed the identifier, if any. mysqldump uses
    /// backticks; ANSI dumps use double quotes.
    pub quote_style: Option<char>,
}

impl Word {
    /// Whether this word is the given keyword. Quoted words are identifiers,
    /// never keywords.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.quote_style.is_none() && self.value.eq_ignore_ascii_case(keyword)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.quote_style {
            Some(q) => write!(f, "{}{}{}", q, self.value, q),
            None => f.write_str(&self.value),
        }
    }
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn is_quote(ch: char) -> bool {
    ch == '`' || ch == '"'
}

/// Statement head tokenizer
pub struct Tokenizer<'a> {
    query: Peekable<Chars<'a, dyn BufRead + 'a>>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer reading from `query`
    pub fn new(query: &'a mut dyn BufRead) -> Self {
        Self {
            query: query.chars().peekable(),
        }
    }

    /// Get the next token or return None at the end of the input. Undecodable
    /// input also ends the token stream.
    pub fn next_token(&mut self) -> Option<Token> {
        match self.query.peek() {
            Some(Ok(ch)) => match *ch {
                ws if ws.is_whitespace() => self.consume_and_return(Token::Whitespace(ws)),
                '.' => self.consume_and_return(Token::Period),
                '(' => self.consume_and_return(Token::LParen),
                quote if is_quote(quote) => {
                    self.query.next(); // consume the opening quote
                    // Quoted identifiers may hold any character but the quote,
                    // e.g. `ee-site_sessions`. Whitespace ends an unclosed one.
                    let value =
                        self.peeking_take_while(|ch| ch != quote && !ch.is_whitespace());
                    // A missing closing quote is tolerated
                    if let Some(Ok(ch)) = self.query.peek() {
                        if *ch == quote {
                            self.query.next();
                        }
                    }
                    Some(Token::Word(Word {
                        value,
                        quote_style: Some(quote),
                    }))
                }
                ch if is_identifier_part(ch) => {
                    let value = self.peeking_take_while(is_identifier_part);
                    // So is a closing quote without an opening one
                    let quote_style = match self.query.peek() {
                        Some(Ok(q)) if is_quote(*q) => {
                            let q = *q;
                            self.query.next();
                            Some(q)
                        }
                        _ => None,
                    };
                    Some(Token::Word(Word { value, quote_style }))
                }
                other => self.consume_and_return(Token::Char(other)),
            },
            _ => None,
        }
    }

    fn consume_and_return(&mut self, t: Token) -> Option<Token> {
        self.query.next();
        Some(t)
    }

    /// Read from the input until `predicate` returns `false` or EOF is hit.
    /// Return the characters read as String, and keep the first non-matching
    /// char available as `query.next()`.
    fn peeking_take_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> String {
        let mut s = String::new();
        while let Some(Ok(ch)) = self.query.peek() {
            let ch = *ch;
            if predicate(ch) {
                self.query.next(); // consume
                s.push(ch);
            } else {
                break;
            }
        }
        s
    }
}
