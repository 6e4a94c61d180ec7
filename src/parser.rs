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

//! Statement head parser
//!
//! This is not a SQL parser: it only answers "is this line a row insertion,
//! and into which table?".

use log::trace;

use super::tokenizer::*;
use std::fmt;

/// A name of a table, possibly qualified by a schema, e.g. `db`.`exp_sites`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectName(pub Vec<Word>);

impl ObjectName {
    /// The unqualified table name
    pub fn table(&self) -> &str {
        self.0.last().map(|w| w.value.as_str()).unwrap_or("")
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut delim = "";
        for word in &self.0 {
            write!(f, "{}{}", delim, word)?;
            delim = ".";
        }
        Ok(())
    }
}

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    fn next_token(&mut self) -> Option<Token> {
        self.peeked.take().or_else(|| self.tokenizer.next_token())
    }

    fn peek_token(&mut self) -> Option<&Token> {
        if self.peeked.is_none() {
            self.peeked = self.tokenizer.next_token();
        }
        self.peeked.as_ref()
    }

    /// Consume the next token if it is the given keyword
    fn parse_keyword(&mut self, expected: &str) -> bool {
        match self.peek_token() {
            Some(Token::Word(w)) if w.is_keyword(expected) => {
                self.next_token();
                true
            }
            _ => false,
        }
    }

    /// Consume one or more whitespace tokens
    fn parse_whitespace(&mut self) -> bool {
        let mut found = false;
        while let Some(Token::Whitespace(_)) = self.peek_token() {
            self.next_token();
            found = true;
        }
        found
    }

    fn consume_token(&mut self, expected: &Token) -> bool {
        match self.peek_token() {
            Some(t) if t == expected => {
                self.next_token();
                true
            }
            _ => false,
        }
    }

    /// Parse a possibly qualified, possibly quoted identifier, e.g.
    /// `foo` or `myschema`.`table`
    fn parse_object_name(&mut self) -> Option<ObjectName> {
        let mut idents = vec![];
        loop {
            match self.next_token() {
                Some(Token::Word(w)) => idents.push(w),
                _ => return None,
            }
            if !self.consume_token(&Token::Period) {
                break;
            }
        }
        Some(ObjectName(idents))
    }

    /// `INSERT INTO <object name>` at the very start of the line
    fn parse_insert(&mut self) -> Option<ObjectName> {
        if !self.parse_keyword("INSERT") || !self.parse_whitespace() {
            return None;
        }
        if !self.parse_keyword("INTO") || !self.parse_whitespace() {
            return None;
        }
        self.parse_object_name()
    }
}

/// Returns the target table of a row-insertion statement, or `None` when the
/// line is anything else.
pub fn parse_insert_table(line: &[u8]) -> Option<ObjectName> {
    let mut line = line;
    let mut parser = Parser {
        tokenizer: Tokenizer::new(&mut line),
        peeked: None,
    };
    let table = parser.parse_insert();
    trace!("parse_insert_table {:?}", table);
    table
}
