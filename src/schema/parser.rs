//! Schema expression parser
//!
//! Grammar:
//!
//! ```text
//! list   := item (',' item)*
//! item   := '*' | '!' IDENT | IDENT ('{' list '}')?
//! ```
//!
//! Without metadata the parser accepts any member name. With a
//! [`MetadataContainer`] it is strict: unknown entities and members are
//! rejected, as is a nested selection under a scalar member.

use std::sync::Arc;

use regex::Regex;

use super::metadata::{EntityMetadata, MemberKind, MetadataContainer};
use super::types::{MemberSet, Schema, SchemaMember};
use crate::errors::{DataAccessError, DataResult};

/// Builds a [`Schema`] from an expression
pub trait SchemaParser: Send + Sync {
    /// Parse `expression` against entity `name`; `target` is the payload's type name
    fn parse(&self, name: &str, expression: &str, target: Option<&str>) -> DataResult<Schema>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    Star,
    Bang,
    Open,
    Close,
    Comma,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    position: usize,
}

const TOKEN_PATTERN: &str = r"[A-Za-z_][A-Za-z0-9_]*|\*|!|\{|\}|,|\S";

/// Default parser for `Name, Role{*}, !Password` style expressions
pub struct ExpressionParser {
    lexer: Regex,
    metadata: Option<Arc<MetadataContainer>>,
}

impl ExpressionParser {
    /// Lenient parser: any member name is accepted
    pub fn new() -> DataResult<Self> {
        let lexer = Regex::new(TOKEN_PATTERN).map_err(|e| {
            DataAccessError::configuration(format!("schema lexer failed to compile: {}", e))
        })?;
        Ok(Self {
            lexer,
            metadata: None,
        })
    }

    /// Strict parser validating members against `metadata`
    pub fn strict(metadata: Arc<MetadataContainer>) -> DataResult<Self> {
        let mut parser = Self::new()?;
        parser.metadata = Some(metadata);
        Ok(parser)
    }

    pub fn is_strict(&self) -> bool {
        self.metadata.is_some()
    }

    fn tokenize<'a>(&self, expression: &'a str) -> DataResult<Vec<Token<'a>>> {
        let mut tokens = Vec::new();
        for found in self.lexer.find_iter(expression) {
            let text = found.as_str();
            let kind = match text {
                "*" => TokenKind::Star,
                "!" => TokenKind::Bang,
                "{" => TokenKind::Open,
                "}" => TokenKind::Close,
                "," => TokenKind::Comma,
                _ if text.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') => {
                    TokenKind::Ident
                }
                _ => {
                    return Err(DataAccessError::schema_parse(
                        expression,
                        found.start(),
                        format!("unexpected character '{}'", text),
                    ))
                }
            };
            tokens.push(Token {
                kind,
                text,
                position: found.start(),
            });
        }
        Ok(tokens)
    }

    fn entity(&self, expression: &str, name: &str, position: usize) -> DataResult<Option<&EntityMetadata>> {
        let Some(metadata) = &self.metadata else {
            return Ok(None);
        };
        metadata.get(name).map(Some).ok_or_else(|| {
            DataAccessError::schema_parse(expression, position, format!("unknown entity '{}'", name))
        })
    }
}

impl SchemaParser for ExpressionParser {
    fn parse(&self, name: &str, expression: &str, target: Option<&str>) -> DataResult<Schema> {
        if expression.trim().is_empty() {
            return Err(DataAccessError::schema_parse(expression, 0, "empty expression"));
        }

        let tokens = self.tokenize(expression)?;
        let entity = self.entity(expression, target.unwrap_or(name), 0)?;
        let mut cursor = Cursor {
            parser: self,
            expression,
            tokens: &tokens,
            index: 0,
        };

        let members = cursor.list(entity)?;
        if let Some(token) = cursor.peek() {
            let message = if token.kind == TokenKind::Close {
                "unbalanced '}'".to_string()
            } else {
                format!("unexpected '{}'", token.text)
            };
            return Err(DataAccessError::schema_parse(expression, token.position, message));
        }

        Ok(Schema {
            name: name.to_string(),
            target: target.map(str::to_string),
            members,
        })
    }
}

struct Cursor<'p, 'a> {
    parser: &'p ExpressionParser,
    expression: &'a str,
    tokens: &'p [Token<'a>],
    index: usize,
}

impl<'p, 'a> Cursor<'p, 'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.index).copied()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn end_position(&self) -> usize {
        self.expression.len()
    }

    fn error(&self, position: usize, message: impl Into<String>) -> DataAccessError {
        DataAccessError::schema_parse(self.expression, position, message)
    }

    fn list(&mut self, entity: Option<&'p EntityMetadata>) -> DataResult<MemberSet> {
        let mut set = MemberSet::default();
        loop {
            self.item(entity, &mut set)?;
            match self.peek() {
                Some(token) if token.kind == TokenKind::Comma => {
                    self.index += 1;
                }
                _ => return Ok(set),
            }
        }
    }

    fn item(&mut self, entity: Option<&'p EntityMetadata>, set: &mut MemberSet) -> DataResult<()> {
        let Some(token) = self.next() else {
            return Err(self.error(self.end_position(), "expected member"));
        };

        match token.kind {
            TokenKind::Star => {
                set.wildcard = true;
                Ok(())
            }
            TokenKind::Bang => {
                let member = match self.next() {
                    Some(next) if next.kind == TokenKind::Ident => next,
                    Some(next) => {
                        return Err(self.error(next.position, "expected member after '!'"))
                    }
                    None => return Err(self.error(self.end_position(), "expected member after '!'")),
                };
                self.lookup(entity, member)?;
                set.exclude(member.text);
                Ok(())
            }
            TokenKind::Ident => {
                let kind = self.lookup(entity, token)?;
                let opens = matches!(self.peek(), Some(next) if next.kind == TokenKind::Open);
                if !opens {
                    set.insert(SchemaMember::new(token.text));
                    return Ok(());
                }

                let open = self.next().map(|t| t.position).unwrap_or(token.position);
                let nested = match kind {
                    Some(MemberKind::Scalar) => {
                        return Err(self.error(
                            open,
                            format!("scalar member '{}' has no members to select", token.text),
                        ))
                    }
                    Some(MemberKind::Relation { target }) => {
                        self.parser.entity(self.expression, target, token.position)?
                    }
                    None => None,
                };

                if matches!(self.peek(), Some(next) if next.kind == TokenKind::Close) {
                    return Err(self.error(open, format!("empty selection for '{}'", token.text)));
                }
                let children = self.list(nested)?;
                match self.next() {
                    Some(close) if close.kind == TokenKind::Close => {}
                    Some(other) => {
                        return Err(self.error(other.position, format!("unexpected '{}'", other.text)))
                    }
                    None => return Err(self.error(open, "unbalanced '{'")),
                }
                set.insert(SchemaMember::with_children(token.text, children));
                Ok(())
            }
            TokenKind::Open => Err(self.error(token.position, "'{' must follow a member name")),
            TokenKind::Close => Err(self.error(token.position, "unbalanced '}'")),
            TokenKind::Comma => Err(self.error(token.position, "expected member")),
        }
    }

    fn lookup(
        &self,
        entity: Option<&'p EntityMetadata>,
        token: Token<'a>,
    ) -> DataResult<Option<&'p MemberKind>> {
        let Some(entity) = entity else {
            return Ok(None);
        };
        entity.member(token.text).map(Some).ok_or_else(|| {
            self.error(
                token.position,
                format!("unknown member '{}' of '{}'", token.text, entity.name),
            )
        })
    }
}
