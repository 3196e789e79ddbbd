//! Recursive-descent parser producing the editor tree directly.
//!
//! There is no separate AST: every production builds [`Node`]s with the ranges of the source
//! text, so the result can be handed to the engine as is. Newlines end statements at the top
//! level and are insignificant inside brackets.

use std::sync::Arc;

use tree_editor_core::{Doc, ListNode, Node, ParseError, SyntaxKind, TextRange, TokenNode};

use crate::kinds::*;
use crate::lexer::{Lexeme, Token, lex};

/// Parse a whole file.
pub fn parse(text: &str) -> Result<Doc, ParseError> {
    let mut parser = Parser {
        text,
        lexemes: lex(text)?,
        pos: 0,
        depth: 0,
    };
    let root = parser.file()?;
    Ok(Doc::new(Arc::new(root), text))
}

struct Parser<'a> {
    text: &'a str,
    lexemes: Vec<Lexeme>,
    pos: usize,
    /// Bracket nesting; newlines are skipped while positive.
    depth: usize,
}

type ParseResult<T> = Result<T, ParseError>;

impl Parser<'_> {
    fn peek(&mut self) -> Option<Lexeme> {
        if self.depth > 0 {
            while self
                .lexemes
                .get(self.pos)
                .is_some_and(|l| l.token == Token::Newline)
            {
                self.pos += 1;
            }
        }
        self.lexemes.get(self.pos).copied()
    }

    fn at(&mut self, token: Token) -> bool {
        self.peek().is_some_and(|l| l.token == token)
    }

    fn bump(&mut self) -> Option<Lexeme> {
        let lexeme = self.peek()?;
        self.pos += 1;
        Some(lexeme)
    }

    fn error(&mut self, message: &str) -> ParseError {
        let range = match self.peek() {
            Some(lexeme) => lexeme.span,
            None => TextRange::new(self.text.len(), self.text.len()),
        };
        ParseError::new(range, message)
    }

    fn expect(&mut self, token: Token, message: &str) -> ParseResult<Lexeme> {
        match self.peek() {
            Some(lexeme) if lexeme.token == token => {
                self.pos += 1;
                Ok(lexeme)
            }
            _ => Err(self.error(message)),
        }
    }

    fn token(&self, kind: SyntaxKind, lexeme: Lexeme) -> Node {
        let text = &self.text[lexeme.span.pos..lexeme.span.end];
        TokenNode::new(kind, text).with_range(lexeme.span).into()
    }

    fn file(&mut self) -> ParseResult<ListNode> {
        let mut content = Vec::new();
        loop {
            while self.at(Token::Newline) || self.at(Token::Semi) {
                self.pos += 1;
            }
            if self.peek().is_none() {
                break;
            }
            content.push(self.statement()?);
            match self.peek().map(|l| l.token) {
                None | Some(Token::Newline | Token::Semi) => {}
                Some(_) => return Err(self.error("expected end of statement")),
            }
        }
        Ok(ListNode::new(FILE, ("", ""), content)
            .transparent()
            .with_range(TextRange::new(0, self.text.len())))
    }

    fn statement(&mut self) -> ParseResult<Node> {
        if self.at(Token::Keyword) {
            self.declaration()
        } else {
            self.expression()
        }
    }

    fn declaration(&mut self) -> ParseResult<Node> {
        let keyword = self.expect(Token::Keyword, "expected `let`, `const` or `var`")?;
        let mut content = vec![self.token(KEYWORD, keyword)];
        loop {
            content.push(self.declarator()?);
            if !self.at(Token::Comma) {
                break;
            }
            self.pos += 1;
        }
        Ok(span_list(ListNode::new(DECLARATION, ("", ""), content)))
    }

    fn declarator(&mut self) -> ParseResult<Node> {
        let name = self.expect(Token::Ident, "expected a variable name")?;
        let mut content = vec![self.token(IDENT, name)];
        let mut keys = vec![NAME_KEY];
        if self.at(Token::Assign) {
            self.pos += 1;
            content.push(self.expression()?);
            keys.push(INITIALIZER_KEY);
        }
        Ok(span_list(
            ListNode::new(DECLARATOR, ("", ""), content).with_struct_keys(keys),
        ))
    }

    /// Flat binary chain. A chain of one operand is just the operand.
    fn expression(&mut self) -> ParseResult<Node> {
        let first = self.tight()?;
        let mut content = vec![first];
        while let Some(lexeme) = self.peek()
            && matches!(lexeme.token, Token::Operator | Token::Assign)
        {
            self.pos += 1;
            content.push(self.token(OPERATOR, lexeme));
            content.push(self.tight()?);
        }
        if content.len() == 1 {
            return Ok(content.remove(0));
        }
        Ok(span_list(ListNode::new(LOOSE, ("", ""), content).transparent()))
    }

    /// Postfix chain. A chain without links is just its head.
    fn tight(&mut self) -> ParseResult<Node> {
        let head = self.primary()?;
        let mut content = vec![head];
        loop {
            match self.peek().map(|l| l.token) {
                Some(Token::Member) => {
                    let lexeme = self.bump().ok_or_else(|| self.error("expected member"))?;
                    content.push(self.token(MEMBER, lexeme));
                }
                Some(Token::LParen) => content.push(self.bracketed(
                    ARGUMENTS,
                    ("(", ")"),
                    Token::RParen,
                    Self::expression,
                )?),
                _ => break,
            }
        }
        if content.len() == 1 {
            return Ok(content.remove(0));
        }
        Ok(span_list(ListNode::new(TIGHT, ("", ""), content).transparent()))
    }

    fn primary(&mut self) -> ParseResult<Node> {
        let Some(lexeme) = self.peek() else {
            return Err(self.error("expected an expression"));
        };
        match lexeme.token {
            Token::Ident => {
                self.pos += 1;
                Ok(self.token(IDENT, lexeme))
            }
            Token::Number => {
                self.pos += 1;
                Ok(self.token(NUMBER, lexeme))
            }
            Token::String => {
                self.pos += 1;
                Ok(self.token(STRING, lexeme))
            }
            Token::LParen => {
                let list = self.bracketed(PARENTHESIZED, ("(", ")"), Token::RParen, Self::expression)?;
                if list.content().len() != 1 {
                    return Err(ParseError::new(list.range(), "expected exactly one expression"));
                }
                Ok(list)
            }
            Token::LBracket => self.bracketed(ARRAY, ("[", "]"), Token::RBracket, Self::expression),
            Token::LBrace => self.bracketed(OBJECT, ("{", "}"), Token::RBrace, Self::property),
            _ => Err(self.error("expected an expression")),
        }
    }

    fn property(&mut self) -> ParseResult<Node> {
        let name = match self.peek() {
            Some(lexeme) if lexeme.token == Token::Ident => self.token(IDENT, lexeme),
            Some(lexeme) if lexeme.token == Token::String => self.token(STRING, lexeme),
            _ => return Err(self.error("expected a property name")),
        };
        self.pos += 1;
        let mut content = vec![name];
        let mut keys = vec![NAME_KEY];
        if self.at(Token::Colon) {
            self.pos += 1;
            content.push(self.expression()?);
            keys.push(VALUE_KEY);
        }
        Ok(span_list(
            ListNode::new(PROPERTY, ("", ""), content).with_struct_keys(keys),
        ))
    }

    /// Comma separated items between an opening bracket and `close`.
    fn bracketed(
        &mut self,
        kind: SyntaxKind,
        delimiters: (&'static str, &'static str),
        close: Token,
        item: fn(&mut Self) -> ParseResult<Node>,
    ) -> ParseResult<Node> {
        let open = self
            .bump()
            .ok_or_else(|| ParseError::new(TextRange::new(self.text.len(), self.text.len()), "expected a bracket"))?;
        self.depth += 1;
        let mut content = Vec::new();
        if !self.at(close) {
            loop {
                content.push(item(self)?);
                if !self.at(Token::Comma) {
                    break;
                }
                self.pos += 1;
            }
        }
        let end = self.expect(close, "expected a closing bracket or `,`")?;
        self.depth -= 1;
        Ok(ListNode::new(kind, delimiters, content)
            .with_range(TextRange::new(open.span.pos, end.span.end))
            .into())
    }
}

/// Give a delimiter-less list the range from its first to its last child.
fn span_list(list: ListNode) -> Node {
    let pos = list.content.first().map_or(0, |c| c.range().pos);
    let end = list.content.last().map_or(pos, |c| c.range().end);
    list.with_range(TextRange::new(pos, end)).into()
}
