//! Lexer for mini-JS using logos.

use logos::Logos;
use tree_editor_core::{ParseError, TextRange};

/// Token types of mini-JS
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
pub enum Token {
    // Keywords
    #[token("let")]
    #[token("const")]
    #[token("var")]
    Keyword,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    String,

    #[regex(r"\.[A-Za-z_$][A-Za-z0-9_$]*")]
    Member,

    // Operators
    #[token("=")]
    Assign,
    #[regex(r"===|!==|==|!=|<=|>=|&&|\|\||[-+*/%<>]")]
    Operator,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("\n")]
    Newline,
}

/// A token with its span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub span: TextRange,
}

/// Lex source code into tokens with spans. The first unknown character is an error.
pub fn lex(source: &str) -> Result<Vec<Lexeme>, ParseError> {
    let mut out = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        let span = TextRange::new(span.start, span.end);
        match result {
            Ok(token) => out.push(Lexeme { token, span }),
            Err(()) => return Err(ParseError::new(span, "unexpected character")),
        }
    }
    Ok(out)
}

/// Whether `text` is exactly one identifier.
pub fn is_identifier(text: &str) -> bool {
    let mut lexer = Token::lexer(text);
    matches!(lexer.next(), Some(Ok(Token::Ident))) && lexer.span().len() == text.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(source: &str) -> Vec<Token> {
        lex(source).unwrap().into_iter().map(|l| l.token).collect()
    }

    #[test]
    fn test_lex_call_chain() {
        assert_eq!(
            tokens("f(x).bind(this)"),
            vec![
                Token::Ident,
                Token::LParen,
                Token::Ident,
                Token::RParen,
                Token::Member,
                Token::LParen,
                Token::Ident,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_lex_keywords_and_operators() {
        assert_eq!(
            tokens("let letter = a === 1.5\n"),
            vec![
                Token::Keyword,
                Token::Ident,
                Token::Assign,
                Token::Ident,
                Token::Operator,
                Token::Number,
                Token::Newline,
            ]
        );
    }

    #[test]
    fn test_lex_error_span() {
        let err = lex("a # b").unwrap_err();
        assert_eq!(err.diagnostics[0].range, TextRange::new(2, 3));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("bind"));
        assert!(!is_identifier("let"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier(""));
    }
}
