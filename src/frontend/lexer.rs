//! Lexer for Teeny Tiny
//!
//! Converts source code into a stream of tokens, one per call, carrying
//! 1-based line numbers for diagnostics. Usable as a pull iterator (the
//! C backend needs only two tokens of lookahead) or materialized into a
//! `Vec<Token>` for the interpreter's cursor-driven walk.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result};

/// The lexer state
pub struct Lexer {
    /// Source characters, with one trailing '\n' appended
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Current character; '\0' once past the end
    cur: char,
    /// Current line, 1-based
    line: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        let mut chars: Vec<char> = source.chars().collect();
        // Simplifies lexing the last token/statement.
        chars.push('\n');
        let cur = chars[0];
        Self {
            source: chars,
            pos: 0,
            cur,
            line: 1,
        }
    }

    /// Advance to the next character.
    ///
    /// The line counter increments when the character being left behind
    /// is a line terminator: the NEWLINE token itself carries the line
    /// it terminates, and the EOF token carries the line after the last
    /// terminator.
    fn next_char(&mut self) {
        self.pos += 1;
        if self.cur == '\n' {
            self.line += 1;
        }
        self.cur = self.source.get(self.pos).copied().unwrap_or('\0');
    }

    /// Look at the following character without advancing
    fn peek(&self) -> char {
        self.source.get(self.pos + 1).copied().unwrap_or('\0')
    }

    /// Skip runs of space, tab and carriage return (not newlines)
    fn skip_whitespace(&mut self) {
        while matches!(self.cur, ' ' | '\t' | '\r') {
            self.next_char();
        }
    }

    /// Skip a '#' comment up to, but not including, the line terminator
    fn skip_comment(&mut self) {
        if self.cur == '#' {
            while self.cur != '\n' && self.cur != '\0' {
                self.next_char();
            }
        }
    }

    /// Produce the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.skip_comment();

        let line = self.line;
        let token = match self.cur {
            '+' => Token::new(TokenKind::Plus, "+", line),
            '-' => Token::new(TokenKind::Minus, "-", line),
            '*' => Token::new(TokenKind::Asterisk, "*", line),
            '/' => Token::new(TokenKind::Slash, "/", line),
            '\n' => Token::new(TokenKind::Newline, "NEWLINE", line),
            '\0' => Token::eof(line),
            '=' => {
                if self.peek() == '=' {
                    self.next_char();
                    Token::new(TokenKind::EqEq, "==", line)
                } else {
                    Token::new(TokenKind::Eq, "=", line)
                }
            }
            '>' => {
                if self.peek() == '=' {
                    self.next_char();
                    Token::new(TokenKind::GtEq, ">=", line)
                } else {
                    Token::new(TokenKind::Gt, ">", line)
                }
            }
            '<' => {
                if self.peek() == '=' {
                    self.next_char();
                    Token::new(TokenKind::LtEq, "<=", line)
                } else {
                    Token::new(TokenKind::Lt, "<", line)
                }
            }
            '!' => {
                if self.peek() == '=' {
                    self.next_char();
                    Token::new(TokenKind::NotEq, "!=", line)
                } else {
                    return Err(Error::LoneBang {
                        got: self.peek(),
                        line,
                    });
                }
            }
            '"' => return self.read_string(),
            c if c.is_ascii_digit() => self.read_number()?,
            c if c.is_ascii_alphabetic() => self.read_word(),
            other => {
                return Err(Error::UnknownToken {
                    text: other.to_string(),
                    line,
                })
            }
        };

        // Consume the token's last character
        self.next_char();

        Ok(token)
    }

    /// Read a string literal. The cursor is on the opening quote; on
    /// success it ends just past the closing quote.
    fn read_string(&mut self) -> Result<Token> {
        self.next_char();
        let start = self.pos;

        while self.cur != '"' && self.cur != '\0' {
            // These would break the generated printf format string.
            if matches!(self.cur, '\r' | '\n' | '\t' | '%' | '\\') {
                return Err(Error::IllegalStringChar { line: self.line });
            }
            self.next_char();
        }
        if self.cur == '\0' {
            return Err(Error::UnterminatedString { line: self.line });
        }

        let text: String = self.source[start..self.pos].iter().collect();
        let token = Token::new(TokenKind::Str, text, self.line);
        self.next_char();
        Ok(token)
    }

    /// Read a number literal: one or more digits, optionally a decimal
    /// point followed by one or more digits. Leaves the cursor on the
    /// last digit.
    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_ascii_digit() {
            self.next_char();
        }
        if self.peek() == '.' {
            self.next_char();

            // Must have at least one digit after the decimal point.
            if !self.peek().is_ascii_digit() {
                return Err(Error::IllegalNumberChar { line: self.line });
            }
            while self.peek().is_ascii_digit() {
                self.next_char();
            }
        }

        let text: String = self.source[start..=self.pos].iter().collect();
        let value = text.parse().unwrap_or(0.0);
        Ok(Token::number(text, value, self.line))
    }

    /// Read a keyword or identifier: letters only, no digits or
    /// underscores. Leaves the cursor on the last letter.
    fn read_word(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_ascii_alphabetic() {
            self.next_char();
        }

        let text: String = self.source[start..=self.pos].iter().collect();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, self.line)
    }

    /// Tokenize the entire source, including the final EOF token
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        log::debug!("tokenized {} tokens", tokens.len());
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators() {
        let tokens = Lexer::new("+ - * /").tokenize().unwrap();
        let expected = [
            (TokenKind::Plus, 1),
            (TokenKind::Minus, 1),
            (TokenKind::Asterisk, 1),
            (TokenKind::Slash, 1),
            (TokenKind::Newline, 1),
            (TokenKind::Eof, 2),
        ];
        assert_eq!(tokens.len(), expected.len());
        for (token, (kind, line)) in tokens.iter().zip(expected) {
            assert_eq!(token.kind, kind);
            assert_eq!(token.line, line);
        }
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("= == != < <= > >="),
            vec![
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lone_bang_is_an_error() {
        let mut lexer = Lexer::new("!5");
        assert!(matches!(
            lexer.next_token(),
            Err(Error::LoneBang { got: '5', line: 1 })
        ));
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("LET foo = bar"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        // Keywords are case-sensitive
        assert_eq!(kinds("let")[0], TokenKind::Ident);
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("9 123.5").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].value, 9.0);
        assert_eq!(tokens[1].value, 123.5);
        assert_eq!(tokens[1].text, "123.5");
    }

    #[test]
    fn test_trailing_decimal_point_is_an_error() {
        let mut lexer = Lexer::new("12.\n");
        assert!(matches!(
            lexer.next_token(),
            Err(Error::IllegalNumberChar { line: 1 })
        ));
    }

    #[test]
    fn test_strings() {
        let tokens = Lexer::new("PRINT \"hello, world\"").tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[1].text, "hello, world");
    }

    #[test]
    fn test_illegal_character_in_string() {
        let mut lexer = Lexer::new("\"100% sure\"");
        assert!(matches!(
            lexer.next_token(),
            Err(Error::IllegalStringChar { line: 1 })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"no closing quote");
        assert!(matches!(
            lexer.next_token(),
            Err(Error::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_unknown_token() {
        let mut lexer = Lexer::new("LET a = 1 & 2");
        let err = loop {
            match lexer.next_token() {
                Ok(_) => continue,
                Err(e) => break e,
            }
        };
        assert_eq!(
            err,
            Error::UnknownToken {
                text: "&".to_string(),
                line: 1
            }
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("# a full-line comment\nPRINT 1 # trailing\n"),
            vec![
                TokenKind::Newline,
                TokenKind::Print,
                TokenKind::Number,
                TokenKind::Newline,
                // From the newline the lexer appends to the source.
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_numbers_across_statements() {
        let tokens = Lexer::new("LET a = 1\nPRINT a\n").tokenize().unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 1, 1, 2, 2, 2, 3, 4]);
    }

    #[test]
    fn test_eof_line_is_newline_count_plus_one() {
        let tokens = Lexer::new("PRINT 1\nPRINT 2\nPRINT 3\n").tokenize().unwrap();
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Eof);
        // 3 source newlines plus the appended one.
        assert_eq!(last.line, 5);
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let source = "LET i = 0\nWHILE i < 5 REPEAT\n  LET i = i + 1\nENDWHILE\n";
        let first = Lexer::new(source).tokenize().unwrap();
        let second = Lexer::new(source).tokenize().unwrap();
        assert_eq!(first, second);
    }
}
