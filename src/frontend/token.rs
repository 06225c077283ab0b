//! Token definitions for Teeny Tiny

use std::fmt;

/// A token produced by the lexer.
///
/// Identifier and string tokens carry their value in `text`; number
/// tokens additionally carry the decoded `f64` in `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw lexeme. `Eof` and `Newline` use the fixed spellings "EOF"
    /// and "NEWLINE" so diagnostics can print them.
    pub text: String,
    /// Decoded numeric value; zero for anything but `Number`.
    pub value: f64,
    /// 1-based source line.
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            value: 0.0,
            line,
        }
    }

    pub fn number(text: impl Into<String>, value: f64, line: usize) -> Self {
        Self {
            kind: TokenKind::Number,
            text: text.into(),
            value,
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, "EOF", line)
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ============ Special ============
    /// End of input
    Eof,
    /// Line terminator (statements are newline-terminated)
    Newline,

    // ============ Literals and Identifiers ============
    /// Numeric literal, decoded as f64
    Number,
    /// Variable or label name (letters only)
    Ident,
    /// String literal
    Str,

    // ============ Keywords ============
    /// LABEL
    Label,
    /// GOTO
    Goto,
    /// PRINT
    Print,
    /// INPUT
    Input,
    /// LET
    Let,
    /// IF
    If,
    /// THEN
    Then,
    /// ENDIF
    EndIf,
    /// WHILE
    While,
    /// REPEAT
    Repeat,
    /// ENDWHILE
    EndWhile,

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Asterisk,
    /// /
    Slash,
    /// ==
    EqEq,
    /// !=
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// =
    Eq,
}

impl TokenKind {
    /// Try to convert an identifier spelling to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "LABEL" => Some(TokenKind::Label),
            "GOTO" => Some(TokenKind::Goto),
            "PRINT" => Some(TokenKind::Print),
            "INPUT" => Some(TokenKind::Input),
            "LET" => Some(TokenKind::Let),
            "IF" => Some(TokenKind::If),
            "THEN" => Some(TokenKind::Then),
            "ENDIF" => Some(TokenKind::EndIf),
            "WHILE" => Some(TokenKind::While),
            "REPEAT" => Some(TokenKind::Repeat),
            "ENDWHILE" => Some(TokenKind::EndWhile),
            _ => None,
        }
    }

    /// Check if this token is one of the six comparison operators
    pub fn is_comparison_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::GtEq
        )
    }
}

impl fmt::Display for TokenKind {
    /// Diagnostic names, matching the keyword spellings where there is one
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Eof => "EOF",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Number => "NUMBER",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::Str => "STRING",
            TokenKind::Label => "LABEL",
            TokenKind::Goto => "GOTO",
            TokenKind::Print => "PRINT",
            TokenKind::Input => "INPUT",
            TokenKind::Let => "LET",
            TokenKind::If => "IF",
            TokenKind::Then => "THEN",
            TokenKind::EndIf => "ENDIF",
            TokenKind::While => "WHILE",
            TokenKind::Repeat => "REPEAT",
            TokenKind::EndWhile => "ENDWHILE",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Slash => "SLASH",
            TokenKind::EqEq => "EQEQ",
            TokenKind::NotEq => "NOTEQ",
            TokenKind::Lt => "LT",
            TokenKind::LtEq => "LTEQ",
            TokenKind::Gt => "GT",
            TokenKind::GtEq => "GTEQ",
            TokenKind::Eq => "EQ",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(TokenKind::keyword_from_str("LABEL"), Some(TokenKind::Label));
        assert_eq!(
            TokenKind::keyword_from_str("ENDWHILE"),
            Some(TokenKind::EndWhile)
        );
        assert_eq!(TokenKind::keyword_from_str("label"), None);
        assert_eq!(TokenKind::keyword_from_str("foo"), None);
    }

    #[test]
    fn test_comparison_operators() {
        assert!(TokenKind::EqEq.is_comparison_operator());
        assert!(TokenKind::NotEq.is_comparison_operator());
        assert!(TokenKind::Lt.is_comparison_operator());
        assert!(TokenKind::GtEq.is_comparison_operator());
        assert!(!TokenKind::Eq.is_comparison_operator());
        assert!(!TokenKind::Plus.is_comparison_operator());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(TokenKind::Ident.to_string(), "IDENTIFIER");
        assert_eq!(TokenKind::Asterisk.to_string(), "ASTERISK");
        assert_eq!(TokenKind::Newline.to_string(), "NEWLINE");
    }
}
