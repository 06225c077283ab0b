//! C Code Generator
//!
//! A single left-to-right grammar walk over the token stream, emitting
//! an equivalent C program as it goes. No syntax tree is built: every
//! grammar rule writes its translation directly into the emitter. The
//! preamble (includes, variable declarations, `int main`) and the
//! statement body are kept in separate append-only buffers because a
//! `LET`/`INPUT` in the middle of the program may still need to add a
//! declaration to the top.

use std::collections::HashSet;

use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result};

/// Append-only output buffers: a header (preamble) and a body.
/// The final program is the concatenation of the two.
#[derive(Default)]
pub struct CodeEmitter {
    header: String,
    code: String,
}

impl CodeEmitter {
    /// Append a fragment to the body without a line break
    fn emit(&mut self, fragment: &str) {
        self.code.push_str(fragment);
    }

    /// Append a full line to the body
    fn emit_line(&mut self, line: &str) {
        self.code.push_str(line);
        self.code.push('\n');
    }

    /// Append a full line to the header
    fn header_line(&mut self, line: &str) {
        self.header.push_str(line);
        self.header.push('\n');
    }

    /// Assemble the generated program
    fn finish(self) -> String {
        self.header + &self.code
    }
}

/// The code-generating grammar walk.
///
/// Pulls tokens on demand from the lexer with a current/peek pair;
/// there is no backtracking. Symbols and labels are tracked by name
/// only; the generator never needs values or positions.
pub struct CCodeGen {
    lexer: Lexer,
    cur: Token,
    peek: Token,
    symbols: HashSet<String>,
    labels_declared: HashSet<String>,
    labels_gotoed: HashSet<String>,
    emitter: CodeEmitter,
}

impl CCodeGen {
    /// Create a generator, priming the two-token lookahead
    pub fn new(mut lexer: Lexer) -> Result<Self> {
        let cur = lexer.next_token()?;
        let peek = lexer.next_token()?;
        Ok(Self {
            lexer,
            cur,
            peek,
            symbols: HashSet::new(),
            labels_declared: HashSet::new(),
            labels_gotoed: HashSet::new(),
            emitter: CodeEmitter::default(),
        })
    }

    // ==================== Helper Methods ====================

    fn check(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn next_token(&mut self) -> Result<()> {
        let next = self.lexer.next_token()?;
        self.cur = std::mem::replace(&mut self.peek, next);
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if !self.check(kind) {
            return Err(Error::UnexpectedToken {
                expected: kind.to_string(),
                got: self.cur.kind.to_string(),
                line: self.cur.line,
            });
        }
        self.next_token()
    }

    // ==================== Grammar Rules ====================

    /// program := {NEWLINE} {statement}
    ///
    /// Consumes the whole walk and returns the generated C source.
    pub fn generate(mut self) -> Result<String> {
        self.emitter.header_line("#include <stdio.h>");
        self.emitter.header_line("int main() {");

        while self.check(TokenKind::Newline) {
            self.next_token()?;
        }
        while !self.check(TokenKind::Eof) {
            self.statement()?;
        }

        self.emitter.emit_line("return 0;");
        self.emitter.emit_line("}");

        // Labels may be declared after their first GOTO reference, so
        // the cross-check runs once after the full pass.
        for label in &self.labels_gotoed {
            if !self.labels_declared.contains(label) {
                return Err(Error::UndeclaredLabel {
                    name: label.clone(),
                    line: self.cur.line,
                });
            }
        }

        Ok(self.emitter.finish())
    }

    /// statement := one of the seven newline-terminated forms
    fn statement(&mut self) -> Result<()> {
        match self.cur.kind {
            TokenKind::Print => {
                self.next_token()?;
                if self.check(TokenKind::Str) {
                    self.emitter
                        .emit_line(&format!("printf(\"{}\\n\");", self.cur.text));
                    self.next_token()?;
                } else {
                    self.emitter.emit("printf(\"%.2f\\n\", (float)(");
                    self.expression()?;
                    self.emitter.emit_line("));");
                }
            }
            TokenKind::If => {
                self.next_token()?;
                self.emitter.emit("if (");
                self.comparison()?;

                self.expect(TokenKind::Then)?;
                self.newline()?;
                self.emitter.emit_line(") {");

                while !self.check(TokenKind::EndIf) && !self.check(TokenKind::Eof) {
                    self.statement()?;
                }
                self.expect(TokenKind::EndIf)?;
                self.emitter.emit_line("}");
            }
            TokenKind::While => {
                self.next_token()?;
                self.emitter.emit("while (");
                self.comparison()?;

                self.expect(TokenKind::Repeat)?;
                self.newline()?;
                self.emitter.emit_line(") {");

                while !self.check(TokenKind::EndWhile) && !self.check(TokenKind::Eof) {
                    self.statement()?;
                }
                self.expect(TokenKind::EndWhile)?;
                self.emitter.emit_line("}");
            }
            TokenKind::Label => {
                self.next_token()?;
                if self.check(TokenKind::Ident) {
                    let label = self.cur.text.clone();
                    if !self.labels_declared.insert(label.clone()) {
                        return Err(Error::DuplicateLabel {
                            name: label,
                            line: self.cur.line,
                        });
                    }
                    self.emitter.emit_line(&format!("{label}:"));
                }
                self.expect(TokenKind::Ident)?;
            }
            TokenKind::Goto => {
                self.next_token()?;
                if self.check(TokenKind::Ident) {
                    let label = self.cur.text.clone();
                    self.labels_gotoed.insert(label.clone());
                    self.emitter.emit_line(&format!("goto {label};"));
                }
                self.expect(TokenKind::Ident)?;
            }
            TokenKind::Let => {
                self.next_token()?;
                if self.check(TokenKind::Ident) {
                    let name = self.cur.text.clone();
                    // Declared before the right-hand side is walked, so
                    // `LET a = a` compiles (to garbage, as in C).
                    if self.symbols.insert(name.clone()) {
                        self.emitter.header_line(&format!("float {name};"));
                    }
                    self.emitter.emit(&format!("{name} = "));
                }
                self.expect(TokenKind::Ident)?;
                self.expect(TokenKind::Eq)?;
                self.expression()?;
                self.emitter.emit_line(";");
            }
            TokenKind::Input => {
                self.next_token()?;
                if self.check(TokenKind::Ident) {
                    let name = self.cur.text.clone();
                    if self.symbols.insert(name.clone()) {
                        self.emitter.header_line(&format!("float {name};"));
                    }
                    // A failed scanf leaves the variable at 0 and
                    // flushes the bad input word.
                    self.emitter
                        .emit_line(&format!("if(0 == scanf(\"%f\", &{name})) {{"));
                    self.emitter.emit_line(&format!("{name} = 0;"));
                    self.emitter.emit_line("scanf(\"%*s\");");
                    self.emitter.emit_line("}");
                }
                self.expect(TokenKind::Ident)?;
            }
            _ => {
                return Err(Error::InvalidStatement {
                    text: self.cur.text.clone(),
                    line: self.cur.line,
                })
            }
        }

        self.newline()
    }

    /// comparison := expression compOp expression {compOp expression}
    ///
    /// At least one comparison operator is mandatory; a bare expression
    /// is not a valid comparison.
    fn comparison(&mut self) -> Result<()> {
        self.expression()?;

        if !self.cur.kind.is_comparison_operator() {
            return Err(Error::ExpectedComparisonOperator {
                text: self.cur.text.clone(),
                line: self.cur.line,
            });
        }
        while self.cur.kind.is_comparison_operator() {
            self.emitter.emit(&self.cur.text);
            self.next_token()?;
            self.expression()?;
        }
        Ok(())
    }

    /// expression := term {(+|-) term}
    fn expression(&mut self) -> Result<()> {
        self.term()?;
        while self.check(TokenKind::Plus) || self.check(TokenKind::Minus) {
            self.emitter.emit(&self.cur.text);
            self.next_token()?;
            self.term()?;
        }
        Ok(())
    }

    /// term := unary {(*|/) unary}
    fn term(&mut self) -> Result<()> {
        self.unary()?;
        while self.check(TokenKind::Asterisk) || self.check(TokenKind::Slash) {
            self.emitter.emit(&self.cur.text);
            self.next_token()?;
            self.unary()?;
        }
        Ok(())
    }

    /// unary := [+|-] primary
    fn unary(&mut self) -> Result<()> {
        if self.check(TokenKind::Plus) || self.check(TokenKind::Minus) {
            self.emitter.emit(&self.cur.text);
            self.next_token()?;
        }
        self.primary()
    }

    /// primary := NUMBER | IDENTIFIER
    fn primary(&mut self) -> Result<()> {
        match self.cur.kind {
            TokenKind::Number => {
                self.emitter.emit(&self.cur.value.to_string());
                self.next_token()
            }
            TokenKind::Ident => {
                if !self.symbols.contains(&self.cur.text) {
                    return Err(Error::UndeclaredVariable {
                        name: self.cur.text.clone(),
                        line: self.cur.line,
                    });
                }
                self.emitter.emit(&self.cur.text);
                self.next_token()
            }
            _ => Err(Error::UnexpectedPrimary {
                text: self.cur.text.clone(),
                line: self.cur.line,
            }),
        }
    }

    /// newline := NEWLINE {NEWLINE}
    fn newline(&mut self) -> Result<()> {
        self.expect(TokenKind::Newline)?;
        while self.check(TokenKind::Newline) {
            self.next_token()?;
        }
        Ok(())
    }
}
