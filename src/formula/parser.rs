//! Recursive-descent parser and evaluator for the formula language.
//!
//! The grammar, from loosest to tightest binding:
//!
//! ```text
//! expression := term (('+' | '-') term)*          left-associative
//! term       := unary (('*' | '/') unary)*        left-associative
//! unary      := '-' unary | postfix
//! postfix    := primary '%'*                      percent binds tighter than '*'
//! primary    := Number | Identifier
//!             | FuncName '(' arguments ')'
//!             | '(' expression ')'
//! arguments  := argument (',' argument)*
//! argument   := expression | '[' expression (',' expression)* ']'
//! ```
//!
//! `X%` evaluates to `X / 100`, so `X% * Y` and `Y * X%` are both
//! `(X/100) * Y`. Evaluation is strict and produces a numeric result
//! directly; there is no separate AST.

use crate::error::{EngineError, EngineResult};
use crate::models::VariableContext;

use super::functions;
use super::tokenizer::Token;

/// Maximum nesting depth of parentheses, brackets, and function calls.
///
/// The grammar cannot loop or recurse on its own, but formulas are
/// operator-authored strings, so pathological nesting is bounded.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Evaluates a token stream against a variable context.
///
/// Identifier leaves are resolved case-insensitively; a name absent from the
/// context is a hard [`EngineError::MissingVariable`] failure, never a
/// default zero. Division by zero is [`EngineError::DivisionByZero`], never
/// an infinity.
pub fn evaluate_tokens(tokens: &[Token], context: &VariableContext) -> EngineResult<f64> {
    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
        context,
    };
    let value = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(EngineError::SyntaxError {
            message: format!("unexpected token {token:?} after expression"),
        });
    }
    if !value.is_finite() {
        return Err(EngineError::NonFiniteResult);
    }
    Ok(value)
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    depth: usize,
    context: &'a VariableContext,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, context_message: &str) -> EngineResult<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(EngineError::SyntaxError {
                message: format!("expected {context_message}, found {token:?}"),
            }),
            None => Err(EngineError::SyntaxError {
                message: format!("expected {context_message}, found end of formula"),
            }),
        }
    }

    fn enter_nesting(&mut self) -> EngineResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(EngineError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> EngineResult<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> EngineResult<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(EngineError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> EngineResult<f64> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            return Ok(-self.unary()?);
        }
        self.postfix()
    }

    fn postfix(&mut self) -> EngineResult<f64> {
        let mut value = self.primary()?;
        while matches!(self.peek(), Some(Token::Percent)) {
            self.advance();
            value /= 100.0;
        }
        Ok(value)
    }

    fn primary(&mut self) -> EngineResult<f64> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(*value),
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.context
                    .get(&name)
                    .ok_or(EngineError::MissingVariable { name })
            }
            Some(Token::FuncName(name)) => {
                let name = name.clone();
                self.call(name)
            }
            Some(Token::LParen) => {
                self.enter_nesting()?;
                let value = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                self.exit_nesting();
                Ok(value)
            }
            Some(token) => Err(EngineError::SyntaxError {
                message: format!("unexpected token {token:?}"),
            }),
            None => Err(EngineError::SyntaxError {
                message: "unexpected end of formula".to_string(),
            }),
        }
    }

    /// Parses and applies `name(arg, ...)`. The bracketed-list convenience
    /// form `name([a, b, c])` desugars to the same argument vector.
    fn call(&mut self, name: String) -> EngineResult<f64> {
        self.enter_nesting()?;
        self.expect(&Token::LParen, "'(' after function name")?;

        let mut args = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                self.argument(&mut args)?;
                match self.peek() {
                    Some(Token::Comma) => {
                        self.advance();
                    }
                    _ => break,
                }
            }
        }
        self.expect(&Token::RParen, "')' to close the argument list")?;
        self.exit_nesting();

        functions::call(&name, &args)
    }

    fn argument(&mut self, args: &mut Vec<f64>) -> EngineResult<()> {
        if matches!(self.peek(), Some(Token::LBracket)) {
            self.advance();
            self.enter_nesting()?;
            loop {
                let value = self.expression()?;
                args.push(value);
                match self.advance() {
                    Some(Token::Comma) => continue,
                    Some(Token::RBracket) => break,
                    Some(token) => {
                        return Err(EngineError::SyntaxError {
                            message: format!("expected ',' or ']' in list, found {token:?}"),
                        });
                    }
                    None => {
                        return Err(EngineError::SyntaxError {
                            message: "unterminated bracketed list".to_string(),
                        });
                    }
                }
            }
            self.exit_nesting();
        } else {
            args.push(self.expression()?);
        }
        Ok(())
    }
}
