//! Tokenizer for the formula language.
//!
//! Turns a formula string into a token stream. Numeric literals carry
//! optional leading digits and at most one decimal point; there is no
//! exponent notation and no sign (unary minus is a parser-level prefix
//! operator). `%` is the postfix percent operator, not modulo; this
//! language has no modulo.

use crate::error::{EngineError, EngineResult};

/// A single lexical token of the formula language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal.
    Number(f64),
    /// A variable reference.
    Identifier(String),
    /// An identifier followed by `(`, i.e. a function call head.
    FuncName(String),
    /// The `+` operator.
    Plus,
    /// The `-` operator.
    Minus,
    /// The `*` operator.
    Star,
    /// The `/` operator.
    Slash,
    /// The postfix percent operator.
    Percent,
    /// An opening parenthesis.
    LParen,
    /// A closing parenthesis.
    RParen,
    /// An opening square bracket (bracketed argument list).
    LBracket,
    /// A closing square bracket.
    RBracket,
    /// An argument separator.
    Comma,
}

/// Tokenizes a formula string.
///
/// The caller is expected to have run the security validator first; this
/// function still rejects anything it cannot lex with a
/// [`EngineError::SyntaxError`] so it is safe to call directly.
///
/// # Example
///
/// ```
/// use payroll_engine::formula::tokenizer::{tokenize, Token};
///
/// let tokens = tokenize("basic_salary * 20%").unwrap();
/// assert_eq!(tokens[0], Token::Identifier("basic_salary".to_string()));
/// assert_eq!(tokens[1], Token::Star);
/// assert_eq!(tokens[2], Token::Number(20.0));
/// assert_eq!(tokens[3], Token::Percent);
/// ```
pub fn tokenize(formula: &str) -> EngineResult<Vec<Token>> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut position = 0;

    while position < chars.len() {
        let c = chars[position];

        if c.is_ascii_whitespace() {
            position += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let (number, next) = lex_number(&chars, position)?;
            tokens.push(Token::Number(number));
            position = next;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = position;
            while position < chars.len()
                && (chars[position].is_ascii_alphanumeric() || chars[position] == '_')
            {
                position += 1;
            }
            let name: String = chars[start..position].iter().collect();

            // An identifier directly heading a parenthesized list is a
            // function name; whitespace before the paren is tolerated.
            let mut lookahead = position;
            while lookahead < chars.len() && chars[lookahead].is_ascii_whitespace() {
                lookahead += 1;
            }
            if lookahead < chars.len() && chars[lookahead] == '(' {
                tokens.push(Token::FuncName(name));
            } else {
                tokens.push(Token::Identifier(name));
            }
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            other => {
                return Err(EngineError::SyntaxError {
                    message: format!("unexpected character '{other}'"),
                });
            }
        };
        tokens.push(token);
        position += 1;
    }

    Ok(tokens)
}

/// Lexes a numeric literal starting at `start`, returning the value and the
/// position just past it.
fn lex_number(chars: &[char], start: usize) -> EngineResult<(f64, usize)> {
    let mut position = start;
    let mut seen_dot = false;

    while position < chars.len() {
        let c = chars[position];
        if c.is_ascii_digit() {
            position += 1;
        } else if c == '.' {
            if seen_dot {
                let literal: String = chars[start..=position].iter().collect();
                return Err(EngineError::SyntaxError {
                    message: format!("malformed numeric literal '{literal}'"),
                });
            }
            seen_dot = true;
            position += 1;
        } else {
            break;
        }
    }

    let literal: String = chars[start..position].iter().collect();
    let value: f64 = literal.parse().map_err(|_| EngineError::SyntaxError {
        message: format!("malformed numeric literal '{literal}'"),
    })?;

    Ok((value, position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    #[test]
    fn test_tokenizes_integers_and_decimals() {
        assert_eq!(
            tokenize("12 3.5 0.25 .5").unwrap(),
            vec![
                Token::Number(12.0),
                Token::Number(3.5),
                Token::Number(0.25),
                Token::Number(0.5),
            ]
        );
    }

    #[test]
    fn test_rejects_two_decimal_points() {
        let result = tokenize("1.2.3");
        assert!(matches!(result, Err(EngineError::SyntaxError { .. })));
    }

    #[test]
    fn test_rejects_bare_dot() {
        let result = tokenize("1 + .");
        assert!(matches!(result, Err(EngineError::SyntaxError { .. })));
    }

    #[test]
    fn test_no_exponent_notation() {
        // "1e5" lexes as a number followed by an identifier, never as 100000.
        assert_eq!(
            tokenize("1e5").unwrap(),
            vec![Token::Number(1.0), ident("e5")]
        );
    }

    #[test]
    fn test_operators_and_grouping() {
        assert_eq!(
            tokenize("(a+b)*c/d-e").unwrap(),
            vec![
                Token::LParen,
                ident("a"),
                Token::Plus,
                ident("b"),
                Token::RParen,
                Token::Star,
                ident("c"),
                Token::Slash,
                ident("d"),
                Token::Minus,
                ident("e"),
            ]
        );
    }

    #[test]
    fn test_percent_is_its_own_token() {
        assert_eq!(
            tokenize("8% * gross_salary").unwrap(),
            vec![
                Token::Number(8.0),
                Token::Percent,
                Token::Star,
                ident("gross_salary"),
            ]
        );
    }

    #[test]
    fn test_function_name_requires_following_paren() {
        assert_eq!(
            tokenize("SUM(a, b)").unwrap(),
            vec![
                Token::FuncName("SUM".to_string()),
                Token::LParen,
                ident("a"),
                Token::Comma,
                ident("b"),
                Token::RParen,
            ]
        );
        // Without a call, the same word is an ordinary identifier.
        assert_eq!(tokenize("SUM + 1").unwrap()[0], ident("SUM"));
    }

    #[test]
    fn test_function_name_tolerates_space_before_paren() {
        assert_eq!(
            tokenize("ROUND (1.5, 0)").unwrap()[0],
            Token::FuncName("ROUND".to_string())
        );
    }

    #[test]
    fn test_bracketed_list_tokens() {
        assert_eq!(
            tokenize("SUM([a, b])").unwrap(),
            vec![
                Token::FuncName("SUM".to_string()),
                Token::LParen,
                Token::LBracket,
                ident("a"),
                Token::Comma,
                ident("b"),
                Token::RBracket,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_identifiers_keep_case() {
        assert_eq!(
            tokenize("Basic_Salary").unwrap(),
            vec![ident("Basic_Salary")]
        );
    }

    #[test]
    fn test_whitespace_only_formula_is_empty() {
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_unexpected_character() {
        let result = tokenize("1 ; 2");
        assert!(matches!(result, Err(EngineError::SyntaxError { .. })));
    }
}
