// src/sandbox/lexer.rs

//! Tokenizer for generated snippets.
//!
//! The allow-list lives here: every character class outside the arithmetic
//! grammar is rejected with a diagnostic naming the construct, before any
//! parsing or evaluation happens. Unknown input always fails closed.

use super::error::SandboxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Assign,
    LParen,
    RParen,
    /// Statement separator (newline or `;`).
    Newline,
}

/// Identifiers that signal a construct the sandbox refuses outright.
fn reserved_construct(word: &str) -> Option<&'static str> {
    match word {
        "import" | "from" => Some("import statement"),
        "def" | "lambda" | "class" => Some("function or class definition"),
        "if" | "elif" | "else" | "for" | "while" | "try" | "except" | "finally" | "with"
        | "return" | "yield" | "raise" | "break" | "continue" | "pass" | "match" => {
            Some("control flow")
        }
        "and" | "or" | "not" | "in" | "is" => Some("boolean or comparison operator"),
        "True" | "False" | "None" | "true" | "false" | "null" => Some("non-numeric constant"),
        "global" | "nonlocal" | "del" | "assert" | "exec" | "eval" => Some("forbidden statement"),
        _ => None,
    }
}

pub fn tokenize(snippet: &str) -> Result<Vec<Token>, SandboxError> {
    let mut tokens = Vec::new();
    let mut chars = snippet.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' | ';' => {
                chars.next();
                tokens.push(Token::Newline);
            }
            // Comments run to end of line, like the host grammar.
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '0'..='9' => tokens.push(lex_number(&mut chars)?),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if let Some(construct) = reserved_construct(&word) {
                    return Err(SandboxError::Disallowed(construct));
                }
                tokens.push(Token::Ident(word));
            }
            '+' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    return Err(SandboxError::Disallowed("augmented assignment"));
                }
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    return Err(SandboxError::Disallowed("augmented assignment"));
                }
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::DoubleStar);
                } else if chars.peek() == Some(&'=') {
                    return Err(SandboxError::Disallowed("augmented assignment"));
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    tokens.push(Token::DoubleSlash);
                } else if chars.peek() == Some(&'=') {
                    return Err(SandboxError::Disallowed("augmented assignment"));
                } else {
                    tokens.push(Token::Slash);
                }
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    return Err(SandboxError::Disallowed("comparison operator"));
                }
                tokens.push(Token::Assign);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '"' | '\'' => return Err(SandboxError::Disallowed("string literal")),
            '[' | ']' => return Err(SandboxError::Disallowed("subscript or list literal")),
            '{' | '}' => return Err(SandboxError::Disallowed("collection literal")),
            '.' => return Err(SandboxError::Disallowed("attribute access")),
            ',' => return Err(SandboxError::Disallowed("argument or tuple list")),
            ':' => return Err(SandboxError::Disallowed("block or annotation")),
            '<' | '>' | '!' => return Err(SandboxError::Disallowed("comparison operator")),
            '&' | '|' | '^' | '~' | '@' => return Err(SandboxError::Disallowed("bitwise operator")),
            // Default branch fails closed: anything unrecognized is rejected.
            other => {
                return Err(SandboxError::Syntax(format!(
                    "unexpected character `{}`",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

fn lex_number(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Token, SandboxError> {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if chars.peek() == Some(&'.') {
        // Lookahead: `1.5` is a float literal, `1.foo` is attribute access.
        let mut ahead = chars.clone();
        ahead.next();
        match ahead.peek() {
            Some(d) if d.is_ascii_digit() => {
                text.push('.');
                chars.next();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
            }
            _ => return Err(SandboxError::Disallowed("attribute access")),
        }
    }
    text.parse::<f64>()
        .map(Token::Number)
        .map_err(|_| SandboxError::Syntax(format!("invalid number literal `{}`", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_assignment_with_operators() {
        let tokens = tokenize("result = 2 + 3 * 4").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("result".into()),
                Token::Assign,
                Token::Number(2.0),
                Token::Plus,
                Token::Number(3.0),
                Token::Star,
                Token::Number(4.0),
            ]
        );
    }

    #[test]
    fn distinguishes_compound_operators() {
        let tokens = tokenize("a ** b // c").unwrap();
        assert!(tokens.contains(&Token::DoubleStar));
        assert!(tokens.contains(&Token::DoubleSlash));
    }

    #[test]
    fn rejects_string_literals() {
        assert_eq!(
            tokenize("x = 'hello'"),
            Err(SandboxError::Disallowed("string literal"))
        );
    }

    #[test]
    fn rejects_reserved_words() {
        assert_eq!(
            tokenize("import os"),
            Err(SandboxError::Disallowed("import statement"))
        );
        assert_eq!(
            tokenize("x = True"),
            Err(SandboxError::Disallowed("non-numeric constant"))
        );
    }

    #[test]
    fn strips_comments() {
        let tokens = tokenize("x = 1 # the answer\n").unwrap();
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn float_dot_requires_digits() {
        assert!(tokenize("x = 1.5").is_ok());
        assert_eq!(
            tokenize("x = 1.to_int"),
            Err(SandboxError::Disallowed("attribute access"))
        );
    }
}
