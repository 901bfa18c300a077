use log::debug;
use serde::Serialize;
use std::fmt;

/// The different kinds of tokens recognized by the Rox scanner.
///
/// Variants carry no data: the literal value of `STRING` and `NUMBER` tokens
/// lives in [`Token::literal`].  `EOF` marks the end of input and is always
/// the last token of a stream.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal
    STRING,

    /// A numeric literal
    NUMBER,

    AND,

    /// Reserved; the grammar has no classes.
    CLASS,

    ELSE,

    FALSE,

    FUN,

    FOR,

    IF,

    NIL,

    OR,

    PRINT,

    RETURN,

    /// Reserved.
    SUPER,

    /// Reserved.
    THIS,

    TRUE,

    VAR,

    WHILE,

    /// End‑of‑file marker
    EOF,
}

/// Literal payload of a `STRING` or `NUMBER` token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// IEEE‑754 double; integral lexemes such as `"3"` are stored as `3.0`.
    Number(f64),

    /// String contents without the surrounding quotes.
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // 3 → "3.0", 3.14 → "3.14"
            Literal::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "{}.0", buf.format(*n as i64))
            }

            Literal::Number(n) => write!(f, "{}", n),

            Literal::Str(s) => write!(f, "{}", s),
        }
    }
}

/// A scanned token: its type, the source lexeme, the literal value (for
/// strings and numbers) and the line number where it was found.
///
/// Tokens own their text so the AST built from them can outlive the source
/// buffer, which an interactive session needs for closures defined on
/// earlier lines.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// Value of a `STRING` or `NUMBER` token.
    pub literal: Option<Literal>,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, literal and line.
    pub fn new<S: Into<String>>(
        token_type: TokenType,
        lexeme: S,
        literal: Option<Literal>,
        line: usize,
    ) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            literal,
            line,
        }
    }

    /// End‑of‑input sentinel on `line`.
    pub fn eof(line: usize) -> Self {
        Self::new(TokenType::EOF, "", None, line)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Variant names are already upper snake case, so `Debug` is the
        // printed name.
        match &self.literal {
            Some(literal) => write!(f, "{:?} {} {}", self.token_type, self.lexeme, literal),
            None => write!(f, "{:?} {} null", self.token_type, self.lexeme),
        }
    }
}
