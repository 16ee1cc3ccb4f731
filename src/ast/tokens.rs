/// Lexical token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    If,
    Else,
    While,
    For,
    In,
    Each,
    Meet,
    Int,
    Float,
    Void,
    Return,
    Print,
    Api,
    Listen,

    /// Name of a variable: `[A-Za-z_][A-Za-z0-9_]*`
    Identifier,

    // Literals
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,

    // Operators
    Plus,       // +
    PlusPlus,   // ++
    Minus,      // -
    MinusMinus, // --
    Star,       // *
    Slash,      // /
    Assign,     // =
    EqEq,       // ==
    NotEq,      // !=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    AndAnd,     // &&
    OrOr,       // ||
    Not,        // !
    /// `->`, lexed but reserved for future use
    RightArrow,
    /// `<-`, the fetch operator
    LeftArrow,

    // Separators
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Semicolon,
    Colon,
    Comma,
    Dot,

    Eof,
    /// Any character with no lexical meaning, carried as the lexeme
    Unknown,
}

/// A single token: kind, raw lexeme text, and source position.
///
/// For string literals the text holds the unescaped content; for every
/// other kind it is the raw lexeme.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}
