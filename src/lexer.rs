use crate::ast::{Token, TokenKind};
use crate::source::SourceReader;

/// Classify an identifier against the keyword table.
fn keyword(ident: &str) -> Option<TokenKind> {
    match ident {
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "while" => Some(TokenKind::While),
        "for" => Some(TokenKind::For),
        "in" => Some(TokenKind::In),
        "each" => Some(TokenKind::Each),
        "meet" => Some(TokenKind::Meet),
        "int" => Some(TokenKind::Int),
        "float" => Some(TokenKind::Float),
        "void" => Some(TokenKind::Void),
        "return" => Some(TokenKind::Return),
        "print" => Some(TokenKind::Print),
        "api" => Some(TokenKind::Api),
        "listen" => Some(TokenKind::Listen),
        _ => None,
    }
}

/// Folds source characters into tokens.
///
/// Tokenization is total: every input produces a stream of tokens ending
/// in `Eof`. Characters with no lexical meaning become `Unknown` tokens,
/// and malformed constructs (unterminated strings or block comments) warn
/// on stderr and produce the content accumulated so far.
///
/// Newlines are whitespace; `;` is the sole statement terminator.
pub struct Lexer {
    source: SourceReader,
}

impl Lexer {
    pub fn new(source: SourceReader) -> Self {
        Lexer { source }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.source.current_char() {
            if ch.is_whitespace() {
                self.source.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self, line: u32, column: u32) -> Token {
        let mut ident = String::new();
        while let Some(ch) = self.source.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.source.advance();
            } else {
                break;
            }
        }

        let kind = keyword(&ident).unwrap_or(TokenKind::Identifier);
        Token::new(kind, ident, line, column)
    }

    fn read_number(&mut self, line: u32, column: u32) -> Token {
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.source.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.source.advance();
            } else {
                break;
            }
        }

        if self.source.current_char() == Some('.') {
            is_float = true;
            number.push('.');
            self.source.advance();
            while let Some(ch) = self.source.current_char() {
                if ch.is_ascii_digit() {
                    number.push(ch);
                    self.source.advance();
                } else {
                    break;
                }
            }
        }

        if let Some(exp) = self.source.current_char().filter(|c| *c == 'e' || *c == 'E') {
            is_float = true;
            number.push(exp);
            self.source.advance();
            if let Some(sign) = self.source.current_char().filter(|c| *c == '+' || *c == '-') {
                number.push(sign);
                self.source.advance();
            }
            while let Some(ch) = self.source.current_char() {
                if ch.is_ascii_digit() {
                    number.push(ch);
                    self.source.advance();
                } else {
                    break;
                }
            }
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntegerLiteral
        };
        Token::new(kind, number, line, column)
    }

    fn read_string(&mut self, quote: char, line: u32, column: u32) -> Token {
        let mut content = String::new();
        self.source.advance(); // opening quote

        loop {
            match self.source.current_char() {
                None => {
                    eprintln!(
                        "Warning: unclosed string literal at line {}, column {}",
                        line, column
                    );
                    break;
                }
                Some(ch) if ch == quote => {
                    self.source.advance();
                    break;
                }
                Some('\\') => {
                    self.source.advance();
                    match self.source.current_char() {
                        Some('n') => content.push('\n'),
                        Some('t') => content.push('\t'),
                        Some('r') => content.push('\r'),
                        Some('"') => content.push('"'),
                        Some('\'') => content.push('\''),
                        Some('\\') => content.push('\\'),
                        // Unknown escapes stand for themselves
                        Some(other) => content.push(other),
                        None => continue,
                    }
                    self.source.advance();
                }
                Some(ch) => {
                    content.push(ch);
                    self.source.advance();
                }
            }
        }

        Token::new(TokenKind::StringLiteral, content, line, column)
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.source.current_char() {
            if ch == '\n' {
                break;
            }
            self.source.advance();
        }
    }

    fn skip_block_comment(&mut self, line: u32, column: u32) {
        loop {
            match self.source.current_char() {
                None => {
                    eprintln!(
                        "Warning: unclosed block comment at line {}, column {}",
                        line, column
                    );
                    break;
                }
                Some('*') if self.source.peek_char(1) == Some('/') => {
                    self.source.advance();
                    self.source.advance();
                    break;
                }
                Some(_) => self.source.advance(),
            }
        }
    }

    fn read_operator_or_separator(&mut self, ch: char, line: u32, column: u32) -> Token {
        self.source.advance();

        let token = |kind, text: &str| Token::new(kind, text, line, column);

        match ch {
            '+' => {
                if self.source.current_char() == Some('+') {
                    self.source.advance();
                    token(TokenKind::PlusPlus, "++")
                } else {
                    token(TokenKind::Plus, "+")
                }
            }
            '-' => match self.source.current_char() {
                Some('-') => {
                    self.source.advance();
                    token(TokenKind::MinusMinus, "--")
                }
                Some('>') => {
                    self.source.advance();
                    token(TokenKind::RightArrow, "->")
                }
                _ => token(TokenKind::Minus, "-"),
            },
            '*' => token(TokenKind::Star, "*"),
            '/' => match self.source.current_char() {
                Some('/') => {
                    self.skip_line_comment();
                    self.next_token()
                }
                Some('*') => {
                    self.source.advance();
                    self.skip_block_comment(line, column);
                    self.next_token()
                }
                _ => token(TokenKind::Slash, "/"),
            },
            '=' => {
                if self.source.current_char() == Some('=') {
                    self.source.advance();
                    token(TokenKind::EqEq, "==")
                } else {
                    token(TokenKind::Assign, "=")
                }
            }
            '!' => {
                if self.source.current_char() == Some('=') {
                    self.source.advance();
                    token(TokenKind::NotEq, "!=")
                } else {
                    token(TokenKind::Not, "!")
                }
            }
            '<' => match self.source.current_char() {
                Some('=') => {
                    self.source.advance();
                    token(TokenKind::LtEq, "<=")
                }
                Some('-') => {
                    self.source.advance();
                    token(TokenKind::LeftArrow, "<-")
                }
                _ => token(TokenKind::Lt, "<"),
            },
            '>' => {
                if self.source.current_char() == Some('=') {
                    self.source.advance();
                    token(TokenKind::GtEq, ">=")
                } else {
                    token(TokenKind::Gt, ">")
                }
            }
            '&' => {
                if self.source.current_char() == Some('&') {
                    self.source.advance();
                    token(TokenKind::AndAnd, "&&")
                } else {
                    Token::new(TokenKind::Unknown, "&", line, column)
                }
            }
            '|' => {
                if self.source.current_char() == Some('|') {
                    self.source.advance();
                    token(TokenKind::OrOr, "||")
                } else {
                    Token::new(TokenKind::Unknown, "|", line, column)
                }
            }
            '(' => token(TokenKind::LParen, "("),
            ')' => token(TokenKind::RParen, ")"),
            '{' => token(TokenKind::LBrace, "{"),
            '}' => token(TokenKind::RBrace, "}"),
            '[' => token(TokenKind::LBracket, "["),
            ']' => token(TokenKind::RBracket, "]"),
            ';' => token(TokenKind::Semicolon, ";"),
            ':' => token(TokenKind::Colon, ":"),
            ',' => token(TokenKind::Comma, ","),
            '.' => token(TokenKind::Dot, "."),
            other => Token::new(TokenKind::Unknown, other.to_string(), line, column),
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.source.line();
        let column = self.source.column();

        match self.source.current_char() {
            None => Token::new(TokenKind::Eof, "", line, column),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                self.read_identifier(line, column)
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(line, column),
            Some(ch) if ch == '"' || ch == '\'' => self.read_string(ch, line, column),
            Some(ch) => self.read_operator_or_separator(ch, line, column),
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new(SourceReader::from_string("api listen each meet return"));
    assert_eq!(lexer.next_token().kind, TokenKind::Api);
    assert_eq!(lexer.next_token().kind, TokenKind::Listen);
    assert_eq!(lexer.next_token().kind, TokenKind::Each);
    assert_eq!(lexer.next_token().kind, TokenKind::Meet);
    assert_eq!(lexer.next_token().kind, TokenKind::Return);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

#[test]
fn test_two_char_operators() {
    let mut lexer = Lexer::new(SourceReader::from_string("<- -> == != <= >= && || ++ --"));
    let kinds: Vec<TokenKind> = std::iter::from_fn(|| {
        let token = lexer.next_token();
        (token.kind != TokenKind::Eof).then_some(token.kind)
    })
    .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::LeftArrow,
            TokenKind::RightArrow,
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    let mut lexer = Lexer::new(SourceReader::from_string(
        "a // line comment\n/* block\ncomment */ b",
    ));
    assert_eq!(lexer.next_token().text, "a");
    assert_eq!(lexer.next_token().text, "b");
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}
