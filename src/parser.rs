use crate::ast::{BinOp, DotKey, Endpoint, Expr, Program, Stmt, Token, TokenKind};
use crate::lexer::Lexer;

/// Errors that can occur during parsing
#[derive(Debug, Clone)]
pub enum ParseError {
    /// The current token does not fit the grammar
    UnexpectedToken { expected: String, got: Token },
    /// Structurally valid but meaningless input (e.g. an out-of-range literal)
    InvalidSyntax {
        message: String,
        line: u32,
        column: u32,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, got } => {
                write!(
                    f,
                    "Parse error at line {}, column {}: expected {}, got ",
                    got.line, got.column, expected
                )?;
                if got.kind == TokenKind::Eof {
                    write!(f, "end of input")
                } else {
                    write!(f, "'{}'", got.text)
                }
            }
            ParseError::InvalidSyntax {
                message,
                line,
                column,
            } => {
                write!(f, "Parse error at line {}, column {}: {}", line, column, message)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Recursive-descent parser over the token stream.
///
/// Expressions are parsed with a precedence ladder, lowest to highest:
/// assignment, `||`, `&&`, equality, relational, additive, multiplicative,
/// fetch (`<-`), unary `!` / primary.
pub struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current = lexer.next_token();
        Parser { lexer, current }
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            got: self.current.clone(),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
        if !self.check(kind) {
            return Err(self.unexpected(expected));
        }
        self.advance();
        Ok(())
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        if !self.check(TokenKind::Identifier) {
            return Err(self.unexpected(expected));
        }
        let name = self.current.text.clone();
        self.advance();
        Ok(name)
    }

    fn invalid_literal(&self) -> ParseError {
        ParseError::InvalidSyntax {
            message: format!("numeric literal '{}' is out of range", self.current.text),
            line: self.current.line,
            column: self.current.column,
        }
    }

    /// Parse a whole source file: `listen` directives and `api` declarations.
    ///
    /// Each `listen <port>` sets the current port (initially 80); every
    /// `api` declaration that follows is attached to it.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut endpoints = Vec::new();
        let mut port: u16 = 80;

        while !self.check(TokenKind::Eof) {
            match self.current.kind {
                TokenKind::Listen => {
                    self.advance();
                    if !self.check(TokenKind::IntegerLiteral) {
                        return Err(self.unexpected("port number after 'listen'"));
                    }
                    port = self
                        .current
                        .text
                        .parse::<u16>()
                        .map_err(|_| self.invalid_literal())?;
                    self.advance();
                }
                TokenKind::Api => {
                    self.advance();
                    if !self.check(TokenKind::StringLiteral) {
                        return Err(self.unexpected("path string after 'api'"));
                    }
                    let path = self.current.text.clone();
                    self.advance();
                    let body = self.parse_block()?;
                    endpoints.push(Endpoint { path, port, body });
                }
                _ => return Err(self.unexpected("'listen' or 'api' at top level")),
            }
        }

        Ok(Program { endpoints })
    }

    /// Parse a bare statement sequence (used by the eval server, which
    /// receives statements rather than whole programs).
    pub fn parse_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current.kind {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Each => self.parse_each(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Int | TokenKind::Float => self.parse_declaration(),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LBrace, "'{' to start block")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }

        self.expect(TokenKind::RBrace, "'}' to end block")?;
        Ok(Stmt::Block(statements))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after if condition")?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::While, "'while'")?;
        self.expect(TokenKind::LParen, "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after while condition")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::For, "'for'")?;
        self.expect(TokenKind::LParen, "'(' after 'for'")?;

        // The init statement consumes its own terminator
        let init = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            Some(Box::new(self.parse_statement()?))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "';' in for loop header")?;

        let step = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RParen, "')' after for loop header")?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn parse_each(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::Each, "'each'")?;
        self.expect(TokenKind::LParen, "'(' after 'each'")?;
        let first = self.expect_identifier("pair variable in 'each'")?;
        self.expect(TokenKind::Comma, "',' between pair variables")?;
        let second = self.expect_identifier("pair variable in 'each'")?;
        self.expect(TokenKind::In, "'in' after pair variables")?;
        let array = self.expect_identifier("array name in 'each'")?;
        self.expect(TokenKind::RParen, "')' after 'each' header")?;
        self.expect(TokenKind::Meet, "'meet' after 'each' header")?;
        let condition = self.parse_expression()?;
        let body = Box::new(self.parse_block()?);

        Ok(Stmt::Each {
            first,
            second,
            array,
            condition,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::Return, "'return'")?;

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect(TokenKind::Semicolon, "';' after return")?;
        Ok(Stmt::Return(value))
    }

    fn parse_print(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::Print, "'print'")?;

        let mut args = vec![self.parse_expression()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            args.push(self.parse_expression()?);
        }

        self.expect(TokenKind::Semicolon, "';' after print")?;
        Ok(Stmt::Print(args))
    }

    fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        // The type keyword is consumed but not enforced
        self.advance();
        let name = self.expect_identifier("identifier in declaration")?;

        let init = if self.check(TokenKind::Assign) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon, "';' after declaration")?;
        Ok(Stmt::Declaration { name, init })
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_logical_or()?;

        if self.check(TokenKind::Assign) {
            self.advance();
            // Right-associative
            let value = self.parse_assignment()?;
            return Ok(Expr::Assign {
                target: Box::new(left),
                value: Box::new(value),
            });
        }

        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;

        while self.check(TokenKind::OrOr) {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check(TokenKind::AndAnd) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinOp::Equal,
                TokenKind::NotEq => BinOp::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Lt => BinOp::LessThan,
                TokenKind::LtEq => BinOp::LessEqual,
                TokenKind::Gt => BinOp::GreaterThan,
                TokenKind::GtEq => BinOp::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_fetch()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinOp::Multiply,
                TokenKind::Slash => BinOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_fetch()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_fetch(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_primary()?;

        while self.check(TokenKind::LeftArrow) {
            self.advance();
            let url = self.parse_primary()?;
            left = Expr::Fetch {
                target: Box::new(left),
                url: Box::new(url),
            };
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current.kind {
            TokenKind::IntegerLiteral => {
                let n = self
                    .current
                    .text
                    .parse::<i64>()
                    .map_err(|_| self.invalid_literal())?;
                self.advance();
                Ok(Expr::Integer(n))
            }
            TokenKind::FloatLiteral => {
                let n = self
                    .current
                    .text
                    .parse::<f64>()
                    .map_err(|_| self.invalid_literal())?;
                self.advance();
                Ok(Expr::Float(n))
            }
            TokenKind::StringLiteral => {
                let s = self.current.text.clone();
                self.advance();
                Ok(Expr::String(s))
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_primary()?;
                Ok(Expr::Not(Box::new(operand)))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::Identifier => {
                let name = self.current.text.clone();
                self.advance();
                self.parse_postfix(Expr::Identifier(name))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        self.advance(); // '['

        let mut elements = Vec::new();
        while !self.check(TokenKind::RBracket) {
            elements.push(self.parse_expression()?);

            if self.check(TokenKind::Comma) {
                self.advance();
            } else if !self.check(TokenKind::RBracket) {
                return Err(self.unexpected("',' or ']' in array literal"));
            }
        }

        self.advance(); // ']'
        Ok(Expr::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        self.advance(); // '{'

        let mut members = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if !self.check(TokenKind::StringLiteral) {
                return Err(self.unexpected("string literal as object key"));
            }
            let key = self.current.text.clone();
            self.advance();

            self.expect(TokenKind::Colon, "':' after object key")?;
            let value = self.parse_expression()?;
            members.push((key, value));

            if self.check(TokenKind::Comma) {
                self.advance();
            } else if !self.check(TokenKind::RBrace) {
                return Err(self.unexpected("',' or '}' in object literal"));
            }
        }

        self.advance(); // '}'
        Ok(Expr::Object(members))
    }

    /// Accrete `[index]` and `.name` / `.int` suffixes onto a primary.
    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            if self.check(TokenKind::LBracket) {
                self.advance();
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket, "']' after array index")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.check(TokenKind::Dot) {
                self.advance();
                let key = match self.current.kind {
                    TokenKind::Identifier => DotKey::Name(self.current.text.clone()),
                    TokenKind::IntegerLiteral => DotKey::Index(
                        self.current
                            .text
                            .parse::<i64>()
                            .map_err(|_| self.invalid_literal())?,
                    ),
                    _ => return Err(self.unexpected("identifier or integer after '.'")),
                };
                self.advance();
                expr = Expr::Dot {
                    object: Box::new(expr),
                    key,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }
}
