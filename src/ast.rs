//! Abstract syntax tree for Glue programs.
//!
//! A program is a sequence of top-level `listen` directives and
//! `api "<path>" { ... }` endpoint declarations; endpoint bodies are
//! statements over a small dynamically-typed expression language.
//!
//! The module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Binary operators
//! - **[expressions]** - Expression nodes
//! - **[statements]** - Statement nodes
//! - **[program]** - Endpoint declarations and the program root
//!
//! The tree is immutable once the parser returns it: the dispatcher takes
//! ownership of the endpoints and shares their bodies read-only across
//! requests.

pub mod expressions;
pub mod operators;
pub mod program;
pub mod statements;
pub mod tokens;

pub use expressions::{DotKey, Expr};
pub use operators::BinOp;
pub use program::{Endpoint, Program};
pub use statements::Stmt;
pub use tokens::{Token, TokenKind};
