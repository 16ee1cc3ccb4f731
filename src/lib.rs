pub mod ast;
pub mod evaluator;
pub mod fetch;
pub mod json;
pub mod lexer;
pub mod parser;
pub mod server;
pub mod source;
pub mod value;

pub use ast::{BinOp, DotKey, Endpoint, Expr, Program, Stmt, Token, TokenKind};
pub use evaluator::{EvalError, Evaluator};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use json::{json_to_value, to_json_string, value_to_json};
pub use lexer::Lexer;
pub use parser::{ParseError, Parser};
pub use server::{PortDispatcher, RoutingTable};
pub use source::SourceReader;
pub use value::Value;
