use crate::ast::Expr;

/// Statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Expression evaluated for its effect, result discarded
    Expression(Expr),

    /// `{ ... }` — statements executed in order
    Block(Vec<Stmt>),

    /// `if (cond) stmt [else stmt]`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while (cond) stmt`
    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// `for (init; cond; step) stmt`
    ///
    /// Every header part may be empty; a missing condition is treated as
    /// permanently true.
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },

    /// `each (a, b in arr) meet cond { ... }`
    ///
    /// Iterates over ordered pairs of distinct elements of the named
    /// array (all i < j), running the body for pairs where the `meet`
    /// condition holds.
    Each {
        first: String,
        second: String,
        array: String,
        condition: Expr,
        body: Box<Stmt>,
    },

    /// `return [expr];`
    Return(Option<Expr>),

    /// `print expr, expr, ...;`
    Print(Vec<Expr>),

    /// `int|float name [= expr];` — the type keyword is not enforced
    Declaration {
        name: String,
        init: Option<Expr>,
    },

    /// A bare `;`
    Empty,
}
