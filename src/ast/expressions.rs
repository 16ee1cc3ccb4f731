use crate::ast::BinOp;

/// Key on the right-hand side of a `.` access.
///
/// The right-hand side of `.` is captured syntactically rather than being
/// evaluated as an expression: only a bare name or an integer literal may
/// appear there. This keeps `obj.key` a purely syntactic form.
#[derive(Debug, Clone, PartialEq)]
pub enum DotKey {
    /// Field name, used as a string key into an object
    Name(String),
    /// Integer index into an array; a negative index yields null
    Index(i64),
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal
    Integer(i64),

    /// Float literal
    Float(f64),

    /// String literal
    String(String),

    /// Variable reference
    Identifier(String),

    /// Logical negation (`!expr`)
    Not(Box<Expr>),

    /// Binary operation (arithmetic, comparison, logical)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Assignment (`target = value`)
    ///
    /// The grammar admits any expression on the left; the evaluator
    /// requires an identifier.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [10, 20, 30]
    /// ```
    Array(Vec<Expr>),

    /// Object literal, members in source order
    ///
    /// # Example
    /// ```text
    /// { "msg": "hi", "count": n }
    /// ```
    Object(Vec<(String, Expr)>),

    /// Array access `arr[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },

    /// Dot access `value.name` or `value.0`
    Dot {
        object: Box<Expr>,
        key: DotKey,
    },

    /// Outbound fetch `name <- url`
    ///
    /// Performs an HTTP GET against the url, decodes the response body as
    /// JSON, and binds the decoded value to `name`.
    Fetch {
        target: Box<Expr>,
        url: Box<Expr>,
    },
}
