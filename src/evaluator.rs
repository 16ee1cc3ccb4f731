use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::{BinOp, DotKey, Expr, Stmt};
use crate::fetch::Fetcher;
use crate::json;
use crate::value::Value;

/// Errors that can occur while evaluating an endpoint body.
#[derive(Debug, Clone)]
pub enum EvalError {
    /// Mismatched operand types for an operator
    TypeError(String),

    /// Invalid array index or field access
    AccessError(String),

    /// Read of a name with no binding in the environment
    UndefinedVariable(String),

    /// Division by zero
    DivisionByZero,
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::TypeError(msg) => write!(f, "Type error: {}", msg),
            EvalError::AccessError(msg) => write!(f, "Access error: {}", msg),
            EvalError::UndefinedVariable(name) => {
                write!(f, "Undefined variable: {}", name)
            }
            EvalError::DivisionByZero => write!(f, "Division by zero"),
        }
    }
}

impl std::error::Error for EvalError {}

/// How a statement finished: fell through, or hit a `return`.
///
/// `Return` carries the returned value upward through every enclosing
/// statement; the endpoint body boundary unwraps it.
enum Flow {
    Normal,
    Return(Value),
}

/// Where `print` output goes.
enum PrintSink {
    Stdout,
    Capture(String),
}

/// Tree-walking evaluator for one endpoint invocation.
///
/// Holds a flat name -> value environment (assignments are visible to the
/// rest of the endpoint; there is no block scoping). Each request gets a
/// fresh evaluator, so no state leaks across invocations.
pub struct Evaluator {
    env: HashMap<String, Value>,
    fetcher: Arc<dyn Fetcher>,
    sink: PrintSink,
}

impl Evaluator {
    /// Evaluator that prints to stdout.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Evaluator {
            env: HashMap::new(),
            fetcher,
            sink: PrintSink::Stdout,
        }
    }

    /// Evaluator that buffers `print` output (used by the eval server).
    pub fn capturing(fetcher: Arc<dyn Fetcher>) -> Self {
        Evaluator {
            env: HashMap::new(),
            fetcher,
            sink: PrintSink::Capture(String::new()),
        }
    }

    /// Buffered `print` output; empty for a stdout evaluator.
    pub fn into_captured_output(self) -> String {
        match self.sink {
            PrintSink::Stdout => String::new(),
            PrintSink::Capture(buffer) => buffer,
        }
    }

    /// Evaluate an endpoint body to its result value.
    ///
    /// A body that completes without `return` produces integer `0`.
    pub fn run_endpoint(&mut self, body: &Stmt) -> Result<Value, EvalError> {
        match self.exec_statement(body)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Integer(0)),
        }
    }

    /// Execute a statement sequence, stopping at the first `return`.
    pub fn run_statements(&mut self, statements: &[Stmt]) -> Result<Value, EvalError> {
        for statement in statements {
            if let Flow::Return(value) = self.exec_statement(statement)? {
                return Ok(value);
            }
        }
        Ok(Value::Integer(0))
    }

    fn exec_statement(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Expression(expr) => {
                self.eval_expression(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                for statement in statements {
                    if let Flow::Return(value) = self.exec_statement(statement)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match self.eval_expression(condition)? {
                Value::Boolean(true) => self.exec_statement(then_branch),
                Value::Boolean(false) => match else_branch {
                    Some(else_branch) => self.exec_statement(else_branch),
                    None => Ok(Flow::Normal),
                },
                other => Err(EvalError::TypeError(format!(
                    "if condition must be a boolean, got {}",
                    other.type_name()
                ))),
            },

            Stmt::While { condition, body } => {
                // A condition that stops evaluating to a boolean ends the loop
                while let Value::Boolean(true) = self.eval_expression(condition)? {
                    if let Flow::Return(value) = self.exec_statement(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::For {
                init,
                condition,
                step,
                body,
            } => {
                if let Some(init) = init {
                    if let Flow::Return(value) = self.exec_statement(init)? {
                        return Ok(Flow::Return(value));
                    }
                }
                loop {
                    if let Some(condition) = condition {
                        match self.eval_expression(condition)? {
                            Value::Boolean(true) => {}
                            _ => break,
                        }
                    }
                    if let Flow::Return(value) = self.exec_statement(body)? {
                        return Ok(Flow::Return(value));
                    }
                    if let Some(step) = step {
                        self.eval_expression(step)?;
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Each {
                first,
                second,
                array,
                condition,
                body,
            } => {
                let elements = match self.env.get(array) {
                    Some(Value::Array(elements)) => elements.clone(),
                    Some(other) => {
                        return Err(EvalError::TypeError(format!(
                            "'each' expects an array, {} is {}",
                            array,
                            other.type_name()
                        )))
                    }
                    None => return Err(EvalError::UndefinedVariable(array.clone())),
                };

                // Every ordered pair of distinct elements, i < j
                for i in 0..elements.len() {
                    for j in i + 1..elements.len() {
                        self.env.insert(first.clone(), elements[i].clone());
                        self.env.insert(second.clone(), elements[j].clone());

                        // A non-boolean 'meet' result skips the pair
                        match self.eval_expression(condition)? {
                            Value::Boolean(true) => {}
                            _ => continue,
                        }

                        if let Flow::Return(value) = self.exec_statement(body)? {
                            return Ok(Flow::Return(value));
                        }
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expression(expr)?,
                    None => Value::Integer(0),
                };
                Ok(Flow::Return(value))
            }

            Stmt::Print(args) => {
                let mut line = String::new();
                for arg in args {
                    let value = self.eval_expression(arg)?;
                    line.push_str(&value.to_string());
                }
                self.write_line(&line);
                Ok(Flow::Normal)
            }

            Stmt::Declaration { name, init } => {
                let value = match init {
                    Some(expr) => self.eval_expression(expr)?,
                    None => Value::Integer(0),
                };
                self.env.insert(name.clone(), value);
                Ok(Flow::Normal)
            }

            Stmt::Empty => Ok(Flow::Normal),
        }
    }

    pub fn eval_expression(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),

            Expr::Identifier(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),

            Expr::Not(operand) => match self.eval_expression(operand)? {
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                other => Err(EvalError::TypeError(format!(
                    "logical '!' requires a boolean, got {}",
                    other.type_name()
                ))),
            },

            Expr::Binary { op, left, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                apply_binary(*op, &left, &right)
            }

            Expr::Assign { target, value } => {
                let name = match target.as_ref() {
                    Expr::Identifier(name) => name.clone(),
                    _ => {
                        return Err(EvalError::TypeError(
                            "assignment target must be an identifier".to_string(),
                        ))
                    }
                };
                let value = self.eval_expression(value)?;
                self.env.insert(name, value.clone());
                Ok(value)
            }

            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expression(element)?);
                }
                Ok(Value::Array(values))
            }

            Expr::Object(members) => {
                let mut map = IndexMap::with_capacity(members.len());
                for (key, expr) in members {
                    let value = self.eval_expression(expr)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(map))
            }

            Expr::Index { object, index } => {
                let object = self.eval_expression(object)?;
                let elements = match object {
                    Value::Array(elements) => elements,
                    other => {
                        return Err(EvalError::AccessError(format!(
                            "array access on {}",
                            other.type_name()
                        )))
                    }
                };
                let index = match self.eval_expression(index)? {
                    Value::Integer(n) => n,
                    other => {
                        return Err(EvalError::AccessError(format!(
                            "array index must be an integer, got {}",
                            other.type_name()
                        )))
                    }
                };
                if index < 0 {
                    return Err(EvalError::AccessError(format!(
                        "negative array index: {}",
                        index
                    )));
                }
                elements.get(index as usize).cloned().ok_or_else(|| {
                    EvalError::AccessError(format!(
                        "array index {} out of bounds (length {})",
                        index,
                        elements.len()
                    ))
                })
            }

            Expr::Dot { object, key } => {
                let object = self.eval_expression(object)?;
                match key {
                    DotKey::Name(name) => match object {
                        Value::Object(map) => {
                            Ok(map.get(name).cloned().unwrap_or(Value::Null))
                        }
                        other => Err(EvalError::AccessError(format!(
                            "field access on {}",
                            other.type_name()
                        ))),
                    },
                    DotKey::Index(index) => match object {
                        Value::Array(elements) => {
                            if *index < 0 {
                                return Ok(Value::Null);
                            }
                            elements.get(*index as usize).cloned().ok_or_else(|| {
                                EvalError::AccessError(format!(
                                    "array index {} out of bounds (length {})",
                                    index,
                                    elements.len()
                                ))
                            })
                        }
                        other => Err(EvalError::AccessError(format!(
                            "array access on {}",
                            other.type_name()
                        ))),
                    },
                }
            }

            Expr::Fetch { target, url } => self.eval_fetch(target, url),
        }
    }

    /// `name <- url`: GET the url, decode the body as JSON, bind the
    /// decoded value to `name` and return it.
    ///
    /// Transport failures degrade to an empty body, so every remote error
    /// surfaces to the program as integer `0` with no binding.
    fn eval_fetch(&mut self, target: &Expr, url: &Expr) -> Result<Value, EvalError> {
        let name = match target {
            Expr::Identifier(name) => name.clone(),
            _ => {
                return Err(EvalError::TypeError(
                    "fetch target must be an identifier".to_string(),
                ))
            }
        };

        let url = match self.eval_expression(url)? {
            Value::String(url) => url,
            other => {
                return Err(EvalError::TypeError(format!(
                    "fetch url must be a string, got {}",
                    other.type_name()
                )))
            }
        };

        let body = match self.fetcher.get(&url) {
            Ok(body) => body,
            Err(e) => {
                eprintln!("fetch of {} failed: {}", url, e);
                String::new()
            }
        };

        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(decoded) => {
                let value = json::json_to_value(decoded);
                self.env.insert(name, value.clone());
                Ok(value)
            }
            Err(_) => Ok(Value::Integer(0)),
        }
    }

    fn write_line(&mut self, line: &str) {
        match &mut self.sink {
            PrintSink::Stdout => println!("{}", line),
            PrintSink::Capture(buffer) => {
                buffer.push_str(line);
                buffer.push('\n');
            }
        }
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => match (as_float(left), as_float(right)) {
                (Some(a), Some(b)) => Ok(Value::Float(a + b)),
                _ => Err(EvalError::TypeError(format!(
                    "cannot add {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            },
        },

        BinOp::Subtract => match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a - b)),
            _ => match (as_float(left), as_float(right)) {
                (Some(a), Some(b)) => Ok(Value::Float(a - b)),
                _ => Err(EvalError::TypeError(format!(
                    "cannot subtract {} from {}",
                    right.type_name(),
                    left.type_name()
                ))),
            },
        },

        BinOp::Multiply => match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a * b)),
            _ => match (as_float(left), as_float(right)) {
                (Some(a), Some(b)) => Ok(Value::Float(a * b)),
                _ => Err(EvalError::TypeError(format!(
                    "cannot multiply {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            },
        },

        BinOp::Divide => match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => {
                if *b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Integer(a / b))
            }
            _ => match (as_float(left), as_float(right)) {
                (Some(a), Some(b)) => {
                    if b == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(Value::Float(a / b))
                }
                _ => Err(EvalError::TypeError(format!(
                    "cannot divide {} by {}",
                    left.type_name(),
                    right.type_name()
                ))),
            },
        },

        // Equality never fails: a type mismatch means unequal
        BinOp::Equal => Ok(Value::Boolean(left == right)),
        BinOp::NotEqual => Ok(Value::Boolean(left != right)),

        BinOp::LessThan | BinOp::LessEqual | BinOp::GreaterThan | BinOp::GreaterEqual => {
            let ordering = match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => a.partial_cmp(b),
                _ => match (as_float(left), as_float(right)) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                },
            };
            match ordering {
                Some(ordering) => Ok(Value::Boolean(match op {
                    BinOp::LessThan => ordering == Ordering::Less,
                    BinOp::LessEqual => ordering != Ordering::Greater,
                    BinOp::GreaterThan => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                })),
                None => Err(EvalError::TypeError(format!(
                    "cannot compare {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            }
        }

        BinOp::And => match (left, right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
            _ => Err(EvalError::TypeError(format!(
                "logical '&&' requires booleans, got {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        },

        BinOp::Or => match (left, right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
            _ => Err(EvalError::TypeError(format!(
                "logical '||' requires booleans, got {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}
