//! Request dispatcher.
//!
//! At boot the parsed program is folded into an immutable routing table,
//! `port -> (path -> endpoint body)`. Each port gets its own listener and
//! a bounded pool of evaluation workers; each matched request is evaluated
//! against a fresh environment and serialized as a JSON response body.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::ast::{Program, Stmt};
use crate::evaluator::{EvalError, Evaluator};
use crate::fetch::Fetcher;
use crate::json;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::source::SourceReader;

/// Evaluation workers per listening port.
const WORKERS_PER_PORT: usize = 4;

const APPLICATION_JSON: &str = "application/json; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Immutable `port -> (path -> endpoint body)` table built once at boot.
pub struct RoutingTable {
    pub by_port: HashMap<u16, HashMap<String, Arc<Stmt>>>,
}

impl RoutingTable {
    pub fn build(program: Program) -> Self {
        let mut by_port: HashMap<u16, HashMap<String, Arc<Stmt>>> = HashMap::new();
        for endpoint in program.endpoints {
            by_port
                .entry(endpoint.port)
                .or_default()
                .insert(endpoint.path, Arc::new(endpoint.body));
        }
        RoutingTable { by_port }
    }

    pub fn is_empty(&self) -> bool {
        self.by_port.is_empty()
    }
}

/// Outcome of dispatching one request target.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

/// Routes and evaluation workers for one listening port.
pub struct PortDispatcher {
    port: u16,
    routes: HashMap<String, Arc<Stmt>>,
    fetcher: Arc<dyn Fetcher>,
    workers: Arc<Semaphore>,
}

impl PortDispatcher {
    pub fn new(
        port: u16,
        routes: HashMap<String, Arc<Stmt>>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        PortDispatcher {
            port,
            routes,
            fetcher,
            workers: Arc::new(Semaphore::new(WORKERS_PER_PORT)),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Exact-match the request target and evaluate the endpoint body on a
    /// worker thread with a fresh environment.
    pub async fn respond(&self, path: &str) -> Reply {
        let Some(body) = self.routes.get(path) else {
            return Reply {
                status: 404,
                content_type: TEXT_PLAIN,
                body: format!("Not Found (on port {})", self.port),
            };
        };

        let permit = match self.workers.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return Reply {
                    status: 500,
                    content_type: TEXT_PLAIN,
                    body: "worker pool unavailable".to_string(),
                }
            }
        };

        let body = body.clone();
        let fetcher = self.fetcher.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut evaluator = Evaluator::new(fetcher);
            evaluator.run_endpoint(&body)
        })
        .await;

        match result {
            Ok(Ok(value)) => Reply {
                status: 200,
                content_type: APPLICATION_JSON,
                body: json::to_json_string(&value),
            },
            Ok(Err(e)) => Reply {
                status: 500,
                content_type: TEXT_PLAIN,
                body: format!("evaluation failed: {}", e),
            },
            Err(e) => Reply {
                status: 500,
                content_type: TEXT_PLAIN,
                body: format!("evaluation task failed: {}", e),
            },
        }
    }
}

fn to_response(reply: Reply) -> Response {
    let status =
        StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    // One request per connection
    let headers = [
        (header::CONTENT_TYPE, reply.content_type),
        (header::CONNECTION, "close"),
    ];
    (status, headers, reply.body).into_response()
}

fn bind(port: u16) -> io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1024)
}

async fn dispatch(State(dispatcher): State<Arc<PortDispatcher>>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    println!(
        "Received request on port {} for {}",
        dispatcher.port(),
        path
    );
    to_response(dispatcher.respond(&path).await)
}

/// Serve the routing table: one listener per declared port, until the
/// first listener fails.
pub async fn serve(table: RoutingTable, fetcher: Arc<dyn Fetcher>) -> io::Result<()> {
    let mut servers = JoinSet::new();

    for (port, routes) in table.by_port {
        for path in routes.keys() {
            println!("listen :{} {}", port, path);
        }

        let listener = bind(port)?;
        println!("Listener started on port {}", port);

        let dispatcher = Arc::new(PortDispatcher::new(port, routes, fetcher.clone()));
        servers.spawn(async move {
            let app = Router::new().fallback(dispatch).with_state(dispatcher);
            axum::serve(listener, app).await
        });
    }

    while let Some(joined) = servers.join_next().await {
        joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
    }
    Ok(())
}

/// Evaluate ad-hoc statements sent as a request body, returning the
/// captured print output.
pub async fn respond_eval(fetcher: Arc<dyn Fetcher>, source: String) -> Reply {
    let mut parser = Parser::new(Lexer::new(SourceReader::from_string(&source)));
    let statements = match parser.parse_statements() {
        Ok(statements) => statements,
        Err(e) => {
            return Reply {
                status: 400,
                content_type: TEXT_PLAIN,
                body: e.to_string(),
            }
        }
    };

    let result = tokio::task::spawn_blocking(move || -> Result<String, EvalError> {
        let mut evaluator = Evaluator::capturing(fetcher);
        evaluator.run_statements(&statements)?;
        Ok(evaluator.into_captured_output())
    })
    .await;

    match result {
        Ok(Ok(output)) => Reply {
            status: 200,
            content_type: TEXT_PLAIN,
            body: output,
        },
        Ok(Err(e)) => Reply {
            status: 500,
            content_type: TEXT_PLAIN,
            body: format!("evaluation failed: {}", e),
        },
        Err(e) => Reply {
            status: 500,
            content_type: TEXT_PLAIN,
            body: format!("evaluation task failed: {}", e),
        },
    }
}

async fn eval_source(State(fetcher): State<Arc<dyn Fetcher>>, body: String) -> Response {
    to_response(respond_eval(fetcher, body).await)
}

/// Serve the eval endpoint: any request body is parsed as statements,
/// executed, and answered with the program's print output.
pub async fn serve_eval(port: u16, fetcher: Arc<dyn Fetcher>) -> io::Result<()> {
    let listener = bind(port)?;
    println!("Eval server listening on port {}", port);

    let app = Router::new().fallback(eval_source).with_state(fetcher);
    axum::serve(listener, app).await
}
