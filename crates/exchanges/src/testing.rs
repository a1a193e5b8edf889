//! Scripted in-memory transport for tests
//!
//! Routes are matched on method and URL path. Each route replays its scripted replies
//! in order and keeps repeating the last one. Every request is recorded so tests can
//! count dispatches.

use crate::errors::{ExchangeError, Result};
use crate::http::{HttpRequest, HttpResponse, Method};
use crate::traits::Transport;
use async_trait::async_trait;
use std::cell::RefCell;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Respond(HttpResponse),
    Fail(ExchangeError),
    /// Respond after sleeping on the monoio timer
    Delayed(Duration, HttpResponse),
}

struct Route {
    method: Method,
    path: String,
    replies: Vec<Reply>,
    served: usize,
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: RefCell<Vec<Route>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a reply for `method path`; repeated calls queue further replies
    pub fn on(&self, method: Method, path: &str, reply: Reply) -> &Self {
        let mut routes = self.routes.borrow_mut();
        match routes.iter_mut().find(|r| r.method == method && r.path == path) {
            Some(route) => route.replies.push(reply),
            None => routes.push(Route {
                method,
                path: path.to_string(),
                replies: vec![reply],
                served: 0,
            }),
        }
        self
    }

    pub fn json(&self, method: Method, path: &str, body: &str) -> &Self {
        self.on(method, path, Reply::Respond(HttpResponse::new(200, body)))
    }

    pub fn status(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.on(method, path, Reply::Respond(HttpResponse::new(status, body)))
    }

    pub fn delayed(&self, method: Method, path: &str, delay: Duration, body: &str) -> &Self {
        self.on(method, path, Reply::Delayed(delay, HttpResponse::new(200, body)))
    }

    pub fn fail(&self, method: Method, path: &str, error: ExchangeError) -> &Self {
        self.on(method, path, Reply::Fail(error))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn total(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Number of requests whose path equals `path`
    pub fn count(&self, path: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.url.path() == path).count()
    }

    fn next_reply(&self, request: &HttpRequest) -> Reply {
        let mut routes = self.routes.borrow_mut();
        let route = routes
            .iter_mut()
            .find(|r| r.method == request.method && r.path == request.url.path());

        match route {
            Some(route) => {
                let idx = route.served.min(route.replies.len() - 1);
                route.served += 1;
                route.replies[idx].clone()
            }
            None => Reply::Respond(HttpResponse::new(404, format!("no route for {} {}", request.method, request.url.path()))),
        }
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn perform(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        // Borrow released before any await.
        let reply = self.next_reply(&request);

        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(error) => Err(error),
            Reply::Delayed(delay, response) => {
                monoio::time::sleep(delay).await;
                Ok(response)
            }
        }
    }
}
