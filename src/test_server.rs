//! Minimal HTTP/1.1 server answering every request with one canned status.

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use hyper::{HeaderMap, Request, Response, body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

#[derive(Default)]
struct Seen {
    headers: Option<HeaderMap>,
    path: Option<String>,
}

pub struct TestServer {
    addr: SocketAddr,
    hits: Arc<AtomicU64>,
    seen: Arc<Mutex<Seen>>,
}

impl TestServer {
    pub async fn start(status: u16, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let hits = Arc::new(AtomicU64::new(0));
        let seen = Arc::new(Mutex::new(Seen::default()));

        let server_hits = hits.clone();
        let server_seen = seen.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let hits = server_hits.clone();
                let seen = server_seen.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        hits.fetch_add(1, Ordering::SeqCst);
                        if let Ok(mut seen) = seen.lock() {
                            seen.headers = Some(req.headers().clone());
                            seen.path = Some(req.uri().path().to_string());
                        }
                        async move {
                            let response = Response::builder()
                                .status(status)
                                .body(body.to_string())
                                .expect("Invalid test response");
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, hits, seen }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.seen.lock().ok()?.headers.clone()
    }

    pub fn last_path(&self) -> Option<String> {
        self.seen.lock().ok()?.path.clone()
    }
}

/// A local port nothing listens on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    listener.local_addr().expect("Listener has no address").port()
}
