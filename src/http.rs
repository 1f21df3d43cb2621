use crate::origin::chain::Handler;
use crate::tcp;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Accepts connections forever, serving each one on its own task.
/// Only returns if the listener itself breaks.
pub async fn serve(listener: TcpListener, handler: Arc<dyn Handler>) -> Result<(), io::Error> {
    loop {
        let tcp = tcp::accept(&listener).await?;
        let io = TokioIo::new(tcp);

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            let serve = service_fn(move |req: Request<Incoming>| {
                let handler = Arc::clone(&handler);
                async move {
                    // request bodies are never inspected
                    let (parts, _) = req.into_parts();
                    Ok::<_, Infallible>(handler.call(&parts).await)
                }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, serve).await {
                log::debug!("Error serving connection: {}", e);
            }
        });
    }
}
