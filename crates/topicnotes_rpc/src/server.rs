//! Axum front for the note service.
//!
//! # Invariants
//! - Each call runs on its own task; store-touching calls run on the
//!   blocking pool so file writes never stall the reactor.
//! - The front does not inspect argument contents; the service validates.
//! - A panic inside an operation is reported through that operation's
//!   `Error <doing X>: ...` string.

use crate::wire::{
    render_notes, render_save, render_topics, render_wikipedia, Fault, RpcRequest, RpcResponse,
    METHOD_GET_NOTES, METHOD_GET_TOPICS, METHOD_GET_WIKIPEDIA, METHOD_SAVE_NOTE,
};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use log::{info, warn};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use topicnotes_core::{
    EncyclopediaProvider, NoteService, NoteServiceError, Operation, Param, ServiceResult,
};

pub const DEFAULT_RPC_PATH: &str = "/RPC2";

/// Builds the router exposing the four note methods at `rpc_path`.
pub fn router<P>(service: Arc<NoteService<P>>, rpc_path: &str) -> Router
where
    P: EncyclopediaProvider + 'static,
{
    Router::new()
        .route(rpc_path, post(handle_call::<P>))
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("event=rpc_listen module=rpc status=ok addr={addr}");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("event=rpc_shutdown module=rpc status=ok");
    Ok(())
}

// POST <rpc_path>
async fn handle_call<P>(State(service): State<Arc<NoteService<P>>>, body: Bytes) -> Json<RpcResponse>
where
    P: EncyclopediaProvider + 'static,
{
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            warn!("event=rpc_call module=rpc status=fault reason=parse error={err}");
            return Json(RpcResponse::Fault(Fault::parse_error(err)));
        }
    };
    Json(dispatch(&service, request).await)
}

/// Routes one call to the note service and renders the wire value.
pub async fn dispatch<P>(service: &Arc<NoteService<P>>, request: RpcRequest) -> RpcResponse
where
    P: EncyclopediaProvider + 'static,
{
    let started_at = Instant::now();
    let method = request.method;
    let outcome = match method.as_str() {
        METHOD_SAVE_NOTE => match take_params::<4>(&method, request.params) {
            Ok([topic, note, text, date]) => {
                let service = Arc::clone(service);
                let result = run_blocking(Operation::SaveNote, move || {
                    service.save_note(topic, note, text, date)
                })
                .await;
                Ok(render_save(result))
            }
            Err(fault) => Err(fault),
        },
        METHOD_GET_NOTES => match take_params::<1>(&method, request.params) {
            Ok([topic]) => {
                let service = Arc::clone(service);
                let result =
                    run_blocking(Operation::GetNotes, move || service.get_notes(topic)).await;
                Ok(render_notes(result))
            }
            Err(fault) => Err(fault),
        },
        METHOD_GET_TOPICS => match take_params::<0>(&method, request.params) {
            Ok([]) => {
                let service = Arc::clone(service);
                let result = run_blocking(Operation::GetTopics, move || service.get_topics()).await;
                Ok(render_topics(result))
            }
            Err(fault) => Err(fault),
        },
        METHOD_GET_WIKIPEDIA => match take_params::<1>(&method, request.params) {
            Ok([topic]) => {
                // Lookup stays async; the nested save goes to the blocking pool.
                let lookup = Arc::clone(service);
                let task = tokio::spawn(async move { lookup.find_wikipedia_page(topic).await });
                let found = match task.await {
                    Ok(found) => found,
                    Err(err) => Err(NoteServiceError::internal(Operation::GetWikipedia, err)),
                };
                let result = match found {
                    Ok(page) => {
                        let service = Arc::clone(service);
                        run_blocking(Operation::GetWikipedia, move || {
                            Ok(service.record_wikipedia_page(page))
                        })
                        .await
                    }
                    Err(err) => Err(err),
                };
                Ok(render_wikipedia(result))
            }
            Err(fault) => Err(fault),
        },
        other => Err(Fault::method_not_found(other)),
    };

    match outcome {
        Ok(value) => {
            info!(
                "event=rpc_call module=rpc status=ok method={} duration_ms={}",
                method,
                started_at.elapsed().as_millis()
            );
            RpcResponse::Result(value)
        }
        Err(fault) => {
            warn!(
                "event=rpc_call module=rpc status=fault method={} code={} duration_ms={}",
                method,
                fault.code,
                started_at.elapsed().as_millis()
            );
            RpcResponse::Fault(fault)
        }
    }
}

fn take_params<const N: usize>(method: &str, params: Vec<Value>) -> Result<[Param; N], Fault> {
    let got = params.len();
    params
        .into_iter()
        .map(Param::from)
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|_| Fault::invalid_params(method, N, got))
}

async fn run_blocking<T, F>(operation: Operation, task: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(err) => Err(NoteServiceError::internal(operation, err)),
    }
}
