pub mod config;
pub mod dispatch;
pub mod server;
pub mod storage;
pub mod store;
pub mod template;

use std::path::Path;
use std::sync::Arc;

use storage::Storage;

/// Shared state for the bridge server.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
}

/// Open local storage under `data_dir` and serve the bridge on the given
/// loopback port until the process is stopped.
pub async fn run(port: u16, data_dir: &Path) -> anyhow::Result<()> {
    let state = AppState {
        storage: Arc::new(Storage::open(data_dir)),
    };

    let app = server::router(state);
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("clipnote bridge listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
