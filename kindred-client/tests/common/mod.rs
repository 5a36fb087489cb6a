use axum::Router;

/// Serve `router` on an ephemeral port, returning its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test app");
    });

    format!("http://{}", addr)
}
