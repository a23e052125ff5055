use mock_server::MockConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let config = MockConfig {
        api_key: std::env::var("MOCK_API_KEY").ok().filter(|key| !key.is_empty()),
        ..Default::default()
    };
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("SoroScan mock API listening on http://{addr}");
    mock_server::run_with(listener, config).await
}
