#[tokio::main]
async fn main() {
    if let Err(e) = obscura_lib::run().await {
        tracing::error!(error = %e, "obscura failed");
        std::process::exit(1);
    }
}
