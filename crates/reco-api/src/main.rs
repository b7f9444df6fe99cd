#[tokio::main]
async fn main() {
    if let Err(err) = reco_api::run().await {
        tracing::error!(error = %err, "reco-api failed");
        std::process::exit(1);
    }
}
