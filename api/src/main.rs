#[tokio::main]
async fn main() {
    portfolio_status_api::run().await;
}
