#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examhub_rust::run().await {
        eprintln!("examhub-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
