#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = autores_api::run().await {
        eprintln!("autores-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
