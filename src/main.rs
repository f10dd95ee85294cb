#[tokio::main]
async fn main() -> anyhow::Result<()> {
    media_record_lib::run().await
}
