#[tokio::main]
async fn main() {
    let code = surfacewatch::app::startup::startup().await;
    std::process::exit(code);
}
