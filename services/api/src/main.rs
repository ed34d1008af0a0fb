use houseswap_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("houseswap error: {err}");
        std::process::exit(1);
    }
}
