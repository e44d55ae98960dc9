use datasigner::hasher::{Blake3Hasher, Sha256Hasher};
use datasigner::pipeline::stages::DEFAULT_FAN_OUT;
use datasigner::{sign_items, Value};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_ITEM_COUNT: i64 = 10;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let count = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<i64>() {
            Ok(n) if n >= 0 => n,
            _ => {
                eprintln!("usage: datasigner [ITEM_COUNT]");
                return ExitCode::FAILURE;
            }
        },
        None => DEFAULT_ITEM_COUNT,
    };

    let items: Vec<Value> = (0..count).map(Value::from).collect();
    let result = sign_items(
        items,
        Arc::new(Sha256Hasher::new()),
        Arc::new(Blake3Hasher::new()),
        DEFAULT_FAN_OUT,
    )
    .await;

    match result {
        Ok(signature) => {
            println!("{signature}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "pipeline failed");
            ExitCode::FAILURE
        }
    }
}
