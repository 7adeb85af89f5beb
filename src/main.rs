// ShopList server: JSON requests on stdin, one response per line on stdout.
//
// Usage: shoplist [config.json]

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use shoplist_lib::commands::handle_line;
use shoplist_lib::config::AppConfig;
use shoplist_lib::service::spawn_repair_task;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("shoplist: {}", e);
        let _ = rolling_logger::error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("logs"));
    rolling_logger::init_logger(log_dir, "ShopList")?;

    let state = shoplist_lib::build_state(&config).await?;
    let _ = rolling_logger::info(&format!("Database ready at {}", config.db_path.display()));

    let repair_task = config
        .repair_interval_secs
        .map(|secs| spawn_repair_task(state.repair.clone(), Duration::from_secs(secs)));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.map_err(|e| format!("stdin: {}", e))? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&state, &line).await;
        let mut out = serde_json::to_vec(&response).map_err(|e| e.to_string())?;
        out.push(b'\n');
        stdout.write_all(&out).await.map_err(|e| format!("stdout: {}", e))?;
        stdout.flush().await.map_err(|e| format!("stdout: {}", e))?;
    }

    if let Some(task) = repair_task {
        task.abort();
    }
    state.db_state.close().await;
    let _ = rolling_logger::info("Shutdown complete");
    Ok(())
}
