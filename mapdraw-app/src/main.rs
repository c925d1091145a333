use anyhow::Context;
use mapdraw::{
    blocks::{run_block, BlockRequest},
    MapConfig, MapSession,
};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Runs map blocks read from stdin, one JSON request per line.
///
/// ```text
/// {"opcode": "setMapCenterByAddress", "args": {"ADDRESS": "Tokyo Tower", "ZOOM": 16}}
/// {"opcode": "getBoundingBox", "args": {"WIDTH": 480, "HEIGHT": 360}}
/// ```
///
/// Each line gets a `{"ok": ...}` or `{"error": ...}` reply on stdout.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            MapConfig::from_json_str(&text).with_context(|| format!("parsing config {}", path))?
        }
        None => MapConfig::default(),
    };
    let mut session = MapSession::new(config).context("starting map session")?;
    log::info!("session ready: {:?}", session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<BlockRequest>(line) {
            Ok(request) => match run_block(&mut session, &request).await {
                Ok(output) => json!({ "ok": output.to_json() }),
                Err(e) => {
                    log::warn!("block {} failed: {}", request.opcode, e);
                    json!({ "error": e.to_string() })
                }
            },
            Err(e) => json!({ "error": format!("malformed request: {}", e) }),
        };

        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}
