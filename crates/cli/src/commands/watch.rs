//! Live G-key monitor

use std::time::Duration;

use tokio::time::{Instant, interval, sleep_until};

use crate::commands::{Context, open_keyboard};
use crate::error::CliError;
use crate::output;

/// Print G-key presses until Ctrl+C or `duration_ms` elapses.
pub async fn execute(
    ctx: &Context,
    poll_ms: u64,
    duration_ms: Option<u64>,
    timeout_ms: u64,
) -> Result<(), CliError> {
    if poll_ms == 0 {
        return Err(CliError::ValidationError("--poll-ms must be at least 1".to_string()));
    }
    let bridge = ctx.loaded_bridge()?;
    let keyboard = open_keyboard(&bridge, false, timeout_ms)?;

    if !ctx.json {
        println!(
            "Watching G-keys on {} (Press Ctrl+C to stop)",
            keyboard.device().model
        );
    }

    let mut ticker = interval(Duration::from_millis(poll_ms));
    let deadline = duration_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
    let stop = async {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for action in keyboard.poll_actions() {
                    output::print_key_action(&action, ctx.json);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
            () = &mut stop => break,
        }
    }

    let stats = bridge.event_stats();
    if stats.dropped > 0 {
        tracing::warn!(dropped = stats.dropped, "Key events were dropped");
    }
    let report = keyboard.disconnect();
    tracing::debug!(?report, "Session closed");
    Ok(())
}
