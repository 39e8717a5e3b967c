use std::io::Write;

use crate::timer::{Countdown, DONE_BODY, DONE_TITLE, TICK};

pub async fn run(hours: u32, minutes: u32, seconds: u32) -> anyhow::Result<()> {
    let mut countdown = Countdown::start(hours, minutes, seconds)?;
    let total = Countdown::total_duration(hours, minutes, seconds);
    tracing::info!(id = %countdown.id, secs = total.as_secs(), "timer started");

    let mut stdout = std::io::stdout();
    let finished = tokio::select! {
        _ = countdown.run(TICK, |c| {
            let _ = write!(stdout, "\r{}", c.display());
            let _ = stdout.flush();
        }) => true,
        _ = tokio::signal::ctrl_c() => false,
    };

    if finished {
        println!("\n{DONE_TITLE} {DONE_BODY}");
    } else {
        countdown.stop();
        println!("\nTimer stopped");
    }
    Ok(())
}
