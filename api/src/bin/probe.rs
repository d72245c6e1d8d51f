use portfolio_status_api::activity::ActivityDay;
use portfolio_status_api::config::Config;
use portfolio_status_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("probe=debug,portfolio_status_api=debug")
        .init();

    let source = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "playback".to_string());

    let config = Config::from_env();
    let state = AppState::new(&config);

    match source.as_str() {
        "playback" => {
            let status = state.spotify.playback_status().await?;
            println!("source: {:?}", status.source);
            if let Some(title) = &status.title {
                println!(
                    "{} by {}",
                    title,
                    status.artist.as_deref().unwrap_or("unknown")
                );
            }
            if status.is_playing {
                println!("  {}ms / {}ms", status.progress_ms, status.duration_ms);
            }
            if let Some(error) = &status.error {
                println!("  error: {}", error);
            }
        }
        "judge" => {
            let days = state.leetcode.submission_calendar().await?;
            print_series(&days);
        }
        "contribution" => {
            let days = state.github.contribution_calendar().await?;
            print_series(&days);
        }
        other => anyhow::bail!(
            "unknown source: {} (expected playback, judge or contribution)",
            other
        ),
    }

    Ok(())
}

fn print_series(days: &[ActivityDay]) {
    let active = days.iter().filter(|day| day.count > 0).count();
    println!("{} days, {} with activity", days.len(), active);

    println!("last 7:");
    for day in days.iter().skip(days.len().saturating_sub(7)) {
        println!("  {} count={} level={}", day.date, day.count, day.level);
    }
}
