//! Server command implementation

use anyhow::Result;
use autopilot_core::EngineSettings;

pub async fn cmd_serve(settings: EngineSettings, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting autopilot API server...");
    println!("   Listening: http://{}:{}", host, port);
    println!("   Event window: {} days", settings.events.days_ahead);
    println!(
        "   Simulation: starting balance ${:.0}, goal ${:.0}",
        settings.simulation.starting_balance, settings.simulation.savings_goal
    );
    println!();
    println!("   Press Ctrl+C to stop");

    autopilot_server::serve(settings, host, port).await
}
