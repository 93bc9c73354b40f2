use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use std::time::{Duration, Instant};
use wireworld_common::WireworldConfig;
use wireworld_engine::Session;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Wireworld engine (headless)...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = WireworldConfig::load(&config_path)?;
    debug!("Configuration: {:#?}", config);

    // --- Initialize Session ---
    let mut session = Session::new(&config).context("Failed to create grid")?;
    if let Some(path) = &config.run.load_from {
        session
            .load(path)
            .with_context(|| format!("Failed to load '{}'", path.display()))?;
    }
    let grid = session.grid();
    info!("Initial population: {:?}", grid.population());

    // --- Run ---
    let start_time = Instant::now();
    match (config.run.steps, config.run.duration_ms) {
        (Some(steps), _) => {
            info!("Stepping {} generations manually...", steps);
            let mut previous_print_time = start_time;
            for step in 0..steps {
                let step_start_time = Instant::now();
                grid.step()
                    .with_context(|| format!("Simulation step {} failed", step + 1))?;

                // Print status periodically
                let now = Instant::now();
                if now.duration_since(previous_print_time) >= Duration::from_secs(5) || step + 1 == steps {
                    info!(
                        "Step [{}/{}] | Active: {} | Elapsed: {:.2} s",
                        step + 1,
                        steps,
                        grid.active_count(),
                        start_time.elapsed().as_secs_f64()
                    );
                    previous_print_time = now;
                } else {
                    trace!(
                        "Step [{}/{}] completed in {:.3} ms",
                        step + 1,
                        steps,
                        step_start_time.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
        }
        (None, Some(duration_ms)) => {
            info!("Running scheduled for {} ms...", duration_ms);
            grid.start();
            std::thread::sleep(Duration::from_millis(duration_ms));
            grid.stop();
            info!("Scheduled run produced {} generations.", grid.generation());
        }
        (None, None) => {
            warn!("No [run] steps or duration_ms configured; leaving the grid as loaded.");
        }
    }
    info!(
        "Final population after {} generations: {:?}",
        grid.generation(),
        grid.population()
    );

    // --- Save ---
    if let Some(path) = &config.run.save_to {
        let written = session
            .save(path)
            .with_context(|| format!("Failed to save '{}'", path.display()))?;
        info!("Grid saved to {}", written.display());
    } else {
        info!("Skipping save as per config (no save_to).");
    }

    info!("Done.");
    Ok(())
}
