//! `harvestbot status`: Show configuration.

use harvestbot_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let on_off = |b: bool| if b { "on" } else { "off" };

    println!("⛏️  harvestbot Status");
    println!("====================");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!(
        "  Server:         {}:{} as {}",
        config.connection.host, config.connection.port, config.connection.username
    );
    println!("  Target:         {}", config.harvest.target_kind);
    println!("  Auto-replant:   {}", on_off(config.harvest.auto_replant));
    println!("  Min health:     {}", config.harvest.min_health);
    println!(
        "  Keep working:   {}",
        on_off(config.harvest.keep_working_when_hurt)
    );
    println!(
        "  Deposit after:  {} items or {} stacks",
        config.harvest.deposit_after, config.harvest.max_carried_stacks
    );
    println!(
        "  Navigation:     {} attempts, {}ms apart",
        config.navigation.max_attempts, config.navigation.retry_delay_ms
    );
    println!(
        "  Vitals check:   every {}s (food < {}, health < {})",
        config.vitals.interval_secs, config.vitals.food_below, config.vitals.health_below
    );
    println!(
        "  Combat:         {} (reach {})",
        on_off(config.combat.enabled),
        config.combat.reach
    );
    println!("  Reconnect:      {}s", config.session.reconnect_delay_secs);
    println!("  Command prefix: {}", config.harvest.command_prefix);

    if AppConfig::config_path().exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, run `harvestbot onboard` first");
    }

    Ok(())
}
