use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bomber_rust_server::constants::{DEFAULT_BOMB_CAPACITY, DEFAULT_FLAME_RANGE};
use bomber_rust_server::engine::GameState;
use bomber_rust_server::rng::Rng;
use bomber_rust_server::types::{Action, PlayerId};

/// Headless random-walk run against a fresh arena. Useful for soak-testing
/// the tick engine without a server in front of it.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// players to seat on spawn points
    #[arg(long, default_value_t = 4)]
    players: usize,
    /// logical ticks to run
    #[arg(long, default_value_t = 400)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct PlayerResultLine {
    number: Option<u32>,
    name: String,
    alive: bool,
    kills: u32,
    deaths: u32,
    suicides: u32,
    flame: u32,
    bomb: u32,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    seed: u64,
    players: usize,
    ticks: u64,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    results: Vec<PlayerResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(now_ms);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| format!("sim-{seed}-{}", now_ms()));

    emit_log(
        "info",
        "run_started",
        &run_id,
        None,
        json!({
            "players": cli.players,
            "ticks": cli.ticks,
            "seed": seed,
        }),
    );

    let mut state = GameState::new(seed);
    let ids: Vec<PlayerId> = (0..cli.players)
        .map(|idx| state.add_player(&format!("sim-{:02}", idx + 1)))
        .collect();
    state.spawn_all();

    let mut driver = Rng::new(seed.wrapping_add(1));
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    for tick in 1..=cli.ticks {
        for id in &ids {
            state.enqueue_action(*id, pick_action(&mut driver));
        }
        state.advance_tick();
        for message in collect_anomalies(&state, &ids) {
            push_anomaly(&mut anomaly_records, &mut anomaly_seen, tick, message);
        }
    }

    for anomaly in &anomaly_records {
        emit_log(
            "warn",
            "anomaly_detected",
            &run_id,
            Some(anomaly.tick),
            json!({ "message": anomaly.message }),
        );
    }

    let results: Vec<PlayerResultLine> = ids
        .iter()
        .filter_map(|id| {
            let status = state.player_stats(*id)?;
            Some(PlayerResultLine {
                number: status.number,
                name: status.name,
                alive: status.coords.is_some(),
                kills: status.kills,
                deaths: status.deaths,
                suicides: status.suicides,
                flame: status.flame,
                bomb: status.bomb,
            })
        })
        .collect();

    for result in &results {
        println!(
            "{}",
            serde_json::to_string(result).expect("player result should serialize")
        );
    }

    let summary = RunSummary {
        run_id: run_id.clone(),
        seed,
        players: cli.players,
        ticks: cli.ticks,
        anomaly_count: anomaly_records.len(),
        results,
    };

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        Some(cli.ticks),
        json!({
            "anomalyCount": summary.anomaly_count,
            "totalKills": summary.results.iter().map(|r| r.kills).sum::<u32>(),
            "totalDeaths": summary.results.iter().map(|r| r.deaths).sum::<u32>(),
        }),
    );

    if !anomaly_records.is_empty() {
        std::process::exit(1);
    }
}

fn pick_action(driver: &mut Rng) -> Action {
    // mostly walking, the occasional bomb
    if driver.chance(0.2) {
        return Action::DropBomb;
    }
    match driver.pick_index(4) {
        0 => Action::MoveUp,
        1 => Action::MoveDown,
        2 => Action::MoveLeft,
        _ => Action::MoveRight,
    }
}

fn collect_anomalies(state: &GameState, ids: &[PlayerId]) -> Vec<String> {
    let mut anomalies = Vec::new();

    let snapshot = state.snapshot();
    let rows = snapshot.lines().count();
    if rows != state.arena().rows() as usize {
        anomalies.push(format!(
            "snapshot row count drifted: {} != {}",
            rows,
            state.arena().rows()
        ));
    }
    for line in snapshot.lines() {
        if line.chars().count() != state.arena().cols() as usize {
            anomalies.push(format!(
                "snapshot column count drifted: {} != {}",
                line.chars().count(),
                state.arena().cols()
            ));
            break;
        }
    }

    let mut total_kills = 0u32;
    let mut total_deaths = 0u32;
    for id in ids {
        let Some(status) = state.player_stats(*id) else {
            anomalies.push(format!("player {:?} vanished from the roster", id));
            continue;
        };
        if status.suicides > status.deaths {
            anomalies.push(format!(
                "player {} has more suicides than deaths: {}/{}",
                status.name, status.suicides, status.deaths
            ));
        }
        if status.flame < DEFAULT_FLAME_RANGE || status.bomb < DEFAULT_BOMB_CAPACITY {
            anomalies.push(format!(
                "player {} attributes below baseline: flame {} bomb {}",
                status.name, status.flame, status.bomb
            ));
        }
        total_kills += status.kills;
        total_deaths += status.deaths;
    }
    if total_kills > total_deaths {
        anomalies.push(format!(
            "kill ledger exceeds death ledger: {total_kills} > {total_deaths}"
        ));
    }

    anomalies
}

fn push_anomaly(
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    if anomaly_seen.insert(message.clone()) {
        anomaly_records.push(AnomalyRecord { tick, message });
    }
}

fn emit_log(level: &str, event: &str, run_id: &str, tick: Option<u64>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_action_is_deterministic_per_seed() {
        let mut first = Rng::new(7);
        let mut second = Rng::new(7);
        for _ in 0..64 {
            assert_eq!(pick_action(&mut first), pick_action(&mut second));
        }
    }

    #[test]
    fn fresh_state_produces_no_anomalies() {
        let mut state = GameState::new(1);
        let ids = vec![state.add_player("a"), state.add_player("b")];
        state.spawn_all();
        assert!(collect_anomalies(&state, &ids).is_empty());
    }

    #[test]
    fn push_anomaly_deduplicates_messages() {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut records, &mut seen, 10, "same anomaly".to_string());
        push_anomaly(&mut records, &mut seen, 11, "same anomaly".to_string());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tick, 10);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = now_ms();
        let target = std::env::temp_dir()
            .join(format!("bomber-missing-{now}"))
            .join("summary.json");
        let summary = RunSummary {
            run_id: "sim-1-1".to_string(),
            seed: 1,
            players: 0,
            ticks: 0,
            anomaly_count: 0,
            results: Vec::new(),
        };
        assert!(write_summary(&target, &summary).is_err());
    }
}
