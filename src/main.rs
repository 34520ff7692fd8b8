use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;

use keypace::config::Config;
use keypace::engine::aggregate::{
    AggregateMistakeData, AggregateSequence, ProblematicWord, get_aggregate_mistakes,
    get_aggregate_sequence_timings, get_aggregate_slow_sequences, get_problematic_words,
};
use keypace::engine::summary::summarize_history;
use keypace::engine::DateFilter;
use keypace::session::result::{TestResult, TestStatus};
use keypace::store::json_store::JsonStore;

#[derive(Parser)]
#[command(name = "keypace", version, about = "Typing test history analytics")]
struct Cli {
    #[arg(long, global = true, help = "Path to config.toml")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory holding history.json")]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "User whose history is analysed")]
    user: Option<String>,

    #[arg(long, global = true, help = "Only consider tests from the last N days")]
    days: Option<u32>,

    #[arg(long, global = true, help = "Print pretty JSON instead of tables")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Totals, averages and the WPM trend
    Summary,
    /// Slowest key sequences across all tests
    Slow {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Sequence latencies with recent-versus-overall trends
    Sequences {
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(2..=3))]
        length: u8,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Recurring substitutions and mistake sequences
    Mistakes,
    /// Words mistyped most often
    Words {
        #[arg(long)]
        min_count: Option<usize>,
    },
    /// Hide a test from every report
    Delete { id: String },
    /// Bring back a deleted test
    Restore { id: String },
    /// Print the effective configuration as TOML
    Config {
        #[arg(long, help = "Also write it to the config file")]
        write: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = Config::load_from(&config_path)?;
    let data_dir = cli.data_dir.clone().or_else(|| config.data_dir.as_ref().map(PathBuf::from));
    let store = match data_dir {
        Some(dir) => JsonStore::with_base_dir(dir)?,
        None => JsonStore::new()?,
    };
    let user_id = cli.user.clone().unwrap_or_else(|| config.user_id.clone());
    let date_filter = cli
        .days
        .or(config.default_days)
        .map(|days| DateFilter::last_days(days, Utc::now()));

    let analytics = &config.analytics;
    let json = cli.json;
    let load = || {
        let results = store.active_results(&user_id);
        log::debug!("loaded {} active results for {user_id}", results.len());
        results
    };

    match cli.command {
        Command::Summary => summary(&within(&load(), date_filter), analytics.recent_window, json),
        Command::Slow { limit } => {
            let slow = get_aggregate_slow_sequences(&within(&load(), date_filter), limit, analytics);
            slow_sequences(&slow, json)
        }
        Command::Sequences { length, top } => {
            let sequences =
                get_aggregate_sequence_timings(&load(), usize::from(length), top, date_filter, analytics);
            sequence_table(&sequences, json)
        }
        Command::Mistakes => mistakes(&get_aggregate_mistakes(&load(), date_filter, analytics), json),
        Command::Words { min_count } => {
            let min_count = min_count.unwrap_or(analytics.problematic_word_min_count);
            words(&get_problematic_words(&within(&load(), date_filter), min_count), json)
        }
        Command::Delete { id } => set_status(&store, &id, TestStatus::Deleted),
        Command::Restore { id } => set_status(&store, &id, TestStatus::Complete),
        Command::Config { write } => {
            print!("{}", config.to_toml()?);
            if write {
                config.save_to(&config_path)?;
                eprintln!("Wrote {}", config_path.display());
            }
            Ok(())
        }
    }
}

fn set_status(store: &JsonStore, id: &str, status: TestStatus) -> Result<()> {
    if !store.set_status(id, status)? {
        bail!("no test with id {id}");
    }
    let verb = match status {
        TestStatus::Deleted => "Deleted",
        TestStatus::Complete => "Restored",
    };
    println!("{verb} {id}");
    Ok(())
}

fn within(results: &[TestResult], date_filter: Option<DateFilter>) -> Vec<TestResult> {
    results
        .iter()
        .filter(|r| date_filter.is_none_or(|f| r.created_at >= f.since))
        .cloned()
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn summary(results: &[TestResult], recent_window: usize, json: bool) -> Result<()> {
    let summary = summarize_history(results, recent_window);
    if json {
        return print_json(&summary);
    }
    println!("Tests:         {}", summary.total_tests);
    println!("Time typed:    {:.0}s", summary.total_duration_secs);
    println!("Words typed:   {}", summary.total_words_typed);
    println!("Average WPM:   {:.1}", summary.average_wpm);
    println!("Best WPM:      {}", summary.best_wpm);
    println!("Accuracy:      {:.1}%", summary.average_accuracy);
    println!("Trend:         {}", summary.wpm_trend.label());
    Ok(())
}

fn slow_sequences(slow: &[String], json: bool) -> Result<()> {
    if json {
        return print_json(&slow);
    }
    if slow.is_empty() {
        println!("Not enough data yet.");
    }
    for (rank, sequence) in slow.iter().enumerate() {
        println!("{:>3}. {sequence:?}", rank + 1);
    }
    Ok(())
}

fn sequence_table(sequences: &[AggregateSequence], json: bool) -> Result<()> {
    if json {
        return print_json(&sequences);
    }
    println!("{:<8} {:>6} {:>8} {:>8}  trend", "seq", "count", "recent", "overall");
    for s in sequences {
        println!(
            "{:<8} {:>6} {:>6}ms {:>6}ms  {} {}",
            format!("{:?}", s.sequence),
            s.total_occurrences,
            s.recent_average,
            s.overall_average,
            s.trend.arrow(),
            s.trend.label()
        );
    }
    Ok(())
}

fn mistakes(data: &AggregateMistakeData, json: bool) -> Result<()> {
    if json {
        return print_json(data);
    }
    println!("Tests analysed: {}", data.total_tests_analyzed);
    println!();
    println!("{:<10} {:>6} {:>7}  trend", "typed", "total", "recent");
    for s in &data.character_substitutions {
        println!(
            "{:<10} {:>6} {:>7}  {} {}",
            format!("{:?}->{:?}", s.expected, s.actual),
            s.total_count,
            s.recent_count,
            s.trend.arrow(),
            s.trend.label()
        );
    }
    println!();
    println!("{:<10} {:>6} {:>7}  trend", "sequence", "total", "recent");
    for s in &data.mistake_sequences {
        println!(
            "{:<10} {:>6} {:>7}  {} {}",
            format!("{:?}", s.sequence),
            s.total_count,
            s.recent_count,
            s.trend.arrow(),
            s.trend.label()
        );
    }
    Ok(())
}

fn words(words: &[ProblematicWord], json: bool) -> Result<()> {
    if json {
        return print_json(&words);
    }
    for w in words {
        println!("{:<20} {:>4}", w.word, w.count);
    }
    Ok(())
}
