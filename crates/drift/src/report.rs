//! Plain-text and JSON rendering of stored entities

use std::io::{self, Write};

use drift_core::model::{Asset, Experiment, PriceRecord, ResultStats, Run, RunStatus};
use jiff::Timestamp;

/// Format a value with thousands separators and no cents, e.g. `-$12,345`
pub fn format_money(value: f64) -> String {
    let dollars = (value.abs().round() as i64).to_string();

    let mut grouped = String::new();
    for (i, c) in dollars.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if value < 0.0 && grouped != "0" {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Format a fraction as a percentage with two decimals
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn format_time(ts: Timestamp) -> String {
    ts.strftime("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn write_assets(out: &mut impl Write, assets: &[Asset]) -> io::Result<()> {
    if assets.is_empty() {
        return writeln!(out, "no assets");
    }
    writeln!(out, "{:<10} NAME", "SYMBOL")?;
    for asset in assets {
        writeln!(out, "{:<10} {}", asset.symbol, asset.name)?;
    }
    Ok(())
}

pub fn write_prices(out: &mut impl Write, records: &[PriceRecord]) -> io::Result<()> {
    writeln!(
        out,
        "{:<10} {:>12} {:>12} {:>14}",
        "DATE", "CLOSE", "ADJ CLOSE", "VOLUME"
    )?;
    for r in records {
        writeln!(
            out,
            "{:<10} {:>12.2} {:>12.2} {:>14}",
            r.date.to_string(),
            r.close,
            r.adjusted_close,
            r.volume
        )?;
    }
    Ok(())
}

pub fn write_experiments(out: &mut impl Write, experiments: &[Experiment]) -> io::Result<()> {
    if experiments.is_empty() {
        return writeln!(out, "no experiments");
    }
    writeln!(
        out,
        "{:<24} {:<19} {:<16} NAME",
        "ID", "CREATED", "MODEL"
    )?;
    for exp in experiments {
        writeln!(
            out,
            "{:<24} {:<19} {:<16} {}",
            exp.id.as_str(),
            format_time(exp.created_at),
            exp.config.model.as_str(),
            exp.name
        )?;
    }
    Ok(())
}

pub fn write_experiment(out: &mut impl Write, exp: &Experiment) -> io::Result<()> {
    writeln!(out, "{} ({})", exp.name, exp.id)?;
    if !exp.description.is_empty() {
        writeln!(out, "{}", exp.description)?;
    }
    writeln!(out)?;

    writeln!(out, "Portfolio (rebalance: {:?})", exp.portfolio.rebalance)?;
    for asset in &exp.portfolio.assets {
        writeln!(
            out,
            "  {:<10} {:>8}",
            asset.symbol,
            format_percentage(asset.weight)
        )?;
    }
    writeln!(out)?;

    let cfg = &exp.config;
    writeln!(out, "Simulation")?;
    writeln!(out, "  model         {}", cfg.model)?;
    writeln!(out, "  paths         {}", cfg.num_paths)?;
    writeln!(out, "  horizon       {} days", cfg.horizon_days)?;
    writeln!(out, "  lookback      {} days", cfg.lookback_days)?;
    writeln!(out, "  start value   {}", format_money(cfg.start_value))?;
    match cfg.seed {
        Some(seed) => writeln!(out, "  seed          {seed}")?,
        None => writeln!(out, "  seed          random")?,
    }
    if cfg.annual_contribution != 0.0 {
        writeln!(
            out,
            "  contribution  {} / year",
            format_money(cfg.annual_contribution)
        )?;
    }
    if cfg.withdrawal_rate != 0.0 {
        writeln!(
            out,
            "  withdrawal    {} / year (not simulated)",
            format_percentage(cfg.withdrawal_rate)
        )?;
    }
    if let Some(days) = cfg.block_days {
        writeln!(out, "  block         {days} days")?;
    }
    Ok(())
}

pub fn write_runs(out: &mut impl Write, runs: &[Run]) -> io::Result<()> {
    if runs.is_empty() {
        return writeln!(out, "no runs");
    }
    writeln!(
        out,
        "{:<24} {:<19} {:<10} {:>14}",
        "ID", "STARTED", "STATUS", "MEDIAN"
    )?;
    for run in runs {
        let median = match run.status {
            RunStatus::Complete => format_money(run.stats.p50),
            _ => "-".to_string(),
        };
        writeln!(
            out,
            "{:<24} {:<19} {:<10} {:>14}",
            run.id.as_str(),
            format_time(run.started_at),
            run.status.as_str(),
            median
        )?;
    }
    Ok(())
}

/// Print a run, its statistics as a table or the whole run as JSON.
pub fn write_run(out: &mut impl Write, run: &Run, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, run)?;
        return writeln!(out);
    }

    writeln!(out, "run {} [{}]", run.id, run.status)?;
    writeln!(out, "  experiment  {}", run.experiment_id)?;
    writeln!(out, "  started     {}", format_time(run.started_at))?;
    if let Some(finished) = run.finished_at {
        writeln!(out, "  finished    {}", format_time(finished))?;
    }
    if !run.error.is_empty() {
        writeln!(out, "  error       {}", run.error)?;
    }
    if run.status == RunStatus::Complete {
        writeln!(out)?;
        write_stats(out, &run.stats)?;
    }
    Ok(())
}

pub fn write_stats(out: &mut impl Write, stats: &ResultStats) -> io::Result<()> {
    writeln!(out, "Terminal value")?;
    for (p, value) in stats.percentile_values() {
        writeln!(out, "  p{:<11} {:>14}", (p * 100.0).round(), format_money(value))?;
    }
    writeln!(out, "  {:<12} {:>14}", "mean", format_money(stats.mean))?;
    writeln!(out, "  {:<12} {:>14}", "std dev", format_money(stats.std_dev))?;
    writeln!(out)?;
    writeln!(out, "Risk")?;
    writeln!(
        out,
        "  {:<20} {:>10}",
        "probability of loss",
        format_percentage(stats.probability_of_loss)
    )?;
    writeln!(
        out,
        "  {:<20} {:>10}",
        "median drawdown",
        format_percentage(stats.median_max_drawdown)
    )?;
    writeln!(
        out,
        "  {:<20} {:>10}",
        "p95 drawdown",
        format_percentage(stats.p95_max_drawdown)
    )?;
    writeln!(
        out,
        "  {:<20} {:>10}",
        "median CAGR",
        format_percentage(stats.median_cagr)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::model::{ExperimentId, RunId};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_money() {
        let cases = [
            (0.0, "$0"),
            (999.4, "$999"),
            (1_000.0, "$1,000"),
            (1_234_567.89, "$1,234,568"),
            (-45_000.0, "-$45,000"),
            (-0.2, "$0"),
        ];
        for (value, expected) in cases {
            assert_eq!(format_money(value), expected, "format_money({value})");
        }
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.0525), "5.25%");
        assert_eq!(format_percentage(-0.3), "-30.00%");
    }

    #[test]
    fn test_run_table_shows_stats_only_when_complete() {
        let started = Timestamp::from_second(1_700_000_000).unwrap();
        let mut run = Run::start(RunId::from("run_1"), ExperimentId::from("exp_1"), started);

        let text = render(|out| write_run(out, &run, false));
        assert!(text.starts_with("run run_1 [running]"));
        assert!(!text.contains("Terminal value"));

        run.complete(
            ResultStats {
                p50: 123_456.0,
                probability_of_loss: 0.125,
                ..Default::default()
            },
            started,
        );
        let text = render(|out| write_run(out, &run, false));
        assert!(text.contains("$123,456"));
        assert!(text.contains("12.50%"));
        assert!(text.contains("finished"));
    }

    #[test]
    fn test_run_json_round_trips() {
        let mut run = Run::start(
            RunId::from("run_1"),
            ExperimentId::from("exp_1"),
            Timestamp::UNIX_EPOCH,
        );
        run.fail("not enough history", Timestamp::UNIX_EPOCH);

        let text = render(|out| write_run(out, &run, true));
        let parsed: Run = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, run);
    }

    #[test]
    fn test_empty_listings() {
        assert_eq!(render(|out| write_assets(out, &[])), "no assets\n");
        assert_eq!(render(|out| write_runs(out, &[])), "no runs\n");
        assert_eq!(render(|out| write_experiments(out, &[])), "no experiments\n");
    }

    #[test]
    fn test_runs_table_hides_median_of_failed_run() {
        let mut run = Run::start(
            RunId::from("run_9"),
            ExperimentId::from("exp_1"),
            Timestamp::UNIX_EPOCH,
        );
        run.fail("boom", Timestamp::UNIX_EPOCH);

        let text = render(|out| write_runs(out, &[run]));
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("run_9"));
        assert!(row.contains("failed"));
        assert!(row.trim_end().ends_with('-'));
    }
}
