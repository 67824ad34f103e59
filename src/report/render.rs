//! Boxed terminal rendering

use super::EvaluationReport;
use crate::stats::ConfidenceInterval;
use colored::*;

const W: usize = 58; // box inner width

pub(crate) fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
pub(crate) fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
pub(crate) fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
pub(crate) fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
pub(crate) fn warn(s: &str) -> ColoredString   { s.truecolor(230, 180, 80) }

fn line(out: &mut String, s: impl std::fmt::Display) {
    out.push_str(&format!("  {}\n", s));
}

fn box_rule(out: &mut String, left: &str, right: &str) {
    let rule = format!("{}{}{}", left, "─".repeat(W + 3), right);
    line(out, dim(&rule));
}

fn line_box_top(out: &mut String)    { box_rule(out, "┌", "┐"); }
fn line_box_bottom(out: &mut String) { box_rule(out, "└", "┘"); }
fn line_box_sep(out: &mut String)    { box_rule(out, "├", "┤"); }

fn line_box(out: &mut String, content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    line(out, format!("{}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│")));
}

fn line_box_center(out: &mut String, content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    line(
        out,
        format!("{}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│")),
    );
}

/// Remove ANSI color escapes
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

pub(crate) fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    line(out, title.white().bold());
    line(out, dim(&"─".repeat(56)));
}

fn ci_text(ci: &ConfidenceInterval) -> String {
    format!(
        "{:.4}  [{:.4}, {:.4}] {:.0}%",
        ci.estimate,
        ci.lower,
        ci.upper,
        ci.confidence * 100.0
    )
}

pub(super) fn render(report: &EvaluationReport) -> String {
    let mut out = String::new();
    let cfg = &report.config;

    out.push('\n');
    line_box_top(&mut out);
    line_box_center(&mut out, &accent("Forecast calibration report").bold().to_string());
    line_box_sep(&mut out);
    line_box(&mut out, &kv("Generated  ", &report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()));
    line_box(
        &mut out,
        &kv(
            "Records    ",
            &format!(
                "{} scored / {} skipped / {} total",
                report.n_scored(),
                report.n_skipped(),
                report.n_records
            ),
        ),
    );
    line_box(&mut out, &kv("Aggregation", cfg.aggregation.name()));
    let seed = cfg.bootstrap.seed.map(|s| s.to_string()).unwrap_or_else(|| "entropy".to_string());
    line_box(
        &mut out,
        &kv("Bootstrap  ", &format!("{} resamples, seed {}", cfg.bootstrap.n_resamples, seed)),
    );
    line_box_bottom(&mut out);

    section(&mut out, "Scores");
    line(&mut out, kv("Mean CRPS     ", &ci_text(&report.mean_crps_ci)));
    line(&mut out, kv("Mean MAE      ", &ci_text(&report.mean_mae_ci)));
    line(
        &mut out,
        kv(
            "Median        ",
            &format!("CRPS {:.4}   MAE {:.4}", report.crps.median, report.mae.median),
        ),
    );
    line(
        &mut out,
        kv(
            "Beats null    ",
            &format!("{} of {} events", report.n_beats_null, report.n_scored()),
        ),
    );

    section(&mut out, "CRPS / MAE ratio");
    match &report.aggregated_ratio {
        Some(ci) => {
            let verdict = if ci.below(1.0) {
                ok("distribution beats point null").to_string()
            } else if ci.lower > 1.0 {
                warn("point null beats distribution").to_string()
            } else {
                muted("inconclusive").to_string()
            };
            line(&mut out, kv(&format!("{:<14}", cfg.aggregation.name()), &ci_text(ci)));
            line(&mut out, format!("{} {}", muted("Verdict       "), verdict));
        }
        None => line(&mut out, warn("aggregated ratio undefined (all MAE zero)")),
    }
    for (name, value) in &report.ratio_by_policy {
        line(&mut out, format!("{} {}", dim(&format!("  {:<12}", name)), dim(&format!("{:.4}", value))));
    }
    if report.n_zero_mae > 0 {
        line(
            &mut out,
            warn(&format!("{} events with zero MAE excluded from ratios", report.n_zero_mae)),
        );
    }

    section(&mut out, "Rank-sum tests");
    let t = &report.crps_vs_mae;
    line(
        &mut out,
        kv(
            "CRPS vs MAE   ",
            &format!("U {:.1}  z {:.3}  p {:.4}  r {:.3}", t.u_statistic, t.z, t.p_value, t.rank_biserial),
        ),
    );
    if let Some(cmp) = &report.group_comparison {
        let t = &cmp.test;
        line(
            &mut out,
            kv(
                &format!("{:<14}", format!("{} vs {}", cmp.group_a, cmp.group_b)),
                &format!("U {:.1}  z {:.3}  p {:.4}  r {:.3}", t.u_statistic, t.z, t.p_value, t.rank_biserial),
            ),
        );
    }

    if report.groups.len() > 1 {
        section(&mut out, "Groups");
        line(
            &mut out,
            dim(&format!(
                "{:<16} {:>6} {:>9} {:>9} {:>9} {:>7}",
                "group", "n", "crps", "mae", "ratio", "pit"
            )),
        );
        for g in &report.groups {
            let ratio = g.ratio.map(|r| format!("{:.4}", r)).unwrap_or_else(|| "-".to_string());
            line(
                &mut out,
                format!(
                    "{:<16} {:>6} {:>9.4} {:>9.4} {:>9} {:>7.3}",
                    g.group, g.n_events, g.mean_crps, g.mean_mae, ratio, g.mean_pit
                ),
            );
        }
    }

    section(&mut out, "PIT calibration");
    let pit = &report.pit;
    line(
        &mut out,
        kv(
            "Mean / var    ",
            &format!("{:.3} / {:.4}  (uniform 0.500 / 0.0833)", pit.mean, pit.variance),
        ),
    );
    let ks_verdict = if pit.uniform_rejected {
        warn("uniformity rejected").to_string()
    } else {
        ok("consistent with uniform").to_string()
    };
    line(
        &mut out,
        format!(
            "{} {}  {}",
            muted("KS            "),
            format!("D {:.4} (crit {:.4})", pit.ks_statistic, pit.ks_critical).white(),
            ks_verdict
        ),
    );
    let max_count = pit.histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    for (i, &count) in pit.histogram.counts.iter().enumerate() {
        let bar_len = count * 30 / max_count;
        line(
            &mut out,
            format!(
                "{} {} {}",
                dim(&format!("{:.2}-{:.2}", pit.histogram.bin_edges[i], pit.histogram.bin_edges[i + 1])),
                accent(&"█".repeat(bar_len)),
                dim(&count.to_string())
            ),
        );
    }

    if !report.skipped.is_empty() {
        section(&mut out, "Skipped records");
        for s in &report.skipped {
            line(&mut out, format!("{} {}", warn(&s.event_id), dim(&s.reason)));
        }
    }

    out
}
