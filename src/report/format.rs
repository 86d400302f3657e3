//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the analysis code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::{AnalysisOutput, SpreadAnalysis};
use crate::domain::{CreditClass, Regime, TREASURY_YIELD_KEY};
use crate::report::significance_marker;

const RULE: &str = "==================================================";

/// Format the full run summary (period, levels, correlations, stress split).
pub fn format_summary(output: &AnalysisOutput) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push('\n');
    out.push_str("         CREDIT SPREAD ANALYSIS SUMMARY\n");
    out.push_str(RULE);
    out.push('\n');

    if let (Some(first), Some(last)) = (output.frame.first_date(), output.frame.last_date()) {
        out.push_str(&format!("\nData period: {first} to {last}\n"));
    }
    out.push_str(&format!(
        "Observations: {} (aligned {}, method: {})\n",
        output.frame.len(),
        output.aligned_rows,
        output.method.display_name()
    ));
    for (class, reason) in &output.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", class.display_name()));
    }

    out.push_str("\nCurrent levels:\n");
    if let Some(ty) = output.frame.column(TREASURY_YIELD_KEY).and_then(|c| c.last()) {
        out.push_str(&format!("  Treasury yield: {:.2}%\n", ty * 100.0));
    }
    for s in &output.spreads {
        out.push_str(&format!(
            "  {} spread: {:.0} bps (avg: {:.0} bps, sd: {:.0} bps, range: [{:.0}, {:.0}])\n",
            s.class.short_name(),
            s.stats.latest,
            s.stats.mean,
            s.stats.std_dev,
            s.stats.min,
            s.stats.max
        ));
    }
    if let (Some(ig), Some(hy)) = (
        output.spread(CreditClass::InvestmentGrade),
        output.spread(CreditClass::HighYield),
    ) {
        out.push_str(&format!(
            "  HY premium over IG: {:.0} bps (avg: {:.0} bps)\n",
            hy.stats.latest - ig.stats.latest,
            hy.stats.mean - ig.stats.mean
        ));
    }

    out.push_str(&format!("\nCorrelation with {}:\n", output.stress_key));
    out.push_str(&format_correlation_table(output));

    out.push_str("\nTrend lines (spread = a + b * stress):\n");
    for s in &output.spreads {
        match &s.trend {
            Some(t) => out.push_str(&format!(
                "  {:<3} a={:.1} bps  b={:.2} bps/pt\n",
                s.class.short_name(),
                t.intercept,
                t.slope
            )),
            None => out.push_str(&format!("  {:<3} n/a\n", s.class.short_name())),
        }
    }

    out.push_str(&format_stress_split(output));
    out.push_str(RULE);
    out.push('\n');

    out
}

/// Format the tight/normal/wide tables and the stress split only.
pub fn format_regimes(output: &AnalysisOutput) -> String {
    let mut out = String::new();

    out.push_str(
        format!(
            "{:<12} {:>9} {:>9} {:>14} {:>14} {:>14}\n",
            "spread", "p25", "p75", "tight", "normal", "wide"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<9} {:-<9} {:-<14} {:-<14} {:-<14}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for s in &output.spreads {
        let r = &s.regimes;
        out.push_str(&format!(
            "{:<12} {:>9.1} {:>9.1} {:>14} {:>14} {:>14}\n",
            r.spread_name,
            r.p25,
            r.p75,
            count_cell(s, Regime::Tight),
            count_cell(s, Regime::Normal),
            count_cell(s, Regime::Wide),
        ));
    }

    if let Some(current) = current_regimes(output) {
        out.push_str(&format!("\nCurrent regime: {current}\n"));
    }

    out.push_str(&format_stress_split(output));
    out
}

fn format_correlation_table(output: &AnalysisOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  {:<12} {:>8} {:>10} {:>6} {:>12}\n",
        "spread", "r", "p-value", "n", "rolling(last)"
    ));
    for s in &output.spreads {
        let c = &s.correlation;
        let r = if c.is_defined() {
            format!("{:.3}{}", c.coefficient, significance_marker(c.p_value))
        } else {
            "n/a".to_string()
        };
        let p = if c.is_defined() { format!("{:.4}", c.p_value) } else { "n/a".to_string() };
        let rolling = s
            .latest_rolling
            .map(|v| format!("{v:.3}"))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "  {:<12} {:>8} {:>10} {:>6} {:>12}\n",
            c.spread_name, r, p, c.n, rolling
        ));
    }
    out.push_str("  (*** p<0.001, ** p<0.01, * p<0.05)\n");
    out
}

fn format_stress_split(output: &AnalysisOutput) -> String {
    let Some(first) = output.spreads.iter().find_map(|s| s.regimes.stress.as_ref()) else {
        return String::new();
    };

    let mut out = String::new();
    out.push_str(&format!(
        "\nStress periods ({} > {}): {} days ({:.1}%)\n",
        output.stress_key,
        first.threshold,
        first.stress_count,
        first.stress_share * 100.0
    ));
    for s in &output.spreads {
        let Some(split) = &s.regimes.stress else {
            continue;
        };
        out.push_str(&format!(
            "  {}: {} (normal) vs {} (stress)\n",
            s.class.short_name(),
            fmt_bps(split.normal_mean),
            fmt_bps(split.stress_mean)
        ));
    }
    out
}

fn count_cell(s: &SpreadAnalysis, regime: Regime) -> String {
    let counts = &s.regimes.counts;
    format!("{} ({:.0}%)", counts.count(regime), counts.proportion(regime) * 100.0)
}

fn current_regimes(output: &AnalysisOutput) -> Option<String> {
    let parts: Vec<String> = output
        .spreads
        .iter()
        .filter_map(|s| {
            s.regimes
                .labels
                .last()
                .map(|r| format!("{} {}", s.class.short_name(), r.label()))
        })
        .collect();
    if parts.is_empty() { None } else { Some(parts.join(", ")) }
}

fn fmt_bps(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{x:.0} bps"),
        None => "n/a".to_string(),
    }
}
