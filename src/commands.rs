//! CLI subcommands: load results, run the engine, print and persist.

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Args;
use serde::Serialize;

use crate::compare::{build_report_with, compare_task_with, TaskInput};
use crate::config::EvalConfig;
use crate::detectors::ast::pretty::pretty_diff;
use crate::detectors::normalize::normalize;
use crate::error::EvalError;
use crate::failures::{
    correction_delta, failure_breakdown, failure_headline, CorrectionReport, FailureBreakdown,
};
use crate::params::{parameter_impact, ParameterImpact};
use crate::persistence::{default_report_path, load_results, load_results_documents, save_json};
use crate::types::{CorpusReport, TaskSummary};

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(help = "Results JSON file, or a directory of them")]
    pub input: PathBuf,

    #[arg(long, help = "Write the report here (default: reports/analysis_<input>)")]
    pub out: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Do not write a report file")]
    pub no_save: bool,

    #[arg(long, help = "Minimum candidates for a task to be analyzed (>= 2)")]
    pub min_candidates: Option<usize>,

    #[arg(long, default_value_t = false, help = "Only print JSON report")]
    pub json_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TaskArgs {
    #[arg(help = "Results JSON file, or a directory of them")]
    pub input: PathBuf,

    #[arg(help = "Task identifier, e.g. HumanEval_0")]
    pub task_id: String,

    #[arg(long, value_name = "I,J", help = "Show a line diff between candidates I and J")]
    pub diff: Option<String>,

    #[arg(long, default_value_t = false, help = "Only print JSON summary")]
    pub json_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ErrorsArgs {
    #[arg(help = "Results JSON file, or a directory of them")]
    pub input: PathBuf,

    #[arg(long, help = "Write the breakdown JSON to this file")]
    pub out: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Only print JSON breakdown")]
    pub json_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CorrectionsArgs {
    #[arg(help = "Results of the earlier run")]
    pub before: PathBuf,

    #[arg(help = "Results of the later run")]
    pub after: PathBuf,

    #[arg(long, help = "Write the correction report JSON to this file")]
    pub out: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Only print JSON report")]
    pub json_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ParamsArgs {
    #[arg(help = "Results of a parameter-sweep run, or a directory of them")]
    pub input: PathBuf,

    #[arg(long, help = "Write the analysis JSON to this file")]
    pub out: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Only print JSON analysis")]
    pub json_only: bool,
}

#[derive(Serialize)]
struct ParamsDocument<'a> {
    generated_at: String,
    source: String,
    #[serde(flatten)]
    impact: &'a ParameterImpact,
}

#[derive(Serialize)]
struct AnalysisDocument<'a> {
    generated_at: String,
    source: String,
    #[serde(flatten)]
    report: &'a CorpusReport,
}

/* ============================================================
   analyze
   ============================================================ */

pub fn analyze(args: AnalyzeArgs, config: &EvalConfig) -> Result<(), Box<dyn Error>> {
    let mut config = config.clone();
    if let Some(min) = args.min_candidates {
        config.min_candidates = min;
    }

    let tasks = load_results(&args.input)?;
    let report = build_report_with(&tasks, &config);

    let doc = AnalysisDocument {
        generated_at: Utc::now().to_rfc3339(),
        source: args.input.display().to_string(),
        report: &report,
    };

    let out = if args.no_save {
        None
    } else {
        Some(args.out.clone().unwrap_or_else(|| default_report_path(&args.input)))
    };
    if let Some(path) = out.as_ref() {
        save_json(path, &doc)?;
    }

    if args.json_only {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    print_report(&report, tasks.len(), config.preview_pairs);
    if let Some(path) = out {
        println!("\nreport written to: {}", path.display());
    }

    Ok(())
}

fn print_report(report: &CorpusReport, loaded: usize, preview_pairs: usize) {
    println!("non-determinism report");
    println!("tasks loaded: {}", loaded);

    let Some(stats) = report.aggregate_stats.as_ref() else {
        println!("no task had enough candidates to compare");
        return;
    };

    println!("tasks analyzed: {}", stats.total_tasks);
    println!("avg success rate: {}", pct(stats.avg_success_rate));
    println!("avg non-determinism score: {}", pct(stats.avg_non_determinism_score));
    println!("avg structure similarity: {}", pct(stats.avg_structure_similarity));
    println!(
        "semantically consistent: {} / inconsistent: {}",
        stats.consistent_task_count, stats.inconsistent_task_count
    );

    for analysis in &report.task_analyses {
        let s = &analysis.summary;
        println!("\n  {}:", analysis.task_id);
        print_task_lines(s, "    ");

        for pair in s.pairs.iter().take(preview_pairs) {
            println!(
                "      pair {}-{}: {} similar",
                pair.pair.0,
                pair.pair.1,
                pct(pair.similarity_ratio)
            );
        }
    }
}

fn print_task_lines(s: &TaskSummary, indent: &str) {
    println!("{indent}success rate: {}", pct(s.semantic.success_rate));
    println!("{indent}avg syntax similarity: {}", pct(s.avg_syntax_similarity));
    println!("{indent}avg structure similarity: {}", pct(s.avg_structure_similarity));
    println!("{indent}non-determinism score: {}", pct(s.non_determinism_score));
    println!(
        "{indent}semantic consistency: {}",
        if s.semantic.semantic_consistency { "yes" } else { "no" }
    );
}

/* ============================================================
   task
   ============================================================ */

pub fn task(args: TaskArgs, config: &EvalConfig) -> Result<(), Box<dyn Error>> {
    let tasks = load_results(&args.input)?;
    let (task_id, candidates) = find_task(&tasks, &args.task_id)?;

    let summary = compare_task_with(candidates, config);

    if args.json_only {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("task {}", task_id);
    println!("  candidates: {}", summary.total_candidates);
    println!(
        "  passed: {}  failed: {}  other: {}",
        summary.semantic.passed_count,
        summary.semantic.failed_count,
        summary.semantic.total_count - summary.semantic.passed_count - summary.semantic.failed_count
    );
    print_task_lines(&summary, "  ");

    for (idx, c) in candidates.iter().enumerate() {
        let headline = c
            .failure_detail
            .as_deref()
            .and_then(failure_headline)
            .unwrap_or_default();
        println!("  [{}] {} {}", idx, c.outcome, headline);
    }

    if !summary.pairs.is_empty() {
        println!("\n  pairs:");
    }
    for pair in &summary.pairs {
        println!(
            "    {}-{}: syntax {}  tokens {}  structure {}  exact {}",
            pair.pair.0,
            pair.pair.1,
            pct(pair.similarity_ratio),
            pct(pair.token_similarity),
            pct(pair.structure_similarity),
            if pair.exact_match { "yes" } else { "no" }
        );
    }

    if let Some(spec) = args.diff.as_deref() {
        let (i, j) = parse_pair(spec)?;
        let left = candidates.get(i).ok_or_else(|| format!("no candidate {i}"))?;
        let right = candidates.get(j).ok_or_else(|| format!("no candidate {j}"))?;
        println!("\n  diff {}-{} (normalized):", i, j);
        let (l, r) = (normalize(&left.source_text), normalize(&right.source_text));
        print!("{}", pretty_diff(Some(l.as_str()), Some(r.as_str())));
    }

    Ok(())
}

fn find_task<'a>(tasks: &'a [TaskInput], task_id: &str) -> Result<&'a TaskInput, EvalError> {
    tasks
        .iter()
        .find(|(id, _)| id == task_id)
        .ok_or_else(|| EvalError::UnknownTask(task_id.to_string()))
}

fn parse_pair(spec: &str) -> Result<(usize, usize), String> {
    let (a, b) = spec
        .split_once(',')
        .ok_or_else(|| format!("invalid pair {spec:?}, expected I,J"))?;
    let a = a.trim().parse().map_err(|_| format!("invalid index {a:?}"))?;
    let b = b.trim().parse().map_err(|_| format!("invalid index {b:?}"))?;
    Ok((a, b))
}

/* ============================================================
   errors / corrections
   ============================================================ */

pub fn errors(args: ErrorsArgs, config: &EvalConfig) -> Result<(), Box<dyn Error>> {
    let tasks = load_results(&args.input)?;
    let breakdown = failure_breakdown(&tasks);

    if let Some(path) = args.out.as_ref() {
        save_json(path, &breakdown)?;
    }

    if args.json_only {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
        return Ok(());
    }

    print_breakdown(&breakdown, config.top_errors);
    Ok(())
}

fn print_breakdown(b: &FailureBreakdown, top: usize) {
    let tasks = b.tasks.len();
    println!("tasks: {}", tasks);
    println!("responses: {}", b.total_responses);
    if tasks > 0 {
        println!(
            "responses per task: {:.1}",
            b.total_responses as f64 / tasks as f64
        );
    }
    println!("passed: {} ({})", b.total_passed, share(b.total_passed, b.total_responses));
    println!("failed: {} ({})", b.total_failed, share(b.total_failed, b.total_responses));
    println!("timeout: {} ({})", b.total_timeout, share(b.total_timeout, b.total_responses));
    println!(
        "error rate: {}",
        share(b.total_failed + b.total_timeout, b.total_responses)
    );

    println!("\ntop error types:");
    for (category, count) in b.top_categories(top) {
        println!("  {}: {}", category, count);
    }

    println!("\nper task:");
    println!("  all passing: {}", b.all_passed_tasks);
    println!("  all failing: {}", b.all_failed_tasks);
    println!("  mixed: {}", b.mixed_tasks);
}

pub fn corrections(args: CorrectionsArgs, config: &EvalConfig) -> Result<(), Box<dyn Error>> {
    let before = failure_breakdown(&load_results(&args.before)?);
    let after = failure_breakdown(&load_results(&args.after)?);
    let report = correction_delta(&before, &after);

    if let Some(path) = args.out.as_ref() {
        save_json(path, &report)?;
    }

    if args.json_only {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_corrections(&report, config.top_errors, &args.before, &args.after);
    Ok(())
}

fn print_corrections(r: &CorrectionReport, top: usize, before: &Path, after: &Path) {
    println!("before: {}", before.display());
    println!("after: {}", after.display());
    println!("errors before: {}", r.total_before);
    println!("errors after: {}", r.total_after);
    println!("corrected: {}", r.total_corrected);
    println!("correction rate: {:.1}%", r.correction_rate_pct);

    let improved = r.improved();
    if !improved.is_empty() {
        println!("\nmost improved:");
        for d in improved.into_iter().take(top) {
            println!(
                "  {}: {} fewer ({:.1}%)",
                d.category, d.improvement, d.improvement_pct
            );
        }
    }

    let worsened = r.worsened();
    if !worsened.is_empty() {
        println!("\nworsened:");
        for d in worsened {
            println!(
                "  {}: {} more ({:.1}%)",
                d.category,
                d.improvement.unsigned_abs(),
                d.improvement_pct.abs()
            );
        }
    }
}

/* ============================================================
   params
   ============================================================ */

pub fn params(args: ParamsArgs) -> Result<(), Box<dyn Error>> {
    let tasks = load_results_documents(&args.input)?;
    let impact = parameter_impact(&tasks);

    let doc = ParamsDocument {
        generated_at: Utc::now().to_rfc3339(),
        source: args.input.display().to_string(),
        impact: &impact,
    };

    if let Some(path) = args.out.as_ref() {
        save_json(path, &doc)?;
    }

    if args.json_only {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    print_params(&impact);
    Ok(())
}

fn print_params(p: &ParameterImpact) {
    println!("responses: {}", p.total_responses);
    println!("overall success rate: {}", pct(p.overall_success_rate));

    println!("\nby configuration:");
    for c in &p.configurations {
        println!("\n  {}:", c.config_name);
        println!(
            "    success rate: {} ({}/{})",
            pct(c.success_rate),
            c.successful_attempts,
            c.total_attempts
        );
        println!("    avg code length: {:.0} chars", c.avg_code_length);
        if let Some(t) = c.parameters.temperature {
            println!("    temperature: {}", t);
        }
    }

    println!("\ncorrelation with pass rate:");
    let mut ranked: Vec<_> = p.correlations.iter().collect();
    ranked.sort_by(|a, b| {
        b.coefficient
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&a.coefficient.unwrap_or(f64::NEG_INFINITY))
    });
    for c in ranked {
        match c.coefficient {
            Some(r) => println!(
                "  {}: {:.3} ({} {})",
                c.param,
                r,
                c.strength(),
                if r > 0.0 { "positive" } else { "negative" }
            ),
            None => println!("  {}: n/a", c.param),
        }
    }

    if let (Some(best), Some(worst)) = (p.best(), p.worst()) {
        println!("\nbest: {} ({})", best.config_name, pct(best.success_rate));
        println!("worst: {} ({})", worst.config_name, pct(worst.success_rate));
        println!("spread: {}", pct(best.success_rate - worst.success_rate));
    }
    if let Some(top) = p.strongest() {
        println!(
            "largest impact: {} ({:.3})",
            top.param,
            top.coefficient.unwrap_or_default()
        );
    }
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn share(n: usize, total: usize) -> String {
    if total == 0 {
        return pct(0.0);
    }
    pct(n as f64 / total as f64)
}
