//! `trf run`, `trf validate` and `trf lookup`: job-file driven volume calculation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use trf_io::TableFormat;
use trf_volume::catalog::CatalogIndex;
use trf_volume::config::{resolve_path, CatalogSource, ColumnSelection, JobConfig};
use trf_volume::model::{MatchKind, Resolution, ResultSummary, Table};
use trf_volume::output::render;
use trf_volume::reconcile::{reconcile_parallel, unresolved_count, warehouse_rows};
use trf_volume::{CatalogCache, ResultSet, VolumeError, MATCH_THRESHOLD};

use crate::exit_codes::EXIT_UNRESOLVED;
use crate::util::{column_letter, format_volume, pad_right};
use crate::CliError;

/// Catalog reuse window when the job has no `[cache]` table.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Unresolved names listed in the human summary before eliding.
const MAX_LISTED_UNRESOLVED: usize = 10;

// ============================================================================
// Job loading
// ============================================================================

struct Job {
    config: JobConfig,
    /// `name` from the job file, else the job file's stem.
    name: String,
    /// Directory of the job file; relative paths in the job resolve against it.
    base_dir: PathBuf,
}

impl Job {
    fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::usage(format!("cannot read job file {}: {e}", path.display()))
        })?;
        let config = JobConfig::from_toml(&text).map_err(CliError::volume)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = config.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        log::debug!("loaded job '{}' from {}", name, path.display());
        Ok(Self { config, name, base_dir })
    }

    fn catalog_source(&self) -> CatalogSource {
        self.config.catalog_source(&self.base_dir)
    }

    fn catalog_sheet(&self) -> Option<&str> {
        self.config.catalog.sheet.as_deref()
    }

    fn warehouse_sheet(&self) -> Option<&str> {
        self.config.warehouse.sheet.as_deref()
    }

    fn cache_ttl(&self) -> Duration {
        self.config
            .cache
            .as_ref()
            .map_or(DEFAULT_CACHE_TTL, |c| Duration::from_secs(c.ttl_secs))
    }

    fn configured_warehouse(&self) -> Option<PathBuf> {
        self.config
            .warehouse
            .file
            .as_deref()
            .map(|f| resolve_path(&self.base_dir, f))
    }

    fn configured_output(&self) -> PathBuf {
        resolve_path(&self.base_dir, &self.config.output.file)
    }
}

fn load_catalog(source: &CatalogSource, sheet: Option<&str>) -> Result<CatalogIndex, VolumeError> {
    let table = trf_io::load_source(source, sheet).map_err(|reason| {
        VolumeError::SourceUnavailable {
            source: source.key(),
            reason,
        }
    })?;
    CatalogIndex::from_table(&table)
}

fn load_warehouse(path: &Path, sheet: Option<&str>) -> Result<Table, CliError> {
    if !path.exists() {
        return Err(CliError::usage(format!("warehouse file not found: {}", path.display())));
    }
    trf_io::load_table(path, sheet).map_err(|e| {
        CliError::general(format!("cannot read warehouse file {}: {e}", path.display()))
    })
}

// ============================================================================
// Output planning
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Planned {
    input: PathBuf,
    output: PathBuf,
}

/// `<stem>_volumes.<ext>` beside the input; spreadsheet inputs produce `.xlsx`.
fn default_output_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "warehouse".to_string());
    let ext = match TableFormat::from_path(input) {
        Some(TableFormat::Csv) => "csv",
        Some(TableFormat::Tsv) => "tsv",
        _ => "xlsx",
    };
    input.with_file_name(format!("{stem}_volumes.{ext}"))
}

fn plan_outputs(
    job: &Job,
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
) -> Result<Vec<Planned>, CliError> {
    let plans = if inputs.is_empty() {
        let input = job.configured_warehouse().ok_or_else(|| {
            CliError::usage("no warehouse file given")
                .with_hint("pass WAREHOUSE paths or set [warehouse] file in the job")
        })?;
        let from_job = output.is_none();
        let output = output.unwrap_or_else(|| job.configured_output());
        if from_job && TableFormat::from_path(&output).is_none() {
            return Err(CliError::volume(VolumeError::Configuration(format!(
                "output.file '{}' must end in .xlsx, .csv or .tsv",
                job.config.output.file
            ))));
        }
        vec![Planned { input, output }]
    } else {
        if output.is_some() && inputs.len() > 1 {
            return Err(CliError::usage("--output needs exactly one warehouse file")
                .with_hint("without --output each result is written beside its input as <name>_volumes.<ext>"));
        }
        inputs
            .into_iter()
            .map(|input| {
                let output = output.clone().unwrap_or_else(|| default_output_for(&input));
                Planned { input, output }
            })
            .collect()
    };

    let inputs: Vec<PathBuf> = plans.iter().map(|p| resolved_path(&p.input)).collect();
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    for plan in &plans {
        if TableFormat::from_path(&plan.output).is_none() {
            return Err(CliError::usage(format!(
                "cannot write {}: output must end in .xlsx, .csv or .tsv",
                plan.output.display()
            )));
        }
        let output = resolved_path(&plan.output);
        if let Some(i) = inputs.iter().position(|input| *input == output) {
            return Err(CliError::usage(format!(
                "output {} would overwrite the input file {}",
                plan.output.display(),
                plans[i].input.display()
            )));
        }
        if let Some(first) = claimed.insert(output, &plan.input) {
            return Err(CliError::usage(format!(
                "{} and {} would both be written to {}",
                first.display(),
                plan.input.display(),
                plan.output.display()
            ))
            .with_hint("rename one of the inputs or run them separately with --output"));
        }
    }
    Ok(plans)
}

/// Absolute form of `path` for comparisons. Existing files are canonicalized;
/// for files not yet written the parent directory is.
fn resolved_path(path: &Path) -> PathBuf {
    if let Ok(real) = std::fs::canonicalize(path) {
        return real;
    }
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

// ============================================================================
// Output writing
// ============================================================================

/// Hidden sibling of `output` that keeps its extension, e.g.
/// `.outbound_volumes.partial.xlsx`.
fn staging_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{stem}.partial.{ext}"))
}

/// Write every table to a staging file beside its target, then move them all
/// into place. On any failure the files this call created are removed again.
fn write_outputs(outputs: &[(&Table, &Path)]) -> Result<(), CliError> {
    let mut staged = Vec::with_capacity(outputs.len());
    for (table, output) in outputs {
        let staging = staging_path(output);
        if let Err(e) = trf_io::save_table(table, &staging) {
            staged.push(staging);
            discard(&staged);
            return Err(CliError::output(format!("cannot write {}: {e}", output.display())));
        }
        staged.push(staging);
    }

    for (i, ((_, output), staging)) in outputs.iter().zip(&staged).enumerate() {
        if let Err(e) = std::fs::rename(staging, output) {
            discard(&staged[i..]);
            let placed: Vec<PathBuf> = outputs[..i].iter().map(|(_, o)| o.to_path_buf()).collect();
            discard(&placed);
            return Err(CliError::output(format!("cannot write {}: {e}", output.display())));
        }
        log::debug!("wrote {}", output.display());
    }
    Ok(())
}

fn discard(paths: &[PathBuf]) {
    for path in paths.iter().filter(|p| p.is_file()) {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("could not remove {}: {e}", path.display());
        }
    }
}

// ============================================================================
// run
// ============================================================================

#[derive(Serialize)]
struct RunReport {
    meta: RunMeta,
    files: Vec<FileReport>,
    total_volume: f64,
}

#[derive(Serialize)]
struct RunMeta {
    job: String,
    engine_version: String,
    run_at: String,
    catalog: String,
    catalog_entries: usize,
    workers: usize,
    match_threshold: f64,
}

#[derive(Serialize)]
struct FileReport {
    input: String,
    output: String,
    #[serde(flatten)]
    summary: ResultSummary,
}

struct Outcome {
    plan: Planned,
    rendered: Table,
    result: ResultSet,
}

pub fn cmd_run(
    job_path: PathBuf,
    inputs: Vec<PathBuf>,
    catalog: Option<String>,
    output: Option<PathBuf>,
    workers: Option<usize>,
    json_output: bool,
    strict: bool,
) -> Result<(), CliError> {
    let job = Job::load(&job_path)?;

    let source = match catalog {
        Some(raw) => CatalogSource::parse(&raw, Path::new("")),
        None => job.catalog_source(),
    };
    let workers = workers.unwrap_or(job.config.run.workers);
    if workers == 0 {
        return Err(CliError::usage("--workers must be at least 1"));
    }

    let columns = job.config.warehouse.columns();
    let plans = plan_outputs(&job, inputs, output)?;

    // Reconcile everything before writing so a failure leaves no partial output.
    let mut cache = CatalogCache::new(job.cache_ttl());
    let mut catalog_entries = 0;
    let mut outcomes = Vec::with_capacity(plans.len());
    for plan in plans {
        let index = cache
            .get_or_load(&source.key(), || load_catalog(&source, job.catalog_sheet()))
            .map_err(CliError::volume)?;
        catalog_entries = index.len();

        let table = load_warehouse(&plan.input, job.warehouse_sheet())?;
        let (rendered, result) = process_table(&table, &columns, &index, workers)?;
        log::info!(
            "{}: {} row(s), total volume {}",
            plan.input.display(),
            result.len(),
            result.trailer().total_volume
        );
        outcomes.push(Outcome { plan, rendered, result });
    }

    let outputs: Vec<(&Table, &Path)> = outcomes
        .iter()
        .map(|o| (&o.rendered, o.plan.output.as_path()))
        .collect();
    write_outputs(&outputs)?;

    let total_volume = outcomes
        .iter()
        .fold(0.0, |acc, o| acc + o.result.trailer().total_volume);
    let unresolved: usize = outcomes.iter().map(|o| unresolved_count(&o.result)).sum();

    if json_output {
        let report = RunReport {
            meta: RunMeta {
                job: job.name.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                catalog: source.key(),
                catalog_entries,
                workers,
                match_threshold: MATCH_THRESHOLD,
            },
            files: outcomes
                .iter()
                .map(|o| FileReport {
                    input: o.plan.input.display().to_string(),
                    output: o.plan.output.display().to_string(),
                    summary: o.result.summary(),
                })
                .collect(),
            total_volume,
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    for outcome in &outcomes {
        print_file_summary(outcome);
    }
    if outcomes.len() > 1 {
        eprintln!("total volume across {} files: {}", outcomes.len(), format_volume(total_volume));
    }

    if strict && unresolved > 0 {
        return Err(CliError {
            code: EXIT_UNRESOLVED,
            message: format!("{unresolved} row(s) did not match any catalog product"),
            hint: Some("use `trf lookup` to see the closest catalog names".to_string()),
        });
    }
    Ok(())
}

/// Extract, reconcile and render one warehouse table.
fn process_table(
    table: &Table,
    columns: &ColumnSelection,
    index: &CatalogIndex,
    workers: usize,
) -> Result<(Table, ResultSet), CliError> {
    let rows = warehouse_rows(table, columns).map_err(CliError::volume)?;
    let result = reconcile_parallel(&rows, index, workers).map_err(CliError::volume)?;
    let rendered = render(table, &result).map_err(CliError::volume)?;
    Ok((rendered, result))
}

fn print_file_summary(outcome: &Outcome) {
    let s = outcome.result.summary();
    eprintln!(
        "{}: {} rows ({} exact, {} fuzzy, {} unresolved, {} blank), total volume {}",
        outcome.plan.input.display(),
        s.rows,
        s.exact,
        s.fuzzy,
        s.unresolved,
        s.blank,
        format_volume(s.total_volume),
    );

    let unresolved: Vec<(usize, &str)> = outcome
        .result
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.kind == MatchKind::Unresolved)
        .map(|(i, r)| (i, r.raw_name.trim()))
        .collect();
    for (i, name) in unresolved.iter().take(MAX_LISTED_UNRESOLVED) {
        // +2: 1-based, plus the header row
        eprintln!("  unresolved row {}: {}", i + 2, name);
    }
    if unresolved.len() > MAX_LISTED_UNRESOLVED {
        eprintln!("  ... and {} more", unresolved.len() - MAX_LISTED_UNRESOLVED);
    }

    eprintln!("wrote {}", outcome.plan.output.display());
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(job_path: PathBuf) -> Result<(), CliError> {
    let job = Job::load(&job_path)?;

    let output = job.configured_output();
    if TableFormat::from_path(&output).is_none() {
        return Err(CliError::volume(VolumeError::Configuration(format!(
            "output.file '{}' must end in .xlsx, .csv or .tsv",
            job.config.output.file
        ))));
    }

    let source = job.catalog_source();
    let index = load_catalog(&source, job.catalog_sheet()).map_err(CliError::volume)?;
    eprintln!("catalog: {} ({} products)", source, index.len());

    let columns = job.config.warehouse.columns();
    match job.configured_warehouse() {
        Some(path) => {
            let table = load_warehouse(&path, job.warehouse_sheet())?;
            columns
                .validate_against(table.column_count())
                .map_err(CliError::volume)?;
            eprintln!("warehouse: {} ({} rows)", path.display(), table.row_count());
            print_column(&table, "product name", columns.name_column);
            if let Some(order) = columns.order_column {
                print_column(&table, "order number", order);
            }
            print_column(&table, "quantity", columns.quantity_column);
        }
        None => eprintln!("warehouse: none configured (files will be given to `trf run`)"),
    }

    eprintln!("output: {}", output.display());
    eprintln!("job '{}' is valid", job.name);
    Ok(())
}

fn print_column(table: &Table, label: &str, position: usize) {
    let header = table
        .headers
        .get(position - 1)
        .map(String::as_str)
        .unwrap_or("");
    eprintln!("  {label} column {position} ({}): {header}", column_letter(position));
}

// ============================================================================
// lookup
// ============================================================================

#[derive(Serialize)]
struct LookupReport {
    query: String,
    #[serde(flatten)]
    resolution: Resolution,
}

pub fn cmd_lookup(job_path: PathBuf, names: Vec<String>, json_output: bool) -> Result<(), CliError> {
    let job = Job::load(&job_path)?;
    let index = load_catalog(&job.catalog_source(), job.catalog_sheet()).map_err(CliError::volume)?;

    let reports: Vec<LookupReport> = names
        .into_iter()
        .map(|query| {
            let trimmed = query.trim();
            let resolution = if trimmed.is_empty() {
                Resolution::blank()
            } else {
                index.lookup(trimmed)
            };
            LookupReport { query, resolution }
        })
        .collect();

    if json_output {
        let json_str = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    println!(
        "{} {} {} {:>6} VOLUME",
        pad_right("NAME", 24),
        pad_right("KIND", 10),
        pad_right("CANDIDATE", 24),
        "SCORE"
    );
    for report in &reports {
        let r = &report.resolution;
        println!(
            "{} {} {} {:>6} {}",
            pad_right(&report.query, 24),
            pad_right(&r.kind.to_string(), 10),
            pad_right(r.candidate.as_deref().unwrap_or("-"), 24),
            r.score.map_or_else(|| "-".to_string(), |s| format!("{s:.1}")),
            r.unit_volume.map_or_else(|| "-".to_string(), format_volume),
        );
    }
    Ok(())
}
