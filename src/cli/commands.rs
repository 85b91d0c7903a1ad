use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::answers::llm::{AnswerBackend, MockAnswerBackend, OllamaBackend, generate_answers};
use crate::browser::session::BrowserSession;
use crate::browser::surface::BrowserSurface;
use crate::classify::field_model::FieldsDocument;
use crate::cli::config::{
    AppConfig, DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL, build_fill_options, build_session_options,
};
use crate::error::FillError;
use crate::fill::pacing::{HumanPacer, NoDelay, Pacer};
use crate::report::console::format_fill_report;
use crate::resolve::source::{AnswersDocument, SourceProfile, ValueSource};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::now_ms;

/// Settings shared by every subcommand, already merged from CLI and config.
pub struct CommandContext<'a> {
    pub config: &'a AppConfig,
    pub logs_dir: PathBuf,
    pub headless: Option<bool>,
    pub ollama_endpoint: Option<&'a str>,
    pub ollama_model: Option<&'a str>,
}

// ============================================================================
// scan subcommand
// ============================================================================

/// Scan the target and write `form-fields-<ms>.yaml`. Returns its path.
pub fn cmd_scan(ctx: &CommandContext<'_>, target: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut session = open_target(ctx, target)?;
    let doc = crate::scan(&mut session)?;
    session.quit()?;

    ensure_dir(&ctx.logs_dir)?;
    let path = ctx.logs_dir.join(format!("form-fields-{}.yaml", now_ms()));
    doc.save(&path)?;

    println!("Wrote {} fields to {}", doc.fields.len(), path.display());
    if let Some(fp) = &doc.fingerprint {
        println!("Fingerprint: {}", fp);
    }
    Ok(path)
}

// ============================================================================
// fill subcommand
// ============================================================================

pub struct FillArgs<'a> {
    pub target: &'a str,
    pub fields_yaml: Option<&'a str>,
    pub answers_yaml: Option<&'a str>,
    pub profile_yaml: Option<&'a str>,
    pub max_tabs: Option<u32>,
    pub loop_detect_threshold: Option<usize>,
    pub screenshot_name: Option<&'a str>,
    pub trace: Option<&'a str>,
}

/// Fill the target, write the fill log and a screenshot, print a summary.
pub fn cmd_fill(ctx: &CommandContext<'_>, args: &FillArgs<'_>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    ensure_dir(&ctx.logs_dir)?;

    let source = ValueSource {
        answers: match args.answers_yaml {
            Some(arg) => Some(AnswersDocument::load(&resolve_doc_arg(arg, &ctx.logs_dir, "llm-answers-")?)?),
            None => None,
        },
        profile: match args.profile_yaml {
            Some(p) => Some(SourceProfile::load(Path::new(p))?),
            None => None,
        },
    };

    let options = build_fill_options(ctx.config, args.max_tabs, args.loop_detect_threshold);
    let tracer = match args.trace {
        Some(path) => TraceLogger::new(Path::new(path)),
        None => TraceLogger::disabled(),
    };
    let mut pacer: Box<dyn Pacer> = if ctx.config.fill.human_pacing {
        Box::new(HumanPacer::new())
    } else {
        Box::new(NoDelay)
    };

    let mut session = open_target(ctx, args.target)?;

    // Without a fields document, scan first and keep the result next to the log
    let fields = match args.fields_yaml {
        Some(arg) => FieldsDocument::load(&resolve_doc_arg(arg, &ctx.logs_dir, "form-fields-")?)?,
        None => {
            let doc = crate::scan(&mut session)?;
            let path = ctx.logs_dir.join(format!("form-fields-{}.yaml", now_ms()));
            doc.save(&path)?;
            info!(path = %path.display(), "scanned fields");
            doc
        }
    };

    let ts = now_ms();
    let report = crate::fill(&mut session, &fields, &source, &options, pacer.as_mut(), &tracer)?;

    let log_path = ctx.logs_dir.join(format!("form-fill-{}.yaml", ts));
    report.save(&log_path)?;

    let shot_name = args
        .screenshot_name
        .map(str::to_string)
        .unwrap_or_else(|| format!("form-fill-{}.png", ts));
    match save_screenshot(&mut session, &ctx.logs_dir.join("screenshots"), &shot_name) {
        Ok(path) => println!("Screenshot: {}", path.display()),
        Err(e) => warn!(error = %e, "screenshot failed"),
    }
    session.quit()?;

    print!("{}", format_fill_report(&report));
    println!("Fill log: {}", log_path.display());
    Ok(log_path)
}

/// Full-page screenshot, falling back to the viewport.
pub fn save_screenshot<S: BrowserSurface + ?Sized>(
    surface: &mut S,
    dir: &Path,
    name: &str,
) -> Result<PathBuf, FillError> {
    let bytes = match surface.screenshot(true) {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "full-page screenshot failed, trying viewport");
            surface.screenshot(false)?
        }
    };
    ensure_dir(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, bytes).map_err(|e| FillError::io(format!("writing {}", path.display()), e))?;
    Ok(path)
}

// ============================================================================
// answer subcommand
// ============================================================================

/// Generate `llm-answers-<ms>.yaml` for a fields document.
pub fn cmd_answer(
    ctx: &CommandContext<'_>,
    fields_yaml: &str,
    profile_yaml: &str,
    answers_yaml: Option<&str>,
    backend_name: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let fields = FieldsDocument::load(&resolve_doc_arg(fields_yaml, &ctx.logs_dir, "form-fields-")?)?;
    let profile = SourceProfile::load(Path::new(profile_yaml))?;
    let prior = match answers_yaml {
        Some(arg) => Some(AnswersDocument::load(&resolve_doc_arg(arg, &ctx.logs_dir, "llm-answers-")?)?),
        None => None,
    };

    let backend = build_backend(ctx, backend_name, &fields, &profile)?;
    let answers = generate_answers(backend.as_ref(), &fields, &profile, prior.as_ref())?;

    ensure_dir(&ctx.logs_dir)?;
    let path = ctx.logs_dir.join(format!("llm-answers-{}.yaml", now_ms()));
    answers.save(&path)?;
    println!("Wrote {} answers to {}", answers.fields.len(), path.display());
    Ok(path)
}

/// Build the answer backend based on name.
fn build_backend(
    ctx: &CommandContext<'_>,
    name: &str,
    fields: &FieldsDocument,
    profile: &SourceProfile,
) -> Result<Box<dyn AnswerBackend>, FillError> {
    match name {
        "ollama" => {
            let endpoint = ctx.ollama_endpoint.unwrap_or(DEFAULT_OLLAMA_ENDPOINT);
            let model = ctx.ollama_model.unwrap_or(DEFAULT_OLLAMA_MODEL);
            Ok(Box::new(OllamaBackend::new(endpoint, model)))
        }
        _ => {
            let source = ValueSource::with_profile(profile.clone());
            Ok(Box::new(MockAnswerBackend::deterministic(
                &fields.fields,
                &source,
                ctx.config.fill.top_n,
            )?))
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn open_target(ctx: &CommandContext<'_>, target: &str) -> Result<BrowserSession, FillError> {
    let options = build_session_options(ctx.config, ctx.headless);
    let mut session = BrowserSession::launch(&options)?;
    let url = to_url(target);
    info!(url = %url, "navigating");
    session.navigate(&url)?;
    Ok(session)
}

fn ensure_dir(dir: &Path) -> Result<(), FillError> {
    std::fs::create_dir_all(dir).map_err(|e| FillError::io(format!("creating {}", dir.display()), e))
}

/// URLs pass through; anything else is treated as a local path.
pub fn to_url(target: &str) -> String {
    if target.contains("://") || target.starts_with("about:") || target.starts_with("data:") {
        return target.to_string();
    }
    let path = Path::new(target);
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

/// Newest file in `dir` whose name starts with `prefix` and ends in `.yaml`.
pub fn latest_in_dir(dir: &Path, prefix: &str) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".yaml"))
        })
        .filter_map(|p| {
            let modified = std::fs::metadata(&p).and_then(|m| m.modified()).ok()?;
            Some((modified, p))
        })
        .max()
        .map(|(_, p)| p)
}

/// Resolve a document argument: a file, a directory (newest match inside),
/// or `latest` (newest match in `logs_dir`).
pub fn resolve_doc_arg(arg: &str, logs_dir: &Path, prefix: &str) -> Result<PathBuf, FillError> {
    let not_found = |dir: &Path| FillError::InvalidDocument {
        path: dir.display().to_string(),
        reason: format!("no {}*.yaml found", prefix),
    };

    if arg.eq_ignore_ascii_case("latest") {
        return latest_in_dir(logs_dir, prefix).ok_or_else(|| not_found(logs_dir));
    }
    let path = PathBuf::from(arg);
    if path.is_dir() {
        return latest_in_dir(&path, prefix).ok_or_else(|| not_found(&path));
    }
    Ok(path)
}
