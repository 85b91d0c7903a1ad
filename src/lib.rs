use tracing::{info, warn};

use crate::{
    browser::surface::BrowserSurface,
    classify::{classifier::scan_fields, field_model::FieldsDocument},
    error::FillError,
    fill::pacing::Pacer,
    report::report_model::FillReport,
    resolve::{
        resolver::{FieldPlan, ValueResolver},
        source::ValueSource,
    },
    trace::logger::TraceLogger,
    walker::{
        walker::FocusWalker,
        walker_model::{DEFAULT_TOP_N, WalkerConfig},
    },
};

pub mod answers;
pub mod ax;
pub mod browser;
pub mod classify;
pub mod cli;
pub mod error;
pub mod fill;
pub mod report;
pub mod resolve;
pub mod trace;
pub mod walker;

/// Knobs of a fill run.
#[derive(Debug, Clone)]
pub struct FillOptions {
    pub walker: WalkerConfig,
    /// Cap on selections for multi-select fields.
    pub top_n: usize,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Snapshot the page once and describe every field on it.
pub fn scan<S: BrowserSurface + ?Sized>(surface: &mut S) -> Result<FieldsDocument, FillError> {
    let snapshot = surface.snapshot()?;
    let doc = FieldsDocument::new(scan_fields(&snapshot));
    info!(
        nodes = snapshot.len(),
        fields = doc.fields.len(),
        "scan complete"
    );
    Ok(doc)
}

/// Walk the focus order and fill every field met on the way.
///
/// Fails only when the page cannot be read at all. Once the walk starts a
/// report is always returned, whatever ended it. An empty fields document is
/// replaced by a scan of the live page.
pub fn fill<S: BrowserSurface + ?Sized>(
    surface: &mut S,
    fields: &FieldsDocument,
    source: &ValueSource,
    options: &FillOptions,
    pacer: &mut dyn Pacer,
    tracer: &TraceLogger,
) -> Result<FillReport, FillError> {
    let initial = surface.snapshot()?;

    let scanned;
    let fields = if fields.fields.is_empty() {
        scanned = FieldsDocument::new(scan_fields(&initial));
        &scanned
    } else {
        fields
    };

    let resolver = ValueResolver::new(options.top_n);
    let plan = FieldPlan::build(&fields.fields, source, &resolver);
    info!(fields = fields.fields.len(), planned = plan.len(), "starting fill");

    let outcome = FocusWalker::new(&mut *surface, &plan, &options.walker, &mut *pacer, tracer).run();

    let page_text = match surface.read_page_text() {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "could not read page text");
            None
        }
    };

    Ok(FillReport::from_outcome(outcome)
        .with_page_text(page_text)
        .with_fingerprint(fields.fingerprint.clone()))
}
