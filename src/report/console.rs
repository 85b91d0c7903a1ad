use crate::report::report_model::FillReport;
use crate::trace::event::EventRecord;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a fill report for terminal output.
///
/// Produces output like:
/// ```text
/// === Fill: loop_detected after 4 tabs (backtracked) ===
///
/// ✓ Full Name *  typed "Jane Doe"
/// ✗ Email  typed "jane@example"
/// ? Subscribe  toggled on
///
/// === Events: 1 confirmed, 1 mismatched, 1 unknown (3 fields) ===
/// ```
pub fn format_fill_report(report: &FillReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Fill: {} after {} tabs",
        report.ended_reason, report.tabs_sent
    ));
    if report.backtracked {
        out.push_str(" (backtracked)");
    }
    out.push_str(" ===\n\n");

    for event in &report.events {
        let marker = match event.confirmed {
            Some(true) => "\u{2713}",
            Some(false) => "\u{2717}",
            None => "?",
        };
        out.push_str(&format!("{} {}  {}\n", marker, event.field, describe(event)));
    }

    let (yes, no, unknown) = report.confirmation_counts();
    out.push_str(&format!(
        "\n=== Events: {} confirmed, {} mismatched, {} unknown ({} fields) ===\n",
        yes,
        no,
        unknown,
        report.unique_fields.len()
    ));

    out
}

fn describe(event: &EventRecord) -> String {
    if let Some(tokens) = &event.tokens {
        return format!("chips [{}]", tokens.join(", "));
    }
    if let Some(typed) = &event.typed {
        return format!("typed \"{}\"", typed);
    }
    if let Some(selected) = &event.selected {
        return format!("selected \"{}\"", selected);
    }
    match event.toggled_to {
        Some(true) => "toggled on".to_string(),
        Some(false) => "left unchecked".to_string(),
        None => String::new(),
    }
}
