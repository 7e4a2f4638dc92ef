//! Pull request narrative.
//!
//! Renders the markdown body attached to every spec-update pull request.
//! Rendering is pure and never fails: missing names and kinds fall back to
//! fixed sentinels.

use crate::domain::{ChangeWarning, Spec};

/// Line emitted in place of the warnings list when there are none.
pub const NO_WARNINGS_SENTINEL: &str = "No warnings - changes appear safe ✅";

pub const UNNAMED: &str = "unnamed";
pub const UNKNOWN_KIND: &str = "unknown";

const REVIEW_CHECKLIST: [&str; 4] = [
    "Change warnings above have been reviewed",
    "Change targets the intended environment",
    "Cost impact of the change is acceptable",
    "Dependent services and owners have been notified",
];

/// Render the pull request body for a change from `old` to `new`.
///
/// Warnings are listed in input order.
pub fn render_pr_body(old: &Spec, new: &Spec, warnings: &[ChangeWarning]) -> String {
    let name = new.name().unwrap_or(UNNAMED);
    let kind = new.kind().unwrap_or(UNKNOWN_KIND);

    let mut out = String::new();
    out.push_str("## Infrastructure Spec Update\n\n");
    out.push_str(&format!("**Name:** `{name}`\n"));
    out.push_str(&format!("**Kind:** `{kind}`\n"));
    if let Some(previous) = old.kind() {
        if previous != kind {
            out.push_str(&format!("**Previous kind:** `{previous}`\n"));
        }
    }
    out.push('\n');

    out.push_str("### Change Warnings\n\n");
    if warnings.is_empty() {
        out.push_str(NO_WARNINGS_SENTINEL);
        out.push('\n');
    } else {
        for w in warnings {
            out.push_str(&format!(
                "- {} {}: {} (`{}`)\n",
                w.severity.icon(),
                w.severity.label(),
                w.message,
                w.field_path,
            ));
        }
    }
    out.push('\n');

    out.push_str("### Review Checklist\n\n");
    for item in REVIEW_CHECKLIST {
        out.push_str(&format!("- [ ] {item}\n"));
    }
    out
}

/// Pull request title: `Update <kind> spec: <name>`.
pub fn render_pr_title(new: &Spec) -> String {
    format!(
        "Update {} spec: {}",
        new.kind().unwrap_or(UNKNOWN_KIND),
        new.name().unwrap_or(UNNAMED)
    )
}
