//! Downloadable renderings of the rule history.
//!
//! Pure string formatting. The "PDF" is a plain-text stand-in, kept
//! byte-compatible with the dashboard this replaces.

use crate::store::RuleRecord;

/// Render the rule history as CSV, newest first, no quoting.
pub fn rules_to_csv(rules: &[RuleRecord]) -> String {
    let mut out = String::from("Date,Action,Description,Status");
    for rule in rules {
        out.push('\n');
        out.push_str(&format!(
            "{},{},{},{}",
            rule.date, rule.action, rule.description, rule.status
        ));
    }
    out
}

/// Render the rule history as the plain-text pseudo-PDF blob.
pub fn rules_to_report(rules: &[RuleRecord]) -> String {
    let lines: Vec<String> = rules
        .iter()
        .map(|rule| format!("{} - {}: {}", rule.date, rule.action, rule.description))
        .collect();
    format!("PDF Content\n\nRule History:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::State;

    #[test]
    fn test_csv_export() {
        let state = State::default();
        insta::assert_snapshot!(rules_to_csv(&state.rules), @r"
        Date,Action,Description,Status
        2024-10-20,Update,Adjust living room brightness based on habits,Active
        2024-10-19,Create,Add night mode rule,Active
        2024-10-18,Modify,Optimize energy-saving parameters,Active
        ");
    }

    #[test]
    fn test_csv_export_empty_history() {
        assert_eq!(rules_to_csv(&[]), "Date,Action,Description,Status");
    }

    #[test]
    fn test_report_export() {
        let state = State::default();
        insta::assert_snapshot!(rules_to_report(&state.rules), @r"
        PDF Content

        Rule History:
        2024-10-20 - Update: Adjust living room brightness based on habits
        2024-10-19 - Create: Add night mode rule
        2024-10-18 - Modify: Optimize energy-saving parameters
        ");
    }
}
