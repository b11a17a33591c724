// Cross-cutting prompt fragments and template filling.
// Domain prompts live next to the code that uses them (assessment/prompts.rs).

/// Common instruction appended to every candidate-facing prompt.
pub const EVIDENCE_INSTRUCTION: &str = "\
    CRITICAL: Base every judgment strictly on what the CV states. \
    Do NOT infer skills, degrees, or durations that are not written in the CV. \
    If the CV is silent on a requirement, say so instead of guessing.";

/// Fills `{name}` placeholders in a template. Unknown placeholders are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_every_occurrence() {
        let filled = fill_template("{a} and {a} then {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(filled, "x and x then y");
    }

    #[test]
    fn test_fill_template_leaves_unknown_placeholders() {
        assert_eq!(fill_template("{missing}", &[("a", "x")]), "{missing}");
    }
}
