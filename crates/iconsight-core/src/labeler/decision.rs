//! The ensemble decision rule and diagnostic formatting.

use crate::types::Prediction;

/// Combine the two top classes into one accessibility label.
///
/// The secondary class qualifies the primary one ("mail settings") unless
/// both agree or the secondary class is the catch-all.
pub fn decide_label(primary: &str, secondary: &str, catch_all: &str) -> String {
    if primary == secondary || secondary == catch_all {
        primary.to_string()
    } else {
        format!("{secondary} {primary}")
    }
}

/// Audit string naming both top classes with their probabilities.
pub fn diagnostic_label(primary: &Prediction, secondary: &Prediction) -> String {
    format!(
        "PRIMARY {}[{:.2}]; SECONDARY {}[{:.2}]",
        primary.class_name, primary.probability, secondary.class_name, secondary.probability
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agreeing_classes_use_primary() {
        assert_eq!(decide_label("gmail", "gmail", "other"), "gmail");
    }

    #[test]
    fn test_catch_all_suppresses_qualifier() {
        assert_eq!(decide_label("settings", "other", "other"), "settings");
    }

    #[test]
    fn test_secondary_qualifies_primary() {
        assert_eq!(decide_label("settings", "mail", "other"), "mail settings");
    }

    #[test]
    fn test_catch_all_is_configurable() {
        assert_eq!(decide_label("home", "none", "none"), "home");
        assert_eq!(decide_label("home", "other", "none"), "other home");
    }

    #[test]
    fn test_diagnostic_format() {
        let p = Prediction {
            class_name: "settings".into(),
            class_index: 4,
            probability: 0.9134,
        };
        let s = Prediction {
            class_name: "mail".into(),
            class_index: 1,
            probability: 0.6,
        };
        assert_eq!(
            diagnostic_label(&p, &s),
            "PRIMARY settings[0.91]; SECONDARY mail[0.60]"
        );
    }
}
