//! Spec parse and validation errors.

/// Reasons a submitted spec document is rejected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("spec is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("spec document is empty")]
    Empty,

    #[error("YAML syntax error{}: {message}", line_suffix(.line))]
    Syntax { line: Option<usize>, message: String },

    #[error("spec root must be a mapping")]
    NotAMapping,

    #[error("required field '{field}' is missing or not a non-empty string")]
    MissingField { field: &'static str },
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(l) => format!(" at line {l}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display_includes_line() {
        let err = SpecError::Syntax {
            line: Some(4),
            message: "mapping values are not allowed here".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "YAML syntax error at line 4: mapping values are not allowed here"
        );

        let err = SpecError::Syntax {
            line: None,
            message: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "YAML syntax error: bad");
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = SpecError::MissingField {
            field: "metadata.name",
        };
        assert!(err.to_string().contains("metadata.name"));
    }
}
