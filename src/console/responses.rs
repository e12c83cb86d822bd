//! Console response formatting
//!
//! Every response line is tagged so it stands apart from server output.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Ok,
    Info,
    Confirm,
    Rejected,
    Error,
}

impl ResponseKind {
    fn tag(&self) -> &'static str {
        match self {
            ResponseKind::Ok => "ok",
            ResponseKind::Info => "info",
            ResponseKind::Confirm => "confirm",
            ResponseKind::Rejected => "rejected",
            ResponseKind::Error => "error",
        }
    }
}

/// Format a console response message
pub fn format_response(kind: ResponseKind, message: &str) -> String {
    format!("[{}] {}\n", kind.tag(), message)
}

/// Format one line of terminal session output
pub fn format_output(line: &str) -> String {
    format!("  | {}\n", line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_response() {
        assert_eq!(
            format_response(ResponseKind::Rejected, "Unknown setting: x"),
            "[rejected] Unknown setting: x\n"
        );
        assert_eq!(format_output("PHP 8.3 Development Server"), "  | PHP 8.3 Development Server\n");
    }
}
