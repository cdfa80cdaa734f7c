use std::fmt;

/// Category of a recoverable problem found while wiring or dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A `data-bind`, `data-on*`, `data-args` or `data-props` value did not parse.
    Parse,
    /// A binding names no source of the component.
    UnknownSource,
    /// A binding names a method instead of a source.
    NotASource,
    /// An event directive names no method of the component.
    UnknownMethod,
    /// An event directive names a source instead of a method.
    NotAMethod,
    /// Rendering a binding's value or the initial markup failed.
    Render,
    /// A document operation failed, usually on an element removed meanwhile.
    Dom,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Parse => "parse error",
            DiagnosticKind::UnknownSource => "unknown source",
            DiagnosticKind::NotASource => "not a source",
            DiagnosticKind::UnknownMethod => "unknown method",
            DiagnosticKind::NotAMethod => "not a method",
            DiagnosticKind::Render => "render error",
            DiagnosticKind::Dom => "document error",
        };
        f.write_str(name)
    }
}

/// A developer-facing warning. The directive or event it concerns is
/// skipped; the rest of the component keeps working.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Tag name of the component that owns the directive.
    pub component: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>: {}: {}", self.component, self.kind, self.message)
    }
}

/// `err` followed by each of its sources, `: `-separated.
pub(crate) fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
