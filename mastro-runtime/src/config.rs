/// Host-wide runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Event types delegated on every component root, unless the definition
    /// overrides them.
    pub event_names: Vec<String>,
    /// Report bindings whose source names no member. When off such
    /// directives stay silently inert.
    pub warn_on_unmatched: bool,
    /// How many diagnostics the host keeps until they are taken. Older ones
    /// are dropped first; every report is still logged.
    pub max_diagnostics: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            event_names: ["click", "change", "input", "submit"]
                .into_iter()
                .map(String::from)
                .collect(),
            warn_on_unmatched: true,
            max_diagnostics: 256,
        }
    }
}
