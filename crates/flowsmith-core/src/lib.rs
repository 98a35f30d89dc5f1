pub mod error;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use error::{Error, Result};

// --- Types ---

/// A diagram dialect, identified by the keyword its markup must start with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DiagramKind {
    Graph,
    ClassDiagram,
    SequenceDiagram,
    ErDiagram,
    Gantt,
    Mindmap,
    #[serde(rename = "stateDiagram-v2")]
    StateDiagramV2,
    Timeline,
    GitGraph,
    #[serde(rename = "C4Context")]
    C4Context,
    Sankey,
    Flowchart,
    Pie,
    QuadrantChart,
    RequirementDiagram,
    Journey,
    XyChart,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 17] = [
        DiagramKind::Graph,
        DiagramKind::ClassDiagram,
        DiagramKind::SequenceDiagram,
        DiagramKind::ErDiagram,
        DiagramKind::Gantt,
        DiagramKind::Mindmap,
        DiagramKind::StateDiagramV2,
        DiagramKind::Timeline,
        DiagramKind::GitGraph,
        DiagramKind::C4Context,
        DiagramKind::Sankey,
        DiagramKind::Flowchart,
        DiagramKind::Pie,
        DiagramKind::QuadrantChart,
        DiagramKind::RequirementDiagram,
        DiagramKind::Journey,
        DiagramKind::XyChart,
    ];

    /// The exact, case-sensitive literal that opens markup of this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            DiagramKind::Graph => "graph",
            DiagramKind::ClassDiagram => "classDiagram",
            DiagramKind::SequenceDiagram => "sequenceDiagram",
            DiagramKind::ErDiagram => "erDiagram",
            DiagramKind::Gantt => "gantt",
            DiagramKind::Mindmap => "mindmap",
            DiagramKind::StateDiagramV2 => "stateDiagram-v2",
            DiagramKind::Timeline => "timeline",
            DiagramKind::GitGraph => "gitGraph",
            DiagramKind::C4Context => "C4Context",
            DiagramKind::Sankey => "sankey",
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Pie => "pie",
            DiagramKind::QuadrantChart => "quadrantChart",
            DiagramKind::RequirementDiagram => "requirementDiagram",
            DiagramKind::Journey => "journey",
            DiagramKind::XyChart => "xyChart",
        }
    }

    /// Kind whose keyword is a literal prefix of `code`. No trimming.
    pub fn from_prefix(code: &str) -> Option<DiagramKind> {
        Self::ALL.into_iter().find(|k| code.starts_with(k.keyword()))
    }

    /// Kind whose keyword anchors `code` once leading whitespace is skipped.
    ///
    /// This is a prefix check only: `graphical` is accepted as `graph`, while
    /// `stateDiagram` (without `-v2`) is rejected.
    pub fn detect(code: &str) -> Option<DiagramKind> {
        Self::from_prefix(code.trim_start())
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Outcome of one generation request.
///
/// Serializes to the wire shapes the HTTP layer returns: `{"code": ...}`,
/// `{"error": ...}`, or the untouched object for [`GenerationResult::Passthrough`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum GenerationResult {
    Success {
        code: String,
    },
    Failure {
        #[serde(rename = "error")]
        message: String,
    },
    /// The model returned an object without a `code` key. Kept as-is, no
    /// repair or validation applied.
    Passthrough(serde_json::Map<String, serde_json::Value>),
}

impl GenerationResult {
    pub fn success(code: impl Into<String>) -> Self {
        GenerationResult::Success { code: code.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        GenerationResult::Failure {
            message: message.into(),
        }
    }

    /// The diagram markup, when there is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { code } => Some(code),
            GenerationResult::Passthrough(data) => data.get("code").and_then(|v| v.as_str()),
            GenerationResult::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }
}

// --- AI Settings ---

pub const DEFAULT_PROVIDER: &str = "groq";

/// Provider names understood by the completion engine.
pub const PROVIDERS: &[&str] = &[
    "openai", "anthropic", "google", "ollama", "groq", "mistral", "deepseek",
];

#[derive(Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

// Hand-written so the key never ends up in a log line.
impl fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiSettings")
            .field("provider", &self.provider)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AiSettings {
    /// Read settings from the process environment.
    ///
    /// Required: `<PROVIDER>_API_KEY` (e.g. `GROQ_API_KEY`) unless the provider is `ollama`.
    /// Optional: `LLM_PROVIDER` (default: groq), `MODEL_NAME`, `LLM_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`AiSettings::from_env`] but reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = non_empty("LLM_PROVIDER")
            .map(|p| p.trim().to_lowercase())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        if !PROVIDERS.contains(&provider.as_str()) {
            return Err(Error::Config(format!("unknown provider: {provider}")));
        }

        let key_var = api_key_var(&provider);
        let api_key = non_empty(key_var.as_str()).unwrap_or_default();
        if api_key.is_empty() && provider != "ollama" {
            return Err(Error::Config(format!(
                "Missing {key_var} environment variable"
            )));
        }

        let model = match non_empty("MODEL_NAME") {
            Some(model) => model,
            None => default_model(&provider)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Config(format!("MODEL_NAME must be set for provider {provider}"))
                })?,
        };

        Ok(Self {
            provider,
            api_key,
            model,
            base_url: non_empty("LLM_BASE_URL"),
        })
    }
}

/// Name of the variable holding the API key for `provider`.
pub fn api_key_var(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase())
}

pub fn default_model(provider: &str) -> Option<&'static str> {
    match provider {
        "groq" => Some("llama-3.3-70b-versatile"),
        "openai" => Some("gpt-4o-mini"),
        "ollama" => Some("llama3.2"),
        _ => None,
    }
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn every_keyword_passes_the_gate() {
        for kind in DiagramKind::ALL {
            let code = format!("{}\n    A --> B", kind.keyword());
            assert_eq!(DiagramKind::detect(&code), Some(kind), "{}", kind);
        }
    }

    #[test]
    fn gate_skips_leading_whitespace() {
        assert_eq!(
            DiagramKind::detect("\n  \tpie\n  \"A\" : 1"),
            Some(DiagramKind::Pie)
        );
        // dispatch does not trim
        assert_eq!(DiagramKind::from_prefix("  pie"), None);
    }

    #[test]
    fn gate_rejects_unknown_or_wrong_case() {
        for code in ["", "not a diagram", "Graph TD", "stateDiagram\n[*] --> A", "%% graph"] {
            assert_eq!(DiagramKind::detect(code), None, "{code:?}");
        }
    }

    #[test]
    fn gate_is_a_prefix_check() {
        assert_eq!(DiagramKind::detect("graphical"), Some(DiagramKind::Graph));
        assert_eq!(DiagramKind::detect("sankey-beta"), Some(DiagramKind::Sankey));
    }

    #[test]
    fn kind_serializes_as_keyword() {
        for kind in DiagramKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.keyword()));
        }
    }

    #[test]
    fn result_wire_shapes() {
        let ok = serde_json::to_value(GenerationResult::success("pie")).unwrap();
        assert_eq!(ok, serde_json::json!({"code": "pie"}));

        let err = serde_json::to_value(GenerationResult::failure("Invalid diagram syntax")).unwrap();
        assert_eq!(err, serde_json::json!({"error": "Invalid diagram syntax"}));

        let mut data = serde_json::Map::new();
        data.insert("diagram".into(), serde_json::json!("pie"));
        let raw = GenerationResult::Passthrough(data);
        assert_eq!(raw.code(), None);
        assert_eq!(serde_json::to_value(raw).unwrap(), serde_json::json!({"diagram": "pie"}));
    }

    #[test]
    fn settings_default_to_groq() {
        let settings = AiSettings::from_lookup(lookup(&[("GROQ_API_KEY", "gsk-test")])).unwrap();
        assert_eq!(settings.provider, "groq");
        assert_eq!(settings.model, "llama-3.3-70b-versatile");
        assert_eq!(settings.base_url, None);
        assert!(ai_configured(&settings));
    }

    #[test]
    fn settings_require_api_key() {
        let err = AiSettings::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: Missing GROQ_API_KEY environment variable"
        );

        let err = AiSettings::from_lookup(lookup(&[("GROQ_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn ollama_needs_no_key() {
        let settings = AiSettings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "Ollama"),
            ("LLM_BASE_URL", "http://localhost:11434"),
        ]))
        .unwrap();
        assert_eq!(settings.provider, "ollama");
        assert_eq!(settings.model, "llama3.2");
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:11434"));
        assert!(ai_configured(&settings));
    }

    #[test]
    fn model_name_overrides_and_is_required_without_default() {
        let settings = AiSettings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "anthropic"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("MODEL_NAME", "claude-3-5-haiku-latest"),
        ]))
        .unwrap();
        assert_eq!(settings.model, "claude-3-5-haiku-latest");

        let err = AiSettings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "mistral"),
            ("MISTRAL_API_KEY", "key"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MODEL_NAME"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = AiSettings::from_lookup(lookup(&[("LLM_PROVIDER", "palm")])).unwrap_err();
        assert_eq!(err.to_string(), "configuration error: unknown provider: palm");
    }

    #[test]
    fn debug_masks_api_key() {
        let settings = AiSettings {
            provider: "groq".into(),
            api_key: "gsk-secret".into(),
            model: "m".into(),
            base_url: None,
        };
        let shown = format!("{settings:?}");
        assert!(!shown.contains("gsk-secret"));
        assert!(shown.contains("***"));
    }

    #[test]
    fn unconfigured_settings() {
        assert!(!ai_configured(&AiSettings::default()));
    }
}
