//! Static registry of embedding model profiles.
//!
//! The registry is read-only: profiles are `'static` and selected once per run.

use serde::Serialize;

/// Identifier used when a configured model is unknown.
pub const DEFAULT_MODEL_ID: &str = "bge-small-zh-v1.5";

/// Static descriptor of an embedding model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProfile {
    pub model_id: &'static str,
    pub display_name: &'static str,
    /// Length of every vector the model returns.
    pub dimensions: usize,
    pub max_tokens: usize,
    pub description: &'static str,
    /// Prepended to chunk text before embedding (empty when not needed).
    pub instruction_prefix: &'static str,
}

const BGE_ZH_PREFIX: &str = "为这个句子生成表示以用于检索相关文章：";

static PROFILES: &[ModelProfile] = &[
    ModelProfile {
        model_id: "bge-small-zh-v1.5",
        display_name: "BGE Small ZH v1.5",
        dimensions: 512,
        max_tokens: 512,
        description: "Compact Chinese retrieval model, fast on CPU",
        instruction_prefix: BGE_ZH_PREFIX,
    },
    ModelProfile {
        model_id: "bge-base-zh-v1.5",
        display_name: "BGE Base ZH v1.5",
        dimensions: 768,
        max_tokens: 512,
        description: "Balanced Chinese retrieval model",
        instruction_prefix: BGE_ZH_PREFIX,
    },
    ModelProfile {
        model_id: "bge-large-zh-v1.5",
        display_name: "BGE Large ZH v1.5",
        dimensions: 1024,
        max_tokens: 512,
        description: "Highest quality Chinese retrieval model",
        instruction_prefix: BGE_ZH_PREFIX,
    },
    ModelProfile {
        model_id: "bge-m3",
        display_name: "BGE M3",
        dimensions: 1024,
        max_tokens: 8192,
        description: "Multilingual long-context model",
        instruction_prefix: "",
    },
    ModelProfile {
        model_id: "m3e-base",
        display_name: "M3E Base",
        dimensions: 768,
        max_tokens: 512,
        description: "Chinese/English mixed model, no instruction needed",
        instruction_prefix: "",
    },
    ModelProfile {
        model_id: "nomic-embed-text",
        display_name: "Nomic Embed Text",
        dimensions: 768,
        max_tokens: 8192,
        description: "English long-context model",
        instruction_prefix: "search_document: ",
    },
];

/// Read-only view over the built-in profiles.
#[derive(Debug, Clone, Copy)]
pub struct ModelRegistry {
    profiles: &'static [ModelProfile],
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelRegistry {
    pub fn builtin() -> Self {
        Self { profiles: PROFILES }
    }

    /// All profiles in registry order.
    pub fn list(&self) -> &'static [ModelProfile] {
        self.profiles
    }

    pub fn get(&self, model_id: &str) -> Option<&'static ModelProfile> {
        self.profiles.iter().find(|p| p.model_id == model_id)
    }

    pub fn default_profile(&self) -> &'static ModelProfile {
        self.get(DEFAULT_MODEL_ID).unwrap_or(&self.profiles[0])
    }

    /// Look up `model_id`, falling back to the default profile with a warning.
    pub fn resolve(&self, model_id: &str) -> &'static ModelProfile {
        match self.get(model_id) {
            Some(profile) => profile,
            None => {
                let fallback = self.default_profile();
                tracing::warn!(
                    requested = %model_id,
                    fallback = %fallback.model_id,
                    "unknown embedding model, using default profile"
                );
                fallback
            }
        }
    }
}
