//! Prompt construction for the forge
//!
//! The system instruction is fixed. The user message depends on the mode:
//! create asks for a fresh model, morph hands over a clipped sample of the
//! current model and asks the provider to evolve it.

use crate::provider::ChatMessage;
use crate::voxel::Voxel;

/// The architect instruction, as written. Whitespace is collapsed before use.
pub const SYSTEM_INSTRUCTION: &str = r#"
    Act as a 3D Voxel Architect. Generate a character model based on the user prompt.
    Format: A plain JSON array of voxel objects.
    Voxel Object: { "x": int, "y": int, "z": int, "color": "hex_string" }

    Strict Rules:
    1. Use 150 to 300 voxels for high detail.
    2. The model MUST be a connected character/object.
    3. Coordinates must be integers.
    4. Y must be >= 0.
    5. Return ONLY the JSON array. NO text, NO markdown code blocks.
"#;

/// System and user text for one forge call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// Prompt for a brand new model
    pub fn create(prompt: &str) -> Self {
        Self {
            system: system_instruction(),
            user: format!("Generate a voxel model for: {}", prompt),
        }
    }

    /// Prompt that evolves `current`, sending at most `sample` of its voxels
    pub fn morph(prompt: &str, current: &[Voxel], sample: usize) -> Self {
        let shown = &current[..current.len().min(sample)];
        // Vec<Voxel> of plain fields always serializes
        let sample_json = serde_json::to_string(shown).unwrap_or_else(|_| "[]".to_string());

        let user = format!(
            "Evolve the existing voxel model below instead of starting over. \
             Keep its overall identity and return the complete evolved model.\n\
             Existing model ({} of {} voxels shown): {}\n\
             Evolution: {}",
            shown.len(),
            current.len(),
            sample_json,
            prompt
        );

        Self {
            system: system_instruction(),
            user,
        }
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system), ChatMessage::user(self.user)]
    }
}

/// The system instruction on a single line
pub fn system_instruction() -> String {
    collapse_whitespace(SYSTEM_INSTRUCTION)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
