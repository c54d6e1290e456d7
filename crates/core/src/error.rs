//! Error taxonomy for a campaign generation run.
//!
//! Collaborator crates surface their own `thiserror` enums; the pipeline
//! folds them into this three-way taxonomy so the bot can pattern-match a
//! failed run and pick the user-facing reply.

/// Why a campaign generation run failed.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The inbound request itself is unusable (e.g. a link that does not
    /// point at a VK group). The message is user-facing and localized.
    #[error("{0}")]
    Validation(String),

    /// A generation service returned text that does not contain the
    /// expected JSON shape. Aborts the whole run; no partial draft.
    #[error("response parsing failed: {0}")]
    Parse(String),

    /// A network/protocol-level failure talking to a collaborator.
    #[error("collaborator call failed: {0}")]
    Transport(String),
}

impl GenerationError {
    /// True for failures caused by the user's input rather than by the
    /// system or its collaborators.
    pub fn is_user_error(&self) -> bool {
        matches!(self, GenerationError::Validation(_))
    }
}
