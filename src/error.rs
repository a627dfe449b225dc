pub type VitrineResult<T> = Result<T, VitrineError>;

#[derive(thiserror::Error, Debug)]
pub enum VitrineError {
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed option JSON. Always recovered locally by the decoder; this
    /// variant only exists for internal reporting and never reaches the user.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("layout is already checked out: {0}")]
    CheckoutConflict(String),

    #[error("checkout failed: {0}")]
    CheckoutFailed(String),

    #[error("unsupported edit target: {0}")]
    UnsupportedEditTarget(String),

    #[error("mutation rejected: {0}")]
    Mutation(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VitrineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn unresolved(msg: impl Into<String>) -> Self {
        Self::UnresolvedReference(msg.into())
    }

    pub fn checkout_conflict(msg: impl Into<String>) -> Self {
        Self::CheckoutConflict(msg.into())
    }

    pub fn checkout_failed(msg: impl Into<String>) -> Self {
        Self::CheckoutFailed(msg.into())
    }

    pub fn unsupported_edit(msg: impl Into<String>) -> Self {
        Self::UnsupportedEditTarget(msg.into())
    }

    pub fn mutation(msg: impl Into<String>) -> Self {
        Self::Mutation(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// True for the conflict variant the checkout driver recovers from.
    pub fn is_checkout_conflict(&self) -> bool {
        matches!(self, Self::CheckoutConflict(_))
    }
}
