use thiserror::Error;

/// Why an inbound command was not applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Wrong type or shape, dropped without telling the sender
    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("only http/https links are supported")]
    UnsupportedScheme,

    #[error("link is {length} characters long, the limit is {max}")]
    ReferenceTooLong { length: usize, max: usize },

    #[error("the playlist is full ({capacity} entries)")]
    PlaylistFull { capacity: usize },
}

impl Rejection {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Rejection::Malformed(reason.into())
    }

    /// Message for the sender when the command was understood but refused.
    /// `None` means the command is dropped silently.
    pub fn notice(&self) -> Option<String> {
        match self {
            Rejection::Malformed(_) => None,
            policy => Some(policy.to_string()),
        }
    }
}
