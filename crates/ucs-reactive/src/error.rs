use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReactiveError>;

/// Errors raised by the reactive layer.
///
/// Every variant describes a programming or setup defect. None of them are
/// expected during a healthy run, which is why they are surfaced rather than
/// absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    #[error("subscriber #{id} is not registered on channel `{channel}`")]
    UnknownSubscriber { channel: String, id: u64 },

    #[error("state `{scope}` already declares a field named `{name}`")]
    DuplicateField { scope: String, name: String },

    #[error("state `{scope}` has no field named `{name}`")]
    UnknownField { scope: String, name: String },

    #[error("field `{name}` does not hold a {expected}")]
    FieldType { name: String, expected: &'static str },

    #[error("key for `{name}` belongs to a different state store")]
    ForeignKey { name: String },

    #[error("listener `{listener}` already declares a reaction named `{reaction}`")]
    DuplicateReaction {
        listener: &'static str,
        reaction: String,
    },

    #[error("listener `{listener}` is already bound")]
    AlreadyBound { listener: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_channel_and_id() {
        let err = ReactiveError::UnknownSubscriber {
            channel: "hp".into(),
            id: 7,
        };
        assert_eq!(err.to_string(), "subscriber #7 is not registered on channel `hp`");
    }

    #[test]
    fn duplicate_reaction_display() {
        let err = ReactiveError::DuplicateReaction {
            listener: "Tutorial",
            reaction: "on_hp".into(),
        };
        assert!(err.to_string().contains("on_hp"));
        assert!(err.to_string().contains("Tutorial"));
    }
}
