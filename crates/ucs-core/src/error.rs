use thiserror::Error;
use ucs_reactive::ReactiveError;

use crate::actor::ActorId;

pub type Result<T> = std::result::Result<T, SimError>;

/// A component registry was asked about a registration it does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{kind} component #{id} is not registered")]
    UnknownComponent { kind: &'static str, id: u64 },
}

/// Errors raised while stepping the simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Reactive(#[from] ReactiveError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("actor {actor} left {remaining} component(s) registered after destroy")]
    ComponentLeak { actor: ActorId, remaining: usize },

    #[error("actor {0} is not in the scene")]
    UnknownActor(ActorId),

    #[error("setup failed: {message}")]
    Setup { message: String },

    #[error("action failed: {message}")]
    Action { message: String },
}

impl SimError {
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }

    pub fn action(message: impl Into<String>) -> Self {
        Self::Action {
            message: message.into(),
        }
    }
}
