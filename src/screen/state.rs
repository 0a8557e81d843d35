use crate::errors::{ObscuraError, ObscuraResult};

/// Which page the screen shows.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScreenState {
    /// Picker and analyze button; carries the last upload error, if any.
    Idle { error: Option<String> },
    Loading,
    /// Image with overlay boxes.
    Result,
}

impl Default for ScreenState {
    fn default() -> Self {
        ScreenState::Idle { error: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenEvent {
    ImagePicked,
    UploadStarted,
    UploadSucceeded,
    UploadFailed { message: String },
}

impl ScreenState {
    /// Apply `event`, returning the next state. Illegal pairs are rejected
    /// and the caller keeps its current state.
    pub fn next(&self, event: ScreenEvent) -> ObscuraResult<ScreenState> {
        use ScreenEvent::*;
        use ScreenState::*;

        match (self, event) {
            (Idle { .. } | Result, ImagePicked) => Ok(Idle { error: None }),
            (Idle { .. }, UploadStarted) => Ok(Loading),
            (Loading, UploadSucceeded) => Ok(Result),
            (Loading, UploadFailed { message }) => Ok(Idle {
                error: Some(message),
            }),
            (state, event) => Err(ObscuraError::InvalidTransition(format!(
                "{event:?} while {}",
                state.name()
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScreenState::Idle { .. } => "idle",
            ScreenState::Loading => "loading",
            ScreenState::Result => "result",
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ScreenState::Idle { error } => error.as_deref(),
            _ => None,
        }
    }
}
