pub mod arrange;
pub mod create_layers;
pub mod create_topics;
pub mod delete_layer;
pub mod edit;
pub mod set_default_view;

use crate::model::ModelError;
use crate::model::app_state::AppState;
use crate::model::map::MapModel;

#[derive(Clone, Debug, PartialEq, derive_more::From)]
pub enum CommandError {
    Model(ModelError),
    /// MapRoot JSON that cannot be turned back into a model, e.g. a layer
    /// with a missing or unrecognized type.
    #[from(ignore)]
    MalformedMapRoot(String),
    /// Undo was asked to reverse a command that never ran.
    NotYetExecuted,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model(e) => e.fmt(f),
            Self::MalformedMapRoot(why) => write!(f, "malformed MapRoot: {why}"),
            Self::NotYetExecuted => write!(f, "command has not been executed"),
        }
    }
}

impl std::error::Error for CommandError {}

/// One reversible user edit over the shared `(AppState, MapModel)` pair.
///
/// `undo` must reverse exactly what the preceding `execute` did, and
/// `execute` must be re-runnable afterwards (redo). A command that fails
/// validation returns an error before mutating anything, so the caller can
/// refuse to put it on the history log.
pub trait Command {
    fn execute(
        &mut self,
        app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError>;

    fn undo(
        &mut self,
        app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError>;
}
