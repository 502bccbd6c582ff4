//! Editable crisis-map core: the layer/topic/map data model, the MapRoot
//! JSON interchange format, reversible edit commands and the presenter that
//! keeps the linear undo/redo log.
//!
//! A UI binds to the [`model`] types through shared [`common::eref::ERef`]
//! handles and listens on a [`common::events::EventChannel`]; every edit
//! goes through [`presenter::EditPresenter::do_command`] so it can be undone
//! and redone.

pub mod command;
pub mod common;
pub mod maproot;
pub mod model;
pub mod presenter;

pub use command::{Command, CommandError};
pub use common::eref::ERef;
pub use common::events::{EventChannel, MapEvent};
pub use maproot::MapRoot;
pub use model::ModelError;
pub use model::app_state::AppState;
pub use model::layer::LayerModel;
pub use model::map::MapModel;
pub use model::topic::TopicModel;
pub use presenter::{EditPresenter, SaveEndpoint};
