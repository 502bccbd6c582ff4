use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Notifications emitted by the model layer and the presenter. Views
/// subscribe to these instead of polling the models.
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    /// A property of the map itself (`layer_id` = None) or of one layer
    /// changed.
    ModelChanged { layer_id: Option<String> },
    /// Layers (including whole subtrees) were inserted. Ids are final,
    /// i.e. already deduplicated by the registry.
    LayersAdded { ids: Vec<String> },
    LayersRemoved { ids: Vec<String> },
    TopicsChanged,
    AppStateChanged,
    UndoRedoStateChanged {
        undo_possible: bool,
        redo_possible: bool,
    },
    SaveSucceeded,
    SaveFailed { reason: String },
}

pub type Subscriber = Box<dyn FnMut(&MapEvent) + Send>;

/// Session-scoped publish/subscribe channel shared by the models and the
/// presenter. Emitting from within a subscriber does not recurse: the nested
/// event is queued and dispatched after the current one finishes, so cyclic
/// listener writes fire each event at most once per root cause.
#[derive(Clone)]
pub struct EventChannel(Arc<Mutex<ChannelInner>>);

struct ChannelInner {
    subscribers: Vec<Subscriber>,
    dispatching: bool,
    held: usize,
    queued: VecDeque<MapEvent>,
}

/// Keeps the channel's dispatch suspended while alive. Events emitted in the
/// meantime are queued; dropping the last hold delivers them in order.
/// Mutators that emit while holding a lock on the emitting model take a hold
/// first, so subscribers never observe the model mid-mutation.
pub struct EventHold(EventChannel);

impl Drop for EventHold {
    fn drop(&mut self) {
        {
            let mut inner = self.0.0.lock().unwrap();
            inner.held -= 1;
            if inner.held > 0 || inner.dispatching || inner.queued.is_empty() {
                return;
            }
            inner.dispatching = true;
        }
        self.0.drain();
    }
}

impl EventChannel {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(ChannelInner {
            subscribers: Vec::new(),
            dispatching: false,
            held: 0,
            queued: VecDeque::new(),
        })))
    }

    pub fn subscribe(&self, subscriber: impl FnMut(&MapEvent) + Send + 'static) {
        self.0.lock().unwrap().subscribers.push(Box::new(subscriber));
    }

    pub fn hold(&self) -> EventHold {
        self.0.lock().unwrap().held += 1;
        EventHold(self.clone())
    }

    pub fn emit(&self, event: MapEvent) {
        {
            let mut inner = self.0.lock().unwrap();
            inner.queued.push_back(event);
            if inner.dispatching || inner.held > 0 {
                return;
            }
            inner.dispatching = true;
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            // The lock is not held while subscribers run, so they may call
            // emit or subscribe without deadlocking.
            let (event, mut subscribers) = {
                let mut inner = self.0.lock().unwrap();
                match inner.queued.pop_front() {
                    Some(e) => (e, std::mem::take(&mut inner.subscribers)),
                    None => {
                        inner.dispatching = false;
                        return;
                    }
                }
            };
            for s in subscribers.iter_mut() {
                s(&event);
            }
            let mut inner = self.0.lock().unwrap();
            let added_during_dispatch = std::mem::take(&mut inner.subscribers);
            subscribers.extend(added_during_dispatch);
            inner.subscribers = subscribers;
        }
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}
