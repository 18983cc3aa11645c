//! Typed publish/subscribe for workspace changes
//!
//! Handlers are registered per event type and run synchronously on the
//! publishing thread, in subscription order. A handler must not publish.

use std::any::{Any, TypeId};

use ahash::AHashMap;
use parking_lot::Mutex;

/// Marker for values that can travel over the [`EventBus`]
pub trait Event: Any + Send + Sync {}

type Handler = Box<dyn FnMut(&dyn Any) + Send>;

/// Workspace-wide event bus
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<AHashMap<TypeId, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` for every published `E`
    pub fn on<E: Event>(&self, mut handler: impl FnMut(&E) + Send + 'static) {
        let erased: Handler = Box::new(move |event| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(event);
            }
        });
        self.handlers.lock().entry(TypeId::of::<E>()).or_default().push(erased);
    }

    pub fn publish<E: Event>(&self, event: E) {
        if let Some(handlers) = self.handlers.lock().get_mut(&TypeId::of::<E>()) {
            for handler in handlers.iter_mut() {
                handler(&event);
            }
        }
    }

    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers.lock().get(&TypeId::of::<E>()).map_or(0, Vec::len)
    }
}

/// Events published by the workspace
pub mod events {
    use super::Event;
    use crate::state::FileId;

    /// A file was accepted and is being read
    #[derive(Debug, Clone, PartialEq)]
    pub struct FileUploading {
        /// Upload status key (full path or upload name)
        pub source: String,
    }

    /// A file was parsed and added to the workspace
    #[derive(Debug, Clone, PartialEq)]
    pub struct FileLoaded {
        pub file_id: FileId,
        pub file_name: String,
        pub row_count: usize,
        pub column_count: usize,
    }

    /// A file could not be ingested
    #[derive(Debug, Clone, PartialEq)]
    pub struct FileFailed {
        pub source: String,
        pub error: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct FileRemoved {
        pub file_id: FileId,
    }

    /// The active file changed (or was cleared)
    #[derive(Debug, Clone, PartialEq)]
    pub struct ActiveFileChanged {
        pub file_id: Option<FileId>,
    }

    /// Analysis or chart settings of a file changed
    #[derive(Debug, Clone, PartialEq)]
    pub struct SettingsChanged {
        pub file_id: FileId,
    }

    macro_rules! impl_event {
        ($($t:ty),* $(,)?) => {
            $(impl Event for $t {})*
        };
    }

    impl_event!(
        FileUploading,
        FileLoaded,
        FileFailed,
        FileRemoved,
        ActiveFileChanged,
        SettingsChanged,
    );
}
