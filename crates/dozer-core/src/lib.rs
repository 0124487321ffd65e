//! Dozer Core Library
//!
//! Platform-agnostic engine for the Dozer notepage client: JSON-RPC
//! correlation, micron/pixel calibration, the note store, the interaction
//! state machine and the sync engine.

pub mod api;
pub mod canvas;
pub mod config;
pub mod error;
pub mod input;
pub mod interaction;
pub mod note;
pub mod rpc;
pub mod selection;
pub mod session;
pub mod store;
pub mod surface;
pub mod sync;
pub mod transform;
pub mod transport;

pub use api::{Api, FolderEntry, NodeClass, NotepageInfo};
pub use canvas::Canvas;
pub use config::{ClientConfig, ConfigError};
pub use error::{InputError, SessionError};
pub use input::{HitTarget, Key, KeyBindings, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{InteractionMachine, InteractionMode, InteractionOutcome};
pub use note::{Note, NoteId, NotePatch, RevisionId};
pub use rpc::{ErrorKind, PendingCall, RpcClient, RpcError, RpcResult};
pub use selection::{SelectOp, Selection};
pub use session::NotepageSession;
pub use store::NoteStore;
pub use surface::{MarkdownRenderer, MarkupRenderer, MemorySurface, NotePlacement, Surface};
pub use sync::{EditNote, NoteOperation, SyncEngine, SyncEvent};
pub use transform::{Calibration, CalibrationError, CalibrationProbe, FixedProbe, MicronVec};
pub use transport::{LoopbackTransport, PlatformTransport, Transport};
