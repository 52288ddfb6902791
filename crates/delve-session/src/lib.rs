pub mod config;
pub mod debounce;
pub mod error;
pub mod extract;
pub mod interpret;
pub mod intermediate;
pub mod log;
pub mod patterns;
pub mod session;
pub mod stage;
pub mod store;
pub mod ui;

pub use config::SessionConfig;
pub use error::{classify_error, ErrorKind, ErrorNotice, SessionError};
pub use interpret::StreamInterpreter;
pub use intermediate::IntermediateResults;
pub use log::{InteractionEvent, LogSink, NoopLog, TracingLog};
pub use patterns::StagePatterns;
pub use session::{ChatSession, SendOutcome, StopHandle};
pub use store::SessionStore;
pub use ui::UiEvent;
