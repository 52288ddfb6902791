pub mod events;
pub mod message;
pub mod params;
pub mod source;
pub mod stage;
pub mod thread;

pub use events::{EventKind, RunEvent};
pub use message::{Feedback, Message, Role};
pub use params::{AgentMode, DeepResearchParams};
pub use source::{Source, SourceSet};
pub use stage::{ResearchStage, StageUpdate};
pub use thread::ThreadMetadata;
