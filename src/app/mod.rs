// Application layer - Use case interactors

pub mod container;
pub mod cut_interactor;
pub mod inspect_interactor;
pub mod session;

// Re-export interactors
pub use cut_interactor::{CutInput, CutInteractor, CutResponse};
pub use inspect_interactor::{InspectInteractor, MediaSummary};
pub use session::{InteractiveSession, SessionStatus};
