pub mod appraiser;
mod code_action;
mod completion;
mod context;
mod edit;
mod hover;

pub use appraiser::Appraiser;
pub use context::{CargoDocumentEvent, CargoTomlPayload};
pub use edit::EditGuard;
