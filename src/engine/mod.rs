pub mod card;
pub mod editor;
pub mod evaluator;
pub mod format;
pub mod reconciler;
pub mod reorder;
pub mod state;

pub use card::{CardStyle, CardViewModel, FlagKind, TransientFlag};
pub use editor::AlertConfigForm;
pub use evaluator::{AlertState, Breach, Evaluation};
pub use reorder::{DragTracker, Gesture};
pub use state::{Engine, ReconcileOutcome};
