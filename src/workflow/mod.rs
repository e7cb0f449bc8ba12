pub mod create;
pub mod lifecycle;
pub mod topup;
pub mod validation;

pub use create::CreateAgencyForm;
pub use lifecycle::{
    ActionDialog, ButtonStyle, DialogOutcome, LifecycleKind, PendingAction, Target,
};
pub use topup::{presets, SubmitOutcome, TopUpForm, TopUpState, TopUpWorkflow};
pub use validation::{validate_create_agency, validate_top_up};
