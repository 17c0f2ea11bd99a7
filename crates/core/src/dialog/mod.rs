pub mod actions;
pub mod validation;

pub use actions::{
    close, confirm_intent, delegate, elicit_slot, ContentType, DialogAction, DialogResponse,
    FulfillmentState, Message,
};
pub use validation::{validate, SlotValidator, ValidationResult, SEAT_CLASS_REPROMPT};
