pub mod audit;
pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod gateway;
pub mod intents;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use dialog::{
    close, confirm_intent, delegate, elicit_slot, DialogAction, DialogResponse, FulfillmentState,
    Message, SlotValidator, ValidationResult,
};
pub use domain::booking::{BookingId, BookingRecord, SeatClass};
pub use domain::intent::{CurrentIntent, IntentRequest, InvocationSource, BOOK_FLIGHT_INTENT};
pub use domain::slots::{SessionAttributes, SlotName, SlotSet};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use gateway::{NotificationChannel, PersistenceGateway};
pub use intents::{BookFlightHandler, IntentDispatcher, IntentHandler, TurnContext};
