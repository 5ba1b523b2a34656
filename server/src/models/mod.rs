pub mod college;
pub mod event;
pub mod external_event;
pub mod registration;
pub mod saved_event;
pub mod user;

pub use college::{College, CollegeSummary};
pub use event::{
    CreateEventRequest, CreatorSummary, Event, EventChanges, EventDetails, EventPage, EventRow,
    NewEvent, UpdateEventRequest,
};
pub use external_event::{ExternalEvent, ExternalFeed, PriceRange, Venue};
pub use registration::{Registration, RegistrationOutcome, RegistrationWithEvent};
pub use saved_event::{SaveOutcome, SavedEvent};
pub use user::{NewUser, Role, User, UserChanges, UserProfile};
