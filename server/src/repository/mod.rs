//! Persistence seam.
//!
//! Handlers talk to a [`Repository`] trait object held in `AppState`. The
//! production implementation is [`PgRepository`] over a `PgPool`, built once
//! at startup.

use async_trait::async_trait;

use crate::models::{
    College, EventChanges, EventDetails, NewEvent, NewUser, RegistrationOutcome,
    RegistrationWithEvent, SaveOutcome, User, UserChanges,
};
use crate::query::{EventFilter, Page};

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod sql;

pub use postgres::PgRepository;

pub type DbResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn ping(&self) -> DbResult<()>;

    async fn find_user_by_id(&self, id: i64) -> DbResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>>;

    async fn create_user(&self, user: NewUser) -> DbResult<User>;

    /// Returns the user with this email, creating a password-less student
    /// account when there is none. Single statement, safe under races.
    async fn find_or_create_oauth_user(&self, email: &str, name: &str) -> DbResult<User>;

    /// `None` when the user does not exist.
    async fn update_user(&self, id: i64, changes: UserChanges) -> DbResult<Option<User>>;

    async fn find_college(&self, id: i64) -> DbResult<Option<College>>;

    /// Returns the college with this exact name, inserting it when missing.
    /// Single conditional insert on the unique `name` column.
    async fn find_or_create_college(&self, name: &str) -> DbResult<College>;

    async fn list_colleges(&self) -> DbResult<Vec<College>>;

    /// Matching events ordered by date ascending, page applied.
    async fn list_events(&self, filter: &EventFilter, page: &Page) -> DbResult<Vec<EventDetails>>;

    /// Count over the same filter, ignoring pagination. Runs outside any
    /// transaction shared with [`Repository::list_events`].
    async fn count_events(&self, filter: &EventFilter) -> DbResult<i64>;

    async fn find_event(&self, id: i64) -> DbResult<Option<EventDetails>>;

    async fn create_event(&self, event: NewEvent) -> DbResult<EventDetails>;

    async fn update_event(&self, id: i64, changes: EventChanges)
        -> DbResult<Option<EventDetails>>;

    /// `false` when nothing was deleted.
    async fn delete_event(&self, id: i64) -> DbResult<bool>;

    async fn save_event(&self, user_id: i64, event_id: i64) -> DbResult<SaveOutcome>;

    async fn register_for_event(&self, user_id: i64, event_id: i64)
        -> DbResult<RegistrationOutcome>;

    async fn saved_event_ids(&self, user_id: i64) -> DbResult<Vec<i64>>;

    async fn registrations_with_events(&self, user_id: i64)
        -> DbResult<Vec<RegistrationWithEvent>>;

    /// Saved events, most recently saved first.
    async fn saved_events(&self, user_id: i64) -> DbResult<Vec<EventDetails>>;
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_foreign_key_violation())
        .unwrap_or(false)
}
