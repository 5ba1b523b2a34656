use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::sql::{count_events_query, list_events_query, select_details, EVENT_COLUMNS};
use super::{DbResult, Repository};
use crate::models::registration::STATUS_REGISTERED;
use crate::models::{
    College, Event, EventChanges, EventDetails, EventRow, NewEvent, NewUser, Registration,
    RegistrationOutcome, RegistrationWithEvent, SaveOutcome, User, UserChanges,
};
use crate::query::{EventFilter, Page};

const USER_COLUMNS: &str = "id, email, password, name, role, college_id, created_at";
const COLLEGE_COLUMNS: &str = "id, name, city, created_at";
const REGISTRATION_COLUMNS: &str = "id, user_id, event_id, status, created_at";

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RegistrationEventRow {
    registration_id: i64,
    registration_user_id: i64,
    registration_status: String,
    registration_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    event: Event,
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: i64) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password, name, role, college_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.name)
        .bind(user.role.as_str())
        .bind(user.college_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_or_create_oauth_user(&self, email: &str, name: &str) -> DbResult<User> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password, name, role) VALUES ($1, '', $2, 'student') \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email RETURNING {}",
            USER_COLUMNS
        ))
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> DbResult<Option<User>> {
        if changes.name.is_none() && changes.college_id.is_none() && changes.password_hash.is_none()
        {
            return self.find_user_by_id(id).await;
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = changes.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(college_id) = changes.college_id {
            set.push("college_id = ").push_bind_unseparated(college_id);
        }
        if let Some(hash) = changes.password_hash {
            set.push("password = ").push_bind_unseparated(hash);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        qb.build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_college(&self, id: i64) -> DbResult<Option<College>> {
        sqlx::query_as::<_, College>(&format!(
            "SELECT {} FROM colleges WHERE id = $1",
            COLLEGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_or_create_college(&self, name: &str) -> DbResult<College> {
        sqlx::query_as::<_, College>(&format!(
            "INSERT INTO colleges (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING {}",
            COLLEGE_COLUMNS
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_colleges(&self) -> DbResult<Vec<College>> {
        sqlx::query_as::<_, College>(&format!(
            "SELECT {} FROM colleges ORDER BY name ASC",
            COLLEGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn list_events(&self, filter: &EventFilter, page: &Page) -> DbResult<Vec<EventDetails>> {
        let mut qb = list_events_query(filter, page);
        let rows = qb.build_query_as::<EventRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(EventDetails::from).collect())
    }

    async fn count_events(&self, filter: &EventFilter) -> DbResult<i64> {
        let mut qb = count_events_query(filter);
        qb.build_query_scalar::<i64>().fetch_one(&self.pool).await
    }

    async fn find_event(&self, id: i64) -> DbResult<Option<EventDetails>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "{} WHERE e.id = $1",
            select_details("events")
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(EventDetails::from))
    }

    async fn create_event(&self, event: NewEvent) -> DbResult<EventDetails> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "WITH inserted AS ( \
                INSERT INTO events (title, description, category, date, location, image_url, \
                                    college_id, created_by, is_public, tags) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING * \
             ) {}",
            select_details("inserted")
        ))
        .bind(event.title)
        .bind(event.description)
        .bind(event.category)
        .bind(event.date)
        .bind(event.location)
        .bind(event.image_url)
        .bind(event.college_id)
        .bind(event.created_by)
        .bind(event.is_public)
        .bind(event.tags)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_event(
        &self,
        id: i64,
        changes: EventChanges,
    ) -> DbResult<Option<EventDetails>> {
        if changes.is_empty() {
            return self.find_event(id).await;
        }

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("WITH updated AS (UPDATE events SET ");
        let mut set = qb.separated(", ");
        if let Some(title) = changes.title {
            set.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = changes.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(category) = changes.category {
            set.push("category = ").push_bind_unseparated(category);
        }
        if let Some(date) = changes.date {
            set.push("date = ").push_bind_unseparated(date);
        }
        if let Some(location) = changes.location {
            set.push("location = ").push_bind_unseparated(location);
        }
        if let Some(image_url) = changes.image_url {
            set.push("image_url = ").push_bind_unseparated(image_url);
        }
        if let Some(college_id) = changes.college_id {
            set.push("college_id = ").push_bind_unseparated(college_id);
        }
        if let Some(is_public) = changes.is_public {
            set.push("is_public = ").push_bind_unseparated(is_public);
        }
        if let Some(tags) = changes.tags {
            set.push("tags = ").push_bind_unseparated(tags);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING *) ")
            .push(select_details("updated"));

        let row = qb
            .build_query_as::<EventRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(EventDetails::from))
    }

    async fn delete_event(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_event(&self, user_id: i64, event_id: i64) -> DbResult<SaveOutcome> {
        let inserted: Option<i64> = sqlx::query_scalar(
            "INSERT INTO saved_events (user_id, event_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, event_id) DO NOTHING RETURNING id",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(_) => SaveOutcome::Saved,
            None => SaveOutcome::AlreadySaved,
        })
    }

    async fn register_for_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> DbResult<RegistrationOutcome> {
        let inserted = sqlx::query_as::<_, Registration>(&format!(
            "INSERT INTO registrations (user_id, event_id, status) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, event_id) DO NOTHING RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .bind(event_id)
        .bind(STATUS_REGISTERED)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(registration) = inserted {
            return Ok(RegistrationOutcome {
                registration,
                created: true,
            });
        }

        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE user_id = $1 AND event_id = $2",
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RegistrationOutcome {
            registration,
            created: false,
        })
    }

    async fn saved_event_ids(&self, user_id: i64) -> DbResult<Vec<i64>> {
        sqlx::query_scalar(
            "SELECT event_id FROM saved_events WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn registrations_with_events(
        &self,
        user_id: i64,
    ) -> DbResult<Vec<RegistrationWithEvent>> {
        let rows = sqlx::query_as::<_, RegistrationEventRow>(&format!(
            "SELECT r.id AS registration_id, r.user_id AS registration_user_id, \
                    r.status AS registration_status, r.created_at AS registration_created_at, {} \
             FROM registrations r JOIN events e ON e.id = r.event_id \
             WHERE r.user_id = $1 ORDER BY r.created_at DESC, r.id DESC",
            EVENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RegistrationWithEvent {
                registration: Registration {
                    id: row.registration_id,
                    user_id: row.registration_user_id,
                    event_id: row.event.id,
                    status: row.registration_status,
                    created_at: row.registration_created_at,
                },
                event: row.event,
            })
            .collect())
    }

    async fn saved_events(&self, user_id: i64) -> DbResult<Vec<EventDetails>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "{} JOIN saved_events s ON s.event_id = e.id \
             WHERE s.user_id = $1 ORDER BY s.created_at DESC, s.id DESC",
            select_details("events")
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(EventDetails::from).collect())
    }
}

/// Run against a scratch database when `DATABASE_URL` is set; skipped
/// otherwise. Rows are namespaced per test so runs can share a database.
#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::models::Role;
    use crate::query::Match;

    async fn repository() -> Option<PgRepository> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        Some(PgRepository::new(pool))
    }

    fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    async fn admin(repo: &PgRepository) -> User {
        repo.create_user(NewUser {
            email: format!("{}@campus.edu", unique("admin")),
            password_hash: String::new(),
            name: Some("Admin".to_string()),
            role: Role::Admin,
            college_id: None,
        })
        .await
        .unwrap()
    }

    fn event(title: &str, day: u32, college_id: i64, created_by: i64) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: format!("{} description", title),
            category: "Tech".to_string(),
            date: Utc.with_ymd_and_hms(2025, 3, day, 18, 0, 0).unwrap(),
            location: Some("Hall A".to_string()),
            image_url: None,
            college_id,
            created_by,
            is_public: true,
            tags: vec!["campus".to_string()],
        }
    }

    #[tokio::test]
    async fn test_find_or_create_college_is_idempotent() {
        let Some(repo) = repository().await else {
            return;
        };
        let name = unique("Northgate University");

        let first = repo.find_or_create_college(&name).await.unwrap();
        let second = repo.find_or_create_college(&name).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.find_college(first.id).await.unwrap().unwrap().name, name);
    }

    #[tokio::test]
    async fn test_list_and_count_events() {
        let Some(repo) = repository().await else {
            return;
        };
        let creator = admin(&repo).await;
        let college = repo.find_or_create_college(&unique("College")).await.unwrap();

        for (title, day) in [("Late", 20), ("Early", 5), ("Middle", 10)] {
            repo.create_event(event(title, day, college.id, creator.id))
                .await
                .unwrap();
        }

        let mine = EventFilter {
            created_by: Some(Match::Is(creator.id)),
            ..EventFilter::default()
        };
        let events = repo.list_events(&mine, &Page::default()).await.unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.event.title.as_str()).collect();
        assert_eq!(titles, ["Early", "Middle", "Late"]);
        assert_eq!(events[0].college.name, college.name);
        assert_eq!(events[0].creator.id, creator.id);

        // Both bounds are inclusive
        let bounded = EventFilter {
            date_from: Some(Match::Is(Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap())),
            date_to: Some(Match::Is(Utc.with_ymd_and_hms(2025, 3, 20, 18, 0, 0).unwrap())),
            ..mine.clone()
        };
        assert_eq!(repo.count_events(&bounded).await.unwrap(), 2);

        let page = Page {
            limit: Some(1),
            offset: Some(1),
        };
        let events = repo.list_events(&mine, &page).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.title, "Middle");
        assert_eq!(repo.count_events(&mine).await.unwrap(), 3);

        let nothing = EventFilter {
            college: Some(Match::Nothing),
            ..mine
        };
        assert!(repo.list_events(&nothing, &Page::default()).await.unwrap().is_empty());
        assert_eq!(repo.count_events(&nothing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_delete_and_idempotent_links() {
        let Some(repo) = repository().await else {
            return;
        };
        let creator = admin(&repo).await;
        let college = repo.find_or_create_college(&unique("College")).await.unwrap();
        let created = repo
            .create_event(event("Hack Night", 1, college.id, creator.id))
            .await
            .unwrap();
        let id = created.event.id;

        let updated = repo
            .update_event(
                id,
                EventChanges {
                    title: Some("Hack Night II".to_string()),
                    location: Some(None),
                    ..EventChanges::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.event.title, "Hack Night II");
        assert_eq!(updated.event.location, None);
        assert_eq!(updated.event.tags, ["campus"]);
        assert!(repo
            .update_event(-1, EventChanges::default())
            .await
            .unwrap()
            .is_none());

        assert_eq!(repo.save_event(creator.id, id).await.unwrap(), SaveOutcome::Saved);
        assert_eq!(
            repo.save_event(creator.id, id).await.unwrap(),
            SaveOutcome::AlreadySaved
        );

        let first = repo.register_for_event(creator.id, id).await.unwrap();
        let second = repo.register_for_event(creator.id, id).await.unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.registration.id, second.registration.id);
        assert_eq!(second.registration.status, STATUS_REGISTERED);

        assert_eq!(repo.saved_event_ids(creator.id).await.unwrap(), [id]);
        assert_eq!(repo.registrations_with_events(creator.id).await.unwrap().len(), 1);

        assert!(repo.delete_event(id).await.unwrap());
        assert!(!repo.delete_event(id).await.unwrap());
        assert!(repo.saved_event_ids(creator.id).await.unwrap().is_empty());
        assert!(repo.registrations_with_events(creator.id).await.unwrap().is_empty());
    }
}
