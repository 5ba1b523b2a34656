//! In-process [`Repository`] for router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{DbResult, Repository};
use crate::models::registration::STATUS_REGISTERED;
use crate::models::{
    College, CollegeSummary, CreatorSummary, Event, EventChanges, EventDetails, NewEvent,
    NewUser, Registration, RegistrationOutcome, RegistrationWithEvent, SaveOutcome, SavedEvent,
    User, UserChanges,
};
use crate::query::{EventFilter, Match, Page};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    colleges: Vec<College>,
    events: Vec<Event>,
    saved: Vec<SavedEvent>,
    registrations: Vec<Registration>,
    next_id: i64,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn details(&self, event: &Event) -> EventDetails {
        let college = self
            .colleges
            .iter()
            .find(|c| c.id == event.college_id)
            .map(CollegeSummary::from)
            .unwrap_or(CollegeSummary {
                id: event.college_id,
                name: String::new(),
                city: None,
            });
        let creator = self
            .users
            .iter()
            .find(|u| u.id == event.created_by)
            .map(|u| CreatorSummary {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .unwrap_or(CreatorSummary {
                id: event.created_by,
                name: None,
                email: String::new(),
            });
        EventDetails {
            event: event.clone(),
            college,
            creator,
        }
    }

    fn matches(&self, event: &Event, filter: &EventFilter) -> bool {
        if filter.matches_nothing() {
            return false;
        }
        if let Some(text) = &filter.text {
            let needle = text.to_lowercase();
            if !event.title.to_lowercase().contains(&needle)
                && !event.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(Match::Is(college)) = filter.college {
            if event.college_id != college {
                return false;
            }
        }
        if let Some(category) = &filter.category {
            if &event.category != category {
                return false;
            }
        }
        if let Some(Match::Is(from)) = filter.date_from {
            if event.date < from {
                return false;
            }
        }
        if let Some(Match::Is(to)) = filter.date_to {
            if event.date > to {
                return false;
            }
        }
        if let Some(Match::Is(creator)) = filter.created_by {
            if event.created_by != creator {
                return false;
            }
        }
        if let Some(Match::Is(user)) = filter.saved_by_user {
            if !self
                .saved
                .iter()
                .any(|s| s.user_id == user && s.event_id == event.id)
            {
                return false;
            }
        }
        true
    }

    fn sorted_matches(&self, filter: &EventFilter) -> Vec<&Event> {
        let mut events: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| self.matches(e, filter))
            .collect();
        events.sort_by_key(|e| (e.date, e.id));
        events
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn college_count(&self) -> usize {
        self.tables.lock().unwrap().colleges.len()
    }

    pub fn saved_count(&self) -> usize {
        self.tables.lock().unwrap().saved.len()
    }

    pub fn registration_count(&self) -> usize {
        self.tables.lock().unwrap().registrations.len()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }

    async fn find_user_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        let mut t = self.tables.lock().unwrap();
        let user = User {
            id: t.id(),
            email: user.email,
            password: user.password_hash,
            name: user.name,
            role: user.role.as_str().to_string(),
            college_id: user.college_id,
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_or_create_oauth_user(&self, email: &str, name: &str) -> DbResult<User> {
        let mut t = self.tables.lock().unwrap();
        if let Some(user) = t.users.iter().find(|u| u.email == email) {
            return Ok(user.clone());
        }
        let user = User {
            id: t.id(),
            email: email.to_string(),
            password: String::new(),
            name: Some(name.to_string()),
            role: "student".to_string(),
            college_id: None,
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> DbResult<Option<User>> {
        let mut t = self.tables.lock().unwrap();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = Some(name);
        }
        if let Some(college_id) = changes.college_id {
            user.college_id = Some(college_id);
        }
        if let Some(hash) = changes.password_hash {
            user.password = hash;
        }
        Ok(Some(user.clone()))
    }

    async fn find_college(&self, id: i64) -> DbResult<Option<College>> {
        let t = self.tables.lock().unwrap();
        Ok(t.colleges.iter().find(|c| c.id == id).cloned())
    }

    async fn find_or_create_college(&self, name: &str) -> DbResult<College> {
        let mut t = self.tables.lock().unwrap();
        if let Some(college) = t.colleges.iter().find(|c| c.name == name) {
            return Ok(college.clone());
        }
        let college = College {
            id: t.id(),
            name: name.to_string(),
            city: None,
            created_at: Utc::now(),
        };
        t.colleges.push(college.clone());
        Ok(college)
    }

    async fn list_colleges(&self) -> DbResult<Vec<College>> {
        let t = self.tables.lock().unwrap();
        let mut colleges = t.colleges.clone();
        colleges.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(colleges)
    }

    async fn list_events(&self, filter: &EventFilter, page: &Page) -> DbResult<Vec<EventDetails>> {
        let t = self.tables.lock().unwrap();
        let offset = page.offset.unwrap_or(0) as usize;
        let limit = page.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(t.sorted_matches(filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|e| t.details(e))
            .collect())
    }

    async fn count_events(&self, filter: &EventFilter) -> DbResult<i64> {
        let t = self.tables.lock().unwrap();
        Ok(t.sorted_matches(filter).len() as i64)
    }

    async fn find_event(&self, id: i64) -> DbResult<Option<EventDetails>> {
        let t = self.tables.lock().unwrap();
        Ok(t.events.iter().find(|e| e.id == id).map(|e| t.details(e)))
    }

    async fn create_event(&self, event: NewEvent) -> DbResult<EventDetails> {
        let mut t = self.tables.lock().unwrap();
        let event = Event {
            id: t.id(),
            title: event.title,
            description: event.description,
            category: event.category,
            date: event.date,
            location: event.location,
            image_url: event.image_url,
            college_id: event.college_id,
            created_by: event.created_by,
            is_public: event.is_public,
            tags: event.tags,
            created_at: Utc::now(),
        };
        t.events.push(event.clone());
        Ok(t.details(&event))
    }

    async fn update_event(
        &self,
        id: i64,
        changes: EventChanges,
    ) -> DbResult<Option<EventDetails>> {
        let mut t = self.tables.lock().unwrap();
        let Some(event) = t.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.title {
            event.title = v;
        }
        if let Some(v) = changes.description {
            event.description = v;
        }
        if let Some(v) = changes.category {
            event.category = v;
        }
        if let Some(v) = changes.date {
            event.date = v;
        }
        if let Some(v) = changes.location {
            event.location = v;
        }
        if let Some(v) = changes.image_url {
            event.image_url = v;
        }
        if let Some(v) = changes.college_id {
            event.college_id = v;
        }
        if let Some(v) = changes.is_public {
            event.is_public = v;
        }
        if let Some(v) = changes.tags {
            event.tags = v;
        }
        let event = event.clone();
        Ok(Some(t.details(&event)))
    }

    async fn delete_event(&self, id: i64) -> DbResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.events.len();
        t.events.retain(|e| e.id != id);
        t.saved.retain(|s| s.event_id != id);
        t.registrations.retain(|r| r.event_id != id);
        Ok(t.events.len() < before)
    }

    async fn save_event(&self, user_id: i64, event_id: i64) -> DbResult<SaveOutcome> {
        let mut t = self.tables.lock().unwrap();
        if t
            .saved
            .iter()
            .any(|s| s.user_id == user_id && s.event_id == event_id)
        {
            return Ok(SaveOutcome::AlreadySaved);
        }
        let saved = SavedEvent {
            id: t.id(),
            user_id,
            event_id,
            created_at: Utc::now(),
        };
        t.saved.push(saved);
        Ok(SaveOutcome::Saved)
    }

    async fn register_for_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> DbResult<RegistrationOutcome> {
        let mut t = self.tables.lock().unwrap();
        if let Some(existing) = t
            .registrations
            .iter()
            .find(|r| r.user_id == user_id && r.event_id == event_id)
        {
            return Ok(RegistrationOutcome {
                registration: existing.clone(),
                created: false,
            });
        }
        let registration = Registration {
            id: t.id(),
            user_id,
            event_id,
            status: STATUS_REGISTERED.to_string(),
            created_at: Utc::now(),
        };
        t.registrations.push(registration.clone());
        Ok(RegistrationOutcome {
            registration,
            created: true,
        })
    }

    async fn saved_event_ids(&self, user_id: i64) -> DbResult<Vec<i64>> {
        let t = self.tables.lock().unwrap();
        Ok(t.saved
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.event_id)
            .collect())
    }

    async fn registrations_with_events(
        &self,
        user_id: i64,
    ) -> DbResult<Vec<RegistrationWithEvent>> {
        let t = self.tables.lock().unwrap();
        Ok(t.registrations
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                t.events
                    .iter()
                    .find(|e| e.id == r.event_id)
                    .map(|e| RegistrationWithEvent {
                        registration: r.clone(),
                        event: e.clone(),
                    })
            })
            .collect())
    }

    async fn saved_events(&self, user_id: i64) -> DbResult<Vec<EventDetails>> {
        let t = self.tables.lock().unwrap();
        Ok(t.saved
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| t.events.iter().find(|e| e.id == s.event_id))
            .map(|e| t.details(e))
            .collect())
    }
}
