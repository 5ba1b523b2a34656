//! SQL fragments for event queries.
//!
//! ```sql
//! SELECT <event columns>, c.name AS college_name, ... FROM events e
//! JOIN colleges c ON c.id = e.college_id
//! JOIN users u ON u.id = e.created_by
//! WHERE cond1 AND cond2 AND ...
//! ORDER BY e.date ASC, e.id ASC
//! LIMIT $n OFFSET $m
//! ```
//!
//! Conditions only reference `e` and a correlated `saved_events`
//! subquery, so the count query reuses them without the joins.

use sqlx::{Postgres, QueryBuilder};

use crate::query::{EventFilter, Match, Page};

pub const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.category, e.date, e.location, \
     e.image_url, e.college_id, e.created_by, e.is_public, e.tags, e.created_at";

pub const RELATION_COLUMNS: &str = "c.name AS college_name, c.city AS college_city, \
     u.name AS creator_name, u.email AS creator_email";

pub const RELATION_JOINS: &str =
    " JOIN colleges c ON c.id = e.college_id JOIN users u ON u.id = e.created_by";

/// `SELECT` of event rows with college and creator joined, from `source`
/// aliased as `e` (a table or a CTE name).
pub fn select_details(source: &str) -> String {
    format!(
        "SELECT {}, {} FROM {} e{}",
        EVENT_COLUMNS, RELATION_COLUMNS, source, RELATION_JOINS
    )
}

/// Builds the paginated listing query.
pub fn list_events_query(filter: &EventFilter, page: &Page) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(select_details("events"));
    push_event_filter(&mut qb, filter);
    qb.push(" ORDER BY e.date ASC, e.id ASC");

    if let Some(limit) = page.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = page.offset {
        qb.push(" OFFSET ").push_bind(offset);
    }

    qb
}

/// Builds the total count query over the same predicate, without pagination.
pub fn count_events_query(filter: &EventFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM events e");
    push_event_filter(&mut qb, filter);
    qb
}

/// Appends ` WHERE ...` for every constrained field, joined with `AND`.
/// Appends nothing for an unconstrained filter.
pub fn push_event_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &EventFilter) {
    let mut first = true;

    if let Some(text) = &filter.text {
        let pattern = format!("%{}%", escape_like(text));
        next(qb, &mut first);
        qb.push("(e.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(college) = filter.college {
        next(qb, &mut first);
        push_id_match(qb, "e.college_id", college);
    }

    if let Some(category) = &filter.category {
        next(qb, &mut first);
        qb.push("e.category = ").push_bind(category.clone());
    }

    if let Some(from) = filter.date_from {
        next(qb, &mut first);
        match from {
            Match::Is(ts) => {
                qb.push("e.date >= ").push_bind(ts);
            }
            Match::Nothing => {
                qb.push("FALSE");
            }
        }
    }

    if let Some(to) = filter.date_to {
        next(qb, &mut first);
        match to {
            Match::Is(ts) => {
                qb.push("e.date <= ").push_bind(ts);
            }
            Match::Nothing => {
                qb.push("FALSE");
            }
        }
    }

    if let Some(creator) = filter.created_by {
        next(qb, &mut first);
        push_id_match(qb, "e.created_by", creator);
    }

    if let Some(user) = filter.saved_by_user {
        next(qb, &mut first);
        match user {
            Match::Is(user_id) => {
                qb.push("EXISTS (SELECT 1 FROM saved_events s WHERE s.event_id = e.id AND s.user_id = ")
                    .push_bind(user_id)
                    .push(")");
            }
            Match::Nothing => {
                qb.push("FALSE");
            }
        }
    }
}

fn next(qb: &mut QueryBuilder<'static, Postgres>, first: &mut bool) {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

fn push_id_match(qb: &mut QueryBuilder<'static, Postgres>, column: &str, value: Match<i64>) {
    match value {
        Match::Is(id) => {
            qb.push(column).push(" = ").push_bind(id);
        }
        Match::Nothing => {
            qb.push("FALSE");
        }
    }
}

/// Escapes `LIKE` wildcards so user text matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
