use crate::Database;
use crate::models::{FeedbackRow, FormRow, RatingSummaryRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;
use rusqlite::types::ToSql;
use uuid::Uuid;

/// Conjunctive filter over stored feedback. Every populated field narrows the
/// result set; `search` matches name, email and message as a substring.
#[derive(Debug, Default)]
pub struct FeedbackFilter {
    pub form_id: Option<String>,
    pub rating: Option<i64>,
    pub search: Option<String>,
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        name: &str,
        role: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, role, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, email, name, role, password_hash],
            )?;
            Ok(())
        })
    }

    /// Inserts the default admin account unless a user with the given email
    /// already exists. Returns whether a row was created.
    pub fn seed_admin(&self, email: &str, name: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<String> = conn
                .query_row("SELECT id FROM users WHERE email = ?1", [email], |row| row.get(0))
                .optional()?;

            if existing.is_some() {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO users (id, email, name, role, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![Uuid::new_v4().to_string(), email, name, "admin", password_hash],
            )?;
            Ok(true)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Forms --

    pub fn insert_form(&self, form: &FormRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO feedback_forms (id, title, description, created_by, created_at, is_active, fields)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    form.id,
                    form.title,
                    form.description,
                    form.created_by,
                    form.created_at,
                    form.is_active,
                    form.fields
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_forms(&self) -> Result<Vec<FormRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, created_by, created_at, is_active, fields
                 FROM feedback_forms
                 ORDER BY created_at DESC",
            )?;

            let rows = stmt
                .query_map([], form_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_form(&self, id: &str) -> Result<Option<FormRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, created_by, created_at, is_active, fields
                 FROM feedback_forms
                 WHERE id = ?1",
            )?;

            let row = stmt.query_row([id], form_from_row).optional()?;
            Ok(row)
        })
    }

    /// Persists the merged form state. Callers resolve partial updates against
    /// the stored row first, so every column is written.
    pub fn update_form(
        &self,
        id: &str,
        title: &str,
        description: &str,
        is_active: bool,
        fields: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE feedback_forms
                 SET title = ?1, description = ?2, is_active = ?3, fields = ?4
                 WHERE id = ?5",
                rusqlite::params![title, description, is_active, fields, id],
            )?;
            Ok(())
        })
    }

    /// Deletes a form and everything submitted against it. Feedback rows go
    /// first so the form reference invariant holds at every point; both
    /// statements run in one transaction.
    pub fn delete_form_cascade(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM feedbacks WHERE form_id = ?1", [id])?;
            tx.execute("DELETE FROM feedback_forms WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Feedback --

    pub fn insert_feedback(&self, feedback: &FeedbackRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO feedbacks (id, form_id, name, email, message, rating, created_at, responses)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    feedback.id,
                    feedback.form_id,
                    feedback.name,
                    feedback.email,
                    feedback.message,
                    feedback.rating,
                    feedback.created_at,
                    feedback.responses
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_feedbacks(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRow>> {
        self.with_conn(|conn| {
            let mut sql = String::from(
                "SELECT id, form_id, name, email, message, rating, created_at, responses
                 FROM feedbacks",
            );
            let mut clauses: Vec<&str> = Vec::new();
            let mut params: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(form_id) = &filter.form_id {
                clauses.push("form_id = ?");
                params.push(Box::new(form_id.clone()));
            }
            if let Some(rating) = filter.rating {
                clauses.push("rating = ?");
                params.push(Box::new(rating));
            }
            if let Some(search) = &filter.search {
                // SQLite LIKE is case-insensitive for ASCII
                clauses.push("(name LIKE ? OR email LIKE ? OR message LIKE ?)");
                let pattern = format!("%{}%", search);
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }

            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

            let rows = stmt
                .query_map(param_refs.as_slice(), feedback_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Analytics --

    /// Single aggregate pass over feedback ratings, optionally scoped to one
    /// form. SQL aggregates return NULL on an empty set, mapped to zeros here.
    pub fn rating_summary(&self, form_id: Option<&str>) -> Result<RatingSummaryRow> {
        self.with_conn(|conn| {
            let mut sql = String::from(
                "SELECT
                     COUNT(*),
                     AVG(rating),
                     SUM(CASE WHEN rating >= 4 THEN 1 ELSE 0 END),
                     SUM(CASE WHEN rating < 3 THEN 1 ELSE 0 END),
                     SUM(CASE WHEN rating = 3 THEN 1 ELSE 0 END)
                 FROM feedbacks",
            );

            let mut params: Vec<&dyn ToSql> = Vec::new();
            if let Some(form_id) = &form_id {
                sql.push_str(" WHERE form_id = ?1");
                params.push(form_id);
            }

            let row = conn.query_row(&sql, params.as_slice(), |row| {
                Ok(RatingSummaryRow {
                    total: row.get(0)?,
                    average: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                    positive: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                    negative: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                    neutral: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                })
            })?;

            Ok(row)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn
        .prepare("SELECT id, email, name, role, password_hash FROM users WHERE email = ?1")?;

    let row = stmt.query_row([email], user_from_row).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, name, role, password_hash FROM users WHERE id = ?1")?;

    let row = stmt.query_row([id], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        password_hash: row.get(4)?,
    })
}

fn form_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<FormRow, rusqlite::Error> {
    Ok(FormRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
        is_active: row.get(5)?,
        fields: row.get(6)?,
    })
}

fn feedback_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<FeedbackRow, rusqlite::Error> {
    Ok(FeedbackRow {
        id: row.get(0)?,
        form_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        message: row.get(4)?,
        rating: row.get(5)?,
        created_at: row.get(6)?,
        responses: row.get(7)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.seed_admin("admin@test.local", "Admin User", "not-a-real-hash")
            .unwrap();
        db
    }

    fn admin_id(db: &Database) -> String {
        db.get_user_by_email("admin@test.local").unwrap().unwrap().id
    }

    fn insert_form(db: &Database, title: &str, created_at: &str, active: bool) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_form(&FormRow {
            id: id.clone(),
            title: title.to_string(),
            description: "A test form".to_string(),
            created_by: admin_id(db),
            created_at: created_at.to_string(),
            is_active: active,
            fields: "[]".to_string(),
        })
        .unwrap();
        id
    }

    fn insert_feedback(db: &Database, form_id: &str, name: &str, message: &str, rating: i64) {
        db.insert_feedback(&FeedbackRow {
            id: Uuid::new_v4().to_string(),
            form_id: form_id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            message: message.to_string(),
            rating,
            created_at: "2026-03-01T12:00:00.000Z".to_string(),
            responses: "{}".to_string(),
        })
        .unwrap();
    }

    fn feedback_count(db: &Database) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM feedbacks", [], |r| r.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn seed_admin_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.seed_admin("admin@test.local", "Admin User", "hash-1").unwrap());
        assert!(!db.seed_admin("admin@test.local", "Admin User", "hash-2").unwrap());

        // The original hash survives the second call
        let user = db.get_user_by_email("admin@test.local").unwrap().unwrap();
        assert_eq!(user.password_hash, "hash-1");
        assert_eq!(user.role, "admin");
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = test_db();
        let result = db.create_user("u-2", "admin@test.local", "Other", "user", "hash");
        assert!(result.is_err());
    }

    #[test]
    fn forms_list_newest_first() {
        let db = test_db();
        insert_form(&db, "Older", "2026-01-01T00:00:00.000Z", true);
        insert_form(&db, "Newer", "2026-02-01T00:00:00.000Z", true);

        let forms = db.list_forms().unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].title, "Newer");
        assert_eq!(forms[1].title, "Older");
    }

    #[test]
    fn get_form_missing_returns_none() {
        let db = test_db();
        assert!(db.get_form("no-such-form").unwrap().is_none());
    }

    #[test]
    fn update_form_overwrites_columns() {
        let db = test_db();
        let id = insert_form(&db, "Before", "2026-01-01T00:00:00.000Z", true);

        db.update_form(&id, "After", "A test form", false, "[]").unwrap();

        let form = db.get_form(&id).unwrap().unwrap();
        assert_eq!(form.title, "After");
        assert!(!form.is_active);
    }

    #[test]
    fn delete_form_removes_feedback_first() {
        let db = test_db();
        let id = insert_form(&db, "Doomed", "2026-01-01T00:00:00.000Z", true);
        insert_feedback(&db, &id, "Ada", "great", 5);
        insert_feedback(&db, &id, "Grace", "fine", 3);
        assert_eq!(feedback_count(&db), 2);

        db.delete_form_cascade(&id).unwrap();

        assert_eq!(feedback_count(&db), 0);
        assert!(db.get_form(&id).unwrap().is_none());
    }

    #[test]
    fn feedback_filters_are_conjunctive() {
        let db = test_db();
        let form_a = insert_form(&db, "A", "2026-01-01T00:00:00.000Z", true);
        let form_b = insert_form(&db, "B", "2026-01-02T00:00:00.000Z", true);

        insert_feedback(&db, &form_a, "Ada", "loved the checkout flow", 5);
        insert_feedback(&db, &form_a, "Grace", "checkout was confusing", 2);
        insert_feedback(&db, &form_b, "Ada", "checkout again", 5);

        // search + rating must both match
        let rows = db
            .list_feedbacks(&FeedbackFilter {
                form_id: None,
                rating: Some(5),
                search: Some("checkout".to_string()),
            })
            .unwrap();
        assert_eq!(rows.len(), 2);

        // adding the form filter narrows further
        let rows = db
            .list_feedbacks(&FeedbackFilter {
                form_id: Some(form_a.clone()),
                rating: Some(5),
                search: Some("checkout".to_string()),
            })
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ada");
    }

    #[test]
    fn feedback_search_is_case_insensitive() {
        let db = test_db();
        let form = insert_form(&db, "A", "2026-01-01T00:00:00.000Z", true);
        insert_feedback(&db, &form, "Ada", "The Checkout Flow", 4);

        let rows = db
            .list_feedbacks(&FeedbackFilter {
                search: Some("checkout".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn feedback_search_matches_email() {
        let db = test_db();
        let form = insert_form(&db, "A", "2026-01-01T00:00:00.000Z", true);
        insert_feedback(&db, &form, "Ada", "no keyword here", 4);

        let rows = db
            .list_feedbacks(&FeedbackFilter {
                search: Some("ada@example".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn rating_summary_empty_set_is_all_zeros() {
        let db = test_db();
        let summary = db.rating_summary(None).unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.positive, 0);
        assert_eq!(summary.negative, 0);
        assert_eq!(summary.neutral, 0);
    }

    #[test]
    fn rating_summary_buckets() {
        let db = test_db();
        let form = insert_form(&db, "A", "2026-01-01T00:00:00.000Z", true);
        for rating in [1, 2, 3, 4, 5] {
            insert_feedback(&db, &form, "Ada", "msg", rating);
        }

        let summary = db.rating_summary(Some(&form)).unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.positive, 2); // 4 and 5
        assert_eq!(summary.negative, 2); // 1 and 2
        assert_eq!(summary.neutral, 1); // exactly 3
        assert_eq!(summary.average, 3.0);
    }

    #[test]
    fn rating_summary_scopes_to_form() {
        let db = test_db();
        let form_a = insert_form(&db, "A", "2026-01-01T00:00:00.000Z", true);
        let form_b = insert_form(&db, "B", "2026-01-02T00:00:00.000Z", true);
        insert_feedback(&db, &form_a, "Ada", "msg", 5);
        insert_feedback(&db, &form_b, "Grace", "msg", 1);

        let summary = db.rating_summary(Some(&form_a)).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.average, 5.0);
    }
}
