//! Devotion repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Date lookup, publication-filtered listing and mutation of devotions.
//! - Publish a fresh full-list snapshot to the live feed after each mutation.
//!
//! # Invariants
//! - Public reads (`devotion_by_date`, `published_devotions`) only ever
//!   return `is_published = 1` rows.
//! - `created_at` is written once; `updated_at` is refreshed by every mutation.
//! - Several published devotions on one day resolve to the most recently
//!   updated one, then the lowest id.

use crate::feed::{ChangeFeed, Subscription};
use crate::model::devotion::{resolve_excerpt, Devotion, DevotionDraft, DevotionId, DevotionPatch};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::table_exists;
use crate::time::{date_to_millis, local_today, millis_to_date, millis_to_utc, now_millis, DayRange};
use chrono::NaiveDate;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Gallery page size used when the caller does not pass one.
pub const PUBLISHED_DEFAULT_LIMIT: u32 = 12;
/// Upper bound for one published-list page.
pub const PUBLISHED_LIMIT_MAX: u32 = 100;

const DEVOTION_SELECT_SQL: &str = "SELECT
    id,
    title,
    bible_verse,
    content,
    excerpt,
    publish_at,
    is_published,
    created_at,
    updated_at
FROM devotions";

/// Live feed carrying the full devotion list, newest publish date first.
pub type DevotionFeed = ChangeFeed<[Devotion]>;

/// Repository interface for devotion reads, writes and live listing.
pub trait DevotionRepository {
    /// Published devotion for the current local day.
    fn todays_devotion(&self) -> RepoResult<Option<Devotion>> {
        self.devotion_by_date(local_today())
    }

    /// Published devotion whose publish timestamp falls on `date`.
    fn devotion_by_date(&self, date: NaiveDate) -> RepoResult<Option<Devotion>>;

    /// Any devotion by id, drafts included.
    fn devotion_by_id(&self, id: DevotionId) -> RepoResult<Option<Devotion>>;

    /// Published devotions dated up to now, newest first.
    ///
    /// `None` uses `PUBLISHED_DEFAULT_LIMIT`; `Some(0)` lists nothing.
    fn published_devotions(&self, limit: Option<u32>) -> RepoResult<Vec<Devotion>>;

    /// Every devotion, drafts included, newest publish date first.
    fn all_devotions(&self) -> RepoResult<Vec<Devotion>>;

    /// Delivers `all_devotions` now and again after every mutation.
    fn subscribe_all<F>(&self, listener: F) -> RepoResult<Subscription>
    where
        F: Fn(&[Devotion]) + Send + Sync + 'static;

    fn create_devotion(&self, draft: &DevotionDraft) -> RepoResult<DevotionId>;

    /// Merges `patch` into the stored record.
    fn update_devotion(&self, id: DevotionId, patch: &DevotionPatch) -> RepoResult<()>;

    /// Removes the record permanently.
    fn delete_devotion(&self, id: DevotionId) -> RepoResult<()>;

    /// Sets only `is_published` (and `updated_at`).
    fn set_published(&self, id: DevotionId, is_published: bool) -> RepoResult<()>;
}

/// SQLite-backed devotion repository.
pub struct SqliteDevotionRepository<'conn> {
    conn: &'conn Connection,
    feed: DevotionFeed,
}

impl<'conn> SqliteDevotionRepository<'conn> {
    /// Constructs a repository with a private feed.
    ///
    /// Fails when the connection has not been migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_feed(conn, DevotionFeed::new())
    }

    /// Constructs a repository that publishes into a shared feed.
    pub fn with_feed(conn: &'conn Connection, feed: DevotionFeed) -> RepoResult<Self> {
        if !table_exists(conn, "devotions")? {
            return Err(RepoError::MissingRequiredTable("devotions"));
        }
        Ok(Self { conn, feed })
    }

    pub fn feed(&self) -> &DevotionFeed {
        &self.feed
    }

    fn notify_feed(&self) {
        if !self.feed.has_listeners() {
            return;
        }
        match self.feed.publish_latest(|| load_all(self.conn)) {
            Ok(true) => debug!("event=feed_publish module=repo status=ok"),
            Ok(false) => debug!("event=feed_publish module=repo status=skipped reason=superseded"),
            Err(err) => error!(
                "event=feed_publish module=repo status=error kind={} error={}",
                err.kind().as_str(),
                err
            ),
        }
    }
}

impl DevotionRepository for SqliteDevotionRepository<'_> {
    fn devotion_by_date(&self, date: NaiveDate) -> RepoResult<Option<Devotion>> {
        let range = DayRange::for_date(date);
        let found = self
            .conn
            .query_row(
                &format!(
                    "{DEVOTION_SELECT_SQL}
                     WHERE is_published = 1
                       AND publish_at BETWEEN ?1 AND ?2
                     ORDER BY updated_at DESC, id ASC
                     LIMIT 1;"
                ),
                params![range.start_ms, range.end_ms],
                |row| Ok(parse_devotion_row(row)),
            )
            .optional();
        logged("devotion_by_date", flatten(found))
    }

    fn devotion_by_id(&self, id: DevotionId) -> RepoResult<Option<Devotion>> {
        logged("devotion_by_id", load_by_id(self.conn, id))
    }

    fn published_devotions(&self, limit: Option<u32>) -> RepoResult<Vec<Devotion>> {
        let limit = normalize_published_limit(limit);
        if limit == 0 {
            return Ok(Vec::new());
        }
        logged(
            "published_devotions",
            load_many(
                self.conn,
                &format!(
                    "{DEVOTION_SELECT_SQL}
                     WHERE is_published = 1
                       AND publish_at <= ?1
                     ORDER BY publish_at DESC, id ASC
                     LIMIT ?2;"
                ),
                params![now_millis(), i64::from(limit)],
            ),
        )
    }

    fn all_devotions(&self) -> RepoResult<Vec<Devotion>> {
        logged("all_devotions", load_all(self.conn))
    }

    fn subscribe_all<F>(&self, listener: F) -> RepoResult<Subscription>
    where
        F: Fn(&[Devotion]) + Send + Sync + 'static,
    {
        let initial = logged("subscribe_all", load_all(self.conn))?;
        let subscription = self.feed.subscribe_with_initial(&initial, listener);
        debug!(
            "event=feed_subscribe module=repo status=ok listeners={}",
            self.feed.listener_count()
        );
        Ok(subscription)
    }

    fn create_devotion(&self, draft: &DevotionDraft) -> RepoResult<DevotionId> {
        let id = Uuid::new_v4();
        let now = now_millis();
        let result = self
            .conn
            .execute(
                "INSERT INTO devotions (
                    id,
                    title,
                    bible_verse,
                    content,
                    excerpt,
                    publish_at,
                    is_published,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8);",
                params![
                    id.to_string(),
                    draft.title.as_str(),
                    draft.bible_verse.as_str(),
                    draft.content.as_str(),
                    draft.resolved_excerpt(),
                    date_to_millis(draft.publish_date),
                    draft.is_published,
                    now,
                ],
            )
            .map(|_| id)
            .map_err(RepoError::from);

        let id = logged("create_devotion", result)?;
        self.notify_feed();
        Ok(id)
    }

    fn update_devotion(&self, id: DevotionId, patch: &DevotionPatch) -> RepoResult<()> {
        logged("update_devotion", merge_patch(self.conn, id, patch))?;
        self.notify_feed();
        Ok(())
    }

    fn delete_devotion(&self, id: DevotionId) -> RepoResult<()> {
        let result = self
            .conn
            .execute("DELETE FROM devotions WHERE id = ?1;", [id.to_string()])
            .map_err(RepoError::from)
            .and_then(|changed| require_changed(changed, id));
        logged("delete_devotion", result)?;
        self.notify_feed();
        Ok(())
    }

    fn set_published(&self, id: DevotionId, is_published: bool) -> RepoResult<()> {
        let result = self
            .conn
            .execute(
                "UPDATE devotions
                 SET
                    is_published = ?2,
                    updated_at = ?3
                 WHERE id = ?1;",
                params![id.to_string(), is_published, now_millis()],
            )
            .map_err(RepoError::from)
            .and_then(|changed| require_changed(changed, id));
        logged("set_published", result)?;
        self.notify_feed();
        Ok(())
    }
}

/// Normalizes the published-list page size.
pub fn normalize_published_limit(limit: Option<u32>) -> u32 {
    match limit {
        None => PUBLISHED_DEFAULT_LIMIT,
        Some(value) => value.min(PUBLISHED_LIMIT_MAX),
    }
}

fn merge_patch(conn: &Connection, id: DevotionId, patch: &DevotionPatch) -> RepoResult<()> {
    let tx = conn.unchecked_transaction()?;
    let current = load_by_id(&tx, id)?.ok_or(RepoError::NotFound(id))?;

    let content = patch.content.clone().unwrap_or(current.content);
    let excerpt = match patch.excerpt.as_deref() {
        Some(value) => resolve_excerpt(Some(value), &content),
        None => current.excerpt,
    };
    let publish_at = match patch.publish_date {
        Some(date) => date_to_millis(date),
        None => current_publish_at(&tx, id)?,
    };

    tx.execute(
        "UPDATE devotions
         SET
            title = ?2,
            bible_verse = ?3,
            content = ?4,
            excerpt = ?5,
            publish_at = ?6,
            is_published = ?7,
            updated_at = ?8
         WHERE id = ?1;",
        params![
            id.to_string(),
            patch.title.as_deref().unwrap_or(current.title.as_str()),
            patch
                .bible_verse
                .as_deref()
                .unwrap_or(current.bible_verse.as_str()),
            content,
            excerpt,
            publish_at,
            patch.is_published.unwrap_or(current.is_published),
            now_millis(),
        ],
    )?;
    tx.commit()?;
    Ok(())
}

// Kept as the raw stored value so a patch without a date never shifts the
// time-of-day of rows written by other tools.
fn current_publish_at(conn: &Connection, id: DevotionId) -> RepoResult<i64> {
    let publish_at = conn.query_row(
        "SELECT publish_at FROM devotions WHERE id = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(publish_at)
}

fn load_by_id(conn: &Connection, id: DevotionId) -> RepoResult<Option<Devotion>> {
    let found = conn
        .query_row(
            &format!("{DEVOTION_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            |row| Ok(parse_devotion_row(row)),
        )
        .optional();
    flatten(found)
}

fn load_all(conn: &Connection) -> RepoResult<Vec<Devotion>> {
    load_many(
        conn,
        &format!("{DEVOTION_SELECT_SQL} ORDER BY publish_at DESC, updated_at DESC, id ASC;"),
        [],
    )
}

fn load_many<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    bind: P,
) -> RepoResult<Vec<Devotion>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(bind)?;
    let mut devotions = Vec::new();
    while let Some(row) = rows.next()? {
        devotions.push(parse_devotion_row(row)?);
    }
    Ok(devotions)
}

fn flatten(
    found: rusqlite::Result<Option<RepoResult<Devotion>>>,
) -> RepoResult<Option<Devotion>> {
    found?.transpose()
}

fn parse_devotion_row(row: &Row<'_>) -> RepoResult<Devotion> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in devotions.id"))
    })?;

    let is_published = match row.get::<_, i64>("is_published")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_published value `{other}` in devotions.is_published"
            )));
        }
    };

    Ok(Devotion {
        id,
        title: row.get("title")?,
        bible_verse: row.get("bible_verse")?,
        content: row.get("content")?,
        excerpt: row.get("excerpt")?,
        publish_date: millis_to_date(row.get("publish_at")?),
        is_published,
        created_at: millis_to_utc(row.get("created_at")?),
        updated_at: millis_to_utc(row.get("updated_at")?),
    })
}

fn require_changed(changed: usize, id: DevotionId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

fn logged<T>(op: &'static str, result: RepoResult<T>) -> RepoResult<T> {
    if let Err(err) = &result {
        error!(
            "event=repo_call module=repo op={} status=error kind={} error={}",
            op,
            err.kind().as_str(),
            err
        );
    }
    result
}
