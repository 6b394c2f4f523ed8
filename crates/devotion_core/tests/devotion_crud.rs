use chrono::{Duration, Local, NaiveDate};
use devotion_core::db::open_db_in_memory;
use devotion_core::{
    DevotionDraft, DevotionPatch, DevotionRepository, RepoError, RepoErrorKind,
    SqliteDevotionRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn draft(title: &str, date: NaiveDate) -> DevotionDraft {
    DevotionDraft::new(
        title,
        "Lamentations 3:22-23",
        "His mercies are new every morning.\nGreat is your faithfulness.",
        date,
    )
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn create_then_get_returns_input_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();

    let input = draft("New Mercies", day(2024, 3, 1))
        .with_excerpt("Mercy every morning")
        .published(true);
    let id = repo.create_devotion(&input).unwrap();

    let loaded = repo.devotion_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.title, input.title);
    assert_eq!(loaded.bible_verse, input.bible_verse);
    assert_eq!(loaded.content, input.content);
    assert_eq!(loaded.excerpt, "Mercy every morning");
    assert_eq!(loaded.publish_date, input.publish_date);
    assert!(loaded.is_published);
    assert_eq!(loaded.created_at, loaded.updated_at);
}

#[test]
fn omitted_excerpt_is_first_150_characters_of_content() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();

    let content: String = "abcdefghij".repeat(30);
    let mut input = draft("Long", day(2024, 3, 2));
    input.content = content.clone();
    let id = repo.create_devotion(&input).unwrap();

    let loaded = repo.devotion_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.excerpt, content[..150]);
    assert_eq!(loaded.content, content);
}

#[test]
fn get_by_id_sees_drafts_and_returns_none_for_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();

    let id = repo.create_devotion(&draft("Draft", day(2024, 3, 3))).unwrap();
    let loaded = repo.devotion_by_id(id).unwrap().unwrap();
    assert!(!loaded.is_published);

    assert!(repo.devotion_by_id(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn update_merges_only_supplied_fields_and_refreshes_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let id = repo
        .create_devotion(&draft("Before", day(2024, 4, 1)).with_excerpt("keep me"))
        .unwrap();
    backdate(&conn, id, 1_000);

    let patch = DevotionPatch {
        title: Some("After".to_string()),
        publish_date: Some(day(2024, 4, 2)),
        ..DevotionPatch::default()
    };
    repo.update_devotion(id, &patch).unwrap();

    let loaded = repo.devotion_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.title, "After");
    assert_eq!(loaded.publish_date, day(2024, 4, 2));
    assert_eq!(loaded.bible_verse, "Lamentations 3:22-23");
    assert_eq!(loaded.excerpt, "keep me");
    assert_eq!(loaded.created_at.timestamp_millis(), 1_000);
    assert!(loaded.updated_at > loaded.created_at);
}

#[test]
fn blank_excerpt_in_update_is_rederived_from_new_content() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let id = repo
        .create_devotion(&draft("Edit", day(2024, 4, 5)).with_excerpt("old summary"))
        .unwrap();

    let patch = DevotionPatch {
        content: Some("Fresh body text.".to_string()),
        excerpt: Some(String::new()),
        ..DevotionPatch::default()
    };
    repo.update_devotion(id, &patch).unwrap();

    let loaded = repo.devotion_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.excerpt, "Fresh body text.");
}

#[test]
fn set_published_changes_nothing_else() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let id = repo.create_devotion(&draft("Toggle", day(2024, 5, 1))).unwrap();
    backdate(&conn, id, 2_000);
    let before = repo.devotion_by_id(id).unwrap().unwrap();

    repo.set_published(id, true).unwrap();
    let after = repo.devotion_by_id(id).unwrap().unwrap();

    assert!(after.is_published);
    assert_eq!(after.title, before.title);
    assert_eq!(after.content, before.content);
    assert_eq!(after.excerpt, before.excerpt);
    assert_eq!(after.publish_date, before.publish_date);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[test]
fn delete_is_permanent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let id = repo.create_devotion(&draft("Gone", day(2024, 6, 1))).unwrap();

    repo.delete_devotion(id).unwrap();
    assert!(repo.devotion_by_id(id).unwrap().is_none());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM devotions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn mutations_on_missing_ids_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    let update = repo
        .update_devotion(missing, &DevotionPatch::default())
        .unwrap_err();
    assert!(matches!(update, RepoError::NotFound(id) if id == missing));
    assert_eq!(update.kind(), RepoErrorKind::NotFound);

    assert!(matches!(
        repo.delete_devotion(missing).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert!(matches!(
        repo.set_published(missing, true).unwrap_err(),
        RepoError::NotFound(_)
    ));
}

#[test]
fn repository_requires_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteDevotionRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("devotions")));
}

#[test]
fn corrupted_rows_surface_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let today = Local::now().date_naive();
    repo.create_devotion(&draft("Fine", today - Duration::days(1)).published(true))
        .unwrap();
    conn.execute("UPDATE devotions SET id = 'not-a-uuid';", [])
        .unwrap();

    let err = repo.all_devotions().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert_eq!(err.kind(), RepoErrorKind::Unknown);
}

fn backdate(conn: &Connection, id: Uuid, millis: i64) {
    conn.execute(
        "UPDATE devotions SET created_at = ?2, updated_at = ?2 WHERE id = ?1;",
        rusqlite::params![id.to_string(), millis],
    )
    .unwrap();
}
