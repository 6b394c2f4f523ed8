use chrono::NaiveDate;
use devotion_core::db::{open_db, open_db_in_memory};
use devotion_core::{
    Dashboard, DashboardStats, Devotion, DevotionDraft, DevotionFeed, DevotionFilter,
    DevotionRepository, SqliteDevotionRepository,
};
use std::sync::{Arc, Mutex};
use std::thread;

type Snapshots = Arc<Mutex<Vec<Vec<String>>>>;

fn recorder() -> (Snapshots, impl Fn(&[Devotion]) + Send + Sync + 'static) {
    let snapshots: Snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    let listener = move |devotions: &[Devotion]| {
        let titles = devotions.iter().map(|d| d.title.clone()).collect();
        sink.lock().unwrap().push(titles);
    };
    (snapshots, listener)
}

fn draft(title: &str, day: u32) -> DevotionDraft {
    DevotionDraft::new(
        title,
        "Matthew 6:34",
        "Do not worry about tomorrow.",
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap(),
    )
}

#[test]
fn subscribe_delivers_initial_snapshot_then_every_change() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let first = repo.create_devotion(&draft("First", 1)).unwrap();

    let (snapshots, listener) = recorder();
    let subscription = repo.subscribe_all(listener).unwrap();
    assert!(subscription.is_active());

    let second = repo.create_devotion(&draft("Second", 2)).unwrap();
    repo.set_published(first, true).unwrap();
    repo.delete_devotion(second).unwrap();

    let seen = snapshots.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            vec!["First".to_string()],
            vec!["Second".to_string(), "First".to_string()],
            vec!["Second".to_string(), "First".to_string()],
            vec!["First".to_string()],
        ]
    );
}

#[test]
fn unsubscribe_is_idempotent_and_stops_delivery() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let (snapshots, listener) = recorder();
    let subscription = repo.subscribe_all(listener).unwrap();

    subscription.unsubscribe();
    subscription.unsubscribe();
    repo.create_devotion(&draft("Unseen", 3)).unwrap();

    assert!(!subscription.is_active());
    assert_eq!(repo.feed().listener_count(), 0);
    assert_eq!(snapshots.lock().unwrap().len(), 1);
}

#[test]
fn repositories_sharing_a_feed_notify_each_other() {
    let conn = open_db_in_memory().unwrap();
    let feed = DevotionFeed::new();
    let reader = SqliteDevotionRepository::with_feed(&conn, feed.clone()).unwrap();
    let writer = SqliteDevotionRepository::with_feed(&conn, feed).unwrap();

    let (snapshots, listener) = recorder();
    let _subscription = reader.subscribe_all(listener).unwrap();
    writer.create_devotion(&draft("From writer", 4)).unwrap();

    let seen = snapshots.lock().unwrap().clone();
    assert_eq!(seen.last().unwrap(), &vec!["From writer".to_string()]);
}

#[test]
fn writers_on_separate_connections_never_publish_stale_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devotions.db");
    drop(open_db(&path).unwrap());

    let feed = DevotionFeed::new();
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&sizes);
    let _sub = feed.subscribe(move |devotions: &[Devotion]| {
        sink.lock().unwrap().push(devotions.len());
    });

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let feed = feed.clone();
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let repo = SqliteDevotionRepository::with_feed(&conn, feed).unwrap();
                for round in 0..10 {
                    repo.create_devotion(&draft(&format!("w{writer}-{round}"), 1 + round))
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let sizes = sizes.lock().unwrap();
    assert!(sizes.windows(2).all(|pair| pair[0] <= pair[1]), "{sizes:?}");
    assert_eq!(sizes.last().copied(), Some(40));
}

#[test]
fn dashboard_tracks_feed_and_counts_publish_states() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let published = repo.create_devotion(&draft("Published", 5)).unwrap();
    repo.set_published(published, true).unwrap();

    let dashboard = Dashboard::open(&repo);
    assert!(dashboard.is_live());
    assert_eq!(
        dashboard.stats(),
        DashboardStats {
            total: 1,
            published: 1,
            unpublished: 0
        }
    );

    repo.create_devotion(&draft("Pending", 6)).unwrap();
    assert_eq!(
        dashboard.stats(),
        DashboardStats {
            total: 2,
            published: 1,
            unpublished: 1
        }
    );
    assert_eq!(dashboard.devotions()[0].title, "Pending");

    dashboard.close();
    repo.create_devotion(&draft("After close", 7)).unwrap();
    assert_eq!(dashboard.devotions().len(), 2);
    assert!(!dashboard.is_live());
}

#[test]
fn dashboard_filter_tabs_follow_live_updates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    let dashboard = Dashboard::open(&repo);
    assert!(dashboard
        .devotions_filtered(DevotionFilter::Unpublished)
        .is_empty());

    let first = repo.create_devotion(&draft("First", 8)).unwrap();
    repo.create_devotion(&draft("Second", 9)).unwrap();
    repo.set_published(first, true).unwrap();

    let published = dashboard.devotions_filtered(DevotionFilter::Published);
    let drafts = dashboard.devotions_filtered(DevotionFilter::Unpublished);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, first);
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].title, "Second");
    assert_eq!(dashboard.devotions_filtered(DevotionFilter::All).len(), 2);
}

#[test]
fn dashboard_falls_back_to_empty_list_when_feed_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDevotionRepository::try_new(&conn).unwrap();
    repo.create_devotion(&draft("Broken", 8)).unwrap();
    conn.execute("UPDATE devotions SET id = 'bad';", []).unwrap();

    let dashboard = Dashboard::open(&repo);
    assert!(!dashboard.is_live());
    assert!(dashboard.devotions().is_empty());
    assert_eq!(dashboard.stats(), DashboardStats::default());
}
