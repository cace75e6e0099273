//! Integration tests for store consistency across remember, forget and traversal

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use readlog::persistence;
use readlog::{Span, TimeIndexedStore};

fn parse_day(s: &str) -> DateTime<Utc> {
    let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
}

#[test]
fn test_period_scenario() {
    let store = TimeIndexedStore::new();
    store.remember(parse_day("2015-01-01"), "t1", "t1");
    store.remember(parse_day("2015-02-01"), "t2", "t2");
    store.remember(parse_day("2015-02-01"), "t3", "t3");
    store.remember(parse_day("2015-02-02"), "t4", "t4");

    let partial = Span::new(parse_day("2015-02-01"), Duration::hours(1));
    assert_eq!(store.get_in_period(&partial), vec!["t2", "t3"]);

    let covering = Span::between(parse_day("2014-01-01"), parse_day("2016-01-01"));
    assert_eq!(store.get_in_period(&covering).len(), 4);

    let later = Span::new(parse_day("2016-01-01"), Duration::hours(365 * 24));
    assert!(store.get_in_period(&later).is_empty());
}

#[test]
fn test_forget_scenario() {
    let store = TimeIndexedStore::new();
    let now = Utc::now();
    store.remember(now, "foo", "bar");

    store.forget("foo");

    assert_eq!(store.get("foo"), None);
    let around_now = Span::new(now - Duration::minutes(1), Duration::minutes(2));
    assert!(store.get_in_period(&around_now).is_empty());
}

#[test]
fn test_forgotten_record_never_reappears() {
    let store = TimeIndexedStore::new();
    let base = parse_day("2015-01-01");
    for i in 0..20 {
        store.remember(base + Duration::days(i), format!("k{}", i), format!("v{}", i));
    }
    for i in (0..20).step_by(2) {
        assert!(store.forget(&format!("k{}", i)));
        // Forgetting twice changes nothing.
        assert!(!store.forget(&format!("k{}", i)));
    }

    let all = Span::new(base, Duration::days(30));
    let remaining = store.get_in_period(&all);
    let expected: Vec<String> = (1..20).step_by(2).map(|i| format!("v{}", i)).collect();
    assert_eq!(remaining, expected);

    let mut seen = HashSet::new();
    let signal: Option<()> = store.each(|_, key, _| {
        seen.insert(key.to_string());
        ControlFlow::Continue(())
    });
    assert!(signal.is_none());
    assert_eq!(seen.len(), 10);
    assert!(seen.iter().all(|k| k[1..].parse::<i64>().unwrap() % 2 == 1));
}

#[test]
fn test_overwrite_moves_record_in_time() {
    let store = TimeIndexedStore::new();
    store.remember(parse_day("2015-01-01"), "a", "a1");
    store.remember(parse_day("2015-01-02"), "b", "b1");
    store.remember(parse_day("2015-01-03"), "a", "a2");

    let all = Span::between(parse_day("2015-01-01"), parse_day("2015-01-31"));
    assert_eq!(store.get_in_period(&all), vec!["b1", "a2"]);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_each_break_visits_exactly_one() {
    for total in [1, 2, 10, 100] {
        let store = TimeIndexedStore::new();
        for i in 0..total {
            store.remember(Utc::now(), format!("k{}", i), "v");
        }

        let mut visits = 0;
        let signal = store.each(|_, _, _| {
            visits += 1;
            ControlFlow::Break(())
        });
        assert_eq!(visits, 1, "total = {}", total);
        assert_eq!(signal, Some(()));
    }
}

#[test]
fn test_each_on_empty_store() {
    let store = TimeIndexedStore::new();
    let signal = store.each(|_, _, _| ControlFlow::Break(()));
    assert!(signal.is_none());
}

#[test]
fn test_concurrent_readers_see_consistent_overwrites() {
    let store = Arc::new(TimeIndexedStore::new());
    let base = parse_day("2015-01-01");
    let all = Span::new(base, Duration::days(365));

    let writer = {
        let store = store.clone();
        std::thread::spawn(move || {
            for i in 0..500 {
                store.remember(base + Duration::hours(i % 24), "shared", format!("{}", i));
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    // Never two entries for the one key.
                    assert!(store.get_in_period(&all).len() <= 1);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(store.get_in_period(&all), vec!["499"]);
}

#[tokio::test]
async fn test_dump_restore_preserves_period_queries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".dump");

    let articles = TimeIndexedStore::new();
    let bookmarks = TimeIndexedStore::new();
    articles.remember(parse_day("2015-02-01"), "t2", "t2");
    articles.remember(parse_day("2015-01-01"), "t1", "t1");
    bookmarks.remember(parse_day("2015-03-01"), "b1", "b1");

    persistence::dump(&path, &articles, &bookmarks).await.unwrap();

    let restored_articles = TimeIndexedStore::new();
    let restored_bookmarks = TimeIndexedStore::new();
    let report = persistence::restore(&path, &restored_articles, &restored_bookmarks)
        .await
        .unwrap();
    assert_eq!(report.skipped, 0);

    let all = Span::between(parse_day("2014-01-01"), parse_day("2016-01-01"));
    assert_eq!(restored_articles.get_in_period(&all), vec!["t1", "t2"]);
    assert_eq!(restored_bookmarks.get("b1").as_deref(), Some("b1"));
}
