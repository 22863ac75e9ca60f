//! Connections and cursors shared across threads.

use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use xmldb::{Connection, Error};
use xmldb_testkit::prelude::*;

const THREADS: usize = 8;
const PER_THREAD: usize = 20;

#[test]
fn threads_share_one_connection() {
    let test_db = TestDatabase::new();

    thread::scope(|s| {
        for t in 0..THREADS {
            let db = test_db.db.clone();
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    db.put_xml(&format!("t{t}-{i}"), &format!("<doc t='{t}' i='{i}'/>"), false)
                        .unwrap();
                    assert!(db.size().unwrap() >= 1);
                }
            });
        }
    });

    assert_eq!(test_db.size().unwrap(), (THREADS * PER_THREAD) as u64);
    let docs = test_db.query("/doc[@t = '3']").unwrap();
    let mut count = 0;
    while docs.next() {
        count += 1;
    }
    assert_eq!(count, PER_THREAD);
}

#[test]
fn readers_and_writers_interleave() {
    let test_db = scenarios::populated_database(10);
    let barrier = Arc::new(Barrier::new(3));

    thread::scope(|s| {
        let writer_db = test_db.db.clone();
        let writer_barrier = Arc::clone(&barrier);
        s.spawn(move || {
            writer_barrier.wait();
            for i in 10..40 {
                writer_db
                    .put_xml(&format!("doc-{i}"), &format!("<doc index='{i}'/>"), false)
                    .unwrap();
            }
        });

        for _ in 0..2 {
            let reader_db = test_db.db.clone();
            let reader_barrier = Arc::clone(&barrier);
            s.spawn(move || {
                reader_barrier.wait();
                for _ in 0..10 {
                    let docs = reader_db.all().unwrap();
                    let mut seen = 0;
                    while docs.next() {
                        assert!(docs.name().starts_with("doc-"));
                        seen += 1;
                    }
                    assert!((10..=40).contains(&seen));
                }
            });
        }
    });

    assert_eq!(test_db.size().unwrap(), 40);
    assert_eq!(test_db.open_iterators(), 0);
}

#[test]
fn cursor_closed_from_another_thread_mid_iteration() {
    let test_db = scenarios::populated_database(50);
    let docs = test_db.all().unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let (closed_tx, closed_rx) = mpsc::channel();

    thread::scope(|s| {
        let docs = &docs;
        s.spawn(move || {
            assert!(docs.next());
            assert!(!docs.name().is_empty());
            started_tx.send(()).unwrap();

            closed_rx.recv().unwrap();
            assert!(!docs.next());
            assert_eq!(docs.name(), "");
        });

        started_rx.recv().unwrap();
        docs.close();
        closed_tx.send(()).unwrap();
    });

    assert!(!docs.is_open());
    assert_eq!(test_db.open_iterators(), 0);
}

#[test]
fn connection_closed_while_other_threads_iterate() {
    let test_db = scenarios::populated_database(50);
    let cursors: Vec<_> = (0..4).map(|_| test_db.all().unwrap()).collect();
    let barrier = Barrier::new(cursors.len() + 1);

    thread::scope(|s| {
        for docs in &cursors {
            let barrier = &barrier;
            s.spawn(move || {
                assert!(docs.next());
                barrier.wait();
                // Whatever happens before the close lands, the cursor ends
                // closed and stays that way.
                while docs.next() {}
                assert!(!docs.next());
            });
        }

        barrier.wait();
        test_db.close();
    });

    for docs in &cursors {
        assert!(!docs.is_open());
        assert_eq!(docs.content(), "");
    }
    assert!(matches!(test_db.all(), Err(Error::Closed)));
}

#[test]
fn dropping_connection_before_cursors_closes_them() {
    let test_db = TestDatabase::with_documents(LIBRARY);
    let path = test_db.path();
    let db = Connection::open(test_db.dir().join("second")).unwrap();
    db.put_xml("a", "<a/>", false).unwrap();
    db.put_xml("b", "<b/>", false).unwrap();

    let docs = db.all().unwrap();
    let query = db.query("/a").unwrap();
    drop(db);

    assert!(!docs.next());
    assert!(!query.next());
    assert_eq!(docs.name(), "");
    drop(docs);
    drop(query);

    // The other database is untouched.
    assert_eq!(Connection::open(&path).unwrap().size().unwrap(), LIBRARY.len() as u64);
}

#[test]
fn cursors_dropped_on_other_threads_deregister() {
    let test_db = scenarios::populated_database(5);

    thread::scope(|s| {
        for _ in 0..THREADS {
            let db = test_db.db.clone();
            s.spawn(move || {
                let docs = db.all().unwrap();
                assert!(docs.next());
            });
        }
    });

    assert_eq!(test_db.open_iterators(), 0);
}

#[test]
fn closing_releases_the_write_lock() {
    let test_db = TestDatabase::new();
    let path = test_db.path();
    test_db.close();

    let reopened = Connection::open(&path).unwrap();
    reopened.put_xml("a", "<a/>", false).unwrap();
    assert_eq!(reopened.size().unwrap(), 1);
}
