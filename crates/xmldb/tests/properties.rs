//! Behaviour of connections and cursors through the public API.

use proptest::prelude::*;
use std::collections::BTreeSet;
use xmldb::{Connection, Documents, Error};
use xmldb_testkit::prelude::*;

fn names(docs: &Documents) -> Vec<String> {
    let mut names = Vec::new();
    while docs.next() {
        names.push(docs.name());
    }
    names
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

#[test]
fn new_path_opens_empty_writable_database() {
    with_temp_db(|db| {
        assert_eq!(db.size().unwrap(), 0);
        db.put_xml("a", "<a/>", false).unwrap();
        assert_eq!(db.size().unwrap(), 1);
    });
}

#[test]
fn second_open_falls_back_to_read_only() {
    let test_db = TestDatabase::with_documents(LIBRARY);

    let reader = Connection::open(test_db.path()).unwrap();
    assert_eq!(reader.size().unwrap(), LIBRARY.len() as u64);
    assert!(reader.get("dune.xml").unwrap().contains("Dune"));

    let err = reader.put_xml("new.xml", "<new/>", false).unwrap_err();
    assert!(matches!(err, Error::ReadOnly { .. }), "{err}");
    assert!(matches!(reader.remove("dune.xml"), Err(Error::ReadOnly { .. })));
}

#[test]
fn open_failure_reports_open_error() {
    let test_db = TestDatabase::new();
    let file = write_xml_file(test_db.dir(), "plain.xml", "<not-a-database/>");

    let err = Connection::open(&file).unwrap_err();
    assert!(matches!(err, Error::Open { .. }), "{err}");
}

#[test]
fn insert_without_replace_keeps_original() {
    with_temp_db(|db| {
        db.put_xml("a", "<v>1</v>", false).unwrap();
        let err = db.put_xml("a", "<v>2</v>", false).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(db.get("a").unwrap(), "<v>1</v>");
    });
}

#[test]
fn replace_overwrites() {
    with_temp_db(|db| {
        db.put_xml("a", "<v>1</v>", false).unwrap();
        db.put_xml("a", "<v>2</v>", true).unwrap();
        assert_eq!(db.get("a").unwrap(), "<v>2</v>");
        assert_eq!(db.size().unwrap(), 1);
    });
}

#[test]
fn malformed_content_is_rejected() {
    with_temp_db(|db| {
        let err = db.put_xml("a", "<open>", false).unwrap_err();
        assert!(matches!(err, Error::NotWellFormed { .. }));
        assert_eq!(db.size().unwrap(), 0);
    });
}

#[test]
fn put_file_uses_path_as_name() {
    let test_db = TestDatabase::new();
    let file = write_xml_file(test_db.dir(), "doc.xml", "<doc>v1</doc>");

    test_db.put_file(&file, false).unwrap();
    let name = file.to_str().unwrap();
    assert_eq!(test_db.get(name).unwrap(), "<doc>v1</doc>");

    std::fs::write(&file, "<doc>v2</doc>").unwrap();
    assert!(matches!(
        test_db.put_file(&file, false),
        Err(Error::AlreadyExists { .. })
    ));
    test_db.put_file(&file, true).unwrap();
    assert_eq!(test_db.get(name).unwrap(), "<doc>v2</doc>");
}

#[test]
fn merge_into_empty_database() {
    let test_db = TestDatabase::new();
    let source = scenarios::source_database(test_db.dir(), "source", LIBRARY);

    test_db.merge(&source, false).unwrap();
    assert_eq!(test_db.size().unwrap(), LIBRARY.len() as u64);
    for (name, content) in LIBRARY {
        assert_eq!(test_db.get(name).unwrap(), *content);
    }
}

#[test]
fn failed_merge_keeps_earlier_documents() {
    let test_db = TestDatabase::new();
    let source = scenarios::source_database(test_db.dir(), "source", LIBRARY);
    test_db.put_xml("neuromancer.xml", "<mine/>", false).unwrap();

    // Documents are merged in name order: catalogue, dune, neuromancer, ...
    let err = test_db.merge(&source, false).unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));
    assert_eq!(test_db.size().unwrap(), 3);
    assert!(test_db.get("catalogue.xml").is_ok());
    assert!(test_db.get("dune.xml").is_ok());
    assert!(matches!(test_db.get("solaris.xml"), Err(Error::NotFound { .. })));
    assert_eq!(test_db.get("neuromancer.xml").unwrap(), "<mine/>");
}

#[test]
fn merge_with_replace_overwrites() {
    let test_db = TestDatabase::new();
    let source = scenarios::source_database(test_db.dir(), "source", LIBRARY);
    test_db.put_xml("dune.xml", "<mine/>", false).unwrap();

    test_db.merge(&source, true).unwrap();
    assert!(test_db.get("dune.xml").unwrap().contains("Herbert"));
}

#[test]
fn merge_from_missing_source_fails_cleanly() {
    let test_db = TestDatabase::new();
    let err = test_db.merge(test_db.dir().join("missing"), false).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{err}");
    assert!(test_db.is_open());
}

#[test]
fn close_invalidates_outstanding_cursors() {
    let test_db = TestDatabase::with_documents(LIBRARY);
    let first = test_db.all().unwrap();
    let second = test_db.query("//book").unwrap();
    assert!(first.next());
    assert_eq!(test_db.open_iterators(), 2);

    test_db.close();

    for docs in [&first, &second] {
        assert!(!docs.is_open());
        assert!(!docs.next());
        assert_eq!(docs.name(), "");
        assert_eq!(docs.content(), "");
    }
}

#[test]
fn double_close_is_a_no_op() {
    let test_db = TestDatabase::with_documents(LIBRARY);
    let docs = test_db.all().unwrap();
    docs.close();
    docs.close();

    test_db.close();
    test_db.close();
    assert!(matches!(test_db.size(), Err(Error::Closed)));
}

#[test]
fn all_yields_each_document_once() {
    let test_db = TestDatabase::with_documents(&[("a", "<a/>"), ("b", "<b/>"), ("c", "<c/>")]);
    let docs = test_db.all().unwrap();

    assert_eq!(sorted(names(&docs)), vec!["a", "b", "c"]);
    for _ in 0..3 {
        assert!(!docs.next());
    }
}

#[test]
fn cursor_reads_a_snapshot() {
    let test_db = TestDatabase::with_documents(&[("a", "<a/>")]);
    let docs = test_db.all().unwrap();
    test_db.put_xml("b", "<b/>", false).unwrap();

    assert_eq!(names(&docs), vec!["a"]);
    assert_eq!(names(&test_db.all().unwrap()).len(), 2);
}

#[test]
fn invalid_query_is_an_error() {
    let test_db = TestDatabase::with_documents(LIBRARY);
    for expr in ["/book[", "//book[@lang = ]", "/book/@@lang", "unknown("] {
        let err = test_db.query(expr).unwrap_err();
        assert!(matches!(err, Error::Query { .. }), "{expr}: {err}");
    }
    assert_eq!(test_db.open_iterators(), 0);
    assert!(test_db.is_open());
}

#[test]
fn deeply_nested_query_is_an_error() {
    let test_db = TestDatabase::with_documents(LIBRARY);
    let unbalanced = format!("[{}", "(".repeat(5_000));
    let balanced = format!("[{}1{}]", "(".repeat(50_000), ")".repeat(50_000));

    for expr in [unbalanced, balanced] {
        let err = test_db.query(&expr).unwrap_err();
        assert!(matches!(err, Error::Query { .. }), "{err}");
    }
    assert!(test_db.query("[((1))]").is_ok());
    assert_eq!(test_db.size().unwrap(), LIBRARY.len() as u64);
}

#[test]
fn queries_select_matching_documents() {
    let test_db = TestDatabase::with_documents(LIBRARY);
    let query = |expr: &str| sorted(names(&test_db.query(expr).unwrap()));

    assert_eq!(query("//book[@lang = 'en']"), vec!["dune.xml", "neuromancer.xml"]);
    assert_eq!(query("/book[price < 9]"), vec!["neuromancer.xml"]);
    assert_eq!(query("/book[@year > 1970]/title"), vec!["neuromancer.xml"]);
    assert_eq!(query("//author[contains(., 'Lem')]"), vec!["solaris.xml"]);
    assert_eq!(query("[count(//entry) = 3]"), vec!["catalogue.xml"]);
    assert_eq!(query("//entry[@ref = 'dune.xml']"), vec!["catalogue.xml"]);
    assert!(query("//magazine").is_empty());
}

#[test]
fn query_content_is_the_whole_document() {
    let test_db = TestDatabase::with_documents(LIBRARY);
    let docs = test_db.query("//title[. = 'Solaris']").unwrap();
    assert!(docs.next());
    assert_eq!(docs.name(), "solaris.xml");
    assert_eq!(docs.content(), LIBRARY[1].1);
    assert!(!docs.next());
}

#[test]
fn native_version_matches_crate() {
    assert_eq!(xmldb::native_version(), env!("CARGO_PKG_VERSION"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn stored_documents_are_returned_unchanged(docs in document_set_strategy(12)) {
        let test_db = TestDatabase::new();
        for (name, content) in &docs {
            test_db.put_xml(name, content, false).unwrap();
        }

        prop_assert_eq!(test_db.size().unwrap(), docs.len() as u64);
        for (name, content) in &docs {
            prop_assert_eq!(&test_db.get(name).unwrap(), content);
        }

        let listed: BTreeSet<String> = names(&test_db.all().unwrap()).into_iter().collect();
        let expected: BTreeSet<String> = docs.keys().cloned().collect();
        prop_assert_eq!(listed, expected);
    }
}
