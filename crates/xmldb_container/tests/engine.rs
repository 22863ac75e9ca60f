//! Engine-level behaviour across managers and handles.

use xmldb_container::{ContainerConfig, ContainerError, EvaluationType, Manager, QueryContext};

fn writable() -> ContainerConfig {
    ContainerConfig::new().create_if_missing(true)
}

#[test]
fn second_writer_is_locked_out_but_reader_succeeds() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("shared");

    let writer_manager = Manager::new();
    let writer = writer_manager.open_container(&path, writable()).unwrap();
    writer.put_document("one", "<one/>").unwrap();

    let other = Manager::new();
    let locked = other.open_container(&path, writable());
    assert!(matches!(locked, Err(ContainerError::ContainerLocked { .. })));

    let reader = other
        .open_container(&path, ContainerConfig::new().read_only(true))
        .unwrap();
    assert!(reader.is_read_only());
    assert_eq!(reader.num_documents(), 1);
    assert!(matches!(
        reader.put_document("two", "<two/>"),
        Err(ContainerError::ReadOnly { .. })
    ));
}

#[test]
fn lock_is_released_when_last_handle_drops() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("c");

    let manager = Manager::new();
    let container = manager.open_container(&path, writable()).unwrap();
    assert!(manager.add_alias("c", &container));
    drop(container);

    // The alias still holds the container open.
    assert!(matches!(
        Manager::new().open_container(&path, writable()),
        Err(ContainerError::ContainerLocked { .. })
    ));

    assert!(manager.remove_alias("c"));
    assert!(Manager::new().open_container(&path, writable()).is_ok());
}

#[test]
fn stream_input_and_query() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("book.xml");
    std::fs::write(&file, "<book lang='en'><title>Dune</title></book>").unwrap();

    let manager = Manager::new();
    let container = manager.open_container(&temp.path().join("c"), writable()).unwrap();
    let stream = manager.create_local_file_input_stream(&file).unwrap();
    container
        .put_document_from_stream(&file.to_string_lossy(), stream)
        .unwrap();
    container.put_document("other", "<book lang='fr'/>").unwrap();
    assert!(manager.add_alias("books", &container));

    let mut context = QueryContext::new(EvaluationType::Lazy);
    context.set_default_collection("books");
    let found: Vec<_> = manager
        .query("collection('books')/book[@lang = 'en']/title", &context)
        .unwrap()
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name(), file.to_string_lossy());
    assert!(found[0].content().contains("Dune"));
}

#[test]
fn missing_input_file_is_an_io_error() {
    let temp = tempfile::tempdir().unwrap();
    let manager = Manager::new();
    let result = manager.create_local_file_input_stream(&temp.path().join("absent.xml"));
    assert!(matches!(result, Err(ContainerError::Io(_))));
}
