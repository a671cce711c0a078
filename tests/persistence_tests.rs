use face_index::{
    config::IndexConfig,
    index::VectorIndex,
    persistence::{encode_snapshot, SnapshotStore},
    store::FaceIndex,
    utils::generate_unit_vectors,
    FaceIndexError, IdentityId,
};
use std::fs;
use tempfile::TempDir;

const DIM: usize = 512;

fn config_in(dir: &TempDir) -> IndexConfig {
    IndexConfig::default().with_snapshot_path(dir.path().join("data").join("faces.fidx"))
}

fn bits(index: &VectorIndex) -> Vec<Vec<u32>> {
    index
        .vectors()
        .iter()
        .map(|v| v.iter().map(|x| x.to_bits()).collect())
        .collect()
}

#[test]
fn test_reopen_restores_exact_contents() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);

    let original = {
        let index = FaceIndex::open(&config).unwrap();
        for (i, v) in generate_unit_vectors(DIM, 25).into_iter().enumerate() {
            if i % 2 == 0 {
                index.add(v, i as i64).unwrap();
            } else {
                index.add(v, format!("person-{}", i)).unwrap();
            }
        }
        index.remove(4i64).unwrap();
        index.snapshot()
    };

    let reopened = FaceIndex::open(&config).unwrap().snapshot();
    assert_eq!(reopened.count(), 24);
    assert_eq!(reopened.mapping(), original.mapping());
    assert_eq!(bits(&reopened), bits(&original));
}

#[test]
fn test_missing_snapshot_opens_empty() {
    let temp_dir = TempDir::new().unwrap();
    let index = FaceIndex::open(&config_in(&temp_dir)).unwrap();
    assert_eq!(index.count(), 0);
    assert_eq!(
        index.stats().snapshot_path,
        Some(temp_dir.path().join("data").join("faces.fidx"))
    );
}

#[test]
fn test_every_mutation_is_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let path = config.snapshot_path.clone().unwrap();
    let store = SnapshotStore::new(&path, DIM);
    let index = FaceIndex::open(&config).unwrap();
    let vectors = generate_unit_vectors(DIM, 2);

    index.add(vectors[0].clone(), "alice").unwrap();
    assert_eq!(store.load().unwrap().count(), 1);

    index.add(vectors[1].clone(), "bob").unwrap();
    assert_eq!(store.load().unwrap().count(), 2);

    index.remove("alice").unwrap();
    let on_disk = store.load().unwrap();
    assert_eq!(on_disk.count(), 1);
    assert!(on_disk.contains(&IdentityId::from("bob")));

    index.clear().unwrap();
    assert_eq!(store.load().unwrap().count(), 0);
    assert!(path.exists());
}

#[test]
fn test_save_leaves_no_temporary_files() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let index = FaceIndex::open(&config).unwrap();
    for v in generate_unit_vectors(DIM, 5) {
        index.add(v, "x").unwrap();
    }

    let names: Vec<String> = fs::read_dir(temp_dir.path().join("data"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["faces.fidx".to_string()]);
}

#[test]
fn test_garbage_snapshot_recovers_empty_and_is_quarantined() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let path = config.snapshot_path.clone().unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"definitely not a snapshot file").unwrap();

    let store = SnapshotStore::new(&path, DIM);
    assert!(matches!(
        store.load(),
        Err(FaceIndexError::CorruptSnapshot { .. })
    ));

    let index = FaceIndex::open(&config).unwrap();
    assert_eq!(index.count(), 0);
    assert!(!path.exists());
    assert!(store.quarantine_path().exists());

    // The recovered index is usable and persists normally.
    index
        .add(generate_unit_vectors(DIM, 1).remove(0), "alice")
        .unwrap();
    assert_eq!(store.load().unwrap().count(), 1);
}

#[test]
fn test_unknown_version_recovers_empty() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let path = config.snapshot_path.clone().unwrap();

    let mut index = VectorIndex::new(DIM);
    index
        .add(generate_unit_vectors(DIM, 1).remove(0), "alice".into())
        .unwrap();
    let mut bytes = encode_snapshot(&index);
    bytes[4..8].copy_from_slice(&2u32.to_le_bytes());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, &bytes).unwrap();

    let opened = FaceIndex::open(&config).unwrap();
    assert_eq!(opened.count(), 0);
}

#[test]
fn test_dimension_mismatch_is_corrupt() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("small.fidx");
    let small = SnapshotStore::new(&path, 4);
    let mut index = VectorIndex::new(4);
    index
        .add(vec![0.5f32, 0.5, 0.5, 0.5].into(), 1i64.into())
        .unwrap();
    small.save(&index).unwrap();

    let wide = SnapshotStore::new(&path, DIM);
    assert!(matches!(
        wide.load(),
        Err(FaceIndexError::CorruptSnapshot { .. })
    ));
}

#[test]
fn test_failed_write_rolls_back_mutations() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let data_dir = temp_dir.path().join("data");
    let index = FaceIndex::open(&config).unwrap();
    let vectors = generate_unit_vectors(DIM, 3);
    index.add(vectors[0].clone(), "alice").unwrap();

    // Replace the snapshot directory with a plain file so writes fail.
    fs::remove_dir_all(&data_dir).unwrap();
    fs::write(&data_dir, b"blocker").unwrap();

    let err = index.add(vectors[1].clone(), "bob").unwrap_err();
    assert!(matches!(err, FaceIndexError::PersistenceWriteFailure { .. }));
    assert_eq!(index.count(), 1);
    assert!(!index.contains("bob"));

    let err = index.remove("alice").unwrap_err();
    assert!(matches!(err, FaceIndexError::PersistenceWriteFailure { .. }));
    assert!(index.contains("alice"));

    let err = index.clear().unwrap_err();
    assert!(matches!(err, FaceIndexError::PersistenceWriteFailure { .. }));
    assert_eq!(index.count(), 1);

    let hits = index.search(vectors[0].as_slice().unwrap(), 1).unwrap();
    assert_eq!(hits[0].id, IdentityId::from("alice"));

    // Once the directory is writable again, mutations go through.
    fs::remove_file(&data_dir).unwrap();
    index.add(vectors[2].clone(), "carol").unwrap();
    assert_eq!(index.count(), 2);
    let on_disk = SnapshotStore::new(config.snapshot_path.as_ref().unwrap(), DIM)
        .load()
        .unwrap();
    assert_eq!(on_disk.count(), 2);
}
