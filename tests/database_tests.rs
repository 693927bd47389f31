use levelkv::{
    Backend, Database, Error, Level, MarshalKey, MarshalValue, MemoryBackend, SledBackend, State,
    Value, MEGABYTE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::tempdir;

// Integration tests for the database layer, run against every shipped engine.

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn open_fresh<B: Backend>(level: &Level<B>, path: &Path) -> Database<B> {
    let mut options = level.new_options();
    options
        .set_create_if_missing(true)
        .set_cache_size(500 * MEGABYTE);
    let mut db = Database::new();
    db.set_options(options).unwrap();
    level.open_database(&mut db, path).unwrap();
    db
}

fn alpha_beta_scenario<B: Backend>(level: &Level<B>, path: &Path) {
    let db = open_fresh(level, path);

    let mut write_atom = level.new_atom();
    write_atom.put("Alpha", "x").put("Beta", "y");
    db.commit(&mut write_atom).unwrap();

    assert_eq!(db.get("Alpha").unwrap(), Some(b"x".to_vec()));
    assert_eq!(db.get("Beta").unwrap(), Some(b"y".to_vec()));

    let mut delete_atom = level.new_atom();
    delete_atom.delete("Alpha").delete("Beta");
    db.commit(&mut delete_atom).unwrap();

    assert_eq!(db.get("Alpha").unwrap(), None);
    assert_eq!(db.get("Beta").unwrap(), None);
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_alpha_beta_memory() {
        init_logging();
        let level = Level::new(MemoryBackend::new());
        alpha_beta_scenario(&level, Path::new("leveldb"));
    }

    #[test]
    fn test_alpha_beta_sled() {
        init_logging();
        let temp_dir = tempdir().unwrap();
        let level = Level::new(SledBackend::new());
        alpha_beta_scenario(&level, &temp_dir.path().join("leveldb"));
    }

    /// Replays one sequence of operations and returns what every touched key
    /// reads back as.
    fn replay<B: Backend>(level: &Level<B>, path: &Path) -> Vec<(String, Option<Value>)> {
        let db = open_fresh(level, path);

        db.put("apple", "red").unwrap();
        db.put("banana", "yellow").unwrap();
        db.delete("apple").unwrap();

        let mut atom = level.new_atom();
        atom.put("cherry", "dark")
            .put("apple", "green")
            .delete("banana");
        db.write(&atom).unwrap();

        atom.clear().put("date", "brown");
        db.commit(&mut atom).unwrap();
        db.put("cherry", "bright").unwrap();

        ["apple", "banana", "cherry", "date", "elderberry"]
            .iter()
            .map(|key| (key.to_string(), db.get(key).unwrap()))
            .collect()
    }

    #[test]
    fn test_engines_agree() {
        init_logging();
        let temp_dir = tempdir().unwrap();

        let memory = replay(&Level::new(MemoryBackend::new()), Path::new("store"));
        let sled = replay(
            &Level::new(SledBackend::new()),
            &temp_dir.path().join("store"),
        );

        assert_eq!(memory, sled);
        assert_eq!(
            memory,
            vec![
                ("apple".to_string(), Some(b"green".to_vec())),
                ("banana".to_string(), None),
                ("cherry".to_string(), Some(b"bright".to_vec())),
                ("date".to_string(), Some(b"brown".to_vec())),
                ("elderberry".to_string(), None),
            ]
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    fn random_bytes(rng: &mut StdRng, max_len: usize) -> Vec<u8> {
        let len = rng.gen_range(0..=max_len);
        (0..len).map(|_| rng.gen()).collect()
    }

    #[test]
    fn test_put_then_get() {
        let level = Level::new(MemoryBackend::new());
        let db = open_fresh(&level, Path::new("props"));
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let key = random_bytes(&mut rng, 16);
            let value = random_bytes(&mut rng, 64);
            db.put(&key, &value).unwrap();
            assert_eq!(db.get(&key).unwrap(), Some(value));
        }
    }

    #[test]
    fn test_delete_then_get() {
        let level = Level::new(MemoryBackend::new());
        let db = open_fresh(&level, Path::new("props"));
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..500 {
            let key = random_bytes(&mut rng, 16);
            if rng.gen_bool(0.5) {
                db.put(&key, random_bytes(&mut rng, 8)).unwrap();
            }
            db.delete(&key).unwrap();
            assert_eq!(db.get(&key).unwrap(), None);
        }
    }

    #[test]
    fn test_atoms_match_model() {
        let temp_dir = tempdir().unwrap();
        let level = Level::new(SledBackend::new());
        let db = open_fresh(&level, &temp_dir.path().join("model"));
        let mut model: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        let mut rng = StdRng::seed_from_u64(23);

        for _ in 0..50 {
            let mut atom = level.new_atom();
            for _ in 0..rng.gen_range(1..10) {
                // a small key space so puts and deletes collide
                let key = vec![rng.gen_range(b'a'..=b'h')];
                if rng.gen_bool(0.7) {
                    let value = random_bytes(&mut rng, 8);
                    atom.put(&key, &value);
                    model.insert(key, value);
                } else {
                    atom.delete(&key);
                    model.remove(&key);
                }
            }
            db.commit(&mut atom).unwrap();
        }

        for key in b'a'..=b'h' {
            assert_eq!(db.get([key]).unwrap(), model.get(&vec![key]).cloned());
        }
    }
}

#[cfg(test)]
mod atomicity_tests {
    use super::*;

    #[test]
    fn test_failed_write_applies_nothing() {
        init_logging();
        let level = Level::new(MemoryBackend::new());
        let db = open_fresh(&level, Path::new("atomic"));
        db.put("k0", "before").unwrap();

        let mut atom = level.new_atom();
        for i in 0..10 {
            atom.put(format!("k{}", i), format!("v{}", i));
        }
        level.backend().fail_next_write_after(5);

        let err = db.write(&atom).unwrap_err();
        assert!(err.is_backend());
        assert_eq!(db.get("k0").unwrap(), Some(b"before".to_vec()));
        for i in 1..10 {
            assert_eq!(db.get(format!("k{}", i)).unwrap(), None);
        }

        // write never releases the atom: the same atom can be retried
        assert!(!atom.is_closed());
        db.write(&atom).unwrap();
        assert_eq!(db.get("k9").unwrap(), Some(b"v9".to_vec()));
    }

    #[test]
    fn test_commit_releases_on_failure() {
        let level = Level::new(MemoryBackend::new());
        let db = open_fresh(&level, Path::new("atomic"));

        let mut atom = level.new_atom();
        atom.put("a", "1").put("b", "2");
        level.backend().fail_next_write_after(1);

        assert!(db.commit(&mut atom).is_err());
        assert!(atom.is_closed());
        assert!(atom.inner().is_none());
        atom.close();

        assert_eq!(db.get("a").unwrap(), None);
        assert!(matches!(
            db.commit(&mut atom),
            Err(Error::Released { resource: "atom" })
        ));
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_unopened_database() {
        let level = Level::new(MemoryBackend::new());
        let mut db: Database<MemoryBackend> = Database::new();
        let mut atom = level.new_atom();
        atom.put("k", "v");

        assert!(matches!(db.get("k"), Err(Error::NotOpened)));
        assert!(matches!(db.put("k", "v"), Err(Error::NotOpened)));
        assert!(matches!(db.delete("k"), Err(Error::NotOpened)));
        assert!(matches!(db.write(&atom), Err(Error::NotOpened)));
        assert!(matches!(db.commit(&mut atom), Err(Error::NotOpened)));
        assert!(atom.is_closed());
        db.close().unwrap();
    }

    #[test]
    fn test_reopen_rejected() {
        let temp_dir = tempdir().unwrap();
        let level = Level::new(SledBackend::new());
        let mut db = open_fresh(&level, &temp_dir.path().join("one"));
        db.put("k", "v").unwrap();

        assert!(matches!(
            level.open_database(&mut db, temp_dir.path().join("two")),
            Err(Error::AlreadyOpen)
        ));
        assert!(!temp_dir.path().join("two").exists());
        assert_eq!(db.get("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_close_everything_twice() {
        let level = Level::new(MemoryBackend::new());

        let mut cache = level.new_cache(MEGABYTE);
        cache.close();
        cache.close();

        let mut options = level.new_options();
        options.set_create_if_missing(true).set_cache_size(MEGABYTE);
        let mut read_options = level.new_read_options();
        read_options.set_verify_checksums(true);
        let mut write_options = level.new_write_options();
        write_options.set_sync(true);

        let mut db = Database::new();
        db.set_options(options)
            .unwrap()
            .set_read_options(read_options)
            .unwrap()
            .set_write_options(write_options)
            .unwrap();
        level.open_database(&mut db, "store").unwrap();
        db.put("k", "v").unwrap();
        assert_eq!(db.get("k").unwrap(), Some(b"v".to_vec()));

        db.close().unwrap();
        db.close().unwrap();
        assert_eq!(db.options().unwrap().state(), State::Released);

        // the data outlives the connection in the memory engine
        let db = open_fresh(&level, Path::new("store"));
        assert_eq!(db.get("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_sled_persists_across_reopen() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("persist");
        let level = Level::new(SledBackend::new());

        {
            let mut db = open_fresh(&level, &path);
            db.put("durable", "yes").unwrap();
            db.close().unwrap();
        }

        let mut options = level.new_options();
        options.set_create_if_missing(false);
        let db = level.open(&path, options).unwrap();
        assert_eq!(db.get("durable").unwrap(), Some(b"yes".to_vec()));
    }

    #[test]
    fn test_destroy_and_repair_support() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("doomed");
        let level = Level::new(SledBackend::new());
        {
            let db = open_fresh(&level, &path);
            db.put("k", "v").unwrap();
        }

        let mut options = level.new_options();
        assert!(matches!(
            level.repair_database(&path, &mut options),
            Err(Error::Unsupported {
                backend: "sled",
                operation: "repair"
            })
        ));
        level.destroy_database(&path, &mut options).unwrap();
        assert!(!path.exists());
    }
}

#[cfg(test)]
mod object_atom_tests {
    use super::*;

    struct Reading {
        sensor: u32,
        celsius: i16,
    }

    impl MarshalKey for Reading {
        fn marshal_key(&self) -> Vec<u8> {
            format!("sensor/{:04}", self.sensor).into_bytes()
        }
    }

    impl MarshalValue for Reading {
        fn marshal_value(&self) -> Vec<u8> {
            self.celsius.to_be_bytes().to_vec()
        }
    }

    #[test]
    fn test_place_and_delete_objects() {
        let level = Level::new(MemoryBackend::new());
        let db = open_fresh(&level, Path::new("objects"));

        let readings = [
            Reading {
                sensor: 1,
                celsius: 21,
            },
            Reading {
                sensor: 2,
                celsius: -4,
            },
        ];

        let mut atom = level.new_atom();
        for reading in &readings {
            atom.object().place(reading);
        }
        db.commit(&mut atom).unwrap();
        assert_eq!(
            db.get("sensor/0002").unwrap(),
            Some((-4i16).to_be_bytes().to_vec())
        );

        let mut atom = level.new_atom();
        atom.object().delete(&readings[0]).put("note", "one left");
        db.commit(&mut atom).unwrap();
        assert_eq!(db.get("sensor/0001").unwrap(), None);
        assert_eq!(db.get("note").unwrap(), Some(b"one left".to_vec()));
    }
}
