//! End-to-end scenarios run through `Database::execute`, one fresh data
//! directory per test.

use common::{Config, DbError};
use database::Database;
use tempfile::{tempdir, TempDir};

fn fresh(cache_limit: usize) -> (TempDir, Database) {
    let dir = tempdir().unwrap();
    let config = Config::builder()
        .data_dir(dir.path().to_path_buf())
        .cache_limit(cache_limit)
        .build();
    let db = Database::new(&config);
    (dir, db)
}

#[test]
fn s1_create_and_insert() {
    let (_dir, db) = fresh(50);
    db.execute("CREATE t { a INT, b STRING 8 }").unwrap();
    db.execute("INSERT INTO t VALUES (7, \"hi\")").unwrap();
    let out = db.execute("SELECT * FROM t").unwrap();
    assert!(out.starts_with("{ ["));
    assert!(out.contains('7'));
    assert!(out.contains("hi"));
    assert!(out.ends_with("] }"));
}

#[test]
fn s2_delete_then_reuse() {
    let (_dir, db) = fresh(50);
    db.execute("CREATE t { a INT }").unwrap();
    db.execute("INSERT INTO t VALUES (1)").unwrap();
    db.execute("INSERT INTO t VALUES (2)").unwrap();
    db.execute("DELETE FROM t WHERE a == 1").unwrap();
    db.execute("INSERT INTO t VALUES (3)").unwrap();
    let out = db.execute("SELECT * FROM t").unwrap();
    assert!(out.contains('2'));
    assert!(out.contains('3'));
    assert!(!out.contains('1'));
}

#[test]
fn s3_predicate_scan() {
    let (_dir, db) = fresh(50);
    db.execute("CREATE t { a INT, b INT }").unwrap();
    db.execute("INSERT INTO t VALUES (1, 10)").unwrap();
    db.execute("INSERT INTO t VALUES (2, 20)").unwrap();
    db.execute("INSERT INTO t VALUES (3, 30)").unwrap();
    let out = db.execute("SELECT a FROM t WHERE b >= 20").unwrap();
    assert_eq!(out, "{ [2,][3,] }");
}

#[test]
fn s4_drop_then_select_fails() {
    let (_dir, db) = fresh(50);
    db.execute("CREATE t { a INT }").unwrap();
    db.execute("DROP t").unwrap();
    let err = db.execute("SELECT * FROM t").unwrap_err();
    assert!(matches!(err, DbError::NoSuchTable(name) if name == "t"));
}

#[test]
fn s5_type_mismatch_leaves_table_empty() {
    let (_dir, db) = fresh(50);
    db.execute("CREATE t { a INT }").unwrap();
    let err = db.execute("INSERT INTO t VALUES (\"abc\")").unwrap_err();
    assert!(matches!(err, DbError::WrongType { .. }));
    let out = db.execute("SELECT * FROM t").unwrap();
    assert_eq!(out, "{  }");
}

#[test]
fn s6_eviction_flushes_dirty_pages_across_reopen() {
    let dir = tempdir().unwrap();
    let config = Config::builder()
        .data_dir(dir.path().to_path_buf())
        .cache_limit(1)
        .build();

    {
        let db = Database::new(&config);
        db.execute("CREATE t { a INT, b STRING 32 }").unwrap();
        for i in 0..20 {
            db.execute(&format!("INSERT INTO t VALUES ({i}, \"row\")"))
                .unwrap();
        }
    }

    let reopened = Database::new(&config);
    let out = reopened.execute("SELECT a FROM t").unwrap();
    for i in 0..20 {
        assert!(out.contains(&format!("[{i},]")), "missing row {i} in {out}");
    }
}
