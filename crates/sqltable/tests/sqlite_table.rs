//! End-to-end table operations against a SQLite file.
#![cfg(feature = "sqlite")]

use sqltable::{Dialect, FieldType, SqliteConnector, Table, Value, exec_sql};
use tempfile::TempDir;

async fn setup() -> (TempDir, SqliteConnector) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("app.db");
    let connector = SqliteConnector::new().with_default_database(path.to_string_lossy());

    exec_sql(
        &connector,
        "",
        Dialect::Sqlite,
        "create table users (id integer primary key autoincrement, name text not null, age integer, joined date)",
    )
    .await
    .expect("create table");

    (dir, connector)
}

#[tokio::test]
async fn crud_round_trip() {
    let (_dir, connector) = setup().await;
    let mut users = Table::new(connector, "users");

    let env = users
        .insert(
            "name, age, joined",
            &[Value::from("ann"), Value::Int(31), Value::from("2024-01-02")],
        )
        .await;
    assert!(env.is_success(), "{env:?}");
    assert_eq!(env.insert_records, 1);
    assert_eq!(env.last_insert_id, 1);

    let env = users
        .insert("(name, age)", &[Value::from("bob"), Value::Null])
        .await;
    assert!(env.is_success(), "{env:?}");
    assert_eq!(env.last_insert_id, 2);
    assert_eq!(users.current_dialect(), Some(Dialect::Sqlite));

    let env = users.get("id, name, age", "", "id", 0, 0).await;
    assert!(env.is_success(), "{env:?}");
    assert_eq!(env.get_records, 2);
    assert_eq!(env.rows()[0].get("name"), Some(&Value::from("ann")));
    assert_eq!(env.rows()[1].get("age"), Some(&Value::Null));

    let env = users
        .update(
            &["name", "age"],
            &[Value::from("o'neil"), Value::Int(40)],
            &[FieldType::Text, FieldType::Number],
            "id = 2",
        )
        .await;
    assert!(env.is_success(), "{env:?}");
    assert_eq!(env.update_records, 1);

    let env = users.get("name, age", "id = 2", "", 0, 0).await;
    assert_eq!(env.rows()[0].get("name"), Some(&Value::from("o'neil")));
    assert_eq!(env.rows()[0].get("age"), Some(&Value::Int(40)));

    let env = users.delete("id = 1").await;
    assert!(env.is_success(), "{env:?}");
    assert_eq!(env.delete_records, 1);

    let env = users.delete("id = 1").await;
    assert_eq!(env.status_code, 500);
    assert_eq!(env.message, "0 rows affected");
}

#[tokio::test]
async fn pagination_and_portable_functions() {
    let (_dir, connector) = setup().await;
    let mut users = Table::new(connector, "users");
    for name in ["a", "b", "c", "d"] {
        let env = users.insert("name", &[Value::from(name)]).await;
        assert!(env.is_success(), "{env:?}");
    }

    let env = users.get("name", "", "id", 1, 2).await;
    let names: Vec<_> = env.rows().iter().filter_map(|r| r.get("name")).collect();
    assert_eq!(names, vec![&Value::from("b"), &Value::from("c")]);

    let env = users.get("ucase(name) as up", "", "rand()", 0, 1).await;
    assert!(env.is_success(), "{env:?}");
    assert_eq!(env.get_records, 1);
    assert!(env.rows()[0].contains("up"));
}

#[tokio::test]
async fn driver_errors_are_reported_in_the_envelope() {
    let (_dir, connector) = setup().await;
    let mut missing = Table::new(connector.clone(), "missing");

    let env = missing.get("*", "", "", 0, 0).await;
    assert_eq!(env.status_code, 500);
    assert_eq!(env.message, "Get error");
    assert_eq!(env.error_message, "no such table: missing");

    let mut users = Table::new(connector, "users");
    let env = users.insert("age", &[Value::Int(3)]).await;
    assert_eq!(env.message, "Insert error");
    assert!(env.error_message.contains("NOT NULL"), "{env:?}");
}

#[tokio::test]
async fn named_database_overrides_the_default() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("other.db");
    let path = path.to_string_lossy().into_owned();
    let connector = SqliteConnector::new();

    exec_sql(&connector, &path, Dialect::Sqlite, "create table kv (k text, v text)")
        .await
        .expect("create table");

    let mut kv = Table::new(connector, "kv").database(&path);
    let env = kv.insert("k, v", &[Value::from("a"), Value::from("1")]).await;
    assert!(env.is_success(), "{env:?}");

    let env = kv.get("v", "k = 'a'", "", 0, 0).await;
    assert_eq!(env.rows()[0].get("v"), Some(&Value::from("1")));
}
