//! End-to-end tests against an in-memory SQLite database.

use std::collections::HashMap;

use chrono::NaiveDate;
use oxide_sqly_core::{args, DbValue, Options, Session, Sqly, SqlyError};
use oxide_sqly_derive::Record;
use oxide_sqly_sqlite::{connect, SqliteExecutor};

const SCHEMA: &str = r#"
CREATE TABLE user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    mobile TEXT,
    role INTEGER NOT NULL DEFAULT 0,
    avatar TEXT,
    city TEXT
)
"#;

async fn create_test_db() -> Sqly<SqliteExecutor> {
    let options = Options {
        max_open_conns: 1,
        ..Options::new("sqlite", ":memory:")
    };
    let mut db = connect(&options).await.unwrap();
    db.exec(SCHEMA, &[]).await.unwrap();
    db
}

async fn seed(db: &mut Sqly<SqliteExecutor>) {
    db.insert_many(
        "INSERT INTO user (name, mobile, role, avatar, city) VALUES (?, ?, ?, ?, ?)",
        &[
            args!["carol", "100", 1, "c.png", "Oslo"],
            args!["alice", "200", 2, "a.png", None::<String>],
            args!["bob", None::<String>, 0, None::<String>, None::<String>],
        ],
    )
    .await
    .unwrap();
}

#[derive(Debug, Default, PartialEq, Record)]
struct Card {
    avatar: Option<String>,
    city: Option<String>,
}

#[derive(Debug, Default, PartialEq, Record)]
struct User {
    id: i64,
    name: String,
    card: Card,
}

#[tokio::test]
async fn test_scalar_query_preserves_order() {
    let mut db = create_test_db().await;
    seed(&mut db).await;

    let names: Vec<String> = db
        .query("SELECT name FROM user ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(names, vec!["carol", "alice", "bob"]);
}

#[tokio::test]
async fn test_nested_record_query() {
    let mut db = create_test_db().await;
    seed(&mut db).await;

    let users: Vec<User> = db
        .query(
            "SELECT id, name, avatar, city FROM user WHERE role IN ? ORDER BY id",
            &args![vec![1_i64, 2]],
        )
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(
        users[0],
        User {
            id: 1,
            name: String::from("carol"),
            card: Card {
                avatar: Some(String::from("c.png")),
                city: Some(String::from("Oslo")),
            },
        }
    );
    assert_eq!(users[1].card.city, None);
}

#[tokio::test]
async fn test_empty_result_binds_to_empty_vec() {
    let mut db = create_test_db().await;

    let names: Vec<String> = db.query("SELECT name FROM user", &[]).await.unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn test_get_cardinality() {
    let mut db = create_test_db().await;
    seed(&mut db).await;

    let name: String = db
        .get("SELECT name FROM user WHERE mobile=?", &args!["200"])
        .await
        .unwrap();
    assert_eq!(name, "alice");

    let err = db
        .get::<String>("SELECT name FROM user WHERE mobile=?", &args!["999"])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlyError::EmptyResult));

    let err = db
        .get::<String>("SELECT name FROM user", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlyError::MultipleResults));
}

#[tokio::test]
async fn test_insert_and_update_report() {
    let mut db = create_test_db().await;

    let affected = db
        .insert("INSERT INTO user (name, mobile) VALUES (?, ?)", &args!["it's me", "1"])
        .await
        .unwrap();
    assert_eq!(affected.last_insert_id().unwrap(), 1);
    assert_eq!(affected.rows_affected().unwrap(), 1);

    seed(&mut db).await;
    let affected = db
        .update("UPDATE user SET role=? WHERE role=?", &args![5, 0])
        .await
        .unwrap();
    assert_eq!(affected.rows_affected().unwrap(), 2);

    let name: String = db
        .get("SELECT name FROM user WHERE id=?", &args![1])
        .await
        .unwrap();
    assert_eq!(name, "it's me");
}

#[tokio::test]
async fn test_update_many_and_delete() {
    let mut db = create_test_db().await;
    seed(&mut db).await;

    db.update_many(
        "UPDATE user SET role=? WHERE name=?",
        &[args![7, "carol"], args![8, "bob"]],
    )
    .await
    .unwrap();
    let roles: Vec<i64> = db
        .query("SELECT role FROM user ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(roles, vec![7, 2, 8]);

    let affected = db
        .delete("DELETE FROM user WHERE role IN ?", &args![vec![7_i64, 8]])
        .await
        .unwrap();
    assert_eq!(affected.rows_affected().unwrap(), 2);
}

#[tokio::test]
async fn test_exec_returning() {
    let mut db = create_test_db().await;
    seed(&mut db).await;

    let affected = db
        .exec_returning("id", "INSERT INTO user (name) VALUES (?)", &args!["dave"])
        .await
        .unwrap();
    assert_eq!(affected.last_insert_id().unwrap(), 4);
}

#[tokio::test]
async fn test_exec_returning_many_rows() {
    let mut db = create_test_db().await;
    seed(&mut db).await;

    let affected = db
        .exec_returning(
            "id",
            "UPDATE user SET name = ? WHERE id IN ?",
            &args!["zz", vec![1_i64, 2]],
        )
        .await
        .unwrap();
    let id = affected.last_insert_id().unwrap();
    assert!(id == 1 || id == 2);

    let names: Vec<String> = db
        .query("SELECT name FROM user ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(names, vec!["zz", "zz", "bob"]);
}

#[tokio::test]
async fn test_transaction_commit_and_rollback() {
    let mut db = create_test_db().await;

    db.transaction(|tx| {
        Box::pin(async move {
            tx.insert("INSERT INTO user (name) VALUES (?)", &args!["kept"])
                .await?;
            Ok::<_, SqlyError>(())
        })
    })
    .await
    .unwrap();

    let err = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.insert("INSERT INTO user (name) VALUES (?)", &args!["dropped"])
                    .await?;
                tx.exec("INSERT INTO missing_table VALUES (1)", &[]).await?;
                Ok::<_, SqlyError>(())
            })
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SqlyError::Driver(_)));

    let names: Vec<String> = db.query("SELECT name FROM user", &[]).await.unwrap();
    assert_eq!(names, vec!["kept"]);
}

#[tokio::test]
async fn test_exec_many_is_atomic() {
    let mut db = create_test_db().await;

    let err = db
        .exec_many(&[
            "INSERT INTO user (name) VALUES ('one')",
            "INSERT INTO nowhere VALUES (1)",
        ])
        .await
        .unwrap_err();
    assert!(
        matches!(err, SqlyError::ExecMany { ref statement, .. } if statement.contains("nowhere"))
    );

    let count: i64 = db.get("SELECT COUNT(*) FROM user", &[]).await.unwrap();
    assert_eq!(count, 0);

    db.exec_many(&[
        "INSERT INTO user (name) VALUES ('one')",
        "INSERT INTO user (name) VALUES ('two')",
    ])
    .await
    .unwrap();
    let count: i64 = db.get("SELECT COUNT(*) FROM user", &[]).await.unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_map_rows_use_declared_types() {
    let mut db = create_test_db().await;
    seed(&mut db).await;

    let rows: Vec<HashMap<String, DbValue>> = db
        .query("SELECT id, name, mobile FROM user ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["id"], DbValue::Int(1));
    assert_eq!(rows[0]["name"], DbValue::Text(String::from("carol")));
    assert_eq!(rows[2]["mobile"], DbValue::Null);
}

#[tokio::test]
async fn test_bytes_and_dates() {
    let mut db = create_test_db().await;
    db.exec("CREATE TABLE doc (body BLOB, created TEXT)", &[])
        .await
        .unwrap();

    let created = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_opt(13, 45, 0)
        .unwrap();
    db.insert(
        "INSERT INTO doc (body, created) VALUES (?, ?)",
        &args![vec![0_u8, 159, 255], created],
    )
    .await
    .unwrap();

    let body: Vec<u8> = db.get("SELECT body FROM doc", &[]).await.unwrap();
    assert_eq!(body, vec![0, 159, 255]);
    let read: chrono::NaiveDateTime = db.get("SELECT created FROM doc", &[]).await.unwrap();
    assert_eq!(read, created);
}

#[tokio::test]
async fn test_connect_rejects_other_drivers() {
    let err = connect(&Options::new("mysql", ":memory:")).await.unwrap_err();
    assert!(matches!(err, SqlyError::Config(_)));
}
