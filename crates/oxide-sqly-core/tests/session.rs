//! Session operations against a recording mock connection.

mod common;

use std::collections::HashMap;

use common::{session, text, ResultSet};
use oxide_sqly_core::{args, AnyDialect, DbValue, Session, SqlyError};
use oxide_sqly_derive::Record;

#[derive(Debug, Default, PartialEq, Record)]
struct Profile {
    #[column(name = "avatar")]
    avatar: String,
    #[column(name = "bio")]
    bio: Option<String>,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Member {
    id: i64,
    name: String,
    profile: Profile,
}

// =============================================================================
// Query and get
// =============================================================================

#[tokio::test]
async fn test_scalar_rows_keep_cursor_order() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.push_result(
        ResultSet::new(&["name"])
            .row(vec![text("carol")])
            .row(vec![text("alice")])
            .row(vec![text("bob")]),
    );

    let names: Vec<String> = db
        .query("SELECT name FROM user WHERE status=?", &args![1])
        .await
        .unwrap();

    assert_eq!(names, vec!["carol", "alice", "bob"]);
    assert_eq!(conn.log(), vec!["SELECT name FROM user WHERE status=1"]);
    assert_eq!(conn.closes(), 1);
}

#[tokio::test]
async fn test_nested_record_binds_without_aliases() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.push_result(
        ResultSet::new(&["id", "name", "avatar", "bio"])
            .row(vec![
                DbValue::Int(1),
                text("ada"),
                text("a.png"),
                DbValue::Null,
            ])
            .row(vec![
                DbValue::Int(2),
                text("alan"),
                text("b.png"),
                text("math"),
            ]),
    );

    let members: Vec<Member> = db
        .query("SELECT id, name, avatar, bio FROM member", &[])
        .await
        .unwrap();

    assert_eq!(members.len(), 2);
    assert_eq!(members[0].profile.avatar, "a.png");
    assert_eq!(members[0].profile.bio, None);
    assert_eq!(members[1].profile.bio.as_deref(), Some("math"));
}

#[tokio::test]
async fn test_query_into_appends() {
    let (mut db, conn) = session(AnyDialect::Sqlite);
    conn.push_result(ResultSet::new(&["n"]).row(vec![DbValue::Int(7)]));

    let mut dest = vec![1_i64, 2, 3];
    db.query_into(&mut dest, "SELECT n FROM t", &[]).await.unwrap();
    assert_eq!(dest, vec![1, 2, 3, 7]);

    let ids: Vec<i64> = Vec::new();
    db.query_into(&mut dest, "SELECT n FROM t WHERE id IN ?", &args![ids])
        .await
        .unwrap();
    assert_eq!(dest, vec![1, 2, 3, 7]);
}

#[tokio::test]
async fn test_query_into_map_rows() {
    let (mut db, conn) = session(AnyDialect::Sqlite);
    conn.push_result(ResultSet::new(&["id", "tag"]).row(vec![DbValue::Int(3), text("x")]));

    let rows: Vec<HashMap<String, DbValue>> = db.query("SELECT id, tag FROM t", &[]).await.unwrap();
    assert_eq!(rows[0]["id"], DbValue::Int(3));
    assert_eq!(rows[0]["tag"], text("x"));
}

#[tokio::test]
async fn test_get_single_row() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.push_result(ResultSet::new(&["n"]).row(vec![DbValue::Int(12)]));

    let n: i64 = db.get("SELECT COUNT(*) AS n FROM t", &[]).await.unwrap();
    assert_eq!(n, 12);
}

#[tokio::test]
async fn test_get_without_rows() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.push_result(ResultSet::new(&["n"]));

    let err = db.get::<i64>("SELECT n FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, SqlyError::EmptyResult));
    assert_eq!(conn.closes(), 1);
}

#[tokio::test]
async fn test_get_detects_second_row_without_scanning_it() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.push_result(
        ResultSet::new(&["n"])
            .row(vec![DbValue::Int(1)])
            .row(vec![DbValue::Int(2)]),
    );

    let err = db.get::<i64>("SELECT n FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, SqlyError::MultipleResults));
    assert_eq!(conn.scans(), 1);
    assert_eq!(conn.closes(), 1);
}

#[tokio::test]
async fn test_scalar_needs_one_column() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.push_result(ResultSet::new(&["a", "b"]).row(vec![DbValue::Int(1), DbValue::Int(2)]));

    let err = db.query::<i64>("SELECT a, b FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, SqlyError::InvalidContainer(_)));
    assert_eq!(conn.closes(), 1);
}

#[tokio::test]
async fn test_unmapped_column_fails() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.push_result(ResultSet::new(&["id", "email"]).row(vec![DbValue::Int(1), DbValue::Null]));

    let err = db
        .query::<Member>("SELECT id, email FROM member", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlyError::FieldsMatch { column } if column == "email"));
}

// =============================================================================
// Cursor close
// =============================================================================

#[tokio::test]
async fn test_close_failure_after_success_is_a_leak() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.fail_close();
    conn.push_result(ResultSet::new(&["n"]).row(vec![DbValue::Int(1)]));

    let err = db.query::<i64>("SELECT n FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, SqlyError::CursorLeak(_)));
}

#[tokio::test]
async fn test_earlier_error_wins_over_close_failure() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.fail_close();
    conn.push_result(ResultSet::new(&["n"]));

    let err = db.get::<i64>("SELECT n FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, SqlyError::EmptyResult));

    let mut dest = vec![5_i64];
    conn.push_result(ResultSet::new(&["n"]).row(vec![DbValue::Int(1)]));
    let err = db.query_into(&mut dest, "SELECT n FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, SqlyError::CursorLeak(_)));
    assert_eq!(dest, vec![5]);
}

// =============================================================================
// Empty list arguments
// =============================================================================

#[tokio::test]
async fn test_empty_list_short_circuits() {
    let (mut db, conn) = session(AnyDialect::MySql);
    let ids: Vec<i64> = Vec::new();

    let rows: Vec<i64> = db
        .query("SELECT id FROM t WHERE id IN ?", &args![ids.clone()])
        .await
        .unwrap();
    assert!(rows.is_empty());

    let err = db
        .get::<i64>("SELECT id FROM t WHERE id IN ?", &args![ids.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlyError::EmptyResult));

    let err = db
        .delete("DELETE FROM t WHERE id IN ?", &args![ids])
        .await
        .unwrap_err();
    assert!(err.is_empty_array());

    assert!(conn.log().is_empty());
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_insert_reports_outcome() {
    let (mut db, conn) = session(AnyDialect::MySql);

    let affected = db
        .insert("INSERT INTO user (name, mobile) VALUES (?, ?)", &args!["it's", "187"])
        .await
        .unwrap();

    assert_eq!(affected.last_insert_id().unwrap(), 41);
    assert_eq!(affected.rows_affected().unwrap(), 2);
    assert_eq!(
        conn.log(),
        vec![r"INSERT INTO user (name, mobile) VALUES ('it\'s', '187')"]
    );
}

#[tokio::test]
async fn test_update_with_in_list() {
    let (mut db, conn) = session(AnyDialect::Sqlite);

    db.update(
        "UPDATE user SET status=? WHERE mobile=? AND role IN ?",
        &args![0, "18712342345", vec![0_i64, 1, 2]],
    )
    .await
    .unwrap();

    assert_eq!(
        conn.log(),
        vec!["UPDATE user SET status=0 WHERE mobile='18712342345' AND role IN (0,1,2)"]
    );
}

#[tokio::test]
async fn test_insert_many_builds_one_statement() {
    let (mut db, conn) = session(AnyDialect::MySql);

    db.insert_many(
        "INSERT INTO t (a,b) VALUES (?,?)",
        &[args![1, "x"], args![2, "y"]],
    )
    .await
    .unwrap();

    assert_eq!(conn.log(), vec!["INSERT INTO t (a,b) VALUES (1,'x'),(2,'y');"]);
}

#[tokio::test]
async fn test_update_many_joins_statements() {
    let (mut db, conn) = session(AnyDialect::MySql);

    db.update_many(
        "UPDATE t SET a=? WHERE id=?",
        &[args![1, 10], args![2, 20]],
    )
    .await
    .unwrap();

    assert_eq!(
        conn.log(),
        vec!["UPDATE t SET a=1 WHERE id=10;UPDATE t SET a=2 WHERE id=20;"]
    );
}

#[tokio::test]
async fn test_format_errors_are_returned_before_execution() {
    let (mut db, conn) = session(AnyDialect::MySql);

    let err = db
        .exec("UPDATE t SET a=? WHERE b=?", &args![1])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SqlyError::StatementFormat {
            placeholders: 2,
            arguments: 1
        }
    ));
    assert!(conn.log().is_empty());
}

#[tokio::test]
async fn test_exec_returning() {
    let (mut db, conn) = session(AnyDialect::MySql);
    let err = db
        .exec_returning("id", "INSERT INTO t (a) VALUES (?)", &args![1])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlyError::UnsupportedByDialect { .. }));
    assert!(conn.log().is_empty());

    let (mut db, conn) = session(AnyDialect::Postgres);
    conn.push_result(ResultSet::new(&["id"]).row(vec![DbValue::Int(99)]));
    let affected = db
        .exec_returning("id", "INSERT INTO t (a) VALUES (?)", &args![true])
        .await
        .unwrap();
    assert_eq!(affected.last_insert_id().unwrap(), 99);
    assert!(affected.rows_affected().is_err());
    assert_eq!(
        conn.log(),
        vec!["INSERT INTO t (a) VALUES ('t') RETURNING id"]
    );
}

#[tokio::test]
async fn test_exec_returning_takes_first_of_many_rows() {
    let (mut db, conn) = session(AnyDialect::Sqlite);
    conn.push_result(
        ResultSet::new(&["id"])
            .row(vec![DbValue::Int(1)])
            .row(vec![DbValue::Int(2)])
            .row(vec![DbValue::Int(3)]),
    );
    let affected = db
        .exec_returning("id", "UPDATE t SET a = ? WHERE id IN ?", &args!["x", vec![1_i64, 2, 3]])
        .await
        .unwrap();
    assert_eq!(affected.last_insert_id().unwrap(), 1);
    assert_eq!(conn.closes(), 1);
    assert_eq!(
        conn.log(),
        vec!["UPDATE t SET a = 'x' WHERE id IN (1,2,3) RETURNING id"]
    );
}

// =============================================================================
// Transactions
// =============================================================================

#[tokio::test]
async fn test_exec_many_runs_in_a_transaction() {
    let (mut db, conn) = session(AnyDialect::MySql);

    db.exec_many(&["CREATE TABLE a (x INT)", "INSERT INTO a VALUES (1)"])
        .await
        .unwrap();

    assert_eq!(
        conn.log(),
        vec![
            "BEGIN",
            "CREATE TABLE a (x INT)",
            "INSERT INTO a VALUES (1)",
            "COMMIT"
        ]
    );
}

#[tokio::test]
async fn test_exec_many_stops_and_rolls_back() {
    let (mut db, conn) = session(AnyDialect::MySql);
    conn.fail_on("bad");

    let err = db
        .exec_many(&["INSERT INTO a VALUES (1)", "bad statement", "INSERT INTO a VALUES (2)"])
        .await
        .unwrap_err();

    assert!(matches!(err, SqlyError::ExecMany { ref statement, .. } if statement == "bad statement"));
    assert_eq!(
        conn.log(),
        vec!["BEGIN", "INSERT INTO a VALUES (1)", "bad statement", "ROLLBACK"]
    );
}

#[tokio::test]
async fn test_transaction_commits_on_ok() {
    let (mut db, conn) = session(AnyDialect::Sqlite);

    let id = db
        .transaction(|tx| {
            Box::pin(async move {
                let affected = tx.insert("INSERT INTO t (a) VALUES (?)", &args![1]).await?;
                affected.last_insert_id()
            })
        })
        .await
        .unwrap();

    assert_eq!(id, 41);
    assert_eq!(conn.log(), vec!["BEGIN", "INSERT INTO t (a) VALUES (1)", "COMMIT"]);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_err() {
    let (mut db, conn) = session(AnyDialect::Sqlite);
    conn.fail_on("b");

    let err = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.exec("INSERT INTO a VALUES (?)", &args![1]).await?;
                tx.exec("INSERT INTO b VALUES (?)", &args![2]).await?;
                Ok::<_, SqlyError>(())
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SqlyError::Driver(_)));
    assert_eq!(
        conn.log(),
        vec![
            "BEGIN",
            "INSERT INTO a VALUES (1)",
            "INSERT INTO b VALUES (2)",
            "ROLLBACK"
        ]
    );
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    let (mut db, conn) = session(AnyDialect::Sqlite);

    {
        let mut tx = db.begin().await.unwrap();
        tx.exec("DELETE FROM t", &[]).await.unwrap();
    }

    assert_eq!(conn.log(), vec!["BEGIN", "DELETE FROM t", "ROLLBACK"]);
}

async fn count_rows(session: &mut impl Session) -> i64 {
    session.get("SELECT COUNT(*) FROM t", &[]).await.unwrap()
}

#[tokio::test]
async fn test_same_code_runs_on_connection_and_transaction() {
    let (mut db, conn) = session(AnyDialect::Sqlite);
    conn.push_result(ResultSet::new(&["n"]).row(vec![DbValue::Int(1)]));
    conn.push_result(ResultSet::new(&["n"]).row(vec![DbValue::Int(2)]));

    assert_eq!(count_rows(&mut db).await, 1);
    let mut tx = db.begin().await.unwrap();
    assert_eq!(count_rows(&mut tx).await, 2);
    tx.commit().await.unwrap();
}
