mod common;

use std::time::Duration;

use common::{drop_table, mysql_props, run_sql, table, text, values};
use kvbench_mysql::cancel::with_deadline;
use kvbench_mysql::{ConnectionMode, KvBenchError, KvDb, MysqlAdapter};
use mysql_async::prelude::Queryable;
use tokio::time::Instant;

#[tokio::test]
async fn test2_persistent_session_pins_one_connection() -> Result<(), KvBenchError> {
    let Some(props) = mysql_props("pin") else {
        return Ok(());
    };
    let adapter = MysqlAdapter::new(&props).await?;
    let table = table(&adapter);
    let mut session = adapter.init_thread(0, 1).await?;
    assert_eq!(session.mode(), ConnectionMode::Persistent);

    let first = adapter.connection_id(&mut session).await?;
    adapter
        .insert(&mut session, &table, "user1", &values(&[("FIELD0", "a")]))
        .await?;
    adapter.read(&mut session, &table, "user1", None).await?;
    adapter.read(&mut session, &table, "user1", None).await?;
    assert_eq!(adapter.connection_id(&mut session).await?, first);

    // CONNECTION_ID, insert and read: repeated text reuses its statement
    assert_eq!(session.cached_statements(), 3);

    let status = adapter.pool().status();
    assert_eq!(status.max_open, Some(8));
    assert_eq!(status.max_idle, 5);

    adapter.cleanup_thread(session).await;
    assert_eq!(adapter.pool().status().idle, 1);

    drop_table(&adapter).await?;
    adapter.close().await;
    Ok(())
}

#[tokio::test]
async fn test2_short_mode_never_reuses_a_connection() -> Result<(), KvBenchError> {
    let Some(props) = mysql_props("short") else {
        return Ok(());
    };
    let adapter = MysqlAdapter::new(&props.with("useshortconn", "true")).await?;
    let table = table(&adapter);
    let mut session = adapter.init_thread(0, 1).await?;
    assert_eq!(session.mode(), ConnectionMode::Short);

    let first = adapter.connection_id(&mut session).await?;
    let second = adapter.connection_id(&mut session).await?;
    assert_ne!(first, second);

    adapter
        .insert(&mut session, &table, "user1", &values(&[("FIELD0", "a")]))
        .await?;
    assert!(
        adapter
            .read(&mut session, &table, "user1", None)
            .await?
            .is_some()
    );
    assert_eq!(session.cached_statements(), 0);

    let status = adapter.pool().status();
    assert_eq!(status.open, 0);
    assert_eq!(status.max_open, None);
    assert_eq!(status.max_idle, 0);

    adapter.cleanup_thread(session).await;
    drop_table(&adapter).await?;
    adapter.close().await;
    Ok(())
}

#[tokio::test]
async fn test2_session_recovers_from_killed_connection() -> Result<(), KvBenchError> {
    let Some(props) = mysql_props("kill") else {
        return Ok(());
    };
    let adapter = MysqlAdapter::new(&props).await?;
    let table = table(&adapter);
    let mut session = adapter.init_thread(0, 1).await?;
    adapter
        .insert(&mut session, &table, "user1", &values(&[("FIELD0", "a")]))
        .await?;
    let before = adapter.connection_id(&mut session).await?;

    run_sql(&adapter, &format!("KILL {before}")).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // the statement cached on the dead connection fails once and is evicted
    if let Err(err) = adapter.read(&mut session, &table, "user1", None).await {
        assert!(err.is_stale_connection(), "unexpected error: {err}");
    }
    let row = adapter.read(&mut session, &table, "user1", None).await?;
    assert!(row.is_some());
    assert_ne!(adapter.connection_id(&mut session).await?, before);

    adapter.cleanup_thread(session).await;
    drop_table(&adapter).await?;
    adapter.close().await;
    Ok(())
}

#[tokio::test]
async fn test2_abandoned_operations_release_connections() -> Result<(), KvBenchError> {
    let Some(props) = mysql_props("abandon") else {
        return Ok(());
    };
    let adapter = MysqlAdapter::new(&props.with("useshortconn", "true")).await?;
    let table = table(&adapter);
    let mut session = adapter.init_thread(0, 1).await?;
    adapter
        .insert(&mut session, &table, "user1", &values(&[("FIELD0", "a")]))
        .await?;

    for step in 0..20u64 {
        let deadline = Instant::now() + Duration::from_micros(step * 250);
        let result = with_deadline(
            deadline,
            adapter.read(&mut session, &table, "user1", None),
        )
        .await;
        if let Err(err) = result {
            assert!(matches!(err, KvBenchError::DeadlineExceeded), "{err}");
        }
        assert_eq!(adapter.pool().status().open, 0);
    }

    adapter.cleanup_thread(session).await;
    drop_table(&adapter).await?;
    adapter.close().await;
    Ok(())
}

#[tokio::test]
async fn test2_abandoned_persistent_update_replaces_connection() -> Result<(), KvBenchError> {
    let Some(props) = mysql_props("abandon_p") else {
        return Ok(());
    };
    let adapter = MysqlAdapter::new(&props).await?;
    let table = table(&adapter);
    let mut session = adapter.init_thread(0, 1).await?;
    adapter
        .insert(&mut session, &table, "user1", &values(&[("FIELD0", "a")]))
        .await?;
    adapter
        .insert(&mut session, &table, "user2", &values(&[("FIELD0", "b")]))
        .await?;
    let before = adapter.connection_id(&mut session).await?;

    // a row lock held elsewhere keeps the update on the wire past its deadline
    let mut locker = mysql_async::Conn::new(adapter.config().opts()).await?;
    locker.query_drop("BEGIN").await?;
    locker
        .query_drop(format!(
            "SELECT * FROM {table} WHERE YCSB_KEY = 'user1' FOR UPDATE"
        ))
        .await?;
    let result = with_deadline(
        Instant::now() + Duration::from_millis(300),
        adapter.update(&mut session, &table, "user1", &values(&[("FIELD0", "z")])),
    )
    .await;
    assert!(matches!(result, Err(KvBenchError::DeadlineExceeded)));
    locker.query_drop("ROLLBACK").await?;
    locker.disconnect().await?;

    // the next read gets its own reply, on a different connection
    let row = adapter
        .read(&mut session, &table, "user2", None)
        .await?
        .expect("row");
    assert_eq!(text(&row, "YCSB_KEY"), "user2");
    assert_eq!(text(&row, "FIELD0"), "b");
    assert_ne!(adapter.connection_id(&mut session).await?, before);

    adapter.cleanup_thread(session).await;
    let status = adapter.pool().status();
    assert_eq!((status.open, status.idle), (1, 1));

    drop_table(&adapter).await?;
    adapter.close().await;
    Ok(())
}

#[tokio::test]
async fn test2_abandoned_cleanup_discards_connection() -> Result<(), KvBenchError> {
    let Some(props) = mysql_props("abandon_c") else {
        return Ok(());
    };
    let adapter = MysqlAdapter::new(&props).await?;
    let table = table(&adapter);
    let mut session = adapter.init_thread(0, 1).await?;
    let before = adapter.connection_id(&mut session).await?;

    let mut locker = mysql_async::Conn::new(adapter.config().opts()).await?;
    locker.query_drop("BEGIN").await?;
    locker
        .query_drop(format!("INSERT INTO {table} (YCSB_KEY) VALUES ('held')"))
        .await?;
    let result = with_deadline(
        Instant::now() + Duration::from_millis(300),
        adapter.insert(&mut session, &table, "held", &values(&[("FIELD0", "x")])),
    )
    .await;
    assert!(matches!(result, Err(KvBenchError::DeadlineExceeded)));

    // cleanup right after the abandoned insert must not pool its connection
    adapter.cleanup_thread(session).await;
    locker.query_drop("ROLLBACK").await?;
    locker.disconnect().await?;

    let mut session = adapter.init_thread(0, 1).await?;
    assert_ne!(adapter.connection_id(&mut session).await?, before);
    adapter.cleanup_thread(session).await;

    drop_table(&adapter).await?;
    adapter.close().await;
    Ok(())
}

#[tokio::test]
async fn test2_closed_adapter_refuses_new_sessions() -> Result<(), KvBenchError> {
    let Some(props) = mysql_props("closed") else {
        return Ok(());
    };
    let adapter = MysqlAdapter::new(&props.with("useshortconn", "true")).await?;
    drop_table(&adapter).await?;
    adapter.close().await;
    adapter.close().await;
    assert!(adapter.pool().is_closed());
    assert!(adapter.init_thread(0, 1).await.is_err());
    Ok(())
}
