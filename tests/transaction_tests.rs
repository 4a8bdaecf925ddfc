//! Transaction sequencing against a scripted session

use tns_core::{Error, Result, TransactionControl, TransactionScope};

#[derive(Default)]
struct ScriptedSession {
    fail_commit: bool,
    fail_rollback: bool,
    commits: u32,
    rollbacks: u32,
}

impl TransactionControl for ScriptedSession {
    async fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        if self.fail_commit {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.rollbacks += 1;
        if self.fail_rollback {
            return Err(Error::oracle(3113, "end-of-file on communication channel"));
        }
        Ok(())
    }
}

async fn insert_rows(fail: bool) -> Result<u64> {
    if fail {
        Err(Error::oracle(1, "unique constraint (APP.T_PK) violated"))
    } else {
        Ok(2)
    }
}

#[tokio::test]
async fn test_success_commits() {
    let mut session = ScriptedSession::default();
    let scope = TransactionScope::begin();
    let body = insert_rows(false).await;
    assert_eq!(scope.finish(&mut session, body).await.unwrap(), 2);
    assert_eq!((session.commits, session.rollbacks), (1, 0));
}

#[tokio::test]
async fn test_failure_rolls_back_and_keeps_body_error() {
    let mut session = ScriptedSession::default();
    let line = line!() + 1;
    let scope = TransactionScope::begin();
    let body = insert_rows(true).await;

    let err = scope.finish(&mut session, body).await.unwrap_err();
    assert_eq!((session.commits, session.rollbacks), (0, 1));
    match err {
        Error::Transaction(tx) => {
            assert_eq!(tx.file, file!());
            assert_eq!(tx.line, line);
            assert_eq!(tx.closure_error.as_ref().and_then(Error::oracle_code), Some(1));
            assert!(tx.rollback_error.is_none());
            assert!(tx.commit_error.is_none());
            assert!(!tx.is_outcome_unknown());
        }
        other => panic!("expected transaction error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_rollback_reports_both_errors() {
    let mut session = ScriptedSession {
        fail_rollback: true,
        ..Default::default()
    };
    let scope = TransactionScope::begin();
    let err = scope
        .finish(&mut session, insert_rows(true).await)
        .await
        .unwrap_err();
    match err {
        Error::Transaction(tx) => {
            assert_eq!(tx.closure_error.as_ref().and_then(Error::oracle_code), Some(1));
            assert_eq!(tx.rollback_error.as_ref().and_then(Error::oracle_code), Some(3113));
            assert!(tx.is_outcome_unknown());
            assert!(tx.to_string().contains("rollback: ORA-03113"));
        }
        other => panic!("expected transaction error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_commit_is_reported() {
    let mut session = ScriptedSession {
        fail_commit: true,
        ..Default::default()
    };
    let scope = TransactionScope::begin();
    let err = scope
        .finish(&mut session, insert_rows(false).await)
        .await
        .unwrap_err();
    assert_eq!(session.rollbacks, 0);
    match err {
        Error::Transaction(tx) => {
            assert!(tx.closure_error.is_none());
            assert!(matches!(tx.commit_error, Some(Error::ConnectionClosed)));
            assert!(tx.is_outcome_unknown());
        }
        other => panic!("expected transaction error, got {other:?}"),
    }
}
