//! Transaction sequencing
//!
//! [`TransactionScope`] remembers where a transaction was opened and, once
//! the body has run, commits on success or rolls back on failure through a
//! [`TransactionControl`]. Every failure along the way ends up in one
//! [`TransactionError`], so a failed rollback never hides the error that
//! caused it.
//!
//! ```rust
//! use tns_core::{Result, TransactionControl, TransactionScope};
//!
//! struct Session { commits: u32 }
//!
//! impl TransactionControl for Session {
//!     async fn commit(&mut self) -> Result<()> {
//!         self.commits += 1;
//!         Ok(())
//!     }
//!     async fn rollback(&mut self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut session = Session { commits: 0 };
//! let scope = TransactionScope::begin();
//! let body: Result<u64> = Ok(3);
//! assert_eq!(scope.finish(&mut session, body).await.unwrap(), 3);
//! assert_eq!(session.commits, 1);
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::panic::Location;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::buffer::WriteBuffer;
use crate::constants::FunctionCode;
use crate::error::{Error, Result};
use crate::messages::write_function_header;
use crate::packet::Packet;

/// Commits and rolls back the session a transaction runs on
pub trait TransactionControl {
    /// Make the transaction's changes permanent
    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Undo the transaction's changes
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Failure of a transaction, with every error raised while ending it
///
/// A `closure_error` without a `rollback_error` means the rollback
/// succeeded. With a `rollback_error` present, whether the body's changes
/// persisted is unknown.
#[derive(Debug)]
pub struct TransactionError {
    /// Source file where the transaction was opened
    pub file: &'static str,
    /// Source line where the transaction was opened
    pub line: u32,
    /// Error returned by the transaction body
    pub closure_error: Option<Error>,
    /// Error raised while rolling back
    pub rollback_error: Option<Error>,
    /// Error raised while committing
    pub commit_error: Option<Error>,
}

impl TransactionError {
    /// Whether the transaction's changes may have persisted partially
    pub fn is_outcome_unknown(&self) -> bool {
        self.rollback_error.is_some() || self.commit_error.is_some()
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction opened at {}:{} failed", self.file, self.line)?;
        if let Some(err) = &self.closure_error {
            write!(f, "; body: {}", err)?;
        }
        if let Some(err) = &self.rollback_error {
            write!(f, "; rollback: {}", err)?;
        }
        if let Some(err) = &self.commit_error {
            write!(f, "; commit: {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for TransactionError {}

/// An open transaction and the call site that opened it
#[derive(Debug, Clone, Copy)]
pub struct TransactionScope {
    location: &'static Location<'static>,
}

impl TransactionScope {
    /// Open a transaction scope at the caller's location
    #[track_caller]
    pub fn begin() -> Self {
        Self {
            location: Location::caller(),
        }
    }

    /// Source file of the call to [`TransactionScope::begin`]
    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    /// Source line of the call to [`TransactionScope::begin`]
    pub fn line(&self) -> u32 {
        self.location.line()
    }

    /// End the transaction: commit if the body succeeded, roll back if not
    pub async fn finish<C, T>(self, control: &mut C, body: Result<T>) -> Result<T>
    where
        C: TransactionControl,
    {
        match body {
            Ok(value) => match control.commit().await {
                Ok(()) => {
                    debug!(file = self.file(), line = self.line(), "transaction committed");
                    Ok(value)
                }
                Err(err) => {
                    warn!(file = self.file(), line = self.line(), error = %err, "commit failed");
                    Err(self.error(None, None, Some(err)))
                }
            },
            Err(closure_error) => {
                let rollback_error = match control.rollback().await {
                    Ok(()) => {
                        debug!(file = self.file(), line = self.line(), "transaction rolled back");
                        None
                    }
                    Err(err) => {
                        warn!(file = self.file(), line = self.line(), error = %err, "rollback failed");
                        Some(err)
                    }
                };
                Err(self.error(Some(closure_error), rollback_error, None))
            }
        }
    }

    fn error(
        &self,
        closure_error: Option<Error>,
        rollback_error: Option<Error>,
        commit_error: Option<Error>,
    ) -> Error {
        TransactionError {
            file: self.file(),
            line: self.line(),
            closure_error,
            rollback_error,
            commit_error,
        }
        .into()
    }
}

fn simple_function_request(function: FunctionCode, sequence: u8, large_sdu: bool) -> Result<Bytes> {
    let mut buf = WriteBuffer::with_capacity(3);
    write_function_header(&mut buf, function, sequence)?;
    Packet::data(0, buf.as_slice(), large_sdu)
}

/// DATA packet carrying a COMMIT call
pub fn commit_request(sequence: u8, large_sdu: bool) -> Result<Bytes> {
    simple_function_request(FunctionCode::Commit, sequence, large_sdu)
}

/// DATA packet carrying a ROLLBACK call
pub fn rollback_request(sequence: u8, large_sdu: bool) -> Result<Bytes> {
    simple_function_request(FunctionCode::Rollback, sequence, large_sdu)
}
