//! Best-effort audit trail.
//!
//! Services call [`AuditSink::record`] after their own work has committed.
//! Recording only enqueues; a background [`AuditWriter`] persists entries, so
//! a slow or failing `audit_logs` table never affects the caller.

use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, DbErr, Set};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::entity::audit_logs::ActiveModel as AuditActive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub target: String,
}

#[derive(Clone)]
pub struct AuditSink {
    sender: mpsc::Sender<AuditEntry>,
}

impl AuditSink {
    /// Sink plus the receiving half, for callers that drive the queue themselves.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<AuditEntry>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }

    /// Sink backed by an [`AuditWriter`] running on the current runtime.
    pub fn spawn(conn: DatabaseConnection, buffer: usize) -> Self {
        let (sink, receiver) = Self::channel(buffer);
        tokio::spawn(AuditWriter::new(conn, receiver).run());
        sink
    }

    /// Never blocks and never fails; a full or closed queue drops the entry.
    pub fn record(&self, user_id: Option<Uuid>, action: &str, target: impl Into<String>) {
        let entry = AuditEntry {
            user_id,
            action: action.to_string(),
            target: target.into(),
        };
        match self.sender.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                tracing::warn!(action = %entry.action, "audit queue full, entry dropped");
            }
            Err(TrySendError::Closed(entry)) => {
                tracing::warn!(action = %entry.action, "audit writer stopped, entry dropped");
            }
        }
    }
}

pub struct AuditWriter {
    conn: DatabaseConnection,
    receiver: mpsc::Receiver<AuditEntry>,
}

impl AuditWriter {
    pub fn new(conn: DatabaseConnection, receiver: mpsc::Receiver<AuditEntry>) -> Self {
        Self { conn, receiver }
    }

    pub async fn run(mut self) {
        tracing::info!("audit writer starting");
        while let Some(entry) = self.receiver.recv().await {
            if let Err(err) = write_entry(&self.conn, &entry).await {
                tracing::warn!(error = %err, action = %entry.action, "audit log failed");
            }
        }
        tracing::info!("audit writer stopped");
    }
}

pub async fn write_entry(conn: &DatabaseConnection, entry: &AuditEntry) -> Result<(), DbErr> {
    AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(entry.user_id),
        action: Set(entry.action.clone()),
        target: Set(Some(entry.target.clone())),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}
