use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::message::{ConversationSummary, Message, Party};
use crate::store::{from_document, to_document, Document, Query};

use super::{require, Repository, MESSAGES};

/// Receiver id for messages a tenant sends to the hostel office. Every admin
/// reads the same desk inbox.
pub const ADMIN_DESK: &str = "admin";

/// Stored timestamps are RFC 3339 text with varying sub-second precision,
/// so order on the parsed time rather than the string.
fn newest_first(messages: &mut [Message]) {
    messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
}

impl Repository {
    async fn fetch_messages(&self, query: Query) -> Result<Vec<Message>, AppError> {
        self.store
            .query(MESSAGES, &query)
            .await?
            .into_iter()
            .map(|(id, doc)| -> Result<Message, AppError> {
                let mut message: Message = from_document(doc)?;
                message.id = id;
                Ok(message)
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn send_message(
        &self,
        sender_id: &str,
        sender_type: Party,
        receiver_id: &str,
        receiver_type: Party,
        subject: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Message, AppError> {
        require("subject", subject)?;
        require("message", body)?;

        let mut message = Message {
            id: String::new(),
            sender_id: sender_id.to_string(),
            sender_type,
            receiver_id: receiver_id.to_string(),
            receiver_type,
            subject: subject.trim().to_string(),
            message: body.to_string(),
            timestamp: now,
            read: false,
        };
        let mut doc = to_document(&message)?;
        doc.remove("id");
        message.id = self.store.insert(MESSAGES, doc).await?;

        tracing::debug!(
            message_id = %message.id,
            from = %sender_id,
            to = %receiver_id,
            "message sent"
        );
        Ok(message)
    }

    /// Send the same message from an admin to every tenant. Returns the
    /// number of messages written.
    pub async fn broadcast(
        &self,
        sender_id: &str,
        subject: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let tenants = self.list_tenants().await?;
        for tenant in &tenants {
            self.send_message(
                sender_id,
                Party::Admin,
                &tenant.id.to_string(),
                Party::Student,
                subject,
                body,
                now,
            )
            .await?;
        }
        tracing::info!(sender = %sender_id, recipients = tenants.len(), "broadcast sent");
        Ok(tenants.len())
    }

    fn inbox_query(user_id: &str, party: Party) -> Query {
        match party {
            Party::Admin => Query::new().eq("receiver_type", party.as_str()),
            Party::Student => Query::new()
                .eq("receiver_id", user_id)
                .eq("receiver_type", party.as_str()),
        }
    }

    /// Messages received, newest first. Admins share the desk inbox.
    pub async fn inbox(&self, user_id: &str, party: Party) -> Result<Vec<Message>, AppError> {
        let mut messages = self.fetch_messages(Self::inbox_query(user_id, party)).await?;
        newest_first(&mut messages);
        Ok(messages)
    }

    /// Messages sent by this user, newest first.
    pub async fn sent(&self, user_id: &str, party: Party) -> Result<Vec<Message>, AppError> {
        let mut messages = self
            .fetch_messages(
                Query::new()
                    .eq("sender_id", user_id)
                    .eq("sender_type", party.as_str()),
            )
            .await?;
        newest_first(&mut messages);
        Ok(messages)
    }

    pub async fn get_message(&self, id: &str) -> Result<Option<Message>, AppError> {
        match self.store.get(MESSAGES, id).await? {
            Some(doc) => {
                let mut message: Message = from_document(doc)?;
                message.id = id.to_string();
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    pub async fn mark_read(&self, id: &str) -> Result<bool, AppError> {
        let mut patch = Document::new();
        patch.insert("read".into(), true.into());
        Ok(self.store.merge(MESSAGES, id, patch).await?)
    }

    pub async fn delete_message(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.store.delete(MESSAGES, id).await?)
    }

    pub async fn count_unread(&self, user_id: &str, party: Party) -> Result<u64, AppError> {
        Ok(self
            .store
            .count(MESSAGES, &Self::inbox_query(user_id, party).eq("read", false))
            .await?)
    }

    /// The thread between a student and the hostel office, oldest first.
    pub async fn conversation(&self, student_id: &str) -> Result<Vec<Message>, AppError> {
        let mut messages = self
            .fetch_messages(
                Query::new()
                    .eq("sender_id", student_id)
                    .eq("sender_type", Party::Student.as_str()),
            )
            .await?;
        messages.extend(
            self.fetch_messages(
                Query::new()
                    .eq("receiver_id", student_id)
                    .eq("receiver_type", Party::Student.as_str()),
            )
            .await?,
        );
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    /// Delete the whole thread. Returns how many messages were removed.
    pub async fn delete_conversation(&self, student_id: &str) -> Result<usize, AppError> {
        let mut removed = 0;
        for message in self.conversation(student_id).await? {
            if self.delete_message(&message.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// One entry per student thread with its latest message and the number
    /// of unread messages addressed to the office, latest thread first.
    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, AppError> {
        let mut threads: BTreeMap<String, ConversationSummary> = BTreeMap::new();
        for message in self.fetch_messages(Query::new()).await? {
            let unread_to_admin = message.receiver_type == Party::Admin && !message.read;
            let summary = threads
                .entry(message.student_id().to_string())
                .or_insert_with(|| ConversationSummary {
                    student_id: message.student_id().to_string(),
                    last_message: message.clone(),
                    unread_count: 0,
                });
            if message.timestamp > summary.last_message.timestamp {
                summary.last_message = message.clone();
            }
            if unread_to_admin {
                summary.unread_count += 1;
            }
        }

        let mut summaries: Vec<_> = threads.into_values().collect();
        summaries.sort_by(|a, b| b.last_message.timestamp.cmp(&a.last_message.timestamp));
        Ok(summaries)
    }
}
