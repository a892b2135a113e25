use crate::domain::{ChatId, MessageId, MessageRef, UserId};

/// Cross-messenger incoming text message.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

impl TextMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }

    /// Display name for logs: `@username` when known, the numeric id otherwise.
    pub fn sender_label(&self) -> String {
        match &self.username {
            Some(u) => format!("@{u}"),
            None => self.user_id.0.to_string(),
        }
    }
}

/// Membership status of a user in a chat, reduced to what onboarding cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

#[derive(Clone, Debug)]
pub struct MemberUser {
    pub id: UserId,
    pub first_name: String,
    pub username: Option<String>,
    pub is_bot: bool,
}

/// A chat membership change (join, leave, promotion, ...).
#[derive(Clone, Debug)]
pub struct MemberUpdate {
    pub chat_id: ChatId,
    pub user: MemberUser,
    pub old_status: MemberStatus,
    pub new_status: MemberStatus,
}

impl MemberUpdate {
    /// A user that was not in the chat became a regular member.
    pub fn is_join(&self) -> bool {
        self.old_status == MemberStatus::Left && self.new_status == MemberStatus::Member
    }
}

/// Outgoing "chat action" (typing indicator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}

/// How the platform should interpret outgoing text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Html,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_chat_actions: bool,
    pub max_message_len: usize,
}

/// Cut `text` to at most `max_chars` characters, ending with an ellipsis when shortened.
pub fn clamp_message(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}
