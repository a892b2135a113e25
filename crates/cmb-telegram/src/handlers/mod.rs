//! Telegram update handlers.
//!
//! Each handler is a thin adapter that:
//! - converts the teloxide update into a `cmb-core` type
//! - hands it to the core on its own task so dispatch never waits on a backend

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{ChatMemberStatus, ChatMemberUpdated, Message, User},
};
use tracing::debug;

use cmb_core::{
    domain::{ChatId, MessageId, UserId},
    messaging::types::{MemberStatus, MemberUpdate, MemberUser, TextMessage},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = text_message(&msg) else {
        return Ok(());
    };
    if is_command(&incoming.text) {
        debug!(chat_id = incoming.chat_id.0, "command ignored");
        return Ok(());
    }

    // teloxide serializes updates per chat; a slow generation must not hold up the group.
    tokio::spawn(async move {
        let outcome = state.orchestrator.handle_text(&incoming).await;
        debug!(
            chat_id = incoming.chat_id.0,
            user = %incoming.sender_label(),
            ?outcome,
            "message handled"
        );
    });
    Ok(())
}

pub async fn handle_chat_member(upd: ChatMemberUpdated, state: Arc<AppState>) -> ResponseResult<()> {
    let update = member_update(&upd);
    if !update.is_join() {
        return Ok(());
    }

    tokio::spawn(async move {
        let outcome = state.onboarding.handle_member_update(&update).await;
        debug!(chat_id = update.chat_id.0, user_id = update.user.id.0, ?outcome, "member update handled");
    });
    Ok(())
}

fn is_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

fn text_message(msg: &Message) -> Option<TextMessage> {
    let user = msg.from()?;
    let text = msg.text()?;
    Some(TextMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        text: text.to_string(),
    })
}

fn member_update(upd: &ChatMemberUpdated) -> MemberUpdate {
    MemberUpdate {
        chat_id: ChatId(upd.chat.id.0),
        user: member_user(&upd.new_chat_member.user),
        old_status: member_status(upd.old_chat_member.kind.status()),
        new_status: member_status(upd.new_chat_member.kind.status()),
    }
}

fn member_user(user: &User) -> MemberUser {
    MemberUser {
        id: UserId(user.id.0 as i64),
        first_name: user.first_name.clone(),
        username: user.username.clone(),
        is_bot: user.is_bot,
    }
}

fn member_status(status: ChatMemberStatus) -> MemberStatus {
    match status {
        ChatMemberStatus::Owner => MemberStatus::Owner,
        ChatMemberStatus::Administrator => MemberStatus::Administrator,
        ChatMemberStatus::Member => MemberStatus::Member,
        ChatMemberStatus::Restricted => MemberStatus::Restricted,
        ChatMemberStatus::Left => MemberStatus::Left,
        ChatMemberStatus::Banned => MemberStatus::Banned,
    }
}
