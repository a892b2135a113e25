//! In-memory fakes for the ports, shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    market::{MarketDataPort, MarketStats, SymbolHit},
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities, TextFormat, TextMessage},
    },
    model::{GenerationError, GenerationPort, GenerationRequest},
    Result,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Sent {
    pub chat_id: ChatId,
    pub text: String,
    pub format: TextFormat,
    pub reply_to: Option<MessageId>,
}

#[derive(Default)]
pub struct FakeMessenger {
    pub next_id: Mutex<i32>,
    pub sends: Mutex<Vec<Sent>>,
    pub deletes: Mutex<Vec<MessageRef>>,
    pub typing: AtomicUsize,
    pub fail_sends: bool,
    pub fail_deletes: bool,
    pub max_message_len: Option<usize>,
}

impl FakeMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sends.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn typing_calls(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_chat_actions: true,
            max_message_len: self.max_message_len.unwrap_or(4096),
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        if self.fail_sends {
            return Err(Error::External("send failed".to_string()));
        }
        self.sends.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            format,
            reply_to,
        });
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(1000 + *guard),
        })
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.deletes.lock().unwrap().push(msg);
        if self.fail_deletes {
            return Err(Error::External("not enough rights".to_string()));
        }
        Ok(())
    }

    async fn send_chat_action(&self, _chat_id: ChatId, _action: ChatAction) -> Result<()> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scripted generator: pops queued results, falls back to a fixed reply.
#[derive(Default)]
pub struct FakeGenerator {
    calls: AtomicUsize,
    pub requests: Mutex<Vec<GenerationRequest>>,
    pub script: Mutex<VecDeque<std::result::Result<String, GenerationError>>>,
    pub delay: Option<Duration>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        let g = Self::default();
        g.push(Ok(text.to_string()));
        g
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push(&self, res: std::result::Result<String, GenerationError>) {
        self.script.lock().unwrap().push_back(res);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationPort for FakeGenerator {
    fn provider(&self) -> &str {
        "fake"
    }

    async fn generate(
        &self,
        req: GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok("generated reply".to_string()))
    }
}

/// Market backend with canned answers and call counters.
#[derive(Default)]
pub struct FakeMarket {
    pub hits: Vec<SymbolHit>,
    pub stats: Option<MarketStats>,
    pub fail: bool,
    pub searches: Mutex<Vec<String>>,
    pub lookups: Mutex<Vec<String>>,
}

#[async_trait]
impl MarketDataPort for FakeMarket {
    async fn search_symbol(&self, query: &str) -> Result<Vec<SymbolHit>> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(Error::Market("search unavailable".to_string()));
        }
        Ok(self.hits.clone())
    }

    async fn token_stats(&self, address: &str) -> Result<Option<MarketStats>> {
        self.lookups.lock().unwrap().push(address.to_string());
        if self.fail {
            return Err(Error::Market("overview unavailable".to_string()));
        }
        Ok(self.stats)
    }
}

pub fn text_message(user: i64, text: &str) -> TextMessage {
    TextMessage {
        chat_id: ChatId(-100),
        message_id: MessageId(user as i32 * 10),
        user_id: UserId(user),
        username: Some(format!("user{user}")),
        text: text.to_string(),
    }
}
