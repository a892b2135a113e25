//! Scripted welcome sequence for new members.

use std::{sync::Arc, time::Duration};

use rand::{seq::SliceRandom, Rng};
use tracing::{info, warn};

use crate::{
    formatting::escape_html,
    messaging::{
        port::MessagingPort,
        types::{MemberUpdate, TextFormat},
    },
    prompts::ProjectFacts,
    Result,
};

const COPIUM_LEVELS: &[&str] = &["💨 Mild Copium", "💊 Medium Dosage", "🔥 Max Cope Mode"];

const COPE_RANKS: &[&str] = &[
    "Cope Cadet 😈",
    "Stuck Veteran 💀",
    "Moon Cultist 🌕",
    "Rug Resister 🛡️",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnboardingOutcome {
    /// Not a join (promotion, leave, re-join from restricted, ...).
    Skipped,
    /// A bot account joined; bots are not welcomed.
    BotIgnored,
    /// Every message of the sequence was sent.
    Welcomed,
    /// The sequence stopped after `sent` messages because delivery failed.
    Interrupted { sent: usize },
    /// Onboarding is switched off.
    Disabled,
}

pub struct Onboarding {
    messenger: Arc<dyn MessagingPort>,
    facts: ProjectFacts,
    step_delay: Duration,
    enabled: bool,
}

impl Onboarding {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        facts: ProjectFacts,
        step_delay: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            messenger,
            facts,
            step_delay,
            enabled,
        }
    }

    /// Membership-change handler. Never fails; delivery problems are logged.
    pub async fn handle_member_update(&self, upd: &MemberUpdate) -> OnboardingOutcome {
        if !upd.is_join() {
            return OnboardingOutcome::Skipped;
        }
        if upd.user.is_bot {
            info!(
                user = upd.user.username.as_deref().unwrap_or("unknown"),
                "bot joined, ignored"
            );
            return OnboardingOutcome::BotIgnored;
        }
        if !self.enabled {
            return OnboardingOutcome::Disabled;
        }

        // Build the whole script up front: the thread rng must not live across awaits.
        let script = self.script(&upd.user.first_name, &mut rand::thread_rng());

        let mut sent = 0usize;
        for (idx, text) in script.iter().enumerate() {
            if idx > 0 && !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            if let Err(e) = self.send(upd, text).await {
                warn!(chat_id = upd.chat_id.0, user_id = upd.user.id.0, error = %e, "could not welcome user");
                return OnboardingOutcome::Interrupted { sent };
            }
            sent += 1;
        }

        info!(chat_id = upd.chat_id.0, user_id = upd.user.id.0, "welcomed new member");
        OnboardingOutcome::Welcomed
    }

    async fn send(&self, upd: &MemberUpdate, text: &str) -> Result<()> {
        self.messenger
            .send_text(upd.chat_id, text, TextFormat::Html, None)
            .await
            .map(|_| ())
    }

    /// The five welcome messages (Telegram HTML), with random picks from `rng`.
    pub fn script<R: Rng + ?Sized>(&self, first_name: &str, rng: &mut R) -> Vec<String> {
        let name = escape_html(first_name);
        let ticker = escape_html(&self.facts.ticker);
        let bot = escape_html(&self.facts.bot_name);

        let greetings = [
            format!("📬 Yo <b>{name}</b>, welcome to <b>{ticker} rehab</b>. Check your baggage at the door 📉😐"),
            format!("💀 <b>{name}</b> just entered the stuck zone. <b>No refunds. No roadmap. Just vibes</b> 🔀"),
            format!("🙌 <b>Welcome {name}</b>, your coping journey starts now. <b>Say gm and hold on tight</b> 🧠"),
        ];
        let facts = [
            format!("{ticker} only moons when you stop watching the chart 👀📉"),
            "Shieldy eats bots for breakfast 🍽️🤖".to_string(),
            "We have no utility, just memes and vibes 😉🚀".to_string(),
            format!("{bot} responds like he’s been rugged 5x this week 😬"),
        ];

        let greeting = greetings.choose(rng).cloned().unwrap_or_default();
        let copium = COPIUM_LEVELS.choose(rng).copied().unwrap_or_default();
        let rank = COPE_RANKS.choose(rng).copied().unwrap_or_default();
        let fact = facts.choose(rng).cloned().unwrap_or_default();

        vec![
            greeting,
            format!("💊 <b>Copium Meter</b> for {name}: <b>{copium}</b>"),
            format!("🎖️ <b>Cope Rank Assigned:</b> <b>{rank}</b>"),
            format!("📘 <b>Did You Know?</b> {fact}"),
            "📌 <b>P.S.</b> Don’t forget to check the <b>pinned message</b> for the buy link + group rules!"
                .to_string(),
        ]
    }
}
