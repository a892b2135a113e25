//! Persona, prompt templates and fixed fallback replies.

/// Fixed facts about the community's project, embedded in every help prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectFacts {
    pub bot_name: String,
    pub ticker: String,
    pub buy_venue: String,
    pub tax: String,
    pub website: String,
}

impl Default for ProjectFacts {
    fn default() -> Self {
        Self {
            bot_name: "Chad".to_string(),
            ticker: "$STUCK".to_string(),
            buy_venue: "Moonshot (link in the pinned message)".to_string(),
            tax: "0% buy / 0% sell".to_string(),
            website: "see the pinned message".to_string(),
        }
    }
}

/// Which fallback to show when generation does not produce a reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    ReplyTimeout,
    ReplyFailure,
    TickerTimeout,
    TickerFailure,
}

impl ProjectFacts {
    pub fn persona(&self) -> String {
        format!(
            "You're a calm, smart Telegram crypto helper named {} who speaks like a chill degen and helps the {} community.",
            self.bot_name, self.ticker
        )
    }

    /// User instruction for a community question.
    pub fn help_prompt(&self, question: &str) -> String {
        format!(
            "Answer this community member's question in 1-3 short sentences, casual degen tone, no financial advice.\n\
             Facts you can rely on:\n\
             - Token: {ticker}\n\
             - Where to buy: {venue}\n\
             - Tax: {tax}\n\
             - Website: {website}\n\
             If the answer is not covered by these facts, say so and point to the pinned message.\n\n\
             Question: {question}",
            ticker = self.ticker,
            venue = self.buy_venue,
            tax = self.tax,
            website = self.website,
        )
    }

    pub fn analyst_persona(&self) -> String {
        "You're a crypto degen meme expert.".to_string()
    }

    /// User instruction for a meme-style token breakdown.
    pub fn ticker_prompt(&self, token: &str) -> String {
        format!(
            "You are a degen crypto analyst who gives brutally honest, meme-style breakdowns of meme coins.\n\
             Analyze the token {token} and give:\n\
             - Pros ✅\n\
             - Cons ❌\n\
             - Vibe check 🙀\n\
             Then give a final rating as one of: WINNER, MID, or STUCK.\n\n\
             Use degen slang, stay brief but spicy. End with:\n\
             \"Verdict: STUCK/WINNER/MID\""
        )
    }

    pub fn fallback(&self, kind: Fallback) -> String {
        let name = &self.bot_name;
        match kind {
            Fallback::ReplyTimeout => format!("{name}'s stuck thinking too hard. Try again in a sec."),
            Fallback::ReplyFailure => {
                format!("{name}'s passed out from too much cope. Try again later.")
            }
            Fallback::TickerTimeout => {
                format!("⏱ {name} is still digging through charts… try again soon.")
            }
            Fallback::TickerFailure => {
                "Something broke. Probably the chart. Try again later.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_prompt_embeds_facts_and_question() {
        let facts = ProjectFacts {
            website: "https://stuck.example".to_string(),
            ..ProjectFacts::default()
        };
        let p = facts.help_prompt("how to buy $stuck");
        assert!(p.contains("$STUCK"));
        assert!(p.contains("https://stuck.example"));
        assert!(p.contains(&facts.tax));
        assert!(p.ends_with("Question: how to buy $stuck"));
    }

    #[test]
    fn fallbacks_are_distinct() {
        let facts = ProjectFacts::default();
        let all = [
            Fallback::ReplyTimeout,
            Fallback::ReplyFailure,
            Fallback::TickerTimeout,
            Fallback::TickerFailure,
        ]
        .map(|k| facts.fallback(k));
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
