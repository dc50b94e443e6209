//! Prompt assembly from retrieved snippets.
//!
//! The assembler only formats. Which snippets appear was decided by the
//! retriever, and every snippet it is handed ends up in the prompt.

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::UserProfile;
use crate::retriever::Snippet;

/// Which prompt template was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Answer grounded in retrieved chat history.
    Grounded,
    /// Nothing relevant was retrieved; answer from general knowledge.
    NoHistory,
}

/// A prompt ready for the generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub kind: PromptKind,
    pub system: String,
    pub user: String,
}

/// Build the prompt for `question` from `snippets` and the user profile.
pub fn assemble(question: &str, snippets: &[Snippet], profile: &UserProfile) -> Prompt {
    let mut system = profile_preamble(profile);

    if snippets.is_empty() {
        system.push_str(
            "\nNo relevant chat history was found for this question. \
             Answer from general knowledge only and do not invent past messages.",
        );
        return Prompt {
            kind: PromptKind::NoHistory,
            system,
            user: format!("Question: {question}"),
        };
    }

    system.push_str(
        "\nGround your answer in the chat history provided by the user and cite the time \
         labels of the messages you rely on. If the history is not enough to answer, say so \
         and supplement it with general reasoning.",
    );

    let mut user = String::from("Chat history:\n");
    for (position, snippet) in snippets.iter().enumerate() {
        let author = profile
            .participant(&snippet.side)
            .map(|name| format!("{} / {name}", snippet.side))
            .unwrap_or_else(|| snippet.side.clone());
        let _ = writeln!(
            user,
            "{}. [{}] ({author}) {}",
            position + 1,
            snippet.timestamp,
            snippet.text
        );
    }
    let _ = write!(user, "\nQuestion: {question}");

    Prompt {
        kind: PromptKind::Grounded,
        system,
        user,
    }
}

fn profile_preamble(profile: &UserProfile) -> String {
    let mut preamble = format!(
        "You are an assistant answering questions for {} about their conversations in {}.",
        profile.name, profile.group
    );
    for (side, participant) in &profile.sides {
        let _ = write!(
            preamble,
            "\nMessages on side \"{side}\" were written by {participant}."
        );
    }
    preamble
}
