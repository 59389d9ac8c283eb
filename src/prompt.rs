//! Prompt construction
//!
//! Everything here is a pure function of its inputs so prompts can be
//! asserted on directly.

use crate::args::{AskConfig, BriefConfig};
use crate::completion::Mode;
use crate::message::Message;

const BRIEF_SYSTEM_PROMPT: &str = "You are an experienced engineering mentor who writes \
realistic project briefs for software developers. Each brief describes a self-contained \
project with a clear goal, concrete requirements, and deliverables that fit the requested \
seniority, focus area, technology stack, and time box. Keep the scope achievable and the \
wording precise.";

const BRIEF_JSON_INSTRUCTIONS: &str = "Respond with a single JSON object and nothing else. \
The object must have the shape {\"briefs\": [{\"title\": string, \"summary\": string, \
\"requirements\": [string], \"deliverables\": [string], \"stack\": [string], \
\"duration\": string}]} with one entry per requested brief.";

const ASK_SYSTEM_PROMPT: &str = "You are a helpful assistant for software developers.";

const ASK_JSON_INSTRUCTIONS: &str = "Respond with a single JSON object and nothing else.";

/// System and user instructions for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// Role-tagged messages in request order
    pub fn messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }
}

fn system_prompt(base: &str, json_instructions: &str, mode: Mode) -> String {
    match mode {
        Mode::Streaming => base.to_string(),
        Mode::SingleShot => format!("{}\n\n{}", base, json_instructions),
    }
}

/// Build the prompts for a brief request
pub fn build_brief_prompts(config: &BriefConfig, mode: Mode) -> PromptPair {
    let noun = if config.count() == 1 { "brief" } else { "briefs" };
    let user = format!(
        "Generate {count} {level} {focus} project {noun} in the {domain} domain.\n\
         Use this technology stack: {stack}.\n\
         Each project should be completable within {duration}.",
        count = config.count(),
        level = config.level(),
        focus = config.tech_focus(),
        noun = noun,
        domain = config.domain(),
        stack = config.stack().join(", "),
        duration = config.duration(),
    );

    PromptPair {
        system: system_prompt(BRIEF_SYSTEM_PROMPT, BRIEF_JSON_INSTRUCTIONS, mode),
        user,
    }
}

/// Build the prompts for a free-text request
pub fn build_ask_prompts(config: &AskConfig, mode: Mode) -> PromptPair {
    PromptPair {
        system: system_prompt(ASK_SYSTEM_PROMPT, ASK_JSON_INSTRUCTIONS, mode),
        user: config.prompt().to_string(),
    }
}
