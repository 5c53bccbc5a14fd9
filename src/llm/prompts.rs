//! Instruction templates for the four language capabilities.

use crate::pipeline::types::ThreadMessage;

pub const RESPOND_SYSTEM_PROMPT: &str = "You are an intelligent email classifier. Decide whether an incoming \
email requires a response (RESPOND) or should be skipped (SKIP).\n\n\
RESPOND to:\n\
- Business-related communications\n\
- Personal messages requiring attention\n\
- Questions or requests for information\n\
- Follow-ups on ongoing conversations or projects\n\
- Important notifications that need acknowledgment\n\n\
SKIP:\n\
- Promotional and marketing emails\n\
- Newsletters and subscriptions\n\
- Spam or suspicious content\n\
- Automated notifications that don't require action\n\
- Sales pitches and advertisements\n\
- Mass emails not specifically addressed to the recipient\n\n\
Analyze both the subject line and the body.\n\
Respond with ONLY a JSON object: {\"classification\": \"RESPOND\"} or {\"classification\": \"SKIP\"}";

pub const SENDABLE_SYSTEM_PROMPT: &str = "You are an expert email proofreader. Decide whether a draft reply \
is appropriate to send (SENDABLE) or should be skipped (SKIP).\n\n\
A SENDABLE reply must:\n\
- Directly address the content and questions of the original email\n\
- Be professional and courteous, with an appropriate tone\n\
- Contain relevant information that meets the sender's needs\n\
- Be free of major grammatical or spelling errors\n\
- Be logically structured and easy to understand\n\n\
Mark it SKIP if it:\n\
- Is off-topic or unrelated to the original email\n\
- Contains inappropriate language or tone\n\
- Fails to address the main points of the original email\n\
- Is confusing, incomplete or incoherent\n\
- Contains factually incorrect information\n\n\
Compare the draft against the original email and the conversation so far.\n\
Respond with ONLY a JSON object: {\"classification\": \"SENDABLE\" or \"SKIP\", \"reason\": \"one or two sentences\"}";

pub const COMPOSE_SYSTEM_PROMPT: &str = "You are an email assistant drafting professional replies.\n\n\
Guidelines:\n\
- Keep a professional, courteous and helpful tone\n\
- Address every key point and question of the original email\n\
- Be concise but thorough; use clear language and logical structure\n\
- Match the formality of the original email\n\
- Do not include email headers, greetings such as 'Dear', or signatures\n\
- Start directly with the body text of the reply\n\
- Give specific information rather than vague statements\n\
- If you cannot answer a question, acknowledge it and suggest a follow-up\n\
- Avoid filler and unnecessary pleasantries\n\n\
Output only the reply body.";

pub const SUMMARIZE_SYSTEM_PROMPT: &str = "You summarize email conversations so that a reply can be \
written with full context. Produce a short factual summary (at most 8 sentences) covering who said \
what, open questions, commitments and decisions. Output only the summary text.";

/// User prompt for the respond/skip classifier.
pub fn respond_user_prompt(subject: &str, body: &str) -> String {
    format!("Subject: {subject}\n\nBody: {body}")
}

/// User prompt for the sendable/skip proofreader.
pub fn sendable_user_prompt(subject: &str, body: &str, draft: &str, summary: Option<&str>) -> String {
    let mut prompt = String::with_capacity(subject.len() + body.len() + draft.len() + 256);
    if let Some(summary) = summary {
        prompt.push_str(&format!("Conversation so far:\n{summary}\n\n"));
    }
    prompt.push_str(&format!(
        "Incoming email\n#Subject: {subject}\n#Body:\n{body}\n\n\
         Proofread the following reply:\n{draft}\n\n\
         Is this reply SENDABLE or should it be SKIPPED?"
    ));
    prompt
}

/// User prompt for the reply composer.
///
/// `feedback` is the previous rejected draft and the reason it was rejected.
pub fn compose_user_prompt(
    subject: &str,
    body: &str,
    sender: &str,
    summary: Option<&str>,
    feedback: Option<(&str, &str)>,
) -> String {
    let mut prompt = String::with_capacity(body.len() + 512);
    if let Some(summary) = summary {
        prompt.push_str(&format!("Conversation so far:\n{summary}\n\n"));
    }
    prompt.push_str(&format!(
        "Original email:\nFrom: {sender}\nSubject: {subject}\n\nBody:\n{body}\n\n"
    ));
    match feedback {
        Some((draft, reason)) => prompt.push_str(&format!(
            "A previous draft was rejected.\n\nPrevious draft:\n{draft}\n\n\
             Rejection reason:\n{reason}\n\n\
             Write an improved reply that fixes the problems described above."
        )),
        None => prompt.push_str("Please write a professional reply to this email."),
    }
    prompt
}

/// Render thread messages as one structured document, in the given order.
pub fn summarize_user_prompt(messages: &[ThreadMessage]) -> String {
    let mut doc = String::from("Summarize this email conversation:\n");
    for (i, msg) in messages.iter().enumerate() {
        doc.push_str(&format!(
            "\n--- Message {} ---\nFrom: {}\nSubject: {}\nBody:\n{}\n",
            i + 1,
            msg.sender,
            msg.subject,
            msg.body
        ));
    }
    doc
}
