//! Stage Prompt Templates
//!
//! Builds the conversation for each pipeline stage. Each builder takes the
//! stage's inputs and returns the messages sent to the model, keeping the
//! wording in one place so the orchestrator stays free of template text.

use crate::constants::pipeline::PRESENTER_MARKER;
use crate::gateway::ChatMessage;

/// Stage 1: analyze the user's original prompt.
pub fn analysis(prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Analyze this prompt: '{prompt}'\n\n\
         Focus on:\n\
         1. Core requirements and goals\n\
         2. Key components needed\n\
         3. Specific constraints or parameters\n\
         4. Expected output format\n\
         5. Quality criteria\n\n\
         Provide a clear, focused analysis that will help in \
         improving this exact prompt."
    ))]
}

/// Stage 2: propose improvements from the analysis.
pub fn generation(analysis: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Based on this analysis: '{analysis}'\n\n\
         Generate specific improvements that:\n\
         1. Address identified issues\n\
         2. Enhance clarity and specificity\n\
         3. Add necessary structure\n\
         4. Maintain focus on core goals\n\
         5. Consider all quality criteria\n\n\
         Important: Generate practical, focused improvements \
         that directly enhance the prompt."
    ))]
}

/// Stage 3: vet the proposed improvements.
pub fn vetting(improvements: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Review these suggested improvements: '{improvements}'\n\n\
         Evaluate how well they enhance the original prompt:\n\
         1. Do they address core requirements?\n\
         2. Are they clear and specific?\n\
         3. Do they maintain focus on the task?\n\
         4. Are they practical and implementable?\n\n\
         Important: Focus on validating improvements that \
         directly enhance the original prompt."
    ))]
}

/// Stage 4: produce an improved prompt from the vetting report.
pub fn finalization(original_prompt: &str, vetting_report: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Original Prompt: {original_prompt}\n\
         Validated Improvements: {vetting_report}\n\n\
         Create an improved version that:\n\
         1. Maintains the original goal\n\
         2. Incorporates validated improvements\n\
         3. Uses clear, specific language\n\
         4. Adds necessary structure\n\
         5. Includes any required constraints\n\n\
         Important: Stay focused on the original task."
    ))]
}

/// Stage 5: polish the improved prompt.
pub fn enhancement(final_prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Polish and refine this prompt:\n\n\
         {final_prompt}\n\n\
         Focus on:\n\
         1. Making instructions crystal clear\n\
         2. Adding any missing details\n\
         3. Improving structure\n\
         4. Ensuring completeness\n\
         5. Maintaining focus\n\n\
         Important: Stay focused on improving THIS prompt."
    ))]
}

/// Stage 6a: combine every intermediate version into one refined prompt.
#[allow(clippy::too_many_arguments)]
pub fn comprehensive(
    original_prompt: &str,
    analysis: &str,
    solutions: &str,
    vetting_report: &str,
    final_prompt: &str,
    enhanced_prompt: &str,
) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Review all versions of this prompt and create an \
         improved version that combines the best elements:\n\n\
         Original: {original_prompt}\n\
         Analysis: {analysis}\n\
         Solutions: {solutions}\n\
         Vetting: {vetting_report}\n\
         Final: {final_prompt}\n\
         Enhanced: {enhanced_prompt}\n\n\
         Create a refined version that maintains the core \
         intent while maximizing clarity and effectiveness."
    ))]
}

/// Stage 6b: presenter cleanup of the combined draft.
pub fn presentation(draft: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "You are the final presenter. Clean up this prompt \
         for presentation:\n\n{draft}\n\n\
         Requirements:\n\
         1. Remove any markdown formatting\n\
         2. Remove any meta-commentary\n\
         3. Remove any section headers\n\
         4. Present as clean paragraphs\n\
         5. Maintain all important content\n\n\
         Start your response with '{PRESENTER_MARKER}' followed \
         by the final, clean prompt."
    ))]
}

/// Solve mode: answer the problem directly, nothing else.
pub fn solve(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are a precise solver. Follow the problem instructions and \
             return ONLY the final answer in the required format. Do not restate \
             the problem and do not add explanations.",
        ),
        ChatMessage::user(prompt),
    ]
}

/// Solve mode: verify (and correct) a proposed answer.
pub fn verify(prompt: &str, answer: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "Verify the proposed answer against the problem. If incorrect, \
             produce the corrected answer. Return ONLY the final answer in the \
             required format with no explanation.",
        ),
        ChatMessage::user(format!("Problem:\n{prompt}\n\nProposed answer:\n{answer}")),
    ]
}

/// Boost mode: ask the model to critique its own draft.
pub fn reflection_critique(base: &[ChatMessage], draft: &str) -> Vec<ChatMessage> {
    let mut messages = base.to_vec();
    messages.push(ChatMessage::assistant(draft));
    messages.push(ChatMessage::system(
        "Critique the previous response for completeness, accuracy, clarity, \
         structure, relevance. Identify weaknesses and suggest improvements.",
    ));
    messages.push(ChatMessage::user("Provide critique."));
    messages
}

/// Boost mode: revise the draft using the critique.
pub fn reflection_revise(base: &[ChatMessage], draft: &str, critique: &str) -> Vec<ChatMessage> {
    let mut messages = base.to_vec();
    messages.push(ChatMessage::assistant(draft));
    messages.push(ChatMessage::user(format!(
        "Improve using this critique: {critique}"
    )));
    messages
}
