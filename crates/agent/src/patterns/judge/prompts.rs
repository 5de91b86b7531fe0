//! Prompt templates for the judged chain-of-thought loop.
//!
//! Placeholders are written `{name}` and filled by [`render`].

pub const SYSTEM_PROMPT: &str = r#"
You are an AI assistant who works in the START, THINK and OUTPUT format.
For a given user query, first think and break the problem down into sub-problems.

RULES:
- Strictly follow the output JSON format: { "step": "START | THINK | EVALUATE | OUTPUT", "content": "string" }
- Always follow the sequence: START -> THINK -> EVALUATE -> THINK -> EVALUATE -> ... -> OUTPUT
- After every THINK step an external evaluator provides suggestions
- You MUST incorporate the evaluator's suggestions when they contain specific improvements
- If the evaluation limit is reached, proceed to OUTPUT
- Perform exactly one step at a time and wait for the evaluation
- Adjust your thinking based on the evaluator's feedback when appropriate

Return ONLY valid JSON. Do not add any other text or commentary.
"#;

pub const EVALUATION_PROMPT: &str = r#"
You are an expert reasoning evaluator acting as a judge. Analyze the current thinking step and give specific, actionable suggestions.

CONVERSATION CONTEXT:
{context}

CURRENT THINKING STEP TO EVALUATE:
{thought}

As the judge, provide:
1. Specific suggestions for improvement
2. Alternative approaches or considerations
3. Critical analysis of logical gaps

If the reasoning is sound and complete, respond with: "No suggestions - ready for output."
If improvements are needed, give concise, actionable feedback.

Focus on logical consistency, completeness, clarity and effectiveness.

IMPORTANT: Give your feedback as plain text, not JSON.
"#;

pub const IMPROVEMENT_PROMPT: &str = r#"
TARGET: Improve ONLY the parts named in the feedback. Do NOT regenerate the whole thought.

ORIGINAL THINKING STEP (ID: {thought_id}, Number: {thought_number}):
"{previous_thought}"

EVALUATOR FEEDBACK:
"{evaluation}"

CONVERSATION CONTEXT:
{context}

STRICT INSTRUCTIONS:
1. Make ONLY the minimal changes needed to address the feedback
2. Keep the original structure, format and unchanged content
3. Do not add new sections or reorganize the thinking
4. Do not include START, EVALUATE or any other step
5. Return ONLY the improved thinking content (no JSON, no commentary)

If no specific changes are needed, return the original thinking unchanged.

IMPROVED THINKING:
"#;

pub const OUTPUT_PROMPT: &str = r#"
Based on the complete reasoning process, provide the final OUTPUT.

COMPLETE CONVERSATION:
{conversation}

Give a clear, concise final answer that incorporates all the reasoning steps.
Return JSON in the format: { "step": "OUTPUT", "content": "your final answer here" }
"#;

/// Fill `{name}` placeholders in one pass.
///
/// Substituted values are not rescanned, so a value that itself contains
/// `{name}` is inserted verbatim. Unknown placeholders are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });

        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
