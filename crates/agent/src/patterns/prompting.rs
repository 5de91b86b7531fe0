//! Zero-shot and few-shot prompting.
//!
//! Both are a single stateless chat-completion call: a system prompt, a
//! scripted history so the model sees earlier turns, and the new question.
//! Few-shot differs only in that its system prompt carries worked Q/A pairs.

use promptlab_core::error::ProviderError;
use promptlab_core::message::Message;
use promptlab_core::provider::ProviderRequest;
use promptlab_providers::RoutedModel;
use tracing::debug;

const TUTOR_PERSONA: &str = "\
You are CodeBuddy, the assistant of an online coding school.
You are an expert in JavaScript and JavaScript is the only programming language you know.
If the user asks anything that is not a JavaScript coding question, politely decline to answer it.
Always answer as a representative of the school.";

const TUTOR_EXAMPLES: &str = "\
Examples:
Q: Hey there
A: Hey, nice to meet you! How can I help you today? Want to see what we are teaching this month?

Q: Hey, I want to learn JavaScript
A: Great choice! Have a look at our website or our video channel to pick a course.

Q: I am bored
A: How about a quick JavaScript quiz?

Q: Can you write this code in Python?
A: I could, but I am designed to help with JavaScript only.";

/// A system prompt plus the turns that precede the user's question.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub system: String,
    pub history: Vec<Message>,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            history: Vec::new(),
        }
    }

    /// Append a user turn followed by the assistant's reply.
    pub fn with_exchange(mut self, user: impl Into<String>, assistant: impl Into<String>) -> Self {
        self.history.push(Message::user(user));
        self.history.push(Message::assistant(assistant));
        self
    }

    /// The JavaScript tutor persona with no examples.
    pub fn zero_shot_demo() -> Self {
        Self::new(TUTOR_PERSONA).with_demo_history()
    }

    /// The JavaScript tutor persona with four worked examples.
    pub fn few_shot_demo() -> Self {
        Self::new(format!("{TUTOR_PERSONA}\n\n{TUTOR_EXAMPLES}")).with_demo_history()
    }

    fn with_demo_history(self) -> Self {
        self.with_exchange(
            "Hey, my name is Alex Morgan",
            "Hello Alex Morgan! How can I assist you today?",
        )
        .with_exchange(
            "What is my name?",
            "Your name is Alex Morgan. How can I help you further?",
        )
    }

    /// System prompt, history, then `question` as the final user turn.
    pub fn messages(&self, question: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::system(&self.system));
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(question));
        messages
    }
}

/// The model's answer and the model id that produced it.
#[derive(Debug, Clone)]
pub struct PromptAnswer {
    pub model: String,
    pub content: String,
}

/// Send one templated prompt and return the answer.
pub async fn run_prompt(
    routed: &RoutedModel,
    template: &PromptTemplate,
    question: &str,
    temperature: f32,
) -> Result<PromptAnswer, ProviderError> {
    let request = ProviderRequest::new(&routed.model, template.messages(question))
        .with_temperature(temperature);

    debug!(
        model = %routed.model,
        history = template.history.len(),
        "Sending templated prompt"
    );

    let response = routed.provider.complete(request).await?;
    Ok(PromptAnswer {
        model: response.model,
        content: response.message.content,
    })
}
