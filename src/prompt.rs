use std::collections::VecDeque;

/// User interaction surface of the host
pub trait Prompt {
    /// Show a status line.
    fn message(&mut self, text: &str);

    /// Ask a yes/no question. Blocks until answered.
    fn confirm(&mut self, question: &str) -> bool;

    /// Offer `choices` but accept any free text. `None` when the user gives up.
    fn choose(&mut self, question: &str, choices: &[String]) -> Option<String>;
}

/// Prompt that answers from a script and records everything shown.
///
/// Unanswered confirmations are declined and unanswered choices give up.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    pub confirms: VecDeque<bool>,
    pub answers: VecDeque<Option<String>>,
    pub messages: Vec<String>,
    pub questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn answering(answer: Option<&str>) -> Self {
        let mut prompt = Self::default();
        prompt.answers.push_back(answer.map(str::to_string));
        prompt
    }

    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }
}

impl Prompt for ScriptedPrompt {
    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.confirms.pop_front().unwrap_or(false)
    }

    fn choose(&mut self, question: &str, _choices: &[String]) -> Option<String> {
        self.questions.push(question.to_string());
        self.answers.pop_front().flatten()
    }
}
