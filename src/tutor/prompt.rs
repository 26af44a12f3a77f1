#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Prompt templates and the renderer that fills them.
//!
//! Templates use `{name}` placeholders. `{{` and `}}` render as literal
//! braces, which the grading prompt needs for its JSON example.

use thiserror::Error;

/// Errors raised while rendering a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    /// A placeholder had no matching variable.
    #[error("Prompt placeholder `{{{0}}}` has no value.")]
    Unresolved(String),
    /// A `{` was opened but never closed.
    #[error("Prompt template has an unterminated placeholder starting at byte {0}.")]
    Unterminated(usize),
    /// A lone `}` appeared outside a placeholder.
    #[error("Prompt template has an unmatched `}}` at byte {0}.")]
    UnmatchedClose(usize),
}

/// Fills `template` with `variables`.
///
/// Every placeholder must be resolved; variables that the template never
/// mentions are ignored.
pub fn render(template: &str, variables: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, ch)) => name.push(ch),
                        None => return Err(PromptError::Unterminated(idx)),
                    }
                }

                let name = name.trim();
                let value = variables
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| PromptError::Unresolved(name.to_string()))?;
                out.push_str(value);
            }
            '}' => return Err(PromptError::UnmatchedClose(idx)),
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Prompt assets used by the tutor stages.
#[derive(Debug, Clone)]
pub struct TutorPrompts {
    /// Asks for a JSON grade of a learner's answer.
    grading:         String,
    /// Turns a grade into prose feedback.
    feedback:        String,
    /// Classifies feedback as `Clean` or `Flagged`.
    moderation:      String,
    /// Produces a short lesson on a topic.
    lesson:          String,
    /// Produces a practice exercise on a topic.
    exercise:        String,
    /// Free-form feedback on an answer, without grading.
    answer_feedback: String,
}

impl Default for TutorPrompts {
    fn default() -> Self {
        Self::load()
    }
}

impl TutorPrompts {
    /// Load prompt templates embedded in the binary.
    pub fn load() -> Self {
        Self {
            grading:         include_str!("prompts/grading.md").to_string(),
            feedback:        include_str!("prompts/feedback.md").to_string(),
            moderation:      include_str!("prompts/moderation.md").to_string(),
            lesson:          include_str!("prompts/lesson.md").to_string(),
            exercise:        include_str!("prompts/exercise.md").to_string(),
            answer_feedback: include_str!("prompts/answer_feedback.md").to_string(),
        }
    }

    /// Returns the grading template.
    pub fn grading(&self) -> &str {
        &self.grading
    }

    /// Returns the feedback template.
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// Returns the moderation template.
    pub fn moderation(&self) -> &str {
        &self.moderation
    }

    /// Returns the lesson template.
    pub fn lesson(&self) -> &str {
        &self.lesson
    }

    /// Returns the exercise template.
    pub fn exercise(&self) -> &str {
        &self.exercise
    }

    /// Returns the ungraded answer-feedback template.
    pub fn answer_feedback(&self) -> &str {
        &self.answer_feedback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_placeholder() {
        let out = render("Teach {language}: {topic}.", &[
            ("language", "French"),
            ("topic", "verbs"),
        ])
        .expect("render");
        assert_eq!(out, "Teach French: verbs.");
    }

    #[test]
    fn repeated_placeholders_use_the_same_value() {
        let out = render("{x} and {x}", &[("x", "a")]).expect("render");
        assert_eq!(out, "a and a");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let out = render("{{\"mark\": {n}}}", &[("n", "8")]).expect("render");
        assert_eq!(out, "{\"mark\": 8}");
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let err = render("Hello {name}", &[("other", "x")]).unwrap_err();
        assert_eq!(err, PromptError::Unresolved("name".into()));
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        let err = render("Hello {name", &[("name", "x")]).unwrap_err();
        assert_eq!(err, PromptError::Unterminated(6));
    }

    #[test]
    fn stray_close_brace_is_an_error() {
        let err = render("oops }", &[]).unwrap_err();
        assert_eq!(err, PromptError::UnmatchedClose(5));
    }

    #[test]
    fn values_are_not_rescanned() {
        let out = render("{a}", &[("a", "{b}")]).expect("render");
        assert_eq!(out, "{b}");
    }

    #[test]
    fn embedded_templates_render_with_their_variables() {
        let prompts = TutorPrompts::load();
        let grading = render(prompts.grading(), &[("language", "German"), ("answer", "Ich bin")])
            .expect("grading renders");
        assert!(grading.contains("\"mark\""));
        assert!(grading.contains("Ich bin"));

        render(prompts.feedback(), &[
            ("language", "German"),
            ("mark", "7"),
            ("mistakes", "- none"),
        ])
        .expect("feedback renders");
        render(prompts.moderation(), &[("language", "German"), ("feedback", "ok")])
            .expect("moderation renders");
        render(prompts.lesson(), &[("language", "German"), ("topic", "cases")])
            .expect("lesson renders");
        render(prompts.exercise(), &[("language", "German"), ("topic", "cases")])
            .expect("exercise renders");
        render(prompts.answer_feedback(), &[("language", "German"), ("answer", "x")])
            .expect("answer feedback renders");
    }
}
