use dialoguer::{Confirm, Input, theme::ColorfulTheme};

/// Abstraction over a string input prompt.
///
/// Implementors define how string input is collected from the user,
/// including any styling or interactivity. This trait enables testability
/// by decoupling user input from the logic that consumes it.
pub trait StringPrompter {
    /// Prompt the user for a string input.
    ///
    /// # Parameters
    /// - `prompt`: The message shown to the user.
    /// - `default`: Default value if the user presses Enter without input.
    ///
    /// # Returns
    /// `Ok(String)` if input is successfully collected, or an `Err(String)` describing the failure.
    fn prompt(&mut self, prompt: &str, default: &str) -> Result<String, String>;
}

/// Abstraction over a boolean (yes/no) confirmation prompt.
pub trait ConfirmPrompter {
    /// Prompt the user for a yes/no confirmation.
    ///
    /// # Returns
    /// `Ok(true)` if confirmed, `Ok(false)` if declined, or `Err(String)` on input failure.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String>;
}

/// `StringPrompter` backed by `dialoguer::Input` with `ColorfulTheme`.
pub struct DialoguerStringPrompter;

impl StringPrompter for DialoguerStringPrompter {
    fn prompt(&mut self, prompt: &str, default: &str) -> Result<String, String> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme).with_prompt(prompt);
        // An empty default would be accepted silently on Enter.
        if !default.is_empty() {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(|e| e.to_string())
    }
}

/// `ConfirmPrompter` backed by `dialoguer::Confirm` with `ColorfulTheme`.
pub struct DialoguerConfirmPrompter;

impl ConfirmPrompter for DialoguerConfirmPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
        let theme = ColorfulTheme::default();
        Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|e| e.to_string())
    }
}

/// Prompt for a value of the new identity, e.g. `"New author name"`.
///
/// # Parameters
/// - `prompter`: A mutable reference to a `StringPrompter` implementation.
/// - `label`: What is being requested (e.g., `"name"`).
/// - `default_value`: A fallback if the user presses Enter without typing.
///
/// # Returns
/// - `Ok(String)` containing user input or the default, trimmed.
/// - `Err(String)` if the input could not be collected.
pub fn ask<P: StringPrompter>(
    prompter: &mut P,
    label: &str,
    default_value: &str,
) -> Result<String, String> {
    let prompt = format!("New author {}", label);
    prompter
        .prompt(&prompt, default_value)
        .map(|v| v.trim().to_string())
}

/// Ask the user to confirm rewriting history in `repo_count` repositories.
///
/// Defaults to "no": the rewrite replaces every commit hash.
pub fn confirm_rewrite<P: ConfirmPrompter>(
    prompter: &mut P,
    repo_count: usize,
) -> Result<bool, String> {
    let noun = if repo_count == 1 {
        "repository"
    } else {
        "repositories"
    };
    let prompt = format!("Rewrite history of {} {}?", repo_count, noun);
    prompter.confirm(&prompt, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStringPrompter {
        pub response: Result<String, String>,
        pub expected_prompt: String,
        pub expected_default: String,
    }

    impl StringPrompter for MockStringPrompter {
        fn prompt(&mut self, prompt: &str, default: &str) -> Result<String, String> {
            assert_eq!(prompt, self.expected_prompt);
            assert_eq!(default, self.expected_default);
            self.response.clone()
        }
    }

    struct MockConfirmPrompter {
        pub response: Result<bool, String>,
        pub expected_prompt: String,
    }

    impl ConfirmPrompter for MockConfirmPrompter {
        fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
            assert_eq!(prompt, self.expected_prompt);
            assert!(!default);
            self.response.clone()
        }
    }

    #[test]
    fn test_ask_returns_trimmed_input() {
        let mut prompter = MockStringPrompter {
            response: Ok("  Alice ".to_string()),
            expected_prompt: "New author name".to_string(),
            expected_default: "Jane Doe".to_string(),
        };
        let result = ask(&mut prompter, "name", "Jane Doe");
        assert_eq!(result.unwrap(), "Alice");
    }

    #[test]
    fn test_ask_returns_error() {
        let mut prompter = MockStringPrompter {
            response: Err("input failed".to_string()),
            expected_prompt: "New author email".to_string(),
            expected_default: "".to_string(),
        };
        let result = ask(&mut prompter, "email", "");
        assert!(result.is_err());
    }

    #[test]
    fn test_confirm_rewrite_pluralises() {
        let mut prompter = MockConfirmPrompter {
            response: Ok(true),
            expected_prompt: "Rewrite history of 3 repositories?".to_string(),
        };
        assert_eq!(confirm_rewrite(&mut prompter, 3).unwrap(), true);

        let mut prompter = MockConfirmPrompter {
            response: Ok(false),
            expected_prompt: "Rewrite history of 1 repository?".to_string(),
        };
        assert_eq!(confirm_rewrite(&mut prompter, 1).unwrap(), false);
    }

    #[test]
    fn test_confirm_rewrite_error() {
        let mut prompter = MockConfirmPrompter {
            response: Err("confirm failed".to_string()),
            expected_prompt: "Rewrite history of 2 repositories?".to_string(),
        };
        assert!(confirm_rewrite(&mut prompter, 2).is_err());
    }
}
