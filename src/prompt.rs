use dialoguer::{Confirm, theme::ColorfulTheme};

/// Abstraction over a boolean (yes/no) confirmation prompt.
///
/// Lets the destructive `apply` step ask for consent through an injectable
/// prompter, so the question can be mocked in tests.
pub trait ConfirmPrompter {
    /// Prompt the user for a yes/no confirmation.
    ///
    /// # Returns
    /// `Ok(true)` if confirmed, `Ok(false)` if declined, or `Err(String)` on input failure.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String>;
}

/// `ConfirmPrompter` backed by `dialoguer::Confirm` with `ColorfulTheme`.
pub struct DialoguerConfirmPrompter;

impl ConfirmPrompter for DialoguerConfirmPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
        let theme = ColorfulTheme::default();
        let confirm = Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(default);
        match confirm.interact() {
            Ok(v) => Ok(v),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Ask whether to replace `branch` with the `commits` recorded entries.
///
/// Defaults to "no": the rewrite cannot be undone by this tool.
pub fn confirm_apply<P: ConfirmPrompter>(
    prompter: &mut P,
    branch: &str,
    commits: usize,
) -> Result<bool, String> {
    let prompt = format!("Rewrite {} with {} commits?", branch, commits);
    prompter.confirm(&prompt, false)
}
