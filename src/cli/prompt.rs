use anyhow::Result;
use inquire::{
    autocompletion::Replacement,
    list_option::ListOption,
    validator::{StringValidator, Validation},
    Autocomplete, CustomUserError, InquireError, MultiSelect, Password, PasswordDisplayMode,
    Select, Text,
};

use crate::error::WakalogError;

/// Interactive questions asked during a run. Every call blocks until the user answers.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync {
    /// Pick exactly one of `options`.
    fn select(&self, message: &str, options: Vec<String>) -> Result<String>;

    /// Pick at least one of `options`.
    fn multi_select(&self, message: &str, options: Vec<String>) -> Result<Vec<String>>;

    /// Free text that has to match one of `allowed` exactly. `allowed` doubles as suggestions.
    fn input_one_of(&self, message: &str, allowed: Vec<String>) -> Result<String>;

    /// Non-empty hidden input.
    fn secret(&self, message: &str) -> Result<String>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select(&self, message: &str, options: Vec<String>) -> Result<String> {
        Select::new(message, options).prompt().map_err(into_error)
    }

    fn multi_select(&self, message: &str, options: Vec<String>) -> Result<Vec<String>> {
        MultiSelect::new(message, options)
            .with_validator(|selected: &[ListOption<&String>]| {
                if selected.is_empty() {
                    Ok(Validation::Invalid(
                        "Select a project (using space) to proceed.".into(),
                    ))
                } else {
                    Ok(Validation::Valid)
                }
            })
            .prompt()
            .map_err(into_error)
    }

    fn input_one_of(&self, message: &str, allowed: Vec<String>) -> Result<String> {
        Text::new(message)
            .with_placeholder("Enter Name...")
            .with_autocomplete(Suggestions(allowed.clone()))
            .with_validator(OneOf(allowed))
            .prompt()
            .map_err(into_error)
    }

    fn secret(&self, message: &str) -> Result<String> {
        Password::new(message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(|value: &str| {
                if value.trim().is_empty() {
                    Ok(Validation::Invalid("A value is required to proceed.".into()))
                } else {
                    Ok(Validation::Valid)
                }
            })
            .prompt()
            .map_err(into_error)
    }
}

fn into_error(error: InquireError) -> anyhow::Error {
    match error {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            WakalogError::Cancelled.into()
        }
        other => anyhow::Error::new(other).context("error running prompt"),
    }
}

#[derive(Clone)]
struct Suggestions(Vec<String>);

impl Autocomplete for Suggestions {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        Ok(matching(&self.0, input))
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}

#[derive(Clone)]
struct OneOf(Vec<String>);

impl StringValidator for OneOf {
    fn validate(&self, input: &str) -> Result<Validation, CustomUserError> {
        Ok(check_one_of(&self.0, input))
    }
}

/// Case insensitive substring matches, used only for suggestions. Validation stays exact.
fn matching(options: &[String], input: &str) -> Vec<String> {
    let input = input.to_lowercase();
    options
        .iter()
        .filter(|v| v.to_lowercase().contains(&input))
        .cloned()
        .collect()
}

fn check_one_of(allowed: &[String], input: &str) -> Validation {
    if input.is_empty() {
        Validation::Invalid("Your name is required to proceed.".into())
    } else if !allowed.iter().any(|v| v == input) {
        Validation::Invalid("Name not found on sheet.".into())
    } else {
        Validation::Valid
    }
}
