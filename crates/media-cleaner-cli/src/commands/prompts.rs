use crate::output::Output;
use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

fn read_failed(what: &str, e: dialoguer::Error, output: Option<&Output>) -> color_eyre::Report {
    if let Some(out) = output {
        out.error(format!("Failed to read {}: {}", what, e));
    }
    color_eyre::eyre::eyre!("Failed to read {}: {}", what, e)
}

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_builder = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true);

    if let Some(default_value) = default {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder.interact_text().map_err(|e| read_failed("input", e, None))
}

/// Masked input, for API keys
pub fn prompt_password(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| read_failed("secret", e, None))
}

pub fn prompt_yes_no(prompt: &str, default: Option<bool>) -> Result<bool> {
    prompt_yes_no_with_output(prompt, default, None)
}

pub fn prompt_yes_no_with_output(prompt: &str, default: Option<bool>, output: Option<&Output>) -> Result<bool> {
    let mut confirm_builder = Confirm::new().with_prompt(prompt);

    if let Some(default_value) = default {
        confirm_builder = confirm_builder.default(default_value);
    }

    confirm_builder.interact().map_err(|e| read_failed("confirmation", e, output))
}

/// Re-prompts until the input parses as a non-negative number
pub fn prompt_number_with_output(prompt: &str, default: Option<u32>, output: Option<&Output>) -> Result<u32> {
    loop {
        let mut input_builder = Input::<String>::new().with_prompt(prompt).allow_empty(true);

        if let Some(default_value) = default {
            input_builder = input_builder.default(default_value.to_string());
        }

        let input_str = input_builder
            .interact_text()
            .map_err(|e| read_failed("input", e, output))?;
        let trimmed = input_str.trim();

        let parsed = if trimmed.is_empty() {
            default
        } else {
            trimmed.parse::<u32>().ok()
        };

        match parsed {
            Some(num) => return Ok(num),
            None => match output {
                Some(out) => out.error("Invalid input. Please enter a valid number."),
                None => eprintln!("Invalid input. Please enter a valid number."),
            },
        }
    }
}
