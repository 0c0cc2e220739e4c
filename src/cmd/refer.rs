//! The interactive popup: `refer-earn refer`.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use refer_common::{Course, Relationship};

use refer_earn::backend::HttpBackend;
use refer_earn::config::ReferConfig;
use refer_earn::controller::{ReferralController, View};
use refer_earn::errors::FlowError;
use refer_earn::notify::{Notification, Notifier};
use refer_earn::referral::ReferralForm;
use refer_earn::ui::PopupUI;
use refer_earn::ui::icons::{KEY, MAIL};

type Controller = ReferralController<HttpBackend, PopupUI>;

const KEPT_FOR_LATER: &str = "Your details are kept for the next time you refer a friend";

/// Inputs of the identity step, kept across retries.
#[derive(Default)]
struct IdentityInputs {
    name: String,
    email: String,
}

/// What the popup loop does after a step fails.
#[derive(Debug, PartialEq, Eq)]
enum Recovery {
    /// Show the per-field messages and run the step again.
    ShowFieldErrors,
    /// The backend call failed; ask before running the step again.
    OfferRetry,
    /// End the command with this error.
    Abort,
}

fn recovery_for(err: &anyhow::Error) -> Recovery {
    match err.downcast_ref::<FlowError>() {
        Some(FlowError::Validation(_)) => Recovery::ShowFieldErrors,
        Some(flow) if flow.is_backend() => Recovery::OfferRetry,
        _ => Recovery::Abort,
    }
}

pub async fn cmd_refer(config: &ReferConfig) -> Result<()> {
    if !console::user_attended() {
        anyhow::bail!("'refer-earn refer' needs an interactive terminal");
    }

    let ui = PopupUI::new();
    ui.banner(&config.toml.rewards);

    let backend = HttpBackend::new(&config.backend_url, config.timeout)
        .context("Failed to create HTTP client")?;
    let controller = ReferralController::new(backend, ui.clone());

    let theme = ColorfulTheme::default();
    if !confirm(&theme, "Refer a friend now?", true)? {
        return Ok(());
    }
    controller.open();

    let mut identity = IdentityInputs::default();

    loop {
        let outcome = match controller.current_view() {
            View::Closed => break,
            View::CollectIdentity => {
                collect_identity(&controller, &ui, &theme, &mut identity).await
            }
            View::EnterCode => enter_code(&controller, &ui, &theme).await,
            View::ReferralForm => fill_referral(&controller, &ui, &theme).await,
        };

        let Err(err) = outcome else {
            continue;
        };
        match recovery_for(&err) {
            Recovery::ShowFieldErrors => {
                if let Some(errors) = err
                    .downcast_ref::<FlowError>()
                    .and_then(FlowError::field_errors)
                {
                    ui.field_errors(errors);
                }
            }
            Recovery::OfferRetry => {
                if !confirm(&theme, "Try again?", true)? {
                    controller.close();
                    ui.notify(Notification::info(KEPT_FOR_LATER));
                }
            }
            Recovery::Abort => return Err(err),
        }
    }

    Ok(())
}

async fn collect_identity(
    controller: &Controller,
    ui: &PopupUI,
    theme: &ColorfulTheme,
    inputs: &mut IdentityInputs,
) -> Result<()> {
    ui.heading("Verify your email");
    inputs.name = text(theme, "Referrer Name", &inputs.name)?;
    inputs.email = text(theme, &format!("{}Referrer Email", MAIL), &inputs.email)?;

    let _pending = ui.pending("Sending OTP...");
    controller.request_code(&inputs.name, &inputs.email).await?;
    Ok(())
}

async fn enter_code(controller: &Controller, ui: &PopupUI, theme: &ColorfulTheme) -> Result<()> {
    let email = controller.pending_email().unwrap_or_default();
    ui.heading(&format!("Enter the code sent to {}", email));
    let code = text(theme, &format!("{}OTP", KEY), "")?;

    let _pending = ui.pending("Verifying OTP...");
    controller.verify_code(&email, &code).await?;
    Ok(())
}

async fn fill_referral(
    controller: &Controller,
    ui: &PopupUI,
    theme: &ColorfulTheme,
) -> Result<()> {
    ui.heading("Refer a friend");
    let mut form = controller.draft();
    edit_form(theme, &mut form)?;

    if !confirm(theme, "Submit referral?", true)? {
        controller.close();
        ui.notify(Notification::info(KEPT_FOR_LATER));
        return Ok(());
    }

    let _pending = ui.pending("Submitting referral...");
    controller.submit(form).await?;
    Ok(())
}

fn edit_form(theme: &ColorfulTheme, form: &mut ReferralForm) -> Result<()> {
    form.referrer_name = text(theme, "Your Name", &form.referrer_name)?;
    form.referrer_email = text(theme, "Your Email", &form.referrer_email)?;
    form.referrer_phone = text(theme, "Your Phone (optional)", &form.referrer_phone)?;
    form.referee_name = text(theme, "Friend's Name", &form.referee_name)?;
    form.referee_email = text(theme, "Friend's Email", &form.referee_email)?;
    form.referee_phone = text(theme, "Friend's Phone (optional)", &form.referee_phone)?;

    let labels: Vec<&str> = Course::ALL.iter().map(|c| c.label()).collect();
    let current = form
        .course
        .parse::<Course>()
        .ok()
        .and_then(|c| Course::ALL.iter().position(|x| *x == c));
    if let Some(course) = Course::ALL.get(pick(theme, "Course", &labels, current)?) {
        form.course = course.token().to_string();
    }

    form.start_date = text(
        theme,
        "Preferred Start Date (YYYY-MM-DD, optional)",
        &form.start_date,
    )?;

    let labels: Vec<&str> = Relationship::ALL.iter().map(|r| r.as_str()).collect();
    let current = form
        .relationship
        .parse::<Relationship>()
        .ok()
        .and_then(|r| Relationship::ALL.iter().position(|x| *x == r));
    if let Some(relationship) = Relationship::ALL.get(pick(theme, "Relationship", &labels, current)?)
    {
        form.relationship = relationship.as_str().to_string();
    }

    form.how_did_you_hear = text(
        theme,
        "How did you hear about us? (optional)",
        &form.how_did_you_hear,
    )?;
    form.referral_message = text(
        theme,
        "Message to your friend (optional)",
        &form.referral_message,
    )?;
    form.terms_accepted = confirm(
        theme,
        "I accept the terms and conditions",
        form.terms_accepted,
    )?;
    Ok(())
}

/// Prompt for text, pre-filled with `current`.
fn text(theme: &ColorfulTheme, prompt: &str, current: &str) -> Result<String> {
    Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()
        .context("Failed to read user input")
}

fn pick(
    theme: &ColorfulTheme,
    prompt: &str,
    items: &[&str],
    current: Option<usize>,
) -> Result<usize> {
    Select::with_theme(theme)
        .with_prompt(prompt)
        .items(items)
        .default(current.unwrap_or(0))
        .interact()
        .context("Failed to read selection")
}

fn confirm(theme: &ColorfulTheme, prompt: &str, default: bool) -> Result<bool> {
    Confirm::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .interact()
        .context("Failed to read answer")
}

#[cfg(test)]
mod tests {
    use super::*;
    use refer_earn::backend::Endpoint;
    use refer_earn::errors::BackendError;
    use refer_earn::validate::check_identity;

    #[test]
    fn test_prompt_read_failure_ends_the_command() {
        let read: std::result::Result<String, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        ));
        let err = read.context("Failed to read user input").unwrap_err();

        assert_eq!(recovery_for(&err), Recovery::Abort);
    }

    #[test]
    fn test_validation_failure_shows_field_errors() {
        let errors = check_identity("", "").unwrap_err();
        let err = anyhow::Error::from(FlowError::from(errors));

        assert_eq!(recovery_for(&err), Recovery::ShowFieldErrors);
    }

    #[test]
    fn test_backend_failure_offers_retry() {
        let err = anyhow::Error::from(FlowError::from(BackendError::Status {
            endpoint: Endpoint::VerifyOtp,
            status: 401,
        }));

        assert_eq!(recovery_for(&err), Recovery::OfferRetry);
    }

    #[test]
    fn test_local_refusals_end_the_command() {
        let err = anyhow::Error::from(FlowError::PopupClosed);
        assert_eq!(recovery_for(&err), Recovery::Abort);

        let err = anyhow::Error::from(FlowError::Busy(Endpoint::Refer));
        assert_eq!(recovery_for(&err), Recovery::Abort);
    }
}
