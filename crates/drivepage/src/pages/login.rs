// LoginPage - Sign-in screen

use super::PageObject;
use crate::error::{Error, Result};
use crate::interaction::Interactions;
use crate::locator::Locator;
use async_trait::async_trait;
use regex::Regex;

pub struct LoginPage {
    ui: Interactions,
    email: Locator,
    password: Locator,
    submit: Locator,
    error: Locator,
}

impl LoginPage {
    pub const PATH: &'static str = "/login";

    pub fn new(ui: Interactions) -> Self {
        Self {
            ui,
            email: Locator::label("Email"),
            password: Locator::label("Password"),
            submit: Locator::role_named("button", "Sign in"),
            error: Locator::role("alert"),
        }
    }

    pub async fn enter_email(&self, email: &str) -> Result<()> {
        self.ui.fill(&self.email, email).await
    }

    pub async fn enter_password(&self, password: &str) -> Result<()> {
        self.ui.fill(&self.password, password).await
    }

    pub async fn submit(&self) -> Result<()> {
        self.ui.click(&self.submit).await
    }

    /// Fills the form and submits it. Does not wait for the outcome.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        tracing::info!(email, "signing in");
        self.enter_email(email).await?;
        self.enter_password(password).await?;
        self.submit().await
    }

    /// Signs in and waits for the URL path to match `landing`.
    ///
    /// Not reaching the landing page within the navigation timeout is an
    /// [`Error::AuthenticationFailed`] that includes any error shown on the form.
    pub async fn login_and_wait(&self, email: &str, password: &str, landing: &Regex) -> Result<()> {
        self.login(email, password).await?;
        let timeout = self.ui.timeouts().navigation;
        match self.ui.wait_for_path(landing, timeout).await {
            Ok(()) => {
                tracing::info!(url = %self.ui.current_url(), "signed in");
                Ok(())
            }
            Err(e) if e.is_timeout() => {
                let shown = self.error_message().await;
                let detail = match shown {
                    Some(text) => format!("the form reported '{text}'"),
                    None => format!("still on '{}'", self.ui.current_url()),
                };
                Err(Error::AuthenticationFailed(format!(
                    "no URL path matching /{}/ within {timeout:?}; {detail}",
                    landing.as_str()
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Text of the form's error banner, if one is showing.
    pub async fn error_message(&self) -> Option<String> {
        if !self.ui.is_visible(&self.error).await {
            return None;
        }
        self.ui
            .get_text(&self.error)
            .await
            .ok()
            .filter(|text| !text.is_empty())
    }
}

#[async_trait]
impl PageObject for LoginPage {
    fn path(&self) -> &str {
        Self::PATH
    }

    fn interactions(&self) -> &Interactions {
        &self.ui
    }

    fn page_name(&self) -> &str {
        "LoginPage"
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_visible(&self.submit).await && self.ui.is_visible(&self.email).await
    }
}
