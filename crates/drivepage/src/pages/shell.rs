// AppShell - Chrome shared by every authenticated screen

use super::PageObject;
use crate::error::Result;
use crate::interaction::Interactions;
use crate::locator::Locator;
use async_trait::async_trait;

pub struct AppShell {
    ui: Interactions,
    user_menu: Locator,
    sign_out: Locator,
}

impl AppShell {
    pub fn new(ui: Interactions) -> Self {
        Self {
            ui,
            user_menu: Locator::role_named("button", "Account"),
            sign_out: Locator::role_exact("menuitem", "Sign out"),
        }
    }

    pub async fn open_user_menu(&self) -> Result<()> {
        self.ui.click(&self.user_menu).await?;
        self.ui.wait_for_visible(&self.sign_out).await
    }

    /// Signs out and waits until the account menu is gone.
    pub async fn logout(&self) -> Result<()> {
        tracing::info!("signing out");
        self.open_user_menu().await?;
        self.ui.click(&self.sign_out).await?;
        self.ui.wait_for_hidden(&self.user_menu).await
    }

    /// True if the account menu is showing. Never fails.
    pub async fn is_authenticated(&self) -> bool {
        self.ui.is_visible(&self.user_menu).await
    }
}

#[async_trait]
impl PageObject for AppShell {
    fn path(&self) -> &str {
        "/"
    }

    fn interactions(&self) -> &Interactions {
        &self.ui
    }

    fn page_name(&self) -> &str {
        "AppShell"
    }

    async fn is_displayed(&self) -> bool {
        self.is_authenticated().await
    }
}
