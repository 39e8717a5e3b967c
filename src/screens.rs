//! Presenter-level state for the login, registration and recipe screens.
//!
//! Nothing here renders; callers read the resulting state and draw it however
//! they like.

use bytes::Bytes;
use std::sync::Arc;
use url::Url;

use crate::api::RecipeApi;
use crate::changes::ChangeRecord;
use crate::config::Layout;
use crate::error::{ClientError, ClientResult};
use crate::images::ImageCache;
use crate::manager::RecipeManager;
use crate::mirror::RecipeListView;
use crate::models::{Credentials, Recipe, RecipeParams};
use crate::session::{Session, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Email and password are required")]
    Incomplete,

    #[error("Login failed: {0}")]
    LoginFailed(#[source] ClientError),
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    /// Sign in and persist the session.
    pub async fn submit<A: RecipeApi + ?Sized>(
        &self,
        api: &A,
        session: &SessionStore,
    ) -> Result<Session, LoginError> {
        if !self.can_submit() {
            return Err(LoginError::Incomplete);
        }

        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        };
        let token = api
            .sign_in(&credentials)
            .await
            .map_err(LoginError::LoginFailed)?;

        let session = session
            .save(&token, &self.email)
            .map_err(LoginError::LoginFailed)?;
        tracing::info!(email = %session.email, "signed in");
        Ok(session)
    }
}

/// Create an account. Returns the new account id when the server sends one.
pub async fn register<A: RecipeApi + ?Sized>(
    api: &A,
    credentials: &Credentials,
) -> ClientResult<Option<String>> {
    let id = api.sign_up(credentials).await?;
    tracing::info!(email = %credentials.email, "account created");
    Ok(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Nothing loaded from the server yet.
    Idle,
    Ready,
    /// Full-screen retry.
    TryAgain,
    /// The session ended; show the login screen.
    SignedOut,
}

/// What happened to an add, edit or delete.
#[derive(Debug)]
pub enum RecipeAction {
    Done,
    RetryDialog(ClientError),
    SignedOut,
    /// The image URL did not parse or did not load as an image.
    InvalidImage,
}

impl RecipeAction {
    pub fn is_done(&self) -> bool {
        matches!(self, RecipeAction::Done)
    }
}

pub struct RecipesScreen<A: RecipeApi> {
    manager: RecipeManager<A>,
    view: RecipeListView,
    session: SessionStore,
    images: Arc<ImageCache<A>>,
    layout: Layout,
    state: ScreenState,
}

impl<A: RecipeApi> RecipesScreen<A> {
    pub fn new(
        manager: RecipeManager<A>,
        view: RecipeListView,
        session: SessionStore,
        images: Arc<ImageCache<A>>,
    ) -> Self {
        Self {
            manager,
            view,
            session,
            images,
            layout: Layout::default(),
            state: ScreenState::Idle,
        }
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn toggle_layout(&mut self) -> Layout {
        self.layout = match self.layout {
            Layout::Grid => Layout::List,
            Layout::List => Layout::Grid,
        };
        self.layout
    }

    /// The name-sorted list as last displayed.
    pub fn view(&self) -> &RecipeListView {
        &self.view
    }

    pub fn manager(&self) -> &RecipeManager<A> {
        &self.manager
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.manager.recipe(id)
    }

    /// Show what the mirror holds for the signed-in user without going to
    /// the server.
    pub fn show_offline(&mut self) -> ClientResult<Vec<ChangeRecord>> {
        self.manager.load_recipes_from_db()?;
        let changes = self.view.refresh()?;
        self.state = ScreenState::Ready;
        Ok(changes)
    }

    /// Fetch from the server and move to `Ready`, `TryAgain` or `SignedOut`.
    pub async fn load(&mut self) -> ScreenState {
        self.state = match self.manager.load_recipes().await {
            Ok(_) => match self.view.refresh() {
                Ok(_) => ScreenState::Ready,
                Err(e) => {
                    tracing::error!("Could not read local mirror: {}", e);
                    ScreenState::TryAgain
                }
            },
            Err(e) if e.is_authentication() => {
                self.force_sign_out().await;
                ScreenState::SignedOut
            }
            Err(e) => {
                tracing::warn!("Loading recipes failed: {}", e);
                ScreenState::TryAgain
            }
        };
        self.state
    }

    /// Point the screen at `email`'s partition and reload.
    pub async fn sign_in_succeeded(&mut self, email: &str) -> ClientResult<ScreenState> {
        self.manager.switch_user(Some(email)).await?;
        self.view.rescope(Some(email))?;
        Ok(self.load().await)
    }

    /// User-initiated sign out. Mirrored recipes stay on disk.
    pub async fn logout(&mut self) -> ClientResult<()> {
        self.session.clear()?;
        self.manager.switch_user(None).await?;
        self.view.rescope(None)?;
        self.state = ScreenState::SignedOut;
        tracing::info!("signed out");
        Ok(())
    }

    async fn force_sign_out(&mut self) {
        tracing::warn!("Session expired, signing out");
        if let Err(e) = self.logout().await {
            tracing::error!("Could not clear session: {}", e);
            self.state = ScreenState::SignedOut;
        }
    }

    /// Load an image for display. `None` means show the placeholder.
    pub async fn image(&self, url: &str) -> Option<Bytes> {
        self.images.load(url).await
    }

    async fn check_image(&self, url: &str) -> bool {
        if Url::parse(url).is_err() {
            return false;
        }
        self.images.load(url).await.is_some()
    }

    pub async fn add_recipe(&mut self, params: &RecipeParams) -> RecipeAction {
        if !self.check_image(&params.image_url).await {
            return RecipeAction::InvalidImage;
        }
        let result = self.manager.add_recipe(params).await.map(|_| ());
        self.finish(result).await
    }

    pub async fn edit_recipe(&mut self, params: &RecipeParams, id: &str) -> RecipeAction {
        if !self.check_image(&params.image_url).await {
            return RecipeAction::InvalidImage;
        }
        let result = self.manager.edit_recipe(params, id).await.map(|_| ());
        self.finish(result).await
    }

    pub async fn delete_recipe(&mut self, id: &str) -> RecipeAction {
        let result = self.manager.delete_recipe(id).await.map(|_| ());
        self.finish(result).await
    }

    async fn finish(&mut self, result: ClientResult<()>) -> RecipeAction {
        match result {
            Ok(()) => {
                if let Err(e) = self.view.refresh() {
                    tracing::error!("Could not read local mirror: {}", e);
                }
                RecipeAction::Done
            }
            Err(e) if e.is_authentication() => {
                self.force_sign_out().await;
                RecipeAction::SignedOut
            }
            Err(e) => RecipeAction::RetryDialog(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, MockFailure, Op};
    use crate::db;
    use crate::mirror::{LocalMirror, MirrorWriter};
    use reqwest::StatusCode;

    const COOK: &str = "cook@example.com";
    const IMAGE: &str = "https://img.example.com/soup.png";
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    struct Fixture {
        screen: RecipesScreen<MockApi>,
        api: Arc<MockApi>,
        session: SessionStore,
        mirror: LocalMirror,
    }

    fn fixture(api: MockApi) -> Fixture {
        let pool = db::create_memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        let session = SessionStore::new(pool.clone());
        session.save("tok", COOK).unwrap();

        let api = Arc::new(api);
        api.set_image(IMAGE, PNG.to_vec());
        let mirror = LocalMirror::new(pool);
        let writer = MirrorWriter::spawn(mirror.clone());
        let manager = RecipeManager::new(api.clone(), mirror.clone(), writer, Some(COOK.into()));
        let view = RecipeListView::new(mirror.clone(), Some(COOK)).unwrap();
        let images = Arc::new(ImageCache::new(api.clone(), 1024 * 1024));

        Fixture {
            screen: RecipesScreen::new(manager, view, session.clone(), images),
            api,
            session,
            mirror,
        }
    }

    fn params(name: &str, image_url: &str) -> RecipeParams {
        RecipeParams {
            name: name.into(),
            image_url: image_url.into(),
            ingredients: "water".into(),
            steps: "boil".into(),
        }
    }

    #[test]
    fn login_requires_both_fields() {
        assert!(!LoginForm::new("", "").can_submit());
        assert!(!LoginForm::new("a@b", "").can_submit());
        assert!(!LoginForm::new("", "pw").can_submit());
        assert!(LoginForm::new("a@b", "pw").can_submit());
    }

    #[tokio::test]
    async fn login_persists_session() {
        let pool = db::create_memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        let session = SessionStore::new(pool);
        let api = MockApi::new();

        let signed_in = LoginForm::new(COOK, "pw")
            .submit(&api, &session)
            .await
            .unwrap();
        assert_eq!(signed_in.email, COOK);
        assert_eq!(session.email().unwrap().as_deref(), Some(COOK));
    }

    #[tokio::test]
    async fn login_failure_leaves_no_session() {
        let pool = db::create_memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        let session = SessionStore::new(pool);
        let api = MockApi::new();
        api.fail(Op::SignIn, MockFailure::Response(StatusCode::UNAUTHORIZED));

        let err = LoginForm::new(COOK, "bad")
            .submit(&api, &session)
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::LoginFailed(_)));
        assert!(session.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn register_reports_failure() {
        let api = MockApi::new();
        api.fail(Op::SignUp, MockFailure::Response(StatusCode::CONFLICT));
        let credentials = Credentials {
            email: COOK.into(),
            password: "pw".into(),
        };
        assert!(register(&api, &credentials).await.is_err());
    }

    #[tokio::test]
    async fn load_success_is_ready_and_view_sorted() {
        let api = MockApi::with_recipes(vec![
            Recipe::new("2", "Soup", IMAGE, "", ""),
            Recipe::new("1", "Bread", IMAGE, "", ""),
        ]);
        let mut f = fixture(api);

        assert_eq!(f.screen.load().await, ScreenState::Ready);
        let names: Vec<&str> = f
            .screen
            .view()
            .recipes()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["Bread", "Soup"]);
    }

    #[tokio::test]
    async fn load_server_error_is_try_again() {
        let api = MockApi::new();
        api.fail(Op::GetAll, MockFailure::Response(StatusCode::SERVICE_UNAVAILABLE));
        let mut f = fixture(api);

        assert_eq!(f.screen.load().await, ScreenState::TryAgain);
        assert!(f.session.current().unwrap().is_some());
    }

    #[tokio::test]
    async fn load_unauthorized_signs_out() {
        let api = MockApi::new();
        api.fail(Op::GetAll, MockFailure::Authentication);
        let mut f = fixture(api);

        assert_eq!(f.screen.load().await, ScreenState::SignedOut);
        assert!(f.session.current().unwrap().is_none());
        assert!(f.screen.manager().user().is_none());
    }

    #[tokio::test]
    async fn every_recipe_action_signs_out_on_401() {
        for op in [Op::Add, Op::Edit, Op::Delete] {
            let api = MockApi::with_recipes(vec![Recipe::new("1", "Soup", IMAGE, "", "")]);
            api.fail(op, MockFailure::Authentication);
            let mut f = fixture(api);
            f.screen.load().await;

            let action = match op {
                Op::Add => f.screen.add_recipe(&params("New", IMAGE)).await,
                Op::Edit => f.screen.edit_recipe(&params("Renamed", IMAGE), "1").await,
                _ => f.screen.delete_recipe("1").await,
            };
            assert!(matches!(action, RecipeAction::SignedOut), "{op:?}");
            assert!(f.session.current().unwrap().is_none(), "{op:?}");
        }
    }

    #[tokio::test]
    async fn add_with_bad_image_never_reaches_server() {
        let mut f = fixture(MockApi::new());

        let action = f.screen.add_recipe(&params("New", "not a url")).await;
        assert!(matches!(action, RecipeAction::InvalidImage));

        let action = f
            .screen
            .add_recipe(&params("New", "https://img.example.com/missing.png"))
            .await;
        assert!(matches!(action, RecipeAction::InvalidImage));
        assert_eq!(f.api.calls(Op::Add), 0);
    }

    #[tokio::test]
    async fn add_shows_up_in_view() {
        let mut f = fixture(MockApi::new());
        f.screen.load().await;

        let action = f.screen.add_recipe(&params("Stew", IMAGE)).await;
        assert!(action.is_done());
        assert_eq!(f.screen.view().len(), 1);
        assert_eq!(f.mirror.count(COOK).unwrap(), 1);
        // The image was cached during validation
        assert_eq!(f.api.calls(Op::DownloadImage), 1);
    }

    #[tokio::test]
    async fn server_error_on_edit_offers_retry() {
        let api = MockApi::with_recipes(vec![Recipe::new("1", "Soup", IMAGE, "", "")]);
        api.fail(Op::Edit, MockFailure::Response(StatusCode::INTERNAL_SERVER_ERROR));
        let mut f = fixture(api);
        f.screen.load().await;

        let action = f.screen.edit_recipe(&params("Renamed", IMAGE), "1").await;
        assert!(matches!(action, RecipeAction::RetryDialog(ClientError::Response(_))));
        assert_eq!(f.screen.recipe("1").unwrap().name, "Soup");
    }

    #[tokio::test]
    async fn logout_then_sign_in_as_other_user() {
        let api = MockApi::with_recipes(vec![Recipe::new("1", "Soup", IMAGE, "", "")]);
        let mut f = fixture(api);
        f.screen.load().await;
        assert_eq!(f.screen.view().len(), 1);

        f.screen.logout().await.unwrap();
        assert_eq!(f.screen.state(), ScreenState::SignedOut);
        assert!(f.screen.view().is_empty());

        f.api.set_recipes(Vec::new());
        f.session.save("tok2", "other@example.com").unwrap();
        let state = f.screen.sign_in_succeeded("other@example.com").await.unwrap();
        assert_eq!(state, ScreenState::Ready);
        assert!(f.screen.view().is_empty());
        // The first user's copy is still on disk
        assert_eq!(f.mirror.count(COOK).unwrap(), 1);
    }

    #[tokio::test]
    async fn layout_toggles() {
        let mut f = fixture(MockApi::new());
        assert_eq!(f.screen.layout(), Layout::List);
        assert_eq!(f.screen.toggle_layout(), Layout::Grid);
        assert_eq!(f.screen.toggle_layout(), Layout::List);
    }
}
