//! Sign-in, sign-up and sign-out handlers.
//!
//! Accounts are email and password. A successful sign-up signs the user in
//! straight away.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::db::ProfileRepository;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{ShopperSession, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::routes::{Layout, safe_return_to};
use crate::services::auth::{AuthService, SignUp};
use crate::services::toast::Toast;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub return_to: Option<String>,
    pub tab: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub return_to: Option<String>,
}

/// Sign-in and sign-up tabs on one page.
#[derive(Template, WebTemplate)]
#[template(path = "auth/index.html")]
pub struct AuthTemplate {
    pub layout: Layout,
    pub signup_tab: bool,
    pub return_to: String,
    pub error: Option<String>,
    pub email: String,
    pub full_name: String,
    pub phone: String,
}

impl AuthTemplate {
    fn new(layout: Layout, signup_tab: bool, return_to: String) -> Self {
        Self {
            layout,
            signup_tab,
            return_to,
            error: None,
            email: String::new(),
            full_name: String::new(),
            phone: String::new(),
        }
    }
}

/// Display the sign-in page; signed-in users go straight on.
pub async fn page(layout: Layout, Query(query): Query<AuthQuery>) -> Response {
    let return_to = safe_return_to(query.return_to.as_deref());
    if layout.is_signed_in() {
        return Redirect::to(&return_to).into_response();
    }
    AuthTemplate::new(layout, query.tab.as_deref() == Some("signup"), return_to).into_response()
}

/// Put the user in the session with their profile name and admin flag.
async fn sign_in(
    state: &AppState,
    session: &ShopperSession,
    user: &User,
) -> Result<CurrentUser, AppError> {
    let full_name = match ProfileRepository::new(state.pool()).get(user.id).await {
        Ok(profile) => profile.full_name,
        Err(e) => {
            warn!(error = %e, "Failed to load profile at sign-in");
            None
        }
    };
    let is_admin = AuthService::new(state.pool())
        .is_admin(user.id)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Admin role lookup failed at sign-in");
            false
        });

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        full_name,
        is_admin,
    };
    set_current_user(session.session(), &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(current)
}

/// Handle the sign-in form.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    layout: Layout,
    session: ShopperSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let return_to = safe_return_to(form.return_to.as_deref());
    match AuthService::new(state.pool())
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            sign_in(&state, &session, &user).await?;
            session.flash(&Toast::success("Welcome back!")).await;
            Ok(Redirect::to(&return_to).into_response())
        }
        Err(e) => {
            warn!(error = %e, "Sign-in failed");
            let mut page = AuthTemplate::new(layout, false, return_to);
            page.error = Some(e.user_message());
            page.email = form.email;
            Ok(page.into_response())
        }
    }
}

/// Handle the sign-up form.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    layout: Layout,
    session: ShopperSession,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let return_to = safe_return_to(form.return_to.as_deref());
    let sign_up = SignUp {
        email: &form.email,
        password: &form.password,
        full_name: &form.full_name,
        phone: &form.phone,
    };
    match AuthService::new(state.pool()).register(sign_up).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Account created");
            sign_in(&state, &session, &user).await?;
            let welcome = format!("Account created! Welcome to {}.", state.config().store.name);
            session.flash(&Toast::success(welcome)).await;
            Ok(Redirect::to(&return_to).into_response())
        }
        Err(e) => {
            warn!(error = %e, "Sign-up failed");
            let mut page = AuthTemplate::new(layout, true, return_to);
            page.error = Some(e.user_message());
            page.email = form.email;
            page.full_name = form.full_name;
            page.phone = form.phone;
            Ok(page.into_response())
        }
    }
}

/// Sign out. The session cart and wishlist are kept.
#[instrument(skip_all)]
pub async fn logout(session: ShopperSession) -> Result<Redirect, AppError> {
    clear_current_user(session.session()).await?;
    clear_sentry_user();
    session.flash(&Toast::info("You have been signed out")).await;
    Ok(Redirect::to("/"))
}
