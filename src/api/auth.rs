use std::sync::Arc;

use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    clock::Clock,
    config::Config,
    error::{Error, Result},
    model::{
        api::{
            account::AccountDescription,
            auth::{Account, AuthToken, LoginRequest, RegisterRequest, AUTH_TOKEN_COOKIE},
        },
        common::Email,
        db::voter::Voter,
    },
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![register, login, admin_login, logout, current_user]
}

#[post("/api/register", data = "<request>", format = "json")]
pub async fn register(
    request: Json<RegisterRequest>,
    cookies: &CookieJar<'_>,
    store: &State<Store>,
    clock: &State<Arc<dyn Clock>>,
    config: &State<Config>,
) -> Result<Json<AccountDescription>> {
    let new_voter = request.0.into_new_voter(config, clock.now())?;
    let voter = store.voters.create(new_voter).await?;
    info!("Registered voter {} <{}>", voter.id, voter.email);

    cookies.add(AuthToken::<Account>::new(&voter).into_cookie(config));
    Ok(Json(voter.into()))
}

#[post("/api/login", data = "<credentials>", format = "json")]
pub async fn login(
    credentials: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    store: &State<Store>,
    config: &State<Config>,
) -> Result<Json<AccountDescription>> {
    let voter = authenticate(&credentials, store).await?;

    cookies.add(AuthToken::<Account>::new(&voter).into_cookie(config));
    Ok(Json(voter.into()))
}

#[post("/api/admin-login", data = "<credentials>", format = "json")]
pub async fn admin_login(
    credentials: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    store: &State<Store>,
    config: &State<Config>,
) -> Result<Json<AccountDescription>> {
    let voter = authenticate(&credentials, store).await?;
    if !voter.is_admin {
        // Do not reveal that the student account exists.
        return Err(Error::InvalidCredentials);
    }

    cookies.add(AuthToken::<Account>::new(&voter).into_cookie(config));
    Ok(Json(voter.into()))
}

#[post("/api/logout")]
pub fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[get("/api/user")]
pub async fn current_user(
    token: AuthToken<Account>,
    store: &State<Store>,
) -> Result<Json<AccountDescription>> {
    let voter = store
        .voters
        .find_by_id(token.id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter with ID '{}'", token.id)))?;
    Ok(Json(voter.into()))
}

/// Find the account with these credentials.
async fn authenticate(credentials: &LoginRequest, store: &Store) -> Result<Voter> {
    let email = Email::normalise(&credentials.email);
    store
        .voters
        .find_by_email(&email)
        .await?
        .filter(|voter| store.voters.verify_credential(voter, &credentials.password))
        .ok_or(Error::InvalidCredentials)
}
