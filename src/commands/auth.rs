use anyhow::Context;

use crate::commands::recipes;
use crate::models::Credentials;
use crate::screens::{self, LoginForm, ScreenState};
use crate::state::ClientState;

pub async fn signin(state: &ClientState, email: &str, password: &str) -> anyhow::Result<()> {
    let form = LoginForm::new(email, password);
    let session = form.submit(state.api.as_ref(), &state.session).await?;

    let mut screen = recipes::screen_for(state, None)?;
    match screen.sign_in_succeeded(&session.email).await? {
        ScreenState::Ready => println!(
            "Signed in as {} ({} recipes)",
            session.email,
            screen.view().len()
        ),
        _ => println!(
            "Signed in as {}. Recipes could not be loaded right now.",
            session.email
        ),
    }
    Ok(())
}

pub async fn signup(state: &ClientState, email: &str, password: &str) -> anyhow::Result<()> {
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };
    screens::register(state.api.as_ref(), &credentials)
        .await
        .context("Registration failed")?;
    println!("Account created for {email}. Run `recipebox signin` to continue.");
    Ok(())
}

pub async fn signout(state: &ClientState) -> anyhow::Result<()> {
    let Some(session) = state.session.current()? else {
        println!("Not signed in");
        return Ok(());
    };
    let mut screen = recipes::screen_for(state, Some(&session.email))?;
    screen.logout().await?;
    println!("Signed out {}", session.email);
    Ok(())
}

pub fn whoami(state: &ClientState) -> anyhow::Result<()> {
    match state.session.current()? {
        Some(session) => println!(
            "{} (since {})",
            session.email,
            session.signed_in_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Not signed in"),
    }
    Ok(())
}
