pub mod auth;
pub mod images;
pub mod recipes;
pub mod timer;

use crate::config::Command;
use crate::state::ClientState;

pub async fn dispatch(state: &ClientState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Signin { email, password } => auth::signin(state, &email, &password).await,
        Command::Signup { email, password } => auth::signup(state, &email, &password).await,
        Command::Signout => auth::signout(state).await,
        Command::Whoami => auth::whoami(state),
        Command::List { layout, offline } => recipes::list(state, layout, offline).await,
        Command::Show { id } => recipes::show(state, &id).await,
        Command::Add {
            name,
            image_url,
            ingredients,
            steps,
        } => {
            let params = crate::models::RecipeParams {
                name,
                image_url,
                ingredients,
                steps,
            };
            recipes::add(state, &params).await
        }
        Command::Edit {
            id,
            name,
            image_url,
            ingredients,
            steps,
        } => {
            let edits = recipes::RecipeEdits {
                name,
                image_url,
                ingredients,
                steps,
            };
            recipes::edit(state, &id, edits).await
        }
        Command::Delete { id } => recipes::delete(state, &id).await,
        Command::Image { url } => images::fetch(state, &url).await,
        Command::Timer {
            hours,
            minutes,
            seconds,
        } => timer::run(hours, minutes, seconds).await,
    }
}
