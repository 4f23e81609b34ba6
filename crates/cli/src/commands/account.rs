//! Registration, login and session commands.

use secrecy::SecretString;
use stealth_client::models::{Address, RegisterUser, UserRecord};
use stealth_core::Email;

use super::{CliError, open_store};

/// Register and log in as the new account.
pub async fn register(
    email: &str,
    password: String,
    first_name: String,
    last_name: String,
    address: Address,
) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::Usage(format!("Invalid email address: {e}")))?;
    let registration = RegisterUser {
        email,
        password: SecretString::from(password),
        first_name,
        last_name,
        address,
    };

    let mut store = open_store()?;
    let user = store.register(&registration).await?;
    println!("Registered and logged in as {}", describe(user));
    Ok(())
}

/// Log in and save the session.
pub async fn login(email: &str, password: String) -> Result<(), CliError> {
    let mut store = open_store()?;
    let user = store.login(email, SecretString::from(password)).await?;
    println!("Logged in as {}", describe(user));
    Ok(())
}

/// Clear the saved session.
pub fn logout() -> Result<(), CliError> {
    let mut store = open_store()?;
    let was_logged_in = store.current_user().is_some();
    store.logout()?;
    if was_logged_in {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

/// Show the saved session.
pub fn whoami() -> Result<(), CliError> {
    let store = open_store()?;
    match store.current_user() {
        Some(user) => {
            println!("{}", describe(user));
            println!("  id: {}", user.id);
            if let Some(address) = &user.address {
                println!("  address: {address}");
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

fn describe(user: &UserRecord) -> String {
    let name = user.full_name();
    if name.is_empty() {
        user.email.clone()
    } else {
        format!("{name} <{}>", user.email)
    }
}
