//! Authentication and profile commands.

use sprout_client::Storefront;
use sprout_client::api::types::{Credentials, RegistrationInput};
use sprout_core::Email;

/// Log in and print the fetched profile.
pub async fn login(
    shop: &Storefront,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = Credentials {
        username: username.to_owned(),
        password: password.to_owned(),
    };
    shop.session().login(&credentials).await?;

    println!("Logged in as {username}");
    if let Some(profile) = shop.session().profile() {
        print_profile(&profile);
    }
    Ok(())
}

/// Register a new account. The session is not logged in afterwards; run
/// `auth login` next.
pub async fn register(
    shop: &Storefront,
    username: &str,
    email: &str,
    password: &str,
    first_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = RegistrationInput {
        username: username.to_owned(),
        email: Email::parse(email)?,
        password: password.to_owned(),
        first_name,
        phone_number: phone,
        address,
    };
    let profile = shop.session().register(&input).await?;

    println!("Registered account #{} ({})", profile.id, profile.username);
    println!("Run `sprout auth login` to start a session.");
    Ok(())
}

/// Discard the persisted session.
pub fn logout(shop: &Storefront) {
    shop.session().logout();
    println!("Logged out");
}

/// Print the current profile, refreshing it first.
pub async fn whoami(shop: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    shop.session().fetch_profile().await?;

    match shop.session().profile() {
        Some(profile) => print_profile(&profile),
        None => println!("Not logged in"),
    }
    Ok(())
}

fn print_profile(profile: &sprout_client::api::types::UserProfile) {
    println!("#{} {}", profile.id, profile.username);
    if let Some(email) = &profile.email {
        println!("  email: {email}");
    }
    if let Some(first_name) = &profile.first_name {
        println!("  name: {first_name}");
    }
    if let Some(details) = &profile.profile {
        if let Some(phone) = &details.phone_number {
            println!("  phone: {phone}");
        }
        if let Some(address) = &details.address {
            println!("  address: {address}");
        }
    }
}
