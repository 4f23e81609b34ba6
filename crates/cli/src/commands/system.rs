//! Backend reachability and the landing page.

use super::{CliError, open_store};

/// Check that the backend answers.
pub async fn ping() -> Result<(), CliError> {
    let store = open_store()?;
    store.ping().await?;
    println!("Backend reachable at {}", store.api().base_url());
    Ok(())
}

/// Print the landing page aggregate.
pub async fn home() -> Result<(), CliError> {
    let store = open_store()?;
    let home = store.fetch_home().await?;

    if let Some(hero) = &home.hero_card {
        println!("{}", hero.title);
        if let Some(link) = &hero.link_to {
            println!("  -> {link}");
        }
        println!();
    }

    println!("Categories:");
    for category in &home.categories {
        println!("  {:<24} {}", category.name, category.id);
    }
    Ok(())
}
