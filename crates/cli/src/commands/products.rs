//! Product browsing and admin commands.

use stealth_client::ProductForm;
use stealth_client::models::Product;
use stealth_core::ProductId;

use super::{CliError, open_store};

/// List products, filtered by category then by search text.
pub async fn list(category: Option<&str>, search: Option<&str>) -> Result<(), CliError> {
    let mut store = open_store()?;
    store.load_products().await?;

    let catalog = store.catalog_mut();
    catalog.set_category(category.map(str::to_string));
    catalog.set_query(search.unwrap_or_default());

    let visible = store.catalog().visible();
    if visible.is_empty() {
        println!("No products found");
        return Ok(());
    }
    for product in visible {
        print_product(product);
    }
    Ok(())
}

/// List distinct categories.
pub async fn categories() -> Result<(), CliError> {
    let mut store = open_store()?;
    store.load_products().await?;
    for category in store.categories() {
        println!("{category}");
    }
    Ok(())
}

/// Create a product from validated form input.
pub async fn create(form: &ProductForm) -> Result<(), CliError> {
    let mut store = open_store()?;
    let product = store.create_product(form).await?;
    println!("Created product {}", product.id);
    print_product(&product);
    Ok(())
}

/// Delete a product by id.
pub async fn delete(id: &str) -> Result<(), CliError> {
    let mut store = open_store()?;
    store.delete_product(&ProductId::new(id)).await?;
    println!("Deleted product {id}");
    Ok(())
}

fn print_product(product: &Product) {
    println!(
        "{:<26} {:<32} {:>10} {:<16} stock {}",
        product.id.as_str(),
        product.name,
        product.price.display(),
        product.category,
        product.stock
    );
}
