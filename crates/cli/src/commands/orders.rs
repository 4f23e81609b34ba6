//! Order placement and history commands.

use stealth_client::models::{Address, Order};
use stealth_client::orders::HistoryPhase;
use stealth_core::ProductId;

use super::{CliError, open_store, require_login};

/// Print the order history, loading pages up to `pages` (all when `None`).
pub async fn history(pages: Option<u32>) -> Result<(), CliError> {
    let mut store = open_store()?;
    require_login(&store)?;

    store.refresh_orders().await?;
    let limit = pages.unwrap_or(u32::MAX);
    while store.order_history().pagination().current_page < limit
        && store.load_next_orders_page().await?
    {}

    let history = store.order_history();
    if history.phase() == &HistoryPhase::Empty {
        println!("No orders yet");
        return Ok(());
    }
    for order in history.orders() {
        print_summary(order);
    }

    let pagination = history.pagination();
    println!(
        "Page {} of {} ({} orders)",
        pagination.current_page, pagination.total_pages, pagination.total_count
    );
    if history.has_more_pages() {
        println!("More available: pass --page {} or --all", pagination.current_page + 1);
    }
    Ok(())
}

/// Print one order, searching the history page by page.
pub async fn show(id: &str) -> Result<(), CliError> {
    let mut store = open_store()?;
    require_login(&store)?;

    store.refresh_orders().await?;
    loop {
        if let Some(order) = store.order_history().orders().iter().find(|o| o.id.as_str() == id) {
            print_detail(order);
            return Ok(());
        }
        if !store.load_next_orders_page().await? {
            return Err(CliError::NotFound(format!("Order {id} not found")));
        }
    }
}

/// Add the given products to the cart and place an order.
pub async fn place(items: &[String], address: &Address) -> Result<(), CliError> {
    let mut store = open_store()?;
    require_login(&store)?;
    store.load_products().await?;

    for item in items {
        let (id, quantity) = parse_item(item)?;
        let product = store
            .catalog()
            .product(&id)
            .cloned()
            .ok_or_else(|| CliError::NotFound(format!("Product {id} not found")))?;
        store.add_to_cart(&product, quantity);
    }

    let cart = store.cart();
    println!(
        "Subtotal {}  Shipping {}  Total {}",
        cart.subtotal().display(),
        cart.shipping_cost().display(),
        cart.total().display()
    );

    let created = store.checkout(address).await?;
    println!("Order placed: {}", created.order_id());
    if let Some(message) = created.message() {
        println!("{message}");
    }
    if let Some(order) = created.order() {
        println!("Total charged: {}", order.total_amount.display());
    }
    Ok(())
}

/// Parse `<product-id>=<quantity>`; a bare id means quantity 1.
fn parse_item(item: &str) -> Result<(ProductId, i64), CliError> {
    let (id, quantity) = match item.split_once('=') {
        Some((id, quantity)) => {
            let quantity = quantity
                .trim()
                .parse::<i64>()
                .map_err(|_| CliError::Usage(format!("Invalid quantity in {item:?}")))?;
            (id.trim(), quantity)
        }
        None => (item.trim(), 1),
    };
    if id.is_empty() {
        return Err(CliError::Usage(format!("Missing product id in {item:?}")));
    }
    if quantity < 1 {
        return Err(CliError::Usage(format!("Quantity must be at least 1 in {item:?}")));
    }
    Ok((ProductId::new(id), quantity))
}

fn print_summary(order: &Order) {
    println!(
        "{:<26} {:<14} {:<12} {:>3} items {:>10}",
        order.id.as_str(),
        order.formatted_date(),
        order.status.label(),
        order.item_count(),
        order.total_amount.display()
    );
}

fn print_detail(order: &Order) {
    println!("Order {}", order.id);
    println!("  Placed:  {}", order.formatted_date());
    println!("  Status:  {}", order.status.label());
    if let Some(address) = &order.shipping_address {
        println!("  Ship to: {address}");
    }
    for line in &order.items {
        println!(
            "  {:>3} x {:<32} {:>10}",
            line.quantity,
            line.product.name,
            line.total().display()
        );
    }
    println!("  Total:   {}", order.total_amount.display());
}
