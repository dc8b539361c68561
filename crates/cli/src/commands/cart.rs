//! Cart and checkout commands.

use greenbasket_core::ProductId;
use greenbasket_client::checkout::{CheckoutError, CheckoutFlow};

use super::{CommandResult, Context};

/// Print the cart contents and subtotal.
pub fn show(ctx: &Context) -> CommandResult {
    let lines = ctx.cart.lines();
    if lines.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }

    for line in &lines {
        println!(
            "  {} x{}  {}  (#{})",
            line.product_name,
            line.qty,
            line.effective_price().line_total(line.qty),
            line.product_id
        );
    }
    println!(
        "{} items, subtotal {}",
        ctx.cart.total_quantity(),
        ctx.cart.subtotal()
    );
    Ok(())
}

/// Fetch the product and add one unit to the cart.
pub async fn add(ctx: &Context, product_id: i32) -> CommandResult {
    let product = ctx.client.product(ProductId::new(product_id)).await?;
    let qty = ctx.cart.add(&product)?;
    println!("Added {} (now x{qty}).", product.name);
    Ok(())
}

/// Remove one unit of a product from the cart.
pub fn remove(ctx: &Context, product_id: i32) -> CommandResult {
    match ctx.cart.remove(ProductId::new(product_id)) {
        Some(qty) => println!("Removed one (now x{qty})."),
        None => println!("Line removed."),
    }
    Ok(())
}

/// Empty the cart.
pub fn clear(ctx: &Context) -> CommandResult {
    ctx.cart.clear();
    println!("Cart cleared.");
    Ok(())
}

/// Reconcile the cart with the server; optionally place the order.
pub async fn checkout(ctx: &Context, place: bool) -> CommandResult {
    let mut flow = CheckoutFlow::new(ctx.client.clone(), ctx.cart.clone());

    let reconciliation = match flow.reconcile().await {
        Ok(reconciliation) => reconciliation,
        Err(CheckoutError::NotAuthenticated) => {
            println!("Please sign in first (gb-cli login).");
            return Ok(());
        }
        Err(CheckoutError::Rejected(message)) => {
            println!("Checkout rejected: {message}");
            println!("Your cart is unchanged; fix the issue and retry.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for warning in &reconciliation.warnings {
        println!("! {warning}");
    }

    println!("Reserved:");
    for line in &reconciliation.reserved {
        println!(
            "  {} x{}  {}",
            line.product_name,
            line.qty,
            line.effective_price().line_total(line.qty)
        );
    }

    if place {
        let order_id = flow.place_order().await?;
        println!("Order #{order_id} placed.");
    } else {
        println!("Run with --place to place the order.");
    }
    Ok(())
}
