//! Catalog browsing commands.

use greenbasket_core::{CategoryId, ProductId};

use super::{CommandResult, Context};

/// List all categories.
pub async fn categories(ctx: &Context) -> CommandResult {
    let categories = ctx.client.categories().await?;
    if categories.is_empty() {
        println!("No categories.");
        return Ok(());
    }
    for category in categories {
        println!("  #{} {}", category.id, category.name);
    }
    Ok(())
}

/// List products in one category.
pub async fn products(ctx: &Context, category_id: i32) -> CommandResult {
    let products = ctx.client.products(CategoryId::new(category_id)).await?;
    if products.is_empty() {
        println!("No products in this category.");
        return Ok(());
    }
    for product in products {
        let price = product.offer_price.unwrap_or(product.price);
        println!(
            "  #{} {}  {}  ({} in stock)",
            product.id, product.name, price, product.stock
        );
    }
    Ok(())
}

/// Show one product in detail.
pub async fn product(ctx: &Context, product_id: i32) -> CommandResult {
    let product = ctx.client.product(ProductId::new(product_id)).await?;

    println!("{} (#{})", product.name, product.id);
    match product.offer_price {
        Some(offer) => println!("  price: {} (was {})", offer, product.price),
        None => println!("  price: {}", product.price),
    }
    println!("  stock: {}", product.stock);
    if let Some(description) = product.description {
        println!("  {description}");
    }
    Ok(())
}
