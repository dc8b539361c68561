//! Order history and tracking commands.

use greenbasket_core::OrderId;

use super::{CommandResult, Context};

/// List the signed-in customer's orders.
pub async fn list(ctx: &Context) -> CommandResult {
    let Some(user) = ctx.session.current_user() else {
        println!("Please sign in first (gb-cli login).");
        return Ok(());
    };

    let orders = ctx.client.orders(user.id).await?;
    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in orders {
        println!(
            "  #{}  {}  {}  placed {}",
            order.id,
            order.status,
            order.total,
            order.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

/// Show one order's tracking status.
pub async fn status(ctx: &Context, order_id: i32) -> CommandResult {
    let status = ctx.client.order_status(OrderId::new(order_id)).await?;
    println!("Order #{}: {}", status.order_id, status.status);
    if let Some(updated_at) = status.updated_at {
        println!("  last update: {}", updated_at.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}
