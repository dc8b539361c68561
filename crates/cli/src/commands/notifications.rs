//! Notification feed commands.

use greenbasket_core::NotificationId;
use greenbasket_client::notifications::NotificationFeed;

use super::{CommandResult, Context};

/// Build a freshly fetched feed for the signed-in customer.
async fn feed(ctx: &Context) -> Result<Option<NotificationFeed>, Box<dyn std::error::Error>> {
    let Some(user) = ctx.session.current_user() else {
        println!("Please sign in first (gb-cli login).");
        return Ok(None);
    };

    let feed = NotificationFeed::new(ctx.client.clone(), user.id);
    feed.refresh().await?;
    Ok(Some(feed))
}

/// List notifications with read markers.
pub async fn list(ctx: &Context) -> CommandResult {
    let Some(feed) = feed(ctx).await? else {
        return Ok(());
    };

    let items = feed.items();
    if items.is_empty() {
        println!("No notifications.");
        return Ok(());
    }

    for item in items {
        let marker = if item.is_read { " " } else { "*" };
        let message = item.message.unwrap_or_default();
        println!(
            "{marker} #{} [{}] {}",
            item.id,
            item.created_at.format("%Y-%m-%d"),
            message
        );
    }
    println!("{} unread", feed.unread_count());
    Ok(())
}

/// Mark one notification read.
pub async fn read(ctx: &Context, id: i32) -> CommandResult {
    let Some(feed) = feed(ctx).await? else {
        return Ok(());
    };
    feed.mark_read(NotificationId::new(id)).await?;
    println!("Marked #{id} read ({} unread).", feed.unread_count());
    Ok(())
}

/// Mark every notification read.
pub async fn read_all(ctx: &Context) -> CommandResult {
    let Some(feed) = feed(ctx).await? else {
        return Ok(());
    };
    feed.mark_all_read().await?;
    println!("All notifications marked read.");
    Ok(())
}

/// Delete one notification.
pub async fn delete(ctx: &Context, id: i32) -> CommandResult {
    let Some(feed) = feed(ctx).await? else {
        return Ok(());
    };
    feed.delete(NotificationId::new(id)).await?;
    println!("Deleted #{id}.");
    Ok(())
}

/// Delete every notification.
pub async fn clear(ctx: &Context) -> CommandResult {
    let Some(feed) = feed(ctx).await? else {
        return Ok(());
    };
    feed.clear().await?;
    println!("Notifications cleared.");
    Ok(())
}
