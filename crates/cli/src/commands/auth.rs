//! Session commands: login, OTP, logout, whoami.

use secrecy::SecretString;

use greenbasket_core::Email;
use greenbasket_client::session::LogoutReason;

use super::{CommandResult, Context};

/// Sign in with email and password and install the issued credentials.
pub async fn login(ctx: &Context, email: &str, password: &str) -> CommandResult {
    let email = Email::parse(email)?;
    let password = SecretString::from(password.to_owned());

    let credentials = ctx.client.login(&email, &password).await?;
    let name = credentials
        .user
        .name
        .clone()
        .unwrap_or_else(|| email.to_string());
    ctx.session.login(credentials)?;

    println!("Signed in as {name}.");
    Ok(())
}

/// Request a one-time passcode.
pub async fn otp_request(ctx: &Context, phone: &str) -> CommandResult {
    let ack = ctx.client.request_otp(phone).await?;
    if ack.success {
        println!("Passcode sent to {phone}.");
    } else {
        println!(
            "Could not send passcode: {}",
            ack.message.unwrap_or_else(|| "unknown reason".to_owned())
        );
    }
    Ok(())
}

/// Verify a one-time passcode and install the issued credentials.
pub async fn otp_verify(ctx: &Context, phone: &str, code: &str) -> CommandResult {
    let credentials = ctx.client.verify_otp(phone, code).await?;
    let name = credentials
        .user
        .name
        .clone()
        .unwrap_or_else(|| phone.to_owned());
    ctx.session.login(credentials)?;

    println!("Signed in as {name}.");
    Ok(())
}

/// Sign out: revoke the refresh token best-effort, then clear local state.
pub async fn logout(ctx: &Context) -> CommandResult {
    if let Some(refresh) = ctx.session.refresh_token()
        && let Err(e) = ctx.client.revoke(&refresh).await
    {
        // Local teardown proceeds regardless; the token expires server-side
        tracing::warn!(error = %e, "refresh token revocation failed");
    }

    ctx.session.logout(LogoutReason::UserRequest);
    println!("Signed out.");
    Ok(())
}

/// Show the signed-in user.
pub fn whoami(ctx: &Context) -> CommandResult {
    match ctx.session.current_user() {
        Some(user) => {
            let name = user.name.unwrap_or_else(|| "(no name)".to_owned());
            println!("{name} (customer #{})", user.id);
            if let Some(email) = user.email {
                println!("  email: {email}");
            }
            if let Some(phone) = user.phone {
                println!("  phone: {phone}");
            }
        }
        None => println!("Not signed in."),
    }
    Ok(())
}
