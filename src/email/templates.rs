pub fn render_verification(verify_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Verify your email</h2>
    <p>Thanks for signing up for Tradebase. Confirm your email address to finish setting up your account:</p>
    <p><a href="{verify_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Verify Email</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 24 hours. If you didn't create an account, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_password_reset(reset_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset</h2>
    <p>A password reset was requested for your Tradebase account.</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 1 hour. If you didn't request this, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_invitation(
    organization_name: &str,
    inviter_name: &str,
    accept_url: &str,
    expires_hours: i64,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>You've been invited to {organization_name}</h2>
    <p>{inviter_name} has invited you to join <strong>{organization_name}</strong> on Tradebase.</p>
    <p><a href="{accept_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">View Invitation</a></p>
    <p style="color: #666; font-size: 14px;">This invitation expires in {expires_hours} hours. If you weren't expecting it, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_owner_invitation(
    organization_name: &str,
    accept_url: &str,
    expires_hours: i64,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Your organization is ready</h2>
    <p><strong>{organization_name}</strong> has been set up for you on Tradebase. Accept the invitation below to take ownership and start inviting your team.</p>
    <p><a href="{accept_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Take Ownership</a></p>
    <p style="color: #666; font-size: 14px;">This invitation expires in {expires_hours} hours.</p>
</body>
</html>"#
    )
}
