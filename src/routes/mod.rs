pub mod auth;
pub mod customers;
pub mod images;
pub mod invitations;
pub mod me;
pub mod members;
pub mod organizations;
pub mod superadmin;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/signin", post(auth::signin))
        .route("/api/v1/auth/signout", post(auth::signout))
        .route("/api/v1/auth/verify-email", post(auth::verify_email))
        .route(
            "/api/v1/auth/resend-verification",
            post(auth::resend_verification),
        )
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Current user
        .route("/api/v1/me", get(me::profile).put(me::update_profile))
        .route("/api/v1/me/organizations", get(me::organizations))
        .route(
            "/api/v1/session/active-organization",
            put(me::set_active_organization),
        )
        // Organizations. Mutating routes carry the caller's claimed role in
        // the path; handlers re-check it against the stored membership.
        .route("/api/v1/organizations", post(organizations::create))
        .route(
            "/api/v1/organizations/{org_id}/{role}",
            put(organizations::update),
        )
        .route(
            "/api/v1/organizations/{org_id}/{role}/logo",
            post(images::upload_logo),
        )
        // Members
        .route(
            "/api/v1/organizations/{org_id}/{role}/members",
            get(members::list),
        )
        .route(
            "/api/v1/organizations/{org_id}/{role}/members/{user_id}",
            put(members::update_role).delete(members::remove),
        )
        // Invitations, organization side
        .route(
            "/api/v1/organizations/{org_id}/{role}/invitations",
            get(invitations::list_for_org).post(invitations::create),
        )
        .route(
            "/api/v1/organizations/{org_id}/{role}/invitations/{id}",
            delete(invitations::cancel),
        )
        // Invitations, invitee side
        .route("/api/v1/invitations/pending", get(invitations::pending))
        .route("/api/v1/invitations/{id}/accept", post(invitations::accept))
        .route("/api/v1/invitations/{id}/reject", post(invitations::reject))
        // Customers, scoped to the session's active organization
        .route(
            "/api/v1/customers",
            get(customers::list).post(customers::create),
        )
        .route(
            "/api/v1/customers/{id}",
            get(customers::get)
                .put(customers::update)
                .delete(customers::delete),
        )
        // Superadmin
        .route(
            "/api/v1/superadmin/organizations",
            get(superadmin::list_organizations).post(superadmin::create_organization),
        )
        .route(
            "/api/v1/superadmin/organizations/invite",
            post(superadmin::invite_owner),
        )
        .route(
            "/api/v1/superadmin/organizations/{id}",
            get(superadmin::organization_detail).put(superadmin::update_organization),
        )
        .route(
            "/api/v1/superadmin/organizations/{id}/logo",
            post(superadmin::upload_logo),
        )
        .route(
            "/api/v1/superadmin/organizations/{id}/audit",
            get(superadmin::audit_log),
        )
        .route("/api/v1/superadmin/users", get(superadmin::list_users))
        .route("/api/v1/superadmin/users/{id}/ban", post(superadmin::ban_user))
        .route(
            "/api/v1/superadmin/users/{id}/unban",
            post(superadmin::unban_user),
        )
}
