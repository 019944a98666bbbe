pub mod audit;
pub mod customers;
pub mod email_tokens;
pub mod image_files;
pub mod invitations;
pub mod memberships;
pub mod organizations;
pub mod sessions;
pub mod users;
