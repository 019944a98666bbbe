pub mod audit_event;
pub mod customer;
pub mod email_token;
pub mod image_file;
pub mod invitation;
pub mod membership;
pub mod organization;
pub mod session;
pub mod user;

pub use audit_event::AuditEvent;
pub use customer::Customer;
pub use email_token::EmailToken;
pub use image_file::ImageFile;
pub use invitation::{Invitation, InvitationDetail};
pub use membership::{MemberDetail, Membership};
pub use organization::Organization;
pub use session::Session;
pub use user::User;
