pub mod blocks;
pub mod error;
pub mod models;
pub mod traits;

pub use blocks::{Ack, Block, ChannelPost, ContextElement, ResponseType, TextObject, WebhookReply};
pub use error::KippoError;
pub use models::{
    AttendanceCategory, AttendanceRecord, KippoProject, KippoUser, Organization,
    OrganizationMembership, PersonalHoliday, ProjectStatus, SlackCommand,
};
pub use traits::{Notifier, ObjectStore, Store};
