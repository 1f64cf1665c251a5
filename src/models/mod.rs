pub mod job;
pub mod message;
pub mod profile;
pub mod role;
pub mod ticket;

pub use job::{Job, JobStatus, Motorcycle, ShopId};
pub use message::Message;
pub use profile::Profile;
pub use role::Role;
pub use ticket::{SupportTicket, TicketPriority, TicketStatus};
