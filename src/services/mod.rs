pub mod job_board;
pub mod ticket_alert;
pub mod unread_messages;

pub use job_board::JobBoard;
pub use ticket_alert::{PendingTicket, TicketAlert, TicketError};
pub use unread_messages::{UnreadCounter, UnreadMessagesService, UnreadTransition};
