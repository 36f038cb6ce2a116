pub mod relay;

pub use relay::{MailError, MailRelayClient, OutgoingMail, RelayReceipt};
