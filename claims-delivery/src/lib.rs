pub mod channel;
pub mod dispatcher;
pub mod email;
pub mod sms;

pub use channel::{DeliveryChannel, OutboundMessage};
pub use dispatcher::Dispatcher;
pub use email::EmailDelivery;
pub use sms::SmsDelivery;
