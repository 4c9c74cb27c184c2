//! In-process domain event transport.

mod channel_publisher;

pub use channel_publisher::{ChannelDomainEventPublisher, DEFAULT_EVENT_CHANNEL_CAPACITY};
