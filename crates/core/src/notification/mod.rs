mod dispatcher;

pub use dispatcher::{DispatchRequest, NotificationDispatcher, TemplateLookup};
