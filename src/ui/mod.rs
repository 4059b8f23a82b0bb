pub mod notification;

pub use notification::{Notification, NotificationManager, NotificationType};
