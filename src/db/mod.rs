pub mod matches;
pub mod notifications;
pub mod players;
pub mod sessions;
pub mod trainings;
pub mod users;

pub use matches::*;
pub use notifications::*;
pub use players::*;
pub use sessions::*;
pub use trainings::*;
pub use users::*;
