pub mod alert;
pub mod contact;
pub mod enums;
pub mod user;

pub use alert::*;
pub use contact::*;
pub use enums::*;
pub use user::*;
