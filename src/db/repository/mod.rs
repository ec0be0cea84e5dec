pub mod account;
pub mod alert;
pub mod contact;
pub mod responder;
pub mod response;
pub mod session;
pub mod user;

pub use account::*;
pub use alert::*;
pub use contact::*;
pub use responder::*;
pub use response::*;
pub use session::*;
pub use user::*;
