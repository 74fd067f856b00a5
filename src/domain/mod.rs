pub mod user;
pub mod announcement;
pub mod acknowledgement;
pub mod employee;

pub use user::*;
pub use announcement::*;
pub use acknowledgement::*;
pub use employee::*;
