pub mod announcements;
pub mod auth;
pub mod employees;
pub mod root;
