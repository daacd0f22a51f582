pub mod avatar;
pub mod email;
pub mod gravatar;
