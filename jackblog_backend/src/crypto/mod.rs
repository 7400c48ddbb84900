pub mod password;

pub use password::{Argon2Passwords, PasswordHasher};
