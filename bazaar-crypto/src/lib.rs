pub mod eip191;
pub mod hash;
pub mod key;
