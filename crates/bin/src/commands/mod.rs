pub mod chat;
pub mod testnet;
