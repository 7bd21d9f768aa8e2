pub mod wallets;

pub use wallets::{dedupe, load_wallet_file, read_wallet_list, DEFAULT_WALLET_COLUMN};
