pub mod ethereum;
pub mod mock;
pub mod traits;

pub use ethereum::{EthersTransactionsContract, RpcWallet, SignerWallet};
pub use mock::{MockFailure, MockTransactionsContract, MockWallet};
pub use traits::{methods, NoWallet, TransactionsContract, WalletClient};
