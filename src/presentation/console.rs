//! Line-oriented console over any async reader/writer.
//!
//! # Commands
//! - `login <adapter>`: open a session (`metamask`, `torus-evm`, ...)
//! - `logout`, `refresh`, `status`
//! - `buy <token> <id>`: mint `id` on the `token` contract
//! - `tx <hash>`: transaction receipt status
//! - `help`, `quit`
//!
//! Wallet failures are printed as `Error: <message>` and never end the loop.

use std::str::FromStr;

use alloy::primitives::{Address, TxHash, U256};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::lifecycle::{LifecycleError, LifecycleManager, LogoutOutcome};
use crate::presentation::view::StatusView;
use crate::sdk::{AdapterKind, AuthSdk};

const HELP: &str = "\
Commands:
  login <adapter>    connect a wallet (metamask, torus-evm, wallet-connect-v1, private-key)
  logout             close the wallet session
  refresh            reload account and balance
  status             show the wallet status
  buy <token> <id>   mint token <id> on contract <token>
  tx <hash>          show transaction status
  help               show this help
  quit               exit";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(AdapterKind),
    Logout,
    Refresh,
    Status,
    Buy { token: Address, token_id: U256 },
    Tx(TxHash),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err("empty command".to_string());
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("login", [adapter]) => Command::Login(adapter.parse()?),
            ("login", _) => return Err("usage: login <adapter>".to_string()),
            ("logout", []) => Command::Logout,
            ("refresh", []) => Command::Refresh,
            ("status", []) => Command::Status,
            ("buy", [token, id]) => Command::Buy {
                token: token
                    .parse()
                    .map_err(|e| format!("invalid token address '{token}': {e}"))?,
                token_id: U256::from_str(id).map_err(|e| format!("invalid token id '{id}': {e}"))?,
            },
            ("buy", _) => return Err("usage: buy <token> <id>".to_string()),
            ("tx", [hash]) => Command::Tx(
                hash.parse()
                    .map_err(|e| format!("invalid transaction hash '{hash}': {e}"))?,
            ),
            ("tx", _) => return Err("usage: tx <hash>".to_string()),
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            (other, _) => return Err(format!("unknown command '{other}' (try 'help')")),
        };
        Ok(command)
    }
}

/// Interactive front end for one [`LifecycleManager`].
pub struct Console<S: AuthSdk> {
    manager: LifecycleManager<S>,
}

impl<S: AuthSdk> Console<S> {
    pub fn new(manager: LifecycleManager<S>) -> Self {
        Self { manager }
    }

    /// Read commands until `quit` or end of input.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        self.write_status(&mut output).await?;
        output.write_all(b"> ").await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                output.write_all(b"> ").await?;
                output.flush().await?;
                continue;
            }

            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    tracing::debug!(?command, "Console command");
                    let reply = self.execute(command).await;
                    output.write_all(reply.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                }
                Err(e) => {
                    output.write_all(format!("Error: {e}\n").as_bytes()).await?;
                }
            }
            output.write_all(b"> ").await?;
            output.flush().await?;
        }

        output.write_all(b"\n").await?;
        output.flush().await
    }

    async fn write_status<W: AsyncWrite + Unpin>(&self, output: &mut W) -> std::io::Result<()> {
        let rendered = self.status().await;
        output.write_all(rendered.as_bytes()).await?;
        output.write_all(b"\n").await
    }

    async fn status(&self) -> String {
        self.manager.settled().await;
        let state = self.manager.state();
        StatusView::new(&state, self.manager.chain()).to_string()
    }

    /// Run one command and return the text to show.
    pub async fn execute(&self, command: Command) -> String {
        match self.dispatch(command).await {
            Ok(reply) => reply,
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn dispatch(&self, command: Command) -> Result<String, LifecycleError> {
        let reply = match command {
            Command::Login(adapter) => {
                self.manager.login(adapter).await?;
                self.status().await
            }
            Command::Logout => match self.manager.logout().await? {
                LogoutOutcome::Disconnected => self.status().await,
                LogoutOutcome::NoActiveSession => "Not connected".to_string(),
            },
            Command::Refresh => {
                let account = self.manager.refresh_account().await?;
                let ticker = self.manager.chain().map(|c| c.ticker.as_str()).unwrap_or("");
                format!("Account: {}\nBalance: {} {}", account.address, account.balance, ticker)
            }
            Command::Status => self.status().await,
            Command::Buy { token, token_id } => {
                let tx_hash = self.manager.purchase(token, token_id).await?;
                match self.manager.chain() {
                    Some(chain) => format!(
                        "Submitted: {tx_hash}\nExplorer: {}",
                        chain.explorer_tx_url(&tx_hash.to_string())
                    ),
                    None => format!("Submitted: {tx_hash}"),
                }
            }
            Command::Tx(tx_hash) => {
                let status = self.manager.transaction_status(tx_hash).await?;
                format!("Transaction {tx_hash}: {status}")
            }
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::sdk::AuthCore;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "login metamask".parse::<Command>(),
            Ok(Command::Login(AdapterKind::Metamask))
        );
        assert_eq!("LOGOUT".parse::<Command>(), Ok(Command::Logout));
        assert_eq!("  refresh  ".parse::<Command>(), Ok(Command::Refresh));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));

        let buy = "buy 0x0000000000000000000000000000000000000001 42"
            .parse::<Command>()
            .unwrap();
        assert_eq!(
            buy,
            Command::Buy {
                token: Address::with_last_byte(1),
                token_id: U256::from(42u64),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Command>().is_err());
        assert!("login".parse::<Command>().unwrap_err().starts_with("usage"));
        assert!("login phantom".parse::<Command>().is_err());
        assert!("buy nothex 1".parse::<Command>().unwrap_err().contains("invalid token address"));
        assert!("tx 0x12".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().unwrap_err().contains("unknown command"));
    }

    #[tokio::test]
    async fn test_errors_do_not_end_the_loop() {
        let manager = LifecycleManager::<AuthCore>::from_config(&SessionConfig::default()).unwrap();
        let console = Console::new(manager);

        let input: &[u8] = b"login metamask\nrefresh\nlogout\nfly\nstatus\nquit\nstatus\n";
        let mut output = Vec::new();
        console.run(input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Error: Wallet adapters unavailable"));
        assert!(text.contains("Error: Account gateway not ready"));
        assert!(text.contains("Not connected"));
        assert!(text.contains("Error: unknown command 'fly'"));
        // initial status plus the explicit one; nothing after quit
        assert_eq!(text.matches("Loading: false - Connected: false").count(), 2);
    }
}
